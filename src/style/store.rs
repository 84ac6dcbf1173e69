//! The style mutation store: records per-path overrides and replays them
//! onto the live document.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::path::{Path, compute_path, resolve_path};

use super::patch::{StyleMutationMap, StylePatch};

/// Style overrides keyed by path, plus the set of paths last written to the
/// live document.
#[derive(Debug, Clone, Default)]
pub struct StyleStore {
    map: StyleMutationMap,
    applied: BTreeSet<Path>,
}

impl StyleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_map(map: StyleMutationMap) -> Self {
        Self {
            map,
            applied: BTreeSet::new(),
        }
    }

    pub fn map(&self) -> &StyleMutationMap {
        &self.map
    }

    /// Paths whose overrides are currently on the document.
    pub fn applied_paths(&self) -> impl Iterator<Item = &Path> {
        self.applied.iter()
    }

    /// Merge `patch` into the entry for `path` and apply the merged style
    /// to the live node.
    ///
    /// `record` receives the whole map as it was before the merge so the
    /// caller can push it onto its undo history. Returns `false` when the
    /// path does not resolve; the entry is still recorded so that it takes
    /// effect on the next replay.
    pub fn set_style(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        path: Path,
        patch: &StylePatch,
        record: impl FnOnce(&StyleMutationMap),
    ) -> bool {
        record(&self.map);
        let merged = self.map.merge(path.clone(), patch).clone();
        match resolve_path(doc, root, &path) {
            Some(node) => {
                doc.set_inline_override(node, Some(merged.to_css()));
                self.applied.insert(path);
                true
            }
            None => {
                debug!(%path, "style target not in document, deferred to replay");
                false
            }
        }
    }

    /// Swap in a whole map (undo, redo, load) and replay it.
    pub fn replace(&mut self, doc: &mut Document, root: NodeId, map: StyleMutationMap) {
        self.clear_tracked(doc, root);
        self.map = map;
        self.replay_all(doc, root);
    }

    /// Remove the overrides previously written by this store.
    pub fn clear_tracked(&mut self, doc: &mut Document, root: NodeId) {
        for path in std::mem::take(&mut self.applied) {
            if let Some(node) = resolve_path(doc, root, &path) {
                doc.set_inline_override(node, None);
            }
        }
    }

    /// Forget tracked paths without touching the document. Used when the
    /// document was rebuilt from scratch and carries no overrides.
    pub fn forget_applied(&mut self) {
        self.applied.clear();
    }

    /// Clear whatever this store applied before, then apply every entry
    /// whose path resolves. Returns the number of entries applied.
    pub fn replay_all(&mut self, doc: &mut Document, root: NodeId) -> usize {
        self.clear_tracked(doc, root);
        let mut applied = 0;
        for (path, patch) in &self.map {
            match resolve_path(doc, root, path) {
                Some(node) => {
                    doc.set_inline_override(node, Some(patch.to_css()));
                    self.applied.insert(path.clone());
                    applied += 1;
                }
                None => debug!(%path, "skipping stale style path"),
            }
        }
        applied
    }

    /// Resolve every entry to the node it currently addresses. Entries that
    /// do not resolve are dropped from the result.
    pub fn anchor(&self, doc: &Document, root: NodeId) -> Vec<(NodeId, StylePatch)> {
        self.map
            .iter()
            .filter_map(|(path, patch)| {
                resolve_path(doc, root, path).map(|node| (node, patch.clone()))
            })
            .collect()
    }

    /// Rebuild the map from anchored entries after a structural edit, so
    /// every override follows its node to the node's new position.
    /// Entries whose node has left the tree are dropped.
    pub fn rebase(&mut self, doc: &Document, root: NodeId, anchored: Vec<(NodeId, StylePatch)>) {
        self.map = anchored
            .into_iter()
            .filter_map(|(node, patch)| compute_path(doc, root, node).map(|path| (path, patch)))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn setup() -> (Document, NodeId) {
        let doc = Document::parse(
            "<section><h1>Serum</h1><p>Hydrating</p><p>30ml</p><p>$24</p><p>Vegan</p></section>",
        );
        let body = doc.body().unwrap();
        (doc, body)
    }

    fn override_at(doc: &Document, root: NodeId, p: &str) -> Option<String> {
        resolve_path(doc, root, &path(p)).and_then(|n| doc.inline_override(n).map(str::to_string))
    }

    #[test]
    fn test_set_style_merges_and_applies() {
        let (mut doc, body) = setup();
        let mut store = StyleStore::new();

        store.set_style(
            &mut doc,
            body,
            path("0.1"),
            &StylePatch::new().with("color", "#ff0000"),
            |_| {},
        );
        store.set_style(
            &mut doc,
            body,
            path("0.1"),
            &StylePatch::new().with("fontSize", "20px"),
            |_| {},
        );

        assert_eq!(
            store.map().get(&path("0.1")),
            Some(
                &StylePatch::new()
                    .with("color", "#ff0000")
                    .with("fontSize", "20px")
            )
        );
        assert_eq!(
            override_at(&doc, body, "0.1").as_deref(),
            Some("color: #ff0000; font-size: 20px")
        );
    }

    #[test]
    fn test_record_sees_pre_merge_map() {
        let (mut doc, body) = setup();
        let mut store = StyleStore::new();
        let mut seen = Vec::new();

        let patch = StylePatch::new().with("color", "red");
        store.set_style(&mut doc, body, path("0.0"), &patch, |m| seen.push(m.clone()));
        store.set_style(&mut doc, body, path("0.0"), &patch, |m| seen.push(m.clone()));

        assert!(seen[0].is_empty());
        assert_eq!(seen[1].get(&path("0.0")), Some(&patch));
    }

    #[test]
    fn test_stale_path_is_noop() {
        let (mut doc, body) = setup();
        let mut store = StyleStore::new();

        let found = store.set_style(
            &mut doc,
            body,
            path("0.9"),
            &StylePatch::new().with("color", "red"),
            |_| {},
        );
        assert!(!found);
        assert_eq!(store.replay_all(&mut doc, body), 0);
        assert_eq!(store.map().len(), 1);
    }

    #[test]
    fn test_replay_clears_previous_overrides() {
        let (mut doc, body) = setup();
        let mut store = StyleStore::new();
        store.set_style(
            &mut doc,
            body,
            path("0.1"),
            &StylePatch::new().with("color", "red"),
            |_| {},
        );

        let mut next = StyleMutationMap::new();
        next.merge(path("0.2"), &StylePatch::new().with("color", "blue"));
        store.replace(&mut doc, body, next);

        assert_eq!(override_at(&doc, body, "0.1"), None);
        assert_eq!(override_at(&doc, body, "0.2").as_deref(), Some("color: blue"));
        assert_eq!(store.applied_paths().count(), 1);
    }

    #[test]
    fn test_positional_replay_after_structural_change() {
        let (mut doc, body) = setup();
        let mut store = StyleStore::new();
        store.set_style(
            &mut doc,
            body,
            path("0.3"),
            &StylePatch::new().with("color", "red"),
            |_| {},
        );
        let price = resolve_path(&doc, body, &path("0.3")).unwrap();
        let vegan = resolve_path(&doc, body, &path("0.4")).unwrap();

        // Remove "0.2" behind the store's back: the old address now points
        // at what used to be "0.4".
        let size = resolve_path(&doc, body, &path("0.2")).unwrap();
        store.clear_tracked(&mut doc, body);
        doc.detach(size);
        store.replay_all(&mut doc, body);

        assert_eq!(doc.inline_override(vegan), Some("color: red"));
        assert_eq!(doc.inline_override(price), None);
    }

    #[test]
    fn test_rebase_follows_node() {
        let (mut doc, body) = setup();
        let mut store = StyleStore::new();
        store.set_style(
            &mut doc,
            body,
            path("0.3"),
            &StylePatch::new().with("color", "red"),
            |_| {},
        );
        store.set_style(
            &mut doc,
            body,
            path("0.2"),
            &StylePatch::new().with("color", "blue"),
            |_| {},
        );
        let price = resolve_path(&doc, body, &path("0.3")).unwrap();
        let size = resolve_path(&doc, body, &path("0.2")).unwrap();

        let anchored = store.anchor(&doc, body);
        store.clear_tracked(&mut doc, body);
        doc.detach(size);
        store.rebase(&doc, body, anchored);
        store.replay_all(&mut doc, body);

        assert_eq!(store.map().len(), 1);
        assert!(store.map().get(&path("0.2")).is_some());
        assert_eq!(doc.inline_override(price), Some("color: red"));
    }
}
