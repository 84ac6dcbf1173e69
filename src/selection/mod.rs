//! Pointer-driven selection and hover tracking.
//!
//! The host forwards pointer events against nodes of the live document.
//! State lives in [`SelectionState`]; decorations are written as
//! bookkeeping attributes ([`HOVERED_ATTR`], [`SELECTED_ATTR`]) so they
//! never reach saved markup.

mod kind;

pub use kind::{ElementKind, PropertyGroup};

use std::collections::BTreeSet;

use kurbo::Point;
use tracing::debug;

use crate::dom::{Document, HOVERED_ATTR, NodeId, SELECTED_ATTR};
use crate::path::{Geometry, Path, compute_path, promote_at_edge, resolve_path};
use crate::style::{StylePatch, parse_inline_style};

/// Pointer input forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Enter(NodeId),
    Leave(NodeId),
    Click { node: NodeId, point: Point },
    /// Click outside both the page canvas and the sidebar.
    ClickOutside,
}

/// The selected element and what the sidebar shows for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub node: NodeId,
    pub path: Path,
    pub tag: String,
    pub text: String,
    pub kind: ElementKind,
}

impl Selection {
    fn capture(doc: &Document, node: NodeId, path: Path) -> Option<Self> {
        let tag = doc.tag_name(node)?.to_string();
        let kind = ElementKind::classify(&tag, doc.attr(node, "type"));
        Some(Self {
            node,
            path,
            text: doc.text_content(node),
            tag,
            kind,
        })
    }

    /// Effective inline style: the author's `style` attribute with the
    /// replayed override on top.
    pub fn inline_style(&self, doc: &Document) -> StylePatch {
        let mut style = doc
            .attr(self.node, "style")
            .map(parse_inline_style)
            .unwrap_or_default();
        if let Some(css) = doc.inline_override(self.node) {
            style.merge(&parse_inline_style(css));
        }
        style
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Option<Selection>,
    hovered: Option<NodeId>,
    sidebar_open: bool,
    expanded: BTreeSet<PropertyGroup>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn is_expanded(&self, group: PropertyGroup) -> bool {
        self.expanded.contains(&group)
    }

    pub fn toggle_group(&mut self, group: PropertyGroup) {
        if !self.expanded.remove(&group) {
            self.expanded.insert(group);
        }
    }

    /// Apply a pointer event. Returns `true` when selection or hover
    /// changed.
    pub fn handle(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        event: PointerEvent,
        geometry: &dyn Geometry,
        edge_margin: f64,
    ) -> bool {
        match event {
            PointerEvent::Enter(node) => {
                if !doc.is_element(node) || !doc.contains(root, node) {
                    return false;
                }
                if self.hovered == Some(node) {
                    return false;
                }
                self.clear_hover(doc);
                self.hovered = Some(node);
                if !self.is_selected(node) {
                    doc.set_attr(node, HOVERED_ATTR, "");
                }
                true
            }
            PointerEvent::Leave(node) => {
                if self.hovered != Some(node) {
                    return false;
                }
                self.clear_hover(doc);
                true
            }
            PointerEvent::Click { node, point } => {
                if !doc.is_element(node) || !doc.contains(root, node) {
                    return false;
                }
                let target = promote_at_edge(doc, root, node, point, edge_margin, geometry);
                self.select(doc, root, target)
            }
            PointerEvent::ClickOutside => self.clear(doc),
        }
    }

    /// Select `node` directly, without edge promotion.
    pub fn select(&mut self, doc: &mut Document, root: NodeId, node: NodeId) -> bool {
        let Some(path) = compute_path(doc, root, node) else {
            return false;
        };
        let Some(selection) = Selection::capture(doc, node, path) else {
            return false;
        };
        if let Some(previous) = self.selected.take() {
            doc.remove_attr(previous.node, SELECTED_ATTR);
        }
        doc.set_attr(node, SELECTED_ATTR, "");
        doc.remove_attr(node, HOVERED_ATTR);
        debug!(path = %selection.path, tag = %selection.tag, "selected");

        self.expanded = selection.kind.groups().iter().copied().collect();
        self.selected = Some(selection);
        self.sidebar_open = true;
        true
    }

    /// Drop the selection and close the sidebar.
    pub fn clear(&mut self, doc: &mut Document) -> bool {
        let Some(previous) = self.selected.take() else {
            return false;
        };
        doc.remove_attr(previous.node, SELECTED_ATTR);
        if self.hovered == Some(previous.node) {
            doc.set_attr(previous.node, HOVERED_ATTR, "");
        }
        self.sidebar_open = false;
        true
    }

    /// Forget all state without touching a document. Used when the
    /// document the node ids belong to has been replaced.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Re-resolve the selection in the same document after a structural
    /// edit. Clears it when the node has left the tree.
    pub fn refresh(&mut self, doc: &mut Document, root: NodeId) {
        if self.hovered.is_some_and(|n| !doc.contains(root, n)) {
            self.hovered = None;
        }
        let Some(selected) = &self.selected else {
            return;
        };
        let node = selected.node;
        match compute_path(doc, root, node).and_then(|path| Selection::capture(doc, node, path)) {
            Some(updated) => self.selected = Some(updated),
            None => {
                self.selected = None;
                self.sidebar_open = false;
            }
        }
    }

    /// Carry the selection over to a freshly built document by path.
    pub fn reattach(&mut self, doc: &mut Document, root: NodeId) {
        self.hovered = None;
        let Some(previous) = self.selected.take() else {
            return;
        };
        match resolve_path(doc, root, &previous.path)
            .and_then(|node| Selection::capture(doc, node, previous.path.clone()))
        {
            Some(selection) => {
                doc.set_attr(selection.node, SELECTED_ATTR, "");
                self.selected = Some(selection);
            }
            None => {
                debug!(path = %previous.path, "selection lost on rebuild");
                self.sidebar_open = false;
            }
        }
    }

    fn is_selected(&self, node: NodeId) -> bool {
        self.selected.as_ref().is_some_and(|s| s.node == node)
    }

    fn clear_hover(&mut self, doc: &mut Document) {
        if let Some(previous) = self.hovered.take() {
            doc.remove_attr(previous, HOVERED_ATTR);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;

    fn no_geometry(_: NodeId) -> Option<Rect> {
        None
    }

    fn setup() -> (Document, NodeId) {
        let doc = Document::parse(
            r#"<section><h1>Matte lipstick</h1><p style="margin: 0">Long wear</p><img src="a.png"></section>"#,
        );
        let body = doc.body().unwrap();
        (doc, body)
    }

    fn at(doc: &Document, root: NodeId, path: &str) -> NodeId {
        resolve_path(doc, root, &path.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_hover_and_leave() {
        let (mut doc, body) = setup();
        let mut state = SelectionState::new();
        let h1 = at(&doc, body, "0.0");

        assert!(state.handle(&mut doc, body, PointerEvent::Enter(h1), &no_geometry, 6.0));
        assert_eq!(doc.attr(h1, HOVERED_ATTR), Some(""));
        assert!(state.handle(&mut doc, body, PointerEvent::Leave(h1), &no_geometry, 6.0));
        assert_eq!(doc.attr(h1, HOVERED_ATTR), None);
        assert_eq!(state.hovered(), None);
    }

    #[test]
    fn test_click_selects_and_caches() {
        let (mut doc, body) = setup();
        let mut state = SelectionState::new();
        let p = at(&doc, body, "0.1");

        let click = PointerEvent::Click {
            node: p,
            point: Point::new(50.0, 50.0),
        };
        assert!(state.handle(&mut doc, body, click, &no_geometry, 6.0));

        let selected = state.selected().unwrap();
        assert_eq!(selected.path.to_string(), "0.1");
        assert_eq!(selected.tag, "p");
        assert_eq!(selected.text, "Long wear");
        assert_eq!(selected.kind, ElementKind::Text);
        assert!(state.sidebar_open());
        assert!(state.is_expanded(PropertyGroup::Content));
        assert_eq!(doc.attr(p, SELECTED_ATTR), Some(""));
    }

    #[test]
    fn test_hover_suppressed_on_selected() {
        let (mut doc, body) = setup();
        let mut state = SelectionState::new();
        let p = at(&doc, body, "0.1");

        state.select(&mut doc, body, p);
        state.handle(&mut doc, body, PointerEvent::Enter(p), &no_geometry, 6.0);
        assert_eq!(state.hovered(), Some(p));
        assert_eq!(doc.attr(p, HOVERED_ATTR), None);

        state.handle(&mut doc, body, PointerEvent::ClickOutside, &no_geometry, 6.0);
        assert!(state.selected().is_none());
        assert!(!state.sidebar_open());
        assert_eq!(doc.attr(p, SELECTED_ATTR), None);
        assert_eq!(doc.attr(p, HOVERED_ATTR), Some(""));
    }

    #[test]
    fn test_edge_click_promotes_to_container() {
        let (mut doc, body) = setup();
        let mut state = SelectionState::new();
        let section = at(&doc, body, "0");
        let h1 = at(&doc, body, "0.0");

        let geometry = move |node: NodeId| {
            if node == h1 {
                Some(Rect::new(10.0, 10.0, 200.0, 40.0))
            } else if node == section {
                Some(Rect::new(0.0, 0.0, 300.0, 400.0))
            } else {
                None
            }
        };
        let click = PointerEvent::Click {
            node: h1,
            point: Point::new(12.0, 25.0),
        };
        state.handle(&mut doc, body, click, &geometry, 6.0);
        assert_eq!(state.selected().unwrap().node, section);

        let click = PointerEvent::Click {
            node: h1,
            point: Point::new(100.0, 25.0),
        };
        state.handle(&mut doc, body, click, &geometry, 6.0);
        assert_eq!(state.selected().unwrap().node, h1);
        assert_eq!(doc.attr(section, SELECTED_ATTR), None);
    }

    #[test]
    fn test_switching_selection_expands_all_groups() {
        let (mut doc, body) = setup();
        let mut state = SelectionState::new();
        let target = at(&doc, body, "0.1");
        state.select(&mut doc, body, target);
        state.toggle_group(PropertyGroup::Style);
        assert!(!state.is_expanded(PropertyGroup::Style));

        let target = at(&doc, body, "0.2");
        state.select(&mut doc, body, target);
        assert_eq!(state.selected().unwrap().kind, ElementKind::Image);
        assert!(state.is_expanded(PropertyGroup::Style));
    }

    #[test]
    fn test_refresh_after_detach() {
        let (mut doc, body) = setup();
        let mut state = SelectionState::new();
        let h1 = at(&doc, body, "0.0");
        let p = at(&doc, body, "0.1");
        state.select(&mut doc, body, p);

        doc.detach(h1);
        state.refresh(&mut doc, body);
        assert_eq!(state.selected().unwrap().path.to_string(), "0.0");

        doc.detach(p);
        state.refresh(&mut doc, body);
        assert!(state.selected().is_none());
    }

    #[test]
    fn test_inline_style_merges_override() {
        let (mut doc, body) = setup();
        let mut state = SelectionState::new();
        let p = at(&doc, body, "0.1");
        doc.set_inline_override(p, Some("color: red; margin: 4px".into()));
        state.select(&mut doc, body, p);

        let style = state.selected().unwrap().inline_style(&doc);
        assert_eq!(style.get("margin"), Some("4px"));
        assert_eq!(style.get("color"), Some("red"));
    }
}
