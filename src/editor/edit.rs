//! Undoable edits: overrides, text and structure.

use tracing::debug;

use crate::dom::{Document, NodeId, is_bookkeeping_attr};
use crate::error::{Error, Result};
use crate::path::{Path, compute_path, resolve_path};
use crate::style::{HoverStyle, StylePatch, StyleStore, plain_value};

use super::{EditSnapshot, Editor};

impl Editor {
    fn snapshot(&self) -> EditSnapshot {
        let (page_id, markup, baked) = self
            .pages
            .get(self.current_page)
            .map(|page| (page.id.clone(), page.html.clone(), page.baked))
            .unwrap_or_default();
        EditSnapshot {
            page_id,
            styles: self.styles.map().clone(),
            markup,
            baked,
        }
    }

    /// Merge `patch` into the override for `path` and apply it.
    ///
    /// The edit is recorded even when the path does not resolve right now;
    /// returns whether a live element was styled.
    pub fn set_style(&mut self, path: &Path, patch: &StylePatch) -> bool {
        let snapshot = self.snapshot();
        let history = &mut self.history;
        let found = self.styles.set_style(
            &mut self.document,
            self.root,
            path.clone(),
            patch,
            |_| history.record(snapshot),
        );
        self.listener.on_style_mutations_changed(self.styles.map());
        self.mark_dirty();
        found
    }

    /// Style the selected element. `false` when nothing is selected.
    pub fn style_selected(&mut self, patch: &StylePatch) -> bool {
        let Some(path) = self.selection.selected().map(|s| s.path.clone()) else {
            return false;
        };
        self.set_style(&path, patch)
    }

    /// Set hover colours for `path`. Not recorded in the undo history.
    ///
    /// Each colour must be a single CSS value; anything that would not stay
    /// inside its declaration in the generated stylesheet is refused.
    pub fn set_hover_style(&mut self, path: &Path, style: &HoverStyle) -> Result<()> {
        for value in [&style.background_color, &style.color].into_iter().flatten() {
            if plain_value(value).is_none() {
                return Err(Error::InvalidStyle(value.clone()));
            }
        }
        self.hover_styles.set(path.clone(), style);
        self.refresh_hover();
        self.mark_dirty();
        Ok(())
    }

    pub fn clear_hover_style(&mut self, path: &Path) -> bool {
        if self.hover_styles.remove(path).is_none() {
            return false;
        }
        self.refresh_hover();
        self.mark_dirty();
        true
    }

    fn refresh_hover(&mut self) {
        self.hover_styles.mark(&mut self.document, self.root);
        if let Some(sheet) = self.hover_sheet() {
            let css = self.hover_styles.stylesheet();
            self.document.set_text(sheet, &css);
        }
    }

    /// Replace the text content of the element at `path`.
    pub fn set_text(&mut self, path: &Path, text: &str) -> bool {
        self.edit_structure(|doc, root| {
            let node = resolve_path(doc, root, path)?;
            doc.set_text(node, text).then_some(())
        })
        .is_some()
    }

    /// Set an attribute on the element at `path`, such as an image's `src`.
    /// `style`, event handlers and editor attributes cannot be set this way.
    pub fn set_attribute(&mut self, path: &Path, name: &str, value: &str) -> bool {
        let name = name.trim().to_ascii_lowercase();
        if !is_editable_attr(&name) {
            debug!(attr = %name, "attribute is not editable");
            return false;
        }
        self.edit_structure(|doc, root| {
            let node = resolve_path(doc, root, path)?;
            doc.set_attr(node, &name, value).then_some(())
        })
        .is_some()
    }

    /// Parse `html` and insert its first element as the `index`-th element
    /// child of `parent`. Returns the new element's path.
    pub fn insert_element(&mut self, parent: &Path, index: usize, html: &str) -> Option<Path> {
        let fragment = Document::parse(html);
        let body = fragment.body()?;
        let first = fragment.element_children(body).next()?;

        self.edit_structure(|doc, root| {
            let parent = resolve_path(doc, root, parent)?;
            let node = doc.import(&fragment, first);
            doc.insert_child(parent, index, node);
            compute_path(doc, root, node)
        })
    }

    /// Remove the element at `path`. The root cannot be removed.
    pub fn delete_element(&mut self, path: &Path) -> bool {
        if path.is_root() {
            return false;
        }
        self.edit_structure(|doc, root| {
            let node = resolve_path(doc, root, path)?;
            doc.detach(node);
            Some(())
        })
        .is_some()
    }

    /// Move the element at `from` to be the `index`-th element child of
    /// `to_parent`, counted after the element has been taken out. Returns
    /// the element's new path.
    pub fn move_element(&mut self, from: &Path, to_parent: &Path, index: usize) -> Option<Path> {
        if from.is_root() {
            return None;
        }
        self.edit_structure(|doc, root| {
            let node = resolve_path(doc, root, from)?;
            let parent = resolve_path(doc, root, to_parent)?;
            if doc.contains(node, parent) {
                return None;
            }
            doc.insert_child(parent, index, node);
            compute_path(doc, root, node)
        })
    }

    /// Run a structural edit on the live document.
    ///
    /// Overrides and hover styles are pinned to their nodes before the edit
    /// and re-keyed by the nodes' new paths afterwards, so they follow the
    /// elements they were set on. `edit` returning `None` means nothing was
    /// changed and nothing is recorded.
    fn edit_structure<R>(
        &mut self,
        edit: impl FnOnce(&mut Document, NodeId) -> Option<R>,
    ) -> Option<R> {
        let snapshot = self.snapshot();
        let anchored = self.styles.anchor(&self.document, self.root);
        let hover_anchored = self.hover_styles.anchor(&self.document, self.root);
        self.styles.clear_tracked(&mut self.document, self.root);

        let Some(result) = edit(&mut self.document, self.root) else {
            debug!("structural edit target not found");
            self.styles.replay_all(&mut self.document, self.root);
            return None;
        };

        self.history.record(snapshot);
        self.document
            .assign_node_ids(self.root, &mut self.next_node_id);
        self.styles.rebase(&self.document, self.root, anchored);
        self.styles.replay_all(&mut self.document, self.root);
        self.hover_styles
            .rebase(&self.document, self.root, hover_anchored);
        self.refresh_hover();
        self.selection.refresh(&mut self.document, self.root);

        self.write_back();
        self.listener.on_style_mutations_changed(self.styles.map());
        self.mark_dirty();
        Some(result)
    }

    /// Store the live document's clean markup as the active page's source.
    /// The page is baked from here on, so text that looks like a template
    /// tag stays text.
    fn write_back(&mut self) {
        let markup = self.page_markup();
        if let Ok(page) = self.pages.get_mut(self.current_page) {
            page.html = markup;
            page.baked = true;
            page.touch();
        }
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: EditSnapshot) {
        let Some(index) = self.pages.position(&snapshot.page_id) else {
            debug!(page = %snapshot.page_id, "undo target page is gone");
            return;
        };
        if index != self.current_page {
            self.stash_styles();
            if let Err(e) = self.activate(index) {
                self.notify(&format!("could not render page {index}: {e}"));
                return;
            }
        }

        let markup_changed = self
            .pages
            .get(index)
            .is_ok_and(|page| page.html != snapshot.markup || page.baked != snapshot.baked);
        if markup_changed {
            if let Ok(page) = self.pages.get_mut(index) {
                page.html = snapshot.markup;
                page.baked = snapshot.baked;
                page.touch();
            }
            self.styles = StyleStore::with_map(snapshot.styles);
            if let Err(e) = self.rebuild(true) {
                self.notify(&format!("could not render page: {e}"));
            }
        } else {
            self.styles
                .replace(&mut self.document, self.root, snapshot.styles);
        }

        self.listener.on_style_mutations_changed(self.styles.map());
        self.mark_dirty();
    }
}

fn is_editable_attr(name: &str) -> bool {
    !name.is_empty()
        && name != "style"
        && !name.starts_with("on")
        && !is_bookkeeping_attr(name)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}
