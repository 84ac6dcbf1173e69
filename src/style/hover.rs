//! Hover-only styling.
//!
//! Hover colours cannot be expressed as inline styles, so they are kept in a
//! separate sparse map and rendered as one generated stylesheet. Each styled
//! element carries a [`HOVER_KEY_ATTR`] marker the rules select on. These
//! edits are not part of the undo history.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{Document, HOVER_KEY_ATTR, NodeId, escape_attr};
use crate::path::{Path, compute_path, resolve_path};

use super::inline::plain_value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl HoverStyle {
    pub fn is_empty(&self) -> bool {
        self.background_color.is_none() && self.color.is_none()
    }

    fn merge(&mut self, other: &HoverStyle) {
        if other.background_color.is_some() {
            self.background_color.clone_from(&other.background_color);
        }
        if other.color.is_some() {
            self.color.clone_from(&other.color);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoverStyles(BTreeMap<Path, HoverStyle>);

impl HoverStyles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: Path, style: &HoverStyle) {
        self.0.entry(path).or_default().merge(style);
    }

    pub fn get(&self, path: &Path) -> Option<&HoverStyle> {
        self.0.get(path)
    }

    pub fn remove(&mut self, path: &Path) -> Option<HoverStyle> {
        self.0.remove(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the `:hover` rules for every entry. Values that are not a
    /// single CSS value are left out.
    pub fn stylesheet(&self) -> String {
        let mut css = String::new();
        for (path, style) in &self.0 {
            let declarations: Vec<(&str, String)> = [
                ("background-color", &style.background_color),
                ("color", &style.color),
            ]
            .into_iter()
            .filter_map(|(property, value)| {
                let value = value.as_deref()?;
                let plain = plain_value(value);
                if plain.is_none() {
                    debug!(%path, value, "skipping invalid hover value");
                }
                plain.map(|plain| (property, plain))
            })
            .collect();
            if declarations.is_empty() {
                continue;
            }

            let _ = write!(
                css,
                "[{HOVER_KEY_ATTR}=\"{}\"]:hover {{",
                escape_attr(&path.to_string())
            );
            for (property, value) in declarations {
                let _ = write!(css, " {property}: {value} !important;");
            }
            css.push_str(" }\n");
        }
        css
    }

    /// Put a marker on every element that has hover styles and remove stale
    /// markers left from a previous layout.
    pub fn mark(&self, doc: &mut Document, root: NodeId) {
        for id in doc.descendants(root) {
            doc.remove_attr(id, HOVER_KEY_ATTR);
        }
        for path in self.0.keys() {
            if let Some(node) = resolve_path(doc, root, path) {
                doc.set_attr(node, HOVER_KEY_ATTR, &path.to_string());
            }
        }
    }

    /// Rebuild from nodes anchored before a structural edit.
    pub fn rebase(&mut self, doc: &Document, root: NodeId, anchored: Vec<(NodeId, HoverStyle)>) {
        self.0 = anchored
            .into_iter()
            .filter_map(|(node, style)| {
                compute_path(doc, root, node).map(|path| (path, style))
            })
            .collect();
    }

    pub fn anchor(&self, doc: &Document, root: NodeId) -> Vec<(NodeId, HoverStyle)> {
        self.0
            .iter()
            .filter_map(|(path, style)| {
                resolve_path(doc, root, path).map(|node| (node, style.clone()))
            })
            .collect()
    }
}
