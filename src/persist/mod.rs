//! Saving and restoring editor state.
//!
//! The editor talks to storage only through [`EditorStore`]. Saves are
//! debounced by [`SaveScheduler`]: a save fires once a quiet period has
//! passed without further edits.

mod scheduler;
mod store;

pub use scheduler::SaveScheduler;
pub use store::{EditorStore, FileStore, MemoryStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::page::PageList;
use crate::style::{HoverStyles, StyleMutationMap};

/// Everything persisted for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    #[serde(default)]
    pub live_data: Value,
    /// Overrides of the page at `current_page_index`.
    #[serde(default)]
    pub style_mutations: StyleMutationMap,
    pub template_id: String,
    pub pages: PageList,
    #[serde(default)]
    pub current_page_index: usize,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub grid_visible: bool,
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "HoverStyles::is_empty")]
    pub hover_styles: HoverStyles,
}

fn default_zoom() -> f64 {
    1.0
}

impl EditorState {
    /// Whether two states carry the same content. Page timestamps and
    /// `last_saved_at` are ignored.
    pub fn equivalent(&self, other: &EditorState) -> bool {
        self.live_data == other.live_data
            && self.style_mutations == other.style_mutations
            && self.template_id == other.template_id
            && self.pages.same_content(&other.pages)
            && self.current_page_index == other.current_page_index
            && self.zoom == other.zoom
            && self.grid_visible == other.grid_visible
            && self.hover_styles == other.hover_styles
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_shape() {
        let state: EditorState = serde_json::from_value(json!({
            "liveData": {"title": "Autumn"},
            "styleMutations": {"0.1": {"color": "#ff0000"}},
            "templateId": "fashion",
            "pages": [{"id": "p1", "name": "Cover", "html": "<h1>{{title}}</h1>"}],
            "currentPageIndex": 0,
            "zoom": 1.25,
            "gridVisible": true,
            "lastSavedAt": null
        }))
        .unwrap();

        assert_eq!(state.template_id, "fashion");
        assert_eq!(state.pages.len(), 1);
        assert_eq!(
            state
                .style_mutations
                .get(&"0.1".parse().unwrap())
                .and_then(|p| p.get("color")),
            Some("#ff0000")
        );

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["styleMutations"], json!({"0.1": {"color": "#ff0000"}}));
        assert_eq!(value["gridVisible"], json!(true));
        assert!(value.get("hoverStyles").is_none());
    }

    #[test]
    fn test_missing_view_state_defaults() {
        let state: EditorState = serde_json::from_value(json!({
            "templateId": "fmcg",
            "pages": []
        }))
        .unwrap();
        assert_eq!(state.zoom, 1.0);
        assert!(!state.grid_visible);
        assert_eq!(state.live_data, Value::Null);
    }
}
