use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::style::StyleMutationMap;

/// Callbacks into the host application. Every method defaults to a no-op.
pub trait EditorListener {
    /// The first document has been installed.
    fn on_ready(&mut self) {}

    fn on_live_data_changed(&mut self, _data: &Value) {}

    fn on_style_mutations_changed(&mut self, _mutations: &StyleMutationMap) {}

    fn on_save_succeeded(&mut self, _saved_at: DateTime<Utc>) {}

    /// A save failed; another attempt is scheduled after the debounce delay.
    fn on_save_failed(&mut self, _reason: &str) {}

    /// User-visible message, used when a template or page cannot be
    /// resolved.
    fn on_notify(&mut self, _message: &str) {}
}

/// Listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl EditorListener for NoopListener {}
