//! # vitrine
//!
//! Editor core for template-driven catalogue pages.
//!
//! ## Features
//!
//! - Compile logic-less `{{mustache}}` page templates against live JSON data
//! - Address elements of the rendered page by [`Path`]
//! - Record sparse per-element style overrides and replay them after every
//!   rebuild, following elements across structural edits
//! - Undo/redo over overrides, text and structure
//! - Pointer-driven selection with edge promotion to containers
//! - Debounced persistence through a pluggable [`EditorStore`]
//!
//! ## Quick Start
//!
//! ```
//! use serde_json::json;
//! use vitrine::{Editor, MemoryStore, Page, StylePatch, Template};
//!
//! let template = Template::new(
//!     "furniture",
//!     vec![Page::new("Cover", "<section><h1>{{title}}</h1><p>{{price}}</p></section>")],
//! );
//! let mut editor = Editor::new("spring-catalogue", template, Box::new(MemoryStore::new()))
//!     .with_live_data(json!({"title": "Oak table", "price": "$899"}));
//! editor.mount();
//!
//! editor.set_style(&"0.1".parse().unwrap(), &StylePatch::new().with("fontSize", "20px"));
//! editor.set_field("price", json!("$799")).unwrap();
//!
//! // The override survives the rebuild triggered by the data change.
//! assert!(editor.live_markup().contains(r#"style="font-size: 20px">$799</p>"#));
//! ```

pub mod config;
pub mod dom;
pub mod editor;
pub mod error;
pub mod history;
pub mod page;
pub mod path;
pub mod persist;
pub mod selection;
pub mod style;
pub mod template;

pub use config::EditorConfig;
pub use dom::{Document, NodeId, SerializeOptions};
pub use editor::{Editor, EditorListener, ExportFormat, Rasterizer};
pub use error::{Error, Result};
pub use history::History;
pub use page::{Page, PageList, Template};
pub use path::{Geometry, Path, compute_path, resolve_path};
pub use persist::{EditorState, EditorStore, FileStore, MemoryStore, SaveScheduler};
pub use selection::{ElementKind, PointerEvent, PropertyGroup, SelectionState};
pub use style::{HoverStyle, StyleMutationMap, StylePatch};
pub use template::{EngineKind, TemplateEngine};
