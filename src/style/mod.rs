//! Per-element style overrides.
//!
//! Edits from the property sidebar never touch template markup. They are
//! recorded as a sparse [`StyleMutationMap`] from [`Path`](crate::Path) to
//! [`StylePatch`] and replayed onto the document after every rebuild.
//!
//! ```
//! use vitrine::dom::Document;
//! use vitrine::style::{StylePatch, StyleStore};
//!
//! let mut doc = Document::parse("<div><p>Retinol night cream</p></div>");
//! let body = doc.body().unwrap();
//! let mut store = StyleStore::new();
//!
//! let patch = StylePatch::new().with("fontSize", "20px");
//! store.set_style(&mut doc, body, "0.0".parse().unwrap(), &patch, |_| {});
//! assert_eq!(store.map().len(), 1);
//! ```

mod hover;
mod inline;
mod patch;
mod store;

pub use hover::{HoverStyle, HoverStyles};
pub use inline::{parse_inline_style, plain_value};
pub use patch::{StyleMutationMap, StylePatch, camel_case_name, css_property_name};
pub use store::StyleStore;
