//! Template engines and the memoizing page compiler.
//!
//! Templates declare which engine they were written for. Engines are looked
//! up by [`EngineKind`] in an [`EngineRegistry`]; every kind currently maps
//! to the logic-less [`MustacheEngine`].
//!
//! ```
//! use serde_json::json;
//! use vitrine::template::{EngineKind, EngineRegistry};
//!
//! let registry = EngineRegistry::default();
//! let html = registry
//!     .render(EngineKind::Handlebars, "<h2>{{product.title}}</h2>", &json!({"product": {"title": "Oak table"}}))
//!     .unwrap();
//! assert_eq!(html, "<h2>Oak table</h2>");
//! ```

mod compiler;
mod mustache;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub use compiler::{Compiled, TemplateCompiler};
pub use mustache::{CompiledTemplate, MustacheEngine, escape_html};

/// Renders a template string against live data.
pub trait TemplateEngine {
    fn name(&self) -> &'static str;

    fn render(&self, template: &str, data: &Value) -> Result<String>;
}

/// Engine identifier declared by a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Mustache,
    Handlebars,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Mustache => f.write_str("mustache"),
            EngineKind::Handlebars => f.write_str("handlebars"),
        }
    }
}

/// Engines keyed by the kind they serve.
pub struct EngineRegistry {
    engines: HashMap<EngineKind, Box<dyn TemplateEngine>>,
}

impl EngineRegistry {
    pub fn empty() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: EngineKind, engine: Box<dyn TemplateEngine>) {
        self.engines.insert(kind, engine);
    }

    pub fn get(&self, kind: EngineKind) -> Option<&dyn TemplateEngine> {
        self.engines.get(&kind).map(|e| e.as_ref())
    }

    pub fn render(&self, kind: EngineKind, template: &str, data: &Value) -> Result<String> {
        let engine = self
            .get(kind)
            .ok_or_else(|| Error::Unsupported(format!("no engine registered for {kind}")))?;
        engine.render(template, data)
    }
}

impl Default for EngineRegistry {
    /// Both kinds render with the logic-less engine: only plain
    /// substitution and sections are guaranteed for either.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(EngineKind::Mustache, Box::new(MustacheEngine));
        registry.register(EngineKind::Handlebars, Box::new(MustacheEngine));
        registry
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.engines.keys().map(|k| k.to_string()).collect();
        kinds.sort();
        f.debug_struct("EngineRegistry").field("engines", &kinds).finish()
    }
}
