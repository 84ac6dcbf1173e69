//! Memoized page compilation.

use serde_json::Value;
use tracing::debug;

use crate::error::Result;

use super::{EngineKind, EngineRegistry};

/// Outcome of [`TemplateCompiler::compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compiled {
    /// Output matches the markup that is already installed.
    Unchanged,
    /// New markup that has to be installed.
    Changed(String),
}

/// Renders page templates and remembers the last output so that a no-op
/// recompile does not rebuild the document.
#[derive(Debug, Default)]
pub struct TemplateCompiler {
    registry: EngineRegistry,
    last: Option<String>,
}

impl TemplateCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: EngineRegistry) -> Self {
        Self {
            registry,
            last: None,
        }
    }

    pub fn registry_mut(&mut self) -> &mut EngineRegistry {
        &mut self.registry
    }

    /// Render without touching the memo. Used for offscreen renders.
    pub fn render(&self, kind: EngineKind, page_html: &str, data: &Value) -> Result<String> {
        self.registry.render(kind, page_html, data)
    }

    pub fn compile(&mut self, kind: EngineKind, page_html: &str, data: &Value) -> Result<Compiled> {
        let markup = self.render(kind, page_html, data)?;
        Ok(self.remember(markup))
    }

    /// Memoize markup produced without the engine.
    pub fn remember(&mut self, markup: String) -> Compiled {
        if self.last.as_deref() == Some(markup.as_str()) {
            debug!("compiled markup unchanged");
            return Compiled::Unchanged;
        }
        self.last = Some(markup.clone());
        Compiled::Changed(markup)
    }

    /// Markup returned by the last `Changed` compile.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Forget the memo so the next compile always reports `Changed`.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_memoizes_identical_output() {
        let mut compiler = TemplateCompiler::new();
        let page = "<p>{{x}}</p>";

        assert_eq!(
            compiler.compile(EngineKind::Mustache, page, &json!({"x": "hello"})).unwrap(),
            Compiled::Changed("<p>hello</p>".into())
        );
        assert_eq!(
            compiler.compile(EngineKind::Mustache, page, &json!({"x": "hello", "unused": 1})).unwrap(),
            Compiled::Unchanged
        );
        assert_eq!(
            compiler.compile(EngineKind::Mustache, page, &json!({"x": "world"})).unwrap(),
            Compiled::Changed("<p>world</p>".into())
        );
    }

    #[test]
    fn test_invalidate_forces_change() {
        let mut compiler = TemplateCompiler::new();
        let data = json!({});
        compiler.compile(EngineKind::Mustache, "<p>a</p>", &data).unwrap();
        compiler.invalidate();
        assert!(matches!(
            compiler.compile(EngineKind::Mustache, "<p>a</p>", &data).unwrap(),
            Compiled::Changed(_)
        ));
    }

    #[test]
    fn test_error_keeps_memo() {
        let mut compiler = TemplateCompiler::new();
        let data = json!({"x": 1});
        compiler.compile(EngineKind::Mustache, "{{x}}", &data).unwrap();
        assert!(compiler.compile(EngineKind::Mustache, "{{#x}}", &data).is_err());
        assert_eq!(compiler.last(), Some("1"));
    }

    #[test]
    fn test_remember_shares_memo_with_compile() {
        let mut compiler = TemplateCompiler::new();
        compiler.compile(EngineKind::Mustache, "<p>{{x}}</p>", &json!({"x": "{{y}}"})).unwrap();
        assert_eq!(compiler.remember("<p>{{y}}</p>".into()), Compiled::Unchanged);
        assert_eq!(
            compiler.remember("<p>z</p>".into()),
            Compiled::Changed("<p>z</p>".into())
        );
    }
}
