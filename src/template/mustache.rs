//! Logic-less `{{mustache}}` rendering over JSON data.
//!
//! Supported tags: `{{name}}` (HTML-escaped), `{{{name}}}` and `{{& name}}`
//! (raw), dotted names, `{{.}}`, sections `{{#name}}…{{/name}}`, inverted
//! sections `{{^name}}…{{/name}}` and comments `{{! … }}`. Partials and
//! delimiter changes are rejected. A missing name renders as an empty
//! string.

use serde_json::Value;

use crate::error::{Error, Result};

use super::TemplateEngine;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Variable {
        name: String,
        escape: bool,
    },
    Section {
        name: String,
        inverted: bool,
        children: Vec<Token>,
    },
}

/// Parsed template, reusable across renders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    tokens: Vec<Token>,
}

impl CompiledTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            tokens: parse(source)?,
        })
    }

    pub fn render(&self, data: &Value) -> String {
        let mut out = String::new();
        let mut scopes = vec![data];
        render_tokens(&self.tokens, &mut scopes, &mut out);
        out
    }
}

/// The default engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MustacheEngine;

impl TemplateEngine for MustacheEngine {
    fn name(&self) -> &'static str {
        "mustache"
    }

    fn render(&self, template: &str, data: &Value) -> Result<String> {
        Ok(CompiledTemplate::parse(template)?.render(data))
    }
}

struct OpenSection {
    name: String,
    inverted: bool,
    tokens: Vec<Token>,
}

fn parse(source: &str) -> Result<Vec<Token>> {
    let mut stack: Vec<OpenSection> = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut rest = source;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            current.push(Token::Text(rest[..open].to_string()));
        }
        let after_open = &rest[open + 2..];

        if let Some(raw) = after_open.strip_prefix('{') {
            let close = raw
                .find("}}}")
                .ok_or_else(|| Error::Template("unclosed triple mustache".into()))?;
            current.push(Token::Variable {
                name: raw[..close].trim().to_string(),
                escape: false,
            });
            rest = &raw[close + 3..];
            continue;
        }

        let close = after_open
            .find("}}")
            .ok_or_else(|| Error::Template("unclosed tag".into()))?;
        let tag = after_open[..close].trim();
        rest = &after_open[close + 2..];

        let (sigil, name) = match tag.chars().next() {
            Some(c @ ('#' | '^' | '/' | '!' | '&' | '>' | '=')) => (Some(c), tag[1..].trim()),
            _ => (None, tag),
        };

        match sigil {
            Some('!') => {}
            Some('#') | Some('^') => {
                stack.push(OpenSection {
                    name: name.to_string(),
                    inverted: sigil == Some('^'),
                    tokens: std::mem::take(&mut current),
                });
            }
            Some('/') => {
                let open = stack
                    .pop()
                    .ok_or_else(|| Error::Template(format!("unopened section {name:?}")))?;
                if open.name != name {
                    return Err(Error::Template(format!(
                        "section {:?} closed by {name:?}",
                        open.name
                    )));
                }
                let children = std::mem::replace(&mut current, open.tokens);
                current.push(Token::Section {
                    name: open.name,
                    inverted: open.inverted,
                    children,
                });
            }
            Some('&') => current.push(Token::Variable {
                name: name.to_string(),
                escape: false,
            }),
            Some('>') => return Err(Error::Template(format!("partial {name:?} not supported"))),
            Some('=') => return Err(Error::Template("delimiter changes not supported".into())),
            _ => current.push(Token::Variable {
                name: name.to_string(),
                escape: true,
            }),
        }
    }

    if !rest.is_empty() {
        current.push(Token::Text(rest.to_string()));
    }
    if let Some(open) = stack.pop() {
        return Err(Error::Template(format!("unclosed section {:?}", open.name)));
    }
    Ok(current)
}

fn render_tokens<'a>(tokens: &[Token], scopes: &mut Vec<&'a Value>, out: &mut String) {
    for token in tokens {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Variable { name, escape } => {
                let text = lookup(scopes, name).map(display).unwrap_or_default();
                if *escape {
                    out.push_str(&escape_html(&text));
                } else {
                    out.push_str(&text);
                }
            }
            Token::Section {
                name,
                inverted,
                children,
            } => {
                let value = lookup(scopes, name);
                let truthy = value.is_some_and(is_truthy);
                if *inverted {
                    if !truthy {
                        render_tokens(children, scopes, out);
                    }
                    continue;
                }
                let Some(value) = value.filter(|v| is_truthy(v)) else {
                    continue;
                };
                match value {
                    Value::Array(items) => {
                        for item in items {
                            scopes.push(item);
                            render_tokens(children, scopes, out);
                            scopes.pop();
                        }
                    }
                    _ => {
                        scopes.push(value);
                        render_tokens(children, scopes, out);
                        scopes.pop();
                    }
                }
            }
        }
    }
}

/// Resolve a (possibly dotted) name against the scope stack, innermost
/// first. Only the first segment searches outward; the rest descend from
/// wherever it was found.
fn lookup<'a>(scopes: &[&'a Value], name: &str) -> Option<&'a Value> {
    if name == "." {
        return scopes.last().copied();
    }
    let mut segments = name.split('.');
    let first = segments.next()?;
    let mut value = scopes
        .iter()
        .rev()
        .find_map(|scope| (*scope).get(first))?;
    for segment in segments {
        value = match value {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => value.get(segment)?,
        };
    }
    Some(value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => String::new(),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn render(template: &str, data: Value) -> String {
        MustacheEngine.render(template, &data).unwrap()
    }

    #[test]
    fn test_variable() {
        assert_eq!(render("<p>{{x}}</p>", json!({"x": "hello"})), "<p>hello</p>");
        assert_eq!(render("<p>{{x}}</p>", json!({"x": "world"})), "<p>world</p>");
    }

    #[test]
    fn test_missing_renders_empty() {
        assert_eq!(render("<p>{{nope}}</p>", json!({})), "<p></p>");
        assert_eq!(render("{{a.b.c}}", json!({"a": {"b": 1}})), "");
    }

    #[test]
    fn test_dotted_names() {
        let data = json!({"product": {"title": "Lip Oil", "price": 18.5}});
        assert_eq!(
            render("{{product.title}} ${{product.price}}", data),
            "Lip Oil $18.5"
        );
    }

    #[test]
    fn test_escaping() {
        let data = json!({"html": "<b>&</b>"});
        assert_eq!(render("{{html}}", data.clone()), "&lt;b&gt;&amp;&lt;/b&gt;");
        assert_eq!(render("{{{html}}}", data.clone()), "<b>&</b>");
        assert_eq!(render("{{& html}}", data), "<b>&</b>");
    }

    #[test]
    fn test_list_section() {
        let data = json!({"items": [{"name": "Sofa"}, {"name": "Lamp"}]});
        assert_eq!(
            render("<ul>{{#items}}<li>{{name}}</li>{{/items}}</ul>", data),
            "<ul><li>Sofa</li><li>Lamp</li></ul>"
        );
    }

    #[test]
    fn test_falsy_sections() {
        let tpl = "{{#x}}yes{{/x}}{{^x}}no{{/x}}";
        assert_eq!(render(tpl, json!({"x": []})), "no");
        assert_eq!(render(tpl, json!({"x": false})), "no");
        assert_eq!(render(tpl, json!({"x": ""})), "no");
        assert_eq!(render(tpl, json!({})), "no");
        assert_eq!(render(tpl, json!({"x": true})), "yes");
        assert_eq!(render(tpl, json!({"x": {"y": 1}})), "yes");
    }

    #[test]
    fn test_outer_scope_visible_in_section() {
        let data = json!({"currency": "€", "items": [{"price": 3}, {"price": 5}]});
        assert_eq!(
            render("{{#items}}{{price}}{{currency}} {{/items}}", data),
            "3€ 5€ "
        );
    }

    #[test]
    fn test_implicit_iterator_and_comment() {
        let data = json!({"tags": ["new", "sale"]});
        assert_eq!(
            render("{{! badges }}{{#tags}}[{{.}}]{{/tags}}", data),
            "[new][sale]"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(CompiledTemplate::parse("{{#a}}x").is_err());
        assert!(CompiledTemplate::parse("{{#a}}x{{/b}}").is_err());
        assert!(CompiledTemplate::parse("{{/a}}").is_err());
        assert!(CompiledTemplate::parse("{{x").is_err());
        assert!(CompiledTemplate::parse("{{> header}}").is_err());
    }

    #[test]
    fn test_render_is_deterministic() {
        let tpl = CompiledTemplate::parse("<h1>{{title}}</h1><p>{{body}}</p>").unwrap();
        let data = json!({"title": "Fall", "body": "Knitwear"});
        assert_eq!(tpl.render(&data), tpl.render(&data));

        let changed = json!({"title": "Winter", "body": "Knitwear"});
        assert_eq!(tpl.render(&changed), "<h1>Winter</h1><p>Knitwear</p>");
    }
}
