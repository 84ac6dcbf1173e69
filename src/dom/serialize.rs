//! HTML serialization for [`Document`] subtrees.

use super::arena::{Document, NodeData, NodeId};
use super::{HOVER_KEY_ATTR, is_bookkeeping_attr};

/// What to emit when serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Merge replayed style overrides into the `style` attribute.
    pub include_overrides: bool,
    /// Drop `data-vt-*` attributes.
    pub strip_bookkeeping: bool,
    /// Keep hover markers even when stripping bookkeeping, so a generated
    /// hover stylesheet still applies.
    pub keep_hover_keys: bool,
}

impl SerializeOptions {
    /// Exactly what the live document looks like.
    pub const LIVE: Self = Self {
        include_overrides: true,
        strip_bookkeeping: false,
        keep_hover_keys: true,
    };

    /// Author markup only: no overrides, no editor attributes. This is what
    /// gets written back into a page.
    pub const CLEAN: Self = Self {
        include_overrides: false,
        strip_bookkeeping: true,
        keep_hover_keys: false,
    };

    /// Standalone output: overrides baked in, editor attributes other than
    /// hover markers removed.
    pub const EXPORT: Self = Self {
        include_overrides: true,
        strip_bookkeeping: true,
        keep_hover_keys: true,
    };
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize the children of `node`.
pub fn inner_html(doc: &Document, node: NodeId, options: SerializeOptions) -> String {
    let mut out = String::new();
    let raw = doc
        .tag_name(node)
        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
    for child in doc.children(node) {
        write_node(doc, child, options, raw, &mut out);
    }
    out
}

/// Serialize `node` including its own tag.
pub fn outer_html(doc: &Document, node: NodeId, options: SerializeOptions) -> String {
    let mut out = String::new();
    write_node(doc, node, options, false, &mut out);
    out
}

fn write_node(
    doc: &Document,
    id: NodeId,
    options: SerializeOptions,
    raw_text: bool,
    out: &mut String,
) {
    let Some(node) = doc.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Document => {
            for child in doc.children(id) {
                write_node(doc, child, options, false, out);
            }
        }
        NodeData::Doctype { name, .. } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        NodeData::Element {
            name,
            attrs,
            inline_override,
        } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);

            let override_css = inline_override
                .as_deref()
                .filter(|css| options.include_overrides && !css.is_empty());
            let mut wrote_style = false;

            for attr in attrs {
                let attr_name = attr.name.local.as_ref();
                if options.strip_bookkeeping
                    && is_bookkeeping_attr(attr_name)
                    && !(options.keep_hover_keys && attr_name == HOVER_KEY_ATTR)
                {
                    continue;
                }
                if attr_name == "style" {
                    if let Some(css) = override_css {
                        write_attr(out, "style", &merge_style(&attr.value, css));
                        wrote_style = true;
                        continue;
                    }
                }
                write_attr(out, attr_name, &attr.value);
            }
            if !wrote_style && let Some(css) = override_css {
                write_attr(out, "style", css);
            }

            out.push('>');
            if VOID_ELEMENTS.contains(&tag) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&tag);
            for child in doc.children(id) {
                write_node(doc, child, options, raw, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

/// Author style first, override last so its declarations win.
fn merge_style(base: &str, overlay: &str) -> String {
    let base = base.trim().trim_end_matches(';').trim();
    if base.is_empty() {
        overlay.to_string()
    } else {
        format!("{base}; {overlay}")
    }
}

pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NODE_ID_ATTR;

    #[test]
    fn test_round_trip_body() {
        let doc = Document::parse(r#"<p class="a">x &amp; y</p><img src="a.png"><br>"#);
        let body = doc.body().unwrap();
        assert_eq!(
            inner_html(&doc, body, SerializeOptions::LIVE),
            r#"<p class="a">x &amp; y</p><img src="a.png"><br>"#
        );
    }

    #[test]
    fn test_override_merges_with_author_style() {
        let mut doc = Document::parse(r#"<p style="margin: 0;">a</p><span>b</span>"#);
        let body = doc.body().unwrap();
        let p = doc.element_child(body, 0).unwrap();
        let span = doc.element_child(body, 1).unwrap();
        doc.set_inline_override(p, Some("color: red".into()));
        doc.set_inline_override(span, Some("font-size: 20px".into()));

        assert_eq!(
            inner_html(&doc, body, SerializeOptions::LIVE),
            r#"<p style="margin: 0; color: red">a</p><span style="font-size: 20px">b</span>"#
        );
        assert_eq!(
            inner_html(&doc, body, SerializeOptions::CLEAN),
            r#"<p style="margin: 0;">a</p><span>b</span>"#
        );
    }

    #[test]
    fn test_clean_strips_bookkeeping() {
        let mut doc = Document::parse("<div><p>a</p></div>");
        let body = doc.body().unwrap();
        let div = doc.element_child(body, 0).unwrap();
        doc.set_attr(div, NODE_ID_ATTR, "vt-1");
        doc.set_attr(div, "data-user", "kept");

        assert_eq!(
            inner_html(&doc, body, SerializeOptions::CLEAN),
            r#"<div data-user="kept"><p>a</p></div>"#
        );
        assert!(inner_html(&doc, body, SerializeOptions::LIVE).contains("data-vt-id"));
    }

    #[test]
    fn test_style_text_not_escaped() {
        let doc = Document::parse("<style>a > b { color: red }</style><p>a > b</p>");
        let style = doc.find_by_tag("style").unwrap();
        assert_eq!(
            outer_html(&doc, style, SerializeOptions::LIVE),
            "<style>a > b { color: red }</style>"
        );
        let p = doc.find_by_tag("p").unwrap();
        assert_eq!(outer_html(&doc, p, SerializeOptions::LIVE), "<p>a &gt; b</p>");
    }
}
