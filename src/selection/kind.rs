//! Coarse element classification for the property sidebar.

use serde::{Deserialize, Serialize};

/// What kind of element is selected, as far as editing goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
    Button,
    Container,
    Generic,
}

/// Collapsible field group in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyGroup {
    Content,
    Style,
    Effects,
}

const TEXT_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "a", "label", "li", "strong", "em", "b",
    "i", "u", "small", "blockquote", "figcaption", "td", "th", "dt", "dd", "cite", "q", "mark",
];

const IMAGE_TAGS: &[&str] = &["img", "picture", "svg", "video", "canvas"];

const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "article", "header", "footer", "main", "nav", "aside", "ul", "ol", "dl",
    "figure", "table", "thead", "tbody", "tfoot", "tr", "form", "body",
];

impl ElementKind {
    /// Classify by lowercase tag name. `input_type` is the `type`
    /// attribute, consulted for `<input>` only.
    pub fn classify(tag: &str, input_type: Option<&str>) -> Self {
        match tag {
            "button" => ElementKind::Button,
            "input" => match input_type.map(str::to_ascii_lowercase).as_deref() {
                Some("button" | "submit" | "reset") => ElementKind::Button,
                _ => ElementKind::Generic,
            },
            _ if TEXT_TAGS.contains(&tag) => ElementKind::Text,
            _ if IMAGE_TAGS.contains(&tag) => ElementKind::Image,
            _ if CONTAINER_TAGS.contains(&tag) => ElementKind::Container,
            _ => ElementKind::Generic,
        }
    }

    pub fn groups(self) -> &'static [PropertyGroup] {
        use PropertyGroup::*;
        match self {
            ElementKind::Text | ElementKind::Image | ElementKind::Button => {
                &[Content, Style, Effects]
            }
            ElementKind::Container | ElementKind::Generic => &[Style, Effects],
        }
    }

    /// Editable fields of `group`, as camelCase style properties or, for
    /// [`PropertyGroup::Content`], element attributes applied with
    /// `Editor::set_attribute` (`text` is the text content, see
    /// `Editor::set_text`).
    pub fn fields(self, group: PropertyGroup) -> &'static [&'static str] {
        match (self, group) {
            (ElementKind::Text, PropertyGroup::Content) => &["text"],
            (ElementKind::Image, PropertyGroup::Content) => &["src", "alt"],
            (ElementKind::Button, PropertyGroup::Content) => &["text", "href"],
            (_, PropertyGroup::Content) => &[],

            (ElementKind::Text, PropertyGroup::Style) => &[
                "color",
                "fontSize",
                "fontWeight",
                "fontFamily",
                "fontStyle",
                "textAlign",
                "lineHeight",
                "letterSpacing",
                "textTransform",
            ],
            (ElementKind::Image, PropertyGroup::Style) => {
                &["width", "height", "objectFit", "borderRadius", "border"]
            }
            (ElementKind::Button, PropertyGroup::Style) => &[
                "color",
                "backgroundColor",
                "fontSize",
                "fontWeight",
                "padding",
                "borderRadius",
                "border",
            ],
            (ElementKind::Container, PropertyGroup::Style) => &[
                "backgroundColor",
                "padding",
                "margin",
                "gap",
                "borderRadius",
                "border",
            ],
            (ElementKind::Generic, PropertyGroup::Style) => {
                &["color", "backgroundColor", "padding", "margin"]
            }

            (_, PropertyGroup::Effects) => &["opacity", "boxShadow", "transform"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ElementKind::classify("h2", None), ElementKind::Text);
        assert_eq!(ElementKind::classify("img", None), ElementKind::Image);
        assert_eq!(ElementKind::classify("button", None), ElementKind::Button);
        assert_eq!(ElementKind::classify("input", Some("Submit")), ElementKind::Button);
        assert_eq!(ElementKind::classify("input", Some("text")), ElementKind::Generic);
        assert_eq!(ElementKind::classify("section", None), ElementKind::Container);
        assert_eq!(ElementKind::classify("hr", None), ElementKind::Generic);
    }

    #[test]
    fn test_groups_and_fields() {
        assert_eq!(ElementKind::Container.groups(), &[PropertyGroup::Style, PropertyGroup::Effects]);
        assert!(ElementKind::Text.fields(PropertyGroup::Style).contains(&"fontSize"));
        assert!(ElementKind::Container.fields(PropertyGroup::Content).is_empty());
        for kind in [ElementKind::Text, ElementKind::Image, ElementKind::Generic] {
            assert!(kind.fields(PropertyGroup::Effects).contains(&"opacity"));
        }
    }
}
