//! Partial style patches and the sparse per-path mutation map.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::path::Path;

/// A partial inline style: property name to value.
///
/// Keys use the camelCase names hosts send (`fontSize`); kebab-case keys
/// are accepted too. Both spellings serialize to the same CSS property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StylePatch(BTreeMap<String, String>);

impl StylePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge `other` into `self`; keys in `other` win.
    pub fn merge(&mut self, other: &StylePatch) {
        for (property, value) in &other.0 {
            self.0.insert(property.clone(), value.clone());
        }
    }

    /// Render as an inline `style` attribute value. Empty values are
    /// treated as "unset" and omitted.
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(property, value)| format!("{}: {}", css_property_name(property), value.trim()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StylePatch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        StylePatch(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Convert a camelCase property name to its CSS spelling.
///
/// `fontSize` becomes `font-size`; vendor names like `WebkitTransform`
/// become `-webkit-transform`. Custom properties (`--x`) and names that
/// are already kebab-case pass through.
pub fn css_property_name(name: &str) -> String {
    if name.starts_with("--") || name.contains('-') {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    if name.starts_with("ms") && name[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        out.push('-');
    }
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a CSS property name to camelCase (`font-size` → `fontSize`).
/// Vendor prefixes lose their leading dash.
pub fn camel_case_name(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.trim_start_matches('-').chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Sparse map from [`Path`] to the style patch recorded for that element.
///
/// At most one entry per path; updating an entry merges into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMutationMap(BTreeMap<Path, StylePatch>);

impl StyleMutationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `patch` into the entry for `path`, creating it if absent.
    /// Returns the merged patch.
    pub fn merge(&mut self, path: Path, patch: &StylePatch) -> &StylePatch {
        let entry = self.0.entry(path).or_default();
        entry.merge(patch);
        entry
    }

    pub fn get(&self, path: &Path) -> Option<&StylePatch> {
        self.0.get(path)
    }

    pub fn insert(&mut self, path: Path, patch: StylePatch) -> Option<StylePatch> {
        self.0.insert(path, patch)
    }

    pub fn remove(&mut self, path: &Path) -> Option<StylePatch> {
        self.0.remove(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Path, StylePatch> {
        self.0.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.0.keys()
    }
}

impl<'a> IntoIterator for &'a StyleMutationMap {
    type Item = (&'a Path, &'a StylePatch);
    type IntoIter = btree_map::Iter<'a, Path, StylePatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Path, StylePatch)> for StyleMutationMap {
    fn from_iter<I: IntoIterator<Item = (Path, StylePatch)>>(iter: I) -> Self {
        StyleMutationMap(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn test_merge_keeps_earlier_properties() {
        let mut map = StyleMutationMap::new();
        map.merge(path("0.1"), &StylePatch::new().with("color", "#ff0000"));
        map.merge(path("0.1"), &StylePatch::new().with("fontSize", "20px"));

        let expected = StylePatch::new()
            .with("color", "#ff0000")
            .with("fontSize", "20px");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&path("0.1")), Some(&expected));
    }

    #[test]
    fn test_merge_same_patch_twice() {
        let patch = StylePatch::new().with("color", "blue");
        let mut once = StyleMutationMap::new();
        once.merge(path("2"), &patch);
        let mut twice = once.clone();
        twice.merge(path("2"), &patch);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_later_value_wins() {
        let mut patch = StylePatch::new().with("color", "red");
        patch.merge(&StylePatch::new().with("color", "green"));
        assert_eq!(patch.get("color"), Some("green"));
    }

    #[test]
    fn test_to_css() {
        let patch = StylePatch::new()
            .with("fontSize", "20px")
            .with("backgroundColor", "#fff")
            .with("color", "");
        assert_eq!(patch.to_css(), "background-color: #fff; font-size: 20px");
    }

    #[test]
    fn test_property_names() {
        assert_eq!(css_property_name("fontSize"), "font-size");
        assert_eq!(css_property_name("color"), "color");
        assert_eq!(css_property_name("WebkitTransform"), "-webkit-transform");
        assert_eq!(css_property_name("border-top-width"), "border-top-width");
        assert_eq!(css_property_name("--accent"), "--accent");

        assert_eq!(camel_case_name("font-size"), "fontSize");
        assert_eq!(camel_case_name("-webkit-transform"), "webkitTransform");
        assert_eq!(camel_case_name("--accent"), "--accent");
    }

    #[test]
    fn test_map_json_shape() {
        let mut map = StyleMutationMap::new();
        map.merge(path("0.1"), &StylePatch::new().with("color", "#ff0000"));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"0.1": {"color": "#ff0000"}}));

        let back: StyleMutationMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
    }
}
