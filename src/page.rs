//! Templates and the pages they are made of.

use std::path::Path as FsPath;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::style::StyleMutationMap;
use crate::template::EngineKind;

/// A visual template as supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub engine: EngineKind,
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_css: Option<String>,
}

impl Template {
    pub fn new(id: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            id: id.into(),
            engine: EngineKind::default(),
            pages,
            shared_css: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn open(path: impl AsRef<FsPath>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| Error::TemplateNotFound(path.display().to_string()))?;
        Self::from_json(&text)
    }
}

/// One editable page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    /// Overrides recorded while this page was not the active one.
    #[serde(default, skip_serializing_if = "StyleMutationMap::is_empty")]
    pub style_mutations: StyleMutationMap,
    /// `html` is markup written back from the live document after a direct
    /// edit. It is installed as is and never goes through the template
    /// engine again.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub baked: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn new(name: impl Into<String>, html: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            html: html.into(),
            css: None,
            style_mutations: StyleMutationMap::new(),
            baked: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Equality ignoring timestamps.
    pub fn same_content(&self, other: &Page) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.html == other.html
            && self.css == other.css
            && self.baked == other.baked
            && self.style_mutations == other.style_mutations
    }
}

/// Ordered pages of a document. Never empty: construction and
/// deserialization insert a blank page when given none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Page>")]
pub struct PageList(Vec<Page>);

impl PageList {
    /// Wrap `pages`, inserting a blank page when there are none.
    pub fn new(mut pages: Vec<Page>) -> Self {
        if pages.is_empty() {
            pages.push(Page::new("Page 1", ""));
        }
        Self(pages)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Page> {
        self.0.get(index).ok_or(Error::PageNotFound(index))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Page> {
        self.0.get_mut(index).ok_or(Error::PageNotFound(index))
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|p| p.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Page] {
        &self.0
    }

    /// Insert a blank page after `after` (or at the end). Returns its index.
    pub fn add(&mut self, after: Option<usize>, name: Option<String>) -> usize {
        let index = after.map_or(self.0.len(), |i| (i + 1).min(self.0.len()));
        let name = name.unwrap_or_else(|| format!("Page {}", self.0.len() + 1));
        self.0.insert(index, Page::new(name, ""));
        index
    }

    /// Copy the page at `index` right after it, under a fresh id.
    pub fn duplicate(&mut self, index: usize) -> Result<usize> {
        let source = self.get(index)?;
        let now = Utc::now();
        let copy = Page {
            id: Uuid::new_v4().to_string(),
            name: format!("{} (copy)", source.name),
            created_at: now,
            updated_at: now,
            ..source.clone()
        };
        self.0.insert(index + 1, copy);
        Ok(index + 1)
    }

    pub fn delete(&mut self, index: usize) -> Result<Page> {
        self.get(index)?;
        if self.0.len() == 1 {
            return Err(Error::LastPage);
        }
        Ok(self.0.remove(index))
    }

    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let page = self.get_mut(index)?;
        page.name = name.into();
        page.touch();
        Ok(())
    }

    /// Page-wise equality ignoring timestamps.
    pub fn same_content(&self, other: &PageList) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| a.same_content(b))
    }
}

impl From<Vec<Page>> for PageList {
    fn from(pages: Vec<Page>) -> Self {
        Self::new(pages)
    }
}

impl<'a> IntoIterator for &'a PageList {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
