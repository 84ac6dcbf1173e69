//! Export, print and page thumbnails.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dom::SerializeOptions;
use crate::error::{Error, Result};

use super::Editor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Json,
    Png,
    Pdf,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        };
        f.write_str(name)
    }
}

/// Turns a standalone HTML document into image or PDF bytes. Supplied by
/// the host; the editor has no renderer of its own.
pub trait Rasterizer {
    fn rasterize(&self, html: &str, format: ExportFormat) -> Result<Vec<u8>>;
}

const PRINT_CSS: &str = ".vt-print-page { break-after: page; }\n\
                         .vt-print-page:last-child { break-after: auto; }\n";

impl Editor {
    /// The live document as standalone HTML: overrides baked in, editor
    /// attributes removed.
    pub fn export_html(&self) -> String {
        self.document
            .outer_html(self.document.document(), SerializeOptions::EXPORT)
    }

    pub fn export(&self, format: ExportFormat, rasterizer: Option<&dyn Rasterizer>) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Html => Ok(self.export_html().into_bytes()),
            ExportFormat::Json => Ok(serde_json::to_vec_pretty(&self.state())?),
            ExportFormat::Png | ExportFormat::Pdf => {
                let rasterizer = rasterizer.ok_or_else(|| {
                    Error::Unsupported(format!("{format} export needs a rasterizer"))
                })?;
                rasterizer.rasterize(&self.export_html(), format)
            }
        }
    }

    /// Every page rendered with its overrides, one print page each.
    pub fn print(&self) -> Result<String> {
        let mut html = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
        if let Some(css) = &self.template.shared_css {
            html.push_str("<style>");
            html.push_str(css);
            html.push_str("</style>");
        }
        for page in &self.pages {
            if let Some(css) = &page.css {
                html.push_str("<style>");
                html.push_str(css);
                html.push_str("</style>");
            }
        }
        html.push_str("<style>");
        html.push_str(PRINT_CSS);
        html.push_str("</style></head><body>");

        for index in 0..self.pages.len() {
            let document = self.render_offscreen(index)?;
            let root = document.body().unwrap_or(document.document());
            html.push_str("<section class=\"vt-print-page\">");
            html.push_str(&document.inner_html(root, SerializeOptions::EXPORT));
            html.push_str("</section>");
        }
        html.push_str("</body></html>");
        debug!(pages = self.pages.len(), "print document built");
        Ok(html)
    }

    /// Regenerate the preview image of a page. Best effort: failures are
    /// logged and the previous thumbnail is kept.
    pub fn refresh_thumbnail(&mut self, index: usize, rasterizer: &dyn Rasterizer) -> bool {
        let rendered = self.pages.get(index).map(|page| page.id.clone()).and_then(|id| {
            let document = self.render_offscreen(index)?;
            let html = document.outer_html(document.document(), SerializeOptions::EXPORT);
            Ok((id, rasterizer.rasterize(&html, ExportFormat::Png)?))
        });
        match rendered {
            Ok((id, bytes)) => {
                self.thumbnails.insert(id, bytes);
                true
            }
            Err(e) => {
                warn!(page = index, error = %e, "thumbnail generation failed");
                false
            }
        }
    }

    pub fn thumbnail(&self, page_id: &str) -> Option<&[u8]> {
        self.thumbnails.get(page_id).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::page::{Page, Template};
    use crate::persist::MemoryStore;
    use crate::style::StylePatch;

    struct FakeRasterizer;

    impl Rasterizer for FakeRasterizer {
        fn rasterize(&self, html: &str, format: ExportFormat) -> Result<Vec<u8>> {
            Ok(format!("{format}:{}", html.len()).into_bytes())
        }
    }

    struct BrokenRasterizer;

    impl Rasterizer for BrokenRasterizer {
        fn rasterize(&self, _html: &str, _format: ExportFormat) -> Result<Vec<u8>> {
            Err(Error::Unsupported("no display".into()))
        }
    }

    fn editor() -> Editor {
        let template = Template::new(
            "fmcg",
            vec![
                Page::new("Cover", "<h1>{{brand}}</h1>").with_id("cover"),
                Page::new("Range", "<ul><li>Oat milk</li></ul>").with_id("range"),
            ],
        );
        let mut editor = Editor::new("doc", template, Box::new(MemoryStore::new()))
            .with_live_data(json!({"brand": "Meadow"}));
        editor.mount();
        editor
    }

    #[test]
    fn test_export_html_strips_editor_attributes() {
        let mut editor = editor();
        editor.set_style(&"0".parse().unwrap(), &StylePatch::new().with("color", "green"));

        let html = editor.export_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<h1 style="color: green">Meadow</h1>"#));
        assert!(!html.contains("data-vt-id"));
    }

    #[test]
    fn test_raster_exports_need_rasterizer() {
        let editor = editor();
        assert!(matches!(
            editor.export(ExportFormat::Pdf, None),
            Err(Error::Unsupported(_))
        ));
        let bytes = editor.export(ExportFormat::Png, Some(&FakeRasterizer)).unwrap();
        assert!(bytes.starts_with(b"png:"));
    }

    #[test]
    fn test_json_export_is_state() {
        let editor = editor();
        let bytes = editor.export(ExportFormat::Json, None).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["templateId"], json!("fmcg"));
        assert_eq!(value["liveData"], json!({"brand": "Meadow"}));
    }

    #[test]
    fn test_print_includes_every_page() {
        let editor = editor();
        let html = editor.print().unwrap();
        assert_eq!(html.matches("class=\"vt-print-page\"").count(), 2);
        assert!(html.contains("<h1>Meadow</h1>"));
        assert!(html.contains("<li>Oat milk</li>"));
    }

    #[test]
    fn test_thumbnail_failures_are_swallowed() {
        let mut editor = editor();
        assert!(editor.refresh_thumbnail(1, &FakeRasterizer));
        assert!(editor.thumbnail("range").is_some());

        assert!(!editor.refresh_thumbnail(1, &BrokenRasterizer));
        assert!(editor.thumbnail("range").is_some());
        assert!(!editor.refresh_thumbnail(7, &FakeRasterizer));
    }
}
