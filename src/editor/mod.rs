//! The editor: one explicit state struct driving every component.
//!
//! All document mutation goes through [`Editor`] methods. Each method is a
//! single state transition: it updates the document, the style store, the
//! history and the save schedule together, so there is no way for the live
//! document and the recorded overrides to drift apart.
//!
//! ```
//! use serde_json::json;
//! use vitrine::editor::Editor;
//! use vitrine::page::{Page, Template};
//! use vitrine::persist::MemoryStore;
//! use vitrine::style::StylePatch;
//!
//! let template = Template::new("skincare", vec![Page::new("Cover", "<h1>{{title}}</h1><p>{{tagline}}</p>")]);
//! let mut editor = Editor::new("catalogue-1", template, Box::new(MemoryStore::new()))
//!     .with_live_data(json!({"title": "Glow", "tagline": "Vitamin C serum"}));
//! editor.mount();
//!
//! editor.set_style(&"1".parse().unwrap(), &StylePatch::new().with("color", "#aa3355"));
//! assert!(editor.export_html().contains(r#"<p style="color: #aa3355">Vitamin C serum</p>"#));
//!
//! editor.undo();
//! assert!(editor.style_mutations().is_empty());
//! ```

mod edit;
mod export;
mod listener;

pub use export::{ExportFormat, Rasterizer};
pub use listener::{EditorListener, NoopListener};

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use kurbo::{Point, Rect};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::dom::{Document, HOVER_SHEET_ATTR, NodeData, NodeId, SerializeOptions};
use crate::error::{Error, Result};
use crate::history::History;
use crate::page::{Page, PageList, Template};
use crate::path::Geometry;
use crate::persist::{EditorState, EditorStore, SaveScheduler};
use crate::selection::{PointerEvent, PropertyGroup, Selection, SelectionState};
use crate::style::{HoverStyles, StyleMutationMap, StyleStore};
use crate::template::{Compiled, TemplateCompiler};

/// Undo granularity: the overrides and the source markup of one page.
#[derive(Debug, Clone, PartialEq)]
struct EditSnapshot {
    page_id: String,
    styles: StyleMutationMap,
    markup: String,
    baked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewState {
    zoom: f64,
    grid_visible: bool,
}

pub struct Editor {
    config: EditorConfig,
    document_id: String,
    template: Template,
    pages: PageList,
    current_page: usize,
    live_data: Value,

    document: Document,
    root: NodeId,
    next_node_id: u64,

    styles: StyleStore,
    hover_styles: HoverStyles,
    history: History<EditSnapshot>,
    compiler: TemplateCompiler,
    selection: SelectionState,
    view: ViewState,

    dirty: bool,
    ready: bool,
    last_saved_at: Option<DateTime<Utc>>,
    scheduler: SaveScheduler,
    store: Box<dyn EditorStore>,
    listener: Box<dyn EditorListener>,
    clock: Box<dyn Fn() -> Instant>,
    thumbnails: HashMap<String, Vec<u8>>,
}

impl Editor {
    pub fn new(
        document_id: impl Into<String>,
        template: Template,
        store: Box<dyn EditorStore>,
    ) -> Self {
        let config = EditorConfig::default();
        let mut pages = PageList::new(template.pages.clone());
        let map = pages
            .get_mut(0)
            .map(|page| std::mem::take(&mut page.style_mutations))
            .unwrap_or_default();
        let document = Document::parse("");
        let root = document.body().unwrap_or(document.document());

        Self {
            document_id: document_id.into(),
            template,
            pages,
            current_page: 0,
            live_data: Value::Object(Map::new()),
            document,
            root,
            next_node_id: 0,
            styles: StyleStore::with_map(map),
            hover_styles: HoverStyles::new(),
            history: History::with_limit(config.history_limit),
            compiler: TemplateCompiler::new(),
            selection: SelectionState::new(),
            view: ViewState {
                zoom: 1.0,
                grid_visible: false,
            },
            dirty: false,
            ready: false,
            last_saved_at: None,
            scheduler: SaveScheduler::new(config.autosave_delay()),
            store,
            listener: Box::new(NoopListener),
            clock: Box::new(Instant::now),
            thumbnails: HashMap::new(),
            config,
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        let config = config.validated();
        self.history = History::with_limit(config.history_limit);
        self.scheduler = SaveScheduler::new(config.autosave_delay());
        self.view.zoom = config.clamp_zoom(self.view.zoom);
        self.config = config;
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn EditorListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Initial live data, used unless saved state provides some.
    pub fn with_live_data(mut self, data: Value) -> Self {
        self.live_data = data;
        self
    }

    /// Time source for the save debounce.
    pub fn with_clock(mut self, clock: impl Fn() -> Instant + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Load saved state and install the first document.
    ///
    /// Load failures are logged and the editor starts from the template.
    pub fn mount(&mut self) {
        match self.store.load(&self.document_id) {
            Ok(Some(state)) => self.adopt(state),
            Ok(None) => debug!(document = %self.document_id, "no saved state"),
            Err(e) => {
                warn!(document = %self.document_id, error = %e, "failed to load editor state")
            }
        }
        if let Err(e) = self.rebuild(true) {
            self.notify(&format!("could not render page: {e}"));
        }
        self.ready = true;
        self.listener.on_ready();
    }

    fn adopt(&mut self, state: EditorState) {
        if !state.live_data.is_null() {
            self.live_data = state.live_data;
        }
        self.view = ViewState {
            zoom: self.config.clamp_zoom(state.zoom),
            grid_visible: state.grid_visible,
        };
        self.last_saved_at = state.last_saved_at;

        if state.template_id != self.template.id {
            warn!(
                saved = %state.template_id,
                active = %self.template.id,
                "saved pages belong to another template, keeping template pages"
            );
            return;
        }

        self.pages = state.pages;
        self.current_page = state.current_page_index.min(self.pages.len() - 1);
        let stashed = self
            .pages
            .get_mut(self.current_page)
            .map(|page| std::mem::take(&mut page.style_mutations))
            .unwrap_or_default();
        let map = if state.style_mutations.is_empty() {
            stashed
        } else {
            state.style_mutations
        };
        self.styles = StyleStore::with_map(map);
        self.hover_styles = state.hover_styles;
        info!(
            document = %self.document_id,
            pages = self.pages.len(),
            overrides = self.styles.map().len(),
            "editor state restored"
        );
    }

    // Accessors

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The editing root (`<body>` of the live document).
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn live_data(&self) -> &Value {
        &self.live_data
    }

    pub fn style_mutations(&self) -> &StyleMutationMap {
        self.styles.map()
    }

    pub fn hover_styles(&self) -> &HoverStyles {
        &self.hover_styles
    }

    pub fn pages(&self) -> &PageList {
        &self.pages
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    pub fn current_page(&self) -> Result<&Page> {
        self.pages.get(self.current_page)
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    pub fn grid_visible(&self) -> bool {
        self.view.grid_visible
    }

    /// Whether anything changed since the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn save_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selected(&self) -> Option<&Selection> {
        self.selection.selected()
    }

    /// Body markup as it would be saved: no overrides, no editor attributes.
    pub fn page_markup(&self) -> String {
        self.document.inner_html(self.root, SerializeOptions::CLEAN)
    }

    /// Body markup as displayed, overrides included.
    pub fn live_markup(&self) -> String {
        self.document.inner_html(self.root, SerializeOptions::LIVE)
    }

    // Rendering

    /// Compile the active page and install it when the markup changed.
    /// `force` bypasses the memo. Returns whether the document was rebuilt.
    fn rebuild(&mut self, force: bool) -> Result<bool> {
        if force {
            self.compiler.invalidate();
        }
        let page = self.pages.get(self.current_page)?;
        let css = page.css.clone();
        let rendered = self.render_page(page)?;
        let markup = match self.compiler.remember(rendered) {
            Compiled::Unchanged => return Ok(false),
            Compiled::Changed(markup) => markup,
        };
        let html = self.document_html(&markup, css.as_deref());
        self.install(&html);
        Ok(true)
    }

    /// Body markup for `page`: rendered against the live data, or taken as
    /// is for a baked page.
    fn render_page(&self, page: &Page) -> Result<String> {
        if page.baked {
            return Ok(page.html.clone());
        }
        self.compiler
            .render(self.template.engine, &page.html, &self.live_data)
    }

    /// Replace the live document. Overrides are replayed strictly after the
    /// new tree is in place.
    fn install(&mut self, html: &str) {
        let mut document = Document::parse(html);
        let root = document.body().unwrap_or(document.document());
        let assigned = document.assign_node_ids(root, &mut self.next_node_id);

        self.styles.forget_applied();
        let applied = self.styles.replay_all(&mut document, root);
        self.hover_styles.mark(&mut document, root);
        self.selection.reattach(&mut document, root);

        self.document = document;
        self.root = root;
        info!(page = self.current_page, assigned, applied, "document rebuilt");
    }

    fn document_html(&self, markup: &str, page_css: Option<&str>) -> String {
        let mut html = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
        for css in [self.template.shared_css.as_deref(), page_css]
            .into_iter()
            .flatten()
        {
            html.push_str("<style>");
            html.push_str(css);
            html.push_str("</style>");
        }
        html.push_str(&format!("<style {HOVER_SHEET_ATTR}=\"\">"));
        html.push_str(&self.hover_styles.stylesheet());
        html.push_str("</style></head><body>");
        html.push_str(markup);
        html.push_str("</body></html>");
        html
    }

    /// Render a page into a standalone document with its overrides applied,
    /// without touching the live one.
    fn render_offscreen(&self, index: usize) -> Result<Document> {
        let page = self.pages.get(index)?;
        let markup = self.render_page(page)?;
        let mut document = Document::parse(&self.document_html(&markup, page.css.as_deref()));
        let root = document.body().unwrap_or(document.document());
        let map = if index == self.current_page {
            self.styles.map().clone()
        } else {
            page.style_mutations.clone()
        };
        StyleStore::with_map(map).replay_all(&mut document, root);
        self.hover_styles.mark(&mut document, root);
        Ok(document)
    }

    fn notify(&mut self, message: &str) {
        warn!("{message}");
        self.listener.on_notify(message);
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.scheduler.note_edit((self.clock)());
    }

    // Live data

    pub fn set_live_data(&mut self, data: Value) -> Result<()> {
        self.live_data = data;
        self.listener.on_live_data_changed(&self.live_data);
        self.mark_dirty();
        if let Err(e) = self.rebuild(false) {
            self.notify(&format!("could not render page: {e}"));
            return Err(e);
        }
        Ok(())
    }

    /// Set one value by dotted name (`product.price`), creating objects
    /// along the way.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        let mut data = self.live_data.clone();
        set_dotted(&mut data, name, value);
        self.set_live_data(data)
    }

    // Pages

    pub fn goto_page(&mut self, index: usize) -> Result<()> {
        if index >= self.pages.len() {
            let e = Error::PageNotFound(index);
            self.notify(&e.to_string());
            return Err(e);
        }
        if index == self.current_page {
            return Ok(());
        }
        if let Err(e) = self.render_offscreen(index) {
            self.notify(&format!("could not render page {index}: {e}"));
            return Err(e);
        }
        self.stash_styles();
        self.activate(index)
    }

    pub fn next_page(&mut self) -> Result<()> {
        if self.current_page + 1 >= self.pages.len() {
            return Ok(());
        }
        self.goto_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> Result<()> {
        if self.current_page == 0 {
            return Ok(());
        }
        self.goto_page(self.current_page - 1)
    }

    /// Insert a blank page after the current one and switch to it.
    pub fn add_page(&mut self, name: Option<String>) -> Result<usize> {
        let index = self.pages.add(Some(self.current_page), name);
        self.mark_dirty();
        self.goto_page(index)?;
        Ok(index)
    }

    pub fn duplicate_page(&mut self, index: usize) -> Result<usize> {
        let copy = match self.pages.duplicate(index) {
            Ok(copy) => copy,
            Err(e) => {
                self.notify(&e.to_string());
                return Err(e);
            }
        };
        if index == self.current_page {
            let map = self.styles.map().clone();
            self.pages.get_mut(copy)?.style_mutations = map;
        }
        if copy <= self.current_page {
            self.current_page += 1;
        }
        self.mark_dirty();
        Ok(copy)
    }

    pub fn delete_page(&mut self, index: usize) -> Result<()> {
        if let Err(e) = self.pages.delete(index) {
            self.notify(&e.to_string());
            return Err(e);
        }
        self.thumbnails.retain(|id, _| self.pages.position(id).is_some());
        let pages = &self.pages;
        self.history
            .retain(|snapshot| pages.position(&snapshot.page_id).is_some());
        self.mark_dirty();
        if index < self.current_page {
            self.current_page -= 1;
            Ok(())
        } else if index == self.current_page {
            self.activate(index.min(self.pages.len() - 1))
        } else {
            Ok(())
        }
    }

    pub fn rename_page(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        if let Err(e) = self.pages.rename(index, name) {
            self.notify(&e.to_string());
            return Err(e);
        }
        self.mark_dirty();
        Ok(())
    }

    /// Replace the template. Pages, overrides, hover styles and history are
    /// reset; live data is kept.
    pub fn swap_template(&mut self, template: Template) -> Result<()> {
        let pages = PageList::new(template.pages.clone());
        let first = pages.get(0)?;
        if let Err(e) = self
            .compiler
            .render(template.engine, &first.html, &self.live_data)
        {
            self.notify(&format!("could not render template {}: {e}", template.id));
            return Err(e);
        }

        info!(from = %self.template.id, to = %template.id, "template swapped");
        self.template = template;
        self.pages = pages;
        self.hover_styles = HoverStyles::new();
        self.history.clear();
        self.thumbnails.clear();
        self.mark_dirty();
        self.activate(0)
    }

    fn stash_styles(&mut self) {
        let map = self.styles.map().clone();
        if let Ok(page) = self.pages.get_mut(self.current_page) {
            page.style_mutations = map;
        }
    }

    /// Make `index` the active page: its stored overrides move into the
    /// style store and the document is rebuilt.
    fn activate(&mut self, index: usize) -> Result<()> {
        let map = std::mem::take(&mut self.pages.get_mut(index)?.style_mutations);
        self.current_page = index;
        self.styles = StyleStore::with_map(map);
        self.selection.reset();
        self.rebuild(true)?;
        self.listener.on_style_mutations_changed(self.styles.map());
        Ok(())
    }

    // View

    pub fn set_zoom(&mut self, zoom: f64) {
        let zoom = (self.config.clamp_zoom(zoom) * 100.0).round() / 100.0;
        if zoom != self.view.zoom {
            self.view.zoom = zoom;
            self.mark_dirty();
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.view.zoom + self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.view.zoom - self.config.zoom_step);
    }

    pub fn toggle_grid(&mut self) {
        self.view.grid_visible = !self.view.grid_visible;
        self.mark_dirty();
    }

    // Pointer

    /// Forward a pointer event. Ignored in read-only mode.
    pub fn handle_pointer(&mut self, event: PointerEvent, geometry: &dyn Geometry) -> bool {
        if self.config.read_only {
            return false;
        }
        self.selection.handle(
            &mut self.document,
            self.root,
            event,
            geometry,
            self.config.edge_margin_px,
        )
    }

    /// Click on `node` with no geometry available, so no edge promotion.
    pub fn click(&mut self, node: NodeId) -> bool {
        self.handle_pointer(
            PointerEvent::Click {
                node,
                point: Point::ZERO,
            },
            &|_: NodeId| -> Option<Rect> { None },
        )
    }

    pub fn toggle_group(&mut self, group: PropertyGroup) {
        self.selection.toggle_group(group);
    }

    // Saving

    /// Drive the save debounce. Returns `true` when a save was attempted.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.scheduler.poll(now) {
            return false;
        }
        if self.save_at(now).is_err() {
            debug!("save retry scheduled");
        }
        true
    }

    /// Save immediately, cancelling any pending debounced save.
    pub fn save_now(&mut self) -> Result<()> {
        let now = (self.clock)();
        self.save_at(now)
    }

    fn save_at(&mut self, now: Instant) -> Result<()> {
        self.scheduler.cancel();
        let saved_at = Utc::now();
        let mut state = self.state();
        state.last_saved_at = Some(saved_at);

        match self.store.save(&self.document_id, &state) {
            Ok(()) => {
                self.last_saved_at = Some(saved_at);
                self.dirty = false;
                info!(document = %self.document_id, "editor state saved");
                self.listener.on_save_succeeded(saved_at);
                Ok(())
            }
            Err(e) => {
                warn!(document = %self.document_id, error = %e, "save failed");
                self.scheduler.note_edit(now);
                self.listener.on_save_failed(&e.to_string());
                Err(e)
            }
        }
    }

    /// Snapshot of everything that gets persisted.
    ///
    /// Pages keep their template source; only a page changed by a direct
    /// text, attribute or structural edit stores the live markup (baked).
    pub fn state(&self) -> EditorState {
        EditorState {
            live_data: self.live_data.clone(),
            style_mutations: self.styles.map().clone(),
            template_id: self.template.id.clone(),
            pages: self.pages.clone(),
            current_page_index: self.current_page,
            zoom: self.view.zoom,
            grid_visible: self.view.grid_visible,
            last_saved_at: self.last_saved_at,
            hover_styles: self.hover_styles.clone(),
        }
    }

    fn hover_sheet(&self) -> Option<NodeId> {
        self.document
            .find(|node| match &node.data {
                NodeData::Element { attrs, .. } => attrs
                    .iter()
                    .any(|a| a.name.local.as_ref() == HOVER_SHEET_ATTR),
                _ => false,
            })
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("document_id", &self.document_id)
            .field("template", &self.template.id)
            .field("current_page", &self.current_page)
            .field("overrides", &self.styles.map().len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

/// Write `value` at a dotted name inside `target`, replacing non-object
/// intermediates with objects.
fn set_dotted(target: &mut Value, name: &str, value: Value) {
    let mut current = target;
    let mut segments = name.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
