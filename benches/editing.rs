//! Benchmarks for the editing hot paths.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

use vitrine::dom::Document;
use vitrine::style::{StylePatch, StyleStore};
use vitrine::template::CompiledTemplate;
use vitrine::{Editor, MemoryStore, Page, Path, Template};

const PRODUCTS: usize = 200;

/// A catalogue grid: one card per product inside a section.
fn catalogue_template() -> &'static str {
    "<section class=\"grid\">{{#products}}<article><h2>{{name}}</h2><p>{{blurb}}</p>\
     <span class=\"price\">{{price}}</span><button>Add to basket</button></article>\
     {{/products}}</section><footer>{{banner}}</footer>"
}

fn catalogue_data() -> Value {
    let products: Vec<Value> = (0..PRODUCTS)
        .map(|i| {
            json!({
                "name": format!("Linen shirt {i}"),
                "blurb": "Relaxed fit, stonewashed <organic> linen",
                "price": format!("${}", 40 + i % 30),
            })
        })
        .collect();
    json!({ "products": products, "banner": "Free returns" })
}

fn card_overrides(store: &mut StyleStore, doc: &mut Document, root: vitrine::NodeId) {
    for i in 0..PRODUCTS as u32 {
        let patch = StylePatch::new()
            .with("color", "#222")
            .with("fontWeight", "600");
        store.set_style(doc, root, Path::new(vec![0, i, 2]), &patch, |_| {});
    }
}

// ============================================================================
// Template Benchmarks
// ============================================================================

fn bench_render_catalogue(c: &mut Criterion) {
    let template = CompiledTemplate::parse(catalogue_template()).unwrap();
    let data = catalogue_data();

    c.bench_function("render_catalogue", |b| {
        b.iter(|| template.render(&data));
    });
}

// ============================================================================
// Style Replay Benchmarks
// ============================================================================

fn bench_replay_overrides(c: &mut Criterion) {
    let template = CompiledTemplate::parse(catalogue_template()).unwrap();
    let markup = template.render(&catalogue_data());
    let mut doc = Document::parse(&markup);
    let root = doc.body().unwrap();
    let mut store = StyleStore::new();
    card_overrides(&mut store, &mut doc, root);

    c.bench_function("replay_overrides", |b| {
        b.iter(|| {
            let mut fresh = Document::parse(&markup);
            let root = fresh.body().unwrap();
            store.forget_applied();
            store.replay_all(&mut fresh, root)
        });
    });
}

// ============================================================================
// Editor Benchmarks
// ============================================================================

fn bench_live_data_rebuild(c: &mut Criterion) {
    let template = Template::new("linen", vec![Page::new("Grid", catalogue_template())]);
    let mut editor = Editor::new("bench", template, Box::new(MemoryStore::new()))
        .with_live_data(catalogue_data());
    editor.mount();
    for i in 0..PRODUCTS as u32 {
        editor.set_style(
            &Path::new(vec![0, i, 0]),
            &StylePatch::new().with("letterSpacing", "1px"),
        );
    }

    let mut flip = false;
    c.bench_function("live_data_rebuild", |b| {
        b.iter(|| {
            flip = !flip;
            let banner = if flip { "Free returns" } else { "Next-day delivery" };
            editor.set_field("banner", json!(banner)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    // Templates
    bench_render_catalogue,
    // Style replay
    bench_replay_overrides,
    // Editor
    bench_live_data_rebuild,
);
criterion_main!(benches);
