// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builds a small skin, generates it against in-memory data and drives a few
//! updates through the document.
//!
//! Events go to both a
//! [`PrettyPrintSink`](mantle_debug::pretty::PrettyPrintSink) on stdout and a
//! [`RecorderSink`](mantle_debug::recorder::RecorderSink); the recording is
//! exported as a Chrome trace and the final trees are printed as JSON.

use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::{Point, Rect};

use mantle_core::calc::{CalcKind, Calculation};
use mantle_core::context::{Context, ContextBuilder, Host};
use mantle_core::data::{DataValue, MemoryGraph};
use mantle_core::document::{Document, DocumentConfig};
use mantle_core::message::{Canvas, RectStyle, TextStyle};
use mantle_core::skin::{Skin, SkinBuilder};
use mantle_core::trace::{
    DiagnosticEvent, EdgeEvent, FieldChangeEvent, FireEvent, FlushEvent, OutlineEvent,
    RepairEvent, SwapEvent, TraceSink,
};

use mantle_debug::pretty::PrettyPrintSink;
use mantle_debug::recorder::RecorderSink;

/// Forwards every event to two sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_outline(&mut self, e: &OutlineEvent) {
        self.0.on_outline(e);
        self.1.on_outline(e);
    }

    fn on_field_change(&mut self, e: &FieldChangeEvent) {
        self.0.on_field_change(e);
        self.1.on_field_change(e);
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        self.0.on_swap(e);
        self.1.on_swap(e);
    }

    fn on_edge(&mut self, e: &EdgeEvent) {
        self.0.on_edge(e);
        self.1.on_edge(e);
    }

    fn on_fire(&mut self, e: &FireEvent) {
        self.0.on_fire(e);
        self.1.on_fire(e);
    }

    fn on_repair(&mut self, e: &RepairEvent) {
        self.0.on_repair(e);
        self.1.on_repair(e);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.0.on_flush(e);
        self.1.on_flush(e);
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        self.0.on_diagnostic(e);
        self.1.on_diagnostic(e);
    }
}

/// Prints draw calls instead of rasterizing them.
struct PrintCanvas;

impl Canvas for PrintCanvas {
    fn draw_rect(&mut self, area: Rect, style: &RectStyle) {
        println!("  rect {area:?} fill=#{:08x}", style.fill);
    }

    fn draw_text(&mut self, area: Rect, text: &str, style: &TextStyle) {
        println!("  text {area:?} {text:?} color=#{:08x}", style.color);
    }
}

/// A full-window box colored by `accent`, a title line and a row template.
fn build_skin(ctx: &Context) -> Rc<Skin> {
    let mut b = SkinBuilder::new();
    let window = b.node(b.root(), "window");
    b.field(window, "behavior", Calculation::string("box"))
        .field(window, "fillcolor", Calculation::data("accent", CalcKind::Int))
        .area(window, Rect::ZERO, Rect::new(0.0, 0.0, 1.0, 1.0));
    let title = b.node(window, "title");
    b.field(title, "behavior", Calculation::string("text"))
        .field(title, "text", Calculation::data("title", CalcKind::Str))
        .field(title, "color", Calculation::state("^fillcolor", CalcKind::Int))
        .area(title, Rect::new(8.0, 8.0, 200.0, 28.0), Rect::ZERO);

    let row = b.template("row");
    b.field(row, "behavior", Calculation::string("text"))
        .area(row, Rect::new(8.0, 0.0, 200.0, 0.0), Rect::ZERO)
        .field(row, "abs_top", Calculation::data(".top", CalcKind::Float))
        .field(row, "abs_bottom", Calculation::data(".bottom", CalcKind::Float))
        .field(row, "text", Calculation::data(".caption", CalcKind::Str));

    Rc::new(b.build(ctx).expect("demo skin failed to build"))
}

fn main() {
    let ctx = ContextBuilder::standard().build();
    let skin = build_skin(&ctx);

    // -- data --------------------------------------------------------------
    let mut g = MemoryGraph::new();
    let app = g.record("app");
    g.insert_text(app, "title", "Inbox");
    g.insert(app, "accent", DataValue::Int64(0x3366_CCFF));

    let mut rows = Vec::new();
    for (i, caption) in ["Welcome", "Build report", "Lunch?"].into_iter().enumerate() {
        let row = g.record("message");
        let top = 40.0 + 24.0 * i as f32;
        g.insert_text(row, "caption", caption);
        g.insert(row, "top", DataValue::Float(top));
        g.insert(row, "bottom", DataValue::Float(top + 20.0));
        rows.push(row);
    }

    // -- sinks and document ------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let (recorder, recording) = RecorderSink::new();

    let mut doc = Document::new(
        &ctx,
        DocumentConfig {
            root_area: Rect::new(0.0, 0.0, 320.0, 240.0),
            ..DocumentConfig::default()
        },
    );
    doc.set_trace_sink(Box::new(Tee(pretty, recorder)));
    doc.set_data_root(Some(app));

    // -- generate ----------------------------------------------------------
    println!("== generate");
    let window = doc.generate(Host::new(&ctx, &g), Rc::clone(&skin))[0];
    let row = skin.get("row").expect("row template missing");
    for &data in &rows {
        doc.generate_node(Host::new(&ctx, &g), Rc::clone(&skin), row, Some(data), window);
    }
    doc.flush(Host::new(&ctx, &g));

    // -- updates -----------------------------------------------------------
    println!("== recolor");
    doc.set_data(&ctx, &mut g, app, "accent", DataValue::Int64(0xCC33_66FF));
    println!("== rename");
    doc.set_data(&ctx, &mut g, rows[1], "caption", DataValue::Text("Build passed".into()));
    println!("== resize");
    doc.set_root_area(Rect::new(0.0, 0.0, 480.0, 320.0));
    let changes = doc.flush(Host::new(&ctx, &g));
    println!(
        "reflowed {} documents, {} damage rects",
        changes.reflowed.len(),
        changes.damage.len()
    );

    // -- draw and hit test -------------------------------------------------
    println!("== draw");
    doc.draw(Host::new(&ctx, &g), &mut PrintCanvas);
    let probe = Point::new(20.0, 70.0);
    match doc.hit_test(probe) {
        Some(hit) => println!("hit {probe:?} -> {hit:?}"),
        None => println!("hit {probe:?} -> nothing"),
    }

    // -- snapshots and export ----------------------------------------------
    println!("== outlines");
    match serde_json::to_string_pretty(&mantle_debug::snapshot::outlines(&doc, &ctx)) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("snapshot failed: {e}"),
    }

    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    mantle_debug::chrome::export(&recording.events(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({} events)", recording.len());
}
