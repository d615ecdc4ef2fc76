// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use kurbo::{Point, Rect, Vec2};

use super::*;
use crate::calc::{CalcKind, CalcValue, Calculation};
use crate::component::boxes::BoxState;
use crate::component::text::TextState;
use crate::context::{BehaviorDef, ContextBuilder, LayoutDef};
use crate::data::{DataValue, MemoryGraph};
use crate::event::{Delivery, EventSource, EventTuple, Registration};
use crate::field::{FieldId, FieldInfo};
use crate::layout::LayoutOp;
use crate::message::{Canvas, Message, MessageResult, RectStyle, TextStyle};
use crate::resolver::{NullResolver, Resolver};
use crate::skin::{Skin, SkinBuilder};
use crate::unit::Unit;

fn ctx() -> Context {
    ContextBuilder::standard().build()
}

fn config(root_area: Rect) -> DocumentConfig {
    DocumentConfig {
        root_area,
        ..DocumentConfig::default()
    }
}

const FULL: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

#[derive(Default)]
struct Recorder {
    rects: Vec<(Rect, u32)>,
    texts: Vec<(Rect, String)>,
    fonts: Vec<f64>,
}

impl Canvas for Recorder {
    fn draw_rect(&mut self, area: Rect, style: &RectStyle) {
        self.rects.push((area, style.fill));
    }

    fn draw_text(&mut self, area: Rect, text: &str, style: &TextStyle) {
        self.texts.push((area, text.into()));
        self.fonts.push(style.font_size);
    }
}

// -- Components only these tests register --

const GAP: FieldId = FieldId::FIRST_CUSTOM;

/// Layout state of `inset`.
#[derive(Default)]
struct Inset {
    gap: f64,
}

struct InsetResolver;

impl Resolver for InsetResolver {
    fn fields(&self) -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[FieldInfo::new("gap", GAP, CalcKind::Float)];
        FIELDS
    }

    fn get(&self, state: &dyn Any, field: FieldId) -> Option<CalcValue> {
        let s = state.downcast_ref::<Inset>()?;
        (field == GAP).then_some(CalcValue::Float(s.gap))
    }

    fn set(&self, state: &mut dyn Any, field: FieldId, value: &CalcValue) -> bool {
        match (state.downcast_mut::<Inset>(), value.as_f64()) {
            (Some(s), Some(gap)) if field == GAP => {
                s.gap = gap;
                true
            }
            _ => false,
        }
    }
}

/// Stretches every child over the parent, `gap` pixels in from each edge.
fn inset_layout(doc: &mut Document, _: Host<'_>, parent: DocId, child: DocId, op: LayoutOp) {
    if op == LayoutOp::Remove {
        doc.unplace(child);
        return;
    }
    let gap = doc.layout_state::<Inset>(parent).map_or(0.0, |s| s.gap);
    let p = doc.document(parent).area();
    doc.place(
        parent,
        child,
        Rect::new(p.x0 + gap, p.y0 + gap, p.x1 - gap, p.y1 - gap),
    );
}

fn new_inset() -> Box<dyn Any> {
    Box::new(Inset::default())
}

/// Behavior state of `focusable`.
#[derive(Default)]
struct Focus {
    gained: u32,
}

/// Takes focus and leaves everything else to the default behavior.
fn focusable(
    doc: &mut Document,
    _: Host<'_>,
    id: DocId,
    msg: &mut Message<'_>,
) -> MessageResult {
    if !matches!(msg, Message::GotFocus) {
        return MessageResult::Unhandled;
    }
    if let Some(focus) = doc.state_mut::<Focus>(id) {
        focus.gained += 1;
    }
    MessageResult::Handled
}

fn new_focus() -> Box<dyn Any> {
    Box::new(Focus::default())
}

/// Re-reads its data's `arrange` key while it is being constructed.
fn restless(
    doc: &mut Document,
    host: Host<'_>,
    id: DocId,
    msg: &mut Message<'_>,
) -> MessageResult {
    if matches!(msg, Message::Construct)
        && let Some(data) = doc.outline(doc.document(id).outline()).data()
    {
        doc.update_data(host, data, Some("arrange"));
    }
    MessageResult::Unhandled
}

fn new_unit() -> Box<dyn Any> {
    Box::new(())
}

/// The standard context plus `focusable`, `restless` and the `inset`
/// layout.
fn custom_ctx() -> Context {
    ContextBuilder::standard()
        .behavior(BehaviorDef::new("focusable", focusable, &NullResolver, new_focus))
        .behavior(BehaviorDef::new("restless", restless, &NullResolver, new_unit))
        .layout(LayoutDef::new("inset", inset_layout, &InsetResolver).with_state(new_inset))
        .build()
}

/// Thickens the destination box's border by one per delivery.
fn thicken(doc: &mut Document, _: Host<'_>, delivery: &Delivery) {
    if let Some(d) = doc.outline(delivery.tuple.dest).doc()
        && let Some(state) = doc.state_mut::<BoxState>(d)
    {
        state.border += 1.0;
    }
}

/// A red `panel` box holding a `label` text bound to the data root's
/// `title`.
fn panel_skin(ctx: &Context) -> Rc<Skin> {
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "behavior", Calculation::string("box"))
        .field(panel, "fillcolor", Calculation::int(0xFF00_00FF))
        .area(panel, Rect::new(10.0, 20.0, 110.0, 70.0), Rect::ZERO);
    let label = b.node(panel, "label");
    b.field(label, "behavior", Calculation::string("text"))
        .field(label, "text", Calculation::data("title", CalcKind::Str))
        .area(label, Rect::new(5.0, 5.0, 50.0, 25.0), Rect::ZERO);
    Rc::new(b.build(ctx).unwrap())
}

fn app_data() -> (MemoryGraph, crate::data::DataRef) {
    let mut g = MemoryGraph::new();
    let root = g.record("app");
    g.insert_text(root, "title", "hello");
    (g, root)
}

fn doc_of(doc: &Document, id: OutlineId) -> DocId {
    doc.outline(id).doc().unwrap()
}

#[test]
fn generate_builds_outlines_and_places_documents() {
    let ctx = ctx();
    let (g, data) = app_data();
    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 800.0, 600.0)));
    doc.set_data_root(Some(data));

    let top = doc.generate(Host::new(&ctx, &g), panel_skin(&ctx));
    assert_eq!(top.len(), 1);
    assert_eq!(doc.outline_count(), 3);

    let panel = top[0];
    let label = doc.outline(panel).children()[0];
    assert_eq!(doc.outline(label).parent(), Some(panel));
    assert_eq!(doc.outline(panel).behavior(), ctx.behavior_id("box"));

    let panel_doc = doc_of(&doc, panel);
    let label_doc = doc_of(&doc, label);
    assert!(doc.document(label_doc).is_attached());
    assert_eq!(
        doc.document(panel_doc).area(),
        Rect::new(10.0, 20.0, 110.0, 70.0)
    );
    assert_eq!(
        doc.document(label_doc).area(),
        Rect::new(15.0, 25.0, 60.0, 45.0)
    );
    assert_eq!(doc.state::<TextState>(label_doc).unwrap().text, "hello");
    assert_eq!(doc.spatial().len(), 3);
    assert!(doc.spatial().check_invariants().is_none());
}

#[test]
fn draw_visits_documents_parent_first() {
    let ctx = ctx();
    let (g, data) = app_data();
    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 800.0, 600.0)));
    doc.set_data_root(Some(data));
    doc.generate(Host::new(&ctx, &g), panel_skin(&ctx));

    let mut canvas = Recorder::default();
    doc.draw(Host::new(&ctx, &g), &mut canvas);
    assert_eq!(
        canvas.rects,
        [(Rect::new(10.0, 20.0, 110.0, 70.0), 0xFF00_00FF)]
    );
    assert_eq!(
        canvas.texts,
        [(Rect::new(15.0, 25.0, 60.0, 45.0), String::from("hello"))]
    );
}

#[test]
fn hit_test_prefers_the_deepest_document() {
    let ctx = ctx();
    let (g, data) = app_data();
    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 800.0, 600.0)));
    doc.set_data_root(Some(data));
    let panel = doc.generate(Host::new(&ctx, &g), panel_skin(&ctx))[0];
    let label = doc.outline(panel).children()[0];

    assert_eq!(doc.hit_test(Point::new(20.0, 30.0)), doc.outline(label).doc());
    assert_eq!(doc.hit_test(Point::new(100.0, 60.0)), doc.outline(panel).doc());
    assert_eq!(
        doc.hit_test(Point::new(500.0, 500.0)),
        Some(doc.root_document())
    );
    assert_eq!(doc.hit_test(Point::new(900.0, 10.0)), None);
}

#[test]
fn array_expansion_instantiates_one_outline_per_matched_element() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    b.node(b.root(), "list");
    let button = b.template("list.button");
    b.field(button, "behavior", Calculation::string("box"))
        .area(button, Rect::new(0.0, 0.0, 10.0, 10.0), Rect::ZERO);
    let label = b.template("list.label");
    b.field(label, "behavior", Calculation::string("text"))
        .field(label, "text", Calculation::data(".caption", CalcKind::Str));
    let skin = Rc::new(b.build(&ctx).unwrap());

    let mut g = MemoryGraph::new();
    let items = g.array("items");
    for (kind, caption) in [
        ("Button", "ok"),
        ("Label", "name"),
        ("Slider", "volume"),
        ("Button", "cancel"),
    ] {
        let item = g.record(kind);
        g.insert_text(item, "caption", caption);
        g.push(items, item);
    }

    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 100.0, 100.0)));
    doc.set_data_root(Some(items));
    let made = doc.generate(Host::new(&ctx, &g), skin);

    // The slider has no template and is skipped.
    assert_eq!(made.len(), 3);
    assert_eq!(doc.outline(doc.root()).children(), made.as_slice());
    let behaviors: Vec<_> = made.iter().map(|o| doc.outline(*o).behavior()).collect();
    assert_eq!(
        behaviors,
        [
            ctx.behavior_id("box"),
            ctx.behavior_id("text"),
            ctx.behavior_id("box"),
        ]
    );
    let caption = doc.state::<TextState>(doc_of(&doc, made[1])).unwrap();
    assert_eq!(caption.text, "name");
}

#[test]
fn generate_node_expands_one_template_under_an_outline() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let row = b.template("row");
    b.field(row, "behavior", Calculation::string("text"))
        .field(row, "text", Calculation::data(".caption", CalcKind::Str));
    let skin = Rc::new(b.build(&ctx).unwrap());

    let mut g = MemoryGraph::new();
    let item = g.record("row");
    g.insert_text(item, "caption", "first");

    let mut doc = Document::new(&ctx, DocumentConfig::default());
    let root = doc.root();
    let made = doc.generate_node(Host::new(&ctx, &g), skin, row, Some(item), root);
    assert_eq!(made.len(), 1);
    assert_eq!(doc.outline(made[0]).data(), Some(item));
    let state = doc.state::<TextState>(doc_of(&doc, made[0])).unwrap();
    assert_eq!(state.text, "first");
}

#[test]
fn data_change_fires_one_edge_and_updates_state() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "behavior", Calculation::string("box"))
        .field(panel, "fillcolor", Calculation::data("fillcolor", CalcKind::Int))
        .area(panel, Rect::ZERO, FULL);
    let skin = Rc::new(b.build(&ctx).unwrap());

    let mut g = MemoryGraph::new();
    let data = g.record("theme");
    g.insert(data, "fillcolor", DataValue::Int64(0xFF00_00FF));

    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 800.0, 600.0)));
    doc.set_data_root(Some(data));
    let made = doc.generate(Host::new(&ctx, &g), skin);
    assert_eq!(made.len(), 1);
    let panel = made[0];
    assert_eq!(
        doc.document(doc_of(&doc, panel)).area(),
        Rect::new(0.0, 0.0, 800.0, 600.0)
    );
    assert_eq!(
        doc.get_state(Host::new(&ctx, &g), panel, FieldId::FILL_COLOR),
        Some(CalcValue::Int(0xFF00_00FF))
    );
    assert_eq!(doc.events().len(), 1);

    assert!(doc.set_data(&ctx, &mut g, data, "fillcolor", DataValue::Int64(0x00FF_00FF)));
    let host = Host::new(&ctx, &g);
    assert_eq!(
        doc.get_state(host, panel, FieldId::FILL_COLOR),
        Some(CalcValue::Int(0x00FF_00FF))
    );
    assert_eq!(doc.update_data(host, data, Some("fillcolor")), 1);
    assert_eq!(doc.update_data(host, data, Some("unbound")), 0);
    assert_eq!(doc.events().len(), 1);
}

#[test]
fn shrinking_a_child_keeps_the_parent_extent() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.area(panel, Rect::new(0.0, 0.0, 300.0, 300.0), Rect::ZERO);
    let skin = Rc::new(b.build(&ctx).unwrap());
    let g = MemoryGraph::new();
    let host = Host::new(&ctx, &g);

    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 200.0, 200.0)));
    let panel = doc.generate(host, skin)[0];
    let root_node = doc.document(doc.root_document()).spatial().unwrap();
    let grown = Rect::new(0.0, 0.0, 300.0, 300.0);
    assert_eq!(doc.spatial().extent(root_node), grown);

    assert!(doc.set_state(host, panel, FieldId::ABS_RIGHT, CalcValue::Float(50.0)));
    assert!(doc.set_state(host, panel, FieldId::ABS_BOTTOM, CalcValue::Float(50.0)));
    assert_eq!(
        doc.document(doc_of(&doc, panel)).area(),
        Rect::new(0.0, 0.0, 50.0, 50.0)
    );
    assert_eq!(doc.spatial().extent(root_node), grown);
    assert!(doc.spatial().check_invariants().is_none());
}

#[test]
fn set_root_area_reflows_relative_children() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.area(panel, Rect::ZERO, FULL);
    let half = b.node(panel, "half");
    b.area(half, Rect::ZERO, Rect::new(0.0, 0.0, 0.5, 1.0));
    let skin = Rc::new(b.build(&ctx).unwrap());
    let g = MemoryGraph::new();
    let host = Host::new(&ctx, &g);

    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 800.0, 600.0)));
    let panel = doc.generate(host, skin)[0];
    let half = doc.outline(panel).children()[0];
    let (panel_doc, half_doc) = (doc_of(&doc, panel), doc_of(&doc, half));
    doc.flush(host);

    doc.set_root_area(Rect::new(0.0, 0.0, 400.0, 300.0));
    let changes = doc.flush(host);
    assert!(changes.reflowed.contains(&panel_doc));
    assert!(changes.reflowed.contains(&half_doc));
    assert!(!changes.damage.is_empty());
    assert_eq!(doc.document(panel_doc).area(), Rect::new(0.0, 0.0, 400.0, 300.0));
    assert_eq!(doc.document(half_doc).area(), Rect::new(0.0, 0.0, 200.0, 300.0));

    assert!(doc.flush(host).is_empty());
}

#[test]
fn ancestor_state_binding_follows_set_state() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "behavior", Calculation::string("box"))
        .field(panel, "fillcolor", Calculation::int(0x1111_11FF));
    let caption = b.node(panel, "caption");
    b.field(caption, "behavior", Calculation::string("text"))
        .field(caption, "color", Calculation::state("^fillcolor", CalcKind::Int));
    let skin = Rc::new(b.build(&ctx).unwrap());
    let g = MemoryGraph::new();
    let host = Host::new(&ctx, &g);

    let mut doc = Document::new(&ctx, DocumentConfig::default());
    let panel = doc.generate(host, skin)[0];
    let caption = doc.outline(panel).children()[0];
    assert_eq!(
        doc.get_state(host, caption, FieldId::TEXT_COLOR),
        Some(CalcValue::Int(0x1111_11FF))
    );

    assert!(doc.set_state(host, panel, FieldId::FILL_COLOR, CalcValue::Int(0x2222_22FF)));
    let state = doc.state::<TextState>(doc_of(&doc, caption)).unwrap();
    assert_eq!(state.color, 0x2222_22FF);
}

#[test]
fn behavior_swaps_when_its_binding_changes() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "behavior", Calculation::data("kind", CalcKind::Str));
    let skin = Rc::new(b.build(&ctx).unwrap());

    let mut g = MemoryGraph::new();
    let data = g.record("app");
    g.insert_text(data, "kind", "box");

    let mut doc = Document::new(&ctx, DocumentConfig::default());
    doc.set_data_root(Some(data));
    let panel = doc.generate(Host::new(&ctx, &g), skin)[0];
    let d = doc_of(&doc, panel);
    assert!(doc.state::<BoxState>(d).is_some());

    assert!(doc.set_data(&ctx, &mut g, data, "kind", DataValue::Text("text".into())));
    assert_eq!(doc.document(d).behavior(), ctx.behavior_id("text"));
    assert_eq!(doc.outline(panel).behavior(), ctx.behavior_id("text"));
    assert!(doc.state::<TextState>(d).is_some());
    assert_eq!(doc.outline(panel).swap_phase(), SwapPhase::Idle);
    assert_eq!(
        doc.get_state(Host::new(&ctx, &g), panel, FieldId::BEHAVIOR),
        Some(CalcValue::Str("text".into()))
    );
}

#[test]
fn cyclic_state_bindings_settle_within_a_pass() {
    let ctx = ctx();
    let add = ctx.operators().id("add_int").unwrap();
    let plus_one = |key: &str| {
        Calculation::builder(CalcKind::Int)
            .state(key, CalcKind::Int)
            .int(1)
            .op(add)
            .build()
    };
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "behavior", Calculation::string("box"))
        .field(panel, "fillcolor", plus_one("bordercolor"))
        .field(panel, "bordercolor", plus_one("fillcolor"));
    let skin = Rc::new(b.build(&ctx).unwrap());
    let g = MemoryGraph::new();
    let host = Host::new(&ctx, &g);

    let mut doc = Document::new(&ctx, DocumentConfig::default());
    let panel = doc.generate(host, skin)[0];
    let d = doc_of(&doc, panel);
    assert_eq!(doc.events().len(), 2);
    let state = *doc.state::<BoxState>(d).unwrap();
    assert_eq!((state.fill_color, state.border_color), (1, 2));

    // border -> fill -> border, then fill is already current for this pass.
    assert!(doc.set_state(host, panel, FieldId::BORDER_COLOR, CalcValue::Int(10)));
    let state = *doc.state::<BoxState>(d).unwrap();
    assert_eq!((state.fill_color, state.border_color), (11, 12));
}

#[test]
fn destroy_releases_edges_and_spatial_nodes() {
    let ctx = ctx();
    let (g, data) = app_data();
    let host = Host::new(&ctx, &g);
    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 800.0, 600.0)));
    doc.set_data_root(Some(data));
    let panel = doc.generate(host, panel_skin(&ctx))[0];
    let label = doc.outline(panel).children()[0];
    let (panel_doc, label_doc) = (doc_of(&doc, panel), doc_of(&doc, label));
    assert_eq!(doc.events().len(), 1);

    doc.destroy_outline(host, panel);
    assert_eq!(doc.outline_count(), 1);
    assert!(!doc.contains_outline(label));
    assert!(!doc.contains_document(panel_doc));
    assert!(!doc.contains_document(label_doc));
    assert!(doc.events().is_empty());
    assert_eq!(doc.spatial().len(), 1);
    assert!(doc.outline(doc.root()).children().is_empty());
    assert_eq!(doc.update_data(host, data, None), 0);

    let mut canvas = Recorder::default();
    doc.draw(host, &mut canvas);
    assert!(canvas.rects.is_empty());
}

#[test]
#[should_panic(expected = "stale OutlineId")]
fn destroyed_outline_handles_are_stale() {
    let ctx = ctx();
    let (g, data) = app_data();
    let host = Host::new(&ctx, &g);
    let mut doc = Document::new(&ctx, DocumentConfig::default());
    doc.set_data_root(Some(data));
    let panel = doc.generate(host, panel_skin(&ctx))[0];
    doc.destroy_outline(host, panel);
    let _ = doc.outline(panel);
}

#[test]
#[should_panic(expected = "cannot destroy the root outline")]
fn root_outline_cannot_be_destroyed() {
    let ctx = ctx();
    let g = MemoryGraph::new();
    let mut doc = Document::new(&ctx, DocumentConfig::default());
    let root = doc.root();
    doc.destroy_outline(Host::new(&ctx, &g), root);
}

#[test]
fn units_follow_the_outline_font() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "fontsize", Calculation::float(20.0, Unit::Px))
        .field(panel, "abs_right", Calculation::float(2.0, Unit::Em))
        .field(panel, "abs_bottom", Calculation::float(1.0, Unit::Em));
    let skin = Rc::new(b.build(&ctx).unwrap());
    let g = MemoryGraph::new();

    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 100.0, 100.0)));
    let panel = doc.generate(Host::new(&ctx, &g), skin)[0];
    assert_eq!(doc.outline(panel).font_size(), 20.0);
    assert_eq!(
        doc.document(doc_of(&doc, panel)).area(),
        Rect::new(0.0, 0.0, 40.0, 20.0)
    );
}

#[test]
fn text_draws_at_the_outline_font_size() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let label = b.node(b.root(), "label");
    b.field(label, "behavior", Calculation::string("text"))
        .field(label, "fontsize", Calculation::float(20.0, Unit::Px))
        .field(label, "text", Calculation::string("big"))
        .area(label, Rect::new(0.0, 0.0, 100.0, 30.0), Rect::ZERO);
    let skin = Rc::new(b.build(&ctx).unwrap());
    let g = MemoryGraph::new();
    let host = Host::new(&ctx, &g);

    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 200.0, 200.0)));
    let label = doc.generate(host, skin)[0];
    let d = doc_of(&doc, label);
    assert_eq!(doc.state::<TextState>(d).map(|s| s.font_size), Some(20.0));

    assert!(doc.set_state(host, label, FieldId::FONT_SIZE, CalcValue::Float(30.0)));
    let mut canvas = Recorder::default();
    doc.draw(host, &mut canvas);
    assert_eq!(canvas.fonts, [30.0]);
    assert_eq!(doc.state::<TextState>(d).map(|s| s.font_size), Some(30.0));
}

#[test]
fn display_queries_climb_to_the_document_config() {
    let ctx = ctx();
    let (g, data) = app_data();
    let host = Host::new(&ctx, &g);
    let mut doc = Document::new(
        &ctx,
        DocumentConfig {
            dpi: Vec2::new(144.0, 96.0),
            scale: 1.5,
            ..DocumentConfig::default()
        },
    );
    doc.set_data_root(Some(data));
    let panel = doc.generate(host, panel_skin(&ctx))[0];
    let label = doc_of(&doc, doc.outline(panel).children()[0]);

    let dpi = MessageResult::Dpi(Vec2::new(144.0, 96.0));
    assert_eq!(doc.send(host, label, &mut Message::GetDpi), dpi);
    assert_eq!(
        doc.send(host, label, &mut Message::GetTextScale),
        MessageResult::Scale(1.5)
    );
    let root = doc.root_document();
    assert_eq!(doc.send(host, root, &mut Message::GetDpi), dpi);
}

#[test]
fn layout_swap_moves_children_to_the_new_layout() {
    let ctx = custom_ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "layout", Calculation::data("arrange", CalcKind::Str))
        .field(panel, "gap", Calculation::float(10.0, Unit::Px))
        .area(panel, Rect::new(0.0, 0.0, 200.0, 100.0), Rect::ZERO);
    let item = b.node(panel, "item");
    b.area(item, Rect::new(0.0, 0.0, 50.0, 20.0), Rect::ZERO);
    let dot = b.node(item, "dot");
    b.area(dot, Rect::new(1.0, 1.0, 5.0, 5.0), Rect::ZERO);
    let skin = Rc::new(b.build(&ctx).unwrap());

    let mut g = MemoryGraph::new();
    let data = g.record("app");
    g.insert_text(data, "arrange", "default");

    let mut doc = Document::new(&ctx, config(Rect::new(0.0, 0.0, 400.0, 300.0)));
    doc.set_data_root(Some(data));
    let panel = doc.generate(Host::new(&ctx, &g), skin)[0];
    let item = doc.outline(panel).children()[0];
    let dot = doc.outline(item).children()[0];
    let (panel_doc, item_doc, dot_doc) =
        (doc_of(&doc, panel), doc_of(&doc, item), doc_of(&doc, dot));
    doc.flush(Host::new(&ctx, &g));
    assert_eq!(doc.document(item_doc).area(), Rect::new(0.0, 0.0, 50.0, 20.0));
    assert!(doc.layout_state::<Inset>(panel_doc).is_none());

    assert!(doc.set_data(&ctx, &mut g, data, "arrange", DataValue::Text("inset".into())));
    assert_eq!(Some(doc.outline(panel).layout()), ctx.layout_id("inset"));
    assert_eq!(doc.document(panel_doc).layout(), doc.outline(panel).layout());
    assert_eq!(doc.outline(panel).swap_phase(), SwapPhase::Idle);
    assert_eq!(doc.layout_state::<Inset>(panel_doc).map(|s| s.gap), Some(10.0));
    assert_eq!(
        doc.document(item_doc).area(),
        Rect::new(10.0, 10.0, 190.0, 90.0)
    );
    // Detaching the child took the grandchild's spatial node with it.
    assert!(doc.document(dot_doc).spatial().is_none());

    let host = Host::new(&ctx, &g);
    let changes = doc.flush(host);
    assert!(changes.reflowed.contains(&dot_doc));
    assert!(doc.document(dot_doc).spatial().is_some());
    assert_eq!(doc.document(dot_doc).area(), Rect::new(11.0, 11.0, 15.0, 15.0));
    assert_eq!(doc.spatial().len(), 4);
    assert!(doc.spatial().check_invariants().is_none());
    assert_eq!(doc.hit_test(Point::new(12.0, 12.0)), Some(dot_doc));

    assert!(doc.set_data(&ctx, &mut g, data, "arrange", DataValue::Text("default".into())));
    assert_eq!(doc.outline(panel).layout(), ctx.default_layout());
    assert!(doc.layout_state::<Inset>(panel_doc).is_none());
    assert_eq!(doc.document(item_doc).area(), Rect::new(0.0, 0.0, 50.0, 20.0));
    doc.flush(Host::new(&ctx, &g));
    assert!(doc.spatial().check_invariants().is_none());
}

#[test]
fn injected_input_bubbles_until_accepted() {
    let ctx = custom_ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "behavior", Calculation::string("focusable"));
    let label = b.node(panel, "label");
    b.field(label, "behavior", Calculation::string("text"));
    let skin = Rc::new(b.build(&ctx).unwrap());
    let g = MemoryGraph::new();
    let host = Host::new(&ctx, &g);

    let mut doc = Document::new(&ctx, DocumentConfig::default());
    let panel = doc.generate(host, skin)[0];
    let label = doc.outline(panel).children()[0];
    let (panel_doc, label_doc) = (doc_of(&doc, panel), doc_of(&doc, label));

    assert_eq!(
        doc.send(host, label_doc, &mut Message::GotFocus),
        MessageResult::Rejected
    );
    assert_eq!(
        doc.inject(host, label_doc, &mut Message::GotFocus),
        MessageResult::Handled
    );
    assert_eq!(doc.state::<Focus>(panel_doc).map(|f| f.gained), Some(1));

    // Nobody takes it, so the root's refusal comes back.
    assert_eq!(
        doc.inject(host, label_doc, &mut Message::LostFocus),
        MessageResult::Rejected
    );
    assert_eq!(doc.state::<Focus>(panel_doc).map(|f| f.gained), Some(1));
}

#[test]
fn subscriptions_share_one_edge_until_the_last_release() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let panel = b.node(b.root(), "panel");
    b.field(panel, "behavior", Calculation::string("box"));
    let skin = Rc::new(b.build(&ctx).unwrap());
    let g = MemoryGraph::new();
    let host = Host::new(&ctx, &g);

    let mut doc = Document::new(&ctx, DocumentConfig::default());
    let panel = doc.generate(host, skin)[0];
    let d = doc_of(&doc, panel);
    assert!(doc.events().is_empty());

    let tuple = EventTuple {
        source: EventSource::Outline(panel),
        source_field: FieldId::FILL_COLOR.0,
        dest: panel,
        dest_field: FieldId::BORDER,
    };
    let Registration::New(edge) = doc.subscribe(tuple, thicken) else {
        panic!("first subscription should link a new edge");
    };
    assert_eq!(doc.subscribe(tuple, thicken), Registration::Shared(edge));
    assert_eq!(doc.events().len(), 1);

    let border = |doc: &Document| doc.state::<BoxState>(d).map(|s| s.border);
    assert!(doc.set_state(host, panel, FieldId::FILL_COLOR, CalcValue::Int(1)));
    assert_eq!(border(&doc), Some(1.0), "a shared edge delivers once");

    assert!(!doc.unsubscribe(edge, tuple));
    assert!(doc.set_state(host, panel, FieldId::FILL_COLOR, CalcValue::Int(2)));
    assert_eq!(border(&doc), Some(2.0));

    assert!(doc.unsubscribe(edge, tuple));
    assert!(doc.events().is_empty());
    assert!(doc.set_state(host, panel, FieldId::FILL_COLOR, CalcValue::Int(3)));
    assert_eq!(border(&doc), Some(2.0));
    assert!(!doc.unsubscribe(edge, tuple), "stale edges are ignored");
}

#[test]
fn updating_a_whole_object_reruns_the_outlines_bound_to_it() {
    let ctx = ctx();
    let mut b = SkinBuilder::new();
    let row = b.template("row");
    b.field(row, "behavior", Calculation::string("text"))
        .field(row, "text", Calculation::data(".meta.caption", CalcKind::Str));
    let skin = Rc::new(b.build(&ctx).unwrap());

    let mut g = MemoryGraph::new();
    let item = g.record("row");
    let meta = g.record("meta");
    g.link(item, "meta", meta);
    let caption = g.insert_text(meta, "caption", "draft");

    let mut doc = Document::new(&ctx, DocumentConfig::default());
    let root = doc.root();
    let row = doc.generate_node(Host::new(&ctx, &g), skin, row, Some(item), root)[0];
    let d = doc_of(&doc, row);

    // Written behind the document's back.
    assert!(g.set_scalar(caption, DataValue::Text("final".into())));
    let host = Host::new(&ctx, &g);
    assert_eq!(doc.state::<TextState>(d).unwrap().text, "draft");

    // The caption edge hangs off `meta`, so only the bound outline reruns.
    assert_eq!(doc.update_data(host, item, None), 1);
    assert_eq!(doc.state::<TextState>(d).unwrap().text, "final");

    // `meta` has the edge but no outline bound to it.
    assert_eq!(doc.update_data(host, meta, None), 1);
    assert_eq!(doc.update_data(host, caption, None), 0);
}

#[cfg(feature = "trace")]
mod traced {
    use alloc::boxed::Box;
    use core::cell::RefCell;

    use super::*;
    use crate::trace::{DiagnosticEvent, DiagnosticKind, TraceSink};

    struct Diagnostics(Rc<RefCell<Vec<(DiagnosticKind, String)>>>);

    impl TraceSink for Diagnostics {
        fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
            self.0.borrow_mut().push((e.kind, e.detail.into()));
        }
    }

    #[test]
    fn generation_reports_what_it_cannot_resolve() {
        let ctx = ctx();
        let mut b = SkinBuilder::new();
        let list = b.node(b.root(), "list");
        let odd = b.node(list, "odd");
        b.field(odd, "behavior", Calculation::string("nonesuch"))
            .field(odd, "mystery", Calculation::int(1));
        let skin = Rc::new(b.build(&ctx).unwrap());

        let mut g = MemoryGraph::new();
        let items = g.array("items");
        for kind in ["odd", "Widget"] {
            let item = g.record(kind);
            g.push(items, item);
        }

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut doc = Document::new(&ctx, DocumentConfig::default());
        doc.set_trace_sink(Box::new(Diagnostics(Rc::clone(&seen))));
        doc.set_data_root(Some(items));
        let made = doc.generate(Host::new(&ctx, &g), skin);
        assert_eq!(made.len(), 1);

        let seen = seen.borrow();
        assert!(seen.contains(&(DiagnosticKind::UnknownBehavior, "nonesuch".into())));
        assert!(seen.contains(&(DiagnosticKind::UnresolvedField, "mystery".into())));
        assert!(seen.contains(&(DiagnosticKind::MissingTemplate, "list.Widget".into())));
        assert!(doc.take_trace_sink().is_some());
    }

    #[test]
    fn a_swap_requested_mid_swap_is_refused() {
        let ctx = custom_ctx();
        let mut b = SkinBuilder::new();
        let panel = b.node(b.root(), "panel");
        b.field(panel, "behavior", Calculation::data("kind", CalcKind::Str))
            .field(panel, "layout", Calculation::data("arrange", CalcKind::Str));
        let skin = Rc::new(b.build(&ctx).unwrap());

        let mut g = MemoryGraph::new();
        let data = g.record("app");
        let kind = g.insert_text(data, "kind", "box");
        let arrange = g.insert_text(data, "arrange", "default");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut doc = Document::new(&ctx, DocumentConfig::default());
        doc.set_trace_sink(Box::new(Diagnostics(Rc::clone(&seen))));
        doc.set_data_root(Some(data));
        let panel = doc.generate(Host::new(&ctx, &g), skin)[0];

        // `restless` reads the new `arrange` while its own swap is running.
        assert!(g.set_scalar(kind, DataValue::Text("restless".into())));
        assert!(g.set_scalar(arrange, DataValue::Text("inset".into())));
        let host = Host::new(&ctx, &g);
        assert_eq!(doc.update_data(host, data, Some("kind")), 1);

        assert!(
            seen.borrow()
                .contains(&(DiagnosticKind::SwapInProgress, "inset".into()))
        );
        assert_eq!(doc.outline(panel).behavior(), ctx.behavior_id("restless"));
        assert_eq!(doc.outline(panel).layout(), ctx.default_layout());
        assert_eq!(doc.outline(panel).swap_phase(), SwapPhase::Idle);

        assert_eq!(doc.update_data(host, data, Some("arrange")), 1);
        assert_eq!(Some(doc.outline(panel).layout()), ctx.layout_id("inset"));
    }

    #[test]
    fn self_expanding_templates_stop_at_the_depth_limit() {
        let ctx = ctx();
        let mut b = SkinBuilder::new();
        b.node(b.root(), "tree");
        let folder = b.template("folder");
        b.field(folder, "zindex", Calculation::int(1));
        b.node(folder, "kids");
        let skin = Rc::new(b.build(&ctx).unwrap());

        // Every folder's `kids` expand over the folder itself.
        let mut g = MemoryGraph::new();
        let root = g.record("folder");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut doc = Document::new(&ctx, DocumentConfig::default());
        doc.set_trace_sink(Box::new(Diagnostics(Rc::clone(&seen))));
        doc.set_data_root(Some(root));
        let made = doc.generate(Host::new(&ctx, &g), skin);

        assert_eq!(made.len(), 1);
        // One folder per two levels of nesting, plus the root outline.
        assert_eq!(doc.outline_count(), 33);
        let seen = seen.borrow();
        let exceeded = seen
            .iter()
            .filter(|(kind, _)| *kind == DiagnosticKind::DepthExceeded)
            .count();
        assert_eq!(exceeded, 1);
        assert!(doc.spatial().check_invariants().is_none());
    }
}
