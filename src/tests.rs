/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Crate unit tests.

use super::*;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

const TRACK: TypeTag = TypeTag(1);
const VIA: TypeTag = TypeTag(2);
const PAD: TypeTag = TypeTag(3);

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

#[derive(Debug)]
struct TestItem {
    tag: TypeTag,
    type_name: &'static str,
    fields: HashMap<&'static str, PropValue>,
    net_class: Option<Arc<EffectiveClass>>,
    component_class: Option<Arc<EffectiveClass>>,
    net_code: Option<NetCode>,
    net_name: Option<String>,
}

impl TestItem {
    fn new(tag: TypeTag, type_name: &'static str) -> Self {
        Self {
            tag,
            type_name,
            fields: HashMap::new(),
            net_class: None,
            component_class: None,
            net_code: None,
            net_name: None,
        }
    }

    fn with_field(mut self, name: &'static str, value: PropValue) -> Self {
        self.fields.insert(name, value);
        self
    }

    fn with_net_class(mut self, constituents: &[&str]) -> Self {
        self.net_class = Some(Arc::new(EffectiveClass::new(constituents.iter().copied())));
        self
    }

    fn with_component_class(mut self, constituents: &[&str]) -> Self {
        self.component_class = Some(Arc::new(EffectiveClass::new(constituents.iter().copied())));
        self
    }

    fn with_net(mut self, code: i32, name: &str) -> Self {
        self.net_code = Some(NetCode(code));
        self.net_name = Some(name.to_string());
        self
    }
}

impl BoardItem for TestItem {
    fn type_tag(&self) -> TypeTag {
        self.tag
    }

    fn type_name(&self) -> &str {
        self.type_name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn effective_net_class(&self) -> Option<Arc<EffectiveClass>> {
        self.net_class.clone()
    }

    fn effective_component_class(&self) -> Option<Arc<EffectiveClass>> {
        self.component_class.clone()
    }

    fn net_code(&self) -> Option<NetCode> {
        self.net_code
    }

    fn net_name(&self) -> Option<String> {
        self.net_name.clone()
    }
}

fn field(name: &'static str) -> impl Fn(&dyn BoardItem) -> PropValue + Send + Sync {
    move |item| {
        item.as_any()
            .downcast_ref::<TestItem>()
            .and_then(|item| item.fields.get(name).cloned())
            .unwrap_or(PropValue::Null)
    }
}

fn registry() -> PropertyRegistry {
    let mut props = PropertyRegistry::new();
    props.register_type(TRACK, "track");
    props.register_type(VIA, "via");
    props.register_type(PAD, "pad");
    for tag in [TRACK, VIA] {
        props.register_property(tag, "Width", PrimitiveKind::Double, field("Width"));
    }
    props.register_property(VIA, "Drill", PrimitiveKind::Double, field("Drill"));
    props.register_property(VIA, "Via_Type", PrimitiveKind::Str, field("Via_Type"));
    props.register_property(VIA, "Is_Plated", PrimitiveKind::Bool, field("Is_Plated"));
    props.register_property(PAD, "Pin_Type", PrimitiveKind::PinType, field("Pin_Type"));
    props.register_property(PAD, "Shape", PrimitiveKind::Enum, field("Shape"));
    props.register_property(PAD, "Pad_Number", PrimitiveKind::Int, field("Pad_Number"));
    props.register_optional_property(
        TRACK,
        "Clearance_Override",
        PrimitiveKind::Double,
        field("Clearance_Override"),
    );
    props.register_deprecated_alias(VIA, "ViaKind", "Via_Type");
    props
}

fn engine() -> RuleEngine {
    init_tracing();
    RuleEngine::new(registry())
}

fn layers() -> LayerCache {
    LayerCache::new(vec![
        LayerDef::new(LayerId(0), "F.Cu"),
        LayerDef::renamed(LayerId(2), "In1.Cu", "GND plane"),
        LayerDef::new(LayerId(31), "B.Cu"),
    ])
}

fn eval_bool(engine: &RuleEngine, source: &str, ctx: &Context<'_>) -> bool {
    let program = engine.compile(source).expect("rule should compile");
    program.run(ctx).as_bool()
}

fn first_caret_column(pointer: &str) -> Option<usize> {
    pointer.chars().position(|ch| ch == '^').map(|idx| idx + 1)
}

#[test]
fn repeated_runs_return_equal_values() {
    let engine = engine();
    let program = engine
        .compile("A.Width + 1mm > 2mm")
        .expect("rule should compile");
    let layers = layers();
    let item = TestItem::new(TRACK, "track").with_field("Width", PropValue::Double(1_500_000.0));
    let ctx = Context::new(&layers).with_item_a(&item);

    let first = program.run(&ctx).as_bool();
    for _ in 0..3 {
        assert_eq!(program.run(&ctx).as_bool(), first);
    }
    assert!(first);
}

#[test]
fn unset_b_slot_reads_null() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(TRACK, "track").with_field("Width", PropValue::Double(1_000.0));
    let ctx = Context::new(&layers).with_item_a(&item);

    // A null reference never equals a concrete value.
    assert!(!eval_bool(&engine, "B.Width == 1000", &ctx));
    assert!(!eval_bool(&engine, "B.Width == A.Width", &ctx));
    // Two null references are equal.
    assert!(eval_bool(&engine, "B.Width == B.Drill", &ctx));
    // Inequality against null is well-defined, not an error.
    assert!(eval_bool(&engine, "B.Width != A.Width", &ctx));
}

#[test]
fn field_missing_on_runtime_type_reads_null() {
    let engine = engine();
    let layers = layers();
    // `Via_Type` resolves at compile time (it exists on via) but a track has
    // no accessor for it, so the reference degrades to null.
    let item = TestItem::new(TRACK, "track").with_field("Width", PropValue::Double(1_000.0));
    let ctx = Context::new(&layers).with_item_a(&item);
    assert!(!eval_bool(&engine, "A.Via_Type == 'buried'", &ctx));
}

#[test]
fn optional_fields_read_null_when_unset() {
    let engine = engine();
    let layers = layers();

    let bare = TestItem::new(TRACK, "track");
    let ctx = Context::new(&layers).with_item_a(&bare);
    assert!(!eval_bool(&engine, "A.Clearance_Override == 0.2mm", &ctx));

    let tuned = TestItem::new(TRACK, "track")
        .with_field("Clearance_Override", PropValue::Double(200_000.0));
    let ctx = Context::new(&layers).with_item_a(&tuned);
    assert!(eval_bool(&engine, "A.Clearance_Override == 0.2mm", &ctx));
}

#[test]
fn logical_operators_short_circuit() {
    let mut engine = engine();
    let calls = Arc::new(AtomicUsize::new(0));
    let probe = calls.clone();
    engine
        .functions_mut()
        .register("probe", "probe()", Some(0), move |_ctx, _args| {
            probe.fetch_add(1, AtomicOrdering::SeqCst);
            Value::Number(1.0)
        });
    let layers = layers();
    let ctx = Context::new(&layers);

    assert!(!eval_bool(&engine, "1 == 2 && probe() == 1", &ctx));
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);

    assert!(eval_bool(&engine, "1 == 1 || probe() == 1", &ctx));
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);

    assert!(eval_bool(&engine, "1 == 1 && probe() == 1", &ctx));
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
}

#[test]
fn wildcards_match_case_insensitively() {
    let engine = engine();
    let layers = layers();
    let ctx = Context::new(&layers);

    assert!(eval_bool(&engine, "'ABC' == 'A*'", &ctx));
    assert!(eval_bool(&engine, "'ABC' == 'A?C'", &ctx));
    assert!(!eval_bool(&engine, "'ABC' == 'A?'", &ctx));
    assert!(eval_bool(&engine, "'abc' == 'A*'", &ctx));
    assert!(eval_bool(&engine, "'A*' == 'ABC'", &ctx));
}

#[test]
fn plain_string_equality_ignores_case() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(VIA, "via").with_field("Via_Type", PropValue::Str("Buried".into()));
    let ctx = Context::new(&layers).with_item_a(&item);
    assert!(eval_bool(&engine, "A.Via_Type == 'buried'", &ctx));
    assert!(!eval_bool(&engine, "A.Via_Type == 'blind'", &ctx));
}

#[test]
fn net_class_matches_any_constituent() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(TRACK, "track").with_net_class(&["PWR", "FAST"]);
    let ctx = Context::new(&layers).with_item_a(&item);

    assert!(eval_bool(&engine, "A.NetClass == 'PWR'", &ctx));
    assert!(eval_bool(&engine, "A.NetClass == 'FAST'", &ctx));
    assert!(eval_bool(&engine, "A.NetClass == 'PWR,FAST'", &ctx));
    assert!(!eval_bool(&engine, "A.NetClass == 'OTHER'", &ctx));
    // Wildcards apply to the full name and each constituent alike.
    assert!(eval_bool(&engine, "A.NetClass == 'FAS*'", &ctx));
}

#[test]
fn net_class_identity_ignores_merge_order() {
    let engine = engine();
    let layers = layers();
    let a = TestItem::new(TRACK, "track").with_net_class(&["PWR", "FAST"]);
    let b = TestItem::new(VIA, "via").with_net_class(&["FAST", "PWR"]);
    let other = TestItem::new(VIA, "via").with_net_class(&["PWR"]);

    let ctx = Context::new(&layers).with_item_a(&a).with_item_b(&b);
    assert!(eval_bool(&engine, "A.NetClass == B.NetClass", &ctx));

    let ctx = Context::new(&layers).with_item_a(&a).with_item_b(&other);
    assert!(!eval_bool(&engine, "A.NetClass == B.NetClass", &ctx));
}

#[test]
fn named_composite_classes_match_display_name_or_constituents() {
    let engine = engine();
    let layers = layers();
    let mut item = TestItem::new(TRACK, "track");
    item.net_class = Some(Arc::new(EffectiveClass::named("HV rail", ["HV", "PWR"])));
    let ctx = Context::new(&layers).with_item_a(&item);

    assert!(eval_bool(&engine, "A.NetClass == 'HV rail'", &ctx));
    assert!(eval_bool(&engine, "A.NetClass == 'PWR'", &ctx));
    assert!(!eval_bool(&engine, "A.NetClass == 'HV,PWR'", &ctx));
}

#[test]
fn component_class_matches_any_constituent() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(PAD, "pad").with_component_class(&["LED", "Indicator"]);
    let ctx = Context::new(&layers).with_item_a(&item);

    assert!(eval_bool(&engine, "A.ComponentClass == 'LED'", &ctx));
    assert!(eval_bool(&engine, "A.ComponentClass == 'Ind*'", &ctx));
    assert!(!eval_bool(&engine, "A.ComponentClass == 'Relay'", &ctx));
}

#[test]
fn unit_suffixes_convert_to_one_scale() {
    let engine = engine();
    let layers = layers();
    let ctx = Context::new(&layers);

    assert!(eval_bool(&engine, "1mm == 1000um", &ctx));
    assert!(eval_bool(&engine, "1in == 25.4mm", &ctx));

    let item = TestItem::new(TRACK, "track").with_field("Width", PropValue::Double(1_000_000.0));
    let ctx = Context::new(&layers).with_item_a(&item);
    assert!(eval_bool(&engine, "A.Width == 1mm", &ctx));
    assert!(eval_bool(&engine, "A.Width == 1000um", &ctx));
}

#[test]
fn unsupported_unit_names_the_allowed_set() {
    let engine = engine();
    let err = engine
        .compile("A.Width == 1furlong")
        .expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(err.message.contains("furlong"), "message: {}", err.message);
    assert!(err.message.contains("mm"), "message: {}", err.message);
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 12);
    assert_eq!(first_caret_column(&err.pointer), Some(err.column));
}

#[test]
fn unitless_hosts_reject_every_suffix() {
    let engine = RuleEngine::new(registry()).with_units(NoUnits);
    let err = engine.compile("1mm == 1").expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("plain numbers only"),
        "message: {}",
        err.message
    );

    let layers = layers();
    let ctx = Context::new(&layers);
    assert!(eval_bool(&engine, "2 > 1", &ctx));
}

#[test]
fn via_rule_end_to_end() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(VIA, "via").with_field("Via_Type", PropValue::Str("buried".into()));
    let ctx = Context::new(&layers).with_item_a(&item);
    assert!(eval_bool(
        &engine,
        "A.Type == 'via' && A.Via_Type == 'buried'",
        &ctx
    ));

    let through = TestItem::new(VIA, "via").with_field("Via_Type", PropValue::Str("through".into()));
    let ctx = Context::new(&layers).with_item_a(&through);
    assert!(!eval_bool(
        &engine,
        "A.Type == 'via' && A.Via_Type == 'buried'",
        &ctx
    ));
}

#[test]
fn net_identity_compares_codes_not_names() {
    let engine = engine();
    let layers = layers();
    // Same net, display names differing by escaping.
    let a = TestItem::new(TRACK, "track").with_net(7, "Net-(R1-Pad1)");
    let b = TestItem::new(VIA, "via").with_net(7, "Net-{R1-Pad1}");
    let ctx = Context::new(&layers).with_item_a(&a).with_item_b(&b);
    assert!(eval_bool(&engine, "A.NetName == B.NetName", &ctx));

    let c = TestItem::new(VIA, "via").with_net(8, "Net-(R1-Pad1)");
    let ctx = Context::new(&layers).with_item_a(&a).with_item_b(&c);
    assert!(!eval_bool(&engine, "A.NetName == B.NetName", &ctx));

    // Against a string the display name is what matches.
    let ctx = Context::new(&layers).with_item_a(&a);
    assert!(eval_bool(&engine, "A.NetName == 'Net-(R1-Pad1)'", &ctx));
    assert!(eval_bool(&engine, "A.NetName == 'Net-*'", &ctx));
}

#[test]
fn division_follows_ieee754() {
    let engine = engine();
    let layers = layers();
    let ctx = Context::new(&layers);

    let program = engine.compile("1 / 0").expect("rule should compile");
    assert_eq!(program.run(&ctx).as_number(), Some(f64::INFINITY));

    let program = engine.compile("0 / 0").expect("rule should compile");
    assert!(program.run(&ctx).as_number().expect("numeric").is_nan());

    assert!(eval_bool(&engine, "1 / 0 > 1000000", &ctx));
    // NaN never orders nor equals.
    assert!(!eval_bool(&engine, "0 / 0 == 0 / 0", &ctx));
    assert!(!eval_bool(&engine, "0 / 0 < 1", &ctx));
}

#[test]
fn layer_names_resolve_canonical_and_user_forms() {
    let engine = engine();
    let layers = layers();

    let ctx = Context::new(&layers).with_layer(LayerId(0));
    assert!(eval_bool(&engine, "L == 'F.Cu'", &ctx));
    assert!(eval_bool(&engine, "L == 'f.cu'", &ctx));
    assert!(!eval_bool(&engine, "L == 'B.Cu'", &ctx));

    // A renamed layer answers to both spellings.
    let ctx = Context::new(&layers).with_layer(LayerId(2));
    assert!(eval_bool(&engine, "L == 'In1.Cu'", &ctx));
    assert!(eval_bool(&engine, "L == 'GND plane'", &ctx));

    // No active layer reads null.
    let ctx = Context::new(&layers);
    assert!(!eval_bool(&engine, "L == 'F.Cu'", &ctx));
}

#[test]
fn layer_wildcards_match_name_groups() {
    let engine = engine();
    let layers = layers();

    let ctx = Context::new(&layers).with_layer(LayerId(0));
    assert!(eval_bool(&engine, "L == '?.Cu'", &ctx));
    let ctx = Context::new(&layers).with_layer(LayerId(31));
    assert!(eval_bool(&engine, "L == '?.Cu'", &ctx));
    // Inner layers have longer canonical names.
    let ctx = Context::new(&layers).with_layer(LayerId(2));
    assert!(!eval_bool(&engine, "L == '?.Cu'", &ctx));
    assert!(eval_bool(&engine, "L == '*.Cu'", &ctx));
}

#[test]
fn layer_cache_invalidation_reflects_renames() {
    let engine = engine();
    let layers = layers();
    let program = engine.compile("L == 'Top'").expect("rule should compile");

    let ctx = Context::new(&layers).with_layer(LayerId(0));
    assert!(!program.run(&ctx).as_bool());

    // The host renames F.Cu and replaces the table; memoized lookups drop.
    layers.set_layers(vec![
        LayerDef::renamed(LayerId(0), "F.Cu", "Top"),
        LayerDef::new(LayerId(31), "B.Cu"),
    ]);
    let ctx = Context::new(&layers).with_layer(LayerId(0));
    assert!(program.run(&ctx).as_bool());
}

#[test]
fn ab_alias_binds_the_first_slot() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(VIA, "via");
    let ctx = Context::new(&layers).with_item_a(&item);
    assert!(eval_bool(&engine, "AB.Type == 'via'", &ctx));
    assert!(eval_bool(&engine, "ab.type == 'via'", &ctx));
}

#[test]
fn bare_object_reference_compares_type_name() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(VIA, "via");
    let ctx = Context::new(&layers).with_item_a(&item);
    assert!(eval_bool(&engine, "A == 'via'", &ctx));
    assert!(!eval_bool(&engine, "A == 'track'", &ctx));
    assert!(eval_bool(&engine, "A.Type == 'v*'", &ctx));
}

#[test]
fn constraint_kind_reaches_registered_functions() {
    let mut engine = engine();
    engine
        .functions_mut()
        .register("kind", "kind()", Some(0), |ctx, _args| {
            Value::Number(ctx.constraint_kind() as f64)
        });
    let layers = layers();
    let program = engine.compile("kind() == 7").expect("rule should compile");

    let ctx = Context::new(&layers).with_constraint_kind(7);
    assert!(program.run(&ctx).as_bool());
    let ctx = Context::new(&layers).with_constraint_kind(3);
    assert!(!program.run(&ctx).as_bool());
}

#[test]
fn numeric_builtins_evaluate() {
    let engine = engine();
    let layers = layers();
    let a = TestItem::new(TRACK, "track").with_field("Width", PropValue::Double(200_000.0));
    let b = TestItem::new(VIA, "via").with_field("Width", PropValue::Double(400_000.0));
    let ctx = Context::new(&layers).with_item_a(&a).with_item_b(&b);

    assert!(eval_bool(&engine, "min(A.Width, B.Width) == 0.2mm", &ctx));
    assert!(eval_bool(&engine, "max(A.Width, B.Width) == 0.4mm", &ctx));
    assert!(eval_bool(&engine, "abs(-1mm) == 1mm", &ctx));
    // Null arguments flow through as null results.
    assert!(!eval_bool(&engine, "min(A.Drill, B.Width) == 0", &ctx));
}

#[test]
fn pin_type_aliases_translate_vocabularies() {
    let engine = engine();
    let layers = layers();
    let pad = TestItem::new(PAD, "pad").with_field("Pin_Type", PropValue::Str("tri_state".into()));
    let ctx = Context::new(&layers).with_item_a(&pad);

    assert!(eval_bool(&engine, "A.Pin_Type == 'tri_state'", &ctx));
    assert!(eval_bool(&engine, "A.Pin_Type == 'Tri-state'", &ctx));
    assert!(eval_bool(&engine, "A.Pin_Type == 'TRI-STATE'", &ctx));
    assert!(!eval_bool(&engine, "A.Pin_Type == 'Input'", &ctx));

    let pad = TestItem::new(PAD, "pad").with_field("Pin_Type", PropValue::Str("power_in".into()));
    let ctx = Context::new(&layers).with_item_a(&pad);
    assert!(eval_bool(&engine, "A.Pin_Type == 'Power input'", &ctx));
    assert!(!eval_bool(&engine, "A.Pin_Type == 'Power output'", &ctx));
}

#[test]
fn pin_type_wildcards_match_either_vocabulary() {
    let engine = engine();
    let layers = layers();
    let pad = TestItem::new(PAD, "pad").with_field("Pin_Type", PropValue::Str("no_connect".into()));
    let ctx = Context::new(&layers).with_item_a(&pad);

    // The stored token matches directly.
    assert!(eval_bool(&engine, "A.Pin_Type == 'no_*'", &ctx));
    // A glob written in the display vocabulary matches the translation.
    assert!(eval_bool(&engine, "A.Pin_Type == 'Unconn*'", &ctx));
    assert!(!eval_bool(&engine, "A.Pin_Type == 'Power*'", &ctx));
}

#[test]
fn enum_fields_compare_as_text() {
    let engine = engine();
    let layers = layers();
    let pad = TestItem::new(PAD, "pad").with_field("Shape", PropValue::Str("circle".into()));
    let ctx = Context::new(&layers).with_item_a(&pad);
    assert!(eval_bool(&engine, "A.Shape == 'Circle'", &ctx));
    assert!(eval_bool(&engine, "A.Shape == 'c*'", &ctx));
    assert!(!eval_bool(&engine, "A.Shape == 'oval'", &ctx));
}

#[test]
fn integer_fields_compare_numerically() {
    let engine = engine();
    let layers = layers();
    let pad = TestItem::new(PAD, "pad").with_field("Pad_Number", PropValue::Int(3));
    let ctx = Context::new(&layers).with_item_a(&pad);
    assert!(eval_bool(&engine, "A.Pad_Number == 3", &ctx));
    assert!(eval_bool(&engine, "A.Pad_Number < 10 && A.Pad_Number >= 1", &ctx));
}

#[test]
fn boolean_fields_read_as_conditions() {
    let engine = engine();
    let layers = layers();
    let plated = TestItem::new(VIA, "via").with_field("Is_Plated", PropValue::Bool(true));
    let ctx = Context::new(&layers).with_item_a(&plated);
    assert!(eval_bool(&engine, "A.Is_Plated", &ctx));
    assert!(eval_bool(&engine, "A.Is_Plated == 1", &ctx));

    let bare = TestItem::new(VIA, "via").with_field("Is_Plated", PropValue::Bool(false));
    let ctx = Context::new(&layers).with_item_a(&bare);
    assert!(!eval_bool(&engine, "A.Is_Plated", &ctx));
    assert!(eval_bool(&engine, "!A.Is_Plated", &ctx));
}

#[test]
fn relational_and_arithmetic_combine_fields() {
    let engine = engine();
    let layers = layers();
    let a = TestItem::new(TRACK, "track").with_field("Width", PropValue::Double(1_500_000.0));
    let b = TestItem::new(VIA, "via").with_field("Width", PropValue::Double(2_000_000.0));
    let ctx = Context::new(&layers).with_item_a(&a).with_item_b(&b);

    assert!(eval_bool(&engine, "A.Width < 2mm && A.Width >= 1mm", &ctx));
    assert!(eval_bool(&engine, "A.Width + B.Width < 4mm", &ctx));
    assert!(eval_bool(&engine, "A.Width * 2 > B.Width", &ctx));
    assert!(eval_bool(&engine, "B.Width / 2 == 1mm", &ctx));
    assert!(eval_bool(&engine, "-A.Width < 0", &ctx));
}

#[test]
fn string_literal_against_numeric_field_reads_as_quantity() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(TRACK, "track").with_field("Width", PropValue::Double(4_000_000.0));
    let ctx = Context::new(&layers).with_item_a(&item);

    let mut warnings = Vec::new();
    let program = engine
        .compile_with_warnings("A.Width == '4mm'", &mut |w| warnings.push(w))
        .expect("fallback comparison should compile");
    assert_eq!(warnings.len(), 1);
    assert!(
        warnings[0].message.contains("quantity"),
        "warning: {}",
        warnings[0].message
    );
    assert!(program.run(&ctx).as_bool());

    // The fallback also admits string quantities where an order is required.
    assert!(eval_bool(&engine, "A.Width <= '5mm'", &ctx));
    assert!(!eval_bool(&engine, "A.Width == '3mm'", &ctx));
}

#[test]
fn unreadable_quantity_literal_is_rejected() {
    let engine = engine();
    let err = engine
        .compile("A.Width == 'wide'")
        .expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("cannot be read as a quantity"),
        "message: {}",
        err.message
    );
}

#[test]
fn cross_kind_comparisons_are_rejected() {
    let engine = engine();

    let err = engine
        .compile("A.Via_Type == A.Width")
        .expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("cannot compare"),
        "message: {}",
        err.message
    );

    let err = engine.compile("A.Type < 5").expect_err("compile should fail");
    assert!(
        err.message.contains("requires numeric operands"),
        "message: {}",
        err.message
    );
}

#[test]
fn unknown_variable_base_is_a_compile_error() {
    let engine = engine();
    let err = engine.compile("C.Width == 1").expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("Unknown variable 'C'"),
        "message: {}",
        err.message
    );
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 1);
    assert_eq!(err.snippet, "C.Width == 1");
    assert_eq!(first_caret_column(&err.pointer), Some(1));
}

#[test]
fn unknown_field_names_the_field() {
    let engine = engine();
    let err = engine
        .compile("A.Bogus == 1")
        .expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("Unknown field 'Bogus'"),
        "message: {}",
        err.message
    );
}

#[test]
fn layer_reference_takes_no_field() {
    let engine = engine();
    let err = engine
        .compile("L.Name == 'F.Cu'")
        .expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("takes no field"),
        "message: {}",
        err.message
    );
}

#[test]
fn inconsistent_field_kinds_are_rejected() {
    let mut props = registry();
    props.register_property(TRACK, "Code", PrimitiveKind::Double, field("Code"));
    props.register_property(VIA, "Code", PrimitiveKind::Str, field("Code"));
    let engine = RuleEngine::new(props);

    let err = engine.compile("A.Code == 1").expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("resolves inconsistently"),
        "message: {}",
        err.message
    );
    assert!(err.message.contains("track"), "message: {}", err.message);
    assert!(err.message.contains("via"), "message: {}", err.message);
}

#[test]
fn unknown_function_lists_known_signatures() {
    let engine = engine();
    let err = engine
        .compile("bogus(1) == 1")
        .expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("Unknown function 'bogus'"),
        "message: {}",
        err.message
    );
    assert!(err.message.contains("min(a, b)"), "message: {}", err.message);
}

#[test]
fn function_arity_is_checked() {
    let engine = engine();
    let err = engine.compile("min(1) == 1").expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Compile);
    assert!(
        err.message.contains("expects 2 arguments, found 1"),
        "message: {}",
        err.message
    );
}

#[test]
fn deprecated_field_alias_warns_and_compiles() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(VIA, "via").with_field("Via_Type", PropValue::Str("buried".into()));
    let ctx = Context::new(&layers).with_item_a(&item);

    let mut warnings = Vec::new();
    let program = engine
        .compile_with_warnings("A.ViaKind == 'buried'", &mut |w| warnings.push(w))
        .expect("aliased field should compile");
    assert_eq!(warnings.len(), 1);
    assert!(
        warnings[0].message.contains("deprecated"),
        "warning: {}",
        warnings[0].message
    );
    assert!(
        warnings[0].message.contains("Via_Type"),
        "warning: {}",
        warnings[0].message
    );
    assert!(program.run(&ctx).as_bool());
}

#[test]
fn warnings_are_delivered_even_when_compilation_fails() {
    let engine = engine();
    let mut warnings = Vec::new();
    let result = engine.compile_with_warnings("A.ViaKind == A.Bogus", &mut |w| warnings.push(w));
    assert!(result.is_err());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("deprecated"));
}

#[test]
fn unterminated_string_is_a_lex_error() {
    let engine = engine();
    let err = engine
        .compile("A.Type == 'via")
        .expect_err("compile should fail");
    assert_eq!(err.kind, ErrorKind::Lex);
    assert!(
        err.message.contains("Unterminated string"),
        "message: {}",
        err.message
    );
}

#[test]
fn reports_parse_errors_for_invalid_forms() {
    let cases = vec![
        ("missing rhs operand", "A.Width == "),
        ("dangling operator", "A.Width +"),
        ("unclosed parenthesis", "(A.Width == 1"),
        ("unclosed call", "min(1, 2"),
        ("empty input", ""),
        ("lone operator", "&&"),
        ("trailing garbage", "A.Width == 1 1"),
    ];

    for (case_name, source) in cases {
        let err = parse_rule(source).expect_err("parse should fail");
        assert_ne!(
            err.kind,
            ErrorKind::Compile,
            "{case_name}: expected a parse-stage error"
        );
        assert!(
            err.message.contains("Syntax error") || err.message.contains("Incomplete"),
            "{case_name}: unexpected message '{}'",
            err.message
        );
    }
}

#[test]
fn parse_rule_builds_a_spanned_ast() {
    let expr = parse_rule("A.NetClass == 'Power'").expect("rule should parse");
    let ExprKind::Binary { op, left, right } = &expr.kind else {
        panic!("expected a binary root");
    };
    assert_eq!(*op, BinOp::Eq);
    assert!(matches!(
        &left.kind,
        ExprKind::VarRef { base, field: Some(f) } if base == "A" && f == "NetClass"
    ));
    assert!(matches!(
        &right.kind,
        ExprKind::Str { text, wildcard: false } if text == "Power"
    ));
    assert_eq!(left.span.column, 1);
    assert_eq!(right.span.column, 15);
}

#[test]
fn values_materialize_display_forms_on_read() {
    let engine = engine();
    let layers = layers();
    let item = TestItem::new(TRACK, "track")
        .with_net_class(&["PWR", "FAST"])
        .with_net(7, "VBUS");
    let ctx = Context::new(&layers).with_item_a(&item);

    let program = engine.compile("A.NetClass").expect("rule should compile");
    assert_eq!(program.run(&ctx).as_string(), "PWR,FAST");

    let program = engine.compile("A.NetName").expect("rule should compile");
    assert_eq!(program.run(&ctx).as_string(), "VBUS");

    let program = engine.compile("L").expect("rule should compile");
    let ctx = Context::new(&layers).with_layer(LayerId(0));
    assert_eq!(program.run(&ctx).as_string(), "F.Cu");

    let program = engine.compile("1mm + 1mm").expect("rule should compile");
    let ctx = Context::new(&layers);
    assert_eq!(program.run(&ctx).as_string(), "2000000");
}

#[test]
fn programs_are_shareable_across_threads() {
    let engine = engine();
    let program = engine
        .compile("A.Type == 'via' && A.Drill < 0.5mm && L == '?.Cu'")
        .expect("rule should compile");
    let layers = layers();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let item =
                    TestItem::new(VIA, "via").with_field("Drill", PropValue::Double(300_000.0));
                let ctx = Context::new(&layers)
                    .with_item_a(&item)
                    .with_layer(LayerId(0));
                for _ in 0..100 {
                    assert!(program.run(&ctx).as_bool());
                }
            });
        }
    });
}
