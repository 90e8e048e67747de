use super::*;
use crate::document::host::PropRoot;
use crate::document::project::Project;
use crate::test_support::{hex, studio};

fn swap(old: &str, new: &str) -> StaticSwap {
    StaticSwap {
        old_color: hex(old),
        new_color: hex(new),
        merged_from: None,
    }
}

fn statics(swaps: Vec<StaticSwap>) -> SwapPayload {
    SwapPayload {
        swaps,
        ..SwapPayload::default()
    }
}

fn pulse_fill() -> PropRef {
    PropRef::root(LayerRef::new(CompId(1), 5), PropRoot::Contents)
        .child(1)
        .child(1)
        .child(1)
}

fn shape_fill() -> PropRef {
    PropRef::root(LayerRef::new(CompId(1), 3), PropRoot::Contents)
        .child(1)
        .child(1)
        .child(1)
}

fn keyframe_swap(old: &str, new: &str, keys: &[usize]) -> KeyframeSwap {
    KeyframeSwap {
        card_index: 6,
        cell_index: 0,
        old_color: hex(old),
        new_color: hex(new),
        key_indices: keys.to_vec(),
        layer_index: 5,
        comp_id: CompId(1),
        property_type: PropertyType::ShapeFill,
        property_path: "Contents > Pulse > Fill 1".to_string(),
    }
}

#[test]
fn static_swap_skips_expression_and_keyframed_sites() {
    let mut p = studio();
    let out = swap_colors(&mut p, &statics(vec![swap("#ff0000", "#0000ff")]));
    assert_eq!(out.count, 2);
    let layers: Vec<_> = out.changes.iter().map(|c| c.layer_name.as_str()).collect();
    assert_eq!(layers, ["BG", "Shapes"]);

    let bg = &out.changes[0];
    assert_eq!(bg.layer_id, 1);
    assert_eq!(bg.property_type, PropertyType::Solid);
    assert_eq!(bg.property_match_name, None);
    assert_eq!(bg.comp_name, "Main");
    assert!(!bg.was_locked);

    let shapes = &out.changes[1];
    assert_eq!(shapes.property_type, PropertyType::ShapeFill);
    assert_eq!(
        shapes.property_match_name.as_deref(),
        Some("ADBE Vector Fill Color")
    );
    assert_eq!(shapes.old_color, hex("#ff0000"));
    assert_eq!(shapes.new_color, hex("#0000ff"));

    let driven = PropRef::root(LayerRef::new(CompId(1), 4), PropRoot::Contents)
        .child(1)
        .child(1);
    assert_eq!(p.property_value(&driven).unwrap().to_hex(), hex("#ff0000"));
    assert_eq!(p.key_value(&pulse_fill(), 1).unwrap().to_hex(), hex("#ff0000"));
    assert_eq!(p.undo_groups(), [SWAP_UNDO_GROUP]);
}

#[test]
fn alpha_survives_the_write() {
    let mut p = studio();
    swap_colors(&mut p, &statics(vec![swap("#ff0000", "#0000ff")]));
    let v = p.property_value(&shape_fill()).unwrap();
    assert_eq!(v.to_hex(), hex("#0000ff"));
    assert_eq!(v.alpha(), 0.5);
}

#[test]
fn locked_nested_layer_is_edited_and_relocked() {
    let mut p = studio();
    let payload = SwapPayload {
        include_precomps: true,
        ..statics(vec![swap("#ff0000", "#00ffff")])
    };
    let out = swap_colors(&mut p, &payload);
    assert_eq!(out.count, 3);

    let badge = out.changes.last().unwrap();
    assert_eq!(badge.layer_name, "Badge");
    assert_eq!(badge.comp_id, CompId(2));
    assert_eq!(badge.comp_name, "Inner");
    assert!(badge.was_locked);

    let layer = LayerRef::new(CompId(2), 1);
    assert!(p.layer(layer).unwrap().locked);
    assert_eq!(p.solid_color(layer).unwrap().to_hex(), hex("#00ffff"));
}

#[test]
fn merged_provenance_is_matched() {
    let mut p = studio();
    let mut s = swap("#000000", "#ffff00");
    s.merged_from = Some(vec![hex("#000000"), hex("#010101")]);
    let out = swap_colors(&mut p, &statics(vec![s]));
    let olds: Vec<_> = out.changes.iter().map(|c| c.old_color.to_string()).collect();
    assert_eq!(olds, ["#000000", "#000000", "#010101"]);
    assert!(out.changes.iter().all(|c| c.new_color == hex("#ffff00")));
}

#[test]
fn first_matching_request_wins() {
    let swaps = [swap("#000000", "#111111"), swap("#000000", "#222222")];
    assert_eq!(find_exact_swap(hex("#000000"), &swaps), Some(hex("#111111")));
    assert_eq!(find_exact_swap(hex("#333333"), &swaps), None);
}

#[test]
fn effect_colors_use_the_effect_tag() {
    let mut p = studio();
    let out = swap_colors(&mut p, &statics(vec![swap("#00ff00", "#123456")]));
    assert_eq!(out.count, 1);
    assert_eq!(
        out.changes[0].property_type,
        PropertyType::Effect("Glow".to_string())
    );
    assert_eq!(
        out.changes[0].property_match_name.as_deref(),
        Some("ADBE Glo2-0010")
    );
    assert_eq!(p.key_value(&pulse_fill(), 2).unwrap().to_hex(), hex("#00ff00"));
}

#[test]
fn selected_only_limits_static_swaps() {
    let mut p = studio();
    let payload = SwapPayload {
        selected_only: true,
        ..statics(vec![swap("#ff0000", "#0000ff")])
    };
    let out = swap_colors(&mut p, &payload);
    assert_eq!(out.count, 1);
    assert_eq!(out.changes[0].layer_name, "BG");
}

#[test]
fn keyframe_swap_rewrites_listed_keys() {
    let mut p = studio();
    let payload = SwapPayload {
        keyframe_swaps: vec![keyframe_swap("#ff0000", "#ffffff", &[1, 3])],
        ..SwapPayload::default()
    };
    let out = swap_colors(&mut p, &payload);
    assert_eq!(out.count, 2);
    let keys: Vec<_> = out.changes.iter().map(|c| c.key_index).collect();
    assert_eq!(keys, [Some(1), Some(3)]);
    assert!(out.changes.iter().all(ChangeLogEntry::is_keyframe));

    let k1 = p.key_value(&pulse_fill(), 1).unwrap();
    assert_eq!(k1.to_hex(), hex("#ffffff"));
    assert_eq!(k1.alpha(), 0.8);
    assert_eq!(p.key_value(&pulse_fill(), 2).unwrap().to_hex(), hex("#00ff00"));
}

#[test]
fn drifted_keys_are_skipped() {
    let mut p = studio();
    let payload = SwapPayload {
        keyframe_swaps: vec![keyframe_swap("#ff0000", "#ffffff", &[1, 2, 9])],
        ..SwapPayload::default()
    };
    let out = swap_colors(&mut p, &payload);
    assert_eq!(out.count, 1);
    assert_eq!(out.changes[0].key_index, Some(1));
}

#[test]
fn keyframe_swap_with_unknown_target_is_a_no_op() {
    let mut p = studio();
    let mut missing_comp = keyframe_swap("#ff0000", "#ffffff", &[1]);
    missing_comp.comp_id = CompId(99);
    let wrong_color = keyframe_swap("#abcdef", "#ffffff", &[1]);
    let payload = SwapPayload {
        keyframe_swaps: vec![missing_comp, wrong_color],
        ..SwapPayload::default()
    };
    assert_eq!(swap_colors(&mut p, &payload).count, 0);
}

#[test]
fn no_active_comp_returns_zero() {
    let mut p = Project::default();
    let out = swap_colors(&mut p, &statics(vec![swap("#ff0000", "#0000ff")]));
    assert_eq!(out, SwapOutcome::default());
    assert!(p.undo_groups().is_empty());
}

#[test]
fn locate_by_key_or_static_value() {
    let p = studio();
    let animated = LayerRef::new(CompId(1), 5);
    let info = p.layer(animated).unwrap();
    assert_eq!(
        find_color_property(
            &p,
            animated,
            &info,
            &PropertyType::ShapeFill,
            Locate::Keyed(hex("#00ff00"))
        ),
        Some(pulse_fill())
    );
    assert_eq!(
        find_color_property(
            &p,
            animated,
            &info,
            &PropertyType::ShapeFill,
            Locate::Static(hex("#ff0000"))
        ),
        None
    );

    let fx = LayerRef::new(CompId(1), 6);
    let info = p.layer(fx).unwrap();
    let glow = PropertyType::Effect("Glow".to_string());
    let found = find_color_property(&p, fx, &info, &glow, Locate::Static(hex("#0000ff")));
    assert_eq!(
        found,
        Some(PropRef::root(fx, PropRoot::Effects).child(1).child(3).child(1))
    );
}

#[test]
fn payload_json_uses_wire_names() {
    let payload: SwapPayload = serde_json::from_str(
        r##"{
            "swaps": [{"oldColor": "#FF0000", "newColor": "#00ff00", "mergedFrom": ["#ff0000", "#fe0000"]}],
            "keyframeSwaps": [{
                "cardIndex": 2, "cellIndex": 1, "oldColor": "#00ff00", "newColor": "#000000",
                "keyIndices": [2], "layerIndex": 5, "compID": 1,
                "propertyType": "shapeFill", "propertyPath": "Contents > Pulse > Fill 1"
            }],
            "includePrecomps": true
        }"##,
    )
    .unwrap();
    assert_eq!(payload.swaps[0].old_color, hex("#ff0000"));
    assert_eq!(payload.keyframe_swaps[0].comp_id, CompId(1));
    assert!(payload.include_precomps);
    assert!(!payload.selected_only);

    let mut p = studio();
    let out = swap_colors(&mut p, &payload);
    let v = serde_json::to_value(&out).unwrap();
    assert_eq!(v["count"], serde_json::json!(out.count));
    assert_eq!(v["changes"][0]["layerID"], serde_json::json!(1));
    assert_eq!(v["changes"][0]["compID"], serde_json::json!(1));
    assert!(v["changes"][0].get("keyIndex").is_none());
}
