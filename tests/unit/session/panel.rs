use super::*;
use crate::document::host::{CompId, LayerRef, PropRef, PropRoot};
use crate::document::project::Project;
use crate::test_support::{hex, studio};

fn panel() -> ColorPanel<Project> {
    let mut panel = ColorPanel::new(studio());
    panel.scan();
    panel
}

fn count_of(panel: &ColorPanel<Project>, h: &str) -> usize {
    panel.catalog().find_static(hex(h)).map_or(0, |e| e.count)
}

#[test]
fn scan_summary_matches_catalog() {
    let panel = panel();
    let s = panel.summary();
    assert_eq!((s.static_colors, s.static_instances, s.keyframed), (6, 9, 1));
}

#[test]
fn changed_swaps_drop_no_op_edits_and_carry_provenance() {
    let mut panel = panel();
    panel.set_color(hex("#ff0000"), hex("#0000ff")).unwrap();
    panel.set_color(hex("#000000"), hex("#000000")).unwrap();
    assert!(panel.set_color(hex("#abcdef"), hex("#000000")).is_err());

    let payload = panel.changed_swaps();
    assert_eq!(payload.swaps.len(), 1);
    assert_eq!(payload.swaps[0].merged_from, Some(vec![hex("#ff0000")]));
    assert!(payload.keyframe_swaps.is_empty());
    assert_eq!(panel.pending_count(), 1);
}

#[test]
fn swap_records_history_and_rescans() {
    let mut panel = panel();
    panel.set_color(hex("#ff0000"), hex("#0000ff")).unwrap();
    let out = panel.swap().unwrap();
    assert_eq!(out.count, 2);
    assert_eq!(panel.history().len(), 1);
    assert_eq!(panel.pending_count(), 0);

    // Only the expression-driven occurrence is left.
    let red = panel.catalog().find_static(hex("#ff0000")).unwrap();
    assert_eq!(red.count, 1);
    assert!(red.is_fully_expression_driven());
    assert_eq!(count_of(&panel, "#0000ff"), 3);
}

#[test]
fn undo_pops_only_on_success_and_restores() {
    let mut panel = panel();
    assert!(panel.undo().is_err());

    panel.set_color(hex("#ff0000"), hex("#0000ff")).unwrap();
    panel.swap().unwrap();
    let out = panel.undo().unwrap();
    assert!(out.success);
    assert_eq!(out.restored, 2);
    assert!(panel.history().is_empty());
    assert_eq!(count_of(&panel, "#ff0000"), 3);
    assert_eq!(count_of(&panel, "#0000ff"), 1);
}

#[test]
fn empty_swap_is_rejected() {
    let mut panel = panel();
    assert!(panel.swap().is_err());
}

#[test]
fn swap_that_writes_nothing_is_not_remembered() {
    let mut panel = panel();
    panel.set_color(hex("#0000ff"), hex("#ffffff")).unwrap();
    let color_b = PropRef::root(LayerRef::new(CompId(1), 6), PropRoot::Effects)
        .child(1)
        .child(3)
        .child(1);
    panel
        .host_mut()
        .set_property_value(&color_b, hex("#abcdef").to_rgba())
        .unwrap();

    let out = panel.swap().unwrap();
    assert_eq!(out.count, 0);
    assert!(panel.history().is_empty());
}

#[test]
fn manual_scan_clears_history() {
    let mut panel = panel();
    panel.set_color(hex("#ff0000"), hex("#0000ff")).unwrap();
    panel.swap().unwrap();
    assert_eq!(panel.history().len(), 1);
    panel.scan();
    assert!(panel.history().is_empty());
}

#[test]
fn history_is_capped() {
    let mut panel = panel();
    for i in 0..11 {
        let (old, new) = if i % 2 == 0 {
            ("#0000ff", "#0000fe")
        } else {
            ("#0000fe", "#0000ff")
        };
        panel.set_color(hex(old), hex(new)).unwrap();
        assert_eq!(panel.swap().unwrap().count, 1);
    }
    assert_eq!(panel.history().len(), 10);
}

#[test]
fn keyframe_edits_become_cell_requests() {
    let mut panel = panel();
    assert!(panel.set_keyframe_color(0, 0, hex("#000000")).is_err());
    assert!(panel.set_keyframe_color(6, 5, hex("#000000")).is_err());

    panel.set_keyframe_color(6, 1, hex("#000000")).unwrap();
    let payload = panel.changed_swaps();
    let kf = &payload.keyframe_swaps[0];
    assert_eq!((kf.card_index, kf.cell_index), (6, 1));
    assert_eq!(kf.old_color, hex("#00ff00"));
    assert_eq!(kf.key_indices, vec![2]);
    assert_eq!(kf.layer_index, 5);
    assert_eq!(kf.property_path, "Contents > Pulse > Fill 1");

    let out = panel.swap().unwrap();
    assert_eq!(out.count, 1);
    let group = panel.catalog().keyframe_groups().next().unwrap();
    assert_eq!(group.colors[1].hex, hex("#000000"));
}

#[test]
fn resets_drop_pending_edits() {
    let mut panel = panel();
    panel.set_color(hex("#ff0000"), hex("#0000ff")).unwrap();
    panel.set_keyframe_color(6, 0, hex("#0000ff")).unwrap();
    assert_eq!(panel.pending_count(), 2);

    panel.reset_keyframe_card(6);
    assert_eq!(panel.pending_count(), 1);
    panel.reset_color(hex("#ff0000"));
    assert_eq!(panel.pending_count(), 0);

    panel.set_color(hex("#000000"), hex("#ffffff")).unwrap();
    panel.reset_all();
    assert_eq!(panel.pending_count(), 0);
}

#[test]
fn select_item_uses_provenance() {
    let mut panel = panel();
    let r = panel.select_item(0).unwrap();
    assert_eq!(r.layers, ["BG", "Shapes", "Driven", "Animated"]);
    let r = panel.select_item(6).unwrap();
    assert_eq!(r.layers, ["BG", "Shapes", "Driven", "Animated", "FX"]);
    assert!(panel.select_item(42).is_err());
}

#[test]
fn palette_capture_uses_picked_colors() {
    let mut panel = panel();
    panel.set_color(hex("#ff0000"), hex("#0000ff")).unwrap();
    let palette = panel.capture_palette(" Brand ", "2026-10-19").unwrap();
    assert_eq!(palette.name, "Brand");
    let colors: Vec<_> = palette.colors.iter().map(ToString::to_string).collect();
    assert_eq!(
        colors,
        ["#0000ff", "#000000", "#ffffff", "#010101", "#00ff00", "#0000ff", "#ff0000", "#00ff00"]
    );
    assert!(panel.capture_palette("  ", "2026-10-19").is_err());
}

#[test]
fn palette_maps_positionally() {
    let mut panel = panel();
    let short = Palette {
        name: "Short".to_string(),
        created: "2026-10-19".to_string(),
        colors: vec![hex("#111111"), hex("#000000")],
    };
    assert_eq!(panel.apply_palette(&short).unwrap(), 1);
    assert_eq!(panel.pending_count(), 1);

    let mut full = panel.capture_palette("Full", "2026-10-19").unwrap();
    full.colors[6] = hex("#ffffff");
    panel.reset_all();
    assert_eq!(panel.apply_palette(&full).unwrap(), 2);
    let payload = panel.changed_swaps();
    assert_eq!(payload.swaps.len(), 1);
    assert_eq!(payload.keyframe_swaps[0].new_color, hex("#ffffff"));
}

#[test]
fn palette_needs_a_scan() {
    let mut panel = ColorPanel::new(Project::default());
    let palette = Palette {
        name: "P".to_string(),
        created: String::new(),
        colors: vec![],
    };
    assert!(panel.apply_palette(&palette).is_err());
    assert!(panel.capture_palette("P", "").is_err());
}
