use serde::{Deserialize, Serialize};

use crate::document::host::{
    CompId, DocumentHost, LayerInfo, LayerRef, PropRef, in_undo_group, with_unlocked_layer,
};
use crate::foundation::color::Hex;
use crate::scan::walker::{
    ColorSite, ColorSlot, LayerVisit, PropertyType, WalkOptions, layer_sites, read_slot, walk,
    write_slot,
};

/// Host undo-group name wrapping one substitution batch.
pub const SWAP_UNDO_GROUP: &str = "Color Swap";

/// Replace one static color (and every color merged into it) everywhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticSwap {
    /// Color to replace.
    pub old_color: Hex,
    /// Replacement.
    pub new_color: Hex,
    /// Colors folded into `old_color` by similarity merging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_from: Option<Vec<Hex>>,
}

impl StaticSwap {
    fn matches(&self, hex: Hex) -> bool {
        self.old_color == hex
            || self
                .merged_from
                .as_deref()
                .is_some_and(|from| from.contains(&hex))
    }
}

/// Replace one color cell of an animated property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeSwap {
    /// Catalog position of the keyframe group.
    #[serde(default)]
    pub card_index: usize,
    /// Position of the color within the group.
    #[serde(default)]
    pub cell_index: usize,
    /// Color the keys currently hold.
    pub old_color: Hex,
    /// Replacement.
    pub new_color: Hex,
    /// 1-based keys to rewrite.
    pub key_indices: Vec<usize>,
    /// 1-based layer index.
    pub layer_index: usize,
    /// Owning composition.
    #[serde(rename = "compID")]
    pub comp_id: CompId,
    /// Location tag.
    pub property_type: PropertyType,
    /// Display trail; informational.
    #[serde(default)]
    pub property_path: String,
}

/// Everything one substitution call should do.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapPayload {
    /// Static replacements; the first matching request wins.
    #[serde(default)]
    pub swaps: Vec<StaticSwap>,
    /// Per-cell keyframe replacements.
    #[serde(default)]
    pub keyframe_swaps: Vec<KeyframeSwap>,
    /// Descend into precomposition layers.
    #[serde(default)]
    pub include_precomps: bool,
    /// Only touch selected top-level layers.
    #[serde(default)]
    pub selected_only: bool,
}

impl SwapPayload {
    /// `true` when there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.swaps.is_empty() && self.keyframe_swaps.is_empty()
    }
}

/// One write performed by a substitution, with enough identity to revert it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    /// 1-based layer index at swap time.
    #[serde(rename = "layerID")]
    pub layer_id: usize,
    /// Layer name at swap time; undo refuses a renamed layer.
    pub layer_name: String,
    /// Owning composition.
    #[serde(rename = "compID")]
    pub comp_id: CompId,
    /// Owning composition name.
    #[serde(default)]
    pub comp_name: String,
    /// Location tag.
    pub property_type: PropertyType,
    /// Match name of the written property, for tree properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_match_name: Option<String>,
    /// Color before the write.
    pub old_color: Hex,
    /// Color written.
    pub new_color: Hex,
    /// The layer was locked before the edit (and locked again after it).
    #[serde(default)]
    pub was_locked: bool,
    /// 1-based key written, for keyframe changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_index: Option<usize>,
}

impl ChangeLogEntry {
    /// Keyframe changes are restored per key rather than per property.
    pub fn is_keyframe(&self) -> bool {
        self.key_index.is_some()
    }
}

/// Result of [`swap_colors`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    /// Number of values written.
    pub count: usize,
    /// One entry per write, in write order.
    pub changes: Vec<ChangeLogEntry>,
}

/// First request in `swaps` that claims `hex`, by `old_color` or provenance.
pub fn find_exact_swap(hex: Hex, swaps: &[StaticSwap]) -> Option<Hex> {
    swaps.iter().find(|s| s.matches(hex)).map(|s| s.new_color)
}

/// Apply `payload` to the active composition inside one undo transaction.
///
/// Static requests rewrite every non-animated, non-expression location whose
/// current color they claim. Keyframe requests rewrite only keys that still
/// hold `old_color`; drifted keys are skipped. Alpha is preserved on every
/// write. Returns a zero outcome when no composition is active.
#[tracing::instrument(
    skip(host, payload),
    fields(swaps = payload.swaps.len(), keyframe_swaps = payload.keyframe_swaps.len())
)]
pub fn swap_colors<H>(host: &mut H, payload: &SwapPayload) -> SwapOutcome
where
    H: DocumentHost + ?Sized,
{
    let Some(comp) = host.active_comp() else {
        tracing::info!("no active composition");
        return SwapOutcome::default();
    };

    let outcome = in_undo_group(host, SWAP_UNDO_GROUP, |host| {
        let mut changes = Vec::new();

        if !payload.swaps.is_empty() {
            let opts = WalkOptions {
                include_precomps: payload.include_precomps,
                selected_only: payload.selected_only,
            };
            for visit in walk(&*host, comp, opts) {
                swap_in_layer(host, &visit, &payload.swaps, &mut changes);
            }
        }

        for kf in &payload.keyframe_swaps {
            swap_keyframe_color(host, kf, &mut changes);
        }

        SwapOutcome {
            count: changes.len(),
            changes,
        }
    });

    tracing::info!(count = outcome.count, "swap complete");
    outcome
}

fn swap_in_layer<H>(
    host: &mut H,
    visit: &LayerVisit,
    swaps: &[StaticSwap],
    changes: &mut Vec<ChangeLogEntry>,
) where
    H: DocumentHost + ?Sized,
{
    let targets: Vec<&ColorSite> = visit
        .sites
        .iter()
        .filter(|s| !s.is_keyframed() && !s.expression_enabled)
        .collect();
    if targets.is_empty() {
        return;
    }

    let layer = visit.layer;
    let result = with_unlocked_layer(host, layer, |host| {
        let mut written = Vec::new();
        for site in targets {
            let Ok(current) = read_slot(&*host, layer, &site.slot) else {
                continue;
            };
            let old = current.to_hex();
            let Some(new) = find_exact_swap(old, swaps) else {
                continue;
            };
            match write_slot(host, layer, &site.slot, current.recolored(new)) {
                Ok(()) => written.push((site, old, new)),
                Err(err) => tracing::debug!(layer = %visit.info.name, %err, "write failed"),
            }
        }
        written
    });

    match result {
        Ok((was_locked, written)) => {
            changes.extend(written.into_iter().map(|(site, old, new)| ChangeLogEntry {
                layer_id: layer.index,
                layer_name: visit.info.name.clone(),
                comp_id: visit.comp,
                comp_name: visit.comp_name.clone(),
                property_type: site.property_type.clone(),
                property_match_name: site.match_name.clone(),
                old_color: old,
                new_color: new,
                was_locked,
                key_index: None,
            }));
        }
        Err(err) => tracing::debug!(layer = %visit.info.name, %err, "layer unavailable"),
    }
}

fn swap_keyframe_color<H>(host: &mut H, kf: &KeyframeSwap, changes: &mut Vec<ChangeLogEntry>)
where
    H: DocumentHost + ?Sized,
{
    let Some(comp) = host.find_comp(kf.comp_id) else {
        tracing::debug!(comp = ?kf.comp_id, "keyframe target composition missing");
        return;
    };
    let layer = LayerRef::new(comp, kf.layer_index);
    let Ok(info) = host.layer(layer) else {
        return;
    };
    let comp_name = host.comp_name(comp).unwrap_or_default();

    let result = with_unlocked_layer(host, layer, |host| {
        let locate = Locate::Keyed(kf.old_color);
        let Some(prop) = find_color_property(&*host, layer, &info, &kf.property_type, locate) else {
            return (None, Vec::new());
        };
        if host.property(&prop).is_ok_and(|p| p.expression_enabled) {
            return (None, Vec::new());
        }

        let mut written = Vec::new();
        for &key in &kf.key_indices {
            let Ok(current) = host.key_value(&prop, key) else {
                continue;
            };
            if current.to_hex() != kf.old_color {
                tracing::debug!(layer = %info.name, key, "key drifted, skipping");
                continue;
            }
            if host
                .set_value_at_key(&prop, key, current.recolored(kf.new_color))
                .is_ok()
            {
                written.push(key);
            }
        }
        let match_name = host.property(&prop).ok().map(|p| p.match_name);
        (match_name, written)
    });

    let Ok((was_locked, (match_name, written))) = result else {
        return;
    };
    changes.extend(written.into_iter().map(|key| ChangeLogEntry {
        layer_id: layer.index,
        layer_name: info.name.clone(),
        comp_id: kf.comp_id,
        comp_name: comp_name.clone(),
        property_type: kf.property_type.clone(),
        property_match_name: match_name.clone(),
        old_color: kf.old_color,
        new_color: kf.new_color,
        was_locked,
        key_index: Some(key),
    }));
}

/// How [`find_color_property`] recognizes its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locate {
    /// An animated property with at least one key holding this color.
    Keyed(Hex),
    /// A non-animated property currently holding this color.
    Static(Hex),
}

/// Re-locate a tree color property of `property_type` on `layer` by value.
///
/// Only contents and effect properties can be found this way; solid and text
/// locations have no tree property. The first match in walk order wins.
pub fn find_color_property<H>(
    host: &H,
    layer: LayerRef,
    info: &LayerInfo,
    property_type: &PropertyType,
    locate: Locate,
) -> Option<PropRef>
where
    H: DocumentHost + ?Sized,
{
    layer_sites(host, layer, info)
        .into_iter()
        .filter(|site| site.property_type == *property_type)
        .find_map(|site| {
            let ColorSlot::Property(prop) = site.slot else {
                return None;
            };
            let found = match locate {
                Locate::Keyed(hex) => {
                    site.num_keys > 0
                        && (1..=site.num_keys)
                            .any(|k| host.key_value(&prop, k).is_ok_and(|v| v.to_hex() == hex))
                }
                Locate::Static(hex) => {
                    site.num_keys == 0
                        && host.property_value(&prop).is_ok_and(|v| v.to_hex() == hex)
                }
            };
            found.then_some(prop)
        })
}

#[cfg(test)]
#[path = "../../tests/unit/swap/engine.rs"]
mod tests;
