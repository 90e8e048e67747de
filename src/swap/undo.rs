use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::host::{
    CompId, DocumentHost, LayerInfo, LayerRef, in_undo_group, with_unlocked_layer,
};
use crate::foundation::color::Hex;
use crate::scan::walker::{ColorSlot, PropertyType, read_slot, write_slot};
use crate::swap::engine::{ChangeLogEntry, KeyframeSwap, Locate, StaticSwap, find_color_property};

/// Host undo-group name wrapping one undo batch.
pub const UNDO_SWAP_GROUP: &str = "Undo Color Swap";

/// One completed substitution as remembered by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoHistoryEntry {
    /// Static requests that were sent.
    #[serde(default)]
    pub static_swaps: Vec<StaticSwap>,
    /// Keyframe requests that were sent.
    #[serde(default)]
    pub keyframe_swaps: Vec<KeyframeSwap>,
    /// Change log returned by the substitution.
    #[serde(default)]
    pub changes: Vec<ChangeLogEntry>,
    /// Traversal flag used for the substitution.
    #[serde(default)]
    pub include_precomps: bool,
    /// Traversal flag used for the substitution.
    #[serde(default)]
    pub selected_only: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
}

/// Result of an undo request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoOutcome {
    /// `false` only for an unusable payload.
    pub success: bool,
    /// Changes reverted.
    pub restored: usize,
    /// Changes that could not be matched to the live document.
    pub skipped: usize,
    /// Failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UndoOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            restored: 0,
            skipped: 0,
            message: Some(message.into()),
        }
    }
}

/// Revert the changes of one history entry.
///
/// Changes are replayed per composition in ascending id order. A missing
/// composition, a missing or renamed layer, or a value that no longer matches
/// counts as skipped; none of these fail the whole undo.
#[tracing::instrument(skip(host, entry), fields(changes = entry.changes.len()))]
pub fn undo_swap<H>(host: &mut H, entry: &UndoHistoryEntry) -> UndoOutcome
where
    H: DocumentHost + ?Sized,
{
    if entry.changes.is_empty() {
        return UndoOutcome::failure("No changes to undo");
    }

    let mut by_comp: BTreeMap<CompId, Vec<&ChangeLogEntry>> = BTreeMap::new();
    for change in &entry.changes {
        by_comp.entry(change.comp_id).or_default().push(change);
    }

    let (restored, skipped) = in_undo_group(host, UNDO_SWAP_GROUP, |host| {
        let (mut restored, mut skipped) = (0, 0);
        for (comp_id, changes) in by_comp {
            let Some(comp) = host.find_comp(comp_id) else {
                tracing::debug!(comp = ?comp_id, "composition gone, skipping its changes");
                skipped += changes.len();
                continue;
            };
            for change in changes {
                if restore_change(host, comp, change) {
                    restored += 1;
                } else {
                    skipped += 1;
                }
            }
        }
        (restored, skipped)
    });

    tracing::info!(restored, skipped, "undo complete");
    UndoOutcome {
        success: true,
        restored,
        skipped,
        message: None,
    }
}

/// [`undo_swap`] over a serialized history entry.
pub fn undo_swap_json<H>(host: &mut H, history: &str) -> UndoOutcome
where
    H: DocumentHost + ?Sized,
{
    match serde_json::from_str::<UndoHistoryEntry>(history) {
        Ok(entry) => undo_swap(host, &entry),
        Err(err) => {
            tracing::warn!(%err, "malformed undo history");
            UndoOutcome::failure(format!("Undo error: {err}"))
        }
    }
}

fn restore_change<H>(host: &mut H, comp: CompId, change: &ChangeLogEntry) -> bool
where
    H: DocumentHost + ?Sized,
{
    let layer = LayerRef::new(comp, change.layer_id);
    let Ok(info) = host.layer(layer) else {
        return false;
    };
    if info.name != change.layer_name {
        tracing::debug!(expected = %change.layer_name, found = %info.name, "layer renamed");
        return false;
    }

    let result = with_unlocked_layer(host, layer, |host| match change.key_index {
        Some(key) => restore_key(host, layer, &info, change, key),
        None => restore_static(host, layer, &info, change),
    });
    matches!(result, Ok((_, true)))
}

fn restore_key<H>(
    host: &mut H,
    layer: LayerRef,
    info: &LayerInfo,
    change: &ChangeLogEntry,
    key: usize,
) -> bool
where
    H: DocumentHost + ?Sized,
{
    let locate = Locate::Keyed(change.new_color);
    let Some(prop) = find_color_property(&*host, layer, info, &change.property_type, locate) else {
        return false;
    };
    match host.key_value(&prop, key) {
        Ok(current) if current.to_hex() == change.new_color => host
            .set_value_at_key(&prop, key, current.recolored(change.old_color))
            .is_ok(),
        _ => false,
    }
}

fn restore_static<H>(
    host: &mut H,
    layer: LayerRef,
    info: &LayerInfo,
    change: &ChangeLogEntry,
) -> bool
where
    H: DocumentHost + ?Sized,
{
    let old = change.old_color;
    let slot = match &change.property_type {
        PropertyType::Solid if info.is_solid => ColorSlot::Solid,
        PropertyType::TextFill if info.is_text => ColorSlot::TextFill,
        PropertyType::TextStroke if info.is_text => ColorSlot::TextStroke,
        PropertyType::ShapeFill | PropertyType::ShapeStroke | PropertyType::Effect(_) => {
            let locate = Locate::Static(change.new_color);
            match find_color_property(&*host, layer, info, &change.property_type, locate) {
                Some(prop) => ColorSlot::Property(prop),
                None => return false,
            }
        }
        _ => return false,
    };
    write_restored(host, layer, &slot, old)
}

fn write_restored<H>(host: &mut H, layer: LayerRef, slot: &ColorSlot, old: Hex) -> bool
where
    H: DocumentHost + ?Sized,
{
    let restored = match read_slot(&*host, layer, slot) {
        Ok(current) => current.recolored(old),
        Err(_) => old.to_rgba(),
    };
    write_slot(host, layer, slot, restored).is_ok()
}

#[cfg(test)]
#[path = "../../tests/unit/swap/undo.rs"]
mod tests;
