use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::host::DocumentHost;
use crate::foundation::color::Hex;
use crate::foundation::error::{ColorSwapError, ColorSwapResult};
use crate::scan::catalog::{
    Catalog, CatalogSummary, KeyframeGroupEntry, ScanItem, ScanOptions, scan_colors,
};
use crate::scan::select::{SelectPayload, SelectionResult, select_layers_by_color};
use crate::swap::engine::{KeyframeSwap, StaticSwap, SwapOutcome, SwapPayload, swap_colors};
use crate::swap::history::UndoHistory;
use crate::swap::undo::{UndoHistoryEntry, UndoOutcome, undo_swap};

/// Similarity threshold (percent) used when the operator turns on matching
/// without choosing a value.
pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 10;

/// A named list of colors, one per scanned cell in catalog order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Display name.
    pub name: String,
    /// Creation date, `YYYY-MM-DD`.
    pub created: String,
    /// Colors in catalog cell order.
    pub colors: Vec<Hex>,
}

/// Caller-side state around one host document.
///
/// Holds the latest scan, the operator's pending edits and the undo history,
/// and turns them into substitution and undo requests. Edits are addressed by
/// the scanned color (static entries) or by `(card, cell)` position (keyframe
/// groups), and are dropped by every scan.
#[derive(Debug)]
pub struct ColorPanel<H> {
    host: H,
    options: ScanOptions,
    catalog: Catalog,
    static_edits: IndexMap<Hex, Hex>,
    keyframe_edits: BTreeMap<(usize, usize), Hex>,
    history: UndoHistory,
}

impl<H: DocumentHost> ColorPanel<H> {
    /// Panel with default scan options and nothing scanned yet.
    pub fn new(host: H) -> Self {
        Self::with_options(host, ScanOptions::default())
    }

    /// Panel with explicit scan options.
    pub fn with_options(host: H, options: ScanOptions) -> Self {
        Self {
            host,
            options,
            catalog: Catalog::default(),
            static_edits: IndexMap::new(),
            keyframe_edits: BTreeMap::new(),
            history: UndoHistory::default(),
        }
    }

    /// The host document.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host document, for edits made outside the panel.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Give the host document back.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Current scan options.
    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Replace the scan options used by later scans, swaps and selections.
    pub fn set_options(&mut self, options: ScanOptions) {
        self.options = options;
    }

    /// Latest scan result.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Swaps that can still be undone.
    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// Operator-triggered scan. Starts a fresh session: the undo history is
    /// cleared along with all pending edits.
    pub fn scan(&mut self) -> &Catalog {
        self.history.clear();
        self.rescan();
        &self.catalog
    }

    fn rescan(&mut self) {
        self.catalog = scan_colors(&self.host, self.options);
        self.static_edits.clear();
        self.keyframe_edits.clear();
    }

    /// Pick a replacement for a scanned static color.
    pub fn set_color(&mut self, old: Hex, new: Hex) -> ColorSwapResult<()> {
        if self.catalog.find_static(old).is_none() {
            return Err(ColorSwapError::validation(format!(
                "{old} is not in the current scan"
            )));
        }
        self.static_edits.insert(old, new);
        Ok(())
    }

    /// Pick a replacement for one color cell of a keyframe group.
    pub fn set_keyframe_color(
        &mut self,
        card: usize,
        cell: usize,
        new: Hex,
    ) -> ColorSwapResult<()> {
        let in_range = self.group(card).is_some_and(|g| cell < g.colors.len());
        if !in_range {
            return Err(ColorSwapError::validation(format!(
                "no keyframe cell {card}:{cell} in the current scan"
            )));
        }
        self.keyframe_edits.insert((card, cell), new);
        Ok(())
    }

    /// Drop the pending edit for one static color.
    pub fn reset_color(&mut self, old: Hex) {
        self.static_edits.shift_remove(&old);
    }

    /// Drop the pending edits of every cell of one keyframe group.
    pub fn reset_keyframe_card(&mut self, card: usize) {
        self.keyframe_edits.retain(|(c, _), _| *c != card);
    }

    /// Drop every pending edit.
    pub fn reset_all(&mut self) {
        self.static_edits.clear();
        self.keyframe_edits.clear();
    }

    fn group(&self, card: usize) -> Option<&KeyframeGroupEntry> {
        match self.catalog.items.get(card)? {
            ScanItem::KeyframeGroup(g) => Some(g),
            ScanItem::Static(_) => None,
        }
    }

    /// Build the substitution request for every edit that changes a color.
    ///
    /// Static requests follow catalog order and carry the scanned entry's
    /// merge provenance; keyframe requests follow `(card, cell)` order.
    pub fn changed_swaps(&self) -> SwapPayload {
        let swaps = self
            .catalog
            .statics()
            .filter_map(|entry| {
                let new = *self.static_edits.get(&entry.hex)?;
                (new != entry.hex).then(|| StaticSwap {
                    old_color: entry.hex,
                    new_color: new,
                    merged_from: Some(entry.merged_from.clone()),
                })
            })
            .collect();

        let keyframe_swaps = self
            .keyframe_edits
            .iter()
            .filter_map(|(&(card, cell), &new)| {
                let group = self.group(card)?;
                let color = group.colors.get(cell)?;
                (new != color.hex).then(|| KeyframeSwap {
                    card_index: card,
                    cell_index: cell,
                    old_color: color.hex,
                    new_color: new,
                    key_indices: color.key_indices.clone(),
                    layer_index: group.layer_index,
                    comp_id: group.comp_id,
                    property_type: group.property_type.clone(),
                    property_path: group.property_path.clone(),
                })
            })
            .collect();

        SwapPayload {
            swaps,
            keyframe_swaps,
            include_precomps: self.options.include_precomps,
            selected_only: self.options.selected_only,
        }
    }

    /// Number of requests [`Self::swap`] would send.
    pub fn pending_count(&self) -> usize {
        let p = self.changed_swaps();
        p.swaps.len() + p.keyframe_swaps.len()
    }

    /// Apply the pending edits, remember them for undo, then rescan.
    ///
    /// A swap that wrote nothing is not remembered. The rescan keeps the
    /// undo history.
    pub fn swap(&mut self) -> ColorSwapResult<SwapOutcome> {
        let payload = self.changed_swaps();
        if payload.is_empty() {
            return Err(ColorSwapError::validation("pick new colors first"));
        }

        let outcome = swap_colors(&mut self.host, &payload);
        if !outcome.changes.is_empty() {
            self.history.push(UndoHistoryEntry {
                static_swaps: payload.swaps,
                keyframe_swaps: payload.keyframe_swaps,
                changes: outcome.changes.clone(),
                include_precomps: payload.include_precomps,
                selected_only: payload.selected_only,
                timestamp: now_millis(),
            });
        }

        self.rescan();
        Ok(outcome)
    }

    /// Undo the newest remembered swap.
    ///
    /// The entry leaves the history only when the undo succeeded; a
    /// successful undo is followed by a rescan that keeps the history.
    pub fn undo(&mut self) -> ColorSwapResult<UndoOutcome> {
        let Some(entry) = self.history.latest() else {
            return Err(ColorSwapError::validation("nothing to undo"));
        };

        let outcome = undo_swap(&mut self.host, entry);
        if outcome.success {
            self.history.pop();
            self.rescan();
        }
        Ok(outcome)
    }

    /// Select every layer using the colors of catalog item `index`.
    pub fn select_item(&mut self, index: usize) -> ColorSwapResult<SelectionResult> {
        let colors = match self.catalog.items.get(index) {
            Some(ScanItem::Static(entry)) => entry.merged_from.clone(),
            Some(ScanItem::KeyframeGroup(group)) => {
                let mut colors: Vec<Hex> = Vec::new();
                for c in &group.colors {
                    if !colors.contains(&c.hex) {
                        colors.push(c.hex);
                    }
                }
                colors
            }
            None => {
                return Err(ColorSwapError::validation(format!(
                    "no catalog item {index}"
                )));
            }
        };

        let payload = SelectPayload {
            colors,
            include_precomps: self.options.include_precomps,
        };
        Ok(select_layers_by_color(&mut self.host, &payload))
    }

    /// Totals of the latest scan.
    pub fn summary(&self) -> CatalogSummary {
        self.catalog.summary()
    }

    /// Record the picked (or original) color of every scanned cell.
    pub fn capture_palette(&self, name: &str, created: &str) -> ColorSwapResult<Palette> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ColorSwapError::validation("palette name is empty"));
        }
        if self.catalog.is_empty() {
            return Err(ColorSwapError::validation("scan colors first"));
        }

        let mut colors = Vec::new();
        for (card, item) in self.catalog.items.iter().enumerate() {
            match item {
                ScanItem::Static(entry) => {
                    colors.push(self.static_edits.get(&entry.hex).copied().unwrap_or(entry.hex));
                }
                ScanItem::KeyframeGroup(group) => {
                    colors.extend(group.colors.iter().enumerate().map(|(cell, c)| {
                        self.keyframe_edits
                            .get(&(card, cell))
                            .copied()
                            .unwrap_or(c.hex)
                    }));
                }
            }
        }

        Ok(Palette {
            name: name.to_string(),
            created: created.to_string(),
            colors,
        })
    }

    /// Map palette colors onto scanned cells by position.
    ///
    /// Returns how many cells now differ from their scanned color. Cells past
    /// the end of the palette keep their current edit.
    pub fn apply_palette(&mut self, palette: &Palette) -> ColorSwapResult<usize> {
        if self.catalog.is_empty() {
            return Err(ColorSwapError::validation("scan colors first"));
        }

        let mut next = palette.colors.iter().copied();
        let mut mapped = 0;
        let mut static_edits = Vec::new();
        let mut keyframe_edits = Vec::new();

        'items: for (card, item) in self.catalog.items.iter().enumerate() {
            match item {
                ScanItem::Static(entry) => {
                    let Some(new) = next.next() else {
                        break 'items;
                    };
                    mapped += usize::from(new != entry.hex);
                    static_edits.push((entry.hex, new));
                }
                ScanItem::KeyframeGroup(group) => {
                    for (cell, c) in group.colors.iter().enumerate() {
                        let Some(new) = next.next() else {
                            break 'items;
                        };
                        mapped += usize::from(new != c.hex);
                        keyframe_edits.push(((card, cell), new));
                    }
                }
            }
        }

        self.static_edits.extend(static_edits);
        self.keyframe_edits.extend(keyframe_edits);
        tracing::info!(palette = %palette.name, mapped, "palette applied");
        Ok(mapped)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/session/panel.rs"]
mod tests;
