use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::host::{CompId, DocumentHost, HostResult, PropRef};
use crate::foundation::color::Hex;
use crate::scan::merge::merge_similar;
use crate::scan::walker::{
    ColorSite, ColorSlot, LayerVisit, PropertyType, WalkOptions, property_path, read_slot, walk,
};

/// Where one static color occurrence was found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorLocation {
    /// Layer display name.
    pub layer_name: String,
    /// Location tag.
    pub property_type: PropertyType,
}

/// A static (non-animated) color and every place it is used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorEntry {
    /// Canonical color.
    pub hex: Hex,
    /// Number of occurrences.
    pub count: usize,
    /// One location per occurrence.
    pub locations: Vec<ColorLocation>,
    /// Colors folded into this entry by similarity merging (includes `hex`).
    pub merged_from: Vec<Hex>,
    /// Occurrences whose property is expression-driven.
    pub expression_count: usize,
}

impl ColorEntry {
    fn new(hex: Hex) -> Self {
        Self {
            hex,
            count: 0,
            locations: Vec::new(),
            merged_from: vec![hex],
            expression_count: 0,
        }
    }

    /// Every occurrence is expression-driven, so substitution cannot touch it.
    pub fn is_fully_expression_driven(&self) -> bool {
        self.count > 0 && self.expression_count == self.count
    }
}

/// One distinct color among the keys of an animated property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeColor {
    /// Canonical color.
    pub hex: Hex,
    /// 1-based key indices holding this color.
    pub key_indices: Vec<usize>,
    /// Key times in seconds, rounded to two decimals.
    pub times: Vec<f64>,
}

/// One animated color property and its distinct key colors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeGroupEntry {
    /// Layer display name.
    pub layer_name: String,
    /// 1-based layer index in its composition.
    pub layer_index: usize,
    /// Owning composition.
    #[serde(rename = "compID")]
    pub comp_id: CompId,
    /// Owning composition name.
    pub comp_name: String,
    /// Location tag.
    pub property_type: PropertyType,
    /// Ancestor-name trail of the property.
    pub property_path: String,
    /// Keyframe count.
    pub total_keys: usize,
    /// Distinct colors in first-seen key order.
    pub colors: Vec<KeyframeColor>,
}

/// One scan result item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScanItem {
    /// Static color entry.
    #[serde(rename = "static")]
    Static(ColorEntry),
    /// Animated property entry.
    #[serde(rename = "keyframeGroup")]
    KeyframeGroup(KeyframeGroupEntry),
}

/// Ordered scan result: static entries by descending count, then keyframe groups.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    /// Result items.
    pub items: Vec<ScanItem>,
}

/// Totals shown alongside a scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    /// Distinct static colors.
    pub static_colors: usize,
    /// Sum of static occurrence counts.
    pub static_instances: usize,
    /// Animated properties.
    pub keyframed: usize,
}

impl Catalog {
    /// Static entries in result order.
    pub fn statics(&self) -> impl Iterator<Item = &ColorEntry> {
        self.items.iter().filter_map(|i| match i {
            ScanItem::Static(e) => Some(e),
            ScanItem::KeyframeGroup(_) => None,
        })
    }

    /// Keyframe groups in discovery order.
    pub fn keyframe_groups(&self) -> impl Iterator<Item = &KeyframeGroupEntry> {
        self.items.iter().filter_map(|i| match i {
            ScanItem::KeyframeGroup(g) => Some(g),
            ScanItem::Static(_) => None,
        })
    }

    /// Static entry whose representative color is `hex`.
    pub fn find_static(&self, hex: Hex) -> Option<&ColorEntry> {
        self.statics().find(|e| e.hex == hex)
    }

    /// `true` when the scan found nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Counts for display.
    pub fn summary(&self) -> CatalogSummary {
        self.items
            .iter()
            .fold(CatalogSummary::default(), |mut s, item| {
                match item {
                    ScanItem::Static(e) => {
                        s.static_colors += 1;
                        s.static_instances += e.count;
                    }
                    ScanItem::KeyframeGroup(_) => s.keyframed += 1,
                }
                s
            })
    }
}

/// Accumulates walker output for one scan.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    statics: IndexMap<Hex, ColorEntry>,
    groups: Vec<KeyframeGroupEntry>,
}

impl CatalogBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one static occurrence.
    pub fn add_static(
        &mut self,
        hex: Hex,
        layer_name: &str,
        property_type: PropertyType,
        expression_enabled: bool,
    ) {
        let entry = self
            .statics
            .entry(hex)
            .or_insert_with(|| ColorEntry::new(hex));
        entry.count += 1;
        entry.locations.push(ColorLocation {
            layer_name: layer_name.to_string(),
            property_type,
        });
        if expression_enabled {
            entry.expression_count += 1;
        }
    }

    /// Record an animated property as one keyframe group.
    pub fn add_keyframe_group(&mut self, group: KeyframeGroupEntry) {
        self.groups.push(group);
    }

    /// Fold every site of one visited layer into the catalog.
    pub fn add_visit<H>(&mut self, host: &H, visit: &LayerVisit)
    where
        H: DocumentHost + ?Sized,
    {
        for site in &visit.sites {
            if site.is_keyframed() {
                if let ColorSlot::Property(prop) = &site.slot {
                    match keyframe_group(host, visit, site, prop) {
                        Ok(group) => self.add_keyframe_group(group),
                        Err(err) => {
                            tracing::debug!(layer = %visit.info.name, %err, "unreadable keyframes");
                        }
                    }
                }
                continue;
            }
            match read_slot(host, visit.layer, &site.slot) {
                Ok(color) => self.add_static(
                    color.to_hex(),
                    &visit.info.name,
                    site.property_type.clone(),
                    site.expression_enabled,
                ),
                Err(err) => {
                    tracing::debug!(layer = %visit.info.name, %err, "unreadable color");
                }
            }
        }
    }

    /// Finish: optionally merge similar colors, then order the result.
    pub fn finish(self, similarity_threshold: u32) -> Catalog {
        let statics = if similarity_threshold > 0 {
            merge_similar(self.statics, f64::from(similarity_threshold))
        } else {
            self.statics
        };

        let mut entries: Vec<ColorEntry> = statics.into_values().collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count));

        let items = entries
            .into_iter()
            .map(ScanItem::Static)
            .chain(self.groups.into_iter().map(ScanItem::KeyframeGroup))
            .collect();
        Catalog { items }
    }
}

/// Round seconds to two decimals, halves rounding up.
pub fn round_key_time(t: f64) -> f64 {
    (t * 100.0 + 0.5).floor() / 100.0
}

fn keyframe_group<H>(
    host: &H,
    visit: &LayerVisit,
    site: &ColorSite,
    prop: &PropRef,
) -> HostResult<KeyframeGroupEntry>
where
    H: DocumentHost + ?Sized,
{
    let total_keys = host.property(prop)?.num_keys;
    let mut colors: IndexMap<Hex, KeyframeColor> = IndexMap::new();
    for k in 1..=total_keys {
        let hex = host.key_value(prop, k)?.to_hex();
        let time = round_key_time(host.key_time(prop, k)?);
        let cell = colors.entry(hex).or_insert_with(|| KeyframeColor {
            hex,
            key_indices: Vec::new(),
            times: Vec::new(),
        });
        cell.key_indices.push(k);
        cell.times.push(time);
    }

    Ok(KeyframeGroupEntry {
        layer_name: visit.info.name.clone(),
        layer_index: visit.layer.index,
        comp_id: visit.comp,
        comp_name: visit.comp_name.clone(),
        property_type: site.property_type.clone(),
        property_path: property_path(host, prop, &visit.info.name),
        total_keys,
        colors: colors.into_values().collect(),
    })
}

/// Scan flags supplied by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    /// Descend into precomposition layers.
    #[serde(default)]
    pub include_precomps: bool,
    /// Merge colors within this percentage distance; `0` disables merging.
    #[serde(default, alias = "similarityThresholdPercent")]
    pub similarity_threshold: u32,
    /// Scan only selected top-level layers.
    #[serde(default)]
    pub selected_only: bool,
}

impl ScanOptions {
    /// Traversal flags for the walker.
    pub fn walk_options(self) -> WalkOptions {
        WalkOptions {
            include_precomps: self.include_precomps,
            selected_only: self.selected_only,
        }
    }
}

/// Enumerate every color used in the active composition.
///
/// Returns an empty catalog when no composition is active.
#[tracing::instrument(skip(host))]
pub fn scan_colors<H>(host: &H, opts: ScanOptions) -> Catalog
where
    H: DocumentHost + ?Sized,
{
    let Some(comp) = host.active_comp() else {
        tracing::info!("no active composition");
        return Catalog::default();
    };

    let mut builder = CatalogBuilder::new();
    for visit in walk(host, comp, opts.walk_options()) {
        builder.add_visit(host, &visit);
    }
    let catalog = builder.finish(opts.similarity_threshold);

    let summary = catalog.summary();
    tracing::info!(
        colors = summary.static_colors,
        instances = summary.static_instances,
        keyframed = summary.keyframed,
        "scan complete"
    );
    catalog
}

#[cfg(test)]
#[path = "../../tests/unit/scan/catalog.rs"]
mod tests;
