use indexmap::IndexMap;

use crate::foundation::color::Hex;
use crate::scan::catalog::ColorEntry;

/// Greedily fold near-duplicate colors into the highest-count representative.
///
/// Colors are visited by descending count (ties keep input order). Each
/// unconsumed color opens a cluster and absorbs every later unconsumed color
/// within `threshold_percent`; a color joins at most one cluster. The output
/// map holds one entry per cluster in representative order.
pub fn merge_similar(
    entries: IndexMap<Hex, ColorEntry>,
    threshold_percent: f64,
) -> IndexMap<Hex, ColorEntry> {
    let mut order: Vec<ColorEntry> = entries.into_values().collect();
    order.sort_by(|a, b| b.count.cmp(&a.count));

    let mut consumed = vec![false; order.len()];
    let mut merged = IndexMap::with_capacity(order.len());

    for i in 0..order.len() {
        if consumed[i] {
            continue;
        }
        consumed[i] = true;

        let primary = order[i].hex;
        let mut cluster = ColorEntry {
            hex: primary,
            count: order[i].count,
            locations: order[i].locations.clone(),
            merged_from: vec![primary],
            expression_count: order[i].expression_count,
        };

        for j in (i + 1)..order.len() {
            if consumed[j] || !primary.is_similar(order[j].hex, threshold_percent) {
                continue;
            }
            consumed[j] = true;
            let other = &order[j];
            cluster.count += other.count;
            cluster.expression_count += other.expression_count;
            cluster.merged_from.push(other.hex);
            cluster.locations.extend(other.locations.iter().cloned());
        }

        merged.insert(primary, cluster);
    }

    merged
}

#[cfg(test)]
#[path = "../../tests/unit/scan/merge.rs"]
mod tests;
