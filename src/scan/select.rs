use serde::{Deserialize, Serialize};

use crate::document::host::{CompId, DocumentHost, LayerInfo, LayerRef};
use crate::foundation::color::Hex;
use crate::scan::walker::{ColorSlot, layer_sites, read_slot};

const PRECOMP_SUFFIX: &str = " (precomp)";

/// Select-by-color request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPayload {
    /// Colors to look for.
    pub colors: Vec<Hex>,
    /// Descend into precomposition layers.
    #[serde(default)]
    pub include_precomps: bool,
}

/// Layers selected by [`select_layers_by_color`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Matching layers, nested ones included.
    pub count: usize,
    /// Selected layer names; precomps selected for their contents carry a
    /// `" (precomp)"` suffix.
    pub layers: Vec<String>,
}

/// Replace the selection with every layer that uses one of `payload.colors`.
///
/// Static values and every keyframe value count as "uses". A precomp layer is
/// selected when anything inside it matched.
#[tracing::instrument(skip(host))]
pub fn select_layers_by_color<H>(host: &mut H, payload: &SelectPayload) -> SelectionResult
where
    H: DocumentHost + ?Sized,
{
    let mut result = SelectionResult::default();
    let Some(comp) = host.active_comp() else {
        return result;
    };

    deselect_all(host, comp);
    result.count = select_in_comp(host, comp, payload, &mut vec![comp], &mut result.layers);
    tracing::info!(count = result.count, "layers selected");
    result
}

fn deselect_all<H>(host: &mut H, comp: CompId)
where
    H: DocumentHost + ?Sized,
{
    let n = host.num_layers(comp).unwrap_or(0);
    for index in 1..=n {
        let _ = host.set_layer_selected(LayerRef::new(comp, index), false);
    }
}

fn select_in_comp<H>(
    host: &mut H,
    comp: CompId,
    payload: &SelectPayload,
    ancestors: &mut Vec<CompId>,
    names: &mut Vec<String>,
) -> usize
where
    H: DocumentHost + ?Sized,
{
    let mut count = 0;
    let num_layers = host.num_layers(comp).unwrap_or(0);

    for index in 1..=num_layers {
        let layer = LayerRef::new(comp, index);
        let Ok(info) = host.layer(layer) else {
            continue;
        };

        if layer_contains_color(&*host, layer, &info, &payload.colors)
            && host.set_layer_selected(layer, true).is_ok()
        {
            names.push(info.name.clone());
            count += 1;
        }

        if payload.include_precomps
            && let Some(source) = info.precomp
            && !ancestors.contains(&source)
        {
            deselect_all(host, source);
            ancestors.push(source);
            let nested = select_in_comp(host, source, payload, ancestors, names);
            ancestors.pop();
            if nested > 0 {
                let _ = host.set_layer_selected(layer, true);
                let tagged = format!("{}{PRECOMP_SUFFIX}", info.name);
                if !names.iter().any(|n| *n == info.name || *n == tagged) {
                    names.push(tagged);
                }
                count += nested;
            }
        }
    }

    count
}

fn layer_contains_color<H>(
    host: &H,
    layer: LayerRef,
    info: &LayerInfo,
    colors: &[Hex],
) -> bool
where
    H: DocumentHost + ?Sized,
{
    layer_sites(host, layer, info).iter().any(|site| {
        let current = read_slot(host, layer, &site.slot).map(|c| c.to_hex());
        if current.is_ok_and(|hex| colors.contains(&hex)) {
            return true;
        }
        match &site.slot {
            ColorSlot::Property(prop) => (1..=site.num_keys).any(|k| {
                host.key_value(prop, k)
                    .is_ok_and(|v| colors.contains(&v.to_hex()))
            }),
            _ => false,
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/scan/select.rs"]
mod tests;
