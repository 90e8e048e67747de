use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::host::{
    CompId, DocumentHost, HostError, HostResult, LayerInfo, LayerRef, MATCH_VECTOR_FILL,
    MATCH_VECTOR_FILL_COLOR, MATCH_VECTOR_STROKE, MATCH_VECTOR_STROKE_COLOR, PropRef, PropRoot,
    PropertyValueType,
};
use crate::foundation::color::Rgba;
use crate::foundation::error::ColorSwapError;

const EFFECT_PREFIX: &str = "effect:";

/// Which kind of color-bearing location a color was found in.
///
/// Serialized as the tags `solid`, `shapeFill`, `shapeStroke`, `textFill`,
/// `textStroke` and `effect:<effect name>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PropertyType {
    /// Solid-source fill.
    Solid,
    /// Vector fill color.
    ShapeFill,
    /// Vector stroke color.
    ShapeStroke,
    /// Text fill color.
    TextFill,
    /// Text stroke color.
    TextStroke,
    /// Color parameter of the named (top-level) effect.
    Effect(String),
}

impl PropertyType {
    /// Short human label.
    pub fn label(&self) -> &str {
        match self {
            Self::Solid => "Solid",
            Self::ShapeFill => "Fill",
            Self::ShapeStroke => "Stroke",
            Self::TextFill => "Text",
            Self::TextStroke => "Text Stroke",
            Self::Effect(name) => name,
        }
    }

    /// Effect name for `effect:` tags.
    pub fn effect_name(&self) -> Option<&str> {
        match self {
            Self::Effect(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => f.write_str("solid"),
            Self::ShapeFill => f.write_str("shapeFill"),
            Self::ShapeStroke => f.write_str("shapeStroke"),
            Self::TextFill => f.write_str("textFill"),
            Self::TextStroke => f.write_str("textStroke"),
            Self::Effect(name) => write!(f, "{EFFECT_PREFIX}{name}"),
        }
    }
}

impl FromStr for PropertyType {
    type Err = ColorSwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "solid" => Self::Solid,
            "shapeFill" => Self::ShapeFill,
            "shapeStroke" => Self::ShapeStroke,
            "textFill" => Self::TextFill,
            "textStroke" => Self::TextStroke,
            other => match other.strip_prefix(EFFECT_PREFIX) {
                Some(name) => Self::Effect(name.to_string()),
                None => {
                    return Err(ColorSwapError::validation(format!(
                        "unknown property type \"{other}\""
                    )));
                }
            },
        })
    }
}

impl TryFrom<String> for PropertyType {
    type Error = ColorSwapError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PropertyType> for String {
    fn from(t: PropertyType) -> Self {
        t.to_string()
    }
}

/// Where a color value is read from and written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorSlot {
    /// The solid source color.
    Solid,
    /// `fillColor` of the text document.
    TextFill,
    /// `strokeColor` of the text document.
    TextStroke,
    /// A color property in the contents or effects tree.
    Property(PropRef),
}

/// One color-bearing location discovered on a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorSite {
    /// Location tag.
    pub property_type: PropertyType,
    /// How to reach the value.
    pub slot: ColorSlot,
    /// Match name of the color property, when it is a tree property.
    pub match_name: Option<String>,
    /// The value is expression-driven.
    pub expression_enabled: bool,
    /// Keyframe count at discovery time.
    pub num_keys: usize,
}

impl ColorSite {
    /// Animated sites are cataloged as keyframe groups, not static colors.
    pub fn is_keyframed(&self) -> bool {
        self.num_keys > 0
    }
}

/// One layer reached by a walk, with its color sites in discovery order.
#[derive(Clone, Debug)]
pub struct LayerVisit {
    /// Owning composition.
    pub comp: CompId,
    /// Owning composition name.
    pub comp_name: String,
    /// Layer address.
    pub layer: LayerRef,
    /// Layer snapshot at walk time.
    pub info: LayerInfo,
    /// Color sites: solid, text, shape tree, then effects.
    pub sites: Vec<ColorSite>,
}

/// Traversal flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkOptions {
    /// Descend into precomposition layers.
    #[serde(default)]
    pub include_precomps: bool,
    /// Visit only selected layers at the top level.
    #[serde(default)]
    pub selected_only: bool,
}

/// Visit every layer of `comp` in document order, descending into precomps.
///
/// Nested compositions are always walked in full: `selected_only` applies to
/// the top level only. A layer that cannot be read contributes nothing. A
/// precomp that refers back to one of its own ancestors is not entered again.
#[tracing::instrument(skip(host))]
pub fn walk<H>(host: &H, comp: CompId, opts: WalkOptions) -> Vec<LayerVisit>
where
    H: DocumentHost + ?Sized,
{
    let mut out = Vec::new();
    walk_comp(host, comp, opts, &mut Vec::new(), &mut out);
    out
}

fn walk_comp<H>(
    host: &H,
    comp: CompId,
    opts: WalkOptions,
    ancestors: &mut Vec<CompId>,
    out: &mut Vec<LayerVisit>,
) where
    H: DocumentHost + ?Sized,
{
    let (Ok(comp_name), Ok(num_layers)) = (host.comp_name(comp), host.num_layers(comp)) else {
        tracing::debug!(?comp, "composition unavailable, skipping");
        return;
    };
    ancestors.push(comp);

    for index in 1..=num_layers {
        let layer = LayerRef::new(comp, index);
        let Ok(info) = host.layer(layer) else {
            continue;
        };
        if opts.selected_only && !info.selected {
            continue;
        }

        let precomp = info.precomp;
        out.push(LayerVisit {
            comp,
            comp_name: comp_name.clone(),
            layer,
            sites: layer_sites(host, layer, &info),
            info,
        });

        if opts.include_precomps
            && let Some(source) = precomp
        {
            if ancestors.contains(&source) {
                tracing::debug!(comp = ?source, "precomp cycle, not descending");
                continue;
            }
            let nested = WalkOptions {
                include_precomps: true,
                selected_only: false,
            };
            walk_comp(host, source, nested, ancestors, out);
        }
    }
    ancestors.pop();
}

/// Every color site on one layer, in fixed order.
pub fn layer_sites<H>(host: &H, layer: LayerRef, info: &LayerInfo) -> Vec<ColorSite>
where
    H: DocumentHost + ?Sized,
{
    let mut sites = Vec::new();

    if info.is_solid && host.solid_color(layer).is_ok() {
        sites.push(ColorSite {
            property_type: PropertyType::Solid,
            slot: ColorSlot::Solid,
            match_name: None,
            expression_enabled: false,
            num_keys: 0,
        });
    }

    if info.is_text
        && let Ok(doc) = host.text_document(layer)
    {
        // Expression state belongs to the document property, not the colors.
        let expression_enabled = host.text_expression_enabled(layer).unwrap_or(false);
        for (present, property_type, slot) in [
            (doc.fill_color.is_some(), PropertyType::TextFill, ColorSlot::TextFill),
            (doc.stroke_color.is_some(), PropertyType::TextStroke, ColorSlot::TextStroke),
        ] {
            if present {
                sites.push(ColorSite {
                    property_type,
                    slot,
                    match_name: None,
                    expression_enabled,
                    num_keys: 0,
                });
            }
        }
    }

    if info.is_shape {
        let root = PropRef::root(layer, PropRoot::Contents);
        shape_sites(host, &root, &mut sites);
    }

    if info.has_effects {
        let root = PropRef::root(layer, PropRoot::Effects);
        let num_effects = host.property(&root).map(|i| i.num_properties).unwrap_or(0);
        for e in 1..=num_effects {
            let effect = root.child(e);
            if let Ok(info) = host.property(&effect) {
                effect_sites(host, &effect, &info.name, &mut sites);
            }
        }
    }

    sites
}

fn shape_sites<H>(host: &H, group: &PropRef, sites: &mut Vec<ColorSite>)
where
    H: DocumentHost + ?Sized,
{
    let Ok(info) = host.property(group) else {
        return;
    };
    for i in 1..=info.num_properties {
        let child = group.child(i);
        let Ok(child_info) = host.property(&child) else {
            continue;
        };

        let color = match child_info.match_name.as_str() {
            MATCH_VECTOR_FILL => Some((PropertyType::ShapeFill, MATCH_VECTOR_FILL_COLOR)),
            MATCH_VECTOR_STROKE => Some((PropertyType::ShapeStroke, MATCH_VECTOR_STROKE_COLOR)),
            _ => None,
        };
        if let Some((property_type, color_match)) = color
            && let Some(site) = tree_site(host, &child, color_match, property_type)
        {
            sites.push(site);
        }

        if child_info.num_properties > 0 {
            shape_sites(host, &child, sites);
        }
    }
}

fn tree_site<H>(
    host: &H,
    parent: &PropRef,
    color_match: &str,
    property_type: PropertyType,
) -> Option<ColorSite>
where
    H: DocumentHost + ?Sized,
{
    let prop = host.child_by_match_name(parent, color_match).ok()?;
    let info = host.property(&prop).ok()?;
    Some(ColorSite {
        property_type,
        match_name: Some(info.match_name),
        expression_enabled: info.expression_enabled,
        num_keys: info.num_keys,
        slot: ColorSlot::Property(prop),
    })
}

fn effect_sites<H>(host: &H, group: &PropRef, effect_name: &str, sites: &mut Vec<ColorSite>)
where
    H: DocumentHost + ?Sized,
{
    let Ok(info) = host.property(group) else {
        return;
    };
    for p in 1..=info.num_properties {
        let prop = group.child(p);
        let Ok(prop_info) = host.property(&prop) else {
            continue;
        };
        if prop_info.value_type == PropertyValueType::Color {
            sites.push(ColorSite {
                property_type: PropertyType::Effect(effect_name.to_string()),
                match_name: Some(prop_info.match_name.clone()),
                expression_enabled: prop_info.expression_enabled,
                num_keys: prop_info.num_keys,
                slot: ColorSlot::Property(prop.clone()),
            });
        }
        if prop_info.num_properties > 0 {
            effect_sites(host, &prop, effect_name, sites);
        }
    }
}

/// Current color at `slot`.
pub fn read_slot<H>(host: &H, layer: LayerRef, slot: &ColorSlot) -> HostResult<Rgba>
where
    H: DocumentHost + ?Sized,
{
    match slot {
        ColorSlot::Solid => host.solid_color(layer),
        ColorSlot::TextFill => host
            .text_document(layer)?
            .fill_color
            .ok_or_else(|| HostError::Unsupported("text has no fill".to_string())),
        ColorSlot::TextStroke => host
            .text_document(layer)?
            .stroke_color
            .ok_or_else(|| HostError::Unsupported("text has no stroke".to_string())),
        ColorSlot::Property(prop) => host.property_value(prop),
    }
}

/// Overwrite the color at `slot`.
pub fn write_slot<H>(host: &mut H, layer: LayerRef, slot: &ColorSlot, color: Rgba) -> HostResult<()>
where
    H: DocumentHost + ?Sized,
{
    match slot {
        ColorSlot::Solid => host.set_solid_color(layer, color),
        ColorSlot::TextFill => {
            let mut doc = host.text_document(layer)?;
            doc.fill_color = Some(color);
            host.set_text_document(layer, doc)
        }
        ColorSlot::TextStroke => {
            let mut doc = host.text_document(layer)?;
            doc.stroke_color = Some(color);
            host.set_text_document(layer, doc)
        }
        ColorSlot::Property(prop) => host.set_property_value(prop, color),
    }
}

/// Human-readable ancestor trail of a tree property, e.g. `Contents > Shape 1 > Fill 1`.
///
/// The layer name and the property's own name are dropped once the trail is
/// longer than two entries.
pub fn property_path<H>(host: &H, prop: &PropRef, layer_name: &str) -> String
where
    H: DocumentHost + ?Sized,
{
    let mut parts: Vec<String> = std::iter::once(layer_name.to_string())
        .chain(
            prop.lineage()
                .map_while(|p| host.property(&p).ok().map(|i| i.name)),
        )
        .filter(|name| !name.is_empty())
        .collect();

    if parts.len() > 2 {
        parts = parts[1..parts.len() - 1].to_vec();
    }
    parts.join(" > ")
}

#[cfg(test)]
#[path = "../../tests/unit/scan/walker.rs"]
mod tests;
