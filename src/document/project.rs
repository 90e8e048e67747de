use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::host::{
    CompId, DocumentHost, HostError, HostResult, LayerInfo, LayerRef, PropRef, PropRoot,
    PropertyInfo, PropertyValueType, TextDocument,
};
use crate::foundation::color::Rgba;
use crate::foundation::error::{ColorSwapError, ColorSwapResult};

const CONTENTS_NAME: &str = "Contents";
const CONTENTS_MATCH: &str = "ADBE Root Vectors Group";
const EFFECTS_NAME: &str = "Effects";
const EFFECTS_MATCH: &str = "ADBE Effect Parade";

/// An in-memory project: the JSON-facing document the CLI and tests edit.
///
/// Implements [`DocumentHost`] directly, so everything the engine does to a
/// live host can be replayed against a file on disk.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Composition open for editing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_comp: Option<CompId>,
    /// Every composition in the project.
    #[serde(default)]
    pub items: Vec<Comp>,
    #[serde(skip)]
    open_groups: Vec<String>,
    #[serde(skip)]
    closed_groups: Vec<String>,
}

/// A composition: an ordered layer stack.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comp {
    /// Project-wide id.
    pub id: CompId,
    /// Display name.
    pub name: String,
    /// Layers, top of stack first (index 1).
    #[serde(default)]
    pub layers: Vec<Layer>,
}

/// One layer of a composition.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Display name.
    pub name: String,
    /// Selection flag.
    #[serde(default)]
    pub selected: bool,
    /// Lock flag.
    #[serde(default)]
    pub locked: bool,
    /// What the layer renders.
    #[serde(default)]
    pub source: LayerSource,
    /// Text properties; present on text layers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextLayer>,
    /// Vector contents; present on shape layers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<PropertyNode>>,
    /// Effect list; each entry is an effect group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<PropertyNode>,
}

/// Layer source reference.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayerSource {
    /// No source (text, shape, null layers).
    #[default]
    None,
    /// Solid color source.
    Solid {
        /// Solid color.
        color: Rgba,
    },
    /// Nested composition.
    Comp {
        /// Referenced composition.
        id: CompId,
    },
    /// Any other footage.
    Footage,
}

/// Text-layer document property.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    /// Current document value.
    pub document: TextDocument,
    /// The document property is expression-driven.
    #[serde(default)]
    pub expression_enabled: bool,
}

/// A node of a layer's contents or effects tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum PropertyNode {
    /// A group with children (shape group, fill, effect, parameter group).
    Group(PropertyGroup),
    /// A leaf carrying a value.
    Property(Property),
}

/// Grouping node.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyGroup {
    /// Display name.
    pub name: String,
    /// Host-stable kind identifier.
    #[serde(default)]
    pub match_name: String,
    /// Ordered children.
    #[serde(default)]
    pub children: Vec<PropertyNode>,
}

/// Value-bearing leaf.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Display name.
    pub name: String,
    /// Host-stable kind identifier.
    #[serde(default)]
    pub match_name: String,
    /// Value kind.
    #[serde(default)]
    pub value_type: PropertyValueType,
    /// Static value.
    pub value: PropValue,
    /// Keyframes in time order; non-empty means animated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<Keyframe>,
    /// The value is expression-driven.
    #[serde(default)]
    pub expression_enabled: bool,
}

/// A property value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Color (hex string or 3/4-array in JSON).
    Color(Rgba),
    /// Scalar.
    Scalar(f64),
}

/// One time sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds.
    pub time: f64,
    /// Sampled value.
    pub value: PropValue,
}

enum Resolved<'a> {
    Root(PropRoot, &'a [PropertyNode]),
    Node(&'a PropertyNode),
}

impl Project {
    /// Parse a project from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ColorSwapResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ColorSwapError::serde(format!("parse project JSON: {e}")))
    }

    /// Parse a project from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ColorSwapResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ColorSwapError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Write the project as pretty JSON.
    pub fn write_path(&self, path: impl AsRef<Path>) -> ColorSwapResult<()> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| {
            ColorSwapError::validation(format!("create project JSON '{}': {e}", path.display()))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(f), self)
            .map_err(|e| ColorSwapError::serde(format!("write project JSON: {e}")))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> ColorSwapResult<()> {
        let mut ids = BTreeSet::new();
        for comp in &self.items {
            if !ids.insert(comp.id) {
                return Err(ColorSwapError::validation(format!(
                    "duplicate composition id {}",
                    comp.id.0
                )));
            }
        }
        if let Some(active) = self.active_comp
            && !ids.contains(&active)
        {
            return Err(ColorSwapError::validation(format!(
                "active composition {} does not exist",
                active.0
            )));
        }

        let mut edges: BTreeMap<CompId, Vec<CompId>> = BTreeMap::new();
        for comp in &self.items {
            for layer in &comp.layers {
                if let LayerSource::Comp { id } = layer.source {
                    if !ids.contains(&id) {
                        return Err(ColorSwapError::validation(format!(
                            "layer '{}' in '{}' references missing composition {}",
                            layer.name, comp.name, id.0
                        )));
                    }
                    edges.entry(comp.id).or_default().push(id);
                }
                for node in layer.contents.iter().flatten().chain(&layer.effects) {
                    validate_node(node)?;
                }
            }
        }

        // Precomp recursion has no depth bound, so nesting must be acyclic.
        let mut done = BTreeSet::new();
        for comp in &self.items {
            let mut stack = Vec::new();
            check_acyclic(comp.id, &edges, &mut stack, &mut done)?;
        }
        Ok(())
    }

    /// Composition by id.
    pub fn comp(&self, id: CompId) -> Option<&Comp> {
        self.items.iter().find(|c| c.id == id)
    }

    fn comp_mut(&mut self, id: CompId) -> Option<&mut Comp> {
        self.items.iter_mut().find(|c| c.id == id)
    }

    /// Names of the undo transactions closed so far, oldest first.
    pub fn undo_groups(&self) -> &[String] {
        &self.closed_groups
    }

    fn layer_ref(&self, r: LayerRef) -> HostResult<&Layer> {
        let comp = self.comp(r.comp).ok_or(HostError::CompNotFound(r.comp.0))?;
        r.index
            .checked_sub(1)
            .and_then(|i| comp.layers.get(i))
            .ok_or(HostError::LayerNotFound {
                comp: r.comp.0,
                index: r.index,
            })
    }

    fn layer_mut(&mut self, r: LayerRef) -> HostResult<&mut Layer> {
        let comp = self
            .comp_mut(r.comp)
            .ok_or(HostError::CompNotFound(r.comp.0))?;
        r.index
            .checked_sub(1)
            .and_then(|i| comp.layers.get_mut(i))
            .ok_or(HostError::LayerNotFound {
                comp: r.comp.0,
                index: r.index,
            })
    }

    fn resolve(&self, prop: &PropRef) -> HostResult<Resolved<'_>> {
        let layer = self.layer_ref(prop.layer)?;
        let root: &[PropertyNode] = match prop.root {
            PropRoot::Contents => layer.contents.as_deref().ok_or_else(|| {
                HostError::Unsupported(format!("'{}' has no contents", layer.name))
            })?,
            PropRoot::Effects => &layer.effects,
        };
        let Some((first, rest)) = prop.path.split_first() else {
            return Ok(Resolved::Root(prop.root, root));
        };
        let mut node = nth(root, *first, prop)?;
        for &i in rest {
            match node {
                PropertyNode::Group(g) => node = nth(&g.children, i, prop)?,
                PropertyNode::Property(_) => return Err(not_found(prop)),
            }
        }
        Ok(Resolved::Node(node))
    }

    fn leaf(&self, prop: &PropRef) -> HostResult<&Property> {
        match self.resolve(prop)? {
            Resolved::Node(PropertyNode::Property(p)) => Ok(p),
            _ => Err(HostError::Unsupported(format!("{prop:?} is a group"))),
        }
    }

    fn leaf_mut(&mut self, prop: &PropRef) -> HostResult<&mut Property> {
        let layer = self.layer_mut(prop.layer)?;
        let mut nodes: &mut Vec<PropertyNode> = match prop.root {
            PropRoot::Contents => layer
                .contents
                .as_mut()
                .ok_or_else(|| HostError::Unsupported("layer has no contents".to_string()))?,
            PropRoot::Effects => &mut layer.effects,
        };
        let Some((last, parents)) = prop.path.split_last() else {
            return Err(HostError::Unsupported("root group holds no value".to_string()));
        };
        // Index 0 wraps past the end and resolves to nothing.
        for &i in parents {
            match nodes.get_mut(i.wrapping_sub(1)) {
                Some(PropertyNode::Group(g)) => nodes = &mut g.children,
                _ => return Err(not_found(prop)),
            }
        }
        match nodes.get_mut(last.wrapping_sub(1)) {
            Some(PropertyNode::Property(p)) => Ok(p),
            Some(PropertyNode::Group(_)) => {
                Err(HostError::Unsupported(format!("{prop:?} is a group")))
            }
            None => Err(not_found(prop)),
        }
    }
}

fn nth<'a>(
    nodes: &'a [PropertyNode],
    index: usize,
    prop: &PropRef,
) -> HostResult<&'a PropertyNode> {
    index
        .checked_sub(1)
        .and_then(|i| nodes.get(i))
        .ok_or_else(|| not_found(prop))
}

fn not_found(prop: &PropRef) -> HostError {
    HostError::PropertyNotFound(format!("{:?} {:?}", prop.root, prop.path))
}

fn color_of(p: &Property, value: PropValue) -> HostResult<Rgba> {
    match value {
        PropValue::Color(c) => Ok(c),
        PropValue::Scalar(_) => Err(HostError::NotAColor(p.name.clone())),
    }
}

fn validate_node(node: &PropertyNode) -> ColorSwapResult<()> {
    match node {
        PropertyNode::Group(g) => g.children.iter().try_for_each(validate_node),
        PropertyNode::Property(p) => {
            if p.keys.iter().any(|k| !k.time.is_finite()) {
                return Err(ColorSwapError::validation(format!(
                    "property '{}' has a keyframe with a non-finite time",
                    p.name
                )));
            }
            Ok(())
        }
    }
}

fn check_acyclic(
    id: CompId,
    edges: &BTreeMap<CompId, Vec<CompId>>,
    stack: &mut Vec<CompId>,
    done: &mut BTreeSet<CompId>,
) -> ColorSwapResult<()> {
    if done.contains(&id) {
        return Ok(());
    }
    if stack.contains(&id) {
        return Err(ColorSwapError::validation(format!(
            "composition {} is nested inside itself",
            id.0
        )));
    }
    stack.push(id);
    for &child in edges.get(&id).into_iter().flatten() {
        check_acyclic(child, edges, stack, done)?;
    }
    stack.pop();
    done.insert(id);
    Ok(())
}

impl DocumentHost for Project {
    fn active_comp(&self) -> Option<CompId> {
        self.active_comp.filter(|id| self.comp(*id).is_some())
    }

    fn find_comp(&self, id: CompId) -> Option<CompId> {
        self.comp(id).map(|c| c.id)
    }

    fn comp_name(&self, comp: CompId) -> HostResult<String> {
        self.comp(comp)
            .map(|c| c.name.clone())
            .ok_or(HostError::CompNotFound(comp.0))
    }

    fn num_layers(&self, comp: CompId) -> HostResult<usize> {
        self.comp(comp)
            .map(|c| c.layers.len())
            .ok_or(HostError::CompNotFound(comp.0))
    }

    fn layer(&self, r: LayerRef) -> HostResult<LayerInfo> {
        let layer = self.layer_ref(r)?;
        Ok(LayerInfo {
            index: r.index,
            name: layer.name.clone(),
            selected: layer.selected,
            locked: layer.locked,
            is_solid: matches!(layer.source, LayerSource::Solid { .. }),
            is_text: layer.text.is_some(),
            is_shape: layer.contents.is_some(),
            has_effects: true,
            precomp: match layer.source {
                LayerSource::Comp { id } => Some(id),
                _ => None,
            },
        })
    }

    fn set_layer_locked(&mut self, r: LayerRef, locked: bool) -> HostResult<()> {
        self.layer_mut(r)?.locked = locked;
        Ok(())
    }

    fn set_layer_selected(&mut self, r: LayerRef, selected: bool) -> HostResult<()> {
        self.layer_mut(r)?.selected = selected;
        Ok(())
    }

    fn solid_color(&self, r: LayerRef) -> HostResult<Rgba> {
        match &self.layer_ref(r)?.source {
            LayerSource::Solid { color } => Ok(*color),
            _ => Err(HostError::Unsupported("layer source is not a solid".to_string())),
        }
    }

    fn set_solid_color(&mut self, r: LayerRef, new: Rgba) -> HostResult<()> {
        let layer = self.layer_mut(r)?;
        if layer.locked {
            return Err(HostError::Unsupported(format!("layer '{}' is locked", layer.name)));
        }
        match &mut layer.source {
            LayerSource::Solid { color } => {
                *color = new;
                Ok(())
            }
            _ => Err(HostError::Unsupported("layer source is not a solid".to_string())),
        }
    }

    fn text_document(&self, r: LayerRef) -> HostResult<TextDocument> {
        self.layer_ref(r)?
            .text
            .as_ref()
            .map(|t| t.document)
            .ok_or_else(|| HostError::Unsupported("not a text layer".to_string()))
    }

    fn text_expression_enabled(&self, r: LayerRef) -> HostResult<bool> {
        self.layer_ref(r)?
            .text
            .as_ref()
            .map(|t| t.expression_enabled)
            .ok_or_else(|| HostError::Unsupported("not a text layer".to_string()))
    }

    fn set_text_document(&mut self, r: LayerRef, doc: TextDocument) -> HostResult<()> {
        let layer = self.layer_mut(r)?;
        if layer.locked {
            return Err(HostError::Unsupported(format!("layer '{}' is locked", layer.name)));
        }
        let text = layer
            .text
            .as_mut()
            .ok_or_else(|| HostError::Unsupported("not a text layer".to_string()))?;
        text.document = doc;
        Ok(())
    }

    fn property(&self, prop: &PropRef) -> HostResult<PropertyInfo> {
        Ok(match self.resolve(prop)? {
            Resolved::Root(root, nodes) => {
                let (name, match_name) = match root {
                    PropRoot::Contents => (CONTENTS_NAME, CONTENTS_MATCH),
                    PropRoot::Effects => (EFFECTS_NAME, EFFECTS_MATCH),
                };
                PropertyInfo {
                    name: name.to_string(),
                    match_name: match_name.to_string(),
                    value_type: PropertyValueType::NoValue,
                    num_keys: 0,
                    num_properties: nodes.len(),
                    expression_enabled: false,
                }
            }
            Resolved::Node(PropertyNode::Group(g)) => PropertyInfo {
                name: g.name.clone(),
                match_name: g.match_name.clone(),
                value_type: PropertyValueType::NoValue,
                num_keys: 0,
                num_properties: g.children.len(),
                expression_enabled: false,
            },
            Resolved::Node(PropertyNode::Property(p)) => PropertyInfo {
                name: p.name.clone(),
                match_name: p.match_name.clone(),
                value_type: p.value_type,
                num_keys: p.keys.len(),
                num_properties: 0,
                expression_enabled: p.expression_enabled,
            },
        })
    }

    fn property_value(&self, prop: &PropRef) -> HostResult<Rgba> {
        let p = self.leaf(prop)?;
        match p.keys.first() {
            Some(k) => color_of(p, k.value),
            None => color_of(p, p.value),
        }
    }

    fn set_property_value(&mut self, prop: &PropRef, value: Rgba) -> HostResult<()> {
        if self.layer_ref(prop.layer)?.locked {
            return Err(HostError::Unsupported("layer is locked".to_string()));
        }
        let p = self.leaf_mut(prop)?;
        if !p.keys.is_empty() {
            return Err(HostError::Unsupported(format!(
                "'{}' has keyframes; write individual keys instead",
                p.name
            )));
        }
        color_of(p, p.value)?;
        p.value = PropValue::Color(value);
        Ok(())
    }

    fn key_value(&self, prop: &PropRef, key: usize) -> HostResult<Rgba> {
        let p = self.leaf(prop)?;
        let k = key_at(&p.keys, key)?;
        color_of(p, k.value)
    }

    fn key_time(&self, prop: &PropRef, key: usize) -> HostResult<f64> {
        let p = self.leaf(prop)?;
        Ok(key_at(&p.keys, key)?.time)
    }

    fn set_value_at_key(&mut self, prop: &PropRef, key: usize, value: Rgba) -> HostResult<()> {
        if self.layer_ref(prop.layer)?.locked {
            return Err(HostError::Unsupported("layer is locked".to_string()));
        }
        let p = self.leaf_mut(prop)?;
        let num_keys = p.keys.len();
        let k = key
            .checked_sub(1)
            .and_then(|i| p.keys.get_mut(i))
            .ok_or(HostError::KeyOutOfRange { key, num_keys })?;
        if let PropValue::Scalar(_) = k.value {
            return Err(HostError::NotAColor(p.name.clone()));
        }
        k.value = PropValue::Color(value);
        Ok(())
    }

    fn begin_undo_group(&mut self, name: &str) {
        self.open_groups.push(name.to_string());
    }

    fn end_undo_group(&mut self) {
        if let Some(name) = self.open_groups.pop() {
            self.closed_groups.push(name);
        }
    }
}

fn key_at(keys: &[Keyframe], key: usize) -> HostResult<&Keyframe> {
    key.checked_sub(1)
        .and_then(|i| keys.get(i))
        .ok_or(HostError::KeyOutOfRange {
            key,
            num_keys: keys.len(),
        })
}

#[cfg(test)]
#[path = "../../tests/unit/document/project.rs"]
mod tests;
