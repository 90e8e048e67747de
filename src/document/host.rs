use serde::{Deserialize, Serialize};

use crate::foundation::color::Rgba;

/// Match name of a vector fill group.
pub const MATCH_VECTOR_FILL: &str = "ADBE Vector Graphic - Fill";
/// Match name of the color property inside a vector fill group.
pub const MATCH_VECTOR_FILL_COLOR: &str = "ADBE Vector Fill Color";
/// Match name of a vector stroke group.
pub const MATCH_VECTOR_STROKE: &str = "ADBE Vector Graphic - Stroke";
/// Match name of the color property inside a vector stroke group.
pub const MATCH_VECTOR_STROKE_COLOR: &str = "ADBE Vector Stroke Color";

/// Result type of a single host capability query.
pub type HostResult<T> = Result<T, HostError>;

/// Failure of one capability query against the host document.
///
/// These are ordinary outcomes during a walk: a layer that is not a solid, a
/// property path that no longer resolves, a key index past the end.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No composition with this id exists in the project.
    #[error("composition {0} not found")]
    CompNotFound(u32),
    /// The layer index does not resolve inside its composition.
    #[error("layer {index} not found in composition {comp}")]
    LayerNotFound {
        /// Composition id.
        comp: u32,
        /// 1-based layer index.
        index: usize,
    },
    /// The property path does not resolve.
    #[error("property {0} not found")]
    PropertyNotFound(String),
    /// The layer or property does not support the requested capability.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// The property exists but does not hold a color.
    #[error("property {0} is not a color")]
    NotAColor(String),
    /// The 1-based key index is outside `1..=num_keys`.
    #[error("key {key} out of range (property has {num_keys} keys)")]
    KeyOutOfRange {
        /// Requested key.
        key: usize,
        /// Keys present.
        num_keys: usize,
    },
}

/// Project-wide composition identifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CompId(pub u32);

/// A layer addressed by composition and 1-based index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerRef {
    /// Owning composition.
    pub comp: CompId,
    /// 1-based position in the layer stack.
    pub index: usize,
}

impl LayerRef {
    /// Address layer `index` (1-based) of `comp`.
    pub fn new(comp: CompId, index: usize) -> Self {
        Self { comp, index }
    }
}

/// The two property trees a layer can carry colors in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropRoot {
    /// Vector shape contents.
    Contents,
    /// Effect list; its direct children are effects.
    Effects,
}

/// A property addressed by its 1-based child-index trail from a root group.
///
/// An empty `path` addresses the root group itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropRef {
    /// Owning layer.
    pub layer: LayerRef,
    /// Root tree.
    pub root: PropRoot,
    /// 1-based child indices.
    pub path: Vec<usize>,
}

impl PropRef {
    /// The root group of `root` on `layer`.
    pub fn root(layer: LayerRef, root: PropRoot) -> Self {
        Self {
            layer,
            root,
            path: Vec::new(),
        }
    }

    /// The `index`-th (1-based) child of this group.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self {
            layer: self.layer,
            root: self.root,
            path,
        }
    }

    /// The enclosing group, or `None` for a root group.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.path.split_last()?;
        Some(Self {
            layer: self.layer,
            root: self.root,
            path: rest.to_vec(),
        })
    }

    /// Every ancestor from the root group down to (and including) `self`.
    pub fn lineage(&self) -> impl Iterator<Item = PropRef> + '_ {
        (0..=self.path.len()).map(|n| Self {
            layer: self.layer,
            root: self.root,
            path: self.path[..n].to_vec(),
        })
    }
}

/// Capability snapshot of one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerInfo {
    /// 1-based index.
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Selection flag.
    pub selected: bool,
    /// Lock flag.
    pub locked: bool,
    /// Source is a solid.
    pub is_solid: bool,
    /// Text layer.
    pub is_text: bool,
    /// Shape layer.
    pub is_shape: bool,
    /// Layer exposes an effect list.
    pub has_effects: bool,
    /// Source composition when the layer is a precomp.
    pub precomp: Option<CompId>,
}

/// Value kind tag of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PropertyValueType {
    /// Pure grouping node.
    #[default]
    NoValue,
    /// RGBA color.
    Color,
    /// Scalar.
    OneD,
    /// Anything else the host models.
    Other,
}

/// Capability snapshot of one property or property group.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyInfo {
    /// Display name.
    pub name: String,
    /// Host-stable identifier of the property kind.
    pub match_name: String,
    /// Value kind.
    pub value_type: PropertyValueType,
    /// Keyframe count; non-zero means animated.
    pub num_keys: usize,
    /// Child count; non-zero means group.
    pub num_properties: usize,
    /// Value is computed by an expression.
    pub expression_enabled: bool,
}

/// The text-document value object; only its colors are modelled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocument {
    /// Fill color, when the text has a fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Rgba>,
    /// Stroke color, when the text has a stroke.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Rgba>,
}

/// The operation set the color engine requires from a host document.
///
/// Nothing here hands out durable node handles: every call re-resolves its
/// address, and callers must treat any `Err` as "absent right now".
pub trait DocumentHost {
    /// The composition currently open for editing.
    fn active_comp(&self) -> Option<CompId>;

    /// Look a composition up by id anywhere in the project.
    fn find_comp(&self, id: CompId) -> Option<CompId>;

    /// Composition display name.
    fn comp_name(&self, comp: CompId) -> HostResult<String>;

    /// Number of layers in the composition.
    fn num_layers(&self, comp: CompId) -> HostResult<usize>;

    /// Layer capability snapshot.
    fn layer(&self, layer: LayerRef) -> HostResult<LayerInfo>;

    /// Write the lock flag.
    fn set_layer_locked(&mut self, layer: LayerRef, locked: bool) -> HostResult<()>;

    /// Write the selection flag.
    fn set_layer_selected(&mut self, layer: LayerRef, selected: bool) -> HostResult<()>;

    /// Color of a solid-source layer.
    fn solid_color(&self, layer: LayerRef) -> HostResult<Rgba>;

    /// Recolor a solid-source layer.
    fn set_solid_color(&mut self, layer: LayerRef, color: Rgba) -> HostResult<()>;

    /// Current text document of a text layer.
    fn text_document(&self, layer: LayerRef) -> HostResult<TextDocument>;

    /// Whether the text-document property is expression-driven.
    fn text_expression_enabled(&self, layer: LayerRef) -> HostResult<bool>;

    /// Replace the text document of a text layer.
    fn set_text_document(&mut self, layer: LayerRef, doc: TextDocument) -> HostResult<()>;

    /// Property or group capability snapshot.
    fn property(&self, prop: &PropRef) -> HostResult<PropertyInfo>;

    /// Current (time-zero) value of a color property.
    fn property_value(&self, prop: &PropRef) -> HostResult<Rgba>;

    /// Overwrite the static value of a color property.
    fn set_property_value(&mut self, prop: &PropRef, value: Rgba) -> HostResult<()>;

    /// Value at 1-based key `key`.
    fn key_value(&self, prop: &PropRef, key: usize) -> HostResult<Rgba>;

    /// Time in seconds of 1-based key `key`.
    fn key_time(&self, prop: &PropRef, key: usize) -> HostResult<f64>;

    /// Overwrite the value at 1-based key `key`.
    fn set_value_at_key(&mut self, prop: &PropRef, key: usize, value: Rgba) -> HostResult<()>;

    /// Open a named undo transaction.
    fn begin_undo_group(&mut self, name: &str);

    /// Close the innermost undo transaction.
    fn end_undo_group(&mut self);

    /// First direct child of `group` whose match name is `match_name`.
    fn child_by_match_name(&self, group: &PropRef, match_name: &str) -> HostResult<PropRef> {
        let info = self.property(group)?;
        (1..=info.num_properties)
            .map(|i| group.child(i))
            .find(|child| {
                self.property(child)
                    .is_ok_and(|c| c.match_name == match_name)
            })
            .ok_or_else(|| HostError::PropertyNotFound(match_name.to_string()))
    }
}

/// Run `f` with `layer` unlocked, restoring the lock afterwards.
///
/// The previous lock state is restored whatever `f` returns. Returns whether
/// the layer was locked together with `f`'s output.
pub fn with_unlocked_layer<H, T>(
    host: &mut H,
    layer: LayerRef,
    f: impl FnOnce(&mut H) -> T,
) -> HostResult<(bool, T)>
where
    H: DocumentHost + ?Sized,
{
    let was_locked = host.layer(layer)?.locked;
    if was_locked {
        host.set_layer_locked(layer, false)?;
    }
    let out = f(host);
    if was_locked && let Err(err) = host.set_layer_locked(layer, true) {
        tracing::warn!(?layer, %err, "failed to re-lock layer");
    }
    Ok((was_locked, out))
}

/// Run `f` inside one named host undo transaction.
pub fn in_undo_group<H, T>(host: &mut H, name: &str, f: impl FnOnce(&mut H) -> T) -> T
where
    H: DocumentHost + ?Sized,
{
    host.begin_undo_group(name);
    let out = f(host);
    host.end_undo_group();
    out
}

#[cfg(test)]
#[path = "../../tests/unit/document/host.rs"]
mod tests;
