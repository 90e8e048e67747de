//! Colorswap finds, merges, replaces and restores the colors of a layered
//! composition document.
//!
//! The engine talks to its document only through [`DocumentHost`]:
//!
//! - Enumerate every color with [`scan_colors`] into a [`Catalog`]
//! - Replace colors in bulk with [`swap_colors`], which returns a change log
//! - Revert a change log with [`undo_swap`]
//! - Select layers by color with [`select_layers_by_color`]
//!
//! [`ColorPanel`] keeps the caller-side session (pending edits, bounded undo
//! history, palettes) and [`Project`] is a JSON-backed host for files and tests.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod document;
pub(crate) mod scan;
pub(crate) mod session;
pub(crate) mod swap;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
mod test_support;

pub use crate::foundation::color::{Hex, MAX_RGB_DISTANCE, Rgba};
pub use crate::foundation::error::{ColorSwapError, ColorSwapResult};

pub use crate::document::host::{
    CompId, DocumentHost, HostError, HostResult, LayerInfo, LayerRef, PropRef, PropRoot,
    PropertyInfo, PropertyValueType, TextDocument, in_undo_group, with_unlocked_layer,
};
pub use crate::document::project::{
    Comp, Keyframe, Layer, LayerSource, Project, PropValue, Property, PropertyGroup, PropertyNode,
    TextLayer,
};
pub use crate::scan::catalog::{
    Catalog, CatalogSummary, ColorEntry, ColorLocation, KeyframeColor, KeyframeGroupEntry,
    ScanItem, ScanOptions, scan_colors,
};
pub use crate::scan::merge::merge_similar;
pub use crate::scan::select::{SelectPayload, SelectionResult, select_layers_by_color};
pub use crate::scan::walker::{PropertyType, WalkOptions};
pub use crate::session::panel::{ColorPanel, DEFAULT_SIMILARITY_THRESHOLD, Palette};
pub use crate::swap::engine::{
    ChangeLogEntry, KeyframeSwap, SWAP_UNDO_GROUP, StaticSwap, SwapOutcome, SwapPayload,
    swap_colors,
};
pub use crate::swap::history::{MAX_UNDO_HISTORY, UndoHistory};
pub use crate::swap::undo::{
    UNDO_SWAP_GROUP, UndoHistoryEntry, UndoOutcome, undo_swap, undo_swap_json,
};
