pub(crate) mod catalog;
pub(crate) mod merge;
pub(crate) mod select;
pub(crate) mod walker;
