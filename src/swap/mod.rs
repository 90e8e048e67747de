pub(crate) mod engine;
pub(crate) mod history;
pub(crate) mod undo;
