//! The host document boundary.
//!
//! [`host::DocumentHost`] is the capability surface the engine walks and
//! mutates; [`project::Project`] is an in-memory implementation of it.

pub(crate) mod host;
pub(crate) mod project;
