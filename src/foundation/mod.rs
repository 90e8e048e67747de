//! Shared building blocks: the error taxonomy and the color codec.

pub(crate) mod color;
pub(crate) mod error;
