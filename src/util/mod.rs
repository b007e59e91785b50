//! Shared helpers: path extensions and test logging setup.

pub mod path;
pub mod testing;
