//! Utility functions and structures.

pub(crate) mod toml;
pub mod url_path;
