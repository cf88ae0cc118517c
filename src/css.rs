//! Process CSS code.
//!
//! Stylesheets go through three stages: [`load`] decodes them to UTF-8,
//! [`import`] inlines their `@import` rules and [`minify`] removes comments
//! and whitespace. The [`scan`] module splits code into the regions each
//! stage must handle with care.

pub mod import;
pub mod load;
pub mod minify;
pub mod scan;
pub mod url;
