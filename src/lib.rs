//! A CSS asset optimizer.
//!
//! Given a stylesheet, the optimizer produces a minified version suitable for
//! production:
//!
//! - byte-order marks and `@charset` rules are removed, and the code is
//!   decoded to UTF-8;
//! - `@import` rules are replaced by the content of the imported files;
//! - comments and non-significant whitespace are removed, except for comments
//!   used as browser hacks;
//! - relative urls are rewritten with a [`UrlGenerator`].
//!
//! ```no_run
//! use css_optimizer::{Config, CssAsset, CssOptimizer, PrefixUrlGenerator};
//!
//! let optimizer = CssOptimizer::new(Config::default(), PrefixUrlGenerator::new("/static"));
//! let css = optimizer.optimize(&CssAsset::file("themes/blue/style.css"))?;
//! # Ok::<(), css_optimizer::Error>(())
//! ```

#![warn(missing_docs)]

pub mod asset;
pub mod config;
pub mod css;
pub mod error;
pub mod generator;
pub mod optimizer;
pub mod provider;
pub mod util;

pub use asset::{AssetKind, CssAsset};
pub use config::Config;
pub use css::{load::decode_css, minify::minify_css};
pub use error::{Error, Result};
pub use generator::{PrefixUrlGenerator, UrlGenerator};
pub use optimizer::CssOptimizer;
pub use provider::{FileProvider, MemoryProvider, SourceProvider};
pub use util::url_path::UrlPath;
