//! Describe stylesheets to optimize.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    util::url_path::UrlPath,
};

/// Location of a stylesheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// A file under the root directory.
    #[default]
    File,
    /// A stylesheet hosted elsewhere, referenced by URL.
    External,
}

/// A stylesheet asset, as declared by the aggregation pipeline.
///
/// The optimizer does not use `media`, `weight`, `group` and `browsers`: the
/// pipeline uses them to group and order assets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssAsset {
    /// Location of the stylesheet.
    pub kind: AssetKind,
    /// Whether the stylesheet may be minified and aggregated.
    pub preprocess: bool,
    /// Path relative to the root directory, or URL for external assets.
    pub path: String,
    /// Media query list of the stylesheet.
    pub media: String,
    /// Position of the stylesheet in its group.
    pub weight: f64,
    /// Aggregation group.
    pub group: i64,
    /// Browsers the stylesheet applies to, e.g. `{ "IE": false }`.
    pub browsers: BTreeMap<String, bool>,
}

impl Default for CssAsset {
    fn default() -> Self {
        Self {
            kind: AssetKind::default(),
            preprocess: true,
            path: String::new(),
            media: String::from("all"),
            weight: 0.0,
            group: 0,
            browsers: BTreeMap::from([(String::from("IE"), true), (String::from("!IE"), true)]),
        }
    }
}

impl CssAsset {
    /// Create a file asset with default attributes.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create an external asset with default attributes.
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::External,
            path: url.into(),
            ..Self::default()
        }
    }

    /// Check if the asset can be optimized.
    pub fn check(&self) -> Result<()> {
        if self.kind != AssetKind::File {
            return Err(Error::UnsupportedAsset);
        }
        if !self.preprocess {
            return Err(Error::PreprocessingDisabled);
        }
        let path = self.url_path();
        if path.escapes_root() {
            return Err(Error::AssetOutsideRoot { path });
        }
        Ok(())
    }

    /// Return the normalized path of the stylesheet, relative to the root
    /// directory.
    pub fn url_path(&self) -> UrlPath {
        UrlPath::from(self.path.as_str()).root_relative()
    }
}
