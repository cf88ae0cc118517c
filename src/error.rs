//! Optimizer errors.

use crate::util::url_path::UrlPath;

/// Enumerates optimizer errors.
///
/// Any error aborts the current [`optimize`](crate::CssOptimizer::optimize)
/// call. Messages are meant to be shown as-is to developers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The asset is not a local file.
    #[error("Only file CSS assets can be optimized")]
    UnsupportedAsset,
    /// The asset has preprocessing disabled.
    #[error("Only file CSS assets with preprocessing enabled can be optimized")]
    PreprocessingDisabled,
    /// A stylesheet could not be read.
    #[error("While reading stylesheet `{path}`")]
    Io {
        /// Stylesheet path, relative to the root directory.
        path: UrlPath,
        /// Source error.
        source: std::io::Error,
    },
    /// A stylesheet imports itself, directly or transitively.
    #[error("Circular import of `{path}` (import chain: {})", display_chain(.chain))]
    CircularImport {
        /// Path imported a second time.
        path: UrlPath,
        /// Stylesheets being resolved, from the entry file.
        chain: Vec<UrlPath>,
    },
    /// Imports are nested deeper than allowed.
    #[error("Import of `{path}` exceeds the maximum import depth of {max_depth}")]
    ImportDepthExceeded {
        /// Path that would exceed the limit.
        path: UrlPath,
        /// Configured limit.
        max_depth: usize,
    },
    /// The asset path resolves to a file outside the root directory.
    #[error("Stylesheet `{path}` resolves outside the root directory")]
    AssetOutsideRoot {
        /// Normalized asset path.
        path: UrlPath,
    },
    /// An import resolves to a file outside the root directory.
    #[error("In `{importer}`, import `{specifier}` resolves outside the root directory")]
    ImportOutsideRoot {
        /// Import target, as written.
        specifier: String,
        /// Importing stylesheet.
        importer: UrlPath,
    },
    /// A comment, string or url is not terminated (strict mode only).
    #[error("In the stylesheet merged from `{path}`, unterminated {construct} at byte {offset}")]
    MalformedCss {
        /// Entry stylesheet path.
        path: UrlPath,
        /// Kind of construct.
        construct: &'static str,
        /// Byte offset of the construct in the text merged from the entry
        /// stylesheet and its imports.
        offset: usize,
    },
}

/// Result type of the optimizer.
pub type Result<T, E = Error> = std::result::Result<T, E>;

fn display_chain(chain: &[UrlPath]) -> String {
    chain
        .iter()
        .map(UrlPath::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
