//! Generate public URLs of local files.

/// Maps a local file reference to a publicly servable URL.
///
/// The optimizer calls [`generate`](Self::generate) once for every relative
/// `url(...)` it rewrites, passing the path of the referenced file relative to
/// the root directory (e.g. `themes/blue/images/icon.png`). Implementations
/// must be pure: they may be shared between threads.
pub trait UrlGenerator: Send + Sync {
    /// Return the public URL of a local file.
    fn generate(&self, uri: &str) -> String;
}

impl<F> UrlGenerator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn generate(&self, uri: &str) -> String {
        self(uri)
    }
}

/// A [`UrlGenerator`] that prepends a base URL.
///
/// ```
/// use css_optimizer::{PrefixUrlGenerator, UrlGenerator};
///
/// let generator = PrefixUrlGenerator::new("https://cdn.example.com/");
/// assert_eq!(
///     generator.generate("images/icon.png"),
///     "https://cdn.example.com/images/icon.png"
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct PrefixUrlGenerator {
    base_url: String,
}

impl PrefixUrlGenerator {
    /// Create a generator for given base URL (e.g. `/` or `/blog`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl UrlGenerator for PrefixUrlGenerator {
    fn generate(&self, uri: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            uri.trim_start_matches('/')
        )
    }
}
