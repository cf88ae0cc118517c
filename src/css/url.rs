//! Classify and rewrite `url(...)` references.

use super::scan::{Scanner, TokenKind};
use crate::util::url_path::UrlPath;

/// Quoting style of a `url(...)` argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quote {
    /// `url(a.png)`
    None,
    /// `url('a.png')`
    Single,
    /// `url("a.png")`
    Double,
}

impl Quote {
    /// Return the quote character, if any.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Single => "'",
            Self::Double => "\"",
        }
    }
}

/// Classification of a URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlKind {
    /// Empty argument, e.g. `url()`.
    Empty,
    /// URL with a scheme, e.g. `https://example.com/a.png`.
    Absolute,
    /// URL without scheme, e.g. `//example.com/a.png`.
    ProtocolRelative,
    /// `data:` URI.
    DataUri,
    /// Path from the web root, e.g. `/images/a.png`.
    RootRelative,
    /// Reference within the same document, e.g. `#gradient` or `?v=1`.
    Fragment,
    /// Path relative to the stylesheet, e.g. `../images/a.png`.
    Relative,
}

impl UrlKind {
    /// Classify a URL.
    pub fn of(url: &str) -> Self {
        if url.is_empty() {
            Self::Empty
        } else if url.starts_with("//") {
            Self::ProtocolRelative
        } else if url.starts_with('/') {
            Self::RootRelative
        } else if url.starts_with(['#', '?']) || url.starts_with("%23") {
            Self::Fragment
        } else if url.len() >= 5 && url.as_bytes()[..5].eq_ignore_ascii_case(b"data:") {
            Self::DataUri
        } else if has_scheme(url) {
            Self::Absolute
        } else {
            Self::Relative
        }
    }

    /// Check if the URL points outside the local file tree.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Absolute | Self::ProtocolRelative | Self::DataUri)
    }
}

/// Check if a URL starts with a scheme, e.g. `https:`.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// A `url(...)` function found in CSS code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UrlReference<'a> {
    /// Function name, as written (e.g. `url` or `URL`).
    pub name: &'a str,
    /// Quoting style of the argument.
    pub quote: Quote,
    /// Argument without quotes and surrounding whitespace.
    pub value: &'a str,
}

impl<'a> UrlReference<'a> {
    /// Parse the text of a [`TokenKind::Url`] token.
    ///
    /// Returns `None` if the function is not terminated.
    pub fn parse(text: &'a str) -> Option<Self> {
        let open = text.find('(')?;
        let name = &text[..open];
        let inner = text[open + 1..].strip_suffix(')')?.trim();

        let (quote, value) = match inner.as_bytes().first() {
            Some(b'"') => (Quote::Double, inner.strip_prefix('"')?.strip_suffix('"')?),
            Some(b'\'') => (Quote::Single, inner.strip_prefix('\'')?.strip_suffix('\'')?),
            _ => (Quote::None, inner),
        };

        Some(Self { name, quote, value })
    }

    /// Classify the argument.
    pub fn kind(&self) -> UrlKind {
        UrlKind::of(self.value)
    }

    /// Write the function with another argument, keeping name and quotes.
    pub fn with_value(&self, value: &str) -> String {
        let quote = self.quote.as_str();
        format!("{}({quote}{value}{quote})", self.name)
    }
}

/// Resolve a relative reference against a directory.
///
/// Returns the normalized path and the query/fragment suffix of the
/// reference, if any.
pub fn resolve_reference<'a>(base_dir: &UrlPath, reference: &'a str) -> (UrlPath, &'a str) {
    let (path, suffix) = UrlPath::split_suffix(reference);
    (base_dir.join(path.as_str()).normalize(), suffix)
}

/// Rewrite every relative `url(...)` of CSS code.
///
/// `rewrite` receives the resolved path and the query/fragment suffix, and
/// returns the new argument. Other urls, strings and comments are copied
/// unchanged.
pub fn rewrite_relative_urls<F>(text: &str, base_dir: &UrlPath, mut rewrite: F) -> String
where
    F: FnMut(UrlPath, &str) -> String,
{
    let mut result = String::with_capacity(text.len());

    for token in Scanner::new(text) {
        let reference = (token.kind == TokenKind::Url)
            .then(|| UrlReference::parse(token.text))
            .flatten()
            .filter(|reference| reference.kind() == UrlKind::Relative);

        match reference {
            Some(reference) => {
                let (path, suffix) = resolve_reference(base_dir, reference.value);
                result.push_str(&reference.with_value(&rewrite(path, suffix)));
            },
            None => result.push_str(token.text),
        }
    }

    result
}
