//! Read stylesheets and decode them to UTF-8.
//!
//! This module uses [`encoding_rs`] under the hood.

use encoding_rs::{Encoding, UTF_8};

use crate::{
    error::{Error, Result},
    provider::SourceProvider,
    util::url_path::UrlPath,
};

/// A decoded stylesheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedStylesheet {
    /// Directory of the stylesheet, relative to the root directory.
    ///
    /// Relative references found in `text` are resolved against it.
    pub base_dir: UrlPath,
    /// Content without byte-order mark and `@charset` rule.
    pub text: String,
}

/// Read and decode a stylesheet.
pub fn load_stylesheet<P>(provider: &P, path: &UrlPath) -> Result<LoadedStylesheet>
where
    P: SourceProvider + ?Sized,
{
    tracing::debug!("Loading {}", path);

    let bytes = provider.read(path).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;

    Ok(LoadedStylesheet {
        base_dir: path.parent(),
        text: decode_css(&bytes),
    })
}

/// Decode CSS bytes to a string.
///
/// The encoding is determined by, in this order: a byte-order mark (UTF-8,
/// UTF-16LE or UTF-16BE), a leading `@charset` rule, or UTF-8 by default.
/// The byte-order mark and a leading `@charset` rule are removed.
pub fn decode_css(bytes: &[u8]) -> String {
    let text = match Encoding::for_bom(bytes) {
        Some((encoding, bom_length)) => decode(encoding, &bytes[bom_length..]),
        None => {
            let encoding = CharsetRule::find(bytes)
                .map(|rule| encoding_for_label(rule.label))
                .unwrap_or(UTF_8);
            decode(encoding, bytes)
        },
    };

    strip_charset_rule(text)
}

fn decode(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        tracing::warn!("Malformed {} sequences have been replaced", encoding.name());
    }
    text.into_owned()
}

/// Return the encoding of a `@charset` label.
///
/// Labels that cannot describe ASCII-compatible bytes (e.g. `utf-16`) and
/// unknown labels fall back to UTF-8.
fn encoding_for_label(label: &[u8]) -> &'static Encoding {
    match Encoding::for_label(label) {
        Some(encoding) => encoding.output_encoding(),
        None => {
            tracing::warn!(
                "Unknown @charset {:?}, decoding as UTF-8",
                String::from_utf8_lossy(label)
            );
            UTF_8
        },
    }
}

/// Remove a leading `@charset` rule and its line break.
fn strip_charset_rule(text: String) -> String {
    match CharsetRule::find(text.as_bytes()) {
        Some(rule) => [&text[..rule.start], &text[rule.end..]].concat(),
        None => text,
    }
}

/// Location of a leading `@charset "...";` rule.
#[derive(Debug, PartialEq)]
struct CharsetRule<'a> {
    /// Encoding label, without quotes.
    label: &'a [u8],
    /// Offset of `@`.
    start: usize,
    /// Offset after `;` and the following line break, if any.
    end: usize,
}

impl<'a> CharsetRule<'a> {
    /// Find a `@charset` rule, optionally preceded by whitespace.
    fn find(bytes: &'a [u8]) -> Option<Self> {
        const KEYWORD: &[u8] = b"@charset";

        let start = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
        let rest = &bytes[start..];
        if rest.len() < KEYWORD.len() || !rest[..KEYWORD.len()].eq_ignore_ascii_case(KEYWORD) {
            return None;
        }

        let mut i = start + KEYWORD.len();
        let spaces = skip_whitespace(bytes, i);
        if spaces == i {
            return None;
        }
        i = spaces;

        let quote = *bytes.get(i).filter(|b| matches!(b, b'"' | b'\''))?;
        let label_start = i + 1;
        let label_length = bytes[label_start..].iter().position(|&b| b == quote)?;
        let label = &bytes[label_start..label_start + label_length];

        i = skip_whitespace(bytes, label_start + label_length + 1);
        if bytes.get(i) != Some(&b';') {
            return None;
        }
        i += 1;

        if bytes[i..].starts_with(b"\r\n") {
            i += 2;
        } else if bytes[i..].starts_with(b"\n") {
            i += 1;
        }

        Some(Self {
            label,
            start,
            end: i,
        })
    }
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|b| matches!(b, b' ' | b'\t')) {
        i += 1;
    }
    i
}
