//! Minify CSS code.
//!
//! The minifier walks the [`Token`]s produced by the [`Scanner`]: ordinary
//! comments are removed, whitespace in plain code is collapsed or removed, and
//! strings, urls and browser-hack comments are copied as-is.

use super::{
    scan::{Scanner, Token, TokenKind},
    url::{resolve_reference, UrlKind, UrlReference},
};
use crate::{
    error::{Error, Result},
    generator::UrlGenerator,
    util::url_path::UrlPath,
};

/// Minify CSS code, without rewriting urls.
///
/// Unterminated comments, strings and urls are kept as plain code.
pub fn minify_css(input: impl AsRef<str>) -> String {
    let mut writer = Writer::default();
    for token in Scanner::new(input.as_ref()) {
        writer.write_token(&token, None);
    }
    writer.finish()
}

/// Rewrites relative urls through a [`UrlGenerator`].
struct UrlRewriter<'a> {
    generator: &'a dyn UrlGenerator,
    base_dir: UrlPath,
}

impl UrlRewriter<'_> {
    fn rewrite(&self, text: &str) -> Option<String> {
        let reference = UrlReference::parse(text)?;
        if reference.kind() != UrlKind::Relative {
            return None;
        }
        let (path, suffix) = resolve_reference(&self.base_dir, reference.value);
        let url = self.generator.generate(path.as_str());
        tracing::trace!("Rewriting url {:?} to {:?}", reference.value, url);
        Some(reference.with_value(&format!("{url}{suffix}")))
    }
}

/// A configurable CSS minifier.
#[derive(Default)]
pub struct Minifier<'a> {
    rewriter: Option<UrlRewriter<'a>>,
    strict: bool,
    path: UrlPath,
}

impl<'a> Minifier<'a> {
    /// Create a minifier that does not rewrite urls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite relative urls, resolved against `base_dir`, with `generator`.
    pub fn rewrite_urls(self, generator: &'a dyn UrlGenerator, base_dir: UrlPath) -> Self {
        Self {
            rewriter: Some(UrlRewriter {
                generator,
                base_dir,
            }),
            ..self
        }
    }

    /// Fail on unterminated comments, strings and urls.
    ///
    /// `path` is only used in error messages.
    pub fn strict(self, strict: bool, path: UrlPath) -> Self {
        Self {
            strict,
            path,
            ..self
        }
    }

    /// Minify CSS code.
    pub fn minify(&self, input: &str) -> Result<String> {
        let mut writer = Writer::default();

        for token in Scanner::new(input) {
            if !token.terminated {
                let construct = match token.kind {
                    TokenKind::Comment | TokenKind::HackComment => "comment",
                    TokenKind::String => "string",
                    TokenKind::Url => "url",
                    TokenKind::Code => "code",
                };
                if self.strict {
                    return Err(Error::MalformedCss {
                        path: self.path.clone(),
                        construct,
                        offset: token.offset,
                    });
                }
                tracing::warn!(
                    "In the stylesheet merged from {}, unterminated {} at byte {}",
                    self.path,
                    construct,
                    token.offset
                );
            }
            writer.write_token(&token, self.rewriter.as_ref());
        }

        Ok(writer.finish())
    }
}

/// Kind of a `{...}` block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Block {
    /// Contains rules, e.g. `@media`.
    Rules,
    /// Contains declarations, e.g. a style rule or `@font-face`.
    Declarations,
}

/// At-rules whose block contains rules.
const GROUPING_RULES: [&str; 8] = [
    "container",
    "document",
    "keyframes",
    "layer",
    "media",
    "scope",
    "starting-style",
    "supports",
];

#[derive(Debug, Default)]
struct Writer {
    css: String,
    /// Whitespace has been skipped since the last output.
    pending_space: bool,
    /// A comment has been removed since the last output.
    pending_comment: bool,
    /// Offset in `css` of a space kept before `:` after what looks like a
    /// property name, removed if the statement ends as a declaration.
    property_space: Option<usize>,
    /// Offset in `css` where the current rule or declaration starts.
    statement_start: usize,
    /// Depth of parentheses in the current statement.
    parens: usize,
    blocks: Vec<Block>,
}

impl Writer {
    fn write_token(&mut self, token: &Token<'_>, rewriter: Option<&UrlRewriter<'_>>) {
        if !token.terminated {
            self.write_code(token.text);
            return;
        }

        match token.kind {
            TokenKind::Code => self.write_code(token.text),
            TokenKind::Comment => self.pending_comment = true,
            TokenKind::HackComment | TokenKind::String => self.write_verbatim(token.text),
            TokenKind::Url => match rewriter.and_then(|rewriter| rewriter.rewrite(token.text)) {
                Some(url) => self.write_verbatim(&url),
                None => self.write_verbatim(token.text),
            },
        }
    }

    fn write_code(&mut self, code: &str) {
        for c in code.chars() {
            if is_whitespace(c) {
                self.pending_space = true;
            } else {
                self.write_char(c);
            }
        }
    }

    fn write_char(&mut self, c: char) {
        let comment = std::mem::take(&mut self.pending_comment);
        if std::mem::take(&mut self.pending_space) {
            if self.space_before(c) {
                if c == ':' && self.ends_property_name() {
                    self.property_space = Some(self.css.len());
                }
                self.css.push(' ');
            }
        } else if comment && self.merges_with_last(c) {
            self.css.push(' ');
        }

        match c {
            '{' => {
                let block = self.block_kind();
                self.blocks.push(block);
                self.property_space = None;
                self.end_statement(c);
            },
            '}' => {
                self.blocks.pop();
                self.end_declaration();
                self.end_statement(c);
            },
            ';' => {
                self.end_declaration();
                self.end_statement(c);
            },
            '(' => {
                self.parens += 1;
                self.css.push(c);
            },
            ')' => {
                self.parens = self.parens.saturating_sub(1);
                self.css.push(c);
            },
            _ => self.css.push(c),
        }
    }

    fn end_statement(&mut self, c: char) {
        self.css.push(c);
        self.statement_start = self.css.len();
        self.parens = 0;
    }

    /// Remove the space kept before the `:` of a declaration.
    fn end_declaration(&mut self) {
        if let Some(offset) = self.property_space.take() {
            self.css.remove(offset);
        }
    }

    fn write_verbatim(&mut self, text: &str) {
        let comment = std::mem::take(&mut self.pending_comment);
        let space = if std::mem::take(&mut self.pending_space) {
            self.space_after_last()
        } else {
            comment && text.chars().next().is_some_and(|c| self.merges_with_last(c))
        };
        if space {
            self.css.push(' ');
        }
        self.css.push_str(text);
    }

    /// Check if `c` would form a single token with the last character,
    /// e.g. `0` and `auto` in `0/**/auto`.
    fn merges_with_last(&self, c: char) -> bool {
        self.css.chars().next_back().is_some_and(is_name_char) && is_name_char(c)
    }

    /// Check if skipped whitespace must be kept as a space before `c`.
    fn space_before(&self, c: char) -> bool {
        if !self.space_after_last() {
            return false;
        }
        match c {
            '{' | '}' | ';' | ',' | ')' => false,
            ':' => !self.ends_property_name() && !self.in_at_rule_condition(),
            _ => true,
        }
    }

    /// Check if skipped whitespace may be kept after the last character.
    fn space_after_last(&self) -> bool {
        self.css
            .chars()
            .next_back()
            .is_some_and(|c| !matches!(c, '{' | '}' | ';' | ',' | '(' | ':'))
    }

    /// Check if the current statement is a property name in a declaration
    /// block, e.g. `color` in `a { color : red }`.
    ///
    /// Outside declaration blocks, a space before `:` is significant
    /// (`a :hover` is not `a:hover`). Inside them, a nested rule such as
    /// `div :hover { }` looks the same until its `{`.
    fn ends_property_name(&self) -> bool {
        if self.blocks.last() != Some(&Block::Declarations) {
            return false;
        }
        let statement = &self.css[self.statement_start..];
        let name = statement.strip_prefix(['*', '_']).unwrap_or(statement);
        !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    /// Check if the writer is inside the parentheses of an at-rule prelude,
    /// e.g. `@media (min-width: 1px)`.
    fn in_at_rule_condition(&self) -> bool {
        self.parens > 0 && self.css[self.statement_start..].trim_start().starts_with('@')
    }

    /// Return the kind of the block opened by the current statement.
    fn block_kind(&self) -> Block {
        let prelude = self.css[self.statement_start..].trim_start();
        let Some(at_rule) = prelude.strip_prefix('@') else {
            return Block::Declarations;
        };
        let name: String = at_rule
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect::<String>()
            .to_ascii_lowercase();
        let name = strip_vendor_prefix(&name);
        if GROUPING_RULES.contains(&name) {
            Block::Rules
        } else {
            Block::Declarations
        }
    }

    fn finish(self) -> String {
        self.css
    }
}

/// Remove a vendor prefix, e.g. `-webkit-keyframes` becomes `keyframes`.
fn strip_vendor_prefix(name: &str) -> &str {
    name.strip_prefix('-')
        .and_then(|rest| rest.split_once('-'))
        .map_or(name, |(_, name)| name)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '\\') || !c.is_ascii()
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}
