//! Inline `@import` rules.
//!
//! Imported stylesheets are loaded through a [`SourceProvider`], resolved
//! recursively and spliced in place of the rule. Relative urls of imported
//! content are rewritten so that they stay valid from the importing file.

use super::{
    load::load_stylesheet,
    scan::{is_name_byte, Scanner, TokenKind},
    url::{rewrite_relative_urls, UrlKind, UrlReference},
};
use crate::{
    error::{Error, Result},
    provider::SourceProvider,
    util::url_path::UrlPath,
};

const IMPORT_KEYWORD: &str = "@import";

/// Resolves the `@import` rules of a stylesheet.
///
/// The stylesheets on the active import path are kept on an explicit stack,
/// so that cycles and excessive nesting are reported instead of recursing
/// forever.
#[derive(Debug)]
pub struct ImportResolver<'a, P: ?Sized> {
    provider: &'a P,
    max_depth: usize,
    stack: Vec<UrlPath>,
}

impl<'a, P> ImportResolver<'a, P>
where
    P: SourceProvider + ?Sized,
{
    /// Create a resolver allowing `max_depth` levels of nested imports.
    pub fn new(provider: &'a P, max_depth: usize) -> Self {
        Self {
            provider,
            max_depth,
            stack: Vec::new(),
        }
    }

    /// Inline the imports of `text`, the content of the stylesheet at `path`.
    ///
    /// `path` must be normalized and relative to the root directory.
    pub fn resolve(&mut self, path: &UrlPath, text: &str) -> Result<String> {
        self.enter(path)?;
        let result = self.inline_imports(path, text);
        self.leave();
        result
    }

    /// Check if a stylesheet is on the active import path.
    pub fn is_resolving(&self, path: &UrlPath) -> bool {
        self.stack.contains(path)
    }

    fn enter(&mut self, path: &UrlPath) -> Result<()> {
        if self.is_resolving(path) {
            let mut chain = self.stack.clone();
            chain.push(path.clone());
            return Err(Error::CircularImport {
                path: path.clone(),
                chain,
            });
        }
        if self.stack.len() > self.max_depth {
            return Err(Error::ImportDepthExceeded {
                path: path.clone(),
                max_depth: self.max_depth,
            });
        }
        self.stack.push(path.clone());
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    fn inline_imports(&mut self, importer: &UrlPath, text: &str) -> Result<String> {
        let mut result = String::with_capacity(text.len());
        let mut copied = 0;

        for token in Scanner::new(text) {
            if token.kind != TokenKind::Code {
                continue;
            }

            let end = token.offset + token.text.len();
            let mut search = token.offset.max(copied);

            while search < end {
                let Some(start) = find_import_keyword(text, search, end) else {
                    break;
                };
                let Some(rule) = ImportRule::parse(text, start) else {
                    search = start + IMPORT_KEYWORD.len();
                    continue;
                };
                if let Some(content) = self.inline(importer, &rule)? {
                    result.push_str(&text[copied..start]);
                    result.push_str(&content);
                    copied = rule.end;
                }
                search = rule.end;
            }
        }

        result.push_str(&text[copied..]);
        Ok(result)
    }

    /// Return the content replacing an import rule, or `None` if the rule
    /// must be kept.
    fn inline(&mut self, importer: &UrlPath, rule: &ImportRule<'_>) -> Result<Option<String>> {
        let kind = UrlKind::of(rule.specifier);
        let (target, _) = UrlPath::split_suffix(rule.specifier);

        let path = match kind {
            UrlKind::Relative => importer.parent().join(target.as_str()).normalize(),
            UrlKind::RootRelative => target.root_relative(),
            _ => {
                if kind.is_external() {
                    tracing::debug!("Keeping external import {:?}", rule.specifier);
                }
                return Ok(None);
            },
        };

        if path.escapes_root() {
            return Err(Error::ImportOutsideRoot {
                specifier: rule.specifier.to_owned(),
                importer: importer.clone(),
            });
        }

        tracing::debug!("Inlining {} into {}", path, importer);

        self.enter(&path)?;
        let content = self.load(importer, &path);
        self.leave();

        Ok(Some(Conditions::parse(rule.conditions).wrap(content?)))
    }

    /// Load and resolve an imported stylesheet, with urls relative to the
    /// directory of `importer`.
    fn load(&mut self, importer: &UrlPath, path: &UrlPath) -> Result<String> {
        let stylesheet = load_stylesheet(self.provider, path)?;
        let text = self.inline_imports(path, &stylesheet.text)?;

        let prefix = stylesheet.base_dir.relative_to(&importer.parent());
        if prefix.is_empty() {
            return Ok(text);
        }

        Ok(rewrite_relative_urls(&text, &prefix, |path, suffix| {
            format!("{path}{suffix}")
        }))
    }
}

/// Find `@import` (case-insensitive) in `text[from..to]`.
fn find_import_keyword(text: &str, from: usize, to: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let keyword = IMPORT_KEYWORD.as_bytes();

    (from..to).find(|&i| {
        bytes.len() >= i + keyword.len()
            && bytes[i..i + keyword.len()].eq_ignore_ascii_case(keyword)
            && !bytes.get(i + keyword.len()).is_some_and(|&b| is_name_byte(b))
    })
}

/// An `@import` rule.
#[derive(Debug, PartialEq, Eq)]
struct ImportRule<'a> {
    /// Import target, without quotes.
    specifier: &'a str,
    /// Layer, supports and media conditions.
    conditions: &'a str,
    /// Offset after the terminating `;`.
    end: usize,
}

impl<'a> ImportRule<'a> {
    /// Parse the rule starting at `start` in `text`.
    ///
    /// Returns `None` if the rule has no target or no terminating `;`.
    fn parse(text: &'a str, start: usize) -> Option<Self> {
        let base = start + IMPORT_KEYWORD.len();
        let rest = &text[base..];
        let mut tokens = Scanner::new(rest).filter(|token| {
            token.kind != TokenKind::Comment
                && !(token.kind == TokenKind::Code && token.text.trim().is_empty())
        });

        let target = tokens.next().filter(|token| token.terminated)?;
        let specifier = match target.kind {
            TokenKind::String => &target.text[1..target.text.len() - 1],
            TokenKind::Url => UrlReference::parse(target.text)?.value,
            _ => return None,
        };

        let conditions_start = target.offset + target.text.len();
        for token in tokens {
            if token.kind != TokenKind::Code {
                continue;
            }
            let Some(i) = token.text.find([';', '{', '}']) else {
                continue;
            };
            if token.text.as_bytes()[i] != b';' {
                return None;
            }
            let conditions_end = token.offset + i;
            return Some(Self {
                specifier,
                conditions: rest[conditions_start..conditions_end].trim(),
                end: base + conditions_end + 1,
            });
        }

        None
    }
}

/// Conditions of an `@import` rule, e.g. `layer(base) supports(display: grid)
/// screen`.
#[derive(Debug, Default, PartialEq, Eq)]
struct Conditions<'a> {
    /// Layer name, empty for an anonymous layer.
    layer: Option<&'a str>,
    supports: Option<&'a str>,
    media: &'a str,
}

impl<'a> Conditions<'a> {
    fn parse(conditions: &'a str) -> Self {
        let mut rest = conditions.trim();

        let layer = if let Some((name, tail)) = strip_function(rest, "layer") {
            rest = tail;
            Some(name)
        } else if let Some(tail) = strip_keyword(rest, "layer") {
            rest = tail;
            Some("")
        } else {
            None
        };

        let supports = strip_function(rest, "supports").map(|(condition, tail)| {
            rest = tail;
            condition
        });

        Self {
            layer,
            supports,
            media: rest,
        }
    }

    /// Wrap imported content in the blocks matching the conditions.
    fn wrap(&self, mut content: String) -> String {
        if !self.media.is_empty() {
            content = format!("@media {}{{{}}}", self.media, content);
        }
        if let Some(supports) = self.supports {
            content = format!("@supports ({}){{{}}}", supports, content);
        }
        match self.layer {
            Some("") => format!("@layer{{{}}}", content),
            Some(layer) => format!("@layer {}{{{}}}", layer, content),
            None => content,
        }
    }
}

/// Strip `name(...)` (case-insensitive) from the start of `text`.
///
/// Returns the trimmed argument and the trimmed remainder.
fn strip_function<'a>(text: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let rest = strip_prefix_ignore_case(text, name)?.strip_prefix('(')?;

    let mut depth = 1;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((rest[..i].trim(), rest[i + 1..].trim_start()));
                }
            },
            _ => {},
        }
    }
    None
}

/// Strip the keyword `name` (case-insensitive) from the start of `text`.
fn strip_keyword<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let rest = strip_prefix_ignore_case(text, name)?;
    match rest.bytes().next() {
        None => Some(rest),
        Some(b) if b.is_ascii_whitespace() => Some(rest.trim_start()),
        Some(_) => None,
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::{Conditions, ImportResolver, ImportRule};
    use crate::{error::Error, provider::MemoryProvider, util::url_path::UrlPath};

    fn resolve(provider: &MemoryProvider, path: &str, text: &str) -> crate::error::Result<String> {
        ImportResolver::new(provider, 32).resolve(&UrlPath::from(path), text)
    }

    #[test]
    fn inline() {
        const CASES: [(&str, &str); 5] = [
            ("@import \"a.css\";\n.main { }", ".a { }\n.main { }"),
            ("@import url(a.css);", ".a { }"),
            ("@import url( 'a.css' ) ;", ".a { }"),
            ("@IMPORT'a.css';", ".a { }"),
            ("@import /* a */ \"./a.css?v=1\";", ".a { }"),
        ];

        let provider = MemoryProvider::new();
        provider.insert("a.css", ".a { }");

        for (input, expected) in CASES {
            let result = resolve(&provider, "main.css", input).unwrap();
            assert_eq!(result, expected, "{input:?}");
        }
    }

    #[test]
    fn nested() {
        let provider = MemoryProvider::new();
        provider.insert("css/a.css", "@import 'lib/b.css';\n.a { }");
        provider.insert("css/lib/b.css", "@import '/base.css';\n.b { }");
        provider.insert("base.css", "body { }");

        let result = resolve(&provider, "css/main.css", "@import 'a.css';").unwrap();
        assert_eq!(result, "body { }\n.b { }\n.a { }");
    }

    #[test]
    fn external() {
        const INPUT: &str = concat!(
            "@import url(https://fonts.example.com/x.css);\n",
            "@import '//cdn.example.com/y.css' screen;\n",
            "@import url(data:text/css,.a{});\n",
            "@import '';\n",
            ".main { }",
        );

        let provider = MemoryProvider::new();
        let result = resolve(&provider, "main.css", INPUT).unwrap();
        assert_eq!(result, INPUT);
    }

    #[test]
    fn conditions() {
        const CASES: [(&str, &str); 6] = [
            ("@import 'a.css' screen;", "@media screen{.a{}}"),
            (
                "@import url(a.css) screen and (orientation: landscape) ;",
                "@media screen and (orientation: landscape){.a{}}",
            ),
            ("@import 'a.css' layer;", "@layer{.a{}}"),
            ("@import 'a.css' LAYER( base );", "@layer base{.a{}}"),
            (
                "@import 'a.css' supports(not (display: grid)) print;",
                "@supports (not (display: grid)){@media print{.a{}}}",
            ),
            (
                "@import 'a.css' layer(base) supports(display: grid) print, screen;",
                "@layer base{@supports (display: grid){@media print, screen{.a{}}}}",
            ),
        ];

        let provider = MemoryProvider::new();
        provider.insert("a.css", ".a{}");

        for (input, expected) in CASES {
            let result = resolve(&provider, "main.css", input).unwrap();
            assert_eq!(result, expected, "{input:?}");
        }
    }

    #[test]
    fn parse_conditions() {
        const CASES: [(&str, Option<&str>, Option<&str>, &str); 5] = [
            ("", None, None, ""),
            ("screen", None, None, "screen"),
            ("layers", None, None, "layers"),
            ("layer screen", Some(""), None, "screen"),
            ("layer(a.b) supports(selector(:has(a)))", Some("a.b"), Some("selector(:has(a))"), ""),
        ];

        for (input, layer, supports, media) in CASES {
            let expected = Conditions {
                layer,
                supports,
                media,
            };
            assert_eq!(Conditions::parse(input), expected, "{input:?}");
        }
    }

    #[test]
    fn ignored() {
        const CASES: [&str; 7] = [
            "/* @import 'a.css'; */ .a { }",
            ".a::before { content: \"@import 'a.css';\" }",
            "@import;",
            "@import 'a.css'",
            "@import 'a.css' { }",
            "@imports 'a.css';",
            "@import foo;",
        ];

        let provider = MemoryProvider::new();
        provider.insert("a.css", ".a { }");

        for input in CASES {
            let result = resolve(&provider, "main.css", input).unwrap();
            assert_eq!(result, input, "{input:?}");
        }
    }

    #[test]
    fn parse_rule() {
        let text = "a{} @import url(\"b.css\") print; c{}";
        let rule = ImportRule::parse(text, 4).unwrap();
        assert_eq!(rule, ImportRule {
            specifier: "b.css",
            conditions: "print",
            end: 31,
        });
        assert_eq!(&text[rule.end..], " c{}");
    }

    #[test]
    fn circular() {
        let provider = MemoryProvider::new();
        provider.insert("a.css", "@import 'b.css';");
        provider.insert("b.css", "@import 'a.css';");

        let error = resolve(&provider, "a.css", "@import 'b.css';").unwrap_err();
        match error {
            Error::CircularImport { path, chain } => {
                assert_eq!(path.as_str(), "a.css");
                let chain: Vec<_> = chain.iter().map(UrlPath::as_str).collect();
                assert_eq!(chain, ["a.css", "b.css", "a.css"]);
            },
            error => panic!("unexpected error: {error}"),
        }

        let error = resolve(&provider, "c.css", "@import './c.css';").unwrap_err();
        assert!(matches!(error, Error::CircularImport { .. }));
    }

    #[test]
    fn stack() {
        let provider = MemoryProvider::new();
        let mut resolver = ImportResolver::new(&provider, 1);
        let a = UrlPath::from("a.css");
        let b = UrlPath::from("b.css");

        resolver.enter(&a).unwrap();
        assert!(resolver.is_resolving(&a));
        assert!(!resolver.is_resolving(&b));
        assert!(matches!(resolver.enter(&a), Err(Error::CircularImport { .. })));

        resolver.enter(&b).unwrap();
        assert!(matches!(
            resolver.enter(&UrlPath::from("c.css")),
            Err(Error::ImportDepthExceeded { max_depth: 1, .. })
        ));

        resolver.leave();
        resolver.leave();
        assert!(!resolver.is_resolving(&a));
    }

    #[test]
    fn depth() {
        let provider = MemoryProvider::new();
        provider.insert("1.css", "@import '2.css';");
        provider.insert("2.css", "@import '3.css';");
        provider.insert("3.css", ".a { }");

        let result = ImportResolver::new(&provider, 3).resolve(&"0.css".into(), "@import '1.css';");
        assert_eq!(result.unwrap(), ".a { }");

        let error = ImportResolver::new(&provider, 2)
            .resolve(&"0.css".into(), "@import '1.css';")
            .unwrap_err();
        assert!(matches!(
            error,
            Error::ImportDepthExceeded { path, max_depth: 2 } if path.as_str() == "3.css"
        ));
    }

    #[test]
    fn outside_root() {
        const CASES: [&str; 3] = ["../../a.css", "/../a.css", "lib/../../../a.css"];

        let provider = MemoryProvider::new();

        for specifier in CASES {
            let input = format!("@import '{specifier}';");
            let error = resolve(&provider, "css/main.css", &input).unwrap_err();
            assert!(
                matches!(
                    &error,
                    Error::ImportOutsideRoot { specifier: s, importer }
                        if s == specifier && importer.as_str() == "css/main.css"
                ),
                "{specifier:?}: {error}"
            );
        }
    }

    #[test]
    fn missing() {
        let provider = MemoryProvider::new();
        let error = resolve(&provider, "css/main.css", "@import 'a.css';").unwrap_err();
        assert!(matches!(error, Error::Io { path, .. } if path.as_str() == "css/a.css"));
    }

    #[test]
    fn rewrite_urls() {
        let provider = MemoryProvider::new();
        provider.insert(
            "css/lib/a.css",
            concat!(
                "@import '../../fonts/f.css';\n",
                ".a { background: url(img/a.png?v=1) url(/abs.png) url(data:x) }",
            ),
        );
        provider.insert("fonts/f.css", "@font-face { src: url('f.woff') }");

        let result = resolve(&provider, "css/main.css", "@import 'lib/a.css';").unwrap();
        assert_eq!(
            result,
            concat!(
                "@font-face { src: url('../fonts/f.woff') }\n",
                ".a { background: url(lib/img/a.png?v=1) url(/abs.png) url(data:x) }",
            )
        );
    }

    #[test]
    fn rewrite_urls_sibling() {
        let provider = MemoryProvider::new();
        provider.insert("subdir/sibling.css", ".icon { background: url(../images/icon.png) }");

        let result = resolve(&provider, "subdir/main.css", "@import 'sibling.css';").unwrap();
        assert_eq!(result, ".icon { background: url(../images/icon.png) }");

        let result = resolve(&provider, "main.css", "@import 'subdir/sibling.css';").unwrap();
        assert_eq!(result, ".icon { background: url(images/icon.png) }");
    }
}
