//! Split CSS code into lexical regions.
//!
//! This is not a CSS parser: the [`Scanner`] only knows about the regions
//! whose content must never be touched by the minifier (comments, strings and
//! `url(...)` functions). Everything else is returned as plain code.

/// Kind of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// An ordinary comment, delimiters included.
    Comment,
    /// A comment used to target legacy browsers, kept by the minifier.
    HackComment,
    /// A single or double quoted string, quotes included.
    String,
    /// A `url(...)` function, from its name to the closing parenthesis.
    Url,
    /// Anything else.
    Code,
}

/// A region of CSS code.
///
/// Tokens never overlap, and the concatenation of all tokens returned by a
/// [`Scanner`] is its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    /// Kind of region.
    pub kind: TokenKind,
    /// Text of the region.
    pub text: &'a str,
    /// Byte offset of the region in the input.
    pub offset: usize,
    /// Whether the closing delimiter was found before the end of input.
    ///
    /// Always `true` for [`TokenKind::Code`].
    pub terminated: bool,
}

/// States of the [`Scanner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// Plain code.
    Normal,
    /// Inside `/* ... */`.
    InComment,
    /// Inside `'...'`.
    InSingleQuoteString,
    /// Inside `"..."`.
    InDoubleQuoteString,
    /// Inside `url(...)`.
    InUrl,
}

/// Iterator over the [`Token`]s of CSS code.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    /// Set after the comment that opens a Mac-IE hack.
    hack_open: bool,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over CSS code.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            hack_open: false,
        }
    }

    /// Return the state entered at byte `i` when leaving plain code, if any.
    pub fn transition(&self, i: usize) -> Option<ScanState> {
        let bytes = self.text.as_bytes();
        match bytes.get(i)? {
            b'/' if bytes.get(i + 1) == Some(&b'*') => Some(ScanState::InComment),
            b'\'' => Some(ScanState::InSingleQuoteString),
            b'"' => Some(ScanState::InDoubleQuoteString),
            b'u' | b'U' if self.starts_url(i) => Some(ScanState::InUrl),
            _ => None,
        }
    }

    fn starts_url(&self, i: usize) -> bool {
        let bytes = self.text.as_bytes();
        bytes.len() >= i + 4
            && bytes[i..i + 4].eq_ignore_ascii_case(b"url(")
            && (i == 0 || !is_name_byte(bytes[i - 1]))
    }

    /// Scan plain code up to the next region, or the end of input.
    fn scan_code(&self, start: usize) -> usize {
        let bytes = self.text.as_bytes();
        let mut i = start;
        while i < bytes.len() {
            if i > start && self.transition(i).is_some() {
                break;
            }
            if bytes[i] == b'\\' {
                i += 1 + self.char_len_at(i + 1);
            } else {
                i += 1;
            }
        }
        i.min(bytes.len())
    }

    fn scan_comment(&self, start: usize) -> (usize, bool) {
        match self.text[start + 2..].find("*/") {
            Some(i) => (start + 2 + i + 2, true),
            None => (self.text.len(), false),
        }
    }

    /// Scan a quoted string starting at `start`, escapes included.
    fn scan_string(&self, start: usize) -> (usize, bool) {
        let bytes = self.text.as_bytes();
        let quote = bytes[start];
        let mut i = start + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1 + self.char_len_at(i + 1),
                b if b == quote => return (i + 1, true),
                _ => i += 1,
            }
        }
        (bytes.len(), false)
    }

    fn scan_url(&self, start: usize) -> (usize, bool) {
        let bytes = self.text.as_bytes();
        let mut i = start + 4;
        while i < bytes.len() && is_whitespace_byte(bytes[i]) {
            i += 1;
        }
        if matches!(bytes.get(i), Some(b'"' | b'\'')) {
            let (end, terminated) = self.scan_string(i);
            if !terminated {
                return (end, false);
            }
            i = end;
        }
        while i < bytes.len() {
            match bytes[i] {
                b')' => return (i + 1, true),
                b'\\' => i += 1 + self.char_len_at(i + 1),
                _ => i += 1,
            }
        }
        (bytes.len(), false)
    }

    fn classify_comment(&mut self, start: usize, end: usize, terminated: bool) -> TokenKind {
        if !terminated {
            return TokenKind::Comment;
        }
        if std::mem::take(&mut self.hack_open) {
            return TokenKind::HackComment;
        }
        let bytes = self.text.as_bytes();
        let body = &self.text[start + 2..end - 2];
        if body.ends_with('\\') {
            self.hack_open = true;
            TokenKind::HackComment
        } else if bytes.get(end) == Some(&b':') || (start > 0 && bytes[start - 1] == b'>') {
            TokenKind::HackComment
        } else {
            TokenKind::Comment
        }
    }

    fn char_len_at(&self, i: usize) -> usize {
        self.text
            .get(i..)
            .and_then(|rest| rest.chars().next())
            .map_or(0, char::len_utf8)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos;
        if start >= self.text.len() {
            return None;
        }

        let state = self.transition(start).unwrap_or(ScanState::Normal);

        let (end, terminated) = match state {
            ScanState::Normal => (self.scan_code(start), true),
            ScanState::InComment => self.scan_comment(start),
            ScanState::InSingleQuoteString | ScanState::InDoubleQuoteString => {
                self.scan_string(start)
            },
            ScanState::InUrl => self.scan_url(start),
        };

        let kind = match state {
            ScanState::Normal => TokenKind::Code,
            ScanState::InComment => self.classify_comment(start, end, terminated),
            ScanState::InSingleQuoteString | ScanState::InDoubleQuoteString => TokenKind::String,
            ScanState::InUrl => TokenKind::Url,
        };

        self.pos = end;

        Some(Token {
            kind,
            text: &self.text[start..end],
            offset: start,
            terminated,
        })
    }
}

/// Check if a byte can be part of a CSS identifier.
pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'\\' || b >= 0x80
}

/// Check if a byte is CSS whitespace.
pub(crate) fn is_whitespace_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

#[cfg(test)]
mod tests {
    use super::{ScanState, Scanner, TokenKind};

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        Scanner::new(input)
            .map(|token| (token.kind, token.text))
            .collect()
    }

    #[test]
    fn transition() {
        const CASES: [(&str, usize, Option<ScanState>); 9] = [
            ("/* a */", 0, Some(ScanState::InComment)),
            ("a / b", 2, None),
            ("'a'", 0, Some(ScanState::InSingleQuoteString)),
            ("\"a\"", 0, Some(ScanState::InDoubleQuoteString)),
            ("url(a)", 0, Some(ScanState::InUrl)),
            ("URL(a)", 0, Some(ScanState::InUrl)),
            (":url(a)", 1, Some(ScanState::InUrl)),
            ("myurl(a)", 2, None),
            ("url (a)", 0, None),
        ];

        for (input, i, expected) in CASES {
            let result = Scanner::new(input).transition(i);
            assert_eq!(result, expected, "{input:?} at {i}");
        }
    }

    #[test]
    fn partition() {
        const INPUT: &str = concat!(
            "a { b: url( \"x).png\" ); } /* c */\n",
            "d::after { content: 'e\\'f'; background: url(data:image/png;base64,/*x*/) }",
        );

        let text: String = Scanner::new(INPUT).map(|token| token.text).collect();
        assert_eq!(text, INPUT);

        assert_eq!(kinds(INPUT), vec![
            (TokenKind::Code, "a { b: "),
            (TokenKind::Url, "url( \"x).png\" )"),
            (TokenKind::Code, "; } "),
            (TokenKind::Comment, "/* c */"),
            (TokenKind::Code, "\nd::after { content: "),
            (TokenKind::String, "'e\\'f'"),
            (TokenKind::Code, "; background: "),
            (TokenKind::Url, "url(data:image/png;base64,/*x*/)"),
            (TokenKind::Code, " }"),
        ]);
    }

    #[test]
    fn offsets() {
        let tokens: Vec<_> = Scanner::new("a/**/'b'").collect();
        let offsets: Vec<_> = tokens.iter().map(|token| token.offset).collect();
        assert_eq!(offsets, vec![0, 1, 5]);
    }

    #[test]
    fn escaped_quote_in_code() {
        assert_eq!(kinds(".a\\\"b { }"), vec![(TokenKind::Code, ".a\\\"b { }")]);
    }

    #[test]
    fn hack_comments() {
        assert_eq!(kinds("/* \\*/ .a { } /* */ /* x */"), vec![
            (TokenKind::HackComment, "/* \\*/"),
            (TokenKind::Code, " .a { } "),
            (TokenKind::HackComment, "/* */"),
            (TokenKind::Code, " "),
            (TokenKind::Comment, "/* x */"),
        ]);

        assert_eq!(kinds("width/**/:1px"), vec![
            (TokenKind::Code, "width"),
            (TokenKind::HackComment, "/**/"),
            (TokenKind::Code, ":1px"),
        ]);

        assert_eq!(kinds("html>/**/body"), vec![
            (TokenKind::Code, "html>"),
            (TokenKind::HackComment, "/**/"),
            (TokenKind::Code, "body"),
        ]);
    }

    #[test]
    fn unterminated() {
        const CASES: [(&str, TokenKind); 4] = [
            ("/* a", TokenKind::Comment),
            ("'a", TokenKind::String),
            ("url(a", TokenKind::Url),
            ("url('a)", TokenKind::Url),
        ];

        for (input, kind) in CASES {
            let tokens: Vec<_> = Scanner::new(input).collect();
            assert_eq!(tokens.len(), 1, "{input:?}");
            assert_eq!(tokens[0].kind, kind, "{input:?}");
            assert_eq!(tokens[0].text, input, "{input:?}");
            assert!(!tokens[0].terminated, "{input:?}");
        }
    }

    #[test]
    fn non_ascii() {
        let input = "a::before { content: \"é\" } .é\\é { }";
        let text: String = Scanner::new(input).map(|token| token.text).collect();
        assert_eq!(text, input);
    }
}
