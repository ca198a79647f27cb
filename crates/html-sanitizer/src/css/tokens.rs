//! A normalizing CSS lexer.
//!
//! `CssTokens::lex` makes one pass over a `style` attribute value and
//! produces a rewritten token stream with several guarantees the property
//! filter (and the surrounding HTML) relies on:
//!
//! - whitespace runs, `/* */` and `//` comments, and the HTML guards
//!   `<!--`/`-->` collapse to a single space;
//! - strings come out single-quoted with a fixed escape alphabet, so no
//!   quote, angle bracket, or ampersand survives raw;
//! - `url(...)` bodies are percent-encoded and single-quoted;
//! - identifiers, hex colors, and units are lowercased with escapes
//!   decoded;
//! - brackets balance: orphan closes vanish, unclosed opens gain
//!   synthetic partners at the end;
//! - no token boundary can fuse into `<!--`, `-->`, `<![CDATA[`, `]]>`,
//!   or `</style` when the normalized text is re-read.

use charref::Trie;
use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 3986 characters left raw inside rewritten `url()` bodies. The
/// single quote, parentheses, and asterisk are not in this set and get
/// encoded; a raw quote would end the rewritten string.
const URL_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'%');

lazy_static! {
    /// Well-known unit suffixes: lengths, angles, times, frequencies,
    /// and resolutions. Anything else after a number is a BadDimension.
    static ref KNOWN_UNITS: Trie<()> = {
        let mut trie = Trie::new();
        for unit in [
            "em", "ex", "ch", "rem", "vw", "vh", "vmin", "vmax", "cm", "mm",
            "q", "in", "pt", "pc", "px", "fr", "deg", "grad", "rad", "turn",
            "s", "ms", "hz", "khz", "dpi", "dpcm", "dppx",
        ] {
            trie.insert(unit.as_bytes(), ());
        }
        trie
    };
}

fn is_known_unit(unit: &str) -> bool {
    KNOWN_UNITS.get(unit.as_bytes()).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssTokenType {
    Ident,
    DotIdent,
    Function,
    At,
    HashId,
    HashUnrestricted,
    String,
    Url,
    Delim,
    Number,
    Percentage,
    Dimension,
    BadDimension,
    UnicodeRange,
    Match,
    Column,
    Whitespace,
    Colon,
    Semicolon,
    Comma,
    LeftSquare,
    RightSquare,
    LeftParen,
    RightParen,
    LeftCurly,
    RightCurly,
}

impl CssTokenType {
    fn closes(&self, open: CssTokenType) -> bool {
        match self {
            CssTokenType::RightParen => {
                matches!(open, CssTokenType::LeftParen | CssTokenType::Function)
            }
            CssTokenType::RightSquare => open == CssTokenType::LeftSquare,
            CssTokenType::RightCurly => open == CssTokenType::LeftCurly,
            _ => false,
        }
    }
}

/// The normalized stream: rewritten text, parallel start/type arrays
/// (with a sentinel start at the end), and the bracket partner map.
pub struct CssTokens {
    normalized: String,
    starts: Vec<u32>,
    types: Vec<CssTokenType>,
    /// Sorted `(token index, partner token index)` pairs, one entry per
    /// bracket token in each direction.
    brackets: Vec<(u32, u32)>,
}

impl CssTokens {
    pub fn lex(css: &str) -> CssTokens {
        Lexer::new(css).run()
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn token_type(&self, index: usize) -> CssTokenType {
        self.types[index]
    }

    pub fn token_text(&self, index: usize) -> &str {
        let start = self.starts[index] as usize;
        let end = self.starts[index + 1] as usize;
        &self.normalized[start..end]
    }

    /// The matching bracket for a bracket token, found by binary search.
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.brackets
            .binary_search_by_key(&(index as u32), |&(token, _)| token)
            .ok()
            .map(|found| self.brackets[found].1 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CssTokenType, &str)> {
        (0..self.len()).map(move |index| (self.token_type(index), self.token_text(index)))
    }
}

struct Lexer<'a> {
    input: &'a str,
    at: usize,
    out: String,
    starts: Vec<u32>,
    types: Vec<CssTokenType>,
    open_brackets: Vec<usize>,
    pairs: Vec<(u32, u32)>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            at: 0,
            out: String::with_capacity(input.len()),
            starts: Vec::new(),
            types: Vec::new(),
            open_brackets: Vec::new(),
            pairs: Vec::new(),
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.at + offset).copied()
    }

    fn push_token(&mut self, kind: CssTokenType, text: &str) -> usize {
        self.starts.push(self.out.len() as u32);
        self.types.push(kind);
        self.out.push_str(text);
        self.types.len() - 1
    }

    fn push_whitespace(&mut self) {
        if self.types.last() == Some(&CssTokenType::Whitespace) {
            return;
        }
        self.push_token(CssTokenType::Whitespace, " ");
    }

    fn last_out_char(&self) -> Option<char> {
        self.out.chars().next_back()
    }

    fn run(mut self) -> CssTokens {
        let len = self.input.len();
        while self.at < len {
            let b = self.bytes()[self.at];
            match b {
                b' ' | b'\t' | b'\n' | 0x0c | b'\r' => {
                    while matches!(self.peek(0), Some(b' ' | b'\t' | b'\n' | 0x0c | b'\r')) {
                        self.at += 1;
                    }
                    self.push_whitespace();
                }

                b'/' if self.peek(1) == Some(b'*') => {
                    self.at += 2;
                    while self.at < len && !self.bytes()[self.at..].starts_with(b"*/") {
                        self.at += 1;
                    }
                    self.at = (self.at + 2).min(len);
                    self.push_whitespace();
                }

                b'/' if self.peek(1) == Some(b'/') => {
                    while self.at < len && !matches!(self.bytes()[self.at], b'\n' | b'\r' | 0x0c) {
                        self.at += 1;
                    }
                    self.push_whitespace();
                }

                b'<' if self.bytes()[self.at..].starts_with(b"<!--") => {
                    self.at += 4;
                    self.push_whitespace();
                }

                b'-' if self.bytes()[self.at..].starts_with(b"-->") => {
                    self.at += 3;
                    self.push_whitespace();
                }

                b'"' | b'\'' => self.lex_string(b),

                b'#' => self.lex_hash(),

                b'@' => {
                    if self.is_ident_start(self.at + 1) {
                        self.at += 1;
                        let name = self.read_name();
                        self.push_token(CssTokenType::At, &format!("@{name}"));
                    } else {
                        self.at += 1;
                        self.push_delim('@');
                    }
                }

                b':' => {
                    self.at += 1;
                    self.push_token(CssTokenType::Colon, ":");
                }
                b';' => {
                    self.at += 1;
                    self.push_token(CssTokenType::Semicolon, ";");
                }
                b',' => {
                    self.at += 1;
                    self.push_token(CssTokenType::Comma, ",");
                }

                b'(' => self.open_bracket(CssTokenType::LeftParen, "("),
                b'[' => self.open_bracket(CssTokenType::LeftSquare, "["),
                b'{' => self.open_bracket(CssTokenType::LeftCurly, "{"),
                b')' => self.close_bracket(CssTokenType::RightParen, ")"),
                b']' => self.close_bracket(CssTokenType::RightSquare, "]"),
                b'}' => self.close_bracket(CssTokenType::RightCurly, "}"),

                b'~' | b'^' | b'$' if self.peek(1) == Some(b'=') => {
                    let text = [b, b'='];
                    self.at += 2;
                    self.push_token(CssTokenType::Match, std::str::from_utf8(&text).expect("ascii"));
                }
                b'*' if self.peek(1) == Some(b'=') => {
                    self.at += 2;
                    self.push_token(CssTokenType::Match, "*=");
                }
                b'|' if self.peek(1) == Some(b'=') => {
                    self.at += 2;
                    self.push_token(CssTokenType::Match, "|=");
                }
                b'|' if self.peek(1) == Some(b'|') => {
                    self.at += 2;
                    self.push_token(CssTokenType::Column, "||");
                }

                b'u' | b'U' if self.looks_like_unicode_range() => self.lex_unicode_range(),

                b'.' if self.is_ident_start(self.at + 1) => {
                    self.at += 1;
                    let name = self.read_name();
                    self.push_token(CssTokenType::DotIdent, &format!(".{name}"));
                }

                _ if self.is_number_start(self.at) => self.lex_number(),

                _ if self.is_ident_start(self.at) => self.lex_ident_like(),

                _ => {
                    let c = self.input[self.at..].chars().next().expect("in bounds");
                    self.at += c.len_utf8();
                    if c == '\0' {
                        // NUL has no place in CSS text.
                        self.push_delim('\u{FFFD}');
                    } else {
                        self.push_delim(c);
                    }
                }
            }
        }
        self.finish()
    }

    fn finish(mut self) -> CssTokens {
        // Unclosed opens get synthetic closes, innermost first.
        while let Some(open) = self.open_brackets.pop() {
            let (kind, text) = match self.types[open] {
                CssTokenType::LeftParen | CssTokenType::Function => (CssTokenType::RightParen, ")"),
                CssTokenType::LeftSquare => (CssTokenType::RightSquare, "]"),
                _ => (CssTokenType::RightCurly, "}"),
            };
            let close = self.push_token(kind, text);
            self.pairs.push((open as u32, close as u32));
            self.pairs.push((close as u32, open as u32));
        }

        self.starts.push(self.out.len() as u32);
        self.pairs.sort_unstable();
        CssTokens {
            normalized: self.out,
            starts: self.starts,
            types: self.types,
            brackets: self.pairs,
        }
    }

    fn open_bracket(&mut self, kind: CssTokenType, text: &str) {
        self.at += 1;
        let index = self.push_token(kind, text);
        self.open_brackets.push(index);
    }

    fn close_bracket(&mut self, kind: CssTokenType, text: &str) {
        self.at += 1;
        match self.open_brackets.last().copied() {
            Some(open) if kind.closes(self.types[open]) => {
                self.open_brackets.pop();
                let close = self.push_token(kind, text);
                self.pairs.push((open as u32, close as u32));
                self.pairs.push((close as u32, open as u32));
            }
            // Orphan and mismatched closes are dropped; a space keeps
            // the neighbors from fusing.
            _ => self.push_whitespace(),
        }
    }

    /// Emits a delimiter, guarding against token fusion on re-read: some
    /// delimiters take a trailing space depending on what follows, and
    /// `>` takes a leading space after `-` or `]` so `-->` and `]]>`
    /// cannot form.
    fn push_delim(&mut self, c: char) {
        if c == '>' && matches!(self.last_out_char(), Some('-') | Some(']')) {
            self.push_whitespace();
        }
        let next = self.peek(0);
        let guard = match c {
            '<' => matches!(next, Some(b'!') | Some(b'/') | Some(b'-')),
            '/' => matches!(next, Some(b'*') | Some(b'/')),
            '-' => next.is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b'\\') || b >= 0x80),
            '+' | '.' => next.is_some_and(|b| b.is_ascii_digit() || b == b'.'),
            '\\' => next.is_some_and(|b| b.is_ascii_alphanumeric() || b >= 0x80),
            '#' | '@' => next.is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'\\') || b >= 0x80),
            '~' | '^' | '$' | '*' | '=' => next == Some(b'='),
            '|' => matches!(next, Some(b'=') | Some(b'|')),
            _ => false,
        };
        let mut text = String::new();
        text.push(c);
        if guard {
            text.push(' ');
        }
        self.push_token(CssTokenType::Delim, &text);
    }

    fn is_ident_start(&self, at: usize) -> bool {
        match self.bytes().get(at) {
            None => false,
            Some(&b) if b.is_ascii_alphabetic() || b == b'_' || b >= 0x80 => true,
            Some(b'\\') => self.is_valid_escape(at),
            Some(b'-') => match self.bytes().get(at + 1) {
                Some(&b) if b.is_ascii_alphabetic() || b == b'_' || b == b'-' || b >= 0x80 => true,
                Some(b'\\') => self.is_valid_escape(at + 1),
                _ => false,
            },
            _ => false,
        }
    }

    fn is_valid_escape(&self, at: usize) -> bool {
        self.bytes().get(at) == Some(&b'\\')
            && !matches!(self.bytes().get(at + 1), None | Some(b'\n') | Some(b'\r') | Some(&0x0c))
    }

    fn is_number_start(&self, at: usize) -> bool {
        match self.bytes().get(at) {
            Some(b) if b.is_ascii_digit() => true,
            Some(b'+') | Some(b'-') => match self.bytes().get(at + 1) {
                Some(b) if b.is_ascii_digit() => true,
                Some(b'.') => self
                    .bytes()
                    .get(at + 2)
                    .is_some_and(|b| b.is_ascii_digit()),
                _ => false,
            },
            Some(b'.') => self
                .bytes()
                .get(at + 1)
                .is_some_and(|b| b.is_ascii_digit()),
            _ => false,
        }
    }

    /// Decodes one `\…` escape with the cursor on the backslash.
    fn consume_escape(&mut self) -> Option<char> {
        debug_assert_eq!(self.peek(0), Some(b'\\'));
        self.at += 1;
        let b = self.peek(0)?;
        if b.is_ascii_hexdigit() {
            let mut value: u32 = 0;
            let mut digits = 0;
            while digits < 6 {
                match self.peek(0) {
                    Some(h) if h.is_ascii_hexdigit() => {
                        value = value * 16 + (h as char).to_digit(16).expect("hex digit");
                        self.at += 1;
                        digits += 1;
                    }
                    _ => break,
                }
            }
            // One whitespace after the hex run belongs to the escape.
            if matches!(self.peek(0), Some(b' ' | b'\t' | b'\n' | 0x0c | b'\r')) {
                self.at += 1;
            }
            return Some(match value {
                0 | 0xD800..=0xDFFF => '\u{FFFD}',
                v if v > 0x10FFFF => '\u{FFFD}',
                v => char::from_u32(v).unwrap_or('\u{FFFD}'),
            });
        }
        if matches!(b, b'\n' | b'\r' | 0x0c) {
            // A backslash-newline is only meaningful inside strings; the
            // caller treats this as the end of the name.
            return None;
        }
        let c = self.input[self.at..].chars().next()?;
        self.at += c.len_utf8();
        Some(c)
    }

    /// Reads name characters (with escapes decoded) starting at the
    /// cursor, ASCII-lowercased.
    fn read_name(&mut self) -> String {
        let mut name = String::new();
        loop {
            match self.peek(0) {
                Some(b)
                    if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' =>
                {
                    name.push(b.to_ascii_lowercase() as char);
                    self.at += 1;
                }
                Some(b) if b >= 0x80 => {
                    let c = self.input[self.at..].chars().next().expect("utf-8 boundary");
                    self.at += c.len_utf8();
                    name.push(c);
                }
                Some(b'\\') if self.is_valid_escape(self.at) => {
                    match self.consume_escape() {
                        Some(c) => name.push(c.to_ascii_lowercase()),
                        None => break,
                    }
                }
                _ => break,
            }
        }
        name
    }

    fn lex_ident_like(&mut self) {
        let started_at = self.at;
        let name = self.read_name();

        // An escape that decodes to a leading digit cannot begin an
        // identifier; back-track and let the backslash stand alone.
        if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            self.at = started_at + 1;
            self.push_delim('\\');
            return;
        }
        if name.is_empty() {
            // Defensive: consume one byte so the scan advances.
            let c = self.input[self.at..].chars().next();
            if let Some(c) = c {
                self.at += c.len_utf8();
                self.push_delim(c);
            }
            return;
        }

        if self.peek(0) == Some(b'(') {
            if name == "url" {
                self.at += 1;
                self.lex_url_body();
            } else {
                self.at += 1;
                let index = self.push_token(CssTokenType::Function, &format!("{name}("));
                self.open_brackets.push(index);
            }
            return;
        }

        self.push_token(CssTokenType::Ident, &name);
    }

    fn lex_hash(&mut self) {
        debug_assert_eq!(self.peek(0), Some(b'#'));
        let next_is_name = matches!(
            self.peek(1),
            Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-') || b >= 0x80
        ) || self.is_valid_escape(self.at + 1);
        if !next_is_name {
            self.at += 1;
            self.push_delim('#');
            return;
        }
        self.at += 1;
        let name = self.read_name();
        let kind = if name.bytes().all(|b| b.is_ascii_hexdigit()) {
            CssTokenType::HashUnrestricted
        } else {
            CssTokenType::HashId
        };
        self.push_token(kind, &format!("#{name}"));
    }

    fn lex_string(&mut self, quote: u8) {
        self.at += 1;
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => break,
                Some(b) if b == quote => {
                    self.at += 1;
                    break;
                }
                // An unescaped newline ends the string where it stands.
                Some(b'\n') | Some(b'\r') | Some(0x0c) => break,
                Some(b'\\') => match self.peek(1) {
                    None => {
                        self.at += 1;
                        break;
                    }
                    Some(b'\n') | Some(b'\r') | Some(0x0c) => {
                        // Line continuation.
                        self.at += 2;
                        if self.bytes().get(self.at - 1) == Some(&b'\r')
                            && self.peek(0) == Some(b'\n')
                        {
                            self.at += 1;
                        }
                    }
                    _ => {
                        if let Some(c) = self.consume_escape() {
                            value.push(c);
                        }
                    }
                },
                Some(b) if b < 0x80 => {
                    value.push(b as char);
                    self.at += 1;
                }
                _ => {
                    let c = self.input[self.at..].chars().next().expect("utf-8 boundary");
                    value.push(c);
                    self.at += c.len_utf8();
                }
            }
        }
        let encoded = encode_string(&value);
        self.push_token(CssTokenType::String, &encoded);
    }

    fn lex_url_body(&mut self) {
        // Cursor is just past `url(`.
        while matches!(self.peek(0), Some(b' ' | b'\t' | b'\n' | 0x0c | b'\r')) {
            self.at += 1;
        }
        let mut value = String::new();
        match self.peek(0) {
            Some(quote @ (b'"' | b'\'')) => {
                self.at += 1;
                loop {
                    match self.peek(0) {
                        None => break,
                        Some(b) if b == quote => {
                            self.at += 1;
                            break;
                        }
                        Some(b'\\') => {
                            if let Some(c) = self.consume_escape() {
                                value.push(c);
                            } else {
                                self.at += 1;
                            }
                        }
                        _ => {
                            let c = self.input[self.at..].chars().next().expect("in bounds");
                            value.push(c);
                            self.at += c.len_utf8();
                        }
                    }
                }
            }
            _ => loop {
                match self.peek(0) {
                    None => break,
                    Some(b')') | Some(b' ' | b'\t' | b'\n' | 0x0c | b'\r') => break,
                    Some(b'\\') if self.is_valid_escape(self.at) => {
                        if let Some(c) = self.consume_escape() {
                            value.push(c);
                        }
                    }
                    _ => {
                        let c = self.input[self.at..].chars().next().expect("in bounds");
                        value.push(c);
                        self.at += c.len_utf8();
                    }
                }
            },
        }
        while matches!(self.peek(0), Some(b' ' | b'\t' | b'\n' | 0x0c | b'\r')) {
            self.at += 1;
        }
        if self.peek(0) == Some(b')') {
            self.at += 1;
        }

        let encoded = utf8_percent_encode(&value, URL_ESCAPES).to_string();
        self.push_token(CssTokenType::Url, &format!("url('{encoded}')"));
    }

    fn looks_like_unicode_range(&self) -> bool {
        self.peek(1) == Some(b'+')
            && matches!(self.peek(2), Some(b) if b.is_ascii_hexdigit() || b == b'?')
    }

    fn lex_unicode_range(&mut self) {
        let mut text = String::from("u+");
        self.at += 2;
        let mut digits = 0;
        while digits < 6 {
            match self.peek(0) {
                Some(b) if b.is_ascii_hexdigit() => {
                    text.push(b.to_ascii_lowercase() as char);
                    self.at += 1;
                    digits += 1;
                }
                _ => break,
            }
        }
        if digits < 6 && self.peek(0) == Some(b'?') {
            while digits < 6 && self.peek(0) == Some(b'?') {
                text.push('?');
                self.at += 1;
                digits += 1;
            }
        } else if self.peek(0) == Some(b'-')
            && self.peek(1).is_some_and(|b| b.is_ascii_hexdigit())
        {
            text.push('-');
            self.at += 1;
            let mut end_digits = 0;
            while end_digits < 6 {
                match self.peek(0) {
                    Some(b) if b.is_ascii_hexdigit() => {
                        text.push(b.to_ascii_lowercase() as char);
                        self.at += 1;
                        end_digits += 1;
                    }
                    _ => break,
                }
            }
        }
        self.push_token(CssTokenType::UnicodeRange, &text);
    }

    fn lex_number(&mut self) {
        let mut text = String::new();
        if matches!(self.peek(0), Some(b'+') | Some(b'-')) {
            text.push(self.bytes()[self.at] as char);
            self.at += 1;
        }
        while self.peek(0).is_some_and(|b| b.is_ascii_digit()) {
            text.push(self.bytes()[self.at] as char);
            self.at += 1;
        }
        if self.peek(0) == Some(b'.') && self.peek(1).is_some_and(|b| b.is_ascii_digit()) {
            text.push('.');
            self.at += 1;
            while self.peek(0).is_some_and(|b| b.is_ascii_digit()) {
                text.push(self.bytes()[self.at] as char);
                self.at += 1;
            }
        }
        if matches!(self.peek(0), Some(b'e') | Some(b'E')) {
            let mut exp_at = self.at + 1;
            if matches!(self.bytes().get(exp_at), Some(b'+') | Some(b'-')) {
                exp_at += 1;
            }
            if self.bytes().get(exp_at).is_some_and(|b| b.is_ascii_digit()) {
                text.push('e');
                self.at += 1;
                if matches!(self.peek(0), Some(b'+') | Some(b'-')) {
                    text.push(self.bytes()[self.at] as char);
                    self.at += 1;
                }
                while self.peek(0).is_some_and(|b| b.is_ascii_digit()) {
                    text.push(self.bytes()[self.at] as char);
                    self.at += 1;
                }
            }
        }

        if self.peek(0) == Some(b'%') {
            self.at += 1;
            text.push('%');
            self.push_token(CssTokenType::Percentage, &text);
            return;
        }

        // A unit may follow directly, or across whitespace when it is a
        // well-known suffix ("5 px" is tolerated, "0 auto" is two
        // tokens).
        if self.is_ident_start(self.at) {
            let unit = self.read_name();
            let kind = if is_known_unit(&unit) {
                CssTokenType::Dimension
            } else {
                CssTokenType::BadDimension
            };
            text.push_str(&unit);
            self.push_token(kind, &text);
            return;
        }
        let mut lookahead = self.at;
        while matches!(
            self.bytes().get(lookahead),
            Some(b' ' | b'\t' | b'\n' | 0x0c | b'\r')
        ) {
            lookahead += 1;
        }
        if self.is_ident_start(lookahead) {
            let saved = self.at;
            self.at = lookahead;
            let unit = self.read_name();
            if is_known_unit(&unit) && self.peek(0) != Some(b'(') {
                text.push_str(&unit);
                self.push_token(CssTokenType::Dimension, &text);
                return;
            }
            self.at = saved;
        }

        self.push_token(CssTokenType::Number, &text);
    }
}

/// Re-encodes string content into the fixed single-quoted form.
fn encode_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        let escape = match c {
            '\0' => Some("\\0"),
            '\n' => Some("\\a"),
            '\u{c}' => Some("\\c"),
            '\r' => Some("\\d"),
            '"' => Some("\\22"),
            '&' => Some("\\26"),
            '\'' => Some("\\27"),
            '<' => Some("\\3c"),
            '>' => Some("\\3e"),
            '\\' => Some("\\\\"),
            _ => None,
        };
        match escape {
            Some("\\\\") => out.push_str("\\\\"),
            Some(hex) => {
                out.push_str(hex);
                // A following hex digit, space, or tab would extend the
                // escape; separate them.
                if matches!(chars.peek(), Some(c) if c.is_ascii_hexdigit() || *c == ' ' || *c == '\t')
                {
                    out.push(' ');
                }
            }
            None => out.push(c),
        }
    }
    out.push('\'');
    out
}
