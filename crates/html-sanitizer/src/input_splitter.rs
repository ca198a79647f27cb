//! The first tokenization stage: raw bytes to coarse tokens.
//!
//! The splitter walks the document once, in strict forward order, and cuts
//! it into half-open byte ranges. It knows just enough HTML to find tag
//! boundaries: everything context-sensitive about attributes is left to the
//! lexer stage, which reclassifies tokens without re-reading the input.
//!
//! The one piece of real statefulness lives here: escape-exempt blocks.
//! Inside `<script>`, `<style>`, and their relatives, `<` does not open a
//! tag, and the only way out is a matching close tag (or, for `plaintext`,
//! no way at all). Within CDATA blocks the HTML5 "escaping text span"
//! (`<!--` … `-->`) temporarily suppresses the close-tag search; this is
//! what makes `<script>if (a<!--b) { }</script>x</script>` end at the
//! second closer.

use crate::macros::{strcspn, strspn};
use crate::str_fns::strpos;

/// A half-open `[start, end)` range of the original input, classified.
///
/// Tokens are immutable; reclassification makes a new token with the same
/// range and a different type. The input outlives the token stream, so any
/// token can be turned back into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub kind: TokenType,
}

impl Token {
    pub fn new(start: usize, end: usize, kind: TokenType) -> Self {
        Self { start, end, kind }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The bytes this token covers.
    pub fn text<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.start..self.end]
    }

    /// The same range with a different classification.
    pub fn retyped(&self, kind: TokenType) -> Token {
        Token::new(self.start, self.end, kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Character data outside tags, or bare text inside a tag before the
    /// lexer reclassifies it.
    Text,
    /// Character data in which entities are not decoded (CDATA blocks).
    Unescaped,
    /// `<name` or `</name`, through the end of the element name.
    TagBegin,
    /// `>` or `/>`.
    TagEnd,
    /// An attribute name, produced by the lexer.
    AttrName,
    /// An attribute value, produced by the lexer.
    AttrValue,
    /// A quoted string inside a tag, including its quotes.
    QString,
    /// `<!-- … -->`.
    Comment,
    /// `<!…>`, such as a DOCTYPE declaration.
    Directive,
    /// `<%…%>` server-side code.
    ServerCode,
    /// `<?…>` bogus comment.
    QmarkMeta,
    /// Whitespace inside a tag.
    Ignorable,
}

/// How text inside an escape-exempt element is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapingMode {
    /// Normal character data; entities are meaningful.
    Pcdata,
    /// Raw text; no entities, no nested tags.
    Cdata,
    /// Raw text in some user agents; treated as CDATA to be safe.
    CdataSometimes,
    /// Entities are decoded but tags are not recognized.
    Rcdata,
    /// Raw text through the end of the document; there is no close tag.
    PlainText,
    /// The element can never have content.
    Void,
}

/// The fixed set of elements that activate an escape-exempt block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemptElement {
    Script,
    Style,
    Xmp,
    Iframe,
    Listing,
    Plaintext,
    Textarea,
    Title,
    Comment,
}

impl ExemptElement {
    pub fn from_name(name: &[u8]) -> Option<ExemptElement> {
        use ExemptElement::*;
        Some(match name.len() {
            3 if name.eq_ignore_ascii_case(b"xmp") => Xmp,
            5 if name.eq_ignore_ascii_case(b"style") => Style,
            5 if name.eq_ignore_ascii_case(b"title") => Title,
            6 if name.eq_ignore_ascii_case(b"script") => Script,
            6 if name.eq_ignore_ascii_case(b"iframe") => Iframe,
            7 if name.eq_ignore_ascii_case(b"listing") => Listing,
            7 if name.eq_ignore_ascii_case(b"comment") => Comment,
            8 if name.eq_ignore_ascii_case(b"textarea") => Textarea,
            9 if name.eq_ignore_ascii_case(b"plaintext") => Plaintext,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static [u8] {
        match self {
            ExemptElement::Script => b"script",
            ExemptElement::Style => b"style",
            ExemptElement::Xmp => b"xmp",
            ExemptElement::Iframe => b"iframe",
            ExemptElement::Listing => b"listing",
            ExemptElement::Plaintext => b"plaintext",
            ExemptElement::Textarea => b"textarea",
            ExemptElement::Title => b"title",
            ExemptElement::Comment => b"comment",
        }
    }

    pub fn mode(&self) -> EscapingMode {
        match self {
            ExemptElement::Script | ExemptElement::Style | ExemptElement::Iframe => {
                EscapingMode::Cdata
            }
            ExemptElement::Xmp | ExemptElement::Listing | ExemptElement::Comment => {
                EscapingMode::CdataSometimes
            }
            ExemptElement::Textarea | ExemptElement::Title => EscapingMode::Rcdata,
            ExemptElement::Plaintext => EscapingMode::PlainText,
        }
    }

    /// Whether `<!--` opens an escaping text span inside this element.
    pub fn allows_escaping_text_span(&self) -> bool {
        matches!(self, ExemptElement::Script | ExemptElement::Style)
    }
}

/// Coarse tokenizer over a retained byte buffer.
pub struct InputSplitter<'a> {
    input: &'a [u8],
    at: usize,
    /// Inside the angle brackets of a tag.
    in_tag: bool,
    /// Set when an open tag for an exempt element has been seen but its
    /// `>` has not; the block begins at the tag end.
    pending_exempt: Option<ExemptElement>,
    /// The active escape-exempt block, with its escaping-span flag.
    exempt: Option<(ExemptElement, bool)>,
}

impl<'a> InputSplitter<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            at: 0,
            in_tag: false,
            pending_exempt: None,
            exempt: None,
        }
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Produces the next coarse token, or `None` at end of input.
    pub fn next(&mut self) -> Option<Token> {
        if self.at >= self.input.len() {
            return None;
        }
        if self.exempt.is_some() {
            return Some(self.next_in_exempt());
        }
        if self.in_tag {
            Some(self.next_in_tag())
        } else {
            Some(self.next_outside_tag())
        }
    }

    fn emit(&mut self, end: usize, kind: TokenType) -> Token {
        let token = Token::new(self.at, end, kind);
        self.at = end;
        token
    }

    fn next_outside_tag(&mut self) -> Token {
        let input = self.input;
        let at = self.at;
        let len = input.len();

        if input[at] != b'<' {
            return self.scan_text();
        }

        match input.get(at + 1).copied() {
            Some(b) if b.is_ascii_alphabetic() => {
                // Start tag. The name runs until whitespace, `>`, `/`, or
                // another `<`.
                let name_start = at + 1;
                let name_len = strcspn!(
                    input,
                    b' ' | b'\t' | b'\n' | 0x0c | b'\r' | b'>' | b'/' | b'<',
                    name_start
                );
                self.in_tag = true;
                self.pending_exempt = ExemptElement::from_name(&input[name_start..name_start + name_len]);
                self.emit(name_start + name_len, TokenType::TagBegin)
            }

            Some(b'/') if input.get(at + 2).is_some_and(|b| b.is_ascii_alphabetic()) => {
                let name_start = at + 2;
                let name_len = strcspn!(
                    input,
                    b' ' | b'\t' | b'\n' | 0x0c | b'\r' | b'>' | b'/' | b'<',
                    name_start
                );
                self.in_tag = true;
                self.emit(name_start + name_len, TokenType::TagBegin)
            }

            Some(b'!') => {
                if input[at..].starts_with(b"<!--") {
                    let end = match strpos(input, b"-->", at + 4) {
                        Some(close) => close + 3,
                        None => len,
                    };
                    self.emit(end, TokenType::Comment)
                } else {
                    let end = match strpos(input, b">", at + 2) {
                        Some(close) => close + 1,
                        None => len,
                    };
                    self.emit(end, TokenType::Directive)
                }
            }

            Some(b'?') => {
                let end = match strpos(input, b">", at + 2) {
                    Some(close) => close + 1,
                    None => len,
                };
                self.emit(end, TokenType::QmarkMeta)
            }

            Some(b'%') => {
                let end = match strpos(input, b"%>", at + 2) {
                    Some(close) => close + 2,
                    None => len,
                };
                self.emit(end, TokenType::ServerCode)
            }

            // `</` with no letter is a bogus comment through the next `>`.
            Some(b'/') => {
                let end = match strpos(input, b">", at + 2) {
                    Some(close) => close + 1,
                    None => len,
                };
                self.emit(end, TokenType::QmarkMeta)
            }

            // `<3`, `<<`, or a trailing `<`: plaintext.
            _ => self.scan_text(),
        }
    }

    /// Coalesces everything up to the next `<` that can begin a token.
    fn scan_text(&mut self) -> Token {
        let input = self.input;
        let len = input.len();
        let start = self.at;
        let mut p = if input[start] == b'<' { start + 1 } else { start };

        loop {
            p += strcspn!(input, b'<', p);
            if p >= len || self.starts_construct(p) {
                break;
            }
            p += 1;
        }

        self.emit(p, TokenType::Text)
    }

    fn starts_construct(&self, at: usize) -> bool {
        debug_assert_eq!(self.input[at], b'<');
        matches!(
            self.input.get(at + 1).copied(),
            Some(b) if b.is_ascii_alphabetic() || matches!(b, b'!' | b'/' | b'?' | b'%')
        )
    }

    fn next_in_tag(&mut self) -> Token {
        let input = self.input;
        let at = self.at;
        let len = input.len();

        match input[at] {
            b'>' => {
                self.end_tag();
                self.emit(at + 1, TokenType::TagEnd)
            }

            b'/' if input.get(at + 1) == Some(&b'>') => {
                self.end_tag();
                self.emit(at + 2, TokenType::TagEnd)
            }

            quote @ (b'"' | b'\'') => {
                let end = match strpos(input, &[quote], at + 1) {
                    Some(close) => close + 1,
                    None => len,
                };
                self.emit(end, TokenType::QString)
            }

            b'=' => self.emit(at + 1, TokenType::Text),

            b' ' | b'\t' | b'\n' | 0x0c | b'\r' => {
                let run = strspn!(input, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at);
                self.emit(at + run, TokenType::Ignorable)
            }

            _ => {
                // An unquoted run: anything but whitespace, `>`, and `=`,
                // stopping before `/>`. An embedded quote followed by
                // whitespace, `>`, or `/` ends the run and is consumed
                // with it.
                let mut p = at;
                while p < len {
                    match input[p] {
                        b' ' | b'\t' | b'\n' | 0x0c | b'\r' | b'>' | b'=' => break,
                        b'/' if input.get(p + 1) == Some(&b'>') => break,
                        b'"' | b'\'' if p > at => match input.get(p + 1) {
                            None => {
                                p += 1;
                                break;
                            }
                            Some(&n) if matches!(n, b' ' | b'\t' | b'\n' | 0x0c | b'\r' | b'>' | b'/') => {
                                p += 1;
                                break;
                            }
                            Some(_) => p += 1,
                        },
                        _ => p += 1,
                    }
                }
                self.emit(p, TokenType::Text)
            }
        }
    }

    /// Leaves the in-tag state and, if the tag that just closed was an
    /// escape-exempt opener, arms the exempt block. The self-closing form
    /// has no effect on these elements: `<script/>` still opens script
    /// data.
    fn end_tag(&mut self) {
        self.in_tag = false;
        if let Some(element) = self.pending_exempt.take() {
            self.exempt = Some((element, false));
        }
    }

    fn next_in_exempt(&mut self) -> Token {
        let input = self.input;
        let len = input.len();
        let start = self.at;
        let (element, mut in_span) = self.exempt.expect("exempt context must be set here");

        if element.mode() == EscapingMode::PlainText {
            // There is no close sequence; the rest of the document is text.
            return self.emit(len, TokenType::Unescaped);
        }

        let text_kind = if element.mode() == EscapingMode::Rcdata {
            TokenType::Text
        } else {
            TokenType::Unescaped
        };

        let mut p = start;
        while p < len {
            if in_span {
                match strpos(input, b"-->", p) {
                    Some(close) => {
                        in_span = false;
                        p = close + 3;
                    }
                    None => p = len,
                }
                continue;
            }

            let q = match memchr::memchr(b'<', &input[p..]) {
                Some(rel) => p + rel,
                None => {
                    p = len;
                    break;
                }
            };

            if self.matches_exempt_close(q, element) {
                if q > start {
                    self.exempt = Some((element, in_span));
                    return self.emit(q, text_kind);
                }
                // The close tag itself: `</name` becomes a TagBegin and
                // ordinary in-tag scanning resumes.
                self.exempt = None;
                self.in_tag = true;
                return self.emit(q + 2 + element.name().len(), TokenType::TagBegin);
            }

            if input.get(q + 1) == Some(&b'%') {
                if q > start {
                    self.exempt = Some((element, in_span));
                    return self.emit(q, text_kind);
                }
                let end = match strpos(input, b"%>", q + 2) {
                    Some(close) => close + 2,
                    None => len,
                };
                self.exempt = Some((element, in_span));
                return self.emit(end, TokenType::ServerCode);
            }

            if element.allows_escaping_text_span() && input[q..].starts_with(b"<!--") {
                in_span = true;
                p = q + 4;
                continue;
            }

            p = q + 1;
        }

        self.exempt = Some((element, in_span));
        self.emit(p, text_kind)
    }

    /// True when `</name` appears at `at` with a tag-name terminator after
    /// it, so `</textarearug` does not close a `textarea`.
    fn matches_exempt_close(&self, at: usize, element: ExemptElement) -> bool {
        let input = self.input;
        let name = element.name();
        if input.get(at) != Some(&b'<') || input.get(at + 1) != Some(&b'/') {
            return false;
        }
        let name_end = at + 2 + name.len();
        if name_end > input.len() {
            return false;
        }
        if !input[at + 2..name_end].eq_ignore_ascii_case(name) {
            return false;
        }
        match input.get(name_end) {
            None => true,
            Some(&b) => matches!(b, b' ' | b'\t' | b'\n' | 0x0c | b'\r' | b'>' | b'/'),
        }
    }
}
