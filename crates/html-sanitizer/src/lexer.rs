//! The second tokenization stage: coarse tokens to a refined stream.
//!
//! The splitter does not know what the bare text inside a tag means; this
//! stage does. It runs a four-state machine over each tag's tokens and
//! reclassifies in-tag text as attribute names and values, resolves the
//! unquoted-value forms (`checked`, `checked=`, `title=foo bar`), drops
//! whitespace, and coalesces adjacent text runs outside tags.
//!
//! Lookahead is bounded: at most four tokens are buffered while deciding
//! whether an unquoted value keeps absorbing words, plus a one-token
//! pushback used when a tag end forces an empty synthesized value.

use std::collections::VecDeque;

use crate::input_splitter::{InputSplitter, Token, TokenType};

/// Attributes that commonly appear with no value. A bare word following an
/// unquoted value is the next attribute, not more value, when it is one of
/// these.
const VALUELESS_ATTRIBUTES: &[&[u8]] = &[
    b"checked", b"compact", b"declare", b"defer", b"disabled", b"ismap", b"multiple", b"nohref",
    b"noresize", b"noshade", b"nowrap", b"readonly", b"selected",
];

fn is_valueless_attribute(word: &[u8]) -> bool {
    VALUELESS_ATTRIBUTES
        .iter()
        .any(|name| word.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrState {
    OutsideTag,
    InTag,
    SawName,
    SawEq,
}

pub struct HtmlLexer<'a> {
    splitter: InputSplitter<'a>,
    lookahead: VecDeque<Token>,
    state: AttrState,
}

impl<'a> HtmlLexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            splitter: InputSplitter::new(input),
            lookahead: VecDeque::with_capacity(4),
            state: AttrState::OutsideTag,
        }
    }

    pub fn input(&self) -> &'a [u8] {
        self.splitter.input()
    }

    fn pull(&mut self) -> Option<Token> {
        self.lookahead.pop_front().or_else(|| self.splitter.next())
    }

    fn peek(&mut self, offset: usize) -> Option<Token> {
        while self.lookahead.len() <= offset {
            let token = self.splitter.next()?;
            self.lookahead.push_back(token);
        }
        self.lookahead.get(offset).copied()
    }

    fn push_back(&mut self, token: Token) {
        self.lookahead.push_front(token);
    }

    fn token_text(&self, token: &Token) -> &'a [u8] {
        token.text(self.splitter.input())
    }

    /// Produces the next refined token.
    pub fn next(&mut self) -> Option<Token> {
        loop {
            let token = self.pull()?;
            match self.state {
                AttrState::OutsideTag => match token.kind {
                    TokenType::TagBegin => {
                        self.state = AttrState::InTag;
                        return Some(token);
                    }
                    TokenType::Text | TokenType::Unescaped => {
                        return Some(self.coalesce_text(token));
                    }
                    TokenType::Ignorable => continue,
                    _ => return Some(token),
                },

                AttrState::InTag => match token.kind {
                    TokenType::Text => {
                        if self.token_text(&token) == b"=" {
                            continue;
                        }
                        self.state = AttrState::SawName;
                        return Some(token.retyped(TokenType::AttrName));
                    }
                    TokenType::TagEnd => {
                        self.state = AttrState::OutsideTag;
                        return Some(token);
                    }
                    TokenType::Ignorable | TokenType::QString => continue,
                    _ => return Some(token),
                },

                AttrState::SawName => match token.kind {
                    TokenType::Text => {
                        if self.token_text(&token) == b"=" {
                            self.state = AttrState::SawEq;
                            continue;
                        }
                        // A second name: the previous attribute was
                        // valueless.
                        return Some(token.retyped(TokenType::AttrName));
                    }
                    TokenType::Ignorable => continue,
                    TokenType::TagEnd => {
                        self.state = AttrState::OutsideTag;
                        return Some(token);
                    }
                    _ => {
                        self.state = AttrState::InTag;
                        self.push_back(token);
                        continue;
                    }
                },

                AttrState::SawEq => match token.kind {
                    TokenType::QString => {
                        self.state = AttrState::InTag;
                        return Some(token.retyped(TokenType::AttrValue));
                    }
                    TokenType::Text => {
                        self.state = AttrState::InTag;
                        return Some(self.absorb_unquoted_value(token));
                    }
                    TokenType::TagEnd => {
                        // `checked=` at tag end: the value exists and is
                        // empty, unlike a valueless `checked`.
                        self.state = AttrState::InTag;
                        self.push_back(token);
                        return Some(Token::new(
                            token.start,
                            token.start,
                            TokenType::AttrValue,
                        ));
                    }
                    TokenType::Ignorable => continue,
                    _ => {
                        self.state = AttrState::InTag;
                        self.push_back(token);
                        continue;
                    }
                },
            }
        }
    }

    /// Merges adjacent text tokens of the same kind into one.
    fn coalesce_text(&mut self, mut token: Token) -> Token {
        while let Some(next) = self.peek(0) {
            if next.kind == token.kind && next.start == token.end {
                token.end = next.end;
                self.pull();
            } else {
                break;
            }
        }
        token
    }

    /// Extends an unquoted attribute value across space-separated words.
    ///
    /// `<a title=foo bar>` has the value `foo bar`; the run stops when the
    /// next word is a known valueless attribute, when it is followed by
    /// `=` (it is the next attribute's name), or at the tag end.
    fn absorb_unquoted_value(&mut self, token: Token) -> Token {
        let mut end = token.end;
        loop {
            match self.peek(0) {
                // `this.clicked=true` arrives as three adjacent text
                // tokens; they all belong to the value.
                Some(next) if next.kind == TokenType::Text && next.start == end => {
                    end = next.end;
                    self.pull();
                }
                Some(gap) if gap.kind == TokenType::Ignorable => {
                    let word = match self.peek(1) {
                        Some(t) if t.kind == TokenType::Text => t,
                        _ => break,
                    };
                    let word_text = self.token_text(&word);
                    if word_text == b"=" || is_valueless_attribute(word_text) {
                        break;
                    }
                    if self.word_is_followed_by_eq() {
                        break;
                    }
                    self.pull();
                    self.pull();
                    end = word.end;
                }
                _ => break,
            }
        }
        Token::new(token.start, end, TokenType::AttrValue)
    }

    /// With `[Ignorable, Text(word)]` buffered, checks whether `word` is
    /// followed, possibly across whitespace, by `=`.
    fn word_is_followed_by_eq(&mut self) -> bool {
        let is_eq = |lexer: &Self, t: &Token| {
            t.kind == TokenType::Text && lexer.token_text(t) == b"="
        };
        match self.peek(2) {
            Some(t2) if is_eq(self, &t2) => true,
            Some(t2) if t2.kind == TokenType::Ignorable => {
                matches!(self.peek(3), Some(t3) if is_eq(self, &t3))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn refined(html: &str) -> Vec<(TokenType, String)> {
        let mut lexer = HtmlLexer::new(html.as_bytes());
        let mut out = Vec::new();
        while let Some(token) = lexer.next() {
            out.push((
                token.kind,
                String::from_utf8_lossy(token.text(html.as_bytes())).into_owned(),
            ));
        }
        out
    }

    #[test]
    fn names_and_values() {
        assert_eq!(
            refined("<a href=\"x\" title=foo>"),
            vec![
                (TokenType::TagBegin, "<a".into()),
                (TokenType::AttrName, "href".into()),
                (TokenType::AttrValue, "\"x\"".into()),
                (TokenType::AttrName, "title".into()),
                (TokenType::AttrValue, "foo".into()),
                (TokenType::TagEnd, ">".into()),
            ]
        );
    }

    #[test]
    fn valueless_attribute() {
        assert_eq!(
            refined("<input type=checkbox checked>"),
            vec![
                (TokenType::TagBegin, "<input".into()),
                (TokenType::AttrName, "type".into()),
                (TokenType::AttrValue, "checkbox".into()),
                (TokenType::AttrName, "checked".into()),
                (TokenType::TagEnd, ">".into()),
            ]
        );
    }

    #[test]
    fn empty_value_is_distinct_from_no_value() {
        assert_eq!(
            refined("<input checked=>"),
            vec![
                (TokenType::TagBegin, "<input".into()),
                (TokenType::AttrName, "checked".into()),
                (TokenType::AttrValue, "".into()),
                (TokenType::TagEnd, ">".into()),
            ]
        );
    }

    #[test]
    fn unquoted_value_absorbs_space() {
        assert_eq!(
            refined("<a title=foo bar>"),
            vec![
                (TokenType::TagBegin, "<a".into()),
                (TokenType::AttrName, "title".into()),
                (TokenType::AttrValue, "foo bar".into()),
                (TokenType::TagEnd, ">".into()),
            ]
        );
    }

    #[test]
    fn absorption_stops_at_next_attribute() {
        assert_eq!(
            refined("<a title=foo bar=baz>"),
            vec![
                (TokenType::TagBegin, "<a".into()),
                (TokenType::AttrName, "title".into()),
                (TokenType::AttrValue, "foo".into()),
                (TokenType::AttrName, "bar".into()),
                (TokenType::AttrValue, "baz".into()),
                (TokenType::TagEnd, ">".into()),
            ]
        );
    }

    #[test]
    fn absorption_stops_at_valueless_word() {
        assert_eq!(
            refined("<input value=a checked>"),
            vec![
                (TokenType::TagBegin, "<input".into()),
                (TokenType::AttrName, "value".into()),
                (TokenType::AttrValue, "a".into()),
                (TokenType::AttrName, "checked".into()),
                (TokenType::TagEnd, ">".into()),
            ]
        );
    }

    #[test]
    fn embedded_equals_joins_value() {
        assert_eq!(
            refined("<a onclick=this.clicked=true>"),
            vec![
                (TokenType::TagBegin, "<a".into()),
                (TokenType::AttrName, "onclick".into()),
                (TokenType::AttrValue, "this.clicked=true".into()),
                (TokenType::TagEnd, ">".into()),
            ]
        );
    }

    #[test]
    fn adjacent_text_coalesces() {
        assert_eq!(
            refined("a<3 and b<4"),
            vec![(TokenType::Text, "a<3 and b<4".into())]
        );
    }

    #[test]
    fn spaced_equals_still_binds() {
        assert_eq!(
            refined("<a href = x>"),
            vec![
                (TokenType::TagBegin, "<a".into()),
                (TokenType::AttrName, "href".into()),
                (TokenType::AttrValue, "x".into()),
                (TokenType::TagEnd, ">".into()),
            ]
        );
    }
}
