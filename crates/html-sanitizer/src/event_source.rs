//! Turns the refined token stream into document events.
//!
//! This is the boundary where byte ranges stop mattering: names are
//! canonicalized, attribute values lose their quotes and their entities,
//! and the policy gets its one chance to allow, rewrite, or drop each
//! element and attribute before anything flows downstream.

use charref::HtmlContext;
use log::debug;
use rustc_hash::FxHashMap;

use crate::input_splitter::{EscapingMode, ExemptElement, Token, TokenType};
use crate::lexer::HtmlLexer;
use crate::policy::{ElementAction, ElementPolicy};
use crate::str_fns::canonical_name;
use crate::tag_balancer::element_table;

/// One attribute: a canonical name and, unless the attribute was written
/// valueless, an entity-decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: Option<String>,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The downstream surface of the event pipeline. The tag balancer
/// implements this on the way in and requires it on the way out, so
/// receivers compose into a chain.
pub trait HtmlStreamReceiver {
    fn open_document(&mut self) {}
    fn close_document(&mut self) {}
    fn open_tag(&mut self, name: &str, attrs: Vec<Attr>);
    fn close_tag(&mut self, name: &str);
    fn text(&mut self, text: &str);
}

/// Drives the lexer and reports ordered events to a receiver, consulting
/// the policy on every tag.
pub struct StreamEventSource<'a, P> {
    lexer: HtmlLexer<'a>,
    policy: &'a P,
    /// Close tags owed to elements the policy dropped, per name.
    suppressed_closes: FxHashMap<String, usize>,
    /// Raw text of a dropped escape-exempt element is pending and must
    /// not surface.
    skip_cdata: bool,
    /// When dropping an element together with its children: the element
    /// name and the nesting count of same-named opens.
    discarding: Option<(String, usize)>,
    /// Refined tokens still allowed before the stream is cut off.
    tokens_remaining: usize,
}

impl<'a, P: ElementPolicy> StreamEventSource<'a, P> {
    pub fn new(input: &'a [u8], policy: &'a P) -> Self {
        Self {
            lexer: HtmlLexer::new(input),
            policy,
            suppressed_closes: FxHashMap::default(),
            skip_cdata: false,
            discarding: None,
            tokens_remaining: usize::MAX,
        }
    }

    /// Caps the number of refined tokens a single call may process.
    /// Past the budget the stream ends early, so the output is a
    /// sanitized prefix followed by the pending closes rather than a
    /// truncated tag.
    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.tokens_remaining = budget;
        self
    }

    fn next_token(&mut self) -> Option<Token> {
        if self.tokens_remaining == 0 {
            debug!("token budget exhausted; ending the document early");
            return None;
        }
        self.tokens_remaining -= 1;
        self.lexer.next()
    }

    /// Consumes the whole input, emitting events in document order.
    pub fn drive<R: HtmlStreamReceiver>(mut self, receiver: &mut R) {
        receiver.open_document();

        while let Some(token) = self.next_token() {
            if self.discarding.is_some() {
                self.step_discarding(token);
                continue;
            }
            match token.kind {
                TokenType::TagBegin => {
                    self.skip_cdata = false;
                    self.handle_tag(token, receiver);
                }
                TokenType::Text => {
                    if !self.skip_cdata {
                        let raw = token.text(self.lexer.input());
                        let decoded = charref::decode(HtmlContext::BodyText, raw);
                        receiver.text(&String::from_utf8_lossy(&decoded));
                    }
                }
                TokenType::Unescaped => {
                    if !self.skip_cdata {
                        let raw = token.text(self.lexer.input());
                        receiver.text(&String::from_utf8_lossy(raw));
                    }
                }
                // Comments, directives, bogus comments, and server-side
                // code have no safe representation in the output.
                _ => {}
            }
        }

        receiver.close_document();
    }

    /// Splits a `TagBegin` token into its closer flag and canonical name.
    fn tag_name(&self, token: &Token) -> (bool, String) {
        let bytes = token.text(self.lexer.input());
        debug_assert!(bytes.starts_with(b"<"));
        if bytes.get(1) == Some(&b'/') {
            (true, canonical_name(&bytes[2..]))
        } else {
            (false, canonical_name(&bytes[1..]))
        }
    }

    fn handle_tag<R: HtmlStreamReceiver>(&mut self, token: Token, receiver: &mut R) {
        let (is_close, name) = self.tag_name(&token);
        let (attrs, complete) = self.collect_tag_rest();

        // A tag the input never finished is not emitted in any form.
        if !complete {
            return;
        }

        if is_close {
            self.handle_close(&name, receiver);
        } else {
            self.handle_open(name, attrs, receiver);
        }
    }

    /// Reads attribute tokens through the tag end. Returns the attributes
    /// (first occurrence of each name wins) and whether the tag actually
    /// ended before the input did.
    fn collect_tag_rest(&mut self) -> (Vec<Attr>, bool) {
        let mut attrs: Vec<Attr> = Vec::new();
        loop {
            let token = match self.next_token() {
                Some(token) => token,
                None => return (attrs, false),
            };
            match token.kind {
                TokenType::AttrName => {
                    let name = canonical_name(token.text(self.lexer.input()));
                    if !attrs.iter().any(|a| a.name == name) {
                        attrs.push(Attr::new(name, None));
                    } else {
                        // Duplicate: parked so a following value token
                        // does not attach to the wrong attribute.
                        attrs.push(Attr::new(String::new(), None));
                    }
                }
                TokenType::AttrValue => {
                    let value = self.decode_attr_value(&token);
                    if let Some(last) = attrs.last_mut() {
                        if last.value.is_none() {
                            last.value = Some(value);
                        }
                    }
                }
                TokenType::TagEnd => {
                    attrs.retain(|a| !a.name.is_empty());
                    return (attrs, true);
                }
                _ => {
                    attrs.retain(|a| !a.name.is_empty());
                    return (attrs, true);
                }
            }
        }
    }

    fn decode_attr_value(&self, token: &Token) -> String {
        let mut raw = token.text(self.lexer.input());
        if let Some(&(quote @ (b'"' | b'\''))) = raw.first() {
            raw = &raw[1..];
            if raw.last() == Some(&quote) {
                raw = &raw[..raw.len() - 1];
            }
        }
        let decoded = charref::decode(HtmlContext::Attribute, raw);
        String::from_utf8_lossy(&decoded).into_owned()
    }

    fn handle_open<R: HtmlStreamReceiver>(
        &mut self,
        name: String,
        mut attrs: Vec<Attr>,
        receiver: &mut R,
    ) {
        let exempt_mode = ExemptElement::from_name(name.as_bytes()).map(|element| element.mode());
        let is_void = element_table::is_void(&name);

        match self.policy.decide(&name, &mut attrs) {
            ElementAction::Keep(final_name) => {
                receiver.open_tag(&final_name, attrs);
            }
            ElementAction::DropKeepChildren => {
                debug!("dropping element {name:?}, keeping children");
                // RCDATA text (a textarea's content) is ordinary text and
                // stays; raw CDATA has no meaning outside its element.
                if matches!(
                    exempt_mode,
                    Some(EscapingMode::Cdata)
                        | Some(EscapingMode::CdataSometimes)
                        | Some(EscapingMode::PlainText)
                ) {
                    self.skip_cdata = true;
                }
                if !is_void {
                    *self.suppressed_closes.entry(name).or_insert(0) += 1;
                }
            }
            ElementAction::DropWithChildren => {
                debug!("dropping element {name:?} and its children");
                if exempt_mode.is_some() {
                    // Raw-text contents arrive as a single text token
                    // followed by the matching close; suppressing both is
                    // enough.
                    self.skip_cdata = true;
                    *self.suppressed_closes.entry(name).or_insert(0) += 1;
                } else if !is_void {
                    self.discarding = Some((name, 1));
                }
            }
        }
    }

    fn handle_close<R: HtmlStreamReceiver>(&mut self, name: &str, receiver: &mut R) {
        if let Some(count) = self.suppressed_closes.get_mut(name) {
            if *count > 0 {
                *count -= 1;
                return;
            }
        }
        receiver.close_tag(name);
    }

    /// Swallows events while inside an element dropped with its children.
    fn step_discarding(&mut self, token: Token) {
        if token.kind != TokenType::TagBegin {
            return;
        }
        let (is_close, name) = self.tag_name(&token);
        let (_, complete) = self.collect_tag_rest();
        let Some((discard_name, mut depth)) = self.discarding.take() else {
            return;
        };
        if name == discard_name && complete {
            if is_close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            } else if !element_table::is_void(&name) {
                depth += 1;
            }
        }
        self.discarding = Some((discard_name, depth));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::policy::AllowAllElements;

    #[derive(Debug, PartialEq)]
    enum Event {
        Open(String, Vec<Attr>),
        Close(String),
        Text(String),
    }

    #[derive(Default)]
    struct Recorder(Vec<Event>);

    impl HtmlStreamReceiver for Recorder {
        fn open_tag(&mut self, name: &str, attrs: Vec<Attr>) {
            self.0.push(Event::Open(name.into(), attrs));
        }
        fn close_tag(&mut self, name: &str) {
            self.0.push(Event::Close(name.into()));
        }
        fn text(&mut self, text: &str) {
            self.0.push(Event::Text(text.into()));
        }
    }

    fn events(html: &str) -> Vec<Event> {
        let policy = AllowAllElements;
        let mut recorder = Recorder::default();
        StreamEventSource::new(html.as_bytes(), &policy).drive(&mut recorder);
        recorder.0
    }

    #[test]
    fn basic_events() {
        assert_eq!(
            events("<P>Hi</P>"),
            vec![
                Event::Open("p".into(), vec![]),
                Event::Text("Hi".into()),
                Event::Close("p".into()),
            ]
        );
    }

    #[test]
    fn attribute_values_are_decoded() {
        assert_eq!(
            events("<a TITLE=\"a&amp;b\" checked>"),
            vec![Event::Open(
                "a".into(),
                vec![
                    Attr::new("title", Some("a&b".into())),
                    Attr::new("checked", None),
                ]
            )]
        );
    }

    #[test]
    fn duplicate_attributes_keep_first() {
        assert_eq!(
            events("<a href=first href=second>"),
            vec![Event::Open(
                "a".into(),
                vec![Attr::new("href", Some("first".into()))]
            )]
        );
    }

    #[test]
    fn text_entities_are_decoded() {
        assert_eq!(events("a &amp;#x26; b"), vec![Event::Text("a &#x26; b".into())]);
    }

    #[test]
    fn incomplete_trailing_tag_is_dropped() {
        assert_eq!(events("ok<a href="), vec![Event::Text("ok".into())]);
    }

    #[test]
    fn comments_and_directives_vanish() {
        assert_eq!(
            events("<!DOCTYPE html>a<!-- b --><?php c ?>"),
            vec![Event::Text("a".into())]
        );
    }
}
