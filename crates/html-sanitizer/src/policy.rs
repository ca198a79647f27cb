//! Element and attribute policies.
//!
//! The event source asks the element policy about every open tag; the
//! default [`Policy`] is allow-list based, so everything not named is
//! dropped. Attribute handling composes: event handlers never pass, URL
//! attributes go through the scheme check, `style` goes through the CSS
//! filter, and a custom [`AttrPolicy`] may be joined in last.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::css::{filter_style, CssSchema};
use crate::event_source::Attr;

/// The element policy's decision for one open tag.
#[derive(Debug, PartialEq, Eq)]
pub enum ElementAction {
    /// Emit the element, under this (possibly rewritten) name.
    Keep(String),
    /// Drop the tag but let its children flow and rebalance.
    DropKeepChildren,
    /// Drop the tag and everything inside it.
    DropWithChildren,
}

pub trait ElementPolicy {
    /// Decides an element's fate; may rewrite the attribute list in
    /// place.
    fn decide(&self, name: &str, attrs: &mut Vec<Attr>) -> ElementAction;
}

/// An element policy that keeps everything untouched. Useful as a
/// baseline and for pipeline tests; it is not a safe default.
pub struct AllowAllElements;

impl ElementPolicy for AllowAllElements {
    fn decide(&self, name: &str, _attrs: &mut Vec<Attr>) -> ElementAction {
        ElementAction::Keep(name.to_string())
    }
}

/// An attribute policy's verdict: the accepted (possibly rewritten)
/// value, or a drop. `Keep(None)` keeps a valueless attribute.
#[derive(Debug, PartialEq, Eq)]
pub enum AttrVerdict {
    Keep(Option<String>),
    Drop,
}

pub trait AttrPolicy {
    fn apply(&self, element: &str, attr: &str, value: Option<&str>) -> AttrVerdict;
}

/// Accepts every attribute unchanged: the identity element of
/// [`join`].
pub struct AcceptIdentity;

impl AttrPolicy for AcceptIdentity {
    fn apply(&self, _element: &str, _attr: &str, value: Option<&str>) -> AttrVerdict {
        AttrVerdict::Keep(value.map(str::to_string))
    }
}

/// Rejects every attribute: the absorbing element of [`join`].
pub struct RejectAll;

impl AttrPolicy for RejectAll {
    fn apply(&self, _element: &str, _attr: &str, _value: Option<&str>) -> AttrVerdict {
        AttrVerdict::Drop
    }
}

/// The order-sensitive composition of two attribute policies. The
/// second policy sees the first's rewritten value; a drop
/// short-circuits.
pub struct JoinedAttrPolicy<A, B> {
    first: A,
    second: B,
}

pub fn join<A: AttrPolicy, B: AttrPolicy>(first: A, second: B) -> JoinedAttrPolicy<A, B> {
    JoinedAttrPolicy { first, second }
}

impl<A: AttrPolicy, B: AttrPolicy> AttrPolicy for JoinedAttrPolicy<A, B> {
    fn apply(&self, element: &str, attr: &str, value: Option<&str>) -> AttrVerdict {
        match self.first.apply(element, attr, value) {
            AttrVerdict::Drop => AttrVerdict::Drop,
            AttrVerdict::Keep(rewritten) => {
                self.second.apply(element, attr, rewritten.as_deref())
            }
        }
    }
}

/// Checks a URL-valued attribute against a scheme allow list.
///
/// Relative and scheme-relative URLs pass. The scheme is read the way a
/// browser would: ASCII whitespace and control characters are ignored,
/// so `java\tscript:` cannot sneak through, and matching is
/// case-insensitive.
pub fn url_has_allowed_scheme(value: &str, allowed_schemes: &FxHashSet<String>) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_ascii_control() && *c != ' ')
        .collect();

    let scheme_end = match cleaned.find(|c| matches!(c, ':' | '/' | '?' | '#')) {
        None => return true,
        Some(at) if cleaned.as_bytes()[at] != b':' => return true,
        Some(at) => at,
    };
    if scheme_end == 0 {
        return false;
    }
    let scheme = cleaned[..scheme_end].to_ascii_lowercase();
    allowed_schemes.contains(&scheme)
}

fn string_set(items: &[&str]) -> FxHashSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// The default allow-list policy.
///
/// Fields are public so a caller can assemble a variant directly, the
/// same way the sets are written below.
pub struct Policy {
    /// Elements that survive at all.
    pub allowed_elements: FxHashSet<String>,
    /// Attributes allowed on every element.
    pub global_attributes: FxHashSet<String>,
    /// Additional attributes allowed per element.
    pub element_attributes: FxHashMap<String, FxHashSet<String>>,
    /// Attributes whose values are URLs and get the scheme check.
    pub url_attributes: FxHashSet<String>,
    pub allowed_schemes: FxHashSet<String>,
    /// Disallowed elements whose children are dropped along with them.
    pub discard_content_elements: FxHashSet<String>,
    /// Whether `style` attributes are filtered or dropped outright.
    pub allow_style_attribute: bool,
    pub css: CssSchema,
    /// A caller-supplied policy applied after the built-in checks.
    pub extra_attr_policy: Option<Box<dyn AttrPolicy + Send + Sync>>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allowed_elements: string_set(&[
                "a", "abbr", "acronym", "address", "article", "aside", "b", "bdi", "bdo",
                "big", "blockquote", "br", "caption", "center", "cite", "code", "col",
                "colgroup", "dd", "del", "details", "dfn", "div", "dl", "dt", "em",
                "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
                "header", "hr", "i", "img", "input", "ins", "kbd", "li", "main", "map",
                "mark", "nav", "ol", "p", "pre", "q", "rp", "rt", "ruby", "s", "samp",
                "section", "small", "span", "strike", "strong", "sub", "summary", "sup",
                "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "tt", "u",
                "ul", "var", "wbr",
            ]),
            global_attributes: string_set(&["class", "dir", "id", "lang", "style", "title"]),
            element_attributes: [
                ("a", vec!["href", "name", "rel"]),
                ("img", vec!["src", "alt", "width", "height"]),
                ("input", vec!["type", "name", "value", "checked", "disabled", "readonly"]),
                ("table", vec!["summary", "width", "cellpadding", "cellspacing"]),
                ("td", vec!["colspan", "rowspan", "abbr", "align", "valign"]),
                ("th", vec!["colspan", "rowspan", "abbr", "align", "valign", "scope"]),
                ("col", vec!["span", "width"]),
                ("colgroup", vec!["span", "width"]),
                ("ol", vec!["start", "reversed", "type"]),
                ("time", vec!["datetime"]),
                ("del", vec!["datetime", "cite"]),
                ("ins", vec!["datetime", "cite"]),
                ("blockquote", vec!["cite"]),
                ("q", vec!["cite"]),
                ("map", vec!["name"]),
                ("details", vec!["open"]),
            ]
            .into_iter()
            .map(|(element, attrs)| (element.to_string(), string_set(&attrs)))
            .collect(),
            url_attributes: string_set(&[
                "href", "src", "cite", "action", "longdesc", "poster", "usemap",
                "formaction", "background",
            ]),
            allowed_schemes: string_set(&["http", "https", "mailto"]),
            discard_content_elements: string_set(&[
                "script", "style", "iframe", "object", "embed", "applet", "title",
                "xmp", "listing", "comment", "plaintext", "noembed", "noframes",
            ]),
            allow_style_attribute: true,
            css: CssSchema::default(),
            extra_attr_policy: None,
        }
    }
}

impl ElementPolicy for Policy {
    fn decide(&self, name: &str, attrs: &mut Vec<Attr>) -> ElementAction {
        // A plaintext element has no close sequence; once open, nothing
        // after it can be represented. It is refused unconditionally.
        if name == "plaintext" {
            return ElementAction::DropWithChildren;
        }
        if !self.allowed_elements.contains(name) {
            return if self.discard_content_elements.contains(name) {
                ElementAction::DropWithChildren
            } else {
                ElementAction::DropKeepChildren
            };
        }
        attrs.retain_mut(|attr| self.keep_attribute(name, attr));
        ElementAction::Keep(name.to_string())
    }
}

impl Policy {
    fn keep_attribute(&self, element: &str, attr: &mut Attr) -> bool {
        let attr_name = attr.name.clone();

        // Event handlers are never negotiable.
        if attr_name.starts_with("on") {
            debug!("stripping event handler attribute {attr_name:?}");
            return false;
        }

        let allowed = self.global_attributes.contains(&attr_name)
            || self
                .element_attributes
                .get(element)
                .is_some_and(|attrs| attrs.contains(&attr_name));
        if !allowed {
            return false;
        }

        if attr_name == "style" {
            if !self.allow_style_attribute {
                return false;
            }
            let filtered = match attr.value.as_deref() {
                Some(css) => filter_style(css, &self.css),
                None => return false,
            };
            if filtered.is_empty() {
                return false;
            }
            attr.value = Some(filtered);
        }

        if self.url_attributes.contains(&attr_name) {
            let Some(value) = attr.value.as_deref() else {
                return false;
            };
            if !url_has_allowed_scheme(value, &self.allowed_schemes) {
                debug!("stripping {attr_name:?} with disallowed URL scheme");
                return false;
            }
        }

        if let Some(extra) = &self.extra_attr_policy {
            match extra.apply(element, &attr_name, attr.value.as_deref()) {
                AttrVerdict::Drop => return false,
                AttrVerdict::Keep(value) => attr.value = value,
            }
        }

        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn schemes() -> FxHashSet<String> {
        string_set(&["http", "https", "mailto"])
    }

    #[test]
    fn url_scheme_checks() {
        let allowed = schemes();
        assert!(url_has_allowed_scheme("https://example.com", &allowed));
        assert!(url_has_allowed_scheme("HTTP://EXAMPLE.COM", &allowed));
        assert!(url_has_allowed_scheme("/relative/path", &allowed));
        assert!(url_has_allowed_scheme("//host/path", &allowed));
        assert!(url_has_allowed_scheme("?query", &allowed));
        assert!(url_has_allowed_scheme("mailto:a@b.c", &allowed));
        assert!(!url_has_allowed_scheme("javascript:alert(1)", &allowed));
        assert!(!url_has_allowed_scheme("JAVASCRIPT:alert(1)", &allowed));
        assert!(!url_has_allowed_scheme("java\tscript:alert(1)", &allowed));
        assert!(!url_has_allowed_scheme("java script:alert(1)", &allowed));
        assert!(!url_has_allowed_scheme(" \u{0}javascript:x", &allowed));
        assert!(!url_has_allowed_scheme("data:text/html;base64,x", &allowed));
        assert!(!url_has_allowed_scheme(":no-scheme", &allowed));
    }

    #[test]
    fn default_policy_drops_script_with_content() {
        let policy = Policy::default();
        let mut attrs = vec![];
        assert_eq!(
            policy.decide("script", &mut attrs),
            ElementAction::DropWithChildren
        );
        assert_eq!(
            policy.decide("marquee", &mut attrs),
            ElementAction::DropKeepChildren
        );
        assert_eq!(
            policy.decide("plaintext", &mut attrs),
            ElementAction::DropWithChildren
        );
    }

    #[test]
    fn default_policy_strips_event_handlers() {
        let policy = Policy::default();
        let mut attrs = vec![
            Attr::new("onclick", Some("evil()".into())),
            Attr::new("title", Some("fine".into())),
        ];
        assert_eq!(
            policy.decide("b", &mut attrs),
            ElementAction::Keep("b".into())
        );
        assert_eq!(attrs, vec![Attr::new("title", Some("fine".into()))]);
    }

    #[test]
    fn default_policy_filters_style() {
        let policy = Policy::default();
        let mut attrs = vec![Attr::new(
            "style",
            Some("color: red; behavior: url(#x)".into()),
        )];
        policy.decide("span", &mut attrs);
        assert_eq!(attrs, vec![Attr::new("style", Some("color:red".into()))]);
    }

    #[test]
    fn style_that_filters_to_nothing_is_dropped() {
        let policy = Policy::default();
        let mut attrs = vec![Attr::new("style", Some("behavior: url(#x)".into()))];
        policy.decide("span", &mut attrs);
        assert!(attrs.is_empty());
    }

    #[test]
    fn join_is_order_sensitive_and_short_circuits() {
        struct Upper;
        impl AttrPolicy for Upper {
            fn apply(&self, _e: &str, _a: &str, value: Option<&str>) -> AttrVerdict {
                AttrVerdict::Keep(value.map(str::to_uppercase))
            }
        }
        struct DropEmpty;
        impl AttrPolicy for DropEmpty {
            fn apply(&self, _e: &str, _a: &str, value: Option<&str>) -> AttrVerdict {
                match value {
                    Some("") | None => AttrVerdict::Drop,
                    other => AttrVerdict::Keep(other.map(str::to_string)),
                }
            }
        }

        let joined = join(Upper, DropEmpty);
        assert_eq!(
            joined.apply("a", "title", Some("x")),
            AttrVerdict::Keep(Some("X".into()))
        );
        assert_eq!(joined.apply("a", "title", Some("")), AttrVerdict::Drop);
    }

    #[test]
    fn identity_and_reject_laws() {
        struct SuffixBang;
        impl AttrPolicy for SuffixBang {
            fn apply(&self, _e: &str, _a: &str, value: Option<&str>) -> AttrVerdict {
                AttrVerdict::Keep(value.map(|v| format!("{v}!")))
            }
        }

        // identity ▷ P == P
        let with_identity = join(AcceptIdentity, SuffixBang);
        assert_eq!(
            with_identity.apply("a", "title", Some("x")),
            SuffixBang.apply("a", "title", Some("x"))
        );
        // P ▷ reject-all == reject-all
        let absorbed = join(SuffixBang, RejectAll);
        assert_eq!(absorbed.apply("a", "title", Some("x")), AttrVerdict::Drop);
        let absorbed = join(RejectAll, SuffixBang);
        assert_eq!(absorbed.apply("a", "title", Some("x")), AttrVerdict::Drop);
    }
}
