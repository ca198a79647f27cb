//! An HTML sanitizer: untrusted HTML in, safe balanced HTML out.
//!
//! The pipeline is pull-based and single-pass: a coarse byte splitter
//! feeds a reclassifying lexer, the event source turns refined tokens
//! into document events and consults the policy, the tag balancer
//! repairs nesting against the element containment table, and the
//! writer re-encodes everything on the way out. `style` attributes are
//! rewritten through a normalizing CSS tokenizer and property filter.
//!
//! ```
//! let clean = html_sanitizer::sanitize("<p>hi<script>alert(1)</script>");
//! assert_eq!(clean, "<p>hi</p>");
//! ```

mod encode;
mod macros;

pub mod css;
pub mod event_source;
pub mod input_splitter;
pub mod lexer;
pub mod policy;
pub mod str_fns;
pub mod tag_balancer;
pub mod writer;

pub use css::{ConfigError, CssSchema};
pub use event_source::{Attr, HtmlStreamReceiver, StreamEventSource};
pub use policy::{AttrPolicy, AttrVerdict, ElementAction, ElementPolicy, Policy};
pub use tag_balancer::{BalancerError, TagBalancer};
pub use writer::HtmlWriter;

/// Sanitizes a fragment with the default conservative policy.
pub fn sanitize(html: &str) -> String {
    Sanitizer::default().sanitize(html)
}

/// A reusable sanitizer: a policy plus pipeline configuration. The
/// static tables behind it are immutable, so one instance (or many) may
/// serve concurrent callers; each `sanitize` call owns its own token
/// streams.
#[derive(Default)]
pub struct Sanitizer {
    policy: Policy,
    nesting_limit: Option<usize>,
    token_budget: Option<usize>,
}

impl Sanitizer {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            nesting_limit: None,
            token_budget: None,
        }
    }

    /// Caps the depth of open elements in the output; elements past the
    /// limit are dropped, not truncated mid-tag.
    pub fn with_nesting_limit(mut self, limit: usize) -> Self {
        self.nesting_limit = Some(limit);
        self
    }

    /// Caps the number of tokens processed per call. When the budget
    /// runs out the document ends early: the output is the sanitized
    /// prefix followed by all pending close tags, never a partial tag.
    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = Some(budget);
        self
    }

    pub fn sanitize(&self, html: &str) -> String {
        let writer = HtmlWriter::new();
        let mut balancer = match self.nesting_limit {
            Some(limit) => TagBalancer::with_nesting_limit(writer, limit),
            None => TagBalancer::new(writer),
        };
        let mut source = StreamEventSource::new(html.as_bytes(), &self.policy);
        if let Some(budget) = self.token_budget {
            source = source.with_token_budget(budget);
        }
        source.drive(&mut balancer);
        balancer.into_inner().into_html()
    }
}
