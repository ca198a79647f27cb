//! A stream filter that turns arbitrary tag soup into well-nested HTML.
//!
//! The balancer sits between the event source and the output receiver.
//! It never raises on data: ill-nested input is repaired with implied
//! opens, implicit closes, and formatting-element resumption, and the
//! output always satisfies the containment rules of the element table.

pub mod element_table;

use std::collections::VecDeque;

use log::debug;
use thiserror::Error;

use crate::event_source::{Attr, HtmlStreamReceiver};
use crate::str_fns::is_all_html_whitespace;
use element_table::{descriptor, is_header_name, lookup, Groups};

#[derive(Debug, Error)]
pub enum BalancerError {
    /// The nesting limit cannot be moved below the current open depth.
    #[error("nesting limit {limit} is below the current open depth {depth}")]
    NestingLimitBelowDepth { limit: usize, depth: usize },
}

struct OpenElement {
    index: usize,
    /// False once the nesting limit suppressed this element's open tag;
    /// its close is suppressed to match.
    emitted: bool,
    /// Attributes retained for formatting elements so a resumed element
    /// reopens the way it was written.
    attrs: Vec<Attr>,
}

struct ResumeEntry {
    index: usize,
    attrs: Vec<Attr>,
}

/// The balancing filter. Wraps any receiver and forwards a repaired
/// event stream to it.
pub struct TagBalancer<R> {
    sink: R,
    open: Vec<OpenElement>,
    resume: VecDeque<ResumeEntry>,
    nesting_limit: usize,
    /// Number of entries at the top of the stack whose opens were
    /// suppressed by the nesting limit.
    suppressed: usize,
    emitted_depth: usize,
}

impl<R: HtmlStreamReceiver> TagBalancer<R> {
    pub fn new(sink: R) -> Self {
        Self {
            sink,
            open: Vec::new(),
            resume: VecDeque::new(),
            nesting_limit: usize::MAX,
            suppressed: 0,
            emitted_depth: 0,
        }
    }

    pub fn with_nesting_limit(sink: R, limit: usize) -> Self {
        let mut balancer = Self::new(sink);
        balancer.nesting_limit = limit;
        balancer
    }

    /// Reconfigures the nesting limit. Fails when the stack is already
    /// deeper than the requested limit; this is the balancer's only
    /// error surface.
    pub fn set_nesting_limit(&mut self, limit: usize) -> Result<(), BalancerError> {
        if self.open.len() > limit {
            return Err(BalancerError::NestingLimitBelowDepth {
                limit,
                depth: self.open.len(),
            });
        }
        self.nesting_limit = limit;
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.sink
    }

    fn can_emit(&self) -> bool {
        self.suppressed == 0
    }

    /// Whether the open stack, read with transparency, admits content
    /// with the given type bits. An empty stack admits everything, as
    /// does a transparency walk that runs off the top.
    fn stack_accepts(&self, child_types: Groups) -> bool {
        let mut remaining = child_types;
        for entry in self.open.iter().rev() {
            let d = descriptor(entry.index);
            if d.contents.intersects(remaining) {
                return true;
            }
            remaining = remaining.intersection(d.transparent_to_contents);
            if remaining.is_empty() {
                return false;
            }
        }
        true
    }

    /// The chain of implied children, if following the top element's
    /// `block_container_child` links reaches a container that admits the
    /// child (`table` to `tr` to `td` for text, for example).
    fn implied_open_path(&self, child_types: Groups) -> Option<Vec<usize>> {
        let top = self.open.last()?;
        let mut current = top.index;
        let mut path = Vec::new();
        while path.len() < 4 {
            let implied = descriptor(current).block_container_child?;
            path.push(implied);
            if descriptor(implied).contents.intersects(child_types) {
                return Some(path);
            }
            current = implied;
        }
        None
    }

    /// Reopens queued formatting elements that fit both the current
    /// containment and the incoming child, stopping at the first that
    /// does not.
    fn drain_resume_queue(&mut self, child_types: Groups) {
        while let Some(front) = self.resume.front() {
            let index = front.index;
            let d = descriptor(index);
            if self.stack_accepts(d.types) && d.contents.intersects(child_types) {
                let entry = self.resume.pop_front().expect("front exists");
                self.push_open(entry.index, entry.attrs);
            } else {
                break;
            }
        }
    }

    /// Adjusts the stack so the next child with these type bits is legal
    /// on top: resumes formatting elements, opens implied children, and
    /// closes incompatible containers.
    fn prepare_to_insert(&mut self, child_types: Groups) {
        self.drain_resume_queue(child_types);
        loop {
            if self.stack_accepts(child_types) {
                return;
            }
            if let Some(path) = self.implied_open_path(child_types) {
                for index in path {
                    self.push_open(index, Vec::new());
                }
                return;
            }
            if self.open.is_empty() {
                return;
            }
            self.pop_top(true);
        }
    }

    fn push_open(&mut self, index: usize, attrs: Vec<Attr>) {
        let d = descriptor(index);
        let emit = self.can_emit() && self.emitted_depth < self.nesting_limit;
        let stored = if d.resumable { attrs.clone() } else { Vec::new() };
        if emit {
            self.sink.open_tag(d.name, attrs);
            self.emitted_depth += 1;
        } else {
            if self.emitted_depth >= self.nesting_limit && self.suppressed == 0 {
                debug!("nesting limit {} reached; dropping <{}>", self.nesting_limit, d.name);
            }
            self.suppressed += 1;
        }
        self.open.push(OpenElement {
            index,
            emitted: emit,
            attrs: stored,
        });
    }

    /// Pops and closes the top element, optionally parking it on the
    /// resume queue if the adoption agency may reopen it.
    fn pop_top(&mut self, queue_resumable: bool) {
        let Some(entry) = self.open.pop() else {
            return;
        };
        let d = descriptor(entry.index);
        if entry.emitted {
            self.sink.close_tag(d.name);
            self.emitted_depth -= 1;
        } else {
            self.suppressed -= 1;
        }
        if queue_resumable && d.resumable {
            self.resume.push_back(ResumeEntry {
                index: entry.index,
                attrs: entry.attrs,
            });
        }
    }
}

impl<R: HtmlStreamReceiver> HtmlStreamReceiver for TagBalancer<R> {
    fn open_document(&mut self) {
        self.open.clear();
        self.resume.clear();
        self.suppressed = 0;
        self.emitted_depth = 0;
        self.sink.open_document();
    }

    fn close_document(&mut self) {
        while !self.open.is_empty() {
            self.pop_top(false);
        }
        self.resume.clear();
        self.sink.close_document();
    }

    fn open_tag(&mut self, name: &str, attrs: Vec<Attr>) {
        let Some(index) = lookup(name) else {
            // Unknown elements carry no containment data; they are
            // emitted in place and treated as void for the stack.
            if self.can_emit() {
                self.sink.open_tag(name, attrs);
            }
            return;
        };
        let d = descriptor(index);
        self.prepare_to_insert(d.types);
        if d.is_void {
            if self.can_emit() {
                self.sink.open_tag(name, attrs);
            }
        } else {
            self.push_open(index, attrs);
        }
    }

    fn close_tag(&mut self, name: &str) {
        let is_header = is_header_name(name);
        let Some(target) = lookup(name) else {
            // A close for an unknown element is forwarded verbatim.
            if self.can_emit() {
                self.sink.close_tag(name);
            }
            return;
        };
        if descriptor(target).is_void {
            // Void elements never opened anything to close.
            return;
        }

        let blocked_by = descriptor(target).blocked_by_scopes();
        let mut found = None;
        for position in (0..self.open.len()).rev() {
            let d = descriptor(self.open[position].index);
            if self.open[position].index == target || (is_header && is_header_name(d.name)) {
                found = Some(position);
                break;
            }
            if d.in_scopes.intersects(blocked_by) {
                debug!("close tag </{name}> is out of scope at <{}>; dropped", d.name);
                break;
            }
        }

        match found {
            Some(position) => {
                while self.open.len() > position + 1 {
                    self.pop_top(true);
                }
                self.pop_top(false);
            }
            None => {
                // An explicit close for a queued formatting element
                // cancels its pending resumption instead of vanishing.
                if descriptor(target).resumable {
                    if let Some(queued) =
                        self.resume.iter().rposition(|entry| entry.index == target)
                    {
                        self.resume.remove(queued);
                        return;
                    }
                }
                debug!("dropping unmatched close tag </{name}>");
            }
        }
    }

    fn text(&mut self, text: &str) {
        // Inter-element whitespace flows through without opening or
        // closing anything.
        if !is_all_html_whitespace(text.as_bytes()) {
            self.prepare_to_insert(Groups::CHARACTER_DATA);
        }
        if self.can_emit() {
            self.sink.text(text);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl HtmlStreamReceiver for Recorder {
        fn open_tag(&mut self, name: &str, attrs: Vec<Attr>) {
            let mut tag = format!("<{name}");
            for attr in &attrs {
                match &attr.value {
                    Some(value) => tag.push_str(&format!(" {}={}", attr.name, value)),
                    None => tag.push_str(&format!(" {}", attr.name)),
                }
            }
            tag.push('>');
            self.0.push(tag);
        }
        fn close_tag(&mut self, name: &str) {
            self.0.push(format!("</{name}>"));
        }
        fn text(&mut self, text: &str) {
            self.0.push(text.to_string());
        }
    }

    fn run(events: impl FnOnce(&mut TagBalancer<Recorder>)) -> String {
        let mut balancer = TagBalancer::new(Recorder::default());
        balancer.open_document();
        events(&mut balancer);
        balancer.close_document();
        balancer.into_inner().0.concat()
    }

    #[test]
    fn sibling_paragraphs() {
        let out = run(|b| {
            b.open_tag("p", vec![]);
            b.text("1");
            b.open_tag("p", vec![]);
            b.text("2");
        });
        assert_eq!(out, "<p>1</p><p>2</p>");
    }

    #[test]
    fn adoption_agency_resumes_italic() {
        let out = run(|b| {
            b.open_tag("b", vec![]);
            b.text("Foo");
            b.open_tag("i", vec![]);
            b.text("Bar");
            b.close_tag("b");
            b.text("Baz");
            b.close_tag("i");
        });
        assert_eq!(out, "<b>Foo<i>Bar</i></b><i>Baz</i>");
    }

    #[test]
    fn implied_list_item() {
        let out = run(|b| {
            b.open_tag("ul", vec![]);
            b.open_tag("p", vec![]);
            b.text("x");
            b.close_tag("p");
            b.close_tag("ul");
        });
        assert_eq!(out, "<ul><li><p>x</p></li></ul>");
    }

    #[test]
    fn text_in_table_gets_a_cell() {
        let out = run(|b| {
            b.open_tag("table", vec![]);
            b.text("x");
            b.close_tag("table");
        });
        assert_eq!(out, "<table><tr><td>x</td></tr></table>");
    }

    #[test]
    fn header_close_crosses_levels() {
        let out = run(|b| {
            b.open_tag("h1", vec![]);
            b.text("a");
            b.close_tag("h2");
        });
        assert_eq!(out, "<h1>a</h1>");
    }

    #[test]
    fn close_outside_table_scope_is_dropped() {
        let out = run(|b| {
            b.open_tag("div", vec![]);
            b.open_tag("table", vec![]);
            b.close_tag("div");
            b.close_tag("table");
            b.text("x");
        });
        // The </div> cannot reach through the table; the div closes at
        // the document end instead.
        assert_eq!(out, "<div><table></table>x</div>");
    }

    #[test]
    fn unmatched_close_is_dropped() {
        let out = run(|b| {
            b.text("x");
            b.close_tag("div");
        });
        assert_eq!(out, "x");
    }

    #[test]
    fn unknown_elements_pass_through_as_void() {
        let out = run(|b| {
            b.open_tag("custom-widget", vec![]);
            b.text("x");
            b.close_tag("custom-widget");
        });
        assert_eq!(out, "<custom-widget>x</custom-widget>");
    }

    #[test]
    fn close_cancels_queued_resumption() {
        let out = run(|b| {
            b.open_tag("b", vec![]);
            b.open_tag("i", vec![]);
            b.close_tag("b");
            b.close_tag("i");
            b.text("x");
        });
        // The explicit </i> removes the queued italic; the text is bare.
        assert_eq!(out, "<b><i></i></b>x");
    }

    #[test]
    fn resumed_formatting_elements_keep_their_attributes() {
        let out = run(|b| {
            b.open_tag("font", vec![Attr::new("color", Some("red".into()))]);
            b.text("a");
            b.open_tag("p", vec![]);
            b.text("b");
        });
        // The paragraph forces the font closed; the resumed copy carries
        // the original attributes.
        assert_eq!(
            out,
            "<font color=red>a</font><p><font color=red>b</font></p>"
        );
    }

    #[test]
    fn text_in_select_gets_an_option() {
        let out = run(|b| {
            b.open_tag("select", vec![]);
            b.text("pick me");
            b.close_tag("select");
        });
        assert_eq!(out, "<select><option>pick me</option></select>");
    }

    #[test]
    fn definition_list_implies_dd() {
        let out = run(|b| {
            b.open_tag("dl", vec![]);
            b.open_tag("p", vec![]);
            b.text("x");
        });
        assert_eq!(out, "<dl><dd><p>x</p></dd></dl>");
    }

    #[test]
    fn list_items_close_their_siblings() {
        let out = run(|b| {
            b.open_tag("ul", vec![]);
            b.open_tag("li", vec![]);
            b.text("1");
            b.open_tag("li", vec![]);
            b.text("2");
            b.close_tag("ul");
        });
        assert_eq!(out, "<ul><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn table_cells_close_their_siblings() {
        let out = run(|b| {
            b.open_tag("table", vec![]);
            b.open_tag("tr", vec![]);
            b.open_tag("td", vec![]);
            b.text("a");
            b.open_tag("td", vec![]);
            b.text("b");
            b.open_tag("tr", vec![]);
            b.open_tag("td", vec![]);
            b.text("c");
            b.close_tag("table");
        });
        assert_eq!(
            out,
            "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>"
        );
    }

    #[test]
    fn anchors_do_not_nest() {
        let out = run(|b| {
            b.open_tag("a", vec![Attr::new("href", Some("x".into()))]);
            b.text("1");
            b.open_tag("a", vec![Attr::new("href", Some("y".into()))]);
            b.text("2");
        });
        assert_eq!(out, "<a href=x>1</a><a href=y>2</a>");
    }

    #[test]
    fn whitespace_text_does_not_disturb_tables() {
        let out = run(|b| {
            b.open_tag("table", vec![]);
            b.text("\n  ");
            b.open_tag("tr", vec![]);
            b.open_tag("td", vec![]);
            b.text("x");
        });
        assert_eq!(out, "<table>\n  <tr><td>x</td></tr></table>");
    }

    #[test]
    fn nesting_limit_drops_deep_elements() {
        let mut balancer = TagBalancer::with_nesting_limit(Recorder::default(), 2);
        balancer.open_document();
        for _ in 0..4 {
            balancer.open_tag("div", vec![]);
        }
        balancer.text("deep");
        for _ in 0..4 {
            balancer.close_tag("div");
        }
        balancer.text("after");
        balancer.close_document();
        let out = balancer.into_inner().0.concat();
        assert_eq!(out, "<div><div></div></div>after");
    }

    #[test]
    fn nesting_limit_cannot_go_below_depth() {
        let mut balancer = TagBalancer::new(Recorder::default());
        balancer.open_document();
        balancer.open_tag("div", vec![]);
        balancer.open_tag("div", vec![]);
        assert!(balancer.set_nesting_limit(1).is_err());
        assert!(balancer.set_nesting_limit(2).is_ok());
    }

    #[test]
    fn document_end_closes_everything() {
        let out = run(|b| {
            b.open_tag("div", vec![]);
            b.open_tag("ul", vec![]);
            b.open_tag("li", vec![]);
            b.text("x");
        });
        assert_eq!(out, "<div><ul><li>x</li></ul></div>");
    }
}
