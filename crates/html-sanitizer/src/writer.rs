//! The reference output receiver: balanced events back to HTML text.

use crate::encode::{encode_attr_onto, encode_text_onto};
use crate::event_source::{Attr, HtmlStreamReceiver};
use crate::tag_balancer::element_table;

/// Serializes the event stream into a string. Attribute values are
/// always double-quoted, valueless attributes stay bare, and void
/// elements self-close.
#[derive(Default)]
pub struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_html(self) -> String {
        self.out
    }

    /// Attribute names reaching the writer come from policy allow lists,
    /// but a renaming policy could produce anything; names that could
    /// break the tag are skipped rather than trusted.
    fn name_is_writable(name: &str) -> bool {
        !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
    }
}

impl HtmlStreamReceiver for HtmlWriter {
    fn open_tag(&mut self, name: &str, attrs: Vec<Attr>) {
        if !Self::name_is_writable(name) {
            return;
        }
        self.out.push('<');
        self.out.push_str(name);
        for attr in &attrs {
            if !Self::name_is_writable(&attr.name) {
                continue;
            }
            self.out.push(' ');
            self.out.push_str(&attr.name);
            if let Some(value) = &attr.value {
                self.out.push_str("=\"");
                encode_attr_onto(value, &mut self.out);
                self.out.push('"');
            }
        }
        if element_table::is_void(name) {
            self.out.push_str(" />");
        } else {
            self.out.push('>');
        }
    }

    fn close_tag(&mut self, name: &str) {
        if !Self::name_is_writable(name) {
            return;
        }
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn text(&mut self, text: &str) {
        encode_text_onto(text, &mut self.out);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_tags_attributes_and_text() {
        let mut writer = HtmlWriter::new();
        writer.open_tag(
            "a",
            vec![Attr::new("href", Some("http://x/?a=1&b=2".into()))],
        );
        writer.text("1 < 2");
        writer.close_tag("a");
        assert_eq!(
            writer.into_html(),
            "<a href=\"http://x/?a=1&amp;b=2\">1 &lt; 2</a>"
        );
    }

    #[test]
    fn void_elements_self_close() {
        let mut writer = HtmlWriter::new();
        writer.open_tag(
            "input",
            vec![
                Attr::new("type", Some("checkbox".into())),
                Attr::new("checked", None),
            ],
        );
        assert_eq!(
            writer.into_html(),
            "<input type=\"checkbox\" checked />"
        );
    }

    #[test]
    fn hostile_names_are_skipped() {
        let mut writer = HtmlWriter::new();
        writer.open_tag("b", vec![Attr::new("x onmouseover", Some("y".into()))]);
        writer.close_tag("b");
        assert_eq!(writer.into_html(), "<b></b>");
    }
}
