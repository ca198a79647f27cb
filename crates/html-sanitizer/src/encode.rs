//! HTML output encoding.

/// Appends `text` with the characters that are dangerous in character
/// data replaced by references. NUL becomes U+FFFD.
pub fn encode_text_onto(text: &str, out: &mut String) {
    encode_onto(text, false, out);
}

/// Appends `text` for use inside a double-quoted attribute value; quotes
/// of both kinds are encoded as well.
pub fn encode_attr_onto(text: &str, out: &mut String) {
    encode_onto(text, true, out);
}

fn encode_onto(text: &str, in_attribute: bool, out: &mut String) {
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut index = 0;

    while index < bytes.len() {
        let replacement = match bytes[index] {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'\0' => "\u{FFFD}",
            b'"' if in_attribute => "&#34;",
            b'\'' if in_attribute => "&#39;",
            _ => {
                index += 1;
                continue;
            }
        };
        out.push_str(&text[start..index]);
        out.push_str(replacement);
        index += 1;
        start = index;
    }

    out.push_str(&text[start..]);
}
