//! Small byte-string helpers shared by the lexer stages.

/// Finds `pattern` in `s` at or after `offset`.
pub fn strpos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    if pattern.is_empty() {
        return (offset <= s.len()).then_some(offset);
    }
    if pattern.len() == 1 {
        return memchr::memchr(pattern[0], &s[offset.min(s.len())..]).map(|at| offset + at);
    }
    if offset + pattern.len() > s.len() {
        return None;
    }
    s[offset..]
        .windows(pattern.len())
        .position(|w| w == pattern)
        .map(|at| offset + at)
}

/// ASCII-case-insensitive variant of [`strpos`].
pub fn stripos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    if offset + pattern.len() > s.len() {
        return None;
    }
    s[offset..]
        .windows(pattern.len())
        .position(|w| w.eq_ignore_ascii_case(pattern))
        .map(|at| offset + at)
}

/// True for the characters HTML counts as inter-element whitespace.
pub fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0c | b'\r')
}

/// True when `text` consists only of HTML whitespace (or is empty).
pub fn is_all_html_whitespace(text: &[u8]) -> bool {
    text.iter().all(|&b| is_html_whitespace(b))
}

/// Computes the canonical form of an element or attribute name.
///
/// Names are ASCII-lowercased, strictly `A-Z` to `a-z` with no locale
/// involvement. Namespaced names (containing `:`, as SVG and MathML
/// foreign content uses) keep their case so `xlink:href` and friends
/// survive intact.
pub fn canonical_name(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    if text.contains(':') {
        text.into_owned()
    } else {
        text.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strpos_matches() {
        assert_eq!(strpos(b"0123456789", b"5", 0), Some(5));
        assert_eq!(strpos(b"0123456789", b"5", 5), Some(5));
        assert_eq!(strpos(b"0123456789", b"5", 6), None);
        assert_eq!(strpos(b"0123456789", b"89", 0), Some(8));
        assert_eq!(strpos(b"0123456789", b"90", 0), None);
        assert_eq!(strpos(b"aaa", b"", 1), Some(1));
    }

    #[test]
    fn stripos_matches_case_insensitively() {
        assert_eq!(stripos(b"x</SCRIPT>", b"</script", 0), Some(1));
        assert_eq!(stripos(b"x</SCRIPT>", b"</script", 2), None);
    }

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_name(b"DIV"), "div");
        assert_eq!(canonical_name(b"InPut"), "input");
        assert_eq!(canonical_name(b"xlink:HREF"), "xlink:HREF");
    }
}
