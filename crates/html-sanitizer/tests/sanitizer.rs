//! End-to-end sanitizer behavior.

use html_sanitizer::css::CssTokens;
use html_sanitizer::input_splitter::InputSplitter;
use html_sanitizer::{sanitize, Sanitizer};
use pretty_assertions::assert_eq;
use quickcheck_macros::quickcheck;

fn logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn paragraphs_become_siblings() {
    assert_eq!(sanitize("<p>1<p>2"), "<p>1</p><p>2</p>");
}

#[test]
fn adoption_agency_resumes_formatting() {
    assert_eq!(
        sanitize("<b>Foo<i>Bar</b>Baz</i>"),
        "<b>Foo<i>Bar</i></b><i>Baz</i>"
    );
}

#[test]
fn valueless_attribute_is_preserved() {
    assert_eq!(
        sanitize("<input type=checkbox checked>"),
        "<input type=\"checkbox\" checked />"
    );
}

#[test]
fn empty_attribute_value_is_distinct() {
    assert_eq!(
        sanitize("<input type=checkbox checked=>"),
        "<input type=\"checkbox\" checked=\"\" />"
    );
}

#[test]
fn unquoted_value_absorbs_space() {
    assert_eq!(sanitize("<a title=foo bar>x</a>"), "<a title=\"foo bar\">x</a>");
}

#[test]
fn implied_list_item_wraps_paragraph() {
    assert_eq!(sanitize("<ul><p>x</p></ul>"), "<ul><li><p>x</p></li></ul>");
}

#[test]
fn script_is_fully_stripped() {
    assert_eq!(sanitize("<script>alert(1)</script>"), "");
    assert_eq!(sanitize("a<script>alert(1)</script>b"), "ab");
    assert_eq!(
        sanitize("<script>var x = '</scr' + 'ipt>';</script>ok"),
        "ok"
    );
}

#[test]
fn event_handlers_are_stripped() {
    assert_eq!(sanitize("<b onclick=evil>x</b>"), "<b>x</b>");
    assert_eq!(sanitize("<b OnMouseOver=evil>x</b>"), "<b>x</b>");
}

#[test]
fn style_attribute_is_filtered() {
    assert_eq!(
        sanitize("<span style=\"color: red; expression(evil)\">x</span>"),
        "<span style=\"color:red\">x</span>"
    );
    assert_eq!(
        sanitize("<span style=\"background: url(javascript:foo)\">x</span>"),
        "<span>x</span>"
    );
}

#[test]
fn entity_double_encoding_stays_inert() {
    assert_eq!(sanitize("&amp;#x26;"), "&amp;#x26;");
}

#[test]
fn header_close_crosses_levels() {
    assert_eq!(sanitize("<h1>a</h2>"), "<h1>a</h1>");
}

#[test]
fn style_element_is_stripped_with_contents() {
    assert_eq!(sanitize("<style>p { color: red }</style>x"), "x");
}

#[test]
fn javascript_urls_are_stripped() {
    assert_eq!(sanitize("<a href=\"javascript:alert(1)\">x</a>"), "<a>x</a>");
    assert_eq!(
        sanitize("<a href=\"jAvA\tscript:alert(1)\">x</a>"),
        "<a>x</a>"
    );
    assert_eq!(
        sanitize("<a href=\"https://example.com/\">x</a>"),
        "<a href=\"https://example.com/\">x</a>"
    );
    assert_eq!(
        sanitize("<img src=\"javascript:x\" alt=ok>"),
        "<img alt=\"ok\" />"
    );
}

#[test]
fn plaintext_is_refused_entirely() {
    assert_eq!(sanitize("a<plaintext>b<c>d"), "a");
}

#[test]
fn comments_directives_and_server_code_vanish() {
    assert_eq!(
        sanitize("<!DOCTYPE html>a<!-- b --><?php c ?><% d %>e"),
        "ae"
    );
}

#[test]
fn textarea_contents_survive_as_text() {
    // The element itself is not allowed, but its RCDATA text is
    // ordinary content.
    assert_eq!(sanitize("<textarea><b>&amp;</textarea>"), "&lt;b&gt;&amp;");
}

#[test]
fn nesting_limit_bounds_output_depth() {
    let sanitizer = Sanitizer::default().with_nesting_limit(3);
    let deep = format!("{}x{}", "<div>".repeat(10), "</div>".repeat(10));
    let out = sanitizer.sanitize(&deep);
    assert_eq!(out.matches("<div>").count(), 3);
    assert_eq!(out.matches("</div>").count(), 3);
    // Text below the cut-off depth is dropped with its containers.
    assert!(!out.contains('x'));
}

#[test]
fn known_bypass_vectors_are_neutralized() {
    logging();
    for vector in [
        "<scr<script>ipt>alert(1)</scr</script>ipt>",
        "<IMG SRC=JaVaScRiPt:alert('XSS')>",
        "<img src=x onerror=alert(1)>",
        "<svg/onload=alert(1)>",
        "<a href=\"java&#09;script:alert(1)\">x</a>",
        "<b style=\"behavior: url(#default#time2)\">x</b>",
        "<style>@import 'evil.css';</style>",
        "<div style=\"background:url('java\\73 cript:x')\">y</div>",
        "<<script>alert(1)//<</script>",
    ] {
        let out = sanitize(vector).to_ascii_lowercase();
        assert!(!out.contains("<script"), "script survived {vector:?}: {out}");
        assert!(!out.contains("javascript:"), "js url survived {vector:?}: {out}");
        assert!(!out.contains("onerror"), "handler survived {vector:?}: {out}");
        assert!(!out.contains("onload"), "handler survived {vector:?}: {out}");
        assert!(!out.contains("behavior"), "behavior survived {vector:?}: {out}");
        assert!(!out.contains("@import"), "@import survived {vector:?}: {out}");
    }
}

#[test]
fn token_budget_yields_a_balanced_prefix() {
    let sanitizer = Sanitizer::default().with_token_budget(6);
    let out = sanitizer.sanitize("<div><p>one</p><p>two</p></div>tail");
    // The budget covers the first elements and some text; whatever was
    // open gets closed, and no partial tag appears.
    assert_eq!(out, "<div><p>one</p></div>");

    // A generous budget changes nothing.
    let sanitizer = Sanitizer::default().with_token_budget(1_000);
    assert_eq!(
        sanitizer.sanitize("<p>1<p>2"),
        "<p>1</p><p>2</p>"
    );
}

#[quickcheck]
fn sanitization_is_idempotent(input: String) -> bool {
    let once = sanitize(&input);
    sanitize(&once) == once
}

#[quickcheck]
fn splitter_tokens_cover_the_input(input: String) -> bool {
    let bytes = input.as_bytes();
    let mut splitter = InputSplitter::new(bytes);
    let mut at = 0;
    while let Some(token) = splitter.next() {
        if token.start != at || token.end <= token.start {
            return false;
        }
        at = token.end;
    }
    at == bytes.len()
}

#[quickcheck]
fn normalized_css_never_contains_banned_sequences(input: String) -> bool {
    let normalized = CssTokens::lex(&input).normalized().to_ascii_lowercase();
    ["<!--", "-->", "<![cdata[", "]]>", "</style"]
        .iter()
        .all(|banned| !normalized.contains(banned))
}
