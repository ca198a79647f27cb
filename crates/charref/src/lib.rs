//! HTML character-reference decoding.
//!
//! Decodes named references (`&amp;`, `&notin;`, legacy semicolon-less
//! forms) and numeric references (`&#38;`, `&#x26;`) the way an HTML5
//! tokenizer does, including the ambiguous-ampersand rule for attribute
//! values and the Windows-1252 remapping of numeric references into the C1
//! control range.

use std::borrow::Cow;

use lazy_static::lazy_static;

mod trie;

pub use trie::Trie;

/// U+FFFD REPLACEMENT CHARACTER.
const REPLACEMENT: char = '\u{FFFD}';

lazy_static! {
    /// Named references keyed without the leading `&`. Keys for references
    /// that require a terminating semicolon include it; legacy forms that
    /// decode without one appear as their own shorter keys, so a
    /// longest-match walk picks the right form.
    static ref NAMED: Trie<&'static str> = {
        let mut trie = Trie::new();
        for entity in entities::ENTITIES.iter() {
            trie.insert(entity.entity[1..].as_bytes(), entity.characters);
        }
        trie
    };
}

/// Where the text being decoded appeared in the document.
///
/// The ambiguous-ampersand rule only applies inside attribute values: a
/// legacy reference with no semicolon followed by an alphanumeric or `=`
/// is left intact there (`?q=you&lang=en` keeps its `&lang`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlContext {
    Attribute,
    BodyText,
    /// RCDATA element text (`<title>`, `<textarea>`).
    Rcdata,
}

/// A single decoded character reference.
#[derive(Debug, PartialEq, Eq)]
pub enum CharRef {
    /// A named reference; expansion may be more than one character.
    Named(&'static str),
    /// A numeric reference.
    Codepoint(char),
}

impl CharRef {
    fn push_onto(&self, out: &mut Vec<u8>) {
        match self {
            CharRef::Named(expansion) => out.extend_from_slice(expansion.as_bytes()),
            CharRef::Codepoint(c) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}

/// Decodes every character reference in `input`.
///
/// Returns the input unchanged (and unallocated) when it contains no `&`.
pub fn decode(ctx: HtmlContext, input: &[u8]) -> Cow<'_, [u8]> {
    let mut first = match memchr::memchr(b'&', input) {
        Some(at) => at,
        None => return Cow::Borrowed(input),
    };

    let mut decoded: Vec<u8> = Vec::with_capacity(input.len());
    let mut was_at = 0;

    loop {
        let at = first;
        if let Some((char_ref, token_len)) = next_reference(ctx, input, at) {
            decoded.extend_from_slice(&input[was_at..at]);
            char_ref.push_onto(&mut decoded);
            was_at = at + token_len;
            first = match memchr::memchr(b'&', &input[was_at..]) {
                Some(rel) => was_at + rel,
                None => break,
            };
        } else {
            first = match memchr::memchr(b'&', &input[at + 1..]) {
                Some(rel) => at + 1 + rel,
                None => break,
            };
        }
    }

    decoded.extend_from_slice(&input[was_at..]);
    Cow::Owned(decoded)
}

/// Convenience form of [`decode`] for UTF-8 text.
pub fn decode_to_string(ctx: HtmlContext, input: &str) -> String {
    match decode(ctx, input.as_bytes()) {
        Cow::Borrowed(_) => input.to_string(),
        Cow::Owned(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Decodes the character reference starting at `input[offset]`, if one
/// starts there. Returns the reference and the byte length of its source
/// form, including the `&`.
pub fn next_reference(ctx: HtmlContext, input: &[u8], offset: usize) -> Option<(CharRef, usize)> {
    if offset >= input.len() || input[offset] != b'&' {
        return None;
    }

    let rest = &input[offset + 1..];
    if rest.first() == Some(&b'#') {
        return decode_numeric(rest).map(|(c, len)| (CharRef::Codepoint(c), len + 1));
    }

    let (name_len, expansion) = NAMED.longest_match(rest)?;

    if ctx == HtmlContext::Attribute && rest[name_len - 1] != b';' {
        // Ambiguous ampersand: `&param=x` style text must survive.
        match rest.get(name_len) {
            Some(b) if b.is_ascii_alphanumeric() || *b == b'=' => return None,
            _ => {}
        }
    }

    Some((CharRef::Named(expansion), name_len + 1))
}

/// Replacements for numeric references into `0x80..=0x9F`, which HTML5
/// interprets as Windows-1252 rather than C1 controls.
static CP1252_REPLACEMENTS: [u32; 32] = [
    0x20AC, // 0x80 -> EURO SIGN.
    0x81,   // 0x81 -> (no change).
    0x201A, // 0x82 -> SINGLE LOW-9 QUOTATION MARK.
    0x0192, // 0x83 -> LATIN SMALL LETTER F WITH HOOK.
    0x201E, // 0x84 -> DOUBLE LOW-9 QUOTATION MARK.
    0x2026, // 0x85 -> HORIZONTAL ELLIPSIS.
    0x2020, // 0x86 -> DAGGER.
    0x2021, // 0x87 -> DOUBLE DAGGER.
    0x02C6, // 0x88 -> MODIFIER LETTER CIRCUMFLEX ACCENT.
    0x2030, // 0x89 -> PER MILLE SIGN.
    0x0160, // 0x8A -> LATIN CAPITAL LETTER S WITH CARON.
    0x2039, // 0x8B -> SINGLE LEFT-POINTING ANGLE QUOTATION MARK.
    0x0152, // 0x8C -> LATIN CAPITAL LIGATURE OE.
    0x8D,   // 0x8D -> (no change).
    0x017D, // 0x8E -> LATIN CAPITAL LETTER Z WITH CARON.
    0x8F,   // 0x8F -> (no change).
    0x90,   // 0x90 -> (no change).
    0x2018, // 0x91 -> LEFT SINGLE QUOTATION MARK.
    0x2019, // 0x92 -> RIGHT SINGLE QUOTATION MARK.
    0x201C, // 0x93 -> LEFT DOUBLE QUOTATION MARK.
    0x201D, // 0x94 -> RIGHT DOUBLE QUOTATION MARK.
    0x2022, // 0x95 -> BULLET.
    0x2013, // 0x96 -> EN DASH.
    0x2014, // 0x97 -> EM DASH.
    0x02DC, // 0x98 -> SMALL TILDE.
    0x2122, // 0x99 -> TRADE MARK SIGN.
    0x0161, // 0x9A -> LATIN SMALL LETTER S WITH CARON.
    0x203A, // 0x9B -> SINGLE RIGHT-POINTING ANGLE QUOTATION MARK.
    0x0153, // 0x9C -> LATIN SMALL LIGATURE OE.
    0x9D,   // 0x9D -> (no change).
    0x017E, // 0x9E -> LATIN SMALL LETTER Z WITH CARON.
    0x0178, // 0x9F -> LATIN CAPITAL LETTER Y WITH DIAERESIS.
];

/// Decodes `#38;`, `#x26;`, and friends. `rest` starts at the `#`; the
/// returned length covers everything from the `#` through the final
/// consumed byte.
fn decode_numeric(rest: &[u8]) -> Option<(char, usize)> {
    let mut at = 1;
    let radix: u32 = match rest.get(at) {
        Some(b'x') | Some(b'X') => {
            at += 1;
            16
        }
        _ => 10,
    };

    let digits_start = at;
    let mut value: u32 = 0;
    while let Some(&b) = rest.get(at) {
        let digit = match (b as char).to_digit(radix) {
            Some(d) => d,
            None => break,
        };
        // Saturate rather than overflow; anything past U+10FFFF is
        // replaced below no matter how many digits follow.
        value = value.saturating_mul(radix).saturating_add(digit);
        at += 1;
    }
    if at == digits_start {
        return None;
    }
    if rest.get(at) == Some(&b';') {
        at += 1;
    }

    let c = match value {
        0 => REPLACEMENT,
        0x80..=0x9F => {
            char::from_u32(CP1252_REPLACEMENTS[(value - 0x80) as usize]).unwrap_or(REPLACEMENT)
        }
        0xD800..=0xDFFF => REPLACEMENT,
        v if v > 0x10FFFF => REPLACEMENT,
        // C0 controls other than whitespace have no textual meaning and
        // are replaced rather than smuggled through.
        v if v < 0x20 && !matches!(v, 0x09 | 0x0A | 0x0C | 0x0D) => REPLACEMENT,
        v => char::from_u32(v).unwrap_or(REPLACEMENT),
    };

    Some((c, at))
}
