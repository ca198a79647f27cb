//! The element descriptor table: which elements may contain which.
//!
//! Containment is expressed through membership groups rather than
//! per-element pair rules: every element belongs to some groups (its
//! `types`) and admits some groups (its `contents`). The table also
//! carries the per-element facts the balancer needs: transparency,
//! formatting-element resumability, implied children, close-tag scope
//! behavior, and voidness.
//!
//! Descriptors are handles (indices) into one flat vector so the implied
//! child references may form cycles (`dl` implies `dd`, whose content
//! model leads back through the same groups) without any post-build
//! mutation.

use bitflags::bitflags;
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

bitflags! {
    /// Element membership groups.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Groups: u32 {
        const BLOCK = 1 << 0;
        const INLINE = 1 << 1;
        const INLINE_MINUS_A = 1 << 2;
        const MIXED = 1 << 3;
        const TABLE_CONTENT = 1 << 4;
        const HEAD_CONTENT = 1 << 5;
        const TOP_CONTENT = 1 << 6;
        const AREA = 1 << 7;
        const FORM = 1 << 8;
        const LEGEND = 1 << 9;
        const LI = 1 << 10;
        const DL_PART = 1 << 11;
        const P = 1 << 12;
        const OPTIONS = 1 << 13;
        const OPTION = 1 << 14;
        const PARAM = 1 << 15;
        const TABLE = 1 << 16;
        const TR = 1 << 17;
        const TD = 1 << 18;
        const COL = 1 << 19;
        const CHARACTER_DATA = 1 << 20;
    }
}

bitflags! {
    /// Close-tag scope classes.
    ///
    /// An element's `in_scopes` bits are the scope classes it seals as a
    /// boundary; the complement (`blocked_by_scopes`) is used on the
    /// close-target side: a close tag search is trapped at any
    /// intervening element whose `in_scopes` overlaps the target's
    /// `blocked_by_scopes`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Scopes: u8 {
        const COMMON = 1 << 0;
        const BUTTON = 1 << 1;
        const LIST_ITEM = 1 << 2;
        const TABLE = 1 << 3;
    }
}

const fn groups(bits: u32) -> Groups {
    Groups::from_bits_truncate(bits)
}

/// Contents of a generic block-level container.
const FLOW: Groups = groups(
    Groups::BLOCK.bits()
        | Groups::FORM.bits()
        | Groups::INLINE.bits()
        | Groups::MIXED.bits()
        | Groups::CHARACTER_DATA.bits(),
);

/// Contents of a phrasing container.
const PHRASE: Groups = groups(
    Groups::INLINE.bits() | Groups::MIXED.bits() | Groups::CHARACTER_DATA.bits(),
);

/// Types of an inline element other than `a`.
const INLINE_EL: Groups = groups(Groups::INLINE.bits() | Groups::INLINE_MINUS_A.bits());

/// Scope boundary of table cells and object-like containers: everything
/// except the table scope, so `</table>` still reaches out of a cell.
const CELL_SCOPES: Scopes = Scopes::from_bits_truncate(
    Scopes::COMMON.bits() | Scopes::BUTTON.bits() | Scopes::LIST_ITEM.bits(),
);

#[derive(Debug)]
pub struct ElementDescriptor {
    pub name: &'static str,
    /// Groups this element belongs to.
    pub types: Groups,
    /// Groups this element admits as direct content.
    pub contents: Groups,
    /// Groups for which this element defers to its ancestors.
    pub transparent_to_contents: Groups,
    /// Formatting element resumed by the adoption agency after an
    /// implicit close.
    pub resumable: bool,
    /// Implied child opened when content demands it (`ul` implies `li`).
    pub block_container_child: Option<usize>,
    pub in_scopes: Scopes,
    pub is_void: bool,
}

impl ElementDescriptor {
    /// Scope classes whose boundaries trap a close-tag search for this
    /// element.
    pub fn blocked_by_scopes(&self) -> Scopes {
        self.in_scopes.complement()
    }
}

pub struct ElementTable {
    elements: Vec<ElementDescriptor>,
    by_name: FxHashMap<&'static str, usize>,
}

impl ElementTable {
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn descriptor(&self, index: usize) -> &ElementDescriptor {
        &self.elements[index]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

lazy_static! {
    pub static ref ELEMENTS: ElementTable = build();
}

pub fn lookup(name: &str) -> Option<usize> {
    ELEMENTS.lookup(name)
}

pub fn descriptor(index: usize) -> &'static ElementDescriptor {
    ELEMENTS.descriptor(index)
}

/// Whether `name` is a known void element. Unknown names are not void.
pub fn is_void(name: &str) -> bool {
    lookup(name).is_some_and(|idx| descriptor(idx).is_void)
}

/// `h1` through `h6`; close tags for one close the nearest of any level.
pub fn is_header_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 2 && bytes[0] == b'h' && bytes[1].is_ascii_digit() && bytes[1] >= b'1' && bytes[1] <= b'6'
}

struct Def {
    name: &'static str,
    types: Groups,
    contents: Groups,
    transparent: Groups,
    resumable: bool,
    implies: Option<&'static str>,
    scopes: Scopes,
    void: bool,
}

struct Builder {
    defs: Vec<Def>,
}

impl Builder {
    fn new() -> Self {
        Self { defs: Vec::new() }
    }

    fn element(&mut self, name: &'static str, types: Groups, contents: Groups) -> &mut Def {
        self.defs.push(Def {
            name,
            types,
            contents,
            transparent: Groups::empty(),
            resumable: false,
            implies: None,
            scopes: Scopes::empty(),
            void: false,
        });
        self.defs.last_mut().expect("just pushed")
    }

    fn void_element(&mut self, name: &'static str, types: Groups) -> &mut Def {
        let def = self.element(name, types, Groups::empty());
        def.void = true;
        def
    }

    fn finish(self) -> ElementTable {
        let by_name: FxHashMap<&'static str, usize> = self
            .defs
            .iter()
            .enumerate()
            .map(|(index, def)| (def.name, index))
            .collect();
        let elements = self
            .defs
            .iter()
            .map(|def| ElementDescriptor {
                name: def.name,
                types: def.types,
                contents: def.contents,
                transparent_to_contents: def.transparent,
                resumable: def.resumable,
                block_container_child: def.implies.map(|child| {
                    *by_name
                        .get(child)
                        .unwrap_or_else(|| panic!("implied child {child} must be defined"))
                }),
                in_scopes: def.scopes,
                is_void: def.void,
            })
            .collect();
        ElementTable { elements, by_name }
    }
}

impl Def {
    fn transparent(&mut self, to: Groups) -> &mut Self {
        self.transparent = to;
        self
    }

    fn resumable(&mut self) -> &mut Self {
        self.resumable = true;
        self
    }

    fn implies(&mut self, child: &'static str) -> &mut Self {
        self.implies = Some(child);
        self
    }

    fn scopes(&mut self, scopes: Scopes) -> &mut Self {
        self.scopes = scopes;
        self
    }
}

#[rustfmt::skip]
fn build() -> ElementTable {
    let mut b = Builder::new();

    // Document structure.
    b.element("html", Groups::TOP_CONTENT, Groups::TOP_CONTENT).scopes(Scopes::all());
    b.element("head", Groups::TOP_CONTENT, Groups::HEAD_CONTENT);
    b.element("body", Groups::TOP_CONTENT, FLOW);
    b.element("title", Groups::HEAD_CONTENT, Groups::CHARACTER_DATA);
    b.void_element("base", Groups::HEAD_CONTENT);
    b.void_element("link", Groups::HEAD_CONTENT);
    b.void_element("meta", Groups::HEAD_CONTENT);
    b.element("style", Groups::HEAD_CONTENT | Groups::MIXED, Groups::CHARACTER_DATA);
    b.element("script", Groups::HEAD_CONTENT | Groups::MIXED | INLINE_EL, Groups::CHARACTER_DATA);
    b.element("noscript", Groups::BLOCK | INLINE_EL, FLOW);

    // Sectioning and grouping blocks.
    for name in [
        "div", "article", "aside", "footer", "header", "hgroup", "main", "nav",
        "section", "figure", "figcaption", "center", "details", "dialog",
        "blockquote",
    ] {
        b.element(name, Groups::BLOCK, FLOW);
    }
    b.element("address", Groups::BLOCK, PHRASE);
    b.element("summary", Groups::BLOCK, PHRASE);
    b.element("p", Groups::BLOCK | Groups::P, PHRASE);
    for name in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        b.element(name, Groups::BLOCK, PHRASE);
    }
    b.element("pre", Groups::BLOCK, PHRASE);
    b.element("xmp", Groups::BLOCK, Groups::CHARACTER_DATA);
    b.element("listing", Groups::BLOCK, Groups::CHARACTER_DATA);
    b.element("plaintext", Groups::BLOCK, Groups::CHARACTER_DATA);
    b.void_element("hr", Groups::BLOCK);
    b.element("marquee", Groups::BLOCK, FLOW).scopes(CELL_SCOPES);

    // Lists. The implied `li`/`dd` children are what turn `<ul><p>` into
    // `<ul><li><p>`.
    b.element("li", Groups::LI, FLOW);
    b.element("dt", Groups::DL_PART, PHRASE);
    b.element("dd", Groups::DL_PART, FLOW);
    for name in ["ul", "ol", "dir", "menu"] {
        b.element(name, Groups::BLOCK, Groups::LI | Groups::MIXED)
            .implies("li")
            .scopes(Scopes::LIST_ITEM);
    }
    b.element("dl", Groups::BLOCK, Groups::DL_PART | Groups::MIXED).implies("dd");

    // Tables.
    b.element("td", Groups::TD, FLOW).scopes(CELL_SCOPES);
    b.element("th", Groups::TD, FLOW).scopes(CELL_SCOPES);
    b.element("tr", Groups::TABLE_CONTENT | Groups::TR, Groups::TD | Groups::MIXED)
        .implies("td");
    b.element("table", Groups::BLOCK | Groups::TABLE, Groups::TABLE_CONTENT | Groups::FORM)
        .implies("tr")
        .scopes(Scopes::all());
    b.element("caption", Groups::TABLE_CONTENT, PHRASE).scopes(CELL_SCOPES);
    b.void_element("col", Groups::COL);
    b.element("colgroup", Groups::TABLE_CONTENT, Groups::COL);
    for name in ["thead", "tbody", "tfoot"] {
        b.element(name, Groups::TABLE_CONTENT, Groups::TR | Groups::MIXED).implies("tr");
    }

    // Forms and controls. A form admits everything flow does except
    // another form.
    b.element("form", Groups::FORM, FLOW.difference(Groups::FORM));
    b.element("fieldset", Groups::BLOCK, FLOW | Groups::LEGEND);
    b.element("legend", Groups::LEGEND, PHRASE);
    b.element("label", INLINE_EL, PHRASE);
    b.void_element("input", INLINE_EL);
    b.element("button", INLINE_EL, FLOW).scopes(Scopes::BUTTON);
    b.element("option", Groups::OPTION, Groups::CHARACTER_DATA);
    b.element("optgroup", Groups::OPTIONS, Groups::OPTION);
    b.element("select", INLINE_EL, Groups::OPTIONS | Groups::OPTION).implies("option");
    b.element("datalist", INLINE_EL, Groups::OPTION | PHRASE);
    b.element("textarea", INLINE_EL, Groups::CHARACTER_DATA);
    b.element("output", INLINE_EL, PHRASE);
    b.element("progress", INLINE_EL, PHRASE);
    b.element("meter", INLINE_EL, PHRASE);

    // The anchor: inline, cannot contain another anchor, carries block
    // content only where an ancestor already allows it.
    b.element(
        "a",
        Groups::INLINE,
        Groups::INLINE_MINUS_A | Groups::MIXED | Groups::CHARACTER_DATA,
    )
    .transparent(Groups::BLOCK)
    .resumable();

    // Formatting elements the adoption agency resumes.
    for name in [
        "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike",
        "strong", "tt", "u",
    ] {
        b.element(name, INLINE_EL, PHRASE).resumable();
    }

    // Other phrasing elements.
    for name in [
        "abbr", "acronym", "bdi", "bdo", "cite", "data", "dfn", "kbd", "mark",
        "q", "ruby", "rt", "rp", "samp", "span", "sub", "sup", "time", "var",
    ] {
        b.element(name, INLINE_EL, PHRASE);
    }
    b.void_element("br", INLINE_EL);
    b.void_element("wbr", INLINE_EL);
    b.element("ins", Groups::MIXED, PHRASE).transparent(Groups::BLOCK);
    b.element("del", Groups::MIXED, PHRASE).transparent(Groups::BLOCK);

    // Embedded and interactive content.
    b.void_element("img", INLINE_EL);
    b.void_element("embed", INLINE_EL);
    b.void_element("area", Groups::AREA);
    b.void_element("param", Groups::PARAM);
    b.void_element("source", Groups::PARAM);
    b.void_element("track", Groups::PARAM);
    b.void_element("basefont", Groups::HEAD_CONTENT | INLINE_EL);
    b.element("map", INLINE_EL, Groups::AREA | Groups::BLOCK | Groups::MIXED);
    b.element("object", INLINE_EL, FLOW | Groups::PARAM).scopes(CELL_SCOPES);
    b.element("applet", INLINE_EL, FLOW | Groups::PARAM).scopes(CELL_SCOPES);
    b.element("iframe", INLINE_EL, Groups::CHARACTER_DATA);
    b.element("video", INLINE_EL, FLOW | Groups::PARAM);
    b.element("audio", INLINE_EL, FLOW | Groups::PARAM);
    b.element("picture", INLINE_EL, Groups::PARAM | Groups::INLINE | Groups::MIXED);
    b.element("canvas", INLINE_EL, FLOW);

    b.finish()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_is_closed_over_implied_children() {
        for index in 0..ELEMENTS.len() {
            if let Some(child) = descriptor(index).block_container_child {
                assert!(child < ELEMENTS.len());
                // The container must admit its own implied child.
                assert!(
                    descriptor(index)
                        .contents
                        .intersects(descriptor(child).types),
                    "{} must contain its implied child {}",
                    descriptor(index).name,
                    descriptor(child).name,
                );
            }
        }
    }

    #[test]
    fn basic_containment() {
        let p = lookup("p").unwrap();
        let div = lookup("div").unwrap();
        let b_el = lookup("b").unwrap();
        let a = lookup("a").unwrap();

        assert!(descriptor(div).contents.intersects(descriptor(p).types));
        assert!(descriptor(p).contents.intersects(descriptor(b_el).types));
        // No nested paragraphs, no nested anchors.
        assert!(!descriptor(p).contents.intersects(descriptor(p).types));
        assert!(!descriptor(a).contents.intersects(descriptor(a).types));
        // An anchor fits inside bold and vice versa.
        assert!(descriptor(b_el).contents.intersects(descriptor(a).types));
        assert!(descriptor(a).contents.intersects(descriptor(b_el).types));
    }

    #[test]
    fn scope_encoding() {
        let table = lookup("table").unwrap();
        let td = lookup("td").unwrap();
        let b_el = lookup("b").unwrap();

        // A table seals every scope, so generic closes never escape it.
        assert!(descriptor(table)
            .in_scopes
            .intersects(descriptor(b_el).blocked_by_scopes()));
        // A cell does not trap a table-scope search.
        assert!(!descriptor(td)
            .in_scopes
            .intersects(descriptor(table).blocked_by_scopes()));
    }

    #[test]
    fn void_elements() {
        for name in ["br", "img", "hr", "input", "meta", "col", "area"] {
            assert!(is_void(name), "{name} must be void");
        }
        for name in ["div", "span", "script", "li"] {
            assert!(!is_void(name), "{name} must not be void");
        }
    }

    #[test]
    fn header_names() {
        assert!(is_header_name("h1"));
        assert!(is_header_name("h6"));
        assert!(!is_header_name("h7"));
        assert!(!is_header_name("h"));
        assert!(!is_header_name("header"));
    }
}
