//! The CSS property whitelist.
//!
//! Each property maps to the token classes it accepts, the literal
//! keywords it allows, and the functions whose arguments it admits (each
//! function pointing at another schema key for its argument rules). The
//! table is data; the enforcement lives in the property filter.

use bitflags::bitflags;
use phf::phf_map;
use rustc_hash::FxHashSet;
use thiserror::Error;

bitflags! {
    /// Token classes a property may accept beyond its literal keywords.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CssBits: u8 {
        const QUANTITY = 1 << 0;
        const HASH_VALUE = 1 << 1;
        const NEGATIVE = 1 << 2;
        const STRING = 1 << 3;
        const URL = 1 << 4;
        const UNRESERVED_WORD = 1 << 5;
        const UNICODE_RANGE = 1 << 6;
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A custom whitelist named a property the schema does not know.
    #[error("unknown CSS property {0:?}")]
    UnknownCssProperty(String),
}

#[derive(Debug)]
pub struct CssPropertyDef {
    pub bits: CssBits,
    pub literals: &'static [&'static str],
    /// `(function name, schema key for its arguments)` pairs.
    pub fn_keys: &'static [(&'static str, &'static str)],
}

impl CssPropertyDef {
    pub fn allows_literal(&self, text: &str) -> bool {
        self.literals.contains(&text)
    }

    pub fn function_key(&self, name: &str) -> Option<&'static str> {
        self.fn_keys
            .iter()
            .find(|(function, _)| *function == name)
            .map(|&(_, key)| key)
    }
}

const NONE: CssBits = CssBits::empty();
const Q: CssBits = CssBits::QUANTITY;
const QN: CssBits = CssBits::QUANTITY.union(CssBits::NEGATIVE);
const C: CssBits = CssBits::HASH_VALUE;
const CQ: CssBits = C.union(Q);
const CQN: CssBits = C.union(QN);
const WORDS: CssBits = CssBits::UNRESERVED_WORD.union(CssBits::STRING);

const COLOR_FNS: &[(&str, &str)] = &[
    ("rgb", "rgb()"),
    ("rgba", "rgba()"),
    ("hsl", "hsl()"),
    ("hsla", "hsla()"),
];

const TRANSFORM_FNS: &[(&str, &str)] = &[
    ("matrix", "transform-fn()"),
    ("translate", "transform-fn()"),
    ("translatex", "transform-fn()"),
    ("translatey", "transform-fn()"),
    ("scale", "transform-fn()"),
    ("scalex", "transform-fn()"),
    ("scaley", "transform-fn()"),
    ("rotate", "transform-fn()"),
    ("skew", "transform-fn()"),
    ("skewx", "transform-fn()"),
    ("skewy", "transform-fn()"),
];

const COLORS: &[&str] = &[
    "aqua", "black", "blue", "fuchsia", "gray", "grey", "green", "lime", "maroon", "navy",
    "olive", "orange", "purple", "red", "silver", "teal", "white", "yellow", "aliceblue",
    "beige", "brown", "chocolate", "coral", "crimson", "cyan", "darkblue", "darkgray",
    "darkgreen", "darkred", "gold", "indigo", "ivory", "khaki", "lavender", "lightblue",
    "lightgray", "lightgreen", "lightyellow", "magenta", "pink", "plum", "salmon", "skyblue",
    "snow", "tan", "tomato", "turquoise", "violet", "wheat", "transparent", "currentcolor",
];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset",
    "outset",
];

const BORDER_WIDTHS: &[&str] = &["thin", "medium", "thick"];

const FONT_GENERIC: &[&str] = &[
    ",", "serif", "sans-serif", "monospace", "cursive", "fantasy", "system-ui",
];

const FONT_SIZES: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "smaller",
    "larger",
];

const ALIGNMENTS: &[&str] = &[
    "flex-start", "flex-end", "center", "space-between", "space-around", "space-evenly",
    "stretch", "baseline", "start", "end",
];

const LIST_MARKERS: &[&str] = &[
    "none", "disc", "circle", "square", "decimal", "decimal-leading-zero", "lower-alpha",
    "upper-alpha", "lower-latin", "upper-latin", "lower-roman", "upper-roman", "lower-greek",
    "inside", "outside",
];

macro_rules! color_property {
    () => {
        CssPropertyDef {
            bits: C,
            literals: COLORS,
            fn_keys: COLOR_FNS,
        }
    };
}

static DEFAULT_PROPERTIES: phf::Map<&'static str, CssPropertyDef> = phf_map! {
    // Color-valued properties.
    "color" => color_property!(),
    "background-color" => color_property!(),
    "border-color" => color_property!(),
    "border-top-color" => color_property!(),
    "border-right-color" => color_property!(),
    "border-bottom-color" => color_property!(),
    "border-left-color" => color_property!(),
    "outline-color" => color_property!(),
    "text-decoration-color" => color_property!(),
    "caret-color" => color_property!(),
    "column-rule-color" => color_property!(),

    "background" => CssPropertyDef {
        bits: CQN,
        literals: &[
            ",", "/", "aqua", "black", "blue", "fuchsia", "gray", "grey", "green", "lime",
            "maroon", "navy", "olive", "orange", "purple", "red", "silver", "teal", "white",
            "yellow", "transparent", "currentcolor", "repeat", "repeat-x", "repeat-y",
            "no-repeat", "fixed", "scroll", "local", "center", "top", "bottom", "left",
            "right", "cover", "contain", "border-box", "padding-box", "content-box", "none",
        ],
        fn_keys: COLOR_FNS,
    },
    "background-image" => CssPropertyDef { bits: CssBits::URL, literals: &["none", ","], fn_keys: &[] },
    "background-repeat" => CssPropertyDef {
        bits: NONE,
        literals: &[",", "repeat", "repeat-x", "repeat-y", "no-repeat", "space", "round"],
        fn_keys: &[],
    },
    "background-attachment" => CssPropertyDef {
        bits: NONE,
        literals: &[",", "fixed", "scroll", "local"],
        fn_keys: &[],
    },
    "background-position" => CssPropertyDef {
        bits: QN,
        literals: &[",", "center", "top", "bottom", "left", "right"],
        fn_keys: &[],
    },
    "background-size" => CssPropertyDef {
        bits: Q,
        literals: &[",", "auto", "cover", "contain"],
        fn_keys: &[],
    },

    // Borders and outlines.
    "border" => CssPropertyDef {
        bits: CQ,
        literals: &[
            "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge",
            "inset", "outset", "thin", "medium", "thick", "aqua", "black", "blue", "fuchsia",
            "gray", "grey", "green", "lime", "maroon", "navy", "olive", "orange", "purple",
            "red", "silver", "teal", "white", "yellow", "transparent", "currentcolor",
        ],
        fn_keys: COLOR_FNS,
    },
    "border-top" => CssPropertyDef { bits: CQ, literals: BORDER_STYLES, fn_keys: COLOR_FNS },
    "border-right" => CssPropertyDef { bits: CQ, literals: BORDER_STYLES, fn_keys: COLOR_FNS },
    "border-bottom" => CssPropertyDef { bits: CQ, literals: BORDER_STYLES, fn_keys: COLOR_FNS },
    "border-left" => CssPropertyDef { bits: CQ, literals: BORDER_STYLES, fn_keys: COLOR_FNS },
    "border-style" => CssPropertyDef { bits: NONE, literals: BORDER_STYLES, fn_keys: &[] },
    "border-top-style" => CssPropertyDef { bits: NONE, literals: BORDER_STYLES, fn_keys: &[] },
    "border-right-style" => CssPropertyDef { bits: NONE, literals: BORDER_STYLES, fn_keys: &[] },
    "border-bottom-style" => CssPropertyDef { bits: NONE, literals: BORDER_STYLES, fn_keys: &[] },
    "border-left-style" => CssPropertyDef { bits: NONE, literals: BORDER_STYLES, fn_keys: &[] },
    "border-width" => CssPropertyDef { bits: Q, literals: BORDER_WIDTHS, fn_keys: &[] },
    "border-top-width" => CssPropertyDef { bits: Q, literals: BORDER_WIDTHS, fn_keys: &[] },
    "border-right-width" => CssPropertyDef { bits: Q, literals: BORDER_WIDTHS, fn_keys: &[] },
    "border-bottom-width" => CssPropertyDef { bits: Q, literals: BORDER_WIDTHS, fn_keys: &[] },
    "border-left-width" => CssPropertyDef { bits: Q, literals: BORDER_WIDTHS, fn_keys: &[] },
    "border-radius" => CssPropertyDef { bits: Q, literals: &["/"], fn_keys: &[] },
    "border-top-left-radius" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "border-top-right-radius" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "border-bottom-left-radius" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "border-bottom-right-radius" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "border-collapse" => CssPropertyDef { bits: NONE, literals: &["collapse", "separate"], fn_keys: &[] },
    "border-spacing" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "outline" => CssPropertyDef { bits: CQ, literals: BORDER_STYLES, fn_keys: COLOR_FNS },
    "outline-style" => CssPropertyDef { bits: NONE, literals: BORDER_STYLES, fn_keys: &[] },
    "outline-width" => CssPropertyDef { bits: Q, literals: BORDER_WIDTHS, fn_keys: &[] },
    "outline-offset" => CssPropertyDef { bits: QN, literals: &[], fn_keys: &[] },

    // Box model.
    "margin" => CssPropertyDef { bits: QN, literals: &["auto"], fn_keys: &[] },
    "margin-top" => CssPropertyDef { bits: QN, literals: &["auto"], fn_keys: &[] },
    "margin-right" => CssPropertyDef { bits: QN, literals: &["auto"], fn_keys: &[] },
    "margin-bottom" => CssPropertyDef { bits: QN, literals: &["auto"], fn_keys: &[] },
    "margin-left" => CssPropertyDef { bits: QN, literals: &["auto"], fn_keys: &[] },
    "padding" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "padding-top" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "padding-right" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "padding-bottom" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "padding-left" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "width" => CssPropertyDef { bits: Q, literals: &["auto", "min-content", "max-content", "fit-content"], fn_keys: &[] },
    "height" => CssPropertyDef { bits: Q, literals: &["auto", "min-content", "max-content", "fit-content"], fn_keys: &[] },
    "min-width" => CssPropertyDef { bits: Q, literals: &["auto", "min-content", "max-content"], fn_keys: &[] },
    "min-height" => CssPropertyDef { bits: Q, literals: &["auto", "min-content", "max-content"], fn_keys: &[] },
    "max-width" => CssPropertyDef { bits: Q, literals: &["none", "min-content", "max-content"], fn_keys: &[] },
    "max-height" => CssPropertyDef { bits: Q, literals: &["none", "min-content", "max-content"], fn_keys: &[] },
    "box-sizing" => CssPropertyDef { bits: NONE, literals: &["border-box", "content-box"], fn_keys: &[] },
    "float" => CssPropertyDef { bits: NONE, literals: &["left", "right", "none"], fn_keys: &[] },
    "clear" => CssPropertyDef { bits: NONE, literals: &["left", "right", "none", "both"], fn_keys: &[] },
    "display" => CssPropertyDef {
        bits: NONE,
        literals: &[
            "block", "inline", "inline-block", "flex", "inline-flex", "grid", "inline-grid",
            "table", "table-row", "table-cell", "table-caption", "list-item", "none",
            "contents", "flow-root",
        ],
        fn_keys: &[],
    },
    "overflow" => CssPropertyDef { bits: NONE, literals: &["visible", "hidden", "scroll", "auto", "clip"], fn_keys: &[] },
    "overflow-x" => CssPropertyDef { bits: NONE, literals: &["visible", "hidden", "scroll", "auto", "clip"], fn_keys: &[] },
    "overflow-y" => CssPropertyDef { bits: NONE, literals: &["visible", "hidden", "scroll", "auto", "clip"], fn_keys: &[] },
    "visibility" => CssPropertyDef { bits: NONE, literals: &["visible", "hidden", "collapse"], fn_keys: &[] },
    "clip" => CssPropertyDef { bits: NONE, literals: &["auto"], fn_keys: &[("rect", "rect()")] },
    "opacity" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "box-shadow" => CssPropertyDef { bits: CQN, literals: &[",", "inset", "none"], fn_keys: COLOR_FNS },
    "cursor" => CssPropertyDef {
        bits: NONE,
        literals: &[
            ",", "auto", "default", "none", "context-menu", "help", "pointer", "progress",
            "wait", "cell", "crosshair", "text", "vertical-text", "alias", "copy", "move",
            "no-drop", "not-allowed", "grab", "grabbing", "all-scroll", "col-resize",
            "row-resize", "n-resize", "e-resize", "s-resize", "w-resize", "ne-resize",
            "nw-resize", "se-resize", "sw-resize", "ew-resize", "ns-resize", "nesw-resize",
            "nwse-resize", "zoom-in", "zoom-out",
        ],
        fn_keys: &[],
    },

    // Fonts and text.
    "font" => CssPropertyDef {
        bits: Q.union(WORDS),
        literals: &[
            ",", "/", "normal", "italic", "oblique", "small-caps", "bold", "bolder",
            "lighter", "xx-small", "x-small", "small", "medium", "large", "x-large",
            "xx-large", "smaller", "larger", "serif", "sans-serif", "monospace", "cursive",
            "fantasy", "system-ui",
        ],
        fn_keys: &[],
    },
    "font-family" => CssPropertyDef { bits: WORDS, literals: FONT_GENERIC, fn_keys: &[] },
    "font-size" => CssPropertyDef { bits: Q, literals: FONT_SIZES, fn_keys: &[] },
    "font-style" => CssPropertyDef { bits: NONE, literals: &["normal", "italic", "oblique"], fn_keys: &[] },
    "font-variant" => CssPropertyDef { bits: NONE, literals: &["normal", "small-caps"], fn_keys: &[] },
    "font-weight" => CssPropertyDef { bits: Q, literals: &["normal", "bold", "bolder", "lighter"], fn_keys: &[] },
    "font-stretch" => CssPropertyDef {
        bits: Q,
        literals: &[
            "normal", "ultra-condensed", "extra-condensed", "condensed", "semi-condensed",
            "semi-expanded", "expanded", "extra-expanded", "ultra-expanded",
        ],
        fn_keys: &[],
    },
    "letter-spacing" => CssPropertyDef { bits: QN, literals: &["normal"], fn_keys: &[] },
    "word-spacing" => CssPropertyDef { bits: QN, literals: &["normal"], fn_keys: &[] },
    "line-height" => CssPropertyDef { bits: Q, literals: &["normal"], fn_keys: &[] },
    "tab-size" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "text-align" => CssPropertyDef { bits: NONE, literals: &["left", "right", "center", "justify", "start", "end"], fn_keys: &[] },
    "text-decoration" => CssPropertyDef {
        bits: C,
        literals: &[
            "none", "underline", "overline", "line-through", "blink", "solid", "double",
            "dotted", "dashed", "wavy",
        ],
        fn_keys: COLOR_FNS,
    },
    "text-decoration-line" => CssPropertyDef { bits: NONE, literals: &["none", "underline", "overline", "line-through"], fn_keys: &[] },
    "text-decoration-style" => CssPropertyDef { bits: NONE, literals: &["solid", "double", "dotted", "dashed", "wavy"], fn_keys: &[] },
    "text-indent" => CssPropertyDef { bits: QN, literals: &[], fn_keys: &[] },
    "text-overflow" => CssPropertyDef { bits: CssBits::STRING, literals: &["clip", "ellipsis"], fn_keys: &[] },
    "text-shadow" => CssPropertyDef { bits: CQN, literals: &[",", "none"], fn_keys: COLOR_FNS },
    "text-transform" => CssPropertyDef { bits: NONE, literals: &["none", "capitalize", "uppercase", "lowercase"], fn_keys: &[] },
    "text-wrap" => CssPropertyDef { bits: NONE, literals: &["wrap", "nowrap", "balance", "pretty", "stable"], fn_keys: &[] },
    "white-space" => CssPropertyDef { bits: NONE, literals: &["normal", "nowrap", "pre", "pre-wrap", "pre-line", "break-spaces"], fn_keys: &[] },
    "word-wrap" => CssPropertyDef { bits: NONE, literals: &["normal", "break-word", "anywhere"], fn_keys: &[] },
    "overflow-wrap" => CssPropertyDef { bits: NONE, literals: &["normal", "break-word", "anywhere"], fn_keys: &[] },
    "word-break" => CssPropertyDef { bits: NONE, literals: &["normal", "break-all", "keep-all"], fn_keys: &[] },
    "vertical-align" => CssPropertyDef {
        bits: QN,
        literals: &["baseline", "sub", "super", "top", "text-top", "middle", "bottom", "text-bottom"],
        fn_keys: &[],
    },
    "unicode-bidi" => CssPropertyDef { bits: NONE, literals: &["normal", "embed", "bidi-override", "isolate", "isolate-override"], fn_keys: &[] },
    "direction" => CssPropertyDef { bits: NONE, literals: &["ltr", "rtl"], fn_keys: &[] },
    "quotes" => CssPropertyDef { bits: CssBits::STRING, literals: &["none"], fn_keys: &[] },

    // Tables and lists.
    "caption-side" => CssPropertyDef { bits: NONE, literals: &["top", "bottom"], fn_keys: &[] },
    "empty-cells" => CssPropertyDef { bits: NONE, literals: &["show", "hide"], fn_keys: &[] },
    "table-layout" => CssPropertyDef { bits: NONE, literals: &["auto", "fixed"], fn_keys: &[] },
    "list-style" => CssPropertyDef { bits: NONE, literals: LIST_MARKERS, fn_keys: &[] },
    "list-style-type" => CssPropertyDef { bits: NONE, literals: LIST_MARKERS, fn_keys: &[] },
    "list-style-position" => CssPropertyDef { bits: NONE, literals: &["inside", "outside"], fn_keys: &[] },
    "list-style-image" => CssPropertyDef { bits: CssBits::URL, literals: &["none"], fn_keys: &[] },

    // Columns and flexible boxes.
    "column-count" => CssPropertyDef { bits: Q, literals: &["auto"], fn_keys: &[] },
    "column-width" => CssPropertyDef { bits: Q, literals: &["auto"], fn_keys: &[] },
    "column-gap" => CssPropertyDef { bits: Q, literals: &["normal"], fn_keys: &[] },
    "row-gap" => CssPropertyDef { bits: Q, literals: &["normal"], fn_keys: &[] },
    "gap" => CssPropertyDef { bits: Q, literals: &["normal"], fn_keys: &[] },
    "flex-direction" => CssPropertyDef { bits: NONE, literals: &["row", "row-reverse", "column", "column-reverse"], fn_keys: &[] },
    "flex-wrap" => CssPropertyDef { bits: NONE, literals: &["nowrap", "wrap", "wrap-reverse"], fn_keys: &[] },
    "flex-grow" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "flex-shrink" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "flex-basis" => CssPropertyDef { bits: Q, literals: &["auto", "content"], fn_keys: &[] },
    "order" => CssPropertyDef { bits: QN, literals: &[], fn_keys: &[] },
    "justify-content" => CssPropertyDef { bits: NONE, literals: ALIGNMENTS, fn_keys: &[] },
    "align-items" => CssPropertyDef { bits: NONE, literals: ALIGNMENTS, fn_keys: &[] },
    "align-content" => CssPropertyDef { bits: NONE, literals: ALIGNMENTS, fn_keys: &[] },
    "align-self" => CssPropertyDef { bits: NONE, literals: ALIGNMENTS, fn_keys: &[] },

    "transform" => CssPropertyDef { bits: NONE, literals: &["none"], fn_keys: TRANSFORM_FNS },
    "transform-origin" => CssPropertyDef {
        bits: QN,
        literals: &["center", "top", "bottom", "left", "right"],
        fn_keys: &[],
    },

    // Aural properties, kept for CSS 2 compatibility.
    "speak" => CssPropertyDef { bits: NONE, literals: &["normal", "none", "spell-out"], fn_keys: &[] },
    "volume" => CssPropertyDef { bits: Q, literals: &["silent", "x-soft", "soft", "medium", "loud", "x-loud"], fn_keys: &[] },
    "pitch" => CssPropertyDef { bits: Q, literals: &["x-low", "low", "medium", "high", "x-high"], fn_keys: &[] },
    "pitch-range" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "richness" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "stress" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "speech-rate" => CssPropertyDef {
        bits: Q,
        literals: &["x-slow", "slow", "medium", "fast", "x-fast", "faster", "slower"],
        fn_keys: &[],
    },
    "voice-family" => CssPropertyDef { bits: WORDS, literals: &[",", "male", "female", "child"], fn_keys: &[] },
    "pause" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "pause-before" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "pause-after" => CssPropertyDef { bits: Q, literals: &[], fn_keys: &[] },
    "elevation" => CssPropertyDef { bits: QN, literals: &["below", "level", "above", "higher", "lower"], fn_keys: &[] },

    // Function argument schemas, reachable only through `fn_keys`.
    "rgb()" => CssPropertyDef { bits: QN, literals: &[",", "/"], fn_keys: &[] },
    "rgba()" => CssPropertyDef { bits: QN, literals: &[",", "/"], fn_keys: &[] },
    "hsl()" => CssPropertyDef { bits: QN, literals: &[",", "/"], fn_keys: &[] },
    "hsla()" => CssPropertyDef { bits: QN, literals: &[",", "/"], fn_keys: &[] },
    "rect()" => CssPropertyDef { bits: QN, literals: &[",", "auto"], fn_keys: &[] },
    "transform-fn()" => CssPropertyDef { bits: QN, literals: &[","], fn_keys: &[] },
};

/// Recognized vendor prefixes, stripped before a second lookup.
const VENDOR_PREFIXES: &[&str] = &["-ms-", "-moz-", "-o-", "-webkit-"];

fn find(name: &str) -> Option<(&'static str, &'static CssPropertyDef)> {
    if let Some((key, def)) = DEFAULT_PROPERTIES.get_entry(name) {
        return Some((key, def));
    }
    if name.starts_with('-') {
        for prefix in VENDOR_PREFIXES {
            if let Some(rest) = name.strip_prefix(prefix) {
                if let Some((key, def)) = DEFAULT_PROPERTIES.get_entry(rest) {
                    return Some((key, def));
                }
            }
        }
    }
    None
}

/// A (possibly restricted) view over the default property table.
pub struct CssSchema {
    /// `None` allows every default property.
    allowed: Option<FxHashSet<&'static str>>,
}

static DEFAULT_SCHEMA: CssSchema = CssSchema { allowed: None };

impl Default for CssSchema {
    /// The unrestricted view over the default property table.
    fn default() -> Self {
        CssSchema { allowed: None }
    }
}

impl CssSchema {
    pub fn default_schema() -> &'static CssSchema {
        &DEFAULT_SCHEMA
    }

    /// Restricts the schema to the named properties. Names must exist in
    /// the default table (vendor prefixes are tolerated); unknown names
    /// fail construction.
    pub fn with_properties<'a>(
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<CssSchema, ConfigError> {
        let mut allowed = FxHashSet::default();
        for name in names {
            let lowered = name.to_ascii_lowercase();
            match find(&lowered) {
                Some((key, _)) => {
                    allowed.insert(key);
                }
                None => return Err(ConfigError::UnknownCssProperty(name.to_string())),
            }
        }
        Ok(CssSchema {
            allowed: Some(allowed),
        })
    }

    /// Looks up a property by its written name, stripping vendor
    /// prefixes when the exact name is unknown.
    pub fn lookup(&self, name: &str) -> Option<&'static CssPropertyDef> {
        let (key, def) = find(name)?;
        match &self.allowed {
            Some(allowed) if !allowed.contains(key) => None,
            _ => Some(def),
        }
    }

    /// Resolves a function-argument schema key (`"rgb()"`). These are
    /// reachable only through an allowed property's `fn_keys`, so the
    /// restriction set does not apply.
    pub fn lookup_function_key(&self, key: &str) -> Option<&'static CssPropertyDef> {
        DEFAULT_PROPERTIES.get(key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_lookup() {
        let schema = CssSchema::default_schema();
        assert!(schema.lookup("color").is_some());
        assert!(schema.lookup("behavior").is_none());
        assert!(schema.lookup("-webkit-border-radius").is_some());
        assert!(schema.lookup("-webkit-behavior").is_none());
    }

    #[test]
    fn function_keys_resolve() {
        let schema = CssSchema::default_schema();
        let color = schema.lookup("color").unwrap();
        assert_eq!(color.function_key("rgb"), Some("rgb()"));
        assert_eq!(color.function_key("expression"), None);
        assert!(schema.lookup_function_key("rgb()").is_some());
    }

    #[test]
    fn restricted_schema() {
        let schema = CssSchema::with_properties(["color", "Font-Family"]).unwrap();
        assert!(schema.lookup("color").is_some());
        assert!(schema.lookup("font-family").is_some());
        assert!(schema.lookup("margin").is_none());
    }

    #[test]
    fn unknown_property_fails_construction() {
        assert!(matches!(
            CssSchema::with_properties(["no-such-prop"]),
            Err(ConfigError::UnknownCssProperty(_))
        ));
    }

    #[test]
    fn function_schema_keys_are_not_directly_addressable_properties() {
        // `rgb()` is not a property name the filter would ever read from
        // a declaration; it has no vendor-prefixed form either.
        assert!(CssSchema::default_schema().lookup("rgb").is_none());
    }
}
