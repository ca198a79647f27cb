//! CSS tokenization and `style` attribute filtering.

pub mod property_filter;
pub mod schema;
pub mod tokens;

pub use property_filter::filter_style;
pub use schema::{ConfigError, CssBits, CssSchema};
pub use tokens::{CssTokenType, CssTokens};
