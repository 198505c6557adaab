//! Compiler core for a CSS-like color scheme dialect.
//!
//! This crate turns scheme source text — a deliberately restricted CSS
//! dialect describing editor syntax-highlighting colors — into an ordered
//! document ready for property-list serialization. It provides:
//!
//! - **Parsing**: a scope-aware parser over grouped CSS tokens producing a
//!   typed rule tree, collecting every recoverable error in one run
//! - **At-rules**: single-value `@keyword value;` directives, unique per
//!   scope, legal at stylesheet root and inside rulesets
//! - **Color translation**: named colors, hex hashes and
//!   `rgb`/`rgba`/`hsl`/`hsla` calls normalized to canonical hex, with
//!   exact clamping and conversion math
//! - **Dumping**: fail-fast validation of document invariants and
//!   per-property values, producing an insertion-ordered mapping
//!
//! Tokenization is delegated to the `cssparser` crate; this crate never
//! performs I/O and produces no output besides the returned values.
//!
//! # Example
//!
//! ```
//! use schemec::{datafy_stylesheet, Stylesheet, Value};
//!
//! let source = r##"
//! @name "Example";
//! * {
//!     background: #202020;
//!     foreground: white;
//! }
//! string.quoted {
//!     foreground: rgb(128, 255, 0);
//! }
//! "##;
//!
//! let stylesheet = Stylesheet::parse(source);
//! assert!(stylesheet.is_clean());
//!
//! let document = datafy_stylesheet(&stylesheet)?;
//! assert_eq!(document["name"], Value::String("Example".into()));
//! # Ok::<(), schemec::DumpError>(())
//! ```

pub mod color;
pub mod dumper;
pub mod parser;
pub mod rules;
pub mod tokens;

mod error;

pub use dumper::{Document, Value, datafy_stylesheet};
pub use error::{DumpError, ParseError, Result};
pub use parser::parse_stylesheet;
pub use rules::Stylesheet;

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::color::{named_color, translate_color};
    pub use crate::dumper::{
        Dict, Document, PropertyKind, Value, datafy_ruleset, datafy_stylesheet, property_kind,
    };
    pub use crate::error::{DumpError, ParseError};
    pub use crate::parser::parse_stylesheet;
    pub use crate::rules::{AtRule, Declaration, Rule, RuleSet, Stylesheet};
    pub use crate::tokens::{Token, TokenKind, TokenValue, tokenize};
}
