//! BBCode to HTML content filter for user posts.
//!
//! Input is escaped before any tag is looked at, so the output never carries markup the user typed,
//! only the markup the tag rules emit.

mod error;
pub mod html;
mod parser;

pub use error::{ConfigError, RenderError};
pub use html::{
    builtins, escape, render, render_default, try_render, ColorCheck, HtmlSerializer,
    RenderOptions, RenderOverrides, RuleContext, TagRule,
};
pub use parser::{
    attrs::AttributeSet,
    rules,
    tree::{Document, Element, Node},
    BBParser, BBTag, ParserConfig, ParserFeature, Token, TokenKind, DEFAULT_MAX_DEPTH,
    MAX_SUPPORTED_DEPTH,
};
