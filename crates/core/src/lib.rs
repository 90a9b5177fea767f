#![deny(missing_docs)]
//! mdembed core: scanning and rendering of `![](mime url ...)` media embeds,
//! plus a markdown-rs pipeline that expands them.

/// Directive data model and inline node kinds.
pub mod ast;
/// Code block tracking for the text transform.
pub mod code_block;
/// Pipeline error types.
pub mod error;
/// Inline handler registry and text walker.
pub mod inline;
/// Markdown parsing/rendering pipeline and options.
pub mod parse;
/// HTML output for directives.
pub mod render;
/// Directive scanner.
pub mod scanner;
/// Markdown text rewriting.
pub mod transform;

pub use ast::{EmbedDirective, EmbedEntry, InlineNode};
pub use error::{EmbedError, SourceLocation};
pub use inline::{EMBED_PRIORITY, InlineHandler, InlineRegistry, LineCursor, Spanned};
pub use parse::{
    AstTransform, ParseOptions, ParserPipeline, TextTransform, parse_mdast,
    parse_mdast_with_options, render_html,
};
pub use render::{embed_to_html, escape_attribute, render_embed};
pub use scanner::{EMBED_PREFIX, ScanMatch, scan_embed};
pub use transform::{
    EmbedSlot, ExtractedEmbeds, extract_embeds, extract_with, rewrite_embeds, rewrite_with,
};
