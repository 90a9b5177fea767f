//! Inline handler registry and the walker that drives it.
//!
//! Handlers are plain values carrying a trigger byte, a priority and a scan
//! function. The registry sorts them once when a handler is added, so
//! dispatch is a linear walk over a pre-ordered list.

use std::ops::Range;

use crate::ast::InlineNode;
use crate::scanner::scan_embed;

/// Priority of the built-in embed handler.
pub const EMBED_PRIORITY: u32 = 200;

/// Scan function: receives the current line starting at the trigger byte and
/// returns the parsed node plus the number of bytes it covers.
pub type ScanFn = fn(&[u8]) -> Option<(InlineNode, usize)>;

/// A registered inline construct.
#[derive(Clone, Copy, Debug)]
pub struct InlineHandler {
    /// Name used in logs.
    pub name: &'static str,
    /// Byte that makes the walker try this handler.
    pub trigger: u8,
    /// Lower values are tried first.
    pub priority: u32,
    /// Scanner for the construct.
    pub scan: ScanFn,
}

impl InlineHandler {
    /// The `![](mime url ...)` media embed handler.
    pub fn embed() -> Self {
        Self {
            name: "embed",
            trigger: b'!',
            priority: EMBED_PRIORITY,
            scan: scan_embed_node,
        }
    }
}

fn scan_embed_node(line: &[u8]) -> Option<(InlineNode, usize)> {
    scan_embed(line).map(|found| (InlineNode::Embed(found.directive), found.consumed))
}

/// Read position over a run of text that may hold several lines.
///
/// The walker owns the cursor; scanners only ever see
/// [`LineCursor::peek_line`].
#[derive(Debug)]
pub struct LineCursor<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    /// Start at the beginning of `text`.
    pub fn new(text: &'a [u8]) -> Self {
        Self { text, pos: 0 }
    }

    /// Bytes from the current position to the end of the text.
    pub fn peek(&self) -> &'a [u8] {
        &self.text[self.pos..]
    }

    /// Bytes from the current position to the end of the current line,
    /// line ending included.
    pub fn peek_line(&self) -> &'a [u8] {
        let rest = self.peek();
        match rest.iter().position(|&b| b == b'\n') {
            Some(end) => &rest[..=end],
            None => rest,
        }
    }

    /// Move forward by `n` bytes, stopping at the end of the text.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.text.len());
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether the whole text has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }
}

/// An inline node together with the input bytes it was built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned {
    /// The parsed node.
    pub node: InlineNode,
    /// Byte range of the node in the walked text.
    pub span: Range<usize>,
}

/// Ordered set of inline handlers.
#[derive(Clone, Debug, Default)]
pub struct InlineRegistry {
    handlers: Vec<InlineHandler>,
}

impl InlineRegistry {
    /// Empty registry: all input parses to a single text node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the embed handler installed.
    pub fn with_defaults() -> Self {
        Self::new().with_handler(InlineHandler::embed())
    }

    /// Builder form of [`InlineRegistry::register`].
    pub fn with_handler(mut self, handler: InlineHandler) -> Self {
        self.register(handler);
        self
    }

    /// Add a handler. Equal priorities keep registration order.
    pub fn register(&mut self, handler: InlineHandler) {
        self.handlers.push(handler);
        self.handlers.sort_by_key(|h| h.priority);
    }

    /// Handlers in dispatch order.
    pub fn handlers(&self) -> &[InlineHandler] {
        &self.handlers
    }

    fn is_trigger(&self, byte: u8) -> bool {
        self.handlers.iter().any(|h| h.trigger == byte)
    }

    /// Try the handlers for the byte under the cursor, in priority order.
    fn try_handlers(&self, cursor: &LineCursor<'_>) -> Option<(InlineNode, usize)> {
        let line = cursor.peek_line();
        let trigger = *line.first()?;
        self.handlers
            .iter()
            .filter(|h| h.trigger == trigger)
            .find_map(|h| {
                let (node, consumed) = (h.scan)(line)?;
                log::trace!("{} matched at byte {}", h.name, cursor.position());
                Some((node, consumed.min(line.len())))
            })
    }

    /// Split a paragraph's text into text and recognized inline constructs.
    ///
    /// Backslash escapes and code spans are copied as text without
    /// consulting any handler. A code span may cross line breaks, so pass
    /// every line of a paragraph in one call.
    ///
    /// ```
    /// use mdembed_core::{InlineNode, InlineRegistry};
    ///
    /// let nodes = InlineRegistry::with_defaults().parse_inline(b"see ![](video/mp4 a.mp4)!");
    /// assert_eq!(nodes.len(), 3);
    /// assert!(matches!(nodes[1], InlineNode::Embed(_)));
    /// ```
    pub fn parse_inline(&self, text: &[u8]) -> Vec<InlineNode> {
        self.parse_spans(text).into_iter().map(|s| s.node).collect()
    }

    /// Same walk as [`InlineRegistry::parse_inline`], keeping the byte
    /// range each node came from.
    pub fn parse_spans(&self, text: &[u8]) -> Vec<Spanned> {
        let mut nodes = Vec::new();
        let mut text_start = 0;
        let mut cursor = LineCursor::new(text);

        while let Some(&byte) = cursor.peek().first() {
            let verbatim = match byte {
                b'\\' => Some(cursor.peek().len().min(2)),
                b'`' => Some(code_span_len(cursor.peek())),
                _ => None,
            };
            if let Some(len) = verbatim {
                cursor.advance(len);
                continue;
            }

            let start = cursor.position();
            if self.is_trigger(byte)
                && let Some((node, consumed)) = self.try_handlers(&cursor)
            {
                push_text(&mut nodes, text, text_start..start);
                cursor.advance(consumed);
                nodes.push(Spanned {
                    node,
                    span: start..cursor.position(),
                });
                text_start = cursor.position();
                continue;
            }

            cursor.advance(1);
        }

        push_text(&mut nodes, text, text_start..text.len());
        nodes
    }
}

fn push_text(nodes: &mut Vec<Spanned>, text: &[u8], span: Range<usize>) {
    if span.is_empty() {
        return;
    }
    nodes.push(Spanned {
        node: InlineNode::Text(text[span.clone()].to_vec()),
        span,
    });
}

/// Length of the code span starting at `input`, or of the bare backtick run
/// when no closing run of the same length follows.
fn code_span_len(input: &[u8]) -> usize {
    let open = input.iter().take_while(|&&b| b == b'`').count();
    let mut i = open;
    while i < input.len() {
        if input[i] == b'`' {
            let run = input[i..].iter().take_while(|&&b| b == b'`').count();
            if run == open {
                return i + run;
            }
            i += run;
        } else {
            i += 1;
        }
    }
    open
}
