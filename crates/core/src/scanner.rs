//! Byte-level scanner for `![](mime url mime url ...)` directives.
//!
//! The payload between the parentheses is tokenized in a single pass with
//! no backtracking. Each byte drives one transition of a small state machine
//! ([`step`]); the driver in [`scan_embed`] only moves bytes between the field
//! buffer and the entry list as the transitions dictate.
//!
//! Every malformed input collapses into `None` so the host can fall back to
//! its default inline handling.

use crate::ast::{EmbedDirective, EmbedEntry};

/// Literal prefix that introduces a directive.
pub const EMBED_PREFIX: &[u8] = b"![](";

/// Shortest line that can possibly hold a directive (`![]()`).
const MIN_LINE_LEN: usize = EMBED_PREFIX.len() + 1;

/// A successful scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanMatch {
    /// The parsed directive.
    pub directive: EmbedDirective,
    /// Bytes the host should advance by, including the closing `)`.
    pub consumed: usize,
}

/// Which field of a pair the buffer is currently filling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRole {
    /// Expecting a MIME type.
    Mime,
    /// Expecting a URL.
    Url,
}

impl FieldRole {
    fn next(self) -> Self {
        match self {
            FieldRole::Mime => FieldRole::Url,
            FieldRole::Url => FieldRole::Mime,
        }
    }
}

/// Scanner state between two bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanState {
    /// Field being filled.
    pub role: FieldRole,
    /// Opening quote byte while inside a quoted run.
    pub quote: Option<u8>,
}

impl ScanState {
    /// State right after the prefix.
    pub const START: ScanState = ScanState {
        role: FieldRole::Mime,
        quote: None,
    };

    fn closed(self) -> Self {
        ScanState {
            role: self.role.next(),
            quote: None,
        }
    }
}

/// Result of feeding one byte to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Drop the byte and move to the given state.
    Skip(ScanState),
    /// Append the byte to the field buffer.
    Push,
    /// The buffered field is complete; move to the given state.
    Close(ScanState),
    /// Clean termination with the entries collected so far.
    Accept,
    /// Close the pending URL, then terminate.
    CloseAndAccept,
    /// The directive is malformed.
    Reject,
}

/// Transition function of the scanner.
///
/// `buffer_empty` tells whether the current field has collected any bytes.
pub fn step(state: ScanState, byte: u8, buffer_empty: bool) -> Step {
    match (byte, state.quote) {
        (b'\r' | b'\n', _) => Step::Reject,
        (b')', None) => match (state.role, buffer_empty) {
            (FieldRole::Mime, true) => Step::Accept,
            (FieldRole::Url, false) => Step::CloseAndAccept,
            _ => Step::Reject,
        },
        (b' ' | b'\t', None) => {
            if buffer_empty {
                Step::Skip(state)
            } else {
                Step::Close(state.closed())
            }
        }
        (b'"' | b'\'', None) => {
            if buffer_empty {
                Step::Skip(ScanState {
                    quote: Some(byte),
                    ..state
                })
            } else {
                Step::Reject
            }
        }
        (_, Some(open)) if byte == open => {
            if buffer_empty {
                Step::Reject
            } else {
                Step::Close(state.closed())
            }
        }
        _ => Step::Push,
    }
}

#[derive(Default)]
struct Fields {
    buffer: Vec<u8>,
    mime_type: Vec<u8>,
    entries: Vec<EmbedEntry>,
}

impl Fields {
    fn close(&mut self, role: FieldRole) {
        let field = std::mem::take(&mut self.buffer);
        match role {
            FieldRole::Mime => self.mime_type = field,
            FieldRole::Url => self.entries.push(EmbedEntry {
                mime_type: std::mem::take(&mut self.mime_type),
                url: field,
            }),
        }
    }

    fn finish(self, consumed: usize) -> Option<ScanMatch> {
        let directive = EmbedDirective::new(self.entries)?;
        Some(ScanMatch {
            directive,
            consumed,
        })
    }
}

/// Scan a directive at the start of `line`.
///
/// `line` must begin at the `!` that triggered the scan and may extend past
/// the directive; scanning stops at the first unquoted `)`. Returns `None`
/// for anything that is not a complete, non-empty directive on this line.
///
/// ```
/// use mdembed_core::scan_embed;
///
/// let found = scan_embed(b"![](video/mp4 a.mp4 video/webm b.webm) trailing").unwrap();
/// assert_eq!(found.consumed, 38);
/// assert_eq!(found.directive.len(), 2);
///
/// assert!(scan_embed(b"![]()").is_none());
/// ```
pub fn scan_embed(line: &[u8]) -> Option<ScanMatch> {
    if line.len() < MIN_LINE_LEN || !line.starts_with(EMBED_PREFIX) {
        return None;
    }

    let mut state = ScanState::START;
    let mut fields = Fields::default();

    for (offset, &byte) in line.iter().enumerate().skip(EMBED_PREFIX.len()) {
        match step(state, byte, fields.buffer.is_empty()) {
            Step::Skip(next) => state = next,
            Step::Push => fields.buffer.push(byte),
            Step::Close(next) => {
                fields.close(state.role);
                state = next;
            }
            Step::Accept => return accept(fields, offset),
            Step::CloseAndAccept => {
                fields.close(state.role);
                return accept(fields, offset);
            }
            Step::Reject => {
                log::trace!("embed directive rejected at byte {offset} ({state:?})");
                return None;
            }
        }
    }

    log::trace!("embed directive not terminated before end of line");
    None
}

fn accept(fields: Fields, close_paren: usize) -> Option<ScanMatch> {
    let found = fields.finish(close_paren + 1);
    if found.is_none() {
        log::trace!("embed directive has no entries");
    }
    found
}
