//! Data model for media embed directives.
//!
//! An [`EmbedDirective`] is produced only by the scanner after a full,
//! successful parse. It has no mutators: the entry list it was built with is
//! the one the renderer sees.

use std::fmt;

/// One `(mime type, url)` pair inside a directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedEntry {
    /// MIME type exactly as written in the source (quotes stripped).
    pub mime_type: Vec<u8>,
    /// URL exactly as written in the source (quotes stripped).
    pub url: Vec<u8>,
}

impl EmbedEntry {
    /// Create an entry from its two fields.
    pub fn new(mime_type: impl Into<Vec<u8>>, url: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for EmbedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[\"{}\", \"{}\"]",
            String::from_utf8_lossy(&self.mime_type),
            String::from_utf8_lossy(&self.url)
        )
    }
}

/// A parsed `![](mime url ...)` directive with at least one entry.
///
/// Entries keep the order in which they appear in the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedDirective {
    entries: Vec<EmbedEntry>,
}

impl EmbedDirective {
    /// Build a directive, or `None` when `entries` is empty.
    ///
    /// ```
    /// use mdembed_core::{EmbedDirective, EmbedEntry};
    ///
    /// assert!(EmbedDirective::new(Vec::new()).is_none());
    ///
    /// let directive = EmbedDirective::new(vec![EmbedEntry::new("video/mp4", "a.mp4")]).unwrap();
    /// assert_eq!(directive.len(), 1);
    /// ```
    pub fn new(entries: Vec<EmbedEntry>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self { entries })
    }

    /// Entries in source order.
    pub fn entries(&self) -> &[EmbedEntry] {
        &self.entries
    }

    /// Iterate entries in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, EmbedEntry> {
        self.entries.iter()
    }

    /// Number of entries (never zero).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directive has no entries (never true).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a EmbedDirective {
    type Item = &'a EmbedEntry;
    type IntoIter = std::slice::Iter<'a, EmbedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for EmbedDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Embed [")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", entry)?;
        }
        f.write_str("]")
    }
}

/// Inline content produced by the inline parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineNode {
    /// Raw bytes passed through untouched.
    Text(Vec<u8>),
    /// A recognized media embed.
    Embed(EmbedDirective),
}

impl InlineNode {
    /// Short kind name, used in debug output.
    pub fn kind(&self) -> &'static str {
        match self {
            InlineNode::Text(_) => "Text",
            InlineNode::Embed(_) => "Embed",
        }
    }
}

impl fmt::Display for InlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineNode::Text(bytes) => write!(f, "Text {:?}", String::from_utf8_lossy(bytes)),
            InlineNode::Embed(directive) => write!(f, "{}", directive),
        }
    }
}
