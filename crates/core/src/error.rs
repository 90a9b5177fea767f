use thiserror::Error;

/// Position inside a markdown document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors from the markdown pipeline.
///
/// Directive scanning itself never fails: a malformed directive is plain
/// text. These errors only come from the surrounding markdown processing.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Rewritten text was not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// markdown-rs rejected the document.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
}

impl EmbedError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MarkdownAdapter {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Location of the error, when one is known.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            EmbedError::MarkdownAdapter { location, .. } => Some(*location),
            EmbedError::Encoding(_) => None,
        }
    }
}
