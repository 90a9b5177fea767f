//! Line classification for code blocks.
//!
//! Embeds are never rewritten inside fenced (```` ``` ````/`~~~`) or indented
//! code blocks, so the transform feeds every line through a
//! [`CodeBlockTracker`] first.

/// An open fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    /// Fence character, `` ` `` or `~`.
    pub marker: u8,
    /// Number of marker characters on the opening line.
    pub length: usize,
}

/// Tracks code block state across consecutive lines of one document.
#[derive(Debug, Clone, Default)]
pub struct CodeBlockTracker {
    // Open fence and the content column it is relative to.
    fence: Option<(Fence, usize)>,
    // Indented code cannot interrupt a paragraph.
    in_paragraph: bool,
    // Content column of each open list item, innermost last.
    list_indents: Vec<usize>,
}

impl CodeBlockTracker {
    /// Tracker positioned before the first line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fence currently open, if any.
    pub fn open_fence(&self) -> Option<Fence> {
        self.fence.map(|(fence, _)| fence)
    }

    /// Content column of the innermost open list item, `0` outside lists.
    pub fn content_indent(&self) -> usize {
        self.list_indents.last().copied().unwrap_or(0)
    }

    /// Feed the next line (without its line ending).
    ///
    /// Returns `true` when the line belongs to a code block, fence lines
    /// included.
    pub fn observe(&mut self, line: &str) -> bool {
        let (columns, offset) = leading_indent(line);
        let body = &line[offset..];

        if let Some((open, base)) = self.fence {
            if columns.saturating_sub(base) <= 3
                && let Some(close) = closing_fence(body)
                && close.marker == open.marker
                && close.length >= open.length
            {
                self.fence = None;
            }
            return true;
        }

        if body.trim().is_empty() {
            self.in_paragraph = false;
            return false;
        }

        let marker = list_marker(body);
        // A lazy paragraph continuation stays inside its list item.
        if !self.in_paragraph || marker.is_some() {
            while self.list_indents.last().is_some_and(|&indent| columns < indent) {
                self.list_indents.pop();
            }
        }

        let base = self.content_indent();
        if columns.saturating_sub(base) >= 4 {
            return !self.in_paragraph;
        }

        if let Some(fence) = opening_fence(body) {
            self.fence = Some((fence, base));
            self.in_paragraph = false;
            return true;
        }

        if let Some(width) = marker {
            self.list_indents.push(columns + width);
        }
        self.in_paragraph = true;
        false
    }
}

/// Returns (visual columns, byte offset) of the leading indentation; tabs
/// advance to the next multiple of four.
fn leading_indent(line: &str) -> (usize, usize) {
    let mut columns = 0;
    let mut offset = 0;
    for b in line.bytes() {
        match b {
            b' ' => columns += 1,
            b'\t' => columns += 4 - (columns % 4),
            _ => break,
        }
        offset += 1;
    }
    (columns, offset)
}

/// Width of a list item marker at the start of `body`, following spaces
/// included, or `None` when `body` does not start a list item.
fn list_marker(body: &str) -> Option<usize> {
    if is_thematic_break(body) {
        return None;
    }
    let bytes = body.as_bytes();
    let marker = match bytes.first()? {
        b'-' | b'*' | b'+' => 1,
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 || !matches!(bytes.get(digits), Some(b'.' | b')')) {
                return None;
            }
            digits + 1
        }
        _ => return None,
    };

    let rest = &bytes[marker..];
    let spaces = rest.iter().take_while(|&&b| b == b' ').count();
    match rest.first() {
        None => Some(marker + 1),
        Some(b' ') if spaces <= 4 && spaces < rest.len() => Some(marker + spaces),
        Some(b' ' | b'\t') => Some(marker + 1),
        Some(_) => None,
    }
}

fn is_thematic_break(body: &str) -> bool {
    let marks: Vec<u8> = body
        .bytes()
        .filter(|b| !matches!(b, b' ' | b'\t'))
        .collect();
    marks.len() >= 3
        && matches!(marks[0], b'-' | b'*' | b'_')
        && marks.iter().all(|&b| b == marks[0])
}

fn marker_run(body: &str) -> Option<Fence> {
    let marker = *body.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let length = body.bytes().take_while(|&b| b == marker).count();
    (length >= 3).then_some(Fence { marker, length })
}

fn opening_fence(body: &str) -> Option<Fence> {
    let fence = marker_run(body)?;
    // Backtick fences may not carry backticks in their info string.
    if fence.marker == b'`' && body[fence.length..].contains('`') {
        return None;
    }
    Some(fence)
}

fn closing_fence(body: &str) -> Option<Fence> {
    let fence = marker_run(body)?;
    body[fence.length..]
        .trim()
        .is_empty()
        .then_some(fence)
}
