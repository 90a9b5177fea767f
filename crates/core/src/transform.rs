//! Markdown text rewriting for embed directives.
//!
//! Prose is walked one paragraph at a time so code spans that cross line
//! breaks are recognized. Lines inside code blocks are copied untouched.
//!
//! [`extract_with`] swaps each directive for a slot marker that markdown-rs
//! treats as ordinary text, then puts the `<video>` markup back into the
//! compiled HTML or the MDAST. Author HTML therefore stays under the control
//! of the raw HTML option.

use markdown::mdast::{Html, Node, Text};

use crate::EmbedError;
use crate::ast::{EmbedDirective, InlineNode};
use crate::code_block::CodeBlockTracker;
use crate::inline::InlineRegistry;
use crate::render::{embed_to_html, escape_attribute, render_embed};

const SLOT_OPEN: char = '\u{E000}';
const SLOT_CLOSE: char = '\u{E001}';

/// Rewrite every embed directive in `input` to HTML.
///
/// Returns the rewritten text and the number of directives replaced. Line
/// endings are preserved as written. The markup is written straight into
/// the text, so this suits hosts that pass inline HTML through.
///
/// ```
/// use mdembed_core::rewrite_embeds;
///
/// let (out, count) = rewrite_embeds("Watch ![](video/mp4 a.mp4)\n").unwrap();
/// assert_eq!(count, 1);
/// assert_eq!(out, "Watch <video controls><source src=\"a.mp4\" type=\"video/mp4\"></video>\n");
/// ```
pub fn rewrite_embeds(input: &str) -> Result<(String, usize), EmbedError> {
    rewrite_with(&InlineRegistry::with_defaults(), input)
}

/// Same as [`rewrite_embeds`] with a caller-supplied handler registry.
pub fn rewrite_with(registry: &InlineRegistry, input: &str) -> Result<(String, usize), EmbedError> {
    let mut count = 0usize;
    let output = walk_prose(registry, input, |directive, _, out| {
        render_embed(directive, escape_attribute, out);
        count += 1;
    })?;
    log::debug!("rewrote {count} embed directive(s)");
    Ok((output, count))
}

/// Replace every embed directive in `input` with a slot marker.
pub fn extract_embeds(input: &str) -> Result<ExtractedEmbeds, EmbedError> {
    extract_with(&InlineRegistry::with_defaults(), input)
}

/// Same as [`extract_embeds`] with a caller-supplied handler registry.
pub fn extract_with(registry: &InlineRegistry, input: &str) -> Result<ExtractedEmbeds, EmbedError> {
    let mut slots = Vec::new();
    let text = walk_prose(registry, input, |directive, source, out| {
        out.extend_from_slice(format!("{SLOT_OPEN}{}{SLOT_CLOSE}", slots.len()).as_bytes());
        slots.push(EmbedSlot {
            html: embed_to_html(directive),
            source: String::from_utf8_lossy(source).into_owned(),
        });
    })?;
    log::debug!("extracted {} embed directive(s)", slots.len());
    Ok(ExtractedEmbeds { text, slots })
}

/// One extracted directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedSlot {
    /// Rendered `<video>` markup.
    pub html: String,
    /// Directive text as written in the source.
    pub source: String,
}

/// Markdown text with directives swapped for slot markers.
#[derive(Clone, Debug, Default)]
pub struct ExtractedEmbeds {
    text: String,
    slots: Vec<EmbedSlot>,
}

impl ExtractedEmbeds {
    /// The rewritten markdown.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Extracted directives, in source order.
    pub fn slots(&self) -> &[EmbedSlot] {
        &self.slots
    }

    /// Put the embed markup back into compiled HTML.
    ///
    /// A marker that ended up inside a tag, such as an image `alt`, gets the
    /// escaped directive source instead of markup.
    pub fn restore_html(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut in_tag = false;
        let mut rest = html;
        while let Some((start, end, slot)) = self.next_slot(rest) {
            let before = &rest[..start];
            if let Some(i) = before.rfind(['<', '>']) {
                in_tag = before.as_bytes()[i] == b'<';
            }
            out.push_str(before);
            if in_tag {
                out.push_str(&html_escape::encode_quoted_attribute(&slot.source));
            } else {
                out.push_str(&slot.html);
            }
            rest = &rest[end..];
        }
        out.push_str(rest);
        out
    }

    /// Replace slot markers in plain text with the directive source.
    pub fn restore_source(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some((start, end, slot)) = self.next_slot(rest) {
            out.push_str(&rest[..start]);
            out.push_str(&slot.source);
            rest = &rest[end..];
        }
        out.push_str(rest);
        out
    }

    /// Turn slot markers in an MDAST into `Html` nodes.
    ///
    /// Markers in attribute-like fields (image `alt`, titles) and in code get
    /// the directive source back.
    pub fn splice_mdast(&self, node: &mut Node) {
        if self.slots.is_empty() {
            return;
        }
        match node {
            Node::Image(image) => {
                image.alt = self.restore_source(&image.alt);
                if let Some(title) = image.title.as_mut() {
                    *title = self.restore_source(title);
                }
            }
            Node::Link(link) => {
                if let Some(title) = link.title.as_mut() {
                    *title = self.restore_source(title);
                }
            }
            Node::InlineCode(code) => code.value = self.restore_source(&code.value),
            Node::Code(code) => code.value = self.restore_source(&code.value),
            _ => {}
        }

        let Some(children) = node.children_mut() else {
            return;
        };
        let mut spliced = Vec::with_capacity(children.len());
        for mut child in std::mem::take(children) {
            if let Node::Text(text) = &child
                && self.next_slot(&text.value).is_some()
            {
                self.split_text(&text.value, &mut spliced);
                continue;
            }
            self.splice_mdast(&mut child);
            spliced.push(child);
        }
        *children = spliced;
    }

    fn split_text(&self, value: &str, out: &mut Vec<Node>) {
        let mut rest = value;
        while let Some((start, end, slot)) = self.next_slot(rest) {
            push_text_node(out, &rest[..start]);
            out.push(Node::Html(Html {
                value: slot.html.clone(),
                position: None,
            }));
            rest = &rest[end..];
        }
        push_text_node(out, rest);
    }

    /// Byte range and slot of the first well-formed marker in `text`.
    fn next_slot(&self, text: &str) -> Option<(usize, usize, &EmbedSlot)> {
        let mut from = 0;
        while let Some(offset) = text[from..].find(SLOT_OPEN) {
            let start = from + offset;
            let body = &text[start + SLOT_OPEN.len_utf8()..];
            let digits = body.bytes().take_while(|b| b.is_ascii_digit()).count();
            if digits > 0
                && body[digits..].starts_with(SLOT_CLOSE)
                && let Ok(index) = body[..digits].parse::<usize>()
                && let Some(slot) = self.slots.get(index)
            {
                let end = start + SLOT_OPEN.len_utf8() + digits + SLOT_CLOSE.len_utf8();
                return Some((start, end, slot));
            }
            from = start + SLOT_OPEN.len_utf8();
        }
        None
    }
}

fn push_text_node(out: &mut Vec<Node>, value: &str) {
    if !value.is_empty() {
        out.push(Node::Text(Text {
            value: value.to_string(),
            position: None,
        }));
    }
}

/// Walk `input`, handing each directive outside code to `emit`.
///
/// Consecutive prose lines are walked together; blank lines, headings and
/// code lines end a run.
fn walk_prose<F>(registry: &InlineRegistry, input: &str, mut emit: F) -> Result<String, EmbedError>
where
    F: FnMut(&EmbedDirective, &[u8], &mut Vec<u8>),
{
    let mut tracker = CodeBlockTracker::new();
    let mut output = Vec::with_capacity(input.len());
    let mut run_start: Option<usize> = None;
    let mut offset = 0;

    for raw in input.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        let is_code = tracker.observe(line);
        let standalone = is_atx_heading(line);

        if is_code || standalone || line.trim().is_empty() {
            if let Some(start) = run_start.take() {
                walk_run(registry, &input[start..offset], &mut output, &mut emit);
            }
            if standalone && !is_code {
                walk_run(registry, raw, &mut output, &mut emit);
            } else {
                output.extend_from_slice(raw.as_bytes());
            }
        } else {
            run_start.get_or_insert(offset);
        }
        offset += raw.len();
    }
    if let Some(start) = run_start {
        walk_run(registry, &input[start..], &mut output, &mut emit);
    }

    Ok(String::from_utf8(output)?)
}

fn walk_run<F>(registry: &InlineRegistry, run: &str, output: &mut Vec<u8>, emit: &mut F)
where
    F: FnMut(&EmbedDirective, &[u8], &mut Vec<u8>),
{
    let run = run.as_bytes();
    for spanned in registry.parse_spans(run) {
        match &spanned.node {
            InlineNode::Text(bytes) => output.extend_from_slice(bytes),
            InlineNode::Embed(directive) => emit(directive, &run[spanned.span.clone()], output),
        }
    }
}

fn is_atx_heading(line: &str) -> bool {
    let body = line.trim_start_matches(' ');
    if line.len() - body.len() > 3 {
        return false;
    }
    let hashes = body.bytes().take_while(|&b| b == b'#').count();
    (1..=6).contains(&hashes) && matches!(body.as_bytes().get(hashes), None | Some(b' ' | b'\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::InlineHandler;

    const VIDEO_A: &str = "<video controls><source src=\"a.mp4\" type=\"video/mp4\"></video>";

    fn rewrite(input: &str) -> (String, usize) {
        rewrite_embeds(input).unwrap()
    }

    #[test]
    fn rewrites_directive_in_paragraph() {
        let (out, count) = rewrite("before ![](video/mp4 a.mp4) after");
        assert_eq!(count, 1);
        assert_eq!(out, format!("before {VIDEO_A} after"));
    }

    #[test]
    fn keeps_line_endings() {
        let (out, count) = rewrite("![](video/mp4 a.mp4)\r\nplain\n![](video/mp4 a.mp4)");
        assert_eq!(count, 2);
        assert_eq!(out, format!("{VIDEO_A}\r\nplain\n{VIDEO_A}"));
    }

    #[test]
    fn skips_fenced_code() {
        let input = "```\n![](video/mp4 a.mp4)\n```\n";
        assert_eq!(rewrite(input), (input.to_string(), 0));
    }

    #[test]
    fn skips_indented_code() {
        let input = "para\n\n    ![](video/mp4 a.mp4)\n";
        assert_eq!(rewrite(input), (input.to_string(), 0));
    }

    #[test]
    fn rewrites_list_continuation() {
        let (out, count) = rewrite("- item\n\n    ![](video/mp4 a.mp4)\n");
        assert_eq!(count, 1);
        assert_eq!(out, format!("- item\n\n    {VIDEO_A}\n"));
    }

    #[test]
    fn code_span_across_lines_is_left_alone() {
        let input = "`code\n![](video/mp4 a.mp4)`\n";
        assert_eq!(rewrite(input), (input.to_string(), 0));
    }

    #[test]
    fn code_span_does_not_cross_blank_line() {
        let (out, count) = rewrite("`code\n\n![](video/mp4 a.mp4)`\n");
        assert_eq!(count, 1);
        assert_eq!(out, format!("`code\n\n{VIDEO_A}`\n"));
    }

    #[test]
    fn heading_ends_code_span_run() {
        let (out, count) = rewrite("# a `b\n![](video/mp4 a.mp4) `\n");
        assert_eq!(count, 1);
        assert_eq!(out, format!("# a `b\n{VIDEO_A} `\n"));
    }

    #[test]
    fn malformed_directive_is_left_alone() {
        let input = "![](video/mp4)\n![](\"a.mp4)\n";
        assert_eq!(rewrite(input), (input.to_string(), 0));
    }

    #[test]
    fn non_ascii_text_survives() {
        let (out, count) = rewrite("vidéo ![](video/mp4 'ça.mp4') ✓");
        assert_eq!(count, 1);
        assert_eq!(
            out,
            "vidéo <video controls><source src=\"ça.mp4\" type=\"video/mp4\"></video> ✓"
        );
    }

    #[test]
    fn empty_registry_rewrites_nothing() {
        let (out, count) = rewrite_with(&InlineRegistry::new(), "![](video/mp4 a.mp4)").unwrap();
        assert_eq!(out, "![](video/mp4 a.mp4)");
        assert_eq!(count, 0);
    }

    fn first_byte_only(_: &[u8]) -> Option<(InlineNode, usize)> {
        Some((InlineNode::Text(b"?".to_vec()), 1))
    }

    #[test]
    fn splitting_a_character_is_an_encoding_error() {
        let registry = InlineRegistry::new().with_handler(InlineHandler {
            name: "split",
            trigger: 0xC3,
            priority: 1,
            scan: first_byte_only,
        });
        let err = rewrite_with(&registry, "é").unwrap_err();
        assert!(matches!(err, EmbedError::Encoding(_)));
    }

    #[test]
    fn extract_leaves_markers_and_keeps_source() {
        let extracted = extract_embeds("a ![](video/mp4 a.mp4) b").unwrap();
        assert_eq!(extracted.text(), "a \u{E000}0\u{E001} b");
        assert_eq!(extracted.slots().len(), 1);
        assert_eq!(extracted.slots()[0].source, "![](video/mp4 a.mp4)");
        assert_eq!(extracted.slots()[0].html, VIDEO_A);
    }

    #[test]
    fn restore_html_places_markup_in_text() {
        let extracted = extract_embeds("![](video/mp4 a.mp4)").unwrap();
        let html = extracted.restore_html("<p>\u{E000}0\u{E001}</p>");
        assert_eq!(html, format!("<p>{VIDEO_A}</p>"));
    }

    #[test]
    fn restore_html_escapes_source_inside_tags() {
        let extracted = extract_embeds("![](video/mp4 'x\" onerror=y')").unwrap();
        let html = extracted.restore_html("<img alt=\"\u{E000}0\u{E001}\" /> \u{E000}0\u{E001}");
        assert!(html.starts_with("<img alt=\"![](video/mp4 &#x27;x&quot; onerror=y&#x27;)\" /> "));
        assert!(html.ends_with("<source src=\"x&quot; onerror=y\" type=\"video/mp4\"></video>"));
    }

    #[test]
    fn unknown_markers_are_kept() {
        let extracted = extract_embeds("![](video/mp4 a.mp4)").unwrap();
        let text = "\u{E000}7\u{E001} \u{E000}x\u{E001}";
        assert_eq!(extracted.restore_html(text), text);
        assert_eq!(extracted.restore_source(text), text);
    }

    #[test]
    fn splice_turns_markers_into_html_nodes() {
        let extracted = extract_embeds("a ![](video/mp4 a.mp4) b").unwrap();
        let mut root = markdown::to_mdast(extracted.text(), &markdown::ParseOptions::default())
            .unwrap();
        extracted.splice_mdast(&mut root);

        let Node::Root(root) = root else {
            panic!("expected root");
        };
        let Node::Paragraph(paragraph) = &root.children[0] else {
            panic!("expected paragraph");
        };
        let kinds: Vec<&str> = paragraph
            .children
            .iter()
            .map(|child| match child {
                Node::Text(_) => "text",
                Node::Html(_) => "html",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["text", "html", "text"]);
    }
}
