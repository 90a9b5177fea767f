//! HTML output for embed directives.

use std::borrow::Cow;

use crate::ast::EmbedDirective;

const VIDEO_OPEN: &[u8] = b"<video controls>";
const VIDEO_CLOSE: &[u8] = b"</video>";

/// Escape a value for use inside a quoted HTML attribute.
///
/// Escapes `&`, `<`, `>`, `"` and `'`. Bytes that are not valid UTF-8 are
/// replaced with U+FFFD first.
pub fn escape_attribute(value: &[u8]) -> Cow<'_, [u8]> {
    match String::from_utf8_lossy(value) {
        Cow::Borrowed(text) => match html_escape::encode_quoted_attribute(text) {
            Cow::Borrowed(_) => Cow::Borrowed(value),
            Cow::Owned(escaped) => Cow::Owned(escaped.into_bytes()),
        },
        Cow::Owned(text) => {
            Cow::Owned(html_escape::encode_quoted_attribute(&text).into_owned().into_bytes())
        }
    }
}

/// Write `<video controls><source src=".." type="..">...</video>` for a directive.
///
/// Entries are written in source order; `escape` is applied to every
/// attribute value.
///
/// ```
/// use mdembed_core::{render_embed, scan_embed};
/// use std::borrow::Cow;
///
/// let found = scan_embed(b"![](video/mp4 a.mp4)").unwrap();
/// let mut out = Vec::new();
/// render_embed(&found.directive, |v: &[u8]| Cow::Borrowed(v), &mut out);
/// assert_eq!(out, b"<video controls><source src=\"a.mp4\" type=\"video/mp4\"></video>");
/// ```
pub fn render_embed<E>(directive: &EmbedDirective, escape: E, out: &mut Vec<u8>)
where
    E: for<'a> Fn(&'a [u8]) -> Cow<'a, [u8]>,
{
    out.extend_from_slice(VIDEO_OPEN);
    for entry in directive {
        out.extend_from_slice(b"<source src=\"");
        out.extend_from_slice(&escape(entry.url.as_slice()));
        out.extend_from_slice(b"\" type=\"");
        out.extend_from_slice(&escape(entry.mime_type.as_slice()));
        out.extend_from_slice(b"\">");
    }
    out.extend_from_slice(VIDEO_CLOSE);
}

/// Render a directive to an HTML string using [`escape_attribute`].
pub fn embed_to_html(directive: &EmbedDirective) -> String {
    let mut out = Vec::new();
    render_embed(directive, escape_attribute, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}
