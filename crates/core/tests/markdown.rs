//! End-to-end markdown rendering with embeds.

use mdembed_core::{ParseOptions, render_html};

fn render(input: &str) -> String {
    render_html(input, &ParseOptions::markdown()).unwrap()
}

#[test]
fn single_embed_paragraph() {
    insta::assert_snapshot!(
        render("![](video/mp4 a.mp4)"),
        @r#"<p><video controls><source src="a.mp4" type="video/mp4"></video></p>"#
    );
}

#[test]
fn multiple_sources() {
    insta::assert_snapshot!(
        render("![](video/mp4 a.mp4 video/webm b.webm)"),
        @r#"<p><video controls><source src="a.mp4" type="video/mp4"><source src="b.webm" type="video/webm"></video></p>"#
    );
}

#[test]
fn escaped_quote_in_url() {
    let html = render("![](video/mp4 'a\"b.mp4')");
    assert!(html.contains("<source src=\"a&quot;b.mp4\" type=\"video/mp4\">"));
}

#[test]
fn embed_mixed_with_emphasis() {
    let html = render("*Look:* ![](video/mp4 a.mp4) **now**");
    assert!(html.contains("<em>Look:</em>"));
    assert!(html.contains("<video controls>"));
    assert!(html.contains("<strong>now</strong>"));
}

#[test]
fn malformed_directive_renders_as_text() {
    let html = render("![](video/mp4)");
    assert!(!html.contains("<video"));
}

#[test]
fn code_span_is_untouched() {
    let html = render("`![](video/mp4 a.mp4)`");
    assert!(html.contains("<code>![](video/mp4 a.mp4)</code>"));
    assert!(!html.contains("<video"));
}

#[test]
fn fenced_code_is_untouched() {
    let html = render("```\n![](video/mp4 a.mp4)\n```\n");
    assert!(html.contains("<pre><code>![](video/mp4 a.mp4)\n</code></pre>"));
    assert!(!html.contains("<video"));
}

#[test]
fn embeds_disabled() {
    let html = render_html("![](video/mp4 a.mp4)", &ParseOptions::strict()).unwrap();
    assert!(!html.contains("<video"));
}

#[test]
fn rendering_is_deterministic() {
    let input = "![](video/mp4 a.mp4)\n\ntext ![](video/webm b.webm)";
    assert_eq!(render(input), render(input));
}

#[test]
fn indented_code_after_blank_line() {
    insta::assert_snapshot!(render("para\n\n    ![](video/mp4 a.mp4)\n"), @r"
    <p>para</p>
    <pre><code>![](video/mp4 a.mp4)
    </code></pre>
    ");
}

#[test]
fn list_continuation_embed() {
    insta::assert_snapshot!(render("- item\n\n    ![](video/mp4 a.mp4)\n"), @r#"
    <ul>
    <li>
    <p>item</p>
    <p><video controls><source src="a.mp4" type="video/mp4"></video></p>
    </li>
    </ul>
    "#);
}

#[test]
fn author_html_is_escaped_by_default() {
    insta::assert_snapshot!(
        render("<script>alert(1)</script>\n\nhi <img src=x onerror=alert(1)>"),
        @r"
    <p>&lt;script&gt;alert(1)&lt;/script&gt;</p>
    <p>hi &lt;img src=x onerror=alert(1)&gt;</p>
    "
    );
}

#[test]
fn blockquote_embed() {
    insta::assert_snapshot!(render("> ![](video/mp4 a.mp4)"), @r#"
    <blockquote>
    <p><video controls><source src="a.mp4" type="video/mp4"></video></p>
    </blockquote>
    "#);
}

#[test]
fn table_cell_embed() {
    insta::assert_snapshot!(render("| clip |\n| --- |\n| ![](video/mp4 a.mp4) |"), @r#"
    <table>
    <thead>
    <tr>
    <th>clip</th>
    </tr>
    </thead>
    <tbody>
    <tr>
    <td><video controls><source src="a.mp4" type="video/mp4"></video></td>
    </tr>
    </tbody>
    </table>
    "#);
}

#[test]
fn code_span_across_lines_is_untouched() {
    insta::assert_snapshot!(
        render("`code\n![](video/mp4 a.mp4)`\n"),
        @"<p><code>code ![](video/mp4 a.mp4)</code></p>"
    );
}

#[test]
fn directive_in_image_alt_stays_text() {
    insta::assert_snapshot!(
        render("![![](video/mp4 a.mp4)](poster.png)"),
        @r#"<p><img src="poster.png" alt="![](video/mp4 a.mp4)" /></p>"#
    );
}
