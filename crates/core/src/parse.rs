//! Markdown parsing and HTML rendering with embed support.

use crate::inline::InlineRegistry;
use crate::transform::{ExtractedEmbeds, extract_with};
use crate::{EmbedError, SourceLocation};
use markdown::mdast::Node;
use markdown::message::{Message, Place};
use std::borrow::Cow;

/// Options for the markdown pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Enable indented code blocks.
    pub code_indented: bool,
    /// Pass raw HTML from the source through to the output. Embed markup
    /// does not depend on this.
    pub raw_html: bool,
    /// Rewrite `![](mime url ...)` directives to `<video>` markup.
    pub embeds: bool,
}

impl ParseOptions {
    /// Defaults: GFM and embeds on, author HTML off.
    pub const fn markdown() -> Self {
        Self {
            gfm: true,
            code_indented: true,
            raw_html: false,
            embeds: true,
        }
    }

    /// Plain CommonMark: no GFM, no embeds, no raw HTML.
    pub const fn strict() -> Self {
        Self {
            gfm: false,
            code_indented: true,
            raw_html: false,
            embeds: false,
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            code_indented: self.code_indented,
            html_flow: self.raw_html,
            html_text: self.raw_html,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        markdown::ParseOptions {
            constructs,
            ..markdown::ParseOptions::default()
        }
    }

    /// Convert to full markdown-rs `Options` for HTML output.
    pub fn to_html_options(self) -> markdown::Options {
        markdown::Options {
            parse: self.to_markdown(),
            compile: markdown::CompileOptions {
                allow_dangerous_html: self.raw_html,
                ..markdown::CompileOptions::default()
            },
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::markdown()
    }
}

/// Trait for preprocessing raw markdown text before parsing.
pub trait TextTransform {
    /// Transform the input markdown text, returning an owned or borrowed string.
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

impl<F> TextTransform for F
where
    F: for<'a> Fn(&'a str) -> Cow<'a, str>,
{
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str> {
        (self)(input)
    }
}

/// Trait for mutating the parsed MDAST after parsing.
pub trait AstTransform {
    /// Mutate the parsed markdown AST in place.
    fn transform(&self, root: &mut Node);
}

impl<F> AstTransform for F
where
    F: Fn(&mut Node),
{
    fn transform(&self, root: &mut Node) {
        (self)(root)
    }
}

/// Configurable parsing pipeline with optional transforms.
///
/// When `options.embeds` is set, directives are extracted before any text
/// transform runs and their markup is restored after markdown-rs is done.
pub struct ParserPipeline {
    options: ParseOptions,
    registry: InlineRegistry,
    text_transforms: Vec<Box<dyn TextTransform>>,
    ast_transforms: Vec<Box<dyn AstTransform>>,
}

impl ParserPipeline {
    /// Create a pipeline using the default inline handlers.
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            registry: InlineRegistry::with_defaults(),
            text_transforms: Vec::new(),
            ast_transforms: Vec::new(),
        }
    }

    /// Replace the inline handler registry used for embeds.
    pub fn with_registry(mut self, registry: InlineRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Options this pipeline was built with.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Add a text preprocessor transform.
    pub fn add_text_transform<T: TextTransform + 'static>(&mut self, transform: T) {
        self.text_transforms.push(Box::new(transform));
    }

    /// Add an AST transform.
    pub fn add_ast_transform<T: AstTransform + 'static>(&mut self, transform: T) {
        self.ast_transforms.push(Box::new(transform));
    }

    fn preprocess<'a>(
        &self,
        input: &'a str,
    ) -> Result<(Cow<'a, str>, Option<ExtractedEmbeds>), EmbedError> {
        let (mut current, embeds) = if self.options.embeds {
            let embeds = extract_with(&self.registry, input)?;
            (Cow::Owned(embeds.text().to_string()), Some(embeds))
        } else {
            (Cow::Borrowed(input), None)
        };
        for transform in &self.text_transforms {
            let next = transform.transform(current.as_ref());
            current = Cow::Owned(next.into_owned());
        }
        Ok((current, embeds))
    }

    /// Parse markdown into MDAST using the configured pipeline.
    ///
    /// Embeds appear as `Html` nodes before the AST transforms run.
    pub fn parse(&self, input: &str) -> Result<Node, EmbedError> {
        let (source, embeds) = self.preprocess(input)?;
        let mut root = parse_mdast_with_options(&source, &self.options.to_markdown())?;
        if let Some(embeds) = &embeds {
            embeds.splice_mdast(&mut root);
        }
        for transform in &self.ast_transforms {
            transform.transform(&mut root);
        }
        Ok(root)
    }

    /// Render markdown to HTML after the text transforms have run.
    ///
    /// AST transforms do not apply here: markdown-rs compiles HTML from
    /// source text.
    pub fn render(&self, input: &str) -> Result<String, EmbedError> {
        let (source, embeds) = self.preprocess(input)?;
        let html = markdown::to_html_with_options(&source, &self.options.to_html_options())
            .map_err(adapter_error)?;
        Ok(match embeds {
            Some(embeds) => embeds.restore_html(&html),
            None => html,
        })
    }
}

/// Render markdown to HTML, expanding embed directives when enabled.
///
/// ```
/// use mdembed_core::{ParseOptions, render_html};
///
/// let html = render_html("![](video/mp4 a.mp4)", &ParseOptions::markdown()).unwrap();
/// assert!(html.contains("<source src=\"a.mp4\" type=\"video/mp4\">"));
/// ```
pub fn render_html(input: &str, options: &ParseOptions) -> Result<String, EmbedError> {
    log::debug!("rendering markdown (embeds: {})", options.embeds);
    ParserPipeline::new(*options).render(input)
}

/// Parse markdown into an MDAST tree, expanding embed directives when enabled.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, EmbedError> {
    ParserPipeline::new(*options).parse(input)
}

/// Parse markdown into an MDAST tree using markdown-rs `ParseOptions`.
pub fn parse_mdast_with_options(
    input: &str,
    options: &markdown::ParseOptions,
) -> Result<Node, EmbedError> {
    markdown::to_mdast(input, options).map_err(adapter_error)
}

fn adapter_error(err: Message) -> EmbedError {
    EmbedError::MarkdownAdapter {
        message: err.to_string(),
        location: message_location(&err),
    }
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}
