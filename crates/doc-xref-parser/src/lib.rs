//! Markup parsing for doc-xref.
//!
//! Parsing sits behind the [`MarkupParser`] capability so the extraction
//! pipeline only ever sees a [`Document`] tree of typed block and inline
//! nodes. [`CmarkParser`] is the default implementation, backed by
//! `pulldown-cmark`. A leading front-matter block is skipped before the body
//! is handed to the markdown grammar.

mod front_matter;
mod lines;
mod tree;

use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use thiserror::Error;

pub use front_matter::front_matter_span;
pub use lines::{byte_to_line, compute_line_offsets};
pub use tree::{Descendants, Document, Node, NodeKind};

/// Reasons a single document cannot be turned into a tree.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("content is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
    #[error("front-matter block opened with '{delimiter}' is never closed")]
    UnterminatedFrontMatter { delimiter: String },
    #[error("parser produced an unbalanced node tree")]
    UnbalancedTree,
}

/// Capability: turn markup text into a node tree.
pub trait MarkupParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Document, ParseError>;

    /// Decode raw file bytes as UTF-8, then parse.
    fn parse_bytes(&self, bytes: &[u8]) -> Result<Document, ParseError> {
        let source = std::str::from_utf8(bytes).map_err(|err| ParseError::InvalidUtf8 {
            valid_up_to: err.valid_up_to(),
        })?;
        self.parse(source)
    }
}

/// CommonMark parser backed by `pulldown-cmark`.
#[derive(Clone, Debug)]
pub struct CmarkParser {
    options: Options,
}

impl CmarkParser {
    pub fn new() -> Self {
        // Heading attributes stay off so `{#id}` remains part of the heading text.
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        CmarkParser { options }
    }

    pub fn with_options(options: Options) -> Self {
        CmarkParser { options }
    }
}

impl Default for CmarkParser {
    fn default() -> Self {
        CmarkParser::new()
    }
}

impl MarkupParser for CmarkParser {
    fn parse(&self, source: &str) -> Result<Document, ParseError> {
        let front_matter = front_matter_span(source)?;
        let body_start = match &front_matter {
            Some(span) => span.end,
            None if source.starts_with('\u{feff}') => '\u{feff}'.len_utf8(),
            None => 0,
        };
        let body = &source[body_start..];

        let events = Parser::new_ext(body, self.options).into_offset_iter();
        let root = build_tree(events, body_start, source.len())?;
        Ok(Document::new(
            root,
            front_matter,
            compute_line_offsets(source),
        ))
    }
}

fn build_tree<'a, I>(events: I, offset: usize, len: usize) -> Result<Node, ParseError>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    let mut stack = vec![Node::new(NodeKind::Root, offset..len)];

    for (event, range) in events {
        let span = range.start + offset..range.end + offset;
        match event {
            Event::Start(tag) => stack.push(Node::new(kind_for_tag(tag), span)),
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(ParseError::UnbalancedTree);
                }
                let node = stack.pop().ok_or(ParseError::UnbalancedTree)?;
                attach(&mut stack, node)?;
            }
            Event::Text(text) => push_text(&mut stack, &text, span)?,
            Event::SoftBreak => push_text(&mut stack, "\n", span)?,
            Event::HardBreak => attach(&mut stack, Node::new(NodeKind::Break, span))?,
            Event::Code(code) => {
                attach(&mut stack, Node::new(NodeKind::Code(code.to_string()), span))?
            }
            Event::Html(html) => {
                attach(&mut stack, Node::new(NodeKind::Html(html.to_string()), span))?
            }
            Event::FootnoteReference(label) => attach(
                &mut stack,
                Node::new(NodeKind::FootnoteReference(label.to_string()), span),
            )?,
            Event::Rule => attach(&mut stack, Node::new(NodeKind::Rule, span))?,
            Event::TaskListMarker(checked) => {
                attach(&mut stack, Node::new(NodeKind::TaskListMarker(checked), span))?
            }
        }
    }

    if stack.len() != 1 {
        return Err(ParseError::UnbalancedTree);
    }
    stack.pop().ok_or(ParseError::UnbalancedTree)
}

fn attach(stack: &mut [Node], node: Node) -> Result<(), ParseError> {
    let parent = stack.last_mut().ok_or(ParseError::UnbalancedTree)?;
    parent.children.push(node);
    Ok(())
}

/// Append a text run, merging it into a directly preceding text sibling so a
/// heading like `Q&A` yields a single text child.
fn push_text(stack: &mut [Node], text: &str, span: Range<usize>) -> Result<(), ParseError> {
    let parent = stack.last_mut().ok_or(ParseError::UnbalancedTree)?;
    if let Some(last) = parent.children.last_mut() {
        if let NodeKind::Text(existing) = &mut last.kind {
            existing.push_str(text);
            last.span.end = last.span.end.max(span.end);
            return Ok(());
        }
    }
    parent
        .children
        .push(Node::new(NodeKind::Text(text.to_string()), span));
    Ok(())
}

fn kind_for_tag(tag: Tag<'_>) -> NodeKind {
    match tag {
        Tag::Paragraph => NodeKind::Paragraph,
        Tag::Heading(level, _, _) => NodeKind::Heading {
            level: heading_depth(level),
        },
        Tag::BlockQuote => NodeKind::BlockQuote,
        Tag::CodeBlock(_) => NodeKind::CodeBlock,
        Tag::List(_) => NodeKind::List,
        Tag::Item => NodeKind::Item,
        Tag::Table(_) => NodeKind::Table,
        Tag::TableRow => NodeKind::TableRow,
        Tag::TableCell => NodeKind::TableCell,
        Tag::Emphasis => NodeKind::Emphasis,
        Tag::Strong => NodeKind::Strong,
        Tag::Strikethrough => NodeKind::Strikethrough,
        Tag::Link(_, destination, title) => NodeKind::Link {
            destination: destination.to_string(),
            title: title.to_string(),
        },
        Tag::Image(_, destination, title) => NodeKind::Image {
            destination: destination.to_string(),
            title: title.to_string(),
        },
        _ => NodeKind::Block,
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
