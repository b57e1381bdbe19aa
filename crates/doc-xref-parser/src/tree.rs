use std::ops::Range;

use crate::lines::byte_to_line;

/// Parsed markup document: a node tree plus the bookkeeping needed to map
/// spans back to source lines.
#[derive(Clone, Debug)]
pub struct Document {
    root: Node,
    front_matter: Option<Range<usize>>,
    line_offsets: Vec<usize>,
}

impl Document {
    pub(crate) fn new(
        root: Node,
        front_matter: Option<Range<usize>>,
        line_offsets: Vec<usize>,
    ) -> Self {
        Document {
            root,
            front_matter,
            line_offsets,
        }
    }

    /// The root node; its children are the top-level blocks.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Byte range of the skipped front-matter block, if one was present.
    pub fn front_matter(&self) -> Option<&Range<usize>> {
        self.front_matter.as_ref()
    }

    /// 1-based source line of a byte offset.
    pub fn line_of(&self, byte: usize) -> usize {
        byte_to_line(byte, &self.line_offsets)
    }

    /// Pre-order walk over every node in the document, root included.
    pub fn descendants(&self) -> Descendants<'_> {
        self.root.descendants()
    }
}

/// A block or inline node. Spans are byte offsets into the full source text,
/// front matter included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Range<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Range<usize>) -> Self {
        Node {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    /// Text of this node when it is a plain text run.
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Node types surfaced by parsers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Heading { level: u8 },
    Paragraph,
    BlockQuote,
    CodeBlock,
    List,
    Item,
    Table,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { destination: String, title: String },
    Image { destination: String, title: String },
    /// Any other container (footnote definitions, table heads, ...).
    Block,
    Text(String),
    Code(String),
    Html(String),
    Break,
    Rule,
    FootnoteReference(String),
    TaskListMarker(bool),
}

/// Pre-order iterator returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
