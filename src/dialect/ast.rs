//! Abstract syntax tree for Container Linux Config documents

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// How a scalar was written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    /// Bare text: `mode: 0644`
    Plain,
    /// Single or double quoted: `name: "core"`
    Quoted,
}

/// A single-line scalar value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub value: String,
    pub style: ScalarStyle,
}

impl Scalar {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            style: ScalarStyle::Plain,
        }
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            style: ScalarStyle::Quoted,
        }
    }
}

/// A mapping entry: key plus value
pub type Entry = (Spanned<String>, Spanned<Node>);

/// A node in the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A key with no value
    Null,
    /// Single-line scalar
    Scalar(Scalar),
    /// Literal block scalar (`|`), indentation already removed
    Block(String),
    /// `- item` list
    Sequence(Vec<Spanned<Node>>),
    /// `key: value` map, in source order
    Mapping(Vec<Entry>),
}

impl Node {
    /// Human-readable kind used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Scalar(_) | Node::Block(_) => "string",
            Node::Sequence(_) => "list",
            Node::Mapping(_) => "mapping",
        }
    }

    /// Text of a scalar or block scalar
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(&s.value),
            Node::Block(b) => Some(b),
            _ => None,
        }
    }
}

/// Root of a parsed document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Spanned<Node>,
}

impl Document {
    /// Top-level entries, empty when the document is not a mapping
    pub fn entries(&self) -> &[Entry] {
        match &self.root.node {
            Node::Mapping(entries) => entries,
            _ => &[],
        }
    }
}
