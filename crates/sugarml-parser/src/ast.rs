//! Document tree produced by the parser.
//!
//! The shape is what a tree-to-markup renderer consumes: an ordered list of
//! text, comment and tag nodes, each with the location it came from. It
//! serializes to
//!
//! ```text
//! {"type":"tag","name":"a","attrs":{"href":[{"type":"text","content":"/", ..}]},
//!  "content":[..],"location":{"line":1,"col":1}}
//! ```

use indexmap::IndexMap;
use serde::Serialize;

pub use sugarml_lexer::Location;

/// Attribute values by name, in declaration order. Each value is a list of
/// text fragments; repeated assignments are separated by a `" "` fragment.
pub type Attributes = IndexMap<String, Vec<Node>>;

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Literal text, including doctype declarations.
    Text(Text),

    /// A `// comment` line.
    Comment(Comment),

    /// An element with optional attributes and children.
    Tag(Tag),
}

impl Node {
    pub fn text(content: impl Into<String>, location: Location) -> Self {
        Node::Text(Text {
            content: content.into(),
            location,
        })
    }

    pub fn location(&self) -> Location {
        match self {
            Node::Text(t) => t.location,
            Node::Comment(c) => c.location,
            Node::Tag(t) => t.location,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Text or comment body.
    pub fn content(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(&t.content),
            Node::Comment(c) => Some(&c.content),
            Node::Tag(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub content: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub content: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attributes>,
    pub content: Vec<Node>,
    pub location: Location,
}

impl Tag {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            attrs: None,
            content: Vec::new(),
            location,
        }
    }

    /// Fragments assigned to attribute `name`.
    pub fn attr(&self, name: &str) -> Option<&[Node]> {
        self.attrs.as_ref()?.get(name).map(Vec::as_slice)
    }

    /// Fragments of attribute `name` joined into one string.
    pub fn attr_text(&self, name: &str) -> Option<String> {
        self.attr(name)
            .map(|fragments| fragments.iter().filter_map(Node::content).collect())
    }

    /// Add a value for `key`, separating it from earlier values with a space
    /// fragment.
    pub(crate) fn push_attr_value(&mut self, key: &str, value: Node) {
        let fragments = self
            .attrs
            .get_or_insert_with(Attributes::new)
            .entry(key.to_string())
            .or_default();
        if !fragments.is_empty() {
            fragments.push(Node::text(" ", value.location()));
        }
        fragments.push(value);
    }

    /// Declare `key`, keeping any values it already has.
    pub(crate) fn declare_attr(&mut self, key: &str) {
        self.attrs
            .get_or_insert_with(Attributes::new)
            .entry(key.to_string())
            .or_default();
    }
}
