use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::diagnostic::Location;

/// A position in source text, tracking line and column for error reporting.
///
/// `start` and `end` are character offsets into the normalized source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Line and column of the first character covered by the span.
    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }
}

/// Token classification for SugarML source.
///
/// Data-carrying variants embed their raw lexed value directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `doctype html` on the first line; carries the declaration (`html`).
    Doctype(String),
    /// Piped text, trailing inline text, or a block-content body.
    Text(String),
    /// An element name, explicit or the implicit `div` of a shorthand.
    Tag(String),
    AttributeKey(String),
    AttributeValue(String),
    /// Leading whitespace of a line. `level` is the raw character count.
    Indent { level: usize, whitespace: String },
    Newline,
    Comment(String),
}

impl TokenKind {
    /// The camelCase kind name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Doctype(_) => "doctype",
            TokenKind::Text(_) => "text",
            TokenKind::Tag(_) => "tag",
            TokenKind::AttributeKey(_) => "attributeKey",
            TokenKind::AttributeValue(_) => "attributeValue",
            TokenKind::Indent { .. } => "indent",
            TokenKind::Newline => "newline",
            TokenKind::Comment(_) => "comment",
        }
    }

    /// Tags and attribute tokens may be followed by a shorthand, an attribute
    /// list or trailing inline text.
    pub fn is_tag_part(&self) -> bool {
        matches!(
            self,
            TokenKind::Tag(_) | TokenKind::AttributeKey(_) | TokenKind::AttributeValue(_)
        )
    }
}

/// A token produced by the SugarML lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The raw payload of the token.
    pub fn value(&self) -> &str {
        match &self.kind {
            TokenKind::Doctype(v)
            | TokenKind::Text(v)
            | TokenKind::Tag(v)
            | TokenKind::AttributeKey(v)
            | TokenKind::AttributeValue(v)
            | TokenKind::Comment(v) => v,
            TokenKind::Indent { whitespace, .. } => whitespace,
            TokenKind::Newline => "\n",
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }
}

/// Serializes flat, with the raw payload as `value`:
/// `{"type":"indent","value":"  ","level":2,"line":2,"col":1,"start":4,"end":6}`.
/// `level` is only present on indents.
impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let level = match self.kind {
            TokenKind::Indent { level, .. } => Some(level),
            _ => None,
        };
        let fields = if level.is_some() { 7 } else { 6 };
        let mut state = serializer.serialize_struct("Token", fields)?;
        state.serialize_field("type", self.kind.name())?;
        state.serialize_field("value", self.value())?;
        match level {
            Some(level) => state.serialize_field("level", &level)?,
            None => state.skip_field("level")?,
        }
        state.serialize_field("line", &self.line())?;
        state.serialize_field("col", &self.column())?;
        state.serialize_field("start", &self.span.start)?;
        state.serialize_field("end", &self.span.end)?;
        state.end()
    }
}
