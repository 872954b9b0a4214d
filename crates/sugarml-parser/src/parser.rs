//! Document parser for SugarML.
//!
//! Rebuilds the tree from the flat token stream. There are no block
//! delimiters: nesting comes from the indentation level alone. A tag records
//! the level open when it starts and keeps collecting children for as long
//! as the level stays deeper than that.

use sugarml_lexer::{Location, Token, TokenKind};
use tracing::{debug, trace};

use crate::ast::{Comment, Node, Tag, Text};
use crate::{ParseError, ParseErrorKind};

/// What a single `walk` produced. Line breaks, indentation changes and the
/// end of input move the parser without producing a node.
#[derive(Debug)]
enum Step {
    Node(Node),
    Nothing,
}

/// SugarML document parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Indentation level of the line being parsed.
    indent_level: usize,
}

impl Parser {
    /// Create a new parser for the given tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            indent_level: 0,
        }
    }

    /// Parse a token stream into document nodes.
    pub fn parse(tokens: Vec<Token>) -> Result<Vec<Node>, ParseError> {
        let mut parser = Parser::new(tokens);
        let nodes = parser.parse_document()?;
        debug!(nodes = nodes.len(), tokens = parser.tokens.len(), "parsed document");
        Ok(nodes)
    }

    fn parse_document(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        while !self.is_at_end() {
            if let Step::Node(node) = self.walk()? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn walk(&mut self) -> Result<Step, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Ok(self.end_of_input());
        };
        let location = token.span.location();

        match token.kind {
            TokenKind::Doctype(declaration) => {
                self.advance();
                Ok(Step::Node(Node::text(
                    format!("<!DOCTYPE {declaration}>"),
                    location,
                )))
            }
            TokenKind::Text(content) => {
                self.advance();
                Ok(Step::Node(Node::Text(Text { content, location })))
            }
            TokenKind::Comment(content) => {
                self.advance();
                Ok(Step::Node(Node::Comment(Comment { content, location })))
            }
            TokenKind::Tag(name) => self.parse_tag(name, location).map(Step::Node),
            TokenKind::Newline | TokenKind::Indent { .. } => self.newline_indent(),
            kind @ (TokenKind::AttributeKey(_) | TokenKind::AttributeValue(_)) => Err(
                self.error(ParseErrorKind::UnrecognizedTokenKind(kind.name()), location),
            ),
        }
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Parse a tag, its attributes and everything nested inside it:
    /// ```text
    /// ul#nav.menu
    ///   li: a(href='/') Home
    /// ```
    fn parse_tag(&mut self, name: String, location: Location) -> Result<Node, ParseError> {
        self.advance(); // consume the tag name
        let mut tag = Tag::new(name, location);

        let mut key: Option<String> = None;
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::AttributeKey(k) => {
                    let k = k.clone();
                    tag.declare_attr(&k);
                    key = Some(k);
                }
                TokenKind::AttributeValue(v) => {
                    let value = Node::text(v.clone(), token.span.location());
                    match key.as_deref() {
                        Some(k) => tag.push_attr_value(k, value),
                        None => {
                            let location = token.span.location();
                            return Err(self.error(
                                ParseErrorKind::UnrecognizedTokenKind("attributeValue"),
                                location,
                            ));
                        }
                    }
                }
                _ => break,
            }
            self.advance();
        }

        let baseline = self.indent_level;
        self.check_inline_content(baseline)?;

        if let Some(TokenKind::Text(_)) = self.peek().map(|t| &t.kind) {
            if let Step::Node(node) = self.walk()? {
                tag.content.push(node);
            }
        }

        // Same-line nested tags come first; after that, keep going while a
        // deeper level is open.
        loop {
            if let Step::Node(node) = self.walk()? {
                tag.content.push(node);
            }
            if self.indent_level <= baseline {
                break;
            }
        }

        Ok(Node::Tag(tag))
    }

    /// Inline text may be continued on deeper piped lines but cannot sit
    /// next to nested tags. A tag nested with `:` takes no indented lines at
    /// all.
    fn check_inline_content(&self, baseline: usize) -> Result<(), ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Text(_)) => match self.nested_tag(baseline) {
                Some(location) => {
                    Err(self.error(ParseErrorKind::InlineTextWithChildren, location))
                }
                None => Ok(()),
            },
            Some(TokenKind::Tag(_)) => match self.next_line_indent() {
                Some((level, location)) if level > baseline => {
                    Err(self.error(ParseErrorKind::IndentAfterInlineTag, location))
                }
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Indentation level of the next non-blank line, with the location of
    /// its first token.
    fn next_line_indent(&self) -> Option<(usize, Location)> {
        let (level, first) = self.line_at(self.line_end(self.pos)?)?;
        Some((level, self.tokens[first].span.location()))
    }

    /// Location of the first tag on the lines nested deeper than `baseline`
    /// after the current one.
    fn nested_tag(&self, baseline: usize) -> Option<Location> {
        let mut i = self.line_end(self.pos)?;
        loop {
            let (level, first) = self.line_at(i)?;
            if level <= baseline {
                return None;
            }
            let token = &self.tokens[first];
            if let TokenKind::Tag(_) = token.kind {
                return Some(token.span.location());
            }
            i = self.line_end(first)?;
        }
    }

    /// Index of the first newline at or after `i`.
    fn line_end(&self, i: usize) -> Option<usize> {
        self.tokens[i..]
            .iter()
            .position(|t| t.kind == TokenKind::Newline)
            .map(|n| i + n)
    }

    /// First non-blank line at or after token `i`: its indentation level and
    /// the index of its first content token.
    fn line_at(&self, mut i: usize) -> Option<(usize, usize)> {
        while i < self.tokens.len() && self.is_blank_at(i) {
            i += 1;
        }
        match self.tokens.get(i)?.kind {
            TokenKind::Indent { level, .. } => Some((level, i + 1)),
            _ => Some((0, i)),
        }
    }

    // =========================================================================
    // Line breaks and indentation
    // =========================================================================

    /// Consume line breaks and the indentation of the next line, adjusting
    /// the level. A deeper indent parses the line's content right away;
    /// anything else only moves the level, and every tag deeper than it
    /// stops collecting children.
    fn newline_indent(&mut self) -> Result<Step, ParseError> {
        while self.is_blank_at(self.pos) {
            self.advance();
        }

        let Some(token) = self.peek() else {
            return Ok(Step::Nothing);
        };

        match token.kind {
            TokenKind::Indent { level, .. } => {
                self.advance();
                if level > self.indent_level {
                    trace!(from = self.indent_level, to = level, "indent");
                    self.indent_level = level;
                    return self.walk();
                }
                self.dedent(level);
                Ok(Step::Nothing)
            }
            // A line without indentation is back at the root.
            _ => {
                self.dedent(0);
                Ok(Step::Nothing)
            }
        }
    }

    fn dedent(&mut self, level: usize) {
        if level != self.indent_level {
            trace!(from = self.indent_level, to = level, "dedent");
        }
        self.indent_level = level;
    }

    /// Dropping to level 0 unwinds all open tags.
    fn end_of_input(&mut self) -> Step {
        self.indent_level = 0;
        Step::Nothing
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Line breaks and whitespace-only lines carry no structure.
    fn is_blank_at(&self, i: usize) -> bool {
        match self.tokens.get(i).map(|t| &t.kind) {
            Some(TokenKind::Newline) => true,
            Some(TokenKind::Indent { .. }) => matches!(
                self.tokens.get(i + 1).map(|t| &t.kind),
                None | Some(TokenKind::Newline)
            ),
            _ => false,
        }
    }

    fn error(&self, kind: ParseErrorKind, location: Location) -> ParseError {
        ParseError::new(kind, location)
    }
}
