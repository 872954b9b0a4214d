//! SugarML Parser
//!
//! Parses the lexer's token stream into a document tree of text, comment and
//! tag nodes, and offers [`parse_source`] to run both stages at once.
//!
//! # Example
//!
//! ```
//! use sugarml_parser::{parse_source, Node, Options};
//!
//! let nodes = parse_source("ul\n  li: a(href='/') Home", &Options::default()).unwrap();
//! let Node::Tag(ul) = &nodes[0] else { panic!() };
//! assert_eq!(ul.name, "ul");
//! assert_eq!(ul.content.len(), 1);
//! ```

pub mod ast;
pub mod parser;

pub use ast::{Attributes, Comment, Location, Node, Tag, Text};
pub use parser::Parser;
pub use sugarml_lexer::{Diagnostic, LexErrorKind, LexerError, Options, Token};

/// Parse a token stream into document nodes.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Node>, ParseError> {
    Parser::parse(tokens)
}

/// Lex and parse `source`.
#[tracing::instrument(level = "debug", skip_all, fields(filename = ?options.filename))]
pub fn parse_source(source: &str, options: &Options) -> Result<Vec<Node>, Error> {
    let tokens = sugarml_lexer::lex(source, options)?;
    let nodes = parse(tokens).map_err(|e| e.in_source(source, options.filename.as_deref()))?;
    Ok(nodes)
}

/// What went wrong while building the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// A token the tree builder has no rule for. The lexer never produces
    /// one in that position, so this points at a hand-built token stream.
    #[error("Unrecognized token type: {0}")]
    UnrecognizedTokenKind(&'static str),

    #[error(
        "Cannot mix inline text with nested content on the same tag\n\
         Move the text onto its own indented line with a pipe, e.g. `p` then `  | text`"
    )]
    InlineTextWithChildren,

    #[error(
        "Cannot indent content beneath a tag nested inline with `:`\n\
         Put the nested tag on its own indented line instead"
    )]
    IndentAfterInlineTag,
}

/// Parser error with position information and a rendered report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{diagnostic}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub diagnostic: Diagnostic,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, location: Location) -> Self {
        let diagnostic = Diagnostic::new(kind.to_string(), Some(location));
        Self { kind, diagnostic }
    }

    /// Name the file and attach an excerpt of the source it came from.
    pub fn in_source(mut self, source: &str, filename: Option<&str>) -> Self {
        self.diagnostic = self
            .diagnostic
            .with_filename(filename)
            .with_source(source);
        self
    }

    /// The bare message, without location or excerpt.
    pub fn message(&self) -> &str {
        &self.diagnostic.message
    }

    pub fn line(&self) -> usize {
        self.diagnostic.location.map_or(0, |l| l.line)
    }

    pub fn column(&self) -> usize {
        self.diagnostic.location.map_or(0, |l| l.column)
    }

    pub fn filename(&self) -> &str {
        &self.diagnostic.filename
    }
}

/// Failure of either pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            Error::Lex(e) => &e.diagnostic,
            Error::Parse(e) => &e.diagnostic,
        }
    }

    pub fn message(&self) -> &str {
        &self.diagnostic().message
    }

    pub fn line(&self) -> usize {
        self.diagnostic().location.map_or(0, |l| l.line)
    }

    pub fn column(&self) -> usize {
        self.diagnostic().location.map_or(0, |l| l.column)
    }

    pub fn filename(&self) -> &str {
        &self.diagnostic().filename
    }
}
