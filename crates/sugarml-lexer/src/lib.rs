//! SugarML Lexer
//!
//! Tokenizes SugarML source into a flat stream of position-annotated tokens.
//! Handles tags, `#id`/`.class` shorthands, attribute lists, piped and
//! block text, inline `:` nesting, comments and indentation.
//!
//! # Example
//!
//! ```
//! use sugarml_lexer::{lex, Options, TokenKind};
//!
//! let tokens = lex("p.intro hello", &Options::default()).unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Tag("p".into()));
//! assert_eq!(tokens.len(), 4); // tag, class key, class value, text
//! ```

pub mod diagnostic;
pub mod scanner;
pub mod token;


use serde::Deserialize;

pub use diagnostic::{code_frame, Diagnostic, Location, NO_FILENAME};
pub use scanner::{normalize, strip_common_indent, Scanner, TagContext};
pub use token::{Span, Token, TokenKind};

/// Options shared by the lexer and the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Name of the source file, used only in diagnostics.
    pub filename: Option<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Tokenize `source`.
pub fn lex(source: &str, options: &Options) -> Result<Vec<Token>, LexerError> {
    Scanner::tokenize(source, options)
}

/// What went wrong while lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("Cannot parse character \"{0}\"")]
    UnrecognizedCharacter(char),
    #[error("Unclosed attribute parentheses")]
    UnclosedAttributeParen,
    #[error("Unclosed attribute quote")]
    UnclosedAttributeQuote,
}

/// Lexer error with position information and a rendered report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{diagnostic}")]
pub struct LexerError {
    pub kind: LexErrorKind,
    pub diagnostic: Diagnostic,
}

impl LexerError {
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
