//! Human-readable diagnostics.
//!
//! A [`Diagnostic`] pairs a message with the place it applies to and, when
//! the source text is at hand, a code frame around that place rendered by
//! miette:
//!
//! ```text
//! Cannot parse character "<"
//! Location: page.sml:2:3
//!
//!    ,-[page.sml:2:3]
//!  1 | div
//!  2 |   <p>
//!    :   |
//!    :   `-- here
//!  3 | footer
//!    `----
//! ```

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use std::fmt;

use miette::{GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use serde::Serialize;

use crate::scanner::normalize;

/// Filename shown when the caller did not name the source.
pub const NO_FILENAME: &str = "[no filename]";

/// Lines of context rendered on each side of the failing line.
const CONTEXT_LINES: usize = 2;

/// Wrap width for frame labels.
const FRAME_WIDTH: usize = 100;

/// A 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    #[serde(rename = "col")]
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A rendered error report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub location: Option<Location>,
    pub filename: String,
    pub excerpt: Option<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            message: message.into(),
            location,
            filename: NO_FILENAME.to_string(),
            excerpt: None,
        }
    }

    /// Name the source file. `None` keeps the placeholder.
    pub fn with_filename(mut self, filename: Option<&str>) -> Self {
        self.filename = filename.unwrap_or(NO_FILENAME).to_string();
        self
    }

    /// Attach a code frame rendered from `source`. Without a location there
    /// is nothing to frame and the diagnostic is unchanged.
    pub fn with_source(mut self, source: &str) -> Self {
        if let Some(location) = self.location {
            self.excerpt = code_frame(source, &self.filename, location);
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(location) = self.location {
            write!(
                f,
                "\nLocation: {}:{}:{}",
                self.filename, location.line, location.column
            )?;
        }
        if let Some(excerpt) = &self.excerpt {
            write!(f, "\n\n{excerpt}")?;
        }
        Ok(())
    }
}

/// The source and span miette renders a frame for. The message lives in
/// [`Diagnostic`], so the frame itself has none.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("")]
struct Frame {
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
}

/// Render the lines around `location` with a label under the failing
/// column. Returns `None` when the line is outside the source.
pub fn code_frame(source: &str, filename: &str, location: Location) -> Option<String> {
    let source = normalize(source);
    let offset = byte_offset(&source, location)?;
    let len = source[offset..].chars().next().map_or(0, char::len_utf8);

    let frame = Frame {
        src: NamedSource::new(filename, source),
        span: (offset, len).into(),
    };

    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none())
        .with_context_lines(CONTEXT_LINES)
        .with_width(FRAME_WIDTH);
    let mut rendered = String::new();
    handler.render_report(&mut rendered, &frame).ok()?;

    // Drop the empty message header; the snippet starts at its `[name:l:c]`
    // banner.
    let excerpt: Vec<&str> = rendered
        .lines()
        .skip_while(|line| !line.contains('['))
        .map(str::trim_end)
        .collect();
    let excerpt = excerpt.join("\n");
    let excerpt = excerpt.trim_end();
    (!excerpt.is_empty()).then(|| excerpt.to_string())
}

/// Byte offset of a 1-based line and column in normalized source. Columns
/// past the end of the line clamp to the line break.
fn byte_offset(source: &str, location: Location) -> Option<usize> {
    let line_index = location.line.checked_sub(1)?;
    let mut start = 0;
    for (index, line) in source.split('\n').enumerate() {
        if index == line_index {
            let column = location.column.saturating_sub(1);
            let within = line
                .char_indices()
                .nth(column)
                .map_or(line.len(), |(i, _)| i);
            return Some(start + within);
        }
        start += line.len() + 1;
    }
    None
}
