use tracing::{debug, trace};

use crate::diagnostic::{Diagnostic, Location};
use crate::token::{Span, Token, TokenKind};
use crate::{LexErrorKind, LexerError, Options};

/// Whether the next shorthand opens a new element.
///
/// The `:` rule switches to `Nested`, so `a: .b` yields an implicit `div`
/// inside `a` instead of adding a class to `a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagContext {
    /// Shorthands attach to the element on the current line, if any.
    #[default]
    Continue,
    /// An inline `:` was just consumed; a tag or shorthand starts a child.
    Nested,
}

/// Forward-only position in the character buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    pos: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }
}

/// Outcome of a rule that matched: where the cursor ends up, what it emits,
/// and the tag context it leaves behind (`None` keeps the current one).
struct Step {
    cursor: Cursor,
    tokens: Vec<Token>,
    context: Option<TagContext>,
}

impl Step {
    fn to(cursor: Cursor) -> Self {
        Self {
            cursor,
            tokens: Vec::new(),
            context: None,
        }
    }

    fn token(mut self, kind: TokenKind, start: Cursor, end: Cursor) -> Self {
        let span = Span::new(start.pos, end.pos, start.line, start.column);
        self.tokens.push(Token::new(kind, span));
        self
    }

    fn context(mut self, context: TagContext) -> Self {
        self.context = Some(context);
        self
    }
}

type Scan = Result<Option<Step>, LexerError>;
type Rule = fn(&Scanner) -> Scan;

/// Lexical rules in priority order. The first rule that matches wins.
const RULES: [(&str, Rule); 10] = [
    ("doctype", Scanner::doctype),
    ("pipe", Scanner::pipe),
    ("tag", Scanner::tag),
    ("shorthand", Scanner::shorthand),
    ("attributes", Scanner::attributes),
    ("block", Scanner::block_content),
    ("whitespace", Scanner::indent_or_trailing_text),
    ("newline", Scanner::newline),
    ("nested", Scanner::nested_inline_tag),
    ("comment", Scanner::comment),
];

/// Strip a leading byte-order mark and turn `\r\n` and bare `\r` into `\n`.
pub fn normalize(source: &str) -> String {
    let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
    source.replace("\r\n", "\n").replace('\r', "\n")
}

/// Remove the indentation shared by every non-empty line and join the lines
/// with `\n`. Empty lines do not constrain the common indentation.
pub fn strip_common_indent(lines: &[String]) -> String {
    let common = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.chars().take_while(|c| is_inline_space(*c)).count())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| line.chars().skip(common).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_inline_space(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Characters that end a tag name or a shorthand value.
fn is_name_delimiter(c: char) -> bool {
    matches!(c, '#' | '.' | '(' | ':') || c.is_whitespace()
}

/// SugarML source scanner.
///
/// Walks the normalized source once with a single cursor. Every rule borrows
/// the scanner immutably and describes what it would consume as a [`Step`];
/// the scan loop commits the first step offered.
pub struct Scanner {
    source: String,
    chars: Vec<char>,
    filename: Option<String>,
    cursor: Cursor,
    context: TagContext,
    tokens: Vec<Token>,
}

impl Scanner {
    /// Create a new scanner for the given source.
    pub fn new(source: &str, options: &Options) -> Self {
        let source = normalize(source);
        Self {
            chars: source.chars().collect(),
            source,
            filename: options.filename.clone(),
            cursor: Cursor {
                pos: 0,
                line: 1,
                column: 1,
            },
            context: TagContext::Continue,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str, options: &Options) -> Result<Vec<Token>, LexerError> {
        let mut scanner = Scanner::new(source, options);
        scanner.scan_tokens()?;
        debug!(
            tokens = scanner.tokens.len(),
            lines = scanner.cursor.line,
            "lexed source"
        );
        Ok(scanner.tokens)
    }

    fn scan_tokens(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() {
            let step = self.next_step()?;
            // A rule that matched without consuming anything would loop forever.
            if step.cursor.pos <= self.cursor.pos {
                return Err(self.unrecognized(self.cursor));
            }
            self.commit(step);
        }
        Ok(())
    }

    fn next_step(&self) -> Result<Step, LexerError> {
        for (name, rule) in RULES {
            if let Some(step) = rule(self)? {
                trace!(rule = name, line = self.cursor.line, column = self.cursor.column, "matched");
                return Ok(step);
            }
        }
        Err(self.unrecognized(self.cursor))
    }

    fn commit(&mut self, step: Step) {
        self.cursor = step.cursor;
        self.tokens.extend(step.tokens);
        if let Some(context) = step.context {
            self.context = context;
        }
    }

    // --- Rules ---

    /// `doctype html` at the very start of the input.
    fn doctype(&self) -> Scan {
        let start = self.cursor;
        if start.pos != 0 || self.lookahead(start, 7) != "doctype" {
            return Ok(None);
        }
        let keyword_end = self.advance_by(start, 7);
        let mut cursor = keyword_end;
        match self.peek(keyword_end) {
            Some(c) if is_inline_space(c) => cursor = self.advance(cursor),
            None | Some('\n') => {}
            // `doctypes` and friends are ordinary tag names.
            Some(_) => return Ok(None),
        }
        let (declaration, end) = self.take_line(cursor);
        Ok(Some(Step::to(end).token(
            TokenKind::Doctype(declaration),
            start,
            end,
        )))
    }

    /// `| text`: a raw text line.
    fn pipe(&self) -> Scan {
        let start = self.cursor;
        if self.peek(start) != Some('|') {
            return Ok(None);
        }
        let mut cursor = self.advance(start);
        if self.peek(cursor).is_some_and(is_inline_space) {
            cursor = self.advance(cursor);
        }
        let (mut content, end) = self.take_line(cursor);

        // Consecutive piped lines read as one multi-line text.
        if self.next_non_whitespace(end) == Some('|') {
            content.push('\n');
        }

        Ok(Some(Step::to(end).token(TokenKind::Text(content), cursor, end)))
    }

    /// An element name at the start of a line or after an inline `:`.
    fn tag(&self) -> Scan {
        let start = self.cursor;
        if !self.peek(start).is_some_and(is_word) || !self.expects_tag() {
            return Ok(None);
        }
        let (name, end) = self.take_while(start, |c| !is_name_delimiter(c));
        Ok(Some(
            Step::to(end)
                .token(TokenKind::Tag(name), start, end)
                .context(TagContext::Continue),
        ))
    }

    /// `#id` and `.class`, opening an implicit `div` when no element is
    /// being described.
    fn shorthand(&self) -> Scan {
        let start = self.cursor;
        let key = match self.peek(start) {
            Some('#') => "id",
            Some('.') if self.peek_at(start.pos + 1).is_some_and(|c| !c.is_whitespace()) => {
                "class"
            }
            _ => return Ok(None),
        };

        let value_start = self.advance(start);
        let (value, end) = self.take_while(value_start, |c| !is_name_delimiter(c));

        let mut step = Step::to(end);
        let attached = self.last_kind().is_some_and(TokenKind::is_tag_part);
        if self.context == TagContext::Nested || !attached {
            step = step.token(TokenKind::Tag("div".into()), start, start);
        }
        Ok(Some(
            step.token(TokenKind::AttributeKey(key.into()), start, value_start)
                .token(TokenKind::AttributeValue(value), value_start, end)
                .context(TagContext::Continue),
        ))
    }

    /// `(key=value other='quoted value' flag)` after an element.
    fn attributes(&self) -> Scan {
        let open = self.cursor;
        if self.peek(open) != Some('(') || !self.last_kind().is_some_and(TokenKind::is_tag_part) {
            return Ok(None);
        }

        let mut step = Step::to(open);
        let mut cursor = self.advance(open);
        loop {
            match self.peek(cursor) {
                None => return Err(self.error(LexErrorKind::UnclosedAttributeParen, open)),
                Some(')') => {
                    cursor = self.advance(cursor);
                    break;
                }
                Some(_) => {}
            }

            let key_start = cursor;
            let (key, key_end) =
                self.take_while(cursor, |c| !matches!(c, '=' | ')') && !c.is_whitespace());
            cursor = key_end;
            if !key.is_empty() {
                step = step.token(TokenKind::AttributeKey(key.clone()), key_start, key_end);
            }

            if self.peek(cursor) == Some('=') {
                if key.is_empty() {
                    return Err(self.unrecognized(cursor));
                }
                cursor = self.advance(cursor);

                let quote_start = cursor;
                let quote = match self.peek(cursor) {
                    Some(q @ ('\'' | '"')) => {
                        cursor = self.advance(cursor);
                        Some(q)
                    }
                    _ => None,
                };

                let value_start = cursor;
                let (value, value_end) = self.attribute_value(cursor, quote, open, quote_start)?;
                if !value.is_empty() {
                    step = step.token(TokenKind::AttributeValue(value), value_start, value_end);
                }
                cursor = value_end;
                if quote.is_some() {
                    cursor = self.advance(cursor);
                }
            }

            if self.peek(cursor).is_some_and(char::is_whitespace) {
                cursor = self.advance(cursor);
            }
        }

        step.cursor = cursor;
        Ok(Some(step))
    }

    /// Collect an attribute value up to its terminator. The returned cursor
    /// points at the terminator (closing quote, whitespace or `)`).
    fn attribute_value(
        &self,
        mut cursor: Cursor,
        quote: Option<char>,
        open: Cursor,
        quote_start: Cursor,
    ) -> Result<(String, Cursor), LexerError> {
        let mut value = String::new();
        loop {
            let Some(c) = self.peek(cursor) else {
                return Err(match quote {
                    Some(_) => self.error(LexErrorKind::UnclosedAttributeQuote, quote_start),
                    None => self.error(LexErrorKind::UnclosedAttributeParen, open),
                });
            };

            match quote {
                Some(q) if c == q => break,
                None if c.is_whitespace() || c == ')' => break,
                _ => {}
            }

            if c == '\\' {
                let escaped = self.peek_at(cursor.pos + 1).filter(|next| match quote {
                    Some(q) => *next == q,
                    None => next.is_whitespace() || *next == ')',
                });
                if let Some(next) = escaped {
                    value.push(next);
                    cursor = self.advance_by(cursor, 2);
                    continue;
                }
            }

            value.push(c);
            cursor = self.advance(cursor);
        }
        Ok((value, cursor))
    }

    /// `tag.` at the end of a line: the following, more indented lines are
    /// raw text belonging to the tag.
    fn block_content(&self) -> Scan {
        let start = self.cursor;
        if self.peek(start) != Some('.') || !self.last_kind().is_some_and(TokenKind::is_tag_part) {
            return Ok(None);
        }
        let (_, eol) = self.take_while(self.advance(start), is_inline_space);
        if !matches!(self.peek(eol), None | Some('\n')) {
            return Ok(None);
        }
        let Some(min_indent) = self.owning_tag_indent() else {
            return Ok(None);
        };

        let mut lines = Vec::new();
        let mut blank_run = 0;
        let mut body_start = None;
        let mut line_break = eol;
        let mut end = self.skip_line_break(eol);

        let mut probe = end;
        while !self.at_end(probe) {
            let (indent, after_indent) = self.take_while(probe, is_inline_space);
            let (rest, line_end) = self.take_line(after_indent);
            let next_line = self.skip_line_break(line_end);

            // Blank lines belong to the block only if more content follows.
            if rest.is_empty() {
                blank_run += 1;
                probe = next_line;
                continue;
            }
            if indent.chars().count() <= min_indent {
                break;
            }

            lines.extend(std::iter::repeat(String::new()).take(blank_run));
            blank_run = 0;
            body_start.get_or_insert(probe);
            lines.push(format!("{indent}{rest}"));
            line_break = line_end;
            end = next_line;
            probe = next_line;
        }

        let mut step = Step::to(end);
        if let Some(body_start) = body_start {
            step = step.token(
                TokenKind::Text(strip_common_indent(&lines)),
                body_start,
                line_break,
            );
        }
        Ok(Some(step.token(TokenKind::Newline, line_break, end)))
    }

    /// A whitespace run: indentation after a line break, or the separator
    /// before inline text after an element.
    fn indent_or_trailing_text(&self) -> Scan {
        let start = self.cursor;
        if !self.peek(start).is_some_and(is_inline_space) {
            return Ok(None);
        }

        match self.last_kind() {
            None | Some(TokenKind::Newline) => {
                let (whitespace, end) = self.take_while(start, is_inline_space);
                let level = whitespace.chars().count();
                Ok(Some(Step::to(end).token(
                    TokenKind::Indent { level, whitespace },
                    start,
                    end,
                )))
            }
            Some(kind) if kind.is_tag_part() => {
                let content_start = self.advance(start);
                let (content, end) = self.take_line(content_start);
                // Trailing whitespace on an element carries no text.
                if content.trim().is_empty() {
                    return Ok(Some(Step::to(end)));
                }
                Ok(Some(Step::to(end).token(
                    TokenKind::Text(content),
                    content_start,
                    end,
                )))
            }
            Some(_) => Ok(None),
        }
    }

    fn newline(&self) -> Scan {
        let start = self.cursor;
        if self.peek(start) != Some('\n') {
            return Ok(None);
        }
        let end = self.advance(start);
        Ok(Some(
            Step::to(end)
                .token(TokenKind::Newline, start, end)
                .context(TagContext::Continue),
        ))
    }

    /// `a: b`: the element after the colon nests inside the one before it.
    fn nested_inline_tag(&self) -> Scan {
        let start = self.cursor;
        if self.peek(start) != Some(':') || !self.last_kind().is_some_and(TokenKind::is_tag_part) {
            return Ok(None);
        }
        let (_, end) = self.take_while(self.advance(start), is_inline_space);
        Ok(Some(Step::to(end).context(TagContext::Nested)))
    }

    /// `// comment`
    fn comment(&self) -> Scan {
        let start = self.cursor;
        if self.peek(start) != Some('/') || self.peek_at(start.pos + 1) != Some('/') {
            return Ok(None);
        }
        let mut cursor = self.advance_by(start, 2);
        if self.peek(cursor).is_some_and(is_inline_space) {
            cursor = self.advance(cursor);
        }
        let (body, end) = self.take_line(cursor);
        Ok(Some(Step::to(end).token(TokenKind::Comment(body), start, end)))
    }

    // --- Token context ---

    fn last_kind(&self) -> Option<&TokenKind> {
        self.tokens.last().map(|t| &t.kind)
    }

    /// Tag names start lines or follow an inline `:`.
    fn expects_tag(&self) -> bool {
        self.context == TagContext::Nested
            || matches!(
                self.last_kind(),
                None | Some(TokenKind::Newline) | Some(TokenKind::Indent { .. })
            )
    }

    /// Indentation of the line holding the element that owns a block, found
    /// by walking back to the start of the current line.
    fn owning_tag_indent(&self) -> Option<usize> {
        let mut saw_tag = false;
        for token in self.tokens.iter().rev() {
            match &token.kind {
                TokenKind::Tag(_) => saw_tag = true,
                TokenKind::Indent { level, .. } => return saw_tag.then_some(*level),
                TokenKind::Newline => return saw_tag.then_some(0),
                _ => {}
            }
        }
        saw_tag.then_some(0)
    }

    // --- Helpers ---

    fn peek(&self, cursor: Cursor) -> Option<char> {
        self.peek_at(cursor.pos)
    }

    fn peek_at(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    fn is_at_end(&self) -> bool {
        self.at_end(self.cursor)
    }

    fn at_end(&self, cursor: Cursor) -> bool {
        cursor.pos >= self.chars.len()
    }

    fn advance(&self, cursor: Cursor) -> Cursor {
        match self.peek(cursor) {
            None => cursor,
            Some('\n') => Cursor {
                pos: cursor.pos + 1,
                line: cursor.line + 1,
                column: 1,
            },
            Some(_) => Cursor {
                pos: cursor.pos + 1,
                column: cursor.column + 1,
                ..cursor
            },
        }
    }

    fn advance_by(&self, cursor: Cursor, n: usize) -> Cursor {
        (0..n).fold(cursor, |c, _| self.advance(c))
    }

    fn skip_line_break(&self, cursor: Cursor) -> Cursor {
        if self.peek(cursor) == Some('\n') {
            self.advance(cursor)
        } else {
            cursor
        }
    }

    /// Up to `n` characters starting at the cursor.
    fn lookahead(&self, cursor: Cursor, n: usize) -> String {
        self.chars.iter().skip(cursor.pos).take(n).collect()
    }

    fn take_while(&self, mut cursor: Cursor, pred: impl Fn(char) -> bool) -> (String, Cursor) {
        let mut taken = String::new();
        while let Some(c) = self.peek(cursor).filter(|c| pred(*c)) {
            taken.push(c);
            cursor = self.advance(cursor);
        }
        (taken, cursor)
    }

    /// Everything up to (not including) the next line break.
    fn take_line(&self, cursor: Cursor) -> (String, Cursor) {
        self.take_while(cursor, |c| c != '\n')
    }

    fn next_non_whitespace(&self, cursor: Cursor) -> Option<char> {
        self.chars[cursor.pos.min(self.chars.len())..]
            .iter()
            .copied()
            .find(|c| !c.is_whitespace())
    }

    fn unrecognized(&self, cursor: Cursor) -> LexerError {
        let c = self.peek(cursor).unwrap_or('\0');
        self.error(LexErrorKind::UnrecognizedCharacter(c), cursor)
    }

    fn error(&self, kind: LexErrorKind, at: Cursor) -> LexerError {
        let diagnostic = Diagnostic::new(kind.to_string(), Some(at.location()))
            .with_filename(self.filename.as_deref())
            .with_source(&self.source);
        LexerError { kind, diagnostic }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: tokenize and return token kinds (ignoring spans).
    fn kinds(source: &str) -> Vec<TokenKind> {
        tokens(source).into_iter().map(|t| t.kind).collect()
    }

    /// Helper: tokenize and panic on error.
    fn tokens(source: &str) -> Vec<Token> {
        Scanner::tokenize(source, &Options::default()).unwrap()
    }

    fn error(source: &str) -> LexerError {
        Scanner::tokenize(source, &Options::default()).unwrap_err()
    }

    fn tag(name: &str) -> TokenKind {
        TokenKind::Tag(name.into())
    }

    fn key(name: &str) -> TokenKind {
        TokenKind::AttributeKey(name.into())
    }

    fn value(v: &str) -> TokenKind {
        TokenKind::AttributeValue(v.into())
    }

    fn text(t: &str) -> TokenKind {
        TokenKind::Text(t.into())
    }

    fn indent(level: usize) -> TokenKind {
        TokenKind::Indent {
            level,
            whitespace: " ".repeat(level),
        }
    }

    // =========================================================================
    // Preprocessing
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_normalize_strips_bom() {
        assert_eq!(normalize("\u{FEFF}div"), "div");
        assert_eq!(kinds("\u{FEFF}div"), vec![tag("div")]);
    }

    #[test]
    fn test_windows_line_endings() {
        assert_eq!(
            kinds("p\r\nspan"),
            vec![tag("p"), TokenKind::Newline, tag("span")]
        );
    }

    // =========================================================================
    // Doctype
    // =========================================================================

    #[test]
    fn test_doctype() {
        assert_eq!(
            kinds("doctype html\nhtml"),
            vec![
                TokenKind::Doctype("html".into()),
                TokenKind::Newline,
                tag("html"),
            ]
        );
    }

    #[test]
    fn test_doctype_only_at_start() {
        assert_eq!(
            kinds("p\ndoctype html"),
            vec![
                tag("p"),
                TokenKind::Newline,
                tag("doctype"),
                text("html"),
            ]
        );
    }

    #[test]
    fn test_doctype_prefix_is_a_tag() {
        assert_eq!(kinds("doctypes"), vec![tag("doctypes")]);
    }

    // =========================================================================
    // Tags, shorthands, nesting
    // =========================================================================

    #[test]
    fn test_tag() {
        let toks = tokens("div");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, tag("div"));
        assert_eq!(toks[0].span, Span::new(0, 3, 1, 1));
    }

    #[test]
    fn test_tag_with_digits() {
        assert_eq!(kinds("h1"), vec![tag("h1")]);
    }

    #[test]
    fn test_class_shorthand() {
        assert_eq!(
            kinds("p.intro.lead"),
            vec![
                tag("p"),
                key("class"),
                value("intro"),
                key("class"),
                value("lead"),
            ]
        );
    }

    #[test]
    fn test_id_shorthand_implies_div() {
        assert_eq!(kinds("#main"), vec![tag("div"), key("id"), value("main")]);
    }

    #[test]
    fn test_class_and_id() {
        assert_eq!(
            kinds(".a#b"),
            vec![tag("div"), key("class"), value("a"), key("id"), value("b")]
        );
    }

    #[test]
    fn test_implicit_div_after_indent() {
        assert_eq!(
            kinds("ul\n  .item"),
            vec![
                tag("ul"),
                TokenKind::Newline,
                indent(2),
                tag("div"),
                key("class"),
                value("item"),
            ]
        );
    }

    #[test]
    fn test_nested_inline_tag() {
        assert_eq!(
            kinds("p: span hello"),
            vec![tag("p"), tag("span"), text("hello")]
        );
    }

    #[test]
    fn test_nested_inline_shorthand_opens_div() {
        assert_eq!(
            kinds("li: .icon"),
            vec![tag("li"), tag("div"), key("class"), value("icon")]
        );
    }

    #[test]
    fn test_nested_context_resets_after_shorthand() {
        assert_eq!(
            kinds("li: .a.b"),
            vec![
                tag("li"),
                tag("div"),
                key("class"),
                value("a"),
                key("class"),
                value("b"),
            ]
        );
    }

    #[test]
    fn test_word_after_attributes_is_not_a_tag() {
        let err = error("a(href=x)y");
        assert_eq!(err.kind, LexErrorKind::UnrecognizedCharacter('y'));
        assert_eq!(err.column(), 10);
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_attributes() {
        assert_eq!(
            kinds("a(href='/x' target=_blank)"),
            vec![
                tag("a"),
                key("href"),
                value("/x"),
                key("target"),
                value("_blank"),
            ]
        );
    }

    #[test]
    fn test_boolean_attribute() {
        assert_eq!(
            kinds("input(disabled type=text)"),
            vec![tag("input"), key("disabled"), key("type"), value("text")]
        );
    }

    #[test]
    fn test_quoted_value_with_spaces() {
        assert_eq!(
            kinds("div(class='a b')"),
            vec![tag("div"), key("class"), value("a b")]
        );
    }

    #[test]
    fn test_quoted_value_with_other_quote() {
        assert_eq!(
            kinds(r#"p(title="it's" data-x='say "hi"')"#),
            vec![
                tag("p"),
                key("title"),
                value("it's"),
                key("data-x"),
                value("say \"hi\""),
            ]
        );
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(
            kinds(r"p(title='it\'s')"),
            vec![tag("p"), key("title"), value("it's")]
        );
    }

    #[test]
    fn test_unquoted_escapes() {
        assert_eq!(
            kinds(r"p(title=a\ b c=\d)"),
            vec![tag("p"), key("title"), value("a b"), key("c"), value(r"\d")]
        );
    }

    #[test]
    fn test_attributes_then_shorthand_and_text() {
        assert_eq!(
            kinds("a(href=x).btn go"),
            vec![
                tag("a"),
                key("href"),
                value("x"),
                key("class"),
                value("btn"),
                text("go"),
            ]
        );
    }

    #[test]
    fn test_attributes_spanning_lines() {
        let toks = tokens("a(href=x\n  title=y)\np");
        let k: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            k,
            vec![
                tag("a"),
                key("href"),
                value("x"),
                key("title"),
                value("y"),
                TokenKind::Newline,
                tag("p"),
            ]
        );
        assert_eq!(toks[3].span.line, 2);
        assert_eq!(toks[6].span.line, 3);
    }

    #[test]
    fn test_empty_attribute_list() {
        assert_eq!(kinds("div() hi"), vec![tag("div"), text("hi")]);
    }

    #[test]
    fn test_unclosed_paren() {
        let err = error("div(class='a'");
        assert_eq!(err.kind, LexErrorKind::UnclosedAttributeParen);
        assert_eq!((err.line(), err.column()), (1, 4));
        assert!(err.to_string().contains("Unclosed attribute parentheses"));
    }

    #[test]
    fn test_unclosed_paren_unquoted_value() {
        let err = error("div(a=b");
        assert_eq!(err.kind, LexErrorKind::UnclosedAttributeParen);
        assert_eq!(err.column(), 4);
    }

    #[test]
    fn test_unclosed_quote() {
        let err = error("div(class='a b)\np");
        assert_eq!(err.kind, LexErrorKind::UnclosedAttributeQuote);
        assert_eq!((err.line(), err.column()), (1, 11));
        assert!(err.to_string().contains("Unclosed attribute quote"));
    }

    #[test]
    fn test_equals_without_key() {
        let err = error("div(=x)");
        assert_eq!(err.kind, LexErrorKind::UnrecognizedCharacter('='));
        assert_eq!(err.column(), 5);
    }

    #[test]
    fn test_paren_without_tag() {
        let err = error("(a=b)");
        assert_eq!(err.kind, LexErrorKind::UnrecognizedCharacter('('));
    }

    // =========================================================================
    // Text
    // =========================================================================

    #[test]
    fn test_trailing_text() {
        let toks = tokens("p hello world");
        assert_eq!(toks[1].kind, text("hello world"));
        assert_eq!(toks[1].span.column, 3);
    }

    #[test]
    fn test_trailing_whitespace_has_no_text() {
        assert_eq!(kinds("p   \nspan"), vec![tag("p"), TokenKind::Newline, tag("span")]);
    }

    #[test]
    fn test_pipe() {
        assert_eq!(
            kinds("p\n  | hello"),
            vec![tag("p"), TokenKind::Newline, indent(2), text("hello")]
        );
    }

    #[test]
    fn test_pipe_without_space() {
        assert_eq!(kinds("|hi"), vec![text("hi")]);
    }

    #[test]
    fn test_consecutive_pipes_join() {
        assert_eq!(
            kinds("| one\n| two\np"),
            vec![
                text("one\n"),
                TokenKind::Newline,
                text("two"),
                TokenKind::Newline,
                tag("p"),
            ]
        );
    }

    // =========================================================================
    // Comments
    // =========================================================================

    #[test]
    fn test_comment() {
        assert_eq!(kinds("// note"), vec![TokenKind::Comment("note".into())]);
    }

    #[test]
    fn test_indented_comment() {
        assert_eq!(
            kinds("div\n  //x"),
            vec![
                tag("div"),
                TokenKind::Newline,
                indent(2),
                TokenKind::Comment("x".into()),
            ]
        );
    }

    // =========================================================================
    // Indentation
    // =========================================================================

    #[test]
    fn test_indent_levels() {
        let toks = tokens("a\n  b\n    c\nd");
        assert_eq!(
            toks.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                tag("a"),
                TokenKind::Newline,
                indent(2),
                tag("b"),
                TokenKind::Newline,
                indent(4),
                tag("c"),
                TokenKind::Newline,
                tag("d"),
            ]
        );
        assert_eq!(toks[3].span, Span::new(4, 5, 2, 3));
        assert_eq!(toks[8].span.line, 4);
        assert_eq!(toks[8].span.column, 1);
    }

    #[test]
    fn test_tabs_count_as_characters() {
        assert_eq!(
            kinds("a\n\tb"),
            vec![
                tag("a"),
                TokenKind::Newline,
                TokenKind::Indent {
                    level: 1,
                    whitespace: "\t".into()
                },
                tag("b"),
            ]
        );
    }

    #[test]
    fn test_leading_whitespace_is_indent() {
        assert_eq!(kinds("  p"), vec![indent(2), tag("p")]);
    }

    // =========================================================================
    // Block content
    // =========================================================================

    #[test]
    fn test_block_content() {
        assert_eq!(
            kinds("script.\n  if (a) {\n    b()\n  }\np"),
            vec![
                tag("script"),
                text("if (a) {\n  b()\n}"),
                TokenKind::Newline,
                tag("p"),
            ]
        );
    }

    #[test]
    fn test_block_content_keeps_inner_blank_lines() {
        assert_eq!(
            kinds("pre.\n  a\n\n  b\n\ndiv"),
            vec![
                tag("pre"),
                text("a\n\nb"),
                TokenKind::Newline,
                TokenKind::Newline,
                tag("div"),
            ]
        );
    }

    #[test]
    fn test_block_content_nested_tag() {
        assert_eq!(
            kinds("div\n  style.\n    a {}\n  p"),
            vec![
                tag("div"),
                TokenKind::Newline,
                indent(2),
                tag("style"),
                text("a {}"),
                TokenKind::Newline,
                indent(2),
                tag("p"),
            ]
        );
    }

    #[test]
    fn test_block_content_after_attributes() {
        assert_eq!(
            kinds("script(type=module).   \n  run()"),
            vec![
                tag("script"),
                key("type"),
                value("module"),
                text("run()"),
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn test_block_content_position() {
        let toks = tokens("pre.\n  x\n");
        assert_eq!(toks[1].span.line, 2);
        assert_eq!(toks[1].span.column, 1);
        assert_eq!(toks[2].kind, TokenKind::Newline);
        assert_eq!(toks[2].span.line, 2);
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(
            kinds("pre.\np"),
            vec![tag("pre"), TokenKind::Newline, tag("p")]
        );
    }

    #[test]
    fn test_dot_followed_by_text_is_rejected() {
        let err = error("p. hello");
        assert_eq!(err.kind, LexErrorKind::UnrecognizedCharacter('.'));
    }

    #[test]
    fn test_strip_common_indent() {
        let lines = vec!["    a".to_string(), String::new(), "      b".to_string()];
        assert_eq!(strip_common_indent(&lines), "a\n\n  b");
    }

    #[test]
    fn test_strip_common_indent_unindented_line() {
        let lines = vec!["a".to_string(), "  b".to_string()];
        assert_eq!(strip_common_indent(&lines), "a\n  b");
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_unrecognized_character() {
        let err = error("<div>");
        assert_eq!(err.kind, LexErrorKind::UnrecognizedCharacter('<'));
        assert_eq!((err.line(), err.column()), (1, 1));
        assert!(err.to_string().starts_with("Cannot parse character \"<\""));
    }

    #[test]
    fn test_unrecognized_character_location() {
        let err = error("div\n  span\n  <b>");
        assert_eq!((err.line(), err.column()), (3, 3));
    }

    #[test]
    fn test_error_includes_filename_and_excerpt() {
        let options = Options::new().with_filename("index.sml");
        let err = Scanner::tokenize("p\n<", &options).unwrap_err();
        assert_eq!(err.filename(), "index.sml");
        let report = err.to_string();
        assert!(report.starts_with("Cannot parse character \"<\"\nLocation: index.sml:2:1\n\n"));
        assert!(report.contains("[index.sml:2:1]"));
        assert!(report.contains("1 | p"));
        assert!(report.contains("2 | <"));
    }
}
