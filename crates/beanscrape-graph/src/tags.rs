//! Parsing of the `tag` column of the combinations CSV.
//!
//! The column holds a textual list of flavor names. Depending on where the
//! CSV came from that text is a list literal with single quotes
//! (`['Cherry', '+', 'Lemon']`) or a JSON array (`["Cherry","+","Lemon"]`).
//! Both go through [`TagParser`] so graph construction never sees the
//! encoding.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token used between flavors in a tag list; never a flavor itself
pub const SEPARATOR_TOKEN: &str = "+";

/// A tag field that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at offset {offset}")]
pub struct TagParseError {
    /// What went wrong
    pub message: String,
    /// Byte offset (0-based) in the tag text where parsing failed
    pub offset: usize,
}

impl TagParseError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Turns the raw text of a tag field into its list of strings
pub trait TagParser: Send + Sync {
    /// Parse `text` into tokens, preserving order
    fn parse(&self, text: &str) -> Result<Vec<String>, TagParseError>;
}

/// Parse `text` and normalise it to lowercased flavor names without separators
pub fn flavor_tokens(parser: &dyn TagParser, text: &str) -> Result<Vec<String>, TagParseError> {
    Ok(parser
        .parse(text)?
        .into_iter()
        .filter(|token| token != SEPARATOR_TOKEN)
        .map(|token| token.to_lowercase())
        .collect())
}

/// Permissive list-literal parser.
///
/// Accepts `[...]` or `(...)` holding single- or double-quoted strings,
/// separated by commas, with an optional trailing comma. Backslash escapes
/// `\\ \' \" \n \t \r` are decoded; any other escape is kept as written.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralListParser;

/// Strict parser: the text must be a JSON array of strings
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonArrayParser;

struct Scanner<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            len: text.len(),
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.len)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn quoted(&mut self) -> Result<String, TagParseError> {
        let start = self.offset();
        let quote = self.bump().ok_or_else(|| TagParseError::new("expected string", start))?;
        let mut out = String::new();

        loop {
            match self.bump() {
                None => return Err(TagParseError::new("unterminated string", start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(TagParseError::new("unterminated string", start)),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }
}

impl TagParser for LiteralListParser {
    fn parse(&self, text: &str) -> Result<Vec<String>, TagParseError> {
        let mut scanner = Scanner::new(text);
        scanner.skip_whitespace();

        let close = match scanner.bump() {
            Some('[') => ']',
            Some('(') => ')',
            _ => return Err(TagParseError::new("expected '[' or '('", 0)),
        };

        let mut tokens = Vec::new();
        loop {
            scanner.skip_whitespace();
            match scanner.peek() {
                Some(c) if c == close => {
                    scanner.bump();
                    break;
                }
                Some('\'' | '"') => tokens.push(scanner.quoted()?),
                Some(c) => {
                    let offset = scanner.offset();
                    return Err(TagParseError::new(format!("unexpected '{}'", c), offset));
                }
                None => return Err(TagParseError::new("unterminated list", text.len())),
            }

            scanner.skip_whitespace();
            let offset = scanner.offset();
            match scanner.bump() {
                Some(',') => continue,
                Some(c) if c == close => break,
                Some(c) => {
                    return Err(TagParseError::new(
                        format!("expected ',' but found '{}'", c),
                        offset,
                    ))
                }
                None => return Err(TagParseError::new("unterminated list", offset)),
            }
        }

        scanner.skip_whitespace();
        if scanner.peek().is_some() {
            let offset = scanner.offset();
            return Err(TagParseError::new("trailing characters", offset));
        }

        Ok(tokens)
    }
}

impl TagParser for JsonArrayParser {
    fn parse(&self, text: &str) -> Result<Vec<String>, TagParseError> {
        serde_json::from_str(text).map_err(|e| {
            let message = e.to_string();
            let message = message.split(" at line ").next().unwrap_or_default();
            TagParseError::new(message, byte_offset(text, e.line(), e.column()))
        })
    }
}

/// Convert serde_json's 1-based line and column into a byte offset in `text`
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

/// Which [`TagParser`] to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagFormat {
    /// [`LiteralListParser`]
    #[default]
    Literal,
    /// [`JsonArrayParser`]
    Json,
}

impl TagFormat {
    /// Parser for this format
    pub fn parser(self) -> Box<dyn TagParser> {
        match self {
            TagFormat::Literal => Box::new(LiteralListParser),
            TagFormat::Json => Box::new(JsonArrayParser),
        }
    }
}

impl FromStr for TagFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(TagFormat::Literal),
            "json" => Ok(TagFormat::Json),
            other => Err(format!("unknown tag format '{}'", other)),
        }
    }
}

impl fmt::Display for TagFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFormat::Literal => write!(f, "literal"),
            TagFormat::Json => write!(f, "json"),
        }
    }
}
