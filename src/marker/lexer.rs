//! Marker string tokenizer
//!
//! Turns `python_version >= "3.8" and (os_name == "nt" or extra == "win")`
//! into the nested `MarkerItem` structure the builder consumes: each
//! comparison becomes a three-item group, each parenthesized marker a group
//! of comparisons and keywords.

use crate::error::{MarkerError, Result};
use crate::marker::builder::build;
use crate::marker::node::{BoolOp, Node};
use crate::marker::token::MarkerItem;

/// Environment variables defined by PEP 508
pub const MARKER_VARIABLES: [&str; 12] = [
    "implementation_name",
    "implementation_version",
    "os_name",
    "platform_machine",
    "platform_release",
    "platform_system",
    "platform_version",
    "python_full_version",
    "platform_python_implementation",
    "python_version",
    "sys_platform",
    "extra",
];

/// Legacy spellings still accepted by packaging tools
const MARKER_ALIASES: [(&str, &str); 6] = [
    ("os.name", "os_name"),
    ("sys.platform", "sys_platform"),
    ("platform.version", "platform_version"),
    ("platform.machine", "platform_machine"),
    ("platform.python_implementation", "platform_python_implementation"),
    ("python_implementation", "platform_python_implementation"),
];

/// Deepest parenthesis nesting a marker may use
pub const MAX_PAREN_DEPTH: usize = 128;

/// Symbolic comparators, longest first
const SYMBOL_OPERATORS: [&str; 8] = ["===", "==", "!=", "~=", ">=", "<=", ">", "<"];

/// Parse a marker string into a tree
pub fn parse(marker: &str) -> Result<Node> {
    let items = tokenize(marker)?;
    build(&items)
}

/// Tokenize a marker string into builder input
pub fn tokenize(marker: &str) -> Result<Vec<MarkerItem>> {
    let marker = marker.trim();
    if marker.is_empty() {
        return Err(MarkerError::InvalidMarker("Empty marker".to_string()));
    }

    let lexemes = lex(marker)?;
    let mut grouper = Grouper {
        lexemes: &lexemes,
        pos: 0,
        depth: 0,
    };
    let items = grouper.marker()?;

    match grouper.peek() {
        None => Ok(items),
        Some(Lexeme::CloseParen) => Err(MarkerError::InvalidMarker(format!(
            "Unbalanced parentheses in: {}",
            marker
        ))),
        Some(lexeme) => Err(MarkerError::InvalidMarker(format!(
            "Unexpected trailing token '{}' in: {}",
            lexeme.text(),
            marker
        ))),
    }
}

/// Canonical name for a marker variable, resolving legacy aliases
pub fn canonical_variable(name: &str) -> Option<&'static str> {
    MARKER_VARIABLES
        .iter()
        .find(|v| **v == name)
        .copied()
        .or_else(|| {
            MARKER_ALIASES
                .iter()
                .find(|(alias, _)| *alias == name)
                .map(|(_, canonical)| *canonical)
        })
}

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Word(String),
    Quoted(String),
    Symbol(String),
    OpenParen,
    CloseParen,
}

impl Lexeme {
    fn text(&self) -> String {
        match self {
            Lexeme::Word(w) | Lexeme::Symbol(w) => w.clone(),
            Lexeme::Quoted(q) => format!("\"{}\"", q),
            Lexeme::OpenParen => "(".to_string(),
            Lexeme::CloseParen => ")".to_string(),
        }
    }
}

fn is_symbol_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '~')
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn lex(marker: &str) -> Result<Vec<Lexeme>> {
    let mut lexemes = Vec::new();
    let mut chars = marker.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => lexemes.push(Lexeme::OpenParen),
            ')' => lexemes.push(Lexeme::CloseParen),
            '\'' | '"' => {
                let mut text = String::new();
                let mut closed = false;
                for q in chars.by_ref() {
                    if q == c {
                        closed = true;
                        break;
                    }
                    text.push(q);
                }
                if !closed {
                    return Err(MarkerError::InvalidMarker(format!(
                        "Unclosed quote in: {}",
                        marker
                    )));
                }
                lexemes.push(Lexeme::Quoted(text));
            }
            c if is_symbol_char(c) => {
                let mut symbol = c.to_string();
                while let Some(&next) = chars.peek() {
                    if !is_symbol_char(next) {
                        break;
                    }
                    symbol.push(next);
                    chars.next();
                }
                if !SYMBOL_OPERATORS.contains(&symbol.as_str()) {
                    return Err(MarkerError::InvalidMarker(format!(
                        "Invalid operator '{}' in: {}",
                        symbol, marker
                    )));
                }
                lexemes.push(Lexeme::Symbol(symbol));
            }
            c if is_word_char(c) => {
                let mut word = c.to_string();
                while let Some(&next) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                lexemes.push(Lexeme::Word(word));
            }
            other => {
                return Err(MarkerError::InvalidMarker(format!(
                    "Unexpected character '{}' in: {}",
                    other, marker
                )))
            }
        }
    }

    Ok(lexemes)
}

/// Recursive-descent grouping of lexemes into comparisons and groups
struct Grouper<'a> {
    lexemes: &'a [Lexeme],
    pos: usize,
    depth: usize,
}

impl<'a> Grouper<'a> {
    fn peek(&self) -> Option<&'a Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Lexeme> {
        let lexeme = self.lexemes.get(self.pos);
        if lexeme.is_some() {
            self.pos += 1;
        }
        lexeme
    }

    /// atom (("and" | "or") atom)*
    fn marker(&mut self) -> Result<Vec<MarkerItem>> {
        let mut items = vec![self.atom()?];

        while let Some(Lexeme::Word(word)) = self.peek() {
            let op = match word.as_str() {
                "and" => BoolOp::And,
                "or" => BoolOp::Or,
                _ => break,
            };
            self.pos += 1;
            items.push(MarkerItem::Keyword(op));
            items.push(self.atom()?);
        }

        Ok(items)
    }

    /// "(" marker ")" | operand comparator operand
    fn atom(&mut self) -> Result<MarkerItem> {
        match self.advance() {
            Some(Lexeme::OpenParen) => {
                if self.depth >= MAX_PAREN_DEPTH {
                    return Err(MarkerError::InvalidMarker(format!(
                        "Parentheses nested deeper than {} levels",
                        MAX_PAREN_DEPTH
                    )));
                }
                self.depth += 1;
                let inner = self.marker()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Lexeme::CloseParen) => Ok(MarkerItem::Group(inner)),
                    _ => Err(MarkerError::InvalidMarker(
                        "Unbalanced parentheses".to_string(),
                    )),
                }
            }
            Some(lexeme) => {
                let lhs = operand(lexeme)?;
                let op = self.comparator(lexeme)?;
                let rhs = match self.advance() {
                    Some(lexeme) => operand(lexeme)?,
                    None => {
                        return Err(MarkerError::InvalidMarker(format!(
                            "Missing value after '{} {}'",
                            lexeme.text(),
                            op
                        )))
                    }
                };
                Ok(MarkerItem::Group(vec![lhs, op, rhs]))
            }
            None => Err(MarkerError::InvalidMarker(
                "Expected a comparison, found end of marker".to_string(),
            )),
        }
    }

    fn comparator(&mut self, after: &Lexeme) -> Result<MarkerItem> {
        match self.advance() {
            Some(Lexeme::Symbol(symbol)) => Ok(MarkerItem::op(symbol.as_str())),
            Some(Lexeme::Word(word)) if word == "in" => Ok(MarkerItem::op("in")),
            Some(Lexeme::Word(word)) if word == "not" => match self.advance() {
                Some(Lexeme::Word(word)) if word == "in" => Ok(MarkerItem::op("not in")),
                _ => Err(MarkerError::InvalidMarker(
                    "Expected 'in' after 'not'".to_string(),
                )),
            },
            Some(other) => Err(MarkerError::InvalidMarker(format!(
                "Expected a comparator after '{}', found '{}'",
                after.text(),
                other.text()
            ))),
            None => Err(MarkerError::InvalidMarker(format!(
                "Expected a comparator after '{}'",
                after.text()
            ))),
        }
    }
}

fn operand(lexeme: &Lexeme) -> Result<MarkerItem> {
    match lexeme {
        Lexeme::Quoted(text) => Ok(MarkerItem::value(text.as_str())),
        Lexeme::Word(word) => match canonical_variable(word) {
            Some(name) => Ok(MarkerItem::variable(name)),
            None if word.starts_with(|c: char| c.is_ascii_digit()) => Err(
                MarkerError::InvalidMarker(format!("Unquoted value: {}", word)),
            ),
            None => Err(MarkerError::InvalidMarker(format!(
                "Unknown environment marker: {}",
                word
            ))),
        },
        other => Err(MarkerError::InvalidMarker(format!(
            "Expected a variable or quoted value, found '{}'",
            other.text()
        ))),
    }
}
