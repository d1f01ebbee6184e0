//! Token structure consumed by the tree builder

use std::fmt;

use crate::marker::node::BoolOp;

/// One item of a tokenized marker
///
/// A comparison is a three-item `Group` (`Variable`, `Op`, `Value` in some
/// order). A parenthesized marker is a `Group` of comparisons and keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerItem {
    /// Environment variable name, e.g. `python_version`
    Variable(String),
    /// Quoted literal, stored without its quotes
    Value(String),
    /// Comparator text, validated by the builder
    Op(String),
    /// `and` / `or`
    Keyword(BoolOp),
    /// Nested sequence
    Group(Vec<MarkerItem>),
}

impl MarkerItem {
    pub fn variable(name: impl Into<String>) -> Self {
        MarkerItem::Variable(name.into())
    }

    pub fn value(text: impl Into<String>) -> Self {
        MarkerItem::Value(text.into())
    }

    pub fn op(text: impl Into<String>) -> Self {
        MarkerItem::Op(text.into())
    }

    /// `(variable op value)` triple
    pub fn comparison(variable: &str, op: &str, value: &str) -> Self {
        MarkerItem::Group(vec![
            MarkerItem::variable(variable),
            MarkerItem::op(op),
            MarkerItem::value(value),
        ])
    }

    #[inline]
    pub fn keyword(&self) -> Option<BoolOp> {
        match self {
            MarkerItem::Keyword(op) => Some(*op),
            _ => None,
        }
    }
}

impl fmt::Display for MarkerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerItem::Variable(name) => f.write_str(name),
            MarkerItem::Value(text) => write!(f, "\"{}\"", text),
            MarkerItem::Op(text) => f.write_str(text),
            MarkerItem::Keyword(op) => write!(f, "{}", op),
            MarkerItem::Group(items) => {
                f.write_str("(")?;
                write_sequence(f, items)?;
                f.write_str(")")
            }
        }
    }
}

/// Space-separated rendering used in error messages
pub(crate) fn write_sequence(f: &mut fmt::Formatter<'_>, items: &[MarkerItem]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Display adapter for a bare sequence (no outer parentheses)
pub(crate) struct Fragment<'a>(pub &'a [MarkerItem]);

impl fmt::Display for Fragment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, self.0)
    }
}
