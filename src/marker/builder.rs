//! Tree builder: token structure to expression tree

use std::fmt::Display;

use tracing::debug;

use crate::error::{MarkerError, Result};
use crate::marker::node::{BoolOp, Comparator, Node, OperatorNode};
use crate::marker::token::{Fragment, MarkerItem};

/// Deepest group nesting `build` accepts
pub const MAX_GROUP_DEPTH: usize = 256;

/// Build a tree from a flat (possibly nested) sequence of items
///
/// `and` binds tighter than `or` and both associate to the left, so
/// `a and b or c` becomes `or(and(a, b), c)`.
pub fn build(items: &[MarkerItem]) -> Result<Node> {
    build_at(items, 0)
}

/// Build a tree from a single item (a comparison or a parenthesized group)
pub fn build_item(item: &MarkerItem) -> Result<Node> {
    build_item_at(item, 0)
}

fn build_at(items: &[MarkerItem], depth: usize) -> Result<Node> {
    if items.len() > 3 {
        return fold_by_precedence(items, depth);
    }
    build_sequence(items, depth)
}

fn build_item_at(item: &MarkerItem, depth: usize) -> Result<Node> {
    match item {
        MarkerItem::Group(_) if depth >= MAX_GROUP_DEPTH => Err(reject(
            "Groups nested too deeply",
            format_args!("more than {} levels", MAX_GROUP_DEPTH),
        )),
        MarkerItem::Group(items) => build_at(items, depth + 1),
        other => Err(reject("Expected a comparison or group", other)),
    }
}

fn build_sequence(items: &[MarkerItem], depth: usize) -> Result<Node> {
    match items {
        [] => Err(reject("Empty marker", Fragment(items))),
        [single] => build_item_at(single, depth),
        [left, MarkerItem::Keyword(op), right] => Ok(Node::Operator(OperatorNode::new(
            *op,
            build_item_at(left, depth)?,
            build_item_at(right, depth)?,
        ))),
        [lhs, MarkerItem::Op(op), rhs] => build_comparison(lhs, op, rhs),
        _ => Err(reject("Unexpected marker shape", Fragment(items))),
    }
}

fn build_comparison(lhs: &MarkerItem, op: &str, rhs: &MarkerItem) -> Result<Node> {
    let comparator: Comparator = op.parse().map_err(|_| {
        reject(
            "Unknown comparator",
            format_args!("{} {} {}", lhs, op, rhs),
        )
    })?;

    match (lhs, rhs) {
        (MarkerItem::Variable(name), MarkerItem::Value(text)) => {
            Ok(Node::expression(name.as_str(), comparator, text.as_str()))
        }
        // Membership reads in source order: `"nt" in os_name` keeps the
        // literal on the left.
        (MarkerItem::Value(text), MarkerItem::Variable(name)) if comparator.is_membership() => {
            Ok(Node::expression(text.as_str(), comparator, name.as_str()))
        }
        _ => Err(reject(
            "Comparison needs a variable and a quoted value",
            format_args!("{} {} {}", lhs, op, rhs),
        )),
    }
}

/// Fold `operand (and|or operand)*` into one tree
///
/// Yields the tree obtained by collapsing every `x and y` triple, then
/// every `x or y` triple, leftmost first: runs of `and` fold to the left
/// and the runs are then joined by `or`, also to the left. Operands are
/// built as they are reached, so only parenthesized groups recurse.
fn fold_by_precedence(items: &[MarkerItem], depth: usize) -> Result<Node> {
    let mut disjunction: Option<Node> = None;
    let mut conjunction: Option<Node> = None;
    let mut expect_operand = true;

    for item in items {
        if expect_operand {
            if item.keyword().is_some() {
                return Err(reject(
                    "Boolean operator is missing an operand",
                    Fragment(items),
                ));
            }
            let operand = build_item_at(item, depth)?;
            conjunction = Some(match conjunction.take() {
                Some(left) => Node::and(left, operand),
                None => operand,
            });
        } else {
            match item.keyword() {
                Some(BoolOp::And) => {}
                Some(BoolOp::Or) => disjunction = join_or(disjunction, conjunction.take()),
                None => return Err(reject("Unexpected marker shape", Fragment(items))),
            }
        }
        expect_operand = !expect_operand;
    }

    if expect_operand {
        return Err(reject(
            "Boolean operator is missing an operand",
            Fragment(items),
        ));
    }
    match join_or(disjunction, conjunction) {
        Some(node) => Ok(node),
        None => Err(reject("Empty marker", Fragment(items))),
    }
}

fn join_or(left: Option<Node>, right: Option<Node>) -> Option<Node> {
    match (left, right) {
        (Some(left), Some(right)) => Some(Node::or(left, right)),
        (left, right) => left.or(right),
    }
}

fn reject(reason: &str, fragment: impl Display) -> MarkerError {
    let fragment = fragment.to_string();
    debug!(reason, fragment = %fragment, "rejected marker shape");
    MarkerError::InvalidMarker(format!("{}: {}", reason, fragment))
}
