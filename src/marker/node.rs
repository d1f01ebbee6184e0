//! Expression tree for environment markers

use std::fmt;
use std::str::FromStr;

use crate::error::{MarkerError, Result};

/// The literal `True` node
pub const TRUE: Node = Node::Boolean(BooleanNode { state: true });
/// The literal `False` node
pub const FALSE: Node = Node::Boolean(BooleanNode { state: false });

/// A node in a marker expression tree
///
/// Trees are immutable values. Evaluation returns a new tree and never
/// touches the one it was given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Literal truth value
    Boolean(BooleanNode),
    /// Single comparison like `python_version >= "3.8"`
    Expression(ExpressionNode),
    /// `and` / `or` over two subtrees
    Operator(OperatorNode),
}

/// A boolean literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BooleanNode {
    pub state: bool,
}

/// A single comparison between a variable and a literal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionNode {
    pub lhs: String,
    pub comparator: Comparator,
    pub rhs: String,
}

/// A boolean operator owning both of its operands
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorNode {
    operator: BoolOp,
    left: Box<Node>,
    right: Box<Node>,
}

/// Comparison operators accepted in a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LessEqual,
    /// `===`
    ArbitraryEqual,
    /// `~=`
    Compatible,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

/// Boolean operators joining two subtrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

impl Comparator {
    pub const ALL: [Comparator; 10] = [
        Comparator::Equal,
        Comparator::NotEqual,
        Comparator::Greater,
        Comparator::Less,
        Comparator::GreaterEqual,
        Comparator::LessEqual,
        Comparator::ArbitraryEqual,
        Comparator::Compatible,
        Comparator::In,
        Comparator::NotIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::GreaterEqual => ">=",
            Comparator::LessEqual => "<=",
            Comparator::ArbitraryEqual => "===",
            Comparator::Compatible => "~=",
            Comparator::In => "in",
            Comparator::NotIn => "not in",
        }
    }

    /// Membership tests may take the variable on either side
    #[inline]
    pub fn is_membership(&self) -> bool {
        matches!(self, Comparator::In | Comparator::NotIn)
    }
}

impl FromStr for Comparator {
    type Err = MarkerError;

    fn from_str(s: &str) -> Result<Self> {
        Comparator::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| MarkerError::InvalidMarker(format!("Unknown comparator: {}", s)))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BoolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ExpressionNode {
    pub fn new(lhs: impl Into<String>, comparator: Comparator, rhs: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            comparator,
            rhs: rhs.into(),
        }
    }
}

impl OperatorNode {
    pub fn new(operator: BoolOp, left: Node, right: Node) -> Self {
        Self {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[inline]
    pub fn operator(&self) -> BoolOp {
        self.operator
    }

    #[inline]
    pub fn left(&self) -> &Node {
        &self.left
    }

    #[inline]
    pub fn right(&self) -> &Node {
        &self.right
    }
}

// Long `and`/`or` chains build trees as deep as the chain is long, so
// teardown walks them with an explicit stack.
impl Drop for OperatorNode {
    fn drop(&mut self) {
        if !matches!(*self.left, Node::Operator(_)) && !matches!(*self.right, Node::Operator(_)) {
            return;
        }

        let mut pending = vec![
            std::mem::replace(&mut *self.left, FALSE),
            std::mem::replace(&mut *self.right, FALSE),
        ];
        while let Some(mut node) = pending.pop() {
            if let Node::Operator(op) = &mut node {
                pending.push(std::mem::replace(&mut *op.left, FALSE));
                pending.push(std::mem::replace(&mut *op.right, FALSE));
            }
        }
    }
}

impl Node {
    /// Boolean literal node
    pub fn boolean(state: bool) -> Self {
        Node::Boolean(BooleanNode { state })
    }

    /// Comparison node
    pub fn expression(lhs: impl Into<String>, comparator: Comparator, rhs: impl Into<String>) -> Self {
        Node::Expression(ExpressionNode::new(lhs, comparator, rhs))
    }

    /// `left and right`
    pub fn and(left: Node, right: Node) -> Self {
        Node::Operator(OperatorNode::new(BoolOp::And, left, right))
    }

    /// `left or right`
    pub fn or(left: Node, right: Node) -> Self {
        Node::Operator(OperatorNode::new(BoolOp::Or, left, right))
    }

    /// Textual form of the subtree
    ///
    /// Groupings are not parenthesized, so the rendering of a nested tree is
    /// not guaranteed to parse back into the same shape.
    pub fn value(&self) -> String {
        self.to_string()
    }

    /// Whether any comparison in the subtree still reads `key`
    pub fn contains(&self, key: &str) -> bool {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Node::Boolean(_) => {}
                Node::Expression(expr) if expr.lhs == key => return true,
                Node::Expression(_) => {}
                Node::Operator(op) => {
                    pending.push(&op.right);
                    pending.push(&op.left);
                }
            }
        }
        false
    }

    /// Coerce a literal to `bool`
    ///
    /// Only `BooleanNode` coerces. Any other variant means the tree was not
    /// fully decided and yields `MarkerError::IncoercibleNode`.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Node::Boolean(b) => Ok(b.state),
            _ => Err(MarkerError::IncoercibleNode {
                variant: self.variant_name(),
            }),
        }
    }

    /// The literal value, if this node is a `BooleanNode`
    #[inline]
    pub fn as_literal(&self) -> Option<bool> {
        match self {
            Node::Boolean(b) => Some(b.state),
            _ => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Node::Boolean(_) => "BooleanNode",
            Node::Expression(_) => "ExpressionNode",
            Node::Operator(_) => "OperatorNode",
        }
    }
}

/// A pending piece of output while rendering a tree in order
enum Piece<'a> {
    Node(&'a Node),
    Keyword(BoolOp),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Piece::Node(self)];
        while let Some(piece) = pending.pop() {
            match piece {
                Piece::Keyword(op) => write!(f, " {} ", op)?,
                Piece::Node(Node::Boolean(b)) => {
                    f.write_str(if b.state { "True" } else { "False" })?
                }
                Piece::Node(Node::Expression(expr)) => {
                    write!(f, "{} {} {}", expr.lhs, expr.comparator, expr.rhs)?
                }
                Piece::Node(Node::Operator(op)) => {
                    pending.push(Piece::Node(&op.right));
                    pending.push(Piece::Keyword(op.operator));
                    pending.push(Piece::Node(&op.left));
                }
            }
        }
        Ok(())
    }
}

impl From<bool> for Node {
    fn from(state: bool) -> Self {
        Node::boolean(state)
    }
}

impl From<ExpressionNode> for Node {
    fn from(expr: ExpressionNode) -> Self {
        Node::Expression(expr)
    }
}

impl From<OperatorNode> for Node {
    fn from(op: OperatorNode) -> Self {
        Node::Operator(op)
    }
}

impl TryFrom<&Node> for bool {
    type Error = MarkerError;

    fn try_from(node: &Node) -> Result<bool> {
        node.as_bool()
    }
}

impl TryFrom<Node> for bool {
    type Error = MarkerError;

    fn try_from(node: Node) -> Result<bool> {
        node.as_bool()
    }
}
