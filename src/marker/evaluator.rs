//! Partial evaluation of marker trees

use smallvec::{smallvec, SmallVec};
use tracing::trace;

use crate::environment::Environment;
use crate::marker::node::{BoolOp, ExpressionNode, Node, FALSE, TRUE};

/// Evaluate a tree against an environment
///
/// Every subexpression the environment decides is folded to a literal;
/// the rest is returned unchanged. Never fails: undecidable comparisons
/// stay symbolic.
pub fn evaluate(node: &Node, env: &Environment) -> Node {
    // Post-order walk with explicit stacks; chains can nest thousands deep.
    let mut work: SmallVec<[Step; 16]> = smallvec![Step::Visit(node)];
    let mut done: SmallVec<[Node; 8]> = SmallVec::new();

    while let Some(step) = work.pop() {
        match step {
            Step::Visit(Node::Boolean(b)) => done.push(Node::Boolean(*b)),
            Step::Visit(Node::Expression(expr)) => done.push(match check_expression(expr, env) {
                Some(state) => Node::boolean(state),
                None => Node::Expression(expr.clone()),
            }),
            Step::Visit(Node::Operator(op)) => {
                work.push(Step::Fold(op.operator()));
                work.push(Step::Visit(op.right()));
                work.push(Step::Visit(op.left()));
            }
            Step::Fold(operator) => {
                let right = done.pop().unwrap_or(FALSE);
                let left = done.pop().unwrap_or(FALSE);
                done.push(fold(operator, left, right));
            }
        }
    }

    done.pop().unwrap_or_else(|| node.clone())
}

enum Step<'a> {
    Visit(&'a Node),
    Fold(BoolOp),
}

/// Three-valued result of a single comparison
///
/// Candidates combine with OR: any `true` wins, otherwise any `false`
/// decides, otherwise the comparison is indeterminate.
pub fn check_expression(expr: &ExpressionNode, env: &Environment) -> Option<bool> {
    let candidates = env.get(&expr.lhs)?;

    let result = candidates
        .iter()
        .filter_map(|candidate| candidate.compare(expr.comparator, &expr.rhs))
        .reduce(|acc, r| acc || r);

    if result.is_none() {
        trace!(
            lhs = %expr.lhs,
            comparator = %expr.comparator,
            rhs = %expr.rhs,
            candidates = candidates.len(),
            "expression left indeterminate"
        );
    }
    result
}

fn fold(operator: BoolOp, left: Node, right: Node) -> Node {
    match operator {
        BoolOp::Or => match (left.as_literal(), right.as_literal()) {
            (Some(true), _) => TRUE,
            (Some(false), _) => right,
            (_, Some(true)) => TRUE,
            (_, Some(false)) => left,
            (None, None) => Node::or(left, right),
        },
        BoolOp::And => match (left.as_literal(), right.as_literal()) {
            (Some(false), _) => FALSE,
            (Some(true), _) => right,
            (_, Some(false)) => FALSE,
            (_, Some(true)) => left,
            (None, None) => Node::and(left, right),
        },
    }
}

impl Node {
    /// Partially evaluate this tree, see [`evaluate`]
    #[inline]
    pub fn evaluate(&self, env: &Environment) -> Node {
        evaluate(self, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvValue;
    use crate::marker::lexer::parse;
    use crate::marker::node::Comparator;
    use pep440_rs::Version;
    use regex::Regex;
    use std::str::FromStr;

    fn version(s: &str) -> EnvValue {
        EnvValue::Version(Version::from_str(s).unwrap())
    }

    #[test]
    fn test_end_to_end_decided() {
        let node = parse("os_name == 'nt'").unwrap();
        let env = Environment::new().with("os_name", ["posix"]);
        assert_eq!(node.evaluate(&env), FALSE);

        let env = Environment::new().with("os_name", ["nt"]);
        assert_eq!(node.evaluate(&env), TRUE);
    }

    #[test]
    fn test_end_to_end_free_variable() {
        let node = parse("os_name == 'nt'").unwrap();
        let env = Environment::new().with("sys_platform", ["linux"]);
        assert_eq!(node.evaluate(&env), node);
        assert_eq!(node.evaluate(&Environment::new()), node);
    }

    #[test]
    fn test_multi_candidate_or() {
        let node = parse("os_name == 'nt'").unwrap();
        let env = Environment::new().with("os_name", ["posix", "nt"]);
        assert_eq!(evaluate(&node, &env), TRUE);

        let node = parse("os_name != 'nt'").unwrap();
        assert_eq!(evaluate(&node, &env), TRUE);

        let env = Environment::new().with("os_name", ["nt", "nt"]);
        assert_eq!(evaluate(&node, &env), FALSE);
    }

    #[test]
    fn test_unparseable_version_is_indeterminate() {
        let node = parse("python_version >= '3.7'").unwrap();
        let env = Environment::new().with("python_version", ["not-a-version"]);
        assert_eq!(evaluate(&node, &env), node);
    }

    #[test]
    fn test_version_candidates() {
        let node = parse("python_version >= '3.7'").unwrap();
        let env = Environment::new().with("python_version", [version("3.8")]);
        assert_eq!(evaluate(&node, &env), TRUE);

        let env = Environment::new().with("python_version", [version("3.6")]);
        assert_eq!(evaluate(&node, &env), FALSE);

        let env = Environment::new().with("python_version", [version("3.6"), version("3.9")]);
        assert_eq!(evaluate(&node, &env), TRUE);
    }

    #[test]
    fn test_mixed_candidate_kinds() {
        // The string candidate cannot decide >=, the version candidate can.
        let node = parse("python_version >= '3.7'").unwrap();
        let env = Environment::new().with(
            "python_version",
            [EnvValue::from("3.8"), version("3.8")],
        );
        assert_eq!(evaluate(&node, &env), TRUE);

        // The version candidate cannot build "in", the string cannot decide it.
        let node = parse("python_version in '3.7 3.8'").unwrap();
        assert_eq!(evaluate(&node, &env), node);
    }

    #[test]
    fn test_false_candidate_with_indeterminate_peer() {
        // The string candidate cannot decide <, the version candidate says no.
        let node = parse("python_version < '3.7'").unwrap();
        let env = Environment::new().with(
            "python_version",
            [EnvValue::from("3.8"), version("3.8")],
        );
        assert_eq!(evaluate(&node, &env), FALSE);
    }

    #[test]
    fn test_pattern_candidates() {
        let node = parse("sys_platform == 'win32'").unwrap();
        let env = Environment::new().with("sys_platform", [Regex::new("^win").unwrap()]);
        assert_eq!(evaluate(&node, &env), TRUE);

        let node = parse("sys_platform != 'win32'").unwrap();
        assert_eq!(evaluate(&node, &env), FALSE);

        let node = parse("sys_platform == 'linux'").unwrap();
        assert_eq!(evaluate(&node, &env), FALSE);
    }

    #[test]
    fn test_empty_candidate_list_is_indeterminate() {
        let node = parse("extra == 'test'").unwrap();
        let env = Environment::new().with("extra", Vec::<EnvValue>::new());
        assert_eq!(evaluate(&node, &env), node);
    }

    #[test]
    fn test_or_folding() {
        let free = Node::expression("extra", Comparator::Equal, "test");
        let env = Environment::new();

        assert_eq!(evaluate(&Node::or(TRUE, free.clone()), &env), TRUE);
        assert_eq!(evaluate(&Node::or(free.clone(), TRUE), &env), TRUE);
        assert_eq!(evaluate(&Node::or(FALSE, free.clone()), &env), free);
        assert_eq!(evaluate(&Node::or(free.clone(), FALSE), &env), free);
        assert_eq!(evaluate(&Node::or(FALSE, FALSE), &env), FALSE);

        let both = Node::or(free.clone(), free.clone());
        assert_eq!(evaluate(&both, &env), both);
    }

    #[test]
    fn test_and_folding() {
        let free = Node::expression("extra", Comparator::Equal, "test");
        let env = Environment::new();

        assert_eq!(evaluate(&Node::and(FALSE, free.clone()), &env), FALSE);
        assert_eq!(evaluate(&Node::and(free.clone(), FALSE), &env), FALSE);
        assert_eq!(evaluate(&Node::and(TRUE, free.clone()), &env), free);
        assert_eq!(evaluate(&Node::and(free.clone(), TRUE), &env), free);
        assert_eq!(evaluate(&Node::and(TRUE, TRUE), &env), TRUE);

        let both = Node::and(free.clone(), free.clone());
        assert_eq!(evaluate(&both, &env), both);
    }

    #[test]
    fn test_partial_evaluation_keeps_free_parts() {
        let node = parse(
            "os_name == 'posix' and python_version >= '3.8' or sys_platform == 'win32'",
        )
        .unwrap();
        let env = Environment::new()
            .with("os_name", ["posix"])
            .with("sys_platform", ["linux"]);

        let result = evaluate(&node, &env);
        assert_eq!(
            result,
            Node::expression("python_version", Comparator::GreaterEqual, "3.8")
        );
        assert!(result.contains("python_version"));
        assert!(!result.contains("os_name"));
        assert!(result.as_bool().is_err());
    }

    #[test]
    fn test_full_evaluation_coerces() {
        let node = parse("os_name == 'posix' and (extra == 'a' or extra == 'b')").unwrap();
        let env = Environment::new()
            .with("os_name", ["posix"])
            .with("extra", ["b"]);
        let result = evaluate(&node, &env);
        assert_eq!(result.as_bool(), Ok(true));
    }

    #[test]
    fn test_evaluate_does_not_mutate_input() {
        let node = parse("os_name == 'nt' or extra == 'a'").unwrap();
        let before = node.clone();
        let env = Environment::new().with("os_name", ["nt"]);
        let _ = evaluate(&node, &env);
        assert_eq!(node, before);
    }

    #[test]
    fn test_long_chain_evaluation() {
        let mut node = Node::expression("extra", Comparator::Equal, "x0");
        for i in 1..10_000 {
            node = Node::or(node, Node::expression("extra", Comparator::Equal, format!("x{}", i)));
        }
        let node = Node::and(node, Node::expression("os_name", Comparator::Equal, "nt"));

        let env = Environment::new().with("extra", ["x9999"]);
        let result = evaluate(&node, &env);
        assert_eq!(result, Node::expression("os_name", Comparator::Equal, "nt"));

        let env = Environment::new().with("os_name", ["nt"]);
        let result = evaluate(&node, &env);
        assert!(result.contains("extra"));
        assert!(!result.contains("os_name"));

        let env = Environment::new().with("os_name", ["posix"]);
        assert_eq!(evaluate(&node, &env), FALSE);
    }

    #[test]
    fn test_check_expression() {
        let expr = ExpressionNode::new("os_name", Comparator::Equal, "nt");
        assert_eq!(check_expression(&expr, &Environment::new()), None);
        let env = Environment::new().with("os_name", ["nt"]);
        assert_eq!(check_expression(&expr, &env), Some(true));
    }
}
