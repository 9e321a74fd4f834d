//! Structural equality for tree nodes.
//!
//! `structure_eq` compares trees ignoring source line numbers, which differ
//! between a parsed program and a hand-built one with the same meaning.

use super::{Node, NodeData, Program};

/// Trait for structural equality comparison.
///
/// Unlike `PartialEq`, this ignores `Node::line`.
pub trait StructureEq {
    /// Compare two values for structural equality.
    fn structure_eq(&self, other: &Self) -> bool;
}

impl StructureEq for Program {
    fn structure_eq(&self, other: &Self) -> bool {
        vec_structure_eq(&self.body, &other.body)
    }
}

impl StructureEq for Node {
    fn structure_eq(&self, other: &Self) -> bool {
        without_lines(self) == without_lines(other)
    }
}

fn vec_structure_eq<T: StructureEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structure_eq(y))
}

fn without_lines(node: &Node) -> Node {
    let mut node = node.clone();
    clear_lines(&mut node);
    node
}

fn clear_lines(node: &mut Node) {
    node.line = 0;
    for child in children_mut(&mut node.data) {
        clear_lines(child);
    }
}

fn children_mut(data: &mut NodeData) -> Vec<&mut Node> {
    match data {
        NodeData::Expr { value } => vec![value.as_mut()],
        NodeData::Assign { target, value } | NodeData::AugAssign { target, value, .. } => {
            vec![target.as_mut(), value.as_mut()]
        }
        NodeData::If { test, body, orelse } => {
            let mut out = vec![test.as_mut()];
            out.extend(body.iter_mut());
            out.extend(orelse.iter_mut());
            out
        }
        NodeData::While { test, body } => {
            let mut out = vec![test.as_mut()];
            out.extend(body.iter_mut());
            out
        }
        NodeData::For { target, iter, body } => {
            let mut out = vec![target.as_mut(), iter.as_mut()];
            out.extend(body.iter_mut());
            out
        }
        NodeData::FunctionDef { body, .. } | NodeData::ClassDef { body, .. } => {
            body.iter_mut().collect()
        }
        NodeData::Return { value } => value.iter_mut().map(|v| v.as_mut()).collect(),
        NodeData::BinOp { left, right, .. } => vec![left.as_mut(), right.as_mut()],
        NodeData::UnaryOp { operand, .. } => vec![operand.as_mut()],
        NodeData::BoolOp { values, .. } => values.iter_mut().collect(),
        NodeData::Compare {
            left, comparators, ..
        } => {
            let mut out = vec![left.as_mut()];
            out.extend(comparators.iter_mut());
            out
        }
        NodeData::Call { func, args } => {
            let mut out = vec![func.as_mut()];
            out.extend(args.iter_mut());
            out
        }
        NodeData::Attribute { value, .. } => vec![value.as_mut()],
        NodeData::Subscript { value, slice, .. } => vec![value.as_mut(), slice.as_mut()],
        NodeData::Slice { lower, upper, step } => [lower, upper, step]
            .into_iter()
            .filter_map(|part| part.as_mut().map(|b| b.as_mut()))
            .collect(),
        NodeData::List { elts } | NodeData::Tuple { elts } => elts.iter_mut().collect(),
        NodeData::Dict { keys, values } => keys.iter_mut().chain(values.iter_mut()).collect(),
        NodeData::IfExp { test, body, orelse } => {
            vec![test.as_mut(), body.as_mut(), orelse.as_mut()]
        }
        NodeData::Lambda { body, .. } => vec![body.as_mut()],
        NodeData::Pass
        | NodeData::Break
        | NodeData::Continue
        | NodeData::Import { .. }
        | NodeData::Name { .. }
        | NodeData::Constant { .. }
        | NodeData::Unsupported { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Operator;

    #[test]
    fn test_line_is_ignored() {
        let parsed = Node::expr(Node::bin_op(Node::int(1).at(4), Operator::Add, Node::int(2)))
            .at(4);
        let built = Node::expr(Node::bin_op(Node::int(1), Operator::Add, Node::int(2)));

        assert!(parsed.structure_eq(&built));
        assert_ne!(parsed, built); // Regular equality still differs
    }

    #[test]
    fn test_different_names_not_equal() {
        let x = Node::assign(Node::store("x"), Node::int(1));
        let y = Node::assign(Node::store("y"), Node::int(1));

        assert!(!x.structure_eq(&y));
    }

    #[test]
    fn test_program_equality() {
        let p1 = Program::new(vec![Node::expr(Node::name("a")).at(1)]);
        let p2 = Program::new(vec![Node::expr(Node::name("a"))]);

        assert!(p1.structure_eq(&p2));
    }
}
