//! Expression handlers.

use super::{Visitor, code};
use crate::node::{CodeNode, Part};
use crate::scope::{ScopeKind, Symbol, SymbolRef};
use crate::types::Type;
use retarget_syntax::{Access, Literal, Node, NodeData, NodeKind, Operator};

pub fn constant(_: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Constant { value } = &node.data else {
        return CodeNode::empty();
    };
    let (template, ty, part) = match value {
        Literal::Int(n) => ("int", "int", Some(Part::Text(n.to_string()))),
        Literal::Float(f) => ("float", "float", Some(Part::Text(format!("{:?}", f)))),
        Literal::Str(s) => ("str", "str", Some(Part::Text(s.clone()))),
        Literal::Bool(b) => ("bool", "bool", Some(Part::Bool(*b))),
        Literal::None => ("none", "none", None),
    };
    let mut literal = code(node, template, Type::named(ty));
    if let Some(part) = part {
        literal.parts.insert("value".into(), part);
    }
    literal
}

pub fn name(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Name { id, ctx } = &node.data else {
        return CodeNode::empty();
    };

    if *ctx == Access::Store {
        let ty = v.take_store_type();
        let (symbol, created) = v.state_mut().declare_or_update(id, ty.clone());
        let rendered = v
            .state()
            .symbols()
            .get(&symbol)
            .and_then(Symbol::alias)
            .unwrap_or(id.as_str())
            .to_string();
        let declared = created && !v.hoist(&rendered);
        return code(node, "name", ty)
            .with("name", rendered)
            .with("declared", declared)
            .with_owner(symbol)
            .with_access(Access::Store);
    }

    if let Some(symbol) = v.state().lookup(id) {
        let record = v.state().symbols().get(&symbol);
        let ty = record.map(Symbol::current_type).unwrap_or_default();
        let rendered = record.and_then(Symbol::alias).unwrap_or(id.as_str()).to_string();
        return code(node, "name", ty)
            .with("name", rendered)
            .with_owner(symbol);
    }

    match v.overlay().rule(id) {
        Some(rule) => {
            let rendered = rule.alt_name.clone().unwrap_or_else(|| id.clone());
            let base = code(node, "name", Type::unknown()).with("name", rendered);
            v.apply_rule(rule, base, &[])
        }
        None => code(node, "name", Type::unknown()).with("name", id.as_str()),
    }
}

pub fn bin_op(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::BinOp { left, op, right } = &node.data else {
        return CodeNode::empty();
    };
    let left = v.visit(left);
    let right = v.visit(right);
    v.resolve_binop(node, *op, left, right)
}

pub fn unary_op(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::UnaryOp { op, operand } = &node.data else {
        return CodeNode::empty();
    };
    let operand = v.visit(operand);
    let ty = match op {
        Operator::Not => Type::named("bool"),
        _ => operand.ty.clone(),
    };
    code(node, "unop", ty)
        .with("op", v.overlay().operator(*op))
        .with("operand", operand)
}

/// `a and b and c` folds left into nested binary operations.
pub fn bool_op(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::BoolOp { op, values } = &node.data else {
        return CodeNode::empty();
    };
    let mut values = values.iter();
    let Some(first) = values.next() else {
        return CodeNode::empty();
    };
    let first = v.visit(first);
    values.fold(first, |acc, value| {
        let value = v.visit(value);
        v.resolve_binop(node, *op, acc, value)
    })
}

/// `a < b < c` becomes `(a < b) and (b < c)`; the middle operand is repeated.
pub fn compare(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Compare {
        left,
        ops,
        comparators,
    } = &node.data
    else {
        return CodeNode::empty();
    };

    let mut previous = v.visit(left);
    let mut result: Option<CodeNode> = None;
    for (op, comparator) in ops.iter().zip(comparators) {
        let right = v.visit(comparator);
        let pair = v.resolve_binop(node, *op, previous, right.clone());
        result = Some(match result {
            Some(acc) => v.resolve_binop(node, Operator::And, acc, pair),
            None => pair,
        });
        previous = right;
    }
    result.unwrap_or(previous)
}

pub fn call(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Call { func, args } = &node.data else {
        return CodeNode::empty();
    };

    match &func.data {
        NodeData::Attribute { value, attr, .. } => {
            let obj = v.visit(value);
            let args = visit_all(v, args);
            v.resolve_attribute(node, obj, attr, Some(args))
        }
        NodeData::Name { id, .. } => {
            let args = visit_all(v, args);
            v.resolve_named_call(node, func, id, args)
        }
        _ => {
            let callee = v.visit(func);
            let args = visit_all(v, args);
            code(node, "call", Type::unknown())
                .with("func", callee)
                .with("args", args)
        }
    }
}

pub fn attribute(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Attribute { value, attr, ctx } = &node.data else {
        return CodeNode::empty();
    };
    let obj = v.visit(value);
    v.resolve_attribute(node, obj, attr, None).with_access(*ctx)
}

pub fn subscript(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Subscript { value, slice, ctx } = &node.data else {
        return CodeNode::empty();
    };
    let obj = v.visit(value);
    let resolved = match &slice.data {
        NodeData::Slice { lower, upper, step } => {
            let lower = lower.as_deref().map(|n| v.visit(n));
            let upper = upper.as_deref().map(|n| v.visit(n));
            let step = step.as_deref().map(|n| v.visit(n));
            v.resolve_slice(node, obj, lower, upper, step)
        }
        _ => {
            let key = v.visit(slice);
            v.resolve_index(node, obj, key)
        }
    };
    resolved.with_access(*ctx)
}

pub fn list(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::List { elts } = &node.data else {
        return CodeNode::empty();
    };
    let elts = visit_all(v, elts);
    let ty = Type::list(Type::unify(elts.iter().map(|e| &e.ty)));
    code(node, "list", ty).with("elts", elts)
}

pub fn tuple(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Tuple { elts } = &node.data else {
        return CodeNode::empty();
    };
    let elts = visit_all(v, elts);
    let ty = Type::list(Type::unify(elts.iter().map(|e| &e.ty)));
    let single = elts.len() == 1;
    code(node, "tuple", ty)
        .with("elts", elts)
        .with("single", single)
}

pub fn dict(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Dict { keys, values } = &node.data else {
        return CodeNode::empty();
    };
    let items: Vec<CodeNode> = keys
        .iter()
        .zip(values)
        .map(|(key, value)| {
            let key = v.visit(key);
            let value = v.visit(value);
            CodeNode::new(NodeKind::Dict, "pair", Type::unknown(), node.line)
                .with("key", key)
                .with("value", value)
        })
        .collect();

    let key_ty = Type::unify(items.iter().filter_map(|i| i.child("key")).map(|k| &k.ty));
    let value_ty = Type::unify(items.iter().filter_map(|i| i.child("value")).map(|value| &value.ty));
    code(node, "dict", Type::dict(key_ty, value_ty)).with("items", items)
}

pub fn if_exp(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::IfExp { test, body, orelse } = &node.data else {
        return CodeNode::empty();
    };
    let test = v.visit(test);
    let body = v.visit(body);
    let orelse = v.visit(orelse);
    let ty = Type::unify([&body.ty, &orelse.ty]);
    code(node, "ternary", ty)
        .with("test", test)
        .with("body", body)
        .with("orelse", orelse)
}

/// Lambdas get a fresh `lambda_N` scope so their parameters stay local.
pub fn lambda(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Lambda { args, body } = &node.data else {
        return CodeNode::empty();
    };
    let scope = v.state_mut().temp_var("lambda");
    let previous = v.state_mut().push_scope(&scope, ScopeKind::Function);

    let params: Vec<CodeNode> = args
        .iter()
        .map(|arg| {
            let symbol = v.state_mut().declare_local(arg, Type::unknown(), None);
            param(node, arg, Type::unknown(), symbol)
        })
        .collect();
    let body = v.visit(body);

    v.state_mut().restore_scope(previous);
    code(node, "lambda", Type::named("function"))
        .with("args", params)
        .with("body", body)
}

pub(super) fn visit_all(v: &mut Visitor<'_>, nodes: &[Node]) -> Vec<CodeNode> {
    nodes.iter().map(|node| v.visit(node)).collect()
}

/// A declared parameter, rendered through the `name` template.
pub(super) fn param(node: &Node, name: &str, ty: Type, symbol: SymbolRef) -> CodeNode {
    CodeNode::new(NodeKind::Name, "name", ty, node.line)
        .with("name", name)
        .with("declared", true)
        .with_owner(symbol)
        .with_access(Access::Store)
}
