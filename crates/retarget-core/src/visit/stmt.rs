//! Statement handlers.

use super::expr::param;
use super::{Visitor, code};
use crate::node::CodeNode;
use crate::scope::ScopeKind;
use crate::types::Type;
use retarget_syntax::{Access, Node, NodeData, NodeKind};

pub fn expr_stmt(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Expr { value } = &node.data else {
        return CodeNode::empty();
    };
    let value = v.visit(value);
    if value.is_empty() {
        return CodeNode::empty();
    }
    let is_call = value.kind == Some(NodeKind::Call);
    code(node, "expr_stmt", value.ty.clone())
        .with("value", value)
        .with("is_call", is_call)
}

/// The value is visited before the target, so `x = x + 1` reads the old `x`.
pub fn assign(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Assign { target, value } = &node.data else {
        return CodeNode::empty();
    };
    let value = v.visit(value);
    let target = v.visit_store(target, value.ty.clone());
    let declared = target.flag("declared");
    code(node, "assign", Type::named("none"))
        .with("target", target)
        .with("value", value)
        .with("declared", declared)
}

/// `x op= v`: `expr` holds the expanded `x op v` for targets without
/// compound assignment.
pub fn aug_assign(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::AugAssign { target, op, value } = &node.data else {
        return CodeNode::empty();
    };
    let value = v.visit(value);
    let current = v.visit(&as_load(target));
    let expr = v.resolve_binop(node, *op, current, value.clone());
    let target = v.visit_store(target, expr.ty.clone());
    code(node, "aug_assign", Type::named("none"))
        .with("target", target)
        .with("op", v.overlay().operator(*op))
        .with("value", value)
        .with("expr", expr)
}

pub fn if_stmt(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::If { test, body, orelse } = &node.data else {
        return CodeNode::empty();
    };
    let elif = matches!(orelse.as_slice(), [only] if only.kind() == NodeKind::If);
    let test = v.visit(test);
    let body = v.visit_block(body);
    let orelse = v.visit_block(orelse);
    code(node, "if", Type::named("none"))
        .with("test", test)
        .with("body", body)
        .with("orelse", orelse)
        .with("elif", elif)
}

pub fn while_stmt(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::While { test, body } = &node.data else {
        return CodeNode::empty();
    };
    let test = v.visit(test);
    let body = v.visit_block(body);
    code(node, "while", Type::named("none"))
        .with("test", test)
        .with("body", body)
}

pub fn for_stmt(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::For { target, iter, body } = &node.data else {
        return CodeNode::empty();
    };
    let iter = v.visit(iter);
    let target = v.visit_store(target, iter.ty.iteration_type());
    let body = v.visit_block(body);
    code(node, "for", Type::named("none"))
        .with("target", target)
        .with("iter", iter)
        .with("body", body)
}

/// Functions and methods.
///
/// Directly inside a class body the first parameter is the receiver: it is
/// typed as the class and takes the `__self__` rule's `alt_name` as its
/// rendered name. The method name itself may be renamed by a `T.name` rule
/// (`any.__init__: {alt_name: constructor}`).
#[tracing::instrument(level = "trace", skip_all, fields(name = tracing::field::Empty))]
pub fn function_def(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::FunctionDef { name, args, body } = &node.data else {
        return CodeNode::empty();
    };
    tracing::Span::current().record("name", name.as_str());

    let class = match v.state().scope_kind() {
        Some(ScopeKind::Class) => v.state().enter_context(),
        _ => None,
    };
    let class_ty = class.as_ref().map(|path| Type::named(path.name()));
    let rendered = class_ty
        .as_ref()
        .and_then(|ty| v.find_member_rule(ty, name))
        .and_then(|rule| rule.alt_name.clone())
        .unwrap_or_else(|| name.clone());

    let (symbol, declared) = v.state_mut().declare_or_update(name, Type::named("function"));
    let previous = v.state_mut().push_scope(name, ScopeKind::Function);

    let mut params = args.iter();
    let receiver = match &class_ty {
        Some(ty) => params.next().map(|first| {
            let alias = v
                .find_member_rule(ty, "__self__")
                .and_then(|rule| rule.alt_name.clone());
            let symbol = v.state_mut().declare_local(first, ty.clone(), alias);
            param(node, first, ty.clone(), symbol)
        }),
        None => None,
    };
    let rest: Vec<CodeNode> = params
        .map(|arg| {
            let symbol = v.state_mut().declare_local(arg, Type::unknown(), None);
            param(node, arg, Type::unknown(), symbol)
        })
        .collect();
    let body = v.visit_scope(body);
    v.state_mut().restore_scope(previous);

    let all: Vec<CodeNode> = receiver.iter().cloned().chain(rest.iter().cloned()).collect();
    let method = class.is_some();
    let mut function = code(node, "function", Type::named("function"))
        .with("name", rendered)
        .with("args", all)
        .with("rest_args", rest)
        .with("method", method)
        .with("constructor", method && name == "__init__")
        .with("declared", declared)
        .with("body", body)
        .with_owner(symbol);
    if let Some(receiver) = receiver {
        function = function.with("receiver", receiver);
    }
    if let Some(class) = &class {
        function = function.with("class", class.name());
    }
    function
}

pub fn class_def(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::ClassDef { name, body } = &node.data else {
        return CodeNode::empty();
    };
    let (symbol, declared) = v.state_mut().declare_or_update(name, Type::named("class"));
    let previous = v.state_mut().push_scope(name, ScopeKind::Class);
    let body = v.visit_scope(body);
    v.state_mut().restore_scope(previous);

    code(node, "class", Type::named("class"))
        .with("name", name.as_str())
        .with("body", body)
        .with("declared", declared)
        .with_owner(symbol)
}

pub fn return_stmt(v: &mut Visitor<'_>, node: &Node) -> CodeNode {
    let NodeData::Return { value } = &node.data else {
        return CodeNode::empty();
    };
    let base = code(node, "return", Type::named("none"));
    match value {
        Some(value) => {
            let value = v.visit(value);
            base.with("value", value)
        }
        None => base,
    }
}

pub fn pass(_: &mut Visitor<'_>, node: &Node) -> CodeNode {
    code(node, "pass", Type::named("none"))
}

pub fn break_stmt(_: &mut Visitor<'_>, node: &Node) -> CodeNode {
    code(node, "break", Type::named("none"))
}

pub fn continue_stmt(_: &mut Visitor<'_>, node: &Node) -> CodeNode {
    code(node, "continue", Type::named("none"))
}

/// The same target read instead of written.
fn as_load(target: &Node) -> Node {
    let mut load = target.clone();
    match &mut load.data {
        NodeData::Name { ctx, .. }
        | NodeData::Attribute { ctx, .. }
        | NodeData::Subscript { ctx, .. } => *ctx = Access::Load,
        _ => {}
    }
    load
}
