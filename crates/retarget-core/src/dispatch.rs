//! Node kind -> handler table.

use crate::node::CodeNode;
use crate::visit::{Visitor, expr, stmt};
use retarget_syntax::{Node, NodeData, NodeKind};
use std::collections::HashMap;
use std::fmt;

/// Turns one tree node into a code node.
pub type Handler = fn(&mut Visitor<'_>, &Node) -> CodeNode;

/// Immutable handler table, built once before any run.
#[derive(Clone)]
pub struct DispatchRegistry {
    handlers: HashMap<NodeKind, Handler>,
}

#[derive(Clone, Default)]
pub struct RegistryBuilder {
    handlers: HashMap<NodeKind, Handler>,
}

impl RegistryBuilder {
    /// Register `handler` for `kind`, replacing any earlier registration.
    pub fn register(mut self, kind: NodeKind, handler: Handler) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn build(self) -> DispatchRegistry {
        DispatchRegistry {
            handlers: self.handlers,
        }
    }
}

impl DispatchRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Every built-in handler.
    ///
    /// `Import` and `Unsupported` stay unregistered: imports are expressed
    /// through `use(...)` side effects, and unsupported syntax is dropped.
    /// `Slice` only occurs under `Subscript`, whose handler reads it.
    pub fn standard() -> Self {
        Self::builder()
            // expressions
            .register(NodeKind::Constant, expr::constant)
            .register(NodeKind::Name, expr::name)
            .register(NodeKind::BinOp, expr::bin_op)
            .register(NodeKind::UnaryOp, expr::unary_op)
            .register(NodeKind::BoolOp, expr::bool_op)
            .register(NodeKind::Compare, expr::compare)
            .register(NodeKind::Call, expr::call)
            .register(NodeKind::Attribute, expr::attribute)
            .register(NodeKind::Subscript, expr::subscript)
            .register(NodeKind::List, expr::list)
            .register(NodeKind::Tuple, expr::tuple)
            .register(NodeKind::Dict, expr::dict)
            .register(NodeKind::IfExp, expr::if_exp)
            .register(NodeKind::Lambda, expr::lambda)
            // statements
            .register(NodeKind::Expr, stmt::expr_stmt)
            .register(NodeKind::Assign, stmt::assign)
            .register(NodeKind::AugAssign, stmt::aug_assign)
            .register(NodeKind::If, stmt::if_stmt)
            .register(NodeKind::While, stmt::while_stmt)
            .register(NodeKind::For, stmt::for_stmt)
            .register(NodeKind::FunctionDef, stmt::function_def)
            .register(NodeKind::ClassDef, stmt::class_def)
            .register(NodeKind::Return, stmt::return_stmt)
            .register(NodeKind::Pass, stmt::pass)
            .register(NodeKind::Break, stmt::break_stmt)
            .register(NodeKind::Continue, stmt::continue_stmt)
            .build()
    }

    pub fn handler(&self, kind: NodeKind) -> Option<Handler> {
        self.handlers.get(&kind).copied()
    }

    pub fn is_registered(&self, kind: NodeKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Run the handler for `node`, or drop it with a warning.
    pub fn dispatch(&self, visitor: &mut Visitor<'_>, node: &Node) -> CodeNode {
        if let Some(handler) = self.handler(node.kind()) {
            return handler(visitor, node);
        }
        match &node.data {
            NodeData::Unsupported { syntax } => {
                tracing::warn!(line = node.line, syntax = %syntax, "unsupported syntax dropped");
            }
            _ => {
                tracing::warn!(line = node.line, kind = %node.kind(), "no handler registered; node dropped");
            }
        }
        CodeNode::empty()
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("DispatchRegistry").field("kinds", &kinds).finish()
    }
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
