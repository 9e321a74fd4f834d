//! Rule lookup: operator overloads, attributes, calls and subscripts.

use super::{Visitor, code};
use crate::node::{CodeNode, Part};
use crate::overlay::{Rule, SideEffect};
use crate::types::{Operand, Type};
use retarget_syntax::{Node, NodeKind, Operator};

impl<'a> Visitor<'a> {
    /// First rule `T.member` along `ty`'s generalization chain.
    pub(crate) fn find_member_rule(&self, ty: &Type, member: &str) -> Option<&'a Rule> {
        let overlay = self.overlay();
        ty.generalization_chain().iter().find_map(|t| {
            let key = format!("{}.{}", t, member);
            let rule = overlay.rule(&key);
            if rule.is_some() {
                tracing::trace!(%key, "member rule matched");
            }
            rule
        })
    }

    /// Apply a matched rule to `base`.
    ///
    /// Binds the rule's argument names to `args`, runs its side effects, and
    /// replaces the default template and type when the rule declares them.
    pub(crate) fn apply_rule(&mut self, rule: &Rule, mut base: CodeNode, args: &[CodeNode]) -> CodeNode {
        for (name, arg) in rule.args.iter().zip(args) {
            base.parts.insert(name.clone(), Part::Node(arg.clone()));
        }

        for effect in &rule.side_effects {
            match effect {
                SideEffect::Use(name) => self.state_mut().mark_used(name),
                SideEffect::Temp(prefix) => {
                    let temp = self.state_mut().temp_var(prefix);
                    base.parts.insert("temp".into(), Part::Text(temp));
                }
            }
        }

        if let Some(template) = &rule.template {
            base.template = Some(template.clone());
        }
        if let Some(expr) = &rule.ty {
            let ty = expr.eval(&|operand: Operand<'_>| match operand {
                Operand::Part(name) => base.child(name).map(|child| child.ty.clone()),
                Operand::Arg(index) => args.get(index).map(|arg| arg.ty.clone()),
            });
            base.ty = ty;
        }
        base
    }

    /// Binary operator overload resolution.
    ///
    /// Tries `L.op.R` for every pair of the two generalization chains, left
    /// chain outer, right chain inner; the first rule found wins. Without
    /// one the generic `binop` template is used and the result type is
    /// unknown.
    pub(crate) fn resolve_binop(
        &mut self,
        node: &Node,
        op: Operator,
        left: CodeNode,
        right: CodeNode,
    ) -> CodeNode {
        let overlay = self.overlay();
        let lefts = left.ty.generalization_chain();
        let rights = right.ty.generalization_chain();

        let matched = lefts.iter().find_map(|l| {
            rights.iter().find_map(|r| {
                let key = format!("{}.{}.{}", l, op.symbol(), r);
                overlay.rule(&key).map(|rule| (key, rule))
            })
        });

        let args = [left.clone(), right.clone()];
        let base = code(node, "binop", Type::unknown())
            .with("left", left)
            .with("right", right)
            .with("op", overlay.operator(op));

        match matched {
            Some((key, rule)) => {
                tracing::trace!(%key, "operator rule matched");
                self.apply_rule(rule, base, &args)
            }
            None => base,
        }
    }

    /// `obj.attr` or, with `args`, `obj.attr(args)`.
    ///
    /// Module-typed objects try `module.attr` first, then fall back to the
    /// generalization chain like everything else.
    pub(crate) fn resolve_attribute(
        &mut self,
        node: &Node,
        obj: CodeNode,
        attr: &str,
        args: Option<Vec<CodeNode>>,
    ) -> CodeNode {
        let overlay = self.overlay();
        let rule = match &obj.ty {
            Type::Module(module) => overlay
                .rule(&format!("{}.{}", module, attr))
                .or_else(|| self.find_member_rule(&obj.ty, attr)),
            ty => self.find_member_rule(ty, attr),
        };

        let is_module = matches!(obj.ty, Type::Module(_));
        let template = if args.is_some() { "method_call" } else { "attr" };
        let rendered = rule
            .and_then(|rule| rule.alt_name.clone())
            .unwrap_or_else(|| attr.to_string());

        let mut base = code(node, template, Type::unknown())
            .with("obj", obj)
            .with("attr", rendered)
            .with("is_module", is_module);
        let args = args.unwrap_or_default();
        if template == "method_call" {
            base = base.with("args", args.clone());
        }

        match rule {
            Some(rule) => self.apply_rule(rule, base, &args),
            None => base,
        }
    }

    /// `name(args)` where `name` is a plain identifier.
    ///
    /// Locals shadow overlay rules; a local bound to a class constructs an
    /// instance through the `new` template.
    pub(crate) fn resolve_named_call(
        &mut self,
        node: &Node,
        func: &Node,
        id: &str,
        args: Vec<CodeNode>,
    ) -> CodeNode {
        if let Some(symbol) = self.state().lookup(id) {
            let is_class = self
                .state()
                .symbols()
                .get(&symbol)
                .is_some_and(|record| record.current_type() == Type::named("class"));
            let callee = self.visit(func);
            return if is_class {
                code(node, "new", Type::named(id))
                    .with("func", callee)
                    .with("args", args)
            } else {
                code(node, "call", Type::unknown())
                    .with("func", callee)
                    .with("args", args)
            };
        }

        let overlay = self.overlay();
        match overlay.rule(id) {
            Some(rule) => {
                tracing::trace!(key = %id, "function rule matched");
                let rendered = rule.alt_name.clone().unwrap_or_else(|| id.to_string());
                let base = code(node, "call", Type::unknown())
                    .with("func", rendered)
                    .with("args", args.clone());
                self.apply_rule(rule, base, &args)
            }
            None => {
                let callee = self.visit(func);
                code(node, "call", Type::unknown())
                    .with("func", callee)
                    .with("args", args)
            }
        }
    }

    /// `obj[key]` through `T.__getitem__`.
    pub(crate) fn resolve_index(&mut self, node: &Node, obj: CodeNode, key: CodeNode) -> CodeNode {
        let rule = self.find_member_rule(&obj.ty, "__getitem__");
        let base = code(node, "index", obj.ty.element_type())
            .with("obj", obj)
            .with("key", key.clone());
        match rule {
            Some(rule) => self.apply_rule(rule, base, &[key]),
            None => base,
        }
    }

    /// `obj[lower:upper:step]` through `T.__getslice__`.
    ///
    /// Missing bounds are filled in: `0`, `len(obj)` and `1`.
    pub(crate) fn resolve_slice(
        &mut self,
        node: &Node,
        obj: CodeNode,
        lower: Option<CodeNode>,
        upper: Option<CodeNode>,
        step: Option<CodeNode>,
    ) -> CodeNode {
        let lower = lower.unwrap_or_else(|| int_code(node, 0));
        let upper = match upper {
            Some(upper) => upper,
            None => {
                let func = Node::name("len").at(node.line);
                let call = Node::call(func.clone(), Vec::new()).at(node.line);
                self.resolve_named_call(&call, &func, "len", vec![obj.clone()])
            }
        };
        let step = step.unwrap_or_else(|| int_code(node, 1));

        let rule = self.find_member_rule(&obj.ty, "__getslice__");
        let base = code(node, "slice", obj.ty.clone())
            .with("obj", obj)
            .with("lower", lower.clone())
            .with("upper", upper.clone())
            .with("step", step.clone());
        match rule {
            Some(rule) => self.apply_rule(rule, base, &[lower, upper, step]),
            None => base,
        }
    }
}

/// Synthesized integer literal.
pub(crate) fn int_code(node: &Node, value: i64) -> CodeNode {
    CodeNode::new(NodeKind::Constant, "int", Type::named("int"), node.line)
        .with("value", value.to_string())
}
