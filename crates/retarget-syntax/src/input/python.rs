//! Tree-sitter based Python reader.

use crate::ir::*;
use crate::traits::{ReadError, Reader};
use tree_sitter::{Node as TsNode, Parser, Tree};

/// Static instance of the Python reader for registry.
pub static PYTHON_READER: PythonReader = PythonReader;

/// Python reader using tree-sitter.
pub struct PythonReader;

impl Reader for PythonReader {
    fn dialect(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn read(&self, source: &str) -> Result<Program, ReadError> {
        read_python(source)
    }
}

/// Parse Python source into the normalized tree.
pub fn read_python(source: &str) -> Result<Program, ReadError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_python::language().into())
        .map_err(|err| ReadError::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ReadError::Parse("failed to parse".into()))?;

    let ctx = ReadContext::new(source);
    ctx.read_program(&tree)
}

struct ReadContext<'a> {
    source: &'a str,
}

impl<'a> ReadContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: TsNode) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn line(node: TsNode) -> u32 {
        node.start_position().row as u32 + 1
    }

    fn field<'t>(&self, node: TsNode<'t>, name: &str) -> Result<TsNode<'t>, ReadError> {
        node.child_by_field_name(name)
            .ok_or_else(|| ReadError::Parse(format!("{} missing {}", node.kind(), name)))
    }

    /// Named children, skipping comments.
    fn named_children<'t>(&self, node: TsNode<'t>) -> Vec<TsNode<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect()
    }

    fn read_program(&self, tree: &Tree) -> Result<Program, ReadError> {
        let root = tree.root_node();

        if root.has_error() {
            return Err(ReadError::Parse("syntax error in source".into()));
        }

        Ok(Program::new(self.read_block_stmts(root)?))
    }

    fn read_block_stmts(&self, node: TsNode) -> Result<Vec<Node>, ReadError> {
        let mut stmts = Vec::new();
        for child in self.named_children(node) {
            stmts.extend(self.read_stmt(child)?);
        }
        Ok(stmts)
    }

    /// One surface statement may lower to several nodes (chained assignment).
    fn read_stmt(&self, node: TsNode) -> Result<Vec<Node>, ReadError> {
        let line = Self::line(node);
        let stmt = match node.kind() {
            "expression_statement" => {
                let children = self.named_children(node);
                let inner = children.first().copied().ok_or_else(|| {
                    ReadError::Parse("expression_statement has no child".into())
                })?;
                match inner.kind() {
                    "assignment" => return self.read_assignment(inner),
                    "augmented_assignment" => self.read_augmented_assignment(inner)?,
                    _ if children.len() > 1 => {
                        // `a, b` as a statement is a tuple expression
                        let elts = children
                            .iter()
                            .map(|c| self.read_expr(*c))
                            .collect::<Result<_, _>>()?;
                        Node::expr(Node::new(NodeData::Tuple { elts }).at(line))
                    }
                    _ => Node::expr(self.read_expr(inner)?),
                }
            }

            // Grammar versions without the expression_statement wrapper
            "assignment" => return self.read_assignment(node),
            "augmented_assignment" => self.read_augmented_assignment(node)?,
            "expression_list" => {
                let elts = self.read_exprs(node)?;
                Node::expr(Node::new(NodeData::Tuple { elts }).at(line))
            }
            kind if is_expression(kind) => Node::expr(self.read_expr(node)?),

            "if_statement" => self.read_if_statement(node)?,
            "while_statement" => self.read_while_statement(node)?,
            "for_statement" => self.read_for_statement(node)?,
            "return_statement" => self.read_return_statement(node)?,
            "function_definition" => self.read_function_definition(node)?,
            "class_definition" => self.read_class_definition(node)?,

            "pass_statement" => Node::new(NodeData::Pass),
            "break_statement" => Node::new(NodeData::Break),
            "continue_statement" => Node::new(NodeData::Continue),

            "import_statement" => {
                let mut cursor = node.walk();
                let names = node
                    .children_by_field_name("name", &mut cursor)
                    .map(|n| self.imported_name(n))
                    .collect();
                Node::new(NodeData::Import { names })
            }
            "import_from_statement" => {
                let module = self.field(node, "module_name")?;
                Node::new(NodeData::Import {
                    names: vec![self.node_text(module).to_string()],
                })
            }

            "decorated_definition" => {
                let def = self.field(node, "definition")?;
                return self.read_stmt(def);
            }

            other => Node::new(NodeData::Unsupported {
                syntax: other.to_string(),
            }),
        };
        Ok(vec![stmt.at(line)])
    }

    fn imported_name(&self, node: TsNode) -> String {
        match node.kind() {
            "aliased_import" => node
                .child_by_field_name("name")
                .map(|n| self.node_text(n).to_string())
                .unwrap_or_default(),
            _ => self.node_text(node).to_string(),
        }
    }

    /// `a = b = v` lowers to `b = v` followed by `a = b`.
    fn read_assignment(&self, node: TsNode) -> Result<Vec<Node>, ReadError> {
        let line = Self::line(node);
        let left = self.field(node, "left")?;
        let target = self.read_target(left)?;

        let Some(right) = node.child_by_field_name("right") else {
            // Bare annotation (`x: int`) declares nothing at runtime
            return Ok(Vec::new());
        };

        if right.kind() == "assignment" {
            let inner_left = self.field(right, "left")?;
            let mut stmts = self.read_assignment(right)?;
            let source = self.read_expr(inner_left)?;
            stmts.push(Node::assign(target, source).at(line));
            return Ok(stmts);
        }

        let value = self.read_expr(right)?;
        Ok(vec![Node::assign(target, value).at(line)])
    }

    fn read_augmented_assignment(&self, node: TsNode) -> Result<Node, ReadError> {
        let left = self.field(node, "left")?;
        let right = self.field(node, "right")?;
        let op_node = self.field(node, "operator")?;

        let op_text = self.node_text(op_node);
        let op = binary_operator(op_text.trim_end_matches('=')).ok_or_else(|| {
            ReadError::Parse(format!("unknown augmented op: {}", op_text))
        })?;

        Ok(Node::new(NodeData::AugAssign {
            target: Box::new(self.read_target(left)?),
            op,
            value: Box::new(self.read_expr(right)?),
        }))
    }

    /// Assignment targets are read with store access.
    fn read_target(&self, node: TsNode) -> Result<Node, ReadError> {
        let line = Self::line(node);
        let target = match node.kind() {
            "identifier" => Node::store(self.node_text(node)),
            "attribute" => {
                let object = self.field(node, "object")?;
                let attribute = self.field(node, "attribute")?;
                Node::new(NodeData::Attribute {
                    value: Box::new(self.read_expr(object)?),
                    attr: self.node_text(attribute).to_string(),
                    ctx: Access::Store,
                })
            }
            "subscript" => {
                let value = self.field(node, "value")?;
                let subscript = self.field(node, "subscript")?;
                Node::new(NodeData::Subscript {
                    value: Box::new(self.read_expr(value)?),
                    slice: Box::new(self.read_expr(subscript)?),
                    ctx: Access::Store,
                })
            }
            other => {
                return Err(ReadError::Unsupported(format!(
                    "assignment target: {}",
                    other
                )));
            }
        };
        Ok(target.at(line))
    }

    fn read_if_statement(&self, node: TsNode) -> Result<Node, ReadError> {
        let test = self.read_expr(self.field(node, "condition")?)?;
        let body = self.read_block_stmts(self.field(node, "consequence")?)?;

        let mut cursor = node.walk();
        let alternatives: Vec<_> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();

        // Fold `elif` clauses from the end into nested `If` nodes.
        let mut orelse = Vec::new();
        for alt in alternatives.into_iter().rev() {
            match alt.kind() {
                "else_clause" => {
                    orelse = self.read_block_stmts(self.field(alt, "body")?)?;
                }
                "elif_clause" => {
                    let test = self.read_expr(self.field(alt, "condition")?)?;
                    let body = self.read_block_stmts(self.field(alt, "consequence")?)?;
                    orelse = vec![Node::if_stmt(test, body, orelse).at(Self::line(alt))];
                }
                _ => {}
            }
        }

        Ok(Node::if_stmt(test, body, orelse))
    }

    fn read_while_statement(&self, node: TsNode) -> Result<Node, ReadError> {
        if node.child_by_field_name("alternative").is_some() {
            return Err(ReadError::Unsupported("while ... else".into()));
        }
        let test = self.read_expr(self.field(node, "condition")?)?;
        let body = self.read_block_stmts(self.field(node, "body")?)?;

        Ok(Node::new(NodeData::While {
            test: Box::new(test),
            body,
        }))
    }

    fn read_for_statement(&self, node: TsNode) -> Result<Node, ReadError> {
        if node.child_by_field_name("alternative").is_some() {
            return Err(ReadError::Unsupported("for ... else".into()));
        }
        let left = self.field(node, "left")?;
        if left.kind() != "identifier" {
            return Err(ReadError::Unsupported(format!("for target: {}", left.kind())));
        }

        Ok(Node::new(NodeData::For {
            target: Box::new(Node::store(self.node_text(left)).at(Self::line(left))),
            iter: Box::new(self.read_expr(self.field(node, "right")?)?),
            body: self.read_block_stmts(self.field(node, "body")?)?,
        }))
    }

    fn read_return_statement(&self, node: TsNode) -> Result<Node, ReadError> {
        // Python grammar: return_statement has child expression without field name
        let value = self
            .named_children(node)
            .first()
            .map(|n| self.read_expr(*n))
            .transpose()?;
        Ok(Node::return_stmt(value))
    }

    fn read_function_definition(&self, node: TsNode) -> Result<Node, ReadError> {
        let name = self.field(node, "name")?;
        let params = node.child_by_field_name("parameters");
        let body = self.field(node, "body")?;

        let fn_params = params
            .map(|p| self.read_parameters(p))
            .unwrap_or_default();

        Ok(Node::function(
            self.node_text(name),
            fn_params,
            self.read_block_stmts(body)?,
        ))
    }

    fn read_class_definition(&self, node: TsNode) -> Result<Node, ReadError> {
        let name = self.field(node, "name")?;
        let body = self.field(node, "body")?;

        Ok(Node::new(NodeData::ClassDef {
            name: self.node_text(name).to_string(),
            body: self.read_block_stmts(body)?,
        }))
    }

    fn read_parameters(&self, node: TsNode) -> Vec<String> {
        let mut params = Vec::new();

        for child in self.named_children(node) {
            match child.kind() {
                "identifier" => {
                    params.push(self.node_text(child).to_string());
                }
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        params.push(self.node_text(name).to_string());
                    }
                }
                "typed_parameter" => {
                    // Get just the name, ignore type annotation
                    if let Some(name) = child.named_child(0)
                        && name.kind() == "identifier"
                    {
                        params.push(self.node_text(name).to_string());
                    }
                }
                _ => {}
            }
        }

        params
    }

    fn read_expr(&self, node: TsNode) -> Result<Node, ReadError> {
        let line = Self::line(node);
        let expr = match node.kind() {
            // Literals
            "integer" => Node::int(parse_int(self.node_text(node))?),
            "float" => {
                let text = self.node_text(node).replace('_', "");
                let value: f64 = text
                    .parse()
                    .map_err(|_| ReadError::Parse(format!("invalid float literal: {}", text)))?;
                Node::float(value)
            }
            "string" => Node::string(self.string_value(node)?),
            "concatenated_string" => {
                let value: String = self
                    .named_children(node)
                    .into_iter()
                    .map(|part| self.string_value(part))
                    .collect::<Result<_, _>>()?;
                Node::string(value)
            }
            "true" => Node::bool(true),
            "false" => Node::bool(false),
            "none" => Node::none(),

            "identifier" => Node::name(self.node_text(node)),

            "binary_operator" => self.read_binary_operator(node)?,
            "comparison_operator" => self.read_comparison_operator(node)?,
            "boolean_operator" => self.read_boolean_operator(node)?,
            "unary_operator" => self.read_unary_operator(node)?,
            "not_operator" => {
                let arg = self.field(node, "argument")?;
                Node::unary(Operator::Not, self.read_expr(arg)?)
            }

            "call" => self.read_call(node)?,
            "attribute" => {
                let object = self.field(node, "object")?;
                let attribute = self.field(node, "attribute")?;
                Node::attribute(self.read_expr(object)?, self.node_text(attribute))
            }
            "subscript" => {
                let value = self.field(node, "value")?;
                let subscript = self.field(node, "subscript")?;
                Node::subscript(self.read_expr(value)?, self.read_expr(subscript)?)
            }
            "slice" => self.read_slice(node)?,

            "list" => Node::list(self.read_exprs(node)?),
            "tuple" => Node::new(NodeData::Tuple {
                elts: self.read_exprs(node)?,
            }),
            "dictionary" => self.read_dictionary(node)?,

            "parenthesized_expression" => {
                let inner = self.named_children(node).first().copied().ok_or_else(|| {
                    ReadError::Parse("parenthesized_expression missing inner".into())
                })?;
                return self.read_expr(inner);
            }

            "conditional_expression" => {
                // Pattern: body if test else orelse
                let children = self.named_children(node);
                let [body, test, orelse] = children.as_slice() else {
                    return Err(ReadError::Parse(
                        "conditional_expression needs 3 parts".into(),
                    ));
                };
                Node::new(NodeData::IfExp {
                    test: Box::new(self.read_expr(*test)?),
                    body: Box::new(self.read_expr(*body)?),
                    orelse: Box::new(self.read_expr(*orelse)?),
                })
            }

            "lambda" => {
                let body = self.field(node, "body")?;
                let args = node
                    .child_by_field_name("parameters")
                    .map(|p| self.read_parameters(p))
                    .unwrap_or_default();
                Node::new(NodeData::Lambda {
                    args,
                    body: Box::new(self.read_expr(body)?),
                })
            }

            other => {
                return Err(ReadError::Unsupported(format!("expression: {}", other)));
            }
        };
        Ok(expr.at(line))
    }

    fn read_exprs(&self, node: TsNode) -> Result<Vec<Node>, ReadError> {
        self.named_children(node)
            .into_iter()
            .map(|child| self.read_expr(child))
            .collect()
    }

    /// Decoded contents of a `string` node.
    ///
    /// Formatted strings are rejected: their `{...}` parts are code, not text.
    fn string_value(&self, node: TsNode) -> Result<String, ReadError> {
        let mut start = None;
        let mut end = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "string_start" => start = Some(child),
                "string_end" => end = Some(child),
                "interpolation" => return Err(ReadError::Unsupported("f-string".into())),
                _ => {}
            }
        }

        let (prefix, raw) = match (start, end) {
            (Some(s), Some(e)) => (
                self.node_text(s),
                &self.source[s.end_byte()..e.start_byte()],
            ),
            _ => {
                let text = self.node_text(node);
                let body = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
                let quote = if body.starts_with("\"\"\"") || body.starts_with("'''") {
                    3
                } else {
                    1
                };
                let prefix = &text[..text.len() - body.len() + quote.min(body.len())];
                let inner = if body.len() >= quote * 2 {
                    &body[quote..body.len() - quote]
                } else {
                    ""
                };
                (prefix, inner)
            }
        };

        if prefix.contains(['f', 'F']) {
            return Err(ReadError::Unsupported("f-string".into()));
        }
        if prefix.contains(['r', 'R']) {
            Ok(raw.to_string())
        } else {
            unescape(raw)
        }
    }

    fn read_binary_operator(&self, node: TsNode) -> Result<Node, ReadError> {
        let left = self.field(node, "left")?;
        let right = self.field(node, "right")?;
        let op_node = self.field(node, "operator")?;

        let op = binary_operator(self.node_text(op_node)).ok_or_else(|| {
            ReadError::Parse(format!("unknown binary op: {}", self.node_text(op_node)))
        })?;

        Ok(Node::bin_op(self.read_expr(left)?, op, self.read_expr(right)?))
    }

    /// Comparison chains stay one `Compare` node; folding is up to the engine.
    fn read_comparison_operator(&self, node: TsNode) -> Result<Node, ReadError> {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            if child.is_named() {
                operands.push(self.read_expr(child)?);
            } else {
                let text = self
                    .node_text(child)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
                let op = comparison_operator(&text)
                    .ok_or_else(|| ReadError::Parse(format!("unknown comparison op: {}", text)))?;
                ops.push(op);
            }
        }

        if operands.len() < 2 || operands.len() != ops.len() + 1 {
            return Err(ReadError::Parse(
                "comparison needs an operator between every operand".into(),
            ));
        }

        let left = operands.remove(0);
        Ok(Node::compare(left, ops, operands))
    }

    /// `a and b and c` is one `BoolOp` with three values.
    fn read_boolean_operator(&self, node: TsNode) -> Result<Node, ReadError> {
        let op_node = self.field(node, "operator")?;
        let op = match self.node_text(op_node) {
            "and" => Operator::And,
            "or" => Operator::Or,
            other => {
                return Err(ReadError::Parse(format!("unknown boolean op: {}", other)));
            }
        };

        let mut values = Vec::new();
        for side in ["left", "right"] {
            let operand = self.read_expr(self.field(node, side)?)?;
            let same_chain = side == "left"
                && matches!(&operand.data, NodeData::BoolOp { op: inner, .. } if *inner == op);
            match operand.data {
                NodeData::BoolOp {
                    values: inner_values,
                    ..
                } if same_chain => values.extend(inner_values),
                _ => values.push(operand),
            }
        }

        Ok(Node::bool_op(op, values))
    }

    fn read_unary_operator(&self, node: TsNode) -> Result<Node, ReadError> {
        let op_node = self.field(node, "operator")?;
        let arg = self.field(node, "argument")?;

        let op = match self.node_text(op_node) {
            "-" => Operator::USub,
            "+" => Operator::UAdd,
            "~" => Operator::Invert,
            other => {
                return Err(ReadError::Parse(format!("unknown unary op: {}", other)));
            }
        };

        Ok(Node::unary(op, self.read_expr(arg)?))
    }

    fn read_call(&self, node: TsNode) -> Result<Node, ReadError> {
        let function = self.field(node, "function")?;
        let callee = self.read_expr(function)?;

        let mut args = Vec::new();
        if let Some(arguments) = node.child_by_field_name("arguments") {
            if arguments.kind() != "argument_list" {
                return Err(ReadError::Unsupported(format!(
                    "call arguments: {}",
                    arguments.kind()
                )));
            }
            for child in self.named_children(arguments) {
                match child.kind() {
                    "keyword_argument" | "list_splat" | "dictionary_splat" => {
                        return Err(ReadError::Unsupported(format!(
                            "call argument: {}",
                            child.kind()
                        )));
                    }
                    _ => args.push(self.read_expr(child)?),
                }
            }
        }

        Ok(Node::call(callee, args))
    }

    /// `lower:upper:step`, each part optional.
    fn read_slice(&self, node: TsNode) -> Result<Node, ReadError> {
        let mut parts: [Option<Box<Node>>; 3] = [None, None, None];
        let mut slot = 0;
        let mut cursor = node.walk();

        for child in node.children(&mut cursor) {
            if child.kind() == ":" {
                slot += 1;
            } else if child.is_named() && child.kind() != "comment" && slot < 3 {
                parts[slot] = Some(Box::new(self.read_expr(child)?));
            }
        }

        let [lower, upper, step] = parts;
        Ok(Node::new(NodeData::Slice { lower, upper, step }))
    }

    fn read_dictionary(&self, node: TsNode) -> Result<Node, ReadError> {
        let mut keys = Vec::new();
        let mut values = Vec::new();

        for child in self.named_children(node) {
            if child.kind() != "pair" {
                return Err(ReadError::Unsupported(format!(
                    "dictionary entry: {}",
                    child.kind()
                )));
            }
            keys.push(self.read_expr(self.field(child, "key")?)?);
            values.push(self.read_expr(self.field(child, "value")?)?);
        }

        Ok(Node::new(NodeData::Dict { keys, values }))
    }
}

/// Node kinds that are expressions when they appear as a statement.
fn is_expression(kind: &str) -> bool {
    matches!(
        kind,
        "integer"
            | "float"
            | "string"
            | "concatenated_string"
            | "true"
            | "false"
            | "none"
            | "identifier"
            | "binary_operator"
            | "comparison_operator"
            | "boolean_operator"
            | "unary_operator"
            | "not_operator"
            | "call"
            | "attribute"
            | "subscript"
            | "list"
            | "tuple"
            | "dictionary"
            | "set"
            | "parenthesized_expression"
            | "conditional_expression"
            | "lambda"
            | "list_comprehension"
            | "dictionary_comprehension"
            | "set_comprehension"
            | "generator_expression"
            | "named_expression"
            | "await"
            | "ellipsis"
    )
}

fn binary_operator(text: &str) -> Option<Operator> {
    Some(match text {
        "+" => Operator::Add,
        "-" => Operator::Sub,
        "*" => Operator::Mult,
        "/" => Operator::Div,
        "//" => Operator::FloorDiv,
        "%" => Operator::Mod,
        "**" => Operator::Pow,
        "<<" => Operator::LShift,
        ">>" => Operator::RShift,
        "|" => Operator::BitOr,
        "^" => Operator::BitXor,
        "&" => Operator::BitAnd,
        "@" => Operator::MatMult,
        _ => return None,
    })
}

fn comparison_operator(text: &str) -> Option<Operator> {
    Some(match text {
        "<" => Operator::Lt,
        "<=" => Operator::LtE,
        ">" => Operator::Gt,
        ">=" => Operator::GtE,
        "==" => Operator::Eq,
        "!=" | "<>" => Operator::NotEq,
        "is" => Operator::Is,
        "is not" => Operator::IsNot,
        "in" => Operator::In,
        "not in" => Operator::NotIn,
        _ => return None,
    })
}

fn parse_int(text: &str) -> Result<i64, ReadError> {
    let digits = text.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else {
        lower.parse()
    };
    parsed.map_err(|_| ReadError::Parse(format!("invalid integer literal: {}", text)))
}

/// Decode the escape sequences of a non-raw string literal.
fn unescape(raw: &str) -> Result<String, ReadError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            out.push('\\');
            break;
        };
        match escape {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '\n' => {}
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(code_point(value)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            'N' => return Err(ReadError::Unsupported("named unicode escape".into())),
            // Unknown escapes keep their backslash
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn hex_escape(chars: &mut impl Iterator<Item = char>, digits: usize) -> Result<char, ReadError> {
    let text: String = chars.take(digits).collect();
    if text.chars().count() != digits {
        return Err(ReadError::Parse(format!("truncated escape: {}", text)));
    }
    let value = u32::from_str_radix(&text, 16)
        .map_err(|_| ReadError::Parse(format!("invalid escape: {}", text)))?;
    code_point(value)
}

fn code_point(value: u32) -> Result<char, ReadError> {
    char::from_u32(value).ok_or_else(|| ReadError::Parse(format!("invalid code point: {:#x}", value)))
}
