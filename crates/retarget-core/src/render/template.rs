//! Overlay template language.
//!
//! ```text
//! {{path}}                    value at a dotted path (`target.$mutable`)
//! {{path|filter|filter("a")}} value piped through filters
//! {{"text"}}                  literal
//! {{#if path}}..{{#else}}..{{/if}}, {{#if !path}}
//! ```
//!
//! A `{` directly before `{{` is literal text, so `{{{elts}}}` renders a
//! braced list. A block tag alone on its line removes that whole line.

use super::{Value, Values};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TemplateError(String);

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Expr(Expr),
    If {
        negate: bool,
        path: Vec<String>,
        then: Vec<Segment>,
        otherwise: Vec<Segment>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Expr {
    source: Source,
    filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
enum Source {
    Path(Vec<String>),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Join(String),
    Lines,
    Indent(String),
    Each(String),
    Escape,
    Default(String),
}

/// Lexer output.
#[derive(Debug)]
enum Token {
    Text(String),
    Expr(Expr),
    If { negate: bool, path: Vec<String> },
    Else,
    EndIf,
}

impl Template {
    pub fn parse(source: &str) -> Result<Template, TemplateError> {
        let tokens = tokenize(source)?;
        let mut tokens = tokens.into_iter();
        let (segments, end) = build(&mut tokens)?;
        match end {
            None => Ok(Template { segments }),
            Some(Token::Else) => Err(TemplateError("`{{#else}}` outside `{{#if}}`".into())),
            Some(_) => Err(TemplateError("`{{/if}}` without `{{#if}}`".into())),
        }
    }

    pub fn render(&self, values: &Values) -> String {
        let mut out = String::new();
        render_segments(&self.segments, values, &mut out);
        out
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while let Some(offset) = source[pos..].find("{{") {
        let mut open = pos + offset;
        // `{{{x}}}`: the first brace is text
        while source[open + 2..].starts_with('{') {
            open += 1;
        }
        text.push_str(&source[pos..open]);

        let body_start = open + 2;
        let close = find_close(source, body_start)
            .ok_or_else(|| TemplateError(format!("unclosed tag at byte {}", open)))?;
        let body = source[body_start..close].trim();
        let mut after = close + 2;

        let token = parse_tag(body)?;
        if !matches!(token, Token::Expr(_)) {
            // Standalone block tag: drop its line.
            let line_start = source[..open].rfind('\n').map_or(0, |i| i + 1);
            let line_end = source[after..].find('\n').map(|i| after + i);
            let before_blank = source[line_start..open].trim().is_empty();
            let after_blank = source[after..line_end.unwrap_or(source.len())]
                .trim()
                .is_empty();
            if before_blank && after_blank && text.len() >= open - line_start.max(pos) {
                let indent = open - line_start.max(pos);
                text.truncate(text.len() - indent);
                after = line_end.map_or(source.len(), |end| end + 1);
            }
        }

        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut text)));
        }
        tokens.push(token);
        pos = after;
    }

    text.push_str(&source[pos..]);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(tokens)
}

/// Byte offset of the `}}` closing a tag body, skipping quoted strings.
fn find_close(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut quote = None;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'}' && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

fn parse_tag(body: &str) -> Result<Token, TemplateError> {
    if let Some(condition) = body.strip_prefix("#if") {
        let condition = condition.trim();
        let (negate, path) = match condition.strip_prefix('!') {
            Some(path) => (true, path.trim()),
            None => (false, condition),
        };
        return Ok(Token::If {
            negate,
            path: parse_path(path)?,
        });
    }
    match body {
        "#else" => return Ok(Token::Else),
        "/if" => return Ok(Token::EndIf),
        _ => {}
    }
    if body.starts_with(['#', '/']) {
        return Err(TemplateError(format!("unknown block tag `{}`", body)));
    }

    let mut pieces = split_pipes(body).into_iter();
    let head = pieces.next().unwrap_or_default();
    let source = match parse_quoted(head)? {
        Some(literal) => Source::Literal(literal),
        None => Source::Path(parse_path(head)?),
    };
    let filters = pieces.map(parse_filter).collect::<Result<_, _>>()?;
    Ok(Token::Expr(Expr { source, filters }))
}

fn parse_path(text: &str) -> Result<Vec<String>, TemplateError> {
    let segments: Vec<String> = text.split('.').map(|s| s.trim().to_string()).collect();
    let valid = segments.iter().all(|segment| {
        let name = segment.strip_prefix('$').unwrap_or(segment);
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if valid {
        Ok(segments)
    } else {
        Err(TemplateError(format!("invalid path `{}`", text)))
    }
}

/// `|` separated pieces, ignoring pipes inside quotes.
fn split_pipes(body: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quote = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '|' => {
                pieces.push(body[start..i].trim());
                start = i + 1;
            }
            None => {}
        }
    }
    pieces.push(body[start..].trim());
    pieces
}

/// A quoted string literal, unescaped; `None` if `text` is not quoted.
fn parse_quoted(text: &str) -> Result<Option<String>, TemplateError> {
    let Some(quote) = text.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return Ok(None);
    };
    if text.len() < 2 || !text.ends_with(quote) {
        return Err(TemplateError(format!("unterminated string `{}`", text)));
    }
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    Ok(Some(out))
}

fn parse_filter(text: &str) -> Result<Filter, TemplateError> {
    let (name, arg) = match text.find('(') {
        Some(open) if text.ends_with(')') => {
            let arg = text[open + 1..text.len() - 1].trim();
            let arg = parse_quoted(arg)?
                .ok_or_else(|| TemplateError(format!("filter argument must be quoted: `{}`", text)))?;
            (text[..open].trim(), Some(arg))
        }
        Some(_) => return Err(TemplateError(format!("unbalanced filter `{}`", text))),
        None => (text, None),
    };

    let filter = match (name, arg) {
        ("join", arg) => Filter::Join(arg.unwrap_or_else(|| ", ".into())),
        ("lines", None) => Filter::Lines,
        ("indent", arg) => Filter::Indent(arg.unwrap_or_else(|| "    ".into())),
        ("each", Some(format)) => Filter::Each(format),
        ("escape", None) => Filter::Escape,
        ("default", Some(fallback)) => Filter::Default(fallback),
        _ => return Err(TemplateError(format!("unknown filter `{}`", text))),
    };
    Ok(filter)
}

/// Assemble tokens into nested segments until a closing tag or the end.
fn build(
    tokens: &mut impl Iterator<Item = Token>,
) -> Result<(Vec<Segment>, Option<Token>), TemplateError> {
    let mut segments = Vec::new();
    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => segments.push(Segment::Text(text)),
            Token::Expr(expr) => segments.push(Segment::Expr(expr)),
            Token::If { negate, path } => {
                let (then, end) = build(tokens)?;
                let otherwise = match end {
                    Some(Token::EndIf) => Vec::new(),
                    Some(Token::Else) => match build(tokens)? {
                        (otherwise, Some(Token::EndIf)) => otherwise,
                        _ => return Err(TemplateError("`{{#else}}` without `{{/if}}`".into())),
                    },
                    _ => return Err(TemplateError("`{{#if}}` without `{{/if}}`".into())),
                };
                segments.push(Segment::If {
                    negate,
                    path,
                    then,
                    otherwise,
                });
            }
            end @ (Token::Else | Token::EndIf) => return Ok((segments, Some(end))),
        }
    }
    Ok((segments, None))
}

fn render_segments(segments: &[Segment], values: &Values, out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Expr(expr) => {
                let value = match &expr.source {
                    Source::Literal(text) => Value::Text(text.clone()),
                    Source::Path(path) => lookup(values, path).cloned().unwrap_or_default(),
                };
                let value = expr
                    .filters
                    .iter()
                    .fold(value, |value, filter| apply(filter, value));
                out.push_str(&value.to_text());
            }
            Segment::If {
                negate,
                path,
                then,
                otherwise,
            } => {
                let truthy = lookup(values, path).is_some_and(Value::is_truthy);
                let branch = if truthy != *negate { then } else { otherwise };
                render_segments(branch, values, out);
            }
        }
    }
}

fn lookup<'v>(values: &'v Values, path: &[String]) -> Option<&'v Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(values.get(first)?, |value, segment| match value {
            Value::Node { fields, .. } => fields.get(segment),
            _ => None,
        })
}

fn apply(filter: &Filter, value: Value) -> Value {
    match filter {
        Filter::Join(separator) => Value::Text(value.join(separator)),
        Filter::Lines => Value::Text(value.join("\n")),
        Filter::Indent(prefix) => {
            let text = value.to_text();
            let indented: Vec<String> = text
                .split('\n')
                .map(|line| {
                    if line.trim().is_empty() {
                        line.to_string()
                    } else {
                        format!("{}{}", prefix, line)
                    }
                })
                .collect();
            Value::Text(indented.join("\n"))
        }
        Filter::Each(format) => match value {
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| Value::Text(format.replace("{}", &item.to_text())))
                    .collect(),
            ),
            other if other.is_truthy() => Value::Text(format.replace("{}", &other.to_text())),
            other => other,
        },
        Filter::Escape => Value::Text(escape(&value.to_text())),
        Filter::Default(fallback) => {
            if value.is_truthy() {
                value
            } else {
                Value::Text(fallback.clone())
            }
        }
    }
}

/// Escape for a double-quoted string literal.
///
/// Other ASCII control characters become `\xHH`, which every target reads
/// the same way.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    fn render(template: &str, values: &[(&str, Value)]) -> String {
        let values: Values = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Template::parse(template).unwrap().render(&values)
    }

    #[test]
    fn test_paths_and_literals() {
        let node = Value::Node {
            text: "x".into(),
            fields: [("$mutable".to_string(), Value::Bool(true))].into(),
        };
        assert_eq!(
            render("{{target}} = {{value}}", &[("target", node.clone()), ("value", text("1"))]),
            "x = 1"
        );
        assert_eq!(render("{{target.$mutable}}", &[("target", node)]), "true");
        assert_eq!(render("{{\"a|b\"}}{{missing}}", &[]), "a|b");
    }

    #[test]
    fn test_braces_next_to_tags() {
        let elts = Value::List(vec![text("1"), text("2")]);
        assert_eq!(render("{{{elts}}}", &[("elts", elts)]), "{1, 2}");
    }

    #[test]
    fn test_filters() {
        let items = Value::List(vec![text("a"), text(""), text("b\nc")]);
        assert_eq!(render("{{xs|join(\" + \")}}", &[("xs", items.clone())]), "a + b\nc");
        assert_eq!(render("{{xs|lines|indent}}", &[("xs", items.clone())]), "    a\n    b\n    c");
        assert_eq!(
            render("{{xs|each(\"import {}\")|lines}}", &[("xs", Value::List(vec![text("os"), text("re")]))]),
            "import os\nimport re"
        );
        assert_eq!(render("{{s|escape}}", &[("s", text("say \"hi\"\n"))]), "say \\\"hi\\\"\\n");
        assert_eq!(render("{{s|escape}}", &[("s", text("a\0b\x07"))]), "a\\x00b\\x07");
        assert_eq!(render("{{xs|lines|default(\"pass\")|indent(\"  \")}}", &[("xs", Value::List(vec![]))]), "  pass");
    }

    #[test]
    fn test_conditionals() {
        let template = "{{#if flag}}yes{{#else}}no{{/if}}/{{#if !flag}}off{{/if}}";
        assert_eq!(render(template, &[("flag", Value::Bool(true))]), "yes/");
        assert_eq!(render(template, &[("flag", Value::Bool(false))]), "no/off");
        assert_eq!(render(template, &[]), "no/off");
    }

    #[test]
    fn test_standalone_block_lines_vanish() {
        let template = "if {{test}}:\n    {{body}}\n{{#if orelse}}\nelse:\n    {{orelse}}\n{{/if}}\ndone";
        assert_eq!(
            render(template, &[("test", text("x")), ("body", text("a"))]),
            "if x:\n    a\ndone"
        );
        assert_eq!(
            render(
                template,
                &[("test", text("x")), ("body", text("a")), ("orelse", text("b"))]
            ),
            "if x:\n    a\nelse:\n    b\ndone"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Template::parse("{{#if x}}open").is_err());
        assert!(Template::parse("{{/if}}").is_err());
        assert!(Template::parse("{{x|shout}}").is_err());
        assert!(Template::parse("{{x").is_err());
        assert!(Template::parse("{{each(x)}}").is_err());
        assert!(Template::parse("{{a..b}}").is_err());
    }
}
