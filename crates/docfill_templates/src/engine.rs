//! Template engine for normalized document markup.
//!
//! Parts are parsed and rendered with [`tera`], whose syntax is close to the
//! Jinja dialect document templates are written in: `{{ value | filter }}`
//! output, `{% if %}`/`{% elif %}`/`{% else %}`, `{% for %}` loops, `{% set %}`
//! and `{# comments #}`.
//!
//! Before tera sees a part, a structural pass catches broken markup
//! (unterminated delimiters, unbalanced blocks) and reports it as
//! [`ParseError::Syntax`]. Well-formed markup that tera cannot handle, or
//! that reaches outside the document (includes, macros, functions), is
//! [`ParseError::Unsupported`].
//!
//! Form values are flat, so a variable used as a loop container iterates over
//! the non-empty lines of its value.

use std::collections::{BTreeSet, HashSet};
use std::error::Error as _;

use tera::ast::{Expr, ExprVal, FunctionCall, Node};
use tera::{Context, Tera};

use crate::coerce::{RenderContext, TypedValue};
use crate::markup;

/// Name of the single template registered per parsed part.
const PART_TEMPLATE: &str = "part.xml";

/// The only tera function a document may call.
const RANGE_FUNCTION: &str = "range";

/// Loop-scoped variable tera provides inside `for` bodies.
const LOOP_VARIABLE: &str = "loop";

/// Why a part could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Valid template markup that cannot be used in a document
    Unsupported(String),
    /// Broken template markup
    Syntax(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "unsupported construct: {}", what),
            Self::Syntax(what) => write!(f, "syntax error: {}", what),
        }
    }
}

/// Why a parsed part could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A referenced variable (or member path) the context cannot supply
    Missing(String),
    /// The engine rejected the values it was given
    Failed(String),
}

/// Parsed markup part.
#[derive(Debug, Clone)]
pub struct Template {
    tera: Tera,
    variables: BTreeSet<String>,
    loop_containers: BTreeSet<String>,
    member_paths: BTreeSet<String>,
}

impl Template {
    /// Parse normalized markup.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        check_structure(source)?;

        let mut tera = Tera::default();
        tera.autoescape_on(vec![".xml"]);
        tera.set_escape_fn(markup::escape);
        tera.add_raw_template(PART_TEMPLATE, source)
            .map_err(|e| ParseError::Unsupported(error_chain(&e)))?;

        let ast = tera
            .get_template(PART_TEMPLATE)
            .map_err(|e| ParseError::Unsupported(error_chain(&e)))?
            .ast
            .clone();

        let mut analysis = Analysis::default();
        analysis.nodes(&ast, &mut Vec::new())?;

        Ok(Self {
            tera,
            variables: analysis.variables,
            loop_containers: analysis.loop_containers,
            member_paths: analysis.member_paths,
        })
    }

    /// Every context variable the part references, loop-local names excluded.
    pub fn variables(&self) -> BTreeSet<String> {
        self.variables.clone()
    }

    /// Variables iterated by `for` loops.
    pub fn loop_containers(&self) -> &BTreeSet<String> {
        &self.loop_containers
    }

    /// Evaluate against a context. Output values are XML-escaped.
    pub fn render(&self, context: &RenderContext) -> Result<String, RenderError> {
        if let Some(missing) = self.variables.iter().find(|v| context.get(v).is_none()) {
            return Err(RenderError::Missing(missing.clone()));
        }
        // Flat form values have no members.
        if let Some(path) = self.member_paths.iter().next() {
            return Err(RenderError::Missing(path.clone()));
        }

        let mut values = Context::new();
        for (name, value) in context.iter() {
            if self.loop_containers.contains(name) {
                values.insert(name, &loop_items(value));
            } else {
                values.insert(name, value);
            }
        }

        self.tera
            .render(PART_TEMPLATE, &values)
            .map_err(|e| RenderError::Failed(error_chain(&e)))
    }
}

/// Items a loop over a form value iterates: its non-empty lines.
fn loop_items(value: &TypedValue) -> Vec<String> {
    match value {
        TypedValue::Text(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        other => vec![other.to_string()],
    }
}

fn error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Variable usage collected from a part's syntax tree.
#[derive(Default)]
struct Analysis {
    variables: BTreeSet<String>,
    loop_containers: BTreeSet<String>,
    member_paths: BTreeSet<String>,
    assigned: HashSet<String>,
}

impl Analysis {
    fn nodes(&mut self, nodes: &[Node], locals: &mut Vec<String>) -> Result<(), ParseError> {
        let scope = locals.len();
        for node in nodes {
            self.node(node, locals)?;
        }
        locals.truncate(scope);
        Ok(())
    }

    fn node(&mut self, node: &Node, locals: &mut Vec<String>) -> Result<(), ParseError> {
        match node {
            Node::VariableBlock(_, expr) => self.expr(expr, locals)?,
            Node::Set(_, set) => {
                self.expr(&set.value, locals)?;
                if set.global {
                    self.assigned.insert(set.key.clone());
                } else {
                    locals.push(set.key.clone());
                }
            }
            Node::If(branches, _) => {
                for (_, condition, body) in &branches.conditions {
                    self.expr(condition, locals)?;
                    self.nodes(body, locals)?;
                }
                if let Some((_, body)) = &branches.otherwise {
                    self.nodes(body, locals)?;
                }
            }
            Node::Forloop(_, forloop, _) => {
                self.expr(&forloop.container, locals)?;
                if let ExprVal::Ident(name) = &forloop.container.val {
                    if !self.is_local(name, locals) {
                        if forloop.key.is_some() {
                            return Err(ParseError::Unsupported(format!(
                                "key-value loop over '{}'",
                                name
                            )));
                        }
                        self.loop_containers.insert(name.clone());
                    }
                }

                let scope = locals.len();
                locals.push(forloop.value.clone());
                locals.extend(forloop.key.clone());
                locals.push(LOOP_VARIABLE.to_string());
                self.nodes(&forloop.body, locals)?;
                locals.truncate(scope);

                if let Some(body) = &forloop.empty_body {
                    self.nodes(body, locals)?;
                }
            }
            Node::FilterSection(_, section, _) => {
                self.call_args(&section.filter, locals)?;
                self.nodes(&section.body, locals)?;
            }
            Node::Block(_, block, _) => self.nodes(&block.body, locals)?,
            Node::Extends(..) => return Err(ParseError::Unsupported("extends".into())),
            Node::Include(..) => return Err(ParseError::Unsupported("include".into())),
            Node::ImportMacro(..) | Node::MacroDefinition(..) => {
                return Err(ParseError::Unsupported("macros".into()))
            }
            _ => {}
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr, locals: &[String]) -> Result<(), ParseError> {
        self.expr_val(&expr.val, locals)?;
        for filter in &expr.filters {
            self.call_args(filter, locals)?;
        }
        Ok(())
    }

    fn expr_val(&mut self, val: &ExprVal, locals: &[String]) -> Result<(), ParseError> {
        match val {
            ExprVal::Ident(name) => self.ident(name, locals),
            ExprVal::Math(math) => {
                self.expr(&math.lhs, locals)?;
                self.expr(&math.rhs, locals)?;
            }
            ExprVal::Logic(logic) => {
                self.expr(&logic.lhs, locals)?;
                self.expr(&logic.rhs, locals)?;
            }
            ExprVal::In(within) => {
                self.expr(&within.lhs, locals)?;
                self.expr(&within.rhs, locals)?;
            }
            ExprVal::Test(test) => {
                self.ident(&test.ident, locals);
                for arg in &test.args {
                    self.expr(arg, locals)?;
                }
            }
            ExprVal::Array(items) => {
                for item in items {
                    self.expr(item, locals)?;
                }
            }
            ExprVal::StringConcat(concat) => {
                for value in &concat.values {
                    self.expr_val(value, locals)?;
                }
            }
            ExprVal::FunctionCall(call) if call.name == RANGE_FUNCTION => {
                self.call_args(call, locals)?;
            }
            ExprVal::FunctionCall(call) => {
                return Err(ParseError::Unsupported(format!("function '{}'", call.name)))
            }
            ExprVal::MacroCall(call) => {
                return Err(ParseError::Unsupported(format!("macro '{}'", call.name)))
            }
            _ => {}
        }
        Ok(())
    }

    fn call_args(&mut self, call: &FunctionCall, locals: &[String]) -> Result<(), ParseError> {
        for arg in call.args.values() {
            self.expr(arg, locals)?;
        }
        Ok(())
    }

    fn ident(&mut self, name: &str, locals: &[String]) {
        let root = root_of(name);
        if root == LOOP_VARIABLE && locals.iter().any(|l| l == LOOP_VARIABLE) {
            return;
        }
        if root != name {
            self.member_paths.insert(name.to_string());
        }
        if !self.is_local(root, locals) {
            self.variables.insert(root.to_string());
        }
    }

    fn is_local(&self, name: &str, locals: &[String]) -> bool {
        let root = root_of(name);
        locals.iter().any(|l| l == root) || self.assigned.contains(root)
    }
}

/// `client` for `client.name` or `rows[0]`.
fn root_of(name: &str) -> &str {
    name.split(['.', '[']).next().unwrap_or(name)
}

enum Token<'a> {
    Expr(&'a str),
    Stmt(&'a str),
}

/// Block statements that must be closed by `end<keyword>`.
const BLOCK_KEYWORDS: [&str; 5] = ["if", "for", "filter", "block", "macro"];

struct OpenBlock<'a> {
    keyword: &'a str,
    seen_else: bool,
}

/// Delimiter and block balance of a part.
fn check_structure(source: &str) -> Result<(), ParseError> {
    let mut stack: Vec<OpenBlock<'_>> = Vec::new();
    let mut in_raw = false;

    for token in tokenize(source)? {
        let stmt = match token {
            Token::Expr(_) if in_raw => continue,
            Token::Expr(expr) => {
                if expr.trim_matches(|c: char| c == '-' || c.is_whitespace()).is_empty() {
                    return Err(ParseError::Syntax("empty expression".into()));
                }
                continue;
            }
            Token::Stmt(stmt) => stmt,
        };

        let words: Vec<&str> = stmt
            .trim_matches(|c: char| c == '-' || c.is_whitespace())
            .split_whitespace()
            .collect();
        let Some((&keyword, args)) = words.split_first() else {
            return Err(ParseError::Syntax("empty statement".into()));
        };

        if in_raw {
            in_raw = keyword != "endraw";
            continue;
        }

        match keyword {
            "raw" => in_raw = true,
            k if BLOCK_KEYWORDS.contains(&k) => {
                if args.is_empty() {
                    return Err(ParseError::Syntax(format!("{} without arguments", k)));
                }
                stack.push(OpenBlock {
                    keyword: k,
                    seen_else: false,
                });
            }
            "elif" | "else" => {
                let open = stack
                    .last_mut()
                    .ok_or_else(|| ParseError::Syntax(format!("{} outside a block", keyword)))?;
                let allowed = open.keyword == "if" || (keyword == "else" && open.keyword == "for");
                if !allowed || open.seen_else {
                    return Err(ParseError::Syntax(format!(
                        "unexpected {} in {} block",
                        keyword, open.keyword
                    )));
                }
                if keyword == "elif" && args.is_empty() {
                    return Err(ParseError::Syntax("elif without condition".into()));
                }
                open.seen_else = keyword == "else";
            }
            k if k.starts_with("end") => {
                let closes = &k[3..];
                match stack.pop() {
                    Some(open) if open.keyword == closes => {}
                    Some(open) => {
                        return Err(ParseError::Syntax(format!(
                            "{} closes an open {} block",
                            k, open.keyword
                        )))
                    }
                    None => return Err(ParseError::Syntax(format!("{} without {}", k, closes))),
                }
            }
            _ => {}
        }
    }

    if in_raw {
        return Err(ParseError::Syntax("unclosed raw block".into()));
    }
    if let Some(open) = stack.last() {
        return Err(ParseError::Syntax(format!(
            "{} unclosed block(s), innermost {}",
            stack.len(),
            open.keyword
        )));
    }
    Ok(())
}

fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Some((start, kind)) = find_open(rest) {
        let close = match kind {
            b'{' => "}}",
            b'%' => "%}",
            _ => "#}",
        };
        let after = &rest[start + 2..];
        let end = after.find(close).ok_or_else(|| {
            ParseError::Syntax(format!("unterminated '{{{}'", kind as char))
        })?;
        let inner = &after[..end];
        match kind {
            b'{' => tokens.push(Token::Expr(inner)),
            b'%' => tokens.push(Token::Stmt(inner)),
            _ => {}
        }
        rest = &after[end + 2..];
    }

    Ok(tokens)
}

fn find_open(text: &str) -> Option<(usize, u8)> {
    let bytes = text.as_bytes();
    bytes.windows(2).enumerate().find_map(|(i, pair)| {
        (pair[0] == b'{' && matches!(pair[1], b'{' | b'%' | b'#')).then_some((i, pair[1]))
    })
}
