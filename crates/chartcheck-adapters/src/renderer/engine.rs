//! A Go-template engine covering what chart templates use.
//!
//! Text is interleaved with `{{ ... }}` actions; `{{-`/`-}}` trim adjacent
//! whitespace and `{{/* ... */}}` is a comment. Supported actions:
//!
//! ```text
//! {{ pipeline }}                        output
//! {{ $name := pipeline }}               declare ($name = ... assigns)
//! {{ if p }} .. {{ else if p }} .. {{ else }} .. {{ end }}
//! {{ with p }} .. {{ else }} .. {{ end }}
//! {{ range $i, $e := p }} .. {{ else }} .. {{ end }}
//! {{ define "name" }} .. {{ end }}
//! {{ template "name" pipeline }}
//! ```
//!
//! A pipeline is one or more commands joined by `|`; the value of each
//! command is passed as the last argument of the next one. Operands are `.`,
//! field chains (`.Values.tidb.config`), variables (`$`, `$ctx.Values`),
//! string/number/bool literals, functions and parenthesised pipelines.
//!
//! The data (`.`) at the top of a template is the chart root object with
//! `Values`, `Release`, `Chart`, `Capabilities`, `Files` and `Template`.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use chartcheck_core::domain::{Bundle, EvaluationContext};

use super::values;

/// `.Release.Service` as reported by the release manager.
const RELEASE_SERVICE: &str = "Tiller";

/// Nested `template`/`include` calls allowed before execution stops.
const MAX_DEPTH: usize = 64;

/// Widest `indent`/`nindent` accepted.
const MAX_INDENT: i64 = 1024;

/// Errors raised while parsing or executing a template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated action starting at byte {offset}")]
    Unterminated { offset: usize },

    #[error("syntax error in action '{action}': {reason}")]
    Syntax { action: String, reason: String },

    #[error("unexpected '{0}' action")]
    UnexpectedAction(String),

    #[error("'{0}' block is missing its end action")]
    Unclosed(String),

    #[error("unknown object {0}")]
    UnknownObject(String),

    #[error("value {0} is not set; use `default` to provide one")]
    MissingValue(String),

    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    #[error("unknown function {0}")]
    UnknownFunction(String),

    #[error("wrong arguments for {function}: {reason}")]
    BadArguments { function: String, reason: String },

    #[error("template {0} is not defined")]
    UndefinedTemplate(String),

    #[error("template {0} calls itself too deeply")]
    TooDeep(String),

    #[error("file {0} not found in chart")]
    MissingFile(String),

    #[error("invalid values in {origin}: {reason}")]
    Values { origin: String, reason: String },
}

/// Named templates visible to `template` and `include`.
///
/// Holds every `define` block plus each registered file under its own name,
/// the way chart tooling exposes `<chart>/templates/<path>`.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    named: BTreeMap<String, Vec<Node>>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `template` as `name`, along with its `define` blocks.
    /// Later registrations replace earlier ones of the same name.
    pub fn register(&mut self, name: impl Into<String>, template: &Template) {
        self.named.insert(name.into(), template.nodes.clone());
        for (defined, body) in &template.defines {
            self.named.insert(defined.clone(), body.clone());
        }
    }
}

/// Everything a template can see while executing.
pub struct Scope<'a> {
    root: Value,
    definitions: &'a Definitions,
}

impl<'a> Scope<'a> {
    /// Build the root object from the chart, the context and the merged
    /// values.
    pub fn new(
        bundle: &Bundle,
        context: &EvaluationContext,
        values: Value,
        definitions: &'a Definitions,
    ) -> Self {
        Self {
            root: root_object(bundle, context, values),
            definitions,
        }
    }
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
    defines: BTreeMap<String, Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Output(Pipeline),
    If {
        branches: Vec<(Pipeline, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    With {
        pipeline: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Range {
        pipeline: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Call {
        name: String,
        arg: Option<Pipeline>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    decl: Option<Decl>,
    commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
enum Decl {
    /// `$a := ...`, or `$i, $e := ...` in a range.
    Declare(Vec<String>),
    /// `$a = ...`
    Assign(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    /// A lone operand, e.g. `.Values.a` or `"text"`.
    Operand(Operand),
    /// `.Files.Get`; the target is the `Files` object.
    FilesGet { target: Operand, args: Vec<Operand> },
    /// A function call; a piped value is appended to `args`.
    Call { name: String, args: Vec<Operand> },
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Dot,
    Field(Vec<String>),
    Var { name: String, path: Vec<String> },
    Str(String),
    Int(i64),
    Bool(bool),
    Nil,
    /// A function used as an argument, called without arguments.
    Func(String),
    Sub(Box<Pipeline>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Dot,
    Field(Vec<String>),
    Var { name: String, path: Vec<String> },
    Str(String),
    Int(i64),
    Ident(String),
    Pipe,
    Open,
    Close,
    Comma,
    Declare,
    Assign,
}

/// Result of evaluating an operand: a value, or the name of what was missing.
#[derive(Debug, Clone, PartialEq)]
enum Data {
    Present(Value),
    Missing(String),
}

impl Template {
    /// Parse `source` into a node tree and its `define` blocks.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut parser = Parser {
            items: lex(source)?.into_iter(),
            defines: BTreeMap::new(),
        };
        let (nodes, stop) = parser.list()?;
        match stop {
            Stop::Eof => Ok(Self {
                nodes,
                defines: parser.defines,
            }),
            Stop::End => Err(TemplateError::UnexpectedAction("end".into())),
            Stop::Else(_) => Err(TemplateError::UnexpectedAction("else".into())),
        }
    }

    /// Execute the template as `name` against `scope`.
    pub fn execute(&self, scope: &Scope<'_>, name: &str) -> Result<String, TemplateError> {
        let mut root = scope.root.clone();
        if let Some(Value::Mapping(template)) = root.get_mut("Template") {
            template.insert(Value::from("Name"), Value::from(name));
        }

        let mut exec = Exec {
            definitions: scope.definitions,
            vars: vec![(String::new(), root.clone())],
            depth: 0,
        };
        let mut out = String::new();
        exec.walk(&self.nodes, &root, &mut out)?;
        Ok(out)
    }
}

// -----------------------------------------------------------------------------
// Lexing
// -----------------------------------------------------------------------------

enum Item {
    Text(String),
    Action(String),
}

/// Split `source` into text and action bodies, applying trim markers and
/// dropping comments.
fn lex(source: &str) -> Result<Vec<Item>, TemplateError> {
    let mut items = Vec::new();
    let mut rest = source;
    let mut offset = 0;
    let mut trim_next = false;

    while let Some(open) = rest.find("{{") {
        let mut text = &rest[..open];
        if trim_next {
            text = text.trim_start();
        }

        let after_open = &rest[open + 2..];
        let trim_left = after_open.starts_with("- ")
            || after_open.starts_with("-\t")
            || after_open.starts_with("-\n")
            || after_open.starts_with("-\r");
        if trim_left {
            text = text.trim_end();
        }
        if !text.is_empty() {
            items.push(Item::Text(text.to_string()));
        }

        let close = find_close(after_open).ok_or(TemplateError::Unterminated {
            offset: offset + open,
        })?;
        let mut body = &after_open[..close];
        if trim_left {
            body = &body[1..];
        }
        trim_next = body.ends_with(" -")
            || body.ends_with("\t-")
            || body.ends_with("\n-")
            || body.ends_with("\r-");
        if trim_next {
            body = &body[..body.len() - 1];
        }

        let body = body.trim();
        if !(body.starts_with("/*") && body.ends_with("*/")) {
            items.push(Item::Action(body.to_string()));
        }

        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    let tail = if trim_next { rest.trim_start() } else { rest };
    if !tail.is_empty() {
        items.push(Item::Text(tail.to_string()));
    }

    Ok(items)
}

/// Byte offset of the closing `}}`, skipping quoted strings and comments.
fn find_close(body: &str) -> Option<usize> {
    let trimmed = body.trim_start_matches(['-', ' ', '\t', '\n', '\r']);
    if trimmed.starts_with("/*") {
        let start = body.len() - trimmed.len();
        let end = trimmed.find("*/")? + 2;
        return body[start + end..]
            .find("}}")
            .map(|close| start + end + close);
    }

    let bytes = body.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if b == b'}' && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(action: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = action.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '|' | '(' | ')' | ',' | '=' => {
                chars.next();
                tokens.push(match c {
                    '|' => Token::Pipe,
                    '(' => Token::Open,
                    ')' => Token::Close,
                    ',' => Token::Comma,
                    _ => Token::Assign,
                });
            }
            ':' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => tokens.push(Token::Declare),
                    _ => return Err("expected ':='".into()),
                }
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, 'n')) => s.push('\n'),
                            Some((_, 't')) => s.push('\t'),
                            Some((_, other)) => s.push(other),
                            None => return Err("unterminated string".into()),
                        },
                        Some((_, other)) => s.push(other),
                        None => return Err("unterminated string".into()),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '`' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '`')) => break,
                        Some((_, other)) => s.push(other),
                        None => return Err("unterminated raw string".into()),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '.' => {
                let end = scan(action, start + 1, |c| is_ident(c) || c == '.');
                let chain = &action[start..end];
                tokens.push(if chain == "." {
                    Token::Dot
                } else {
                    Token::Field(split_chain(chain))
                });
                advance_to(&mut chars, end);
            }
            '$' => {
                let name_end = scan(action, start + 1, is_ident);
                let end = if action[name_end..].starts_with('.') {
                    scan(action, name_end, |c| is_ident(c) || c == '.')
                } else {
                    name_end
                };
                tokens.push(Token::Var {
                    name: action[start + 1..name_end].to_string(),
                    path: split_chain(&action[name_end..end]),
                });
                advance_to(&mut chars, end);
            }
            c if c.is_ascii_digit() || c == '-' => {
                let end = scan(action, start + 1, |c| c.is_ascii_digit());
                let literal = &action[start..end];
                let n = literal
                    .parse::<i64>()
                    .map_err(|_| format!("invalid number '{literal}'"))?;
                tokens.push(Token::Int(n));
                advance_to(&mut chars, end);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let end = scan(action, start, is_ident);
                tokens.push(Token::Ident(action[start..end].to_string()));
                advance_to(&mut chars, end);
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

fn split_chain(chain: &str) -> Vec<String> {
    chain
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn scan(s: &str, from: usize, accept: impl Fn(char) -> bool) -> usize {
    s[from..]
        .char_indices()
        .find(|&(_, c)| !accept(c))
        .map_or(s.len(), |(i, _)| from + i)
}

fn advance_to(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, end: usize) {
    while chars.peek().is_some_and(|&(i, _)| i < end) {
        chars.next();
    }
}

// -----------------------------------------------------------------------------
// Parsing
// -----------------------------------------------------------------------------

/// What ended a node list.
enum Stop {
    Eof,
    End,
    /// `else`, or `else if <pipeline>`.
    Else(Option<Pipeline>),
}

struct Parser {
    items: std::vec::IntoIter<Item>,
    defines: BTreeMap<String, Vec<Node>>,
}

impl Parser {
    fn list(&mut self) -> Result<(Vec<Node>, Stop), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(item) = self.items.next() {
            let action = match item {
                Item::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Item::Action(action) => action,
            };
            let tokens = tokenize(&action).map_err(|reason| syntax(&action, &reason))?;
            let mut cursor = Cursor {
                tokens: &tokens,
                pos: 1,
                action: &action,
            };

            let keyword = match tokens.first() {
                Some(Token::Ident(word)) => word.as_str(),
                Some(_) => "",
                None => return Err(syntax(&action, "empty action")),
            };
            match keyword {
                "end" => {
                    cursor.expect_end()?;
                    return Ok((nodes, Stop::End));
                }
                "else" => {
                    if cursor.at_end() {
                        return Ok((nodes, Stop::Else(None)));
                    }
                    match tokens.get(1) {
                        Some(Token::Ident(word)) if word == "if" => {
                            cursor.pos = 2;
                            let cond = cursor.full_pipeline(false)?;
                            return Ok((nodes, Stop::Else(Some(cond))));
                        }
                        _ => return Err(syntax(&action, "expected 'if' after 'else'")),
                    }
                }
                "if" => {
                    let cond = cursor.full_pipeline(false)?;
                    nodes.push(self.if_block(cond)?);
                }
                "with" => {
                    let pipeline = cursor.full_pipeline(false)?;
                    let (body, otherwise) = self.block("with")?;
                    nodes.push(Node::With {
                        pipeline,
                        body,
                        otherwise,
                    });
                }
                "range" => {
                    let pipeline = cursor.full_pipeline(true)?;
                    if matches!(pipeline.decl, Some(Decl::Assign(_))) {
                        return Err(syntax(&action, "range variables must be declared with ':='"));
                    }
                    let (body, otherwise) = self.block("range")?;
                    nodes.push(Node::Range {
                        pipeline,
                        body,
                        otherwise,
                    });
                }
                "define" => {
                    let [_, Token::Str(name)] = tokens.as_slice() else {
                        return Err(syntax(&action, "expected a quoted template name"));
                    };
                    let (body, stop) = self.list()?;
                    if !matches!(stop, Stop::End) {
                        return Err(TemplateError::Unclosed(format!("define {name}")));
                    }
                    self.defines.insert(name.clone(), body);
                }
                "template" => {
                    let Some(Token::Str(name)) = tokens.get(1) else {
                        return Err(syntax(&action, "expected a quoted template name"));
                    };
                    cursor.pos = 2;
                    let arg = if cursor.at_end() {
                        None
                    } else {
                        Some(cursor.full_pipeline(false)?)
                    };
                    nodes.push(Node::Call {
                        name: name.clone(),
                        arg,
                    });
                }
                _ => {
                    cursor.pos = 0;
                    nodes.push(Node::Output(cursor.full_pipeline(false)?));
                }
            }
        }

        Ok((nodes, Stop::Eof))
    }

    fn if_block(&mut self, first: Pipeline) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut cond = first;
        loop {
            let (body, stop) = self.list()?;
            branches.push((cond, body));
            match stop {
                Stop::End => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    });
                }
                Stop::Else(Some(next)) => cond = next,
                Stop::Else(None) => {
                    let (otherwise, stop) = self.list()?;
                    return match stop {
                        Stop::End => Ok(Node::If {
                            branches,
                            otherwise,
                        }),
                        Stop::Else(_) => Err(TemplateError::UnexpectedAction("else".into())),
                        Stop::Eof => Err(TemplateError::Unclosed("if".into())),
                    };
                }
                Stop::Eof => return Err(TemplateError::Unclosed("if".into())),
            }
        }
    }

    /// Body and `else` branch of a `with` or `range` block.
    fn block(&mut self, keyword: &str) -> Result<(Vec<Node>, Vec<Node>), TemplateError> {
        let (body, stop) = self.list()?;
        match stop {
            Stop::End => Ok((body, Vec::new())),
            Stop::Else(None) => {
                let (otherwise, stop) = self.list()?;
                match stop {
                    Stop::End => Ok((body, otherwise)),
                    Stop::Else(_) => Err(TemplateError::UnexpectedAction("else".into())),
                    Stop::Eof => Err(TemplateError::Unclosed(keyword.into())),
                }
            }
            Stop::Else(Some(_)) => Err(TemplateError::UnexpectedAction("else if".into())),
            Stop::Eof => Err(TemplateError::Unclosed(keyword.into())),
        }
    }
}

fn syntax(action: &str, reason: &str) -> TemplateError {
    TemplateError::Syntax {
        action: action.to_string(),
        reason: reason.to_string(),
    }
}

/// Recursive-descent reader over one action's tokens.
struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    action: &'t str,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn error(&self, reason: &str) -> TemplateError {
        syntax(self.action, reason)
    }

    fn expect_end(&self) -> Result<(), TemplateError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("unexpected token"))
        }
    }

    /// A pipeline that must use every remaining token.
    fn full_pipeline(&mut self, in_range: bool) -> Result<Pipeline, TemplateError> {
        if self.at_end() {
            return Err(self.error("missing pipeline"));
        }
        let pipeline = self.pipeline(in_range)?;
        self.expect_end()?;
        Ok(pipeline)
    }

    fn pipeline(&mut self, in_range: bool) -> Result<Pipeline, TemplateError> {
        let decl = self.declaration(in_range);
        let mut commands = Vec::new();
        loop {
            let command = self.command()?;
            if !commands.is_empty() && matches!(command, Command::Operand(_)) {
                return Err(self.error("only functions can follow '|'"));
            }
            commands.push(command);
            if self.peek() == Some(&Token::Pipe) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(Pipeline { decl, commands })
    }

    fn declaration(&mut self, in_range: bool) -> Option<Decl> {
        let bare = |token: &Token| match token {
            Token::Var { name, path } if path.is_empty() => Some(name.clone()),
            _ => None,
        };
        let tokens = self.tokens;
        let rest = &tokens[self.pos..];

        if let [first, Token::Declare | Token::Assign, ..] = rest {
            let name = bare(first)?;
            let decl = if rest[1] == Token::Declare {
                Decl::Declare(vec![name])
            } else {
                Decl::Assign(name)
            };
            self.pos += 2;
            return Some(decl);
        }
        if let [first, Token::Comma, second, Token::Declare, ..] = rest {
            if in_range {
                let names = vec![bare(first)?, bare(second)?];
                self.pos += 4;
                return Some(Decl::Declare(names));
            }
        }
        None
    }

    fn command(&mut self) -> Result<Command, TemplateError> {
        let mut operands = Vec::new();
        while let Some(token) = self.peek() {
            if matches!(token, Token::Pipe | Token::Close) {
                break;
            }
            operands.push(self.operand()?);
        }

        let mut operands = operands.into_iter();
        let head = operands
            .next()
            .ok_or_else(|| self.error("missing command around '|'"))?;
        let args: Vec<Operand> = operands.collect();

        match head {
            Operand::Func(name) => Ok(Command::Call { name, args }),
            Operand::Field(path) if is_files_get(&path) => Ok(Command::FilesGet {
                target: Operand::Field(path[..path.len() - 1].to_vec()),
                args,
            }),
            Operand::Var { name, path } if is_files_get(&path) => Ok(Command::FilesGet {
                target: Operand::Var {
                    name,
                    path: path[..path.len() - 1].to_vec(),
                },
                args,
            }),
            other if args.is_empty() => Ok(Command::Operand(other)),
            _ => Err(self.error("only functions take arguments")),
        }
    }

    fn operand(&mut self) -> Result<Operand, TemplateError> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| self.error("missing operand"))?;
        self.pos += 1;

        Ok(match token {
            Token::Dot => Operand::Dot,
            Token::Field(path) => Operand::Field(path),
            Token::Var { name, path } => Operand::Var { name, path },
            Token::Str(s) => Operand::Str(s),
            Token::Int(n) => Operand::Int(n),
            Token::Ident(word) => match word.as_str() {
                "true" => Operand::Bool(true),
                "false" => Operand::Bool(false),
                "nil" => Operand::Nil,
                _ => Operand::Func(word),
            },
            Token::Open => {
                let inner = self.pipeline(false)?;
                if self.peek() != Some(&Token::Close) {
                    return Err(self.error("unclosed '('"));
                }
                self.pos += 1;
                Operand::Sub(Box::new(inner))
            }
            Token::Close | Token::Pipe | Token::Comma | Token::Declare | Token::Assign => {
                return Err(self.error("unexpected token"));
            }
        })
    }
}

fn is_files_get(path: &[String]) -> bool {
    matches!(path, [.., files, get] if files == "Files" && get == "Get")
}

// -----------------------------------------------------------------------------
// Execution
// -----------------------------------------------------------------------------

struct Exec<'s> {
    definitions: &'s Definitions,
    /// Variables in scope, innermost last. `$` has the empty name.
    vars: Vec<(String, Value)>,
    depth: usize,
}

impl Exec<'_> {
    fn walk(&mut self, nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            let mark = self.vars.len();
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output(pipeline) => {
                    let data = self.pipeline(pipeline, dot)?;
                    if pipeline.decl.is_none() {
                        out.push_str(&stringify(&present(data)?)?);
                    }
                    // Declarations stay visible for the rest of this list.
                    continue;
                }
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut chosen = otherwise.as_slice();
                    for (cond, body) in branches {
                        if truthy(&self.pipeline(cond, dot)?) {
                            chosen = body.as_slice();
                            break;
                        }
                    }
                    self.walk(chosen, dot, out)?;
                }
                Node::With {
                    pipeline,
                    body,
                    otherwise,
                } => match self.pipeline(pipeline, dot)? {
                    Data::Present(value) if !is_empty(&value) => self.walk(body, &value, out)?,
                    _ => self.walk(otherwise, dot, out)?,
                },
                Node::Range {
                    pipeline,
                    body,
                    otherwise,
                } => self.range(pipeline, body, otherwise, dot, out)?,
                Node::Call { name, arg } => {
                    let arg = match arg {
                        Some(pipeline) => value_of(self.commands(&pipeline.commands, dot)?),
                        None => Value::Null,
                    };
                    out.push_str(&self.call_template(name, arg)?);
                }
            }
            self.vars.truncate(mark);
        }
        Ok(())
    }

    fn range(
        &mut self,
        pipeline: &Pipeline,
        body: &[Node],
        otherwise: &[Node],
        dot: &Value,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        let items: Vec<(Value, Value)> = match self.commands(&pipeline.commands, dot)? {
            Data::Missing(_) | Data::Present(Value::Null) => Vec::new(),
            Data::Present(Value::Sequence(seq)) => seq
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Value::from(i as u64), v))
                .collect(),
            Data::Present(Value::Mapping(map)) => {
                let mut entries: Vec<(Value, Value)> = map.into_iter().collect();
                entries.sort_by_cached_key(|(k, _)| stringify(k).unwrap_or_default());
                entries
            }
            Data::Present(other) => {
                return Err(TemplateError::BadArguments {
                    function: "range".into(),
                    reason: format!("cannot iterate over {}", values::kind(&other)),
                });
            }
        };

        if items.is_empty() {
            return self.walk(otherwise, dot, out);
        }

        for (key, value) in items {
            let mark = self.vars.len();
            match &pipeline.decl {
                Some(Decl::Declare(names)) if names.len() == 2 => {
                    self.vars.push((names[0].clone(), key));
                    self.vars.push((names[1].clone(), value.clone()));
                }
                Some(Decl::Declare(names)) => {
                    for name in names {
                        self.vars.push((name.clone(), value.clone()));
                    }
                }
                _ => {}
            }
            self.walk(body, &value, out)?;
            self.vars.truncate(mark);
        }
        Ok(())
    }

    fn call_template(&mut self, name: &str, dot: Value) -> Result<String, TemplateError> {
        let definitions = self.definitions;
        let body = definitions
            .named
            .get(name)
            .ok_or_else(|| TemplateError::UndefinedTemplate(name.to_string()))?;
        if self.depth >= MAX_DEPTH {
            return Err(TemplateError::TooDeep(name.to_string()));
        }

        let saved = std::mem::replace(&mut self.vars, vec![(String::new(), dot.clone())]);
        self.depth += 1;
        let mut out = String::new();
        let result = self.walk(body, &dot, &mut out);
        self.depth -= 1;
        self.vars = saved;

        result.map(|()| out)
    }

    fn pipeline(&mut self, pipeline: &Pipeline, dot: &Value) -> Result<Data, TemplateError> {
        let data = self.commands(&pipeline.commands, dot)?;
        match &pipeline.decl {
            None => {}
            Some(Decl::Declare(names)) => {
                for name in names {
                    self.vars.push((name.clone(), value_of(data.clone())));
                }
            }
            Some(Decl::Assign(name)) => {
                let slot = self
                    .vars
                    .iter_mut()
                    .rev()
                    .find(|(var, _)| var == name)
                    .ok_or_else(|| TemplateError::UndefinedVariable(format!("${name}")))?;
                slot.1 = value_of(data.clone());
            }
        }
        Ok(data)
    }

    fn commands(&mut self, commands: &[Command], dot: &Value) -> Result<Data, TemplateError> {
        let mut piped: Option<Data> = None;

        for command in commands {
            let result = match command {
                Command::Operand(operand) => self.operand(operand, dot)?,
                Command::FilesGet { target, args } => {
                    let files = self.operand(target, dot)?;
                    let mut args = self.operands(args, dot)?;
                    args.extend(piped.take());
                    files_get(files, args)?
                }
                Command::Call { name, args } => {
                    let mut args = self.operands(args, dot)?;
                    args.extend(piped.take());
                    self.call(name, args)?
                }
            };
            piped = Some(result);
        }

        piped.ok_or_else(|| syntax("", "empty pipeline"))
    }

    fn operands(&mut self, operands: &[Operand], dot: &Value) -> Result<Vec<Data>, TemplateError> {
        operands.iter().map(|op| self.operand(op, dot)).collect()
    }

    fn operand(&mut self, operand: &Operand, dot: &Value) -> Result<Data, TemplateError> {
        match operand {
            Operand::Dot => Ok(Data::Present(dot.clone())),
            Operand::Field(path) => {
                let display = format!(".{}", path.join("."));
                follow(dot, path, &display)
            }
            Operand::Var { name, path } => {
                let value = self
                    .vars
                    .iter()
                    .rev()
                    .find(|(var, _)| var == name)
                    .map(|(_, value)| value)
                    .ok_or_else(|| TemplateError::UndefinedVariable(format!("${name}")))?;
                let display: String = std::iter::once(format!("${name}"))
                    .chain(path.iter().cloned())
                    .collect::<Vec<_>>()
                    .join(".");
                follow(value, path, &display)
            }
            Operand::Str(s) => Ok(Data::Present(Value::String(s.clone()))),
            Operand::Int(n) => Ok(Data::Present(Value::from(*n))),
            Operand::Bool(b) => Ok(Data::Present(Value::Bool(*b))),
            Operand::Nil => Ok(Data::Present(Value::Null)),
            Operand::Func(name) => self.call(name, Vec::new()),
            Operand::Sub(pipeline) => self.pipeline(pipeline, dot),
        }
    }

    fn call(&mut self, name: &str, args: Vec<Data>) -> Result<Data, TemplateError> {
        if name != "include" {
            return call_function(name, args);
        }

        let [template, arg] = <[Data; 2]>::try_from(args).map_err(|_| {
            TemplateError::BadArguments {
                function: name.to_string(),
                reason: "expected a template name and a context".into(),
            }
        })?;
        let template = stringify(&present(template)?)?;
        let text = self.call_template(&template, value_of(arg))?;
        Ok(Data::Present(Value::String(text)))
    }
}

/// Walk a field chain from `base`.
///
/// A missing key is `Missing`, except on the root object, whose fields are
/// fixed. Fields of scalars do not exist.
fn follow(base: &Value, path: &[String], display: &str) -> Result<Data, TemplateError> {
    let mut current = base;
    for segment in path {
        current = match current {
            Value::Mapping(map) => match map.get(segment.as_str()) {
                Some(next) => next,
                None if is_root(map) => {
                    return Err(TemplateError::UnknownObject(display.to_string()));
                }
                None => return Ok(Data::Missing(display.to_string())),
            },
            Value::Null => return Ok(Data::Missing(display.to_string())),
            _ => return Err(TemplateError::UnknownObject(display.to_string())),
        };
    }

    Ok(match current {
        Value::Null => Data::Missing(display.to_string()),
        value => Data::Present(value.clone()),
    })
}

fn is_root(map: &Mapping) -> bool {
    ["Values", "Release", "Capabilities"]
        .iter()
        .all(|key| map.contains_key(*key))
}

fn files_get(files: Data, args: Vec<Data>) -> Result<Data, TemplateError> {
    let bad = |reason: &str| TemplateError::BadArguments {
        function: ".Files.Get".into(),
        reason: reason.to_string(),
    };

    let [path] = <[Data; 1]>::try_from(args).map_err(|_| bad("expected a single path"))?;
    let Data::Present(Value::String(path)) = path else {
        return Err(bad("the path must be a string"));
    };
    let Data::Present(Value::Mapping(files)) = files else {
        return Err(TemplateError::UnknownObject(".Files".into()));
    };

    files
        .get(path.as_str())
        .cloned()
        .map(Data::Present)
        .ok_or(TemplateError::MissingFile(path))
}

fn call_function(name: &str, args: Vec<Data>) -> Result<Data, TemplateError> {
    let bad = |reason: &str| TemplateError::BadArguments {
        function: name.to_string(),
        reason: reason.to_string(),
    };
    let string = |s: String| Ok(Data::Present(Value::String(s)));

    match name {
        "default" => {
            let [fallback, given] = <[Data; 2]>::try_from(args)
                .map_err(|_| bad("expected a default and a value"))?;
            match given {
                Data::Present(value) if !is_empty(&value) => Ok(Data::Present(value)),
                _ => Ok(fallback),
            }
        }
        "empty" | "not" => {
            let [arg] = <[Data; 1]>::try_from(args).map_err(|_| bad("expected one argument"))?;
            Ok(Data::Present(Value::Bool(!truthy(&arg))))
        }
        "and" => args
            .into_iter()
            .reduce(|acc, next| if truthy(&acc) { next } else { acc })
            .ok_or_else(|| bad("expected at least one argument")),
        "or" => args
            .into_iter()
            .reduce(|acc, next| if truthy(&acc) { acc } else { next })
            .ok_or_else(|| bad("expected at least one argument")),
        "eq" | "ne" => {
            let values: Vec<Value> = args.into_iter().map(value_of).collect();
            let Some((first, rest)) = values.split_first().filter(|(_, rest)| !rest.is_empty())
            else {
                return Err(bad("expected at least two arguments"));
            };
            let equal = rest.iter().any(|v| v == first);
            Ok(Data::Present(Value::Bool(if name == "eq" {
                equal
            } else {
                !equal
            })))
        }
        "quote" | "squote" | "trim" | "upper" | "lower" | "base" => {
            let [arg] = <[Data; 1]>::try_from(args).map_err(|_| bad("expected one argument"))?;
            let s = stringify(&present(arg)?)?;
            string(match name {
                "quote" => format!("{s:?}"),
                "squote" => format!("'{s}'"),
                "trim" => s.trim().to_string(),
                "upper" => s.to_uppercase(),
                "lower" => s.to_lowercase(),
                _ => base(&s),
            })
        }
        "trimSuffix" | "trimPrefix" => {
            let [affix, arg] = <[Data; 2]>::try_from(args)
                .map_err(|_| bad("expected an affix and a value"))?;
            let affix = stringify(&present(affix)?)?;
            let s = stringify(&present(arg)?)?;
            let trimmed = if name == "trimSuffix" {
                s.strip_suffix(affix.as_str())
            } else {
                s.strip_prefix(affix.as_str())
            };
            string(trimmed.unwrap_or(&s).to_string())
        }
        "replace" => {
            let [old, new, arg] = <[Data; 3]>::try_from(args)
                .map_err(|_| bad("expected old, new and a value"))?;
            let old = stringify(&present(old)?)?;
            let new = stringify(&present(new)?)?;
            string(stringify(&present(arg)?)?.replace(&old, &new))
        }
        "trunc" => {
            let [length, arg] = <[Data; 2]>::try_from(args)
                .map_err(|_| bad("expected a length and a value"))?;
            let length = as_int(&length).ok_or_else(|| bad("length must be a number"))?;
            let s = stringify(&present(arg)?)?;
            let count = usize::try_from(length.unsigned_abs()).unwrap_or(usize::MAX);
            let total = s.chars().count();
            string(if length >= 0 {
                s.chars().take(count).collect()
            } else {
                s.chars().skip(total.saturating_sub(count)).collect()
            })
        }
        "indent" | "nindent" => {
            let [width, arg] = <[Data; 2]>::try_from(args)
                .map_err(|_| bad("expected a width and a value"))?;
            let width = as_int(&width).ok_or_else(|| bad("width must be a number"))?;
            let width = usize::try_from(width)
                .ok()
                .filter(|_| width <= MAX_INDENT)
                .ok_or_else(|| bad(&format!("width must be between 0 and {MAX_INDENT}")))?;
            let pad = " ".repeat(width);
            let body = stringify(&present(arg)?)?;
            let indented = format!("{pad}{}", body.replace('\n', &format!("\n{pad}")));
            string(if name == "nindent" {
                format!("\n{indented}")
            } else {
                indented
            })
        }
        "toYaml" => {
            let [arg] = <[Data; 1]>::try_from(args).map_err(|_| bad("expected one argument"))?;
            serde_yaml::to_string(&value_of(arg))
                .map(|s| Data::Present(Value::String(s.trim_end().to_string())))
                .map_err(|e| bad(&e.to_string()))
        }
        "tuple" | "list" => Ok(Data::Present(Value::Sequence(
            args.into_iter().map(value_of).collect(),
        ))),
        "index" => {
            let mut args = args.into_iter();
            let mut current = value_of(args.next().ok_or_else(|| bad("expected a collection"))?);
            for key in args.map(value_of) {
                current = match (current, &key) {
                    (Value::Sequence(mut seq), Value::Number(n)) => {
                        let i = n
                            .as_u64()
                            .and_then(|i| usize::try_from(i).ok())
                            .filter(|&i| i < seq.len())
                            .ok_or_else(|| bad(&format!("index {n} out of range")))?;
                        seq.swap_remove(i)
                    }
                    (Value::Mapping(mut map), _) => map.remove(&key).unwrap_or(Value::Null),
                    (Value::Null, _) => Value::Null,
                    (other, _) => {
                        return Err(bad(&format!("cannot index {}", values::kind(&other))));
                    }
                };
            }
            Ok(match current {
                Value::Null => Data::Missing("index".into()),
                value => Data::Present(value),
            })
        }
        other => Err(TemplateError::UnknownFunction(other.to_string())),
    }
}

/// The chart root object templates start from.
fn root_object(bundle: &Bundle, context: &EvaluationContext, values: Value) -> Value {
    let release = context.release();
    let capabilities = context.capabilities();
    let metadata = &bundle.metadata;

    let mut chart = Mapping::new();
    chart.insert("Name".into(), metadata.name.as_str().into());
    chart.insert("Version".into(), metadata.version.as_str().into());
    if let Some(app_version) = &metadata.app_version {
        chart.insert("AppVersion".into(), app_version.as_str().into());
    }
    if let Some(description) = &metadata.description {
        chart.insert("Description".into(), description.as_str().into());
    }

    let mut release_object = Mapping::new();
    release_object.insert("Name".into(), release.name.as_str().into());
    release_object.insert("Namespace".into(), release.namespace.as_str().into());
    release_object.insert("Service".into(), RELEASE_SERVICE.into());
    release_object.insert("Time".into(), release.time.to_rfc3339().into());
    release_object.insert("Revision".into(), Value::from(1u64));
    release_object.insert("IsInstall".into(), true.into());
    release_object.insert("IsUpgrade".into(), false.into());

    let kube = capabilities.kube_version();
    let mut kube_version = Mapping::new();
    kube_version.insert("Major".into(), kube.major().to_string().into());
    kube_version.insert("Minor".into(), kube.minor().to_string().into());
    kube_version.insert("GitVersion".into(), kube.git_version().into());

    let mut capabilities_object = Mapping::new();
    capabilities_object.insert("KubeVersion".into(), Value::Mapping(kube_version));
    capabilities_object.insert(
        "APIVersions".into(),
        Value::Sequence(capabilities.api_versions().map(Value::from).collect()),
    );
    capabilities_object.insert("TillerVersion".into(), capabilities.tool_version().into());

    let files: Mapping = bundle
        .files
        .iter()
        .map(|f| (Value::from(f.path.as_str()), Value::from(f.content.as_str())))
        .collect();

    let mut template = Mapping::new();
    template.insert("Name".into(), "".into());
    template.insert(
        "BasePath".into(),
        format!("{}/templates", metadata.name).into(),
    );

    let mut root = Mapping::new();
    root.insert("Values".into(), values);
    root.insert("Release".into(), Value::Mapping(release_object));
    root.insert("Chart".into(), Value::Mapping(chart));
    root.insert("Capabilities".into(), Value::Mapping(capabilities_object));
    root.insert("Files".into(), Value::Mapping(files));
    root.insert("Template".into(), Value::Mapping(template));
    Value::Mapping(root)
}

fn present(data: Data) -> Result<Value, TemplateError> {
    match data {
        Data::Present(value) => Ok(value),
        Data::Missing(name) => Err(TemplateError::MissingValue(name)),
    }
}

fn value_of(data: Data) -> Value {
    match data {
        Data::Present(value) => value,
        Data::Missing(_) => Value::Null,
    }
}

fn as_int(data: &Data) -> Option<i64> {
    match data {
        Data::Present(Value::Number(n)) => n.as_i64(),
        Data::Present(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truthy(data: &Data) -> bool {
    match data {
        Data::Present(value) => !is_empty(value),
        Data::Missing(_) => false,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(s) => s.is_empty(),
        Value::Mapping(m) => m.is_empty(),
        Value::Tagged(t) => is_empty(&t.value),
    }
}

/// Last element of a slash-separated path.
fn base(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if path.is_empty() {
        ".".into()
    } else if trimmed.is_empty() {
        "/".into()
    } else {
        trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
    }
}

/// Text form of a value; collections render as YAML.
fn stringify(value: &Value) -> Result<String, TemplateError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Tagged(t) => stringify(&t.value),
        collection => serde_yaml::to_string(collection)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| TemplateError::BadArguments {
                function: "print".into(),
                reason: format!("cannot render {}: {e}", values::kind(collection)),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartcheck_core::domain::{Capabilities, ChartMetadata, PlatformVersion};
    use chrono::{TimeZone, Utc};

    const NAME: &str = "tidb-cluster/templates/tidb-configmap.yaml";

    fn bundle() -> Bundle {
        let mut metadata = ChartMetadata::new("tidb-cluster", "v1.0.0");
        metadata.app_version = Some("2.1.0".into());
        Bundle::new(metadata).with_file(
            "config/_pd-config.tpl",
            "[schedule]\nleader-schedule-limit = 4",
        )
    }

    /// Render `source` with `helpers` registered as a partial.
    fn render_all(
        source: &str,
        helpers: &str,
        values_yaml: &str,
    ) -> Result<String, TemplateError> {
        let bundle = bundle();
        let context = EvaluationContext::builder("demo", "tidb").build();
        let values = values::parse(values_yaml, "values.yaml")?;

        let template = Template::parse(source)?;
        let mut definitions = Definitions::new();
        definitions.register(
            "tidb-cluster/templates/_helpers.tpl",
            &Template::parse(helpers)?,
        );
        definitions.register(NAME, &template);

        let scope = Scope::new(&bundle, &context, values, &definitions);
        template.execute(&scope, NAME)
    }

    fn render_with(source: &str, values_yaml: &str) -> Result<String, TemplateError> {
        render_all(source, "", values_yaml)
    }

    fn render(source: &str) -> Result<String, TemplateError> {
        render_with(
            source,
            "tidb:\n  config: |\n    lease = \"45s\"\n    [log]\n    level = \"info\"\n",
        )
    }

    #[test]
    fn text_without_actions_is_unchanged() {
        assert_eq!(render("kind: ConfigMap\n").unwrap(), "kind: ConfigMap\n");
    }

    #[test]
    fn release_chart_and_capabilities_objects() {
        let out = render(
            "{{ .Release.Name }}/{{ .Release.Namespace }}/{{ .Release.Service }}/\
             {{ .Chart.Name }}/{{ .Chart.Version }}/{{ .Chart.AppVersion }}/\
             {{ .Capabilities.KubeVersion.Major }}.{{ .Capabilities.KubeVersion.Minor }}",
        )
        .unwrap();
        assert_eq!(out, "demo/tidb/Tiller/tidb-cluster/v1.0.0/2.1.0/1.12");
    }

    #[test]
    fn render_time_and_platform_versions() {
        let bundle = bundle();
        let context = EvaluationContext::builder("demo", "tidb")
            .rendered_at(Utc.with_ymd_and_hms(2019, 6, 1, 12, 30, 0).unwrap())
            .capabilities(Capabilities::new(PlatformVersion::new(1, 14)))
            .build();
        let definitions = Definitions::new();
        let scope = Scope::new(&bundle, &context, Value::Mapping(Mapping::new()), &definitions);

        let out = Template::parse(
            "{{ .Release.Time }}|{{ .Capabilities.KubeVersion.GitVersion }}|\
             {{ .Capabilities.TillerVersion }}",
        )
        .unwrap()
        .execute(&scope, NAME)
        .unwrap();

        assert_eq!(
            out,
            format!(
                "2019-06-01T12:30:00+00:00|v1.14.0|v{}",
                chartcheck_core::VERSION
            )
        );
    }

    #[test]
    fn template_name_and_base_path() {
        assert_eq!(
            render("{{ .Template.Name }} in {{ .Template.BasePath }}").unwrap(),
            format!("{NAME} in tidb-cluster/templates")
        );
    }

    #[test]
    fn trim_markers_remove_adjacent_whitespace() {
        let out = render("a:\n  {{- \"x\" -}}  \n  b").unwrap();
        assert_eq!(out, "a:xb");
    }

    #[test]
    fn dash_without_space_is_a_negative_number() {
        assert_eq!(render("n: {{-3}}").unwrap(), "n: -3");
    }

    #[test]
    fn comments_produce_nothing() {
        assert_eq!(render("a{{/* note }} here */}}b").unwrap(), "ab");
        assert_eq!(render("a\n{{- /* note */ -}}\nb").unwrap(), "ab");
    }

    #[test]
    fn values_pipe_through_indent() {
        let out = render("  config-file: |-\n{{ .Values.tidb.config | indent 4 }}").unwrap();
        assert_eq!(
            out,
            "  config-file: |-\n    lease = \"45s\"\n    [log]\n    level = \"info\"\n    "
        );
    }

    #[test]
    fn files_get_with_nindent() {
        let out = render("data:{{ .Files.Get \"config/_pd-config.tpl\" | nindent 2 }}").unwrap();
        assert_eq!(out, "data:\n  [schedule]\n  leader-schedule-limit = 4");
    }

    #[test]
    fn oversized_indent_is_rejected() {
        for source in [
            "{{ .Values.tidb.config | indent 9223372036854775807 }}",
            "{{ .Values.tidb.config | nindent 4096 }}",
            "{{ .Values.tidb.config | indent -2 }}",
        ] {
            assert!(
                matches!(render(source), Err(TemplateError::BadArguments { .. })),
                "{source}"
            );
        }
    }

    #[test]
    fn default_covers_missing_and_empty_values() {
        assert_eq!(render("{{ .Values.pd.config | default \"x\" }}").unwrap(), "x");
        assert_eq!(
            render_with("{{ .Values.name | default \"x\" }}", "name: \"\"").unwrap(),
            "x"
        );
        assert_eq!(
            render_with("{{ default \"x\" .Values.name }}", "name: pd").unwrap(),
            "pd"
        );
    }

    #[test]
    fn string_functions() {
        assert_eq!(
            render_with("{{ .Values.v | trim | upper | quote }}", "v: \"  tidb \"").unwrap(),
            "\"TIDB\""
        );
        assert_eq!(render("{{ lower \"PD\" }}").unwrap(), "pd");
        assert_eq!(
            render("{{ \"v1.0.0+build\" | replace \"+\" \"_\" }}").unwrap(),
            "v1.0.0_build"
        );
        assert_eq!(
            render("{{ \"tidb-cluster-\" | trunc 63 | trimSuffix \"-\" }}").unwrap(),
            "tidb-cluster"
        );
        assert_eq!(render("{{ trunc -3 \"pd-0\" }}").unwrap(), "d-0");
        assert_eq!(render("{{ base \"config/_tidb-config.tpl\" }}").unwrap(), "_tidb-config.tpl");
    }

    #[test]
    fn collections_render_as_yaml() {
        let out = render_with("{{ .Values.labels }}", "labels:\n  app: tidb\n").unwrap();
        assert_eq!(out, "app: tidb");
        let out = render_with("{{ toYaml .Values.labels }}", "labels:\n  app: tidb\n").unwrap();
        assert_eq!(out, "app: tidb");
    }

    #[test]
    fn if_else_chains_pick_the_first_true_branch() {
        let source = "{{ if .Values.tidb.config }}custom{{ else }}default{{ end }}";
        assert_eq!(render(source).unwrap(), "custom");
        assert_eq!(render_with(source, "tidb: {}").unwrap(), "default");

        let chain = "{{ if eq .Values.mode \"a\" }}A{{ else if eq .Values.mode \"b\" }}B\
                     {{ else }}C{{ end }}";
        assert_eq!(render_with(chain, "mode: a").unwrap(), "A");
        assert_eq!(render_with(chain, "mode: b").unwrap(), "B");
        assert_eq!(render_with(chain, "mode: z").unwrap(), "C");
    }

    #[test]
    fn configmap_with_helpers_and_conditional_config() {
        let helpers = r#"{{- define "cluster.name" -}}
{{- default .Release.Name .Values.clusterName }}
{{- end -}}
{{- define "helm-toolkit.utils.template" -}}
{{- $name := index . 0 -}}
{{- $context := index . 1 -}}
{{- $last := base $context.Template.Name }}
{{- $wtf := $context.Template.Name | replace $last $name -}}
{{ include $wtf $context }}
{{- end }}"#;
        let source = r#"metadata:
  name: {{ template "cluster.name" . }}-tidb
data:
  config-file: |-
    {{- if .Values.tidb.config }}
{{ .Values.tidb.config | indent 4 }}
    {{- else }}
{{ tuple "_tidb-config.tpl" . | include "helm-toolkit.utils.template" | indent 4 }}
    {{- end -}}
"#;
        let config = "lease = \"{{ .Values.tidb.lease }}\"";

        let bundle = bundle();
        let context = EvaluationContext::builder("demo", "tidb").build();
        let mut definitions = Definitions::new();
        definitions.register(
            "tidb-cluster/templates/_helpers.tpl",
            &Template::parse(helpers).unwrap(),
        );
        definitions.register(
            "tidb-cluster/templates/_tidb-config.tpl",
            &Template::parse(config).unwrap(),
        );
        let template = Template::parse(source).unwrap();
        definitions.register(NAME, &template);

        let render = |values_yaml: &str| {
            let values = values::parse(values_yaml, "values.yaml").unwrap();
            let scope = Scope::new(&bundle, &context, values, &definitions);
            template.execute(&scope, NAME).unwrap()
        };

        assert_eq!(
            render("clusterName: prod\ntidb:\n  config: |\n    lease = \"10s\"\n"),
            "metadata:\n  name: prod-tidb\ndata:\n  config-file: |-\n    lease = \"10s\"\n    "
        );
        assert_eq!(
            render("tidb:\n  lease: 45s\n"),
            "metadata:\n  name: demo-tidb\ndata:\n  config-file: |-\n    lease = \"45s\""
        );
    }

    #[test]
    fn with_rebinds_dot() {
        let source = "{{ with .Values.pd }}{{ .replicas }}{{ else }}none{{ end }}";
        assert_eq!(render_with(source, "pd:\n  replicas: 3\n").unwrap(), "3");
        assert_eq!(render_with(source, "").unwrap(), "none");
    }

    #[test]
    fn range_over_lists_and_maps() {
        assert_eq!(
            render_with(
                "{{ range $i, $e := .Values.hosts }}{{ $i }}={{ $e }};{{ end }}",
                "hosts: [pd-0, pd-1]\n"
            )
            .unwrap(),
            "0=pd-0;1=pd-1;"
        );
        assert_eq!(
            render_with(
                "{{ range $k, $v := .Values.labels }}{{ $k }}:{{ $v }},{{ end }}",
                "labels:\n  zone: b\n  app: tidb\n"
            )
            .unwrap(),
            "app:tidb,zone:b,"
        );
        assert_eq!(
            render_with("{{ range .Values.hosts }}{{ . }}{{ else }}empty{{ end }}", "").unwrap(),
            "empty"
        );
        assert!(matches!(
            render_with("{{ range .Values.n }}{{ end }}", "n: 3"),
            Err(TemplateError::BadArguments { .. })
        ));
    }

    #[test]
    fn variables_are_scoped_to_their_block() {
        assert_eq!(
            render("{{ $x := \"a\" }}{{ if true }}{{ $x = \"b\" }}{{ $y := 1 }}{{ end }}{{ $x }}")
                .unwrap(),
            "b"
        );
        assert_eq!(
            render("{{ if true }}{{ $y := 1 }}{{ end }}{{ $y }}").unwrap_err(),
            TemplateError::UndefinedVariable("$y".into())
        );
        assert_eq!(render("{{ $.Release.Name }}").unwrap(), "demo");
    }

    #[test]
    fn logic_functions() {
        assert_eq!(render("{{ and 1 \"x\" }}|{{ and 0 \"x\" }}").unwrap(), "x|0");
        assert_eq!(render("{{ or .Values.nope \"fallback\" }}").unwrap(), "fallback");
        assert_eq!(render("{{ not .Values.nope }}|{{ ne 1 2 }}").unwrap(), "true|true");
        assert_eq!(render("{{ if (empty .Values.nope) }}e{{ end }}").unwrap(), "e");
    }

    #[test]
    fn include_returns_text_for_pipes() {
        let helpers =
            "{{ define \"labels\" }}app: {{ .Chart.Name }}\nrelease: {{ .Release.Name }}{{ end }}";
        assert_eq!(
            render_all("labels:{{ include \"labels\" . | nindent 2 }}", helpers, "").unwrap(),
            "labels:\n  app: tidb-cluster\n  release: demo"
        );
    }

    #[test]
    fn template_errors() {
        assert_eq!(
            render("{{ template \"nope\" . }}").unwrap_err(),
            TemplateError::UndefinedTemplate("nope".into())
        );
        let recursive = "{{ define \"loop\" }}{{ template \"loop\" . }}{{ end }}";
        assert_eq!(
            render_all("{{ template \"loop\" . }}", recursive, "").unwrap_err(),
            TemplateError::TooDeep("loop".into())
        );
        assert_eq!(
            render("{{ if true }}open").unwrap_err(),
            TemplateError::Unclosed("if".into())
        );
        assert_eq!(
            render("stray{{ end }}").unwrap_err(),
            TemplateError::UnexpectedAction("end".into())
        );
        assert_eq!(
            render("{{ range .Values.a }}{{ else if true }}{{ end }}").unwrap_err(),
            TemplateError::UnexpectedAction("else if".into())
        );
    }

    #[test]
    fn missing_value_without_default_fails() {
        assert_eq!(
            render("{{ .Values.pd.config }}").unwrap_err(),
            TemplateError::MissingValue(".Values.pd.config".into())
        );
        assert!(matches!(
            render("{{ .Values.pd.config | quote }}"),
            Err(TemplateError::MissingValue(_))
        ));
    }

    #[test]
    fn unknown_object_and_function_fail() {
        assert_eq!(
            render("{{ .Releases.Name }}").unwrap_err(),
            TemplateError::UnknownObject(".Releases.Name".into())
        );
        assert_eq!(
            render("{{ .Release.Name.First }}").unwrap_err(),
            TemplateError::UnknownObject(".Release.Name.First".into())
        );
        assert_eq!(
            render("{{ .Values.tidb.config | toToml }}").unwrap_err(),
            TemplateError::UnknownFunction("toToml".into())
        );
    }

    #[test]
    fn unterminated_action_reports_offset() {
        assert_eq!(
            render("abc {{ .Values.tidb").unwrap_err(),
            TemplateError::Unterminated { offset: 4 }
        );
    }

    #[test]
    fn missing_file_fails() {
        assert_eq!(
            render("{{ .Files.Get \"nope.tpl\" }}").unwrap_err(),
            TemplateError::MissingFile("nope.tpl".into())
        );
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(render("{{ }}"), Err(TemplateError::Syntax { .. })));
        assert!(matches!(
            render("{{ .Values.a | }}"),
            Err(TemplateError::Syntax { .. })
        ));
        assert!(matches!(
            render("{{ \"open }}"),
            Err(TemplateError::Unterminated { .. }) | Err(TemplateError::Syntax { .. })
        ));
        assert!(matches!(
            render("{{ .Values.a \"arg\" }}"),
            Err(TemplateError::Syntax { .. })
        ));
        assert!(matches!(
            render("{{ indent 2 }}"),
            Err(TemplateError::BadArguments { .. })
        ));
    }
}
