//! Expressions inside `{{ … }}` and tag arguments.
//!
//! The grammar is small: literals, names with member/index access, calls to
//! host functions, unary `!`/`-`, arithmetic, comparisons, `&&`/`||` and the
//! ternary operator. Expressions are parsed once, when the template is
//! parsed, so broken expressions are syntax errors with exact offsets.

use super::context::{Scope, Value};
use super::error::{EvalError, TemplateSyntaxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Identifier(String),
    List(Vec<Expr>),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(&'static str),
    End,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Number(n) => format!("number '{}'", Value::Number(*n)),
            Tok::Str(_) => "string literal".to_string(),
            Tok::Ident(name) => format!("'{name}'"),
            Tok::Punct(p) => format!("'{p}'"),
            Tok::End => "end of expression".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Lexed {
    tok: Tok,
    offset: usize,
}

/// Longest operators first so `===` wins over `==`.
const PUNCTUATION: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "<", ">", "+", "-", "*", "/", "%", "!",
    "?", ":", ".", ",", "(", ")", "[", "]",
];

fn lex(text: &str, base: usize) -> Result<Vec<Lexed>, TemplateSyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        let offset = base + i;
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() {
            let mut end = i;
            let mut seen_dot = false;
            while let Some(&(j, d)) = chars.peek() {
                let fraction_follows = d == '.'
                    && !seen_dot
                    && text[j + 1..].starts_with(|n: char| n.is_ascii_digit());
                if d.is_ascii_digit() || fraction_follows {
                    seen_dot |= d == '.';
                    end = j + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let number = text[i..end].parse::<f64>().map_err(|_| {
                TemplateSyntaxError::new(format!("invalid number '{}'", &text[i..end]), offset)
            })?;
            tokens.push(Lexed {
                tok: Tok::Number(number),
                offset,
            });
        } else if c == '\'' || c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, d)) = chars.next() {
                match d {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, escaped)) => value.push(escaped),
                        None => break,
                    },
                    d if d == c => {
                        closed = true;
                        break;
                    }
                    d => value.push(d),
                }
            }
            if !closed {
                return Err(TemplateSyntaxError::new("unterminated string literal", offset));
            }
            tokens.push(Lexed {
                tok: Tok::Str(value),
                offset,
            });
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let mut end = i;
            while let Some(&(j, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' || d == '$' {
                    end = j + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Lexed {
                tok: Tok::Ident(text[i..end].to_string()),
                offset,
            });
        } else {
            let rest = &text[i..];
            let punct = PUNCTUATION
                .iter()
                .find(|p| rest.starts_with(**p))
                .ok_or_else(|| {
                    TemplateSyntaxError::new(format!("unexpected character '{c}'"), offset)
                })?;
            for _ in 0..punct.len() {
                chars.next();
            }
            tokens.push(Lexed {
                tok: Tok::Punct(*punct),
                offset,
            });
        }
    }

    tokens.push(Lexed {
        tok: Tok::End,
        offset: base + text.len(),
    });
    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Lexed>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> &Lexed {
        // `lex` always terminates the list with `Tok::End`.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Lexed {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(&self.peek().tok, Tok::Punct(p) if *p == punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), TemplateSyntaxError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{punct}'")))
        }
    }

    fn unexpected(&self, wanted: &str) -> TemplateSyntaxError {
        let token = self.peek();
        TemplateSyntaxError::new(
            format!("expected {wanted}, found {}", token.tok.describe()),
            token.offset,
        )
    }

    fn finish(&self) -> Result<(), TemplateSyntaxError> {
        match self.peek().tok {
            Tok::End => Ok(()),
            _ => Err(self.unexpected("end of expression")),
        }
    }

    fn ternary(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let condition = self.logical_or()?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let then = self.ternary()?;
        self.expect(":")?;
        let otherwise = self.ternary()?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn logical_or(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let mut left = self.logical_and()?;
        while self.eat("||") {
            let right = self.logical_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let mut left = self.binary(0)?;
        while self.eat("&&") {
            let right = self.binary(0)?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Binary operators by precedence level, loosest first.
    fn binary(&mut self, level: usize) -> Result<Expr, TemplateSyntaxError> {
        const LEVELS: &[&[(&str, BinaryOp)]] = &[
            &[
                ("===", BinaryOp::Eq),
                ("!==", BinaryOp::Ne),
                ("==", BinaryOp::Eq),
                ("!=", BinaryOp::Ne),
            ],
            &[
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            &[
                ("*", BinaryOp::Mul),
                ("/", BinaryOp::Div),
                ("%", BinaryOp::Rem),
            ],
        ];

        if level == LEVELS.len() {
            return self.unary();
        }

        let mut left = self.binary(level + 1)?;
        'operators: loop {
            for (symbol, op) in LEVELS[level] {
                if self.eat(symbol) {
                    let right = self.binary(level + 1)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'operators;
                }
            }
            return Ok(left);
        }
    }

    fn unary(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let op = if self.eat("!") {
            UnaryOp::Not
        } else if self.eat("-") {
            UnaryOp::Neg
        } else {
            return self.postfix();
        };
        Ok(Expr::Unary {
            op,
            operand: Box::new(self.unary()?),
        })
    }

    fn postfix(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                let token = self.advance();
                let Tok::Ident(property) = token.tok else {
                    return Err(TemplateSyntaxError::new(
                        format!("expected property name, found {}", token.tok.describe()),
                        token.offset,
                    ));
                };
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat("[") {
                let index = self.ternary()?;
                self.expect("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat("(") {
                let args = self.sequence(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn sequence(&mut self, close: &str) -> Result<Vec<Expr>, TemplateSyntaxError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.ternary()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let token = self.peek().clone();
        let expr = match token.tok {
            Tok::Number(n) => Expr::Literal(Value::Number(n)),
            Tok::Str(s) => Expr::Literal(Value::String(s)),
            Tok::Ident(name) => match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                "undefined" => Expr::Literal(Value::Undefined),
                _ => Expr::Identifier(name),
            },
            Tok::Punct("(") => {
                self.advance();
                let inner = self.ternary()?;
                self.expect(")")?;
                return Ok(inner);
            }
            Tok::Punct("[") => {
                self.advance();
                return Ok(Expr::List(self.sequence("]")?));
            }
            Tok::Punct(_) | Tok::End => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(expr)
    }
}

/// Parse `text`, reporting errors at `base + local offset`.
pub fn parse_expression(text: &str, base: usize) -> Result<Expr, TemplateSyntaxError> {
    let mut parser = ExprParser {
        tokens: lex(text, base)?,
        pos: 0,
    };
    let expr = parser.ternary()?;
    parser.finish()?;
    Ok(expr)
}

/// Parse a loop header of the form `item in iterable`.
pub fn parse_for_binding(text: &str, base: usize) -> Result<(String, Expr), TemplateSyntaxError> {
    let mut parser = ExprParser {
        tokens: lex(text, base)?,
        pos: 0,
    };

    let first = parser.advance();
    let binding = match first.tok {
        Tok::Ident(name) if !is_reserved(&name) => name,
        other => {
            return Err(TemplateSyntaxError::new(
                format!("expected loop variable name, found {}", other.describe()),
                first.offset,
            ));
        }
    };

    let keyword = parser.advance();
    if keyword.tok != Tok::Ident("in".to_string()) {
        return Err(TemplateSyntaxError::new(
            format!("expected 'in' after '{binding}', found {}", keyword.tok.describe()),
            keyword.offset,
        ));
    }

    let iterable = parser.ternary()?;
    parser.finish()?;
    Ok((binding, iterable))
}

fn is_reserved(name: &str) -> bool {
    matches!(name, "true" | "false" | "null" | "undefined" | "in")
}

/// Evaluate `expr` against `scope`. Unknown names evaluate to undefined.
pub(crate) fn evaluate(expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Identifier(name) => Ok(scope.lookup(name).cloned().unwrap_or_default()),
        Expr::List(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| evaluate(item, scope))
                .collect::<Result<_, _>>()?,
        )),
        Expr::Member { object, property } => Ok(evaluate(object, scope)?.member(property)),
        Expr::Index { object, index } => {
            let object = evaluate(object, scope)?;
            Ok(object.index(&evaluate(index, scope)?))
        }
        Expr::Call { callee, args } => {
            let function = match evaluate(callee, scope)? {
                Value::Function(function) => function,
                other => {
                    return Err(EvalError::NotCallable {
                        kind: other.kind_name(),
                    });
                }
            };
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(function.call(&args))
        }
        Expr::Unary { op, operand } => {
            let operand = evaluate(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                UnaryOp::Neg => match operand {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(EvalError::InvalidOperand {
                        op: "-",
                        operand: other.kind_name(),
                    }),
                },
            }
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            apply_binary(*op, &left, &right)
        }
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, scope)?;
            match (op, left.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => evaluate(right, scope),
            }
        }
        Expr::Ternary {
            condition,
            then,
            otherwise,
        } => {
            if evaluate(condition, scope)?.is_truthy() {
                evaluate(then, scope)
            } else {
                evaluate(otherwise, scope)
            }
        }
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let invalid = || EvalError::InvalidOperands {
        op: op.symbol(),
        left: left.kind_name(),
        right: right.kind_name(),
    };

    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{left}{right}")))
            }
            _ => Err(invalid()),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(invalid());
            };
            Ok(Value::Number(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (left, right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => return Err(invalid()),
            };
            Ok(Value::Bool(ordering.is_some_and(|ordering| match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })))
        }
    }
}
