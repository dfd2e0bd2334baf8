//! Builds the node tree from the token stream.
//!
//! Recursive descent with one token of lookahead. Each block parser collects
//! children until it meets a boundary token (`else`, `else if`, `case` or a
//! closing tag) and then decides whether that boundary belongs to it.

use std::iter::Peekable;
use std::vec::IntoIter;

use super::error::TemplateSyntaxError;
use super::expression::{Expr, parse_expression, parse_for_binding};
use super::tokenizer::{BlockKind, ExprSource, Span, TagType, Token, tokenize};

/// One `if` / `else if` / `else` arm. `condition` is `None` for `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Option<Expr>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub value: Expr,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text {
        value: String,
    },
    Output {
        expression: Expr,
    },
    Conditional {
        branches: Vec<Branch>,
    },
    ForLoop {
        iterable: Expr,
        binding: String,
        children: Vec<Node>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<Case>,
        default: Option<Vec<Node>>,
    },
}

/// A parsed template: the root sibling list.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub nodes: Vec<Node>,
}

/// Tokenize and parse `source` into a tree.
pub fn parse(source: &str) -> Result<Template, TemplateSyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
    };

    let (nodes, boundary) = parser.block()?;
    if let Some(token) = boundary {
        return Err(stray(&token));
    }
    Ok(Template { nodes })
}

struct Parser<'a> {
    tokens: Peekable<IntoIter<Token<'a>>>,
}

impl<'a> Parser<'a> {
    /// Parse siblings until end of input or a boundary token, which is
    /// consumed and returned to the caller.
    fn block(&mut self) -> Result<(Vec<Node>, Option<Token<'a>>), TemplateSyntaxError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.tokens.next() {
            match token {
                Token::Text { value, .. } => nodes.push(Node::Text {
                    value: value.to_string(),
                }),
                Token::Output { expression, .. } => nodes.push(Node::Output {
                    expression: expr(expression)?,
                }),
                Token::TagStart {
                    tag,
                    expression,
                    span,
                } => match tag {
                    TagType::If => nodes.push(self.conditional(expression, span)?),
                    TagType::For => nodes.push(self.for_loop(expression, span)?),
                    TagType::Switch => nodes.push(self.switch(expression, span)?),
                    TagType::ElseIf | TagType::Else | TagType::Case => {
                        return Ok((nodes, Some(token)));
                    }
                },
                Token::TagEnd { .. } => return Ok((nodes, Some(token))),
            }
        }
        Ok((nodes, None))
    }

    fn conditional(
        &mut self,
        condition: Option<ExprSource<'a>>,
        open: Span,
    ) -> Result<Node, TemplateSyntaxError> {
        let mut branches = Vec::new();
        let mut condition = Some(expr(required(condition, open)?)?);
        let mut seen_else = false;

        loop {
            let (children, boundary) = self.block()?;
            branches.push(Branch {
                condition: condition.take(),
                children,
            });

            let Some(token) = boundary else {
                return Err(unclosed(BlockKind::If, open));
            };
            match token {
                Token::TagEnd {
                    block: BlockKind::If,
                    ..
                } => return Ok(Node::Conditional { branches }),
                Token::TagStart {
                    tag: TagType::ElseIf,
                    expression,
                    span,
                } => {
                    if seen_else {
                        return Err(TemplateSyntaxError::new(
                            "'else if' cannot follow 'else'",
                            span.start,
                        ));
                    }
                    condition = Some(expr(required(expression, span)?)?);
                }
                Token::TagStart {
                    tag: TagType::Else,
                    span,
                    ..
                } => {
                    if seen_else {
                        return Err(TemplateSyntaxError::new(
                            "'if' block has more than one 'else'",
                            span.start,
                        ));
                    }
                    seen_else = true;
                }
                other => return Err(stray(&other)),
            }
        }
    }

    fn for_loop(
        &mut self,
        header: Option<ExprSource<'a>>,
        open: Span,
    ) -> Result<Node, TemplateSyntaxError> {
        let header = required(header, open)?;
        let (binding, iterable) = parse_for_binding(header.text, header.offset)?;

        let (children, boundary) = self.block()?;
        match boundary {
            Some(Token::TagEnd {
                block: BlockKind::For,
                ..
            }) => Ok(Node::ForLoop {
                iterable,
                binding,
                children,
            }),
            Some(other) => Err(stray(&other)),
            None => Err(unclosed(BlockKind::For, open)),
        }
    }

    fn switch(
        &mut self,
        discriminant: Option<ExprSource<'a>>,
        open: Span,
    ) -> Result<Node, TemplateSyntaxError> {
        let discriminant = expr(required(discriminant, open)?)?;
        let mut cases = Vec::new();
        let mut default = None;

        // Only whitespace may sit between `switch` and its first case.
        let (leading, mut boundary) = self.block()?;
        if let Some(node) = leading.iter().find(|node| !is_blank(node)) {
            let message = match node {
                Node::Text { .. } | Node::Output { .. } => "content before the first 'case'",
                _ => "block before the first 'case'",
            };
            return Err(TemplateSyntaxError::new(message, open.end));
        }

        loop {
            let Some(token) = boundary else {
                return Err(unclosed(BlockKind::Switch, open));
            };
            match token {
                Token::TagEnd {
                    block: BlockKind::Switch,
                    ..
                } => {
                    return Ok(Node::Switch {
                        discriminant,
                        cases,
                        default,
                    });
                }
                Token::TagStart {
                    tag: TagType::Case,
                    expression,
                    span,
                } => {
                    let (children, next) = self.block()?;
                    match expression {
                        Some(value) => cases.push(Case {
                            value: expr(value)?,
                            children,
                        }),
                        None if default.is_some() => {
                            return Err(TemplateSyntaxError::new(
                                "'switch' block has more than one default 'case'",
                                span.start,
                            ));
                        }
                        None => default = Some(children),
                    }
                    boundary = next;
                }
                other => return Err(stray(&other)),
            }
        }
    }
}

fn expr(source: ExprSource<'_>) -> Result<Expr, TemplateSyntaxError> {
    parse_expression(source.text, source.offset)
}

/// The tokenizer guarantees expressions on `if`/`else if`/`for`/`switch`.
fn required<'a>(
    expression: Option<ExprSource<'a>>,
    span: Span,
) -> Result<ExprSource<'a>, TemplateSyntaxError> {
    expression.ok_or_else(|| TemplateSyntaxError::new("tag requires an expression", span.start))
}

fn is_blank(node: &Node) -> bool {
    matches!(node, Node::Text { value } if value.trim().is_empty())
}

fn unclosed(block: BlockKind, open: Span) -> TemplateSyntaxError {
    TemplateSyntaxError::new(
        format!(
            "'{}' block is never closed; expected 'end {}'",
            block.keyword(),
            block.keyword()
        ),
        open.start,
    )
}

/// A boundary token that no open block accepts.
fn stray(token: &Token<'_>) -> TemplateSyntaxError {
    let message = match token {
        Token::TagEnd { block, .. } => {
            format!("'end {}' without a matching '{}'", block.keyword(), block.keyword())
        }
        Token::TagStart {
            tag: TagType::Else | TagType::ElseIf,
            ..
        } => "'else' outside of an 'if' block".to_string(),
        Token::TagStart {
            tag: TagType::Case, ..
        } => "'case' outside of a 'switch' block".to_string(),
        _ => "unexpected tag".to_string(),
    };
    TemplateSyntaxError::new(message, token.span().start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditional_branches() {
        let template = parse("{% if a %}A{% else if b %}B{% else %}C{% end if %}").unwrap();
        let [Node::Conditional { branches }] = template.nodes.as_slice() else {
            panic!("expected a single conditional, got {:?}", template.nodes);
        };
        assert_eq!(branches.len(), 3);
        assert!(branches[0].condition.is_some());
        assert!(branches[1].condition.is_some());
        assert!(branches[2].condition.is_none());
        assert_eq!(
            branches[2].children,
            vec![Node::Text {
                value: "C".to_string()
            }]
        );
    }

    #[test]
    fn test_nested_blocks() {
        let template = parse(
            "{% for w in widgets %}{% if w.visible %}{{ w.name }}{% end if %}{% end for %}",
        )
        .unwrap();
        let [Node::ForLoop { binding, children, .. }] = template.nodes.as_slice() else {
            panic!("expected a loop");
        };
        assert_eq!(binding, "w");
        assert!(matches!(children.as_slice(), [Node::Conditional { .. }]));
    }

    #[test]
    fn test_switch_with_default_and_blank_lead() {
        let template =
            parse("{% switch s %}\n  {% case 'a' %}A{% case %}D{% case 'b' %}B{% end switch %}")
                .unwrap();
        let [Node::Switch { cases, default, .. }] = template.nodes.as_slice() else {
            panic!("expected a switch");
        };
        assert_eq!(cases.len(), 2);
        assert!(default.is_some());
    }

    #[test]
    fn test_structural_errors() {
        let err = parse("{% if true %}A").unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("never closed"));

        let err = parse("ab{% end for %}").unwrap_err();
        assert_eq!(err.offset, 2);

        let err = parse("{% if a %}{% end for %}").unwrap_err();
        assert_eq!(err.offset, 10);

        let err = parse("{% if a %}{% else %}{% else if b %}{% end if %}").unwrap_err();
        assert_eq!(err.offset, 20);

        let err = parse("{% for x in xs %}{% else %}{% end for %}").unwrap_err();
        assert!(err.message.contains("outside"));

        let err = parse("{% switch x %}oops{% case 1 %}{% end switch %}").unwrap_err();
        assert!(err.message.contains("before the first"));

        let err = parse("{% switch x %}{% case %}{% case %}{% end switch %}").unwrap_err();
        assert!(err.message.contains("more than one default"));

        assert!(parse("{% case 1 %}").is_err());
        assert!(parse("{% for x of xs %}{% end for %}").is_err());
    }

    #[test]
    fn test_expression_errors_use_template_offsets() {
        let err = parse("value: {{ 1 + }}").unwrap_err();
        assert_eq!(err.offset, 13);

        let err = parse("{% if 1 + %}x{% end if %}").unwrap_err();
        assert_eq!(err.offset, 9);
        assert!(err.message.contains("expected expression"));

        let err = parse("{% if a %}x{% else if ) %}y{% end if %}").unwrap_err();
        assert_eq!(err.offset, 22);
    }
}
