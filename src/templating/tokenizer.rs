//! Splits template text into a flat token sequence.
//!
//! Output expressions are delimited by `{{ … }}`, tags by `{% … %}`. Anything
//! else is literal text. Quoted string literals are skipped whole while
//! looking for the closing delimiter, so `{{ '}}' }}` is a single output.
//! Expressions are not parsed here; tokens only carry the expression source
//! and its absolute offset.

use std::sync::LazyLock;

use regex::Regex;
use strsim::levenshtein;

use super::error::TemplateSyntaxError;
use super::scanner::Scanner;

static OPEN_DELIMITER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{|\{%").unwrap());
static CLOSE_OUTPUT: LazyLock<Regex> = LazyLock::new(|| delimited_body("}}"));
static CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| delimited_body("%}"));

/// Delimiter content up to and including the two-character `close`.
///
/// Neither half of `close` may start a string literal, so the alternation
/// can never step over an unquoted delimiter.
fn delimited_body(close: &str) -> Regex {
    let first = regex::escape(&close[..1]);
    let second = regex::escape(&close[1..]);
    let single = r#"'(?:[^'\\]|\\.)*'"#;
    let double = r#""(?:[^"\\]|\\.)*""#;
    let pattern = format!(
        r#"(?s)(?:[^'"{first}]|{first}[^{second}'"]|{first}?{single}|{first}?{double})*{first}{second}"#
    );
    Regex::new(&pattern).unwrap()
}

/// Tag keywords accepted at the start of a `{% … %}` block, used for
/// "did you mean" suggestions.
const TAG_KEYWORDS: &[&str] = &[
    "if",
    "else",
    "for",
    "switch",
    "case",
    "end",
    "endif",
    "endfor",
    "endswitch",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Expression source text together with its absolute offset in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprSource<'a> {
    pub text: &'a str,
    pub offset: usize,
}

impl<'a> ExprSource<'a> {
    fn trimmed(text: &'a str, offset: usize) -> Self {
        let start_trimmed = text.trim_start();
        Self {
            text: start_trimmed.trim_end(),
            offset: offset + (text.len() - start_trimmed.len()),
        }
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split off the leading keyword. The rest is re-trimmed with its offset.
    fn split_keyword(self) -> (&'a str, ExprSource<'a>) {
        let end = self
            .text
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(self.text.len());
        let rest = ExprSource::trimmed(&self.text[end..], self.offset + end);
        (&self.text[..end], rest)
    }
}

/// Opening tag types. Closed set; the parser matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    If,
    ElseIf,
    Else,
    For,
    Switch,
    Case,
}

/// Blocks that a closing tag can end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    For,
    Switch,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::For => "for",
            BlockKind::Switch => "switch",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "if" => Some(BlockKind::If),
            "for" => Some(BlockKind::For),
            "switch" => Some(BlockKind::Switch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text {
        value: &'a str,
        span: Span,
    },
    TagStart {
        tag: TagType,
        expression: Option<ExprSource<'a>>,
        span: Span,
    },
    TagEnd {
        block: BlockKind,
        span: Span,
    },
    Output {
        expression: ExprSource<'a>,
        span: Span,
    },
}

impl Token<'_> {
    pub fn span(&self) -> Span {
        match self {
            Token::Text { span, .. }
            | Token::TagStart { span, .. }
            | Token::TagEnd { span, .. }
            | Token::Output { span, .. } => *span,
        }
    }
}

/// Tokenize `source` in a single left-to-right pass.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, TemplateSyntaxError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();

    while !scanner.is_done() {
        let step = scanner.scan_until(&OPEN_DELIMITER)?;
        if !step.skipped.is_empty() {
            tokens.push(Token::Text {
                value: step.skipped,
                span: Span {
                    start: step.skipped_start,
                    end: step.skipped_start + step.skipped.len(),
                },
            });
        }

        let Some(open) = step.matched else {
            break;
        };

        let is_output = open.text == "{{";
        let (close_pattern, close_text) = if is_output {
            (&*CLOSE_OUTPUT, "}}")
        } else {
            (&*CLOSE_TAG, "%}")
        };

        let Some(body) = scanner.scan(close_pattern)? else {
            scanner.terminate();
            return Err(TemplateSyntaxError::new(
                format!("unterminated '{}': expected a closing '{}'", open.text, close_text),
                open.start,
            ));
        };

        let span = Span {
            start: open.start,
            end: body.end,
        };
        let inner = &body.text[..body.text.len() - close_text.len()];
        let content = ExprSource::trimmed(inner, body.start);

        if is_output {
            if content.is_empty() {
                return Err(TemplateSyntaxError::new("empty output expression", open.start));
            }
            tokens.push(Token::Output {
                expression: content,
                span,
            });
        } else {
            tokens.push(classify_tag(content, span)?);
        }
    }

    tracing::trace!("Tokenized template into {} token(s)", tokens.len());
    Ok(tokens)
}

fn classify_tag(content: ExprSource<'_>, span: Span) -> Result<Token<'_>, TemplateSyntaxError> {
    if content.is_empty() {
        return Err(TemplateSyntaxError::new("empty tag", span.start));
    }

    let (keyword, rest) = content.split_keyword();
    let start = |tag, expression| Token::TagStart {
        tag,
        expression,
        span,
    };

    match keyword {
        "if" => Ok(start(TagType::If, Some(required(rest, "if", span)?))),
        "for" => Ok(start(TagType::For, Some(required(rest, "for", span)?))),
        "switch" => Ok(start(TagType::Switch, Some(required(rest, "switch", span)?))),
        "case" => Ok(start(TagType::Case, (!rest.is_empty()).then_some(rest))),
        "else" => {
            if rest.is_empty() {
                return Ok(start(TagType::Else, None));
            }
            let (next, condition) = rest.split_keyword();
            if next == "if" {
                Ok(start(TagType::ElseIf, Some(required(condition, "else if", span)?)))
            } else {
                Err(TemplateSyntaxError::new(
                    format!("unexpected '{}' after 'else'", rest.text),
                    rest.offset,
                ))
            }
        }
        "end" => {
            let (next, trailing) = rest.split_keyword();
            let block = BlockKind::from_keyword(next).ok_or_else(|| {
                TemplateSyntaxError::new(
                    "expected 'if', 'for' or 'switch' after 'end'",
                    rest.offset,
                )
            })?;
            closing(block, trailing, span)
        }
        _ => {
            let closed = keyword
                .strip_prefix("end-")
                .or_else(|| keyword.strip_prefix("end"))
                .and_then(BlockKind::from_keyword);
            match closed {
                Some(block) => closing(block, rest, span),
                None => Err(unknown_keyword(keyword, content.offset)),
            }
        }
    }
}

fn required<'a>(
    expression: ExprSource<'a>,
    keyword: &str,
    span: Span,
) -> Result<ExprSource<'a>, TemplateSyntaxError> {
    if expression.is_empty() {
        return Err(TemplateSyntaxError::new(
            format!("'{keyword}' tag requires an expression"),
            span.start,
        ));
    }
    Ok(expression)
}

fn closing(
    block: BlockKind,
    trailing: ExprSource<'_>,
    span: Span,
) -> Result<Token<'static>, TemplateSyntaxError> {
    if !trailing.is_empty() {
        return Err(TemplateSyntaxError::new(
            format!("unexpected '{}' in 'end {}' tag", trailing.text, block.keyword()),
            trailing.offset,
        ));
    }
    Ok(Token::TagEnd { block, span })
}

fn unknown_keyword(keyword: &str, offset: usize) -> TemplateSyntaxError {
    let suggestion = TAG_KEYWORDS
        .iter()
        .map(|known| (levenshtein(keyword, known), *known))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, known)| known);

    let message = match suggestion {
        Some(known) => format!("unknown tag '{keyword}'; did you mean '{known}'?"),
        None => format!("unknown tag '{keyword}'"),
    };
    TemplateSyntaxError::new(message, offset)
}
