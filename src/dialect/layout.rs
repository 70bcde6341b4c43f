//! Indentation layout pass
//!
//! Turns the line-oriented raw token stream into a token stream with
//! explicit `Indent`/`Dedent`/`Newline` structure, so the grammar can treat
//! nesting like brace-delimited blocks. A list dash opens a new level at the
//! column of the content that follows it on the same line.

use std::fmt;

use super::ast::{Scalar, Span};
use super::lexer::{lex, EntryValue, RawToken};
use crate::error::DialectError;

/// Token consumed by the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    DocumentStart,
    Key(String),
    Scalar(Scalar),
    Block(String),
    EmptySequence,
    EmptyMapping,
    Dash,
    Newline,
    Indent,
    Dedent,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::DocumentStart => write!(f, "'---'"),
            Token::Key(k) => write!(f, "key '{}'", k),
            Token::Scalar(s) => write!(f, "value '{}'", s.value),
            Token::Block(_) => write!(f, "block scalar"),
            Token::EmptySequence => write!(f, "'[]'"),
            Token::EmptyMapping => write!(f, "'{{}}'"),
            Token::Dash => write!(f, "'-'"),
            Token::Newline => write!(f, "end of line"),
            Token::Indent => write!(f, "indented block"),
            Token::Dedent => write!(f, "end of indented block"),
        }
    }
}

/// Zero-based column of a byte offset
pub fn column(source: &str, offset: usize) -> usize {
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    source[line_start..offset].chars().count()
}

/// Lex `source` and compute its indentation structure
pub fn layout(source: &str) -> Result<Vec<(Token, Span)>, Vec<DialectError>> {
    let mut errors = Vec::new();
    let mut lines: Vec<Vec<(RawToken, Span)>> = Vec::new();
    let mut current = Vec::new();

    for (token, span) in lex(source) {
        match token {
            Ok(RawToken::Newline) => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            Ok(token) => current.push((token, span)),
            Err(()) => errors.push(DialectError::lex(span)),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut out = Vec::new();
    let mut levels = vec![0usize];

    for line in lines {
        let Some(first) = line.first().map(|(_, span)| span.clone()) else {
            continue;
        };
        let line_end = line.last().map_or(first.end, |(_, span)| span.end);
        let col = column(source, first.start);
        let here = first.start..first.start;

        let top = levels.last().copied().unwrap_or(0);
        if col > top {
            out.push((Token::Indent, here.clone()));
            levels.push(col);
        } else {
            while col < levels.last().copied().unwrap_or(0) {
                levels.pop();
                out.push((Token::Dedent, here.clone()));
            }
            if col != levels.last().copied().unwrap_or(0) {
                errors.push(DialectError::indentation(first.clone()));
                out.push((Token::Indent, here.clone()));
                levels.push(col);
            }
        }

        let mut tokens = line.into_iter().peekable();
        while let Some((token, span)) = tokens.next() {
            match token {
                RawToken::Dash => {
                    out.push((Token::Dash, span));
                    if let Some((_, next)) = tokens.peek() {
                        out.push((Token::Indent, next.start..next.start));
                        levels.push(column(source, next.start));
                    }
                }
                RawToken::Entry(entry) => {
                    let key_end = span.start + entry.key_len;
                    let rest = &source[(key_end + 1).min(span.end)..span.end];
                    let value_start = span.end - rest.trim_start().len();
                    let value_span = value_start..value_start + rest.trim().len();
                    out.push((Token::Key(entry.key), span.start..key_end));
                    match entry.value {
                        EntryValue::Empty => {}
                        EntryValue::Scalar(s) => out.push((Token::Scalar(s), value_span)),
                        EntryValue::Block(b) => out.push((Token::Block(b), value_span)),
                        EntryValue::EmptySequence => out.push((Token::EmptySequence, value_span)),
                        EntryValue::EmptyMapping => out.push((Token::EmptyMapping, value_span)),
                    }
                }
                RawToken::Scalar(s) => out.push((Token::Scalar(s), span)),
                RawToken::DocumentStart => out.push((Token::DocumentStart, span)),
                RawToken::Newline | RawToken::Comment => {}
            }
        }
        out.push((Token::Newline, line_end..line_end));
    }

    let end = source.len();
    while levels.len() > 1 {
        levels.pop();
        out.push((Token::Dedent, end..end));
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        layout(source)
            .expect("layout should succeed")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_nested_mapping_indents() {
        assert_eq!(
            kinds("a:\n  b: 1\nc: 2\n"),
            vec![
                Token::Key("a".into()),
                Token::Newline,
                Token::Indent,
                Token::Key("b".into()),
                Token::Scalar(Scalar::plain("1")),
                Token::Newline,
                Token::Dedent,
                Token::Key("c".into()),
                Token::Scalar(Scalar::plain("2")),
                Token::Newline,
            ]
        );
    }

    #[test]
    fn test_dash_opens_level_at_content_column() {
        assert_eq!(
            kinds("files:\n- path: /a\n  mode: 1\n- path: /b\n"),
            vec![
                Token::Key("files".into()),
                Token::Newline,
                Token::Dash,
                Token::Indent,
                Token::Key("path".into()),
                Token::Scalar(Scalar::plain("/a")),
                Token::Newline,
                Token::Key("mode".into()),
                Token::Scalar(Scalar::plain("1")),
                Token::Newline,
                Token::Dedent,
                Token::Dash,
                Token::Indent,
                Token::Key("path".into()),
                Token::Scalar(Scalar::plain("/b")),
                Token::Newline,
                Token::Dedent,
            ]
        );
    }

    #[test]
    fn test_blank_and_comment_lines_are_ignored() {
        assert_eq!(
            kinds("a: 1\n\n   # note\nb: 2"),
            vec![
                Token::Key("a".into()),
                Token::Scalar(Scalar::plain("1")),
                Token::Newline,
                Token::Key("b".into()),
                Token::Scalar(Scalar::plain("2")),
                Token::Newline,
            ]
        );
    }

    #[test]
    fn test_inconsistent_dedent_is_an_error() {
        let errors = layout("a:\n    b: 1\n  c: 2\n").expect_err("should reject");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], DialectError::Indentation { .. }));
    }

    #[test]
    fn test_column_counts_characters() {
        let source = "ab\n  cd";
        assert_eq!(column(source, 5), 2);
        assert_eq!(column(source, 0), 0);
    }
}
