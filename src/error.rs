//! Error types for parsing the Container Linux Config dialect

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::dialect::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialectError {
    #[error("unrecognized input at {span:?}")]
    Lex { span: Span },

    #[error("inconsistent indentation at {span:?}")]
    Indentation { span: Span },

    #[error("syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl DialectError {
    pub fn lex(span: Span) -> Self {
        Self::Lex { span }
    }

    pub fn indentation(span: Span) -> Self {
        Self::Indentation { span }
    }

    /// Source span of the offending input
    pub fn span(&self) -> &Span {
        match self {
            Self::Lex { span } | Self::Indentation { span } | Self::Syntax { span, .. } => span,
        }
    }

    /// One-line description without the span, as used in diagnostics
    pub fn message(&self) -> String {
        match self {
            Self::Lex { .. } => "unrecognized input (unterminated quote or stray character)".into(),
            Self::Indentation { .. } => {
                "inconsistent indentation: line does not match any enclosing level".into()
            }
            Self::Syntax {
                message, expected, ..
            } => {
                if expected.is_empty() {
                    message.clone()
                } else {
                    format!("{}, expected {}", message, expected.join(" or "))
                }
            }
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span().clone();
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.message())
            .with_label(
                Label::new((filename, span))
                    .with_message(self.message())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for DialectError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("unexpected {}", &**tok),
                None => "unexpected end of input".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let mut expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(tok.to_string()),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();
        expected.sort();
        expected.dedup();

        DialectError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}
