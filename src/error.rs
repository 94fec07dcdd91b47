//! Error types for parsing assembly scripts

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("Invalid character at {span:?}")]
    InvalidToken { span: Span },

    #[error("Integer literal out of range at {span:?}")]
    IntegerOutOfRange { span: Span },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. }
            | ParseError::InvalidToken { span }
            | ParseError::IntegerOutOfRange { span } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let (message, label) = match self {
            ParseError::Syntax {
                message, expected, ..
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };
                (message.clone(), format!("{}{}", message, expected_str))
            }
            ParseError::InvalidToken { .. } => (
                "Invalid character".to_string(),
                "not part of any token".to_string(),
            ),
            ParseError::IntegerOutOfRange { .. } => (
                "Integer literal out of range".to_string(),
                format!("does not fit in {} to {}", i64::MIN, i64::MAX),
            ),
        };
        report(source, filename, self.span(), &message, &label)
    }
}

/// Render a single-label ariadne report against `source`
pub(crate) fn report(source: &str, filename: &str, span: &Span, message: &str, label: &str) -> String {
    let end = span.end.min(source.len());
    let span = span.start.min(end)..end;
    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_config(Config::default().with_color(false))
        .with_message(message)
        .with_label(
            Label::new((filename, span.clone()))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("{}: {} at {:?}", filename, message, span),
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        // Format expected tokens nicely
        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        // At end of input chumsky reports an empty span with start past end
        let range = err.span().into_range();
        ParseError::Syntax {
            span: range.start.min(range.end)..range.end.max(range.start),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::parser::lexer::Token) -> String {
    use crate::parser::lexer::Token;
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Integer(n) => format!("integer {}", n),
        Token::Float(d) => format!("number {}", d),
        Token::Process => "keyword 'process'".to_string(),
        Token::Import => "keyword 'import'".to_string(),
        Token::From => "keyword 'from'".to_string(),
        Token::Copy => "keyword 'copy'".to_string(),
        Token::True => "'true'".to_string(),
        Token::False => "'false'".to_string(),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Equals => "'='".to_string(),
        Token::Star => "'*'".to_string(),
        Token::At => "'@'".to_string(),
        Token::Minus => "'-'".to_string(),
        _ => format!("{:?}", tok),
    }
}
