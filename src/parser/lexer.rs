//! Lexer for process assembly scripts using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Why a stretch of input could not be lexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexError {
    #[default]
    InvalidCharacter,
    /// Integer literal that does not fit in an `i64`
    IntegerOutOfRange,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(error = LexError)]
pub enum Token {
    // Statement keywords
    #[token("process")]
    Process,
    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("copy")]
    Copy,

    // Boolean literals
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Equals,
    #[token("*")]
    Star,
    #[token("@")]
    At,
    #[token("-")]
    Minus,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice()))]
    String(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| LexError::IntegerOutOfRange))]
    Integer(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][-+]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    BlockComment,
}

/// Strip the surrounding quotes and resolve backslash escapes
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

/// Stretches of input that did not lex, with the reason
pub fn lex_errors(input: &str) -> Vec<(LexError, Span)> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.err().map(|e| (e, span)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_keywords() {
        let tokens: Vec<_> = lex("process import from copy").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![Token::Process, Token::Import, Token::From, Token::Copy]
        );
    }

    #[test]
    fn test_dotted_module_path() {
        let tokens: Vec<_> = lex("TrackingTools.KalmanUpdators").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("TrackingTools".to_string()),
                Token::Dot,
                Token::Ident("KalmanUpdators".to_string()),
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens: Vec<_> = lex("processor copyCat").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("processor".to_string()),
                Token::Ident("copyCat".to_string())
            ]
        );
    }

    #[test]
    fn test_strings_both_quotes() {
        let tokens: Vec<_> = lex(r#""KFUpdator" 'Chi2' "a\"b""#).map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::String("KFUpdator".to_string()),
                Token::String("Chi2".to_string()),
                Token::String("a\"b".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens: Vec<_> = lex("4 0.105 -1.0 1e3").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Integer(4),
                Token::Float(0.105),
                Token::Minus,
                Token::Float(1.0),
                Token::Float(1000.0),
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let tokens: Vec<_> = lex("import // comment\n/* block */ copy")
            .map(|(t, _)| t)
            .collect();
        assert_eq!(tokens, vec![Token::Import, Token::Copy]);
    }

    #[test]
    fn test_reference_and_star() {
        let tokens: Vec<_> = lex("@KFUpdator *").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::At,
                Token::Ident("KFUpdator".to_string()),
                Token::Star
            ]
        );
    }

    #[test]
    fn test_block_comment_closing_stars() {
        for source in ["/* x **/ copy", "/***/ copy", "/** doc ** more */ copy"] {
            assert!(lex_errors(source).is_empty(), "{}", source);
            let tokens: Vec<_> = lex(source).map(|(t, _)| t).collect();
            assert_eq!(tokens, vec![Token::Copy], "{}", source);
        }
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(lex_errors("a = $b"), vec![(LexError::InvalidCharacter, 4..5)]);
        assert!(lex_errors("a = b").is_empty());
    }

    #[test]
    fn test_integer_out_of_range() {
        assert_eq!(
            lex_errors("a.b = 99999999999999999999"),
            vec![(LexError::IntegerOutOfRange, 6..26)]
        );
        let tokens: Vec<_> = lex("9223372036854775807").map(|(t, _)| t).collect();
        assert_eq!(tokens, vec![Token::Integer(i64::MAX)]);
    }
}
