//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::parser::ast::*;
use crate::parser::lexer::{self, LexError, Token};
use crate::record::Value;

/// Parse script source code into an AST
pub fn parse(input: &str) -> Result<Script, Vec<ParseError>> {
    let invalid = lexer::lex_errors(input);
    if !invalid.is_empty() {
        return Err(invalid
            .into_iter()
            .map(|(error, span)| match error {
                LexError::InvalidCharacter => ParseError::InvalidToken { span },
                LexError::IntegerOutOfRange => ParseError::IntegerOutOfRange { span },
            })
            .collect());
    }

    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    script_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn negate(value: Value) -> Value {
    match value {
        Value::Int(n) => Value::Int(-n),
        Value::Double(d) => Value::Double(-d),
        other => other,
    }
}

fn script_parser<'a, I>() -> impl Parser<'a, I, Script, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => Identifier::new(s),
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    // Dotted module path: TrackingTools.KalmanUpdators.KFUpdatorESProducer
    let module_path = select! {
        Token::Ident(s) => Identifier::new(s),
    }
    .separated_by(just(Token::Dot))
    .at_least(1)
    .collect::<Vec<_>>()
    .map_with(|segments, e| Spanned::new(ModulePath(segments), span_range(&e.span())))
    .labelled("module path");

    // Field values: strings, booleans, numbers, @references and [lists]
    let value = recursive(|value| {
        let scalar = select! {
            Token::String(s) => Value::Str(s),
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
        };

        let number = just(Token::Minus)
            .or_not()
            .then(select! {
                Token::Integer(n) => Value::Int(n),
                Token::Float(d) => Value::Double(d),
            })
            .map(|(neg, v)| if neg.is_some() { negate(v) } else { v });

        let reference = just(Token::At)
            .ignore_then(select! { Token::Ident(s) => s })
            .map(|s: String| Value::reference(s));

        let list = value
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(Value::List);

        choice((scalar, number, reference, list))
    })
    .map_with(|v, e| Spanned::new(v, span_range(&e.span())))
    .labelled("value");

    // field = value
    let field_override = identifier
        .clone()
        .then_ignore(just(Token::Equals))
        .then(value)
        .map(|(field, value)| FieldOverride { field, value });

    // import a.b.c
    let import_all = just(Token::Import)
        .ignore_then(module_path.clone())
        .map(|module| ImportDecl {
            module,
            items: ImportItems::All,
        });

    // from a.b.c import X, Y   |   from a.b.c import *
    let import_from = just(Token::From)
        .ignore_then(module_path)
        .then_ignore(just(Token::Import))
        .then(choice((
            just(Token::Star).to(ImportItems::All),
            identifier
                .clone()
                .separated_by(just(Token::Comma))
                .at_least(1)
                .collect::<Vec<_>>()
                .map(ImportItems::Only),
        )))
        .map(|(module, items)| ImportDecl { module, items });

    // Optional override block: { field = value, ... }
    let override_block = field_override
        .clone()
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::BraceOpen), just(Token::BraceClose));

    // Target = copy(Source) { ... }
    let copy_decl = identifier
        .clone()
        .then_ignore(just(Token::Equals))
        .then_ignore(just(Token::Copy))
        .then(
            identifier
                .clone()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        )
        .then(override_block.or_not())
        .map(|((target, source), overrides)| CopyDecl {
            target,
            source,
            overrides: overrides.unwrap_or_default(),
        });

    // Target.field = value
    let assign_decl = identifier
        .clone()
        .then_ignore(just(Token::Dot))
        .then(field_override)
        .map(|(target, assignment)| AssignDecl { target, assignment });

    // Note: copy_decl and assign_decl both start with an identifier; the
    // second token ('=' vs '.') decides.
    let statement = choice((
        import_all.map(Statement::Import),
        import_from.map(Statement::Import),
        copy_decl.map(Statement::Copy),
        assign_decl.map(Statement::Assign),
    ))
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())))
    .boxed();

    let header = just(Token::Process).ignore_then(identifier);

    header
        .or_not()
        .then(statement.repeated().collect::<Vec<_>>())
        .then_ignore(end())
        .map(|(process_name, statements)| Script {
            process_name,
            statements,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(input: &str) -> Statement {
        let script = parse(input).expect("Should parse");
        assert_eq!(script.statements.len(), 1);
        script.statements.into_iter().next().unwrap().node
    }

    #[test]
    fn test_parse_empty() {
        let script = parse("").expect("Should parse");
        assert!(script.process_name.is_none());
        assert!(script.statements.is_empty());
    }

    #[test]
    fn test_parse_process_header() {
        let script = parse("process CTFFinalFitWithMaterialTIFTIB").expect("Should parse");
        assert_eq!(
            script.process_name.unwrap().node.as_str(),
            "CTFFinalFitWithMaterialTIFTIB"
        );
    }

    #[test]
    fn test_parse_wildcard_import() {
        match single("import TrackingTools.KalmanUpdators.KFUpdatorESProducer") {
            Statement::Import(decl) => {
                assert_eq!(
                    decl.module.node.to_string(),
                    "TrackingTools.KalmanUpdators.KFUpdatorESProducer"
                );
                assert_eq!(decl.items, ImportItems::All);
            }
            other => panic!("Expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_from_import_star() {
        match single("from A.B import *") {
            Statement::Import(decl) => assert_eq!(decl.items, ImportItems::All),
            other => panic!("Expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_from_import_names() {
        match single("from TrackingTools.TrackFitters.KFFittingSmootherESProducer import KFFittingSmoother, Other") {
            Statement::Import(decl) => match decl.items {
                ImportItems::Only(names) => {
                    let names: Vec<_> = names.iter().map(|n| n.node.as_str()).collect();
                    assert_eq!(names, vec!["KFFittingSmoother", "Other"]);
                }
                other => panic!("Expected explicit names, got {:?}", other),
            },
            other => panic!("Expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_copy() {
        match single("KFFittingSmootherTIFTIB = copy(KFFittingSmoother)") {
            Statement::Copy(decl) => {
                assert_eq!(decl.target.node.as_str(), "KFFittingSmootherTIFTIB");
                assert_eq!(decl.source.node.as_str(), "KFFittingSmoother");
                assert!(decl.overrides.is_empty());
            }
            other => panic!("Expected copy, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_copy_with_overrides() {
        let input = r#"
            RungeKuttaTrackerPropagator = copy(MaterialPropagator) {
                ComponentName = "RungeKuttaTrackerPropagator",
                useRungeKutta = true,
            }
        "#;
        match single(input) {
            Statement::Copy(decl) => {
                assert_eq!(decl.overrides.len(), 2);
                assert_eq!(decl.overrides[0].field.node.as_str(), "ComponentName");
                assert_eq!(
                    decl.overrides[0].value.node,
                    Value::Str("RungeKuttaTrackerPropagator".to_string())
                );
                assert_eq!(decl.overrides[1].value.node, Value::Bool(true));
            }
            other => panic!("Expected copy, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_assign_values() {
        let cases = [
            ("x.MinNumberOfHits = 4", Value::Int(4)),
            ("x.EstimateCut = -1.0", Value::Double(-1.0)),
            ("x.Offset = -3", Value::Int(-3)),
            ("x.useRungeKutta = false", Value::Bool(false)),
            ("x.src = 'ckfTrackCandidatesTIFTIB'", Value::from("ckfTrackCandidatesTIFTIB")),
            ("x.Fitter = @KFFittingSmootherTIFTIB", Value::reference("KFFittingSmootherTIFTIB")),
            (
                "x.AnnealingProgram = [80.0, 9.0, 1]",
                Value::List(vec![Value::Double(80.0), Value::Double(9.0), Value::Int(1)]),
            ),
            ("x.Empty = []", Value::List(vec![])),
        ];
        for (input, expected) in cases {
            match single(input) {
                Statement::Assign(decl) => {
                    assert_eq!(decl.target.node.as_str(), "x");
                    assert_eq!(decl.assignment.value.node, expected, "input: {}", input);
                }
                other => panic!("Expected assignment, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_spans() {
        let script = parse("a.b = 1").expect("Should parse");
        let stmt = &script.statements[0];
        assert_eq!(stmt.span, 0..7);
        match &stmt.node {
            Statement::Assign(decl) => {
                assert_eq!(decl.target.span, 0..1);
                assert_eq!(decl.assignment.field.span, 2..3);
                assert_eq!(decl.assignment.value.span, 6..7);
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_header_must_come_first() {
        assert!(parse("import A\nprocess P").is_err());
    }

    #[test]
    fn test_parse_missing_value_error() {
        let errors = parse("x.MinNumberOfHits =").unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_parse_invalid_character() {
        let errors = parse("x.a = $").unwrap_err();
        assert!(matches!(errors[0], ParseError::InvalidToken { .. }));
    }
}
