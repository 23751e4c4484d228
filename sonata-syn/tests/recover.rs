//! Recovering-mode tests: lexical and syntactic failures yield a
//! best-effort AST plus diagnostics; semantic failures still abort.

use sonata_syn::ast::ExprKind;
use sonata_syn::lex::TokenKind;
use sonata_syn::{parse, parse_recover};

/// Anything strict mode rejects at the lexical or syntactic level must
/// come back with diagnostics instead of an error.
#[test]
fn recovers_where_strict_mode_aborts() {
    let sources = [
        ")",
        "a.b[",
        "(a;b",
        "a ! b",
        "1 +",
        "a b",
        "'unterminated",
        "a.'unterminated",
        "{a: }",
    ];
    for src in sources {
        assert!(parse(src).is_err(), "strict mode accepted {src:?}");
        let (_, errors) = parse_recover(src).unwrap_or_else(|e| {
            panic!("recovering mode failed on {src:?} with {e}");
        });
        assert!(!errors.is_empty(), "no diagnostics for {src:?}");
    }
}

#[test]
fn partial_ast_survives() {
    let (ast, errors) = parse_recover("a.b[").unwrap();
    // the path that did parse is still there
    match &ast.kind {
        ExprKind::Path(p) => assert_eq!(p.steps.len(), 2),
        kind => panic!("expected path, got {kind:?}"),
    }
    assert_eq!(errors[0].code(), "S0203");
}

#[test]
fn remaining_tokens_are_attached() {
    let (ast, errors) = parse_recover("a ! b").unwrap();
    assert!(matches!(ast.kind, ExprKind::Path(_)));
    assert_eq!(errors[0].code(), "S0204");
    let remaining = errors[0].remaining.as_ref().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining[0].kind,
        TokenKind::Name {
            value: "b".to_string(),
            lib: false,
        }
    );
    // positions stay real offsets into the source
    assert_eq!(remaining[0].position, 5);
}

#[test]
fn error_nodes_carry_their_diagnostic() {
    let (ast, errors) = parse_recover(")").unwrap();
    match &ast.kind {
        ExprKind::Error(err) => assert_eq!(err.code(), "S0211"),
        kind => panic!("expected error node, got {kind:?}"),
    }
    assert_eq!(errors.len(), 1);
}

#[test]
fn multiple_diagnostics_accumulate() {
    let (_, errors) = parse_recover("(a;").unwrap();
    assert!(errors.len() >= 2);
    // parse-stage diagnostics carry the drained token tail,
    // optimizer-stage ones do not
    assert!(errors[0].remaining.is_some());
}

#[test]
fn semantic_errors_still_abort() {
    // the optimizer stage has no recovery path
    assert_eq!(parse_recover("a.1").unwrap_err().code(), "S0213");
    assert_eq!(parse_recover("a{b: c}{d: e}").unwrap_err().code(), "S0210");
    assert_eq!(parse_recover("a[0]@$v").unwrap_err().code(), "S0215");
}

#[test]
fn empty_input_recovers_to_an_error_node() {
    let (ast, errors) = parse_recover("").unwrap();
    assert!(matches!(ast.kind, ExprKind::Error(_)));
    assert_eq!(errors[0].code(), "S0207");
}
