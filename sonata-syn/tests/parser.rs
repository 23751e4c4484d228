//! End-to-end tests: source text to canonical AST.

use sonata_syn::ast::{ChangeOp, ChangeTarget, Clause, Expr, ExprKind, PathSeg, Step};
use sonata_syn::ops::{BinaryOp, MathOp, OrdOp};
use sonata_syn::signature::ParamType;
use sonata_syn::{parse, ErrorKind};

fn steps(expr: &Expr) -> &[Step] {
    match &expr.kind {
        ExprKind::Path(p) => &p.steps,
        kind => panic!("expected path, got {kind:?}"),
    }
}

fn step_names(expr: &Expr) -> Vec<&str> {
    steps(expr)
        .iter()
        .map(|s| match &s.expr.kind {
            ExprKind::Name(n) => n.as_str(),
            kind => panic!("expected name step, got {kind:?}"),
        })
        .collect()
}

#[test]
fn parsing_is_deterministic() {
    let src = r#"Account.Order[OrderID="order103"].Product.Price"#;
    assert_eq!(parse(src).unwrap(), parse(src).unwrap());
}

#[test]
fn order_query() {
    let ast = parse(r#"Account.Order[OrderID="order103"].Product.Price"#).unwrap();
    assert_eq!(step_names(&ast), ["Account", "Order", "Product", "Price"]);
    let steps = steps(&ast);
    assert_eq!(steps[1].stages.len(), 1);
    match &steps[1].stages[0].expr.kind {
        ExprKind::Binary { op, lhs, rhs } => {
            assert_eq!(*op, BinaryOp::Ord(OrdOp::Eq));
            assert_eq!(step_names(lhs), ["OrderID"]);
            assert_eq!(rhs.kind, ExprKind::Str("order103".to_string()));
        }
        kind => panic!("expected comparison, got {kind:?}"),
    }
    for step in steps {
        assert!(step.stages.len() <= 1);
    }
}

#[test]
fn predicate_on_single_step() {
    let ast = parse("a[b]").unwrap();
    let steps = steps(&ast);
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].stages.len(), 1);
    assert_eq!(step_names(&steps[0].stages[0].expr), ["b"]);
}

#[test]
fn empty_predicate_sets_keep_singleton() {
    match &parse("a[]").unwrap().kind {
        ExprKind::Path(p) => assert!(p.keep_singleton_array),
        kind => panic!("expected path, got {kind:?}"),
    }
}

#[test]
fn wildcards() {
    let ast = parse("a.*.b").unwrap();
    assert!(matches!(steps(&ast)[1].expr.kind, ExprKind::Wildcard));
    let ast = parse("**.b").unwrap();
    assert!(matches!(steps(&ast)[0].expr.kind, ExprKind::Descendant));
}

#[test]
fn string_literal_escapes() {
    let ast = parse(r#""a\n\u0041""#).unwrap();
    assert_eq!(ast.kind, ExprKind::Str("a\nA".to_string()));
}

#[test]
fn hard_errors() {
    assert_eq!(parse("a.1").unwrap_err().code(), "S0213");
    assert_eq!(parse("1 := $x").unwrap_err().code(), "S0212");
    assert_eq!(parse("a{b: c}{d: e}").unwrap_err().code(), "S0210");
    assert_eq!(parse("a{b: c}[0]").unwrap_err().code(), "S0209");
    assert_eq!(parse("a ** b").unwrap_err().code(), "S0201");
}

#[test]
fn variable_binding() {
    let ast = parse("$x := 42").unwrap();
    match ast.kind {
        ExprKind::Bind { lhs, rhs } => {
            assert_eq!(lhs.kind, ExprKind::Variable("x".to_string()));
            assert_eq!(rhs.kind, ExprKind::Number(42.0));
        }
        kind => panic!("expected bind, got {kind:?}"),
    }
}

#[test]
fn bind_is_right_associative() {
    let ast = parse("$x := $y := 1").unwrap();
    match ast.kind {
        ExprKind::Bind { rhs, .. } => {
            assert!(matches!(rhs.kind, ExprKind::Bind { .. }));
        }
        kind => panic!("expected bind, got {kind:?}"),
    }
}

#[test]
fn association_binding_defers_its_value() {
    let ast = parse("price :: a.b").unwrap();
    match ast.kind {
        ExprKind::Bind { lhs, rhs } => {
            assert_eq!(lhs.kind, ExprKind::Variable("price".to_string()));
            match rhs.kind {
                ExprKind::Lambda(lambda) => {
                    assert!(lambda.thunk);
                    assert_eq!(step_names(&lambda.body), ["a", "b"]);
                }
                kind => panic!("expected thunk, got {kind:?}"),
            }
        }
        kind => panic!("expected bind, got {kind:?}"),
    }
    // a quoted name works the same way
    assert!(matches!(
        parse(r#""total" :: 1"#).unwrap().kind,
        ExprKind::Bind { .. }
    ));
}

#[test]
fn focus_and_index_binding() {
    let ast = parse("a@$v").unwrap();
    let step = &steps(&ast)[0];
    assert_eq!(step.focus.as_deref(), Some("v"));
    assert!(step.tuple);

    let ast = parse("a#$i.b").unwrap();
    let step = &steps(&ast)[0];
    assert_eq!(step.index.as_deref(), Some("i"));

    assert_eq!(parse("a[0]@$v").unwrap_err().code(), "S0215");
    assert_eq!(parse("a^(b)@$v").unwrap_err().code(), "S0216");
    assert_eq!(parse("a@1").unwrap_err().code(), "S0214");
}

#[test]
fn order_by() {
    let ast = parse("a^(>b, c)").unwrap();
    let steps = steps(&ast);
    assert_eq!(steps.len(), 2);
    match &steps[1].expr.kind {
        ExprKind::Sort(terms) => {
            assert_eq!(terms.len(), 2);
            assert!(terms[0].descending);
            assert!(!terms[1].descending);
            assert_eq!(step_names(&terms[1].expression), ["c"]);
        }
        kind => panic!("expected sort step, got {kind:?}"),
    }
}

#[test]
fn grouping_attaches_to_last_step() {
    let ast = parse("a.b{c: d}").unwrap();
    let steps = steps(&ast);
    let group = steps[1].group.as_ref().unwrap();
    assert_eq!(group.pairs.len(), 1);
    assert!(steps[0].group.is_none());
}

#[test]
fn conditional_and_blocks() {
    let ast = parse("a ? b : c").unwrap();
    assert!(matches!(
        ast.kind,
        ExprKind::Condition {
            otherwise: Some(_),
            ..
        }
    ));
    let ast = parse("(1; 2)").unwrap();
    match ast.kind {
        ExprKind::Block(exprs) => assert_eq!(exprs.len(), 2),
        kind => panic!("expected block, got {kind:?}"),
    }
}

#[test]
fn array_constructor_with_ranges() {
    let ast = parse("[1..3, 5]").unwrap();
    match ast.kind {
        ExprKind::Array(items) => {
            assert_eq!(items.len(), 2);
            assert!(matches!(
                items[0].kind,
                ExprKind::Binary {
                    op: BinaryOp::Range,
                    ..
                }
            ));
        }
        kind => panic!("expected array, got {kind:?}"),
    }
}

#[test]
fn negative_literal_folding() {
    assert_eq!(parse("-5").unwrap().kind, ExprKind::Number(-5.0));
    let ast = parse("1 - -2").unwrap();
    match ast.kind {
        ExprKind::Binary { op, rhs, .. } => {
            assert_eq!(op, BinaryOp::Math(MathOp::Sub));
            assert_eq!(rhs.kind, ExprKind::Number(-2.0));
        }
        kind => panic!("expected binary, got {kind:?}"),
    }
}

#[test]
fn lambda_with_simple_body_is_not_thunked() {
    let ast = parse("function($x){$x+1}").unwrap();
    match ast.kind {
        ExprKind::Lambda(lambda) => {
            assert!(!lambda.thunk);
            assert_eq!(lambda.signature, None);
            assert_eq!(
                lambda.arguments,
                [Expr::new(ExprKind::Variable("x".to_string()), 11)]
            );
            match &lambda.body.kind {
                ExprKind::Block(exprs) => {
                    assert!(matches!(exprs[0].kind, ExprKind::Binary { .. }))
                }
                kind => panic!("expected block body, got {kind:?}"),
            }
        }
        kind => panic!("expected lambda, got {kind:?}"),
    }
}

#[test]
fn tail_calls_are_thunked() {
    let ast = parse("function($f){$f(1)}").unwrap();
    match ast.kind {
        ExprKind::Lambda(lambda) => match &lambda.body.kind {
            ExprKind::Block(exprs) => match &exprs[0].kind {
                ExprKind::Lambda(thunk) => {
                    assert!(thunk.thunk);
                    assert!(matches!(thunk.body.kind, ExprKind::Function(_)));
                }
                kind => panic!("expected thunk, got {kind:?}"),
            },
            kind => panic!("expected block body, got {kind:?}"),
        },
        kind => panic!("expected lambda, got {kind:?}"),
    }
}

#[test]
fn only_the_last_block_expression_is_thunked() {
    let ast = parse("function($f){1; $f(2)}").unwrap();
    match ast.kind {
        ExprKind::Lambda(lambda) => match &lambda.body.kind {
            ExprKind::Block(exprs) => {
                assert_eq!(exprs[0].kind, ExprKind::Number(1.0));
                assert!(matches!(&exprs[1].kind, ExprKind::Lambda(t) if t.thunk));
            }
            kind => panic!("expected block body, got {kind:?}"),
        },
        kind => panic!("expected lambda, got {kind:?}"),
    }
}

#[test]
fn lambda_arguments_must_be_variables() {
    assert_eq!(parse("function(x){x}").unwrap_err().code(), "S0208");
}

#[test]
fn lambda_signature() {
    let ast = parse("function($x)<s:s>{$x}").unwrap();
    match ast.kind {
        ExprKind::Lambda(lambda) => {
            let sig = lambda.signature.unwrap();
            assert_eq!(sig.params.len(), 1);
            assert_eq!(sig.params[0].type_, ParamType::Str);
            assert_eq!(sig.result.unwrap().type_, ParamType::Str);
        }
        kind => panic!("expected lambda, got {kind:?}"),
    }
}

#[test]
fn library_call_keeps_its_qualified_name() {
    let ast = parse("system::date()").unwrap();
    match ast.kind {
        ExprKind::Function(call) => {
            assert_eq!(
                call.procedure.kind,
                ExprKind::Variable("system::date".to_string())
            );
            assert!(call.arguments.is_empty());
        }
        kind => panic!("expected call, got {kind:?}"),
    }
}

#[test]
fn library_lambda_becomes_a_binding() {
    let ast = parse("utils::inc($x){ $x + 1 }").unwrap();
    match ast.kind {
        ExprKind::Bind { lhs, rhs } => {
            assert_eq!(lhs.kind, ExprKind::Variable("utils::inc".to_string()));
            assert!(matches!(rhs.kind, ExprKind::Lambda(_)));
        }
        kind => panic!("expected bind, got {kind:?}"),
    }
}

#[test]
fn partial_application() {
    let ast = parse("$f(?, 5)").unwrap();
    match ast.kind {
        ExprKind::Function(call) => {
            assert!(call.partial);
            assert_eq!(call.arguments[0].kind, ExprKind::PartialArg);
            assert_eq!(call.arguments[1].kind, ExprKind::Number(5.0));
        }
        kind => panic!("expected call, got {kind:?}"),
    }
}

#[test]
fn chained_calls_record_the_next_function() {
    let ast = parse("a.foo().bar()").unwrap();
    let steps = steps(&ast);
    match &steps[1].expr.kind {
        ExprKind::Function(call) => {
            assert_eq!(call.next_function.as_deref(), Some("bar"))
        }
        kind => panic!("expected call step, got {kind:?}"),
    }
}

#[test]
fn apply_chains() {
    let ast = parse("a ~> $f ~> $g").unwrap();
    match ast.kind {
        ExprKind::Apply { lhs, rhs } => {
            assert!(matches!(lhs.kind, ExprKind::Apply { .. }));
            assert_eq!(rhs.kind, ExprKind::Variable("g".to_string()));
        }
        kind => panic!("expected apply, got {kind:?}"),
    }
}

#[test]
fn assignment_restructures_the_path() {
    let ast = parse("a.b <~ 42").unwrap();
    let path = match &ast.kind {
        ExprKind::Path(p) => p,
        kind => panic!("expected path, got {kind:?}"),
    };
    assert!(path.change);
    assert_eq!(path.steps.len(), 2);
    assert!(path.steps[0].create_missing);
    let change = match &path.steps[1].expr.kind {
        ExprKind::Block(exprs) => match &exprs[0].kind {
            ExprKind::Change(change) => change,
            kind => panic!("expected change, got {kind:?}"),
        },
        kind => panic!("expected block step, got {kind:?}"),
    };
    assert_eq!(change.op, ChangeOp::Assign);
    assert_eq!(
        change.value.as_ref().unwrap().kind,
        ExprKind::Number(42.0)
    );
    match change.target.as_ref() {
        ChangeTarget::Step(step) => {
            assert_eq!(step.expr.kind, ExprKind::Name("b".to_string()));
            assert_eq!(
                step.parent.as_deref(),
                Some(&[PathSeg::Key("a".to_string())][..])
            );
        }
        target => panic!("expected step target, got {target:?}"),
    }
}

#[test]
fn predicated_target_stays_on_the_path() {
    let ast = parse("a.b[0] <~ 1").unwrap();
    let path = match &ast.kind {
        ExprKind::Path(p) => p,
        kind => panic!("expected path, got {kind:?}"),
    };
    // the predicated step is kept; an empty placeholder is the target
    assert_eq!(path.steps.len(), 3);
    assert_eq!(path.steps[1].stages.len(), 1);
    let change = match &path.steps[2].expr.kind {
        ExprKind::Block(exprs) => match &exprs[0].kind {
            ExprKind::Change(change) => change,
            kind => panic!("expected change, got {kind:?}"),
        },
        kind => panic!("expected block step, got {kind:?}"),
    };
    match change.target.as_ref() {
        ChangeTarget::Step(step) => {
            assert_eq!(step.expr.kind, ExprKind::Variable(String::new()));
            assert_eq!(
                step.parent.as_deref(),
                Some(
                    &[
                        PathSeg::Key("a".to_string()),
                        PathSeg::Key("b".to_string()),
                        PathSeg::Index(0.0),
                    ][..]
                )
            );
        }
        target => panic!("expected step target, got {target:?}"),
    }
}

#[test]
fn deletion_marks_the_path() {
    let ast = parse("a.b ~X").unwrap();
    let path = match &ast.kind {
        ExprKind::Path(p) => p,
        kind => panic!("expected path, got {kind:?}"),
    };
    assert!(path.change);
    assert!(path.steps[0].deletion);
    assert!(!path.steps[0].create_missing);
    let change = match &path.steps[1].expr.kind {
        ExprKind::Block(exprs) => match &exprs[0].kind {
            ExprKind::Change(change) => change,
            kind => panic!("expected change, got {kind:?}"),
        },
        kind => panic!("expected block step, got {kind:?}"),
    };
    assert_eq!(change.op, ChangeOp::Delete);
    assert!(change.value.is_none());
}

#[test]
fn apply_into_a_path_becomes_a_change() {
    let ast = parse("42 ~> a.b").unwrap();
    let path = match &ast.kind {
        ExprKind::Path(p) => p,
        kind => panic!("expected path, got {kind:?}"),
    };
    assert!(path.change);
    let change = match &path.steps[1].expr.kind {
        ExprKind::Block(exprs) => match &exprs[0].kind {
            ExprKind::Change(change) => change,
            kind => panic!("expected change, got {kind:?}"),
        },
        kind => panic!("expected block step, got {kind:?}"),
    };
    assert_eq!(change.op, ChangeOp::Apply);
    assert_eq!(
        change.value.as_ref().unwrap().kind,
        ExprKind::Number(42.0)
    );
}

#[test]
fn switch_blocks() {
    let ast = parse("?{ a => 1, b => 2; c => 3; }?").unwrap();
    match ast.kind {
        ExprKind::Switch(clauses) => {
            assert_eq!(clauses.len(), 3);
            let fallthroughs: Vec<bool> = clauses
                .iter()
                .map(|c| match c {
                    Clause::Case { fallthrough, .. } => *fallthrough,
                    clause => panic!("expected case, got {clause:?}"),
                })
                .collect();
            assert_eq!(fallthroughs, [true, false, false]);
        }
        kind => panic!("expected switch, got {kind:?}"),
    }
}

#[test]
fn switch_value_clauses() {
    let ast = parse("?{ 42; a => 1; }?").unwrap();
    match ast.kind {
        ExprKind::Switch(clauses) => {
            assert!(matches!(&clauses[0], Clause::Value(v) if v.kind == ExprKind::Number(42.0)));
            assert!(matches!(&clauses[1], Clause::Case { .. }));
        }
        kind => panic!("expected switch, got {kind:?}"),
    }
}

#[test]
fn transform_expression() {
    let ast = parse(r#"|a|{"b": 1}|"#).unwrap();
    match ast.kind {
        ExprKind::Transform {
            pattern,
            update,
            delete,
        } => {
            assert_eq!(step_names(&pattern), ["a"]);
            assert!(matches!(update.kind, ExprKind::Object(_)));
            assert!(delete.is_none());
        }
        kind => panic!("expected transform, got {kind:?}"),
    }
}

#[test]
fn regex_match() {
    let ast = parse("a ~= /ab+/i").unwrap();
    match ast.kind {
        ExprKind::Binary { op, rhs, .. } => {
            assert_eq!(op, BinaryOp::Match);
            assert_eq!(
                rhs.kind,
                ExprKind::Regex {
                    pattern: "ab+".to_string(),
                    flags: "ig".to_string(),
                }
            );
        }
        kind => panic!("expected match, got {kind:?}"),
    }
}

#[test]
fn tagged_names_are_variables() {
    let ast = parse("#foo").unwrap();
    assert_eq!(ast.kind, ExprKind::Variable("#foo".to_string()));
}

#[test]
fn association_ref_becomes_a_backtick_call() {
    let ast = parse("#'`total`").unwrap();
    let steps = steps(&ast);
    match &steps[0].expr.kind {
        ExprKind::Function(call) => {
            assert!(call.backtick);
            assert_eq!(call.procedure.kind, ExprKind::Variable("total".to_string()));
        }
        kind => panic!("expected backtick call, got {kind:?}"),
    }
}

#[test]
fn backtick_template_concatenates() {
    let ast = parse("`a${x}b`").unwrap();
    match ast.kind {
        ExprKind::Binary { op, lhs, rhs } => {
            assert_eq!(op, BinaryOp::Concat);
            assert_eq!(rhs.kind, ExprKind::Str("b".to_string()));
            match lhs.kind {
                ExprKind::Binary { op, lhs, rhs } => {
                    assert_eq!(op, BinaryOp::Concat);
                    assert_eq!(lhs.kind, ExprKind::Str("a".to_string()));
                    match rhs.kind {
                        ExprKind::Block(exprs) => assert_eq!(step_names(&exprs[0]), ["x"]),
                        kind => panic!("expected block, got {kind:?}"),
                    }
                }
                kind => panic!("expected concat, got {kind:?}"),
            }
        }
        kind => panic!("expected concat, got {kind:?}"),
    }
}

#[test]
fn comments_in_blocks_need_no_separator() {
    let ast = parse("(/** doc */ a)").unwrap();
    match ast.kind {
        ExprKind::Block(exprs) => {
            assert_eq!(exprs.len(), 2);
            assert_eq!(exprs[0].kind, ExprKind::Comment("/** doc */".to_string()));
            assert_eq!(step_names(&exprs[1]), ["a"]);
        }
        kind => panic!("expected block, got {kind:?}"),
    }
}

#[test]
fn signature_errors_are_relocated() {
    let err = parse("function($x)<q>{$x}").unwrap_err();
    assert_eq!(err.code(), "S0401");
    assert_eq!(err.kind, ErrorKind::SignatureSymbol('q'));
    // inside the signature block, past the `<`
    assert!(err.position > 12);
}
