mod common;

use common::{mismatch, ok, semantic, semantic_named, syntax, with_vars};
use kpl_core::{SemanticErrorKind, Type};
use kpl_parse::{compile, compile_with_config, CompileConfig, CompileError, SyntaxErrorKind};

#[test]
fn integer_arithmetic() {
    ok(&with_vars("i := -i + 2 * (j - 1) / 3; j := +4 - (-i)"));
}

#[test]
fn arithmetic_rejects_characters() {
    assert_eq!(semantic(&with_vars("i := -c")), mismatch(Type::Int, Type::Char));
    assert_eq!(semantic(&with_vars("c := c + 1")), mismatch(Type::Int, Type::Char));
    assert_eq!(semantic(&with_vars("i := 1 + c")), mismatch(Type::Int, Type::Char));
    assert_eq!(semantic(&with_vars("i := c * 2")), mismatch(Type::Int, Type::Char));
    assert_eq!(semantic(&with_vars("i := 2 / c")), mismatch(Type::Int, Type::Char));
}

#[test]
fn lone_terms_keep_their_type() {
    ok(&with_vars("c := c; c := (c); c := 'x'; a := a"));
}

#[test]
fn indexing() {
    ok(&with_vars("i := a[1] + a[a[2]]"));
    assert_eq!(
        semantic(&with_vars("i := i[1]")),
        SemanticErrorKind::NotAnArray
    );
    assert_eq!(
        semantic(&with_vars("i := a[c]")),
        mismatch(Type::Int, Type::Char)
    );
    assert_eq!(
        semantic(&with_vars("i := a")),
        mismatch(Type::Int, Type::array(4, Type::Int))
    );
}

#[test]
fn multi_dimensional_indexing_peels_one_level_per_selector() {
    let prelude = "program P; var m: array[2] of array[3] of char; c: char;";
    ok(&format!("{prelude} begin c := m[1][2]; m(.0.)(.1.) := c end."));
    assert_eq!(
        semantic(&format!("{prelude} begin c := m[1] end.")),
        mismatch(Type::Char, Type::array(3, Type::Char))
    );
    assert_eq!(
        semantic(&format!("{prelude} begin c := m[1][2][0] end.")),
        SemanticErrorKind::NotAnArray
    );
}

#[test]
fn constants_as_factors() {
    let prelude = "program P; const k = 3; z = 'z'; var i: integer; c: char;";
    ok(&format!("{prelude} begin i := k * k - 1; c := z end."));
    assert_eq!(
        semantic(&format!("{prelude} begin i := z end.")),
        mismatch(Type::Int, Type::Char)
    );
}

#[test]
fn names_that_are_not_values() {
    let (kind, name) = semantic_named(&with_vars("i := WRITELN"));
    assert_eq!(kind, SemanticErrorKind::InvalidFactor);
    assert_eq!(name, "WRITELN");
    assert_eq!(
        semantic("program P; type t = integer; var i: integer; begin i := t end."),
        SemanticErrorKind::InvalidFactor
    );
}

#[test]
fn malformed_expressions() {
    assert_eq!(syntax(&with_vars("i := )")), SyntaxErrorKind::InvalidFactor);
    assert_eq!(syntax(&with_vars("i := ")), SyntaxErrorKind::InvalidFactor);
    assert_eq!(syntax(&with_vars("i := 1 :")), SyntaxErrorKind::InvalidTerm);
    assert_eq!(syntax(&with_vars("i := 1 2")), SyntaxErrorKind::InvalidTerm);
}

fn parens(depth: usize) -> String {
    format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn moderate_nesting_is_fine() {
    ok(&with_vars(&format!("i := {}", parens(40))));
}

#[test]
fn pathological_nesting_is_rejected() {
    let config = CompileConfig {
        max_depth: 32,
        ..CompileConfig::default()
    };
    let src = with_vars(&format!("i := {}", parens(50)));
    match compile_with_config(&src, &config) {
        Err(CompileError::Syntax(e)) => {
            assert_eq!(e.kind, SyntaxErrorKind::NestingTooDeep { limit: 32 })
        }
        other => panic!("expected nesting error, got {other:?}"),
    }
}

fn deep_index(depth: usize) -> String {
    format!("{}0{}", "a[".repeat(depth), "]".repeat(depth))
}

/// Runs on a freshly spawned thread so the default 2 MiB stack is what the
/// compiler gets, whatever the harness was configured with.
fn default_config_result(body: String) -> Option<SyntaxErrorKind> {
    std::thread::spawn(move || match compile(&with_vars(&body)) {
        Err(CompileError::Syntax(e)) => Some(e.kind),
        _ => None,
    })
    .join()
    .unwrap()
}

#[test]
fn default_bound_stops_deep_nesting_before_the_stack_runs_out() {
    let limit = CompileConfig::default().max_depth;
    for body in [
        format!("i := {}", parens(300)),
        format!("i := {}", deep_index(300)),
        format!("if {} = 0 then i := 1", deep_index(300)),
    ] {
        assert_eq!(
            default_config_result(body),
            Some(SyntaxErrorKind::NestingTooDeep { limit })
        );
    }
}

#[test]
fn nesting_just_under_the_default_bound_compiles() {
    let limit = CompileConfig::default().max_depth;
    ok(&with_vars(&format!("i := {}", deep_index(limit - 4))));
}
