use kpl_core::SemanticErrorKind;
use kpl_parse::{compile, CompileError};
use proptest::prelude::*;

fn assignment_program(targets: usize, sources: usize) -> String {
    let decls: String = (0..6).map(|k| format!("v{k}: integer; ")).collect();
    let lhs: Vec<String> = (0..targets).map(|k| format!("v{k}")).collect();
    let rhs: Vec<String> = (0..sources).map(|k| (k + 1).to_string()).collect();
    format!(
        "program P; var {decls}begin {} := {} end.",
        lhs.join(", "),
        rhs.join(", ")
    )
}

proptest! {
    #[test]
    fn assignment_counts_must_match(targets in 1usize..=6, sources in 1usize..=6) {
        let src = assignment_program(targets, sources);
        match compile(&src) {
            Ok(_) => prop_assert_eq!(targets, sources),
            Err(CompileError::Semantic(e)) => {
                prop_assert_ne!(targets, sources);
                prop_assert_eq!(
                    e.kind,
                    SemanticErrorKind::ArityMismatch { expected: targets, found: sources }
                );
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn computed_by_reference_arguments_are_rejected(
        arg in prop::sample::select(vec!["7", "'q'", "n + 1", "-n", "(n)", "n * n", "READI"]),
    ) {
        let src = format!(
            "program P; var n: integer; procedure Inc(var x: integer); begin x += 1 end; \
             begin call Inc({arg}) end."
        );
        match compile(&src) {
            Err(CompileError::Semantic(e)) => {
                prop_assert_eq!(e.kind, SemanticErrorKind::InvalidLValue)
            }
            other => prop_assert!(false, "unexpected outcome {other:?}"),
        }
    }
}
