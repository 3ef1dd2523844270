#![forbid(unsafe_code)]

mod error;
mod expressions;
mod parser;
mod statements;

use kpl_core::{Object, ObjectId, SymbolTable};
use kpl_lex::{Lexer, TokenSource, DEFAULT_MAX_IDENT_LEN};

pub use error::{CompileError, SyntaxError, SyntaxErrorKind};
pub use parser::Parser;

/// Keeps the deepest accepted program well inside a 2 MiB thread stack in
/// unoptimized builds.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileConfig {
    /// Longest identifier the lexer accepts.
    pub max_ident_len: usize,
    /// Deepest statement/expression nesting the parser descends into.
    pub max_depth: usize,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_ident_len: DEFAULT_MAX_IDENT_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A program that passed every syntactic and semantic check, together with
/// the symbol table describing it.
#[derive(Debug)]
pub struct CompiledProgram {
    pub symtab: SymbolTable,
    pub program: ObjectId,
}

impl CompiledProgram {
    pub fn name(&self) -> &str {
        &self.symtab.object(self.program).name
    }

    /// Objects declared at program level, in source order.
    pub fn top_level(&self) -> impl Iterator<Item = &Object> + '_ {
        let scope = self.symtab.object(self.program).owned_scope();
        scope
            .into_iter()
            .flat_map(move |scope| self.symtab.scope_objects(scope))
    }

    pub fn render(&self) -> String {
        self.symtab.render()
    }
}

pub fn compile(src: &str) -> Result<CompiledProgram, CompileError> {
    compile_with_config(src, &CompileConfig::default())
}

pub fn compile_with_config(
    src: &str,
    config: &CompileConfig,
) -> Result<CompiledProgram, CompileError> {
    let lexer = Lexer::with_max_ident_len(src, config.max_ident_len);
    compile_tokens(lexer, config)
}

/// Compiles whatever `source` yields. The symbol table lives exactly as long
/// as the compilation: it is returned on success and dropped on failure.
pub fn compile_tokens<S: TokenSource>(
    source: S,
    config: &CompileConfig,
) -> Result<CompiledProgram, CompileError> {
    let mut symtab = SymbolTable::new();
    let outcome = Parser::new(source, &mut symtab, config).and_then(|mut p| p.compile_program());

    match outcome {
        Ok(program) => {
            tracing::info!(program = %symtab.object(program).name, "compilation succeeded");
            Ok(CompiledProgram { symtab, program })
        }
        Err(err) => {
            tracing::info!(error = %err, "compilation failed");
            Err(err)
        }
    }
}

/// Convenience for callers that report through `miette`.
pub fn check_source(src: &str) -> miette::Result<CompiledProgram> {
    compile(src).map_err(miette::Report::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpl_core::ObjectClass;

    #[test]
    fn default_config_matches_lexer_limit() {
        let cfg = CompileConfig::default();
        assert_eq!(cfg.max_ident_len, 15);
        assert_eq!(cfg.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn top_level_objects_in_source_order() {
        let compiled = compile(
            "program P; var b: integer; const c = 1; procedure Q; begin end; begin end.",
        )
        .unwrap();
        assert_eq!(compiled.name(), "P");
        let seen: Vec<_> = compiled
            .top_level()
            .map(|o| (o.name.as_str(), o.class()))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("b", ObjectClass::Variable),
                ("c", ObjectClass::Constant),
                ("Q", ObjectClass::Procedure),
            ]
        );
    }

    #[test]
    fn identifier_limit_comes_from_config() {
        let cfg = CompileConfig {
            max_ident_len: 3,
            ..CompileConfig::default()
        };
        let err = compile_with_config("program Long; begin end.", &cfg).unwrap_err();
        assert!(matches!(err, CompileError::Lex(_)));
        assert!(compile_with_config("program Abc; begin end.", &cfg).is_ok());
    }

    #[test]
    fn miette_report_keeps_the_code() {
        let report = check_source("program P; begin x := 1 end.").unwrap_err();
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("kpl::sema"));
    }
}
