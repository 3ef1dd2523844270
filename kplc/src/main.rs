#![forbid(unsafe_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use kpl_lex::{Lexer, Token, TokenKind, TokenSource};
use kpl_parse::{CompileConfig, CompiledProgram};
use miette::{IntoDiagnostic, NamedSource};
use tracing::level_filters::LevelFilter;

mod manifest;

#[derive(Parser, Debug)]
#[command(name = "kplc", version, about = "KPL front end: parse, resolve and type-check programs")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Longest accepted identifier. Overrides `kpl.toml`.
    #[arg(long, global = true)]
    max_ident_len: Option<usize>,

    /// Deepest statement/expression nesting. Overrides `kpl.toml`.
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Compiler settings file to use instead of the `kpl.toml` next to the source.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse, resolve and type-check a program
    Check {
        /// Input .kpl file
        path: PathBuf,
    },
    /// Print the token stream, one token per line
    Tokens {
        /// Input .kpl file
        path: PathBuf,
    },
    /// Check a program and print its symbol table
    Symbols {
        /// Input .kpl file
        path: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.cmd {
        Cmd::Check { path } => {
            let compiled = compile_file(&cli, path)?;
            println!("{}: program {} ok", display_path(path), compiled.name());
            Ok(())
        }
        Cmd::Tokens { path } => dump_tokens(&cli, path),
        Cmd::Symbols { path } => {
            let compiled = compile_file(&cli, path)?;
            print!("{}", compiled.render());
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Flags beat the manifest, the manifest beats the defaults.
fn compile_config(cli: &Cli, source: &Path) -> miette::Result<CompileConfig> {
    let resolved = manifest::resolve_manifest(source, cli.config.as_deref())?;
    let mut cfg = CompileConfig::default();
    resolved.apply(&mut cfg);
    if let Some(n) = cli.max_ident_len {
        cfg.max_ident_len = n;
    }
    if let Some(n) = cli.max_depth {
        cfg.max_depth = n;
    }
    tracing::debug!(?cfg, manifest = ?resolved.manifest_path, "compiler configuration");
    Ok(cfg)
}

fn read_source(path: &Path) -> miette::Result<(String, NamedSource<String>)> {
    let src = fs::read_to_string(path).into_diagnostic()?;
    let named = NamedSource::new(display_path(path), src.clone());
    Ok((src, named))
}

fn compile_file(cli: &Cli, path: &Path) -> miette::Result<CompiledProgram> {
    let cfg = compile_config(cli, path)?;
    let (src, named) = read_source(path)?;
    kpl_parse::compile_with_config(&src, &cfg)
        .map_err(|e| miette::Report::new(e).with_source_code(named))
}

fn dump_tokens(cli: &Cli, path: &Path) -> miette::Result<()> {
    let cfg = compile_config(cli, path)?;
    let (src, named) = read_source(path)?;
    let mut lexer = Lexer::with_max_ident_len(&src, cfg.max_ident_len);
    loop {
        let tok = lexer
            .next_token()
            .map_err(|e| miette::Report::new(e).with_source_code(named.clone()))?;
        if tok.kind == TokenKind::Eof {
            return Ok(());
        }
        println!("{}", token_line(&tok));
    }
}

/// `line-col:KIND`, with the spelling attached for identifiers and literals.
fn token_line(tok: &Token) -> String {
    match tok.kind {
        TokenKind::Ident | TokenKind::Number => {
            format!("{}:{}({})", tok.loc, tok.kind.tag(), tok.lexeme)
        }
        TokenKind::Char => format!("{}:{}('{}')", tok.loc, tok.kind.tag(), tok.lexeme),
        _ => format!("{}:{}", tok.loc, tok.kind.tag()),
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_lines_match_scanner_dump_format() {
        let tokens = Lexer::new("program Demo;\n  x := 'a' + 12").lex().unwrap();
        let lines: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(token_line)
            .collect();
        assert_eq!(
            lines,
            vec![
                "1-1:KW_PROGRAM",
                "1-9:TK_IDENT(Demo)",
                "1-13:SB_SEMICOLON",
                "2-3:TK_IDENT(x)",
                "2-5:SB_ASSIGN",
                "2-8:TK_CHAR('a')",
                "2-12:SB_PLUS",
                "2-14:TK_NUMBER(12)",
            ]
        );
    }

    #[test]
    fn flags_override_manifest_values() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("main.kpl");
        fs::write(&src, "program P; begin end.").unwrap();
        fs::write(
            dir.path().join(manifest::MANIFEST_NAME),
            "[compiler]\nmax_ident_len = 4\nmax_depth = 9\n",
        )
        .unwrap();

        let cli = Cli::parse_from(["kplc", "--max-depth", "50", "check", src.to_str().unwrap()]);
        let cfg = compile_config(&cli, &src).unwrap();
        assert_eq!(cfg.max_ident_len, 4);
        assert_eq!(cfg.max_depth, 50);
    }
}
