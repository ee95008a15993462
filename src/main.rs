// ABOUTME: CLI driver - selects a subcommand, loads the source file, and funnels it through the pipeline

mod ast;
mod config;
mod env;
mod error;
mod eval;
mod lexer;
mod parser;
mod token;
mod value;

use clap::{Parser, Subcommand};
use error::ErrorReporter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter for a small Lox-family scripting language")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    /// Emit a line to stderr on every scope push/pop/swap, for debugging
    /// closures and call-stack depth.
    #[arg(long = "report-scopes", global = true)]
    report_scopes: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lex FILE and print each non-ignored token, one per line.
    Tokenize { file: PathBuf },
    /// Lex and parse FILE, then pretty-print the statement tree.
    Parse { file: PathBuf },
    /// Lex, parse, and execute FILE.
    Interpret { file: PathBuf },
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let (file, command_kind) = match &args.command {
        Command::Tokenize { file } => (file, "tokenize"),
        Command::Parse { file } => (file, "parse"),
        Command::Interpret { file } => (file, "interpret"),
    };

    let source = match std::fs::read_to_string(file) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Cannot read source file {}: {e}", file.display());
            return ExitCode::from(1);
        }
    };

    let run_config = config::RunConfig { report_scopes: args.report_scopes };
    let mut reporter = ErrorReporter::new(run_config.report_scopes);

    let code = match command_kind {
        "tokenize" => run_tokenize(&source, &mut reporter),
        "parse" => run_parse(&source, &mut reporter),
        "interpret" => run_interpret(&source, &mut reporter),
        _ => unreachable!("clap only produces the three declared subcommands"),
    };

    ExitCode::from(code as u8)
}

/// `tokenize`: lex then print `<KIND> <lexeme> <payload>` per token, EOF
/// always last. Lexical errors are reported by the lexer itself; tokenizing
/// still emits every token it managed to produce.
fn run_tokenize(source: &str, reporter: &mut ErrorReporter) -> i32 {
    let tokens = lexer::tokenize(source, reporter);
    for token in &tokens {
        println!("{token}");
    }
    reporter.exit_code()
}

/// `parse`: lex then parse, pretty-printing the resulting statement list.
/// A failing parse still prints whatever statements were recovered.
fn run_parse(source: &str, reporter: &mut ErrorReporter) -> i32 {
    let tokens = lexer::tokenize(source, reporter);
    let stmts = parser::parse(tokens, reporter);
    for stmt in &stmts {
        println!("{}", ast::print_stmt(stmt));
    }
    reporter.exit_code()
}

/// `interpret`: lex, parse, execute. Execution is skipped entirely if
/// lexing or parsing failed, matching the original driver's short-circuit.
fn run_interpret(source: &str, reporter: &mut ErrorReporter) -> i32 {
    let tokens = lexer::tokenize(source, reporter);
    if reporter.had_lex_error() {
        return reporter.exit_code();
    }
    let stmts = parser::parse(tokens, reporter);
    if reporter.had_parse_error() {
        return reporter.exit_code();
    }
    eval::interpret(&stmts, reporter);
    reporter.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_of_unterminated_string_exits_65() {
        let mut reporter = ErrorReporter::new(false);
        let code = run_tokenize("\"abc", &mut reporter);
        assert_eq!(code, error::EXIT_LEX_ERROR);
    }

    #[test]
    fn parse_of_missing_semicolon_exits_66() {
        let mut reporter = ErrorReporter::new(false);
        let code = run_parse("var x = 1", &mut reporter);
        assert_eq!(code, error::EXIT_PARSE_ERROR);
    }

    #[test]
    fn interpret_of_clean_program_exits_0() {
        let mut reporter = ErrorReporter::new(false);
        let code = run_interpret("print 1 + 2;", &mut reporter);
        assert_eq!(code, 0);
    }

    #[test]
    fn interpret_skips_execution_when_parse_failed() {
        let mut reporter = ErrorReporter::new(false);
        let code = run_interpret("var x = ;", &mut reporter);
        assert_eq!(code, error::EXIT_PARSE_ERROR);
    }

    #[test]
    fn interpret_of_fatal_runtime_error_exits_nonzero() {
        let mut reporter = ErrorReporter::new(false);
        let code = run_interpret("if (\"x\") { print 1; }", &mut reporter);
        assert_eq!(code, error::EXIT_RUNTIME_ERROR);
    }
}
