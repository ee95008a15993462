// ABOUTME: Error taxa and the line-tagged diagnostic reporter shared by lexer, parser, and evaluator

use crate::token::{Token, TokenKind};
use std::fmt;
use thiserror::Error;

/// Exit code for a lexical error (unterminated string, unexpected character).
pub const EXIT_LEX_ERROR: i32 = 65;
/// Exit code for a parse failure (panic-mode recovery ran off the end of input).
pub const EXIT_PARSE_ERROR: i32 = 66;
/// Exit code for a runtime abort severe enough to halt the whole program
/// (e.g. a loop/if condition that cannot convert to a bool).
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// The three diagnostic categories. Each is printed with a different
/// `[Kind]` prefix; which one fires decides the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Syntax,
    Static,
    Runtime,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Syntax => "Syntax Error",
            Severity::Static => "Static Error",
            Severity::Runtime => "Runtime Error",
        };
        write!(f, "{s}")
    }
}

/// Structured runtime failures, used internally by the evaluator so callers
/// can match on the kind instead of parsing strings. The reporter is what
/// actually prints these to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("Variable must be declared with the 'var' keyword first")]
    AssignToUndeclared,

    #[error("operand is not convertible to {0}")]
    NotConvertible(&'static str),

    #[error("expected {expected} argument(s), got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("expression does not evaluate to a callable")]
    NotCallable,

    #[error("only instances have properties")]
    NotAnInstance,

    #[error("undefined property '{0}'")]
    UndefinedProperty(String),

    #[error("return statement must be used inside a function body")]
    ReturnOutsideFunction,

    #[error("if/while condition does not evaluate to a bool")]
    ConditionNotBool,
}

impl RuntimeError {
    /// Whether this error halts the whole run rather than just the
    /// enclosing statement.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::ConditionNotBool)
    }
}

/// Accumulates diagnostics and decides the process exit code. One instance
/// is threaded through lexing, parsing, and evaluation for a single run.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    had_lex_error: bool,
    had_parse_error: bool,
    had_fatal_runtime_error: bool,
    report_scopes: bool,
}

impl ErrorReporter {
    pub fn new(report_scopes: bool) -> Self {
        ErrorReporter {
            report_scopes,
            ..Default::default()
        }
    }

    pub fn report_scopes_enabled(&self) -> bool {
        self.report_scopes
    }

    /// Report a diagnostic tied to a specific line with no token available
    /// yet (used by the lexer, before a `Token` exists for the offender).
    pub fn error_at_line(&mut self, severity: Severity, line: usize, message: impl fmt::Display) {
        self.mark(severity);
        eprintln!("[{severity}] Line {line}: {message}");
    }

    /// Report a diagnostic tied to a token. String tokens print their
    /// lexeme without quotes; everything else gets quoted. EOF reports the
    /// line before its own, since EOF's line is one past the last source line.
    pub fn error_at_token(&mut self, severity: Severity, token: &Token, message: impl fmt::Display) {
        self.mark(severity);
        match token.kind {
            TokenKind::Eof => {
                eprintln!("[{severity}] Line {}: {message}", token.line.saturating_sub(1));
            }
            TokenKind::String => {
                eprintln!("[{severity}] Line {}: {} - {message}", token.line, token.lexeme);
            }
            _ => {
                eprintln!("[{severity}] Line {}: \"{}\" - {message}", token.line, token.lexeme);
            }
        }
    }

    /// Report a diagnostic with no location context at all.
    pub fn error_bare(&mut self, severity: Severity, message: impl fmt::Display) {
        self.mark(severity);
        eprintln!("[{severity}] {message}");
    }

    fn mark(&mut self, severity: Severity) {
        match severity {
            Severity::Syntax | Severity::Static => self.had_parse_error = true,
            Severity::Runtime => {}
        }
    }

    pub fn mark_lex_error(&mut self) {
        self.had_lex_error = true;
    }

    pub fn mark_fatal_runtime_error(&mut self) {
        self.had_fatal_runtime_error = true;
    }

    pub fn had_lex_error(&self) -> bool {
        self.had_lex_error
    }

    pub fn had_parse_error(&self) -> bool {
        self.had_parse_error
    }

    pub fn had_fatal_runtime_error(&self) -> bool {
        self.had_fatal_runtime_error
    }

    /// Process exit code implied by everything reported so far, in
    /// priority order: lexical, then parse, then runtime.
    pub fn exit_code(&self) -> i32 {
        if self.had_lex_error {
            EXIT_LEX_ERROR
        } else if self.had_parse_error {
            EXIT_PARSE_ERROR
        } else if self.had_fatal_runtime_error {
            EXIT_RUNTIME_ERROR
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Literal;

    #[test]
    fn exit_code_priority_is_lex_then_parse_then_runtime() {
        let mut r = ErrorReporter::new(false);
        r.mark_fatal_runtime_error();
        assert_eq!(r.exit_code(), EXIT_RUNTIME_ERROR);

        r.mark(Severity::Syntax);
        assert_eq!(r.exit_code(), EXIT_PARSE_ERROR);

        r.mark_lex_error();
        assert_eq!(r.exit_code(), EXIT_LEX_ERROR);
    }

    #[test]
    fn string_token_error_does_not_panic() {
        let mut r = ErrorReporter::new(false);
        let mut t = Token::new(TokenKind::String, "hello", 3);
        t.literal = Literal::Str("hello".into());
        r.error_at_token(Severity::Runtime, &t, "boom");
        assert!(!r.had_parse_error());
    }

    #[test]
    fn runtime_error_fatality() {
        assert!(RuntimeError::ConditionNotBool.is_fatal());
        assert!(!RuntimeError::NotCallable.is_fatal());
    }
}
