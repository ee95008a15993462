// ABOUTME: Converts a source string into a token stream, reporting lexical errors as it goes

use crate::error::{ErrorReporter, Severity};
use crate::token::{Keyword, Literal, NumberLiteral, Token, TokenKind};
use std::rc::Rc;

/// Two-character fixed tokens are matched before their one-character
/// prefixes so that e.g. `==` never lexes as `=` followed by `=`.
const TWO_CHAR_TOKENS: &[(char, char, TokenKind)] = &[
    ('=', '=', TokenKind::EqualEqual),
    ('!', '=', TokenKind::BangEqual),
    ('>', '=', TokenKind::GreaterEqual),
    ('<', '=', TokenKind::LessEqual),
];

const ONE_CHAR_TOKENS: &[(char, TokenKind)] = &[
    ('(', TokenKind::LeftParen),
    (')', TokenKind::RightParen),
    ('{', TokenKind::LeftBrace),
    ('}', TokenKind::RightBrace),
    ('.', TokenKind::Dot),
    (',', TokenKind::Comma),
    ('*', TokenKind::Star),
    ('+', TokenKind::Plus),
    ('-', TokenKind::Minus),
    (';', TokenKind::Semicolon),
    ('/', TokenKind::Slash),
    ('=', TokenKind::Equal),
    ('!', TokenKind::Bang),
    ('>', TokenKind::Greater),
    ('<', TokenKind::Less),
];

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    start: usize,
    line: usize,
    reporter: &'a mut ErrorReporter,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, reporter: &'a mut ErrorReporter) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
            reporter,
            tokens: Vec::new(),
        }
    }

    /// Scans the whole source, yielding a token stream terminated by `Eof`.
    /// Unrecognised characters and unterminated strings are reported but do
    /// not stop the scan, matching the original tokenizer's behaviour of
    /// accumulating the first non-zero error code while still walking the
    /// rest of the file.
    pub fn scan(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.pos;
            self.scan_token();
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", self.line));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        c
    }

    fn lexeme(&self) -> String {
        self.chars[self.start..self.pos].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.lexeme(), self.line));
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Literal) {
        let mut token = Token::new(kind, self.lexeme(), self.line);
        token.literal = literal;
        self.tokens.push(token);
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            ' ' | '\t' | '\r' => {}
            '\n' => self.line += 1,
            '"' => self.scan_string(),
            _ if c.is_ascii_digit() => self.scan_number(),
            _ if c == '_' || c.is_alphabetic() => self.scan_identifier(),
            _ => self.scan_fixed_token(c),
        }
    }

    fn scan_fixed_token(&mut self, c: char) {
        if let Some(&(_, _, kind)) = TWO_CHAR_TOKENS
            .iter()
            .find(|(first, second, _)| *first == c && self.peek() == Some(*second))
        {
            self.advance();
            self.add_token(kind);
            return;
        }

        if c == '/' && self.peek() == Some('/') {
            while self.peek().is_some_and(|c| c != '\n') {
                self.advance();
            }
            return;
        }

        if let Some(&(_, kind)) = ONE_CHAR_TOKENS.iter().find(|(ch, _)| *ch == c) {
            self.add_token(kind);
            return;
        }

        self.reporter.mark_lex_error();
        self.reporter.error_at_line(
            Severity::Syntax,
            self.line,
            format!("Unexpected character: {c}"),
        );
    }

    fn scan_string(&mut self) {
        let start_line = self.line;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.reporter.mark_lex_error();
            self.reporter
                .error_at_line(Severity::Syntax, start_line, "Unterminated string.");
            return;
        }

        let content: String = self.chars[self.start + 1..self.pos].iter().collect();
        self.advance(); // closing quote
        self.add_literal_token(TokenKind::String, Literal::Str(Rc::from(content.as_str())));
    }

    fn scan_number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let whole_str: String = self.chars[self.start..self.pos].iter().collect();
        let whole: u64 = whole_str.parse().unwrap_or(u64::MAX);

        let mut decimal_str = String::new();
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            decimal_str = self.chars[digits_start..self.pos]
                .iter()
                .collect::<String>()
                .trim_end_matches('0')
                .to_string();
        }

        let decimal: u64 = if decimal_str.is_empty() {
            0
        } else {
            decimal_str.parse().unwrap_or(0)
        };

        self.add_literal_token(TokenKind::Number, Literal::Number(NumberLiteral { whole, decimal }));
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
            self.advance();
        }

        let text = self.lexeme();
        match Keyword::lookup(&text) {
            Some(kw) => self.add_literal_token(TokenKind::Keyword, Literal::Keyword(kw)),
            None => self.add_token(TokenKind::Identifier),
        }
    }
}

/// Convenience entry point: lex `source` start to finish against a fresh
/// reporter state, returning the token stream regardless of errors (callers
/// check `reporter.had_lex_error()` to decide whether to proceed).
pub fn tokenize(source: &str, reporter: &mut ErrorReporter) -> Vec<Token> {
    Lexer::new(source, reporter).scan()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_ok(source: &str) -> Vec<Token> {
        let mut reporter = ErrorReporter::new(false);
        let tokens = tokenize(source, &mut reporter);
        assert!(!reporter.had_lex_error(), "unexpected lex error for {source:?}");
        tokens
    }

    #[test]
    fn scans_fixed_tokens_preferring_two_char_forms() {
        let tokens = scan_ok("== != <= >= < > = ! . , * + - ; / ( ) { }");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Equal,
                TokenKind::Bang,
                TokenKind::Dot,
                TokenKind::Comma,
                TokenKind::Star,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Semicolon,
                TokenKind::Slash,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        let tokens = scan_ok("1 // two\n2");
        assert_eq!(tokens.len(), 3); // 1, 2, Eof
    }

    #[test]
    fn scans_number_with_trailing_zero_stripped() {
        let tokens = scan_ok("3.140");
        match &tokens[0].literal {
            Literal::Number(n) => assert_eq!(*n, NumberLiteral { whole: 3, decimal: 14 }),
            other => panic!("expected number literal, got {other:?}"),
        }
    }

    #[test]
    fn dot_without_following_digit_is_not_part_of_number() {
        let tokens = scan_ok("1.");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }

    #[test]
    fn scans_keyword_vs_identifier() {
        let tokens = scan_ok("while whilee");
        assert!(tokens[0].is_keyword(Keyword::While));
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn unterminated_string_reports_lex_error() {
        let mut reporter = ErrorReporter::new(false);
        let tokens = tokenize("\"abc", &mut reporter);
        assert!(reporter.had_lex_error());
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn string_literal_captures_content_without_quotes() {
        let tokens = scan_ok("\"hi there\"");
        match &tokens[0].literal {
            Literal::Str(s) => assert_eq!(&**s, "hi there"),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn unexpected_character_is_reported_but_scan_continues() {
        let mut reporter = ErrorReporter::new(false);
        let tokens = tokenize("@ 1", &mut reporter);
        assert!(reporter.had_lex_error());
        assert_eq!(tokens[0].kind, TokenKind::Number);
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let tokens = scan_ok("1\n2\n3");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 3);
    }
}
