// ABOUTME: Recursive-descent parser with precedence climbing and panic-mode error recovery

use crate::ast::{BinaryOp, Expr, LiteralValue, Stmt, UnaryOp};
use crate::error::{ErrorReporter, Severity};
use crate::token::{Keyword, Literal, Token, TokenKind};
use crate::value::Value;
use std::rc::Rc;

/// Function/method parameter and call-argument count ceiling.
const MAX_ARITY: usize = 127;

/// Marker error: the diagnostic has already been reported through the
/// shared `ErrorReporter`, so callers only need to know that parsing of the
/// current construct failed, not why.
#[derive(Debug)]
struct ParseError;

type PResult<T> = Result<T, ParseError>;

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    reporter: &'a mut ErrorReporter,
}

/// Lexes and parses are driven separately; this entry point consumes an
/// already-tokenized stream and returns the best-effort statement list.
/// Callers check `reporter.had_parse_error()` to decide whether the result
/// is usable, exactly like the original driver's `if (!parse(...))` check.
pub fn parse(tokens: Vec<Token>, reporter: &mut ErrorReporter) -> Vec<Stmt> {
    let mut parser = Parser { tokens, pos: 0, reporter };
    let mut stmts = Vec::new();
    while !parser.is_at_end() {
        match parser.declaration() {
            Ok(stmt) => stmts.push(stmt),
            Err(ParseError) => parser.synchronize(),
        }
    }
    stmts
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous().clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    fn match_one(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|k| self.check(*k)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_at(&mut self, token: &Token, severity: Severity, message: &str) {
        self.reporter.error_at_token(severity, token, message);
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek().clone();
            self.error_at(&token, Severity::Syntax, message);
            Err(ParseError)
        }
    }

    fn consume_identifier(&mut self, message: &str) -> PResult<Token> {
        self.consume(TokenKind::Identifier, message)
    }

    /// Panic-mode recovery: discard tokens until the one just consumed was
    /// a `;`, or the next one starts a declaration/statement keyword.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            let sync_keywords = [
                Keyword::Class,
                Keyword::Fun,
                Keyword::If,
                Keyword::Else,
                Keyword::For,
                Keyword::Var,
                Keyword::While,
                Keyword::Return,
            ];
            if sync_keywords.iter().any(|kw| self.check_keyword(*kw)) {
                return;
            }
            self.advance();
        }
    }

    // ---- declarations / statements ----

    fn declaration(&mut self) -> PResult<Stmt> {
        if self.match_keyword(Keyword::Class) {
            return self.class_decl();
        }
        if self.match_keyword(Keyword::Fun) {
            return self.fun_decl("function");
        }
        if self.match_keyword(Keyword::Var) {
            return self.var_decl();
        }
        self.statement()
    }

    fn class_decl(&mut self) -> PResult<Stmt> {
        let name = self.consume_identifier("Expect class name.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let method_name = self.consume_identifier("Expect method name.")?;
            let (params, body) = self.function_params_and_body("method")?;
            methods.push((method_name, params, body));
        }

        self.consume(TokenKind::RightBrace, "Expect '}' after class body.")?;
        Ok(Stmt::ClassDecl { name, methods })
    }

    fn fun_decl(&mut self, kind: &str) -> PResult<Stmt> {
        let name = self.consume_identifier(&format!("Expect {kind} name."))?;
        let (params, body) = self.function_params_and_body(kind)?;
        Ok(Stmt::FunDecl { name, params, body })
    }

    fn function_params_and_body(&mut self, kind: &str) -> PResult<(Vec<Token>, Rc<Vec<Stmt>>)> {
        self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name."))?;
        let params = self.parameter_list()?;
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;
        Ok((params, Rc::new(body)))
    }

    fn parameter_list(&mut self) -> PResult<Vec<Token>> {
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    let token = self.peek().clone();
                    self.error_at(&token, Severity::Static, "Can't have more than 127 parameters.");
                }
                params.push(self.consume_identifier("Expect parameter name.")?);
                if !self.match_one(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        Ok(params)
    }

    fn var_decl(&mut self) -> PResult<Stmt> {
        let name = self.consume_identifier("Expect variable name.")?;
        self.consume(TokenKind::Equal, "Expect '=' after variable name.")?;
        let initializer = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::VarDecl { name, initializer })
    }

    fn statement(&mut self) -> PResult<Stmt> {
        if self.match_keyword(Keyword::Print) {
            return self.print_stmt();
        }
        if self.match_keyword(Keyword::If) {
            return self.if_stmt();
        }
        if self.match_keyword(Keyword::While) {
            return self.while_stmt();
        }
        if self.match_keyword(Keyword::For) {
            return self.for_stmt();
        }
        if self.match_keyword(Keyword::Return) {
            return self.return_stmt();
        }
        if self.match_one(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expr_stmt()
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn print_stmt(&mut self) -> PResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn if_stmt(&mut self) -> PResult<Stmt> {
        let mut branches = Vec::new();

        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = self.statement()?;
        branches.push((Some(condition), Box::new(then_branch)));

        while self.match_keyword(Keyword::Else) {
            if self.match_keyword(Keyword::If) {
                self.consume(TokenKind::LeftParen, "Expect '(' after 'else if'.")?;
                let condition = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
                let body = self.statement()?;
                branches.push((Some(condition), Box::new(body)));
            } else {
                let body = self.statement()?;
                branches.push((None, Box::new(body)));
                break;
            }
        }

        Ok(Stmt::Conditional { branches })
    }

    fn while_stmt(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = self.statement()?;
        Ok(Stmt::While { condition, body: Box::new(body) })
    }

    /// Desugars `for (init; cond; step) body` into
    /// `{ init; while (cond) { body; step; } }`, exactly per spec.
    fn for_stmt(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_one(&[TokenKind::Semicolon]) {
            None
        } else if self.check_keyword(Keyword::Var) {
            self.advance();
            Some(self.var_decl()?)
        } else {
            Some(self.expr_stmt()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            self.expression()?
        } else {
            Expr::Static(Box::new(Value::Bool(true)))
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expr(increment)]);
        }

        body = Stmt::While { condition, body: Box::new(body) };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn return_stmt(&mut self) -> PResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn expr_stmt(&mut self) -> PResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expr(expr))
    }

    // ---- expressions, lowest to highest precedence ----

    fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let expr = self.or_expr()?;

        if self.match_one(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(name) => Ok(Expr::Assignment { name, value: Box::new(value) }),
                Expr::Get { object, name } => Ok(Expr::Set { object, name, value: Box::new(value) }),
                _ => {
                    self.error_at(&equals, Severity::Syntax, "Invalid assignment target.");
                    Err(ParseError)
                }
            };
        }

        Ok(expr)
    }

    fn or_expr(&mut self) -> PResult<Expr> {
        let mut expr = self.and_expr()?;
        while self.check_keyword(Keyword::Or) {
            let op_token = self.advance();
            let right = self.and_expr()?;
            expr = Expr::Binary { left: Box::new(expr), op: BinaryOp::Or, op_token, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> PResult<Expr> {
        let mut expr = self.equality()?;
        while self.check_keyword(Keyword::And) {
            let op_token = self.advance();
            let right = self.equality()?;
            expr = Expr::Binary { left: Box::new(expr), op: BinaryOp::And, op_token, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut expr = self.comparison()?;
        loop {
            let op = if self.check(TokenKind::EqualEqual) {
                BinaryOp::Equal
            } else if self.check(TokenKind::BangEqual) {
                BinaryOp::NotEqual
            } else {
                break;
            };
            let op_token = self.advance();
            let right = self.comparison()?;
            expr = Expr::Binary { left: Box::new(expr), op, op_token, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut expr = self.term()?;
        loop {
            let op = if self.check(TokenKind::Greater) {
                BinaryOp::Greater
            } else if self.check(TokenKind::GreaterEqual) {
                BinaryOp::GreaterEqual
            } else if self.check(TokenKind::Less) {
                BinaryOp::Less
            } else if self.check(TokenKind::LessEqual) {
                BinaryOp::LessEqual
            } else {
                break;
            };
            let op_token = self.advance();
            let right = self.term()?;
            expr = Expr::Binary { left: Box::new(expr), op, op_token, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut expr = self.factor()?;
        loop {
            let op = if self.check(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.check(TokenKind::Minus) {
                BinaryOp::Subtract
            } else {
                break;
            };
            let op_token = self.advance();
            let right = self.factor()?;
            expr = Expr::Binary { left: Box::new(expr), op, op_token, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> PResult<Expr> {
        let mut expr = self.unary()?;
        loop {
            let op = if self.check(TokenKind::Star) {
                BinaryOp::Multiply
            } else if self.check(TokenKind::Slash) {
                BinaryOp::Divide
            } else {
                break;
            };
            let op_token = self.advance();
            let right = self.unary()?;
            expr = Expr::Binary { left: Box::new(expr), op, op_token, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.check(TokenKind::Bang) || self.check(TokenKind::Minus) {
            let op_token = self.advance();
            let op = if op_token.kind == TokenKind::Bang { UnaryOp::Not } else { UnaryOp::Negate };
            let operand = self.unary()?;
            return Ok(Expr::Unary { op, op_token, operand: Box::new(operand) });
        }
        self.call()
    }

    fn call(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.match_one(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_one(&[TokenKind::Dot]) {
                let name = self.consume_identifier("Expect property name after '.'.")?;
                expr = Expr::Get { object: Box::new(expr), name };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> PResult<Expr> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARITY {
                    let token = self.peek().clone();
                    self.error_at(&token, Severity::Static, "Can't have more than 127 arguments.");
                }
                args.push(self.expression()?);
                if !self.match_one(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call { callee: Box::new(callee), paren, args })
    }

    fn primary(&mut self) -> PResult<Expr> {
        if self.match_keyword(Keyword::False) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }
        if self.match_keyword(Keyword::True) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }
        if self.match_keyword(Keyword::Nil) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }
        if self.match_keyword(Keyword::Fun) {
            return self.anon_function();
        }
        if self.check(TokenKind::Number) {
            let token = self.advance();
            match token.literal {
                Literal::Number(n) => return Ok(Expr::Literal(LiteralValue::Number(n))),
                _ => unreachable!("lexer always attaches a NumberLiteral to a Number token"),
            }
        }
        if self.check(TokenKind::String) {
            let token = self.advance();
            match token.literal {
                Literal::Str(s) => return Ok(Expr::Literal(LiteralValue::Str(s))),
                _ => unreachable!("lexer always attaches a Str literal to a String token"),
            }
        }
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            return Ok(Expr::Variable(token));
        }
        if self.match_one(&[TokenKind::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Group(Box::new(expr)));
        }

        if self.is_binary_operator() {
            let token = self.peek().clone();
            self.error_at(&token, Severity::Syntax, "Missing left operand.");
            return Err(ParseError);
        }

        let token = self.peek().clone();
        self.error_at(&token, Severity::Syntax, "Expect expression.");
        Err(ParseError)
    }

    fn is_binary_operator(&self) -> bool {
        const BINARY_KINDS: &[TokenKind] = &[
            TokenKind::Plus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::EqualEqual,
            TokenKind::BangEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ];
        BINARY_KINDS.iter().any(|k| self.check(*k)) || self.check_keyword(Keyword::And) || self.check_keyword(Keyword::Or)
    }

    fn anon_function(&mut self) -> PResult<Expr> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'fun'.")?;
        let params = self.parameter_list()?;
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block()?;
        Ok(Expr::AnonFunction { params, body: Rc::new(body) })
    }
}
