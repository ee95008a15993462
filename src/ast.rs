// ABOUTME: Expression and statement tree produced by the parser and walked by the evaluator

use crate::token::{NumberLiteral, Token};
use crate::value::Value;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(NumberLiteral),
    Str(Rc<str>),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),
    /// A parenthesised sub-expression; kept distinct from its inner
    /// expression so the printer can reproduce `(group ...)`.
    Group(Box<Expr>),
    Unary { op: UnaryOp, op_token: Token, operand: Box<Expr> },
    Binary { left: Box<Expr>, op: BinaryOp, op_token: Token, right: Box<Expr> },
    /// A bare identifier reference, resolved against the environment chain
    /// at evaluation time.
    Variable(Token),
    Call { callee: Box<Expr>, paren: Token, args: Vec<Expr> },
    Get { object: Box<Expr>, name: Token },
    Set { object: Box<Expr>, name: Token, value: Box<Expr> },
    Assignment { name: Token, value: Box<Expr> },
    AnonFunction { params: Vec<Token>, body: Rc<Vec<Stmt>> },
    /// A value synthesized by the parser itself rather than parsed from
    /// source text — used for the implicit `true` condition of a bare
    /// `for (;;)` loop.
    Static(Box<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Print(Expr),
    VarDecl { name: Token, initializer: Expr },
    FunDecl { name: Token, params: Vec<Token>, body: Rc<Vec<Stmt>> },
    ClassDecl { name: Token, methods: Vec<(Token, Vec<Token>, Rc<Vec<Stmt>>)> },
    Block(Vec<Stmt>),
    /// A non-empty ordered list of `(condition, body)` branches; a branch
    /// with `condition: None` is the trailing `else` and must be last.
    Conditional { branches: Vec<(Option<Expr>, Box<Stmt>)> },
    While { condition: Expr, body: Box<Stmt> },
    Return { keyword: Token, value: Option<Expr> },
}

/// Renders an expression as a parenthesised prefix form, in the classic
/// tree-walking-interpreter style (`(+ 1 (* 2 3))`), used by the `parse`
/// CLI subcommand to pretty-print the statement tree.
pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(LiteralValue::Number(n)) => format!("{}", n.to_f64()),
        Expr::Literal(LiteralValue::Str(s)) => format!("\"{s}\""),
        Expr::Literal(LiteralValue::Bool(b)) => b.to_string(),
        Expr::Literal(LiteralValue::Nil) => "nil".to_string(),
        Expr::Group(inner) => format!("(group {})", print_expr(inner)),
        Expr::Unary { op_token, operand, .. } => format!("({} {})", op_token.lexeme, print_expr(operand)),
        Expr::Binary { left, op_token, right, .. } => {
            format!("({} {} {})", op_token.lexeme, print_expr(left), print_expr(right))
        }
        Expr::Variable(name) => name.lexeme.to_string(),
        Expr::Call { callee, args, .. } => {
            let rendered_args: Vec<String> = args.iter().map(print_expr).collect();
            format!("(call {} {})", print_expr(callee), rendered_args.join(" "))
        }
        Expr::Get { object, name } => format!("(get {} {})", print_expr(object), name.lexeme),
        Expr::Set { object, name, value } => {
            format!("(set {} {} {})", print_expr(object), name.lexeme, print_expr(value))
        }
        Expr::Assignment { name, value } => format!("(= {} {})", name.lexeme, print_expr(value)),
        Expr::AnonFunction { params, .. } => {
            let names: Vec<&str> = params.iter().map(|p| p.lexeme.as_ref()).collect();
            format!("(fun ({}) ...)", names.join(" "))
        }
        Expr::Static(value) => format!("(static {value})"),
    }
}

/// Renders a statement the same way, one line per statement, with nested
/// blocks indented by recursive `(block ...)` grouping.
pub fn print_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expr(e) => format!("({})", print_expr(e)),
        Stmt::Print(e) => format!("(print {})", print_expr(e)),
        Stmt::VarDecl { name, initializer } => format!("(var {} {})", name.lexeme, print_expr(initializer)),
        Stmt::FunDecl { name, params, body } => {
            let names: Vec<&str> = params.iter().map(|p| p.lexeme.as_ref()).collect();
            let rendered_body: Vec<String> = body.iter().map(print_stmt).collect();
            format!("(fun {} ({}) {})", name.lexeme, names.join(" "), rendered_body.join(" "))
        }
        Stmt::ClassDecl { name, methods } => {
            let rendered: Vec<String> = methods
                .iter()
                .map(|(mname, params, body)| {
                    let names: Vec<&str> = params.iter().map(|p| p.lexeme.as_ref()).collect();
                    let rendered_body: Vec<String> = body.iter().map(print_stmt).collect();
                    format!("(method {} ({}) {})", mname.lexeme, names.join(" "), rendered_body.join(" "))
                })
                .collect();
            format!("(class {} {})", name.lexeme, rendered.join(" "))
        }
        Stmt::Block(stmts) => {
            let rendered: Vec<String> = stmts.iter().map(print_stmt).collect();
            format!("(block {})", rendered.join(" "))
        }
        Stmt::Conditional { branches } => {
            let rendered: Vec<String> = branches
                .iter()
                .map(|(cond, body)| match cond {
                    Some(c) => format!("({} {})", print_expr(c), print_stmt(body)),
                    None => format!("(else {})", print_stmt(body)),
                })
                .collect();
            format!("(if {})", rendered.join(" "))
        }
        Stmt::While { condition, body } => format!("(while {} {})", print_expr(condition), print_stmt(body)),
        Stmt::Return { value, .. } => match value {
            Some(v) => format!("(return {})", print_expr(v)),
            None => "(return)".to_string(),
        },
    }
}
