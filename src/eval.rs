// ABOUTME: Tree-walking evaluator - executes the statement list against a chain of scopes

use crate::ast::{BinaryOp, Expr, LiteralValue, Stmt, UnaryOp};
use crate::env::Environment;
use crate::error::{ErrorReporter, RuntimeError, Severity};
use crate::token::Token;
use crate::value::{Class, Function, Instance, Value};
use std::rc::Rc;

/// The pending-return register described by the spec: armed while inside a
/// user function body, carrying the value of the most recent `return`
/// until the enclosing `Block`/`While` unwinds to the call site.
struct PendingReturn {
    armed: bool,
    value: Option<Value>,
}

pub struct Interpreter<'a> {
    #[allow(dead_code)]
    global: Rc<Environment>,
    current: Rc<Environment>,
    pending_return: PendingReturn,
    reporter: &'a mut ErrorReporter,
}

/// Convenience entry point used by `main.rs`'s `interpret` subcommand.
pub fn interpret(program: &[Stmt], reporter: &mut ErrorReporter) {
    Interpreter::new(reporter).run(program);
}

impl<'a> Interpreter<'a> {
    pub fn new(reporter: &'a mut ErrorReporter) -> Self {
        let global = Environment::global();
        Interpreter {
            current: Rc::clone(&global),
            global,
            pending_return: PendingReturn { armed: false, value: None },
            reporter,
        }
    }

    pub fn run(&mut self, program: &[Stmt]) {
        for stmt in program {
            self.exec_stmt(stmt);
            if self.reporter.had_fatal_runtime_error() {
                break;
            }
        }
    }

    fn report_scope_change(&self, action: &str) {
        if self.reporter.report_scopes_enabled() {
            let parent = self.current.parent().map(|p| p.id());
            eprintln!("[scope] {action} {} (parent {parent:?})", self.current.id());
        }
    }

    // ---- statements ----

    fn exec_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval_expr(expr);
            }
            Stmt::Print(expr) => {
                let value = self.eval_expr(expr);
                println!("{value}");
            }
            Stmt::VarDecl { name, initializer } => {
                let value = self.eval_expr(initializer);
                self.current.insert(name.lexeme.to_string(), value);
            }
            Stmt::FunDecl { name, params, body } => {
                let function = Value::Function(Rc::new(Function {
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: Rc::clone(&self.current),
                }));
                self.current.insert(name.lexeme.to_string(), function);
            }
            Stmt::ClassDecl { name, methods } => {
                let class = self.build_class(name, methods);
                self.current.insert(name.lexeme.to_string(), class);
            }
            Stmt::Block(stmts) => self.exec_block(stmts),
            Stmt::Conditional { branches } => self.exec_conditional(branches),
            Stmt::While { condition, body } => self.exec_while(condition, body),
            Stmt::Return { keyword, value } => self.exec_return(keyword, value.as_ref()),
        }
    }

    /// Builds a class's method table: the first declaration of a name fixes
    /// its position, a later redeclaration overwrites the value already at
    /// that position. A forward linear scan (`Class::find_method`) then
    /// finds the name at its first position holding the last-declared body
    /// — satisfying "first wins" on position and "last wins" on value.
    fn build_class(&self, name: &Token, methods: &[(Token, Vec<Token>, Rc<Vec<Stmt>>)]) -> Value {
        let mut table: Vec<(Rc<str>, Rc<Function>)> = Vec::new();
        for (method_name, params, body) in methods {
            let function = Rc::new(Function {
                params: params.clone(),
                body: Rc::clone(body),
                closure: Rc::clone(&self.current),
            });
            match table.iter_mut().find(|(n, _)| **n == *method_name.lexeme) {
                Some(slot) => slot.1 = function,
                None => table.push((Rc::clone(&method_name.lexeme), function)),
            }
        }
        Value::Class(Rc::new(Class { name: Rc::clone(&name.lexeme), methods: table }))
    }

    fn exec_block(&mut self, stmts: &[Stmt]) {
        let saved = Rc::clone(&self.current);
        self.current = Environment::child(&saved);
        self.report_scope_change("push");
        self.exec_block_stmts(stmts);
        self.report_scope_change("pop");
        self.current = saved;
    }

    fn exec_block_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.exec_stmt(stmt);
            if self.pending_return.value.is_some() || self.reporter.had_fatal_runtime_error() {
                break;
            }
        }
    }

    fn exec_conditional(&mut self, branches: &[(Option<Expr>, Box<Stmt>)]) {
        for (condition, body) in branches {
            let matched = match condition {
                Some(cond) => match self.eval_condition(cond) {
                    Some(b) => b,
                    None => return,
                },
                None => true,
            };
            if matched {
                self.exec_stmt(body);
                return;
            }
        }
    }

    fn exec_while(&mut self, condition: &Expr, body: &Stmt) {
        loop {
            match self.eval_condition(condition) {
                Some(true) => {}
                Some(false) => break,
                None => return,
            }
            self.exec_stmt(body);
            if self.pending_return.value.is_some() || self.reporter.had_fatal_runtime_error() {
                break;
            }
        }
    }

    /// Evaluates a condition and converts it to `Bool`. A conversion
    /// failure is fatal to the whole run, per spec: an if/while condition
    /// that doesn't convert halts the program, unlike ordinary runtime
    /// errors which only abort the enclosing statement.
    fn eval_condition(&mut self, condition: &Expr) -> Option<bool> {
        let value = self.eval_expr(condition);
        match value.to_bool() {
            Some(b) => Some(b),
            None => {
                self.fail_at(primary_token(condition), RuntimeError::ConditionNotBool);
                None
            }
        }
    }

    fn exec_return(&mut self, keyword: &Token, value: Option<&Expr>) {
        if !self.pending_return.armed {
            self.fail_expr(keyword, RuntimeError::ReturnOutsideFunction);
            return;
        }
        let result = match value {
            Some(expr) => self.eval_expr(expr),
            None => Value::Nil,
        };
        self.pending_return.value = Some(result);
    }

    // ---- expressions ----

    fn eval_expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Literal(lit) => match lit {
                LiteralValue::Number(n) => Value::Double(n.to_f64()),
                LiteralValue::Str(s) => Value::String(Rc::clone(s)),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            },
            Expr::Group(inner) => self.eval_expr(inner),
            Expr::Unary { op, op_token, operand } => self.eval_unary(*op, op_token, operand),
            Expr::Binary { left, op, op_token, right } => self.eval_binary(left, *op, op_token, right),
            Expr::Variable(name) => match self.current.lookup(&name.lexeme) {
                Some(value) => value,
                None => self.fail_expr(name, RuntimeError::UndefinedVariable(name.lexeme.to_string())),
            },
            Expr::Call { callee, paren, args } => self.eval_call(callee, paren, args),
            Expr::Get { object, name } => self.eval_get(object, name),
            Expr::Set { object, name, value } => self.eval_set(object, name, value),
            Expr::Assignment { name, value } => {
                let evaluated = self.eval_expr(value);
                if self.current.replace(&name.lexeme, evaluated.clone()) {
                    evaluated
                } else {
                    self.fail_expr(name, RuntimeError::AssignToUndeclared)
                }
            }
            Expr::AnonFunction { params, body } => Value::Function(Rc::new(Function {
                params: params.clone(),
                body: Rc::clone(body),
                closure: Rc::clone(&self.current),
            })),
            Expr::Static(value) => (**value).clone(),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, op_token: &Token, operand: &Expr) -> Value {
        let value = self.eval_expr(operand);
        match op {
            UnaryOp::Negate => match value.to_double() {
                Some(d) => Value::Double(-d),
                None => self.fail_expr(op_token, RuntimeError::NotConvertible("Double")),
            },
            UnaryOp::Not => match value.to_bool() {
                Some(b) => Value::Bool(!b),
                None => self.fail_expr(op_token, RuntimeError::NotConvertible("Bool")),
            },
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: BinaryOp, op_token: &Token, right: &Expr) -> Value {
        match op {
            BinaryOp::And => {
                let left_val = self.eval_expr(left);
                match left_val.to_bool() {
                    Some(false) => Value::Bool(false),
                    Some(true) => self.eval_bool_operand(right, op_token),
                    None => self.fail_expr(op_token, RuntimeError::NotConvertible("Bool")),
                }
            }
            BinaryOp::Or => {
                let left_val = self.eval_expr(left);
                match left_val.to_bool() {
                    Some(true) => Value::Bool(true),
                    Some(false) => self.eval_bool_operand(right, op_token),
                    None => self.fail_expr(op_token, RuntimeError::NotConvertible("Bool")),
                }
            }
            _ => {
                let left_val = self.eval_expr(left);
                let right_val = self.eval_expr(right);
                let (Some(l), Some(r)) = (left_val.to_double(), right_val.to_double()) else {
                    return self.fail_expr(op_token, RuntimeError::NotConvertible("Double"));
                };
                match op {
                    BinaryOp::Add => Value::Double(l + r),
                    BinaryOp::Subtract => Value::Double(l - r),
                    BinaryOp::Multiply => Value::Double(l * r),
                    BinaryOp::Divide => Value::Double(if r == 0.0 { f64::NAN } else { l / r }),
                    BinaryOp::Equal => Value::Bool(l == r),
                    BinaryOp::NotEqual => Value::Bool(l != r),
                    BinaryOp::Greater => Value::Bool(l > r),
                    BinaryOp::GreaterEqual => Value::Bool(l >= r),
                    BinaryOp::Less => Value::Bool(l < r),
                    BinaryOp::LessEqual => Value::Bool(l <= r),
                    BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                }
            }
        }
    }

    fn eval_bool_operand(&mut self, expr: &Expr, op_token: &Token) -> Value {
        let value = self.eval_expr(expr);
        match value.to_bool() {
            Some(b) => Value::Bool(b),
            None => self.fail_expr(op_token, RuntimeError::NotConvertible("Bool")),
        }
    }

    fn eval_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> Value {
        let callee_val = self.eval_expr(callee);
        let arg_vals: Vec<Value> = args.iter().map(|a| self.eval_expr(a)).collect();

        match callee_val {
            Value::Class(class) => {
                if !arg_vals.is_empty() {
                    return self.fail_expr(
                        paren,
                        RuntimeError::ArityMismatch { expected: 0, actual: arg_vals.len() },
                    );
                }
                Value::Instance(Instance::new(class))
            }
            Value::Function(function) => self.call_function(&function, paren, arg_vals),
            _ => self.fail_expr(paren, RuntimeError::NotCallable),
        }
    }

    /// Swaps in the function's captured scope, binds parameters in a fresh
    /// call scope, arms the pending-return register, and executes the body.
    /// The enclosing frame's scope and pending-return state are restored on
    /// every exit path, matching the "save and re-arm on entry, restore on
    /// exit" contract.
    fn call_function(&mut self, function: &Rc<Function>, paren: &Token, args: Vec<Value>) -> Value {
        if args.len() != function.params.len() {
            return self.fail_expr(
                paren,
                RuntimeError::ArityMismatch { expected: function.params.len(), actual: args.len() },
            );
        }

        let saved_scope = Rc::clone(&self.current);
        let call_scope = Environment::child(&function.closure);
        for (param, arg) in function.params.iter().zip(args) {
            call_scope.insert(param.lexeme.to_string(), arg);
        }
        self.current = call_scope;
        self.report_scope_change("push");

        let saved_pending = std::mem::replace(&mut self.pending_return, PendingReturn { armed: true, value: None });

        self.exec_block_stmts(&function.body);

        let result = self.pending_return.value.take().unwrap_or(Value::Nil);
        self.pending_return = saved_pending;

        self.report_scope_change("pop");
        self.current = saved_scope;

        result
    }

    fn eval_get(&mut self, object: &Expr, name: &Token) -> Value {
        let object_val = self.eval_expr(object);
        match object_val {
            Value::Instance(instance) => {
                if let Some(value) = instance.get(&name.lexeme) {
                    return value;
                }
                if let Some(method) = instance.class.find_method(&name.lexeme) {
                    return self.bind_method(&method, &instance);
                }
                self.fail_expr(name, RuntimeError::UndefinedProperty(name.lexeme.to_string()))
            }
            _ => self.fail_expr(name, RuntimeError::NotAnInstance),
        }
    }

    /// Rebuilds a method as a `Function` whose captured scope is a fresh
    /// scope binding just `this`, layered on top of the method's original
    /// captured scope.
    fn bind_method(&self, method: &Rc<Function>, instance: &Rc<Instance>) -> Value {
        let bound_scope = Environment::child(&method.closure);
        bound_scope.insert("this", Value::Instance(Rc::clone(instance)));
        Value::Function(Rc::new(Function {
            params: method.params.clone(),
            body: Rc::clone(&method.body),
            closure: bound_scope,
        }))
    }

    fn eval_set(&mut self, object: &Expr, name: &Token, value_expr: &Expr) -> Value {
        let object_val = self.eval_expr(object);
        match object_val {
            Value::Instance(instance) => {
                let value = self.eval_expr(value_expr);
                instance.set(Rc::clone(&name.lexeme), value.clone());
                value
            }
            _ => self.fail_expr(name, RuntimeError::NotAnInstance),
        }
    }

    fn fail_expr(&mut self, token: &Token, err: RuntimeError) -> Value {
        self.fail_at(Some(token), err);
        Value::Error
    }

    fn fail_at(&mut self, token: Option<&Token>, err: RuntimeError) {
        match token {
            Some(token) => self.reporter.error_at_token(Severity::Runtime, token, &err),
            None => self.reporter.error_bare(Severity::Runtime, &err),
        }
        if err.is_fatal() {
            self.reporter.mark_fatal_runtime_error();
        }
    }
}

/// Best-effort token to anchor a runtime diagnostic to a source line when
/// the failing expression itself carries no obvious operator/name token.
fn primary_token(expr: &Expr) -> Option<&Token> {
    match expr {
        Expr::Literal(_) | Expr::Static(_) | Expr::AnonFunction { .. } => None,
        Expr::Group(inner) => primary_token(inner),
        Expr::Unary { op_token, .. } => Some(op_token),
        Expr::Binary { op_token, .. } => Some(op_token),
        Expr::Variable(token) => Some(token),
        Expr::Call { paren, .. } => Some(paren),
        Expr::Get { name, .. } | Expr::Set { name, .. } | Expr::Assignment { name, .. } => Some(name),
    }
}
