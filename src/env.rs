// ABOUTME: Lexical scope chain - ordered bindings per scope, parent-chain lookup, closure capture

use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(0);

/// A node in the scope chain. Bindings are insertion-ordered (not a
/// `HashMap`) because `insert`'s "append new, overwrite existing in place"
/// behavior and instance property order are both observable per the
/// language's semantics. `id` is assigned once per scope and used only for
/// diagnostics and the `Function[<scope-id>](...)` print format.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<Vec<(String, Value)>>,
    parent: Option<Rc<Environment>>,
    id: u64,
}

impl Environment {
    /// Creates the global environment with no parent.
    pub fn global() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(Vec::new()),
            parent: None,
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Creates a new child scope of `parent`.
    pub fn child(parent: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(Vec::new()),
            parent: Some(Rc::clone(parent)),
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn parent(&self) -> Option<&Rc<Environment>> {
        self.parent.as_ref()
    }

    /// Binds `name` in *this* scope only: a fresh `var` declaration appends
    /// a new slot, and redeclaring an existing name in the same scope
    /// overwrites the value already at that slot rather than pushing a
    /// second one. This never touches a parent scope, which is exactly what
    /// makes `{ var x = 2; }` shadow an outer `x` instead of mutating it.
    pub fn insert(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut bindings = self.bindings.borrow_mut();
        if let Some(slot) = bindings.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            bindings.push((name, value));
        }
    }

    /// Walks this scope then its parents, returning a copy of the first
    /// binding found.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some((_, v)) = self.bindings.borrow().iter().find(|(n, _)| n == name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// Assigns to an *already-declared* variable, walking the whole parent
    /// chain to find it (unlike `insert`, which only ever touches this
    /// scope). Returns `false` if no scope in the chain has declared `name`,
    /// which the evaluator turns into an "assign to undeclared variable"
    /// runtime error.
    pub fn replace(&self, name: &str, value: Value) -> bool {
        {
            let mut bindings = self.bindings.borrow_mut();
            if let Some(slot) = bindings.iter_mut().find(|(n, _)| n == name) {
                slot.1 = value;
                return true;
            }
        }
        match &self.parent {
            Some(parent) => parent.replace(name, value),
            None => false,
        }
    }
}
