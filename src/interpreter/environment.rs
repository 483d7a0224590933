// File: src/interpreter/environment.rs
//
// Scoping environment for variable management in the Soutk interpreter.
// Implements a stack of scopes where inner scopes shadow outer scopes.

use super::value::Value;
use ahash::AHashMap;

/// Variable storage using a scope stack.
///
/// The Environment maintains a stack of scopes (Vec<AHashMap>). When looking
/// up a variable, we search from the innermost scope (end of Vec) outward.
/// Function and method calls push a fresh scope and pop it on return, which
/// gives Soutk its dynamic-scoping-like call convention: a callee can read
/// the caller's bindings but its own bindings vanish with the call.
#[derive(Clone, Debug)]
pub struct Environment {
    pub scopes: Vec<AHashMap<String, Value>>,
}

impl Environment {
    /// Create a new environment with a single global scope
    pub fn new() -> Self {
        Environment { scopes: vec![AHashMap::new()] }
    }

    /// Push a new scope onto the stack (e.g., entering a function)
    pub fn push_scope(&mut self) {
        self.scopes.push(AHashMap::new());
    }

    /// Pop the innermost scope from the stack (e.g., exiting a function)
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Get a variable from the environment, searching from inner to outer scopes
    /// Returns a cloned value if found
    pub fn get(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        None
    }

    /// Define a new variable in the current (innermost) scope
    pub fn define(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, value);
        }
    }

    /// Set an existing variable, searching from inner to outer scopes
    /// If not found, creates it in the current scope
    pub fn set(&mut self, name: String, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.contains_key(&name) {
                scope.insert(name, value);
                return;
            }
        }
        self.define(name, value);
    }

    /// Every name visible from the current scope, for "did you mean"
    /// suggestions.
    pub fn visible_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().rev().flat_map(|scope| scope.keys().map(|k| k.as_str()))
    }

    /// The outermost (global) scope, cloned. The module loader snapshots this
    /// as a module's exported variable table.
    pub fn globals(&self) -> AHashMap<String, Value> {
        self.scopes.first().cloned().unwrap_or_default()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
