// File: src/interpreter/control_flow.rs
//
// Control flow signals for loop statements and early returns.
//
// Statement execution returns a Signal instead of unwinding: a block stops
// at the first non-Normal signal and hands it to its caller, where the
// nearest enclosing loop interprets Break/Continue and the nearest function
// call interprets Return. A signal that escapes its valid context becomes a
// runtime error at the boundary that sees it.

use super::value::Value;

/// The result of executing a statement or a statement sequence.
#[derive(Debug, Clone)]
pub enum Signal {
    /// Normal completion, continue with the next statement
    Normal,
    /// Break statement encountered, exit the innermost loop
    Break,
    /// Continue statement encountered, skip to the next loop iteration
    Continue,
    /// Return statement encountered, with the value being returned
    Return(Value),
}

impl Signal {
    /// Short source-level name, used when a signal escapes its context.
    pub fn keyword(&self) -> &'static str {
        match self {
            Signal::Normal => "normal",
            Signal::Break => "break",
            Signal::Continue => "continue",
            Signal::Return(_) => "return",
        }
    }
}
