// File: src/interpreter/native_functions/mod.rs
//
// Module organization for native (built-in) function implementations,
// split into category-based modules.
//
// Free functions (`sqrt(x)`, `listen(..)`, `len(..)`) go through `handle`
// chains that return Some when the name is recognized. Method dispatch on a
// receiver value (string methods, container methods) lives in `strings` and
// `collections`, keyed by the runtime tag of the receiver so the evaluator
// resolves a call in a single dispatch step.

pub mod collections;
pub mod io;
pub mod math;
pub mod strings;
pub mod type_ops;

use super::host::HostIo;
use super::value::Value;

/// Routes a free-function call to the category module that owns the name.
/// Returns None when no native function has this name (the caller then
/// reports an undefined-function error).
pub fn call_native(
    host: &dyn HostIo,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, String>> {
    if let Some(result) = io::handle(host, name, args) {
        return Some(result);
    }
    if let Some(result) = math::handle(name, args) {
        return Some(result);
    }
    if let Some(result) = type_ops::handle(name, args) {
        return Some(result);
    }
    None
}

/// All native function names, for "did you mean" suggestions.
pub fn native_names() -> &'static [&'static str] {
    &[
        "listen", "sqrt", "sin", "cos", "tan", "abs", "round", "floor", "ceil", "pow", "log",
        "exp", "min", "max", "random", "len", "str", "int", "float",
    ]
}
