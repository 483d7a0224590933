// File: src/interpreter/native_functions/type_ops.rs
//
// Length and type conversion native functions

use crate::interpreter::Value;

/// Handle length/conversion function calls.
/// Returns Some(result) if the function was handled, None if not recognized.
pub fn handle(name: &str, args: &[Value]) -> Option<Result<Value, String>> {
    let result = match name {
        "len" => Some(len(args)),
        "str" => Some(to_str(args)),
        "int" => Some(to_int(args)),
        "float" => Some(to_float(args)),
        _ => None,
    };
    result
}

fn one<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, String> {
    if args.len() != 1 {
        return Err(format!("{}() expects 1 argument, got {}", name, args.len()));
    }
    Ok(&args[0])
}

fn len(args: &[Value]) -> Result<Value, String> {
    let value = one("len", args)?;
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.borrow().len(),
        Value::Map(entries) => entries.borrow().len(),
        Value::Stack(items) => items.borrow().len(),
        Value::Queue(items) => items.borrow().len(),
        Value::List(items) => items.borrow().len(),
        other => {
            return Err(format!("len() expects a string or container, got {}", other.type_name()))
        }
    };
    Ok(Value::Int(n as i64))
}

fn to_str(args: &[Value]) -> Result<Value, String> {
    let value = one("str", args)?;
    Ok(Value::str(format!("{}", value)))
}

fn to_int(args: &[Value]) -> Result<Value, String> {
    let value = one("int", args)?;
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) => Ok(Value::Int(*n as i64)),
        Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("int() could not parse '{}'", s)),
        other => Err(format!("int() cannot convert {}", other.type_name())),
    }
}

fn to_float(args: &[Value]) -> Result<Value, String> {
    let value = one("float", args)?;
    match value {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(n) => Ok(Value::Float(*n)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("float() could not parse '{}'", s)),
        other => Err(format!("float() cannot convert {}", other.type_name())),
    }
}
