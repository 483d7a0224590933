// File: src/interpreter/native_functions/strings.rs
//
// String method dispatch. Strings are immutable value types: every method
// returns a new String, Array, or Bool value and leaves the receiver alone.

use crate::interpreter::Value;

fn expect_str(method: &str, arg: &Value) -> Result<String, String> {
    match arg {
        Value::Str(s) => Ok(s.as_ref().clone()),
        other => Err(format!("{}() expects a string argument, got {}", method, other.type_name())),
    }
}

fn arity(method: &str, args: &[Value], expected: usize) -> Result<(), String> {
    if args.len() != expected {
        return Err(format!(
            "{}() expects {} argument{}, got {}",
            method,
            expected,
            if expected == 1 { "" } else { "s" },
            args.len()
        ));
    }
    Ok(())
}

/// Resolve `receiver.method(args)` where the receiver is a string.
pub fn method(s: &str, method: &str, args: &[Value]) -> Result<Value, String> {
    match method {
        "length" => {
            arity("length", args, 0)?;
            Ok(Value::Int(s.chars().count() as i64))
        }
        "upper" => {
            arity("upper", args, 0)?;
            Ok(Value::str(s.to_uppercase()))
        }
        "lower" => {
            arity("lower", args, 0)?;
            Ok(Value::str(s.to_lowercase()))
        }
        "strip" => {
            arity("strip", args, 0)?;
            Ok(Value::str(s.trim().to_string()))
        }
        "split" => {
            // Delimiter defaults to a single space
            let delim = match args.first() {
                Some(arg) => expect_str("split", arg)?,
                None => " ".to_string(),
            };
            if args.len() > 1 {
                return Err(format!("split() expects at most 1 argument, got {}", args.len()));
            }
            let parts: Vec<Value> = s.split(delim.as_str()).map(Value::str_ref).collect();
            Ok(Value::array(parts))
        }
        "replace" => {
            arity("replace", args, 2)?;
            let old = expect_str("replace", &args[0])?;
            let new = expect_str("replace", &args[1])?;
            Ok(Value::str(s.replace(&old, &new)))
        }
        "contains" => {
            arity("contains", args, 1)?;
            let needle = expect_str("contains", &args[0])?;
            Ok(Value::Bool(s.contains(&needle)))
        }
        "startswith" => {
            arity("startswith", args, 1)?;
            let prefix = expect_str("startswith", &args[0])?;
            Ok(Value::Bool(s.starts_with(&prefix)))
        }
        "endswith" => {
            arity("endswith", args, 1)?;
            let suffix = expect_str("endswith", &args[0])?;
            Ok(Value::Bool(s.ends_with(&suffix)))
        }
        _ => Err(format!("Unknown string method '{}'", method)),
    }
}
