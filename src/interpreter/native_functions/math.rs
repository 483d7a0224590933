// File: src/interpreter/native_functions/math.rs
//
// Math-related native functions

use crate::builtins;
use crate::interpreter::Value;

fn numeric(name: &str, arg: &Value) -> Result<f64, String> {
    arg.as_f64().ok_or_else(|| {
        format!("{}() expects a number, got {}", name, arg.type_name())
    })
}

/// Handle math-related function calls.
/// Returns Some(result) if the function was handled, None if not recognized.
pub fn handle(name: &str, args: &[Value]) -> Option<Result<Value, String>> {
    let result = match name {
        // Math functions - single argument
        "abs" | "sqrt" | "floor" | "ceil" | "round" | "sin" | "cos" | "tan" | "log" | "exp" => {
            Some(unary(name, args))
        }

        // Math functions - two arguments
        "pow" | "min" | "max" => Some(binary(name, args)),

        "random" => Some(random(args)),

        _ => None,
    };
    result
}

fn unary(name: &str, args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(format!("{}() expects 1 argument, got {}", name, args.len()));
    }
    let x = numeric(name, &args[0])?;
    let result = match name {
        "abs" => builtins::abs(x),
        "sqrt" => builtins::sqrt(x),
        "floor" => builtins::floor(x),
        "ceil" => builtins::ceil(x),
        "round" => builtins::round(x),
        "sin" => builtins::sin(x),
        "cos" => builtins::cos(x),
        "tan" => builtins::tan(x),
        "log" => builtins::log(x),
        "exp" => builtins::exp(x),
        _ => unreachable!(),
    };
    // abs/round/floor/ceil of an integer stay integral
    if matches!(args[0], Value::Int(_)) && matches!(name, "abs" | "round" | "floor" | "ceil") {
        return Ok(Value::Int(result as i64));
    }
    Ok(Value::Float(result))
}

fn binary(name: &str, args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(format!("{}() expects 2 arguments, got {}", name, args.len()));
    }
    let a = numeric(name, &args[0])?;
    let b = numeric(name, &args[1])?;
    let result = match name {
        "pow" => builtins::pow(a, b),
        "min" => builtins::min(a, b),
        "max" => builtins::max(a, b),
        _ => unreachable!(),
    };
    let both_int = matches!(args[0], Value::Int(_)) && matches!(args[1], Value::Int(_));
    if both_int && result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
        return Ok(Value::Int(result as i64));
    }
    Ok(Value::Float(result))
}

/// `random(a, b)` returns a float if either bound is a float, else an
/// integer; bounds default to 0 and 1.
fn random(args: &[Value]) -> Result<Value, String> {
    if args.len() > 2 {
        return Err(format!("random() expects at most 2 arguments, got {}", args.len()));
    }
    let a = args.first().cloned().unwrap_or(Value::Int(0));
    let b = args.get(1).cloned().unwrap_or(Value::Int(1));
    match (&a, &b) {
        (Value::Int(lo), Value::Int(hi)) => Ok(Value::Int(builtins::random_int(*lo, *hi))),
        _ => {
            let lo = numeric("random", &a)?;
            let hi = numeric("random", &b)?;
            Ok(Value::Float(builtins::random_float(lo, hi)))
        }
    }
}
