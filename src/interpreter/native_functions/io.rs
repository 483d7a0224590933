// File: src/interpreter/native_functions/io.rs
//
// I/O-related native functions (listen)

use crate::interpreter::host::HostIo;
use crate::interpreter::Value;

/// Handle I/O-related function calls.
/// Returns Some(result) if the function was handled, None if not recognized.
pub fn handle(host: &dyn HostIo, name: &str, args: &[Value]) -> Option<Result<Value, String>> {
    let result = match name {
        "listen" => {
            if args.len() > 1 {
                return Some(Err(format!(
                    "listen() expects at most 1 argument, got {}",
                    args.len()
                )));
            }
            let prompt = match args.first() {
                Some(Value::Str(s)) => s.as_ref().clone(),
                Some(other) => format!("{}", other),
                None => String::new(),
            };
            Ok(Value::str(host.read_line(&prompt)))
        }
        _ => return None,
    };
    Some(result)
}
