// File: src/interpreter/native_functions/collections.rs
//
// Container method dispatch: stacks, queues, linked lists, and grimoires
// (maps). Containers have reference semantics - methods mutate the shared
// value in place and every binding holding it observes the change.
//
// Empty-container reads (pop/peek/front/dequeue on nothing) return Null
// rather than failing; the statement layer turns that into an "is empty"
// diagnostic line, matching the language's permissive container commands.

use crate::interpreter::value::{MapKey, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

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

/// Convert a runtime value to a grimoire key. Only strings and integers key
/// a grimoire.
pub fn map_key(value: &Value) -> Result<MapKey, String> {
    match value {
        Value::Int(n) => Ok(MapKey::Int(*n)),
        Value::Str(s) => Ok(MapKey::Str(s.as_ref().clone())),
        other => Err(format!("Grimoire keys must be strings or integers, got {}", other.type_name())),
    }
}

pub fn stack_method(
    items: &Rc<RefCell<Vec<Value>>>,
    method: &str,
    args: &[Value],
) -> Result<Value, String> {
    match method {
        "push" => {
            arity("push", args, 1)?;
            items.borrow_mut().push(args[0].clone());
            Ok(args[0].clone())
        }
        "pop" => {
            arity("pop", args, 0)?;
            Ok(items.borrow_mut().pop().unwrap_or(Value::Null))
        }
        "peek" => {
            arity("peek", args, 0)?;
            Ok(items.borrow().last().cloned().unwrap_or(Value::Null))
        }
        "show" => {
            arity("show", args, 0)?;
            Ok(Value::Stack(Rc::clone(items)))
        }
        "isempty" => {
            arity("isempty", args, 0)?;
            Ok(Value::Bool(items.borrow().is_empty()))
        }
        _ => Err(format!("Unknown stack method '{}'", method)),
    }
}

pub fn queue_method(
    items: &Rc<RefCell<VecDeque<Value>>>,
    method: &str,
    args: &[Value],
) -> Result<Value, String> {
    match method {
        "enqueue" => {
            arity("enqueue", args, 1)?;
            items.borrow_mut().push_back(args[0].clone());
            Ok(args[0].clone())
        }
        "dequeue" => {
            arity("dequeue", args, 0)?;
            Ok(items.borrow_mut().pop_front().unwrap_or(Value::Null))
        }
        "front" => {
            arity("front", args, 0)?;
            Ok(items.borrow().front().cloned().unwrap_or(Value::Null))
        }
        "show" => {
            arity("show", args, 0)?;
            Ok(Value::Queue(Rc::clone(items)))
        }
        "isempty" => {
            arity("isempty", args, 0)?;
            Ok(Value::Bool(items.borrow().is_empty()))
        }
        _ => Err(format!("Unknown queue method '{}'", method)),
    }
}

pub fn list_method(
    items: &Rc<RefCell<Vec<Value>>>,
    method: &str,
    args: &[Value],
) -> Result<Value, String> {
    match method {
        "link" => {
            arity("link", args, 1)?;
            items.borrow_mut().push(args[0].clone());
            Ok(args[0].clone())
        }
        "unlink" => {
            arity("unlink", args, 1)?;
            let mut items = items.borrow_mut();
            match items.iter().position(|v| v.loosely_equals(&args[0])) {
                Some(pos) => {
                    items.remove(pos);
                    Ok(Value::Bool(true))
                }
                None => Ok(Value::Bool(false)),
            }
        }
        "insertafter" => {
            arity("insertafter", args, 2)?;
            let mut items = items.borrow_mut();
            match items.iter().position(|v| v.loosely_equals(&args[0])) {
                Some(pos) => {
                    items.insert(pos + 1, args[1].clone());
                    Ok(Value::Bool(true))
                }
                None => Ok(Value::Bool(false)),
            }
        }
        "traverse" => {
            arity("traverse", args, 0)?;
            Ok(Value::List(Rc::clone(items)))
        }
        "isempty" => {
            arity("isempty", args, 0)?;
            Ok(Value::Bool(items.borrow().is_empty()))
        }
        _ => Err(format!("Unknown linklist method '{}'", method)),
    }
}

pub fn map_method(
    entries: &Rc<RefCell<ahash::AHashMap<MapKey, Value>>>,
    method: &str,
    args: &[Value],
) -> Result<Value, String> {
    match method {
        "bind" => {
            arity("bind", args, 2)?;
            let key = map_key(&args[0])?;
            entries.borrow_mut().insert(key, args[1].clone());
            Ok(args[1].clone())
        }
        "unbind" => {
            arity("unbind", args, 1)?;
            let key = map_key(&args[0])?;
            Ok(Value::Bool(entries.borrow_mut().remove(&key).is_some()))
        }
        "lookup" => {
            arity("lookup", args, 1)?;
            let key = map_key(&args[0])?;
            Ok(entries.borrow().get(&key).cloned().unwrap_or(Value::Null))
        }
        "keys" => {
            arity("keys", args, 0)?;
            let mut keys: Vec<Value> = entries
                .borrow()
                .keys()
                .map(|k| match k {
                    MapKey::Int(n) => Value::Int(*n),
                    MapKey::Str(s) => Value::str_ref(s),
                })
                .collect();
            keys.sort_by_key(|v| format!("{}", v));
            Ok(Value::array(keys))
        }
        "values" => {
            arity("values", args, 0)?;
            let entries = entries.borrow();
            let mut pairs: Vec<(String, Value)> =
                entries.iter().map(|(k, v)| (format!("{}", k), v.clone())).collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(Value::array(pairs.into_iter().map(|(_, v)| v).collect()))
        }
        "isempty" => {
            arity("isempty", args, 0)?;
            Ok(Value::Bool(entries.borrow().is_empty()))
        }
        _ => Err(format!("Unknown grimoire method '{}'", method)),
    }
}
