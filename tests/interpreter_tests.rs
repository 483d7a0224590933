// Integration tests for the Soutk interpreter
//
// These tests verify the interpreter's behavior by running complete Soutk
// programs and checking the results. Tests cover:
// - Variable binding, scoping, and multiple assignment
// - Control flow (if/else, while, do-while, for, stride loops)
// - Spells (functions), classes, and method dispatch
// - Data structures (arrays, grimoires, stacks, queues, linked lists)
// - Error handling with ward/rescue
// - Built-in functions, file I/O, and module imports

use soutk::errors::{ErrorKind, SoutkError};
use soutk::interpreter::{CapturingHost, Interpreter, Value};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

fn unique_temp_path(prefix: &str, ext: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir()
        .join(format!("soutk_{}_{}_{}.{}", prefix, std::process::id(), id, ext))
        .to_string_lossy()
        .to_string()
}

fn run_code(code: &str) -> (Interpreter, Rc<CapturingHost>) {
    let host = Rc::new(CapturingHost::new());
    let mut interp = Interpreter::with_host(host.clone());
    interp.run(code).unwrap_or_else(|e| panic!("program failed: {}", e.message));
    (interp, host)
}

fn run_code_err(code: &str) -> (SoutkError, Rc<CapturingHost>) {
    let host = Rc::new(CapturingHost::new());
    let mut interp = Interpreter::with_host(host.clone());
    let err = interp.run(code).expect_err("program should have failed");
    (err, host)
}

fn int_var(interp: &Interpreter, name: &str) -> i64 {
    match interp.env.get(name) {
        Some(Value::Int(n)) => n,
        other => panic!("Expected int variable '{}', got {:?}", name, other),
    }
}

fn str_var(interp: &Interpreter, name: &str) -> String {
    match interp.env.get(name) {
        Some(Value::Str(s)) => s.as_ref().clone(),
        other => panic!("Expected string variable '{}', got {:?}", name, other),
    }
}

// ---------------------------------------------------------------------
// Literals, variables, and the `+` chain
// ---------------------------------------------------------------------

#[test]
fn test_literal_values_round_trip() {
    let (interp, _) = run_code(
        r#"
summon a = 42
summon b = 3.5
summon c = "hello"
summon d = true
summon e
"#,
    );
    assert_eq!(int_var(&interp, "a"), 42);
    match interp.env.get("b") {
        Some(Value::Float(f)) => assert_eq!(f, 3.5),
        other => panic!("Expected float, got {:?}", other),
    }
    assert_eq!(str_var(&interp, "c"), "hello");
    assert!(matches!(interp.env.get("d"), Some(Value::Bool(true))));
    // A bare summon starts at 0
    assert_eq!(int_var(&interp, "e"), 0);
}

#[test]
fn test_chant_prints_literal() {
    let (_, host) = run_code("chant 42");
    assert_eq!(host.output_lines(), vec!["42"]);
}

#[test]
fn test_assignment_updates_variable() {
    let (interp, host) = run_code(
        r#"
summon x = 5
x = x + 1
chant x
"#,
    );
    assert_eq!(int_var(&interp, "x"), 6);
    assert_eq!(host.output_lines(), vec!["6"]);
}

#[test]
fn test_concat_coerces_left_to_right() {
    let (_, host) = run_code(r#"chant "a" + 1 + true"#);
    assert_eq!(host.output_lines(), vec!["a1true"]);
}

#[test]
fn test_concat_chain_with_string_joins_all_parts() {
    // One text operand switches the whole chain to joining
    let (_, host) = run_code(r#"chant 1 + 2 + "a""#);
    assert_eq!(host.output_lines(), vec!["12a"]);
}

#[test]
fn test_concat_all_numeric_adds() {
    let (_, host) = run_code("chant 1 + 2 + 3");
    assert_eq!(host.output_lines(), vec!["6"]);
}

#[test]
fn test_grouped_addition_folds_before_joining() {
    let (_, host) = run_code(r#"chant "a" + (1 + 2)"#);
    assert_eq!(host.output_lines(), vec!["a3"]);
}

#[test]
fn test_mixed_numeric_addition_promotes_to_float() {
    let (_, host) = run_code("chant 1 + 0.5");
    assert_eq!(host.output_lines(), vec!["1.5"]);
}

#[test]
fn test_multi_assignment_swaps() {
    let (interp, _) = run_code(
        r#"
summon a = 1
summon b = 2
a, b = b, a
"#,
    );
    assert_eq!(int_var(&interp, "a"), 2);
    assert_eq!(int_var(&interp, "b"), 1);
}

// ---------------------------------------------------------------------
// Arithmetic and comparisons
// ---------------------------------------------------------------------

#[test]
fn test_division_is_true_division() {
    let (_, host) = run_code("chant 5 / 2");
    assert_eq!(host.output_lines(), vec!["2.5"]);
}

#[test]
fn test_even_division_prints_without_fraction() {
    let (_, host) = run_code("chant 6 / 2");
    assert_eq!(host.output_lines(), vec!["3"]);
}

#[test]
fn test_division_by_zero_is_runtime_error() {
    let (err, _) = run_code_err("chant 1 / 0");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("Division by zero"));
}

#[test]
fn test_uncaught_error_halts_remaining_statements() {
    let (err, host) = run_code_err(
        r#"
chant "before"
chant 1 / 0
chant "after"
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert_eq!(err.location.line, 3);
    assert_eq!(host.output_lines(), vec!["before"]);
}

#[test]
fn test_string_comparison_is_lexicographic() {
    let (_, host) = run_code(r#"chant "abc" < "abd""#);
    assert_eq!(host.output_lines(), vec!["true"]);
}

#[test]
fn test_logical_operators_coerce_truthiness() {
    let (_, host) = run_code(
        r#"
chant 1 && "x"
chant 0 || ""
chant !0
chant not ""
"#,
    );
    assert_eq!(host.output_lines(), vec!["true", "false", "true", "true"]);
}

#[test]
fn test_undefined_variable_is_runtime_error_with_suggestion() {
    let (err, _) = run_code_err(
        r#"
summon counter = 1
chant countr
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("countr"));
    assert_eq!(err.suggestion.as_deref(), Some("counter"));
}

// ---------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------

#[test]
fn test_if_else_executes_exactly_one_branch() {
    let (_, host) = run_code(
        r#"
summon x = 10
if x > 5: {
    chant "big"
} else: {
    chant "small"
}
"#,
    );
    assert_eq!(host.output_lines(), vec!["big"]);
}

#[test]
fn test_if_without_else_and_false_condition_does_nothing() {
    let (_, host) = run_code(
        r#"
if 1 > 5: {
    chant "never"
}
chant "after"
"#,
    );
    assert_eq!(host.output_lines(), vec!["after"]);
}

#[test]
fn test_single_statement_if_binds_exactly_the_next_line() {
    let (_, host) = run_code(
        r#"
summon x = 1
if x == 1:
    chant "yes"
chant "always"
if x == 2:
    chant "no"
chant "end"
"#,
    );
    assert_eq!(host.output_lines(), vec!["yes", "always", "end"]);
}

#[test]
fn test_while_loop_re_evaluates_condition() {
    let (_, host) = run_code(
        r#"
summon x = 0
while x < 3: {
    chant x
    x = x + 1
}
"#,
    );
    assert_eq!(host.output_lines(), vec!["0", "1", "2"]);
}

#[test]
fn test_do_while_runs_body_at_least_once() {
    let (_, host) = run_code(
        r#"
summon x = 10
do: {
    chant x
} while (x < 5)
"#,
    );
    assert_eq!(host.output_lines(), vec!["10"]);
}

#[test]
fn test_for_loop_counts_and_steps() {
    let (interp, _) = run_code(
        r#"
summon total = 0
for (summon i = 0; i < 5; i = i + 1): {
    total = total + i
}
"#,
    );
    assert_eq!(int_var(&interp, "total"), 10);
}

#[test]
fn test_for_loop_continue_still_steps() {
    let (interp, _) = run_code(
        r#"
summon total = 0
for (summon i = 0; i < 5; i = i + 1): {
    if i == 2: {
        continue
    }
    total = total + i
}
"#,
    );
    assert_eq!(int_var(&interp, "total"), 8);
}

#[test]
fn test_stride_loop_outputs_inclusive_range_and_unbinds_variable() {
    let (interp, host) = run_code(
        r#"
stride i from 1 to 3: {
    chant i
}
"#,
    );
    assert_eq!(host.output_lines(), vec!["1", "2", "3"]);
    assert!(interp.env.get("i").is_none(), "stride variable leaked into enclosing scope");
}

#[test]
fn test_stride_loop_restores_shadowed_variable() {
    let (interp, _) = run_code(
        r#"
summon i = 99
stride i from 1 to 2: {
    chant i
}
"#,
    );
    assert_eq!(int_var(&interp, "i"), 99);
}

#[test]
fn test_stride_end_bound_re_evaluated_every_iteration() {
    let (_, host) = run_code(
        r#"
summon n = 3
stride i from 1 to n: {
    chant i
    n = n - 1
}
"#,
    );
    assert_eq!(host.output_lines(), vec!["1", "2"]);
}

#[test]
fn test_loop_keyword_is_range_loop_alias() {
    let (_, host) = run_code(
        r#"
loop k from 5 to 7: {
    chant k
}
"#,
    );
    assert_eq!(host.output_lines(), vec!["5", "6", "7"]);
}

#[test]
fn test_break_terminates_only_innermost_loop() {
    let (interp, _) = run_code(
        r#"
summon total = 0
stride i from 1 to 3: {
    stride j from 1 to 3: {
        if j == 2: {
            break
        }
        total = total + 1
    }
}
"#,
    );
    // The inner loop contributes one iteration per outer pass
    assert_eq!(int_var(&interp, "total"), 3);
}

#[test]
fn test_continue_skips_to_next_iteration_of_innermost_loop() {
    let (interp, _) = run_code(
        r#"
summon total = 0
stride i from 1 to 5: {
    if i % 2 == 0: {
        continue
    }
    total = total + i
}
"#,
    );
    assert_eq!(int_var(&interp, "total"), 9);
}

#[test]
fn test_break_outside_loop_is_runtime_error() {
    let (err, _) = run_code_err("break");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("break"));
}

#[test]
fn test_return_outside_spell_is_runtime_error() {
    let (err, _) = run_code_err("return 1");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("return"));
}

// ---------------------------------------------------------------------
// Spells (functions)
// ---------------------------------------------------------------------

#[test]
fn test_spell_definition_and_call() {
    let (_, host) = run_code(
        r#"
spell greet(name): {
    return "Hello, " + name
}
summon msg = greet("World")
chant msg
"#,
    );
    assert_eq!(host.output_lines(), vec!["Hello, World"]);
}

#[test]
fn test_forge_spell_is_function_definition() {
    let (_, host) = run_code(
        r#"
forge spell double(x): {
    return x * 2
}
chant double(21)
"#,
    );
    assert_eq!(host.output_lines(), vec!["42"]);
}

#[test]
fn test_cast_statement_invokes_spell() {
    let (interp, _) = run_code(
        r#"
summon counter = 0
spell bump(): {
    counter = counter + 1
}
cast bump()
cast bump()
"#,
    );
    assert_eq!(int_var(&interp, "counter"), 2);
}

#[test]
fn test_spell_without_return_yields_zero() {
    let (_, host) = run_code(
        r#"
spell noop(): {
    summon unused = 1
}
chant noop()
"#,
    );
    assert_eq!(host.output_lines(), vec!["0"]);
}

#[test]
fn test_spell_parameters_do_not_leak() {
    let (interp, _) = run_code(
        r#"
summon x = 1
spell shadow(x): {
    x = 99
}
cast shadow(5)
"#,
    );
    assert_eq!(int_var(&interp, "x"), 1);
}

#[test]
fn test_argument_count_mismatch_names_spell_and_counts() {
    let (err, _) = run_code_err(
        r#"
spell pair(a, b): {
    return a + b
}
summon x = pair(1)
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("pair"));
    assert!(err.message.contains('2'));
    assert!(err.message.contains('1'));
}

#[test]
fn test_undefined_spell_is_runtime_error() {
    let (err, _) = run_code_err("cast vanish()");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("vanish"));
}

#[test]
fn test_recursive_spell() {
    let (_, host) = run_code(
        r#"
spell fact(n): {
    if n <= 1: {
        return 1
    }
    return n * fact(n - 1)
}
chant fact(6)
"#,
    );
    assert_eq!(host.output_lines(), vec!["720"]);
}

// ---------------------------------------------------------------------
// Ward / rescue
// ---------------------------------------------------------------------

#[test]
fn test_ward_rescue_catches_division_by_zero() {
    let (_, host) = run_code(
        r#"
ward: {
    chant 1 / 0
}
rescue problem: {
    chant "caught: " + problem
}
chant "after"
"#,
    );
    let lines = host.output_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("caught: "));
    assert!(lines[0].contains("Division by zero"));
    assert_eq!(lines[1], "after");
}

#[test]
fn test_ward_rescue_catches_argument_mismatch() {
    let (interp, host) = run_code(
        r#"
spell pair(a, b): {
    return a + b
}
ward: {
    summon x = pair(1)
}
rescue err: {
    chant "caught: " + err
}
"#,
    );
    let lines = host.output_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("pair"));
    // The error binding is removed once the rescue block finishes
    assert!(interp.env.get("err").is_none());
}

#[test]
fn test_ward_rescue_default_error_variable() {
    let (_, host) = run_code(
        r#"
ward: {
    chant missing
}
rescue: {
    chant "problem: " + error
}
"#,
    );
    let lines = host.output_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("missing"));
}

#[test]
fn test_ward_without_rescue_re_raises() {
    let (err, _) = run_code_err(
        r#"
ward: {
    chant 1 / 0
}
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("Division by zero"));
}

#[test]
fn test_ward_restores_shadowed_error_variable() {
    let (interp, _) = run_code(
        r#"
summon error = "previous"
ward: {
    chant 1 / 0
}
rescue: {
    summon seen = error
}
"#,
    );
    assert_eq!(str_var(&interp, "error"), "previous");
}

// ---------------------------------------------------------------------
// Arrays and grimoires
// ---------------------------------------------------------------------

#[test]
fn test_array_literal_indexing_and_mutation() {
    let (interp, host) = run_code(
        r#"
summon arr = [1, 2, 3]
chant arr[1]
arr[1] = 5
chant arr[1]
summon total = arr[0] + arr[1] + arr[2]
"#,
    );
    assert_eq!(host.output_lines(), vec!["2", "5"]);
    assert_eq!(int_var(&interp, "total"), 9);
}

#[test]
fn test_array_index_out_of_range_is_runtime_error() {
    let (err, _) = run_code_err(
        r#"
summon arr = [1, 2, 3]
chant arr[3]
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("out of range"));
}

#[test]
fn test_arrays_share_by_reference() {
    let (_, host) = run_code(
        r#"
summon a = [1, 2, 3]
summon b = a
b[0] = 99
chant a[0]
"#,
    );
    assert_eq!(host.output_lines(), vec!["99"]);
}

#[test]
fn test_grimoire_bind_lookup_and_index() {
    let (interp, host) = run_code(
        r#"
forge grimoire spells
bind spells["light"] = "lumen"
bind spells[7] = "seven"
chant spells["light"]
chant spells[7]
summon found = spells.lookup("light")
summon missing = spells.lookup("dark")
"#,
    );
    let lines = host.output_lines();
    assert_eq!(lines[0], "Forged grimoire 'spells'");
    assert_eq!(&lines[1..], ["lumen", "seven"]);
    assert_eq!(str_var(&interp, "found"), "lumen");
    assert!(matches!(interp.env.get("missing"), Some(Value::Null)));
}

#[test]
fn test_grimoire_missing_key_index_is_runtime_error() {
    let (err, _) = run_code_err(
        r#"
forge grimoire d
chant d["absent"]
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("absent"));
}

#[test]
fn test_grimoire_keys_and_values() {
    let (interp, _) = run_code(
        r#"
forge grimoire d
bind d["a"] = 1
bind d["b"] = 2
summon ks = d.keys()
summon vs = d.values()
"#,
    );
    match interp.env.get("ks") {
        Some(Value::Array(items)) => assert_eq!(items.borrow().len(), 2),
        other => panic!("Expected array of keys, got {:?}", other),
    }
    match interp.env.get("vs") {
        Some(Value::Array(items)) => assert_eq!(items.borrow().len(), 2),
        other => panic!("Expected array of values, got {:?}", other),
    }
}

// ---------------------------------------------------------------------
// Stacks, queues, linked lists
// ---------------------------------------------------------------------

#[test]
fn test_stack_push_pop_peek() {
    let (_, host) = run_code(
        r#"
forge stack s
push s 1
push s 2
push s 3
pop s
pop s
peek s
"#,
    );
    let lines = host.output_lines();
    assert_eq!(lines[0], "Forged stack 's'");
    assert_eq!(lines[4], "Popped 3 from stack 's'");
    assert_eq!(lines[5], "Popped 2 from stack 's'");
    assert_eq!(lines[6], "Top of stack 's': 1");
}

#[test]
fn test_stack_pop_when_empty_reports_empty() {
    let (_, host) = run_code(
        r#"
forge stack s
pop s
"#,
    );
    assert_eq!(host.output_lines()[1], "Stack 's' is empty");
}

#[test]
fn test_stack_methods_in_expressions_stay_silent() {
    let (interp, host) = run_code(
        r#"
forge stack s
push s 10
push s 20
summon top = s.pop()
"#,
    );
    assert_eq!(int_var(&interp, "top"), 20);
    // Only forge and the two pushes printed; the expression pop did not
    assert_eq!(host.output_lines().len(), 3);
}

#[test]
fn test_queue_is_first_in_first_out() {
    let (_, host) = run_code(
        r#"
forge queue q
enqueue q "a"
enqueue q "b"
dequeue q
front q
"#,
    );
    let lines = host.output_lines();
    assert_eq!(lines[3], "Dequeued a from queue 'q'");
    assert_eq!(lines[4], "Front of queue 'q': b");
}

#[test]
fn test_linked_list_commands() {
    let (_, host) = run_code(
        r#"
forge linklist l
link l 1
link l 3
insertafter l 1 2
traverse l
unlink l 3
traverse l
"#,
    );
    let lines = host.output_lines();
    assert_eq!(lines[4], "List 'l': 1 -> 2 -> 3");
    assert_eq!(lines[6], "List 'l': 1 -> 2");
}

#[test]
fn test_isempty_reports_both_states() {
    let (_, host) = run_code(
        r#"
forge queue q
isempty q
enqueue q 1
isempty q
"#,
    );
    let lines = host.output_lines();
    assert_eq!(lines[1], "'q' is empty");
    assert_eq!(lines[3], "'q' is not empty");
}

#[test]
fn test_containers_share_by_reference() {
    let (interp, _) = run_code(
        r#"
forge stack s
summon alias = s
push s 7
summon top = alias.peek()
"#,
    );
    assert_eq!(int_var(&interp, "top"), 7);
}

// ---------------------------------------------------------------------
// String methods
// ---------------------------------------------------------------------

#[test]
fn test_string_methods_return_new_values() {
    let (interp, _) = run_code(
        r#"
summon s = "  Hello World  "
summon stripped = s.strip()
summon up = stripped.upper()
summon low = stripped.lower()
summon n = stripped.length()
summon swapped = stripped.replace("World", "Soutk")
summon has = stripped.contains("World")
summon starts = stripped.startswith("Hello")
summon ends = stripped.endswith("World")
"#,
    );
    assert_eq!(str_var(&interp, "stripped"), "Hello World");
    assert_eq!(str_var(&interp, "up"), "HELLO WORLD");
    assert_eq!(str_var(&interp, "low"), "hello world");
    assert_eq!(int_var(&interp, "n"), 11);
    assert_eq!(str_var(&interp, "swapped"), "Hello Soutk");
    assert!(matches!(interp.env.get("has"), Some(Value::Bool(true))));
    assert!(matches!(interp.env.get("starts"), Some(Value::Bool(true))));
    assert!(matches!(interp.env.get("ends"), Some(Value::Bool(true))));
    // The receiver is untouched
    assert_eq!(str_var(&interp, "s"), "  Hello World  ");
}

#[test]
fn test_string_split() {
    let (interp, _) = run_code(
        r#"
summon csv = "a,b,c"
summon parts = csv.split(",")
summon first = parts[0]
"#,
    );
    match interp.env.get("parts") {
        Some(Value::Array(items)) => assert_eq!(items.borrow().len(), 3),
        other => panic!("Expected array from split, got {:?}", other),
    }
    assert_eq!(str_var(&interp, "first"), "a");
}

#[test]
fn test_unknown_string_method_is_runtime_error() {
    let (err, _) = run_code_err(
        r#"
summon s = "abc"
chant s.reverse()
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("reverse"));
}

// ---------------------------------------------------------------------
// Classes and objects
// ---------------------------------------------------------------------

#[test]
fn test_class_constructor_methods_and_attributes() {
    let (_, host) = run_code(
        r#"
enchant Person: {
    spell construct(name): {
        this.name = name
    }
    spell greet(): {
        return "Hi, " + this.name
    }
}
summon p = conjure Person("Ada")
chant p.greet()
chant p.name
"#,
    );
    assert_eq!(host.output_lines(), vec!["Hi, Ada", "Ada"]);
}

#[test]
fn test_object_attribute_assignment() {
    let (_, host) = run_code(
        r#"
enchant Counter: {
    spell construct(): {
        this.count = 0
    }
    spell bump(): {
        this.count = this.count + 1
    }
}
summon c = conjure Counter()
c.bump()
c.bump()
chant c.count
"#,
    );
    assert_eq!(host.output_lines(), vec!["2"]);
}

#[test]
fn test_objects_share_by_reference() {
    let (_, host) = run_code(
        r#"
enchant Box: {
    spell construct(v): {
        this.value = v
    }
}
summon a = conjure Box(1)
summon b = a
b.value = 42
chant a.value
"#,
    );
    assert_eq!(host.output_lines(), vec!["42"]);
}

#[test]
fn test_unknown_class_is_runtime_error() {
    let (err, _) = run_code_err("summon x = conjure Ghost()");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("Ghost"));
}

#[test]
fn test_unknown_method_names_class() {
    let (err, _) = run_code_err(
        r#"
enchant Empty: {
}
summon e = conjure Empty()
chant e.missing()
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("missing"));
    assert!(err.message.contains("Empty"));
}

#[test]
fn test_missing_attribute_is_runtime_error() {
    let (err, _) = run_code_err(
        r#"
enchant Empty: {
}
summon e = conjure Empty()
chant e.nothing
"#,
    );
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("nothing"));
}

// ---------------------------------------------------------------------
// Built-in functions
// ---------------------------------------------------------------------

#[test]
fn test_math_builtins() {
    let (interp, host) = run_code(
        r#"
chant sqrt(9)
summon a = abs(0 - 5)
summon p = pow(2, 10)
summon f = floor(3.7)
summon c = ceil(3.2)
"#,
    );
    assert_eq!(host.output_lines(), vec!["3"]);
    assert_eq!(int_var(&interp, "a"), 5);
    assert_eq!(int_var(&interp, "p"), 1024);
    match interp.env.get("f") {
        Some(Value::Float(v)) => assert_eq!(v, 3.0),
        other => panic!("Expected float from floor, got {:?}", other),
    }
    match interp.env.get("c") {
        Some(Value::Float(v)) => assert_eq!(v, 4.0),
        other => panic!("Expected float from ceil, got {:?}", other),
    }
}

#[test]
fn test_random_bounds_and_types() {
    let (interp, _) = run_code(
        r#"
summon d = random(1, 6)
summon f = random(1.0, 2.0)
"#,
    );
    match interp.env.get("d") {
        Some(Value::Int(n)) => assert!((1..=6).contains(&n)),
        other => panic!("Expected int from random(1, 6), got {:?}", other),
    }
    match interp.env.get("f") {
        Some(Value::Float(x)) => assert!((1.0..2.0).contains(&x)),
        other => panic!("Expected float from random(1.0, 2.0), got {:?}", other),
    }
}

#[test]
fn test_len_and_conversions() {
    let (interp, _) = run_code(
        r#"
summon n = len("hello")
summon i = int("42")
summon f = float("2.5")
summon s = str(7)
"#,
    );
    assert_eq!(int_var(&interp, "n"), 5);
    assert_eq!(int_var(&interp, "i"), 42);
    match interp.env.get("f") {
        Some(Value::Float(v)) => assert_eq!(v, 2.5),
        other => panic!("Expected float, got {:?}", other),
    }
    assert_eq!(str_var(&interp, "s"), "7");
}

#[test]
fn test_listen_reads_scripted_input() {
    let host = Rc::new(CapturingHost::with_input(&["Arthur"]));
    let mut interp = Interpreter::with_host(host.clone());
    interp
        .run(
            r#"
summon name = listen("Who goes there? ")
chant "Hello, " + name
"#,
        )
        .expect("program should run");
    assert_eq!(host.output_lines(), vec!["Hello, Arthur"]);
}

#[test]
fn test_listen_returns_empty_string_at_end_of_input() {
    let host = Rc::new(CapturingHost::new());
    let mut interp = Interpreter::with_host(host.clone());
    interp
        .run(
            r#"
summon line = listen()
chant "got:" + line
"#,
        )
        .expect("program should run");
    assert_eq!(host.output_lines(), vec!["got:"]);
}

// ---------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------

#[test]
fn test_inscribe_and_scroll_round_trip() {
    let path = unique_temp_path("inscribe", "txt");
    let code = format!(
        r#"
inscribe "{path}" with "sealed " + 42
scroll "{path}" into contents
chant contents
"#,
        path = path
    );
    let (interp, host) = run_code(&code);
    assert_eq!(host.output_lines(), vec!["sealed 42"]);
    assert_eq!(str_var(&interp, "contents"), "sealed 42");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_append_adds_lines() {
    let path = unique_temp_path("append", "txt");
    let code = format!(
        r#"
inscribe "{path}" with "one"
append "{path}" with "two"
scroll "{path}" into contents
"#,
        path = path
    );
    let (interp, _) = run_code(&code);
    assert_eq!(str_var(&interp, "contents"), "onetwo\n");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_scroll_missing_file_is_runtime_error() {
    let path = unique_temp_path("missing", "txt");
    let code = format!(r#"scroll "{path}" into contents"#, path = path);
    let (err, _) = run_code_err(&code);
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains(&path));
}

#[test]
fn test_scroll_error_is_rescuable() {
    let path = unique_temp_path("missing_warded", "txt");
    let code = format!(
        r#"
ward: {{
    scroll "{path}" into contents
}}
rescue e: {{
    chant "no scroll"
}}
"#,
        path = path
    );
    let (_, host) = run_code(&code);
    assert_eq!(host.output_lines(), vec!["no scroll"]);
}

// ---------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------

#[test]
fn test_invoke_imports_module_under_alias() {
    let path = unique_temp_path("module", "stk");
    std::fs::write(
        &path,
        r#"
summon secret = 42
spell square(x): {
    return x * x
}
"#,
    )
    .expect("module file should be written");

    let code = format!(
        r#"
invoke "{path}" as mathmod
chant mathmod.square(6)
chant mathmod.secret
"#,
        path = path
    );
    let (_, host) = run_code(&code);
    assert_eq!(host.output_lines(), vec!["36", "42"]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_module_spells_can_call_their_siblings() {
    let path = unique_temp_path("module_siblings", "stk");
    std::fs::write(
        &path,
        r#"
spell helper(x): {
    return x + 1
}
spell entry(x): {
    return helper(x) * 10
}
"#,
    )
    .expect("module file should be written");

    let code = format!(
        r#"
invoke "{path}" as util
chant util.entry(3)
"#,
        path = path
    );
    let (_, host) = run_code(&code);
    assert_eq!(host.output_lines(), vec!["40"]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_module_symbols_are_not_merged_into_globals() {
    let path = unique_temp_path("module_isolated", "stk");
    std::fs::write(&path, "summon inner = 7\n").expect("module file should be written");

    let code = format!(
        r#"
invoke "{path}" as iso
chant inner
"#,
        path = path
    );
    let (err, _) = run_code_err(&code);
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains("inner"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_invoke_missing_module_is_runtime_error() {
    let path = unique_temp_path("module_missing", "stk");
    let code = format!(r#"invoke "{path}" as ghost"#, path = path);
    let (err, _) = run_code_err(&code);
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(err.message.contains(&path));
}

// ---------------------------------------------------------------------
// Lexer and parser errors
// ---------------------------------------------------------------------

#[test]
fn test_unterminated_string_is_lex_error() {
    let (err, _) = run_code_err(r#"chant "never closed"#);
    assert_eq!(err.kind, ErrorKind::LexError);
}

#[test]
fn test_for_with_wrong_clause_count_is_parse_error() {
    let (err, _) = run_code_err(
        r#"
for (summon i = 0; i < 5): {
    chant i
}
"#,
    );
    assert_eq!(err.kind, ErrorKind::ParseError);
    assert!(err.message.contains("three clauses"));
}

#[test]
fn test_for_with_four_clauses_is_parse_error() {
    let (err, _) = run_code_err(
        r#"
for (summon i = 0; i < 5; i = i + 1; i = i + 2): {
    chant i
}
"#,
    );
    assert_eq!(err.kind, ErrorKind::ParseError);
    assert!(err.message.contains("three clauses"));
}

#[test]
fn test_unmatched_brace_is_parse_error() {
    let (err, _) = run_code_err(
        r#"
while 1 < 3: {
    chant "open"
"#,
    );
    assert_eq!(err.kind, ErrorKind::ParseError);
}

#[test]
fn test_parse_error_stops_before_execution() {
    // A parse error is fatal for the file: nothing runs, not even the
    // statements before the malformed one
    let (err, host) = run_code_err(
        r#"
chant "early"
for (x): {
}
"#,
    );
    assert_eq!(err.kind, ErrorKind::ParseError);
    assert!(host.output_lines().is_empty());
}
