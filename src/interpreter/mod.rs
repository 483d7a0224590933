// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the Soutk programming language.
// Executes Soutk programs by traversing the Abstract Syntax Tree (AST).
//
// The interpreter owns all execution state: the variable environment, the
// spell (function) table, the class table, the forged-container table, and
// the imported-module table. Fresh, independent instances are cheap, which
// is exactly what the module loader needs for isolation.
//
// Statement execution returns a Signal (Normal/Break/Continue/Return)
// instead of unwinding; expression evaluation returns Result<Value, _> and
// propagates runtime errors with `?` until a ward/rescue block or the top
// level intercepts them.

// Module structure
mod control_flow;
mod environment;
pub mod host;
pub mod native_functions;
mod value;

pub use control_flow::Signal;
pub use environment::Environment;
pub use host::{CapturingHost, HostIo, StdHost};
pub use value::{ClassDef, MapKey, Object, Value};

use crate::ast::{AssignTarget, BinOp, ContainerKind, Expr, FuncDef, Stmt, StmtKind};
use crate::errors::{find_closest_match, SoutkError};
use crate::lexer::tokenize;
use crate::module::{Module, ModuleLoader};
use crate::parser::Parser;
use ahash::AHashMap;
use native_functions::collections;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

/// Main interpreter that executes Soutk programs
pub struct Interpreter {
    pub env: Environment,
    pub functions: AHashMap<String, Rc<FuncDef>>,
    pub classes: AHashMap<String, Rc<ClassDef>>,
    /// Forged stacks, queues, linked lists, and grimoires, by name
    pub containers: AHashMap<String, Value>,
    /// Imported module namespaces, by alias
    pub modules: AHashMap<String, Rc<Module>>,
    pub module_loader: ModuleLoader,
    pub source_file: Option<String>,
    host: Rc<dyn HostIo>,
    /// Line of the statement currently executing, for error reporting
    line: usize,
    /// Innermost-first stack of modules whose spells are mid-call, so a
    /// module spell can call its siblings
    module_context: Vec<Rc<Module>>,
}

impl Interpreter {
    /// Creates a new interpreter wired to real stdin/stdout/filesystem
    pub fn new() -> Self {
        Self::with_host(Rc::new(StdHost))
    }

    /// Creates a new interpreter with the given host capability
    pub fn with_host(host: Rc<dyn HostIo>) -> Self {
        Interpreter {
            env: Environment::default(),
            functions: AHashMap::new(),
            classes: AHashMap::new(),
            containers: AHashMap::new(),
            modules: AHashMap::new(),
            module_loader: ModuleLoader::new(),
            source_file: None,
            host,
            line: 0,
            module_context: Vec::new(),
        }
    }

    /// Runs a complete source text: tokenize, parse, execute.
    ///
    /// Lex and parse errors are fatal for the file. A runtime error that no
    /// ward/rescue intercepted is returned with the offending line number;
    /// top-level statements after the failing one are not executed.
    pub fn run(&mut self, source: &str) -> Result<(), SoutkError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser::new(tokens);
        let program = parser.parse()?;
        match self.exec_block(&program)? {
            Signal::Normal => Ok(()),
            Signal::Return(_) => {
                Err(self.runtime_error("'return' outside of a spell".to_string()))
            }
            signal => Err(self.runtime_error(format!(
                "'{}' outside of a loop",
                signal.keyword()
            ))),
        }
    }

    fn runtime_error(&self, message: String) -> SoutkError {
        let mut err = SoutkError::runtime_error(message, self.line);
        if let Some(ref file) = self.source_file {
            err.location.file = Some(file.clone());
        }
        err
    }

    fn suggest(&self, err: SoutkError, target: &str, candidates: Vec<String>) -> SoutkError {
        match find_closest_match(target, candidates.iter().map(|s| s.as_str())) {
            Some(best) => err.with_suggestion(best.to_string()),
            None => err,
        }
    }

    // ------------------------------------------------------------------
    // Statement execution
    // ------------------------------------------------------------------

    /// Executes statements in sequence, stopping at the first non-Normal
    /// signal and handing it upward.
    pub fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Signal, SoutkError> {
        for stmt in stmts {
            let signal = self.exec_stmt(stmt)?;
            if !matches!(signal, Signal::Normal) {
                return Ok(signal);
            }
        }
        Ok(Signal::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Signal, SoutkError> {
        self.line = stmt.line;
        match &stmt.kind {
            StmtKind::VarDecl { name, value } => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    // Bare `summon x` starts the variable at 0
                    None => Value::Int(0),
                };
                self.env.define(name.clone(), value);
                Ok(Signal::Normal)
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval(value)?;
                self.assign(target, value)?;
                Ok(Signal::Normal)
            }
            StmtKind::MultiAssign { names, values } => {
                // Right side evaluates completely first, so `a, b = b, a` swaps
                let mut evaluated = Vec::with_capacity(values.len());
                for expr in values {
                    evaluated.push(self.eval(expr)?);
                }
                for (name, value) in names.iter().zip(evaluated) {
                    self.env.set(name.clone(), value);
                }
                Ok(Signal::Normal)
            }
            StmtKind::Print(expr) => {
                let value = self.eval(expr)?;
                self.host.print(&format!("{}", value));
                Ok(Signal::Normal)
            }
            StmtKind::If { cond, then_block, else_block } => {
                if self.eval(cond)?.is_truthy() {
                    self.exec_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(Signal::Normal)
                }
            }
            StmtKind::While { cond, body } => {
                // The condition is re-evaluated before every iteration
                while self.eval(cond)?.is_truthy() {
                    match self.exec_block(body)? {
                        Signal::Normal | Signal::Continue => {}
                        Signal::Break => break,
                        ret @ Signal::Return(_) => return Ok(ret),
                    }
                }
                Ok(Signal::Normal)
            }
            StmtKind::DoWhile { body, cond } => {
                loop {
                    match self.exec_block(body)? {
                        Signal::Normal | Signal::Continue => {}
                        Signal::Break => break,
                        ret @ Signal::Return(_) => return Ok(ret),
                    }
                    if !self.eval(cond)?.is_truthy() {
                        break;
                    }
                }
                Ok(Signal::Normal)
            }
            StmtKind::ForClassic { init, cond, step, body } => {
                self.exec_stmt(init)?;
                while self.eval(cond)?.is_truthy() {
                    match self.exec_block(body)? {
                        // The step still runs after a continue
                        Signal::Normal | Signal::Continue => {}
                        Signal::Break => break,
                        ret @ Signal::Return(_) => return Ok(ret),
                    }
                    self.exec_stmt(step)?;
                }
                Ok(Signal::Normal)
            }
            StmtKind::RangeLoop { var, start, end, body } => {
                self.exec_range_loop(var, start, end, body, stmt.line)
            }
            StmtKind::FunctionDecl(func) => {
                self.functions.insert(func.name.clone(), Rc::new(func.clone()));
                Ok(Signal::Normal)
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                Ok(Signal::Return(value))
            }
            StmtKind::Break => Ok(Signal::Break),
            StmtKind::Continue => Ok(Signal::Continue),
            StmtKind::ClassDecl { name, constructor, methods } => {
                let mut method_table = AHashMap::new();
                for method in methods {
                    method_table.insert(method.name.clone(), method.clone());
                }
                let class = ClassDef {
                    name: name.clone(),
                    constructor: constructor.clone(),
                    methods: method_table,
                };
                self.classes.insert(name.clone(), Rc::new(class));
                Ok(Signal::Normal)
            }
            StmtKind::ObjectNew { var, class, args } => {
                let object = self.instantiate(class, args)?;
                self.env.set(var.clone(), object);
                Ok(Signal::Normal)
            }
            StmtKind::Expr(expr) => {
                self.exec_expr_stmt(expr)?;
                Ok(Signal::Normal)
            }
            StmtKind::TryRescue { try_block, error_var, rescue_block } => {
                self.exec_try_rescue(try_block, error_var, rescue_block.as_deref())
            }
            StmtKind::Forge { kind, name } => {
                let container = match kind {
                    ContainerKind::Stack => Value::Stack(Rc::new(RefCell::new(Vec::new()))),
                    ContainerKind::Queue => Value::Queue(Rc::new(RefCell::new(VecDeque::new()))),
                    ContainerKind::LinkedList => Value::List(Rc::new(RefCell::new(Vec::new()))),
                    ContainerKind::Grimoire => Value::Map(Rc::new(RefCell::new(AHashMap::new()))),
                };
                self.containers.insert(name.clone(), container);
                self.host.print(&format!("Forged {} '{}'", kind.name(), name));
                Ok(Signal::Normal)
            }
            StmtKind::FileRead { path, var } => {
                let content = self.host.read_file(path).map_err(|e| {
                    self.runtime_error(format!("Could not read file '{}': {}", path, e))
                })?;
                self.env.set(var.clone(), Value::str(content));
                Ok(Signal::Normal)
            }
            StmtKind::FileWrite { path, value } => {
                let value = self.eval(value)?;
                self.host.write_file(path, &format!("{}", value)).map_err(|e| {
                    self.runtime_error(format!("Could not write file '{}': {}", path, e))
                })?;
                Ok(Signal::Normal)
            }
            StmtKind::FileAppend { path, value } => {
                let value = self.eval(value)?;
                self.host.append_file(path, &format!("{}\n", value)).map_err(|e| {
                    self.runtime_error(format!("Could not append to file '{}': {}", path, e))
                })?;
                Ok(Signal::Normal)
            }
            StmtKind::ModuleImport { path, alias } => {
                let alias = alias.clone().unwrap_or_else(|| {
                    Path::new(path)
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.clone())
                });
                let module = self
                    .module_loader
                    .load(path, &self.host)
                    .map_err(|e| self.runtime_error(e.message))?;
                self.modules.insert(alias, module);
                Ok(Signal::Normal)
            }
        }
    }

    /// `stride`/`loop`: inclusive bounds, end re-evaluated every iteration,
    /// induction variable restored or removed on exit so it does not leak
    /// into the enclosing scope.
    fn exec_range_loop(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        body: &[Stmt],
        line: usize,
    ) -> Result<Signal, SoutkError> {
        let start = self.range_bound(start, line)?;
        let shadowed = self.env.scopes.last().and_then(|scope| scope.get(var).cloned());

        let mut result = Ok(Signal::Normal);
        let mut i = start;
        loop {
            let end = match self.range_bound(end, line) {
                Ok(end) => end,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            };
            if i > end {
                break;
            }
            self.env.define(var.to_string(), Value::Int(i));
            match self.exec_block(body) {
                // The induction variable still advances after a continue
                Ok(Signal::Normal) | Ok(Signal::Continue) => {}
                Ok(Signal::Break) => break,
                Ok(ret @ Signal::Return(_)) => {
                    result = Ok(ret);
                    break;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
            i += 1;
        }

        if let Some(scope) = self.env.scopes.last_mut() {
            scope.remove(var);
            if let Some(old) = shadowed {
                scope.insert(var.to_string(), old);
            }
        }
        result
    }

    fn range_bound(&mut self, expr: &Expr, line: usize) -> Result<i64, SoutkError> {
        match self.eval(expr)? {
            Value::Int(n) => Ok(n),
            Value::Float(n) => Ok(n as i64),
            other => Err(SoutkError::runtime_error(
                format!("Range loop bounds must be numbers, got {}", other.type_name()),
                line,
            )),
        }
    }

    fn exec_try_rescue(
        &mut self,
        try_block: &[Stmt],
        error_var: &str,
        rescue_block: Option<&[Stmt]>,
    ) -> Result<Signal, SoutkError> {
        match self.exec_block(try_block) {
            Ok(signal) => Ok(signal),
            Err(e) if e.is_recoverable() => {
                let Some(rescue_block) = rescue_block else {
                    // No rescue block: the error continues to the caller
                    return Err(e);
                };
                let shadowed =
                    self.env.scopes.last().and_then(|scope| scope.get(error_var).cloned());
                self.env.define(error_var.to_string(), Value::str(e.message));
                let result = self.exec_block(rescue_block);
                if let Some(scope) = self.env.scopes.last_mut() {
                    scope.remove(error_var);
                    if let Some(old) = shadowed {
                        scope.insert(error_var.to_string(), old);
                    }
                }
                result
            }
            Err(e) => Err(e),
        }
    }

    fn assign(&mut self, target: &AssignTarget, value: Value) -> Result<(), SoutkError> {
        match target {
            AssignTarget::Name(name) => {
                self.env.set(name.clone(), value);
                Ok(())
            }
            AssignTarget::Index { name, index } => {
                let container = self.lookup_identifier(name)?;
                let index = self.eval(index)?;
                match container {
                    Value::Array(items) => {
                        let i = self.array_index(&index, items.borrow().len())?;
                        items.borrow_mut()[i] = value;
                        Ok(())
                    }
                    Value::Map(entries) => {
                        let key = collections::map_key(&index)
                            .map_err(|msg| self.runtime_error(msg))?;
                        entries.borrow_mut().insert(key, value);
                        Ok(())
                    }
                    other => Err(self.runtime_error(format!(
                        "'{}' is not indexable (found {})",
                        name,
                        other.type_name()
                    ))),
                }
            }
            AssignTarget::Attribute { object, attr } => {
                let target = self.lookup_identifier(object)?;
                match target {
                    Value::Object(obj) => {
                        obj.borrow_mut().attributes.insert(attr.clone(), value);
                        Ok(())
                    }
                    other => Err(self.runtime_error(format!(
                        "'{}' is not an object (found {})",
                        object,
                        other.type_name()
                    ))),
                }
            }
        }
    }

    /// Expression in statement position. A container command (push, pop,
    /// showstack, ...) prints its structured diagnostic line here; the same
    /// method used inside an expression stays silent.
    fn exec_expr_stmt(&mut self, expr: &Expr) -> Result<Value, SoutkError> {
        if let Expr::MethodCall { object, method, args } = expr {
            if let Expr::Identifier(name) = object.as_ref() {
                if let Ok(receiver) = self.lookup_identifier(name) {
                    if let Some(kind_word) = container_kind_word(&receiver) {
                        let mut arg_values = Vec::with_capacity(args.len());
                        for arg in args {
                            arg_values.push(self.eval(arg)?);
                        }
                        let result = self
                            .container_method(&receiver, method, &arg_values)
                            .map_err(|msg| self.runtime_error(msg))?;
                        self.print_command_diagnostic(
                            kind_word,
                            name,
                            method,
                            &arg_values,
                            &result,
                        );
                        return Ok(result);
                    }
                }
            }
        }
        self.eval(expr)
    }

    fn print_command_diagnostic(
        &self,
        kind: &str,
        name: &str,
        method: &str,
        args: &[Value],
        result: &Value,
    ) {
        let line = match method {
            "push" => format!("Pushed {} onto {} '{}'", result, kind, name),
            "pop" => match result {
                Value::Null => format!("Stack '{}' is empty", name),
                value => format!("Popped {} from stack '{}'", value, name),
            },
            "peek" => match result {
                Value::Null => format!("Stack '{}' is empty", name),
                value => format!("Top of stack '{}': {}", name, value),
            },
            "enqueue" => format!("Enqueued {} into queue '{}'", result, name),
            "dequeue" => match result {
                Value::Null => format!("Queue '{}' is empty", name),
                value => format!("Dequeued {} from queue '{}'", value, name),
            },
            "front" => match result {
                Value::Null => format!("Queue '{}' is empty", name),
                value => format!("Front of queue '{}': {}", name, value),
            },
            "show" => match kind {
                "queue" => format!("Queue '{}': {}", name, result),
                _ => format!("Stack '{}': {}", name, result),
            },
            "link" => format!("Linked {} into list '{}'", result, name),
            "unlink" => match result {
                Value::Bool(true) => {
                    format!("Unlinked {} from list '{}'", args[0], name)
                }
                _ => format!("Value {} not found in list '{}'", args[0], name),
            },
            "insertafter" => match result {
                Value::Bool(true) => {
                    format!("Inserted {} after {} in list '{}'", args[1], args[0], name)
                }
                _ => format!("Value {} not found in list '{}'", args[0], name),
            },
            "traverse" => format!("List '{}': {}", name, result),
            "isempty" => match result {
                Value::Bool(true) => format!("'{}' is empty", name),
                _ => format!("'{}' is not empty", name),
            },
            // lookup/keys/values/bind stay silent in statement position
            _ => return,
        };
        self.host.print(&line);
    }

    // ------------------------------------------------------------------
    // Expression evaluation
    // ------------------------------------------------------------------

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, SoutkError> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Str(s) => Ok(Value::str_ref(s)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Identifier(name) => self.lookup_identifier(name),
            Expr::Concat(parts) => self.eval_concat(parts),
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Unary { operand } => match self.eval(operand)? {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Float(n) => Ok(Value::Float(-n)),
                other => Err(self.runtime_error(format!(
                    "Cannot negate a {}",
                    other.type_name()
                ))),
            },
            Expr::Not(operand) => {
                let value = self.eval(operand)?;
                Ok(Value::Bool(!value.is_truthy()))
            }
            Expr::Call { name, args } => self.eval_call(name, args),
            Expr::Index { target, index } => {
                let container = self.eval(target)?;
                let index = self.eval(index)?;
                self.eval_index(&container, &index)
            }
            Expr::Attribute { object, name } => self.eval_attribute(object, name),
            Expr::MethodCall { object, method, args } => {
                self.eval_method_call(object, method, args)
            }
            Expr::ArrayLiteral(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::array(values))
            }
        }
    }

    fn lookup_identifier(&self, name: &str) -> Result<Value, SoutkError> {
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        if let Some(value) = self.containers.get(name) {
            return Ok(value.clone());
        }
        let err = self.runtime_error(format!("Variable '{}' is not defined", name));
        let mut candidates: Vec<String> =
            self.env.visible_names().map(|s| s.to_string()).collect();
        candidates.extend(self.containers.keys().cloned());
        Err(self.suggest(err, name, candidates))
    }

    /// The `+` chain: if every operand is numeric the chain folds
    /// arithmetically, otherwise every operand is rendered to its canonical
    /// text and joined left to right. The decision is made once per chain
    /// from the evaluated operand types.
    fn eval_concat(&mut self, parts: &[Expr]) -> Result<Value, SoutkError> {
        let mut values = Vec::with_capacity(parts.len());
        for part in parts {
            values.push(self.eval(part)?);
        }

        let all_numeric = values.iter().all(|v| v.is_numeric() || matches!(v, Value::Null));
        if all_numeric {
            let any_float = values.iter().any(|v| matches!(v, Value::Float(_)));
            if any_float {
                let sum = values.iter().map(|v| v.as_f64().unwrap_or(0.0)).sum();
                return Ok(Value::Float(sum));
            }
            let mut sum: i64 = 0;
            for value in &values {
                if let Value::Int(n) = value {
                    sum += n;
                }
            }
            return Ok(Value::Int(sum));
        }

        let mut joined = String::new();
        for value in &values {
            joined.push_str(&format!("{}", value));
        }
        Ok(Value::str(joined))
    }

    fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<Value, SoutkError> {
        // Short-circuit forms evaluate the right side only when needed
        match op {
            BinOp::And => {
                let left = self.eval(left)?;
                if !left.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                let right = self.eval(right)?;
                return Ok(Value::Bool(right.is_truthy()));
            }
            BinOp::Or => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                let right = self.eval(right)?;
                return Ok(Value::Bool(right.is_truthy()));
            }
            _ => {}
        }

        let lhs = self.eval(left)?;
        let rhs = self.eval(right)?;

        match op {
            BinOp::Eq => Ok(Value::Bool(lhs.loosely_equals(&rhs))),
            BinOp::Ne => Ok(Value::Bool(!lhs.loosely_equals(&rhs))),
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => self.compare(op, &lhs, &rhs),
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                self.arithmetic(op, &lhs, &rhs)
            }
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn compare(&self, op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, SoutkError> {
        if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
            let ordering = a.cmp(b);
            return Ok(Value::Bool(match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Gt => ordering.is_gt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Ge => ordering.is_ge(),
                _ => unreachable!(),
            }));
        }
        match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Bool(match op {
                BinOp::Lt => a < b,
                BinOp::Gt => a > b,
                BinOp::Le => a <= b,
                BinOp::Ge => a >= b,
                _ => unreachable!(),
            })),
            _ => Err(self.runtime_error(format!(
                "Cannot compare {} and {} with '{}'",
                lhs.type_name(),
                rhs.type_name(),
                op.symbol()
            ))),
        }
    }

    /// -, *, /, % apply only to numbers; a mixed Int/Float pair promotes to
    /// Float. Division is true division and always yields a Float; dividing
    /// by zero is a runtime error.
    fn arithmetic(&self, op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, SoutkError> {
        if !lhs.is_numeric() || !rhs.is_numeric() {
            return Err(self.runtime_error(format!(
                "Operator '{}' expects numbers, got {} and {}",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            )));
        }

        if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
            return match op {
                BinOp::Sub => Ok(Value::Int(a - b)),
                BinOp::Mul => Ok(Value::Int(a * b)),
                BinOp::Div => {
                    if *b == 0 {
                        Err(self.runtime_error("Division by zero".to_string()))
                    } else {
                        Ok(Value::Float(*a as f64 / *b as f64))
                    }
                }
                BinOp::Mod => {
                    if *b == 0 {
                        Err(self.runtime_error("Modulo by zero".to_string()))
                    } else {
                        Ok(Value::Int(a % b))
                    }
                }
                _ => unreachable!(),
            };
        }

        let a = lhs.as_f64().unwrap_or(0.0);
        let b = rhs.as_f64().unwrap_or(0.0);
        match op {
            BinOp::Sub => Ok(Value::Float(a - b)),
            BinOp::Mul => Ok(Value::Float(a * b)),
            BinOp::Div => {
                if b == 0.0 {
                    Err(self.runtime_error("Division by zero".to_string()))
                } else {
                    Ok(Value::Float(a / b))
                }
            }
            BinOp::Mod => {
                if b == 0.0 {
                    Err(self.runtime_error("Modulo by zero".to_string()))
                } else {
                    Ok(Value::Float(a % b))
                }
            }
            _ => unreachable!(),
        }
    }

    fn array_index(&self, index: &Value, len: usize) -> Result<usize, SoutkError> {
        match index {
            Value::Int(n) => {
                if *n < 0 || *n as usize >= len {
                    Err(self.runtime_error(format!(
                        "Array index {} out of range (length {})",
                        n, len
                    )))
                } else {
                    Ok(*n as usize)
                }
            }
            other => Err(self.runtime_error(format!(
                "Array indices must be integers, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval_index(&self, container: &Value, index: &Value) -> Result<Value, SoutkError> {
        match container {
            Value::Array(items) => {
                let items = items.borrow();
                let i = self.array_index(index, items.len())?;
                Ok(items[i].clone())
            }
            Value::Map(entries) => {
                let key = collections::map_key(index).map_err(|msg| self.runtime_error(msg))?;
                entries.borrow().get(&key).cloned().ok_or_else(|| {
                    self.runtime_error(format!("Key '{}' not found in grimoire", key))
                })
            }
            other => Err(self.runtime_error(format!(
                "Only arrays and grimoires can be indexed, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval_attribute(&mut self, object: &Expr, name: &str) -> Result<Value, SoutkError> {
        // A namespace alias shadows nothing: variables win, modules fill in
        if let Expr::Identifier(alias) = object {
            if self.env.get(alias).is_none() && !self.containers.contains_key(alias) {
                if let Some(module) = self.modules.get(alias) {
                    return self.module_symbol(&Rc::clone(module), name);
                }
            }
        }
        let value = self.eval(object)?;
        match value {
            Value::Object(obj) => {
                let obj = obj.borrow();
                obj.attributes.get(name).cloned().ok_or_else(|| {
                    self.runtime_error(format!(
                        "Object of class '{}' has no attribute '{}'",
                        obj.class.name, name
                    ))
                })
            }
            other => Err(self.runtime_error(format!(
                "Cannot read attribute '{}' of a {}",
                name,
                other.type_name()
            ))),
        }
    }

    fn module_symbol(&self, module: &Rc<Module>, name: &str) -> Result<Value, SoutkError> {
        if let Some(value) = module.variables.get(name) {
            return Ok(value.clone());
        }
        if let Some(func) = module.functions.get(name) {
            return Ok(Value::Function(Rc::clone(func)));
        }
        if let Some(class) = module.classes.get(name) {
            return Ok(Value::Class(Rc::clone(class)));
        }
        Err(self.runtime_error(format!(
            "Module '{}' has no symbol '{}'",
            module.name, name
        )))
    }

    fn eval_call(&mut self, name: &str, args: &[Expr]) -> Result<Value, SoutkError> {
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg)?);
        }

        // A spell defined by the module currently executing wins, so module
        // spells can call their siblings
        if let Some(module) = self.module_context.last() {
            if let Some(func) = module.functions.get(name) {
                let func = Rc::clone(func);
                return self.call_spell(&func, arg_values, None);
            }
        }

        if let Some(func) = self.functions.get(name) {
            let func = Rc::clone(func);
            return self.call_spell(&func, arg_values, None);
        }

        if let Some(result) = native_functions::call_native(self.host.as_ref(), name, &arg_values)
        {
            return result.map_err(|msg| self.runtime_error(msg));
        }

        let err = self.runtime_error(format!("Spell '{}' is not defined", name));
        let mut candidates: Vec<String> = self.functions.keys().cloned().collect();
        candidates.extend(native_functions::native_names().iter().map(|s| s.to_string()));
        Err(self.suggest(err, name, candidates))
    }

    /// Calls a spell: validates the argument count, binds parameters in a
    /// fresh child scope (discarded on return), and interprets the
    /// resulting signal. A missing return yields 0.
    fn call_spell(
        &mut self,
        func: &FuncDef,
        args: Vec<Value>,
        this: Option<Value>,
    ) -> Result<Value, SoutkError> {
        if args.len() != func.params.len() {
            return Err(self.runtime_error(format!(
                "Spell '{}' expects {} argument{}, got {}",
                func.name,
                func.params.len(),
                if func.params.len() == 1 { "" } else { "s" },
                args.len()
            )));
        }

        self.env.push_scope();
        if let Some(this) = this {
            self.env.define("this".to_string(), this);
        }
        for (param, arg) in func.params.iter().zip(args) {
            self.env.define(param.clone(), arg);
        }
        let result = self.exec_block(&func.body);
        self.env.pop_scope();

        match result? {
            Signal::Normal | Signal::Return(Value::Null) => Ok(Value::Int(0)),
            Signal::Return(value) => Ok(value),
            signal => Err(self.runtime_error(format!(
                "'{}' outside of a loop",
                signal.keyword()
            ))),
        }
    }

    /// Allocates an object, runs the constructor (if any) with `this` bound
    /// in a temporary scope, and returns the object.
    fn instantiate(&mut self, class_name: &str, args: &[Expr]) -> Result<Value, SoutkError> {
        let Some(class) = self.classes.get(class_name).map(Rc::clone) else {
            let err = self.runtime_error(format!("Class '{}' is not defined", class_name));
            let candidates: Vec<String> = self.classes.keys().cloned().collect();
            return Err(self.suggest(err, class_name, candidates));
        };

        let object = Value::Object(Rc::new(RefCell::new(Object {
            class: Rc::clone(&class),
            attributes: AHashMap::new(),
        })));

        if let Some(ref constructor) = class.constructor {
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                arg_values.push(self.eval(arg)?);
            }
            if arg_values.len() != constructor.params.len() {
                return Err(self.runtime_error(format!(
                    "Constructor of class '{}' expects {} argument{}, got {}",
                    class.name,
                    constructor.params.len(),
                    if constructor.params.len() == 1 { "" } else { "s" },
                    arg_values.len()
                )));
            }
            self.env.push_scope();
            self.env.define("this".to_string(), object.clone());
            for (param, arg) in constructor.params.iter().zip(arg_values) {
                self.env.define(param.clone(), arg);
            }
            let result = self.exec_block(&constructor.body);
            self.env.pop_scope();
            match result? {
                // Constructors do not return values; a stray return is ignored
                Signal::Normal | Signal::Return(_) => {}
                signal => {
                    return Err(self.runtime_error(format!(
                        "'{}' outside of a loop",
                        signal.keyword()
                    )))
                }
            }
        } else if !args.is_empty() {
            return Err(self.runtime_error(format!(
                "Class '{}' has no constructor but was given {} argument{}",
                class.name,
                args.len(),
                if args.len() == 1 { "" } else { "s" }
            )));
        }

        Ok(object)
    }

    /// Method dispatch on the runtime tag of the receiver: strings get the
    /// string method table, containers their command table, objects their
    /// class method table, module aliases their exported spells.
    fn eval_method_call(
        &mut self,
        object: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<Value, SoutkError> {
        if let Expr::Identifier(alias) = object {
            if self.env.get(alias).is_none() && !self.containers.contains_key(alias) {
                if let Some(module) = self.modules.get(alias).map(Rc::clone) {
                    return self.call_module_spell(&module, method, args);
                }
            }
        }

        let receiver = self.eval(object)?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg)?);
        }

        match &receiver {
            Value::Str(s) => native_functions::strings::method(s, method, &arg_values)
                .map_err(|msg| self.runtime_error(msg)),
            Value::Stack(_) | Value::Queue(_) | Value::List(_) | Value::Map(_) => self
                .container_method(&receiver, method, &arg_values)
                .map_err(|msg| self.runtime_error(msg)),
            Value::Object(obj) => {
                let (class, method_def) = {
                    let obj = obj.borrow();
                    let method_def = obj.class.methods.get(method).cloned();
                    (Rc::clone(&obj.class), method_def)
                };
                let Some(method_def) = method_def else {
                    return Err(self.runtime_error(format!(
                        "Method '{}' not found in class '{}'",
                        method, class.name
                    )));
                };
                self.call_spell(&method_def, arg_values, Some(receiver.clone()))
            }
            other => Err(self.runtime_error(format!(
                "A {} has no method '{}'",
                other.type_name(),
                method
            ))),
        }
    }

    fn container_method(
        &self,
        receiver: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, String> {
        match receiver {
            Value::Stack(items) => collections::stack_method(items, method, args),
            Value::Queue(items) => collections::queue_method(items, method, args),
            Value::List(items) => collections::list_method(items, method, args),
            Value::Map(entries) => collections::map_method(entries, method, args),
            other => Err(format!("A {} has no method '{}'", other.type_name(), method)),
        }
    }

    /// Calls a spell exported by a module namespace. The module's top-level
    /// variables are visible for the duration of the call.
    fn call_module_spell(
        &mut self,
        module: &Rc<Module>,
        name: &str,
        args: &[Expr],
    ) -> Result<Value, SoutkError> {
        let Some(func) = module.functions.get(name).map(Rc::clone) else {
            return Err(self.runtime_error(format!(
                "Module '{}' has no spell '{}'",
                module.name, name
            )));
        };
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg)?);
        }

        self.env.push_scope();
        for (var, value) in &module.variables {
            self.env.define(var.clone(), value.clone());
        }
        self.module_context.push(Rc::clone(module));
        let result = self.call_spell(&func, arg_values, None);
        self.module_context.pop();
        self.env.pop_scope();
        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn container_kind_word(value: &Value) -> Option<&'static str> {
    match value {
        Value::Stack(_) => Some("stack"),
        Value::Queue(_) => Some("queue"),
        Value::List(_) => Some("linklist"),
        Value::Map(_) => Some("grimoire"),
        _ => None,
    }
}
