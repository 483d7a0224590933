// File: src/module.rs
//
// Module loading for `invoke "path" as alias`. A module is executed by a
// fresh interpreter instance in complete isolation; its top-level spell,
// variable, and class tables are then snapshotted into a namespace entry
// the importing program reaches through the alias. Nothing is merged into
// the importer's own globals.

use crate::ast::FuncDef;
use crate::errors::SoutkError;
use crate::interpreter::{ClassDef, HostIo, Interpreter, Value};
use ahash::AHashMap;
use std::rc::Rc;

/// Represents a loaded module with its exported symbols
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub path: String,
    pub functions: AHashMap<String, Rc<FuncDef>>,
    pub variables: AHashMap<String, Value>,
    pub classes: AHashMap<String, Rc<ClassDef>>,
}

/// Manages module loading and caching
pub struct ModuleLoader {
    /// Cache of loaded modules to avoid re-executing a file per import
    loaded_modules: AHashMap<String, Rc<Module>>,
    /// Stack of modules currently being loaded (for circular import detection)
    loading_stack: Vec<String>,
}

impl ModuleLoader {
    pub fn new() -> Self {
        ModuleLoader { loaded_modules: AHashMap::new(), loading_stack: Vec::new() }
    }

    /// Loads a module by path, returning the cached version if available.
    /// The file is read through the host capability and executed by a fresh
    /// interpreter sharing that host.
    pub fn load(
        &mut self,
        path: &str,
        host: &Rc<dyn HostIo>,
    ) -> Result<Rc<Module>, SoutkError> {
        if let Some(module) = self.loaded_modules.get(path) {
            return Ok(Rc::clone(module));
        }

        if self.loading_stack.iter().any(|p| p == path) {
            return Err(SoutkError::runtime_error(
                format!("Circular import detected: {}", path),
                0,
            ));
        }

        let source = host.read_file(path).map_err(|e| {
            SoutkError::runtime_error(format!("Module '{}' could not be read: {}", path, e), 0)
        })?;

        self.loading_stack.push(path.to_string());
        let result = self.execute_module(path, &source, host);
        self.loading_stack.pop();

        let module = result?;
        self.loaded_modules.insert(path.to_string(), Rc::clone(&module));
        Ok(module)
    }

    fn execute_module(
        &mut self,
        path: &str,
        source: &str,
        host: &Rc<dyn HostIo>,
    ) -> Result<Rc<Module>, SoutkError> {
        let mut interpreter = Interpreter::with_host(Rc::clone(host));
        interpreter.source_file = Some(path.to_string());
        // The nested interpreter borrows this loader's state so the cache and
        // the circular-import check span the whole import chain
        interpreter.module_loader = std::mem::take(self);
        let run_result = interpreter.run(source);
        *self = std::mem::take(&mut interpreter.module_loader);
        run_result.map_err(|e| {
            SoutkError::runtime_error(
                format!("Error importing module '{}': {}", path, e.message),
                0,
            )
        })?;

        let name = std::path::Path::new(path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());

        Ok(Rc::new(Module {
            name,
            path: path.to_string(),
            functions: interpreter.functions,
            variables: interpreter.env.globals(),
            classes: interpreter.classes,
        }))
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}
