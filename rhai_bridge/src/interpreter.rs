//! The embedded interpreter.
//!
//! One `Interpreter` owns a Rhai engine, a persistent global scope, and the
//! accumulated function definitions of everything loaded into it. Files run
//! with `do_file` and modules pulled in with `use_module` all contribute
//! functions, so a handler defined anywhere can be called by name. Their
//! top-level `import`s are kept too and re-run before each call, so those
//! functions can still reach the modules they imported.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use liblogger::{log_debug, log_error, log_info};
use rhai::module_resolvers::{FileModuleResolver, ModuleResolversCollection};
use rhai::{CallFnOptions, Dynamic, Engine, FuncArgs, Module, Scope, Stmt, AST};

use crate::config::InterpreterConfig;
use crate::context::register_context_api;
use crate::error::BridgeError;

/// Evaluated once at start-up so a broken engine fails `init`, not the first request.
pub const BOOTSTRAP_SCRIPT: &str = "0";

/// Module loaded by `load_cannoli("")`.
pub const CANONICAL_MODULE: &str = "cannoli";

pub const SCRIPT_EXTENSION: &str = "rhai";

/// Expression depth limits used unless `[bridge]` overrides them. Debug
/// builds of the engine default to much lower limits than release builds.
pub const DEFAULT_MAX_EXPR_DEPTH: usize = 64;
pub const DEFAULT_MAX_FUNCTION_EXPR_DEPTH: usize = 32;

const BUNDLED_CANNOLI: &str = include_str!("../scripts/cannoli.rhai");

pub struct Interpreter {
    pub(crate) engine: Engine,
    scope: Scope<'static>,
    pub(crate) program: AST,
    include_paths: Vec<PathBuf>,
    loaded_modules: HashSet<String>,
    required_files: HashSet<PathBuf>,
    last_error: Option<String>,
}

impl Interpreter {
    pub fn new(config: &InterpreterConfig) -> Result<Self, BridgeError> {
        let mut engine = Engine::new();
        if let Some(max) = config.max_operations {
            engine.set_max_operations(max);
        }
        if let Some(levels) = config.max_call_levels {
            engine.set_max_call_levels(levels);
        }
        engine.set_max_expr_depths(
            config.max_expr_depth.unwrap_or(DEFAULT_MAX_EXPR_DEPTH),
            config
                .max_function_expr_depth
                .unwrap_or(DEFAULT_MAX_FUNCTION_EXPR_DEPTH),
        );
        engine.on_print(|text| log_info!(&format!("[script] {}", text)));
        engine.on_debug(|text, source, pos| {
            log_debug!(&format!("[script] {} {} {}", source.unwrap_or("<eval>"), pos, text))
        });
        register_context_api(&mut engine);

        let mut interpreter = Interpreter {
            engine,
            scope: Scope::new(),
            program: AST::empty(),
            include_paths: Vec::new(),
            loaded_modules: HashSet::new(),
            required_files: HashSet::new(),
            last_error: None,
        };

        interpreter
            .engine
            .run_with_scope(&mut interpreter.scope, BOOTSTRAP_SCRIPT)
            .map_err(|e| BridgeError::Bootstrap(e.to_string()))?;

        for dir in &config.include_paths {
            interpreter.add_include_path(dir)?;
        }

        Ok(interpreter)
    }

    /// Append a directory to the module search path.
    pub fn add_include_path(&mut self, dir: impl AsRef<Path>) -> Result<(), BridgeError> {
        let dir = dir.as_ref();
        let result = if dir.as_os_str().is_empty() {
            Err(BridgeError::MissingArgument("include path"))
        } else {
            self.include_paths.push(dir.to_path_buf());
            self.install_module_resolver();
            Ok(())
        };
        self.record("add_inc", result)
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    // Scripts can `import` from the same directories `use_module` searches.
    fn install_module_resolver(&mut self) {
        let mut resolvers = ModuleResolversCollection::new();
        for dir in &self.include_paths {
            resolvers.push(FileModuleResolver::new_with_path(dir.clone()));
        }
        self.engine.set_module_resolver(resolvers);
    }

    fn locate_module(&self, name: &str) -> Option<PathBuf> {
        let relative = module_relative_path(name);
        self.include_paths
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
    }

    /// Load a module by name (`Foo::Bar` → `Foo/Bar.rhai` on the include
    /// paths). Its functions become callable both by bare name and as
    /// `Foo::Bar::f`. Loading the same name twice is a no-op.
    pub fn use_module(&mut self, name: &str) -> Result<(), BridgeError> {
        let result = self.import_module(name);
        self.record("use", result)
    }

    fn import_module(&mut self, name: &str) -> Result<(), BridgeError> {
        if name.is_empty() {
            return Err(BridgeError::MissingArgument("module name"));
        }
        if !is_valid_symbol(name) {
            return Err(BridgeError::InvalidName(name.to_string()));
        }
        if self.loaded_modules.contains(name) {
            return Ok(());
        }

        let path = self
            .locate_module(name)
            .ok_or_else(|| BridgeError::ModuleNotFound {
                name: name.to_string(),
                searched: self.include_paths.len(),
            })?;
        let ast = self.engine.compile_file(path.clone())?;
        self.install_module(name, ast)?;
        log_debug!(&format!("loaded module {} from {}", name, path.display()));
        Ok(())
    }

    fn install_module(&mut self, name: &str, ast: AST) -> Result<(), BridgeError> {
        let module = Module::eval_ast_as_new(Scope::new(), &ast, &self.engine)?;
        self.engine.register_static_module(name, module.into());
        self.program.combine(persistent_part(&ast));
        self.loaded_modules.insert(name.to_string());
        Ok(())
    }

    /// Compile and run a script file in the global scope. Runs again on
    /// every call.
    pub fn do_file(&mut self, path: &str) -> Result<(), BridgeError> {
        let result = self.run_file(path).map(|_| ());
        self.record("do", result)
    }

    fn run_file(&mut self, path: &str) -> Result<Dynamic, BridgeError> {
        if path.is_empty() {
            return Err(BridgeError::MissingArgument("script path"));
        }
        let ast = self.engine.compile_file(PathBuf::from(path))?;
        self.run_program(ast)
    }

    // Run `ast` with every known function visible, then keep its functions
    // and imports.
    fn run_program(&mut self, ast: AST) -> Result<Dynamic, BridgeError> {
        let runnable = self.program.merge(&ast);
        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut self.scope, &runnable)?;
        self.program.combine(persistent_part(&ast));
        Ok(value)
    }

    /// Load the context module: the file at `path` (once per path), or the
    /// canonical module when `path` is empty. The canonical module is looked
    /// up on the include paths first and falls back to the bundled copy.
    pub fn load_cannoli(&mut self, path: &str) -> Result<(), BridgeError> {
        let result = if path.is_empty() {
            self.load_canonical_module()
        } else {
            self.require_file(path)
        };
        self.record("load_cannoli", result)
    }

    fn require_file(&mut self, path: &str) -> Result<(), BridgeError> {
        let key = PathBuf::from(path);
        if self.required_files.contains(&key) {
            return Ok(());
        }
        self.run_file(path)?;
        self.required_files.insert(key);
        Ok(())
    }

    fn load_canonical_module(&mut self) -> Result<(), BridgeError> {
        if self.loaded_modules.contains(CANONICAL_MODULE) {
            return Ok(());
        }
        if self.locate_module(CANONICAL_MODULE).is_some() {
            return self.import_module(CANONICAL_MODULE);
        }
        let ast = self.engine.compile(BUNDLED_CANNOLI)?;
        self.install_module(CANONICAL_MODULE, ast)
    }

    /// Evaluate a snippet in the global scope and render its value.
    pub fn eval(&mut self, code: &str) -> Result<String, BridgeError> {
        let result = self
            .engine
            .compile(code)
            .map_err(BridgeError::from)
            .and_then(|ast| self.run_program(ast))
            .map(display_value);
        self.record("eval", result)
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn note_error(&mut self, action: &str, message: &str) {
        log_error!(&format!("rhai_bridge: {} error: {}", action, message));
        self.last_error = Some(message.to_string());
    }

    fn record<T>(&mut self, action: &str, result: Result<T, BridgeError>) -> Result<T, BridgeError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(err) => self.note_error(action, &err.to_string()),
        }
        result
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.program.iter_functions().any(|f| f.name == name)
    }

    /// Call a script function by (optionally `::`-qualified) name.
    pub(crate) fn call_function(&self, name: &str, args: impl FuncArgs) -> Result<Dynamic, BridgeError> {
        if !is_valid_symbol(name) {
            return Err(BridgeError::InvalidName(name.to_string()));
        }
        if name.contains("::") {
            return self.call_qualified(name, args);
        }

        // Evaluating the program only re-runs the kept imports.
        let options = CallFnOptions::new().eval_ast(true).rewind_scope(true);
        let value = self.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut Scope::new(),
            &self.program,
            name,
            args,
        )?;
        Ok(value)
    }

    // Namespaced functions live in registered modules, which `call_fn` does
    // not search. Compile a one-line call expression instead.
    fn call_qualified(&self, name: &str, args: impl FuncArgs) -> Result<Dynamic, BridgeError> {
        let mut values: Vec<Dynamic> = Vec::new();
        args.parse(&mut values);

        let mut scope = Scope::new();
        let mut params = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let var = format!("bridge_arg{}", index);
            scope.push_dynamic(var.clone(), value);
            params.push(var);
        }

        let call = self
            .engine
            .compile_expression(format!("{}({})", name, params.join(", ")))?;
        let runnable = self.program.merge(&call);
        Ok(self.engine.eval_ast_with_scope::<Dynamic>(&mut scope, &runnable)?)
    }

    /// Call a nullary script function with `target` bound as `this`.
    pub(crate) fn call_method(&self, target: &mut Dynamic, name: &str) -> Result<Dynamic, BridgeError> {
        let options = CallFnOptions::new()
            .eval_ast(true)
            .rewind_scope(true)
            .bind_this_ptr(target);
        let value = self.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut Scope::new(),
            &self.program,
            name,
            (),
        )?;
        Ok(value)
    }
}

/// The part of a loaded script that outlives its run: function definitions
/// and top-level `import` statements.
fn persistent_part(ast: &AST) -> AST {
    let imports = ast
        .statements()
        .iter()
        .filter(|stmt| matches!(stmt, Stmt::Import(..)))
        .cloned()
        .collect::<Vec<_>>();
    let mut kept = AST::new(imports, Module::new());
    kept.combine(ast.clone_functions_only());
    kept
}

/// `Foo::Bar` → `Foo/Bar.rhai`.
pub fn module_relative_path(name: &str) -> PathBuf {
    let mut path: PathBuf = name.split("::").collect();
    path.set_extension(SCRIPT_EXTENSION);
    path
}

/// Identifier segments joined by `::`.
pub fn is_valid_symbol(name: &str) -> bool {
    !name.is_empty()
        && name.split("::").all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Script value as the host sees it: unit is empty, strings are verbatim.
pub fn display_value(value: Dynamic) -> String {
    if value.is_unit() {
        String::new()
    } else {
        value.to_string()
    }
}
