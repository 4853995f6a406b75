//! Host bridge: namespaces, loading entry points and native registration
//!
//! A [`Runtime`] owns the two namespaces scripts see. `env` holds host
//! bindings and is read first; `globals` is what scripts write.

use std::io::Read;
use std::rc::Rc;

use thorn_builtins::LibraryState;
use thorn_bytecode::{has_chunk_signature, Prototype};
use thorn_types::{Closure, Namespace, NativeFunction, ThornError, ThornResult, Value};
use tracing::{debug, instrument};

use crate::dispatch::{lookup_global, Dispatcher};
use crate::limits::Limits;

/// Turns source text into a binary chunk.
///
/// No compiler ships with the runtime; embedders that load source text
/// supply one through [`Runtime::with_compiler`].
pub trait Compiler {
    /// Compile `source`, naming the chunk `name`
    fn compile(&self, source: &str, name: &str) -> ThornResult<Vec<u8>>;
}

/// An embedded script runtime
pub struct Runtime {
    /// Host bindings, read with priority over `globals`
    pub env: Namespace,
    /// Script-writable global namespace
    pub globals: Namespace,
    /// Limits applied to each top-level invocation
    pub limits: Limits,
    library: Rc<LibraryState>,
    compiler: Option<Box<dyn Compiler>>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("globals", &self.globals.keys().collect::<Vec<_>>())
            .field("limits", &self.limits)
            .field("has_compiler", &self.compiler.is_some())
            .finish()
    }
}

impl Runtime {
    /// Create a runtime with empty namespaces and default limits
    ///
    /// # Example
    /// ```
    /// use thorn_vm::Runtime;
    ///
    /// let runtime = Runtime::new();
    /// assert!(runtime.env.is_empty());
    /// assert_eq!(runtime.limits.max_call_depth, 25);
    /// ```
    pub fn new() -> Self {
        Self {
            env: Namespace::new(),
            globals: Namespace::new(),
            limits: Limits::default(),
            library: Rc::new(LibraryState::new()),
            compiler: None,
        }
    }

    /// Replace the execution limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Attach a source compiler used by `do_string` and `do_stream`
    pub fn with_compiler(mut self, compiler: Box<dyn Compiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Install the standard library into `env`
    pub fn set_builtins(&mut self) {
        thorn_builtins::install(&mut self.env, &self.library);
    }

    /// Library state shared by this runtime's builtins
    pub fn library(&self) -> &Rc<LibraryState> {
        &self.library
    }

    /// Route text written by `print` and `write` to `callback`
    pub fn on_stdout<F>(&mut self, callback: F)
    where
        F: Fn(&str) + 'static,
    {
        self.library.set_writer(Rc::new(callback));
    }

    /// Bind a host function in `env`
    ///
    /// # Example
    /// ```
    /// use thorn_types::Value;
    /// use thorn_vm::Runtime;
    ///
    /// let mut runtime = Runtime::new();
    /// runtime.register_native("double", |args| {
    ///     Ok(Value::Number(args[0].to_number().unwrap_or(0.0) * 2.0))
    /// });
    /// let double = runtime.get_global("double");
    /// let result = runtime.call_function(&double, vec![Value::from(4.0)]).unwrap();
    /// assert_eq!(result, Value::from(8.0));
    /// ```
    pub fn register_native<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> ThornResult<Value> + 'static,
    {
        self.env.insert(
            name.to_string(),
            Value::NativeFunction(NativeFunction::new(name, func)),
        );
    }

    /// Read a global the way scripts do: `env` first, then `globals`
    pub fn get_global(&self, name: &str) -> Value {
        lookup_global(&self.env, &self.globals, name)
    }

    /// Write into `globals`
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value.first());
    }

    /// Compile and run source text
    ///
    /// # Errors
    /// `CompileError` when no compiler is attached or compilation fails,
    /// otherwise any error raised while loading or running the chunk
    #[instrument(skip_all, fields(source = %name))]
    pub fn do_string(&mut self, source: &str, name: &str) -> ThornResult<Value> {
        let compiler = self.compiler.as_ref().ok_or_else(|| {
            ThornError::compile(format!("no compiler available to load '{}'", name))
        })?;
        let bytes = compiler.compile(source, name)?;
        self.do_bytes(&bytes, name)
    }

    /// Load and run a binary chunk
    #[instrument(skip_all, fields(source = %name, len = bytes.len()))]
    pub fn do_bytes(&mut self, bytes: &[u8], name: &str) -> ThornResult<Value> {
        let proto = Prototype::from_bytes(bytes)?;
        proto.verify()?;
        self.execute(Rc::new(proto))
    }

    /// Run a stream holding either a binary chunk or source text.
    ///
    /// The chunk signature decides; anything else is read as UTF-8 source
    /// and compiled.
    #[instrument(skip_all, fields(source = %name))]
    pub fn do_stream<R: Read>(&mut self, mut reader: R, name: &str) -> ThornResult<Value> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if has_chunk_signature(&bytes) {
            return self.do_bytes(&bytes, name);
        }
        debug!(len = bytes.len(), "no chunk signature, loading as source text");
        let source = String::from_utf8(bytes)
            .map_err(|e| ThornError::compile(format!("'{}' is not valid UTF-8: {}", name, e)))?;
        self.do_string(&source, name)
    }

    /// Run a main-chunk prototype as a top-level invocation
    #[instrument(skip_all, fields(source = %proto.source))]
    pub fn execute(&mut self, proto: Rc<Prototype>) -> ThornResult<Value> {
        let main = Value::Closure(Rc::new(Closure::main(proto)));
        self.invoke(&main, Vec::new())
    }

    /// Call a script or host function as a fresh top-level invocation with
    /// its own instruction budget
    pub fn call_function(&mut self, function: &Value, args: Vec<Value>) -> ThornResult<Value> {
        self.invoke(function, args)
    }

    fn invoke(&mut self, function: &Value, args: Vec<Value>) -> ThornResult<Value> {
        debug!(args = args.len(), "top-level invocation");
        let mut dispatcher = Dispatcher::new(&self.env, &mut self.globals, self.limits);
        let result = dispatcher.call(&function.clone().first(), args, 0);
        debug!(
            instructions = dispatcher.instructions(),
            ok = result.is_ok(),
            "top-level invocation finished"
        );
        result
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
