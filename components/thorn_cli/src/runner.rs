//! Load, run and report on one chunk file

use std::fs;
use std::path::Path;

use thorn_bytecode::{disassemble, has_chunk_signature, Prototype};
use thorn_types::Value;
use thorn_vm::{Limits, Runtime};
use tracing::info;

use crate::error::{CliError, CliResult};

/// Runs chunk files in a single runtime
#[derive(Debug)]
pub struct Runner {
    runtime: Runtime,
    disassemble: bool,
    dump_globals: bool,
}

impl Runner {
    /// Create a runner without the standard library
    ///
    /// # Example
    /// ```
    /// use thorn_cli::Runner;
    /// use thorn_vm::Limits;
    ///
    /// let runner = Runner::new(Limits::default()).with_builtins(true);
    /// assert!(runner.runtime().get_global("print").is_callable());
    /// ```
    pub fn new(limits: Limits) -> Self {
        Self {
            runtime: Runtime::new().with_limits(limits),
            disassemble: false,
            dump_globals: false,
        }
    }

    /// Install the standard library when `enabled`
    pub fn with_builtins(mut self, enabled: bool) -> Self {
        if enabled {
            self.runtime.set_builtins();
        }
        self
    }

    /// List the chunk instead of running it
    pub fn with_disassemble(mut self, enabled: bool) -> Self {
        self.disassemble = enabled;
        self
    }

    /// Append the global namespace to the report
    pub fn with_dump_globals(mut self, enabled: bool) -> Self {
        self.dump_globals = enabled;
        self
    }

    /// The underlying runtime
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Run (or disassemble) a file and return the text to print
    ///
    /// # Arguments
    /// * `path` - Chunk file
    ///
    /// # Returns
    /// The rendered result when it is not nil, followed by the globals
    /// when dumping is enabled; or the disassembly listing
    ///
    /// # Errors
    /// Returns `CliError` if the file cannot be read, is malformed, or the
    /// script fails
    pub fn run_file(&mut self, path: &Path) -> CliResult<String> {
        let bytes = fs::read(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.display().to_string();

        if self.disassemble {
            if !has_chunk_signature(&bytes) {
                return Err(CliError::NotAChunk(path.to_path_buf()));
            }
            let proto = Prototype::from_bytes(&bytes)?;
            return Ok(disassemble(&proto));
        }

        info!(file = %name, len = bytes.len(), "running chunk");
        let result = self.runtime.do_stream(bytes.as_slice(), &name)?;

        let mut out = String::new();
        if !result.is_nil() {
            out.push_str(&render(&result));
            out.push('\n');
        }
        if self.dump_globals {
            for (key, value) in &self.runtime.globals {
                out.push_str(&format!("{} = {}\n", key, render(value)));
            }
        }
        Ok(out)
    }
}

/// Text form used for results and dumped globals: strings quoted, tables
/// dumped, functions as `FUNCTION`, multiple results separated by tabs
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => serde_json::Value::from(&**s).to_string(),
        Value::Table(t) => t.borrow().dump(true),
        Value::Closure(_) | Value::NativeFunction(_) => String::from("FUNCTION"),
        Value::Tuple(values) => values.iter().map(render).collect::<Vec<_>>().join("\t"),
        other => other.to_string(),
    }
}
