//! Command-line arguments

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use thorn_vm::Limits;

use crate::error::{CliError, CliResult};

/// Run a compiled Thorn chunk
#[derive(Parser, Debug)]
#[command(name = "thorn", version, about = "Run compiled Thorn scripts")]
pub struct Cli {
    /// Chunk file to run
    pub file: PathBuf,

    /// Print a disassembly listing instead of running
    #[arg(short, long)]
    pub disassemble: bool,

    /// After running, print every global as `name = value`
    #[arg(long)]
    pub dump_globals: bool,

    /// Run without the standard library
    #[arg(long)]
    pub no_builtins: bool,

    /// Maximum script call depth
    #[arg(long, value_name = "N")]
    pub max_call_depth: Option<usize>,

    /// Maximum instructions per run
    #[arg(long, value_name = "N")]
    pub max_instructions: Option<u64>,

    /// JSON file with limits; flags take precedence
    #[arg(long = "limits", value_name = "FILE")]
    pub limits_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Limits from the limits file (or defaults), overridden by flags
    ///
    /// # Errors
    /// Returns `CliError` if the limits file cannot be read or parsed
    pub fn resolve_limits(&self) -> CliResult<Limits> {
        let mut limits = match &self.limits_file {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| CliError::Limits {
                    path: path.clone(),
                    source,
                })?
            }
            None => Limits::default(),
        };
        if let Some(depth) = self.max_call_depth {
            limits.max_call_depth = depth;
        }
        if let Some(max) = self.max_instructions {
            limits.max_instructions = max;
        }
        Ok(limits)
    }
}
