//! Thorn CLI
//!
//! Entry point for the `thorn` binary. Parses arguments, installs logging
//! and delegates to the [`Runner`].

use std::process::ExitCode;

use clap::Parser;
use thorn_cli::logging::init_logging;
use thorn_cli::{Cli, CliResult, Runner};
use tracing::debug;

fn run(cli: &Cli) -> CliResult<String> {
    let limits = cli.resolve_limits()?;
    debug!(?limits, "resolved limits");
    let mut runner = Runner::new(limits)
        .with_builtins(!cli.no_builtins)
        .with_disassemble(cli.disassemble)
        .with_dump_globals(cli.dump_globals);
    runner.run_file(&cli.file)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("thorn: {}", e);
            ExitCode::FAILURE
        }
    }
}
