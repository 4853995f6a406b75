//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn,thorn_vm=info";

/// Filter used when `RUST_LOG` is unset and `--verbose` is given
pub const VERBOSE_FILTER: &str = "debug";

/// Install a stderr subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
