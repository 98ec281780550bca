//! Global tracing subscriber for the command-line tool.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`).
///
/// Subsequent calls are no-ops.
pub fn init() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = INITIALIZED.set(());
    Ok(())
}
