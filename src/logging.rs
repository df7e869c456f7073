//! Tracing subscriber bootstrap for the `paramesh` binary.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to whoever embeds it.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter, e.g.
/// `PARAMESH_LOG=paramesh=debug`.
pub const LOG_ENV: &str = "PARAMESH_LOG";

static INIT: Once = Once::new();

/// Install a stderr fmt subscriber filtered by `PARAMESH_LOG`, falling back to
/// `paramesh=info` when it is unset or invalid.
///
/// Safe to call more than once. If another global subscriber is already set,
/// that one is kept.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("paramesh=info"));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .try_init();
    });
}
