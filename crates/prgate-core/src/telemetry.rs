//! Tracing initialisation for prgate binaries.
//!
//! Call [`init_tracing`] once at program start. Filtering comes from
//! `PRGATE_LOG`, then `RUST_LOG`, then the supplied default level. Later
//! calls are ignored because the global subscriber can only be set once.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive for prgate.
pub const LOG_ENV: &str = "PRGATE_LOG";

/// Install the global subscriber.
///
/// * `json` emits newline-delimited JSON, for log aggregation.
/// * `level` applies when neither `PRGATE_LOG` nor `RUST_LOG` is set.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // Logs go to stderr so stdout stays machine-readable.
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok();
    }
}
