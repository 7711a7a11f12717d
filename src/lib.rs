//! movierec library
//!
//! Content-based movie recommendations enriched with OMDb metadata through a
//! title-keyed cache with time-based expiry.

pub mod cache;
pub mod cli;
pub mod metadata;
pub mod poster;
pub mod recommend;
pub mod report;
pub mod throttle;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::LogFormat;

/// Installs the global tracing subscriber, logging to stderr
///
/// `RUST_LOG` takes precedence over `level`.
pub fn setup_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(filter);

    // A subscriber may already be installed (e.g. in tests)
    let _ = match format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
}
