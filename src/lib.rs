pub mod config;
pub mod error;
pub mod models;
pub mod remote; // Backend capabilities (HTTP + mock)
pub mod extraction; // Structured extraction parser
pub mod prompt;
pub mod prediction; // Disease prediction client
pub mod treatment; // Treatment plan store
pub mod chat; // Chat session
pub mod intake; // Patient intake autofill
pub mod registry; // Patient registration and visits
pub mod session; // Hospital/patient selection

use tracing_subscriber::EnvFilter;

pub use error::AssistantError;

/// Install the global tracing subscriber.
///
/// Honors RUST_LOG, falling back to `config::default_log_filter()`. Safe to
/// call more than once; later calls are no-ops.
pub fn init_tracing() {
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("{} assistant starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
