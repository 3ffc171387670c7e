pub mod catalog;
pub mod config;
pub mod errors;
pub mod feedback;
pub mod generation;
pub mod llm_client;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes structured logging for both binaries. `RUST_LOG` directives
/// win; otherwise the library, both binaries and request tracing log at
/// `default_level`.
pub fn init_tracing(default_level: &str) {
    let crate_name = env!("CARGO_CRATE_NAME");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{crate_name}={default_level},{crate_name}_generate={default_level},tower_http={default_level}"
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
