use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use provoke::config::Config;
use provoke::llm_client::{self, GeminiClient, TextGenerator};
use provoke::routes::build_router;
use provoke::state::AppState;
use provoke::store::JsonStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    provoke::init_tracing(&config.rust_log);

    info!("Starting provoke v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonStore::new(&config.data_dir, &config.scores_file));
    info!("Data directory: {}", config.data_dir.display());

    let generator: Option<Arc<dyn TextGenerator>> = match &config.api_key {
        Some(key) => {
            let client: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(key.clone())?);
            info!("Generation enabled (model: {})", llm_client::MODEL);
            Some(client)
        }
        None => {
            warn!("GOOGLE_API_KEY not set; /api/generate will report a configuration error");
            None
        }
    };

    let state = AppState {
        store,
        generator,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
