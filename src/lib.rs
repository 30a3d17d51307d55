pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::rendering::{PageImageRenderer, PageRenderer};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let store = services::store::build_store(&settings).await?;
    let renderer = match PageImageRenderer::from_settings(&settings) {
        Some(renderer) => Some(Arc::new(renderer) as Arc<dyn PageRenderer>),
        None => {
            tracing::warn!("PAGE_IMAGES_ROOT is not set; note images are disabled");
            None
        }
    };

    let backend = store.backend();
    let state = AppState::new(settings, store, renderer);
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        backend = backend.as_str(),
        "Academy notes API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    tracing::info!("Academy notes API stopped");
    Ok(())
}
