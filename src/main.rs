// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use operational_panels::application::panel_repository::PanelRepository;
use operational_panels::application::panel_store::PanelStore;
use operational_panels::application::visualization_service::VisualizationService;
use operational_panels::infrastructure::config::{load_config, StoreBackend};
use operational_panels::infrastructure::file_catalog::FileCatalog;
use operational_panels::infrastructure::memory_store::InMemoryPanelStore;
use operational_panels::infrastructure::opensearch_store::OpenSearchPanelStore;
use operational_panels::infrastructure::ppl_client::PplQueryClient;
use operational_panels::presentation::app_state::AppState;
use operational_panels::presentation::router::create_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;

    // Document store (infrastructure layer)
    let store: Arc<dyn PanelStore> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory panel store; panels are lost on restart");
            Arc::new(InMemoryPanelStore::new())
        }
        StoreBackend::OpenSearch => {
            tracing::info!(
                "Using OpenSearch panel store at {} (index {})",
                config.store.host,
                config.store.index
            );
            Arc::new(OpenSearchPanelStore::new(
                config.store.host.clone(),
                config.store.index.clone(),
            ))
        }
    };

    // Use cases (application layer)
    let panels = PanelRepository::new(store);
    let visualizations = VisualizationService::new(panels.clone());

    let state = Arc::new(AppState {
        panels,
        visualizations,
        catalog: Arc::new(FileCatalog::new(config.catalog.path.clone())),
        query: Arc::new(PplQueryClient::new(config.query.host.clone())),
    });

    let router = create_router(state);

    let addr: SocketAddr = config.server.bind_address.parse()?;
    tracing::info!("Starting operational-panels service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
