// Application state for HTTP handlers
use crate::application::catalog::SavedVisualizationCatalog;
use crate::application::panel_repository::PanelRepository;
use crate::application::query_executor::QueryExecutor;
use crate::application::visualization_service::VisualizationService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub panels: PanelRepository,
    pub visualizations: VisualizationService,
    pub catalog: Arc<dyn SavedVisualizationCatalog>,
    pub query: Arc<dyn QueryExecutor>,
}
