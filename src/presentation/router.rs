// Route table for the panels API
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_visualization, clone_panel, clone_visualization, create_panel, delete_panel,
    edit_visualization_layout, get_panel, health_check, list_panels, list_saved_visualizations,
    preview_visualization, remove_visualization, rename_panel, replace_visualization,
    run_visualization, set_panel_filter,
};
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const API_PREFIX: &str = "/api/observability/operational_panels";

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/panels", get(list_panels).post(create_panel))
        .route("/panels/rename", patch(rename_panel))
        .route("/panels/clone", post(clone_panel))
        .route("/panels/filter", patch(set_panel_filter))
        .route("/panels/:panel_id", get(get_panel).delete(delete_panel))
        .route(
            "/visualizations",
            get(list_saved_visualizations).post(add_visualization),
        )
        .route("/visualizations/replace", post(replace_visualization))
        .route("/visualizations/edit", put(edit_visualization_layout))
        .route("/visualizations/clone", post(clone_visualization))
        .route("/visualizations/preview", post(preview_visualization))
        .route("/visualizations/query", post(run_visualization))
        .route(
            "/visualizations/:panel_id/:visualization_id",
            delete(remove_visualization),
        );

    Router::new()
        .route("/healthz", get(health_check))
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
