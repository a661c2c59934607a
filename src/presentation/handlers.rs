// HTTP request handlers
use crate::application::flyout::{FlyoutController, FlyoutMode};
use crate::application::query_executor::QueryResponse;
use crate::domain::error::{PanelError, PanelResult};
use crate::domain::panel::{Panel, TimeRange, Visualization};
use crate::presentation::app_state::AppState;
use crate::presentation::dto::{
    AddVisualizationRequest, ClonePanelResponse, CloneVisualizationRequest, CreatePanelRequest,
    CreatePanelResponse, EditLayoutRequest, MessageResponse, PanelFilterRequest,
    PanelNameRequest, PanelsResponse, PreviewVisualizationRequest, ReplaceVisualizationRequest,
    RunVisualizationRequest, SavedVisualizationsResponse, VisualizationsResponse,
};
use crate::presentation::error::ApiError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all panels
pub async fn list_panels(State(state): State<Arc<AppState>>) -> ApiResult<PanelsResponse> {
    let panels = state
        .panels
        .list()
        .await
        .map_err(|e| logged("fetching panels", e))?;
    Ok(Json(PanelsResponse { panels }))
}

pub async fn get_panel(
    Path(panel_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Panel> {
    let panel = state
        .panels
        .get(&panel_id)
        .await
        .map_err(|e| logged("fetching panel", e))?;
    Ok(Json(panel))
}

pub async fn create_panel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePanelRequest>,
) -> ApiResult<CreatePanelResponse> {
    let new_panel_id = state
        .panels
        .create(&body.panel_name)
        .await
        .map_err(|e| logged("creating new panel", e))?;
    Ok(Json(CreatePanelResponse {
        message: "Panel Created".to_string(),
        new_panel_id,
    }))
}

pub async fn rename_panel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PanelNameRequest>,
) -> ApiResult<MessageResponse> {
    state
        .panels
        .rename(&body.panel_id, &body.panel_name)
        .await
        .map_err(|e| logged("renaming panel", e))?;
    Ok(Json(MessageResponse::new("Panel Renamed")))
}

pub async fn clone_panel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PanelNameRequest>,
) -> ApiResult<ClonePanelResponse> {
    let cloned = state
        .panels
        .clone_panel(&body.panel_id, &body.panel_name)
        .await
        .map_err(|e| logged("cloning panel", e))?;
    Ok(Json(ClonePanelResponse {
        message: "Panel Cloned".to_string(),
        clone_panel_id: cloned.id,
        date_created: cloned.date_created,
        date_modified: cloned.date_modified,
    }))
}

pub async fn delete_panel(
    Path(panel_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .panels
        .delete(&panel_id)
        .await
        .map_err(|e| logged("deleting panel", e))?;
    Ok((StatusCode::NO_CONTENT, Json(MessageResponse::new("Panel Deleted"))))
}

pub async fn set_panel_filter(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PanelFilterRequest>,
) -> ApiResult<MessageResponse> {
    state
        .panels
        .set_filter(&body.panel_id, &body.query, &body.language, &body.from, &body.to)
        .await
        .map_err(|e| logged("adding query filter", e))?;
    Ok(Json(MessageResponse::new("Panel PPL Filter Changed")))
}

/// Saved visualizations available for adding to a panel
pub async fn list_saved_visualizations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<SavedVisualizationsResponse> {
    let visualizations = state
        .catalog
        .list()
        .await
        .map_err(|e| logged("fetching saved visualizations", e))?;
    Ok(Json(SavedVisualizationsResponse { visualizations }))
}

pub async fn add_visualization(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddVisualizationRequest>,
) -> ApiResult<VisualizationsResponse> {
    respond(
        "adding visualization",
        state
            .visualizations
            .add_new(&body.panel_id, body.new_visualization)
            .await,
    )
}

pub async fn replace_visualization(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReplaceVisualizationRequest>,
) -> ApiResult<VisualizationsResponse> {
    respond(
        "replacing visualization",
        state
            .visualizations
            .replace(
                &body.panel_id,
                &body.old_visualization_id,
                body.new_visualization,
            )
            .await,
    )
}

pub async fn edit_visualization_layout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EditLayoutRequest>,
) -> ApiResult<VisualizationsResponse> {
    respond(
        "editing visualization layout",
        state
            .visualizations
            .update_layout(&body.panel_id, body.visualization_params)
            .await,
    )
}

pub async fn clone_visualization(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CloneVisualizationRequest>,
) -> ApiResult<VisualizationsResponse> {
    respond(
        "cloning visualization",
        state
            .visualizations
            .clone_visualization(&body.panel_id, &body.visualization_id)
            .await,
    )
}

pub async fn remove_visualization(
    Path((panel_id, visualization_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<VisualizationsResponse> {
    respond(
        "removing visualization",
        state
            .visualizations
            .remove(&panel_id, &visualization_id)
            .await,
    )
}

/// Run a saved visualization's query over the requested range
pub async fn preview_visualization(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PreviewVisualizationRequest>,
) -> ApiResult<QueryResponse> {
    let response = preview(&state, body)
        .await
        .map_err(|e| logged("previewing visualization", e))?;
    Ok(Json(response))
}

async fn preview(
    state: &AppState,
    body: PreviewVisualizationRequest,
) -> PanelResult<QueryResponse> {
    let saved = state.catalog.get(&body.saved_visualization_id).await?;
    let saved_id = saved.id.clone();
    let mut flyout = FlyoutController::new(
        body.panel_id,
        TimeRange::new(body.from, body.to),
        FlyoutMode::Add,
        vec![saved],
    );
    flyout.select(&saved_id)?;

    let request = flyout.begin_preview(Utc::now())?;
    request.send(state.query.as_ref()).await
}

/// Run a panel visualization's query with the panel filter and time range applied
pub async fn run_visualization(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RunVisualizationRequest>,
) -> ApiResult<QueryResponse> {
    let response = run(&state, body)
        .await
        .map_err(|e| logged("running visualization query", e))?;
    Ok(Json(response))
}

async fn run(state: &AppState, body: RunVisualizationRequest) -> PanelResult<QueryResponse> {
    let panel = state.panels.get(&body.panel_id).await?;
    let visualization = panel
        .find_visualization(&body.visualization_id)
        .ok_or_else(|| PanelError::visualization_not_found(&body.visualization_id))?;

    let query = panel.effective_query(visualization, &body.free_text, Utc::now());
    tracing::debug!(
        "Running visualization {} of panel {}: {}",
        visualization.id,
        panel.id,
        query
    );
    state.query.execute(&query).await
}

fn respond(
    action: &str,
    result: PanelResult<Vec<Visualization>>,
) -> ApiResult<VisualizationsResponse> {
    let visualizations = result.map_err(|e| logged(action, e))?;
    Ok(Json(VisualizationsResponse { visualizations }))
}

fn logged(action: &str, error: PanelError) -> ApiError {
    tracing::error!("Issue in {}: {}", action, error);
    ApiError(error)
}
