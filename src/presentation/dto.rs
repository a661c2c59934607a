// Request and response bodies of the panels API
use crate::domain::panel::{NewVisualization, Panel, Visualization, VisualizationLayout};
use crate::domain::saved_visualization::SavedVisualization;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PanelsResponse {
    pub panels: Vec<Panel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePanelRequest {
    pub panel_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePanelResponse {
    pub message: String,
    pub new_panel_id: String,
}

/// Body of both rename and clone
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelNameRequest {
    pub panel_id: String,
    pub panel_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClonePanelResponse {
    pub message: String,
    pub clone_panel_id: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelFilterRequest {
    pub panel_id: String,
    pub query: String,
    pub language: String,
    pub to: String,
    pub from: String,
}

#[derive(Debug, Serialize)]
pub struct SavedVisualizationsResponse {
    pub visualizations: Vec<SavedVisualization>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VisualizationsResponse {
    pub visualizations: Vec<Visualization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddVisualizationRequest {
    pub panel_id: String,
    pub new_visualization: NewVisualization,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceVisualizationRequest {
    pub panel_id: String,
    pub old_visualization_id: String,
    pub new_visualization: NewVisualization,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditLayoutRequest {
    pub panel_id: String,
    pub visualization_params: Vec<VisualizationLayout>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneVisualizationRequest {
    pub panel_id: String,
    pub visualization_id: String,
}

/// Preview of a saved visualization over an explicit time range
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewVisualizationRequest {
    pub panel_id: String,
    pub saved_visualization_id: String,
    pub from: String,
    pub to: String,
}

/// Run one of a panel's visualizations under the panel filter and time range
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunVisualizationRequest {
    pub panel_id: String,
    pub visualization_id: String,
    /// Ad-hoc search bar text, added on top of the stored panel filter
    #[serde(default)]
    pub free_text: String,
}
