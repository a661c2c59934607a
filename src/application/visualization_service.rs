// Visualization service - Add, replace, clone, remove and re-layout panel visualizations
use crate::application::panel_repository::PanelRepository;
use crate::domain::error::{PanelError, PanelResult};
use crate::domain::panel::{
    new_visualization_id, NewVisualization, Panel, Visualization, VisualizationLayout,
};
use crate::domain::placement::place;
use crate::domain::saved_visualization::SavedVisualization;
use async_trait::async_trait;
use std::collections::HashMap;

/// Visualization mutations used by the flyout and the layout grid.
///
/// Every call returns the panel's visualization list as persisted.
#[async_trait]
pub trait VisualizationCommands: Send + Sync {
    async fn add_from_saved(
        &self,
        panel_id: &str,
        saved: &SavedVisualization,
    ) -> PanelResult<Vec<Visualization>>;

    async fn replace(
        &self,
        panel_id: &str,
        old_visualization_id: &str,
        visualization: NewVisualization,
    ) -> PanelResult<Vec<Visualization>>;

    async fn update_layout(
        &self,
        panel_id: &str,
        layout: Vec<VisualizationLayout>,
    ) -> PanelResult<Vec<Visualization>>;
}

/// Lifecycle of the visualizations embedded in a panel.
///
/// Each operation reads the panel, edits its list and writes the whole list
/// back. Nothing guards against a concurrent writer in between; the later
/// write wins.
#[derive(Clone)]
pub struct VisualizationService {
    panels: PanelRepository,
}

impl VisualizationService {
    pub fn new(panels: PanelRepository) -> Self {
        Self { panels }
    }

    pub async fn add_new(
        &self,
        panel_id: &str,
        visualization: NewVisualization,
    ) -> PanelResult<Vec<Visualization>> {
        let mut panel = self.panels.get(panel_id).await?;
        let rect = place(&panel.visualizations);
        rect.validate()?;
        let id = fresh_id(&panel);

        tracing::debug!(
            "Adding visualization {} to panel {} at ({}, {}, {}, {})",
            id,
            panel_id,
            rect.x,
            rect.y,
            rect.w,
            rect.h
        );
        panel
            .visualizations
            .push(Visualization::from_definition(id, visualization, rect));
        self.panels
            .save_visualizations(panel_id, panel.visualizations)
            .await
    }

    pub async fn add_from_saved(
        &self,
        panel_id: &str,
        saved: &SavedVisualization,
    ) -> PanelResult<Vec<Visualization>> {
        self.add_new(panel_id, saved.to_definition()).await
    }

    /// Swap the visualization out for a new one with a new id in the same cell
    pub async fn replace(
        &self,
        panel_id: &str,
        old_visualization_id: &str,
        visualization: NewVisualization,
    ) -> PanelResult<Vec<Visualization>> {
        let mut panel = self.panels.get(panel_id).await?;
        let index = panel
            .visualizations
            .iter()
            .position(|v| v.id == old_visualization_id)
            .ok_or_else(|| PanelError::visualization_not_found(old_visualization_id))?;

        let rect = panel.visualizations[index].rect();
        let id = fresh_id(&panel);
        tracing::debug!(
            "Replacing visualization {} with {} in panel {}",
            old_visualization_id,
            id,
            panel_id
        );
        panel.visualizations[index] = Visualization::from_definition(id, visualization, rect);

        self.panels
            .save_visualizations(panel_id, panel.visualizations)
            .await
    }

    /// Duplicate a visualization into a free cell below the current grid
    pub async fn clone_visualization(
        &self,
        panel_id: &str,
        visualization_id: &str,
    ) -> PanelResult<Vec<Visualization>> {
        let panel = self.panels.get(panel_id).await?;
        let source = panel
            .find_visualization(visualization_id)
            .ok_or_else(|| PanelError::visualization_not_found(visualization_id))?;

        self.add_new(panel_id, source.definition()).await
    }

    /// Remove by id; an id that is already gone leaves the panel untouched
    pub async fn remove(
        &self,
        panel_id: &str,
        visualization_id: &str,
    ) -> PanelResult<Vec<Visualization>> {
        let mut panel = self.panels.get(panel_id).await?;
        let before = panel.visualizations.len();
        panel.visualizations.retain(|v| v.id != visualization_id);

        if panel.visualizations.len() == before {
            tracing::debug!(
                "Visualization {} already absent from panel {}",
                visualization_id,
                panel_id
            );
            return Ok(panel.visualizations);
        }

        self.panels
            .save_visualizations(panel_id, panel.visualizations)
            .await
    }

    /// Apply edited grid geometry in one write
    pub async fn update_layout(
        &self,
        panel_id: &str,
        layout: Vec<VisualizationLayout>,
    ) -> PanelResult<Vec<Visualization>> {
        for cell in &layout {
            cell.rect().validate()?;
        }

        let mut panel = self.panels.get(panel_id).await?;
        let mut cells: HashMap<String, VisualizationLayout> =
            layout.into_iter().map(|cell| (cell.i.clone(), cell)).collect();

        for visualization in panel.visualizations.iter_mut() {
            if let Some(cell) = cells.remove(&visualization.id) {
                visualization.set_rect(cell.rect());
            }
        }
        for unknown in cells.keys() {
            tracing::warn!(
                "Ignoring layout for unknown visualization {} in panel {}",
                unknown,
                panel_id
            );
        }

        self.panels
            .save_visualizations(panel_id, panel.visualizations)
            .await
    }
}

#[async_trait]
impl VisualizationCommands for VisualizationService {
    async fn add_from_saved(
        &self,
        panel_id: &str,
        saved: &SavedVisualization,
    ) -> PanelResult<Vec<Visualization>> {
        VisualizationService::add_from_saved(self, panel_id, saved).await
    }

    async fn replace(
        &self,
        panel_id: &str,
        old_visualization_id: &str,
        visualization: NewVisualization,
    ) -> PanelResult<Vec<Visualization>> {
        VisualizationService::replace(self, panel_id, old_visualization_id, visualization).await
    }

    async fn update_layout(
        &self,
        panel_id: &str,
        layout: Vec<VisualizationLayout>,
    ) -> PanelResult<Vec<Visualization>> {
        VisualizationService::update_layout(self, panel_id, layout).await
    }
}

fn fresh_id(panel: &Panel) -> String {
    loop {
        let id = new_visualization_id();
        if panel.find_visualization(&id).is_none() {
            return id;
        }
    }
}
