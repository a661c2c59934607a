// Saved visualization catalog trait
use crate::domain::error::{PanelError, PanelResult};
use crate::domain::saved_visualization::SavedVisualization;
use async_trait::async_trait;

#[async_trait]
pub trait SavedVisualizationCatalog: Send + Sync {
    async fn list(&self) -> PanelResult<Vec<SavedVisualization>>;

    async fn get(&self, id: &str) -> PanelResult<SavedVisualization> {
        self.list()
            .await?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| PanelError::NotFound {
                kind: "Saved visualization",
                id: id.to_string(),
            })
    }
}
