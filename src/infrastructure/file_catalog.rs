// Saved visualization catalog backed by a TOML file
use crate::application::catalog::SavedVisualizationCatalog;
use crate::domain::error::{PanelError, PanelResult};
use crate::domain::saved_visualization::SavedVisualization;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    visualizations: Vec<SavedVisualization>,
}

/// Re-reads the file on every listing; nothing is cached between calls
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SavedVisualizationCatalog for FileCatalog {
    async fn list(&self) -> PanelResult<Vec<SavedVisualization>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Saved visualization catalog {:?} not found", self.path);
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(PanelError::upstream(
                    None,
                    format!("Failed to read catalog {:?}: {}", self.path, e),
                ));
            }
        };

        let catalog: CatalogFile = toml::from_str(&raw).map_err(|e| {
            PanelError::upstream(None, format!("Failed to parse catalog {:?}: {}", self.path, e))
        })?;
        Ok(catalog.visualizations)
    }
}

/// Fixed catalog used as a stand-in where no file should be read
#[cfg(test)]
pub mod fixed {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct StaticCatalog {
        visualizations: Vec<SavedVisualization>,
    }

    impl StaticCatalog {
        pub fn new(visualizations: Vec<SavedVisualization>) -> Self {
            Self { visualizations }
        }
    }

    #[async_trait]
    impl SavedVisualizationCatalog for StaticCatalog {
        async fn list(&self) -> PanelResult<Vec<SavedVisualization>> {
            Ok(self.visualizations.clone())
        }
    }
}
