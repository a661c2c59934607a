// In-memory panel store
use crate::application::panel_store::PanelStore;
use crate::domain::error::{PanelError, PanelResult};
use crate::domain::panel::Panel;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryPanelStore {
    panels: RwLock<HashMap<String, Panel>>,
}

impl InMemoryPanelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PanelStore for InMemoryPanelStore {
    async fn list(&self) -> PanelResult<Vec<Panel>> {
        let mut panels: Vec<Panel> = self.panels.read().await.values().cloned().collect();
        panels.sort_by(|a, b| a.date_created.cmp(&b.date_created).then(a.id.cmp(&b.id)));
        Ok(panels)
    }

    async fn get(&self, id: &str) -> PanelResult<Option<Panel>> {
        Ok(self.panels.read().await.get(id).cloned())
    }

    async fn put(&self, panel: &Panel) -> PanelResult<()> {
        self.panels
            .write()
            .await
            .insert(panel.id.clone(), panel.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> PanelResult<()> {
        match self.panels.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(PanelError::panel_not_found(id)),
        }
    }
}
