// Panel repository - Use cases over persisted panel documents
use crate::application::panel_store::PanelStore;
use crate::domain::error::{PanelError, PanelResult};
use crate::domain::panel::{new_panel_id, Panel, QueryFilter, TimeRange, Visualization};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Identity and timestamps of a freshly cloned panel
#[derive(Debug, Clone, PartialEq)]
pub struct ClonedPanel {
    pub id: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PanelRepository {
    store: Arc<dyn PanelStore>,
}

impl PanelRepository {
    pub fn new(store: Arc<dyn PanelStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> PanelResult<Vec<Panel>> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> PanelResult<Panel> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| PanelError::panel_not_found(id))
    }

    pub async fn create(&self, name: &str) -> PanelResult<String> {
        validate_name(name)?;
        let panel = Panel::new(new_panel_id(), name.to_string(), Utc::now());
        self.store.put(&panel).await?;

        tracing::debug!("Created panel {} ({})", panel.id, panel.name);
        Ok(panel.id)
    }

    pub async fn rename(&self, id: &str, name: &str) -> PanelResult<()> {
        validate_name(name)?;
        self.modify(id, |panel| panel.name = name.to_string())
            .await
            .map(|_| ())
    }

    /// Copy visualizations, time range and query filter into a new panel.
    /// The source must still exist.
    pub async fn clone_panel(&self, id: &str, new_name: &str) -> PanelResult<ClonedPanel> {
        validate_name(new_name)?;
        let source = self.get(id).await?;

        let mut clone = Panel::new(new_panel_id(), new_name.to_string(), Utc::now());
        clone.visualizations = source.visualizations;
        clone.time_range = source.time_range;
        clone.query_filter = source.query_filter;
        self.store.put(&clone).await?;

        tracing::debug!("Cloned panel {} into {}", id, clone.id);
        Ok(ClonedPanel {
            id: clone.id,
            date_created: clone.date_created,
            date_modified: clone.date_modified,
        })
    }

    pub async fn delete(&self, id: &str) -> PanelResult<()> {
        self.store.delete(id).await?;
        tracing::debug!("Deleted panel {}", id);
        Ok(())
    }

    pub async fn set_filter(
        &self,
        id: &str,
        query: &str,
        language: &str,
        from: &str,
        to: &str,
    ) -> PanelResult<()> {
        self.modify(id, |panel| {
            panel.query_filter = QueryFilter {
                query: query.to_string(),
                language: language.to_string(),
            };
            panel.time_range = TimeRange::new(from, to);
        })
        .await
        .map(|_| ())
    }

    /// Overwrite the visualization list, keeping every other field as stored
    pub async fn save_visualizations(
        &self,
        id: &str,
        visualizations: Vec<Visualization>,
    ) -> PanelResult<Vec<Visualization>> {
        let panel = self
            .modify(id, move |panel| panel.visualizations = visualizations)
            .await?;
        Ok(panel.visualizations)
    }

    /// Read-merge-write of a single panel document
    async fn modify<F>(&self, id: &str, change: F) -> PanelResult<Panel>
    where
        F: FnOnce(&mut Panel) + Send,
    {
        let mut panel = self.get(id).await?;
        change(&mut panel);
        panel.touch(Utc::now());
        self.store.put(&panel).await?;
        Ok(panel)
    }
}

fn validate_name(name: &str) -> PanelResult<()> {
    if name.trim().is_empty() {
        return Err(PanelError::validation("Panel name must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::panel::{GridRect, NewVisualization};
    use crate::infrastructure::memory_store::InMemoryPanelStore;

    fn repository() -> PanelRepository {
        PanelRepository::new(Arc::new(InMemoryPanelStore::new()))
    }

    fn viz(id: &str) -> Visualization {
        Visualization::from_definition(
            id.to_string(),
            NewVisualization {
                title: "Orders".to_string(),
                query: "source=orders".to_string(),
                viz_type: "line".to_string(),
                time_field: "@timestamp".to_string(),
            },
            GridRect::new(0, 0, 6, 4),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repository();
        let id = repo.create("Sales").await.unwrap();

        let panel = repo.get(&id).await.unwrap();
        assert_eq!(panel.name, "Sales");
        assert!(panel.visualizations.is_empty());
        assert_eq!(panel.date_created, panel.date_modified);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let repo = repository();
        assert!(matches!(
            repo.create("   ").await,
            Err(PanelError::Validation(_))
        ));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_panel() {
        let err = repository().get("missing").await.unwrap_err();
        assert_eq!(err, PanelError::panel_not_found("missing"));
    }

    #[tokio::test]
    async fn test_rename_keeps_other_fields() {
        let repo = repository();
        let id = repo.create("Sales").await.unwrap();
        repo.save_visualizations(&id, vec![viz("panel_viz_a")])
            .await
            .unwrap();
        repo.set_filter(&id, "where region = 'eu'", "ppl", "now-7d", "now")
            .await
            .unwrap();
        let before = repo.get(&id).await.unwrap();

        repo.rename(&id, "Revenue").await.unwrap();
        let after = repo.get(&id).await.unwrap();

        assert_eq!(after.name, "Revenue");
        assert_eq!(after.visualizations, before.visualizations);
        assert_eq!(after.query_filter, before.query_filter);
        assert_eq!(after.time_range, TimeRange::new("now-7d", "now"));
        assert!(after.date_modified >= before.date_modified);
        assert_eq!(after.date_created, before.date_created);
    }

    #[tokio::test]
    async fn test_clone_round_trip() {
        let repo = repository();
        let id = repo.create("Sales").await.unwrap();
        repo.save_visualizations(&id, vec![viz("panel_viz_a"), viz("panel_viz_b")])
            .await
            .unwrap();
        repo.set_filter(&id, "where region = 'eu'", "ppl", "now-7d", "now")
            .await
            .unwrap();
        let source = repo.get(&id).await.unwrap();

        let cloned = repo.clone_panel(&id, "Copy").await.unwrap();
        let copy = repo.get(&cloned.id).await.unwrap();

        assert_ne!(copy.id, source.id);
        assert_eq!(copy.name, "Copy");
        assert_eq!(copy.visualizations, source.visualizations);
        assert_eq!(copy.time_range, source.time_range);
        assert_eq!(copy.query_filter, source.query_filter);
        assert_eq!(copy.date_created, cloned.date_created);
    }

    #[tokio::test]
    async fn test_clone_missing_source_creates_nothing() {
        let repo = repository();
        let err = repo.clone_panel("gone", "Copy").await.unwrap_err();
        assert!(matches!(err, PanelError::NotFound { .. }));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_panel_reports_error() {
        let repo = repository();
        let keep = repo.create("Keep").await.unwrap();
        let id = repo.create("Sales").await.unwrap();

        repo.delete(&id).await.unwrap();
        assert!(matches!(
            repo.delete(&id).await,
            Err(PanelError::NotFound { .. })
        ));

        let remaining = repo.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);
    }

    #[tokio::test]
    async fn test_mutations_on_missing_panel() {
        let repo = repository();
        assert!(matches!(
            repo.rename("gone", "x").await,
            Err(PanelError::NotFound { .. })
        ));
        assert!(matches!(
            repo.set_filter("gone", "", "ppl", "now-1d", "now").await,
            Err(PanelError::NotFound { .. })
        ));
        assert!(repo.list().await.unwrap().is_empty());
    }
}
