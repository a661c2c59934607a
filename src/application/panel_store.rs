// Store trait for panel documents
use crate::domain::error::PanelResult;
use crate::domain::panel::Panel;
use async_trait::async_trait;

/// Document store holding one document per panel.
///
/// Writes replace the whole document. There is no locking or versioning,
/// so the last write to a panel wins.
#[async_trait]
pub trait PanelStore: Send + Sync {
    /// All stored panels, in no particular order
    async fn list(&self) -> PanelResult<Vec<Panel>>;

    /// `Ok(None)` when no document exists for `id`
    async fn get(&self, id: &str) -> PanelResult<Option<Panel>>;

    /// Create or overwrite the document keyed by `panel.id`
    async fn put(&self, panel: &Panel) -> PanelResult<()>;

    /// Fails with NotFound when no document exists for `id`
    async fn delete(&self, id: &str) -> PanelResult<()>;
}
