// Visualization flyout - Pick a saved visualization, preview it, add or replace it
use crate::application::catalog::SavedVisualizationCatalog;
use crate::application::query_executor::{QueryExecutor, QueryResponse};
use crate::application::visualization_service::VisualizationCommands;
use crate::domain::datemath;
use crate::domain::error::{PanelError, PanelResult};
use crate::domain::panel::{TimeRange, Visualization};
use crate::domain::query::{apply_where, compose_time_only};
use crate::domain::saved_visualization::SavedVisualization;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum FlyoutState {
    Idle,
    Selecting,
    Previewing,
    PreviewReady(QueryResponse),
    PreviewError(String),
    Committing,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlyoutMode {
    Add,
    Replace { visualization_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlyoutError {
    #[error("Invalid Time Interval")]
    InvalidTimeRange,

    #[error("Please make a valid selection")]
    NoSelection,

    #[error("A request is already in flight")]
    Busy,

    #[error("Flyout is closed")]
    Closed,

    #[error(transparent)]
    Panel(#[from] PanelError),
}

impl From<FlyoutError> for PanelError {
    fn from(error: FlyoutError) -> Self {
        match error {
            FlyoutError::Panel(e) => e,
            other => PanelError::validation(other.to_string()),
        }
    }
}

/// Preview query issued by the flyout, stamped so late results can be dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    pub seq: u64,
    pub query: String,
}

impl PreviewRequest {
    pub async fn send(&self, executor: &dyn QueryExecutor) -> PanelResult<QueryResponse> {
        executor.execute(&self.query).await
    }
}

#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub panel_id: String,
    pub saved: SavedVisualization,
    pub replace_visualization_id: Option<String>,
    resume: FlyoutState,
}

impl CommitRequest {
    pub async fn send(
        &self,
        commands: &dyn VisualizationCommands,
    ) -> PanelResult<Vec<Visualization>> {
        match &self.replace_visualization_id {
            Some(old_id) => {
                commands
                    .replace(&self.panel_id, old_id, self.saved.to_definition())
                    .await
            }
            None => commands.add_from_saved(&self.panel_id, &self.saved).await,
        }
    }
}

/// State machine behind the add/replace visualization flyout.
///
/// Holds the saved-visualization options for one session only; closing
/// drops them along with any selection or preview.
#[derive(Debug, Clone)]
pub struct FlyoutController {
    panel_id: String,
    mode: FlyoutMode,
    time_range: TimeRange,
    options: Vec<SavedVisualization>,
    selected: Option<SavedVisualization>,
    state: FlyoutState,
    preview_seq: u64,
    last_error: Option<String>,
}

impl FlyoutController {
    pub fn new(
        panel_id: impl Into<String>,
        time_range: TimeRange,
        mode: FlyoutMode,
        options: Vec<SavedVisualization>,
    ) -> Self {
        Self {
            panel_id: panel_id.into(),
            mode,
            time_range,
            options,
            selected: None,
            state: FlyoutState::Idle,
            preview_seq: 0,
            last_error: None,
        }
    }

    /// Open with the catalog's current entries; a failing catalog leaves the
    /// flyout open with no options.
    pub async fn open(
        panel_id: impl Into<String>,
        time_range: TimeRange,
        mode: FlyoutMode,
        catalog: &dyn SavedVisualizationCatalog,
    ) -> Self {
        let options = match catalog.list().await {
            Ok(options) => options,
            Err(e) => {
                tracing::error!("Issue in fetching saved visualizations: {}", e);
                Vec::new()
            }
        };
        Self::new(panel_id, time_range, mode, options)
    }

    pub fn state(&self) -> &FlyoutState {
        &self.state
    }

    pub fn mode(&self) -> &FlyoutMode {
        &self.mode
    }

    pub fn options(&self) -> &[SavedVisualization] {
        &self.options
    }

    pub fn selected(&self) -> Option<&SavedVisualization> {
        self.selected.as_ref()
    }

    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, FlyoutState::Previewing | FlyoutState::Committing)
    }

    pub fn select(&mut self, saved_id: &str) -> Result<(), FlyoutError> {
        self.ensure_open()?;
        if self.state == FlyoutState::Committing {
            return Err(FlyoutError::Busy);
        }

        let saved = self
            .options
            .iter()
            .find(|v| v.id == saved_id)
            .cloned()
            .ok_or(FlyoutError::NoSelection)?;

        // A new selection supersedes any preview still in flight.
        self.preview_seq += 1;
        self.selected = Some(saved);
        self.state = FlyoutState::Selecting;
        Ok(())
    }

    /// Guards shared by preview and commit; nothing is cleared on failure
    pub fn validate(&self, now: DateTime<Utc>) -> Result<&SavedVisualization, FlyoutError> {
        let start = datemath::resolve(&self.time_range.from, false, now);
        let end = datemath::resolve(&self.time_range.to, true, now);
        match (start, end) {
            (Some(start), Some(end)) if end >= start => {}
            _ => return Err(FlyoutError::InvalidTimeRange),
        }

        self.selected.as_ref().ok_or(FlyoutError::NoSelection)
    }

    pub fn begin_preview(&mut self, now: DateTime<Utc>) -> Result<PreviewRequest, FlyoutError> {
        self.ensure_open()?;
        if self.state == FlyoutState::Committing {
            return Err(FlyoutError::Busy);
        }

        let (saved_id, query) = {
            let saved = self.validate(now)?;
            let expression = compose_time_only(&self.time_range, &saved.time_field, now);
            (saved.id.clone(), apply_where(&saved.query, &expression))
        };

        self.preview_seq += 1;
        self.state = FlyoutState::Previewing;
        tracing::debug!("Previewing saved visualization {}: {}", saved_id, query);
        Ok(PreviewRequest {
            seq: self.preview_seq,
            query,
        })
    }

    /// Apply a preview result; returns false when the result is stale
    pub fn finish_preview(
        &mut self,
        request: &PreviewRequest,
        result: PanelResult<QueryResponse>,
    ) -> bool {
        if self.state != FlyoutState::Previewing || request.seq != self.preview_seq {
            tracing::debug!("Dropping stale preview response {}", request.seq);
            return false;
        }

        self.state = match result {
            Ok(response) => FlyoutState::PreviewReady(response),
            Err(e) => FlyoutState::PreviewError(e.to_string()),
        };
        true
    }

    pub async fn preview(
        &mut self,
        executor: &dyn QueryExecutor,
        now: DateTime<Utc>,
    ) -> Result<(), FlyoutError> {
        let request = self.begin_preview(now)?;
        let result = request.send(executor).await;
        self.finish_preview(&request, result);
        Ok(())
    }

    pub fn begin_commit(&mut self, now: DateTime<Utc>) -> Result<CommitRequest, FlyoutError> {
        self.ensure_open()?;
        if self.state == FlyoutState::Committing {
            return Err(FlyoutError::Busy);
        }
        let saved = self.validate(now)?.clone();

        let resume = match &self.state {
            FlyoutState::Previewing => FlyoutState::Selecting,
            other => other.clone(),
        };
        let replace_visualization_id = match &self.mode {
            FlyoutMode::Add => None,
            FlyoutMode::Replace { visualization_id } => Some(visualization_id.clone()),
        };

        self.preview_seq += 1;
        self.state = FlyoutState::Committing;
        self.last_error = None;
        Ok(CommitRequest {
            panel_id: self.panel_id.clone(),
            saved,
            replace_visualization_id,
            resume,
        })
    }

    /// Close on success and hand back the persisted list; stay open on failure
    pub fn finish_commit(
        &mut self,
        request: CommitRequest,
        result: PanelResult<Vec<Visualization>>,
    ) -> Result<Vec<Visualization>, FlyoutError> {
        if self.state != FlyoutState::Committing {
            return Err(FlyoutError::Closed);
        }

        match result {
            Ok(visualizations) => {
                tracing::debug!(
                    "Visualization {} successfully added to panel {}",
                    request.saved.name,
                    request.panel_id
                );
                self.close();
                Ok(visualizations)
            }
            Err(e) => {
                tracing::error!(
                    "Error in adding {} visualization to panel {}: {}",
                    request.saved.name,
                    request.panel_id,
                    e
                );
                self.state = request.resume;
                self.last_error = Some(e.to_string());
                Err(FlyoutError::Panel(e))
            }
        }
    }

    pub async fn commit(
        &mut self,
        commands: &dyn VisualizationCommands,
        now: DateTime<Utc>,
    ) -> Result<Vec<Visualization>, FlyoutError> {
        let request = self.begin_commit(now)?;
        let result = request.send(commands).await;
        self.finish_commit(request, result)
    }

    /// Discard everything; a response still in flight is ignored when it lands
    pub fn close(&mut self) {
        self.state = FlyoutState::Closed;
        self.selected = None;
        self.options.clear();
        self.last_error = None;
        self.preview_seq += 1;
    }

    fn ensure_open(&self) -> Result<(), FlyoutError> {
        if self.state == FlyoutState::Closed {
            return Err(FlyoutError::Closed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::panel_repository::PanelRepository;
    use crate::application::visualization_service::VisualizationService;
    use crate::domain::panel::{NewVisualization, VisualizationLayout};
    use crate::domain::placement::{DEFAULT_H, DEFAULT_W};
    use crate::infrastructure::memory_store::InMemoryPanelStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn saved(id: &str, time_field: &str) -> SavedVisualization {
        SavedVisualization {
            id: id.to_string(),
            name: format!("Saved {}", id),
            query: "source=orders | stats count() by span(@timestamp, 1h)".to_string(),
            viz_type: "line".to_string(),
            time_field: time_field.to_string(),
            description: String::new(),
            selected_date_range: Default::default(),
            selected_fields: Default::default(),
        }
    }

    fn flyout(range: TimeRange, mode: FlyoutMode) -> FlyoutController {
        FlyoutController::new(
            "panel-1",
            range,
            mode,
            vec![saved("s1", "@timestamp"), saved("s2", "")],
        )
    }

    #[derive(Default)]
    struct CountingExecutor {
        queries: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl QueryExecutor for CountingExecutor {
        async fn execute(&self, query: &str) -> PanelResult<QueryResponse> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(PanelError::upstream(Some(400), "SyntaxCheckException"));
            }
            Ok(QueryResponse {
                total: 1,
                size: 1,
                status: 200,
                ..Default::default()
            })
        }
    }

    struct FailingCommands;

    #[async_trait]
    impl VisualizationCommands for FailingCommands {
        async fn add_from_saved(
            &self,
            _panel_id: &str,
            _saved: &SavedVisualization,
        ) -> PanelResult<Vec<Visualization>> {
            Err(PanelError::upstream(Some(502), "store unreachable"))
        }

        async fn replace(
            &self,
            _panel_id: &str,
            _old_visualization_id: &str,
            _visualization: NewVisualization,
        ) -> PanelResult<Vec<Visualization>> {
            Err(PanelError::upstream(None, "store unreachable"))
        }

        async fn update_layout(
            &self,
            _panel_id: &str,
            _layout: Vec<VisualizationLayout>,
        ) -> PanelResult<Vec<Visualization>> {
            Err(PanelError::upstream(None, "store unreachable"))
        }
    }

    #[tokio::test]
    async fn test_reversed_range_blocks_preview() {
        let executor = CountingExecutor::default();
        let mut flyout = flyout(TimeRange::new("2024-01-02", "2024-01-01"), FlyoutMode::Add);
        flyout.select("s1").unwrap();

        let err = flyout.preview(&executor, now()).await.unwrap_err();
        assert_eq!(err, FlyoutError::InvalidTimeRange);
        assert!(executor.queries.lock().unwrap().is_empty());
        // Input survives the rejection.
        assert_eq!(flyout.selected().map(|s| s.id.as_str()), Some("s1"));
        assert_eq!(flyout.state(), &FlyoutState::Selecting);
    }

    #[tokio::test]
    async fn test_missing_selection_is_distinct_failure() {
        let executor = CountingExecutor::default();
        let mut flyout = flyout(TimeRange::default(), FlyoutMode::Add);

        assert_eq!(
            flyout.preview(&executor, now()).await.unwrap_err(),
            FlyoutError::NoSelection
        );
        assert_eq!(flyout.select("nope").unwrap_err(), FlyoutError::NoSelection);
        assert!(executor.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_uses_time_window_only() {
        let executor = CountingExecutor::default();
        let mut flyout = flyout(
            TimeRange::new("2024-01-01 00:00:00", "2024-01-02 00:00:00"),
            FlyoutMode::Add,
        );
        flyout.select("s1").unwrap();
        flyout.preview(&executor, now()).await.unwrap();

        let queries = executor.queries.lock().unwrap();
        assert_eq!(
            queries[0],
            "source=orders | where @timestamp >= '2024-01-01 00:00:00' and @timestamp <= \
             '2024-01-02 00:00:00' | stats count() by span(@timestamp, 1h)"
        );
        assert!(matches!(flyout.state(), FlyoutState::PreviewReady(r) if r.total == 1));
    }

    #[tokio::test]
    async fn test_preview_failure_becomes_error_state() {
        let executor = CountingExecutor {
            fail: true,
            ..Default::default()
        };
        let mut flyout = flyout(TimeRange::default(), FlyoutMode::Add);
        flyout.select("s2").unwrap();
        flyout.preview(&executor, now()).await.unwrap();

        assert_eq!(
            flyout.state(),
            &FlyoutState::PreviewError("SyntaxCheckException".to_string())
        );
    }

    #[test]
    fn test_stale_preview_dropped() {
        let mut flyout = flyout(TimeRange::default(), FlyoutMode::Add);
        flyout.select("s1").unwrap();
        let first = flyout.begin_preview(now()).unwrap();
        let second = flyout.begin_preview(now()).unwrap();

        assert!(!flyout.finish_preview(&first, Ok(QueryResponse::default())));
        assert_eq!(flyout.state(), &FlyoutState::Previewing);
        assert!(flyout.finish_preview(&second, Ok(QueryResponse::default())));

        let third = flyout.begin_preview(now()).unwrap();
        flyout.close();
        assert!(!flyout.finish_preview(&third, Ok(QueryResponse::default())));
        assert_eq!(flyout.state(), &FlyoutState::Closed);
    }

    #[tokio::test]
    async fn test_commit_adds_and_closes() {
        let repo = PanelRepository::new(Arc::new(InMemoryPanelStore::new()));
        let panel_id = repo.create("Sales").await.unwrap();
        let service = VisualizationService::new(repo.clone());

        let mut flyout = FlyoutController::new(
            panel_id.clone(),
            TimeRange::default(),
            FlyoutMode::Add,
            vec![saved("s1", "@timestamp")],
        );
        flyout.select("s1").unwrap();
        let list = flyout.commit(&service, now()).await.unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Saved s1");
        assert_eq!((list[0].w, list[0].h), (DEFAULT_W, DEFAULT_H));
        assert_eq!(repo.get(&panel_id).await.unwrap().visualizations, list);
        assert_eq!(flyout.state(), &FlyoutState::Closed);
        assert!(flyout.options().is_empty());
    }

    #[tokio::test]
    async fn test_commit_replaces_target() {
        let repo = PanelRepository::new(Arc::new(InMemoryPanelStore::new()));
        let panel_id = repo.create("Sales").await.unwrap();
        let service = VisualizationService::new(repo.clone());
        let existing = service
            .add_from_saved(&panel_id, &saved("s2", ""))
            .await
            .unwrap();

        let mut flyout = FlyoutController::new(
            panel_id.clone(),
            TimeRange::default(),
            FlyoutMode::Replace {
                visualization_id: existing[0].id.clone(),
            },
            vec![saved("s1", "@timestamp")],
        );
        flyout.select("s1").unwrap();
        let list = flyout.commit(&service, now()).await.unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Saved s1");
        assert_eq!(list[0].rect(), existing[0].rect());
        assert_ne!(list[0].id, existing[0].id);
    }

    #[tokio::test]
    async fn test_failed_commit_stays_open() {
        let mut flyout = flyout(TimeRange::default(), FlyoutMode::Add);
        flyout.select("s1").unwrap();

        let err = flyout.commit(&FailingCommands, now()).await.unwrap_err();
        assert!(matches!(err, FlyoutError::Panel(PanelError::Upstream { .. })));
        assert_eq!(flyout.state(), &FlyoutState::Selecting);
        assert_eq!(flyout.last_error(), Some("store unreachable"));
        assert_eq!(flyout.selected().map(|s| s.id.as_str()), Some("s1"));
    }

    #[test]
    fn test_second_commit_while_in_flight_is_busy() {
        let mut flyout = flyout(TimeRange::default(), FlyoutMode::Add);
        flyout.select("s1").unwrap();

        let _pending = flyout.begin_commit(now()).unwrap();
        assert!(flyout.is_busy());
        assert_eq!(flyout.begin_commit(now()).unwrap_err(), FlyoutError::Busy);
        assert_eq!(flyout.begin_preview(now()).unwrap_err(), FlyoutError::Busy);
    }

    #[test]
    fn test_close_mid_commit_drops_response() {
        let mut flyout = flyout(TimeRange::default(), FlyoutMode::Add);
        flyout.select("s1").unwrap();
        let pending = flyout.begin_commit(now()).unwrap();
        flyout.close();

        assert_eq!(
            flyout.finish_commit(pending, Ok(Vec::new())).unwrap_err(),
            FlyoutError::Closed
        );
        assert_eq!(flyout.select("s1").unwrap_err(), FlyoutError::Closed);
    }
}
