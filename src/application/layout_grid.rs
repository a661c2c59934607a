// Layout grid - Keeps the interactive grid in step with the panel's visualizations
use crate::application::visualization_service::VisualizationCommands;
use crate::domain::error::PanelResult;
use crate::domain::panel::{GridRect, Visualization, VisualizationLayout};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    View,
    Edit,
}

/// One cell of the grid as handed to the rendering grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItem {
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Locked in place; true outside edit mode
    #[serde(rename = "static", default)]
    pub is_static: bool,
    /// Drag state reported by the grid
    #[serde(default)]
    pub moved: bool,
}

impl GridItem {
    fn from_visualization(visualization: &Visualization, is_static: bool) -> Self {
        Self {
            i: visualization.id.clone(),
            x: visualization.x,
            y: visualization.y,
            w: visualization.w,
            h: visualization.h,
            is_static,
            moved: false,
        }
    }

    fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }

    /// Geometry only, transient fields dropped
    fn to_layout(&self) -> VisualizationLayout {
        VisualizationLayout {
            i: self.i.clone(),
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing moved, nothing persisted
    Unchanged,
    Saved,
}

/// View/edit state machine over a panel's grid
#[derive(Debug, Clone)]
pub struct LayoutGrid {
    panel_id: String,
    mode: GridMode,
    visualizations: Vec<Visualization>,
    layout: Vec<GridItem>,
    edited_layout: Vec<GridItem>,
    resize_generation: u64,
}

impl LayoutGrid {
    pub fn new(panel_id: impl Into<String>, visualizations: Vec<Visualization>) -> Self {
        let mut grid = Self {
            panel_id: panel_id.into(),
            mode: GridMode::View,
            visualizations,
            layout: Vec::new(),
            edited_layout: Vec::new(),
            resize_generation: 0,
        };
        grid.reload_layout();
        grid
    }

    pub fn mode(&self) -> GridMode {
        self.mode
    }

    pub fn visualizations(&self) -> &[Visualization] {
        &self.visualizations
    }

    pub fn layout(&self) -> &[GridItem] {
        &self.layout
    }

    pub fn resize_generation(&self) -> u64 {
        self.resize_generation
    }

    pub fn enter_edit(&mut self) {
        if self.mode == GridMode::Edit {
            return;
        }
        self.mode = GridMode::Edit;
        self.reload_layout();
        self.edited_layout = self.layout.clone();
    }

    /// Live geometry reported by the grid while cells are dragged or resized
    pub fn on_layout_change(&mut self, current: Vec<GridItem>) {
        self.resize_generation += 1;
        if self.mode != GridMode::Edit {
            return;
        }
        self.edited_layout = current;
    }

    /// Leave edit mode, persisting geometry only when something moved.
    ///
    /// On failure the grid stays in edit mode with the edited layout intact
    /// so the save can be retried.
    pub async fn exit_edit(
        &mut self,
        commands: &dyn VisualizationCommands,
    ) -> PanelResult<EditOutcome> {
        if self.mode == GridMode::View {
            return Ok(EditOutcome::Unchanged);
        }

        if !self.has_changes() {
            tracing::debug!("Layout of panel {} unchanged", self.panel_id);
            self.mode = GridMode::View;
            self.edited_layout.clear();
            self.reload_layout();
            return Ok(EditOutcome::Unchanged);
        }

        let params: Vec<VisualizationLayout> =
            self.edited_layout.iter().map(GridItem::to_layout).collect();
        let saved = commands.update_layout(&self.panel_id, params).await?;

        self.mode = GridMode::View;
        self.edited_layout.clear();
        self.set_visualizations(saved);
        Ok(EditOutcome::Saved)
    }

    /// Install a new authoritative list and recompute the grid.
    ///
    /// In edit mode, positions the user already changed are kept for the
    /// visualizations that survive.
    pub fn set_visualizations(&mut self, visualizations: Vec<Visualization>) {
        self.visualizations = visualizations;
        self.reload_layout();

        if self.mode == GridMode::Edit {
            let edited: HashMap<&str, &GridItem> = self
                .edited_layout
                .iter()
                .map(|item| (item.i.as_str(), item))
                .collect();
            let merged: Vec<GridItem> = self
                .layout
                .iter()
                .map(|item| match edited.get(item.i.as_str()) {
                    Some(moved) => GridItem {
                        is_static: false,
                        ..(*moved).clone()
                    },
                    None => item.clone(),
                })
                .collect();
            self.edited_layout = merged;
        }
    }

    /// Container width changed; pixel geometry must be recomputed
    pub fn on_container_resize(&mut self) -> u64 {
        self.resize_generation += 1;
        self.resize_generation
    }

    fn reload_layout(&mut self) {
        let is_static = self.mode == GridMode::View;
        self.layout = self
            .visualizations
            .iter()
            .map(|v| GridItem::from_visualization(v, is_static))
            .collect();
    }

    fn has_changes(&self) -> bool {
        let persisted: HashMap<&str, GridRect> = self
            .visualizations
            .iter()
            .map(|v| (v.id.as_str(), v.rect()))
            .collect();

        self.edited_layout
            .iter()
            .any(|item| persisted.get(item.i.as_str()) != Some(&item.rect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PanelError;
    use crate::domain::panel::NewVisualization;
    use crate::domain::saved_visualization::SavedVisualization;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCommands {
        layout_calls: Mutex<Vec<Vec<VisualizationLayout>>>,
        fail: bool,
    }

    #[async_trait]
    impl VisualizationCommands for RecordingCommands {
        async fn add_from_saved(
            &self,
            _panel_id: &str,
            _saved: &SavedVisualization,
        ) -> PanelResult<Vec<Visualization>> {
            unreachable!("grid never adds")
        }

        async fn replace(
            &self,
            _panel_id: &str,
            _old_visualization_id: &str,
            _visualization: NewVisualization,
        ) -> PanelResult<Vec<Visualization>> {
            unreachable!("grid never replaces")
        }

        async fn update_layout(
            &self,
            _panel_id: &str,
            layout: Vec<VisualizationLayout>,
        ) -> PanelResult<Vec<Visualization>> {
            self.layout_calls.lock().unwrap().push(layout.clone());
            if self.fail {
                return Err(PanelError::upstream(Some(503), "store unavailable"));
            }
            Ok(layout
                .iter()
                .map(|cell| viz(&cell.i, cell.rect()))
                .collect())
        }
    }

    fn viz(id: &str, rect: GridRect) -> Visualization {
        Visualization::from_definition(
            id.to_string(),
            NewVisualization {
                title: id.to_string(),
                query: "source=logs".to_string(),
                viz_type: "line".to_string(),
                time_field: "@timestamp".to_string(),
            },
            rect,
        )
    }

    fn grid() -> LayoutGrid {
        LayoutGrid::new(
            "panel-1",
            vec![
                viz("a", GridRect::new(0, 0, 6, 4)),
                viz("b", GridRect::new(0, 4, 6, 4)),
            ],
        )
    }

    fn moved(item: &GridItem, x: u32, y: u32) -> GridItem {
        GridItem {
            x,
            y,
            moved: true,
            ..item.clone()
        }
    }

    #[test]
    fn test_view_mode_cells_are_static() {
        let grid = grid();
        assert_eq!(grid.mode(), GridMode::View);
        assert!(grid.layout().iter().all(|item| item.is_static));
        assert_eq!(grid.layout()[1].rect(), GridRect::new(0, 4, 6, 4));
    }

    #[tokio::test]
    async fn test_edit_without_moves_persists_nothing() {
        let commands = RecordingCommands::default();
        let mut grid = grid();

        grid.enter_edit();
        assert!(grid.layout().iter().all(|item| !item.is_static));
        let live = grid.layout().to_vec();
        grid.on_layout_change(live);

        let outcome = grid.exit_edit(&commands).await.unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert!(commands.layout_calls.lock().unwrap().is_empty());
        assert_eq!(grid.mode(), GridMode::View);
        assert!(grid.layout().iter().all(|item| item.is_static));
    }

    #[tokio::test]
    async fn test_moved_cell_is_saved_once() {
        let commands = RecordingCommands::default();
        let mut grid = grid();

        grid.enter_edit();
        let mut live = grid.layout().to_vec();
        live[1] = moved(&live[1], 6, 0);
        grid.on_layout_change(live);

        let outcome = grid.exit_edit(&commands).await.unwrap();
        assert_eq!(outcome, EditOutcome::Saved);

        let calls = commands.layout_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][1].rect(), GridRect::new(6, 0, 6, 4));

        assert_eq!(grid.visualizations()[1].rect(), GridRect::new(6, 0, 6, 4));
        assert!(grid.layout().iter().all(|item| item.is_static && !item.moved));
    }

    #[tokio::test]
    async fn test_failed_save_stays_in_edit_mode() {
        let commands = RecordingCommands {
            fail: true,
            ..Default::default()
        };
        let mut grid = grid();
        grid.enter_edit();
        let mut live = grid.layout().to_vec();
        live[0] = moved(&live[0], 6, 0);
        grid.on_layout_change(live);

        assert!(grid.exit_edit(&commands).await.is_err());
        assert_eq!(grid.mode(), GridMode::Edit);
        assert_eq!(grid.visualizations()[0].rect(), GridRect::new(0, 0, 6, 4));

        // Retry still sees the pending move.
        assert!(grid.exit_edit(&commands).await.is_err());
        assert_eq!(commands.layout_calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_list_change_recomputes_layout() {
        let mut grid = grid();
        grid.set_visualizations(vec![viz("c", GridRect::new(0, 0, 12, 2))]);

        assert_eq!(grid.layout().len(), 1);
        assert_eq!(grid.layout()[0].i, "c");
        assert!(grid.layout()[0].is_static);
    }

    #[test]
    fn test_list_change_in_edit_mode_keeps_user_moves() {
        let mut grid = grid();
        grid.enter_edit();
        let mut live = grid.layout().to_vec();
        live[0] = moved(&live[0], 6, 8);
        grid.on_layout_change(live);

        grid.set_visualizations(vec![
            viz("a", GridRect::new(0, 0, 6, 4)),
            viz("c", GridRect::new(0, 8, 6, 4)),
        ]);
        assert_eq!(grid.edited_layout.len(), 2);
        assert_eq!(grid.edited_layout[0].rect(), GridRect::new(6, 8, 6, 4));
        assert_eq!(grid.edited_layout[1].i, "c");
    }

    #[test]
    fn test_resize_only_bumps_generation() {
        let mut grid = grid();
        let before = grid.visualizations().to_vec();
        let generation = grid.on_container_resize();

        assert_eq!(generation, 1);
        assert_eq!(grid.visualizations(), before.as_slice());
        assert_eq!(grid.mode(), GridMode::View);
    }

    #[test]
    fn test_transient_fields_stripped() {
        let item = GridItem {
            i: "a".to_string(),
            x: 1,
            y: 2,
            w: 3,
            h: 4,
            is_static: false,
            moved: true,
        };
        let json = serde_json::to_value(item.to_layout()).unwrap();
        assert_eq!(json, serde_json::json!({"i": "a", "x": 1, "y": 2, "w": 3, "h": 4}));
    }
}
