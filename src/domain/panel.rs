// Panel and visualization domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{PanelError, PanelResult};
use super::placement::{COLS, MAX_ROWS};
use super::query::{apply_where, compose_effective_query};

const VISUALIZATION_ID_PREFIX: &str = "panel_viz_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: String,
    pub name: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    #[serde(default)]
    pub visualizations: Vec<Visualization>,
    pub time_range: TimeRange,
    pub query_filter: QueryFilter,
    #[serde(default)]
    pub refresh_config: RefreshConfig,
}

impl Panel {
    /// Fresh, empty panel with the default one-day window
    pub fn new(id: String, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            date_created: now,
            date_modified: now,
            visualizations: Vec::new(),
            time_range: TimeRange::default(),
            query_filter: QueryFilter::default(),
            refresh_config: RefreshConfig::default(),
        }
    }

    pub fn find_visualization(&self, visualization_id: &str) -> Option<&Visualization> {
        self.visualizations.iter().find(|v| v.id == visualization_id)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.date_modified = now;
    }

    /// Query to run for one of this panel's visualizations: the panel filter,
    /// any ad-hoc `free_text` and the panel time window spliced into the
    /// visualization's own query.
    pub fn effective_query(
        &self,
        visualization: &Visualization,
        free_text: &str,
        now: DateTime<Utc>,
    ) -> String {
        let expression = compose_effective_query(
            std::slice::from_ref(&self.query_filter.query),
            free_text,
            &self.time_range,
            &visualization.time_field,
            now,
        );
        apply_where(&visualization.query, &expression)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

impl TimeRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::new("now-1d", "now")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub query: String,
    pub language: String,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            language: "ppl".to_string(),
        }
    }
}

/// Auto-refresh policy; stored and returned, never interpreted here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub pause: bool,
    pub value: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            pause: true,
            value: 15,
        }
    }
}

/// Rectangle in grid units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn overlaps(&self, other: &GridRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn validate(&self) -> PanelResult<()> {
        if self.w == 0 || self.h == 0 {
            return Err(PanelError::validation(format!(
                "Visualization size must be positive, got {}x{}",
                self.w, self.h
            )));
        }
        match self.x.checked_add(self.w) {
            Some(right) if right <= COLS => {}
            _ => {
                return Err(PanelError::validation(format!(
                    "Visualization exceeds grid width: x={} w={} cols={}",
                    self.x, self.w, COLS
                )));
            }
        }
        match self.y.checked_add(self.h) {
            Some(bottom) if bottom <= MAX_ROWS => {}
            _ => {
                return Err(PanelError::validation(format!(
                    "Visualization exceeds grid height: y={} h={} rows={}",
                    self.y, self.h, MAX_ROWS
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub id: String,
    pub title: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub query: String,
    #[serde(rename = "type")]
    pub viz_type: String,
    #[serde(rename = "timeField", default)]
    pub time_field: String,
}

impl Visualization {
    pub fn from_definition(id: String, definition: NewVisualization, rect: GridRect) -> Self {
        Self {
            id,
            title: definition.title,
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            query: definition.query,
            viz_type: definition.viz_type,
            time_field: definition.time_field,
        }
    }

    pub fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }

    pub fn set_rect(&mut self, rect: GridRect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    pub fn layout(&self) -> VisualizationLayout {
        VisualizationLayout {
            i: self.id.clone(),
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    pub fn definition(&self) -> NewVisualization {
        NewVisualization {
            title: self.title.clone(),
            query: self.query.clone(),
            viz_type: self.viz_type.clone(),
            time_field: self.time_field.clone(),
        }
    }
}

/// Visualization content before an id and geometry are assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVisualization {
    pub title: String,
    pub query: String,
    #[serde(rename = "type")]
    pub viz_type: String,
    #[serde(rename = "timeField", default)]
    pub time_field: String,
}

/// Geometry of one grid cell as reported by the layout editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationLayout {
    /// Visualization id
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl VisualizationLayout {
    pub fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }
}

/// Namespaced, collision-free visualization id
pub fn new_visualization_id() -> String {
    format!("{}{}", VISUALIZATION_ID_PREFIX, uuid::Uuid::new_v4().simple())
}

pub fn new_panel_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
