// Saved visualization catalog entries (read-only here)
use serde::{Deserialize, Serialize};

use super::panel::NewVisualization;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVisualization {
    pub id: String,
    pub name: String,
    pub query: String,
    #[serde(rename = "type")]
    pub viz_type: String,
    #[serde(default, alias = "time_field")]
    pub time_field: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "selected_date_range")]
    pub selected_date_range: SelectedDateRange,
    #[serde(default, alias = "selected_fields")]
    pub selected_fields: SelectedFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDateRange {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFields {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl SavedVisualization {
    /// Seed for a panel visualization; an empty time field stays empty
    pub fn to_definition(&self) -> NewVisualization {
        NewVisualization {
            title: self.name.clone(),
            query: self.query.clone(),
            viz_type: self.viz_type.clone(),
            time_field: self.time_field.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_snake_case_fields() {
        let saved: SavedVisualization = serde_json::from_str(
            r#"{"id":"s1","name":"Errors","query":"source=logs","type":"bar","time_field":"ts",
                "selected_date_range":{"start":"now-1h","end":"now","text":""}}"#,
        )
        .unwrap();
        assert_eq!(saved.time_field, "ts");
        assert_eq!(saved.selected_date_range.start, "now-1h");
        assert!(saved.selected_fields.tokens.is_empty());

        let def = saved.to_definition();
        assert_eq!(def.title, "Errors");
        assert_eq!(def.viz_type, "bar");
    }
}
