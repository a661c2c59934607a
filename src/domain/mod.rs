// Domain layer - Panel model, placement and query composition
pub mod datemath;
pub mod error;
pub mod panel;
pub mod placement;
pub mod query;
pub mod saved_visualization;
