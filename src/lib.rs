// Operational panels - Dashboards of saved query visualizations on a shared grid
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
