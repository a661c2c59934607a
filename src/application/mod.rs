// Application layer - Use cases and the traits external adaptors implement
pub mod catalog;
pub mod flyout;
pub mod layout_grid;
pub mod panel_repository;
pub mod panel_store;
pub mod query_executor;
pub mod visualization_service;
