// Presentation layer - HTTP API
pub mod app_state;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
