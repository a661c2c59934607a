// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_catalog;
pub mod memory_store;
pub mod opensearch_store;
pub mod ppl_client;
