use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/panels";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub query: QuerySettings,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    OpenSearch,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub host: String,
    pub index: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuerySettings {
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogSettings {
    pub path: String,
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Defaults, then the optional file at `path`, then `PANELS__*` variables
pub fn load_config_from(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .set_default("server.bind_address", "0.0.0.0:8080")?
        .set_default("store.backend", "memory")?
        .set_default("store.host", "http://localhost:9200")?
        .set_default("store.index", ".opensearch-observability-panels")?
        .set_default("query.host", "http://localhost:9200")?
        .set_default("catalog.path", "config/saved_visualizations.toml")?
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix("PANELS").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
