// OpenSearch document store for panels
use crate::application::panel_store::PanelStore;
use crate::domain::error::{PanelError, PanelResult};
use crate::domain::panel::Panel;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

const MAX_PANELS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct OpenSearchPanelStore {
    client: reqwest::Client,
    host: String,
    index: String,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Panel>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    total: Option<TotalHits>,
    hits: Vec<SearchHit>,
}

/// `hits.total` is an object on current clusters and a bare count on old ones
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Count(value) | TotalHits::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: Panel,
}

impl OpenSearchPanelStore {
    pub fn new(host: String, index: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            index,
        }
    }

    fn doc_url(&self, id: &str) -> String {
        format!(
            "{}/{}/_doc/{}",
            self.host,
            urlencoding::encode(&self.index),
            urlencoding::encode(id)
        )
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.host, urlencoding::encode(&self.index))
    }

    async fn check(response: reqwest::Response, action: &str) -> PanelResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!("OpenSearch {} failed with status {}: {}", action, status, body);
        Err(PanelError::upstream(
            Some(status.as_u16()),
            format!("OpenSearch {} failed with status {}: {}", action, status, body),
        ))
    }
}

fn transport_error(action: &str, e: reqwest::Error) -> PanelError {
    tracing::error!("Failed to send {} request to OpenSearch: {}", action, e);
    PanelError::upstream(
        e.status().map(|s| s.as_u16()),
        format!("Failed to send {} request to OpenSearch: {}", action, e),
    )
}

fn decode_error(action: &str, e: reqwest::Error) -> PanelError {
    PanelError::upstream(None, format!("Failed to parse OpenSearch {} response: {}", action, e))
}

#[async_trait]
impl PanelStore for OpenSearchPanelStore {
    async fn list(&self) -> PanelResult<Vec<Panel>> {
        let body = serde_json::json!({
            "size": MAX_PANELS,
            "track_total_hits": true,
            "query": { "match_all": {} },
        });

        let response = self
            .client
            .post(self.search_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("search", e))?;

        // A missing index simply means nothing was stored yet.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let data = Self::check(response, "search")
            .await?
            .json::<SearchResponse>()
            .await
            .map_err(|e| decode_error("search", e))?;

        let fetched = data.hits.hits.len();
        if let Some(total) = data.hits.total.as_ref().map(TotalHits::value) {
            if total > fetched as u64 {
                tracing::warn!(
                    "Index {} holds {} panels, listing only the first {}",
                    self.index,
                    total,
                    fetched
                );
            }
        }

        tracing::debug!("Fetched {} panels from {}", fetched, self.index);
        Ok(data.hits.hits.into_iter().map(|hit| hit.source).collect())
    }

    async fn get(&self, id: &str) -> PanelResult<Option<Panel>> {
        let response = self
            .client
            .get(self.doc_url(id))
            .send()
            .await
            .map_err(|e| transport_error("get", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let data = Self::check(response, "get")
            .await?
            .json::<GetResponse>()
            .await
            .map_err(|e| decode_error("get", e))?;

        Ok(data.source.filter(|_| data.found))
    }

    async fn put(&self, panel: &Panel) -> PanelResult<()> {
        let response = self
            .client
            .put(self.doc_url(&panel.id))
            .query(&[("refresh", "true")])
            .json(panel)
            .send()
            .await
            .map_err(|e| transport_error("index", e))?;

        Self::check(response, "index").await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> PanelResult<()> {
        let response = self
            .client
            .delete(self.doc_url(id))
            .query(&[("refresh", "true")])
            .send()
            .await
            .map_err(|e| transport_error("delete", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PanelError::panel_not_found(id));
        }

        Self::check(response, "delete").await?;
        Ok(())
    }
}
