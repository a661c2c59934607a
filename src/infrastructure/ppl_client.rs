// PPL query client used for visualization previews
use crate::application::query_executor::{QueryExecutor, QueryResponse};
use crate::domain::error::{PanelError, PanelResult};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct PplQueryClient {
    client: reqwest::Client,
    host: String,
}

impl PplQueryClient {
    pub fn new(host: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
        }
    }

    fn query_url(&self) -> String {
        format!("{}/_plugins/_ppl", self.host)
    }
}

#[async_trait]
impl QueryExecutor for PplQueryClient {
    async fn execute(&self, query: &str) -> PanelResult<QueryResponse> {
        tracing::debug!("Executing PPL query: {}", query);
        let response = self
            .client
            .post(self.query_url())
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| {
                PanelError::upstream(None, format!("Failed to send PPL query: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("PPL query failed with status {}: {}", status, body);
            return Err(PanelError::upstream(Some(status.as_u16()), body));
        }

        let mut data = response.json::<QueryResponse>().await.map_err(|e| {
            PanelError::upstream(None, format!("Failed to parse PPL response: {}", e))
        })?;
        if data.status == 0 {
            data.status = status.as_u16();
        }
        Ok(data)
    }
}
