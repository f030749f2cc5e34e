use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::error::FetchError;
use crate::pagination::{CursorStyle, fetch_all};

pub type QueryParams = Vec<(String, String)>;

/// Raw upstream reply; status and body are kept so error text can be passed through.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, FetchError> {
        serde_json::from_str(&self.body).map_err(|e| FetchError::InvalidJson(e.to_string()))
    }
}

#[async_trait]
pub trait GraphTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<UpstreamResponse, FetchError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphTransport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<UpstreamResponse, FetchError> {
        let parsed = if params.is_empty() {
            Url::parse(url)
        } else {
            Url::parse_with_params(url, params)
        };
        let url = parsed.map_err(|e| {
            FetchError::Transport(format!("Invalid URL {}: {}", without_query(url), e))
        })?;

        // The query carries the access token; reqwest errors would echo it.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            FetchError::Transport(format!("Failed to read response: {}", e.without_url()))
        })?;

        Ok(UpstreamResponse { status, body })
    }
}

fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

/// Graph API client bound to one access token.
#[derive(Clone)]
pub struct GraphClient {
    transport: Arc<dyn GraphTransport>,
    root: String,
    access_token: String,
    max_pages: usize,
}

impl GraphClient {
    pub fn new(
        transport: Arc<dyn GraphTransport>,
        root: impl Into<String>,
        access_token: impl Into<String>,
        max_pages: usize,
    ) -> Self {
        Self {
            transport,
            root: root.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            max_pages,
        }
    }

    pub fn from_config(transport: Arc<dyn GraphTransport>, config: &Config) -> Self {
        Self::new(
            transport,
            config.graph_root(),
            config.page_access_token.clone(),
            config.max_pages,
        )
    }

    pub fn node_url(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }

    fn with_token(&self, params: &[(&str, &str)]) -> QueryParams {
        params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain(std::iter::once((
                "access_token".to_string(),
                self.access_token.clone(),
            )))
            .collect()
    }

    /// Single-object read, e.g. a campaign or the page's Instagram account.
    pub async fn get_node(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = self.node_url(path);
        tracing::debug!(%url, "graph node request");

        let response = self.transport.get(&url, &self.with_token(params)).await?;
        if !response.is_success() {
            return Err(FetchError::Upstream {
                status: response.status,
                details: response.body,
            });
        }
        response.json()
    }

    /// Collects every page of an edge, following cursors until the upstream stops.
    pub async fn get_edge(
        &self,
        path: &str,
        params: &[(&str, &str)],
        style: CursorStyle,
    ) -> Result<Vec<Value>, FetchError> {
        fetch_all(
            self.transport.as_ref(),
            &self.node_url(path),
            self.with_token(params),
            style,
            self.max_pages,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreachable;

    #[async_trait]
    impl GraphTransport for Unreachable {
        async fn get(
            &self,
            _: &str,
            _: &[(String, String)],
        ) -> Result<UpstreamResponse, FetchError> {
            Err(FetchError::Transport("unreachable".to_string()))
        }
    }

    #[test]
    fn node_urls_join_without_double_slashes() {
        let client =
            GraphClient::new(Arc::new(Unreachable), "https://graph.test/v18.0/", "tok", 5);
        assert_eq!(client.node_url("/act_1/ads"), "https://graph.test/v18.0/act_1/ads");
        assert_eq!(client.node_url("123"), "https://graph.test/v18.0/123");
    }

    #[test]
    fn token_is_appended_to_params() {
        let client = GraphClient::new(Arc::new(Unreachable), "https://graph.test/v18.0", "tok", 5);
        let params = client.with_token(&[("fields", "id,name")]);
        assert_eq!(
            params,
            vec![
                ("fields".to_string(), "id,name".to_string()),
                ("access_token".to_string(), "tok".to_string()),
            ]
        );
    }

    #[test]
    fn query_is_stripped_from_reported_urls() {
        assert_eq!(
            without_query("https://graph.test/v18.0/act_1/ads?access_token=tok"),
            "https://graph.test/v18.0/act_1/ads"
        );
        assert_eq!(without_query("not a url"), "not a url");
    }

    #[tokio::test]
    async fn invalid_next_url_does_not_echo_token() {
        let transport = HttpTransport::new();
        let err = transport
            .get("graph.test/act_1/ads?access_token=SECRET", &[])
            .await
            .unwrap_err();

        assert!(matches!(&err, FetchError::Transport(message) if !message.contains("SECRET")));
    }

    #[test]
    fn success_range() {
        assert!(UpstreamResponse::new(200, "{}").is_success());
        assert!(!UpstreamResponse::new(400, "{}").is_success());
        assert!(matches!(
            UpstreamResponse::new(200, "not json").json(),
            Err(FetchError::InvalidJson(_))
        ));
    }
}
