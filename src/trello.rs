// src/trello.rs
//! Networking utilities to interact with the Trello REST API

use crate::board::{BoardApi, BoardError, Card, Label, List};
use crate::config::FinalBoardConfig;
use anyhow::Context;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct TrelloClient {
    http_client: Client,
    base_url: Url,
    api_key: String,
    api_token: String,
}

impl TrelloClient {
    pub fn new(cfg: &FinalBoardConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("Invalid Trello base URL: {}", cfg.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Trello base URL cannot have path segments: {}", cfg.base_url);
        }

        let http_client = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("Failed to build HTTP client for Trello")?;
        debug!("HTTP client built with timeout: {}ms", cfg.timeout_ms);

        Ok(Self {
            http_client,
            base_url,
            api_key: cfg.api_key.clone(),
            api_token: cfg.api_token.clone(),
        })
    }

    /// Absolute URL for an API path. Each segment is percent-encoded, so ids cannot
    /// change the route. Credentials are passed separately so this is safe to log.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, segments: &[&str]) -> Result<(String, reqwest::Response), BoardError> {
        let url = self.url(segments);
        let url_text = url.to_string();
        debug!("Sending GET request to URL: {}", url_text);
        let res = self
            .http_client
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("token", self.api_token.as_str())])
            .send()
            .await
            .map_err(|source| {
                error!("Request to {} failed: {}", url_text, source);
                BoardError::Transport { url: url_text.clone(), source }
            })?;
        debug!("Received response status: {}", res.status());
        Ok((url_text, res))
    }

    async fn decode<T: DeserializeOwned>(url: String, res: reqwest::Response) -> Result<T, BoardError> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_else(|_| "N/A".to_string());
            error!("Trello responded with HTTP {} and body: {}", status, body);
            return Err(BoardError::Status { url, status, body });
        }
        match res.json::<T>().await {
            Ok(value) => Ok(value),
            Err(source) => {
                error!("Failed to decode response from {}: {}", url, source);
                Err(BoardError::Decode { url, source })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, BoardError> {
        let (url, res) = self.send(segments).await?;
        Self::decode(url, res).await
    }

    /// Ping Trello with the configured credentials.
    /// Returns Ok(()) on success, Err on any network/HTTP error.
    pub async fn check_status(&self) -> anyhow::Result<()> {
        info!("Checking Trello connectivity at {}", self.base_url);
        let (url, res) = self.send(&["members", "me"]).await?;
        if res.status().is_success() {
            info!("Trello responded with success status: {}", res.status());
            Ok(())
        } else {
            let status = res.status();
            let text = res.text().await.unwrap_or_else(|_| "N/A".to_string());
            error!("Trello responded with HTTP {} and body: {}", status, text);
            anyhow::bail!("{} responded with HTTP {}", url, status);
        }
    }
}

#[async_trait]
impl BoardApi for TrelloClient {
    async fn lists_on_board(&self, board_id: &str) -> Result<Vec<List>, BoardError> {
        self.get_json(&["boards", board_id, "lists"]).await
    }

    async fn cards_on_list(&self, list_id: &str) -> Result<Vec<Card>, BoardError> {
        self.get_json(&["lists", list_id, "cards"]).await
    }

    async fn labels_for_board(&self, board_id: &str) -> Result<Vec<Label>, BoardError> {
        self.get_json(&["boards", board_id, "labels"]).await
    }

    async fn label(&self, label_id: &str) -> Result<Option<Label>, BoardError> {
        let (url, res) = self.send(&["labels", label_id]).await?;
        if res.status() == StatusCode::NOT_FOUND {
            debug!("Label {} not found", label_id);
            return Ok(None);
        }
        Self::decode(url, res).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelLookup;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn config(base_url: &str) -> FinalBoardConfig {
        FinalBoardConfig {
            api_key: "key".to_string(),
            api_token: "secret-token".to_string(),
            board_id: "board".to_string(),
            base_url: base_url.to_string(),
            timeout_ms: 5000,
            label_lookup: LabelLookup::Board,
        }
    }

    /// Serves one canned HTTP response on a local port. The handle yields the request line.
    async fn serve_once(status: &str, body: &str) -> (TrelloClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            let request = String::from_utf8_lossy(&request).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });
        let client = TrelloClient::new(&config(&format!("http://{}/1", addr))).unwrap();
        (client, handle)
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = TrelloClient::new(&config("https://api.trello.com/1/")).unwrap();
        assert_eq!(
            client.url(&["boards", "b1", "lists"]).as_str(),
            "https://api.trello.com/1/boards/b1/lists"
        );
        let client = TrelloClient::new(&config("https://api.trello.com/1")).unwrap();
        assert_eq!(client.url(&["labels", "x"]).as_str(), "https://api.trello.com/1/labels/x");
    }

    #[test]
    fn test_url_escapes_ids() {
        let client = TrelloClient::new(&config("https://api.trello.com/1")).unwrap();
        let url = client.url(&["boards", "a/b?c#d", "lists"]);
        assert_eq!(url.as_str(), "https://api.trello.com/1/boards/a%2Fb%3Fc%23d/lists");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_url_never_contains_credentials() {
        let client = TrelloClient::new(&config("https://api.trello.com/1")).unwrap();
        let url = client.url(&["members", "me"]);
        assert!(!url.as_str().contains("secret-token"));
        assert!(!url.as_str().contains("key="));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(TrelloClient::new(&config("not a url")).is_err());
        assert!(TrelloClient::new(&config("mailto:someone@example.com")).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = TrelloClient::new(&config("http://127.0.0.1:9/1")).unwrap();
        let err = client.lists_on_board("b1").await.unwrap_err();
        assert!(matches!(err, BoardError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_lists_on_board_decodes_payload() {
        let (client, server) =
            serve_once("200 OK", r#"[{"id": "l1", "name": "Sprint 3 - Doing", "idBoard": "b1"}]"#).await;
        let lists = client.lists_on_board("b1").await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Sprint 3 - Doing");

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /1/boards/b1/lists?"));
        assert!(request_line.contains("key=key"));
        assert!(request_line.contains("token=secret-token"));
    }

    #[tokio::test]
    async fn test_lists_on_board_server_error_is_status_error() {
        let (client, _server) = serve_once("500 Internal Server Error", "boom").await;
        let err = client.lists_on_board("b1").await.unwrap_err();
        match err {
            BoardError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_label_found() {
        let (client, _server) =
            serve_once("200 OK", r#"{"id": "L1", "name": "Backend", "color": "green"}"#).await;
        let label = client.label("L1").await.unwrap().unwrap();
        assert_eq!(label.display_name(), "Backend");
    }

    #[tokio::test]
    async fn test_label_not_found_is_none() {
        let (client, _server) = serve_once("404 Not Found", "model not found").await;
        assert!(client.label("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_label_server_error_is_status_error() {
        let (client, _server) = serve_once("500 Internal Server Error", "boom").await;
        let err = client.label("L1").await.unwrap_err();
        assert!(matches!(err, BoardError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_label_bad_json_is_decode_error() {
        let (client, _server) = serve_once("200 OK", "<html>not json</html>").await;
        let err = client.label("L1").await.unwrap_err();
        assert!(matches!(err, BoardError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_check_status_ok() {
        let (client, server) = serve_once("200 OK", r#"{"id": "me"}"#).await;
        client.check_status().await.unwrap();
        assert!(server.await.unwrap().starts_with("GET /1/members/me?"));
    }

    #[tokio::test]
    async fn test_check_status_unauthorized() {
        let (client, _server) = serve_once("401 Unauthorized", "invalid token").await;
        let err = client.check_status().await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
