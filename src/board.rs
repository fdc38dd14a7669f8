// src/board.rs
//! Board data model and the remote board API seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named column on a board. Sprint lists are picked by substring match on `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub id_board: String,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    /// Card title, possibly prefixed with `(N)` story points
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id_list: String,
    #[serde(default)]
    pub id_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    /// Trello sends `null` or `""` for colour-only labels
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl Label {
    /// Human-readable name. Colour-only labels fall back to their colour, then to the id.
    pub fn display_name(&self) -> String {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };
        non_blank(&self.name)
            .or_else(|| non_blank(&self.color))
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Points carried by one label, before or after aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPoints {
    pub label_id: String,
    pub points: u64,
}

/// Final output row, keyed by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub label_name: String,
    pub points: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Operations consumed from the remote board service.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// All lists on a board, in board order
    async fn lists_on_board(&self, board_id: &str) -> Result<Vec<List>, BoardError>;

    /// All cards on a list, in list order
    async fn cards_on_list(&self, list_id: &str) -> Result<Vec<Card>, BoardError>;

    /// The full label set defined on a board
    async fn labels_for_board(&self, board_id: &str) -> Result<Vec<Label>, BoardError>;

    /// A single label by id. `Ok(None)` when the service does not know the id.
    async fn label(&self, label_id: &str) -> Result<Option<Label>, BoardError>;
}
