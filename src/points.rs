// src/points.rs
//! Story point aggregation: pick sprint lists, read points off card titles,
//! total them per label and resolve label names.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;

use crate::board::{BoardApi, Card, Label, LabelPoints, List, ResultRow};
use crate::config::LabelLookup;

/// Upper bound on label requests in flight at once for per-label lookup.
pub const LABEL_LOOKUP_CONCURRENCY: usize = 8;

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintReport {
    pub sprint: String,
    pub board_id: String,
    /// Names of the lists that matched the sprint token, in board order
    pub lists: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub generated_at: DateTime<Utc>,
}

/// Lists whose name contains `token` (case-sensitive), in board order.
pub fn select_sprint_lists(lists: Vec<List>, token: &str) -> Vec<List> {
    lists
        .into_iter()
        .filter(|list| list.name.contains(token))
        .collect()
}

pub async fn fetch_sprint_lists<A: BoardApi + ?Sized>(
    api: &A,
    board_id: &str,
    token: &str,
) -> Result<Vec<List>> {
    let all_lists = api
        .lists_on_board(board_id)
        .await
        .with_context(|| format!("Failed to fetch lists on board {}", board_id))?;
    debug!("Board {} has {} lists", board_id, all_lists.len());
    Ok(select_sprint_lists(all_lists, token))
}

/// Fetches cards of every list concurrently. Output keeps list order, then card order.
pub async fn fetch_cards<A: BoardApi + ?Sized>(api: &A, lists: &[List]) -> Result<Vec<Card>> {
    let fetches = lists.iter().map(|list| async move {
        api.cards_on_list(&list.id)
            .await
            .with_context(|| format!("Failed to fetch cards on list '{}'", list.name))
    });
    let per_list = try_join_all(fetches).await?;
    Ok(per_list.into_iter().flatten().collect())
}

/// Points encoded as a leading `(N)` in a card title. Anything else is worth 0.
pub fn extract_points(title: &str) -> u64 {
    let Some(rest) = title.strip_prefix('(') else {
        return 0;
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if rest.as_bytes().get(digits_len) != Some(&b')') {
        return 0;
    }
    let digits = &rest[..digits_len];
    if digits.is_empty() {
        return 0;
    }
    match digits.parse::<u64>() {
        Ok(points) => points,
        Err(e) => {
            warn!("Ignoring point prefix '({})' in '{}': {}", digits, title, e);
            0
        }
    }
}

pub fn card_points(card: Option<&Card>) -> u64 {
    card.map_or(0, |card| extract_points(&card.name))
}

/// One entry per label per card; every label gets the card's full points.
pub fn expand_labels(cards: &[Card]) -> Vec<LabelPoints> {
    cards
        .iter()
        .flat_map(|card| {
            let points = card_points(Some(card));
            card.id_labels.iter().map(move |label_id| LabelPoints {
                label_id: label_id.clone(),
                points,
            })
        })
        .collect()
}

/// Sums points per label id. Ids come out unique, in first-seen order.
pub fn aggregate(entries: Vec<LabelPoints>) -> Vec<LabelPoints> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut totals: Vec<LabelPoints> = Vec::new();
    for entry in entries {
        match index.get(&entry.label_id).copied() {
            Some(i) => totals[i].points = totals[i].points.saturating_add(entry.points),
            None => {
                index.insert(entry.label_id.clone(), totals.len());
                totals.push(entry);
            }
        }
    }
    totals
}

pub fn placeholder_name(label_id: &str) -> String {
    format!("Label not found: {}", label_id)
}

fn to_row(entry: LabelPoints, label: Option<&Label>) -> ResultRow {
    match label {
        Some(label) => ResultRow {
            label_name: label.display_name(),
            points: entry.points,
        },
        None => {
            warn!("Label {} is not defined on the board", entry.label_id);
            ResultRow {
                label_name: placeholder_name(&entry.label_id),
                points: entry.points,
            }
        }
    }
}

/// Maps label ids to display names. Unknown ids get a placeholder row, remote failures abort.
pub async fn resolve_labels<A: BoardApi + ?Sized>(
    api: &A,
    board_id: &str,
    entries: Vec<LabelPoints>,
    lookup: LabelLookup,
) -> Result<Vec<ResultRow>> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    match lookup {
        LabelLookup::Board => {
            let labels = api
                .labels_for_board(board_id)
                .await
                .with_context(|| format!("Failed to fetch labels on board {}", board_id))?;
            let by_id: HashMap<&str, &Label> =
                labels.iter().map(|label| (label.id.as_str(), label)).collect();
            Ok(entries
                .into_iter()
                .map(|entry| {
                    let label = by_id.get(entry.label_id.as_str()).copied();
                    to_row(entry, label)
                })
                .collect())
        }
        LabelLookup::PerLabel => {
            let labels: Vec<Option<Label>> = stream::iter(entries.iter())
                .map(|entry| async move {
                    api.label(&entry.label_id)
                        .await
                        .with_context(|| format!("Failed to fetch label {}", entry.label_id))
                })
                .buffered(LABEL_LOOKUP_CONCURRENCY)
                .try_collect()
                .await?;
            Ok(entries
                .into_iter()
                .zip(labels)
                .map(|(entry, label)| to_row(entry, label.as_ref()))
                .collect())
        }
    }
}

/// Ascending by points; equal totals are ordered by name.
pub fn sort_rows(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| {
        a.points
            .cmp(&b.points)
            .then_with(|| a.label_name.cmp(&b.label_name))
    });
}

pub async fn run_pipeline<A: BoardApi + ?Sized>(
    api: &A,
    board_id: &str,
    sprint: &str,
    lookup: LabelLookup,
) -> Result<SprintReport> {
    info!("Aggregating points for sprint '{}' on board {}", sprint, board_id);
    let lists = fetch_sprint_lists(api, board_id, sprint).await?;
    let mut report = SprintReport {
        sprint: sprint.to_string(),
        board_id: board_id.to_string(),
        lists: lists.iter().map(|list| list.name.clone()).collect(),
        rows: Vec::new(),
        generated_at: Utc::now(),
    };

    if lists.is_empty() {
        info!("No lists match sprint '{}'", sprint);
        return Ok(report);
    }

    let cards = fetch_cards(api, &lists).await?;
    info!("Fetched {} cards from {} lists", cards.len(), lists.len());

    let totals = aggregate(expand_labels(&cards));
    debug!("{} distinct labels after aggregation", totals.len());

    let mut rows = resolve_labels(api, board_id, totals, lookup).await?;
    sort_rows(&mut rows);
    report.rows = rows;
    Ok(report)
}
