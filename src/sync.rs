//! The send-data phase: board → lookup tables → projected batches → index.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::config::Config;
use crate::elastic::{BulkSummary, IndexSink};
use crate::lookup::BoardLookup;
use crate::model::{Card, Filter};
use crate::pipeline::{project_cards, split_by_partition, Partition};
use crate::trello::BoardSource;

/// Destination index per partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indices {
    pub open: String,
    pub closed: String,
}

impl Indices {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            open: cfg.elastic.open_cards_index.clone(),
            closed: cfg.elastic.closed_cards_index.clone(),
        }
    }

    pub fn for_partition(&self, partition: Partition) -> &str {
        match partition {
            Partition::Open => &self.open,
            Partition::Closed => &self.closed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub open: BulkSummary,
    pub closed: BulkSummary,
}

pub async fn send_board(
    board_id: &str,
    indices: &Indices,
    source: &dyn BoardSource,
    sink: &dyn IndexSink,
) -> Result<SyncReport> {
    send_board_with_clock(board_id, indices, source, sink, Utc::now).await
}

/// Same as [`send_board`] with an injectable clock. The clock is read once
/// per batch.
#[instrument(skip_all, fields(board_id = %board_id))]
pub async fn send_board_with_clock(
    board_id: &str,
    indices: &Indices,
    source: &dyn BoardSource,
    sink: &dyn IndexSink,
    clock: fn() -> DateTime<Utc>,
) -> Result<SyncReport> {
    info!("Grabbing Trello board {}", board_id);
    let board = source.board(board_id).await.context("failed to fetch board")?;

    info!("Grabbing all members on board {}", board.name);
    let members = source
        .members(board_id)
        .await
        .context("failed to fetch board members")?;

    info!("Grabbing all lists on board {}", board.name);
    let open_lists = source
        .lists(board_id, Filter::Open)
        .await
        .context("failed to fetch open lists")?;
    let closed_lists = source
        .lists(board_id, Filter::Closed)
        .await
        .context("failed to fetch closed lists")?;
    let lookup = BoardLookup::build(&members, &open_lists, &closed_lists);
    info!(
        members = lookup.member_count(),
        lists = lookup.list_count(),
        closed_lists = lookup.closed_list_count(),
        "built lookup tables"
    );

    let mut cards: Vec<Card> = source
        .cards(board_id, Filter::Open)
        .await
        .context("failed to fetch open cards")?;
    cards.extend(
        source
            .cards(board_id, Filter::Closed)
            .await
            .context("failed to fetch closed cards")?,
    );
    let (open_cards, closed_cards) = split_by_partition(cards);
    info!(
        open = open_cards.len(),
        closed = closed_cards.len(),
        "fetched cards"
    );

    let mut report = SyncReport::default();
    for (partition, batch) in [
        (Partition::Closed, &closed_cards),
        (Partition::Open, &open_cards),
    ] {
        let index = indices.for_partition(partition);
        info!(
            "Sending {} card data to Elasticsearch index {}",
            partition.as_str(),
            index
        );
        let mut actions = project_cards(batch, &lookup, index, clock());
        let summary = sink.bulk(&mut actions).await.with_context(|| {
            format!(
                "failed to index {} cards into {}",
                partition.as_str(),
                index
            )
        })?;
        match partition {
            Partition::Open => report.open = summary,
            Partition::Closed => report.closed = summary,
        }
    }
    Ok(report)
}
