//! Lazy projection of card batches into bulk index actions.
use chrono::{DateTime, Utc};

use crate::error::ProjectionError;
use crate::lookup::BoardLookup;
use crate::model::Card;
use crate::projector::{project_card, CardRecord};

/// Destination partition of a card, decided by its own closed flag only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Open,
    Closed,
}

impl Partition {
    pub fn of(card: &Card) -> Self {
        if card.closed {
            Partition::Closed
        } else {
            Partition::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Open => "open",
            Partition::Closed => "closed",
        }
    }
}

/// Split a mixed collection into (open, closed), keeping input order.
pub fn split_by_partition(cards: Vec<Card>) -> (Vec<Card>, Vec<Card>) {
    cards
        .into_iter()
        .partition(|card| Partition::of(card) == Partition::Open)
}

/// One document bound for a named index.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAction {
    pub index: String,
    pub record: CardRecord,
}

impl BulkAction {
    pub fn id(&self) -> &str {
        &self.record.id
    }
}

/// Single-pass iterator over projected cards. Every record in the batch is
/// measured against the same `now`.
pub struct ProjectedCards<'a> {
    cards: std::slice::Iter<'a, Card>,
    lookup: &'a BoardLookup,
    index: &'a str,
    now: DateTime<Utc>,
}

impl<'a> Iterator for ProjectedCards<'a> {
    type Item = Result<BulkAction, ProjectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let card = self.cards.next()?;
        Some(project_card(card, self.now, self.lookup).map(|record| BulkAction {
            index: self.index.to_string(),
            record,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cards.size_hint()
    }
}

pub fn project_cards<'a>(
    cards: &'a [Card],
    lookup: &'a BoardLookup,
    index: &'a str,
    now: DateTime<Utc>,
) -> ProjectedCards<'a> {
    ProjectedCards {
        cards: cards.iter(),
        lookup,
        index,
        now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoardList;
    use chrono::TimeZone;

    fn card(id: &str, closed: bool, list_id: &str) -> Card {
        Card {
            id: id.into(),
            name: id.into(),
            closed,
            created_date: Utc.timestamp_opt(0, 0).unwrap(),
            date_last_activity: None,
            list_id: list_id.into(),
            member_ids: vec![],
            labels: vec![],
            comments: vec![],
            short_url: String::new(),
        }
    }

    #[test]
    fn split_keeps_order_and_routes_by_flag() {
        let (open, closed) = split_by_partition(vec![
            card("a", false, "L1"),
            card("b", true, "L1"),
            card("c", false, "L2"),
        ]);
        let ids = |v: &[Card]| v.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&open), vec!["a", "c"]);
        assert_eq!(ids(&closed), vec!["b"]);
    }

    #[test]
    fn projection_is_lazy_and_stops_at_first_error() {
        let lookup = BoardLookup::build(
            &[],
            &[BoardList {
                id: "L1".into(),
                name: "Backlog".into(),
            }],
            &[],
        );
        let cards = vec![
            card("a", false, "L1"),
            card("b", false, "nope"),
            card("c", false, "L1"),
        ];
        let now = Utc.timestamp_opt(10, 0).unwrap();
        let mut iter = project_cards(&cards, &lookup, "open-idx", now);

        assert_eq!(iter.size_hint(), (3, Some(3)));
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.id(), "a");
        assert_eq!(first.index, "open-idx");
        assert!(iter.next().unwrap().is_err());

        let collected: Result<Vec<_>, _> =
            project_cards(&cards, &lookup, "open-idx", now).collect();
        assert!(matches!(collected, Err(ProjectionError::UnknownList { .. })));
    }
}
