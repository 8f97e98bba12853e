use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::derive;
use crate::error::ProjectionError;
use crate::lookup::BoardLookup;
use crate::model::{Card, CardStatus};

/// Flat document indexed for one card. `id` is the document id and is not
/// part of the body.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    pub name: String,
    pub list: String,
    pub closed: bool,
    pub labels: Vec<String>,
    #[serde(rename = "created_date")]
    pub created_date: String,
    #[serde(rename = "date_last_activity")]
    pub date_last_activity: Option<String>,
    pub members: Vec<String>,
    pub short_url: String,
    pub last_activity_seconds: Option<f64>,
    pub age: f64,
    pub time_active_seconds: Option<f64>,
    pub status: CardStatus,
    pub num_comments: usize,
    pub time_to_first_comment: Option<f64>,
    pub time_since_last_comment: Option<f64>,
    pub last_comment: Option<String>,
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Project one card against a fixed reference instant.
pub fn project_card(
    card: &Card,
    now: DateTime<Utc>,
    lookup: &BoardLookup,
) -> Result<CardRecord, ProjectionError> {
    let comments = derive::comment_times(card, now)?;

    Ok(CardRecord {
        id: card.id.clone(),
        timestamp: iso(derive::timestamp(card)),
        name: card.name.clone(),
        list: derive::list_name(card, lookup)?,
        closed: card.closed,
        labels: card.labels.clone(),
        created_date: iso(card.created_date),
        date_last_activity: card.date_last_activity.map(iso),
        members: derive::member_names(card, lookup)?,
        short_url: card.short_url.clone(),
        last_activity_seconds: derive::last_activity_seconds(card, now),
        age: derive::age(card, now),
        time_active_seconds: derive::time_active_seconds(card),
        status: derive::status(card, lookup),
        num_comments: card.comments.len(),
        time_to_first_comment: comments.to_first,
        time_since_last_comment: comments.since_last,
        last_comment: derive::last_comment(card).map(str::to_string),
    })
}
