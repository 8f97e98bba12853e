use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A board as returned by the board source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardList {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    /// Raw timestamp, `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
    pub date: String,
    pub text: String,
}

/// A card with everything the projection needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub closed: bool,
    pub created_date: DateTime<Utc>,
    pub date_last_activity: Option<DateTime<Utc>>,
    pub list_id: String,
    pub member_ids: Vec<String>,
    pub labels: Vec<String>,
    pub comments: Vec<Comment>,
    pub short_url: String,
}

/// Open/closed filter understood by the board source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    Open,
    Closed,
}

impl Filter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::Open => "open",
            Filter::Closed => "closed",
        }
    }
}

/// Derived card status shown on dashboards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CardStatus {
    Open,
    Closed,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Open => "Open",
            CardStatus::Closed => "Closed",
        }
    }
}
