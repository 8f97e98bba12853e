use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::model::{Board, BoardList, Card, Comment, Member};

#[derive(Deserialize, Debug)]
pub struct BoardResp {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct MemberResp {
    pub id: String,
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct ListResp {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct LabelResp {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ActionData {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize, Debug)]
pub struct ActionResp {
    pub date: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub data: ActionData,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CardResp {
    pub id: String,
    pub name: String,
    pub closed: bool,
    pub id_list: String,
    #[serde(default)]
    pub id_members: Vec<String>,
    #[serde(default)]
    pub labels: Vec<LabelResp>,
    pub date_last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub short_url: String,
    #[serde(default)]
    pub actions: Vec<ActionResp>,
}

/// Trello object ids start with the creation time as 8 hex digits of Unix
/// seconds.
pub fn created_from_id(id: &str) -> Result<DateTime<Utc>> {
    let prefix = id
        .get(..8)
        .ok_or_else(|| anyhow!("trello id {:?} is too short", id))?;
    let secs = i64::from_str_radix(prefix, 16)
        .map_err(|_| anyhow!("trello id {:?} has no timestamp prefix", id))?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| anyhow!("trello id {:?} has an out-of-range timestamp", id))
}

impl From<BoardResp> for Board {
    fn from(resp: BoardResp) -> Self {
        Board {
            id: resp.id,
            name: resp.name,
        }
    }
}

impl From<MemberResp> for Member {
    fn from(resp: MemberResp) -> Self {
        Member {
            id: resp.id,
            username: resp.username,
        }
    }
}

impl From<ListResp> for BoardList {
    fn from(resp: ListResp) -> Self {
        BoardList {
            id: resp.id,
            name: resp.name,
        }
    }
}

impl TryFrom<CardResp> for Card {
    type Error = anyhow::Error;

    fn try_from(resp: CardResp) -> Result<Self> {
        let created_date = created_from_id(&resp.id)?;
        let mut comments: Vec<Comment> = resp
            .actions
            .into_iter()
            .filter(|a| a.typ.is_empty() || a.typ == "commentCard")
            .map(|a| Comment {
                date: a.date,
                text: a.data.text,
            })
            .collect();
        // Trello lists actions newest first; cards carry them oldest first.
        comments.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(Card {
            id: resp.id,
            name: resp.name,
            closed: resp.closed,
            created_date,
            date_last_activity: resp.date_last_activity,
            list_id: resp.id_list,
            member_ids: resp.id_members,
            labels: resp.labels.into_iter().map(|l| l.name).collect(),
            comments,
            short_url: resp.short_url,
        })
    }
}
