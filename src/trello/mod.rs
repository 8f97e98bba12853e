use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

use crate::config::Config;
use crate::model::{Board, BoardList, Card, Filter, Member};
use crate::trello::model::{BoardResp, CardResp, ListResp, MemberResp};

pub mod model;

const TRELLO_API_BASE: &str = "https://api.trello.com/";
const CARD_FIELDS: &str = "name,closed,idList,idMembers,labels,dateLastActivity,shortUrl";

/// Read-only view of a board.
#[async_trait]
pub trait BoardSource: Send + Sync {
    async fn board(&self, board_id: &str) -> Result<Board>;

    async fn members(&self, board_id: &str) -> Result<Vec<Member>>;

    async fn lists(&self, board_id: &str, filter: Filter) -> Result<Vec<BoardList>>;

    async fn cards(&self, board_id: &str, filter: Filter) -> Result<Vec<Card>>;
}

#[derive(Clone)]
pub struct TrelloClient {
    http: Client,
    base_url: Url,
    key: String,
    token: String,
}

impl fmt::Debug for TrelloClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrelloClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TrelloClient {
    pub fn new(key: String, token: String) -> Result<Self> {
        let base_url = Url::parse(TRELLO_API_BASE).context("invalid default Trello URL")?;
        Self::with_base_url(key, token, base_url)
    }

    pub fn with_base_url(key: String, token: String, base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("trello-kibana/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            key,
            token,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.trello.api_key.clone(), cfg.trello.token.clone())
    }

    pub fn build_request(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(path)
            .context("invalid Trello base URL")?;
        self.http
            .get(endpoint)
            .query(&[("key", self.key.as_str()), ("token", self.token.as_str())])
            .query(query)
            .build()
            .context("failed to build Trello request")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let request = self.build_request(path, query)?;
        debug!(path, "trello request");
        let res = self
            .http
            .execute(request)
            .await
            .with_context(|| format!("failed to reach Trello for {}", path))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("trello error {} on {}: {}", status, path, body));
        }
        res.json::<T>()
            .await
            .with_context(|| format!("invalid Trello response for {}", path))
    }
}

#[async_trait]
impl BoardSource for TrelloClient {
    async fn board(&self, board_id: &str) -> Result<Board> {
        let resp: BoardResp = self
            .get_json(&format!("1/boards/{}", board_id), &[("fields", "name")])
            .await?;
        Ok(resp.into())
    }

    async fn members(&self, board_id: &str) -> Result<Vec<Member>> {
        let resp: Vec<MemberResp> = self
            .get_json(&format!("1/boards/{}/members", board_id), &[])
            .await?;
        Ok(resp.into_iter().map(Member::from).collect())
    }

    async fn lists(&self, board_id: &str, filter: Filter) -> Result<Vec<BoardList>> {
        let resp: Vec<ListResp> = self
            .get_json(
                &format!("1/boards/{}/lists/{}", board_id, filter.as_str()),
                &[("fields", "name")],
            )
            .await?;
        Ok(resp.into_iter().map(BoardList::from).collect())
    }

    async fn cards(&self, board_id: &str, filter: Filter) -> Result<Vec<Card>> {
        let resp: Vec<CardResp> = self
            .get_json(
                &format!("1/boards/{}/cards/{}", board_id, filter.as_str()),
                &[("fields", CARD_FIELDS), ("actions", "commentCard")],
            )
            .await?;
        resp.into_iter().map(Card::try_from).collect()
    }
}
