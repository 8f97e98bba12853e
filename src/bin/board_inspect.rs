use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use trello_kibana::config::Config;
use trello_kibana::model::Filter;
use trello_kibana::trello::{BoardSource, TrelloClient};

/// Print a board's members and lists, useful when filling in config.yaml.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Board ID to inspect (defaults to trello.board from config)
    #[arg(long)]
    board: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.config)?;
    let mut cfg: Config = serde_yaml::from_str(&raw)?;
    let _ = dotenvy::dotenv();
    cfg.apply_env_fallbacks();
    let client = TrelloClient::from_config(&cfg)?;
    let board_id = args.board.unwrap_or_else(|| cfg.trello.board.clone());

    let board = client.board(&board_id).await?;
    println!("Board: {} ({})", board.name, board.id);
    println!("Members:");
    for member in client.members(&board_id).await? {
        println!("  {} -> {}", member.id, member.username);
    }
    for filter in [Filter::Open, Filter::Closed] {
        println!("Lists ({}):", filter.as_str());
        for list in client.lists(&board_id, filter).await? {
            println!("  {} -> {}", list.id, list.name);
        }
    }
    Ok(())
}
