use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use trello_kibana::config;
use trello_kibana::elastic::ElasticClient;
use trello_kibana::kibana::KibanaClient;
use trello_kibana::sync::{self, Indices};
use trello_kibana::trello::TrelloClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Index Trello card metrics into Elasticsearch and move Kibana dashboards"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    info!(path = %args.config.display(), "reading configuration");
    let cfg = config::load(Some(&args.config))?;
    if !cfg.any_action() {
        warn!("no actions enabled in configuration, nothing to do");
        return Ok(());
    }

    if cfg.actions.send_data_to_elastic {
        info!(host = %cfg.elastic.host, "connecting to Elasticsearch");
        let sink = ElasticClient::from_config(&cfg)?;
        let source = TrelloClient::from_config(&cfg)?;
        let report = sync::send_board(
            &cfg.trello.board,
            &Indices::from_config(&cfg),
            &source,
            &sink,
        )
        .await?;
        info!(
            open = report.open.indexed,
            closed = report.closed.indexed,
            "card data sent"
        );
    }

    let bundle = Path::new(&cfg.kibana.bundle_path);

    if cfg.actions.export_kibana_objects {
        info!(url = %cfg.kibana.base_api_url, "exporting objects from Kibana");
        let kibana = KibanaClient::from_config(&cfg)?;
        kibana.export_objects(&cfg.kibana.objects, bundle).await?;
    }

    if cfg.actions.import_kibana_objects {
        info!(url = %cfg.kibana.base_api_url, "importing objects to Kibana");
        let kibana = KibanaClient::from_config(&cfg)?;
        let response = kibana.import_objects(bundle).await?;
        info!("Kibana import response: {}", response);
    }

    Ok(())
}
