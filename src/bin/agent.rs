use anyhow::Context;
use clap::{Parser, Subcommand};
use compose_mongodb_plugin::{
    MongodbComposePlugin,
    actors::collector::CollectorHandle,
    compose::ComposeClient,
    config::{PluginConfig, RawConfig, read_config_file},
    util::{get_config_path, get_interval},
};
use tokio::sync::broadcast;
use tracing::{debug, error, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (defaults to $PLUGIN_CONFIG or ./config.json)
    #[arg(short)]
    file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the plugin once and print the result
    Once,

    /// Run the plugin periodically until interrupted
    Watch {
        /// Seconds between runs (defaults to $PLUGIN_INTERVAL or 60)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// List the databases of the Compose deployment
    Databases,

    /// Print the Compose stats of one database
    DbStats { name: String },
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("compose_mongodb_plugin", LevelFilter::DEBUG),
        ("compose_agent", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let path = args.file.unwrap_or_else(get_config_path);
    let raw = read_config_file(&path).with_context(|| format!("failed to read {path}"))?;

    match args.command {
        Command::Once => {
            let outcome = MongodbComposePlugin::with_mongodb(raw).run().await;
            println!("{}", serde_json::to_string(&outcome)?);
        }
        Command::Watch { interval } => watch(raw, interval.unwrap_or_else(get_interval)).await?,
        Command::Databases => {
            let client = compose_client(&raw)?;
            for name in client.list_databases().await? {
                println!("{name}");
            }
        }
        Command::DbStats { name } => {
            let client = compose_client(&raw)?;
            let stats = client.db_stats(&name).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn compose_client(raw: &RawConfig) -> anyhow::Result<ComposeClient> {
    let config = PluginConfig::from_raw(raw)?
        .ok_or_else(|| anyhow::anyhow!("mongodb_plugin: config not set"))?;
    Ok(ComposeClient::new(&config)?)
}

async fn watch(raw: RawConfig, interval: u64) -> anyhow::Result<()> {
    debug!("running plugin every {interval}s");

    let (event_tx, mut event_rx) = broadcast::channel(16);
    let handle = CollectorHandle::spawn(
        "mongodb",
        MongodbComposePlugin::with_mongodb(raw),
        interval,
        event_tx,
    );

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Ok(event) => println!("{}", serde_json::to_string(&event.outcome)?),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    error!("output lagged behind, skipped {skipped} results");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, shutting down");
                handle.shutdown().await?;
                break;
            }
        }
    }

    Ok(())
}
