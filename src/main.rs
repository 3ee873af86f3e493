//! PumpFun migrated-coin monitor
//!
//! Records migrated coins with scored social posts and logs a decision.

use clap::{Parser, Subcommand};
use pumpfun_monitor::{
    client::HttpFetcher,
    config::Config,
    ingester::{MigrationEvent, Pipeline},
    sentiment::{SentimentScorer, VaderScorer},
    storage::{CoinRepository, Database},
    strategy::DecisionEngine,
    types::CoinSummary,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "pumpfun-monitor")]
#[command(about = "Sentiment monitor for newly migrated coins")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one ingestion cycle against the configured feed
    Collect,
    /// Record a migration by hand
    Record {
        /// Coin symbol
        symbol: String,
        #[arg(long)]
        market_cap: Option<f64>,
        #[arg(long)]
        volume: Option<f64>,
        /// Social post text (repeatable)
        #[arg(long = "post")]
        posts: Vec<String>,
    },
    /// Print the sentiment score of a piece of text
    Score {
        text: String,
    },
    /// Show the most recently migrated coins
    Status {
        #[arg(short, long, default_value = "5")]
        limit: i64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Explicitly constructed components
struct App {
    config: Config,
    db: Database,
    pipeline: Pipeline,
}

async fn init(config: Config) -> anyhow::Result<App> {
    let db = Database::connect(&config.database.resolved_url()).await?;
    let scorer: Arc<dyn SentimentScorer> = Arc::new(VaderScorer::new());
    let fetcher = HttpFetcher::from_config(&config.fetch)?;
    let engine = DecisionEngine::new(config.trading.clone());
    let pipeline = Pipeline::new(Arc::new(db.clone()), scorer, fetcher, engine);

    Ok(App {
        config,
        db,
        pipeline,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // No usable default exists, so a bad config aborts here
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Score { text } => {
            println!("{:.4}", VaderScorer::new().score(&text));
            Ok(())
        }
        Commands::Collect => collect(init(config).await?).await,
        Commands::Record {
            symbol,
            market_cap,
            volume,
            posts,
        } => {
            let mut event = MigrationEvent::new(symbol);
            event.market_cap = market_cap;
            event.volume = volume;
            for post in posts {
                event = event.with_post(post);
            }
            record(init(config).await?, event).await
        }
        Commands::Status { limit, json } => status(init(config).await?, limit, json).await,
    }
}

async fn collect(app: App) -> anyhow::Result<()> {
    let feed = app
        .config
        .feed
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No feed section in the configuration"))?;

    let report = app.pipeline.run_cycle(feed).await;
    if !report.fetched {
        println!("No data this cycle");
    }
    for (symbol, decision) in &report.decisions {
        println!("{}: {}", decision, symbol);
    }
    if report.failed > 0 {
        println!("{} events failed, see log", report.failed);
    }

    app.db.close().await;
    Ok(())
}

async fn record(app: App, event: MigrationEvent) -> anyhow::Result<()> {
    let processed = app.pipeline.process(event).await?;
    println!(
        "{}: {} (id {}, {} posts)",
        processed.decision,
        processed.coin.summary(),
        processed.coin.id,
        processed.posts.len()
    );

    app.db.close().await;
    Ok(())
}

async fn status(app: App, limit: i64, json: bool) -> anyhow::Result<()> {
    let coins = app.db.recent_coins(limit).await?;
    let summaries: Vec<CoinSummary> = coins.iter().map(|c| c.summary()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else if summaries.is_empty() {
        println!("No migrated coins recorded yet");
    } else {
        println!("Recent Coins:");
        for summary in &summaries {
            println!("{}", summary);
        }
    }

    app.db.close().await;
    Ok(())
}
