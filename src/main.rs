use anyhow::Context;
use clap::{Parser, Subcommand};
use rss_reader::{reading, FeedReader, FetchConfig, PgStore, AVERAGE_WPM};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "rss-reader", about = "Feed reader ingestion core")]
struct Cli {
    /// PostgreSQL connection string (not needed for `quote`)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll all stored feeds for new articles
    Poll,
    /// Validate and store a feed by URL
    AddFeed { url: String },
    /// Discover and store the feeds of a website
    Discover { url: String },
    /// Fetch a quote for measuring reading speed
    Quote {
        /// Minimum quote length in characters
        #[arg(long, default_value_t = 250)]
        min_length: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Command::Quote { min_length } = &cli.command {
        let client = reqwest::Client::new();
        let quote = reading::fetch_quote(&client, *min_length).await?;
        let words = quote.content.split_whitespace().count() as u32;
        println!("\"{}\"\n  -- {}", quote.content, quote.author);
        println!(
            "{} characters, about {} at {} wpm",
            quote.length,
            reading::format_time_to_read(Some(words), AVERAGE_WPM),
            AVERAGE_WPM
        );
        return Ok(());
    }

    let database_url = cli
        .database_url
        .context("DATABASE_URL is required for this command")?;
    let store = Arc::new(
        PgStore::new(&database_url)
            .await
            .context("Failed to connect to database")?,
    );
    store.init_schema().await?;

    let reader = FeedReader::new(FetchConfig::default(), store.clone(), store);

    match cli.command {
        Command::Poll => {
            let count = reader.poll_all().await?;
            info!("Ingested {} new articles", count);
        }
        Command::AddFeed { url } => match reader.add_feed(&url).await? {
            Some(feed) => info!("Added feed: {} ({})", feed.title, feed.url),
            None => anyhow::bail!("Feed document at {} is malformed", url),
        },
        Command::Discover { url } => {
            let feeds = reader.discover_and_add(&url).await?;
            if feeds.is_empty() {
                info!("No feeds found for {}", url);
            }
            for feed in feeds {
                info!("Added feed: {} ({})", feed.title, feed.url);
            }
        }
        // Handled before the database connection above.
        Command::Quote { .. } => unreachable!(),
    }

    Ok(())
}
