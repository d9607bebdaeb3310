use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use facex::feed::RecentFeed;
use facex::results::ResultsView;
use facex::source::HttpStatsSource;
use facex::{MemorySurface, Overlay, OverlayConfig, ProfilePage, StatsSource, Surface};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facex", version, about = "FACEIT stats for Steam profiles")]
struct Cli {
    /// JSON config file; missing keys use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the lookup endpoint
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the overlay against a profile page and print the final fragment
    Lookup {
        url: String,
        /// Simulate the tab being hidden this many ms after attaching
        #[arg(long)]
        hidden_after: Option<u64>,
        /// Bring the tab back this many ms after hiding it
        #[arg(long, requires = "hidden_after")]
        visible_after: Option<u64>,
    },
    /// Render the results page for a profile
    Results { url: String },
    /// Render the recent searches feed
    Feed {
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Report whether a URL is a profile page the overlay attaches to
    Check { url: String },
}

/// Prints every mounted fragment.
struct StdoutSurface;

impl Surface for StdoutSurface {
    fn mount(&self, html: &str) {
        println!("{}", html);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<OverlayConfig> {
    let mut config = match &cli.config {
        Some(path) => OverlayConfig::from_json_file(path)?,
        None => OverlayConfig::default(),
    };
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn lookup(
    config: &OverlayConfig,
    url: &str,
    hidden_after: Option<u64>,
    visible_after: Option<u64>,
) -> anyhow::Result<()> {
    let source = Arc::new(HttpStatsSource::new(config)?);
    let surface = Arc::new(MemorySurface::new());

    let Some(mut overlay) = Overlay::attach(config, url, true, source, surface.clone()) else {
        bail!("{} is not a Steam profile page", url);
    };

    if let Some(ms) = hidden_after {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        overlay.controller().on_hidden();
    }
    let settlement = overlay.initial_load().await;
    log::info!("initial load settled: {:?}", settlement);

    if let Some(ms) = visible_after {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        if let Some(retry) = overlay.controller().on_visible() {
            let settlement = retry.await.context("retry task failed")?;
            log::info!("retry settled: {:?}", settlement);
        }
    }

    println!("{}", surface.current().unwrap_or_default());
    Ok(())
}

async fn results(config: &OverlayConfig, url: &str) -> anyhow::Result<()> {
    let source = HttpStatsSource::new(config)?;
    let profile = source.fetch_profile(url, CancellationToken::new()).await?;
    let view = ResultsView::build(&profile)?;
    println!("{}", view.render(&config.asset_base_url));
    Ok(())
}

async fn feed(config: &OverlayConfig, watch: bool) -> anyhow::Result<()> {
    let source = Arc::new(HttpStatsSource::new(config)?);
    let feed = RecentFeed::new(config, source, Arc::new(StdoutSurface));

    if !watch {
        feed.refresh().await;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.cancel();
        }
    });
    feed.run(cancel).await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Lookup {
            url,
            hidden_after,
            visible_after,
        } => lookup(&config, url, *hidden_after, *visible_after).await,
        Command::Results { url } => results(&config, url).await,
        Command::Feed { watch } => feed(&config, *watch).await,
        Command::Check { url } => {
            match ProfilePage::detect(url) {
                Some(page) => println!("profile page: {:?}", page.kind),
                None => println!("not a profile page"),
            }
            Ok(())
        }
    }
}
