use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cabinetkit::driver::replay;
use cabinetkit::{
    init_logging, AppEvent, EditSession, EditorConfig, EventBus, EventCategory, EventFilter,
    HttpCalculationService, InMemoryProjectStore, NotificationLevel, SessionSinks, BUILD_DATE,
    VERSION,
};
use clap::Parser;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(
    name = "cabinetkit",
    about = "Replay cabinet edit events against a calculation service"
)]
struct Cli {
    /// Configuration file (TOML or JSON); defaults to the platform config dir
    #[arg(long, env = "CABINETKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the calculation service base URL
    #[arg(long, env = "CABINETKIT_SERVICE_URL")]
    base_url: Option<String>,

    /// Read events from this file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// How long to wait for outstanding recalculations at end of input
    #[arg(long, default_value_t = 15_000)]
    drain_timeout_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    tracing::info!("cabinetkit {} (built {})", VERSION, BUILD_DATE);

    let config_path = match cli.config {
        Some(path) => path,
        None => EditorConfig::config_path()?,
    };
    let mut config = EditorConfig::load_or_default(&config_path)?;
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
        config.validate()?;
    }

    let service = HttpCalculationService::new(&config.service)
        .context("failed to create calculation client")?;
    tracing::info!("Calculation service at {}", service.url());

    let bus = Arc::new(EventBus::new());
    bus.subscribe(
        EventFilter::Categories(vec![EventCategory::Notification]),
        |event| {
            if let AppEvent::Notification(n) = event {
                match n.level {
                    NotificationLevel::Info => tracing::info!("{}", n.message),
                    _ => tracing::warn!("{}", n.message),
                }
            }
        },
    );

    let mut session = EditSession::new(
        &config,
        Arc::new(service),
        Arc::new(InMemoryProjectStore::new()),
        SessionSinks::bus(bus),
    );

    let drain_timeout = Duration::from_millis(cli.drain_timeout_ms);
    let mut stdout = std::io::stdout().lock();
    let summary = match cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            replay(&mut session, BufReader::new(file), &mut stdout, drain_timeout).await?
        }
        None => {
            replay(
                &mut session,
                BufReader::new(tokio::io::stdin()),
                &mut stdout,
                drain_timeout,
            )
            .await?
        }
    };

    session.shutdown();
    tracing::info!(
        "Replayed {} event(s), {} rejected, {} outcome(s); stats {:?}",
        summary.events,
        summary.rejected_lines,
        summary.outcomes,
        session.stats()
    );
    Ok(())
}
