use anyhow::{Context, Result};
use clap::Parser;
use fleet_carrier_cargo::core::ingest;
use fleet_carrier_cargo::domain::ports::CarrierSource;
use fleet_carrier_cargo::utils::error::ErrorCategory;
use fleet_carrier_cargo::utils::{logger, validation::Validate};
use fleet_carrier_cargo::{
    CargoArbiter, CargoConfig, CargoError, CargoMonitor, CliConfig, FileCarrierSource,
    HttpCarrierSource, JournalOutcome,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => CargoConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CargoConfig::default(),
    };

    // 初始化日誌
    logger::init_logger(cli.verbose || config.verbose(), cli.json_logs || config.json_logs());

    tracing::info!("Starting fleet-carrier-cargo replay");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("Configuration error: {}", e);
        std::process::exit(exit_code(&e));
    }

    let arbiter = CargoArbiter::shared();
    let reader = Arc::clone(&arbiter);
    arbiter.add_on_cargo_change_handler(move || {
        reader.read(|call_sign, tally| {
            tracing::info!(
                call_sign = call_sign.unwrap_or("<unknown>"),
                commodities = tally.len(),
                units = tally.total(),
                "Cargo changed"
            );
        });
    });

    let http_source = if cli.fetch {
        Some(HttpCarrierSource::from_config(&config.source)?)
    } else {
        None
    };

    if let Err(e) = run(&cli, &config, &arbiter, http_source.as_ref()).await {
        tracing::error!("Replay failed: {} (Category: {:?})", e, e.category());
        eprintln!("{}", e);
        std::process::exit(exit_code(&e));
    }

    let snapshot = arbiter.snapshot();
    println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);

    Ok(())
}

async fn run(
    cli: &CliConfig,
    config: &CargoConfig,
    arbiter: &Arc<CargoArbiter>,
    http_source: Option<&HttpCarrierSource>,
) -> fleet_carrier_cargo::Result<()> {
    if let Some(path) = &cli.payload {
        let source = FileCarrierSource::new(path);
        ingest::ingest_from(arbiter, &source).await?;
    } else if let Some(source) = http_source {
        ingest::ingest_from(arbiter, source).await?;
    }

    let Some(journal_path) = &cli.journal else {
        return Ok(());
    };

    let monitor = CargoMonitor::new(Arc::clone(arbiter), config.monitor.settings());
    let content = tokio::fs::read_to_string(journal_path).await?;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: serde_json::Value = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(line = line_no + 1, "Skipping unreadable journal line: {}", e);
                continue;
            }
        };

        match monitor.process(&cli.commander, None, &entry) {
            Ok(JournalOutcome::RefreshRequested) => match http_source {
                Some(source) => {
                    if let Err(e) = refresh(arbiter, source).await {
                        tracing::warn!("Carrier refresh failed: {}", e);
                    }
                }
                None => tracing::info!(line = line_no + 1, "Carrier refresh requested"),
            },
            Ok(outcome) => tracing::debug!(line = line_no + 1, ?outcome, "Journal entry processed"),
            Err(e) => tracing::warn!(line = line_no + 1, "Skipping journal entry: {}", e),
        }
    }

    Ok(())
}

async fn refresh(arbiter: &CargoArbiter, source: &dyn CarrierSource) -> fleet_carrier_cargo::Result<()> {
    let report = ingest::ingest_from(arbiter, source).await?;
    tracing::debug!(?report, "Carrier refreshed");
    Ok(())
}

fn exit_code(error: &CargoError) -> i32 {
    match error.category() {
        ErrorCategory::Payload => 2,
        ErrorCategory::Source => 3,
        ErrorCategory::Config => 1,
    }
}
