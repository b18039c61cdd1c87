use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "fleet-carrier-cargo")]
#[command(about = "Replays fleet carrier payloads and journal events into the shared cargo inventory")]
pub struct CliConfig {
    #[arg(long, help = "Path to the TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Saved /fleetcarrier JSON payload to ingest")]
    pub payload: Option<PathBuf>,

    #[arg(long, help = "Fetch the payload from [source].endpoint")]
    pub fetch: bool,

    #[arg(long, help = "Journal file (one JSON event per line) to replay")]
    pub journal: Option<PathBuf>,

    #[arg(long, default_value = "CMDR")]
    pub commander: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON")]
    pub json_logs: bool,
}
