pub mod discover;
pub mod power;
pub mod refresh;

use std::path::PathBuf;
use std::time::Duration;

use bmcfleet_common::config::{DEFAULT_BMC_PORT, DEFAULT_MAX_WORKERS};
use bmcfleet_common::fleet::MemberId;
use bmcfleet_common::power::PowerAction;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bmcfleet")]
#[command(about = "Discover and watch a fleet of baseboard management controllers.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output (-q drops decorations, -qq prints summaries only)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find controllers in an address range
    #[command(alias = "d")]
    Discover(DiscoverArgs),
    /// Refresh power state or telemetry of the inventoried fleet
    #[command(alias = "r")]
    Refresh(RefreshArgs),
    /// Send a power action to inventoried members
    #[command(alias = "p")]
    Power(PowerArgs),
}

#[derive(Args)]
pub struct DiscoverArgs {
    /// Single address, start-end range, CIDR block, or comma separated addresses
    pub spec: String,

    #[arg(short, long, default_value_t = DEFAULT_BMC_PORT)]
    pub port: u16,

    /// Per-step probe timeout in seconds
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Probes in flight at once (capped at 100)
    #[arg(short, long, default_value_t = DEFAULT_MAX_WORKERS)]
    pub workers: usize,

    /// JSON file of ranked credentials
    #[arg(short, long)]
    pub credentials: PathBuf,

    /// JSON fixture of simulated controllers
    #[arg(short, long)]
    pub lab: PathBuf,

    /// JSON inventory to cross-reference against
    #[arg(short, long)]
    pub inventory: Option<PathBuf>,
}

impl DiscoverArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RefreshKind {
    Power,
    Telemetry,
}

#[derive(Args)]
pub struct RefreshArgs {
    pub kind: RefreshKind,

    #[arg(short, long)]
    pub inventory: PathBuf,

    #[arg(short, long)]
    pub lab: PathBuf,

    /// Run this many passes and exit. Without it, refresh on a schedule until Ctrl-C
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub passes: Option<u32>,

    /// Seconds between passes (defaults to 60 for power, 300 for telemetry)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,
}

#[derive(Args)]
pub struct PowerArgs {
    /// on, off, graceful-shutdown, reset or cycle
    #[arg(value_parser = parse_action)]
    pub action: PowerAction,

    /// Member ids to act on
    #[arg(value_parser = parse_member, required_unless_present = "all")]
    pub members: Vec<MemberId>,

    /// Act on every inventoried member
    #[arg(long, conflicts_with = "members")]
    pub all: bool,

    #[arg(short, long)]
    pub inventory: PathBuf,

    #[arg(short, long)]
    pub lab: PathBuf,
}

fn parse_action(raw: &str) -> Result<PowerAction, String> {
    raw.parse()
}

fn parse_member(raw: &str) -> Result<MemberId, String> {
    raw.trim_start_matches('#')
        .parse::<u64>()
        .map(MemberId)
        .map_err(|_| format!("'{raw}' is not a member id"))
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
