use std::time::Duration;

/// HTTPS, where Redfish-style controllers listen.
pub const DEFAULT_BMC_PORT: u16 = 443;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_WORKERS: usize = 50;
/// Ceiling on discovery width regardless of what the caller asks for.
pub const DISCOVERY_HARD_CAP: usize = 100;
pub const DEFAULT_REFRESH_CONCURRENCY: usize = 20;
pub const DEFAULT_SAFETY_MARGIN: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub port: u16,
    /// Bound on each reachability check and each identity probe.
    pub timeout: Duration,
    pub max_workers: usize,
    pub hard_cap: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_BMC_PORT,
            timeout: DEFAULT_PROBE_TIMEOUT,
            max_workers: DEFAULT_MAX_WORKERS,
            hard_cap: DISCOVERY_HARD_CAP,
        }
    }
}

impl DiscoveryConfig {
    /// Width of the concurrency gate actually used.
    pub fn effective_workers(&self) -> usize {
        self.max_workers.min(self.hard_cap).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Period between scheduled passes.
    pub interval: Duration,
    pub per_member_timeout: Duration,
    pub concurrency: usize,
    /// Extra waves of `per_member_timeout` added to the pass deadline.
    pub safety_margin: u32,
}

impl RefreshConfig {
    pub fn power() -> Self {
        Self {
            interval: Duration::from_secs(60),
            per_member_timeout: Duration::from_secs(10),
            concurrency: DEFAULT_REFRESH_CONCURRENCY,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }

    pub fn telemetry() -> Self {
        Self {
            interval: Duration::from_secs(300),
            per_member_timeout: Duration::from_secs(15),
            concurrency: DEFAULT_REFRESH_CONCURRENCY,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }
}

pub struct Config {
    pub discovery: DiscoveryConfig,
    pub power: RefreshConfig,
    pub telemetry: RefreshConfig,
    pub no_banner: bool,
    /// 0 prints everything, 1 drops decorations, 2 prints summaries only.
    pub quiet: u8,
    /// Print reports as JSON instead of trees.
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            power: RefreshConfig::power(),
            telemetry: RefreshConfig::telemetry(),
            no_banner: false,
            quiet: 0,
            json: false,
        }
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
