use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    #[default]
    Unknown,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerState::On => "on",
            PowerState::Off => "off",
            PowerState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A power control request sent to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerAction {
    On,
    Off,
    GracefulShutdown,
    Reset,
    Cycle,
}

impl PowerAction {
    /// The power state a controller settles in once it acknowledged the action.
    pub fn expected_state(self) -> PowerState {
        match self {
            PowerAction::On | PowerAction::Reset | PowerAction::Cycle => PowerState::On,
            PowerAction::Off | PowerAction::GracefulShutdown => PowerState::Off,
        }
    }
}

impl FromStr for PowerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "on" => Ok(PowerAction::On),
            "off" => Ok(PowerAction::Off),
            "graceful_shutdown" | "shutdown" => Ok(PowerAction::GracefulShutdown),
            "reset" => Ok(PowerAction::Reset),
            "cycle" => Ok(PowerAction::Cycle),
            other => Err(format!("unknown power action: {other}")),
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerAction::On => "on",
            PowerAction::Off => "off",
            PowerAction::GracefulShutdown => "graceful-shutdown",
            PowerAction::Reset => "reset",
            PowerAction::Cycle => "cycle",
        };
        f.write_str(s)
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
