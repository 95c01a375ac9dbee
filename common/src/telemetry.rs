use serde::{Deserialize, Serialize};

/// Raw sensor values read from a controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    /// Degrees Celsius.
    #[serde(default)]
    pub temperature: Vec<f64>,
    /// Volts.
    #[serde(default)]
    pub voltage: Vec<f64>,
    /// RPM.
    #[serde(default)]
    pub fan_speed: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetrySummary {
    pub max_temperature: Option<f64>,
    pub min_voltage: Option<f64>,
    pub max_voltage: Option<f64>,
    /// Fans reporting 0 RPM.
    pub stalled_fans: usize,
}

impl SensorReadings {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty() && self.voltage.is_empty() && self.fan_speed.is_empty()
    }

    pub fn summary(&self) -> TelemetrySummary {
        TelemetrySummary {
            max_temperature: self.temperature.iter().copied().reduce(f64::max),
            min_voltage: self.voltage.iter().copied().reduce(f64::min),
            max_voltage: self.voltage.iter().copied().reduce(f64::max),
            stalled_fans: self.fan_speed.iter().filter(|rpm| **rpm <= 0.0).count(),
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
