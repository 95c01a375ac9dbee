use std::time::Duration;

use crate::terminal::colors;
use bmcfleet_common::device::DeviceRecord;
use bmcfleet_common::fleet::{MemberState, MemberStatus};
use bmcfleet_common::power::PowerState;
use bmcfleet_common::telemetry::SensorReadings;
use colored::*;

pub type Detail = (String, ColoredString);

pub fn device_to_details(device: &DeviceRecord) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![(
        String::from("Endpoint"),
        format!(
            "{}:{}",
            device.address.to_string().color(colors::IPV4_ADDR),
            device.port.to_string().color(colors::PORT)
        )
        .normal(),
    )];

    let access: ColoredString = match &device.credential {
        Some(credential) => format!("open as '{}'", credential.username).green(),
        None => "authentication required".yellow(),
    };
    details.push((String::from("Access"), access));

    if let Some(identity) = &device.identity {
        details.push((String::from("Vendor"), identity.manufacturer.color(colors::VENDOR)));
        details.push((String::from("Model"), identity.model.normal()));
        details.push((String::from("Serial"), identity.serial.normal()));
        details.push((String::from("Firmware"), identity.firmware_version.normal()));
    }

    let inventory: ColoredString = match device.existing_id {
        Some(id) => format!("member {id}").color(colors::ACCENT),
        None => "not in inventory".dimmed(),
    };
    details.push((String::from("Inventory"), inventory));

    details
}

pub fn state_to_details(state: &MemberState) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        (String::from("Status"), status(state.status)),
        (String::from("Power"), power(state.power_state)),
    ];

    let seen: ColoredString = match state.last_seen {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string().normal(),
        None => "never".dimmed(),
    };
    details.push((String::from("Last seen"), seen));

    if let Some(readings) = &state.telemetry {
        details.extend(telemetry_to_details(readings));
    }
    details
}

pub fn telemetry_to_details(readings: &SensorReadings) -> Vec<Detail> {
    if readings.is_empty() {
        return vec![(String::from("Sensors"), "none reported".dimmed())];
    }

    let summary = readings.summary();
    let mut details: Vec<Detail> = Vec::new();

    if let Some(max) = summary.max_temperature {
        details.push((String::from("Temp max"), format!("{max:.1} °C").normal()));
    }
    if let (Some(min), Some(max)) = (summary.min_voltage, summary.max_voltage) {
        details.push((String::from("Voltage"), format!("{min:.2} V .. {max:.2} V").normal()));
    }
    if !readings.fan_speed.is_empty() {
        let fans: ColoredString = match summary.stalled_fans {
            0 => format!("{} spinning", readings.fan_speed.len()).green(),
            stalled => format!("{stalled} of {} stalled", readings.fan_speed.len()).red().bold(),
        };
        details.push((String::from("Fans"), fans));
    }
    details
}

pub fn power(state: PowerState) -> ColoredString {
    match state {
        PowerState::On => "on".color(colors::POWER_ON).bold(),
        PowerState::Off => "off".color(colors::POWER_OFF).bold(),
        PowerState::Unknown => "unknown".color(colors::UNKNOWN),
    }
}

pub fn status(status: MemberStatus) -> ColoredString {
    match status {
        MemberStatus::Online => "online".color(colors::POWER_ON),
        MemberStatus::Offline => "offline".color(colors::POWER_OFF),
        MemberStatus::Unknown => "unknown".color(colors::UNKNOWN),
    }
}

pub fn seconds(duration: Duration) -> ColoredString {
    format!("{:.2}s", duration.as_secs_f64()).bold().yellow()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
