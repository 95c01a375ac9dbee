use std::sync::Arc;

use anyhow::Context;
use colored::*;
use tracing::{Instrument, info, info_span};

use bmcfleet_common::config::{Config, DiscoveryConfig};
use bmcfleet_common::device::{DeviceRecord, ScanReport};
use bmcfleet_common::network::target::AddressSpec;
use bmcfleet_core::discovery::DiscoveryCoordinator;
use bmcfleet_core::inventory::MemoryInventory;

use crate::adapters::{files, lab::LabGateway};
use crate::commands::DiscoverArgs;
use crate::mprint;
use crate::terminal::{colors, format, print, spinner};

pub async fn discover(args: DiscoverArgs, cfg: &Config) -> anyhow::Result<()> {
    let addresses: AddressSpec = args
        .spec
        .parse()
        .with_context(|| format!("invalid address specification '{}'", args.spec))?;

    let credentials = files::load_credentials(&args.credentials)?;
    let lab = Arc::new(LabGateway::new(files::load_lab(&args.lab)?));
    let members = match &args.inventory {
        Some(path) => files::load_inventory(path)?,
        None => Vec::new(),
    };
    info!(
        controllers = lab.len(),
        credentials = credentials.len(),
        members = members.len(),
        "lab loaded"
    );

    let discovery_cfg = DiscoveryConfig {
        port: args.port,
        timeout: args.timeout(),
        max_workers: args.workers,
        ..cfg.discovery.clone()
    };

    let span = info_span!("discovery", indicatif.pb_show = true);
    let observer = spinner::discovery_progress(span.clone(), addresses.len() as usize);
    let coordinator = DiscoveryCoordinator::new(
        lab.clone(),
        lab,
        Arc::new(MemoryInventory::new(members)),
        credentials,
    )
    .with_observer(observer);

    let report = coordinator
        .discover_addresses(&addresses, &discovery_cfg)
        .instrument(span)
        .await;

    discovery_ends(report, cfg)
}

fn discovery_ends(mut report: ScanReport, cfg: &Config) -> anyhow::Result<()> {
    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.devices.is_empty() {
        no_devices_found(&report, cfg);
        return Ok(());
    }

    if cfg.quiet > 0 {
        mprint!();
    }

    print::header("Controller Discovery", cfg.quiet);
    report.devices.sort_by_key(|device| device.address);
    print_devices(&report.devices, cfg);
    print_summary(&report, cfg);
    Ok(())
}

fn no_devices_found(report: &ScanReport, cfg: &Config) {
    print::header("ZERO CONTROLLERS DETECTED", cfg.quiet);
    if cfg.quiet < 2 {
        print::no_results();
    }
    print_summary(report, cfg);
}

fn print_devices(devices: &[DeviceRecord], cfg: &Config) {
    if cfg.quiet >= 2 {
        return;
    }
    for (idx, device) in devices.iter().enumerate() {
        let name = device
            .identity
            .as_ref()
            .map(|identity| format!("{} {}", identity.manufacturer, identity.model))
            .unwrap_or_else(|| String::from("Unidentified controller"));
        print::tree_head(idx, &name);
        print::as_tree_one_level(format::device_to_details(device));
        if idx + 1 != devices.len() {
            mprint!();
        }
    }
}

fn print_summary(report: &ScanReport, cfg: &Config) {
    let accessible = report.accessible().count();
    let locked = report.needing_auth().count();
    let known = report.devices.iter().filter(|d| d.already_exists).count();

    let found: ColoredString = format!("{} controllers", report.devices_found).bold().green();
    let scanned: ColoredString = report.total_scanned.to_string().bold();
    let output: String = format!(
        "Discovery Complete: {found} of {scanned} targets in {}",
        format::seconds(report.duration)
    )
    .color(colors::TEXT_DEFAULT)
    .to_string();
    let detail: String = format!(
        "{accessible} accessible, {locked} need credentials, {known} already inventoried"
    )
    .dimmed()
    .to_string();

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
            print::centerln(&detail);
        }
        _ => {
            mprint!();
            print::print_status(&output);
            print::print_status(&detail);
        }
    }

    if report.incomplete > 0 {
        tracing::warn!(
            incomplete = report.incomplete,
            "some targets did not finish before the deadline"
        );
    }
}
