use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use colored::*;
use serde_json::json;
use tokio::sync::watch;
use tracing::{Instrument, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use bmcfleet_common::config::{Config, RefreshConfig};
use bmcfleet_common::refresh::{RefreshPassResult, TriggerResult};
use bmcfleet_core::inventory::MemoryInventory;
use bmcfleet_core::refresh::power::{PowerStateJob, PowerStateRefresh};
use bmcfleet_core::refresh::telemetry::{TelemetryJob, TelemetryRefresh};
use bmcfleet_core::refresh::{RefreshJob, RefreshPassRunner};

use crate::adapters::{files, lab::LabGateway};
use crate::commands::{RefreshArgs, RefreshKind};
use crate::mprint;
use crate::terminal::{colors, format, print, spinner};

pub async fn refresh(args: RefreshArgs, cfg: &Config) -> anyhow::Result<()> {
    let lab = Arc::new(LabGateway::new(files::load_lab(&args.lab)?));
    let inventory = Arc::new(MemoryInventory::new(files::load_inventory(&args.inventory)?));
    if inventory.is_empty() {
        bail!("inventory '{}' has no members", args.inventory.display());
    }

    let with_interval = |mut refresh_cfg: RefreshConfig| {
        if let Some(secs) = args.interval {
            refresh_cfg.interval = Duration::from_secs(secs);
        }
        refresh_cfg
    };

    match args.kind {
        RefreshKind::Power => {
            let runner = PowerStateRefresh::new(
                PowerStateJob,
                lab,
                inventory.clone(),
                with_interval(cfg.power.clone()),
            );
            run(runner, &inventory, args.passes, cfg).await
        }
        RefreshKind::Telemetry => {
            let runner = TelemetryRefresh::new(
                TelemetryJob,
                lab,
                inventory.clone(),
                with_interval(cfg.telemetry.clone()),
            );
            run(runner, &inventory, args.passes, cfg).await
        }
    }
}

async fn run<J: RefreshJob>(
    runner: RefreshPassRunner<J>,
    inventory: &MemoryInventory,
    passes: Option<u32>,
    cfg: &Config,
) -> anyhow::Result<()> {
    let runner = Arc::new(runner);
    let interval = runner.config().interval;

    match passes {
        Some(count) => {
            for pass in 1..=count {
                let span = info_span!("refresh", indicatif.pb_show = true);
                span.pb_set_message(&spinner::refresh_message(J::KIND, inventory.len()));

                if let TriggerResult::Completed(result) = runner.trigger_now().instrument(span).await? {
                    print_pass(&result, cfg);
                }
                if pass < count {
                    tokio::time::sleep(interval).await;
                }
            }
        }
        None => {
            let (stop, shutdown) = watch::channel(false);
            let schedule = runner.clone().spawn_schedule(interval, shutdown);
            print::print_status(format!(
                "refreshing {} every {}s, press Ctrl-C to stop",
                J::KIND,
                interval.as_secs()
            ));

            tokio::signal::ctrl_c()
                .await
                .context("could not listen for Ctrl-C")?;
            stop.send(true).context("scheduler already stopped")?;
            schedule.await.context("scheduler task failed")?;

            if let Some(result) = runner.status().last_pass {
                print_pass(&result, cfg);
            }
        }
    }

    print_fleet(inventory, cfg)
}

fn print_pass(result: &RefreshPassResult, cfg: &Config) {
    if cfg.json {
        let failures: Vec<_> = result
            .outcomes
            .iter()
            .filter(|outcome| !outcome.succeeded)
            .map(|outcome| {
                json!({
                    "member": outcome.member,
                    "error": outcome.error.as_ref().map(ToString::to_string),
                })
            })
            .collect();
        let pass = json!({
            "kind": result.kind,
            "started_at": result.started_at,
            "total": result.total,
            "succeeded": result.succeeded,
            "failed": result.failed,
            "timed_out": result.timed_out,
            "elapsed_ms": result.elapsed.as_millis() as u64,
            "failures": failures,
        });
        println!("{pass}");
        return;
    }

    let ok: ColoredString = format!("{}/{}", result.succeeded, result.total).bold().green();
    let line: String = format!(
        "{} pass: {ok} members refreshed in {}",
        result.kind,
        format::seconds(result.elapsed)
    )
    .color(colors::TEXT_DEFAULT)
    .to_string();
    print::print_status(line);

    if cfg.quiet >= 2 {
        return;
    }
    for outcome in result.outcomes.iter().filter(|outcome| !outcome.succeeded) {
        let reason = outcome
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        print::aligned_line(&outcome.member.to_string(), 6, reason.red());
    }
    if result.timed_out {
        print::print_status("pass deadline expired before every member finished".yellow().to_string());
    }
}

fn print_fleet(inventory: &MemoryInventory, cfg: &Config) -> anyhow::Result<()> {
    let states = inventory.states();

    if cfg.json {
        let members: Vec<_> = states
            .iter()
            .map(|(member, state)| {
                json!({
                    "id": member.id,
                    "address": member.address,
                    "port": member.port,
                    "status": state.status,
                    "power_state": state.power_state,
                    "last_seen": state.last_seen,
                    "telemetry": state.telemetry,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&members)?);
        return Ok(());
    }

    if cfg.quiet >= 2 {
        return Ok(());
    }

    mprint!();
    print::header("Fleet State", cfg.quiet);
    for (idx, (member, state)) in states.iter().enumerate() {
        print::tree_head(idx, &format!("{} {}", member.id, member.endpoint()));
        print::as_tree_one_level(format::state_to_details(state));
        if idx + 1 != states.len() {
            mprint!();
        }
    }
    print::end_of_program();
    Ok(())
}
