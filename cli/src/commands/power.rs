use std::sync::Arc;

use anyhow::bail;
use colored::*;
use serde_json::json;

use bmcfleet_common::config::Config;
use bmcfleet_common::fleet::MemberId;
use bmcfleet_common::inventory::InventoryStore;
use bmcfleet_core::control::{ActionResult, PowerController};
use bmcfleet_core::inventory::MemoryInventory;

use crate::adapters::{files, lab::LabGateway};
use crate::commands::PowerArgs;
use crate::terminal::{format, print};

pub async fn power(args: PowerArgs, cfg: &Config) -> anyhow::Result<()> {
    let lab = Arc::new(LabGateway::new(files::load_lab(&args.lab)?));
    let inventory = Arc::new(MemoryInventory::new(files::load_inventory(&args.inventory)?));

    let ids: Vec<MemberId> = if args.all {
        inventory
            .list_fleet_members()
            .await?
            .into_iter()
            .map(|member| member.id)
            .collect()
    } else {
        args.members
    };
    if ids.is_empty() {
        bail!("no members to act on");
    }

    let controller = PowerController::new(lab, inventory, &cfg.power);
    let mut results: Vec<ActionResult> = if let [only] = ids[..] {
        vec![(only, controller.execute(only, args.action).await)]
    } else {
        controller.execute_many(ids, args.action).await
    };
    results.sort_by_key(|(id, _)| *id);

    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    print_results(&results, cfg);

    if failed > 0 {
        bail!("{failed} of {} power actions failed", results.len());
    }
    Ok(())
}

fn print_results(results: &[ActionResult], cfg: &Config) {
    if cfg.json {
        for (id, result) in results {
            let line = match result {
                Ok(state) => json!({"member": id, "power_state": state}),
                Err(err) => json!({"member": id, "error": err.to_string()}),
            };
            println!("{line}");
        }
        return;
    }

    print::header("Power Actions", cfg.quiet);
    for (id, result) in results {
        let value: ColoredString = match result {
            Ok(state) => format!("now {}", format::power(*state)).normal(),
            Err(err) => err.to_string().red(),
        };
        print::aligned_line(&id.to_string(), 6, value);
    }
}
