//! Receivers command implementation.

use crate::output;
use ibmi_cdc_engine::{available_receivers, last_joined, link_chain, unreachable};
use ibmi_cdc_model::{DetailedJournalReceiver, JournalReceiver, JournalStatus};
use serde_json::json;
use std::fs;

pub fn run(
    listing: String,
    json: bool,
    from: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&listing)
        .map_err(|e| format!("Failed to read listing: {}: {}", listing, e))?;
    let all: Vec<DetailedJournalReceiver> = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid receiver listing: {}", e))?;

    let target = match from {
        Some(qualified) => Some(
            JournalReceiver::parse_qualified(&qualified)
                .map_err(|e| format!("Invalid receiver: {}", e))?,
        ),
        None => all
            .iter()
            .find(|r| r.info.status == JournalStatus::Attached)
            .map(|r| r.receiver().clone()),
    };

    let directory = available_receivers(&all);
    let available = directory.len();
    let chains = link_chain(directory)?;
    let current = target
        .as_ref()
        .map(|t| chains.chain_containing(t))
        .unwrap_or_default();
    let missing = unreachable(&all, &current);
    let joined = last_joined(&all);

    if json {
        let names = |chain: &[DetailedJournalReceiver]| -> Vec<String> {
            chain.iter().map(|r| r.receiver().to_string()).collect()
        };
        let report = json!({
            "available": available,
            "chains": chains.chains().iter().map(|c| names(c.as_slice())).collect::<Vec<_>>(),
            "target": target.as_ref().map(ToString::to_string),
            "chain": names(current.as_slice()),
            "unreachable": missing.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "last_joined": joined.as_ref().ok().map(|run| names(run.as_slice())),
        });
        println!("{}", output::format_json(&report));
        return Ok(());
    }

    println!("{} receivers listed, {} available", all.len(), available);
    for (index, chain) in chains.chains().iter().enumerate() {
        println!();
        println!("chain {}:", index + 1);
        for receiver in chain {
            println!("  {}", format_receiver(receiver));
        }
    }

    println!();
    match &target {
        Some(target) if current.is_empty() => println!("{} is not available", target),
        Some(target) => {
            println!("chain holding {}:", target);
            for receiver in &current {
                println!("  {}", receiver.receiver());
            }
        }
        None => println!("no attached receiver in the listing"),
    }
    if !missing.is_empty() {
        println!("unreachable:");
        for receiver in &missing {
            println!("  {}", receiver);
        }
    }

    println!();
    match joined {
        Ok(run) => {
            println!("last joined run:");
            for receiver in &run {
                println!("  {}", receiver.receiver());
            }
        }
        Err(e) => println!("last joined run: {}", e),
    }
    Ok(())
}

fn format_receiver(receiver: &DetailedJournalReceiver) -> String {
    let attached = receiver
        .info
        .attach_time
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<22} {:<22} {:>12}..{:<12} attached {}",
        receiver.receiver().to_string(),
        format!("{:?}", receiver.info.status),
        receiver.start,
        receiver.end,
        attached
    )
}
