use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::warn;

use league_standings::config;
use league_standings::logging;
use league_standings::snapshot::parse_snapshot_json;
use league_standings::store;

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(file) = positional_arg(&args) else {
        bail!("usage: league_import [--db PATH] [--competition ID] SNAPSHOT.json");
    };
    let db_path = flag_value(&args, "--db")
        .map(PathBuf::from)
        .or_else(|| config::app_config().db_path.clone())
        .context("unable to resolve sqlite path")?;

    let raw = fs::read_to_string(&file).with_context(|| format!("read snapshot {}", file.display()))?;
    let report = parse_snapshot_json(&raw)?;
    for (at, reason) in &report.skipped {
        warn!(record = %at, %reason, "snapshot record skipped");
    }

    let competition_id = match flag_value(&args, "--competition") {
        Some(raw) => raw.parse::<u32>().context("--competition must be an id")?,
        None => report
            .snapshot
            .competition
            .as_ref()
            .map(|c| c.id)
            .context("snapshot has no competition id: pass --competition")?,
    };

    let mut conn = store::open_db(&db_path)?;
    let summary = store::import_snapshot(&mut conn, competition_id, &report.snapshot)?;

    println!("Import complete");
    println!("DB: {}", db_path.display());
    println!("Competition: {}", summary.competition_id);
    println!("Participants: {}", summary.participants);
    println!("Players: {}", summary.players);
    println!("Matches: {}", summary.matches);
    println!("Goals: {}  Cards: {}  Adjustments: {}", summary.goals, summary.cards, summary.penalties);
    if !report.skipped.is_empty() {
        println!("Records skipped: {}", report.skipped.len());
        for (at, reason) in report.skipped.iter().take(8) {
            println!(" - {at}: {reason}");
        }
    }
    Ok(())
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

/// First argument that is neither a flag nor a flag's value.
fn positional_arg(args: &[String]) -> Option<PathBuf> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = !arg.contains('=');
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
}
