use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};

use league_standings::config::{self, AppConfig};
use league_standings::export;
use league_standings::logging;
use league_standings::player_totals::rank_player_totals;
use league_standings::snapshot::{self, LeagueSnapshot};
use league_standings::store;

#[derive(Debug, Default)]
struct Args {
    db: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    competition: Option<u32>,
    all: bool,
    include_live: Option<bool>,
    club: Option<u32>,
    leaders: Option<usize>,
    json: bool,
    xlsx: Option<PathBuf>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_tracing();

    let args = parse_args(std::env::args().skip(1).collect())?;
    let cfg = config::app_config();
    let include_live = args.include_live.unwrap_or(cfg.include_in_progress);

    let scopes = load_scopes(&args, cfg)?;
    if scopes.is_empty() {
        bail!("no competition to report on");
    }
    if args.xlsx.is_some() && scopes.len() > 1 {
        bail!("--xlsx needs a single competition");
    }

    let tables =
        snapshot::compute_all_standings(&scopes, include_live, &cfg.standings, cfg.parallelism);
    for (scope, table) in scopes.iter().zip(&tables) {
        let title = scope
            .competition
            .as_ref()
            .map(|c| match c.season.as_deref() {
                Some(season) => format!("{} ({season})", c.name),
                None => c.name.clone(),
            })
            .unwrap_or_else(|| "Standings".to_string());
        info!(
            scope = %title,
            matches = table.matches_counted,
            skipped = table.skipped.len(),
            widened = table.widened,
            "standings computed"
        );

        if args.json {
            println!("{}", export::standings_json(scope.competition.as_ref(), table)?);
        } else {
            print!("{}", export::render_standings_text(&title, table));
        }

        let mut player_rows = Vec::new();
        if let Some(club) = args.club {
            match scope.player_totals(club, include_live, &cfg.standings) {
                Some(totals) => {
                    player_rows = rank_player_totals(&totals);
                    if args.json {
                        let doc = serde_json::to_string_pretty(&player_rows)
                            .context("serialize player totals")?;
                        println!("{doc}");
                    } else {
                        println!();
                        let title = format!("Squad stats, club {club}");
                        print!("{}", export::render_player_totals_text(&title, &player_rows));
                    }
                }
                None => warn!(club, scope = %title, "club is not part of this competition"),
            }
        }

        if let Some(limit) = args.leaders {
            let scorers = scope.top_scorers(include_live, &cfg.standings, limit);
            let assists = scope.assist_leaders(include_live, &cfg.standings, limit);
            if args.json {
                let doc = serde_json::json!({ "top_scorers": scorers, "assist_leaders": assists });
                println!("{}", serde_json::to_string_pretty(&doc).context("serialize leaders")?);
            } else {
                println!();
                print!("{}", export::render_leaders_text("Top scorers", &scorers));
                print!("{}", export::render_leaders_text("Assists", &assists));
            }
        }

        if let Some(path) = args.xlsx.as_ref() {
            let report = export::export_workbook(path, table, &player_rows)?;
            info!(
                path = %path.display(),
                standings = report.standings_rows,
                players = report.player_rows,
                "workbook written"
            );
        }
    }
    Ok(())
}

fn load_scopes(args: &Args, cfg: &AppConfig) -> Result<Vec<LeagueSnapshot>> {
    if let Some(path) = args.snapshot.as_ref() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read snapshot {}", path.display()))?;
        let report = snapshot::parse_snapshot_json(&raw)?;
        for (at, reason) in &report.skipped {
            warn!(record = %at, %reason, "snapshot record skipped");
        }
        return Ok(vec![report.snapshot]);
    }

    let db_path = args
        .db
        .clone()
        .or_else(|| cfg.db_path.clone())
        .context("unable to resolve sqlite path")?;
    let conn = store::open_db(&db_path)?;

    let ids: Vec<u32> = if args.all {
        store::list_competitions(&conn)?.into_iter().map(|c| c.id).collect()
    } else if let Some(id) = args.competition {
        vec![id]
    } else {
        let known = store::list_competitions(&conn)?;
        match known.as_slice() {
            [only] => vec![only.id],
            [] => bail!("database {} holds no competition", db_path.display()),
            _ => bail!("several competitions stored: pass --competition ID or --all"),
        }
    };

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let loaded = store::load_snapshot(&conn, id)?;
        if !loaded.skipped.is_empty() {
            warn!(competition = id, skipped = loaded.skipped.len(), "stored rows skipped");
        }
        out.push(loaded.snapshot);
    }
    Ok(out)
}

fn parse_args(args: Vec<String>) -> Result<Args> {
    let mut out = Args::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) => (f.to_string(), Some(v.to_string())),
            None => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String> {
            inline
                .clone()
                .or_else(|| iter.next())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{name} needs a value"))
        };
        match flag.as_str() {
            "--db" => out.db = Some(PathBuf::from(value("--db")?)),
            "--snapshot" => out.snapshot = Some(PathBuf::from(value("--snapshot")?)),
            "--competition" => {
                let raw = value("--competition")?;
                out.competition = Some(raw.parse().context("--competition must be an id")?)
            }
            "--club" => out.club = Some(value("--club")?.parse().context("--club must be an id")?),
            "--leaders" => {
                let raw = value("--leaders")?;
                out.leaders = Some(raw.parse().context("--leaders must be a number")?)
            }
            "--xlsx" => out.xlsx = Some(PathBuf::from(value("--xlsx")?)),
            "--all" => out.all = true,
            "--json" => out.json = true,
            "--include-live" => {
                out.include_live = match inline.as_deref() {
                    Some(v) => Some(
                        config::parse_flag(v).context("--include-live expects a boolean")?,
                    ),
                    None => Some(true),
                }
            }
            "--finished-only" => out.include_live = Some(false),
            other => bail!("unknown argument {other}"),
        }
    }
    Ok(out)
}
