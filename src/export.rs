use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::model::MatchStatus;
use crate::player_totals::{LeaderRow, PlayerTotalsRow};
use crate::snapshot::CompetitionInfo;
use crate::standings::{StandingsRow, StandingsTable, StatusScope};

#[derive(Debug, Serialize)]
struct StandingsDocument<'a> {
    competition: Option<&'a CompetitionInfo>,
    status_scope: StatusScope,
    statuses_used: Vec<MatchStatus>,
    widened: bool,
    matches_counted: usize,
    skipped: usize,
    table: &'a [StandingsRow],
}

pub fn standings_json(competition: Option<&CompetitionInfo>, table: &StandingsTable) -> Result<String> {
    let doc = StandingsDocument {
        competition,
        status_scope: table.status_scope,
        statuses_used: table.statuses_used(),
        widened: table.widened,
        matches_counted: table.matches_counted,
        skipped: table.skipped.len(),
        table: &table.rows,
    };
    serde_json::to_string_pretty(&doc).context("serialize standings")
}

pub fn render_standings_text(title: &str, table: &StandingsTable) -> String {
    let name_width = table
        .rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(
        out,
        "{:>3}  {:<name_width$}  {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>4} {:>4}  Form",
        "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
    );
    for r in &table.rows {
        let pts = if r.penalty_points != 0 {
            format!("{}*", r.points)
        } else {
            r.points.to_string()
        };
        let _ = writeln!(
            out,
            "{:>3}  {:<name_width$}  {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>+4} {:>4}  {}",
            r.position,
            r.name,
            r.played,
            r.wins,
            r.draws,
            r.losses,
            r.goals_for,
            r.goals_against,
            r.goal_difference,
            pts,
            r.form_string()
        );
    }

    for r in table.rows.iter().filter(|r| r.penalty_points != 0) {
        let _ = writeln!(out, "* {}: {:+} pts adjustment", r.name, r.penalty_points);
    }
    if table.widened {
        let _ = writeln!(out, "(no finished match yet: in-progress results counted)");
    }
    if !table.skipped.is_empty() {
        let _ = writeln!(out, "({} match records ignored)", table.skipped.len());
    }
    out
}

pub fn render_player_totals_text(title: &str, rows: &[PlayerTotalsRow]) -> String {
    let name_width = rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(6)
        .max(6);
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(
        out,
        "{:<name_width$}  {:>3} {:>3} {:>3} {:>3}",
        "Player", "G", "A", "YC", "RC"
    );
    for r in rows {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:>3} {:>3} {:>3} {:>3}",
            r.name, r.goals, r.assists, r.yellow_cards, r.red_cards
        );
    }
    out
}

pub fn render_leaders_text(title: &str, rows: &[LeaderRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    for (idx, r) in rows.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {} ({})", idx + 1, r.name, r.count);
    }
    out
}

pub struct ExportReport {
    pub standings_rows: usize,
    pub player_rows: usize,
}

const STANDINGS_HEADER: [&str; 13] = [
    "Pos", "Team ID", "Team", "Played", "Won", "Drawn", "Lost", "GF", "GA", "GD", "Points",
    "Adjustment", "Form",
];

const PLAYERS_HEADER: [&str; 6] = ["Player ID", "Player", "Goals", "Assists", "Yellow", "Red"];

/// Cell content; counts are written as numbers so the sheet can be sorted.
enum Cell {
    Text(String),
    Number(i64),
}

pub fn export_workbook(
    path: &Path,
    table: &StandingsTable,
    players: &[PlayerTotalsRow],
) -> Result<ExportReport> {
    let standings: Vec<Vec<Cell>> = table.rows.iter().map(standings_cells).collect();
    let squad: Vec<Vec<Cell>> = players.iter().map(player_cells).collect();

    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, "Standings", &STANDINGS_HEADER, &standings)?;
    if !squad.is_empty() {
        write_sheet(&mut workbook, "Players", &PLAYERS_HEADER, &squad)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        standings_rows: standings.len(),
        player_rows: squad.len(),
    })
}

fn standings_cells(r: &StandingsRow) -> Vec<Cell> {
    vec![
        Cell::Number(r.position as i64),
        Cell::Number(i64::from(r.participant_id)),
        Cell::Text(r.name.clone()),
        Cell::Number(i64::from(r.played)),
        Cell::Number(i64::from(r.wins)),
        Cell::Number(i64::from(r.draws)),
        Cell::Number(i64::from(r.losses)),
        Cell::Number(i64::from(r.goals_for)),
        Cell::Number(i64::from(r.goals_against)),
        Cell::Number(i64::from(r.goal_difference)),
        Cell::Number(i64::from(r.points)),
        Cell::Number(i64::from(r.penalty_points)),
        Cell::Text(r.form_string()),
    ]
}

fn player_cells(p: &PlayerTotalsRow) -> Vec<Cell> {
    vec![
        Cell::Number(i64::from(p.player_id)),
        Cell::Text(p.name.clone()),
        Cell::Number(i64::from(p.goals)),
        Cell::Number(i64::from(p.assists)),
        Cell::Number(i64::from(p.yellow_cards)),
        Cell::Number(i64::from(p.red_cards)),
    ]
}

/// One sheet: bold frozen header on row 0, then the body.
fn write_sheet(
    workbook: &mut Workbook,
    name: &str,
    header: &[&str],
    body: &[Vec<Cell>],
) -> Result<()> {
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (col, title) in header.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *title, &bold)
            .with_context(|| format!("{name}: header column {col}"))?;
    }
    for (idx, cells) in body.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            let written = match cell {
                Cell::Text(text) => sheet.write_string(row, col, text),
                Cell::Number(n) => sheet.write_number(row, col, *n as f64),
            };
            written.with_context(|| format!("{name}: cell ({row},{col})"))?;
        }
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}
