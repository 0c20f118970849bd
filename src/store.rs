use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{info, warn};

use crate::error::RecordError;
use crate::model::{
    CardColor, DisciplinaryEvent, MatchResult, MatchStatus, Participant, Player, PlayerRef,
    PointsAdjustment, ScoringEvent, parse_kickoff,
};
use crate::snapshot::{CompetitionInfo, LeagueSnapshot};

const APP_DIR: &str = "league_standings";
const DB_FILE: &str = "league.sqlite";

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub competition_id: u32,
    pub participants: usize,
    pub players: usize,
    pub matches: usize,
    pub goals: usize,
    pub cards: usize,
    pub penalties: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedScope {
    pub snapshot: LeagueSnapshot,
    /// `(table, row id, reason)` for stored rows that could not be decoded.
    pub skipped: Vec<(String, i64, String)>,
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .context("enable WAL journal")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS competitions (
            competition_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            season TEXT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS participants (
            competition_id INTEGER NOT NULL,
            participant_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            logo TEXT NULL,
            PRIMARY KEY (competition_id, participant_id)
        );
        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY,
            club_id INTEGER NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            name TEXT NULL
        );
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            competition_id INTEGER NOT NULL,
            home_id INTEGER NOT NULL,
            away_id INTEGER NOT NULL,
            home_score INTEGER NULL,
            away_score INTEGER NULL,
            status TEXT NOT NULL,
            kickoff TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_competition ON matches(competition_id);
        CREATE INDEX IF NOT EXISTS idx_matches_kickoff ON matches(kickoff);

        CREATE TABLE IF NOT EXISTS goals (
            goal_id INTEGER PRIMARY KEY AUTOINCREMENT,
            competition_id INTEGER NOT NULL,
            match_id INTEGER NOT NULL,
            club_id INTEGER NOT NULL,
            player_id INTEGER NULL,
            player_name TEXT NULL,
            assist_player_id INTEGER NULL,
            assist_name TEXT NULL,
            minute INTEGER NULL,
            is_penalty INTEGER NOT NULL,
            is_own_goal INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_goals_competition ON goals(competition_id);

        CREATE TABLE IF NOT EXISTS cards (
            card_id INTEGER PRIMARY KEY AUTOINCREMENT,
            competition_id INTEGER NOT NULL,
            match_id INTEGER NOT NULL,
            club_id INTEGER NOT NULL,
            player_id INTEGER NULL,
            player_name TEXT NULL,
            minute INTEGER NULL,
            color TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cards_competition ON cards(competition_id);

        CREATE TABLE IF NOT EXISTS penalties (
            penalty_id INTEGER PRIMARY KEY AUTOINCREMENT,
            competition_id INTEGER NOT NULL,
            participant_id INTEGER NOT NULL,
            points INTEGER NOT NULL,
            reason TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS import_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            competition_id INTEGER NOT NULL,
            imported_at TEXT NOT NULL,
            matches INTEGER NOT NULL,
            goals INTEGER NOT NULL,
            cards INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Store one competition's snapshot. Entities are upserted; goals, cards and
/// point adjustments of the competition are replaced wholesale.
pub fn import_snapshot(
    conn: &mut Connection,
    competition_id: u32,
    snapshot: &LeagueSnapshot,
) -> Result<ImportSummary> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction().context("begin import transaction")?;

    let (name, season) = match snapshot.competition.as_ref() {
        Some(c) => (c.name.clone(), c.season.clone()),
        None => (format!("Competition {competition_id}"), None),
    };
    tx.execute(
        "INSERT INTO competitions (competition_id, name, season, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(competition_id) DO UPDATE SET
            name = excluded.name, season = excluded.season, updated_at = excluded.updated_at",
        params![competition_id as i64, name, season, now],
    )
    .context("upsert competition")?;

    for p in &snapshot.participants {
        upsert_participant(&tx, competition_id, p)?;
    }
    for p in &snapshot.players {
        upsert_player(&tx, p)?;
    }
    for m in &snapshot.matches {
        upsert_match(&tx, competition_id, m, &now)?;
    }

    for table in ["goals", "cards", "penalties"] {
        tx.execute(
            &format!("DELETE FROM {table} WHERE competition_id = ?1"),
            params![competition_id as i64],
        )
        .with_context(|| format!("clear {table}"))?;
    }
    for g in &snapshot.goals {
        insert_goal(&tx, competition_id, g)?;
    }
    for c in &snapshot.cards {
        insert_card(&tx, competition_id, c)?;
    }
    for p in &snapshot.penalties {
        tx.execute(
            "INSERT INTO penalties (competition_id, participant_id, points, reason)
             VALUES (?1, ?2, ?3, ?4)",
            params![competition_id as i64, p.participant as i64, p.points, p.reason],
        )
        .context("insert penalty")?;
    }

    tx.execute(
        "INSERT INTO import_runs (competition_id, imported_at, matches, goals, cards)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            competition_id as i64,
            now,
            snapshot.matches.len() as i64,
            snapshot.goals.len() as i64,
            snapshot.cards.len() as i64
        ],
    )
    .context("record import run")?;
    tx.commit().context("commit import transaction")?;

    let summary = ImportSummary {
        competition_id,
        participants: snapshot.participants.len(),
        players: snapshot.players.len(),
        matches: snapshot.matches.len(),
        goals: snapshot.goals.len(),
        cards: snapshot.cards.len(),
        penalties: snapshot.penalties.len(),
    };
    info!(
        competition_id,
        matches = summary.matches,
        goals = summary.goals,
        cards = summary.cards,
        "snapshot imported"
    );
    Ok(summary)
}

pub fn list_competitions(conn: &Connection) -> Result<Vec<CompetitionInfo>> {
    let mut stmt = conn
        .prepare("SELECT competition_id, name, season FROM competitions ORDER BY competition_id")
        .context("prepare competitions query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CompetitionInfo {
                id: row.get::<_, u32>(0)?,
                name: row.get(1)?,
                season: row.get(2)?,
            })
        })
        .context("query competitions")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode competition row")?);
    }
    Ok(out)
}

/// Load one competition back as a snapshot, matches in kickoff order.
/// Unknown competition ids are an error; undecodable rows are skipped.
pub fn load_snapshot(conn: &Connection, competition_id: u32) -> Result<LoadedScope> {
    let competition = conn
        .query_row(
            "SELECT competition_id, name, season FROM competitions WHERE competition_id = ?1",
            params![competition_id as i64],
            |row| {
                Ok(CompetitionInfo {
                    id: row.get::<_, u32>(0)?,
                    name: row.get(1)?,
                    season: row.get(2)?,
                })
            },
        )
        .optional()
        .context("query competition")?
        .ok_or_else(|| anyhow!("unknown competition id {competition_id}"))?;

    let mut skipped = Vec::new();
    let participants = load_participants(conn, competition_id)?;
    let players = load_players(conn, competition_id)?;
    let matches = load_matches(conn, competition_id, &mut skipped)?;
    let goals = load_goals(conn, competition_id)?;
    let cards = load_cards(conn, competition_id)?;
    let penalties = load_penalties(conn, competition_id)?;

    for (table, id, reason) in &skipped {
        warn!(table = %table, id, reason = %reason, "stored row skipped");
    }

    Ok(LoadedScope {
        snapshot: LeagueSnapshot {
            competition: Some(competition),
            participants,
            players,
            matches,
            goals,
            cards,
            penalties,
        },
        skipped,
    })
}

fn upsert_participant(tx: &Transaction<'_>, competition_id: u32, p: &Participant) -> Result<()> {
    tx.execute(
        "INSERT INTO participants (competition_id, participant_id, name, logo)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(competition_id, participant_id) DO UPDATE SET
            name = excluded.name, logo = excluded.logo",
        params![competition_id as i64, p.id as i64, p.name, p.logo],
    )
    .context("upsert participant")?;
    Ok(())
}

fn upsert_player(tx: &Transaction<'_>, p: &Player) -> Result<()> {
    tx.execute(
        "INSERT INTO players (player_id, club_id, first_name, last_name, name)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(player_id) DO UPDATE SET
            club_id = excluded.club_id, first_name = excluded.first_name,
            last_name = excluded.last_name, name = excluded.name",
        params![
            p.id as i64,
            p.club.map(|c| c as i64),
            p.first_name,
            p.last_name,
            p.name
        ],
    )
    .context("upsert player")?;
    Ok(())
}

fn upsert_match(tx: &Transaction<'_>, competition_id: u32, m: &MatchResult, now: &str) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO matches (
            match_id, competition_id, home_id, away_id, home_score, away_score,
            status, kickoff, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(match_id) DO UPDATE SET
            competition_id = excluded.competition_id,
            home_id = excluded.home_id,
            away_id = excluded.away_id,
            home_score = excluded.home_score,
            away_score = excluded.away_score,
            status = excluded.status,
            kickoff = excluded.kickoff,
            updated_at = excluded.updated_at
        "#,
        params![
            m.id as i64,
            competition_id as i64,
            m.home as i64,
            m.away as i64,
            m.home_score.map(i64::from),
            m.away_score.map(i64::from),
            m.status.code(),
            m.kickoff.to_rfc3339(),
            now,
        ],
    )
    .context("upsert match")?;
    Ok(())
}

fn insert_goal(tx: &Transaction<'_>, competition_id: u32, g: &ScoringEvent) -> Result<()> {
    let (player_id, player_name) = split_ref(g.scorer.as_ref());
    let (assist_id, assist_name) = split_ref(g.assist.as_ref());
    tx.execute(
        r#"
        INSERT INTO goals (
            competition_id, match_id, club_id, player_id, player_name,
            assist_player_id, assist_name, minute, is_penalty, is_own_goal
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            competition_id as i64,
            g.match_id as i64,
            g.club as i64,
            player_id,
            player_name,
            assist_id,
            assist_name,
            g.minute.map(i64::from),
            bool_to_i64(g.is_penalty),
            bool_to_i64(g.is_own_goal),
        ],
    )
    .context("insert goal")?;
    Ok(())
}

fn insert_card(tx: &Transaction<'_>, competition_id: u32, c: &DisciplinaryEvent) -> Result<()> {
    let (player_id, player_name) = split_ref(c.player.as_ref());
    tx.execute(
        "INSERT INTO cards (competition_id, match_id, club_id, player_id, player_name, minute, color)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            competition_id as i64,
            c.match_id as i64,
            c.club as i64,
            player_id,
            player_name,
            c.minute.map(i64::from),
            c.color.code(),
        ],
    )
    .context("insert card")?;
    Ok(())
}

fn load_participants(conn: &Connection, competition_id: u32) -> Result<Vec<Participant>> {
    let mut stmt = conn
        .prepare(
            "SELECT participant_id, name, logo FROM participants
             WHERE competition_id = ?1 ORDER BY participant_id",
        )
        .context("prepare participants query")?;
    let rows = stmt
        .query_map(params![competition_id as i64], |row| {
            Ok(Participant {
                id: row.get::<_, u32>(0)?,
                name: row.get(1)?,
                logo: row.get(2)?,
            })
        })
        .context("query participants")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode participant row")?);
    }
    Ok(out)
}

/// Players of the competition's clubs.
fn load_players(conn: &Connection, competition_id: u32) -> Result<Vec<Player>> {
    let mut stmt = conn
        .prepare(
            "SELECT player_id, club_id, first_name, last_name, name FROM players
             WHERE club_id IN (SELECT participant_id FROM participants WHERE competition_id = ?1)
             ORDER BY player_id",
        )
        .context("prepare players query")?;
    let rows = stmt
        .query_map(params![competition_id as i64], |row| {
            Ok(Player {
                id: row.get::<_, u32>(0)?,
                club: row.get::<_, Option<u32>>(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                name: row.get(4)?,
            })
        })
        .context("query players")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player row")?);
    }
    Ok(out)
}

fn load_matches(
    conn: &Connection,
    competition_id: u32,
    skipped: &mut Vec<(String, i64, String)>,
) -> Result<Vec<MatchResult>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT match_id, home_id, away_id, home_score, away_score, status, kickoff
            FROM matches
            WHERE competition_id = ?1
            ORDER BY kickoff ASC, match_id ASC
            "#,
        )
        .context("prepare matches query")?;
    let rows = stmt
        .query_map(params![competition_id as i64], |row| {
            Ok(RawMatchRow {
                match_id: row.get(0)?,
                home: row.get(1)?,
                away: row.get(2)?,
                home_score: row.get(3)?,
                away_score: row.get(4)?,
                status: row.get(5)?,
                kickoff: row.get(6)?,
            })
        })
        .context("query matches")?;

    let mut out = Vec::new();
    for row in rows {
        let raw = row.context("decode match row")?;
        let id = raw.match_id;
        match raw.into_match() {
            Ok(m) => out.push(m),
            Err(err) => skipped.push(("matches".to_string(), id, err.to_string())),
        }
    }
    Ok(out)
}

struct RawMatchRow {
    match_id: i64,
    home: u32,
    away: u32,
    home_score: Option<i64>,
    away_score: Option<i64>,
    status: String,
    kickoff: String,
}

impl RawMatchRow {
    fn into_match(self) -> Result<MatchResult, RecordError> {
        let id = u64::try_from(self.match_id).map_err(|_| RecordError::MissingField("match_id"))?;
        let status: MatchStatus = self.status.parse()?;
        let kickoff =
            parse_kickoff(&self.kickoff).ok_or(RecordError::InvalidKickoff(self.kickoff))?;
        Ok(MatchResult {
            id,
            home: self.home,
            away: self.away,
            home_score: stored_score(self.home_score, "home_score")?,
            away_score: stored_score(self.away_score, "away_score")?,
            status,
            kickoff,
        })
    }
}

fn stored_score(raw: Option<i64>, field: &'static str) -> Result<Option<u32>, RecordError> {
    match raw {
        None => Ok(None),
        Some(n) => u16::try_from(n)
            .map(|n| Some(u32::from(n)))
            .map_err(|_| RecordError::MissingField(field)),
    }
}

fn load_goals(conn: &Connection, competition_id: u32) -> Result<Vec<ScoringEvent>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT match_id, club_id, player_id, player_name, assist_player_id, assist_name,
                   minute, is_penalty, is_own_goal
            FROM goals
            WHERE competition_id = ?1
            ORDER BY goal_id
            "#,
        )
        .context("prepare goals query")?;
    let rows = stmt
        .query_map(params![competition_id as i64], |row| {
            Ok(ScoringEvent {
                match_id: row.get::<_, u64>(0)?,
                club: row.get::<_, u32>(1)?,
                scorer: join_ref(row.get(2)?, row.get(3)?),
                assist: join_ref(row.get(4)?, row.get(5)?),
                minute: row.get::<_, Option<u16>>(6)?,
                is_penalty: row.get::<_, i64>(7)? != 0,
                is_own_goal: row.get::<_, i64>(8)? != 0,
            })
        })
        .context("query goals")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode goal row")?);
    }
    Ok(out)
}

fn load_cards(conn: &Connection, competition_id: u32) -> Result<Vec<DisciplinaryEvent>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT match_id, club_id, player_id, player_name, minute, color
            FROM cards
            WHERE competition_id = ?1
            ORDER BY card_id
            "#,
        )
        .context("prepare cards query")?;
    let rows = stmt
        .query_map(params![competition_id as i64], |row| {
            Ok(DisciplinaryEvent {
                match_id: row.get::<_, u64>(0)?,
                club: row.get::<_, u32>(1)?,
                player: join_ref(row.get(2)?, row.get(3)?),
                minute: row.get::<_, Option<u16>>(4)?,
                color: CardColor::from_code(&row.get::<_, String>(5)?),
            })
        })
        .context("query cards")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode card row")?);
    }
    Ok(out)
}

fn load_penalties(conn: &Connection, competition_id: u32) -> Result<Vec<PointsAdjustment>> {
    let mut stmt = conn
        .prepare(
            "SELECT participant_id, points, reason FROM penalties
             WHERE competition_id = ?1 ORDER BY penalty_id",
        )
        .context("prepare penalties query")?;
    let rows = stmt
        .query_map(params![competition_id as i64], |row| {
            Ok(PointsAdjustment {
                participant: row.get::<_, u32>(0)?,
                points: row.get(1)?,
                reason: row.get(2)?,
            })
        })
        .context("query penalties")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode penalty row")?);
    }
    Ok(out)
}

fn split_ref(player: Option<&PlayerRef>) -> (Option<i64>, Option<String>) {
    match player {
        Some(PlayerRef::Linked(id)) => (Some(i64::from(*id)), None),
        Some(PlayerRef::FreeText(name)) => (None, Some(name.clone())),
        None => (None, None),
    }
}

fn join_ref(id: Option<u32>, name: Option<String>) -> Option<PlayerRef> {
    if let Some(id) = id {
        return Some(PlayerRef::Linked(id));
    }
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .map(PlayerRef::FreeText)
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}
