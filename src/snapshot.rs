use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RecordError;
use crate::model::{
    CardColor, DisciplinaryEvent, MatchId, MatchResult, MatchStatus, Participant, ParticipantId,
    Player, PlayerId, PlayerRef, PointsAdjustment, ScoringEvent, parse_kickoff, penalty_map,
};
use crate::player_totals::{
    LeaderRow, PlayerTotalsRow, assist_leaders, compute_player_totals, top_scorers,
};
use crate::standings::{
    StandingsOptions, StandingsTable, compute_standings_with, resolve_status_scope, validate_match,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionInfo {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub season: Option<String>,
}

/// Everything one standings scope needs, already filtered to that scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    #[serde(default)]
    pub competition: Option<CompetitionInfo>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub matches: Vec<MatchResult>,
    #[serde(default)]
    pub goals: Vec<ScoringEvent>,
    #[serde(default)]
    pub cards: Vec<DisciplinaryEvent>,
    #[serde(default)]
    pub penalties: Vec<PointsAdjustment>,
}

impl LeagueSnapshot {
    pub fn eligible_match_ids(
        &self,
        include_in_progress: bool,
        opts: &StandingsOptions,
    ) -> HashSet<MatchId> {
        let (scope, _) = resolve_status_scope(&self.matches, include_in_progress, opts);
        let known: HashSet<ParticipantId> = self.participants.iter().map(|p| p.id).collect();
        self.matches
            .iter()
            .filter(|m| scope.admits(m.status, opts))
            .filter(|m| validate_match(m, |id| known.contains(&id)).is_ok())
            .map(|m| m.id)
            .collect()
    }

    pub fn standings(&self, include_in_progress: bool, opts: &StandingsOptions) -> StandingsTable {
        compute_standings_with(
            &self.participants,
            &self.matches,
            include_in_progress,
            &penalty_map(&self.penalties),
            opts,
        )
    }

    /// `None` when the participant is not part of this scope.
    pub fn player_totals(
        &self,
        participant_id: ParticipantId,
        include_in_progress: bool,
        opts: &StandingsOptions,
    ) -> Option<BTreeMap<PlayerId, PlayerTotalsRow>> {
        let participant = self.participants.iter().find(|p| p.id == participant_id)?;
        let eligible = self.eligible_match_ids(include_in_progress, opts);
        let goals = self.counted_goals(&eligible);
        let cards: Vec<DisciplinaryEvent> = self
            .cards
            .iter()
            .filter(|c| eligible.contains(&c.match_id))
            .cloned()
            .collect();
        Some(compute_player_totals(participant, &goals, &cards, &self.players))
    }

    pub fn top_scorers(
        &self,
        include_in_progress: bool,
        opts: &StandingsOptions,
        limit: usize,
    ) -> Vec<LeaderRow> {
        let eligible = self.eligible_match_ids(include_in_progress, opts);
        top_scorers(&self.counted_goals(&eligible), &self.players, limit)
    }

    pub fn assist_leaders(
        &self,
        include_in_progress: bool,
        opts: &StandingsOptions,
        limit: usize,
    ) -> Vec<LeaderRow> {
        let eligible = self.eligible_match_ids(include_in_progress, opts);
        assist_leaders(&self.counted_goals(&eligible), &self.players, limit)
    }

    fn counted_goals(&self, eligible: &HashSet<MatchId>) -> Vec<ScoringEvent> {
        self.goals
            .iter()
            .filter(|g| eligible.contains(&g.match_id))
            .cloned()
            .collect()
    }
}

/// Standings for many scopes at once. Each scope is independent, so they are
/// spread over a rayon pool; output order follows input order.
pub fn compute_all_standings(
    snapshots: &[LeagueSnapshot],
    include_in_progress: bool,
    opts: &StandingsOptions,
    parallelism: usize,
) -> Vec<StandingsTable> {
    let run = || {
        snapshots
            .par_iter()
            .map(|s| s.standings(include_in_progress, opts))
            .collect::<Vec<_>>()
    };
    match rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.max(1))
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(err) => {
            debug!(%err, "falling back to the global rayon pool");
            run()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub snapshot: LeagueSnapshot,
    /// `(section, reason)` for every record that was dropped.
    pub skipped: Vec<(String, String)>,
}

/// Parse a snapshot document record by record. Only an unreadable document
/// is an error; a bad record is dropped and reported.
pub fn parse_snapshot_json(raw: &str) -> Result<ParseReport> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(ParseReport::default());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid snapshot json")?;
    if !v.is_object() {
        return Err(anyhow::anyhow!("snapshot json must be an object"));
    }

    let mut report = ParseReport::default();
    report.snapshot.competition = v.get("competition").and_then(parse_competition);
    report.snapshot.participants = parse_section(&v, "participants", parse_participant, &mut report.skipped);
    report.snapshot.players = parse_section(&v, "players", parse_player, &mut report.skipped);
    report.snapshot.matches = parse_section(&v, "matches", parse_match, &mut report.skipped);
    report.snapshot.goals = parse_section(&v, "goals", parse_goal, &mut report.skipped);
    report.snapshot.cards = parse_section(&v, "cards", parse_card, &mut report.skipped);
    report.snapshot.penalties = parse_section(&v, "penalties", parse_penalty, &mut report.skipped);

    if !report.skipped.is_empty() {
        debug!(skipped = report.skipped.len(), "snapshot records dropped");
    }
    Ok(report)
}

fn parse_section<T>(
    root: &Value,
    key: &str,
    parse: fn(&Value) -> Result<T, RecordError>,
    skipped: &mut Vec<(String, String)>,
) -> Vec<T> {
    let Some(arr) = root.get(key).and_then(|x| x.as_array()) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(arr.len());
    for (idx, item) in arr.iter().enumerate() {
        match parse(item) {
            Ok(row) => out.push(row),
            Err(err) => skipped.push((format!("{key}[{idx}]"), err.to_string())),
        }
    }
    out
}

fn parse_competition(v: &Value) -> Option<CompetitionInfo> {
    Some(CompetitionInfo {
        id: v.get("id").and_then(as_u32_any)?,
        name: v
            .get("name")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        season: v.get("season").and_then(|x| x.as_str()).map(|s| s.to_string()),
    })
}

fn parse_participant(v: &Value) -> Result<Participant, RecordError> {
    let id = required(v, "id", as_u32_any)?;
    let name = v
        .get("name")
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingField("name"))?
        .to_string();
    let logo = v
        .get("logo")
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    Ok(Participant { id, name, logo })
}

fn parse_player(v: &Value) -> Result<Player, RecordError> {
    let text = |key: &str| {
        v.get(key)
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    Ok(Player {
        id: required(v, "id", as_u32_any)?,
        club: v.get("club").and_then(as_u32_any),
        first_name: text("first_name"),
        last_name: text("last_name"),
        name: Some(text("name")).filter(|s| !s.is_empty()),
    })
}

fn parse_match(v: &Value) -> Result<MatchResult, RecordError> {
    let id = required(v, "id", as_u64_any)?;
    let home = required(v, "home", as_u32_any)?;
    let away = required(v, "away", as_u32_any)?;
    let status_raw = v
        .get("status")
        .and_then(|x| x.as_str())
        .ok_or(RecordError::MissingField("status"))?;
    let status: MatchStatus = status_raw.parse()?;
    let kickoff_raw = v
        .get("kickoff")
        .and_then(|x| x.as_str())
        .ok_or(RecordError::MissingField("kickoff"))?;
    let kickoff = parse_kickoff(kickoff_raw)
        .ok_or_else(|| RecordError::InvalidKickoff(kickoff_raw.to_string()))?;
    Ok(MatchResult {
        id,
        home,
        away,
        home_score: parse_score(v, "home_score")?,
        away_score: parse_score(v, "away_score")?,
        status,
        kickoff,
    })
}

fn parse_goal(v: &Value) -> Result<ScoringEvent, RecordError> {
    Ok(ScoringEvent {
        match_id: required(v, "match_id", as_u64_any)?,
        club: required(v, "club", as_u32_any)?,
        scorer: v.get("scorer").and_then(parse_player_ref),
        assist: v.get("assist").and_then(parse_player_ref),
        minute: v.get("minute").and_then(as_u16_any),
        is_penalty: v.get("is_penalty").is_some_and(as_flag),
        is_own_goal: v.get("is_own_goal").is_some_and(as_flag),
    })
}

fn parse_card(v: &Value) -> Result<DisciplinaryEvent, RecordError> {
    let color = v
        .get("color")
        .and_then(|x| x.as_str())
        .map(CardColor::from_code)
        .unwrap_or(CardColor::Yellow);
    Ok(DisciplinaryEvent {
        match_id: required(v, "match_id", as_u64_any)?,
        club: required(v, "club", as_u32_any)?,
        player: v.get("player").and_then(parse_player_ref),
        minute: v.get("minute").and_then(as_u16_any),
        color,
    })
}

fn parse_penalty(v: &Value) -> Result<PointsAdjustment, RecordError> {
    Ok(PointsAdjustment {
        participant: required(v, "participant", as_u32_any)?,
        points: required(v, "points", as_i32_any)?,
        reason: v
            .get("reason")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

/// Absent or null is "not played yet"; anything else must be a plausible
/// goal count.
fn parse_score(v: &Value, key: &'static str) -> Result<Option<u32>, RecordError> {
    match v.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => as_u16_any(raw)
            .map(|n| Some(u32::from(n)))
            .ok_or(RecordError::MissingField(key)),
    }
}

/// A number is a linked player; a non-blank string is a typed-in name.
fn parse_player_ref(v: &Value) -> Option<PlayerRef> {
    if let Some(n) = v.as_u64() {
        return u32::try_from(n).ok().map(PlayerRef::Linked);
    }
    let s = v.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(PlayerRef::FreeText(s.to_string()))
    }
}

fn required<T>(v: &Value, key: &'static str, get: fn(&Value) -> Option<T>) -> Result<T, RecordError> {
    v.get(key).and_then(get).ok_or(RecordError::MissingField(key))
}

fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    u32::try_from(as_u64_any(v)?).ok()
}

fn as_u16_any(v: &Value) -> Option<u16> {
    u16::try_from(as_u64_any(v)?).ok()
}

fn as_i32_any(v: &Value) -> Option<i32> {
    let n = match v.as_i64() {
        Some(n) => n,
        None => v.as_str()?.trim().parse::<i64>().ok()?,
    };
    i32::try_from(n).ok()
}

fn as_flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}
