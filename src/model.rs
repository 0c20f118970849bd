use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

pub type ParticipantId = u32;
pub type PlayerId = u32;
pub type MatchId = u64;

/// A club, or a competition-scoped team entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            logo: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Halftime,
    Finished,
    Postponed,
    Cancelled,
    Suspended,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 7] = [
        MatchStatus::Scheduled,
        MatchStatus::Live,
        MatchStatus::Halftime,
        MatchStatus::Finished,
        MatchStatus::Postponed,
        MatchStatus::Cancelled,
        MatchStatus::Suspended,
    ];

    /// Accepts the canonical codes plus the short forms found in match feeds
    /// (`FT`, `HT`, `PAUSED`, `CANCELED`).
    pub fn from_code(raw: &str) -> Option<Self> {
        let code = raw.trim().to_ascii_uppercase();
        let status = match code.as_str() {
            "SCHEDULED" => MatchStatus::Scheduled,
            "LIVE" => MatchStatus::Live,
            "HT" | "HALFTIME" | "PAUSED" => MatchStatus::Halftime,
            "FT" | "FINISHED" => MatchStatus::Finished,
            "POSTPONED" => MatchStatus::Postponed,
            "CANCELLED" | "CANCELED" => MatchStatus::Cancelled,
            "SUSPENDED" => MatchStatus::Suspended,
            _ => return None,
        };
        Some(status)
    }

    pub fn code(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::Live => "LIVE",
            MatchStatus::Halftime => "HALFTIME",
            MatchStatus::Finished => "FINISHED",
            MatchStatus::Postponed => "POSTPONED",
            MatchStatus::Cancelled => "CANCELLED",
            MatchStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn is_in_progress(self) -> bool {
        matches!(self, MatchStatus::Live | MatchStatus::Halftime)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MatchStatus {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MatchStatus::from_code(s).ok_or_else(|| RecordError::UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for MatchStatus {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchStatus> for String {
    fn from(value: MatchStatus) -> Self {
        value.code().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: MatchId,
    pub home: ParticipantId,
    pub away: ParticipantId,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    pub status: MatchStatus,
    pub kickoff: DateTime<Utc>,
}

impl MatchResult {
    pub fn score(&self) -> Option<(u32, u32)> {
        Some((self.home_score?, self.away_score?))
    }
}

/// How an event names a player: a linked identity, or whatever was typed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerRef {
    Linked(PlayerId),
    FreeText(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub club: Option<ParticipantId>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Display name when the source keeps a single name field.
    #[serde(default)]
    pub name: Option<String>,
}

impl Player {
    pub fn full_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim)
            && !name.is_empty()
        {
            return name.to_string();
        }
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn display_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() {
            format!("Player #{}", self.id)
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringEvent {
    pub match_id: MatchId,
    /// Club credited with the goal.
    pub club: ParticipantId,
    #[serde(default)]
    pub scorer: Option<PlayerRef>,
    #[serde(default)]
    pub assist: Option<PlayerRef>,
    #[serde(default)]
    pub minute: Option<u16>,
    #[serde(default)]
    pub is_penalty: bool,
    #[serde(default)]
    pub is_own_goal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardColor {
    Yellow,
    Red,
}

impl CardColor {
    /// Anything that does not start with `R` is read as yellow.
    pub fn from_code(raw: &str) -> Self {
        if raw.trim().to_ascii_uppercase().starts_with('R') {
            CardColor::Red
        } else {
            CardColor::Yellow
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            CardColor::Yellow => "Y",
            CardColor::Red => "R",
        }
    }
}

impl From<String> for CardColor {
    fn from(value: String) -> Self {
        CardColor::from_code(&value)
    }
}

impl From<CardColor> for String {
    fn from(value: CardColor) -> Self {
        value.code().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplinaryEvent {
    pub match_id: MatchId,
    pub club: ParticipantId,
    #[serde(default)]
    pub player: Option<PlayerRef>,
    #[serde(default)]
    pub minute: Option<u16>,
    pub color: CardColor,
}

/// Administrative points sanction (negative) or bonus (positive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAdjustment {
    pub participant: ParticipantId,
    pub points: i32,
    #[serde(default)]
    pub reason: String,
}

pub fn penalty_map(adjustments: &[PointsAdjustment]) -> HashMap<ParticipantId, i32> {
    let mut out: HashMap<ParticipantId, i32> = HashMap::new();
    for adj in adjustments {
        let total = out.entry(adj.participant).or_insert(0);
        *total = total.saturating_add(adj.points);
    }
    out
}

pub fn parse_kickoff(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}
