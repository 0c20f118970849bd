//! League standings and player statistics computed from match results.
//!
//! The core (`standings`, `player_totals`) is pure: it takes already-scoped
//! participants, matches and events and recomputes everything on each call.
//! `snapshot` and `store` feed it, `export` renders what it returns.

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod player_totals;
pub mod roster;
pub mod snapshot;
pub mod standings;
pub mod store;

pub use error::{RecordError, SkippedRecord};
pub use model::{
    CardColor, DisciplinaryEvent, MatchId, MatchResult, MatchStatus, Participant, ParticipantId,
    Player, PlayerId, PlayerRef, PointsAdjustment, ScoringEvent,
};
pub use player_totals::{PlayerTotalsRow, compute_player_totals};
pub use standings::{
    FormCode, StandingsOptions, StandingsRow, StandingsTable, compute_standings,
    compute_standings_with,
};
