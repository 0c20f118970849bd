use serde::Serialize;
use thiserror::Error;

use crate::model::{MatchId, ParticipantId};

/// Why a single input record was left out of an aggregation.
///
/// None of these abort a computation; they are collected next to the output so
/// callers can surface "n records ignored" without losing the table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("match {match_id}: home and away are the same participant ({participant})")]
    SelfPlay {
        match_id: MatchId,
        participant: ParticipantId,
    },

    #[error("match {match_id}: participant {participant} is not part of this table")]
    UnknownParticipant {
        match_id: MatchId,
        participant: ParticipantId,
    },

    #[error("match {match_id}: score is missing")]
    MissingScore { match_id: MatchId },

    #[error("unknown match status {0:?}")]
    UnknownStatus(String),

    #[error("invalid kickoff timestamp {0:?}")]
    InvalidKickoff(String),

    #[error("missing or malformed field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub match_id: Option<MatchId>,
    pub reason: RecordError,
}

impl SkippedRecord {
    pub fn for_match(match_id: MatchId, reason: RecordError) -> Self {
        Self {
            match_id: Some(match_id),
            reason,
        }
    }
}
