use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RecordError, SkippedRecord};
use crate::model::{MatchResult, MatchStatus, Participant, ParticipantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsOptions {
    pub points_for_win: i32,
    pub points_for_draw: i32,
    pub form_len: usize,
    pub suspended_counts_as_live: bool,
    /// With `include_in_progress = false` and no finished match at all (start
    /// of season), count in-progress matches instead of returning zeros.
    pub widen_when_no_finished: bool,
}

impl Default for StandingsOptions {
    fn default() -> Self {
        Self {
            points_for_win: 3,
            points_for_draw: 1,
            form_len: 5,
            suspended_counts_as_live: false,
            widen_when_no_finished: true,
        }
    }
}

impl StandingsOptions {
    pub fn counts_as_live(&self, status: MatchStatus) -> bool {
        status.is_in_progress() || (self.suspended_counts_as_live && status == MatchStatus::Suspended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusScope {
    FinishedOnly,
    FinishedAndInProgress,
}

impl StatusScope {
    pub fn admits(self, status: MatchStatus, opts: &StandingsOptions) -> bool {
        match self {
            StatusScope::FinishedOnly => status == MatchStatus::Finished,
            StatusScope::FinishedAndInProgress => {
                status == MatchStatus::Finished || opts.counts_as_live(status)
            }
        }
    }
}

/// Pick the statuses that count. Returns the scope and whether the
/// empty-season fallback widened it.
pub fn resolve_status_scope(
    matches: &[MatchResult],
    include_in_progress: bool,
    opts: &StandingsOptions,
) -> (StatusScope, bool) {
    if include_in_progress {
        return (StatusScope::FinishedAndInProgress, false);
    }
    let any_finished = matches.iter().any(|m| m.status == MatchStatus::Finished);
    if !any_finished && opts.widen_when_no_finished {
        return (StatusScope::FinishedAndInProgress, true);
    }
    (StatusScope::FinishedOnly, false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormCode {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl FormCode {
    pub fn letter(self) -> char {
        match self {
            FormCode::Win => 'W',
            FormCode::Draw => 'D',
            FormCode::Loss => 'L',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub participant_id: ParticipantId,
    pub name: String,
    pub logo: Option<String>,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    /// Sortable total, adjustments included.
    pub points: i32,
    /// The raw adjustment folded into `points`.
    pub penalty_points: i32,
    /// Most recent last.
    pub form: Vec<FormCode>,
    pub position: usize,
}

impl StandingsRow {
    fn empty(p: &Participant) -> Self {
        Self {
            participant_id: p.id,
            name: p.name.clone(),
            logo: p.logo.clone(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
            penalty_points: 0,
            form: Vec::new(),
            position: 0,
        }
    }

    pub fn form_string(&self) -> String {
        self.form.iter().map(|f| f.letter()).collect()
    }

    fn record(&mut self, scored: u32, conceded: u32, opts: &StandingsOptions) {
        self.played += 1;
        self.goals_for = self.goals_for.saturating_add(scored);
        self.goals_against = self.goals_against.saturating_add(conceded);
        let code = match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.wins += 1;
                self.points = self.points.saturating_add(opts.points_for_win);
                FormCode::Win
            }
            Ordering::Less => {
                self.losses += 1;
                FormCode::Loss
            }
            Ordering::Equal => {
                self.draws += 1;
                self.points = self.points.saturating_add(opts.points_for_draw);
                FormCode::Draw
            }
        };
        self.form.push(code);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsTable {
    pub rows: Vec<StandingsRow>,
    pub status_scope: StatusScope,
    pub widened: bool,
    pub suspended_counts_as_live: bool,
    pub matches_counted: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl StandingsTable {
    pub fn statuses_used(&self) -> Vec<MatchStatus> {
        let mut out = vec![MatchStatus::Finished];
        if self.status_scope == StatusScope::FinishedAndInProgress {
            out.push(MatchStatus::Live);
            out.push(MatchStatus::Halftime);
            if self.suspended_counts_as_live {
                out.push(MatchStatus::Suspended);
            }
        }
        out
    }

    pub fn row(&self, participant_id: ParticipantId) -> Option<&StandingsRow> {
        self.rows.iter().find(|r| r.participant_id == participant_id)
    }
}

pub fn compute_standings(
    participants: &[Participant],
    matches: &[MatchResult],
    include_in_progress: bool,
    penalties: &HashMap<ParticipantId, i32>,
) -> StandingsTable {
    compute_standings_with(
        participants,
        matches,
        include_in_progress,
        penalties,
        &StandingsOptions::default(),
    )
}

pub fn compute_standings_with(
    participants: &[Participant],
    matches: &[MatchResult],
    include_in_progress: bool,
    penalties: &HashMap<ParticipantId, i32>,
    opts: &StandingsOptions,
) -> StandingsTable {
    let mut rows: Vec<StandingsRow> = Vec::with_capacity(participants.len());
    let mut index: HashMap<ParticipantId, usize> = HashMap::with_capacity(participants.len());
    for p in participants {
        if index.contains_key(&p.id) {
            debug!(participant = p.id, "duplicate participant ignored");
            continue;
        }
        index.insert(p.id, rows.len());
        rows.push(StandingsRow::empty(p));
    }

    let (status_scope, widened) = resolve_status_scope(matches, include_in_progress, opts);
    if widened {
        debug!("no finished match in scope, counting in-progress matches");
    }

    let mut eligible: Vec<&MatchResult> = matches
        .iter()
        .filter(|m| status_scope.admits(m.status, opts))
        .collect();
    // Form depends on chronology, not on the order the caller handed us.
    eligible.sort_by(|a, b| a.kickoff.cmp(&b.kickoff).then(a.id.cmp(&b.id)));

    let mut skipped = Vec::new();
    let mut matches_counted = 0usize;
    for m in eligible {
        match check_match(m, &index) {
            Ok((home_idx, away_idx, hs, as_)) => {
                rows[home_idx].record(hs, as_, opts);
                rows[away_idx].record(as_, hs, opts);
                matches_counted += 1;
            }
            Err(reason) => {
                debug!(match_id = m.id, %reason, "match skipped");
                skipped.push(SkippedRecord::for_match(m.id, reason));
            }
        }
    }

    for (participant, adj) in penalties {
        match index.get(participant) {
            Some(&idx) => {
                rows[idx].penalty_points = rows[idx].penalty_points.saturating_add(*adj);
                rows[idx].points = rows[idx].points.saturating_add(*adj);
            }
            None => debug!(participant, "adjustment for participant outside the table"),
        }
    }

    for row in &mut rows {
        row.goal_difference = goal_difference(row.goals_for, row.goals_against);
        let excess = row.form.len().saturating_sub(opts.form_len);
        row.form.drain(..excess);
    }

    rows.sort_by(compare_rows);
    for (idx, row) in rows.iter_mut().enumerate() {
        row.position = idx + 1;
    }

    StandingsTable {
        rows,
        status_scope,
        widened,
        suspended_counts_as_live: opts.suspended_counts_as_live,
        matches_counted,
        skipped,
    }
}

fn check_match(
    m: &MatchResult,
    index: &HashMap<ParticipantId, usize>,
) -> Result<(usize, usize, u32, u32), RecordError> {
    let (hs, as_) = validate_match(m, |id| index.contains_key(&id))?;
    let (Some(&home_idx), Some(&away_idx)) = (index.get(&m.home), index.get(&m.away)) else {
        return Err(RecordError::UnknownParticipant {
            match_id: m.id,
            participant: m.home,
        });
    };
    Ok((home_idx, away_idx, hs, as_))
}

/// The rules a match must pass to be counted: two distinct known
/// participants and a full score. Returns the score.
pub fn validate_match(
    m: &MatchResult,
    is_known: impl Fn(ParticipantId) -> bool,
) -> Result<(u32, u32), RecordError> {
    if m.home == m.away {
        return Err(RecordError::SelfPlay {
            match_id: m.id,
            participant: m.home,
        });
    }
    for participant in [m.home, m.away] {
        if !is_known(participant) {
            return Err(RecordError::UnknownParticipant {
                match_id: m.id,
                participant,
            });
        }
    }
    m.score().ok_or(RecordError::MissingScore { match_id: m.id })
}

fn goal_difference(goals_for: u32, goals_against: u32) -> i32 {
    let diff = i64::from(goals_for) - i64::from(goals_against);
    diff.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Points, goal difference, goals for (all descending), then name. The name
/// compare is case-insensitive first; exact name and id only break what is
/// left so the order never depends on input order.
pub fn compare_rows(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then(b.goal_difference.cmp(&a.goal_difference))
        .then(b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then(a.participant_id.cmp(&b.participant_id))
}
