use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{
    CardColor, DisciplinaryEvent, Participant, ParticipantId, Player, PlayerId, ScoringEvent,
};
use crate::roster::Roster;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTotalsRow {
    pub player_id: PlayerId,
    pub name: String,
    pub goals: u32,
    pub assists: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
}

impl PlayerTotalsRow {
    fn empty(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.display_name(),
            goals: 0,
            assists: 0,
            yellow_cards: 0,
            red_cards: 0,
        }
    }
}

/// Per-player goals, assists and cards for one participant's squad.
///
/// Every squad member gets a row. Events credited to other clubs are ignored,
/// and events whose player cannot be resolved count for nobody.
pub fn compute_player_totals(
    participant: &Participant,
    goals: &[ScoringEvent],
    cards: &[DisciplinaryEvent],
    known_players: &[Player],
) -> BTreeMap<PlayerId, PlayerTotalsRow> {
    let roster = Roster::new(known_players);
    let club = participant.id;
    let mut rows: BTreeMap<PlayerId, PlayerTotalsRow> = roster
        .players_of(club)
        .map(|p| (p.id, PlayerTotalsRow::empty(p)))
        .collect();

    let mut unresolved = 0usize;
    for g in goals.iter().filter(|g| g.club == club) {
        let scorer = g.scorer.as_ref().and_then(|r| roster.resolve(club, r));
        if g.scorer.is_some() && scorer.is_none() {
            unresolved += 1;
        }
        if !g.is_own_goal
            && let Some(row) = scorer.and_then(|id| rows.get_mut(&id))
        {
            row.goals += 1;
        }

        let assist = g.assist.as_ref().and_then(|r| roster.resolve(club, r));
        if g.assist.is_some() && assist.is_none() {
            unresolved += 1;
        }
        if let Some(assist_id) = assist
            && Some(assist_id) != scorer
            && let Some(row) = rows.get_mut(&assist_id)
        {
            row.assists += 1;
        }
    }

    for c in cards.iter().filter(|c| c.club == club) {
        let Some(row) = c
            .player
            .as_ref()
            .and_then(|r| roster.resolve(club, r))
            .and_then(|id| rows.get_mut(&id))
        else {
            unresolved += 1;
            continue;
        };
        match c.color {
            CardColor::Red => row.red_cards += 1,
            CardColor::Yellow => row.yellow_cards += 1,
        }
    }

    if unresolved > 0 {
        debug!(club, unresolved, "events without a resolvable player");
    }
    rows
}

/// Squad listing order: goals, then assists (both descending), then name.
pub fn rank_player_totals(totals: &BTreeMap<PlayerId, PlayerTotalsRow>) -> Vec<PlayerTotalsRow> {
    let mut out: Vec<PlayerTotalsRow> = totals.values().cloned().collect();
    out.sort_by(|a, b| {
        b.goals
            .cmp(&a.goals)
            .then(b.assists.cmp(&a.assists))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then(a.player_id.cmp(&b.player_id))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderRow {
    pub player_id: PlayerId,
    pub name: String,
    pub club: Option<ParticipantId>,
    pub count: u32,
}

/// League-wide scorers. Own goals never count; names resolve against the
/// scoring club's squad.
pub fn top_scorers(goals: &[ScoringEvent], players: &[Player], limit: usize) -> Vec<LeaderRow> {
    let roster = Roster::new(players);
    let mut counts: HashMap<PlayerId, u32> = HashMap::new();
    for g in goals.iter().filter(|g| !g.is_own_goal) {
        if let Some(id) = g.scorer.as_ref().and_then(|r| roster.resolve(g.club, r)) {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    leader_rows(&roster, counts, limit)
}

/// League-wide assist providers; an assist credited to the scorer is dropped.
pub fn assist_leaders(goals: &[ScoringEvent], players: &[Player], limit: usize) -> Vec<LeaderRow> {
    let roster = Roster::new(players);
    let mut counts: HashMap<PlayerId, u32> = HashMap::new();
    for g in goals {
        let Some(assist) = g.assist.as_ref().and_then(|r| roster.resolve(g.club, r)) else {
            continue;
        };
        let scorer = g.scorer.as_ref().and_then(|r| roster.resolve(g.club, r));
        if scorer == Some(assist) {
            continue;
        }
        *counts.entry(assist).or_insert(0) += 1;
    }
    leader_rows(&roster, counts, limit)
}

fn leader_rows(roster: &Roster<'_>, counts: HashMap<PlayerId, u32>, limit: usize) -> Vec<LeaderRow> {
    let mut rows: Vec<LeaderRow> = counts
        .into_iter()
        .filter_map(|(id, count)| {
            let p = roster.player(id)?;
            Some(LeaderRow {
                player_id: id,
                name: p.display_name(),
                club: p.club,
                count,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then(a.player_id.cmp(&b.player_id))
    });
    if limit > 0 {
        rows.truncate(limit);
    }
    rows
}
