use std::collections::HashMap;

use crate::model::{ParticipantId, Player, PlayerId, PlayerRef};

/// Player lookup keyed the way goal/card sheets name players: by club plus
/// either a linked id or a typed-in full name.
#[derive(Debug, Default)]
pub struct Roster<'a> {
    by_id: HashMap<PlayerId, &'a Player>,
    by_name: HashMap<(ParticipantId, String), PlayerId>,
}

impl<'a> Roster<'a> {
    pub fn new(players: &'a [Player]) -> Self {
        let mut roster = Roster::default();
        for p in players {
            roster.by_id.entry(p.id).or_insert(p);
            let Some(club) = p.club else { continue };
            let key = normalize_name(&p.full_name());
            if key.is_empty() {
                continue;
            }
            // Homonyms on one squad: the first registered player keeps the name.
            roster.by_name.entry((club, key)).or_insert(p.id);
        }
        roster
    }

    pub fn player(&self, id: PlayerId) -> Option<&'a Player> {
        self.by_id.get(&id).copied()
    }

    pub fn players_of(&self, club: ParticipantId) -> impl Iterator<Item = &'a Player> + '_ {
        self.by_id.values().copied().filter(move |p| p.club == Some(club))
    }

    /// Resolve a reference against `club`'s squad. Linked players on another
    /// squad (or unknown ids) do not resolve.
    pub fn resolve(&self, club: ParticipantId, player: &PlayerRef) -> Option<PlayerId> {
        match player {
            PlayerRef::Linked(id) => self
                .by_id
                .get(id)
                .filter(|p| p.club == Some(club))
                .map(|p| p.id),
            PlayerRef::FreeText(raw) => {
                let key = normalize_name(raw);
                if key.is_empty() {
                    return None;
                }
                self.by_name.get(&(club, key)).copied()
            }
        }
    }
}

pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
