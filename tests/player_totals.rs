use league_standings::model::{
    CardColor, DisciplinaryEvent, Participant, Player, PlayerRef, ScoringEvent,
};
use league_standings::player_totals::{
    assist_leaders, compute_player_totals, rank_player_totals, top_scorers,
};

fn player(id: u32, club: u32, first: &str, last: &str) -> Player {
    Player {
        id,
        club: Some(club),
        first_name: first.to_string(),
        last_name: last.to_string(),
        name: None,
    }
}

fn squad() -> Vec<Player> {
    vec![
        player(10, 1, "Naby", "Keita"),
        player(11, 1, "Serhou", "Guirassy"),
        player(12, 1, "Amadou", "Diawara"),
        player(20, 2, "Sadio", "Mane"),
    ]
}

fn goal(club: u32, scorer: Option<PlayerRef>, assist: Option<PlayerRef>) -> ScoringEvent {
    ScoringEvent {
        match_id: 1,
        club,
        scorer,
        assist,
        minute: None,
        is_penalty: false,
        is_own_goal: false,
    }
}

fn card(club: u32, player: Option<PlayerRef>, color: CardColor) -> DisciplinaryEvent {
    DisciplinaryEvent {
        match_id: 1,
        club,
        player,
        minute: None,
        color,
    }
}

fn linked(id: u32) -> Option<PlayerRef> {
    Some(PlayerRef::Linked(id))
}

fn named(name: &str) -> Option<PlayerRef> {
    Some(PlayerRef::FreeText(name.to_string()))
}

#[test]
fn every_squad_member_gets_a_row() {
    let players = squad();
    let totals = compute_player_totals(&Participant::new(1, "Club"), &[], &[], &players);
    assert_eq!(totals.keys().copied().collect::<Vec<_>>(), vec![10, 11, 12]);
    assert!(totals.values().all(|r| r.goals == 0 && r.assists == 0));
    assert_eq!(totals[&11].name, "Serhou Guirassy");
}

#[test]
fn goals_and_assists_are_credited() {
    let players = squad();
    let goals = vec![
        goal(1, linked(11), linked(10)),
        goal(1, named("serhou   GUIRASSY"), named("Amadou Diawara")),
        goal(1, linked(10), None),
    ];
    let totals = compute_player_totals(&Participant::new(1, "Club"), &goals, &[], &players);
    assert_eq!((totals[&11].goals, totals[&11].assists), (2, 0));
    assert_eq!((totals[&10].goals, totals[&10].assists), (1, 1));
    assert_eq!((totals[&12].goals, totals[&12].assists), (0, 1));
}

#[test]
fn own_goal_keeps_the_assist() {
    let players = squad();
    let mut og = goal(1, linked(11), linked(10));
    og.is_own_goal = true;
    let totals = compute_player_totals(&Participant::new(1, "Club"), &[og], &[], &players);
    assert_eq!(totals[&11].goals, 0);
    assert_eq!(totals[&10].assists, 1);
}

#[test]
fn self_assist_is_not_counted() {
    let players = squad();
    let goals = vec![
        goal(1, linked(10), linked(10)),
        goal(1, linked(10), named("Naby Keita")),
    ];
    let totals = compute_player_totals(&Participant::new(1, "Club"), &goals, &[], &players);
    assert_eq!(totals[&10].goals, 2);
    assert_eq!(totals[&10].assists, 0);
}

#[test]
fn unresolved_and_foreign_players_count_for_nobody() {
    let players = squad();
    let goals = vec![
        goal(1, named("Nobody Known"), None),
        goal(1, None, linked(12)),
        // Mane is linked but plays for club 2.
        goal(1, linked(20), None),
        goal(2, linked(20), None),
    ];
    let totals = compute_player_totals(&Participant::new(1, "Club"), &goals, &[], &players);
    assert_eq!(totals.len(), 3);
    assert_eq!(totals.values().map(|r| r.goals).sum::<u32>(), 0);
    assert_eq!(totals[&12].assists, 1);
    assert!(!totals.contains_key(&20));
}

#[test]
fn cards_split_by_color() {
    let players = squad();
    let cards = vec![
        card(1, linked(12), CardColor::Yellow),
        card(1, named("amadou diawara"), CardColor::Yellow),
        card(1, linked(12), CardColor::from_code("")),
        card(1, linked(10), CardColor::from_code("RED")),
        card(1, None, CardColor::Red),
        card(2, linked(20), CardColor::Red),
    ];
    let totals = compute_player_totals(&Participant::new(1, "Club"), &[], &cards, &players);
    assert_eq!((totals[&12].yellow_cards, totals[&12].red_cards), (3, 0));
    assert_eq!((totals[&10].yellow_cards, totals[&10].red_cards), (0, 1));
    assert_eq!(totals[&11].red_cards, 0);
}

#[test]
fn ranking_orders_by_goals_then_assists_then_name() {
    let players = squad();
    let goals = vec![
        goal(1, linked(12), linked(10)),
        goal(1, linked(11), None),
    ];
    let totals = compute_player_totals(&Participant::new(1, "Club"), &goals, &[], &players);
    let ranked = rank_player_totals(&totals);
    let ids: Vec<u32> = ranked.iter().map(|r| r.player_id).collect();
    // Diawara and Guirassy tie on goals and assists; name decides.
    assert_eq!(ids, vec![12, 11, 10]);
}

#[test]
fn leaders_span_clubs_and_respect_limit() {
    let players = squad();
    let mut og = goal(2, linked(20), None);
    og.is_own_goal = true;
    let goals = vec![
        goal(1, linked(11), linked(10)),
        goal(1, linked(11), linked(10)),
        goal(2, named("Sadio Mane"), None),
        goal(1, linked(12), linked(12)),
        og,
    ];
    let scorers = top_scorers(&goals, &players, 0);
    let summary: Vec<(u32, u32)> = scorers.iter().map(|r| (r.player_id, r.count)).collect();
    assert_eq!(summary, vec![(11, 2), (12, 1), (20, 1)]);
    assert_eq!(scorers[2].club, Some(2));

    assert_eq!(top_scorers(&goals, &players, 1).len(), 1);

    let assists = assist_leaders(&goals, &players, 5);
    assert_eq!(assists.len(), 1);
    assert_eq!((assists[0].player_id, assists[0].count), (10, 2));
}
