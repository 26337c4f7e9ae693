//! Integration tests for live scoring: point entries, corrections, match states.

use uuid::Uuid;
use winter_cup::logic::{
    assign_scorekeeper, correct_athlete_total, override_score, reopen_match, score_audit,
    MAX_SCORE,
};
use winter_cup::{
    finish_match, record_points, start_match, tally, Athlete, Capability, GameMatch, Group,
    MatchStatus, MemoryStore, NewMatch, Role, Store, Team, TournamentError,
};

struct Fixture {
    store: MemoryStore,
    game: GameMatch,
    home_players: Vec<Athlete>,
    away_players: Vec<Athlete>,
}

fn admin() -> Capability {
    Capability {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    }
}

fn scorekeeper() -> Capability {
    Capability {
        user_id: Uuid::new_v4(),
        role: Role::Scorekeeper,
    }
}

fn fixture() -> Fixture {
    let store = MemoryStore::default();
    let home = store.insert_team(Team::new("Leoni", Some(Group::A))).unwrap();
    let away = store.insert_team(Team::new("Tigri", Some(Group::A))).unwrap();
    let home_players = ["4", "00"]
        .iter()
        .map(|n| store.insert_athlete(Athlete::new(home.id, *n, "Casa", *n)).unwrap())
        .collect();
    let away_players = ["7"]
        .iter()
        .map(|n| store.insert_athlete(Athlete::new(away.id, *n, "Ospite", *n)).unwrap())
        .collect();
    let game = store
        .insert_match(NewMatch::group_stage(home.id, away.id, Group::A))
        .unwrap();
    Fixture {
        store,
        game,
        home_players,
        away_players,
    }
}

#[test]
fn match_goes_scheduled_live_finished() {
    let f = fixture();
    let cap = scorekeeper();
    assert_eq!(f.game.status(), MatchStatus::Scheduled);

    let live = start_match(&f.store, &cap, f.game.id).unwrap();
    assert_eq!(live.status(), MatchStatus::Live);
    assert!(live.is_live);
    // Starting again is harmless.
    assert_eq!(start_match(&f.store, &cap, f.game.id).unwrap().status(), MatchStatus::Live);

    record_points(&f.store, &cap, f.game.id, f.home_players[0].id, 3).unwrap();
    record_points(&f.store, &cap, f.game.id, f.home_players[1].id, 2).unwrap();
    record_points(&f.store, &cap, f.game.id, f.away_players[0].id, 1).unwrap();

    let finished = finish_match(&f.store, &cap, f.game.id).unwrap();
    assert_eq!(finished.status(), MatchStatus::Finished);
    assert_eq!(finished.home_score, Some(5));
    assert_eq!(finished.away_score, Some(1));
    assert!(!finished.is_live);
    assert_eq!(
        finish_match(&f.store, &cap, f.game.id),
        Err(TournamentError::MatchAlreadyFinished)
    );
    assert_eq!(
        record_points(&f.store, &cap, f.game.id, f.home_players[0].id, 2),
        Err(TournamentError::MatchAlreadyFinished)
    );
}

#[test]
fn athlete_total_is_sum_of_entries() {
    let f = fixture();
    let cap = admin();
    start_match(&f.store, &cap, f.game.id).unwrap();
    let shooter = f.home_players[0].id;
    for points in [2, 3, 1, 2] {
        record_points(&f.store, &cap, f.game.id, shooter, points).unwrap();
    }
    let t = tally(&f.store, f.game.id).unwrap();
    assert_eq!(t.athlete_points(shooter), 8);
    assert_eq!(t.home_total, 8);
    assert_eq!(t.away_total, 0);
    assert_eq!(f.store.point_entries(f.game.id).unwrap().len(), 4);
    assert_eq!(t.athletes[0].number, "4");
}

#[test]
fn scoring_actions_are_one_to_three_points() {
    let f = fixture();
    let cap = admin();
    start_match(&f.store, &cap, f.game.id).unwrap();
    for bad in [0, 4, 10] {
        assert_eq!(
            record_points(&f.store, &cap, f.game.id, f.home_players[0].id, bad),
            Err(TournamentError::InvalidPoints(bad))
        );
    }
}

#[test]
fn points_need_a_live_match_and_a_player_of_it() {
    let f = fixture();
    let cap = admin();
    assert_eq!(
        record_points(&f.store, &cap, f.game.id, f.home_players[0].id, 2),
        Err(TournamentError::MatchNotLive)
    );
    start_match(&f.store, &cap, f.game.id).unwrap();

    let outsider_team = f.store.insert_team(Team::new("Orsi", Some(Group::B))).unwrap();
    let outsider = f
        .store
        .insert_athlete(Athlete::new(outsider_team.id, "9", "Fuori", "Gioco"))
        .unwrap();
    assert_eq!(
        record_points(&f.store, &cap, f.game.id, outsider.id, 2),
        Err(TournamentError::AthleteNotInMatch(outsider.id))
    );
    let missing = Uuid::new_v4();
    assert_eq!(
        record_points(&f.store, &cap, f.game.id, missing, 2),
        Err(TournamentError::AthleteNotFound(missing))
    );
}

#[test]
fn correction_leaves_exactly_one_entry() {
    let f = fixture();
    let cap = scorekeeper();
    start_match(&f.store, &cap, f.game.id).unwrap();
    let corrected = f.home_players[0].id;
    let untouched = f.home_players[1].id;
    for points in [2, 2, 3] {
        record_points(&f.store, &cap, f.game.id, corrected, points).unwrap();
    }
    record_points(&f.store, &cap, f.game.id, untouched, 1).unwrap();
    record_points(&f.store, &cap, f.game.id, untouched, 1).unwrap();

    correct_athlete_total(&f.store, &cap, f.game.id, corrected, 5).unwrap();

    let entries = f.store.point_entries(f.game.id).unwrap();
    let mine: Vec<_> = entries.iter().filter(|e| e.athlete_id == corrected).collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].points, 5);
    assert_eq!(entries.iter().filter(|e| e.athlete_id == untouched).count(), 2);

    let t = tally(&f.store, f.game.id).unwrap();
    assert_eq!(t.athlete_points(corrected), 5);
    assert_eq!(t.home_total, 7);
}

#[test]
fn scorekeepers_only_score_their_matches() {
    let f = fixture();
    let assigned = scorekeeper();
    let other = scorekeeper();
    assign_scorekeeper(&f.store, &admin(), f.game.id, Some(assigned.user_id)).unwrap();

    assert_eq!(
        start_match(&f.store, &other, f.game.id),
        Err(TournamentError::Forbidden)
    );
    start_match(&f.store, &assigned, f.game.id).unwrap();

    let team_user = Capability {
        user_id: Uuid::new_v4(),
        role: Role::Team {
            team_id: f.game.home_team_id,
        },
    };
    assert_eq!(
        record_points(&f.store, &team_user, f.game.id, f.home_players[0].id, 2),
        Err(TournamentError::Forbidden)
    );
    assert_eq!(
        assign_scorekeeper(&f.store, &assigned, f.game.id, None),
        Err(TournamentError::Forbidden)
    );
}

#[test]
fn override_is_admin_only_and_shows_in_audit() {
    let f = fixture();
    let cap = admin();
    start_match(&f.store, &cap, f.game.id).unwrap();
    record_points(&f.store, &cap, f.game.id, f.home_players[0].id, 3).unwrap();
    finish_match(&f.store, &cap, f.game.id).unwrap();
    assert_eq!(score_audit(&f.store, f.game.id).unwrap(), None);

    assert_eq!(
        override_score(&f.store, &scorekeeper(), f.game.id, 20, 0),
        Err(TournamentError::Forbidden)
    );
    let game = override_score(&f.store, &cap, f.game.id, 20, 18).unwrap();
    assert_eq!((game.home_score, game.away_score), (Some(20), Some(18)));

    let gap = score_audit(&f.store, f.game.id).unwrap().unwrap();
    assert_eq!(gap.recorded, (20, 18));
    assert_eq!(gap.from_entries, (3, 0));
}

#[test]
fn reopened_match_is_scheduled_again() {
    let f = fixture();
    let cap = admin();
    override_score(&f.store, &cap, f.game.id, 40, 30).unwrap();
    let game = reopen_match(&f.store, &cap, f.game.id).unwrap();
    assert_eq!(game.status(), MatchStatus::Scheduled);
    assert_eq!(game.home_score, None);
    assert_eq!(
        reopen_match(&f.store, &scorekeeper(), f.game.id),
        Err(TournamentError::Forbidden)
    );
}

#[test]
fn unknown_match_is_reported() {
    let f = fixture();
    let id = Uuid::new_v4();
    assert_eq!(
        start_match(&f.store, &admin(), id),
        Err(TournamentError::MatchNotFound(id))
    );
}

#[test]
fn out_of_range_scores_are_rejected() {
    let f = fixture();
    let cap = admin();

    assert_eq!(
        override_score(&f.store, &cap, f.game.id, u32::MAX, 0),
        Err(TournamentError::InvalidScore(u32::MAX))
    );
    assert_eq!(
        override_score(&f.store, &cap, f.game.id, 40, MAX_SCORE + 1),
        Err(TournamentError::InvalidScore(MAX_SCORE + 1))
    );
    assert!(!f.store.game(f.game.id).unwrap().is_played());

    let athlete = f.home_players[0].id;
    assert_eq!(
        correct_athlete_total(&f.store, &cap, f.game.id, athlete, MAX_SCORE + 1),
        Err(TournamentError::InvalidScore(MAX_SCORE + 1))
    );
    assert!(f.store.point_entries(f.game.id).unwrap().is_empty());

    let game = override_score(&f.store, &cap, f.game.id, MAX_SCORE, 0).unwrap();
    assert_eq!(game.home_score, Some(MAX_SCORE));
    correct_athlete_total(&f.store, &cap, f.game.id, athlete, MAX_SCORE).unwrap();
    assert_eq!(tally(&f.store, f.game.id).unwrap().home_total, MAX_SCORE);
}
