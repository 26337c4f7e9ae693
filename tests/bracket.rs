//! Integration tests for the finals bracket: pairing, lazy creation, ranking.

use std::collections::HashSet;
use std::sync::Arc;
use winter_cup::{
    build_view, derive_finals, group_standings, FinalType, FinalsBracket, GameMatch, Group,
    MatchGroup, MemoryStore, NewMatch, Phase, Standing, Store, StoreOptions, Team, TeamId,
};

/// One group of `per_group` teams named A1.., B1..; team i beats team j when i < j.
fn group(store: &MemoryStore, group: Group, per_group: usize) -> Vec<Team> {
    (1..=per_group)
        .map(|i| {
            store
                .insert_team(Team::new(format!("{}{}", group, i), Some(group)))
                .unwrap()
        })
        .collect()
}

fn set_score(store: &MemoryStore, mut game: GameMatch, home: u32, away: u32) -> GameMatch {
    game.home_score = Some(home);
    game.away_score = Some(away);
    store.update_match(&game).unwrap();
    game
}

fn play_group(store: &MemoryStore, teams: &[Team], group: Group) {
    for i in 0..teams.len() {
        for j in i + 1..teams.len() {
            let game = store
                .insert_match(NewMatch::group_stage(teams[i].id, teams[j].id, group))
                .unwrap();
            set_score(store, game, 60, 40 + i as u32);
        }
    }
}

fn standings(store: &MemoryStore, group: Group) -> Vec<Standing> {
    group_standings(group, &store.teams().unwrap(), &store.matches().unwrap())
}

fn derive(store: &MemoryStore) -> FinalsBracket {
    build_view(store).unwrap().finals
}

fn finals(store: &MemoryStore) -> Vec<GameMatch> {
    store
        .matches()
        .unwrap()
        .into_iter()
        .filter(|m| m.is_final())
        .collect()
}

fn complete_tournament(store: &MemoryStore, per_group: usize) -> (Vec<Team>, Vec<Team>) {
    let a = group(store, Group::A, per_group);
    let b = group(store, Group::B, per_group);
    play_group(store, &a, Group::A);
    play_group(store, &b, Group::B);
    (a, b)
}

fn ranking_ids(bracket: &FinalsBracket) -> Vec<TeamId> {
    bracket.ranking.iter().map(|p| p.team_id).collect()
}

#[test]
fn two_team_groups_end_to_end() {
    let store = MemoryStore::default();
    let (a, b) = complete_tournament(&store, 2);

    let bracket = derive(&store);
    assert!(bracket.groups_complete);
    let first = bracket.tiers[0].game.clone().expect("1-2 match created");
    assert_eq!(first.final_type, Some(FinalType::First));
    assert!(first.pairs(a[0].id, b[0].id));
    let third = bracket.tiers[1].game.clone().expect("3-4 match created");
    assert_eq!(third.final_type, Some(FinalType::Third));
    assert!(third.pairs(a[1].id, b[1].id));
    assert!(bracket.tiers[2].game.is_none());
    assert!(bracket.tiers[3].game.is_none());

    // A1 beats B1, B2 beats A2.
    set_score(&store, first, 60, 50);
    set_score(&store, third, 40, 55);

    let bracket = derive(&store);
    assert_eq!(ranking_ids(&bracket), vec![a[0].id, b[0].id, b[1].id, a[1].id]);
    assert!(bracket.ranking.iter().all(|p| p.decided));
    assert_eq!(
        bracket.ranking.iter().map(|p| p.rank).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn full_results_rank_winner_above_loser_in_every_tier() {
    let store = MemoryStore::default();
    complete_tournament(&store, 4);

    let bracket = derive(&store);
    for (i, tier) in bracket.tiers.iter().enumerate() {
        let game = tier.game.clone().unwrap();
        // Home wins the odd tiers, away the even ones.
        if i % 2 == 0 {
            set_score(&store, game, 70, 60);
        } else {
            set_score(&store, game, 60, 70);
        }
    }

    let bracket = derive(&store);
    assert_eq!(bracket.ranking.len(), 8);
    let distinct: HashSet<TeamId> = ranking_ids(&bracket).into_iter().collect();
    assert_eq!(distinct.len(), 8);

    for tier in &bracket.tiers {
        let (winner, loser) = tier.outcome().unwrap();
        let p = tier.final_type.position();
        let at = |rank: usize| bracket.ranking.iter().find(|r| r.rank == rank).unwrap().team_id;
        assert_eq!(at(2 * p - 1), winner);
        assert_eq!(at(2 * p), loser);
    }
}

#[test]
fn unplayed_tiers_are_provisional_in_group_order() {
    let store = MemoryStore::default();
    let (a, b) = complete_tournament(&store, 4);

    let bracket = derive(&store);
    assert_eq!(bracket.ranking.len(), 8);
    assert!(bracket.ranking.iter().all(|p| !p.decided));
    assert_eq!(
        ranking_ids(&bracket),
        vec![a[0].id, b[0].id, a[1].id, b[1].id, a[2].id, b[2].id, a[3].id, b[3].id]
    );
}

#[test]
fn deriving_twice_creates_each_final_once() {
    let store = MemoryStore::default();
    complete_tournament(&store, 4);

    let first = derive(&store);
    let created: Vec<_> = finals(&store).into_iter().map(|m| m.id).collect();
    assert_eq!(created.len(), 4);

    let second = derive(&store);
    assert_eq!(finals(&store).len(), 4);
    for (x, y) in first.tiers.iter().zip(second.tiers.iter()) {
        assert_eq!(x.game.as_ref().map(|g| g.id), y.game.as_ref().map(|g| g.id));
    }
}

#[test]
fn nothing_is_created_or_ranked_before_groups_finish() {
    let store = MemoryStore::default();
    let a = group(&store, Group::A, 2);
    let b = group(&store, Group::B, 2);
    play_group(&store, &a, Group::A);
    // Group B has its match scheduled but not played.
    store
        .insert_match(NewMatch::group_stage(b[0].id, b[1].id, Group::B))
        .unwrap();

    // A finals match with a score already exists.
    let early = store
        .insert_match(NewMatch::finals(a[0].id, b[0].id, FinalType::First))
        .unwrap();
    set_score(&store, early, 50, 30);

    let bracket = derive(&store);
    assert!(!bracket.groups_complete);
    assert!(bracket.ranking.is_empty());
    assert_eq!(finals(&store).len(), 1);
}

#[test]
fn existing_final_in_reverse_order_is_reused() {
    let store = MemoryStore::default();
    let (a, b) = complete_tournament(&store, 4);
    let existing = store
        .insert_match(NewMatch::finals(b[0].id, a[0].id, FinalType::First))
        .unwrap();

    let bracket = derive(&store);
    assert_eq!(bracket.tiers[0].game.as_ref().unwrap().id, existing.id);
    assert_eq!(finals(&store).len(), 4);
}

#[test]
fn untagged_final_gets_its_tier() {
    let store = MemoryStore::default();
    let (a, b) = complete_tournament(&store, 4);
    let mut untagged = NewMatch::finals(a[1].id, b[1].id, FinalType::Third);
    untagged.final_type = None;
    let untagged = store.insert_match(untagged).unwrap();

    let bracket = derive(&store);
    let tier = &bracket.tiers[1];
    assert_eq!(tier.game.as_ref().unwrap().id, untagged.id);
    assert_eq!(store.game(untagged.id).unwrap().final_type, Some(FinalType::Third));
}

#[test]
fn null_group_rejection_falls_back_to_sentinel() {
    let store = MemoryStore::new(StoreOptions {
        reject_null_group: true,
    });
    complete_tournament(&store, 2);

    let bracket = derive(&store);
    let game = bracket.tiers[0].game.as_ref().unwrap();
    assert_eq!(game.group, Some(MatchGroup::Finals));
    assert_eq!(game.phase, Phase::Finali);
    assert_eq!(finals(&store).len(), 2);
}

#[test]
fn concurrent_readers_do_not_duplicate_finals() {
    let store = Arc::new(MemoryStore::default());
    complete_tournament(&store, 4);
    let a = standings(&store, Group::A);
    let b = standings(&store, Group::B);

    let brackets: Vec<FinalsBracket> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let (a, b) = (a.clone(), b.clone());
                s.spawn(move || derive_finals(&*store, &a, &b, true).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let all = finals(&store);
    assert_eq!(all.len(), 4);
    for final_type in FinalType::ALL {
        assert_eq!(all.iter().filter(|m| m.final_type == Some(final_type)).count(), 1);
    }
    for bracket in &brackets {
        assert!(bracket.tiers.iter().all(|t| t.game.is_some()));
    }
}

#[test]
fn failed_creation_leaves_placeholder_until_next_read() {
    let store = MemoryStore::default();
    complete_tournament(&store, 4);

    store.set_read_only(true);
    let bracket = derive(&store);
    assert!(bracket.tiers.iter().all(|t| t.game.is_none()));
    assert!(bracket.tiers.iter().all(|t| t.team_a.is_some() && t.team_b.is_some()));
    assert_eq!(bracket.ranking.len(), 8);

    store.set_read_only(false);
    let bracket = derive(&store);
    assert!(bracket.tiers.iter().all(|t| t.game.is_some()));
    assert_eq!(finals(&store).len(), 4);
}

#[test]
fn short_group_leaves_tier_empty() {
    let store = MemoryStore::default();
    let a = group(&store, Group::A, 3);
    let b = group(&store, Group::B, 2);
    play_group(&store, &a, Group::A);
    play_group(&store, &b, Group::B);

    let bracket = derive(&store);
    assert!(bracket.tiers[2].team_b.is_none());
    assert!(bracket.tiers[2].game.is_none());
    // The lone third-placed team waits in the lower slot of its tier.
    let placing = bracket.ranking.iter().find(|p| p.team_id == a[2].id).unwrap();
    assert_eq!(placing.rank, 6);
    assert!(!placing.decided);
}

#[test]
fn early_final_is_not_retagged_before_groups_finish() {
    let store = MemoryStore::default();
    let a = group(&store, Group::A, 2);
    let b = group(&store, Group::B, 2);
    play_group(&store, &a, Group::A);

    let mut untagged = NewMatch::finals(a[0].id, b[0].id, FinalType::First);
    untagged.final_type = None;
    let untagged = store.insert_match(untagged).unwrap();
    let revision = store.revision();

    let bracket = derive(&store);
    assert!(!bracket.groups_complete);
    assert_eq!(bracket.tiers[0].game.as_ref().unwrap().id, untagged.id);
    assert_eq!(store.game(untagged.id).unwrap().final_type, None);
    assert_eq!(store.revision(), revision);
}
