//! Tests for the change-driven view feed.

use std::sync::Arc;
use std::time::Duration;
use winter_cup::{spawn_view_feed, Group, MemoryStore, NewMatch, Store, Team};

#[tokio::test]
async fn publishes_an_initial_view() {
    let store = Arc::new(MemoryStore::default());
    let feed = spawn_view_feed(store.clone());

    // Nothing newer than revision 0 ever arrives; the wait times out and
    // returns the first view.
    let view = feed
        .wait_newer(0, Duration::from_millis(500))
        .await
        .expect("initial view");
    assert_eq!(view.revision, 0);
    assert!(view.groups.iter().all(|g| g.standings.is_empty() && !g.complete));
    assert!(view.finals.ranking.is_empty());
}

#[tokio::test]
async fn writes_trigger_a_fresh_view() {
    let store = Arc::new(MemoryStore::default());
    let feed = spawn_view_feed(store.clone());
    let mut updates = feed.subscribe();

    store.insert_team(Team::new("Leoni", Some(Group::A))).unwrap();

    let view = feed
        .wait_newer(0, Duration::from_secs(5))
        .await
        .expect("view after write");
    assert!(view.revision >= 1);
    let group_a = view.group(Group::A).unwrap();
    assert_eq!(group_a.standings.len(), 1);
    assert_eq!(group_a.standings[0].name, "Leoni");
    assert_eq!(group_a.standings[0].position, 1);

    updates.changed().await.unwrap();
    assert!(updates.borrow().is_some());
}

#[tokio::test]
async fn latest_view_never_goes_backwards() {
    let store = Arc::new(MemoryStore::default());
    let feed = spawn_view_feed(store.clone());

    let mut last = 0;
    for i in 0..20 {
        store
            .insert_team(Team::new(format!("Squadra {}", i), Some(Group::B)))
            .unwrap();
        if let Some(view) = feed.latest() {
            assert!(view.revision >= last);
            last = view.revision;
        }
    }

    let view = feed
        .wait_newer(19, Duration::from_secs(5))
        .await
        .expect("final view");
    assert_eq!(view.revision, store.revision());
    assert_eq!(view.group(Group::B).unwrap().standings.len(), 20);
}

#[tokio::test]
async fn huge_stored_scores_do_not_stop_the_feed() {
    let store = Arc::new(MemoryStore::default());
    let feed = spawn_view_feed(store.clone());

    let teams: Vec<Team> = ["A1", "A2", "A3"]
        .into_iter()
        .map(|name| store.insert_team(Team::new(name, Some(Group::A))).unwrap())
        .collect();
    for (away, home_score) in [(1, u32::MAX), (2, 1)] {
        let mut game = store
            .insert_match(NewMatch::group_stage(teams[0].id, teams[away].id, Group::A))
            .unwrap();
        game.home_score = Some(home_score);
        game.away_score = Some(0);
        store.update_match(&game).unwrap();
    }
    store.insert_team(Team::new("B1", Some(Group::B))).unwrap();

    let target = store.revision();
    let view = feed
        .wait_newer(target - 1, Duration::from_secs(5))
        .await
        .expect("view after writes");
    assert_eq!(view.revision, target);
    let leader = &view.group(Group::A).unwrap().standings[0];
    assert_eq!(leader.name, "A1");
    assert_eq!(leader.points_for, u32::MAX);
}
