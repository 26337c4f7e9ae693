//! Group stage ("gironi"): group draw and round-robin schedule.

use crate::models::{Capability, GameMatch, Group, NewMatch, Team, TeamId, TournamentError};
use crate::store::{Store, StoreError};
use rand::seq::SliceRandom;

/// Assign every team without a group to A or B at random, keeping the groups balanced.
///
/// Teams already in a group stay where they are. Returns the teams that were moved.
pub fn draw_groups<S: Store + ?Sized>(store: &S, cap: &Capability) -> Result<Vec<Team>, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    let teams = store.teams()?;
    let mut count_a = teams.iter().filter(|t| t.group == Some(Group::A)).count();
    let mut count_b = teams.iter().filter(|t| t.group == Some(Group::B)).count();

    let mut unassigned: Vec<Team> = teams.into_iter().filter(|t| t.group.is_none()).collect();
    unassigned.shuffle(&mut rand::thread_rng());

    for team in &mut unassigned {
        let group = if count_a <= count_b {
            count_a += 1;
            Group::A
        } else {
            count_b += 1;
            Group::B
        };
        team.group = Some(group);
        store.update_team(team)?;
    }
    log::info!(
        "Group draw placed {} team(s): A has {}, B has {}",
        unassigned.len(),
        count_a,
        count_b
    );
    Ok(unassigned)
}

/// Single round robin by the circle method: every pair meets once.
///
/// With an odd number of teams one team rests each round. Home and away
/// alternate between rounds for the fixed team.
pub fn round_robin_rounds(team_ids: &[TeamId]) -> Vec<Vec<(TeamId, TeamId)>> {
    let mut slots: Vec<Option<TeamId>> = team_ids.iter().copied().map(Some).collect();
    if slots.len() < 2 {
        return Vec::new();
    }
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    let mut rounds = Vec::with_capacity(n - 1);

    for round in 0..n - 1 {
        let mut pairings = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (slots[i], slots[n - 1 - i]) {
                if i == 0 && round % 2 == 1 {
                    pairings.push((b, a));
                } else {
                    pairings.push((a, b));
                }
            }
        }
        rounds.push(pairings);
        // Keep the first slot fixed, rotate the rest clockwise.
        slots[1..].rotate_right(1);
    }
    rounds
}

/// Insert the group-stage matches of `group` that do not exist yet.
///
/// A pairing that already has a match in the group (either home/away order)
/// is skipped, so calling this again after adding a team only schedules the
/// new team's matches. Returns the created matches.
pub fn schedule_group<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    group: Group,
) -> Result<Vec<GameMatch>, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    let mut teams: Vec<Team> = store
        .teams()?
        .into_iter()
        .filter(|t| t.group == Some(group))
        .collect();
    if teams.len() < 2 {
        return Err(TournamentError::NotEnoughTeams {
            group,
            found: teams.len(),
        });
    }
    teams.sort_by(|a, b| a.name.cmp(&b.name));
    let ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();

    let existing: Vec<GameMatch> = store
        .matches()?
        .into_iter()
        .filter(|m| m.is_in_group(group))
        .collect();

    let mut created = Vec::new();
    for (home, away) in round_robin_rounds(&ids).into_iter().flatten() {
        let scheduled = existing
            .iter()
            .chain(created.iter())
            .any(|m: &GameMatch| m.pairs(home, away));
        if scheduled {
            continue;
        }
        created.push(store.insert_match(NewMatch::group_stage(home, away, group))?);
    }
    log::info!("Scheduled {} new match(es) in group {}", created.len(), group);
    Ok(created)
}

/// Admin adds a single match by hand (friendly, rescheduled game, ...).
pub fn add_match<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    new_match: NewMatch,
) -> Result<GameMatch, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    if new_match.home_team_id == new_match.away_team_id {
        return Err(TournamentError::SameTeam);
    }
    for team_id in [new_match.home_team_id, new_match.away_team_id] {
        match store.team(team_id) {
            Ok(_) => {}
            Err(StoreError::NotFound { .. }) => return Err(TournamentError::TeamNotFound(team_id)),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(store.insert_match(new_match)?)
}
