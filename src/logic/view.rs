//! Full tournament view recomputed from one store snapshot.

use crate::logic::bracket::{derive_finals, FinalsBracket};
use crate::logic::standings::{expected_group_matches, group_phase_complete, group_standings};
use crate::models::{GameMatch, Group, Standing, TournamentError};
use crate::store::{Revision, Store};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupView {
    pub group: Group,
    pub standings: Vec<Standing>,
    pub played: usize,
    pub expected: usize,
    pub complete: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentView {
    /// Store revision the view was computed from (or newer).
    pub revision: Revision,
    pub groups: Vec<GroupView>,
    pub finals: FinalsBracket,
}

impl TournamentView {
    pub fn group(&self, group: Group) -> Option<&GroupView> {
        self.groups.iter().find(|g| g.group == group)
    }
}

/// Standings of both groups plus the finals bracket. Nothing is cached:
/// every call refetches teams and matches and derives everything again.
/// May create missing finals matches (see [`derive_finals`]).
pub fn build_view<S: Store + ?Sized>(store: &S) -> Result<TournamentView, TournamentError> {
    let revision = store.revision();
    let teams = store.teams()?;
    let matches = store.matches()?;

    let groups: Vec<GroupView> = Group::ALL
        .iter()
        .map(|&group| {
            let team_count = teams.iter().filter(|t| t.group == Some(group)).count();
            let group_matches: Vec<GameMatch> = matches
                .iter()
                .filter(|m| m.is_in_group(group))
                .cloned()
                .collect();
            GroupView {
                group,
                standings: group_standings(group, &teams, &matches),
                played: group_matches.iter().filter(|m| m.is_played()).count(),
                expected: expected_group_matches(team_count),
                complete: group_phase_complete(team_count, &group_matches),
            }
        })
        .collect();

    let complete = groups.iter().all(|g| g.complete);
    let finals = derive_finals(
        store,
        &groups[0].standings,
        &groups[1].standings,
        complete,
    )?;

    Ok(TournamentView {
        revision,
        groups,
        finals,
    })
}
