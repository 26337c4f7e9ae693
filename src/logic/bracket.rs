//! Finals bracket: cross-group pairings, lazy match creation, final 1st-8th ranking.

use crate::models::{
    FinalType, GameMatch, MatchGroup, NewMatch, Standing, TeamId, TournamentError,
};
use crate::store::{Store, StoreError};
use serde::{Deserialize, Serialize};

/// One finals tier: the teams at the same position in each group and their match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketTier {
    pub final_type: FinalType,
    /// Group A team at this position (None while the group is short).
    pub team_a: Option<Standing>,
    pub team_b: Option<Standing>,
    /// None renders as a placeholder until the match exists.
    pub game: Option<GameMatch>,
}

impl BracketTier {
    /// (winner, loser) once the tier's match has a decisive score.
    pub fn outcome(&self) -> Option<(TeamId, TeamId)> {
        self.game.as_ref().and_then(GameMatch::outcome)
    }
}

/// A team's place in the final ranking. `decided` is false while the tier is unplayed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FinalPlacing {
    pub rank: usize,
    pub team_id: TeamId,
    pub name: String,
    pub decided: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FinalsBracket {
    pub tiers: Vec<BracketTier>,
    /// Empty until both group phases are complete.
    pub ranking: Vec<FinalPlacing>,
    pub groups_complete: bool,
}

/// Pair group positions across groups (1st-1st, 2nd-2nd, ...), look up or
/// create each tier's finals match, and fold results into the final ranking.
///
/// Matches are only created or retagged once `groups_complete` holds. Creating a match is
/// a side effect of reading the bracket, so it has to be idempotent: an
/// existing finals match between the two teams (either order) is reused, and a
/// unique-constraint conflict from a concurrent creator is resolved by adopting
/// the row that won. Any other creation failure leaves the tier as a
/// placeholder for this read.
pub fn derive_finals<S: Store + ?Sized>(
    store: &S,
    standings_a: &[Standing],
    standings_b: &[Standing],
    groups_complete: bool,
) -> Result<FinalsBracket, TournamentError> {
    let existing = store.matches()?;
    let mut tiers = Vec::with_capacity(FinalType::ALL.len());

    for final_type in FinalType::ALL {
        let idx = final_type.position() - 1;
        let team_a = standings_a.get(idx).cloned();
        let team_b = standings_b.get(idx).cloned();

        let game = match (&team_a, &team_b) {
            (Some(a), Some(b)) => {
                match find_final(&existing, a.team_id, b.team_id, final_type) {
                    Some(found) if groups_complete => Some(tag_final_type(store, found, final_type)),
                    Some(found) => Some(found),
                    None if groups_complete => {
                        create_final(store, a.team_id, b.team_id, final_type)
                    }
                    None => None,
                }
            }
            _ => None,
        };

        tiers.push(BracketTier {
            final_type,
            team_a,
            team_b,
            game,
        });
    }

    let ranking = if groups_complete {
        final_ranking(&tiers)
    } else {
        Vec::new()
    };

    Ok(FinalsBracket {
        tiers,
        ranking,
        groups_complete,
    })
}

/// Final 1st-8th ranking from the tiers.
///
/// Winner of tier p takes rank 2p-1 and the loser 2p. An unplayed tier keeps
/// its two teams in group-standing order (group A first) and marks them
/// undecided. When only one team of a tier is known it takes the lower slot.
pub fn final_ranking(tiers: &[BracketTier]) -> Vec<FinalPlacing> {
    let mut ranking = Vec::new();
    for tier in tiers {
        let upper = tier.final_type.winner_rank();
        let lower = upper + 1;
        let known: Vec<&Standing> = tier.team_a.iter().chain(tier.team_b.iter()).collect();

        match tier.outcome() {
            Some((winner, loser)) => {
                for (rank, team_id) in [(upper, winner), (lower, loser)] {
                    let name = known
                        .iter()
                        .find(|s| s.team_id == team_id)
                        .map(|s| s.name.clone())
                        .unwrap_or_default();
                    ranking.push(FinalPlacing {
                        rank,
                        team_id,
                        name,
                        decided: true,
                    });
                }
            }
            None => match known.as_slice() {
                [first, second] => {
                    ranking.push(pending(upper, first));
                    ranking.push(pending(lower, second));
                }
                [only] => ranking.push(pending(lower, only)),
                _ => {}
            },
        }
    }
    ranking
}

fn pending(rank: usize, standing: &Standing) -> FinalPlacing {
    FinalPlacing {
        rank,
        team_id: standing.team_id,
        name: standing.name.clone(),
        decided: false,
    }
}

/// Prefer a match already tagged with this tier, else any finals match of the pair.
fn find_final(
    matches: &[GameMatch],
    a: TeamId,
    b: TeamId,
    final_type: FinalType,
) -> Option<GameMatch> {
    let is_pair = |m: &&GameMatch| m.is_final() && m.pairs(a, b);
    matches
        .iter()
        .filter(is_pair)
        .find(|m| m.final_type == Some(final_type))
        .or_else(|| matches.iter().find(is_pair))
        .cloned()
}

fn tag_final_type<S: Store + ?Sized>(store: &S, game: GameMatch, final_type: FinalType) -> GameMatch {
    if game.final_type == Some(final_type) {
        return game;
    }
    let mut tagged = game.clone();
    tagged.final_type = Some(final_type);
    match store.update_match(&tagged) {
        Ok(()) => tagged,
        Err(e) => {
            log::warn!("Could not tag match {} as final {}: {}", game.id, final_type, e);
            game
        }
    }
}

fn create_final<S: Store + ?Sized>(
    store: &S,
    home: TeamId,
    away: TeamId,
    final_type: FinalType,
) -> Option<GameMatch> {
    let mut new_match = NewMatch::finals(home, away, final_type);
    let mut result = store.insert_match(new_match.clone());
    if let Err(StoreError::NullViolation { .. }) = result {
        log::debug!("Store rejects null group, retrying final {} with sentinel", final_type);
        new_match.group = Some(MatchGroup::Finals);
        result = store.insert_match(new_match);
    }

    match result {
        Ok(game) => {
            log::info!("Created final {} match {}", final_type, game.id);
            Some(game)
        }
        Err(StoreError::UniqueViolation { .. }) => {
            log::debug!("Final {} already created concurrently, adopting it", final_type);
            store
                .matches()
                .ok()
                .and_then(|all| find_final(&all, home, away, final_type))
        }
        Err(e) => {
            log::warn!("Could not create final {} match: {}", final_type, e);
            None
        }
    }
}
