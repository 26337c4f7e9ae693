//! MVP voting and the MVP / top-scorer leaderboards.

use crate::logic::scoring::find_match;
use crate::models::{
    Athlete, AthleteId, Capability, MatchId, MatchStatus, PointEntry, Team, TeamId,
    TournamentError, Vote,
};
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Vote for an athlete of a finished match. A second vote by the same user on
/// the same match replaces the first.
pub fn cast_vote<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    match_id: MatchId,
    athlete_id: AthleteId,
) -> Result<Vote, TournamentError> {
    let kind = cap.vote_kind().ok_or(TournamentError::Forbidden)?;
    let game = find_match(store, match_id)?;
    if game.status() != MatchStatus::Finished {
        return Err(TournamentError::MatchNotFinished);
    }
    let athlete = store
        .athletes()?
        .into_iter()
        .find(|a| a.id == athlete_id)
        .ok_or(TournamentError::AthleteNotFound(athlete_id))?;
    if !game.involves(athlete.team_id) {
        return Err(TournamentError::AthleteNotInMatch(athlete_id));
    }
    let vote = store.upsert_vote(Vote::new(match_id, cap.user_id, athlete_id, kind))?;
    log::debug!("{:?} vote by {} on match {}", kind, cap.user_id, match_id);
    Ok(vote)
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MvpEntry {
    pub athlete_id: AthleteId,
    pub team_id: Option<TeamId>,
    pub name: String,
    pub votes: u32,
}

/// Counted votes per athlete, most voted first. Only team votes count.
/// `match_id` narrows the tally to a single match's MVP.
pub fn mvp_leaderboard(votes: &[Vote], athletes: &[Athlete], match_id: Option<MatchId>) -> Vec<MvpEntry> {
    let mut counts: HashMap<AthleteId, u32> = HashMap::new();
    for v in votes
        .iter()
        .filter(|v| v.kind.counts_toward_mvp())
        .filter(|v| match_id.map_or(true, |id| v.match_id == id))
    {
        *counts.entry(v.athlete_id).or_default() += 1;
    }

    let mut board: Vec<MvpEntry> = counts
        .into_iter()
        .map(|(athlete_id, votes)| {
            let athlete = athletes.iter().find(|a| a.id == athlete_id);
            MvpEntry {
                athlete_id,
                team_id: athlete.map(|a| a.team_id),
                name: athlete.map(Athlete::full_name).unwrap_or_default(),
                votes,
            }
        })
        .collect();
    board.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.athlete_id.cmp(&b.athlete_id))
    });
    board
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScorerEntry {
    pub athlete_id: AthleteId,
    pub name: String,
    pub number: String,
    pub team_name: String,
    pub points: u32,
    /// Matches in which the athlete has at least one entry.
    pub games: u32,
}

/// Tournament points per athlete across all matches, highest first.
pub fn top_scorers(entries: &[PointEntry], athletes: &[Athlete], teams: &[Team]) -> Vec<ScorerEntry> {
    let mut points: HashMap<AthleteId, u32> = HashMap::new();
    let mut games: HashMap<AthleteId, HashSet<MatchId>> = HashMap::new();
    for e in entries {
        let total = points.entry(e.athlete_id).or_default();
        *total = total.saturating_add(e.points);
        games.entry(e.athlete_id).or_default().insert(e.match_id);
    }

    let mut board: Vec<ScorerEntry> = points
        .into_iter()
        .filter_map(|(athlete_id, points)| {
            let athlete = athletes.iter().find(|a| a.id == athlete_id)?;
            let team_name = teams
                .iter()
                .find(|t| t.id == athlete.team_id)
                .map(|t| t.name.clone())
                .unwrap_or_default();
            Some(ScorerEntry {
                athlete_id,
                name: athlete.full_name(),
                number: athlete.number.clone(),
                team_name,
                points,
                games: games.get(&athlete_id).map_or(0, |g| g.len() as u32),
            })
        })
        .collect();
    board.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.athlete_id.cmp(&b.athlete_id))
    });
    board
}
