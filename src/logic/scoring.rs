//! Live scoring: point entries, per-athlete and per-team totals, match state transitions.

use crate::models::{
    Athlete, AthleteId, Capability, GameMatch, MatchId, MatchStatus, PointEntry, TeamId,
    TournamentError, UserId,
};
use crate::store::{Store, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Highest score accepted for a team in a match, or an athlete's corrected total.
pub const MAX_SCORE: u32 = 999;

/// Points one athlete has in one match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AthleteTotal {
    pub athlete_id: AthleteId,
    /// None if the athlete row has since been deleted.
    pub team_id: Option<TeamId>,
    pub number: String,
    pub name: String,
    pub points: u32,
}

/// Aggregated point entries of one match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchTally {
    pub match_id: MatchId,
    pub status: MatchStatus,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_total: u32,
    pub away_total: u32,
    /// Sorted by points, highest first.
    pub athletes: Vec<AthleteTotal>,
}

impl MatchTally {
    /// Sum entries per athlete, then per team. Entries of athletes not on
    /// either team count for the athlete only.
    pub fn from_entries(game: &GameMatch, entries: &[PointEntry], athletes: &[Athlete]) -> Self {
        let mut per_athlete: HashMap<AthleteId, u32> = HashMap::new();
        for e in entries.iter().filter(|e| e.match_id == game.id) {
            let points = per_athlete.entry(e.athlete_id).or_default();
            *points = points.saturating_add(e.points);
        }

        let mut totals: Vec<AthleteTotal> = per_athlete
            .into_iter()
            .map(|(athlete_id, points)| {
                let athlete = athletes.iter().find(|a| a.id == athlete_id);
                AthleteTotal {
                    athlete_id,
                    team_id: athlete.map(|a| a.team_id),
                    number: athlete.map(|a| a.number.clone()).unwrap_or_default(),
                    name: athlete.map(Athlete::full_name).unwrap_or_default(),
                    points,
                }
            })
            .collect();
        totals.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.athlete_id.cmp(&b.athlete_id))
        });

        let team_total = |team_id: TeamId| -> u32 {
            totals
                .iter()
                .filter(|t| t.team_id == Some(team_id))
                .fold(0u32, |sum, t| sum.saturating_add(t.points))
        };
        let home_total = team_total(game.home_team_id);
        let away_total = team_total(game.away_team_id);

        Self {
            match_id: game.id,
            status: game.status(),
            home_team_id: game.home_team_id,
            away_team_id: game.away_team_id,
            home_total,
            away_total,
            athletes: totals,
        }
    }

    pub fn athlete_points(&self, athlete_id: AthleteId) -> u32 {
        self.athletes
            .iter()
            .find(|t| t.athlete_id == athlete_id)
            .map_or(0, |t| t.points)
    }
}

/// Recorded score and point-entry sum of a finished match that disagree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoreDiscrepancy {
    pub match_id: MatchId,
    pub recorded: (u32, u32),
    pub from_entries: (u32, u32),
}

/// Current totals of a match from its point entries.
pub fn tally<S: Store + ?Sized>(store: &S, match_id: MatchId) -> Result<MatchTally, TournamentError> {
    let game = find_match(store, match_id)?;
    let entries = store.point_entries(match_id)?;
    let athletes = store.athletes()?;
    Ok(MatchTally::from_entries(&game, &entries, &athletes))
}

/// Scheduled -> live. Starting a live match again is a no-op.
pub fn start_match<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    match_id: MatchId,
) -> Result<GameMatch, TournamentError> {
    let mut game = find_match(store, match_id)?;
    if !cap.can_score(&game) {
        return Err(TournamentError::Forbidden);
    }
    match game.status() {
        MatchStatus::Finished => Err(TournamentError::MatchAlreadyFinished),
        MatchStatus::Live => Ok(game),
        MatchStatus::Scheduled => {
            game.is_live = true;
            store.update_match(&game)?;
            log::info!("Match {} is live", game.id);
            Ok(game)
        }
    }
}

/// Append one +1/+2/+3 entry for an athlete of a live match.
pub fn record_points<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    match_id: MatchId,
    athlete_id: AthleteId,
    points: u32,
) -> Result<PointEntry, TournamentError> {
    if !(1..=3).contains(&points) {
        return Err(TournamentError::InvalidPoints(points));
    }
    let game = find_match(store, match_id)?;
    if !cap.can_score(&game) {
        return Err(TournamentError::Forbidden);
    }
    match game.status() {
        MatchStatus::Live => {}
        MatchStatus::Finished => return Err(TournamentError::MatchAlreadyFinished),
        MatchStatus::Scheduled => return Err(TournamentError::MatchNotLive),
    }
    check_athlete_plays(store, &game, athlete_id)?;
    let entry = store.insert_point_entry(PointEntry::new(match_id, athlete_id, points))?;
    log::debug!("+{} for athlete {} in match {}", points, athlete_id, match_id);
    Ok(entry)
}

/// Replace an athlete's entries in a match with a single entry of `total`.
///
/// The per-action history of that athlete is lost; the total is exact.
/// Scorekeepers correct live matches, admins any match.
pub fn correct_athlete_total<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    match_id: MatchId,
    athlete_id: AthleteId,
    total: u32,
) -> Result<PointEntry, TournamentError> {
    if total > MAX_SCORE {
        return Err(TournamentError::InvalidScore(total));
    }
    let game = find_match(store, match_id)?;
    if !cap.can_score(&game) {
        return Err(TournamentError::Forbidden);
    }
    if !cap.is_admin() && game.status() != MatchStatus::Live {
        return Err(TournamentError::MatchNotLive);
    }
    check_athlete_plays(store, &game, athlete_id)?;
    let removed = store.delete_point_entries(match_id, athlete_id)?;
    let entry = store.insert_point_entry(PointEntry::new(match_id, athlete_id, total))?;
    log::info!(
        "Corrected athlete {} in match {} to {} points ({} entries replaced)",
        athlete_id,
        match_id,
        total,
        removed
    );
    Ok(entry)
}

/// Live -> finished: write the current team totals as the final score.
pub fn finish_match<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    match_id: MatchId,
) -> Result<GameMatch, TournamentError> {
    let mut game = find_match(store, match_id)?;
    if !cap.can_score(&game) {
        return Err(TournamentError::Forbidden);
    }
    match game.status() {
        MatchStatus::Live => {}
        MatchStatus::Finished => return Err(TournamentError::MatchAlreadyFinished),
        MatchStatus::Scheduled => return Err(TournamentError::MatchNotLive),
    }
    let totals = MatchTally::from_entries(&game, &store.point_entries(match_id)?, &store.athletes()?);
    game.home_score = Some(totals.home_total);
    game.away_score = Some(totals.away_total);
    game.is_live = false;
    store.update_match(&game)?;
    log::info!(
        "Match {} finished {}-{}",
        game.id,
        totals.home_total,
        totals.away_total
    );
    Ok(game)
}

/// Admin sets the final score directly, bypassing point entries.
///
/// The recorded score is what standings use. A mismatch with the entry sum
/// is logged here and reported by [`score_audit`].
pub fn override_score<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    match_id: MatchId,
    home_score: u32,
    away_score: u32,
) -> Result<GameMatch, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    if let Some(&bad) = [home_score, away_score].iter().find(|&&s| s > MAX_SCORE) {
        return Err(TournamentError::InvalidScore(bad));
    }
    let mut game = find_match(store, match_id)?;
    game.home_score = Some(home_score);
    game.away_score = Some(away_score);
    game.is_live = false;
    store.update_match(&game)?;

    let totals = tally(store, match_id)?;
    if (totals.home_total, totals.away_total) != (home_score, away_score) {
        log::warn!(
            "Score override on match {} by {}: recorded {}-{}, point entries sum to {}-{}",
            match_id,
            cap.user_id,
            home_score,
            away_score,
            totals.home_total,
            totals.away_total
        );
    }
    Ok(game)
}

/// Admin returns a match to scheduled: scores cleared, entries kept.
pub fn reopen_match<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    match_id: MatchId,
) -> Result<GameMatch, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    let mut game = find_match(store, match_id)?;
    game.home_score = None;
    game.away_score = None;
    game.is_live = false;
    store.update_match(&game)?;
    log::info!("Match {} reopened", match_id);
    Ok(game)
}

/// Admin assigns (or clears) the scorekeeper of a match.
pub fn assign_scorekeeper<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    match_id: MatchId,
    scorekeeper_id: Option<UserId>,
) -> Result<GameMatch, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    let mut game = find_match(store, match_id)?;
    game.scorekeeper_id = scorekeeper_id;
    store.update_match(&game)?;
    Ok(game)
}

/// Finished match whose recorded score differs from its point entries.
pub fn score_audit<S: Store + ?Sized>(
    store: &S,
    match_id: MatchId,
) -> Result<Option<ScoreDiscrepancy>, TournamentError> {
    let totals = tally(store, match_id)?;
    let game = find_match(store, match_id)?;
    let recorded = match (game.home_score, game.away_score) {
        (Some(h), Some(a)) => (h, a),
        _ => return Ok(None),
    };
    let from_entries = (totals.home_total, totals.away_total);
    Ok((recorded != from_entries).then_some(ScoreDiscrepancy {
        match_id,
        recorded,
        from_entries,
    }))
}

pub(crate) fn find_match<S: Store + ?Sized>(store: &S, match_id: MatchId) -> Result<GameMatch, TournamentError> {
    store.game(match_id).map_err(|e| match e {
        StoreError::NotFound { .. } => TournamentError::MatchNotFound(match_id),
        other => other.into(),
    })
}

fn check_athlete_plays<S: Store + ?Sized>(
    store: &S,
    game: &GameMatch,
    athlete_id: AthleteId,
) -> Result<(), TournamentError> {
    let athlete = store
        .athletes()?
        .into_iter()
        .find(|a| a.id == athlete_id)
        .ok_or(TournamentError::AthleteNotFound(athlete_id))?;
    if !game.involves(athlete.team_id) {
        return Err(TournamentError::AthleteNotInMatch(athlete_id));
    }
    Ok(())
}
