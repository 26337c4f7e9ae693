//! Errors from tournament operations.

use crate::models::game::MatchId;
use crate::models::team::{AthleteId, Group, TeamId};
use crate::store::StoreError;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// The store rejected or failed the request.
    Store(StoreError),
    /// The session's role does not allow this action.
    Forbidden,
    MatchNotFound(MatchId),
    TeamNotFound(TeamId),
    AthleteNotFound(AthleteId),
    /// Login token does not belong to any user.
    InvalidToken,
    /// A scoring action must award 1, 2 or 3 points.
    InvalidPoints(u32),
    /// A match score or athlete total above the accepted maximum.
    InvalidScore(u32),
    /// Athlete plays for neither team of the match.
    AthleteNotInMatch(AthleteId),
    /// Points can only be entered while the match is live.
    MatchNotLive,
    /// The match already has a final score.
    MatchAlreadyFinished,
    /// Action needs a finished match (e.g. voting).
    MatchNotFinished,
    /// A match needs two different teams.
    SameTeam,
    /// Scheduling needs at least two teams in the group.
    NotEnoughTeams { group: Group, found: usize },
    /// Roster CSV could not be read.
    Csv(String),
    /// Roster row names a team that does not exist.
    UnknownTeam(String),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::Store(e) => write!(f, "Store error: {}", e),
            TournamentError::Forbidden => write!(f, "Not allowed for this user"),
            TournamentError::MatchNotFound(_) => write!(f, "Match not found"),
            TournamentError::TeamNotFound(_) => write!(f, "Team not found"),
            TournamentError::AthleteNotFound(_) => write!(f, "Athlete not found"),
            TournamentError::InvalidToken => write!(f, "Invalid access token"),
            TournamentError::InvalidPoints(p) => {
                write!(f, "A scoring action is worth 1, 2 or 3 points (got {})", p)
            }
            TournamentError::InvalidScore(s) => write!(f, "Score {} is out of range", s),
            TournamentError::AthleteNotInMatch(_) => {
                write!(f, "Athlete does not play for either team in this match")
            }
            TournamentError::MatchNotLive => write!(f, "Match is not live"),
            TournamentError::MatchAlreadyFinished => write!(f, "Match already has a final score"),
            TournamentError::MatchNotFinished => write!(f, "Match has not finished yet"),
            TournamentError::SameTeam => write!(f, "Home and away team must differ"),
            TournamentError::NotEnoughTeams { group, found } => {
                write!(f, "Group {} needs at least 2 teams (has {})", group, found)
            }
            TournamentError::Csv(msg) => write!(f, "Invalid roster CSV: {}", msg),
            TournamentError::UnknownTeam(name) => write!(f, "Unknown team '{}'", name),
        }
    }
}

impl std::error::Error for TournamentError {}

impl From<StoreError> for TournamentError {
    fn from(e: StoreError) -> Self {
        TournamentError::Store(e)
    }
}

impl From<csv::Error> for TournamentError {
    fn from(e: csv::Error) -> Self {
        TournamentError::Csv(e.to_string())
    }
}
