//! Data store seam: the tables the tournament reads and writes.
//!
//! The engine only talks to [`Store`]; [`MemoryStore`] is the in-process
//! implementation the web binary serves from.

mod memory;

pub use memory::{MemoryStore, StoreOptions};

use crate::models::{
    Athlete, AthleteId, GameMatch, MatchId, NewMatch, PointEntry, StaffMember, Team, TeamId, User,
    Vote,
};
use tokio::sync::watch;

/// Store revision, bumped by every successful write.
pub type Revision = u64;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by the store, shaped like relational constraint errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    NotFound { table: &'static str },
    /// A NOT NULL column received null.
    NullViolation { column: &'static str },
    UniqueViolation { constraint: &'static str },
    CheckViolation { constraint: &'static str },
    /// Store unreachable or refusing writes.
    Unavailable(String),
    /// Snapshot file could not be read or written.
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound { table } => write!(f, "no such row in {}", table),
            StoreError::NullViolation { column } => {
                write!(f, "null value in column \"{}\" violates not-null constraint", column)
            }
            StoreError::UniqueViolation { constraint } => {
                write!(f, "duplicate key value violates unique constraint \"{}\"", constraint)
            }
            StoreError::CheckViolation { constraint } => {
                write!(f, "new row violates check constraint \"{}\"", constraint)
            }
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Io(msg) => write!(f, "snapshot i/o: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Query/insert/update over the tournament tables, plus a change feed.
pub trait Store {
    fn teams(&self) -> StoreResult<Vec<Team>>;
    fn insert_team(&self, team: Team) -> StoreResult<Team>;
    fn update_team(&self, team: &Team) -> StoreResult<()>;

    fn athletes(&self) -> StoreResult<Vec<Athlete>>;
    fn insert_athlete(&self, athlete: Athlete) -> StoreResult<Athlete>;

    fn insert_staff(&self, member: StaffMember) -> StoreResult<StaffMember>;

    fn matches(&self) -> StoreResult<Vec<GameMatch>>;
    fn insert_match(&self, game: NewMatch) -> StoreResult<GameMatch>;
    fn update_match(&self, game: &GameMatch) -> StoreResult<()>;

    fn point_entries(&self, match_id: MatchId) -> StoreResult<Vec<PointEntry>>;
    fn all_point_entries(&self) -> StoreResult<Vec<PointEntry>>;
    fn insert_point_entry(&self, entry: PointEntry) -> StoreResult<PointEntry>;
    /// Delete every entry for the athlete in the match; returns how many went.
    fn delete_point_entries(&self, match_id: MatchId, athlete_id: AthleteId) -> StoreResult<usize>;

    fn votes(&self) -> StoreResult<Vec<Vote>>;
    /// Insert, or replace the athlete of the existing (match, user) vote.
    fn upsert_vote(&self, vote: Vote) -> StoreResult<Vote>;

    fn users(&self) -> StoreResult<Vec<User>>;
    fn insert_user(&self, user: User) -> StoreResult<User>;

    fn revision(&self) -> Revision;
    /// Receiver that observes every revision bump.
    fn subscribe(&self) -> watch::Receiver<Revision>;

    fn game(&self, id: MatchId) -> StoreResult<GameMatch> {
        self.matches()?
            .into_iter()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound { table: "matches" })
    }

    fn team(&self, id: TeamId) -> StoreResult<Team> {
        self.teams()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { table: "teams" })
    }

    fn user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        Ok(self.users()?.into_iter().find(|u| u.token == token))
    }
}
