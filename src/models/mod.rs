//! Data structures for the tournament: teams, athletes, matches, points, votes, users.

mod error;
mod game;
mod point;
mod standing;
mod team;
mod user;
mod vote;

pub use error::TournamentError;
pub use game::{FinalType, GameMatch, MatchGroup, MatchId, MatchStatus, NewMatch, Phase};
pub use point::{PointEntry, PointEntryId};
pub use standing::Standing;
pub use team::{Athlete, AthleteId, Group, StaffId, StaffMember, Team, TeamId};
pub use user::{Capability, Role, User, UserId};
pub use vote::{Vote, VoteId, VoteKind};
