//! MVP votes.

use crate::models::game::MatchId;
use crate::models::team::AthleteId;
use crate::models::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a vote.
pub type VoteId = Uuid;

/// Who submitted a vote.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteKind {
    /// Submitted by a team-affiliated user.
    #[default]
    Team,
    /// Legacy anonymous vote; stored but not counted.
    Public,
}

impl VoteKind {
    /// Only team votes count toward the MVP tally.
    pub fn counts_toward_mvp(self) -> bool {
        matches!(self, VoteKind::Team)
    }
}

/// One vote per (match, user); a revote replaces the athlete.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub match_id: MatchId,
    pub user_id: UserId,
    pub athlete_id: AthleteId,
    #[serde(rename = "vote_type", default)]
    pub kind: VoteKind,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(match_id: MatchId, user_id: UserId, athlete_id: AthleteId, kind: VoteKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            user_id,
            athlete_id,
            kind,
            created_at: Utc::now(),
        }
    }
}
