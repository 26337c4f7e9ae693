//! Point entries: one row per scoring action.

use crate::models::game::MatchId;
use crate::models::team::AthleteId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a point entry.
pub type PointEntryId = Uuid;

/// Points awarded to an athlete in one action. Entries are appended, never edited.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PointEntry {
    pub id: PointEntryId,
    pub match_id: MatchId,
    pub athlete_id: AthleteId,
    pub points: u32,
    pub created_at: DateTime<Utc>,
}

impl PointEntry {
    pub fn new(match_id: MatchId, athlete_id: AthleteId, points: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            athlete_id,
            points,
            created_at: Utc::now(),
        }
    }
}
