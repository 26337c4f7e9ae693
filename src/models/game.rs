//! Match (game), its group marker, phase, finals tier and derived status.

use crate::models::team::{Group, TeamId};
use crate::models::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Value stored in a match's group column. Finals matches carry `Finals`
/// only when the store refuses a null group.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum MatchGroup {
    A,
    B,
    #[serde(rename = "finali")]
    Finals,
}

impl From<Group> for MatchGroup {
    fn from(group: Group) -> Self {
        match group {
            Group::A => MatchGroup::A,
            Group::B => MatchGroup::B,
        }
    }
}

/// Phase of the tournament this match belongs to.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Gironi,
    Finali,
}

/// Finals bracket tier: which two final places the match decides.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum FinalType {
    #[serde(rename = "1-2")]
    First,
    #[serde(rename = "3-4")]
    Third,
    #[serde(rename = "5-6")]
    Fifth,
    #[serde(rename = "7-8")]
    Seventh,
}

impl FinalType {
    pub const ALL: [FinalType; 4] = [
        FinalType::First,
        FinalType::Third,
        FinalType::Fifth,
        FinalType::Seventh,
    ];

    /// Tier for a 1-based group position (1 -> "1-2", ..., 4 -> "7-8").
    pub fn from_position(pos: usize) -> Option<Self> {
        match pos {
            1 => Some(FinalType::First),
            2 => Some(FinalType::Third),
            3 => Some(FinalType::Fifth),
            4 => Some(FinalType::Seventh),
            _ => None,
        }
    }

    /// 1-based group position this tier pairs.
    pub fn position(self) -> usize {
        match self {
            FinalType::First => 1,
            FinalType::Third => 2,
            FinalType::Fifth => 3,
            FinalType::Seventh => 4,
        }
    }

    /// Final rank taken by the winner; the loser takes the next one.
    pub fn winner_rank(self) -> usize {
        (self.position() - 1) * 2 + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            FinalType::First => "1-2",
            FinalType::Third => "3-4",
            FinalType::Fifth => "5-6",
            FinalType::Seventh => "7-8",
        }
    }
}

impl fmt::Display for FinalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a match, derived from its score fields and live flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

/// A single match between two teams.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// None until the match is finished; None means "not played", not zero.
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    #[serde(rename = "girone")]
    pub group: Option<MatchGroup>,
    #[serde(rename = "fase", default)]
    pub phase: Phase,
    #[serde(rename = "finalType", default)]
    pub final_type: Option<FinalType>,
    #[serde(default)]
    pub scorekeeper_id: Option<UserId>,
    #[serde(default)]
    pub is_live: bool,
}

impl GameMatch {
    /// Both scores recorded.
    pub fn is_played(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    pub fn status(&self) -> MatchStatus {
        if self.is_played() {
            MatchStatus::Finished
        } else if self.is_live {
            MatchStatus::Live
        } else {
            MatchStatus::Scheduled
        }
    }

    pub fn is_in_group(&self, group: Group) -> bool {
        self.phase == Phase::Gironi && self.group == Some(MatchGroup::from(group))
    }

    pub fn is_final(&self) -> bool {
        self.phase == Phase::Finali
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    /// Same two teams, in either home/away order.
    pub fn pairs(&self, a: TeamId, b: TeamId) -> bool {
        (self.home_team_id == a && self.away_team_id == b)
            || (self.home_team_id == b && self.away_team_id == a)
    }

    /// (winner, loser) when the match is played and not drawn.
    pub fn outcome(&self) -> Option<(TeamId, TeamId)> {
        let (home, away) = (self.home_score?, self.away_score?);
        if home > away {
            Some((self.home_team_id, self.away_team_id))
        } else if away > home {
            Some((self.away_team_id, self.home_team_id))
        } else {
            None
        }
    }
}

/// Insert form for a match; the store assigns the id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(rename = "girone")]
    pub group: Option<MatchGroup>,
    #[serde(rename = "fase", default)]
    pub phase: Phase,
    #[serde(rename = "finalType", default)]
    pub final_type: Option<FinalType>,
    #[serde(default)]
    pub scorekeeper_id: Option<UserId>,
}

impl NewMatch {
    /// Group-stage match between two teams of `group`.
    pub fn group_stage(home: TeamId, away: TeamId, group: Group) -> Self {
        Self {
            home_team_id: home,
            away_team_id: away,
            venue: None,
            scheduled_at: None,
            group: Some(group.into()),
            phase: Phase::Gironi,
            final_type: None,
            scorekeeper_id: None,
        }
    }

    /// Finals match for a bracket tier, with a null group marker.
    pub fn finals(home: TeamId, away: TeamId, final_type: FinalType) -> Self {
        Self {
            home_team_id: home,
            away_team_id: away,
            venue: None,
            scheduled_at: None,
            group: None,
            phase: Phase::Finali,
            final_type: Some(final_type),
            scorekeeper_id: None,
        }
    }

    pub fn into_match(self, id: MatchId) -> GameMatch {
        GameMatch {
            id,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            venue: self.venue,
            scheduled_at: self.scheduled_at,
            home_score: None,
            away_score: None,
            group: self.group,
            phase: self.phase,
            final_type: self.final_type,
            scorekeeper_id: self.scorekeeper_id,
            is_live: false,
        }
    }
}
