//! Team, Athlete, StaffMember and the two group labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a team.
pub type TeamId = Uuid;

/// Unique identifier for an athlete.
pub type AthleteId = Uuid;

/// Unique identifier for a staff member.
pub type StaffId = Uuid;

/// Group ("girone") a team plays its round robin in.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::A, Group::B];

    /// Parse a group label as it appears in URLs and CSV files ("a", "B", ...).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "A" | "a" => Some(Group::A),
            "B" | "b" => Some(Group::B),
            _ => None,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::A => write!(f, "A"),
            Group::B => write!(f, "B"),
        }
    }
}

/// A team in the tournament. `group` is None until the draw.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub group: Option<Group>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Team {
    pub fn new(name: impl Into<String>, group: Option<Group>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            group,
            logo_url: None,
            photo_url: None,
        }
    }
}

/// A player on a team roster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    pub team_id: TeamId,
    /// Jersey number as printed; "0" and "00" are different numbers.
    pub number: String,
    pub first_name: String,
    pub last_name: String,
}

impl Athlete {
    pub fn new(
        team_id: TeamId,
        number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            number: number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Coach, assistant or manager attached to a team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub team_id: TeamId,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl StaffMember {
    pub fn new(
        team_id: TeamId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            role: role.into(),
        }
    }
}
