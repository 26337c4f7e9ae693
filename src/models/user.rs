//! Users, roles and the per-session capability object.

use crate::models::game::GameMatch;
use crate::models::team::TeamId;
use crate::models::vote::VoteKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user (or an anonymous voter).
pub type UserId = Uuid;

/// Access tier of a user.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Admin,
    /// "Rilevatore": enters points for the matches assigned to them.
    Scorekeeper,
    Team { team_id: TeamId },
    /// Anonymous voter without an account.
    Public,
}

/// An account. Users log in with their access token.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub token: String,
}

impl User {
    /// New user with a random access token.
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            role,
            token: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn capability(&self) -> Capability {
        Capability {
            user_id: self.id,
            role: self.role,
        }
    }
}

/// What the current session may do. Resolved once at login and passed
/// explicitly to the operations that need it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub user_id: UserId,
    pub role: Role,
}

impl Capability {
    /// Anonymous public voter identified only by a per-session id.
    pub fn anonymous(voter_id: UserId) -> Self {
        Self {
            user_id: voter_id,
            role: Role::Public,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Admins score any match; scorekeepers score unassigned matches and their own.
    pub fn can_score(&self, game: &GameMatch) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Scorekeeper => game
                .scorekeeper_id
                .map_or(true, |assigned| assigned == self.user_id),
            Role::Team { .. } | Role::Public => false,
        }
    }

    pub fn team_id(&self) -> Option<TeamId> {
        match self.role {
            Role::Team { team_id } => Some(team_id),
            _ => None,
        }
    }

    /// Kind of vote this session submits, or None if it may not vote.
    pub fn vote_kind(&self) -> Option<VoteKind> {
        match self.role {
            Role::Team { .. } => Some(VoteKind::Team),
            Role::Public => Some(VoteKind::Public),
            Role::Admin | Role::Scorekeeper => None,
        }
    }
}
