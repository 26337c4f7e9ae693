//! In-process store: all tables behind one RwLock, with JSON snapshots.

use crate::models::{
    Athlete, AthleteId, GameMatch, MatchId, NewMatch, PointEntry, StaffMember, Team, User,
    Vote,
};
use crate::store::{Revision, Store, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use uuid::Uuid;

/// Constraint switches mirroring how the hosted schema may be configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoreOptions {
    /// Reject matches whose group column is null (finals then need the sentinel).
    pub reject_null_group: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Tables {
    teams: Vec<Team>,
    athletes: Vec<Athlete>,
    #[serde(default)]
    staff: Vec<StaffMember>,
    matches: Vec<GameMatch>,
    points: Vec<PointEntry>,
    votes: Vec<Vote>,
    users: Vec<User>,
}

/// All tables in memory. Each statement is atomic; there are no multi-statement transactions.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    options: StoreOptions,
    read_only: AtomicBool,
    changes: watch::Sender<Revision>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl MemoryStore {
    pub fn new(options: StoreOptions) -> Self {
        Self::from_tables(Tables::default(), options)
    }

    fn from_tables(tables: Tables, options: StoreOptions) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            tables: RwLock::new(tables),
            options,
            read_only: AtomicBool::new(false),
            changes,
        }
    }

    /// Load a JSON snapshot written by [`MemoryStore::save`].
    pub fn load(path: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Io(format!("{}: {}", path.display(), e)))?;
        let tables: Tables = serde_json::from_str(&content)
            .map_err(|e| StoreError::Io(format!("{}: {}", path.display(), e)))?;
        log::info!(
            "Loaded snapshot {} ({} teams, {} matches)",
            path.display(),
            tables.teams.len(),
            tables.matches.len()
        );
        Ok(Self::from_tables(tables, options))
    }

    /// Write all tables to `path` as JSON (via a temp file, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let json = {
            let tables = self.read()?;
            serde_json::to_string_pretty(&*tables).map_err(|e| StoreError::Io(e.to_string()))?
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::Io(format!("{}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, path).map_err(|e| StoreError::Io(format!("{}: {}", path.display(), e)))
    }

    /// Refuse all writes (maintenance). Reads keep working.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock error".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        if self.read_only.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("store is read-only".to_string()));
        }
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock error".to_string()))
    }

    fn bump(&self) {
        self.changes.send_modify(|rev| *rev += 1);
    }

    fn check_match(&self, tables: &Tables, game: &GameMatch) -> StoreResult<()> {
        if game.home_team_id == game.away_team_id {
            return Err(StoreError::CheckViolation {
                constraint: "matches_distinct_teams",
            });
        }
        if game.group.is_none() && self.options.reject_null_group {
            return Err(StoreError::NullViolation { column: "girone" });
        }
        if let Some(final_type) = game.final_type.filter(|_| game.is_final()) {
            let duplicate = tables.matches.iter().any(|m| {
                m.id != game.id
                    && m.is_final()
                    && m.final_type == Some(final_type)
                    && m.pairs(game.home_team_id, game.away_team_id)
            });
            if duplicate {
                return Err(StoreError::UniqueViolation {
                    constraint: "matches_final_pair_key",
                });
            }
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.read()?.teams.clone())
    }

    fn insert_team(&self, team: Team) -> StoreResult<Team> {
        let mut tables = self.write()?;
        if tables.teams.iter().any(|t| t.id == team.id) {
            return Err(StoreError::UniqueViolation { constraint: "teams_pkey" });
        }
        tables.teams.push(team.clone());
        drop(tables);
        self.bump();
        Ok(team)
    }

    fn update_team(&self, team: &Team) -> StoreResult<()> {
        let mut tables = self.write()?;
        let row = tables
            .teams
            .iter_mut()
            .find(|t| t.id == team.id)
            .ok_or(StoreError::NotFound { table: "teams" })?;
        *row = team.clone();
        drop(tables);
        self.bump();
        Ok(())
    }

    fn athletes(&self) -> StoreResult<Vec<Athlete>> {
        Ok(self.read()?.athletes.clone())
    }

    fn insert_athlete(&self, athlete: Athlete) -> StoreResult<Athlete> {
        let mut tables = self.write()?;
        if !tables.teams.iter().any(|t| t.id == athlete.team_id) {
            return Err(StoreError::CheckViolation {
                constraint: "athletes_team_id_fkey",
            });
        }
        tables.athletes.push(athlete.clone());
        drop(tables);
        self.bump();
        Ok(athlete)
    }

    fn insert_staff(&self, member: StaffMember) -> StoreResult<StaffMember> {
        let mut tables = self.write()?;
        if !tables.teams.iter().any(|t| t.id == member.team_id) {
            return Err(StoreError::CheckViolation {
                constraint: "staff_team_id_fkey",
            });
        }
        tables.staff.push(member.clone());
        drop(tables);
        self.bump();
        Ok(member)
    }

    fn matches(&self) -> StoreResult<Vec<GameMatch>> {
        Ok(self.read()?.matches.clone())
    }

    fn insert_match(&self, game: NewMatch) -> StoreResult<GameMatch> {
        let game = game.into_match(Uuid::new_v4());
        let mut tables = self.write()?;
        self.check_match(&tables, &game)?;
        tables.matches.push(game.clone());
        drop(tables);
        self.bump();
        Ok(game)
    }

    fn update_match(&self, game: &GameMatch) -> StoreResult<()> {
        let mut tables = self.write()?;
        self.check_match(&tables, game)?;
        let row = tables
            .matches
            .iter_mut()
            .find(|m| m.id == game.id)
            .ok_or(StoreError::NotFound { table: "matches" })?;
        *row = game.clone();
        drop(tables);
        self.bump();
        Ok(())
    }

    fn point_entries(&self, match_id: MatchId) -> StoreResult<Vec<PointEntry>> {
        Ok(self
            .read()?
            .points
            .iter()
            .filter(|p| p.match_id == match_id)
            .cloned()
            .collect())
    }

    fn all_point_entries(&self) -> StoreResult<Vec<PointEntry>> {
        Ok(self.read()?.points.clone())
    }

    fn insert_point_entry(&self, entry: PointEntry) -> StoreResult<PointEntry> {
        let mut tables = self.write()?;
        tables.points.push(entry.clone());
        drop(tables);
        self.bump();
        Ok(entry)
    }

    fn delete_point_entries(&self, match_id: MatchId, athlete_id: AthleteId) -> StoreResult<usize> {
        let mut tables = self.write()?;
        let before = tables.points.len();
        tables
            .points
            .retain(|p| !(p.match_id == match_id && p.athlete_id == athlete_id));
        let removed = before - tables.points.len();
        drop(tables);
        if removed > 0 {
            self.bump();
        }
        Ok(removed)
    }

    fn votes(&self) -> StoreResult<Vec<Vote>> {
        Ok(self.read()?.votes.clone())
    }

    fn upsert_vote(&self, vote: Vote) -> StoreResult<Vote> {
        let mut tables = self.write()?;
        let stored = match tables
            .votes
            .iter_mut()
            .find(|v| v.match_id == vote.match_id && v.user_id == vote.user_id)
        {
            Some(existing) => {
                existing.athlete_id = vote.athlete_id;
                existing.kind = vote.kind;
                existing.created_at = vote.created_at;
                existing.clone()
            }
            None => {
                tables.votes.push(vote.clone());
                vote
            }
        };
        drop(tables);
        self.bump();
        Ok(stored)
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.clone())
    }

    fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.token == user.token) {
            return Err(StoreError::UniqueViolation { constraint: "users_token_key" });
        }
        tables.users.push(user.clone());
        drop(tables);
        self.bump();
        Ok(user)
    }

    fn revision(&self) -> Revision {
        *self.changes.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<Revision> {
        self.changes.subscribe()
    }
}
