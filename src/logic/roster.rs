//! Teams, athletes and staff: admin edits and CSV roster import.

use crate::models::{
    Athlete, Capability, Group, StaffMember, Team, TeamId, TournamentError,
};
use crate::store::{Store, StoreError};
use serde::Deserialize;

/// Add a team. Names are unique (case-insensitive).
pub fn add_team<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    name: &str,
    group: Option<Group>,
) -> Result<Team, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::Store(StoreError::NullViolation { column: "name" }));
    }
    if store.teams()?.iter().any(|t| t.name.eq_ignore_ascii_case(name)) {
        return Err(TournamentError::Store(StoreError::UniqueViolation {
            constraint: "teams_name_key",
        }));
    }
    Ok(store.insert_team(Team::new(name, group))?)
}

/// Move a team to a group, or out of both.
pub fn set_team_group<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    team_id: TeamId,
    group: Option<Group>,
) -> Result<Team, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    let mut team = find_team(store, team_id)?;
    team.group = group;
    store.update_team(&team)?;
    Ok(team)
}

/// Admins edit any roster; team users edit their own.
pub fn add_athlete<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    athlete: Athlete,
) -> Result<Athlete, TournamentError> {
    if !can_edit_roster(cap, athlete.team_id) {
        return Err(TournamentError::Forbidden);
    }
    find_team(store, athlete.team_id)?;
    Ok(store.insert_athlete(athlete)?)
}

pub fn add_staff<S: Store + ?Sized>(
    store: &S,
    cap: &Capability,
    member: StaffMember,
) -> Result<StaffMember, TournamentError> {
    if !can_edit_roster(cap, member.team_id) {
        return Err(TournamentError::Forbidden);
    }
    find_team(store, member.team_id)?;
    Ok(store.insert_staff(member)?)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    team: String,
    number: String,
    first_name: String,
    last_name: String,
}

/// Import athletes from CSV with header `team,number,first_name,last_name`.
///
/// Teams are matched by name, case-insensitive. Every row is checked before
/// anything is written, so a bad file imports nothing.
pub fn import_roster<S: Store + ?Sized, R: std::io::Read>(
    store: &S,
    cap: &Capability,
    input: R,
) -> Result<Vec<Athlete>, TournamentError> {
    if !cap.is_admin() {
        return Err(TournamentError::Forbidden);
    }
    let teams = store.teams()?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut athletes = Vec::new();
    for row in reader.deserialize::<RosterRow>() {
        let row = row?;
        let team = teams
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(&row.team))
            .ok_or_else(|| TournamentError::UnknownTeam(row.team.clone()))?;
        athletes.push(Athlete::new(team.id, row.number, row.first_name, row.last_name));
    }

    for athlete in &athletes {
        store.insert_athlete(athlete.clone())?;
    }
    log::info!("Imported {} athlete(s) from roster CSV", athletes.len());
    Ok(athletes)
}

fn can_edit_roster(cap: &Capability, team_id: TeamId) -> bool {
    cap.is_admin() || cap.team_id() == Some(team_id)
}

fn find_team<S: Store + ?Sized>(store: &S, team_id: TeamId) -> Result<Team, TournamentError> {
    store.team(team_id).map_err(|e| match e {
        StoreError::NotFound { .. } => TournamentError::TeamNotFound(team_id),
        other => other.into(),
    })
}
