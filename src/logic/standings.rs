//! Group standings: wins, points, tie-break ordering.

use crate::models::{GameMatch, Group, Standing, Team};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A win is worth 2 points; draws and losses are worth nothing.
pub const POINTS_PER_WIN: u32 = 2;

/// Compute the ranked standings of one group.
///
/// 1. Zero a standing per team.
/// 2. For every match with both scores, add points for/against to both sides
///    and credit the higher score with a win.
/// 3. points = wins x 2.
/// 4. Order by points, head-to-head (only between the two teams compared),
///    point differential, points scored, then name.
/// 5. Assign 1-based positions.
///
/// Matches involving a team outside `teams` are ignored.
pub fn compute_standings(teams: &[Team], matches: &[GameMatch]) -> Vec<Standing> {
    let mut table: HashMap<_, Standing> = teams
        .iter()
        .map(|t| (t.id, Standing::new(t.id, t.name.clone())))
        .collect();

    let played: Vec<&GameMatch> = matches
        .iter()
        .filter(|m| m.is_played())
        .filter(|m| table.contains_key(&m.home_team_id) && table.contains_key(&m.away_team_id))
        .collect();

    for m in &played {
        let (home, away) = match (m.home_score, m.away_score) {
            (Some(h), Some(a)) => (h, a),
            _ => continue,
        };
        if let Some(s) = table.get_mut(&m.home_team_id) {
            s.played += 1;
            s.points_for = s.points_for.saturating_add(home);
            s.points_against = s.points_against.saturating_add(away);
        }
        if let Some(s) = table.get_mut(&m.away_team_id) {
            s.played += 1;
            s.points_for = s.points_for.saturating_add(away);
            s.points_against = s.points_against.saturating_add(home);
        }
        if let Some((winner, loser)) = m.outcome() {
            if let Some(s) = table.get_mut(&winner) {
                s.wins += 1;
            }
            if let Some(s) = table.get_mut(&loser) {
                s.losses += 1;
            }
        }
    }

    let mut standings: Vec<Standing> = table
        .into_values()
        .map(|mut s| {
            s.points = s.wins * POINTS_PER_WIN;
            s
        })
        .collect();

    // Start from a total order so the result does not depend on input order.
    standings.sort_by(|a, b| a.name.cmp(&b.name).then(a.team_id.cmp(&b.team_id)));
    insertion_sort_by(&mut standings, |a, b| compare_standings(a, b, &played));

    for (i, s) in standings.iter_mut().enumerate() {
        s.position = i + 1;
    }
    standings
}

/// Standings of `group` from the full team and match lists.
pub fn group_standings(group: Group, teams: &[Team], matches: &[GameMatch]) -> Vec<Standing> {
    let teams: Vec<Team> = teams
        .iter()
        .filter(|t| t.group == Some(group))
        .cloned()
        .collect();
    let matches: Vec<GameMatch> = matches
        .iter()
        .filter(|m| m.is_in_group(group))
        .cloned()
        .collect();
    compute_standings(&teams, &matches)
}

/// Head-to-head is pairwise and therefore not transitive, so this must not go
/// through `slice::sort_by`, which may panic on an inconsistent order.
fn insertion_sort_by<T, F>(items: &mut [T], mut cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn compare_standings(a: &Standing, b: &Standing, played: &[&GameMatch]) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| head_to_head(a, b, played))
        .then_with(|| b.point_differential().cmp(&a.point_differential()))
        .then_with(|| b.points_for.cmp(&a.points_for))
        .then_with(|| a.name.cmp(&b.name))
}

/// 2 points to whoever won the direct match(es) between exactly these two teams.
fn head_to_head(a: &Standing, b: &Standing, played: &[&GameMatch]) -> Ordering {
    let (mut a_points, mut b_points) = (0u32, 0u32);
    for m in played.iter().filter(|m| m.pairs(a.team_id, b.team_id)) {
        match m.outcome() {
            Some((winner, _)) if winner == a.team_id => a_points += POINTS_PER_WIN,
            Some(_) => b_points += POINTS_PER_WIN,
            None => {}
        }
    }
    b_points.cmp(&a_points)
}

/// Matches a single round robin needs: n * (n - 1) / 2.
pub fn expected_group_matches(team_count: usize) -> usize {
    team_count * team_count.saturating_sub(1) / 2
}

/// Played matches of the group reach the round-robin count. A group with
/// fewer than two teams is never complete.
pub fn group_phase_complete(team_count: usize, group_matches: &[GameMatch]) -> bool {
    let expected = expected_group_matches(team_count);
    let completed = group_matches.iter().filter(|m| m.is_played()).count();
    expected > 0 && completed >= expected
}

/// Write a standings table as CSV (header row first).
pub fn standings_csv<W: std::io::Write>(standings: &[Standing], out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "position",
        "team",
        "played",
        "wins",
        "losses",
        "points_for",
        "points_against",
        "difference",
        "points",
    ])?;
    for s in standings {
        writer.write_record([
            s.position.to_string(),
            s.name.clone(),
            s.played.to_string(),
            s.wins.to_string(),
            s.losses.to_string(),
            s.points_for.to_string(),
            s.points_against.to_string(),
            s.point_differential().to_string(),
            s.points.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
