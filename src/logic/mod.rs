//! Tournament business logic: standings, finals bracket, live scoring, scheduling, voting.

mod accounts;
mod bracket;
mod roster;
mod schedule;
mod scoring;
mod standings;
mod view;
mod votes;

pub use accounts::{create_user, ensure_admin, login};
pub use bracket::{derive_finals, final_ranking, BracketTier, FinalPlacing, FinalsBracket};
pub use roster::{add_athlete, add_staff, add_team, import_roster, set_team_group};
pub use schedule::{add_match, draw_groups, round_robin_rounds, schedule_group};
pub use scoring::{
    assign_scorekeeper, correct_athlete_total, finish_match, override_score, record_points,
    reopen_match, score_audit, start_match, tally, AthleteTotal, MatchTally, ScoreDiscrepancy,
    MAX_SCORE,
};
pub use standings::{
    compute_standings, expected_group_matches, group_phase_complete, group_standings,
    standings_csv, POINTS_PER_WIN,
};
pub use view::{build_view, GroupView, TournamentView};
pub use votes::{cast_vote, mvp_leaderboard, top_scorers, MvpEntry, ScorerEntry};
