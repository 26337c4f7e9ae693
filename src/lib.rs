//! Winter Cup tournament organizer: library with models, store and business logic.

pub mod config;
pub mod feed;
pub mod logic;
pub mod models;
pub mod store;

pub use feed::{spawn_view_feed, ViewFeed};
pub use logic::{
    build_view, cast_vote, compute_standings, derive_finals, final_ranking, finish_match,
    group_phase_complete, group_standings, record_points, start_match, tally, FinalsBracket,
    MatchTally, TournamentView,
};
pub use models::{
    Athlete, AthleteId, Capability, FinalType, GameMatch, Group, MatchGroup, MatchId, MatchStatus,
    NewMatch, Phase, PointEntry, Role, Standing, Team, TeamId, TournamentError, User, UserId, Vote,
    VoteKind,
};
pub use store::{MemoryStore, Store, StoreError, StoreOptions};
