//! Single binary web server: HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. See `winter_cup::config::Config` for the
//! environment variables (HOST, PORT, DATA_FILE, SESSION_KEY, ADMIN_TOKEN, ...).

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use winter_cup::config::Config;
use winter_cup::logic::{
    add_athlete, add_match, add_staff, add_team, assign_scorekeeper, build_view, cast_vote,
    correct_athlete_total, create_user, draw_groups, ensure_admin, finish_match, group_standings,
    import_roster, login, mvp_leaderboard, override_score, record_points, reopen_match,
    schedule_group, score_audit, set_team_group, standings_csv, start_match, tally, top_scorers,
};
use winter_cup::models::{Athlete, StaffMember};
use winter_cup::store::Revision;
use winter_cup::{
    spawn_view_feed, AthleteId, Capability, Group, MatchId, MemoryStore, NewMatch, Role, Store,
    StoreError, StoreOptions, TeamId, TournamentError, UserId, ViewFeed,
};

/// Shared server state: the store and the change-driven view feed.
struct AppState {
    store: Arc<MemoryStore>,
    feed: ViewFeed,
    view_wait: Duration,
}

type State = Data<AppState>;

/// Session key holding the capability resolved at login.
const CAPABILITY_KEY: &str = "capability";
/// Session key holding an anonymous voter's id.
const VOTER_KEY: &str = "voter_id";

/// How often the snapshot file is written when the store changed.
const SAVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    revision: Revision,
}

#[derive(Deserialize)]
struct LoginBody {
    token: String,
}

#[derive(Deserialize)]
struct AddTeamBody {
    name: String,
    #[serde(default)]
    group: Option<Group>,
}

#[derive(Deserialize)]
struct SetGroupBody {
    group: Option<Group>,
}

#[derive(Deserialize)]
struct AddAthleteBody {
    team_id: TeamId,
    number: String,
    first_name: String,
    last_name: String,
}

#[derive(Deserialize)]
struct AddStaffBody {
    team_id: TeamId,
    first_name: String,
    last_name: String,
    #[serde(default)]
    role: String,
}

#[derive(Deserialize)]
struct CreateUserBody {
    username: String,
    role: Role,
}

#[derive(Deserialize)]
struct RecordPointsBody {
    athlete_id: AthleteId,
    points: u32,
}

#[derive(Deserialize)]
struct CorrectTotalBody {
    total: u32,
}

#[derive(Deserialize)]
struct OverrideScoreBody {
    home_score: u32,
    away_score: u32,
}

#[derive(Deserialize)]
struct ScorekeeperBody {
    user_id: Option<UserId>,
}

#[derive(Deserialize)]
struct VoteBody {
    athlete_id: AthleteId,
}

#[derive(Deserialize)]
struct MvpQuery {
    match_id: Option<MatchId>,
}

#[derive(Deserialize)]
struct WaitQuery {
    since: Revision,
}

/// Path segment: team id (e.g. /api/teams/{id}/group)
#[derive(Deserialize)]
struct TeamPath {
    id: TeamId,
}

/// Path segment: group label (e.g. /api/groups/A/standings)
#[derive(Deserialize)]
struct GroupPath {
    group: String,
}

/// Path segment: match id (e.g. /api/matches/{id}/finish)
#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

/// Path segments: match id and athlete id.
#[derive(Deserialize)]
struct MatchAthletePath {
    id: MatchId,
    athlete_id: AthleteId,
}

fn error_response(e: TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::Forbidden => HttpResponse::Forbidden().json(body),
        TournamentError::InvalidToken => HttpResponse::Unauthorized().json(body),
        TournamentError::MatchNotFound(_)
        | TournamentError::TeamNotFound(_)
        | TournamentError::AthleteNotFound(_)
        | TournamentError::Store(StoreError::NotFound { .. }) => HttpResponse::NotFound().json(body),
        TournamentError::Store(StoreError::Unavailable(_)) => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(e),
    }
}

fn not_logged_in() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Not logged in" }))
}

fn unknown_group() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No such group" }))
}

/// Capability stored at login, if any.
fn session_capability(session: &Session) -> Option<Capability> {
    session.get::<Capability>(CAPABILITY_KEY).ok().flatten()
}

/// Logged-in capability, or an anonymous public voter with a per-session id.
fn voter_capability(session: &Session) -> Capability {
    if let Some(cap) = session_capability(session) {
        return cap;
    }
    let voter_id = match session.get::<UserId>(VOTER_KEY).ok().flatten() {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4();
            if let Err(e) = session.insert(VOTER_KEY, id) {
                log::warn!("Could not store voter id in session: {}", e);
            }
            id
        }
    };
    Capability::anonymous(voter_id)
}

/// Resolve the capability or bail out with 401.
macro_rules! require_login {
    ($session:expr) => {
        match session_capability(&$session) {
            Some(cap) => cap,
            None => return not_logged_in(),
        }
    };
}

#[get("/api/health")]
async fn api_health(state: State) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "winter-cup",
        revision: state.store.revision(),
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Exchange an access token for a session. The capability is resolved here once.
#[post("/api/login")]
async fn api_login(state: State, session: Session, body: Json<LoginBody>) -> HttpResponse {
    let cap = match login(&*state.store, &body.token) {
        Ok(cap) => cap,
        Err(e) => return error_response(e),
    };
    session.renew();
    match session.insert(CAPABILITY_KEY, cap) {
        Ok(()) => HttpResponse::Ok().json(cap),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })),
    }
}

#[post("/api/logout")]
async fn api_logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

#[get("/api/me")]
async fn api_me(session: Session) -> HttpResponse {
    let cap = require_login!(session);
    HttpResponse::Ok().json(cap)
}

#[get("/api/teams")]
async fn api_teams(state: State) -> HttpResponse {
    respond(state.store.teams().map_err(TournamentError::from))
}

#[post("/api/teams")]
async fn api_add_team(state: State, session: Session, body: Json<AddTeamBody>) -> HttpResponse {
    let cap = require_login!(session);
    respond(add_team(&*state.store, &cap, &body.name, body.group))
}

#[put("/api/teams/{id}/group")]
async fn api_set_team_group(
    state: State,
    session: Session,
    path: Path<TeamPath>,
    body: Json<SetGroupBody>,
) -> HttpResponse {
    let cap = require_login!(session);
    respond(set_team_group(&*state.store, &cap, path.id, body.group))
}

/// Randomly place teams without a group into A/B.
#[post("/api/teams/draw")]
async fn api_draw_groups(state: State, session: Session) -> HttpResponse {
    let cap = require_login!(session);
    respond(draw_groups(&*state.store, &cap))
}

#[get("/api/athletes")]
async fn api_athletes(state: State) -> HttpResponse {
    respond(state.store.athletes().map_err(TournamentError::from))
}

#[post("/api/athletes")]
async fn api_add_athlete(state: State, session: Session, body: Json<AddAthleteBody>) -> HttpResponse {
    let cap = require_login!(session);
    let body = body.into_inner();
    let athlete = Athlete::new(body.team_id, body.number, body.first_name, body.last_name);
    respond(add_athlete(&*state.store, &cap, athlete))
}

/// Roster import: CSV body with header team,number,first_name,last_name.
#[post("/api/athletes/import")]
async fn api_import_roster(state: State, session: Session, body: String) -> HttpResponse {
    let cap = require_login!(session);
    respond(import_roster(&*state.store, &cap, body.as_bytes()))
}

#[post("/api/staff")]
async fn api_add_staff(state: State, session: Session, body: Json<AddStaffBody>) -> HttpResponse {
    let cap = require_login!(session);
    let body = body.into_inner();
    let member = StaffMember::new(body.team_id, body.first_name, body.last_name, body.role);
    respond(add_staff(&*state.store, &cap, member))
}

#[post("/api/users")]
async fn api_create_user(state: State, session: Session, body: Json<CreateUserBody>) -> HttpResponse {
    let cap = require_login!(session);
    respond(create_user(&*state.store, &cap, &body.username, body.role))
}

/// Create the missing round-robin matches of a group.
#[post("/api/groups/{group}/schedule")]
async fn api_schedule_group(state: State, session: Session, path: Path<GroupPath>) -> HttpResponse {
    let cap = require_login!(session);
    let Some(group) = Group::parse(&path.group) else {
        return unknown_group();
    };
    respond(schedule_group(&*state.store, &cap, group))
}

#[get("/api/groups/{group}/standings")]
async fn api_standings(state: State, path: Path<GroupPath>) -> HttpResponse {
    let Some(group) = Group::parse(&path.group) else {
        return unknown_group();
    };
    let result = state
        .store
        .teams()
        .and_then(|teams| Ok(group_standings(group, &teams, &state.store.matches()?)));
    respond(result.map_err(TournamentError::from))
}

#[get("/api/groups/{group}/standings.csv")]
async fn api_standings_csv(state: State, path: Path<GroupPath>) -> HttpResponse {
    let Some(group) = Group::parse(&path.group) else {
        return unknown_group();
    };
    let standings = match state
        .store
        .teams()
        .and_then(|teams| Ok(group_standings(group, &teams, &state.store.matches()?)))
    {
        Ok(s) => s,
        Err(e) => return error_response(e.into()),
    };
    let mut out = Vec::new();
    if let Err(e) = standings_csv(&standings, &mut out) {
        return error_response(e.into());
    }
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"girone-{}.csv\"", group),
        ))
        .body(out)
}

#[get("/api/matches")]
async fn api_matches(state: State) -> HttpResponse {
    respond(state.store.matches().map_err(TournamentError::from))
}

#[post("/api/matches")]
async fn api_add_match(state: State, session: Session, body: Json<NewMatch>) -> HttpResponse {
    let cap = require_login!(session);
    respond(add_match(&*state.store, &cap, body.into_inner()))
}

/// Per-athlete and per-team totals from the point entries.
#[get("/api/matches/{id}/tally")]
async fn api_tally(state: State, path: Path<MatchPath>) -> HttpResponse {
    respond(tally(&*state.store, path.id))
}

#[post("/api/matches/{id}/start")]
async fn api_start_match(state: State, session: Session, path: Path<MatchPath>) -> HttpResponse {
    let cap = require_login!(session);
    respond(start_match(&*state.store, &cap, path.id))
}

/// +1 / +2 / +3 for one athlete.
#[post("/api/matches/{id}/points")]
async fn api_record_points(
    state: State,
    session: Session,
    path: Path<MatchPath>,
    body: Json<RecordPointsBody>,
) -> HttpResponse {
    let cap = require_login!(session);
    respond(record_points(&*state.store, &cap, path.id, body.athlete_id, body.points))
}

/// Manual correction: replace an athlete's entries with one entry of the given total.
#[put("/api/matches/{id}/athletes/{athlete_id}/total")]
async fn api_correct_total(
    state: State,
    session: Session,
    path: Path<MatchAthletePath>,
    body: Json<CorrectTotalBody>,
) -> HttpResponse {
    let cap = require_login!(session);
    respond(correct_athlete_total(&*state.store, &cap, path.id, path.athlete_id, body.total))
}

#[post("/api/matches/{id}/finish")]
async fn api_finish_match(state: State, session: Session, path: Path<MatchPath>) -> HttpResponse {
    let cap = require_login!(session);
    respond(finish_match(&*state.store, &cap, path.id))
}

#[put("/api/matches/{id}/score")]
async fn api_override_score(
    state: State,
    session: Session,
    path: Path<MatchPath>,
    body: Json<OverrideScoreBody>,
) -> HttpResponse {
    let cap = require_login!(session);
    respond(override_score(&*state.store, &cap, path.id, body.home_score, body.away_score))
}

#[post("/api/matches/{id}/reopen")]
async fn api_reopen_match(state: State, session: Session, path: Path<MatchPath>) -> HttpResponse {
    let cap = require_login!(session);
    respond(reopen_match(&*state.store, &cap, path.id))
}

#[put("/api/matches/{id}/scorekeeper")]
async fn api_assign_scorekeeper(
    state: State,
    session: Session,
    path: Path<MatchPath>,
    body: Json<ScorekeeperBody>,
) -> HttpResponse {
    let cap = require_login!(session);
    respond(assign_scorekeeper(&*state.store, &cap, path.id, body.user_id))
}

/// Recorded score vs. point-entry sum (null when they agree).
#[get("/api/matches/{id}/audit")]
async fn api_score_audit(state: State, path: Path<MatchPath>) -> HttpResponse {
    respond(score_audit(&*state.store, path.id))
}

/// Vote for a match MVP. Anonymous sessions vote as public (not counted).
#[post("/api/matches/{id}/vote")]
async fn api_vote(state: State, session: Session, path: Path<MatchPath>, body: Json<VoteBody>) -> HttpResponse {
    let cap = voter_capability(&session);
    respond(cast_vote(&*state.store, &cap, path.id, body.athlete_id))
}

#[get("/api/mvp")]
async fn api_mvp(state: State, query: Query<MvpQuery>) -> HttpResponse {
    let result = state
        .store
        .votes()
        .and_then(|votes| Ok(mvp_leaderboard(&votes, &state.store.athletes()?, query.match_id)));
    respond(result.map_err(TournamentError::from))
}

#[get("/api/scorers")]
async fn api_scorers(state: State) -> HttpResponse {
    let store = &state.store;
    let result = store.all_point_entries().and_then(|entries| {
        Ok(top_scorers(&entries, &store.athletes()?, &store.teams()?))
    });
    respond(result.map_err(TournamentError::from))
}

/// Finals bracket, derived fresh (creates missing finals matches once groups are complete).
#[get("/api/finals")]
async fn api_finals(state: State) -> HttpResponse {
    respond(build_view(&*state.store).map(|view| view.finals))
}

/// Latest standings + bracket from the view feed.
#[get("/api/view")]
async fn api_view(state: State) -> HttpResponse {
    match state.feed.latest() {
        Some(view) => HttpResponse::Ok().json(&*view),
        None => respond(build_view(&*state.store)),
    }
}

/// Long poll: answers as soon as a view newer than `since` exists, or after the wait limit.
#[get("/api/view/wait")]
async fn api_view_wait(state: State, query: Query<WaitQuery>) -> HttpResponse {
    match state.feed.wait_newer(query.since, state.view_wait).await {
        Some(view) => HttpResponse::Ok().json(&*view),
        None => respond(build_view(&*state.store)),
    }
}

fn session_key(config: &Config) -> Key {
    match config.session_key.as_deref() {
        Some(secret) if secret.len() >= 64 => Key::from(secret.as_bytes()),
        Some(_) => {
            log::warn!("SESSION_KEY shorter than 64 bytes, using a random key");
            Key::generate()
        }
        None => {
            log::warn!("SESSION_KEY not set, sessions will not survive a restart");
            Key::generate()
        }
    }
}

fn open_store(config: &Config) -> std::io::Result<MemoryStore> {
    let options = StoreOptions {
        reject_null_group: config.reject_null_group,
    };
    match &config.data_file {
        Some(path) if path.exists() => MemoryStore::load(path, options)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
        Some(path) => {
            log::info!("No snapshot at {}, starting empty", path.display());
            Ok(MemoryStore::new(options))
        }
        None => Ok(MemoryStore::new(options)),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let store = Arc::new(open_store(&config)?);
    if let Some(token) = &config.admin_token {
        if let Err(e) = ensure_admin(&*store, token) {
            log::error!("Could not seed admin user: {}", e);
        }
    }

    let feed = spawn_view_feed(store.clone());
    let state = Data::new(AppState {
        store: store.clone(),
        feed,
        view_wait: config.view_wait,
    });

    // Background task: write the snapshot every 30 seconds when something changed
    if let Some(path) = config.data_file.clone() {
        let store_save = store.clone();
        actix_web::rt::spawn(async move {
            let mut interval = actix_web::rt::time::interval(SAVE_INTERVAL);
            let mut saved_revision = store_save.revision();
            loop {
                interval.tick().await;
                let revision = store_save.revision();
                if revision == saved_revision {
                    continue;
                }
                match store_save.save(&path) {
                    Ok(()) => {
                        log::debug!("Saved snapshot r{} to {}", revision, path.display());
                        saved_revision = revision;
                    }
                    Err(e) => log::error!("Could not save snapshot: {}", e),
                }
            }
        });
    }

    let key = session_key(&config);
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_login)
            .service(api_logout)
            .service(api_me)
            .service(api_teams)
            .service(api_add_team)
            .service(api_set_team_group)
            .service(api_draw_groups)
            .service(api_athletes)
            .service(api_add_athlete)
            .service(api_import_roster)
            .service(api_add_staff)
            .service(api_create_user)
            .service(api_schedule_group)
            .service(api_standings)
            .service(api_standings_csv)
            .service(api_matches)
            .service(api_add_match)
            .service(api_tally)
            .service(api_start_match)
            .service(api_record_points)
            .service(api_correct_total)
            .service(api_finish_match)
            .service(api_override_score)
            .service(api_reopen_match)
            .service(api_assign_scorekeeper)
            .service(api_score_audit)
            .service(api_vote)
            .service(api_mvp)
            .service(api_scorers)
            .service(api_finals)
            .service(api_view)
            .service(api_view_wait)
            .service(Files::new("/static", "static"))
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
