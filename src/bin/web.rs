//! Single binary web server: HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! The user directory is seeded from USERS_CSV (default: data/users.csv).

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post, put,
    web::{self, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use pong_tournament_web::{
    advance_round_if_complete, build_bracket, record_match_result, LookupError, MatchSession,
    Player, PlayerId, PlayerRegistry, SetupView, Side, Tournament, TournamentError, TournamentView,
    UserDirectory, UserLookup, VerifyOutcome,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// One hosted tournament session: entrant registry, the bracket once started,
/// the match being played, and the last touch time (for auto-cleanup).
struct SessionEntry {
    registry: PlayerRegistry,
    tournament: Option<Tournament>,
    active: Option<ActiveMatch>,
    last_activity: Instant,
}

/// The match currently being played in a session.
struct ActiveMatch {
    session: MatchSession,
    /// Present in auto-play mode. Dropping it aborts the repeating task, so
    /// the callback can never outlive the match.
    auto: Option<AutoPlayGuard>,
}

/// Abort-on-drop handle for the auto-play task.
struct AutoPlayGuard {
    handle: actix_web::rt::task::JoinHandle<()>,
}

impl Drop for AutoPlayGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct AppData {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    directory: UserDirectory,
}

/// In-memory state: many tournament sessions by id. Entries are removed after
/// 12h inactivity.
type AppState = Data<AppData>;

/// Inactivity threshold: sessions not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

/// Cadence of the simulated rallies in auto-play mode.
const AUTO_PLAY_TICK: Duration = Duration::from_millis(400);

const USER_ID_KEY: &str = "user_id";

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
}

#[derive(Deserialize)]
struct VerifySlotBody {
    username: String,
}

#[derive(Deserialize)]
struct StartMatchBody {
    #[serde(default)]
    auto: bool,
}

#[derive(Deserialize)]
struct PointBody {
    side: Side,
}

/// Path segment: tournament session id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: Uuid,
}

/// Path segments: session id and entrant slot (e.g. /api/tournaments/{id}/slots/{slot})
#[derive(Deserialize)]
struct TournamentSlotPath {
    id: Uuid,
    slot: usize,
}

/// Everything a client needs to render one session.
#[derive(Serialize)]
struct SessionStateView {
    id: Uuid,
    setup: SetupView,
    #[serde(skip_serializing_if = "Option::is_none")]
    bracket: Option<TournamentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    match_in_progress: Option<MatchSession>,
}

fn session_view(id: Uuid, entry: &SessionEntry) -> SessionStateView {
    SessionStateView {
        id,
        setup: entry.registry.setup_view(),
        bracket: entry.tournament.as_ref().map(TournamentView::project),
        match_in_progress: entry.active.as_ref().map(|a| a.session.clone()),
    }
}

/// The logged-in player, if the cookie session holds a known user id.
fn session_user(session: &Session, directory: &UserDirectory) -> Option<Player> {
    let id = session.get::<PlayerId>(USER_ID_KEY).ok().flatten()?;
    directory.lookup_by_id(id)
}

/// Tear down the active match and feed its outcome into the bracket.
///
/// Clearing `active` first drops the auto-play guard, so the repeating task
/// is cancelled before the bracket moves on.
fn finish_current_match(entry: &mut SessionEntry, winner_side: Side) {
    entry.active = None;
    if let Some(t) = entry.tournament.as_mut() {
        if let Err(e) = record_match_result(t, winner_side) {
            log::error!("failed to record match result: {}", e);
            return;
        }
        if let Err(e) = advance_round_if_complete(t) {
            log::error!("failed to advance round: {}", e);
        }
    }
}

/// Repeating task that plays out the current match with simulated rallies.
fn spawn_auto_play(state: AppState, id: Uuid) -> AutoPlayGuard {
    let handle = actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(AUTO_PLAY_TICK);
        loop {
            interval.tick().await;
            let mut g = match state.sessions.write() {
                Ok(guard) => guard,
                Err(_) => break,
            };
            let entry = match g.get_mut(&id) {
                Some(e) => e,
                None => break,
            };
            let active = match entry.active.as_mut() {
                Some(a) => a,
                None => break,
            };
            let side = if rand::thread_rng().gen_bool(0.5) {
                Side::Player1
            } else {
                Side::Player2
            };
            match active.session.score_point(side) {
                Ok(Some(winner_side)) => {
                    finish_current_match(entry, winner_side);
                    break;
                }
                Ok(None) => {}
                Err(_) => break,
            }
        }
    });
    AutoPlayGuard { handle }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "pong-tournament-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Log in as a directory user; the cookie session keeps the user id.
#[post("/api/login")]
async fn api_login(state: AppState, session: Session, body: Json<LoginBody>) -> HttpResponse {
    match state.directory.lookup_by_username(body.username.trim()) {
        Ok(player) => {
            if session.insert(USER_ID_KEY, player.id).is_err() {
                return HttpResponse::InternalServerError().body("session error");
            }
            HttpResponse::Ok().json(player)
        }
        Err(LookupError::NotFound) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": "Unknown user" }))
        }
        Err(e) => {
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

#[post("/api/logout")]
async fn api_logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// The logged-in user (401 when not logged in).
#[get("/api/me")]
async fn api_me(state: AppState, session: Session) -> HttpResponse {
    match session_user(&session, &state.directory) {
        Some(player) => HttpResponse::Ok().json(player),
        None => HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Not logged in" })),
    }
}

/// Create a tournament session hosted by the logged-in user (slot 1).
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, session: Session) -> HttpResponse {
    let local = match session_user(&session, &state.directory) {
        Some(player) => player,
        None => {
            return HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Log in first" }))
        }
    };
    let id = Uuid::new_v4();
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    g.insert(
        id,
        SessionEntry {
            registry: PlayerRegistry::new(local),
            tournament: None,
            active: None,
            last_activity: Instant::now(),
        },
    );
    HttpResponse::Ok().json(session_view(id, &g[&id]))
}

/// Get a session by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(session_view(path.id, entry))
        }
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Discard a session (window close). Drops any running auto-play task.
#[delete("/api/tournaments/{id}")]
async fn api_delete_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.remove(&path.id) {
        Some(_) => HttpResponse::Ok().json(serde_json::json!({ "ok": true })),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Verify a remote entrant slot against the user directory.
///
/// Two phases: validate the typed username and take a ticket, run the lookup
/// without holding the store, then apply the result. Only the latest
/// verification of a slot can land; anything else reports stale.
#[put("/api/tournaments/{id}/slots/{slot}")]
async fn api_verify_slot(
    state: AppState,
    path: Path<TournamentSlotPath>,
    body: Json<VerifySlotBody>,
) -> HttpResponse {
    let ticket = {
        let mut g = match state.sessions.write() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        let entry = match g.get_mut(&path.id) {
            Some(e) => e,
            None => {
                return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
            }
        };
        entry.last_activity = Instant::now();
        match entry.registry.begin_verify(path.slot, &body.username) {
            Ok(ticket) => ticket,
            Err(e) => {
                return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
            }
        }
    };

    let looked_up = state.directory.lookup_by_username(body.username.trim());

    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => {
            return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
        }
    };
    match entry.registry.complete_verify(ticket, looked_up) {
        Ok(VerifyOutcome::Verified(player)) => HttpResponse::Ok().json(serde_json::json!({
            "verified": player,
            "setup": entry.registry.setup_view(),
        })),
        Ok(VerifyOutcome::Stale) => HttpResponse::Ok().json(serde_json::json!({
            "stale": true,
            "setup": entry.registry.setup_view(),
        })),
        Err(e @ TournamentError::PlayerNotFound) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": e.to_string() }))
        }
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Seed the bracket once all 7 remote slots are verified.
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => {
            return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
        }
    };
    entry.last_activity = Instant::now();
    if entry.tournament.is_some() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Tournament already started" }));
    }
    match entry.registry.entrants().and_then(build_bracket) {
        Ok(tournament) => {
            log::info!("tournament {} started", tournament.id);
            entry.tournament = Some(tournament);
            HttpResponse::Ok().json(session_view(path.id, entry))
        }
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Advance the round if it is complete, then return the bracket view.
#[get("/api/tournaments/{id}/current-match")]
async fn api_current_match(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => {
            return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
        }
    };
    entry.last_activity = Instant::now();
    let tournament = match entry.tournament.as_mut() {
        Some(t) => t,
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Tournament not started" }))
        }
    };
    if tournament.winner.is_none() {
        if let Err(e) = advance_round_if_complete(tournament) {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }));
        }
    }
    HttpResponse::Ok().json(TournamentView::project(tournament))
}

/// Open the score session for the current pairing. With `auto`, a repeating
/// task plays the match out by simulated rallies.
#[post("/api/tournaments/{id}/matches/current/start")]
async fn api_start_match(
    state: AppState,
    path: Path<TournamentPath>,
    body: Option<Json<StartMatchBody>>,
) -> HttpResponse {
    let auto = body.map(|b| b.auto).unwrap_or(false);
    {
        let mut g = match state.sessions.write() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        let entry = match g.get_mut(&path.id) {
            Some(e) => e,
            None => {
                return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
            }
        };
        entry.last_activity = Instant::now();
        if entry.active.is_some() {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "A match is already in progress" }));
        }
        let tournament = match entry.tournament.as_mut() {
            Some(t) => t,
            None => {
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({ "error": "Tournament not started" }))
            }
        };
        if tournament.winner.is_none() {
            if let Err(e) = advance_round_if_complete(tournament) {
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({ "error": e.to_string() }));
            }
        }
        let session = match tournament.current_match() {
            Ok(m) => MatchSession::for_match(m),
            Err(e) => {
                return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
            }
        };
        entry.active = Some(ActiveMatch {
            session,
            auto: None,
        });
    }
    if auto {
        let auto_guard = spawn_auto_play(state.clone(), path.id);
        let mut g = match state.sessions.write() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        // If the session vanished in the meantime, dropping the unstored
        // guard aborts the task.
        if let Some(active) = g.get_mut(&path.id).and_then(|e| e.active.as_mut()) {
            active.auto = Some(auto_guard);
        }
        return match g.get(&path.id) {
            Some(entry) => HttpResponse::Ok().json(session_view(path.id, entry)),
            None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
        };
    }
    let g = match state.sessions.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(session_view(path.id, entry)),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Score one point in the match being played. At 10 points the result is
/// recorded, the round advanced, and the session torn down.
#[post("/api/tournaments/{id}/matches/current/point")]
async fn api_score_point(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<PointBody>,
) -> HttpResponse {
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => {
            return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
        }
    };
    entry.last_activity = Instant::now();
    let active = match entry.active.as_mut() {
        Some(a) => a,
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "No match in progress" }))
        }
    };
    match active.session.score_point(body.side) {
        Ok(Some(winner_side)) => {
            let session = active.session.clone();
            finish_current_match(entry, winner_side);
            HttpResponse::Ok().json(serde_json::json!({
                "session": session,
                "bracket": entry.tournament.as_ref().map(TournamentView::project),
            }))
        }
        Ok(None) => HttpResponse::Ok().json(serde_json::json!({
            "session": active.session.clone(),
        })),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Back to the main menu: clear slots, discard the bracket and any running
/// match (tournament abandonment).
#[post("/api/tournaments/{id}/reset")]
async fn api_reset_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => {
            return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
        }
    };
    entry.last_activity = Instant::now();
    entry.active = None;
    entry.tournament = None;
    entry.registry.reset();
    HttpResponse::Ok().json(session_view(path.id, entry))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_users_csv() -> String {
    "data/users.csv".to_string()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let users_csv = std::env::var("USERS_CSV").unwrap_or_else(|_| default_users_csv());

    let directory = UserDirectory::from_csv_path(&users_csv).map_err(std::io::Error::other)?;
    log::info!("Loaded {} users from {}", directory.len(), users_csv);

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(AppData {
        sessions: RwLock::new(HashMap::new()),
        directory,
    });
    let session_key = Key::generate();

    // Background task: every 30 minutes, remove sessions inactive for 12+ hours.
    // Dropping an entry also aborts its auto-play task, if any.
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.sessions.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament session(s)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_login)
            .service(api_logout)
            .service(api_me)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_delete_tournament)
            .service(api_verify_slot)
            .service(api_start_tournament)
            .service(api_current_match)
            .service(api_start_match)
            .service(api_score_point)
            .service(api_reset_tournament)
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
