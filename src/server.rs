//! JSON-over-HTTP layer: router, handlers, and error-to-status mapping.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{self, SessionManager};
use crate::db::{NewUser, UserProfile};
use crate::game::{Cell, Game, GameStatus, Mark};
use crate::service::{GameService, ServiceError};

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    service: GameService,
    sessions: SessionManager,
}

impl AppState {
    /// Creates the handler state from the service and session table.
    pub fn new(service: GameService, sessions: SessionManager) -> Self {
        Self { service, sessions }
    }
}

/// An error response: HTTP status plus a human-readable reason.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "not logged in")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Game(_) => StatusCode::CONFLICT,
            ServiceError::NotAParticipant => StatusCode::FORBIDDEN,
            ServiceError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Db(db) if db.is_not_found() => StatusCode::NOT_FOUND,
            // A duplicate insert that slips past a pre-check still reads
            // as a conflict, not a server fault.
            ServiceError::Db(db) if db.is_conflict() => StatusCode::CONFLICT,
            ServiceError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!(error = %err, "Storage failure");
        }
        Self::new(status, err.to_string())
    }
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login name, unique across accounts.
    pub user_name: String,
    /// Plaintext password; hashed before it reaches storage.
    pub password: String,
    /// Optional display name; defaults to the login name.
    pub display_name: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub user_name: String,
    /// Plaintext password.
    pub password: String,
}

/// Profile update request body.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    /// New display name.
    pub display_name: String,
}

/// Game creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    /// Display label for the new game.
    pub name: String,
}

/// Move request body; zero-based coordinates.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// Target row in `[0,3)`.
    pub row: usize,
    /// Target column in `[0,3)`.
    pub col: usize,
}

/// A player slot as rendered in responses.
#[derive(Debug, Serialize)]
pub struct PlayerView {
    /// Bound user id.
    pub id: Uuid,
    /// Resolved display name, when attached.
    pub display_name: Option<String>,
}

/// A game as rendered in responses.
#[derive(Debug, Serialize)]
pub struct GameView {
    /// Game id.
    pub id: Uuid,
    /// Display label.
    pub name: String,
    /// Current status.
    pub status: GameStatus,
    /// Board rows, top to bottom.
    pub board: [[Cell; 3]; 3],
    /// The X slot, if bound.
    pub player_x: Option<PlayerView>,
    /// The O slot, if bound.
    pub player_o: Option<PlayerView>,
}

impl GameView {
    fn from_game(game: &Game) -> Self {
        let mut board = [[Cell::Empty; 3]; 3];
        for (row, cells) in board.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = game.board().get(row, col);
            }
        }
        let player = |mark: Mark| {
            game.player_id(mark).map(|id| PlayerView {
                id,
                display_name: game.player_name(mark).map(str::to_owned),
            })
        };
        Self {
            id: *game.id(),
            name: game.name().clone(),
            status: *game.status(),
            board,
            player_x: player(Mark::X),
            player_o: player(Mark::O),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
        .route("/api/profile", put(update_profile))
        .route("/api/games", post(create_game))
        .route("/api/games/open", get(open_games))
        .route("/api/games/{id}", get(get_game))
        .route("/api/games/{id}/join", post(join_game))
        .route("/api/games/{id}/moves", post(make_move))
        .route("/api/history", get(history))
        .route("/api/stats", get(stats))
        .with_state(state)
}

/// Binds a listener and serves the router until shutdown.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(host: &str, port: u16, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(%host, port, "Listening for connections");
    axum::serve(listener, app).await?;
    Ok(())
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(auth::token_from_cookies)
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let token = session_token(headers).ok_or_else(ApiError::unauthorized)?;
    state
        .sessions
        .user_for(token)
        .ok_or_else(ApiError::unauthorized)
}

#[instrument(skip(state, req), fields(user_name = %req.user_name))]
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let user_name = req.user_name.trim();
    let password = req.password.as_str();
    if user_name.is_empty() || password.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "user name and password must not be blank",
        ));
    }
    if state
        .service
        .users()
        .get_by_name(user_name)
        .map_err(ServiceError::from)?
        .is_some()
    {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "user name already taken",
        ));
    }

    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(user_name);

    let mut rng = rand::thread_rng();
    let hash = auth::hash_password(password, &mut rng);
    let user = state
        .service
        .users()
        .create_user(NewUser::with_fresh_id(user_name, display_name, hash))
        .map_err(ServiceError::from)?;
    let profile = user.profile().map_err(ServiceError::from)?;

    let token = state.sessions.login(*profile.id(), &mut rng);
    info!(user_id = %profile.id(), "Account registered");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, auth::session_cookie(&token))],
        Json(profile),
    )
        .into_response())
}

#[instrument(skip(state, req), fields(user_name = %req.user_name))]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    // One failure message for unknown names and bad passwords alike, so
    // login cannot be used to probe which accounts exist.
    let rejected = || ApiError::new(StatusCode::UNAUTHORIZED, "invalid user name or password");

    let user = state
        .service
        .users()
        .get_by_name(req.user_name.trim())
        .map_err(ServiceError::from)?
        .ok_or_else(rejected)?;
    if !auth::verify_password(&req.password, user.password_hash()) {
        warn!("Password verification failed");
        return Err(rejected());
    }
    let profile = user.profile().map_err(ServiceError::from)?;

    let token = state.sessions.login(*profile.id(), &mut rand::thread_rng());
    info!(user_id = %profile.id(), "Logged in");

    Ok((
        [(header::SET_COOKIE, auth::session_cookie(&token))],
        Json(profile),
    )
        .into_response())
}

#[instrument(skip(state, headers))]
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let token = session_token(&headers).ok_or_else(ApiError::unauthorized)?;
    state.sessions.logout(token);

    Ok((
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response())
}

#[instrument(skip(state, headers))]
async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let user = state
        .service
        .users()
        .get_by_id(user_id)
        .map_err(ServiceError::from)?
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Json(user.profile().map_err(ServiceError::from)?))
}

#[instrument(skip(state, headers, req))]
async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let display_name = req.display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "display name must not be blank",
        ));
    }
    let user = state
        .service
        .users()
        .update_display_name(user_id, display_name)
        .map_err(ServiceError::from)?;
    Ok(Json(user.profile().map_err(ServiceError::from)?))
}

#[instrument(skip(state, headers, req))]
async fn create_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateGameRequest>,
) -> Result<Response, ApiError> {
    authenticate(&state, &headers)?;
    let game = state.service.create_game(&req.name)?;
    Ok((StatusCode::CREATED, Json(GameView::from_game(&game))).into_response())
}

#[instrument(skip(state, headers))]
async fn open_games(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<GameView>>, ApiError> {
    authenticate(&state, &headers)?;
    let games = state.service.open_games()?;
    Ok(Json(games.iter().map(GameView::from_game).collect()))
}

#[instrument(skip(state, headers))]
async fn get_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, ApiError> {
    authenticate(&state, &headers)?;
    let game = state.service.game_view(id)?;
    Ok(Json(GameView::from_game(&game)))
}

#[instrument(skip(state, headers))]
async fn join_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let game = state
        .service
        .join_game(id, user_id, &mut rand::thread_rng())?;
    Ok(Json(GameView::from_game(&game)))
}

#[instrument(skip(state, headers, req))]
async fn make_move(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<GameView>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let game = state.service.make_move(id, user_id, req.row, req.col)?;
    Ok(Json(GameView::from_game(&game)))
}

#[instrument(skip(state, headers))]
async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<GameView>>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let games = state.service.history(user_id)?;
    Ok(Json(games.iter().map(GameView::from_game).collect()))
}

#[instrument(skip(state, headers))]
async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let standing = state.service.standings(user_id)?;
    Ok(Json(serde_json::json!({
        "wins": standing.wins(),
        "losses": standing.losses(),
        "draws": standing.draws(),
        "total": standing.total(),
    }))
    .into_response())
}
