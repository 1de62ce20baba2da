use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::game::{CreateGameResponse, GameInput, GameStatsResponse, GameSummary},
    error::AppError,
    services::game_service,
    state::{SharedState, session::SessionContext},
};

/// Game catalogue routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game))
        .route(
            "/games/{id}",
            get(get_game).put(update_game).delete(delete_game),
        )
        .route("/games/{id}/stats", get(game_stats))
        .route("/categories", get(categories))
}

#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    security(("bearer" = [])),
    request_body = GameInput,
    responses(
        (status = 201, description = "Game created", body = CreateGameResponse),
        (status = 200, description = "Existing game with the same external id", body = CreateGameResponse),
        (status = 400, description = "Invalid game payload")
    )
)]
/// Create a game, reusing the existing one when the external catalog id is already known.
pub async fn create_game(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Valid(Json(input)): Valid<Json<GameInput>>,
) -> Result<(StatusCode, Json<CreateGameResponse>), AppError> {
    let response = game_service::create_game(&state, &ctx, input).await?;
    let status = if response.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game", body = GameSummary),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::get_game(&state, id).await?))
}

#[utoipa::path(
    put,
    path = "/games/{id}",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = GameInput,
    responses(
        (status = 200, description = "Game updated", body = GameSummary),
        (status = 404, description = "Unknown game")
    )
)]
/// Replace a game's descriptive fields; identity and external id are kept.
pub async fn update_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(input)): Valid<Json<GameInput>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::update_game(&state, id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 204, description = "Game and its ownerships deleted"),
        (status = 403, description = "Caller did not create the game"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/games/{id}/stats",
    tag = "games",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Reaction counts across users", body = GameStatsResponse))
)]
pub async fn game_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameStatsResponse>, AppError> {
    Ok(Json(game_service::game_stats(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "games",
    security(("bearer" = [])),
    responses((status = 200, description = "Sorted categories of owned games", body = [String]))
)]
pub async fn categories(State(state): State<SharedState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(game_service::categories(&state).await?))
}
