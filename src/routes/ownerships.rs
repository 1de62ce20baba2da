use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::ownership::{OwnedGameSummary, OwnedGamesQuery, UpdateOwnershipRequest},
    error::AppError,
    services::ownership_service,
    state::{SharedState, session::SessionContext},
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/ownerships/{id}",
            patch(update_ownership).delete(delete_ownership),
        )
        .route("/owned-games", get(list_owned_games))
}

#[utoipa::path(
    patch,
    path = "/ownerships/{id}",
    tag = "ownerships",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Ownership identifier")),
    request_body = UpdateOwnershipRequest,
    responses(
        (status = 200, description = "Notes updated", body = OwnedGameSummary),
        (status = 403, description = "Caller is not a member of the owning household")
    )
)]
pub async fn update_ownership(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Valid(Json(request)): Valid<Json<UpdateOwnershipRequest>>,
) -> Result<Json<OwnedGameSummary>, AppError> {
    Ok(Json(
        ownership_service::update_ownership(&state, &ctx, id, request).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/ownerships/{id}",
    tag = "ownerships",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Ownership identifier")),
    responses((status = 204, description = "Ownership removed"))
)]
pub async fn delete_ownership(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ownership_service::delete_ownership(&state, &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/owned-games",
    tag = "ownerships",
    security(("bearer" = [])),
    params(OwnedGamesQuery),
    responses(
        (status = 200, description = "Owned games sorted by name", body = [OwnedGameSummary]),
        (status = 400, description = "Malformed household id")
    )
)]
/// List owned games across households, narrowed by the query filters.
pub async fn list_owned_games(
    State(state): State<SharedState>,
    Query(query): Query<OwnedGamesQuery>,
) -> Result<Json<Vec<OwnedGameSummary>>, AppError> {
    Ok(Json(
        ownership_service::list_owned_games(&state, &query).await?,
    ))
}
