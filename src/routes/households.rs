use std::convert::Infallible;

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    routing::{get, post},
};
use axum_valid::Valid;
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        household::{
            CreateHouseholdRequest, HouseholdListItem, HouseholdSummary, InviteCodeResponse,
            JoinHouseholdRequest,
        },
        ownership::{AddGameRequest, AddGameResponse, LinkOwnershipRequest, OwnedGameSummary},
    },
    error::AppError,
    services::{household_service, ownership_service, sse_service},
    state::{SharedState, session::SessionContext},
};

/// Household, invite and household-scoped ownership routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/households", get(list_households).post(create_household))
        .route("/households/join", post(join_household))
        .route("/households/{id}", get(get_household))
        .route("/households/{id}/invite-code", post(regenerate_invite_code))
        .route("/households/{id}/ownerships", post(link_game))
        .route("/households/{id}/games", post(add_game))
        .route("/households/{id}/events", get(household_events))
}

#[utoipa::path(
    post,
    path = "/households",
    tag = "households",
    security(("bearer" = [])),
    request_body = CreateHouseholdRequest,
    responses((status = 201, description = "Household created", body = HouseholdSummary))
)]
/// Create a household with the caller as its first member.
pub async fn create_household(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Valid(Json(request)): Valid<Json<CreateHouseholdRequest>>,
) -> Result<(StatusCode, Json<HouseholdSummary>), AppError> {
    let household = household_service::create_household(&state, &ctx, request).await?;
    Ok((StatusCode::CREATED, Json(household)))
}

#[utoipa::path(
    get,
    path = "/households",
    tag = "households",
    security(("bearer" = [])),
    responses((status = 200, description = "All households", body = [HouseholdListItem]))
)]
pub async fn list_households(
    State(state): State<SharedState>,
) -> Result<Json<Vec<HouseholdListItem>>, AppError> {
    Ok(Json(household_service::list_households(&state).await?))
}

#[utoipa::path(
    get,
    path = "/households/{id}",
    tag = "households",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Household identifier")),
    responses(
        (status = 200, description = "Household detail", body = HouseholdSummary),
        (status = 403, description = "Caller is not a member")
    )
)]
pub async fn get_household(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<HouseholdSummary>, AppError> {
    Ok(Json(household_service::get_household(&state, &ctx, id).await?))
}

#[utoipa::path(
    post,
    path = "/households/join",
    tag = "households",
    security(("bearer" = [])),
    request_body = JoinHouseholdRequest,
    responses(
        (status = 200, description = "Joined household", body = HouseholdSummary),
        (status = 404, description = "Unknown invite code")
    )
)]
/// Join a household by invite code (case-insensitive).
pub async fn join_household(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Valid(Json(request)): Valid<Json<JoinHouseholdRequest>>,
) -> Result<Json<HouseholdSummary>, AppError> {
    Ok(Json(
        household_service::join_household(&state, &ctx, request).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/households/{id}/invite-code",
    tag = "households",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Household identifier")),
    responses((status = 200, description = "New invite code", body = InviteCodeResponse))
)]
pub async fn regenerate_invite_code(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<InviteCodeResponse>, AppError> {
    Ok(Json(
        household_service::regenerate_invite_code(&state, &ctx, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/households/{id}/ownerships",
    tag = "ownerships",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Household identifier")),
    request_body = LinkOwnershipRequest,
    responses(
        (status = 201, description = "Game linked", body = OwnedGameSummary),
        (status = 409, description = "Household already owns the game")
    )
)]
/// Link an existing game to the household.
pub async fn link_game(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Valid(Json(request)): Valid<Json<LinkOwnershipRequest>>,
) -> Result<(StatusCode, Json<OwnedGameSummary>), AppError> {
    let owned = ownership_service::link_game(&state, &ctx, id, request).await?;
    Ok((StatusCode::CREATED, Json(owned)))
}

#[utoipa::path(
    post,
    path = "/households/{id}/games",
    tag = "ownerships",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Household identifier")),
    request_body = AddGameRequest,
    responses(
        (status = 201, description = "Game added to the household", body = AddGameResponse),
        (status = 409, description = "Household already owns the game")
    )
)]
/// Create-or-reuse a game and link it to the household in one step.
pub async fn add_game(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Valid(Json(request)): Valid<Json<AddGameRequest>>,
) -> Result<(StatusCode, Json<AddGameResponse>), AppError> {
    let response = ownership_service::add_game(&state, &ctx, id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/households/{id}/events",
    tag = "sse",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Household identifier")),
    responses((status = 200, description = "Household activity stream", content_type = "text/event-stream", body = String))
)]
/// Stream ownership and game changes affecting the household.
pub async fn household_events(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (receiver, handshake) = sse_service::subscribe_household(&state, &ctx, id).await?;
    info!(household_id = %id, user_id = %ctx.user_id, "new household SSE connection");
    Ok(sse_service::to_sse_stream(receiver, handshake, id))
}
