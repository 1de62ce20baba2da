use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        preference::{PreferenceSummary, PreferencesQuery, SetReactionRequest},
        split_list,
    },
    error::AppError,
    services::preference_service,
    state::{SharedState, session::SessionContext},
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/preferences", get(list_preferences))
        .route("/preferences/{game_id}/reaction", put(set_reaction))
        .route("/preferences/{game_id}/favorite", post(toggle_favorite))
}

#[utoipa::path(
    put,
    path = "/preferences/{game_id}/reaction",
    tag = "preferences",
    security(("bearer" = [])),
    params(("game_id" = Uuid, Path, description = "Game identifier")),
    request_body = SetReactionRequest,
    responses((status = 200, description = "Resulting preference", body = PreferenceSummary))
)]
/// Set the caller's reaction; repeating the current reaction clears it.
pub async fn set_reaction(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<SetReactionRequest>,
) -> Result<Json<PreferenceSummary>, AppError> {
    let reaction = request.reaction.map(Into::into);
    Ok(Json(
        preference_service::set_reaction(&state, &ctx, game_id, reaction).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/preferences/{game_id}/favorite",
    tag = "preferences",
    security(("bearer" = [])),
    params(("game_id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Resulting preference", body = PreferenceSummary))
)]
pub async fn toggle_favorite(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<PreferenceSummary>, AppError> {
    Ok(Json(
        preference_service::toggle_favorite(&state, &ctx, game_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/preferences",
    tag = "preferences",
    security(("bearer" = [])),
    params(PreferencesQuery),
    responses(
        (status = 200, description = "Caller preferences", body = [PreferenceSummary]),
        (status = 400, description = "Malformed game id")
    )
)]
pub async fn list_preferences(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<PreferencesQuery>,
) -> Result<Json<Vec<PreferenceSummary>>, AppError> {
    let game_ids = match query.game_ids.as_deref() {
        Some(raw) => Some(
            split_list(Some(raw))
                .iter()
                .map(|id| {
                    Uuid::parse_str(id)
                        .map_err(|_| AppError::BadRequest(format!("invalid game id `{id}`")))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => None,
    };
    Ok(Json(
        preference_service::list_preferences(&state, &ctx, game_ids).await?,
    ))
}
