use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::{
        catalog::{CatalogSearchQuery, CatalogSearchResponse},
        game::GameInput,
    },
    error::AppError,
    services::catalog_service,
    state::{SharedState, session::SessionContext},
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/catalog/search", get(search))
        .route("/catalog/games/{external_id}", get(details))
}

#[utoipa::path(
    get,
    path = "/catalog/search",
    tag = "catalog",
    security(("bearer" = [])),
    params(CatalogSearchQuery),
    responses(
        (status = 200, description = "Catalog candidates", body = CatalogSearchResponse),
        (status = 502, description = "Catalog failure")
    )
)]
/// Search the external catalog by name.
pub async fn search(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<CatalogSearchQuery>,
) -> Result<Json<CatalogSearchResponse>, AppError> {
    let text = query.query.unwrap_or_default();
    Ok(Json(catalog_service::search(&state, &ctx, &text).await?))
}

#[utoipa::path(
    get,
    path = "/catalog/games/{external_id}",
    tag = "catalog",
    security(("bearer" = [])),
    params(("external_id" = String, Path, description = "Catalog identifier")),
    responses(
        (status = 200, description = "Prefilled game payload", body = GameInput),
        (status = 404, description = "Unknown catalog game"),
        (status = 502, description = "Catalog failure"),
        (status = 504, description = "Catalog still processing after every attempt")
    )
)]
/// Fetch catalog details shaped as a game payload.
pub async fn details(
    State(state): State<SharedState>,
    Path(external_id): Path<String>,
) -> Result<Json<GameInput>, AppError> {
    Ok(Json(catalog_service::details(&state, &external_id).await?))
}
