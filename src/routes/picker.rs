use std::{convert::Infallible, time::Duration};

use axum::{
    Extension, Json, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use futures::{Stream, StreamExt};

use crate::{
    dto::picker::{PickerRequest, QuickPickResponse, SpinStartResponse, SpinStatusResponse},
    error::AppError,
    services::{picker_service, sse_service},
    state::{SharedState, session::SessionContext},
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/picker/quick-pick", post(quick_pick))
        .route("/picker/spin", post(start_spin).get(spin_status))
        .route("/picker/spin/stream", get(spin_stream))
}

#[utoipa::path(
    post,
    path = "/picker/quick-pick",
    tag = "picker",
    security(("bearer" = [])),
    request_body = PickerRequest,
    responses((status = 200, description = "Random game from the filtered pool", body = QuickPickResponse))
)]
/// Draw one game uniformly from the deduplicated, filtered pool.
pub async fn quick_pick(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Json(request): Json<PickerRequest>,
) -> Result<Json<QuickPickResponse>, AppError> {
    Ok(Json(picker_service::quick_pick(&state, &ctx, request).await?))
}

#[utoipa::path(
    post,
    path = "/picker/spin",
    tag = "picker",
    security(("bearer" = [])),
    request_body = PickerRequest,
    responses(
        (status = 200, description = "Spin started (or empty pool)", body = SpinStartResponse),
        (status = 409, description = "A spin is still running")
    )
)]
/// Start a timed spin; the selection is fixed now and revealed when the spin ends.
pub async fn start_spin(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
    Json(request): Json<PickerRequest>,
) -> Result<Json<SpinStartResponse>, AppError> {
    Ok(Json(picker_service::start_spin(&state, &ctx, request).await?))
}

#[utoipa::path(
    get,
    path = "/picker/spin",
    tag = "picker",
    security(("bearer" = [])),
    responses((status = 200, description = "Current spin phase", body = SpinStatusResponse))
)]
pub async fn spin_status(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
) -> Json<SpinStatusResponse> {
    Json(picker_service::spin_status(&state, &ctx))
}

#[utoipa::path(
    get,
    path = "/picker/spin/stream",
    tag = "picker",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "`frame` events then one `reveal`", content_type = "text/event-stream", body = String),
        (status = 404, description = "No spin started")
    )
)]
/// Stream the cosmetic reel of the caller's latest spin, ending with the reveal.
pub async fn spin_stream(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let events = picker_service::spin_stream(&state, &ctx)?;
    Ok(Sse::new(events.map(|event| Ok(sse_service::to_event(event))))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
