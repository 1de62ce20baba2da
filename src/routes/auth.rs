use axum::{
    Extension, Json, Router,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dto::auth::{MeResponse, SessionRequest, SessionResponse},
    error::{AppError, ServiceError},
    services::auth_service,
    state::{SharedState, session::SessionContext},
};

/// Routes reachable without a bearer token.
pub fn public_router() -> Router<SharedState> {
    Router::new().route("/auth/session", post(start_session))
}

/// Session routes that require a bearer token.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/session", delete(end_session))
        .route("/me", get(me))
}

/// Resolve `Authorization: Bearer <token>` into a [`SessionContext`] request extension.
pub async fn require_session(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ServiceError::Unauthenticated)?;

    let session = state
        .sessions()
        .resolve(token)
        .ok_or(ServiceError::Unauthenticated)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

#[utoipa::path(
    post,
    path = "/auth/session",
    tag = "auth",
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 400, description = "Invalid identity payload"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Exchange an auth-provider identity for a bearer token, creating the profile on first sign-in.
pub async fn start_session(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<SessionRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(auth_service::start_session(&state, request).await?))
}

#[utoipa::path(
    delete,
    path = "/auth/session",
    tag = "auth",
    security(("bearer" = [])),
    responses((status = 204, description = "Session revoked"))
)]
/// Revoke the bearer token used for this request.
pub async fn end_session(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
) -> StatusCode {
    auth_service::end_session(&state, &ctx);
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    security(("bearer" = [])),
    responses((status = 200, description = "Caller profile and household", body = MeResponse))
)]
/// Return the caller's profile and the household it points at.
pub async fn me(
    State(state): State<SharedState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<MeResponse>, AppError> {
    Ok(Json(auth_service::me(&state, &ctx).await?))
}
