use axum::{Router, middleware};

use crate::state::SharedState;

pub mod auth;
pub mod catalog;
pub mod docs;
pub mod games;
pub mod health;
pub mod households;
pub mod ownerships;
pub mod picker;
pub mod preferences;

/// Compose all route trees; everything except health, docs and sign-in requires a session.
pub fn router(state: SharedState) -> Router<()> {
    let protected = auth::router()
        .merge(games::router())
        .merge(households::router())
        .merge(ownerships::router())
        .merge(preferences::router())
        .merge(picker::router())
        .merge(catalog::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let public = health::router()
        .merge(auth::public_router())
        .merge(docs::router());

    public.merge(protected).with_state(state)
}
