//! Session bootstrap from an auth-provider identity.

use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::models::UserEntity,
    dto::auth::{MeResponse, SessionRequest, SessionResponse},
    error::ServiceError,
    services::household_service::require_user,
    state::{SharedState, session::SessionContext},
};

/// Create the profile on first sign-in (refreshing email and name afterwards) and issue a token.
pub async fn start_session(
    state: &SharedState,
    request: SessionRequest,
) -> Result<SessionResponse, ServiceError> {
    let store = state.require_store().await?;
    let uid = request.uid.trim().to_owned();

    let user = match store.find_user(uid.clone()).await? {
        Some(mut existing) => {
            existing.email = request.email;
            existing.display_name = request.display_name.trim().to_owned();
            existing
        }
        None => {
            info!(user_id = %uid, provider = ?request.provider, "bootstrapping user profile");
            UserEntity {
                id: uid,
                email: request.email,
                display_name: request.display_name.trim().to_owned(),
                household_id: None,
                created_at: SystemTime::now(),
            }
        }
    };
    store.save_user(user.clone()).await?;

    let session = state.sessions().issue(&user.id);
    Ok(SessionResponse {
        token: session.token,
        user: user.into(),
    })
}

pub fn end_session(state: &SharedState, ctx: &SessionContext) {
    if state.sessions().revoke(&ctx.token) {
        info!(user_id = %ctx.user_id, "session revoked");
    }
}

pub async fn me(state: &SharedState, ctx: &SessionContext) -> Result<MeResponse, ServiceError> {
    let store = state.require_store().await?;
    let user = require_user(&store, ctx).await?;
    let household = match user.household_id {
        Some(id) => store.find_household(id).await?.map(Into::into),
        None => None,
    };
    Ok(MeResponse {
        user: user.into(),
        household,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::inventory_store::memory::MemoryInventoryStore,
        dto::auth::AuthProvider, state::AppState,
    };

    fn request(display_name: &str) -> SessionRequest {
        SessionRequest {
            uid: "uid-1".into(),
            email: "ada@example.com".into(),
            display_name: display_name.into(),
            provider: AuthProvider::Password,
        }
    }

    #[tokio::test]
    async fn first_sign_in_creates_profile_and_later_ones_refresh_it() {
        let state = AppState::new(AppConfig::default()).unwrap();
        state
            .install_store(Arc::new(MemoryInventoryStore::new()))
            .await;

        let first = start_session(&state, request("Ada")).await.unwrap();
        let second = start_session(&state, request("Ada L.")).await.unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(second.user.display_name, "Ada L.");
        assert_eq!(second.user.created_at, first.user.created_at);

        let ctx = state.sessions().resolve(&second.token).unwrap();
        let me = me(&state, &ctx).await.unwrap();
        assert_eq!(me.user.id, "uid-1");
        assert!(me.household.is_none());

        end_session(&state, &ctx);
        assert!(state.sessions().resolve(&second.token).is_none());
    }

    #[tokio::test]
    async fn degraded_mode_refuses_sign_in() {
        let state = AppState::new(AppConfig::default()).unwrap();
        let err = start_session(&state, request("Ada")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
