//! Household lifecycle: creation, invite codes and membership.

use std::{sync::Arc, time::SystemTime};

use rand::{Rng, rng};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        inventory_store::InventoryStore,
        models::{HouseholdEntity, UserEntity},
    },
    dto::household::{
        CreateHouseholdRequest, HouseholdListItem, HouseholdSummary, InviteCodeResponse,
        JoinHouseholdRequest,
    },
    error::ServiceError,
    state::{SharedState, session::SessionContext},
};

/// Characters invite codes are drawn from. `I`, `O`, `0` and `1` are left out.
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const INVITE_CODE_LEN: usize = 6;
const INVITE_CODE_ATTEMPTS: usize = 8;

/// Draw one invite code from [`INVITE_CODE_ALPHABET`].
pub fn generate_invite_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CODE_ALPHABET[rng.random_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Canonical form used for lookups.
pub fn normalize_invite_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// Generate a code no other household uses yet.
async fn unused_invite_code(store: &Arc<dyn InventoryStore>) -> Result<String, ServiceError> {
    for _ in 0..INVITE_CODE_ATTEMPTS {
        let code = generate_invite_code(&mut rng());
        if store
            .find_household_by_invite_code(code.clone())
            .await?
            .is_none()
        {
            return Ok(code);
        }
        warn!(%code, "invite code collision; drawing another");
    }
    Err(ServiceError::InvalidState(
        "could not allocate a unique invite code".into(),
    ))
}

pub(crate) async fn require_user(
    store: &Arc<dyn InventoryStore>,
    ctx: &SessionContext,
) -> Result<UserEntity, ServiceError> {
    store
        .find_user(ctx.user_id.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user `{}` not found", ctx.user_id)))
}

/// Load a household and check the caller belongs to it.
pub(crate) async fn require_member(
    store: &Arc<dyn InventoryStore>,
    ctx: &SessionContext,
    household_id: Uuid,
) -> Result<HouseholdEntity, ServiceError> {
    let household = store
        .find_household(household_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("household `{household_id}` not found")))?;

    if !household.members.contains(&ctx.user_id) {
        return Err(ServiceError::Forbidden(format!(
            "not a member of household `{household_id}`"
        )));
    }
    Ok(household)
}

async fn point_user_at(
    store: &Arc<dyn InventoryStore>,
    ctx: &SessionContext,
    household_id: Uuid,
) -> Result<(), ServiceError> {
    let mut user = require_user(store, ctx).await?;
    user.household_id = Some(household_id);
    store.save_user(user).await?;
    Ok(())
}

pub async fn create_household(
    state: &SharedState,
    ctx: &SessionContext,
    request: CreateHouseholdRequest,
) -> Result<HouseholdSummary, ServiceError> {
    let store = state.require_store().await?;
    let household = HouseholdEntity {
        id: Uuid::new_v4(),
        name: request.name.trim().to_owned(),
        members: vec![ctx.user_id.clone()],
        created_by: ctx.user_id.clone(),
        created_at: SystemTime::now(),
        invite_code: Some(unused_invite_code(&store).await?),
    };

    store.save_household(household.clone()).await?;
    point_user_at(&store, ctx, household.id).await?;
    info!(household_id = %household.id, user_id = %ctx.user_id, "household created");
    Ok(household.into())
}

pub async fn list_households(state: &SharedState) -> Result<Vec<HouseholdListItem>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store
        .list_households()
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_household(
    state: &SharedState,
    ctx: &SessionContext,
    household_id: Uuid,
) -> Result<HouseholdSummary, ServiceError> {
    let store = state.require_store().await?;
    Ok(require_member(&store, ctx, household_id).await?.into())
}

/// Join the household holding `invite_code`. Joining twice is a no-op.
pub async fn join_household(
    state: &SharedState,
    ctx: &SessionContext,
    request: JoinHouseholdRequest,
) -> Result<HouseholdSummary, ServiceError> {
    let store = state.require_store().await?;
    let code = normalize_invite_code(&request.invite_code);
    let mut household = store
        .find_household_by_invite_code(code.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("invite code `{code}` not found")))?;

    if !household.members.contains(&ctx.user_id) {
        household.members.push(ctx.user_id.clone());
        store.save_household(household.clone()).await?;
        info!(household_id = %household.id, user_id = %ctx.user_id, "user joined household");
    }
    point_user_at(&store, ctx, household.id).await?;
    Ok(household.into())
}

pub async fn regenerate_invite_code(
    state: &SharedState,
    ctx: &SessionContext,
    household_id: Uuid,
) -> Result<InviteCodeResponse, ServiceError> {
    let store = state.require_store().await?;
    let mut household = require_member(&store, ctx, household_id).await?;
    let invite_code = unused_invite_code(&store).await?;
    household.invite_code = Some(invite_code.clone());
    store.save_household(household).await?;
    Ok(InviteCodeResponse { invite_code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::inventory_store::memory::MemoryInventoryStore, state::AppState,
    };

    async fn state_with_user(user_id: &str) -> (SharedState, SessionContext) {
        let state = AppState::new(AppConfig::default()).unwrap();
        state
            .install_store(Arc::new(MemoryInventoryStore::new()))
            .await;
        let store = state.require_store().await.unwrap();
        store
            .save_user(UserEntity {
                id: user_id.into(),
                email: format!("{user_id}@example.com"),
                display_name: user_id.into(),
                household_id: None,
                created_at: SystemTime::now(),
            })
            .await
            .unwrap();
        let ctx = state.sessions().issue(user_id);
        (state, ctx)
    }

    #[test]
    fn invite_codes_use_the_unambiguous_alphabet() {
        let mut rng = rng();
        for _ in 0..200 {
            let code = generate_invite_code(&mut rng);
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b)));
            assert!(!code.contains(['I', 'O', '0', '1']));
        }
    }

    #[test]
    fn invite_code_input_is_trimmed_and_upper_cased() {
        assert_eq!(normalize_invite_code("  abc123 "), "ABC123");
    }

    #[tokio::test]
    async fn lowercase_invite_code_joins_household() {
        let (state, alice) = state_with_user("alice").await;
        let household = create_household(
            &state,
            &alice,
            CreateHouseholdRequest {
                name: "The Smiths".into(),
            },
        )
        .await
        .unwrap();

        let store = state.require_store().await.unwrap();
        let mut stored = store.find_household(household.id).await.unwrap().unwrap();
        stored.invite_code = Some("ABC123".into());
        store.save_household(stored).await.unwrap();

        store
            .save_user(UserEntity {
                id: "bob".into(),
                email: "bob@example.com".into(),
                display_name: "Bob".into(),
                household_id: None,
                created_at: SystemTime::now(),
            })
            .await
            .unwrap();
        let bob = state.sessions().issue("bob");

        let joined = join_household(
            &state,
            &bob,
            JoinHouseholdRequest {
                invite_code: "abc123".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(joined.id, household.id);
        assert_eq!(joined.members, vec!["alice".to_string(), "bob".to_string()]);
        let bob_profile = store.find_user("bob".into()).await.unwrap().unwrap();
        assert_eq!(bob_profile.household_id, Some(household.id));
    }

    #[tokio::test]
    async fn unknown_invite_code_is_not_found() {
        let (state, alice) = state_with_user("alice").await;
        let err = join_household(
            &state,
            &alice,
            JoinHouseholdRequest {
                invite_code: "ZZZZZZ".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_members_cannot_read_household() {
        let (state, alice) = state_with_user("alice").await;
        let household = create_household(
            &state,
            &alice,
            CreateHouseholdRequest {
                name: "The Smiths".into(),
            },
        )
        .await
        .unwrap();

        let mallory = state.sessions().issue("mallory");
        let err = get_household(&state, &mallory, household.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
