//! Linking games to households and the owned-game listing.

use std::{sync::Arc, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        inventory_store::InventoryStore,
        models::{GameEntity, HouseholdEntity, OwnershipEntity},
    },
    dto::{
        ownership::{
            AddGameRequest, AddGameResponse, LinkOwnershipRequest, OwnedGameSummary,
            OwnedGamesQuery, UpdateOwnershipRequest,
        },
        sse::{
            OWNERSHIP_ADDED, OWNERSHIP_REMOVED, OWNERSHIP_UPDATED, OwnershipChangedEvent,
            OwnershipRemovedEvent,
        },
    },
    error::ServiceError,
    services::{
        aggregation, filter,
        game_service::{create_or_reuse, require_game},
        household_service::require_member,
        sse_service,
    },
    state::{SharedState, owned::OwnedGame, session::SessionContext},
};

/// Insert an ownership row unless the household already owns the game.
///
/// The pre-check gives a readable error; the store rejects a concurrent duplicate on its own.
async fn link(
    state: &SharedState,
    store: &Arc<dyn InventoryStore>,
    ctx: &SessionContext,
    household: &HouseholdEntity,
    game: GameEntity,
    notes: Option<String>,
) -> Result<OwnedGame, ServiceError> {
    if store
        .find_household_ownership(household.id, game.id)
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "household `{}` already owns game `{}`",
            household.id, game.id
        )));
    }

    let ownership = OwnershipEntity {
        id: Uuid::new_v4(),
        game_id: game.id,
        household_id: household.id,
        household_name: household.name.clone(),
        added_by: ctx.user_id.clone(),
        added_at: SystemTime::now(),
        notes: notes.filter(|text| !text.trim().is_empty()),
    };
    store.insert_ownership(ownership.clone()).await?;
    info!(
        ownership_id = %ownership.id,
        game_id = %game.id,
        household_id = %household.id,
        "game linked to household"
    );

    let owned = owned_view(store, game, ownership).await?;
    sse_service::publish(
        state,
        household.id,
        OWNERSHIP_ADDED,
        &OwnershipChangedEvent {
            owned_game: owned.clone().into(),
        },
    );
    Ok(owned)
}

async fn owned_view(
    store: &Arc<dyn InventoryStore>,
    game: GameEntity,
    ownership: OwnershipEntity,
) -> Result<OwnedGame, ServiceError> {
    let owners = store.list_game_ownerships(game.id).await?;
    let owner_count = aggregation::owner_counts(&owners)
        .get(&game.id)
        .copied()
        .unwrap_or(1);
    Ok(OwnedGame {
        game,
        ownership,
        owner_count,
    })
}

async fn require_ownership(
    store: &Arc<dyn InventoryStore>,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<OwnershipEntity, ServiceError> {
    let ownership = store
        .find_ownership(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("ownership `{id}` not found")))?;
    require_member(store, ctx, ownership.household_id).await?;
    Ok(ownership)
}

pub async fn link_game(
    state: &SharedState,
    ctx: &SessionContext,
    household_id: Uuid,
    request: LinkOwnershipRequest,
) -> Result<OwnedGameSummary, ServiceError> {
    let store = state.require_store().await?;
    let household = require_member(&store, ctx, household_id).await?;
    let game = require_game(&store, request.game_id).await?;
    Ok(link(state, &store, ctx, &household, game, request.notes)
        .await?
        .into())
}

/// Create the game (or reuse the catalogued one) and link it to the household.
pub async fn add_game(
    state: &SharedState,
    ctx: &SessionContext,
    household_id: Uuid,
    request: AddGameRequest,
) -> Result<AddGameResponse, ServiceError> {
    let store = state.require_store().await?;
    let household = require_member(&store, ctx, household_id).await?;
    let (game, created) = create_or_reuse(&store, ctx, request.game).await?;
    let owned = link(state, &store, ctx, &household, game, request.notes).await?;
    Ok(AddGameResponse {
        created,
        owned_game: owned.into(),
    })
}

pub async fn update_ownership(
    state: &SharedState,
    ctx: &SessionContext,
    id: Uuid,
    request: UpdateOwnershipRequest,
) -> Result<OwnedGameSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut ownership = require_ownership(&store, ctx, id).await?;
    ownership.notes = request.notes.filter(|text| !text.trim().is_empty());
    store.save_ownership(ownership.clone()).await?;

    let game = require_game(&store, ownership.game_id).await?;
    let household_id = ownership.household_id;
    let summary = OwnedGameSummary::from(owned_view(&store, game, ownership).await?);
    sse_service::publish(
        state,
        household_id,
        OWNERSHIP_UPDATED,
        &OwnershipChangedEvent {
            owned_game: summary.clone(),
        },
    );
    Ok(summary)
}

pub async fn delete_ownership(
    state: &SharedState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let ownership = require_ownership(&store, ctx, id).await?;
    store.delete_ownership(id).await?;
    info!(ownership_id = %id, household_id = %ownership.household_id, "ownership removed");
    sse_service::publish(
        state,
        ownership.household_id,
        OWNERSHIP_REMOVED,
        &OwnershipRemovedEvent {
            ownership_id: id,
            game_id: ownership.game_id,
        },
    );
    Ok(())
}

/// Aggregate, then filter, the owned games visible to any signed-in user.
pub async fn list_owned_games(
    state: &SharedState,
    query: &OwnedGamesQuery,
) -> Result<Vec<OwnedGameSummary>, ServiceError> {
    let store = state.require_store().await?;
    let filter = query.to_filter()?;
    let owned = aggregation::owned_games(&store, query.household_id).await?;
    Ok(filter::filter_games(owned, &filter)
        .into_iter()
        .map(Into::into)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{inventory_store::memory::MemoryInventoryStore, models::UserEntity},
        dto::{game::GameInput, household::CreateHouseholdRequest},
        services::household_service,
        state::AppState,
    };

    async fn setup() -> (SharedState, SessionContext, Uuid) {
        let state = AppState::new(AppConfig::default()).unwrap();
        state
            .install_store(Arc::new(MemoryInventoryStore::new()))
            .await;
        let store = state.require_store().await.unwrap();
        store
            .save_user(UserEntity {
                id: "alice".into(),
                email: "alice@example.com".into(),
                display_name: "Alice".into(),
                household_id: None,
                created_at: SystemTime::now(),
            })
            .await
            .unwrap();
        let ctx = state.sessions().issue("alice");
        let household = household_service::create_household(
            &state,
            &ctx,
            CreateHouseholdRequest {
                name: "Home".into(),
            },
        )
        .await
        .unwrap();
        (state, ctx, household.id)
    }

    fn catan() -> GameInput {
        GameInput {
            name: "Catan".into(),
            description: None,
            min_players: 3,
            max_players: 4,
            play_time: Some(90),
            year_published: Some(1995),
            external_id: Some("13".into()),
            image_url: None,
            thumbnail_url: None,
            categories: vec!["Negotiation".into()],
            mechanics: Vec::new(),
        }
    }

    #[tokio::test]
    async fn linking_the_same_game_twice_is_a_conflict() {
        let (state, ctx, household_id) = setup().await;
        let added = add_game(
            &state,
            &ctx,
            household_id,
            AddGameRequest {
                game: catan(),
                notes: None,
            },
        )
        .await
        .unwrap();
        assert!(added.created);

        let err = link_game(
            &state,
            &ctx,
            household_id,
            LinkOwnershipRequest {
                game_id: added.owned_game.game.id,
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn non_members_cannot_link_games() {
        let (state, _alice, household_id) = setup().await;
        let bob = state.sessions().issue("bob");

        let err = add_game(
            &state,
            &bob,
            household_id,
            AddGameRequest {
                game: catan(),
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn owned_games_are_filtered_from_the_query() {
        let (state, ctx, household_id) = setup().await;
        add_game(
            &state,
            &ctx,
            household_id,
            AddGameRequest {
                game: catan(),
                notes: Some("missing one sheep".into()),
            },
        )
        .await
        .unwrap();

        let all = list_owned_games(&state, &OwnedGamesQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].ownership.notes.as_deref(), Some("missing one sheep"));

        let two_players = OwnedGamesQuery {
            players: Some(2),
            ..OwnedGamesQuery::default()
        };
        assert!(
            list_owned_games(&state, &two_players)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn removing_an_ownership_publishes_to_the_household() {
        let (state, ctx, household_id) = setup().await;
        let added = add_game(
            &state,
            &ctx,
            household_id,
            AddGameRequest {
                game: catan(),
                notes: None,
            },
        )
        .await
        .unwrap();
        let mut events = state.household_sse().subscribe(household_id);

        delete_ownership(&state, &ctx, added.owned_game.ownership.id)
            .await
            .unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(OWNERSHIP_REMOVED));
        assert!(
            list_owned_games(&state, &OwnedGamesQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
