//! Game creation with external-id deduplication, edits, deletion and aggregate stats.

use std::{collections::BTreeSet, sync::Arc, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        inventory_store::InventoryStore,
        models::{GameEntity, ReactionEntity},
    },
    dto::{
        game::{CreateGameResponse, GameInput, GameStatsResponse, GameSummary},
        sse::{GAME_UPDATED, GameUpdatedEvent, OWNERSHIP_REMOVED, OwnershipRemovedEvent},
    },
    error::ServiceError,
    services::{aggregation, filter, sse_service},
    state::{SharedState, session::SessionContext},
};

/// Return the game already registered under the input's external id, or insert a new one.
///
/// The boolean is `true` when a game was inserted.
pub(crate) async fn create_or_reuse(
    store: &Arc<dyn InventoryStore>,
    ctx: &SessionContext,
    input: GameInput,
) -> Result<(GameEntity, bool), ServiceError> {
    if let Some(external_id) = input
        .external_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        && let Some(existing) = store
            .find_game_by_external_id(external_id.to_owned())
            .await?
    {
        debug!(game_id = %existing.id, %external_id, "reusing catalogued game");
        return Ok((existing, false));
    }

    let game = input.into_entity(&ctx.user_id, SystemTime::now());
    store.insert_game(game.clone()).await?;
    info!(game_id = %game.id, name = %game.name, "game created");
    Ok((game, true))
}

pub(crate) async fn require_game(
    store: &Arc<dyn InventoryStore>,
    id: Uuid,
) -> Result<GameEntity, ServiceError> {
    store
        .find_game(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` not found")))
}

pub async fn create_game(
    state: &SharedState,
    ctx: &SessionContext,
    input: GameInput,
) -> Result<CreateGameResponse, ServiceError> {
    let store = state.require_store().await?;
    let (game, created) = create_or_reuse(&store, ctx, input).await?;
    Ok(CreateGameResponse {
        created,
        game: game.into(),
    })
}

pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameSummary, ServiceError> {
    let store = state.require_store().await?;
    Ok(require_game(&store, id).await?.into())
}

/// Replace the descriptive fields of a game and notify every household owning it.
pub async fn update_game(
    state: &SharedState,
    id: Uuid,
    input: GameInput,
) -> Result<GameSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut game = require_game(&store, id).await?;
    input.apply_to(&mut game, SystemTime::now());
    store.save_game(game.clone()).await?;

    let summary = GameSummary::from(game);
    let households: BTreeSet<Uuid> = store
        .list_game_ownerships(id)
        .await?
        .into_iter()
        .map(|row| row.household_id)
        .collect();
    for household_id in households {
        sse_service::publish(
            state,
            household_id,
            GAME_UPDATED,
            &GameUpdatedEvent {
                game: summary.clone(),
            },
        );
    }
    Ok(summary)
}

/// Delete a game created by the caller, along with every ownership of it.
pub async fn delete_game(
    state: &SharedState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let game = require_game(&store, id).await?;
    if game.created_by != ctx.user_id {
        return Err(ServiceError::Forbidden(
            "only the creator may delete a game".into(),
        ));
    }

    let ownerships = store.list_game_ownerships(id).await?;
    for ownership in &ownerships {
        store.delete_ownership(ownership.id).await?;
        sse_service::publish(
            state,
            ownership.household_id,
            OWNERSHIP_REMOVED,
            &OwnershipRemovedEvent {
                ownership_id: ownership.id,
                game_id: id,
            },
        );
    }
    let preferences = store.list_game_preferences(id).await?;
    for preference in &preferences {
        store
            .delete_preference(preference.user_id.clone(), id)
            .await?;
    }
    store.delete_game(id).await?;
    info!(
        game_id = %id,
        removed_ownerships = ownerships.len(),
        removed_preferences = preferences.len(),
        "game deleted"
    );
    Ok(())
}

/// Count likes, dislikes and favorites for a game across all users.
pub async fn game_stats(state: &SharedState, id: Uuid) -> Result<GameStatsResponse, ServiceError> {
    let store = state.require_store().await?;
    require_game(&store, id).await?;
    let rows = store.list_game_preferences(id).await?;

    let mut stats = GameStatsResponse::default();
    for row in rows {
        match row.reaction {
            Some(ReactionEntity::Like) => stats.likes += 1,
            Some(ReactionEntity::Dislike) => stats.dislikes += 1,
            None => {}
        }
        if row.favorite {
            stats.favorites += 1;
        }
    }
    Ok(stats)
}

/// Sorted categories of every owned game.
pub async fn categories(state: &SharedState) -> Result<Vec<String>, ServiceError> {
    let store = state.require_store().await?;
    let owned = aggregation::owned_games(&store, None).await?;
    Ok(filter::unique_categories(owned.iter().map(|entry| &entry.game)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{inventory_store::memory::MemoryInventoryStore, models::PreferenceEntity},
        state::AppState,
    };

    async fn setup() -> (SharedState, Arc<dyn InventoryStore>, SessionContext) {
        let state = AppState::new(AppConfig::default()).unwrap();
        state
            .install_store(Arc::new(MemoryInventoryStore::new()))
            .await;
        let store = state.require_store().await.unwrap();
        let ctx = state.sessions().issue("alice");
        (state, store, ctx)
    }

    fn input(name: &str, external_id: Option<&str>) -> GameInput {
        GameInput {
            name: name.into(),
            description: None,
            min_players: 2,
            max_players: 4,
            play_time: Some(45),
            year_published: None,
            external_id: external_id.map(str::to_owned),
            image_url: None,
            thumbnail_url: None,
            categories: Vec::new(),
            mechanics: Vec::new(),
        }
    }

    #[tokio::test]
    async fn same_external_id_reuses_the_first_game_unmodified() {
        let (state, _store, ctx) = setup().await;

        let first = create_game(&state, &ctx, input("Catan", Some("13")))
            .await
            .unwrap();
        let second = create_game(&state, &ctx, input("Settlers of Catan", Some("13")))
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.game.id, first.game.id);
        assert_eq!(second.game.name, "Catan");
    }

    #[tokio::test]
    async fn games_without_external_id_are_always_inserted() {
        let (state, _store, ctx) = setup().await;

        let first = create_game(&state, &ctx, input("Homebrew", None))
            .await
            .unwrap();
        let second = create_game(&state, &ctx, input("Homebrew", None))
            .await
            .unwrap();

        assert!(first.created && second.created);
        assert_ne!(first.game.id, second.game.id);
    }

    #[tokio::test]
    async fn only_the_creator_may_delete() {
        let (state, store, alice) = setup().await;
        let created = create_game(&state, &alice, input("Azul", None))
            .await
            .unwrap();

        let bob = state.sessions().issue("bob");
        let err = delete_game(&state, &bob, created.game.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        delete_game(&state, &alice, created.game.id).await.unwrap();
        assert!(store.find_game(created.game.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_game_drops_its_preferences() {
        let (state, store, alice) = setup().await;
        let game = create_game(&state, &alice, input("Azul", None))
            .await
            .unwrap()
            .game;
        for user in ["alice", "bob"] {
            store
                .save_preference(PreferenceEntity {
                    user_id: user.into(),
                    game_id: game.id,
                    reaction: Some(ReactionEntity::Like),
                    favorite: true,
                    updated_at: SystemTime::now(),
                })
                .await
                .unwrap();
        }

        delete_game(&state, &alice, game.id).await.unwrap();

        assert!(store.list_game_preferences(game.id).await.unwrap().is_empty());
        assert!(store.list_user_preferences("bob".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_count_reactions_and_favorites_across_users() {
        let (state, store, ctx) = setup().await;
        let game = create_game(&state, &ctx, input("Azul", None))
            .await
            .unwrap()
            .game;

        let rows = [
            ("u1", Some(ReactionEntity::Like), true),
            ("u2", Some(ReactionEntity::Like), false),
            ("u3", Some(ReactionEntity::Dislike), false),
            ("u4", None, true),
        ];
        for (user, reaction, favorite) in rows {
            store
                .save_preference(PreferenceEntity {
                    user_id: user.into(),
                    game_id: game.id,
                    reaction,
                    favorite,
                    updated_at: SystemTime::now(),
                })
                .await
                .unwrap();
        }

        let stats = game_stats(&state, game.id).await.unwrap();
        assert_eq!(
            stats,
            GameStatsResponse {
                likes: 2,
                dislikes: 1,
                favorites: 2
            }
        );
    }
}
