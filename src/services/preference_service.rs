//! Reaction and favorite updates with sparse storage.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::inventory_store::InventoryStore,
    dto::preference::PreferenceSummary,
    error::ServiceError,
    services::game_service::require_game,
    state::{
        SharedState,
        preference::{PreferenceState, PreferenceWrite, Reaction},
        session::SessionContext,
    },
};

/// The caller's preferences, fetched once and indexed by game.
#[derive(Debug, Default)]
pub struct PreferenceIndex {
    by_game: HashMap<Uuid, PreferenceState>,
}

impl PreferenceIndex {
    pub async fn load(
        store: &Arc<dyn InventoryStore>,
        ctx: &SessionContext,
    ) -> Result<Self, ServiceError> {
        let rows = store.list_user_preferences(ctx.user_id.clone()).await?;
        Ok(Self {
            by_game: rows
                .iter()
                .map(|row| (row.game_id, PreferenceState::from(Some(row))))
                .collect(),
        })
    }

    pub fn get(&self, game_id: Uuid) -> PreferenceState {
        self.by_game.get(&game_id).copied().unwrap_or_default()
    }

    fn into_summaries(self) -> Vec<PreferenceSummary> {
        self.by_game
            .into_iter()
            .map(|(game_id, state)| PreferenceSummary::new(game_id, state))
            .collect()
    }
}

async fn current_state(
    store: &Arc<dyn InventoryStore>,
    ctx: &SessionContext,
    game_id: Uuid,
) -> Result<PreferenceState, ServiceError> {
    let rows = store.list_user_preferences(ctx.user_id.clone()).await?;
    Ok(PreferenceState::from(
        rows.iter().find(|row| row.game_id == game_id),
    ))
}

async fn persist(
    store: &Arc<dyn InventoryStore>,
    ctx: &SessionContext,
    game_id: Uuid,
    next: PreferenceState,
) -> Result<PreferenceSummary, ServiceError> {
    match next.to_write(&ctx.user_id, game_id, SystemTime::now()) {
        PreferenceWrite::Delete { user_id, game_id } => {
            store.delete_preference(user_id, game_id).await?;
            debug!(user_id = %ctx.user_id, %game_id, "preference cleared");
        }
        PreferenceWrite::Upsert(row) => store.save_preference(row).await?,
    }
    Ok(PreferenceSummary::new(game_id, next))
}

pub async fn set_reaction(
    state: &SharedState,
    ctx: &SessionContext,
    game_id: Uuid,
    reaction: Option<Reaction>,
) -> Result<PreferenceSummary, ServiceError> {
    let store = state.require_store().await?;
    require_game(&store, game_id).await?;
    let next = current_state(&store, ctx, game_id)
        .await?
        .set_reaction(reaction);
    persist(&store, ctx, game_id, next).await
}

pub async fn toggle_favorite(
    state: &SharedState,
    ctx: &SessionContext,
    game_id: Uuid,
) -> Result<PreferenceSummary, ServiceError> {
    let store = state.require_store().await?;
    require_game(&store, game_id).await?;
    let next = current_state(&store, ctx, game_id).await?.toggle_favorite();
    persist(&store, ctx, game_id, next).await
}

/// Answer each requested game from one fetch of the caller's rows; `None` lists stored rows.
pub async fn list_preferences(
    state: &SharedState,
    ctx: &SessionContext,
    game_ids: Option<Vec<Uuid>>,
) -> Result<Vec<PreferenceSummary>, ServiceError> {
    let store = state.require_store().await?;
    let index = PreferenceIndex::load(&store, ctx).await?;
    Ok(match game_ids {
        Some(ids) => ids
            .into_iter()
            .map(|game_id| PreferenceSummary::new(game_id, index.get(game_id)))
            .collect(),
        None => index.into_summaries(),
    })
}
