//! Process-local [`InventoryStore`] used for development runs and tests.

use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    inventory_store::InventoryStore,
    models::{GameEntity, HouseholdEntity, OwnershipEntity, PreferenceEntity, UserEntity},
    storage::{StorageError, StorageResult, ensure_batch_size},
};

/// Collections kept in insertion order so listings are stable.
#[derive(Default)]
struct Collections {
    games: IndexMap<Uuid, GameEntity>,
    ownerships: IndexMap<Uuid, OwnershipEntity>,
    households: IndexMap<Uuid, HouseholdEntity>,
    users: HashMap<String, UserEntity>,
    preferences: IndexMap<(String, Uuid), PreferenceEntity>,
}

/// In-memory store sharing its collections between clones.
#[derive(Clone, Default)]
pub struct MemoryInventoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InventoryStore for MemoryInventoryStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            if guard.games.contains_key(&game.id) {
                return Err(StorageError::conflict("games", game.id.to_string()));
            }
            guard.games.insert(game.id, game);
            Ok(())
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.games.insert(game.id, game);
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.games.get(&id).cloned()) })
    }

    fn find_game_by_external_id(
        &self,
        external_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .games
                .values()
                .find(|game| game.external_id.as_deref() == Some(external_id.as_str()))
                .cloned())
        })
    }

    fn find_games(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            ensure_batch_size(ids.len())?;
            let guard = inner.read().await;
            Ok(ids
                .iter()
                .filter_map(|id| guard.games.get(id).cloned())
                .collect())
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.games.shift_remove(&id).is_some()) })
    }

    fn insert_ownership(
        &self,
        ownership: OwnershipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            // Check and insert under one write lock so concurrent links cannot both pass.
            let mut guard = inner.write().await;
            let duplicate = guard.ownerships.values().any(|existing| {
                existing.household_id == ownership.household_id
                    && existing.game_id == ownership.game_id
            });
            if duplicate {
                return Err(StorageError::conflict(
                    "ownerships",
                    format!("{}:{}", ownership.household_id, ownership.game_id),
                ));
            }
            guard.ownerships.insert(ownership.id, ownership);
            Ok(())
        })
    }

    fn save_ownership(&self, ownership: OwnershipEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.ownerships.insert(ownership.id, ownership);
            Ok(())
        })
    }

    fn find_ownership(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<OwnershipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.ownerships.get(&id).cloned()) })
    }

    fn find_household_ownership(
        &self,
        household_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<OwnershipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .ownerships
                .values()
                .find(|row| row.household_id == household_id && row.game_id == game_id)
                .cloned())
        })
    }

    fn list_ownerships(
        &self,
        household_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<OwnershipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .ownerships
                .values()
                .filter(|row| household_id.is_none_or(|id| row.household_id == id))
                .cloned()
                .collect())
        })
    }

    fn list_game_ownerships(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<OwnershipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .ownerships
                .values()
                .filter(|row| row.game_id == game_id)
                .cloned()
                .collect())
        })
    }

    fn delete_ownership(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.ownerships.shift_remove(&id).is_some()) })
    }

    fn save_household(&self, household: HouseholdEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner
                .write()
                .await
                .households
                .insert(household.id, household);
            Ok(())
        })
    }

    fn find_household(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<HouseholdEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.households.get(&id).cloned()) })
    }

    fn find_household_by_invite_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<HouseholdEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .households
                .values()
                .find(|household| household.invite_code.as_deref() == Some(code.as_str()))
                .cloned())
        })
    }

    fn list_households(&self) -> BoxFuture<'static, StorageResult<Vec<HouseholdEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.households.values().cloned().collect()) })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.users.insert(user.id.clone(), user);
            Ok(())
        })
    }

    fn find_user(&self, id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.users.get(&id).cloned()) })
    }

    fn save_preference(
        &self,
        preference: PreferenceEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let key = (preference.user_id.clone(), preference.game_id);
            inner.write().await.preferences.insert(key, preference);
            Ok(())
        })
    }

    fn delete_preference(
        &self,
        user_id: String,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .write()
                .await
                .preferences
                .shift_remove(&(user_id, game_id))
                .is_some())
        })
    }

    fn list_user_preferences(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PreferenceEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .preferences
                .values()
                .filter(|row| row.user_id == user_id)
                .cloned()
                .collect())
        })
    }

    fn list_game_preferences(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PreferenceEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .preferences
                .values()
                .filter(|row| row.game_id == game_id)
                .cloned()
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::storage::MAX_BATCH_IDS;

    fn ownership(household_id: Uuid, game_id: Uuid) -> OwnershipEntity {
        OwnershipEntity {
            id: Uuid::new_v4(),
            game_id,
            household_id,
            household_name: "Home".into(),
            added_by: "user-1".into(),
            added_at: SystemTime::now(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn second_link_of_same_game_is_a_conflict() {
        let store = MemoryInventoryStore::new();
        let household = Uuid::new_v4();
        let game = Uuid::new_v4();

        store.insert_ownership(ownership(household, game)).await.unwrap();
        let err = store
            .insert_ownership(ownership(household, game))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict { collection: "ownerships", .. }));
        assert_eq!(store.list_ownerships(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batched_lookup_rejects_oversized_sets() {
        let store = MemoryInventoryStore::new();
        let ids = (0..=MAX_BATCH_IDS).map(|_| Uuid::new_v4()).collect();

        let err = store.find_games(ids).await.unwrap_err();
        assert!(matches!(err, StorageError::BatchTooLarge { requested } if requested == MAX_BATCH_IDS + 1));
    }

    #[tokio::test]
    async fn household_scope_filters_ownerships() {
        let store = MemoryInventoryStore::new();
        let home = Uuid::new_v4();
        let cabin = Uuid::new_v4();
        store.insert_ownership(ownership(home, Uuid::new_v4())).await.unwrap();
        store.insert_ownership(ownership(cabin, Uuid::new_v4())).await.unwrap();

        let scoped = store.list_ownerships(Some(cabin)).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].household_id, cabin);
    }
}
