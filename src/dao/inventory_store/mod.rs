pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    GameEntity, HouseholdEntity, OwnershipEntity, PreferenceEntity, UserEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the document store holding the shared game inventory.
///
/// Batched game lookups accept at most [`MAX_BATCH_IDS`](crate::dao::storage::MAX_BATCH_IDS)
/// identifiers; callers chunk larger sets. Ownership and preference inserts are unique per
/// `(household, game)` and `(user, game)` and report [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict)
/// when that rule is broken.
pub trait InventoryStore: Send + Sync {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn find_game_by_external_id(
        &self,
        external_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn find_games(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn insert_ownership(&self, ownership: OwnershipEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    fn save_ownership(&self, ownership: OwnershipEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_ownership(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<OwnershipEntity>>>;
    fn find_household_ownership(
        &self,
        household_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<OwnershipEntity>>>;
    /// List ownership rows, restricted to one household when `household_id` is set.
    fn list_ownerships(
        &self,
        household_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<OwnershipEntity>>>;
    fn list_game_ownerships(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<OwnershipEntity>>>;
    fn delete_ownership(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn save_household(&self, household: HouseholdEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_household(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<HouseholdEntity>>>;
    fn find_household_by_invite_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<HouseholdEntity>>>;
    fn list_households(&self) -> BoxFuture<'static, StorageResult<Vec<HouseholdEntity>>>;

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_user(&self, id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;

    fn save_preference(&self, preference: PreferenceEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    fn delete_preference(
        &self,
        user_id: String,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn list_user_preferences(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PreferenceEntity>>>;
    fn list_game_preferences(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PreferenceEntity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
