use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    connection::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{
        GAME_COLLECTION, HOUSEHOLD_COLLECTION, MongoGameDocument, MongoHouseholdDocument,
        MongoOwnershipDocument, MongoPreferenceDocument, MongoUserDocument, OWNERSHIP_COLLECTION,
        PREFERENCE_COLLECTION, USER_COLLECTION, doc_id, preference_key,
    },
};
use crate::dao::{
    inventory_store::InventoryStore,
    models::{GameEntity, HouseholdEntity, OwnershipEntity, PreferenceEntity, UserEntity},
    storage::{StorageResult, ensure_batch_size},
};

/// MongoDB-backed [`InventoryStore`] implementation.
#[derive(Clone)]
pub struct MongoInventoryStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Held so the driver's connection pool lives as long as the database handle.
    _client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = self.config.open().await?;
        let mut guard = self.state.write().await;
        guard._client = client;
        guard.database = database;
        Ok(())
    }
}

/// Index definitions: `(collection, index name, keys, unique)`.
const INDEXES: &[(&str, &str, &[&str], bool)] = &[
    (GAME_COLLECTION, "game_name_idx", &["name"], false),
    (GAME_COLLECTION, "game_external_id_idx", &["external_id"], false),
    (
        OWNERSHIP_COLLECTION,
        "ownership_household_game_idx",
        &["household_id", "game_id"],
        true,
    ),
    (OWNERSHIP_COLLECTION, "ownership_game_idx", &["game_id"], false),
    (
        PREFERENCE_COLLECTION,
        "preference_user_game_idx",
        &["user_id", "game_id"],
        true,
    ),
    (
        HOUSEHOLD_COLLECTION,
        "household_invite_code_idx",
        &["invite_code"],
        false,
    ),
];

impl MongoInventoryStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = config.open().await?;
        info!(database = %config.database_name, "connected to MongoDB");

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState {
                _client: client,
                database,
            }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        for &(collection, name, fields, unique) in INDEXES {
            let mut keys = Document::new();
            for field in fields {
                keys.insert(*field, 1);
            }
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: name,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn find_one<D, E>(
        &self,
        collection: &'static str,
        filter: Document,
    ) -> MongoResult<Option<E>>
    where
        D: DeserializeOwned + Send + Sync + TryInto<E, Error = MongoDaoError>,
    {
        self.collection::<D>(collection)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::read(collection, source))?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_many<D, E>(
        &self,
        collection: &'static str,
        filter: Document,
    ) -> MongoResult<Vec<E>>
    where
        D: DeserializeOwned + Send + Sync + TryInto<E, Error = MongoDaoError>,
    {
        let documents: Vec<D> = self
            .collection::<D>(collection)
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::read(collection, source))?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::read(collection, source))?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert<D>(
        &self,
        collection: &'static str,
        key: String,
        document: D,
    ) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(collection)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::write(collection, key, source))?;
        Ok(())
    }

    async fn upsert<D>(
        &self,
        collection: &'static str,
        filter: Document,
        key: String,
        document: D,
    ) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(collection)
            .await
            .replace_one(filter, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::write(collection, key, source))?;
        Ok(())
    }

    async fn delete(
        &self,
        collection: &'static str,
        filter: Document,
        key: String,
    ) -> MongoResult<bool> {
        let result = self
            .collection::<Document>(collection)
            .await
            .delete_one(filter)
            .await
            .map_err(|source| MongoDaoError::write(collection, key, source))?;
        Ok(result.deleted_count > 0)
    }
}

impl InventoryStore for MongoInventoryStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = game.id.to_string();
            let document: MongoGameDocument = game.into();
            store
                .insert(GAME_COLLECTION, key, document)
                .await
                .map_err(Into::into)
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc_id(game.id);
            let key = game.id.to_string();
            let document: MongoGameDocument = game.into();
            store
                .upsert(GAME_COLLECTION, filter, key, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoGameDocument, GameEntity>(GAME_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_game_by_external_id(
        &self,
        external_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoGameDocument, GameEntity>(
                    GAME_COLLECTION,
                    doc! {"external_id": external_id},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_games(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            ensure_batch_size(ids.len())?;
            let ids = ids.iter().map(Uuid::to_string).collect::<Vec<_>>();
            store
                .find_many::<MongoGameDocument, GameEntity>(GAME_COLLECTION, doc! {"_id": {"$in": ids}})
                .await
                .map_err(Into::into)
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete(GAME_COLLECTION, doc_id(id), id.to_string())
                .await
                .map_err(Into::into)
        })
    }

    fn insert_ownership(
        &self,
        ownership: OwnershipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = format!("{}:{}", ownership.household_id, ownership.game_id);
            let document: MongoOwnershipDocument = ownership.into();
            store
                .insert(OWNERSHIP_COLLECTION, key, document)
                .await
                .map_err(Into::into)
        })
    }

    fn save_ownership(&self, ownership: OwnershipEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc_id(ownership.id);
            let key = ownership.id.to_string();
            let document: MongoOwnershipDocument = ownership.into();
            store
                .upsert(OWNERSHIP_COLLECTION, filter, key, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_ownership(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<OwnershipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoOwnershipDocument, OwnershipEntity>(OWNERSHIP_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_household_ownership(
        &self,
        household_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<OwnershipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter =
                doc! {"household_id": household_id.to_string(), "game_id": game_id.to_string()};
            store
                .find_one::<MongoOwnershipDocument, OwnershipEntity>(OWNERSHIP_COLLECTION, filter)
                .await
                .map_err(Into::into)
        })
    }

    fn list_ownerships(
        &self,
        household_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<OwnershipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = match household_id {
                Some(id) => doc! {"household_id": id.to_string()},
                None => doc! {},
            };
            store
                .find_many::<MongoOwnershipDocument, OwnershipEntity>(OWNERSHIP_COLLECTION, filter)
                .await
                .map_err(Into::into)
        })
    }

    fn list_game_ownerships(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<OwnershipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoOwnershipDocument, OwnershipEntity>(
                    OWNERSHIP_COLLECTION,
                    doc! {"game_id": game_id.to_string()},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn delete_ownership(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete(OWNERSHIP_COLLECTION, doc_id(id), id.to_string())
                .await
                .map_err(Into::into)
        })
    }

    fn save_household(&self, household: HouseholdEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc_id(household.id);
            let key = household.id.to_string();
            let document: MongoHouseholdDocument = household.into();
            store
                .upsert(HOUSEHOLD_COLLECTION, filter, key, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_household(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<HouseholdEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoHouseholdDocument, HouseholdEntity>(HOUSEHOLD_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_household_by_invite_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<HouseholdEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoHouseholdDocument, HouseholdEntity>(
                    HOUSEHOLD_COLLECTION,
                    doc! {"invite_code": code},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn list_households(&self) -> BoxFuture<'static, StorageResult<Vec<HouseholdEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoHouseholdDocument, HouseholdEntity>(HOUSEHOLD_COLLECTION, doc! {})
                .await
                .map_err(Into::into)
        })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! {"_id": user.id.as_str()};
            let key = user.id.clone();
            let document: MongoUserDocument = user.into();
            store
                .upsert(USER_COLLECTION, filter, key, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_user(&self, id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoUserDocument, UserEntity>(USER_COLLECTION, doc! {"_id": id})
                .await
                .map_err(Into::into)
        })
    }

    fn save_preference(
        &self,
        preference: PreferenceEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = preference_key(&preference.user_id, preference.game_id);
            let key = format!("{}:{}", preference.user_id, preference.game_id);
            let document: MongoPreferenceDocument = preference.into();
            store
                .upsert(PREFERENCE_COLLECTION, filter, key, document)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_preference(
        &self,
        user_id: String,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = preference_key(&user_id, game_id);
            store
                .delete(PREFERENCE_COLLECTION, filter, format!("{user_id}:{game_id}"))
                .await
                .map_err(Into::into)
        })
    }

    fn list_user_preferences(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PreferenceEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoPreferenceDocument, PreferenceEntity>(
                    PREFERENCE_COLLECTION,
                    doc! {"user_id": user_id},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn list_game_preferences(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PreferenceEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoPreferenceDocument, PreferenceEntity>(
                    PREFERENCE_COLLECTION,
                    doc! {"game_id": game_id.to_string()},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
