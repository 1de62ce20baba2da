//! Join ownership rows with their games and annotate cross-household owner counts.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use futures::future::try_join_all;
use indexmap::IndexSet;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        inventory_store::InventoryStore,
        models::{GameEntity, OwnershipEntity},
        storage::MAX_BATCH_IDS,
    },
    error::ServiceError,
    state::owned::OwnedGame,
};

/// Build the owned-game view, optionally restricted to one household.
///
/// Owner counts always come from the global ownership set.
pub async fn owned_games(
    store: &Arc<dyn InventoryStore>,
    household_id: Option<Uuid>,
) -> Result<Vec<OwnedGame>, ServiceError> {
    let ownerships = store.list_ownerships(household_id).await?;
    if ownerships.is_empty() {
        return Ok(Vec::new());
    }

    let game_ids: IndexSet<Uuid> = ownerships.iter().map(|row| row.game_id).collect();
    let games = fetch_games(store, game_ids.into_iter().collect()).await?;
    let global = match household_id {
        Some(_) => store.list_ownerships(None).await?,
        None => ownerships.clone(),
    };

    Ok(join(ownerships, &games, &global))
}

/// Look up games by id in chunks the store accepts, merging the results.
pub async fn fetch_games(
    store: &Arc<dyn InventoryStore>,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, GameEntity>, ServiceError> {
    let batches = try_join_all(
        ids.chunks(MAX_BATCH_IDS)
            .map(|chunk| store.find_games(chunk.to_vec())),
    )
    .await?;

    Ok(batches
        .into_iter()
        .flatten()
        .map(|game| (game.id, game))
        .collect())
}

/// Count distinct households per game.
pub fn owner_counts(ownerships: &[OwnershipEntity]) -> HashMap<Uuid, usize> {
    let mut households: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for row in ownerships {
        households
            .entry(row.game_id)
            .or_default()
            .insert(row.household_id);
    }
    households
        .into_iter()
        .map(|(game_id, owners)| (game_id, owners.len()))
        .collect()
}

/// One [`OwnedGame`] per ownership row with a resolvable game, sorted by name.
pub fn join(
    ownerships: Vec<OwnershipEntity>,
    games: &HashMap<Uuid, GameEntity>,
    global: &[OwnershipEntity],
) -> Vec<OwnedGame> {
    let counts = owner_counts(global);
    let mut owned: Vec<OwnedGame> = ownerships
        .into_iter()
        .filter_map(|ownership| {
            let Some(game) = games.get(&ownership.game_id) else {
                debug!(
                    ownership_id = %ownership.id,
                    game_id = %ownership.game_id,
                    "dropping ownership of unknown game"
                );
                return None;
            };
            Some(OwnedGame {
                game: game.clone(),
                owner_count: counts.get(&game.id).copied().unwrap_or(1),
                ownership,
            })
        })
        .collect();

    owned.sort_by(|a, b| compare_names(&a.game.name, &b.game.name));
    owned
}

/// Case-insensitive name order, falling back to the raw names for a total order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::{
        dao::{inventory_store::memory::MemoryInventoryStore, models::GameEntity},
        services::filter::tests::game,
    };

    fn ownership(game_id: Uuid, household_id: Uuid) -> OwnershipEntity {
        OwnershipEntity {
            id: Uuid::new_v4(),
            game_id,
            household_id,
            household_name: "Home".into(),
            added_by: "u1".into(),
            added_at: SystemTime::now(),
            notes: None,
        }
    }

    fn index(games: &[GameEntity]) -> HashMap<Uuid, GameEntity> {
        games.iter().map(|game| (game.id, game.clone())).collect()
    }

    #[test]
    fn shared_game_yields_one_entry_per_household_with_global_count() {
        let catan = game("Catan", (3, 4), Some(90));
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![ownership(catan.id, a), ownership(catan.id, b)];

        let owned = join(rows.clone(), &index(&[catan]), &rows);

        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|entry| entry.owner_count == 2));
    }

    #[test]
    fn household_scope_keeps_global_owner_count() {
        let catan = game("Catan", (3, 4), Some(90));
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let global = vec![ownership(catan.id, a), ownership(catan.id, b)];
        let scoped = vec![global[0].clone()];

        let owned = join(scoped, &index(&[catan]), &global);

        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].owner_count, 2);
    }

    #[test]
    fn unresolvable_games_are_dropped() {
        let azul = game("Azul", (2, 4), None);
        let home = Uuid::new_v4();
        let rows = vec![ownership(azul.id, home), ownership(Uuid::new_v4(), home)];

        let owned = join(rows.clone(), &index(&[azul]), &rows);

        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].game.name, "Azul");
    }

    #[test]
    fn result_is_sorted_by_name_ignoring_case() {
        let games = [
            game("catan", (3, 4), None),
            game("Azul", (2, 4), None),
            game("Brass", (2, 4), None),
        ];
        let home = Uuid::new_v4();
        let rows: Vec<_> = games.iter().map(|g| ownership(g.id, home)).collect();

        let owned = join(rows.clone(), &index(&games), &rows);
        let names: Vec<_> = owned.iter().map(|o| o.game.name.as_str()).collect();
        assert_eq!(names, ["Azul", "Brass", "catan"]);
    }

    #[tokio::test]
    async fn empty_inventory_yields_empty_view() {
        let store: Arc<dyn InventoryStore> = Arc::new(MemoryInventoryStore::new());
        assert!(owned_games(&store, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookups_are_chunked_above_the_batch_limit() {
        let memory = MemoryInventoryStore::new();
        let store: Arc<dyn InventoryStore> = Arc::new(memory);
        let home = Uuid::new_v4();

        for index in 0..(MAX_BATCH_IDS + 5) {
            let entry = game(&format!("Game {index:02}"), (1, 4), None);
            store.insert_game(entry.clone()).await.unwrap();
            store
                .insert_ownership(ownership(entry.id, home))
                .await
                .unwrap();
        }

        let owned = owned_games(&store, Some(home)).await.unwrap();
        assert_eq!(owned.len(), MAX_BATCH_IDS + 5);
        assert_eq!(owned[0].game.name, "Game 00");
    }
}
