//! Game-night picker: candidate pool, quick pick and the timed spin reveal.

use std::time::Instant;

use futures::Stream;
use indexmap::IndexMap;
use rand::{Rng, rng, seq::IndexedRandom};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::PickerConfig,
    dto::{
        picker::{
            PickerRequest, PreferenceFilter, QuickPickResponse, SpinFrameEvent, SpinPhaseDto,
            SpinRevealEvent, SpinStartResponse, SpinStatusResponse,
        },
        sse::ServerEvent,
    },
    error::ServiceError,
    services::{
        aggregation,
        filter::{self, GameFilter},
        preference_service::PreferenceIndex,
    },
    state::{
        SharedState,
        owned::OwnedGame,
        picker::{PickerPhase, Spin, frame_delays},
        preference::{PreferenceState, Reaction},
        session::SessionContext,
    },
};

/// Keep the first entry of every game so multi-household games are not over-weighted.
pub fn dedup_by_game(games: Vec<OwnedGame>) -> Vec<OwnedGame> {
    let mut unique: IndexMap<Uuid, OwnedGame> = IndexMap::with_capacity(games.len());
    for owned in games {
        unique.entry(owned.game.id).or_insert(owned);
    }
    unique.into_values().collect()
}

impl PreferenceFilter {
    fn admits(self, preference: PreferenceState) -> bool {
        match self {
            PreferenceFilter::Any => true,
            PreferenceFilter::ExcludeDisliked => {
                preference.reaction() != Some(Reaction::Dislike)
            }
            PreferenceFilter::LikedOrFavorite => {
                preference.reaction() == Some(Reaction::Like) || preference.favorite()
            }
            PreferenceFilter::FavoritesOnly => preference.favorite(),
        }
    }
}

/// Uniform draw from the pool.
pub fn draw<'a, R: Rng + ?Sized>(pool: &'a [OwnedGame], rng: &mut R) -> Option<&'a OwnedGame> {
    pool.choose(rng)
}

/// Aggregated, deduplicated and filtered candidates for the caller.
pub async fn candidate_pool(
    state: &SharedState,
    ctx: &SessionContext,
    request: PickerRequest,
) -> Result<Vec<OwnedGame>, ServiceError> {
    let store = state.require_store().await?;
    let owned = aggregation::owned_games(&store, None).await?;
    let filter = GameFilter::from(request.filter);
    let pool = dedup_by_game(filter::filter_games(owned, &filter));

    if request.preference == PreferenceFilter::Any {
        return Ok(pool);
    }
    let preferences = PreferenceIndex::load(&store, ctx).await?;
    Ok(pool
        .into_iter()
        .filter(|owned| request.preference.admits(preferences.get(owned.game.id)))
        .collect())
}

pub async fn quick_pick(
    state: &SharedState,
    ctx: &SessionContext,
    request: PickerRequest,
) -> Result<QuickPickResponse, ServiceError> {
    let pool = candidate_pool(state, ctx, request).await?;
    let game = draw(&pool, &mut rng()).cloned();
    Ok(QuickPickResponse {
        candidate_count: pool.len(),
        game: game.map(Into::into),
    })
}

/// Draw the selection and a cosmetic reel ending on it.
fn build_spin(pool: &[OwnedGame], config: &PickerConfig, now: Instant) -> Option<Spin> {
    let mut rng = rng();
    let selection = draw(pool, &mut rng)?.clone();
    let mut reel: Vec<String> = (1..config.spin_frames.max(1))
        .filter_map(|_| draw(pool, &mut rng).map(|owned| owned.game.name.clone()))
        .collect();
    reel.push(selection.game.name.clone());

    Some(Spin {
        id: Uuid::new_v4(),
        selection,
        candidate_count: pool.len(),
        reel,
        started_at: now,
        duration: config.spin_duration,
    })
}

/// Start a spin. An empty pool starts nothing.
pub async fn start_spin(
    state: &SharedState,
    ctx: &SessionContext,
    request: PickerRequest,
) -> Result<SpinStartResponse, ServiceError> {
    let pool = candidate_pool(state, ctx, request).await?;
    let now = Instant::now();
    let Some(spin) = build_spin(&pool, &state.config().picker, now) else {
        return Ok(SpinStartResponse {
            spin_id: None,
            candidate_count: 0,
            duration_ms: None,
        });
    };

    let response = SpinStartResponse {
        spin_id: Some(spin.id),
        candidate_count: spin.candidate_count,
        duration_ms: Some(spin.duration.as_millis() as u64),
    };
    let spin_id = spin.id;
    state
        .pickers()
        .entry(ctx.user_id.clone())
        .or_default()
        .start(spin, now)?;
    info!(user_id = %ctx.user_id, %spin_id, candidates = pool.len(), "spin started");
    Ok(response)
}

pub fn spin_status(state: &SharedState, ctx: &SessionContext) -> SpinStatusResponse {
    let now = Instant::now();
    let Some(mut session) = state.pickers().get_mut(&ctx.user_id) else {
        return idle_status();
    };
    session.advance(now);

    match session.phase() {
        PickerPhase::Idle => idle_status(),
        PickerPhase::Spinning(spin) => SpinStatusResponse {
            phase: SpinPhaseDto::Spinning,
            spin_id: Some(spin.id),
            remaining_ms: Some(spin.remaining(now).as_millis() as u64),
            game: None,
        },
        PickerPhase::Revealed(spin) => SpinStatusResponse {
            phase: SpinPhaseDto::Revealed,
            spin_id: Some(spin.id),
            remaining_ms: Some(0),
            game: Some(spin.selection.clone().into()),
        },
    }
}

fn idle_status() -> SpinStatusResponse {
    SpinStatusResponse {
        phase: SpinPhaseDto::Idle,
        spin_id: None,
        remaining_ms: None,
        game: None,
    }
}

fn encode<T: serde::Serialize>(name: &str, payload: &T) -> Option<ServerEvent> {
    match ServerEvent::json(Some(name.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event = name, error = %err, "failed to encode spin event");
            None
        }
    }
}

/// Replay the caller's latest spin as timed `frame` events followed by one `reveal`.
///
/// Frames whose slot already passed are skipped, so late subscribers jump to the reveal.
pub fn spin_stream(
    state: &SharedState,
    ctx: &SessionContext,
) -> Result<impl Stream<Item = ServerEvent> + use<>, ServiceError> {
    let spin = state
        .pickers()
        .get(&ctx.user_id)
        .and_then(|session| match session.phase() {
            PickerPhase::Spinning(spin) | PickerPhase::Revealed(spin) => Some(spin.clone()),
            PickerPhase::Idle => None,
        })
        .ok_or_else(|| ServiceError::NotFound("no spin started".into()))?;

    Ok(async_stream::stream! {
        let delays = frame_delays(spin.duration, spin.reel.len() as u32);
        let mut due = spin.started_at;
        for (index, (name, delay)) in spin.reel.iter().zip(delays).enumerate() {
            due += delay;
            if due < Instant::now() {
                continue;
            }
            tokio::time::sleep_until(due.into()).await;
            let frame = SpinFrameEvent { spin_id: spin.id, index, name: name.clone() };
            if let Some(event) = encode("frame", &frame) {
                yield event;
            }
        }

        tokio::time::sleep_until((spin.started_at + spin.duration).into()).await;
        let reveal = SpinRevealEvent { spin_id: spin.id, game: spin.selection.clone().into() };
        if let Some(event) = encode("reveal", &reveal) {
            yield event;
        }
    })
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use futures::StreamExt;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            inventory_store::memory::MemoryInventoryStore,
            models::{OwnershipEntity, PreferenceEntity, ReactionEntity},
        },
        dto::ownership::GameFilterInput,
        services::filter::tests::{game, owned_by},
        state::AppState,
    };

    #[test]
    fn shared_game_appears_once_in_the_pool() {
        let catan = game("Catan", (3, 4), None);
        let azul = game("Azul", (2, 4), None);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let first = owned_by(&catan, a);
        let pool = dedup_by_game(vec![
            first.clone(),
            owned_by(&azul, a),
            owned_by(&catan, b),
        ]);

        let catans: Vec<_> = pool.iter().filter(|o| o.game.name == "Catan").collect();
        assert_eq!(pool.len(), 2);
        assert_eq!(catans.len(), 1);
        assert_eq!(catans[0].ownership.id, first.ownership.id);
    }

    #[test]
    fn empty_pool_draws_nothing() {
        assert!(draw(&[], &mut StdRng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn draws_are_roughly_uniform() {
        let home = Uuid::new_v4();
        let pool: Vec<_> = ["Azul", "Brass", "Catan", "Dixit"]
            .iter()
            .map(|name| owned_by(&game(name, (2, 4), None), home))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 40_000;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for _ in 0..trials {
            let pick = draw(&pool, &mut rng).unwrap();
            *counts.entry(pick.game.name.as_str()).or_default() += 1;
        }

        let expected = trials as f64 / pool.len() as f64;
        for owned in &pool {
            let seen = counts[owned.game.name.as_str()] as f64;
            assert!(
                (seen - expected).abs() / expected < 0.05,
                "{} drawn {seen} times, expected about {expected}",
                owned.game.name
            );
        }
    }

    #[test]
    fn preference_filters_narrow_by_state() {
        let liked = PreferenceState::from_parts(Some(Reaction::Like), false);
        let disliked = PreferenceState::from_parts(Some(Reaction::Dislike), false);
        let favorite = PreferenceState::from_parts(None, true);

        assert!(PreferenceFilter::Any.admits(disliked));
        assert!(!PreferenceFilter::ExcludeDisliked.admits(disliked));
        assert!(PreferenceFilter::ExcludeDisliked.admits(PreferenceState::Absent));
        assert!(PreferenceFilter::LikedOrFavorite.admits(liked));
        assert!(PreferenceFilter::LikedOrFavorite.admits(favorite));
        assert!(!PreferenceFilter::FavoritesOnly.admits(liked));
    }

    async fn stocked_state(spin_duration: Duration) -> (SharedState, SessionContext) {
        let mut config = AppConfig::default();
        config.picker.spin_duration = spin_duration;
        config.picker.spin_frames = 4;
        let state = AppState::new(config).unwrap();
        state
            .install_store(Arc::new(MemoryInventoryStore::new()))
            .await;
        let store = state.require_store().await.unwrap();

        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let catan = game("Catan", (3, 4), None);
        let azul = game("Azul", (2, 4), None);
        for entry in [&catan, &azul] {
            store.insert_game(entry.clone()).await.unwrap();
        }
        for (entry, household_id) in [(&catan, a), (&catan, b), (&azul, a)] {
            store
                .insert_ownership(OwnershipEntity {
                    id: Uuid::new_v4(),
                    game_id: entry.id,
                    household_id,
                    household_name: "Home".into(),
                    added_by: "alice".into(),
                    added_at: SystemTime::now(),
                    notes: None,
                })
                .await
                .unwrap();
        }
        store
            .save_preference(PreferenceEntity {
                user_id: "alice".into(),
                game_id: azul.id,
                reaction: Some(ReactionEntity::Dislike),
                favorite: false,
                updated_at: SystemTime::now(),
            })
            .await
            .unwrap();

        let ctx = state.sessions().issue("alice");
        (state, ctx)
    }

    #[tokio::test]
    async fn pool_is_deduplicated_and_respects_preferences() {
        let (state, ctx) = stocked_state(Duration::from_millis(10)).await;

        let everything = candidate_pool(&state, &ctx, PickerRequest::default())
            .await
            .unwrap();
        assert_eq!(everything.len(), 2);

        let request = PickerRequest {
            filter: GameFilterInput::default(),
            preference: PreferenceFilter::ExcludeDisliked,
        };
        let pool = candidate_pool(&state, &ctx, request).await.unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].game.name, "Catan");
        assert_eq!(pool[0].owner_count, 2);
    }

    #[tokio::test]
    async fn household_filter_keeps_games_shared_with_another_household() {
        let (state, ctx) = stocked_state(Duration::from_millis(10)).await;
        let store = state.require_store().await.unwrap();
        let catan_id = game_id_named(&state, &ctx, "Catan").await;
        let mut catan_households: Vec<Uuid> = store
            .list_ownerships(None)
            .await
            .unwrap()
            .into_iter()
            .filter(|row| row.game_id == catan_id)
            .map(|row| row.household_id)
            .collect();
        catan_households.sort();
        catan_households.dedup();
        assert_eq!(catan_households.len(), 2);

        for household_id in catan_households {
            let request = PickerRequest {
                filter: GameFilterInput {
                    households: vec![household_id],
                    ..GameFilterInput::default()
                },
                preference: PreferenceFilter::Any,
            };
            let pool = candidate_pool(&state, &ctx, request).await.unwrap();
            let catans: Vec<_> = pool.iter().filter(|o| o.game.name == "Catan").collect();
            assert_eq!(catans.len(), 1, "household {household_id}");
            assert_eq!(catans[0].ownership.household_id, household_id);
        }
    }

    async fn game_id_named(state: &SharedState, ctx: &SessionContext, name: &str) -> Uuid {
        candidate_pool(state, ctx, PickerRequest::default())
            .await
            .unwrap()
            .into_iter()
            .find(|owned| owned.game.name == name)
            .unwrap()
            .game
            .id
    }

    #[tokio::test]
    async fn empty_pool_quick_pick_returns_no_game() {
        let (state, ctx) = stocked_state(Duration::from_millis(10)).await;
        let request = PickerRequest {
            filter: GameFilterInput {
                players: Some(12),
                ..GameFilterInput::default()
            },
            preference: PreferenceFilter::Any,
        };

        let response = quick_pick(&state, &ctx, request).await.unwrap();
        assert_eq!(response.candidate_count, 0);
        assert!(response.game.is_none());
    }

    #[tokio::test]
    async fn second_spin_while_running_is_a_conflict() {
        let (state, ctx) = stocked_state(Duration::from_secs(30)).await;
        let started = start_spin(&state, &ctx, PickerRequest::default())
            .await
            .unwrap();
        assert!(started.spin_id.is_some());

        let status = spin_status(&state, &ctx);
        assert_eq!(status.phase, SpinPhaseDto::Spinning);
        assert!(status.game.is_none());

        let err = start_spin(&state, &ctx, PickerRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn stream_reveals_the_selection_drawn_at_start() {
        let (state, ctx) = stocked_state(Duration::from_millis(40)).await;
        let started = start_spin(&state, &ctx, PickerRequest::default())
            .await
            .unwrap();

        let events: Vec<ServerEvent> = spin_stream(&state, &ctx).unwrap().collect().await;
        let reveal = events.last().unwrap();
        assert_eq!(reveal.event.as_deref(), Some("reveal"));
        assert!(
            events[..events.len() - 1]
                .iter()
                .all(|event| event.event.as_deref() == Some("frame"))
        );

        let status = spin_status(&state, &ctx);
        assert_eq!(status.phase, SpinPhaseDto::Revealed);
        assert_eq!(status.spin_id, started.spin_id);
        let revealed: serde_json::Value = serde_json::from_str(&reveal.data).unwrap();
        let game = status.game.unwrap();
        assert_eq!(revealed["game"]["game"]["id"], game.game.id.to_string());
    }

    #[tokio::test]
    async fn stream_without_a_spin_is_not_found() {
        let (state, ctx) = stocked_state(Duration::from_millis(10)).await;
        assert!(matches!(
            spin_stream(&state, &ctx),
            Err(ServiceError::NotFound(_))
        ));
    }
}
