//! In-memory narrowing of aggregated [`OwnedGame`] lists.
//!
//! Every predicate is combined with AND. A missing value on the game side (no play time, no
//! description) never makes a game fail a dimension it cannot be judged on, except categories:
//! a game without categories never matches a non-empty category filter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::GameEntity, state::owned::OwnedGame};

/// Longest play time (minutes) counted as a short game.
pub const SHORT_MAX_MINUTES: u32 = 30;
/// Longest play time (minutes) counted as a medium game.
pub const MEDIUM_MAX_MINUTES: u32 = 60;

/// Coarse play-time range selectable in filter UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayTimeBucket {
    /// Up to 30 minutes.
    Short,
    /// 31 to 60 minutes.
    Medium,
    /// Over 60 minutes.
    Long,
    /// No play-time restriction.
    #[default]
    Any,
}

impl PlayTimeBucket {
    fn admits(self, minutes: Option<u32>) -> bool {
        let Some(minutes) = minutes else {
            return true;
        };
        match self {
            PlayTimeBucket::Short => minutes <= SHORT_MAX_MINUTES,
            PlayTimeBucket::Medium => minutes > SHORT_MAX_MINUTES && minutes <= MEDIUM_MAX_MINUTES,
            PlayTimeBucket::Long => minutes > MEDIUM_MAX_MINUTES,
            PlayTimeBucket::Any => true,
        }
    }
}

/// Owned-game filter. Empty lists and `None` values disable their dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Case-insensitive substring of name or description; blank matches everything.
    pub search: String,
    /// Player count that must fit `min_players..=max_players`.
    pub players: Option<u32>,
    /// Households whose ownership rows are kept.
    pub households: Vec<Uuid>,
    /// Categories of which the game needs at least one.
    pub categories: Vec<String>,
    /// Play-time ceiling in minutes.
    pub max_play_time: Option<u32>,
    pub play_time: PlayTimeBucket,
}

impl GameFilter {
    /// Whether `owned` passes every enabled dimension.
    pub fn matches(&self, owned: &OwnedGame) -> bool {
        let game = &owned.game;
        self.matches_search(game)
            && self
                .players
                .is_none_or(|count| game.min_players <= count && count <= game.max_players)
            && (self.households.is_empty()
                || self.households.contains(&owned.ownership.household_id))
            && (self.categories.is_empty()
                || game
                    .categories
                    .iter()
                    .any(|category| self.categories.contains(category)))
            && match (self.max_play_time, game.play_time) {
                (Some(ceiling), Some(minutes)) => minutes <= ceiling,
                _ => true,
            }
            && self.play_time.admits(game.play_time)
    }

    fn matches_search(&self, game: &GameEntity) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        game.name.to_lowercase().contains(&needle)
            || game
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(&needle))
    }
}

/// Keep the games matching `filter`, preserving their relative order.
pub fn filter_games(games: Vec<OwnedGame>, filter: &GameFilter) -> Vec<OwnedGame> {
    games
        .into_iter()
        .filter(|owned| filter.matches(owned))
        .collect()
}

/// Every non-blank category across `games`, deduplicated and sorted.
pub fn unique_categories<'a>(games: impl IntoIterator<Item = &'a GameEntity>) -> Vec<String> {
    games
        .into_iter()
        .flat_map(|game| game.categories.iter())
        .filter(|category| !category.trim().is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::OwnershipEntity;

    pub(crate) fn game(name: &str, players: (u32, u32), play_time: Option<u32>) -> GameEntity {
        let now = SystemTime::now();
        GameEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            min_players: players.0,
            max_players: players.1,
            play_time,
            year_published: None,
            external_id: None,
            image_url: None,
            thumbnail_url: None,
            categories: Vec::new(),
            mechanics: Vec::new(),
            created_by: "u1".into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn owned_by(game: &GameEntity, household_id: Uuid) -> OwnedGame {
        OwnedGame {
            game: game.clone(),
            ownership: OwnershipEntity {
                id: Uuid::new_v4(),
                game_id: game.id,
                household_id,
                household_name: "Home".into(),
                added_by: "u1".into(),
                added_at: SystemTime::now(),
                notes: None,
            },
            owner_count: 1,
        }
    }

    fn with_categories(mut game: GameEntity, categories: &[&str]) -> GameEntity {
        game.categories = categories.iter().map(|c| c.to_string()).collect();
        game
    }

    fn names(games: &[OwnedGame]) -> Vec<&str> {
        games.iter().map(|owned| owned.game.name.as_str()).collect()
    }

    fn shelf() -> Vec<OwnedGame> {
        let home = Uuid::new_v4();
        let mut azul = game("Azul", (2, 4), Some(45));
        azul.description = Some("Tile drafting in Portugal".into());
        vec![
            owned_by(&with_categories(azul, &["Abstract"]), home),
            owned_by(
                &with_categories(game("Catan", (3, 4), Some(90)), &["Negotiation", "Economic"]),
                home,
            ),
            owned_by(&game("Codenames", (2, 8), Some(15)), home),
            owned_by(&with_categories(game("Hanabi", (2, 5), None), &["Card Game"]), home),
        ]
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let filtered = filter_games(shelf(), &GameFilter::default());
        assert_eq!(names(&filtered), ["Azul", "Catan", "Codenames", "Hanabi"]);
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() {
        let by_name = GameFilter {
            search: "CATAN".into(),
            ..GameFilter::default()
        };
        assert_eq!(names(&filter_games(shelf(), &by_name)), ["Catan"]);

        let by_description = GameFilter {
            search: "portugal".into(),
            ..GameFilter::default()
        };
        assert_eq!(names(&filter_games(shelf(), &by_description)), ["Azul"]);
    }

    #[test]
    fn player_count_is_inclusive() {
        let filter = GameFilter {
            players: Some(5),
            ..GameFilter::default()
        };
        assert_eq!(names(&filter_games(shelf(), &filter)), ["Codenames", "Hanabi"]);
    }

    #[test]
    fn games_without_play_time_pass_time_filters() {
        let ceiling = GameFilter {
            max_play_time: Some(30),
            ..GameFilter::default()
        };
        assert_eq!(names(&filter_games(shelf(), &ceiling)), ["Codenames", "Hanabi"]);

        let long = GameFilter {
            play_time: PlayTimeBucket::Long,
            ..GameFilter::default()
        };
        assert_eq!(names(&filter_games(shelf(), &long)), ["Catan", "Hanabi"]);
    }

    #[test]
    fn play_time_buckets_split_at_thirty_and_sixty_minutes() {
        assert!(PlayTimeBucket::Short.admits(Some(30)));
        assert!(!PlayTimeBucket::Short.admits(Some(31)));
        assert!(PlayTimeBucket::Medium.admits(Some(31)));
        assert!(PlayTimeBucket::Medium.admits(Some(60)));
        assert!(!PlayTimeBucket::Medium.admits(Some(61)));
        assert!(PlayTimeBucket::Long.admits(Some(61)));
    }

    #[test]
    fn category_filter_matches_iff_sets_intersect() {
        let filter = GameFilter {
            categories: vec!["Economic".into(), "Abstract".into()],
            ..GameFilter::default()
        };
        let games = shelf();
        let filtered = filter_games(games.clone(), &filter);

        for owned in &games {
            let intersects = owned
                .game
                .categories
                .iter()
                .any(|category| filter.categories.contains(category));
            let kept = filtered.iter().any(|kept| kept.game.id == owned.game.id);
            assert_eq!(intersects, kept, "{}", owned.game.name);
        }
    }

    #[test]
    fn household_filter_uses_the_ownership_household() {
        let game = game("Catan", (3, 4), None);
        let home = Uuid::new_v4();
        let cabin = Uuid::new_v4();
        let games = vec![owned_by(&game, home), owned_by(&game, cabin)];

        let filter = GameFilter {
            households: vec![cabin],
            ..GameFilter::default()
        };
        let filtered = filter_games(games, &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].ownership.household_id, cabin);
    }

    #[test]
    fn filtering_is_idempotent() {
        let filter = GameFilter {
            search: "a".into(),
            players: Some(3),
            ..GameFilter::default()
        };
        let once = filter_games(shelf(), &filter);
        let twice = filter_games(once.clone(), &filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn unique_categories_are_sorted_and_skip_blanks() {
        let mut blank = game("Blank", (1, 2), None);
        blank.categories = vec!["".into(), "  ".into(), "Abstract".into()];
        let games = shelf();
        let entities = games
            .iter()
            .map(|owned| &owned.game)
            .chain(std::iter::once(&blank));

        assert_eq!(
            unique_categories(entities),
            ["Abstract", "Card Game", "Economic", "Negotiation"]
        );
    }
}
