use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::OwnershipEntity,
    dto::{format_system_time, game::GameInput, game::GameSummary, split_list},
    error::ServiceError,
    services::filter::{GameFilter, PlayTimeBucket},
    state::owned::OwnedGame,
};

/// Link an existing game to a household.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LinkOwnershipRequest {
    pub game_id: Uuid,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Create (or reuse) a game and link it to a household in one call.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddGameRequest {
    #[validate(nested)]
    pub game: GameInput,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Replace the free-text notes of an ownership. `null` clears them.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateOwnershipRequest {
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnershipSummary {
    pub id: Uuid,
    pub game_id: Uuid,
    pub household_id: Uuid,
    pub household_name: String,
    pub added_by: String,
    pub added_at: String,
    pub notes: Option<String>,
}

impl From<OwnershipEntity> for OwnershipSummary {
    fn from(row: OwnershipEntity) -> Self {
        Self {
            id: row.id,
            game_id: row.game_id,
            household_id: row.household_id,
            household_name: row.household_name,
            added_by: row.added_by,
            added_at: format_system_time(row.added_at),
            notes: row.notes,
        }
    }
}

/// A game in the context of one ownership, with the number of households owning it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnedGameSummary {
    pub game: GameSummary,
    pub ownership: OwnershipSummary,
    pub owner_count: usize,
}

impl From<OwnedGame> for OwnedGameSummary {
    fn from(owned: OwnedGame) -> Self {
        Self {
            game: owned.game.into(),
            ownership: owned.ownership.into(),
            owner_count: owned.owner_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddGameResponse {
    /// `false` when the game already existed and was only linked.
    pub created: bool,
    pub owned_game: OwnedGameSummary,
}

/// Query string accepted by `GET /owned-games`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnedGamesQuery {
    /// Case-insensitive text matched against name and description.
    pub search: Option<String>,
    /// Player count that must fit the game's range.
    pub players: Option<u32>,
    /// Comma separated household ids; games owned elsewhere are hidden.
    pub households: Option<String>,
    /// Comma separated categories; any overlap matches.
    pub categories: Option<String>,
    /// Play-time ceiling in minutes.
    pub max_play_time: Option<u32>,
    pub play_time: Option<PlayTimeBucket>,
    /// Restrict the aggregation to one household.
    pub household_id: Option<Uuid>,
}

impl OwnedGamesQuery {
    /// Convert into a filter; a household id that does not parse is rejected.
    pub fn to_filter(&self) -> Result<GameFilter, ServiceError> {
        let households = split_list(self.households.as_deref())
            .iter()
            .map(|raw| {
                Uuid::parse_str(raw)
                    .map_err(|_| ServiceError::InvalidInput(format!("invalid household id `{raw}`")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GameFilter {
            search: self.search.clone().unwrap_or_default(),
            players: self.players,
            households,
            categories: split_list(self.categories.as_deref()),
            max_play_time: self.max_play_time,
            play_time: self.play_time.unwrap_or_default(),
        })
    }
}

/// Filter body shared by the picker routes.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct GameFilterInput {
    pub search: String,
    pub players: Option<u32>,
    pub households: Vec<Uuid>,
    pub categories: Vec<String>,
    pub max_play_time: Option<u32>,
    pub play_time: PlayTimeBucket,
}

impl From<GameFilterInput> for GameFilter {
    fn from(input: GameFilterInput) -> Self {
        Self {
            search: input.search,
            players: input.players,
            households: input.households,
            categories: input
                .categories
                .into_iter()
                .filter(|category| !category.trim().is_empty())
                .collect(),
            max_play_time: input.max_play_time,
            play_time: input.play_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_lists_are_split_and_trimmed() {
        let home = Uuid::new_v4();
        let query = OwnedGamesQuery {
            households: Some(format!("{home}, ,")),
            categories: Some("Economic, ,Abstract".into()),
            play_time: Some(PlayTimeBucket::Short),
            ..OwnedGamesQuery::default()
        };

        let filter = query.to_filter().unwrap();
        assert_eq!(filter.households, vec![home]);
        assert_eq!(filter.categories, vec!["Economic", "Abstract"]);
        assert_eq!(filter.play_time, PlayTimeBucket::Short);
        assert!(filter.search.is_empty());
    }

    #[test]
    fn missing_query_values_disable_their_filters() {
        assert_eq!(
            OwnedGamesQuery::default().to_filter().unwrap(),
            GameFilter::default()
        );
    }

    #[test]
    fn malformed_household_id_is_rejected() {
        let query = OwnedGamesQuery {
            households: Some("not-a-uuid".into()),
            ..OwnedGamesQuery::default()
        };
        assert!(matches!(
            query.to_filter(),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
