use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::{catalog::CatalogGameDetails, models::GameEntity},
    dto::{format_system_time, validation::validate_not_blank},
};

/// Descriptive fields of a game, as submitted by clients or prefilled from the catalog.
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct GameInput {
    pub name: String,
    pub description: Option<String>,
    pub min_players: u32,
    pub max_players: u32,
    /// Typical play time in minutes.
    pub play_time: Option<u32>,
    pub year_published: Option<i32>,
    /// Identifier in the third-party catalog, used to deduplicate games across households.
    pub external_id: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub mechanics: Vec<String>,
}

impl Validate for GameInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_not_blank(&self.name) {
            errors.add("name", e);
        }

        if self.min_players == 0 {
            let mut err = ValidationError::new("min_players");
            err.message = Some("a game needs at least one player".into());
            errors.add("min_players", err);
        } else if self.min_players > self.max_players {
            let mut err = ValidationError::new("player_range");
            err.message = Some(
                format!(
                    "min_players ({}) must not exceed max_players ({})",
                    self.min_players, self.max_players
                )
                .into(),
            );
            errors.add("max_players", err);
        }

        if self.play_time == Some(0) {
            let mut err = ValidationError::new("play_time");
            err.message = Some("play time must be positive when provided".into());
            errors.add("play_time", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl GameInput {
    /// Build a fresh entity attributed to `created_by`.
    pub fn into_entity(self, created_by: &str, now: SystemTime) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            name: self.name.trim().to_owned(),
            description: self.description,
            min_players: self.min_players,
            max_players: self.max_players,
            play_time: self.play_time,
            year_published: self.year_published,
            external_id: self
                .external_id
                .map(|id| id.trim().to_owned())
                .filter(|id| !id.is_empty()),
            image_url: self.image_url,
            thumbnail_url: self.thumbnail_url,
            categories: self.categories,
            mechanics: self.mechanics,
            created_by: created_by.to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the descriptive fields of `game`. Identity, external id and attribution stay.
    pub fn apply_to(self, game: &mut GameEntity, now: SystemTime) {
        game.name = self.name.trim().to_owned();
        game.description = self.description;
        game.min_players = self.min_players;
        game.max_players = self.max_players;
        game.play_time = self.play_time;
        game.year_published = self.year_published;
        game.image_url = self.image_url;
        game.thumbnail_url = self.thumbnail_url;
        game.categories = self.categories;
        game.mechanics = self.mechanics;
        game.updated_at = now;
    }
}

impl From<CatalogGameDetails> for GameInput {
    fn from(details: CatalogGameDetails) -> Self {
        let min_players = details.min_players.unwrap_or(1).max(1);
        Self {
            name: details.name,
            description: details.description,
            min_players,
            max_players: details.max_players.unwrap_or(min_players).max(min_players),
            play_time: details.playing_time.filter(|minutes| *minutes > 0),
            year_published: details.year_published,
            external_id: Some(details.id),
            image_url: details.image,
            thumbnail_url: details.thumbnail,
            categories: details.categories,
            mechanics: details.mechanics,
        }
    }
}

/// Game as exposed over the API.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub min_players: u32,
    pub max_players: u32,
    pub play_time: Option<u32>,
    pub year_published: Option<i32>,
    pub external_id: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub categories: Vec<String>,
    pub mechanics: Vec<String>,
    pub created_by: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
    pub updated_at: String,
}

impl From<GameEntity> for GameSummary {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            name: game.name,
            description: game.description,
            min_players: game.min_players,
            max_players: game.max_players,
            play_time: game.play_time,
            year_published: game.year_published,
            external_id: game.external_id,
            image_url: game.image_url,
            thumbnail_url: game.thumbnail_url,
            categories: game.categories,
            mechanics: game.mechanics,
            created_by: game.created_by,
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
        }
    }
}

/// Result of a create-with-dedup request.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateGameResponse {
    /// `false` when an existing game with the same external id was returned instead.
    pub created: bool,
    pub game: GameSummary,
}

/// Aggregate reactions of every user for one game.
#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct GameStatsResponse {
    pub likes: usize,
    pub dislikes: usize,
    pub favorites: usize,
}
