use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Catalogued board game shared by every household that owns a copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    pub description: Option<String>,
    pub min_players: u32,
    pub max_players: u32,
    /// Typical play time in minutes.
    pub play_time: Option<u32>,
    pub year_published: Option<i32>,
    /// Identifier in the third-party catalog, used to avoid duplicate entries.
    pub external_id: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub mechanics: Vec<String>,
    /// User that first added the game.
    pub created_by: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Link between a game and the household owning a copy of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnershipEntity {
    pub id: Uuid,
    pub game_id: Uuid,
    pub household_id: Uuid,
    /// Household display name copied at link time.
    pub household_name: String,
    /// User that linked the game.
    pub added_by: String,
    pub added_at: SystemTime,
    pub notes: Option<String>,
}

/// Family or group owning games collectively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HouseholdEntity {
    pub id: Uuid,
    pub name: String,
    /// Member user identifiers, in join order.
    pub members: Vec<String>,
    pub created_by: String,
    pub created_at: SystemTime,
    pub invite_code: Option<String>,
}

/// Profile of an authenticated user, keyed by the auth provider identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub household_id: Option<Uuid>,
    pub created_at: SystemTime,
}

/// Stored opinion of a user about a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReactionEntity {
    Like,
    Dislike,
}

/// Sparse preference row: never persisted as neutral and not favorited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferenceEntity {
    pub user_id: String,
    pub game_id: Uuid,
    pub reaction: Option<ReactionEntity>,
    pub favorite: bool,
    pub updated_at: SystemTime,
}
