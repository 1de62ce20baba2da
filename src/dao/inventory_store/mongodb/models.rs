use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{
    GameEntity, HouseholdEntity, OwnershipEntity, PreferenceEntity, ReactionEntity, UserEntity,
};

pub const GAME_COLLECTION: &str = "games";
pub const OWNERSHIP_COLLECTION: &str = "ownerships";
pub const HOUSEHOLD_COLLECTION: &str = "households";
pub const USER_COLLECTION: &str = "users";
pub const PREFERENCE_COLLECTION: &str = "preferences";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    description: Option<String>,
    min_players: u32,
    max_players: u32,
    play_time: Option<u32>,
    year_published: Option<i32>,
    external_id: Option<String>,
    image_url: Option<String>,
    thumbnail_url: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    mechanics: Vec<String>,
    created_by: String,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            description: value.description,
            min_players: value.min_players,
            max_players: value.max_players,
            play_time: value.play_time,
            year_published: value.year_published,
            external_id: value.external_id,
            image_url: value.image_url,
            thumbnail_url: value.thumbnail_url,
            categories: value.categories,
            mechanics: value.mechanics,
            created_by: value.created_by,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(GAME_COLLECTION, &value.id)?,
            name: value.name,
            description: value.description,
            min_players: value.min_players,
            max_players: value.max_players,
            play_time: value.play_time,
            year_published: value.year_published,
            external_id: value.external_id,
            image_url: value.image_url,
            thumbnail_url: value.thumbnail_url,
            categories: value.categories,
            mechanics: value.mechanics,
            created_by: value.created_by,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoOwnershipDocument {
    #[serde(rename = "_id")]
    id: String,
    game_id: String,
    household_id: String,
    household_name: String,
    added_by: String,
    added_at: DateTime,
    notes: Option<String>,
}

impl From<OwnershipEntity> for MongoOwnershipDocument {
    fn from(value: OwnershipEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            household_id: value.household_id.to_string(),
            household_name: value.household_name,
            added_by: value.added_by,
            added_at: DateTime::from_system_time(value.added_at),
            notes: value.notes,
        }
    }
}

impl TryFrom<MongoOwnershipDocument> for OwnershipEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoOwnershipDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(OWNERSHIP_COLLECTION, &value.id)?,
            game_id: parse_id(OWNERSHIP_COLLECTION, &value.game_id)?,
            household_id: parse_id(OWNERSHIP_COLLECTION, &value.household_id)?,
            household_name: value.household_name,
            added_by: value.added_by,
            added_at: value.added_at.to_system_time(),
            notes: value.notes,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoHouseholdDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    members: Vec<String>,
    created_by: String,
    created_at: DateTime,
    invite_code: Option<String>,
}

impl From<HouseholdEntity> for MongoHouseholdDocument {
    fn from(value: HouseholdEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            members: value.members,
            created_by: value.created_by,
            created_at: DateTime::from_system_time(value.created_at),
            invite_code: value.invite_code,
        }
    }
}

impl TryFrom<MongoHouseholdDocument> for HouseholdEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoHouseholdDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(HOUSEHOLD_COLLECTION, &value.id)?,
            name: value.name,
            members: value.members,
            created_by: value.created_by,
            created_at: value.created_at.to_system_time(),
            invite_code: value.invite_code,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: String,
    email: String,
    display_name: String,
    household_id: Option<String>,
    created_at: DateTime,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            email: value.email,
            display_name: value.display_name,
            household_id: value.household_id.map(|id| id.to_string()),
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoUserDocument> for UserEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoUserDocument) -> Result<Self, Self::Error> {
        let household_id = value
            .household_id
            .as_deref()
            .map(|id| parse_id(USER_COLLECTION, id))
            .transpose()?;
        Ok(Self {
            id: value.id,
            email: value.email,
            display_name: value.display_name,
            household_id,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPreferenceDocument {
    user_id: String,
    game_id: String,
    reaction: Option<ReactionEntity>,
    favorite: bool,
    updated_at: DateTime,
}

impl From<PreferenceEntity> for MongoPreferenceDocument {
    fn from(value: PreferenceEntity) -> Self {
        Self {
            user_id: value.user_id,
            game_id: value.game_id.to_string(),
            reaction: value.reaction,
            favorite: value.favorite,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoPreferenceDocument> for PreferenceEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPreferenceDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            game_id: parse_id(PREFERENCE_COLLECTION, &value.game_id)?,
            user_id: value.user_id,
            reaction: value.reaction,
            favorite: value.favorite,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn preference_key(user_id: &str, game_id: Uuid) -> Document {
    doc! {"user_id": user_id, "game_id": game_id.to_string()}
}

fn parse_id(collection: &'static str, raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|_| MongoDaoError::InvalidDocument {
        collection,
        id: raw.to_owned(),
        reason: "invalid UUID",
    })
}
