use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{game::GameSummary, ownership::OwnedGameSummary};

/// Name of the event sent when a household gains a game.
pub const OWNERSHIP_ADDED: &str = "ownership.added";
/// Name of the event sent when a household loses a game.
pub const OWNERSHIP_REMOVED: &str = "ownership.removed";
/// Name of the event sent when ownership notes change.
pub const OWNERSHIP_UPDATED: &str = "ownership.updated";
/// Name of the event sent when an owned game's details change.
pub const GAME_UPDATED: &str = "game.updated";

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    pub household_id: Uuid,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Payload of `ownership.added` and `ownership.updated`.
pub struct OwnershipChangedEvent {
    pub owned_game: OwnedGameSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Payload of `ownership.removed`.
pub struct OwnershipRemovedEvent {
    pub ownership_id: Uuid,
    pub game_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Payload of `game.updated`.
pub struct GameUpdatedEvent {
    pub game: GameSummary,
}
