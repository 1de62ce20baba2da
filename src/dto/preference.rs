use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::state::preference::{PreferenceState, Reaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReactionDto {
    Like,
    Dislike,
}

impl From<ReactionDto> for Reaction {
    fn from(value: ReactionDto) -> Self {
        match value {
            ReactionDto::Like => Reaction::Like,
            ReactionDto::Dislike => Reaction::Dislike,
        }
    }
}

impl From<Reaction> for ReactionDto {
    fn from(value: Reaction) -> Self {
        match value {
            Reaction::Like => ReactionDto::Like,
            Reaction::Dislike => ReactionDto::Dislike,
        }
    }
}

/// Requested reaction. Repeating the current reaction, or sending `null`, clears it.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetReactionRequest {
    #[serde(default)]
    pub reaction: Option<ReactionDto>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PreferenceSummary {
    pub game_id: Uuid,
    pub reaction: Option<ReactionDto>,
    pub favorite: bool,
}

impl PreferenceSummary {
    pub fn new(game_id: Uuid, state: PreferenceState) -> Self {
        Self {
            game_id,
            reaction: state.reaction().map(Into::into),
            favorite: state.favorite(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreferencesQuery {
    /// Comma separated game ids. Without it every stored preference is returned.
    pub game_ids: Option<String>,
}
