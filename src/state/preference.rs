//! Per-user, per-game preference state with sparse persistence.
//!
//! The neutral, not-favorited combination is represented only by [`PreferenceState::Absent`],
//! so deciding whether a row must be deleted is a pure function of the state.

use std::time::SystemTime;

use uuid::Uuid;

use crate::dao::models::{PreferenceEntity, ReactionEntity};

/// Opinion a user holds about a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    /// Thumbs up.
    Like,
    /// Thumbs down; clears a favorite.
    Dislike,
}

/// Preference of one user for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreferenceState {
    /// No stored row: neutral and not favorited.
    #[default]
    Absent,
    /// Stored row. Never `{ reaction: None, favorite: false }`.
    Present {
        reaction: Option<Reaction>,
        favorite: bool,
    },
}

/// What the store must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceWrite {
    Delete { user_id: String, game_id: Uuid },
    Upsert(PreferenceEntity),
}

impl PreferenceState {
    /// Normalise a `(reaction, favorite)` pair, collapsing the empty pair to [`Self::Absent`].
    pub fn from_parts(reaction: Option<Reaction>, favorite: bool) -> Self {
        if reaction.is_none() && !favorite {
            PreferenceState::Absent
        } else {
            PreferenceState::Present { reaction, favorite }
        }
    }

    pub fn reaction(&self) -> Option<Reaction> {
        match self {
            PreferenceState::Absent => None,
            PreferenceState::Present { reaction, .. } => *reaction,
        }
    }

    pub fn favorite(&self) -> bool {
        match self {
            PreferenceState::Absent => false,
            PreferenceState::Present { favorite, .. } => *favorite,
        }
    }

    /// Set the reaction. Repeating the current reaction clears it, and disliking drops the
    /// favorite flag.
    pub fn set_reaction(self, requested: Option<Reaction>) -> Self {
        let reaction = if requested == self.reaction() {
            None
        } else {
            requested
        };
        let favorite = self.favorite() && reaction != Some(Reaction::Dislike);
        Self::from_parts(reaction, favorite)
    }

    /// Flip the favorite flag, leaving the reaction untouched.
    pub fn toggle_favorite(self) -> Self {
        Self::from_parts(self.reaction(), !self.favorite())
    }

    /// Storage operation that persists this state for `(user_id, game_id)`.
    pub fn to_write(self, user_id: &str, game_id: Uuid, now: SystemTime) -> PreferenceWrite {
        match self {
            PreferenceState::Absent => PreferenceWrite::Delete {
                user_id: user_id.to_owned(),
                game_id,
            },
            PreferenceState::Present { reaction, favorite } => {
                PreferenceWrite::Upsert(PreferenceEntity {
                    user_id: user_id.to_owned(),
                    game_id,
                    reaction: reaction.map(Into::into),
                    favorite,
                    updated_at: now,
                })
            }
        }
    }
}

impl From<Option<&PreferenceEntity>> for PreferenceState {
    fn from(value: Option<&PreferenceEntity>) -> Self {
        match value {
            Some(row) => Self::from_parts(row.reaction.map(Into::into), row.favorite),
            None => PreferenceState::Absent,
        }
    }
}

impl From<ReactionEntity> for Reaction {
    fn from(value: ReactionEntity) -> Self {
        match value {
            ReactionEntity::Like => Reaction::Like,
            ReactionEntity::Dislike => Reaction::Dislike,
        }
    }
}

impl From<Reaction> for ReactionEntity {
    fn from(value: Reaction) -> Self {
        match value {
            Reaction::Like => ReactionEntity::Like,
            Reaction::Dislike => ReactionEntity::Dislike,
        }
    }
}
