use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::ownership::{GameFilterInput, OwnedGameSummary};

/// How the caller's own preferences narrow the picker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceFilter {
    /// Preferences are ignored.
    #[default]
    Any,
    /// Drop games the caller disliked.
    ExcludeDisliked,
    /// Keep games the caller liked or favorited.
    LikedOrFavorite,
    /// Keep favorites only.
    FavoritesOnly,
}

/// Body shared by quick pick and spin.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct PickerRequest {
    pub filter: GameFilterInput,
    pub preference: PreferenceFilter,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuickPickResponse {
    pub candidate_count: usize,
    /// `null` when no game matches.
    pub game: Option<OwnedGameSummary>,
}

/// Outcome of starting a spin. An empty pool starts nothing and only reports the count.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct SpinStartResponse {
    pub spin_id: Option<Uuid>,
    pub candidate_count: usize,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhaseDto {
    Idle,
    Spinning,
    Revealed,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct SpinStatusResponse {
    pub phase: SpinPhaseDto,
    pub spin_id: Option<Uuid>,
    pub remaining_ms: Option<u64>,
    /// Only present once revealed.
    pub game: Option<OwnedGameSummary>,
}

/// Cosmetic reel frame emitted while spinning.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpinFrameEvent {
    pub spin_id: Uuid,
    pub index: usize,
    pub name: String,
}

/// Final event of a spin stream.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpinRevealEvent {
    pub spin_id: Uuid,
    pub game: OwnedGameSummary,
}
