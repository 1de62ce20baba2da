use crate::dao::models::{GameEntity, OwnershipEntity};

/// A game seen through one ownership row, annotated with how many households own it.
///
/// A game owned by three households yields three values sharing the same [`GameEntity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedGame {
    pub game: GameEntity,
    pub ownership: OwnershipEntity,
    /// Distinct households owning the game across the whole inventory.
    pub owner_count: usize,
}
