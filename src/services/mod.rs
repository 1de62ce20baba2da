/// Join of ownership rows with games and owner counts.
pub mod aggregation;
/// Session bootstrap and profile lookup.
pub mod auth_service;
/// Proxy over the third-party game catalog.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// In-memory filter pipeline over owned games.
pub mod filter;
/// Game creation, edits and stats.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Households, membership and invite codes.
pub mod household_service;
/// Ownership links and the owned-game listing.
pub mod ownership_service;
/// Quick pick and timed spin.
pub mod picker_service;
/// Reaction and favorite updates.
pub mod preference_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
