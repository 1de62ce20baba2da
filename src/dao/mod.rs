/// Client for the third-party game catalog.
pub mod catalog;
/// Inventory persistence backends.
pub mod inventory_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
