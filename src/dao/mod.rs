/// Database model definitions.
pub mod models;
/// Pace data storage and retrieval operations.
pub mod pace_store;
/// Storage abstraction layer for database operations.
pub mod storage;
