//! Durable message persistence.
//!
//! Sub-modules:
//! - `schema`: SQLite DDL and the additive v1 → v2 upgrade.
//! - `sqlite`: SQLite-backed [`MessageStore`].

pub(crate) mod schema;
pub mod sqlite;

pub use sqlite::MessageStore;
