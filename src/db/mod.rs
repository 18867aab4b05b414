//! Database module: the SQLite-backed account and session tables.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: the actor owning the connection pool

pub mod actor;
pub mod models;
pub mod schema;

pub use actor::{DbActorHandle, spawn};
pub use models::{AccountCreate, DbAccount, DbSession};
pub use schema::SQLITE_INIT;
