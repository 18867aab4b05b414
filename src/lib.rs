pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod runtime;
pub mod server;

pub use context::AppContext;
pub use error::GantryError;
