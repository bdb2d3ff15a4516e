//! NetBird management REST API client

mod client;
mod error;
pub mod groups;
pub mod routes;
pub mod setup_keys;

pub use client::{Auth, Client};
pub use error::ApiError;
