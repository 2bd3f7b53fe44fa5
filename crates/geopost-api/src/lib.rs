//! HTTP surface of the geo-tagged post backend: signup and login, the bearer
//! token gate, post creation across the three stores, and radius search.

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod router;
pub mod search;
pub mod token;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use router::app;
