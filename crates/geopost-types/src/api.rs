use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Claims carried by every bearer token. Produced by the token validator and
/// handed to protected handlers; identity on those routes comes only from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Expiry as a unix timestamp in seconds.
    pub exp: u64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// -- Search --

/// Raw query string of `GET /search`. Kept as strings so malformed
/// coordinates can be read leniently by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub range: Option<String>,
}
