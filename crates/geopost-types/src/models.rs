use serde::{Deserialize, Serialize};

/// A registered account as stored in the `user` index.
///
/// `password` holds an Argon2 PHC string, never the submitted plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// A geo-tagged post. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub user: String,
    pub message: String,
    pub location: Location,
    /// Public retrieval URL of the attached image; empty until the upload lands.
    #[serde(default)]
    pub url: String,
}
