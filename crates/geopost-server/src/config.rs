use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["secret", "change-me-to-a-random-string", "dev-secret-change-me"];

/// Token lifetimes from one hour up to a year.
const TOKEN_TTL_HOURS: RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchBackend {
    Elasticsearch { url: String },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBackend {
    Gcs { endpoint: String, bucket: String },
    Local { dir: PathBuf, public_base_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditBackend {
    Bigtable {
        endpoint: String,
        project: String,
        instance: String,
    },
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub max_image_bytes: usize,
    pub gcp_access_token: Option<String>,
    pub search: SearchBackend,
    pub objects: ObjectBackend,
    pub audit: AuditBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| get(key).with_context(|| format!("{} must be set", key));

        let jwt_secret = get("GEOPOST_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("GEOPOST_JWT_SECRET is unset or still a placeholder");
        }

        let port = var("GEOPOST_PORT", "8080");
        let search = match var("GEOPOST_SEARCH_BACKEND", "elasticsearch").as_str() {
            "elasticsearch" => SearchBackend::Elasticsearch {
                url: var("GEOPOST_ES_URL", "http://localhost:9200"),
            },
            "memory" => SearchBackend::Memory,
            other => bail!("Unknown GEOPOST_SEARCH_BACKEND '{}'", other),
        };

        let objects = match var("GEOPOST_OBJECT_BACKEND", "local").as_str() {
            "gcs" => ObjectBackend::Gcs {
                endpoint: var("GEOPOST_GCS_ENDPOINT", geopost_store::gcs::DEFAULT_ENDPOINT),
                bucket: var("GEOPOST_BUCKET", "geopost-post-image"),
            },
            "local" => ObjectBackend::Local {
                dir: var("GEOPOST_LOCAL_STORAGE_DIR", "./object-storage").into(),
                public_base_url: var(
                    "GEOPOST_PUBLIC_BASE_URL",
                    &format!("http://localhost:{}", port),
                ),
            },
            other => bail!("Unknown GEOPOST_OBJECT_BACKEND '{}'", other),
        };

        let audit = match var("GEOPOST_AUDIT_BACKEND", "sqlite").as_str() {
            "bigtable" => AuditBackend::Bigtable {
                endpoint: var(
                    "GEOPOST_BIGTABLE_ENDPOINT",
                    geopost_store::bigtable::DEFAULT_ENDPOINT,
                ),
                project: required("GEOPOST_BIGTABLE_PROJECT")?,
                instance: required("GEOPOST_BIGTABLE_INSTANCE")?,
            },
            "sqlite" => AuditBackend::Sqlite {
                path: var("GEOPOST_AUDIT_DB_PATH", "geopost-audit.db").into(),
            },
            other => bail!("Unknown GEOPOST_AUDIT_BACKEND '{}'", other),
        };

        let token_ttl_hours: i64 =
            parse("GEOPOST_TOKEN_TTL_HOURS", &var("GEOPOST_TOKEN_TTL_HOURS", "24"))?;
        if !TOKEN_TTL_HOURS.contains(&token_ttl_hours) {
            bail!(
                "GEOPOST_TOKEN_TTL_HOURS must be between {} and {}, got {}",
                TOKEN_TTL_HOURS.start(),
                TOKEN_TTL_HOURS.end(),
                token_ttl_hours
            );
        }

        Ok(Self {
            host: var("GEOPOST_HOST", "0.0.0.0"),
            port: parse("GEOPOST_PORT", &port)?,
            jwt_secret,
            token_ttl_hours,
            max_image_bytes: parse(
                "GEOPOST_MAX_IMAGE_BYTES",
                &var("GEOPOST_MAX_IMAGE_BYTES", "33554432"),
            )?,
            gcp_access_token: get("GEOPOST_GCP_ACCESS_TOKEN").filter(|t| !t.is_empty()),
            search,
            objects,
            audit,
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {} value '{}': {}", key, raw, e))
}
