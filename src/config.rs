use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use serde::Deserialize;
use snafu::ResultExt;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::Authenticator;
use crate::database::DatabaseConfig;
use crate::error::{ApplicationError, ConfigLoadSnafu, MediaStoreSnafu};
use crate::service::media::{LocalMediaStore, MediaConfig, MediaStore};

/// Process configuration, read from the environment (and `.env` when present).
///
/// | variable | meaning |
/// |---|---|
/// | `HOST_ADDRESS` | socket address to listen on |
/// | `LOG_DIR` | directory of the rotated JSON log files, defaults to `logs` |
/// | `JWT_SECRET` | HS256 secret shared with the identity service |
/// | `CORS_ORIGIN` | allowed browser origin, permissive when unset |
/// | `SURREAL_URL`, `SURREAL_NS`, `SURREAL_DB` | database endpoint and selection |
/// | `SURREAL_NAME`, `SURREAL_PASS` | optional database credentials |
/// | `MEDIA_DIR`, `MEDIA_BASE_URL` | where uploads are written and how they are addressed |
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    pub jwt_secret: SecretString,
    #[serde(default)]
    pub cors_origin: Option<String>,

    #[serde(flatten)]
    pub database: DatabaseConfig,
    #[serde(flatten)]
    pub media: MediaConfig,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    pub fn from_env() -> Result<Config, ApplicationError> {
        envy::from_env::<Config>().context(ConfigLoadSnafu)
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.jwt_secret.clone())
    }

    pub fn media_store(&self) -> Result<Arc<dyn MediaStore>, ApplicationError> {
        let store = LocalMediaStore::open(&self.media).context(MediaStoreSnafu)?;
        Ok(Arc::new(store))
    }

    pub fn cors(&self) -> CorsLayer {
        let Some(origin) = &self.cors_origin else {
            return CorsLayer::permissive();
        };

        match HeaderValue::from_str(origin) {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(err) => {
                tracing::warn!(%origin, %err, "ignoring malformed CORS_ORIGIN, falling back to a permissive policy");
                CorsLayer::permissive()
            }
        }
    }
}
