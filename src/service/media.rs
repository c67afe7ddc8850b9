use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use snafu::{ensure, Location, ResultExt, Snafu};
use tower_http::services::ServeDir;
use url::Url;
use uuid::Uuid;

/// A stored file: the id used to delete it and the URL clients fetch it from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub public_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Thumbnail,
}

impl MediaKind {
    pub fn folder(&self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Thumbnail => "thumbnails",
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MediaError {
    #[snafu(display("media storage i/o failed on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("`{public_id}` does not name a stored asset"))]
    InvalidPublicId {
        public_id: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot build a public url for `{public_id}`: {source}"))]
    PublicUrl {
        public_id: String,
        source: url::ParseError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl crate::Located for MediaError {
    fn location(&self) -> Location {
        match self {
            MediaError::Io { location, .. }
            | MediaError::InvalidPublicId { location, .. }
            | MediaError::PublicUrl { location, .. } => *location,
        }
    }
}

/// Object storage for uploaded videos and thumbnails.
#[async_trait]
pub trait MediaStore: Debug + Send + Sync {
    /// Stores `bytes` and returns where it can be fetched from. `file_name` is the client's name for the file,
    /// only its extension is kept.
    async fn upload(&self, kind: MediaKind, file_name: &str, bytes: Bytes) -> Result<Asset, MediaError>;

    /// Deletes a stored asset. Deleting an asset that is already gone succeeds.
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Deletes `assets` without failing, for cleanup after a change has been committed or abandoned.
pub async fn discard(store: &dyn MediaStore, assets: impl IntoIterator<Item = &Asset>) {
    for asset in assets {
        if let Err(err) = store.delete(&asset.public_id).await {
            tracing::warn!(public_id = %asset.public_id, %err, "failed to delete stored asset");
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(rename = "media_dir", default = "default_media_dir")]
    pub dir: PathBuf,
    /// Public prefix the directory is served under, e.g. `http://localhost:8000/media/`.
    #[serde(rename = "media_base_url")]
    pub base_url: Url,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("public/media")
}

impl MediaConfig {
    pub fn serve_dir(&self) -> ServeDir {
        ServeDir::new(&self.dir)
    }
}

/// Stores media as plain files below a directory, addressed as `<folder>/<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: Url,
}

impl LocalMediaStore {
    /// Creates the directory layout if it is missing.
    pub fn open(config: &MediaConfig) -> Result<Self, MediaError> {
        for kind in [MediaKind::Video, MediaKind::Thumbnail] {
            let path = config.dir.join(kind.folder());
            std::fs::create_dir_all(&path).context(IoSnafu { path })?;
        }

        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            root: config.dir.clone(),
            base_url,
        })
    }

    /// Maps a public id back to a file, refusing anything outside the media folders.
    fn resolve(&self, public_id: &str) -> Result<PathBuf, MediaError> {
        let path = Path::new(public_id);
        let components: Vec<_> = path.components().collect();

        let valid = match components.as_slice() {
            [Component::Normal(folder), Component::Normal(_)] => [MediaKind::Video, MediaKind::Thumbnail]
                .iter()
                .any(|kind| *folder == kind.folder()),
            _ => false,
        };
        ensure!(valid, InvalidPublicIdSnafu { public_id });

        Ok(self.root.join(path))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, kind: MediaKind, file_name: &str, bytes: Bytes) -> Result<Asset, MediaError> {
        let public_id = match extension(file_name) {
            Some(extension) => format!("{}/{}.{extension}", kind.folder(), Uuid::new_v4()),
            None => format!("{}/{}", kind.folder(), Uuid::new_v4()),
        };

        let url = self
            .base_url
            .join(&public_id)
            .context(PublicUrlSnafu { public_id: public_id.clone() })?;

        let path = self.root.join(&public_id);
        tokio::fs::write(&path, &bytes).await.context(IoSnafu { path })?;

        tracing::debug!(%public_id, "stored asset");
        Ok(Asset {
            public_id,
            url: url.into(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let path = self.resolve(public_id)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(source).context(IoSnafu { path }),
        }
    }
}

/// Lowercased alphanumeric extension of a client supplied file name.
fn extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name).extension()?.to_str()?;
    let valid = !extension.is_empty() && extension.len() <= 8 && extension.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| extension.to_ascii_lowercase())
}
