#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderValue};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestRequest, TestResponse, TestServer};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use url::Url;

use vidshare::api::{create_router, App};
use vidshare::auth::{Authenticator, Claims};
use vidshare::database::{Database, DatabaseConfig, Record};
use vidshare::model::user::NewUser;
use vidshare::model::video::NewVideo;
use vidshare::model::{User, Video};
use vidshare::service::media::{Asset, LocalMediaStore, MediaConfig, MediaError, MediaKind, MediaStore};

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub server: TestServer,
    pub database: Database,
    pub media_dir: TempDir,
}

/// A server over a fresh in-memory database and a temporary media directory.
pub async fn spawn() -> TestApp {
    let media_dir = tempfile::tempdir().unwrap();
    let config = MediaConfig {
        dir: media_dir.path().to_path_buf(),
        base_url: Url::parse("http://localhost:8000/media").unwrap(),
    };
    let store = LocalMediaStore::open(&config).unwrap();

    spawn_with(Arc::new(store), media_dir).await
}

pub async fn spawn_with(media: Arc<dyn MediaStore>, media_dir: TempDir) -> TestApp {
    let database = DatabaseConfig::in_memory().unwrap().connect().await.unwrap();
    let authenticator = Authenticator::new(SecretString::new(SECRET.to_string()));

    let app = App::new(database.clone(), media, Arc::new(authenticator));
    let server = TestServer::new(create_router(app)).unwrap();

    TestApp {
        server,
        database,
        media_dir,
    }
}

/// A seeded channel and a token for it.
pub struct Account {
    pub id: Record<User>,
    pub token: String,
}

pub trait Authorized {
    fn bearer(self, token: &str) -> Self;

    fn as_user(self, account: &Account) -> Self
    where
        Self: Sized,
    {
        self.bearer(&account.token)
    }
}

impl Authorized for TestRequest {
    fn bearer(self, token: &str) -> Self {
        self.add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
    }
}

pub fn token_for(user: &Record<User>) -> String {
    let authenticator = Authenticator::new(SecretString::new(SECRET.to_string()));
    authenticator
        .encode(&Claims::new(user.clone(), chrono::Duration::minutes(30)))
        .unwrap()
}

pub async fn account(app: &TestApp, username: &str) -> Account {
    let user = User::create(
        NewUser::new(username.to_string(), format!("{username} full name")),
        &app.database,
    )
    .await
    .unwrap();

    Account {
        token: token_for(&user.id),
        id: user.id,
    }
}

fn asset(folder: &str) -> Asset {
    let public_id = format!("{folder}/{}", uuid::Uuid::new_v4());
    Asset {
        url: format!("http://localhost:8000/media/{public_id}"),
        public_id,
    }
}

/// Inserts a published video directly, without going through an upload.
pub async fn seed_video(app: &TestApp, owner: &Account, title: &str) -> Video {
    let video = NewVideo::new(
        title.to_string(),
        format!("about {title}"),
        asset("videos"),
        asset("thumbnails"),
        60.0,
        owner.id.clone(),
    );

    Video::create(video, &app.database).await.unwrap()
}

pub fn upload_form(title: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title)
        .add_text("description", "a video uploaded in a test")
        .add_text("duration", "12.5")
        .add_part("videoFile", Part::bytes(b"not really a video".as_slice()).file_name("clip.mp4").mime_type("video/mp4"))
        .add_part("thumbnail", Part::bytes(b"not really a png".as_slice()).file_name("cover.png").mime_type("image/png"))
}

pub fn data(response: &TestResponse) -> Value {
    response.json::<Value>()["data"].clone()
}

/// Files currently stored below `folder` of the media directory.
pub fn stored_files(app: &TestApp, folder: &str) -> usize {
    std::fs::read_dir(app.media_dir.path().join(folder))
        .map(|entries| entries.count())
        .unwrap_or_default()
}

/// A store whose thumbnail uploads fail, remembering what was stored and deleted.
#[derive(Debug, Default)]
pub struct FailingThumbnails {
    pub uploaded: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaStore for FailingThumbnails {
    async fn upload(&self, kind: MediaKind, _file_name: &str, _bytes: Bytes) -> Result<Asset, MediaError> {
        if kind == MediaKind::Thumbnail {
            let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
            return Err(MediaError::Io {
                path: "thumbnails".into(),
                source: err,
                location: snafu::location!(),
            });
        }

        let stored = asset(kind.folder());
        self.uploaded.lock().unwrap().push(stored.public_id.clone());
        Ok(stored)
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}
