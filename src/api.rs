use axum::extract::DefaultBodyLimit;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use snafu::{OptionExt, ResultExt};
use tower_http::trace::TraceLayer;

use crate::database::{PageRequest, Record};
use crate::model::non_blank;

mod error;
mod response;
mod state;

pub mod comments;
pub mod dashboard;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod videos;

pub use error::*;
pub use response::*;
pub use state::App;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Largest request body accepted, sized for video uploads.
pub const MAX_BODY_BYTES: usize = 512 * 1024 * 1024;

/// Every route of the service under `/api/v1`, with request tracing.
pub fn create_router(app: App) -> Router {
    let api = Router::new()
        .merge(videos::routes())
        .merge(comments::routes())
        .merge(tweets::routes())
        .merge(likes::routes())
        .merge(subscriptions::routes())
        .merge(playlists::routes())
        .merge(dashboard::routes())
        .merge(healthcheck::routes());

    Router::new()
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// `?page=&limit=` of paginated listings. Empty values count as absent.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub page: Option<u64>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn request(&self) -> Result<PageRequest> {
        PageRequest::new(self.page, self.limit).context(PaginationSnafu)
    }
}

/// Body of comment and tweet writes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBody {
    #[serde(default)]
    pub content: Option<String>,
}

/// Trimmed, non-empty content of a comment or tweet body.
pub fn content(body: &ContentBody) -> Result<String> {
    body.content
        .as_deref()
        .and_then(non_blank)
        .map(str::to_string)
        .context(ValidationSnafu { message: "content cannot be empty" })
}

/// Data of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deleted<T> {
    pub id: Record<T>,
}
