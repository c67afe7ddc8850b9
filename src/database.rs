use serde::Deserialize;
use snafu::{Location, ResultExt, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth;
use surrealdb::opt::IntoQuery;
use surrealdb::Surreal;
use tracing::instrument;
use url::Url;

/// Helper for executing arbitrary SurrealQL queries.
pub mod query;

/// Typed record identifiers.
pub mod record;

/// Macros for defining table methods.
pub mod macros;

/// Multi-stage read pipelines (match, lookup, project, sort, paginate).
pub mod pipeline;

/// Page requests and labelled page results.
pub mod page;

pub use page::{InvalidPage, Labels, Page, PageRequest};
pub use pipeline::{Field, Filter, Lookup, Pipeline, Sort, SortOrder};
pub use query::{Bindings, DatabaseQueryError, Total};
pub use record::{ParseRecordError, Record};

pub type Result<T, E = DatabaseQueryError> = std::result::Result<T, E>;

const SETUP: &str = include_str!("../schema.surrealql");

/// Name of a table, used by [Record] to render `type::thing(<table>, <id>)`.
pub trait Table {
    fn table() -> &'static str;
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DatabaseConnectionError {
    #[snafu(display("cannot connect to the database `{url}`: {source}"))]
    Connect {
        url: Url,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("cannot sign in to `{url}` as `{username}`: {source}"))]
    SignIn {
        url: Url,
        username: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("cannot use namespace `{namespace}` and database `{database}`: {source}"))]
    Select {
        namespace: String,
        database: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to apply the database schema: {source}"))]
    ApplySchema {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(rename = "surreal_url")]
    pub url: Url,
    #[serde(rename = "surreal_ns", default = "default_name")]
    pub namespace: String,
    #[serde(rename = "surreal_db", default = "default_name")]
    pub database: String,
    #[serde(flatten)]
    pub credentials: Option<DatabaseCredentials>,
}

fn default_name() -> String {
    "vidshare".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseCredentials {
    #[serde(rename = "surreal_name")]
    pub username: String,
    #[serde(rename = "surreal_pass")]
    pub password: String,
}

impl DatabaseConfig {
    /// Configuration of a throwaway in-memory database (`mem://`).
    pub fn in_memory() -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse("mem://")?,
            namespace: default_name(),
            database: default_name(),
            credentials: None,
        })
    }

    /// Connects, signs in when credentials are configured, selects the namespace and database and applies the schema.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn connect(&self) -> Result<Database, DatabaseConnectionError> {
        let db = surrealdb::engine::any::connect(self.url.as_str())
            .await
            .context(ConnectSnafu { url: self.url.clone() })?;

        if let Some(credentials) = &self.credentials {
            db.signin(auth::Database {
                namespace: &self.namespace,
                database: &self.database,
                username: &credentials.username,
                password: &credentials.password,
            })
            .await
            .context(SignInSnafu {
                url: self.url.clone(),
                username: credentials.username.clone(),
            })?;
        }

        db.use_ns(&self.namespace)
            .use_db(&self.database)
            .await
            .context(SelectSnafu {
                namespace: self.namespace.clone(),
                database: self.database.clone(),
            })?;

        db.query(SETUP)
            .await
            .and_then(surrealdb::Response::check)
            .context(ApplySchemaSnafu)?;

        tracing::info!(namespace = %self.namespace, database = %self.database, "connected to the database");

        Ok(Database::new(db))
    }
}

/// Represents a database wrapper.
///
/// Cloning is cheap, every clone shares the same underlying connection.
#[derive(Debug, Clone)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    pub fn new(database: Surreal<Any>) -> Self {
        Self { database }
    }

    /// Create a builder to execute arbitrary SurrealQL on the database.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let videos: Vec<VideoRecord> = db
    ///     .sql("SELECT * FROM videos WHERE owner = type::thing('users', $owner)")
    ///     .bind(("owner", owner.to_string()))
    ///     .fetch_first()
    ///     .await?;
    /// ```
    pub fn sql(&self, query: impl IntoQuery) -> Bindings<'_> {
        Bindings::new(self.database.query(query))
    }

    /// Whether the database currently answers health probes.
    pub async fn is_healthy(&self) -> bool {
        match self.database.health().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "database health check failed");
                false
            }
        }
    }
}

impl std::ops::Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.database
    }
}
