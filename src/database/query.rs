use derive_new::new;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use snafu::{Location, OptionExt, ResultExt, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::QueryResult;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseQueryError {
    #[snafu(display("failed to execute the query: {source}"))]
    MalformedQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to deserialize statement #{index} of the query: {source}"))]
    Deserialize {
        index: usize,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("expected a result but the query returned nothing"))]
    NoResults {
        #[snafu(implicit)]
        location: Location,
    },
}

impl crate::Located for DatabaseQueryError {
    fn location(&self) -> Location {
        match self {
            DatabaseQueryError::MalformedQuery { location, .. }
            | DatabaseQueryError::Deserialize { location, .. }
            | DatabaseQueryError::NoResults { location } => *location,
        }
    }
}

/// Row shape of `SELECT count() AS total ... GROUP ALL` and friends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Total {
    pub total: u64,
}

impl Total {
    pub fn of(row: Option<Total>) -> u64 {
        row.unwrap_or_default().total
    }
}

/// A pending query. Parameters are bound with [Bindings::bind] which takes any serializable data structure.
///
/// # Example
/// ```ignore
/// let comments: Vec<CommentView> = database
///     .sql("SELECT * FROM comments WHERE video = type::thing('videos', $video)")
///     .bind(("video", video_id.to_string()))
///     .fetch_first()
///     .await?;
/// ```
#[derive(Debug, new)]
pub struct Bindings<'a> {
    query: surrealdb::method::Query<'a, Any>,
}

impl Bindings<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the query and return a [surrealdb::Response] which is SurrealDB's way to represent a list of statements returned from the database.
    ///
    /// Fails if any statement failed, which includes every statement of an aborted transaction.
    pub async fn execute(self) -> Result<surrealdb::Response, DatabaseQueryError> {
        let response = self
            .query
            .await
            .and_then(surrealdb::Response::check)
            .context(MalformedQuerySnafu)?;
        tracing::trace!(statements = response.num_statements(), "executed query");
        Ok(response)
    }

    /// Execute the query, discarding every result.
    pub async fn run(self) -> Result<(), DatabaseQueryError> {
        self.execute().await.map(drop)
    }

    /// Execute the query and return the first statement as a deserialized value.
    pub async fn fetch_first<T: DeserializeOwned>(self) -> Result<T, DatabaseQueryError>
    where
        usize: QueryResult<T>,
    {
        let mut statements = self.execute().await?;
        take(&mut statements, 0)
    }

    /// Execute the query and return the last statement as a deserialized value.
    ///
    /// Useful for scripts that prepare variables with `LET` before the statement of interest.
    pub async fn fetch_last<T: DeserializeOwned>(self) -> Result<T, DatabaseQueryError>
    where
        usize: QueryResult<T>,
    {
        let mut statements = self.execute().await?;
        let index = statements.num_statements().saturating_sub(1);
        take(&mut statements, index)
    }

    /// Like [Bindings::fetch_last] but the statement must produce exactly one row.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, DatabaseQueryError> {
        self.fetch_last::<Option<T>>().await?.context(NoResultsSnafu)
    }
}

/// Deserialize statement `index` of an executed query.
pub fn take<T: DeserializeOwned>(
    response: &mut surrealdb::Response, index: usize,
) -> Result<T, DatabaseQueryError>
where
    usize: QueryResult<T>,
{
    response.take::<T>(index).context(DeserializeSnafu { index })
}
