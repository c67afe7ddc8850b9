use serde::{Deserialize, Serialize};

use crate::database::{
    Database, DatabaseQueryError, Field, Filter, Labels, Lookup, Page, PageRequest, Pipeline, Record,
};
use crate::{define_relation, define_table};

use super::{OwnerSummary, Timestamp, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: Record<Tweet>,
    pub content: String,
    pub owner: OwnerSummary,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

define_table!("tweets" : Tweet);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TweetRecord {
    pub id: Record<Tweet>,
    pub owner: Record<User>,
}

const FIELDS: &[Field] = &[
    Field::new("meta::id(id)", "id"),
    Field::plain("content"),
    Field::new("created_at", "createdAt"),
    Field::new("updated_at", "updatedAt"),
];

define_relation! {
    Tweet > record(tweet: Record<Tweet>) > Option<TweetRecord>
        where "SELECT meta::id(id) AS id, meta::id(owner) AS owner FROM type::thing('tweets', $tweet)"
}

impl Tweet {
    pub fn pipeline() -> Pipeline {
        Pipeline::new("tweets", FIELDS).lookup(Lookup::owner())
    }

    #[tracing::instrument(skip(db))]
    pub async fn list_for(
        owner: &Record<User>, request: PageRequest, db: &Database,
    ) -> Result<Page<Tweet>, DatabaseQueryError> {
        Self::pipeline()
            .filter(Filter::links("owner", owner))
            .paginate(request, Labels::TWEETS, db)
            .await
    }

    #[tracing::instrument(skip(db))]
    pub async fn create(owner: &Record<User>, content: &str, db: &Database) -> Result<Tweet, DatabaseQueryError> {
        let query = format!(
            "CREATE type::thing('tweets', $id) SET content = $content, owner = type::thing('users', $owner), \
             created_at = time::now(), updated_at = time::now();\
             SELECT {} FROM type::thing('tweets', $id);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(("id", Record::<Tweet>::uuid()))
            .bind(("content", content.to_string()))
            .bind(("owner", owner.key()))
            .fetch_one()
            .await
    }

    #[tracing::instrument(skip(db))]
    pub async fn update(tweet: &Record<Tweet>, content: &str, db: &Database) -> Result<Tweet, DatabaseQueryError> {
        let query = format!(
            "UPDATE type::thing('tweets', $tweet) SET content = $content, updated_at = time::now();\
             SELECT {} FROM type::thing('tweets', $tweet);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(("tweet", tweet.key()))
            .bind(("content", content.to_string()))
            .fetch_one()
            .await
    }

    /// Deletes the tweet and the likes on it.
    #[tracing::instrument(skip(db))]
    pub async fn delete(tweet: &Record<Tweet>, db: &Database) -> Result<(), DatabaseQueryError> {
        db.sql(
            "LET $tweet = type::thing('tweets', $id);\
             BEGIN TRANSACTION;\
             DELETE likes WHERE target = $tweet;\
             DELETE $tweet;\
             COMMIT TRANSACTION;",
        )
        .bind(("id", tweet.key()))
        .run()
        .await
    }
}
