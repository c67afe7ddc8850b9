use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::database::{Database, DatabaseQueryError, Record};
use crate::{define_relation, define_table};

use super::{OwnerSummary, Timestamp};

/// A channel owner. Accounts are provisioned by the identity service, this service only reads them and
/// maintains their watch history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Record<User>,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created_at: Timestamp,
}

define_table!("users" : User);

#[derive(Debug, Clone, Serialize, new)]
pub struct NewUser {
    #[new(default)]
    pub id: Record<User>,
    pub username: String,
    pub full_name: String,
    #[new(default)]
    pub avatar: Option<String>,
}

define_relation! {
    User > summary(user: Record<User>) > Option<OwnerSummary>
        where "SELECT meta::id(id) AS id, username, full_name AS fullName, avatar FROM type::thing('users', $user)"
}

impl User {
    /// Inserts an account with an empty watch history, used to seed channels.
    #[tracing::instrument(skip(db))]
    pub async fn create(user: NewUser, db: &Database) -> Result<User, DatabaseQueryError> {
        db.sql(
            "CREATE type::thing('users', $id) SET username = $username, full_name = $full_name, avatar = $avatar, \
             watch_history = [], created_at = time::now();\
             SELECT meta::id(id) AS id, username, full_name AS fullName, avatar, created_at AS createdAt FROM type::thing('users', $id);",
        )
        .bind(user)
        .fetch_one()
        .await
    }

    pub async fn exists(user: &Record<User>, db: &Database) -> Result<bool, DatabaseQueryError> {
        Ok(Self::summary(user.clone(), db).await?.is_some())
    }
}
