use serde::{Deserialize, Serialize};

use crate::database::{Database, DatabaseQueryError, Field, Filter, Lookup, Pipeline, Record, Sort, SortOrder};
use crate::define_table;

use super::{OwnerSummary, Timestamp, User};

/// `subscriber` follows `channel`. Stored as `subscriptions:⟨subscriber_channel⟩`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription;

define_table!("subscriptions" : Subscription);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionToggle {
    pub subscribed: bool,
    pub total_subscribers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub subscriber: OwnerSummary,
    pub subscribed_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowedChannel {
    pub channel: OwnerSummary,
    pub subscribed_at: Timestamp,
}

const FIELDS: &[Field] = &[Field::new("meta::id(id)", "id"), Field::new("created_at", "subscribedAt")];

const NEWEST_FIRST: Sort = Sort::new("subscribedAt", SortOrder::Desc);

impl Subscription {
    pub fn key(subscriber: &Record<User>, channel: &Record<User>) -> String {
        format!("{}_{}", subscriber.key(), channel.key())
    }

    /// Unsubscribes when already subscribed, subscribes otherwise, in one transaction.
    #[tracing::instrument(skip(db))]
    pub async fn toggle(
        subscriber: &Record<User>, channel: &Record<User>, db: &Database,
    ) -> Result<SubscriptionToggle, DatabaseQueryError> {
        let toggle: SubscriptionToggle = db
            .sql(
                "LET $channel = type::thing('users', $channel_id);\
                 LET $subscription = type::thing('subscriptions', $subscription_id);\
                 BEGIN TRANSACTION;\
                 LET $removed = array::compact((DELETE $subscription RETURN BEFORE));\
                 IF array::len($removed) = 0 THEN \
                     (CREATE $subscription SET subscriber = type::thing('users', $subscriber), channel = $channel, created_at = time::now()) \
                 END;\
                 COMMIT TRANSACTION;\
                 RETURN { subscribed: array::len($removed) = 0, totalSubscribers: array::len((SELECT VALUE id FROM subscriptions WHERE channel = $channel)) };",
            )
            .bind(("channel_id", channel.key()))
            .bind(("subscription_id", Self::key(subscriber, channel)))
            .bind(("subscriber", subscriber.key()))
            .fetch_one()
            .await?;

        tracing::debug!(subscribed = toggle.subscribed, total = toggle.total_subscribers, "toggled subscription");
        Ok(toggle)
    }

    /// Users subscribed to `channel`, most recent first.
    pub async fn subscribers(channel: &Record<User>, db: &Database) -> Result<Vec<Subscriber>, DatabaseQueryError> {
        Pipeline::new("subscriptions", FIELDS)
            .filter(Filter::links("channel", channel))
            .lookup(Lookup::user("subscriber", "subscriber"))
            .sort(NEWEST_FIRST)
            .fetch_all(db)
            .await
    }

    /// Channels `subscriber` follows, most recent first.
    pub async fn channels(subscriber: &Record<User>, db: &Database) -> Result<Vec<FollowedChannel>, DatabaseQueryError> {
        Pipeline::new("subscriptions", FIELDS)
            .filter(Filter::links("subscriber", subscriber))
            .lookup(Lookup::user("channel", "channel"))
            .sort(NEWEST_FIRST)
            .fetch_all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_directional() {
        let alice = Record::<User>::uuid();
        let bob = Record::<User>::uuid();

        assert_eq!(Subscription::key(&alice, &bob), format!("{alice}_{bob}"));
        assert_ne!(Subscription::key(&alice, &bob), Subscription::key(&bob, &alice));
    }
}
