use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use snafu::{ensure, ResultExt};
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::database::Record;
use crate::model::subscription::{FollowedChannel, Subscriber, SubscriptionToggle};
use crate::model::{Subscription, User};

use super::{ApiPath, ApiResponse, App, DatabaseSnafu, NotFoundSnafu, Result, ValidationSnafu};

pub fn routes() -> Router<App> {
    Router::new()
        .route("/subscriptions/channels/:id", post(toggle))
        .route("/subscriptions/channels/:id/subscribers", get(subscribers))
        .route("/subscriptions/users/:id/channels", get(channels))
}

async fn require_user(app: &App, user: &Record<User>, entity: &'static str) -> Result<()> {
    let exists = User::exists(user, &app.database).await.context(DatabaseSnafu)?;
    ensure!(exists, NotFoundSnafu { entity });
    Ok(())
}

#[instrument(skip(app))]
async fn toggle(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(channel): ApiPath<Record<User>>,
) -> Result<ApiResponse<SubscriptionToggle>> {
    require_user(&app, &channel, "channel").await?;
    ensure!(channel != user, ValidationSnafu { message: "cannot subscribe to your own channel" });

    let toggle = Subscription::toggle(&user, &channel, &app.database)
        .await
        .context(DatabaseSnafu)?;

    let message = if toggle.subscribed { "subscribed" } else { "unsubscribed" };
    Ok(ApiResponse::ok(toggle, message))
}

#[instrument(skip(app))]
async fn subscribers(
    State(app): State<App>, ApiPath(channel): ApiPath<Record<User>>,
) -> Result<ApiResponse<Vec<Subscriber>>> {
    require_user(&app, &channel, "channel").await?;

    let subscribers = Subscription::subscribers(&channel, &app.database)
        .await
        .context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(subscribers, "subscribers fetched"))
}

#[instrument(skip(app))]
async fn channels(
    State(app): State<App>, ApiPath(subscriber): ApiPath<Record<User>>,
) -> Result<ApiResponse<Vec<FollowedChannel>>> {
    require_user(&app, &subscriber, "user").await?;

    let channels = Subscription::channels(&subscriber, &app.database)
        .await
        .context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(channels, "subscribed channels fetched"))
}
