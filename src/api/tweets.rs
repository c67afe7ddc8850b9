use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::Router;
use snafu::{ensure, OptionExt, ResultExt};
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::database::{Page, Record};
use crate::model::{Tweet, User};

use super::{
    content, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, App, ContentBody, DatabaseSnafu, Deleted, ForbiddenSnafu,
    NotFoundSnafu, PageQuery, Result,
};

pub fn routes() -> Router<App> {
    Router::new()
        .route("/tweets", post(create))
        .route("/tweets/:id", patch(update).delete(remove))
        .route("/users/:id/tweets", get(list))
}

async fn owned(app: &App, id: &Record<Tweet>, user: &Record<User>) -> Result<()> {
    let tweet = Tweet::record(id.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "tweet" })?;

    ensure!(&tweet.owner == user, ForbiddenSnafu { entity: "tweet" });
    Ok(())
}

#[instrument(skip(app, body))]
async fn create(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiJson(body): ApiJson<ContentBody>,
) -> Result<ApiResponse<Tweet>> {
    let content = content(&body)?;

    let tweet = Tweet::create(&user, &content, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::created(tweet, "tweet created"))
}

#[instrument(skip(app))]
async fn list(
    State(app): State<App>, ApiPath(owner): ApiPath<Record<User>>, ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<ApiResponse<Page<Tweet>>> {
    let request = query.request()?;
    let exists = User::exists(&owner, &app.database).await.context(DatabaseSnafu)?;
    ensure!(exists, NotFoundSnafu { entity: "user" });

    let page = Tweet::list_for(&owner, request, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(page, "tweets fetched"))
}

#[instrument(skip(app, body))]
async fn update(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Tweet>>,
    body: Result<ApiJson<ContentBody>, ApiError>,
) -> Result<ApiResponse<Tweet>> {
    owned(&app, &id, &user).await?;
    let ApiJson(body) = body?;
    let content = content(&body)?;

    let tweet = Tweet::update(&id, &content, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(tweet, "tweet updated"))
}

#[instrument(skip(app))]
async fn remove(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Tweet>>,
) -> Result<ApiResponse<Deleted<Tweet>>> {
    owned(&app, &id, &user).await?;

    Tweet::delete(&id, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(Deleted { id }, "tweet deleted"))
}
