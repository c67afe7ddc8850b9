use dotenvy::dotenv;
use snafu::ResultExt;
use tokio::net::TcpListener;

use vidshare::api::{create_router, App};
use vidshare::config::Config;
use vidshare::error::{ApplicationError, BindAddressSnafu, ConnectDatabaseSnafu, WebServerSnafu};
use vidshare::logger;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = logger::init(&config)?;

    let database = config
        .database
        .connect()
        .await
        .context(ConnectDatabaseSnafu)?;

    let app = App::new(
        database,
        config.media_store()?,
        config.authenticator().into(),
    );

    let router = create_router(app)
        .nest_service("/media", config.media.serve_dir())
        .layer(config.cors());

    let listener = TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu { address: config.host })?;

    tracing::info!(address = %config.host, "listening for requests");

    axum::serve(listener, router).await.context(WebServerSnafu)
}
