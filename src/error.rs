use std::net::SocketAddr;

use snafu::{Location, Snafu};

use crate::database::DatabaseConnectionError;
use crate::service::media::MediaError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApplicationError {
    /// could not parse the configuration from the environment
    ConfigLoad {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// could not connect to the database
    ConnectDatabase {
        source: DatabaseConnectionError,
        #[snafu(implicit)]
        location: Location,
    },

    /// could not prepare the media directory
    MediaStore {
        source: MediaError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not serve the application
    WebServer {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not bind to the given address, check if it's already in use
    BindAddress {
        address: SocketAddr,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing_subscriber::util::TryInitError,
        #[snafu(implicit)]
        location: Location,
    },
}
