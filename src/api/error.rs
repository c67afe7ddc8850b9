use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use snafu::{Location, Snafu};

use crate::auth::AuthError;
use crate::database::{DatabaseQueryError, InvalidPage};
use crate::service::media::MediaError;
use crate::Located;

use super::response::ApiResponse;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(display("{message}"))]
    Validation { message: String },

    #[snafu(display("{entity} not found"))]
    NotFound { entity: &'static str },

    #[snafu(display("only the owner can modify this {entity}"))]
    Forbidden { entity: &'static str },

    #[snafu(display("unauthenticated request: {source}"))]
    Unauthenticated {
        source: AuthError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{source}"))]
    Pagination { source: InvalidPage },

    #[snafu(display("malformed multipart body: {source}"))]
    Multipart { source: MultipartError },

    #[snafu(display("{source}"))]
    MultipartBody { source: MultipartRejection },

    #[snafu(display("{source}"))]
    JsonBody { source: JsonRejection },

    #[snafu(display("{source}"))]
    QueryString { source: QueryRejection },

    #[snafu(display("{source}"))]
    PathParameter { source: PathRejection },

    #[snafu(display("database query failed"))]
    Database {
        source: DatabaseQueryError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("media storage failed"))]
    Media {
        source: MediaError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. }
            | ApiError::Pagination { .. }
            | ApiError::Multipart { .. }
            | ApiError::QueryString { .. }
            | ApiError::PathParameter { .. } => StatusCode::BAD_REQUEST,
            ApiError::MultipartBody { source } => source.status(),
            ApiError::JsonBody { source } => source.status(),
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Database { .. } | ApiError::Media { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Where the underlying failure happened, for the server-side log.
    fn origin(&self) -> Option<Location> {
        match self {
            ApiError::Database { source, .. } => Some(source.location()),
            ApiError::Media { source, .. } => Some(source.location()),
            ApiError::Unauthenticated { location, .. } => Some(*location),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = ?self, origin = ?self.origin(), "request failed");
            self.to_string()
        } else {
            tracing::debug!(error = %self, origin = ?self.origin(), "request rejected");
            match &self {
                // the token problem stays in the log
                ApiError::Unauthenticated { .. } => "unauthenticated request".to_string(),
                _ => self.to_string(),
            }
        };

        ApiResponse::failure(status, message).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(source: JsonRejection) -> Self {
        ApiError::JsonBody { source }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(source: QueryRejection) -> Self {
        ApiError::QueryString { source }
    }
}

impl From<PathRejection> for ApiError {
    fn from(source: PathRejection) -> Self {
        ApiError::PathParameter { source }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(source: MultipartRejection) -> Self {
        ApiError::MultipartBody { source }
    }
}

impl From<MultipartError> for ApiError {
    fn from(source: MultipartError) -> Self {
        ApiError::Multipart { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(ApiError::validation("title is required").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound { entity: "video" }.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden { entity: "video" }.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Pagination { source: InvalidPage::PageOutOfRange { page: 0 } }.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn forbidden_and_not_found_read_differently() {
        assert_eq!(ApiError::NotFound { entity: "comment" }.to_string(), "comment not found");
        assert_eq!(
            ApiError::Forbidden { entity: "comment" }.to_string(),
            "only the owner can modify this comment"
        );
    }
}
