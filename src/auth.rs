use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use snafu::{Location, ResultExt, Snafu};

use crate::api::{ApiError, App, DatabaseSnafu, UnauthenticatedSnafu};
use crate::database::Record;
use crate::model::User;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AuthError {
    #[snafu(display("missing or malformed bearer token"))]
    MissingToken {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to decode JWT token: {source}"))]
    Decode {
        source: jsonwebtoken::errors::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to encode JWT token: {source}"))]
    Encode {
        source: jsonwebtoken::errors::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("the token's user {user} does not exist"))]
    UnknownUser {
        user: Record<User>,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Claims of the access tokens issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Record<User>,
    pub exp: i64,
}

impl Claims {
    /// Claims for `user` expiring `ttl` from now.
    pub fn new(user: Record<User>, ttl: chrono::Duration) -> Self {
        Self {
            sub: user,
            exp: (chrono::Utc::now() + ttl).timestamp(),
        }
    }
}

/// Verifies HS256 bearer tokens against the shared secret.
#[derive(Debug, Clone)]
pub struct Authenticator {
    secret: SecretString,
    algorithm: Algorithm,
    validation: Validation,
}

impl Authenticator {
    pub fn new(secret: SecretString) -> Self {
        let algorithm = Algorithm::HS256;
        Self {
            secret,
            algorithm,
            validation: Validation::new(algorithm),
        }
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.expose_secret().as_bytes())
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.expose_secret().as_bytes())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key(), &self.validation)
            .map(|data| data.claims)
            .context(DecodeSnafu)
    }

    /// Signs `claims` with the shared secret, the way the identity service does.
    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key()).context(EncodeSnafu)
    }
}

/// The authenticated caller, taken from a verified `Authorization: Bearer` token whose user exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Record<User>);

#[axum::async_trait]
impl FromRequestParts<App> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, app: &App) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, app)
                .await
                .map_err(|_| MissingTokenSnafu.build())
                .context(UnauthenticatedSnafu)?;

        let claims = app.authenticator.verify(bearer.token()).context(UnauthenticatedSnafu)?;

        let exists = User::exists(&claims.sub, &app.database).await.context(DatabaseSnafu)?;
        if !exists {
            return Err(UnknownUserSnafu { user: claims.sub }.build()).context(UnauthenticatedSnafu);
        }

        Ok(CurrentUser(claims.sub))
    }
}
