//! Signed session tokens.
//!
//! A session is a JWT over the user's identity and role set. The admin flag
//! is not carried in the token; it is derived from the roles on decode, so a
//! token can never claim admin without the admin role.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    api::models::users::{CurrentUser, Role},
    config::Config,
    errors::Error,
    types::UserId,
};

/// Claims encoded into a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: UserId,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
}

impl SessionClaims {
    fn for_user(user: &CurrentUser, config: &Config) -> Self {
        let issued = Utc::now();
        Self {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            exp: (issued + config.auth.security.jwt_expiry).timestamp(),
            iat: issued.timestamp(),
        }
    }
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        let is_admin = claims.roles.contains(&Role::Admin);
        Self {
            id: claims.sub,
            username: claims.username,
            email: claims.email,
            roles: claims.roles,
            is_admin,
            // Display names are not worth a bigger token; resolved from the
            // database where a handler needs them
            display_name: None,
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "sessions require secret_key to be configured".to_string(),
    })
}

/// Mint a session token for a user.
pub fn create_session_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::for_user(user, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("sign session token: {e}"),
    })
}

/// Verify a session token and recover the user it was minted for.
pub fn verify_session_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());

    let token_data =
        decode::<SessionClaims>(token, &key, &Validation::default()).map_err(decode_error)?;
    Ok(CurrentUser::from(token_data.claims))
}

/// Map a decode failure onto the service error type. Anything the caller
/// could have caused (garbage, tampering, expiry) is a 401; key and codec
/// failures are ours and surface as 500.
fn decode_error(e: jsonwebtoken::errors::Error) -> Error {
    match e.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::ExpiredSignature
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::Base64(_) => Error::Unauthenticated { message: None },
        _ => Error::Internal {
            operation: format!("verify session token: {e}"),
        },
    }
}
