use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, repository::RepositoryState};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "session";

// Sessions expire after a week; the exp claim is validated on every request.
const SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 7;

/// Claims
///
/// The payload structure carried inside the session JWT. Claims are signed with
/// the server's session secret and validated upon every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, used to fetch the identity record.
    pub sub: Uuid,
    /// Expiration Time (exp): timestamp after which the session must not be
    /// accepted. Prevents replay of stale cookies.
    pub exp: usize,
    /// Issued At (iat): timestamp when the session was created.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request — the output of the
/// extractor below. Handlers use it for every ownership decision.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// LoginRedirect
///
/// The rejection produced when a protected route is hit without a valid
/// session. It is a modeled outcome, not an error: the anonymous actor is sent
/// to the login entry point with a `next` parameter equal to the query-free
/// path of the original request, so login can resume the interrupted flow.
#[derive(Debug)]
pub struct LoginRedirect {
    location: String,
}

impl LoginRedirect {
    pub fn new(login_url: &str, next_path: &str) -> Self {
        Self {
            location: format!("{login_url}?next={next_path}"),
        }
    }

    /// The exact `Location` value of the redirect, `{login_url}?next={path}`.
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.location).into_response()
    }
}

/// issue_session_token
///
/// Signs a fresh session JWT for the given user. Used by the login and signup
/// handlers (and by tests building authenticated clients).
pub fn issue_session_token(
    user_id: Uuid,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// session_cookie
///
/// Builds the `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// clear_session_cookie
///
/// Builds the `Set-Cookie` value that discards the session (logout).
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

/// hash_password
///
/// Hex-encoded SHA-256 over the per-user salt and the password. The salt is
/// random per user, so equal passwords never share a digest.
pub fn hash_password(password: &str, salt: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

// Pulls the raw session token out of the Cookie header, if present.
fn extract_session_token(parts: &Parts) -> Option<String> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(&format!("{SESSION_COOKIE}=")))
        .map(str::to_string)
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any protected handler and as the gate inside the
/// authentication middleware. The process:
/// 1. Dependency Resolution: Repository and AppConfig from the application state.
/// 2. Token Extraction: session cookie lookup.
/// 3. Token Validation: JWT decoding with expiry enforcement.
/// 4. DB Lookup: the user must still exist; a valid token for a deleted user
///    is rejected.
///
/// Rejection: every failure resolves to the same `LoginRedirect` — the
/// anonymous gate of the authorization core.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // The redirect target preserves the query-free path of this request.
        let reject = || LoginRedirect::new(&config.login_url, parts.uri.path());

        let token = extract_session_token(parts).ok_or_else(reject)?;

        let decoding_key = DecodingKey::from_secret(config.session_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data =
            decode::<Claims>(&token, &decoding_key, &validation).map_err(|_| reject())?;

        // Final verification: the session is only as alive as the user record.
        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .ok_or_else(reject)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
