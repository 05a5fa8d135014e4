use std::{convert::Infallible, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use warp::{
    filters::body::BodyDeserializeError,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    path,
    reject::{LengthRequired, PayloadTooLarge, UnsupportedMediaType},
    reply::{Json, WithStatus},
    Filter, Rejection, Reply,
};

use crate::{
    auth::{Auth, AuthInternal},
    bearer::bearer_token,
    error::AuthError,
    types::{ApiResponse, Claims, UserID, Username},
};

/// Upper bound on JSON request bodies.
pub const MAX_BODY_BYTES: u64 = 16 * 1024;

const USERNAME_RULE: LengthRule = LengthRule {
    min: 3,
    max: 50,
    message: "must be between 3 and 50 characters",
};
const PASSWORD_RULE: LengthRule = LengthRule {
    min: 6,
    max: 100,
    message: "must be between 6 and 100 characters",
};

pub fn build_api_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let login = path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_auth_state(auth.internal.clone()))
        .and_then(user_login);

    let validate = path!("auth" / "validate")
        .and(warp::post())
        .and(authorization_header())
        .and(with_auth_state(auth.internal.clone()))
        .and_then(token_validate);

    login.or(validate)
}

/// Requires a valid bearer token and extracts its claims.
pub fn with_auth(auth: &Auth) -> impl Filter<Extract = (Claims,), Error = Rejection> + Clone {
    authorization_header()
        .and(with_auth_state(auth.internal.clone()))
        .and_then(user_auth_check)
}

// A header value that is not visible ASCII reads as absent, so it ends up as `MissingBearer`.
fn authorization_header() -> impl Filter<Extract = (Option<String>,), Error = Infallible> + Clone
{
    warp::header::headers_cloned().map(|headers: HeaderMap| {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    })
}

pub async fn handle_auth_errors(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(auth_error) = err.find::<AuthError>() {
        let (status, message) = match auth_error {
            AuthError::InvalidArgument(_) | AuthError::InvalidInput { .. } => {
                debug!(reason = %auth_error, "rejecting request input");
                (StatusCode::BAD_REQUEST, "Invalid input data")
            }
            AuthError::LoginFailed => (StatusCode::UNAUTHORIZED, "Invalid username or password"),
            AuthError::MissingBearer => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid authorization header",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::CredentialStoreError { .. }
            | AuthError::TokenError { .. }
            | AuthError::LifetimeOutOfRange => {
                error!(error = %auth_error, "auth request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unknown error has occurred",
                )
            }
        };
        return Ok(envelope(status, &ApiResponse::<()>::failure(message)));
    }

    if let Some(body_error) = err.find::<BodyDeserializeError>() {
        debug!(reason = %body_error, "rejecting request body");
        return Ok(invalid_input());
    }

    if let Some(reason) = body_framing_error(&err) {
        debug!(%reason, "rejecting request body");
        return Ok(invalid_input());
    }

    Err(err)
}

fn body_framing_error(err: &Rejection) -> Option<String> {
    if let Some(missing) = err.find::<LengthRequired>() {
        return Some(missing.to_string());
    }
    if let Some(too_large) = err.find::<PayloadTooLarge>() {
        return Some(too_large.to_string());
    }
    err.find::<UnsupportedMediaType>()
        .map(|unsupported| unsupported.to_string())
}

fn invalid_input() -> WithStatus<Json> {
    envelope(
        StatusCode::BAD_REQUEST,
        &ApiResponse::<()>::failure("Invalid input data"),
    )
}

#[derive(Deserialize, Serialize)]
pub struct LoginQuery {
    pub username: String,
    pub password: String,
}

impl LoginQuery {
    /// Check the request shape before any credential lookup happens.
    pub fn validate(&self) -> Result<(), AuthError> {
        USERNAME_RULE.check("username", &self.username)?;
        PASSWORD_RULE.check("password", &self.password)
    }
}

struct LengthRule {
    min: usize,
    max: usize,
    message: &'static str,
}

impl LengthRule {
    fn check(&self, field: &'static str, value: &str) -> Result<(), AuthError> {
        if value.trim().is_empty() {
            return Err(AuthError::InvalidInput {
                field,
                reason: "is required",
            });
        }

        let length = value.chars().count();
        if length < self.min || length > self.max {
            return Err(AuthError::InvalidInput {
                field,
                reason: self.message,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ValidateResponse {
    pub username: String,
}

async fn user_login(input: LoginQuery, auth: Arc<AuthInternal>) -> Result<impl Reply, Rejection> {
    input.validate()?;

    let username = Username(input.username);

    let stored_password = auth.retrieve_password(&username).await?;

    if !stored_password.map_or(false, |password| password.matches(&input.password)) {
        warn!(username = %username.0, "login failed");
        Err(AuthError::LoginFailed)?;
    }

    let user_id = UserID(Uuid::new_v4().to_string());
    let issued = auth.issue_token(&username, &user_id.0)?;

    info!(username = %username.0, user_id = %user_id.0, "login succeeded");

    Ok(envelope(
        StatusCode::OK,
        &ApiResponse::ok(
            "Login successful",
            LoginResponse {
                token: issued.token,
                expires_at: issued.expires_at,
                username: username.0,
            },
        ),
    ))
}

async fn token_validate(
    authorization: Option<String>,
    auth: Arc<AuthInternal>,
) -> Result<impl Reply, Rejection> {
    let claims = authenticate(authorization.as_deref(), &auth)?;

    Ok(envelope(
        StatusCode::OK,
        &ApiResponse::ok(
            "Token is valid",
            ValidateResponse {
                username: claims.sub,
            },
        ),
    ))
}

// Unwrap the bearer token and validate it
async fn user_auth_check(
    authorization: Option<String>,
    auth: Arc<AuthInternal>,
) -> Result<Claims, Rejection> {
    let claims = authenticate(authorization.as_deref(), &auth)?;

    Ok(claims)
}

fn authenticate(authorization: Option<&str>, auth: &AuthInternal) -> Result<Claims, AuthError> {
    let token = bearer_token(authorization).ok_or(AuthError::MissingBearer)?;

    auth.verify_token(token)
}

pub(crate) fn envelope<T: Serialize>(
    status: StatusCode,
    body: &ApiResponse<T>,
) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

// functor that adds a reference to the internal auth state into the filter chain
fn with_auth_state(
    auth: Arc<AuthInternal>,
) -> impl Filter<Extract = (Arc<AuthInternal>,), Error = Infallible> + Clone {
    warp::any().map(move || auth.clone())
}
