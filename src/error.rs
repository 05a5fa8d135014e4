use warp::reject::Reject;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("{0} cannot be empty")]
    InvalidArgument(&'static str),
    #[error("{field} {reason}")]
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },
    #[error("username or password incorrect")]
    LoginFailed,
    #[error("missing or invalid authorization header")]
    MissingBearer,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("token lifetime puts the expiry out of range")]
    LifetimeOutOfRange,
    #[error("error during credential lookup")]
    CredentialStoreError {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("error while signing token")]
    TokenError {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
}

impl Reject for AuthError {}
