use std::{sync::Arc, time::Duration};

use crate::{
    credentials::{CredentialStore, Password},
    error::AuthError,
    token::TokenService,
    types::{Claims, IssuedToken, Username},
};

#[derive(Clone)]
pub struct AuthConfig {
    /// The secret used to sign bearer tokens.
    /// If the secret changes, every token issued so far stops verifying.
    pub auth_token_secret: String,
    /// How long auth tokens should remain valid for. After this interval, the client will have to re-login.
    pub auth_token_lifetime: Duration,
    pub credentials: Arc<dyn CredentialStore>,
}

pub(crate) struct AuthInternal {
    tokens: TokenService,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthInternal {
    pub fn issue_token(
        &self,
        username: &Username,
        user_id: &str,
    ) -> Result<IssuedToken, AuthError> {
        self.tokens.issue(&username.0, user_id)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token).ok_or(AuthError::InvalidToken)
    }

    pub async fn retrieve_password(
        &self,
        username: &Username,
    ) -> Result<Option<Password>, AuthError> {
        let password = self.credentials.lookup(username).await?;

        Ok(password)
    }
}

/// Shared handle to the token service and credential lookup. Cheap to clone.
#[derive(Clone)]
pub struct Auth {
    pub(crate) internal: Arc<AuthInternal>,
}

impl Auth {
    pub fn new(config: AuthConfig) -> Self {
        let tokens =
            TokenService::new(&config.auth_token_secret).with_lifetime(config.auth_token_lifetime);

        Self {
            internal: Arc::new(AuthInternal {
                tokens,
                credentials: config.credentials,
            }),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.internal.tokens
    }
}
