use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::{
    error::AuthError,
    types::{Claims, IssuedToken},
};

/// How long a token stays valid when no other lifetime is configured.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Issues and verifies HS256-signed tokens with a single shared secret.
///
/// Verification is stateless: a token is accepted if and only if its signature checks out
/// under the secret and the current time has not passed its `exp`. There is no leeway for
/// clock skew.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }

    /// Change how long newly issued tokens remain valid. Tokens already issued are unaffected.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, username: &str, user_id: &str) -> Result<IssuedToken, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::InvalidArgument("username"));
        }
        if user_id.trim().is_empty() {
            return Err(AuthError::InvalidArgument("user id"));
        }

        let issued_at = unix_seconds(SystemTime::now());
        let claims = Claims {
            sub: username.to_owned(),
            user_id: user_id.to_owned(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.lifetime.as_secs()),
        };

        let expires_at = i64::try_from(claims.exp)
            .ok()
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
            .ok_or(AuthError::LifetimeOutOfRange)?;
        let token = self.sign(&claims)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Returns the claims of a genuine, unexpired token and `None` for anything else.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        if token.trim().is_empty() {
            debug!("rejecting blank token");
            return None;
        }

        if token.split('.').count() != 3 {
            debug!("rejecting token that is not three segments");
            return None;
        }

        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                debug!(reason = %err, "rejecting token");
                None
            }
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?;
        Ok(token)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
