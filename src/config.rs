use std::{net::SocketAddr, time::Duration};

pub const ADDR_VAR: &str = "AUTH_DEMO_ADDR";
pub const SECRET_VAR: &str = "AUTH_DEMO_SECRET";
pub const TOKEN_MINUTES_VAR: &str = "AUTH_DEMO_TOKEN_MINUTES";

const DEFAULT_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_TOKEN_MINUTES: u64 = 60;
/// Thirty days.
const MAX_TOKEN_MINUTES: u64 = 30 * 24 * 60;
/// HS256 wants a key at least as long as its 256-bit output.
const MIN_SECRET_LEN: usize = 32;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Runtime settings for the demo server.
#[derive(Clone)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
    pub token_secret: String,
    pub token_lifetime: Duration,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen_addr = lookup(ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Invalid {
                var: ADDR_VAR,
                reason: err.to_string(),
            })?;

        let token_secret = lookup(SECRET_VAR).ok_or(ConfigError::Missing(SECRET_VAR))?;
        if token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: SECRET_VAR,
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let token_minutes = match lookup(TOKEN_MINUTES_VAR) {
            None => DEFAULT_TOKEN_MINUTES,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(minutes) if (1..=MAX_TOKEN_MINUTES).contains(&minutes) => minutes,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: TOKEN_MINUTES_VAR,
                        reason: format!(
                            "expected between 1 and {MAX_TOKEN_MINUTES} minutes, got {raw:?}"
                        ),
                    })
                }
            },
        };

        let token_seconds = token_minutes
            .checked_mul(60)
            .ok_or_else(|| ConfigError::Invalid {
                var: TOKEN_MINUTES_VAR,
                reason: format!("{token_minutes} minutes overflows"),
            })?;

        Ok(Self {
            listen_addr,
            token_secret,
            token_lifetime: Duration::from_secs(token_seconds),
        })
    }
}

impl std::fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSettings")
            .field("listen_addr", &self.listen_addr)
            .field("token_lifetime", &self.token_lifetime)
            .finish_non_exhaustive()
    }
}
