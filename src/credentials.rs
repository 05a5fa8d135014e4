use std::{collections::HashMap, error::Error, fmt};

use async_trait::async_trait;

use crate::types::Username;

/// A plaintext password. Never printed through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(pub String);

impl Password {
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve the password of the user with the specified username, or `None` if no such
    /// user exists.
    async fn lookup(
        &self,
        username: &Username,
    ) -> Result<Option<Password>, Box<dyn Error + Send + Sync>>;
}

/// A fixed, read-only username to password table.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    storage: HashMap<Username, Password>,
}

impl StaticCredentials {
    pub fn new<U, P>(entries: impl IntoIterator<Item = (U, P)>) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            storage: entries
                .into_iter()
                .map(|(username, password)| (Username(username.into()), Password(password.into())))
                .collect(),
        }
    }

    /// The three demo accounts.
    pub fn demo() -> Self {
        Self::new([
            ("admin", "password123"),
            ("user", "userpass"),
            ("demo", "demo123"),
        ])
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn lookup(
        &self,
        username: &Username,
    ) -> Result<Option<Password>, Box<dyn Error + Send + Sync>> {
        Ok(self.storage.get(username).cloned())
    }
}
