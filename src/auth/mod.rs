//! Users of the lecture service. Browsing works anonymously, creating
//! lectures requires a signed-in user.

use secrecy::SecretString;
use serde::Deserialize;

use crate::prelude::*;

mod client;

pub(crate) use self::client::{SessionProvider, SignUp};


#[derive(Debug, confique::Config)]
pub(crate) struct AuthConfig {
    /// Access token of a signed-in user, as printed by `lectern login`. Only
    /// required for uploading lectures. Can also be set via the environment
    /// variable `LECTERN_ACCESS_TOKEN`.
    #[config(env = "LECTERN_ACCESS_TOKEN")]
    pub(crate) access_token: Option<SecretString>,
}

/// Profile of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: Option<String>,
    pub(crate) full_name: Option<String>,
    pub(crate) avatar_url: Option<String>,
    pub(crate) role: Option<String>,
}

impl User {
    /// The name shown as instructor of uploaded lectures.
    pub(crate) fn display_name(&self) -> &str {
        [&self.full_name, &self.email]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("Anonymous")
    }
}

/// Tells who is currently signed in.
pub(crate) trait IdentityProvider {
    /// Returns `None` if nobody is signed in or the session has expired.
    async fn current_user(&self) -> Result<Option<User>>;
}
