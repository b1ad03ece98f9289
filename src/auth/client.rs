use std::time::Duration;

use bytes::Bytes;
use form_urlencoded::Serializer;
use hyper::{
    Request, StatusCode,
    http::{self, request},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tap::TapFallible;

use crate::{
    prelude::*,
    source::SourceConfig,
    util::{http_client, send_request, HttpClient, HttpHost, RequestBody},
};
use super::{AuthConfig, IdentityProvider, User};


/// Talks to the auth service living next to the lecture REST interface.
pub(crate) struct SessionProvider {
    http_client: HttpClient,
    host: HttpHost,
    api_key: SecretString,
    access_token: Option<SecretString>,
    timeout: Duration,
}

/// A fresh session returned by [`SessionProvider::sign_in`].
pub(crate) struct Session {
    pub(crate) access_token: SecretString,
    pub(crate) expires_in: Option<Duration>,
    pub(crate) user: User,
}

/// User as known to the auth service. Profile data lives in a separate table.
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
    user: AuthUser,
}

/// Depending on the auth service settings, signing up either signs the new
/// user in directly or first requires confirming the email address.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Unconfirmed(AuthUser),
}

/// Result of [`SessionProvider::sign_up`].
pub(crate) enum SignUp {
    SignedIn(Session),
    ConfirmationPending(User),
}

#[derive(Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl AuthErrorBody {
    fn describe(body: &[u8], status: StatusCode) -> String {
        serde_json::from_slice::<Self>(body).ok()
            .and_then(|e| e.error_description.or(e.msg).or(e.message))
            .unwrap_or_else(|| format!("HTTP {status}"))
    }
}

impl AuthUser {
    /// Used when the user has no row in the profiles table.
    fn into_fallback_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            full_name: self.user_metadata.full_name,
            avatar_url: self.user_metadata.avatar_url,
            role: None,
        }
    }
}

impl SessionProvider {
    pub(crate) fn new(source: &SourceConfig, auth: &AuthConfig) -> Result<Self> {
        Ok(Self {
            http_client: http_client()?,
            host: source.host.clone(),
            api_key: SecretString::from(source.api_key.expose_secret().to_owned()),
            access_token: auth.access_token.as_ref()
                .map(|t| SecretString::from(t.expose_secret().to_owned())),
            timeout: source.request_timeout,
        })
    }

    fn req_builder(&self, pq: &str, bearer: &SecretString) -> request::Builder {
        Request::builder()
            .uri(self.host.with_path_and_query(pq))
            .header("apikey", self.api_key.expose_secret())
            .header(http::header::AUTHORIZATION, format!("Bearer {}", bearer.expose_secret()))
    }

    async fn send(&self, req: Request<RequestBody>) -> Result<(StatusCode, Bytes)> {
        let (parts, body) = send_request(&self.http_client, req, self.timeout).await?;
        Ok((parts.status, body))
    }

    /// Signs in with email and password and returns the new session.
    pub(crate) async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session> {
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let req = self.req_builder("/auth/v1/token?grant_type=password", &self.api_key)
            .method(http::Method::POST)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(RequestBody::from(body.to_string()))
            .expect("bug: failed to build request");

        debug!("Signing in as '{email}'");
        let (status, body) = self.send(req).await?;
        if !status.is_success() {
            bail!("sign in failed: {}", AuthErrorBody::describe(&body, status));
        }

        let response: TokenResponse = serde_json::from_slice(&body)
            .context("failed to deserialize token response")?;
        let session = self.into_session(response).await?;
        info!("Signed in as '{}'", session.user.display_name());

        Ok(session)
    }

    /// Registers a new user. The full name is stored as user metadata, from
    /// which the profile row is created by the service.
    pub(crate) async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        full_name: &str,
    ) -> Result<SignUp> {
        let body = signup_body(email, password, full_name);
        let req = self.req_builder("/auth/v1/signup", &self.api_key)
            .method(http::Method::POST)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(RequestBody::from(body.to_string()))
            .expect("bug: failed to build request");

        debug!("Signing up as '{email}'");
        let (status, body) = self.send(req).await?;
        if !status.is_success() {
            bail!("sign up failed: {}", AuthErrorBody::describe(&body, status));
        }

        let response: SignUpResponse = serde_json::from_slice(&body)
            .tap_err(|_| trace!("Unparsable body: {}", String::from_utf8_lossy(&body)))
            .context("failed to deserialize sign up response")?;
        match response {
            SignUpResponse::Session(response) => {
                let session = self.into_session(response).await?;
                info!("Signed up and signed in as '{}'", session.user.display_name());
                Ok(SignUp::SignedIn(session))
            }
            SignUpResponse::Unconfirmed(auth_user) => {
                info!("Signed up as '{email}', waiting for email confirmation");
                Ok(SignUp::ConfirmationPending(auth_user.into_fallback_user()))
            }
        }
    }

    /// Ends the session of the configured access token. The token cannot be
    /// used afterwards.
    pub(crate) async fn sign_out(&self) -> Result<()> {
        let Some(token) = &self.access_token else {
            bail!("no access token configured: not signed in");
        };

        let req = self.req_builder("/auth/v1/logout", token)
            .method(http::Method::POST)
            .body(RequestBody::new(Bytes::new()))
            .expect("bug: failed to build request");
        let (status, body) = self.send(req).await?;

        // An already invalid token means the session is gone anyway.
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("Configured access token was already rejected by the auth service");
            return Ok(());
        }
        if !status.is_success() {
            bail!("sign out failed: {}", AuthErrorBody::describe(&body, status));
        }

        info!("Signed out");
        Ok(())
    }

    async fn into_session(&self, response: TokenResponse) -> Result<Session> {
        let access_token = SecretString::from(response.access_token);
        let user = self.load_profile(response.user, &access_token).await?;
        Ok(Session {
            access_token,
            expires_in: response.expires_in.map(Duration::from_secs),
            user,
        })
    }

    /// Fetches the profile row of the given user.
    async fn load_profile(&self, auth_user: AuthUser, token: &SecretString) -> Result<User> {
        let query = Serializer::new(String::new())
            .append_pair("id", &format!("eq.{}", auth_user.id))
            .append_pair("select", "*")
            .finish();
        let req = self.req_builder(&format!("/rest/v1/profiles?{query}"), token)
            .body(RequestBody::new(Bytes::new()))
            .expect("bug: failed to build request");

        let (status, body) = self.send(req).await?;
        if !status.is_success() {
            bail!("failed to load user profile: {}", AuthErrorBody::describe(&body, status));
        }

        let mut profiles = serde_json::from_slice::<Vec<User>>(&body)
            .tap_err(|_| trace!("Unparsable body: {}", String::from_utf8_lossy(&body)))
            .context("failed to deserialize user profile")?;

        if profiles.is_empty() {
            debug!("User {} has no profile, using data from auth service", auth_user.id);
            Ok(auth_user.into_fallback_user())
        } else {
            Ok(profiles.swap_remove(0))
        }
    }
}

fn signup_body(email: &str, password: &SecretString, full_name: &str) -> serde_json::Value {
    serde_json::json!({
        "email": email,
        "password": password.expose_secret(),
        "data": { "full_name": full_name.trim() },
    })
}

impl IdentityProvider for SessionProvider {
    async fn current_user(&self) -> Result<Option<User>> {
        let Some(token) = &self.access_token else {
            trace!("No access token configured: not signed in");
            return Ok(None);
        };

        let req = self.req_builder("/auth/v1/user", token)
            .body(RequestBody::new(Bytes::new()))
            .expect("bug: failed to build request");
        let (status, body) = self.send(req).await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("Configured access token was rejected (expired?): not signed in");
            return Ok(None);
        }
        if !status.is_success() {
            bail!("failed to get current user: {}", AuthErrorBody::describe(&body, status));
        }

        let auth_user: AuthUser = serde_json::from_slice(&body)
            .context("failed to deserialize current user")?;
        self.load_profile(auth_user, token).await.map(Some)
    }
}


#[cfg(test)]
mod tests {
    use hyper::StatusCode;
    use secrecy::SecretString;

    use super::{signup_body, AuthErrorBody, SignUpResponse, TokenResponse};

    #[test]
    fn token_response_without_profile() {
        let json = r#"{
            "access_token": "eyJhbGciOi",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r3fr3sh",
            "user": {
                "id": "5f0e",
                "email": "ada@example.com",
                "user_metadata": { "full_name": "Ada Lovelace" }
            }
        }"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.expires_in, Some(3600));

        let user = response.user.into_fallback_user();
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.role, None);
    }

    #[test]
    fn error_descriptions() {
        let body = br#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            AuthErrorBody::describe(body, StatusCode::BAD_REQUEST),
            "Invalid login credentials",
        );
        assert_eq!(
            AuthErrorBody::describe(b"<html>", StatusCode::BAD_GATEWAY),
            "HTTP 502 Bad Gateway",
        );
    }

    #[test]
    fn signup_stores_full_name_as_metadata() {
        let password = SecretString::from("hunter2".to_owned());
        let body = signup_body("ada@example.com", &password, " Ada Lovelace ");
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["password"], "hunter2");
        assert_eq!(body["data"]["full_name"], "Ada Lovelace");
    }

    #[test]
    fn signup_responses() {
        let confirmed = r#"{
            "access_token": "eyJhbGciOi",
            "expires_in": 3600,
            "user": { "id": "5f0e", "email": "ada@example.com" }
        }"#;
        let response: SignUpResponse = serde_json::from_str(confirmed).unwrap();
        assert!(matches!(response, SignUpResponse::Session(_)));

        let unconfirmed = r#"{
            "id": "5f0e",
            "email": "ada@example.com",
            "confirmation_sent_at": "2024-03-01T10:00:00Z",
            "user_metadata": { "full_name": "Ada Lovelace" }
        }"#;
        let response: SignUpResponse = serde_json::from_str(unconfirmed).unwrap();
        let SignUpResponse::Unconfirmed(user) = response else {
            panic!("expected unconfirmed user");
        };
        assert_eq!(user.into_fallback_user().display_name(), "Ada Lovelace");
    }
}
