//! Attaching bearer credentials to outgoing requests.
//!
//! ```text
//! reqwest::Request ──► BearerGuard::authorize ──► trusted? ──► Authorization: Bearer …
//!                                                    │
//!                                                    └─► EndpointError (request untouched)
//! ```
//!
//! Clients used with the guard must not follow redirects on their own,
//! otherwise a server could bounce the credential to a foreign host. Use
//! [`redirect_policy`] or [`BearerGuard::client_builder`].

use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::endpoints::TrustedEndpoints;
use crate::error::EndpointError;

/// Errors from authorizing a request.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Untrusted(#[from] EndpointError),

    #[error("bearer token contains characters not allowed in a header value")]
    InvalidToken,
}

/// Redirect policy for clients that carry credentials: never follow.
pub fn redirect_policy() -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::none()
}

/// Attaches a bearer token only to requests bound for trusted endpoints.
pub struct BearerGuard<'a> {
    endpoints: &'a TrustedEndpoints,
    login_authority: String,
    token: SecretString,
}

impl<'a> BearerGuard<'a> {
    pub fn new(
        endpoints: &'a TrustedEndpoints,
        login_authority: impl Into<String>,
        token: SecretString,
    ) -> Self {
        Self {
            endpoints,
            login_authority: login_authority.into(),
            token,
        }
    }

    /// A client builder with redirect-following disabled.
    pub fn client_builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder().redirect(redirect_policy())
    }

    pub fn login_authority(&self) -> &str {
        &self.login_authority
    }

    /// Validate the request's destination and, if trusted, set its
    /// `Authorization` header. Call again for every redirect target.
    pub fn authorize(&self, request: &mut reqwest::Request) -> Result<(), GuardError> {
        self.endpoints
            .validate_trusted_endpoint(request.url().as_str(), &self.login_authority)?;

        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token.expose_secret()))
            .map_err(|_| GuardError::InvalidToken)?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

impl std::fmt::Debug for BearerGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerGuard")
            .field("login_authority", &self.login_authority)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
