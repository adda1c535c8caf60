//! Login gate collaborators.
//!
//! # Responsibility
//! - Define the `Authenticator` seam used by every UI surface.
//! - Provide the fixed-credential implementation the application ships with.
//!
//! # Invariants
//! - Credential comparison is constant-time with respect to content.
//! - Outcomes never carry the submitted password.

use subtle::ConstantTimeEq;

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "ARCShillong";

/// Result of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted { username: String },
    Denied,
}

impl AuthOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

/// Swappable credential check.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> AuthOutcome;
}

/// Single configured username/password pair.
#[derive(Clone)]
pub struct FixedCredentialAuthenticator {
    username: String,
    password: String,
}

impl FixedCredentialAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into().trim().to_string(),
            password: password.into(),
        }
    }
}

impl Default for FixedCredentialAuthenticator {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

impl std::fmt::Debug for FixedCredentialAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedCredentialAuthenticator")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Authenticator for FixedCredentialAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        let username = username.trim();
        let user_ok: bool = username.as_bytes().ct_eq(self.username.as_bytes()).into();
        let password_ok: bool = password.as_bytes().ct_eq(self.password.as_bytes()).into();

        if user_ok && password_ok {
            AuthOutcome::Granted {
                username: username.to_string(),
            }
        } else {
            AuthOutcome::Denied
        }
    }
}
