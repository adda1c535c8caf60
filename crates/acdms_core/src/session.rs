//! Explicit UI session state.
//!
//! # Responsibility
//! - Hold the state a UI controller needs between events: signed-in user,
//!   current page, the loaded record table and its active refinement.
//! - Replace ad-hoc shared globals; the controller owns one `AppSession`
//!   and lends it to child views.
//!
//! # Invariants
//! - Only `Page::Login` is reachable without an authenticated user.
//! - `logout` clears every piece of loaded data.
//! - `visible_records` is always `loaded` filtered by `refinement`.

use crate::auth::{AuthOutcome, Authenticator};
use crate::model::agniveer::{AgniveerId, AgniveerRecord};
use crate::search::filter::{filter_records, SearchFilter};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Top-level screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Login,
    Home,
    Add,
    Search,
    Manage,
}

impl Page {
    /// Parses a page name; unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "login" => Some(Self::Login),
            "home" => Some(Self::Home),
            "add" => Some(Self::Add),
            "search" => Some(Self::Search),
            "manage" => Some(Self::Manage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    InvalidCredentials,
    NotAuthenticated,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid credentials. Please try again."),
            Self::NotAuthenticated => write!(f, "login required"),
        }
    }
}

impl Error for SessionError {}

/// State owned by the top-level UI controller.
#[derive(Debug, Clone)]
pub struct AppSession {
    user: Option<String>,
    page: Page,
    loaded: Vec<AgniveerRecord>,
    refinement: SearchFilter,
}

impl Default for AppSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AppSession {
    /// Creates a signed-out session on the login page.
    pub fn new() -> Self {
        Self {
            user: None,
            page: Page::Login,
            loaded: Vec::new(),
            refinement: SearchFilter::new(),
        }
    }

    /// Checks credentials and, on success, moves to the home page.
    pub fn login(
        &mut self,
        authenticator: &dyn Authenticator,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        match authenticator.authenticate(username, password) {
            AuthOutcome::Granted { username } => {
                info!("event=login module=session status=ok");
                self.user = Some(username);
                self.page = Page::Home;
                Ok(())
            }
            AuthOutcome::Denied => {
                warn!("event=login module=session status=error error_code=invalid_credentials");
                Err(SessionError::InvalidCredentials)
            }
        }
    }

    /// Signs out and drops all loaded data.
    pub fn logout(&mut self) {
        *self = Self::new();
        info!("event=logout module=session status=ok");
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn navigate(&mut self, page: Page) -> Result<(), SessionError> {
        if page != Page::Login && !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.page = page;
        Ok(())
    }

    /// Replaces the loaded table, keeping the active refinement.
    pub fn load_records(&mut self, records: Vec<AgniveerRecord>) -> Result<(), SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.loaded = records;
        Ok(())
    }

    pub fn loaded_records(&self) -> &[AgniveerRecord] {
        &self.loaded
    }

    /// Sets the in-memory refinement and returns the matching records.
    pub fn refine(&mut self, filter: SearchFilter) -> Vec<&AgniveerRecord> {
        self.refinement = filter;
        self.visible_records()
    }

    pub fn refinement(&self) -> &SearchFilter {
        &self.refinement
    }

    pub fn visible_records(&self) -> Vec<&AgniveerRecord> {
        filter_records(&self.loaded, &self.refinement)
    }

    /// Drops one record from the loaded table after a successful delete.
    pub fn forget_record(&mut self, id: AgniveerId) {
        self.loaded.retain(|record| record.id != Some(id));
    }
}

#[cfg(test)]
mod tests {
    use super::{AppSession, Page, SessionError};
    use crate::auth::FixedCredentialAuthenticator;
    use crate::model::agniveer::{AgniveerField, AgniveerRecord};
    use crate::search::filter::SearchFilter;

    fn record(id: i64, district: &str) -> AgniveerRecord {
        let mut record = AgniveerRecord::new().with(AgniveerField::District, district);
        record.id = Some(id);
        record
    }

    #[test]
    fn navigation_requires_login() {
        let mut session = AppSession::new();
        assert_eq!(session.navigate(Page::Manage), Err(SessionError::NotAuthenticated));
        assert!(session.navigate(Page::Login).is_ok());
    }

    #[test]
    fn login_then_refine_then_logout() {
        let auth = FixedCredentialAuthenticator::default();
        let mut session = AppSession::new();
        assert_eq!(
            session.login(&auth, "admin", "nope"),
            Err(SessionError::InvalidCredentials)
        );

        session.login(&auth, "admin", "ARCShillong").unwrap();
        assert_eq!(session.page(), Page::Home);
        session
            .load_records(vec![record(1, "East Khasi Hills"), record(2, "Shillong Cantt")])
            .unwrap();

        let visible = session.refine(SearchFilter::new().with(AgniveerField::District, "shillong"));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, Some(2));

        session.forget_record(2);
        assert!(session.visible_records().is_empty());

        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.page(), Page::Login);
        assert!(session.loaded_records().is_empty());
        assert!(session.refinement().is_empty());
    }

    #[test]
    fn page_parse_is_case_insensitive() {
        assert_eq!(Page::parse(" Manage "), Some(Page::Manage));
        assert_eq!(Page::parse("settings"), None);
    }
}
