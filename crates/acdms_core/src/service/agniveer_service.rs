//! Agniveer use-case service.
//!
//! # Responsibility
//! - Provide the Add/Edit/Delete/Search flows used by every UI surface.
//! - Run the field validator before any write reaches the store.
//!
//! # Invariants
//! - No write bypasses `validate_agniveer`.
//! - Edit validates the merged record, not just the submitted patch.
//! - Concurrent edit/delete on one identity is last-write-wins; an edit
//!   racing a delete reports `NotFound` when the row is already gone.

use crate::model::agniveer::{AgniveerId, AgniveerRecord};
use crate::model::validation::{validate_agniveer, ValidationErrors};
use crate::repo::agniveer_repo::{AgniveerRepository, RepoError};
use crate::search::filter::SearchFilter;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for record use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Candidate record failed field validation; nothing was written.
    Validation(ValidationErrors),
    /// Target record does not exist.
    NotFound(AgniveerId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "validation failed: {errors}"),
            Self::NotFound(id) => write!(f, "agniveer not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent agniveer state: {details}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Record service facade over repository implementations.
pub struct AgniveerService<R: AgniveerRepository> {
    repo: R,
}

impl<R: AgniveerRepository> AgniveerService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Runs the field validator without touching the store.
    pub fn validate(&self, record: &AgniveerRecord) -> ValidationErrors {
        validate_agniveer(record)
    }

    /// Add flow: validates then inserts. Returns the assigned identity.
    pub fn add(&self, record: &AgniveerRecord) -> ServiceResult<AgniveerId> {
        validate_agniveer(record).into_result()?;
        let id = self.repo.insert(record)?;
        info!("event=agniveer_add module=service status=ok id={id}");
        Ok(id)
    }

    /// Edit flow: merges `patch` onto the stored record, validates the
    /// result and writes the patch. Returns the stored record after update.
    pub fn edit(&self, id: AgniveerId, patch: &AgniveerRecord) -> ServiceResult<AgniveerRecord> {
        let mut merged = self.repo.get(id)?.ok_or(ServiceError::NotFound(id))?;
        merged.merge_from(patch);
        validate_agniveer(&merged).into_result()?;

        if self.repo.update(id, patch)? == 0 {
            warn!("event=agniveer_edit module=service status=error id={id} error_code=row_missing");
            return Err(ServiceError::NotFound(id));
        }
        info!("event=agniveer_edit module=service status=ok id={id}");

        self.repo
            .get(id)?
            .ok_or(ServiceError::InconsistentState(
                "edited agniveer not found in read-back",
            ))
    }

    /// Delete flow: irreversible hard delete by identity.
    pub fn remove(&self, id: AgniveerId) -> ServiceResult<()> {
        if self.repo.delete(id)? == 0 {
            return Err(ServiceError::NotFound(id));
        }
        info!("event=agniveer_delete module=service status=ok id={id}");
        Ok(())
    }

    pub fn get(&self, id: AgniveerId) -> ServiceResult<Option<AgniveerRecord>> {
        Ok(self.repo.get(id)?)
    }

    /// All records in store order.
    pub fn list(&self) -> ServiceResult<Vec<AgniveerRecord>> {
        Ok(self.repo.list_all()?)
    }

    /// Store-backed substring search. An empty filter returns everything.
    pub fn search(&self, filter: &SearchFilter) -> ServiceResult<Vec<AgniveerRecord>> {
        let records = self.repo.search(filter)?;
        info!(
            "event=agniveer_search module=service status=ok terms={} hits={}",
            filter.len(),
            records.len()
        );
        Ok(records)
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count()?)
    }
}
