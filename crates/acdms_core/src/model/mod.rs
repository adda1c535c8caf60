//! Domain model for Agniveer personnel records.
//!
//! # Responsibility
//! - Define the record type and its fixed attribute whitelist.
//! - Own field-level validation rules shared by every UI surface.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `AgniveerId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod agniveer;
pub mod validation;
