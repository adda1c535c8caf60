//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record-store contract consumed by services.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return row counts exactly as reported by the store;
//!   mapping a zero count to `NotFound` is a service decision.
//! - Transport errors are never swallowed into empty results.

pub mod agniveer_repo;
