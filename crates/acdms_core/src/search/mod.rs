//! Record search entry points.
//!
//! # Responsibility
//! - Expose the substring filter engine used by store-backed search and by
//!   in-memory refinement of an already-loaded table.
//!
//! # See also
//! - `repo::agniveer_repo` for the store-backed query.

pub mod filter;
