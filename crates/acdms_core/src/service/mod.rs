//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and repository calls into use-case level APIs.
//! - Keep UI/FFI/HTTP layers decoupled from storage details.

pub mod agniveer_service;
pub mod sheet;
pub mod transfer;
