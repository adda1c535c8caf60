//! Desktop bridge crate.

pub mod api;
