//! Domain types for the CMS page versioning engine.
//!
//! This crate has no internal dependencies so it can be shared by the store
//! layer, the HTTP layer and any future tooling.

pub mod content;
pub mod error;
pub mod identity;
pub mod locale;
pub mod search;
pub mod types;
