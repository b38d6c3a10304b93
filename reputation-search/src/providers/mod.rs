//! Search provider implementations.
//!
//! Each module provides a struct implementing [`crate::provider::SearchProvider`].

pub mod google;

pub use google::GoogleCseProvider;
