//! Persistence layer
//!
//! The [`Store`] trait is the only way the pipeline and the dashboard touch
//! storage; `adapters::SqliteStore` is the production implementation.

pub mod traits;

pub use traits::Store;
