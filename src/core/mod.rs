//! Core abstractions shared by providers, the server and the CLI

pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod quote;

// Re-export main types for cleaner imports
pub use cache::{Cache, CachePolicy};
pub use error::{QuoteError, Resource};
pub use quote::{Fund, Quote, QuoteProvider};
