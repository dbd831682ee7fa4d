//! dashgen repository access - fetching, scanning, and aggregating example metadata
//!
//! Talks to the hosting API through [`api::RepositoryApiClient`] and turns the
//! configured repository list into [`dashgen_core::DashboardData`]

pub mod aggregator;
pub mod api;
pub mod extract;
pub mod fetchers;
pub mod pipeline;
pub mod scanner;

pub use aggregator::*;
pub use api::*;
pub use extract::*;
pub use fetchers::*;
pub use pipeline::*;
pub use scanner::*;
