//! Media Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Value objects, entities, engine traits, erase pipeline
//! - `application/` - Use cases and configuration
//! - `infra/` - Filesystem store, image codecs, CLI engines, reaper
//! - `presentation/` - HTTP handlers, admission middleware, router
//!
//! ## Resource Model
//! - Every `/api` request passes the per-client admission controller first
//! - Artifacts live in the output directory and are served under `/outputs`
//! - The reaper deletes files older than the retention threshold and prunes
//!   idle admission records; handlers nudge it after each success

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use infra::artifact_store::ArtifactStore;
pub use infra::engines::CliEngines;
pub use infra::reaper::{Reaper, SweepReport};
pub use presentation::handlers::MediaAppState;
pub use presentation::router::media_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
