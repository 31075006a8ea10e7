//! Presentation Layer - HTTP
//!
//! Axum handlers, DTOs, the admission middleware and the router.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
