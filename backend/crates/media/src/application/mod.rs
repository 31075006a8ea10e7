//! Application Layer - Use Cases
//!
//! Orchestrates domain logic and infrastructure for each endpoint.

pub mod config;
pub mod erase_object;
pub mod remove_background;
pub mod video_download;
pub mod video_info;
