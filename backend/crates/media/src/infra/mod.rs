//! Infrastructure Layer
//!
//! Filesystem, image codecs, and the command line engines.

pub mod artifact_store;
pub mod engines;
pub mod image_store;
pub mod process;
pub mod reaper;
pub mod rembg;
pub mod ytdlp;
