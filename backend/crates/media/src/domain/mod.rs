//! Domain Layer
//!
//! Value objects, entities, engine interfaces and pure processing logic.

pub mod engines;
pub mod entities;
pub mod inpaint;
pub mod services;
pub mod value_objects;

pub use engines::{BackgroundRemover, DownloadPlan, EngineError, VideoExtractor};
pub use entities::{
    DownloadedFile, FormatOption, OutputArtifact, RawFormat, RawVideoInfo, VideoSummary,
};
pub use value_objects::{
    DomainPolicy, DomainVerdict, DownloadFormat, EraseParams, PolicyMode, Quality,
};
