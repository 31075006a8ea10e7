//! Common ID Types
//!
//! Type-safe IDs for files the service writes to disk.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use uuid::Uuid;

/// Number of hex characters used when an ID is embedded in a file name
pub const SHORT_LEN: usize = 8;

/// Generic typed ID wrapper
///
/// Usage:
/// ```
/// use kernel::id::{Id, markers};
/// type OutputId = Id<markers::Artifact>;
/// let id = OutputId::new();
/// assert_eq!(id.short().len(), 8);
/// ```
pub struct Id<T> {
    value: Uuid,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create a new random ID (UUID v4)
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4(),
            _marker: PhantomData,
        }
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            value: uuid,
            _marker: PhantomData,
        }
    }

    /// Leading hex characters of the UUID, used as the file name stem
    pub fn short(&self) -> String {
        let mut hex = self.value.simple().to_string();
        hex.truncate(SHORT_LEN);
        hex
    }

    /// File name of the form `{prefix}_{short}.{ext}`
    pub fn file_name(&self, prefix: &str, ext: &str) -> String {
        format!("{}_{}.{}", prefix, self.short(), ext)
    }

    /// File name stem `{prefix}_{short}` (for tools that pick the extension)
    pub fn stem(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.short())
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Hand-written so the marker type needs no trait impls of its own.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl<T> From<Uuid> for Id<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

/// Marker types for different file IDs
pub mod markers {
    /// Marker for artifacts served under `/outputs`
    pub struct Artifact;

    /// Marker for upload staging files handed to external engines
    pub struct Staging;
}

pub type ArtifactId = Id<markers::Artifact>;
pub type StagingId = Id<markers::Staging>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_is_uuid_prefix() {
        let uuid = Uuid::parse_str("0123456789abcdef0123456789abcdef").unwrap();
        let id: ArtifactId = Id::from_uuid(uuid);
        assert_eq!(id.short(), "01234567");
        assert_eq!(id.to_string(), "01234567");
    }

    #[test]
    fn test_file_name_and_stem() {
        let uuid = Uuid::parse_str("deadbeef000000000000000000000000").unwrap();
        let id: ArtifactId = Id::from_uuid(uuid);
        assert_eq!(id.file_name("rbg", "png"), "rbg_deadbeef.png");
        assert_eq!(id.stem("dl"), "dl_deadbeef");
    }

    #[test]
    fn test_ids_are_random() {
        let a = StagingId::new();
        let b = StagingId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ids_copy_and_compare_without_marker_impls() {
        let a = ArtifactId::new();
        let b = a;
        assert_eq!(a, b);

        let mut seen = std::collections::HashSet::new();
        seen.insert(a);
        assert!(seen.contains(&b));
    }

    #[derive(Debug, Clone)]
    struct Holder {
        id: StagingId,
    }

    #[test]
    fn test_id_field_derives_clone() {
        let holder = Holder { id: StagingId::new() };
        assert_eq!(holder.clone().id, holder.id);
    }
}
