//! Version types for schema compatibility.

use serde::{Deserialize, Serialize};

use crate::error::LurkError;

/// Schema version using semantic versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u16,
    /// Minor version (backwards-compatible additions)
    pub minor: u16,
    /// Patch version (bug fixes)
    pub patch: u16,
}

impl SchemaVersion {
    /// Creates a new schema version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Current scenario file version.
    pub const SCENARIO: Self = Self::new(1, 0, 0);

    /// Checks if this version is compatible with another version.
    /// Compatible means same major version and this minor >= other minor.
    #[must_use]
    pub const fn is_compatible_with(&self, other: &Self) -> bool {
        self.major == other.major && self.minor >= other.minor
    }

    /// Fails with [`LurkError::VersionMismatch`] unless this (reader) version
    /// can load data written at `data_version`.
    pub fn ensure_can_read(&self, data_version: &Self) -> Result<(), LurkError> {
        if self.is_compatible_with(data_version) {
            Ok(())
        } else {
            Err(LurkError::VersionMismatch {
                expected: self.to_string(),
                actual: data_version.to_string(),
            })
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::SCENARIO
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_can_read_rejects_newer_minor() {
        let reader = SchemaVersion::new(1, 0, 0);
        let data = SchemaVersion::new(1, 2, 0);
        assert!(matches!(
            reader.ensure_can_read(&data),
            Err(LurkError::VersionMismatch { .. })
        ));
        assert!(data.ensure_can_read(&reader).is_ok());
    }
}
