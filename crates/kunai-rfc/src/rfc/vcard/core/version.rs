//! vCard versions.

use std::fmt;

/// vCard version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum VCardVersion {
    /// vCard 2.1 (Versit).
    V2_1,
    /// vCard 3.0 (RFC 2426).
    #[default]
    V3_0,
    /// vCard 4.0 (RFC 6350).
    V4_0,
}

impl VCardVersion {
    /// Every version, oldest first.
    pub const ALL: &'static [Self] = &[Self::V2_1, Self::V3_0, Self::V4_0];

    /// Versions that use the legacy (pre-RFC 6350) syntax.
    pub const LEGACY: &'static [Self] = &[Self::V2_1, Self::V3_0];

    /// Parses a `VERSION` value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "2.1" => Some(Self::V2_1),
            "3.0" => Some(Self::V3_0),
            "4.0" => Some(Self::V4_0),
            _ => None,
        }
    }

    /// Returns the version string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V2_1 => "2.1",
            Self::V3_0 => "3.0",
            Self::V4_0 => "4.0",
        }
    }

    /// Returns whether this is 2.1 or 3.0.
    #[must_use]
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::V2_1 | Self::V3_0)
    }
}

impl fmt::Display for VCardVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for VCardVersion {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}
