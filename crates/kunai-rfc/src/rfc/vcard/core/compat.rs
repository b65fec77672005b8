//! Producer-specific quirks.

use std::fmt;
use std::str::FromStr;

/// Alters reading and writing to match a known producer's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompatibilityMode {
    /// Follow the RFCs.
    #[default]
    Rfc,
    /// Microsoft Outlook: 2.1 output encodes newlines and non-ASCII text as
    /// quoted-printable instead of backslash escapes.
    MsOutlook,
    /// Apple Address Book: commas inside `N` components are literal.
    MacAddressBook,
}

impl CompatibilityMode {
    /// Returns the configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rfc => "rfc",
            Self::MsOutlook => "ms_outlook",
            Self::MacAddressBook => "mac_address_book",
        }
    }
}

impl fmt::Display for CompatibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompatibilityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rfc" => Ok(Self::Rfc),
            "ms_outlook" | "outlook" => Ok(Self::MsOutlook),
            "mac_address_book" | "mac" => Ok(Self::MacAddressBook),
            other => Err(format!("unknown compatibility mode: {other}")),
        }
    }
}
