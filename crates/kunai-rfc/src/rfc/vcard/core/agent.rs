//! Someone acting on behalf of the vCard's subject (AGENT).

use super::{KnownProperty, VCard};

/// Either a URL pointing at the agent's information or an embedded vCard.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Agent {
    /// Neither form set; skipped when written.
    #[default]
    Empty,
    Url(String),
    VCard(Box<VCard>),
}

impl Agent {
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    #[must_use]
    pub fn vcard(vcard: VCard) -> Self {
        Self::VCard(Box::new(vcard))
    }

    /// The embedded vCard, if any.
    #[must_use]
    pub fn as_vcard(&self) -> Option<&VCard> {
        match self {
            Self::VCard(vcard) => Some(vcard),
            Self::Empty | Self::Url(_) => None,
        }
    }
}

impl KnownProperty for Agent {
    const NAME: &'static str = "AGENT";
}
