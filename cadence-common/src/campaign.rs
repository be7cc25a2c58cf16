use std::{fmt, str::FromStr};

use crate::error::CampaignIdError;

/// Identifier of a single outbound campaign.
///
/// Each campaign owns exactly one config record and one state record in the
/// store, and the identifier doubles as the file name stem in the file-backed
/// store.
///
/// # Security
/// Parsing rejects anything that could escape the store directory:
/// - Path separators and any character outside `[A-Za-z0-9._-]`
/// - A leading `.` and any `..` sequence
/// - Identifiers longer than [`CampaignId::MAX_LEN`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CampaignId(String);

impl CampaignId {
    pub const MAX_LEN: usize = 128;

    /// Validate and wrap a campaign identifier.
    ///
    /// # Errors
    /// Returns a [`CampaignIdError`] describing the first rule the identifier breaks.
    pub fn new(id: impl Into<String>) -> Result<Self, CampaignIdError> {
        let id = id.into();

        if id.is_empty() {
            return Err(CampaignIdError::Empty);
        }

        let len = id.chars().count();
        if len > Self::MAX_LEN {
            return Err(CampaignIdError::TooLong {
                len,
                max: Self::MAX_LEN,
            });
        }

        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(CampaignIdError::InvalidCharacter(c));
        }

        if id.starts_with('.') || id.contains("..") {
            return Err(CampaignIdError::Traversal(id));
        }

        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CampaignId {
    type Err = CampaignIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CampaignId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for CampaignId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for CampaignId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
