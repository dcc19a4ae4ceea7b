//! Source identifier value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::SourceIdParseError;

/// Identifies one audio source being recorded.
///
/// Derived from the source type plus an instance discriminator, so the same
/// physical source always maps to the same id. At most one session exists per
/// id at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SourceId {
    /// The default microphone (discriminator kept for future multi-mic setups)
    Mic(u32),
    /// A system capture device, addressed by enumeration index
    Device(u32),
}

impl SourceId {
    /// The default microphone source
    pub const fn mic() -> Self {
        Self::Mic(1)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mic(n) => write!(f, "mic-{}", n),
            Self::Device(n) => write!(f, "dev-{}", n),
        }
    }
}

impl FromStr for SourceId {
    type Err = SourceIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let parse_err = || SourceIdParseError {
            input: s.to_string(),
        };

        if let Some(rest) = input.strip_prefix("mic-") {
            return rest.parse().map(Self::Mic).map_err(|_| parse_err());
        }
        if let Some(rest) = input.strip_prefix("dev-") {
            return rest.parse().map(Self::Device).map_err(|_| parse_err());
        }
        Err(parse_err())
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SourceId {
    type Error = SourceIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
