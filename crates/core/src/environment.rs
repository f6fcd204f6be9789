use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The canonical production host. Admin writes against prod data are only
/// allowed when the page is actually served from this host.
pub const PRODUCTION_HOST: &str = "theaccidentalretiree.app";

/// Which copy of the stage-control data a client reads and writes.
/// Every registry row is keyed by environment, so dev toggles never leak
/// into the live contest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    /// Parses a configured environment tag. Anything but the two known tags
    /// is a hard configuration error: writing to a mistyped environment is
    /// worse than refusing to start.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(CoreError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side guard against mutating production stage controls from a
/// staging or preview deployment. Derived purely from configuration and the
/// current host; never consults the network. This is a safety rail, not a
/// security boundary — the backing store still applies its own rules.
pub fn write_lock_active(environment: Environment, host: &str) -> bool {
    environment == Environment::Prod && host != PRODUCTION_HOST
}
