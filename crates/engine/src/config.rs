use stagequest_core::environment::{self, Environment};
use stagequest_core::CoreError;

/// Deployment-scoped configuration: which environment's data this client
/// reads and writes, and the host it is actually served from.
///
/// Parsing happens once, up front. A mistyped environment tag must never
/// reach a write path, so it fails construction instead of being checked
/// per call.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    environment: Environment,
    host: String,
}

impl EngineConfig {
    pub fn from_tags(environment_tag: &str, host: &str) -> Result<Self, CoreError> {
        Ok(Self {
            environment: Environment::parse(environment_tag)?,
            host: host.to_string(),
        })
    }

    pub fn new(environment: Environment, host: &str) -> Self {
        Self {
            environment,
            host: host.to_string(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// True when admin writes must be refused locally: the client is
    /// configured for prod data but running on a non-production host.
    pub fn write_lock_active(&self) -> bool {
        environment::write_lock_active(self.environment, &self.host)
    }
}
