use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

const SIMULATED_PREFIX: &str = "simulated-";

/// Opaque participant identifier, unique per signaling connection.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PeerId(Arc<str>);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    /// Identifier for a participant injected by the churn simulator.
    pub fn simulated() -> Self {
        Self(format!("{}{}", SIMULATED_PREFIX, Uuid::new_v4().simple()).into())
    }

    pub fn is_simulated(&self) -> bool {
        self.0.starts_with(SIMULATED_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
