//! Invocation ID generation

use std::fmt;
use uuid::Uuid;

/// Identifier attached to the log span of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationId(String);

impl InvocationId {
    /// Generate a new random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string()[..12].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
