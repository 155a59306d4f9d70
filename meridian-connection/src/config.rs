//! Member configuration
//!
//! Static description of a federation member, typically one entry of a
//! deployment's member list. Connection implementations take one of these;
//! what the endpoint string means (HTTP URL, in-process alias, ...) is up to
//! the implementation.

use serde::{Deserialize, Serialize};

/// Static description of one federation member
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    /// Endpoint identifier for this member
    pub endpoint: String,

    /// Human-readable label for logs and diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MemberConfig {
    /// Create a config with just an endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            label: None,
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The name to show in logs: the label when present, else the endpoint
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.endpoint)
    }
}
