//! Detected technologies.

use serde::{Deserialize, Serialize};

/// A technology fingerprinted on the target (server, framework, library).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tech {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Detection confidence, 0-100.
    #[serde(default)]
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Tech {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            confidence: 100,
            categories: Vec::new(),
            icon: None,
            url: None,
        }
    }
}
