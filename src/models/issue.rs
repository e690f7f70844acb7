//! Normalized vulnerability findings.

use serde::{Deserialize, Serialize};

/// Issue severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Affected location of an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extra: String,
}

/// External link attached to an issue (advisories, write-ups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

/// A single vulnerability finding reported by a scanning module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub summary: String,
    #[serde(default)]
    pub severity: Severity,
    /// Numeric vulnerability class assigned by the module.
    #[serde(default)]
    pub vuln_type: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<IssueUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<Reference>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(rename = "false", default)]
    pub false_positive: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub resolved: bool,
}

impl Issue {
    /// Create an unconfirmed issue with no attached locations.
    pub fn new(summary: impl Into<String>, severity: Severity) -> Self {
        Self {
            summary: summary.into(),
            severity,
            vuln_type: 0,
            desc: String::new(),
            urls: Vec::new(),
            references: Vec::new(),
            extras: Vec::new(),
            confirmed: false,
            false_positive: false,
            muted: false,
            resolved: false,
        }
    }
}
