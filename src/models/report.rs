//! Composite scan report model.
//!
//! A report is a tagged union: leaves carry raw tool output, issues, or
//! technologies, and `multi` nodes carry child reports to arbitrary depth.
//! On the wire a report is one flat JSON object whose `type` field selects
//! which payload field is meaningful.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{hex_id, opt_hex_id};
use super::issue::Issue;
use super::tech::Tech;
use crate::error::{AppError, AppResult};

/// Deepest report tree accepted for storage, counting the root as level 1.
///
/// Stored payloads are decoded with serde_json's nesting limit of 128; an
/// issue leaf nests five levels and every `multi` level adds two.
pub const MAX_REPORT_DEPTH: usize = 32;

/// Report payload tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Raw,
    Issues,
    Techs,
    Multi,
    Empty,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Issues => "issues",
            Self::Techs => "techs",
            Self::Multi => "multi",
            Self::Empty => "empty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "raw" => Some(Self::Raw),
            "issues" => Some(Self::Issues),
            "techs" => Some(Self::Techs),
            "multi" => Some(Self::Multi),
            "empty" => Some(Self::Empty),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata of a file produced alongside raw tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    #[serde(with = "hex_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
}

/// Payload selected by the report type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReportPayload {
    Raw {
        raw: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        files: Vec<FileMeta>,
    },
    Issues {
        issues: Vec<Issue>,
    },
    Techs {
        techs: Vec<Tech>,
    },
    Multi {
        multi: Vec<Report>,
    },
    Empty,
}

impl ReportPayload {
    pub fn report_type(&self) -> ReportType {
        match self {
            Self::Raw { .. } => ReportType::Raw,
            Self::Issues { .. } => ReportType::Issues,
            Self::Techs { .. } => ReportType::Techs,
            Self::Multi { .. } => ReportType::Multi,
            Self::Empty => ReportType::Empty,
        }
    }
}

/// A node of the report tree.
///
/// `id`, `created` and `updated` are assigned when the root is persisted;
/// embedded sub-reports keep them empty. `scan` and `scan_session` are weak
/// back-references stamped on the whole subtree at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, with = "opt_hex_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, with = "opt_hex_id", skip_serializing_if = "Option::is_none")]
    pub scan: Option<Uuid>,
    #[serde(default, with = "opt_hex_id", skip_serializing_if = "Option::is_none")]
    pub scan_session: Option<Uuid>,
    #[serde(flatten)]
    pub payload: ReportPayload,
}

impl Report {
    /// Create an unpersisted, unassigned report.
    pub fn new(payload: ReportPayload) -> Self {
        Self {
            id: None,
            created: None,
            updated: None,
            scan: None,
            scan_session: None,
            payload,
        }
    }

    pub fn raw(raw: impl Into<String>, files: Vec<FileMeta>) -> Self {
        Self::new(ReportPayload::Raw {
            raw: raw.into(),
            files,
        })
    }

    pub fn issues(issues: Vec<Issue>) -> Self {
        Self::new(ReportPayload::Issues { issues })
    }

    pub fn techs(techs: Vec<Tech>) -> Self {
        Self::new(ReportPayload::Techs { techs })
    }

    pub fn multi(children: Vec<Report>) -> Self {
        Self::new(ReportPayload::Multi { multi: children })
    }

    pub fn empty() -> Self {
        Self::new(ReportPayload::Empty)
    }

    /// Parse a report submitted by a scanning module.
    ///
    /// A payload field required by the `type` tag but absent is rejected.
    pub fn from_json(body: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn report_type(&self) -> ReportType {
        self.payload.report_type()
    }

    /// Number of nodes on the longest root-to-leaf path. A leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];

        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let ReportPayload::Multi { multi } = &node.payload {
                stack.extend(multi.iter().map(|child| (child, level + 1)));
            }
        }

        deepest
    }

    /// Reject trees too deep to be read back from the store.
    pub fn check_depth(&self) -> AppResult<()> {
        let depth = self.depth();
        if depth > MAX_REPORT_DEPTH {
            return Err(AppError::InvalidInput(format!(
                "report tree is {} levels deep, at most {} are allowed",
                depth, MAX_REPORT_DEPTH
            )));
        }
        Ok(())
    }

    /// Stamp the owning scan on this report and every sub-report.
    pub fn set_scan(&mut self, scan_id: Uuid) {
        self.scan = Some(scan_id);
        if let ReportPayload::Multi { multi } = &mut self.payload {
            for child in multi {
                child.set_scan(scan_id);
            }
        }
    }

    /// Stamp the owning session on this report and every sub-report.
    pub fn set_scan_session(&mut self, session_id: Uuid) {
        self.scan_session = Some(session_id);
        if let ReportPayload::Multi { multi } = &mut self.payload {
            for child in multi {
                child.set_scan_session(session_id);
            }
        }
    }

    /// All issues reachable from this node, depth-first in child order.
    pub fn all_issues(&self) -> Vec<&Issue> {
        let mut out = Vec::new();
        self.collect_issues(&mut out);
        out
    }

    /// All technologies reachable from this node, depth-first in child order.
    pub fn all_techs(&self) -> Vec<&Tech> {
        let mut out = Vec::new();
        self.collect_techs(&mut out);
        out
    }

    fn collect_issues<'a>(&'a self, out: &mut Vec<&'a Issue>) {
        match &self.payload {
            ReportPayload::Multi { multi } => {
                for child in multi {
                    child.collect_issues(out);
                }
            }
            ReportPayload::Issues { issues } => out.extend(issues),
            _ => {}
        }
    }

    fn collect_techs<'a>(&'a self, out: &mut Vec<&'a Tech>) {
        match &self.payload {
            ReportPayload::Multi { multi } => {
                for child in multi {
                    child.collect_techs(out);
                }
            }
            ReportPayload::Techs { techs } => out.extend(techs),
            _ => {}
        }
    }
}
