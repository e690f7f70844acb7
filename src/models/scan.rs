//! Scan aggregate and its embedded sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::hex_id;
use crate::error::{AppError, AppResult};

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session created, not yet handed to a worker.
    Created,
    /// Waiting in the scheduler queue.
    Queued,
    /// A worker is executing the module.
    Working,
    /// Execution suspended by the scheduler.
    Paused,
    /// Module completed.
    Finished,
    /// Module failed.
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Queued => "queued",
            Self::Working => "working",
            Self::Paused => "paused",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "queued" => Some(Self::Queued),
            "working" => Some(Self::Working),
            "paused" => Some(Self::Paused),
            "finished" => Some(Self::Finished),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Parse a status requested by a worker. Only `working`, `finished` and
    /// `failed` may be set from outside; matching is exact and case-sensitive.
    pub fn parse_requested(s: &str) -> AppResult<Self> {
        match Self::parse(s) {
            Some(status @ (Self::Working | Self::Finished | Self::Failed)) => Ok(status),
            _ => Err(AppError::InvalidInput(
                "status should be one of [working|finished|failed]".to_string(),
            )),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    /// Forward-only transition rule used in strict mode.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Working | Self::Finished | Self::Failed => true,
            Self::Created | Self::Queued | Self::Paused => false,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of work within a scan, e.g. one module run against the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(with = "hex_id")]
    pub id: Uuid,
    pub status: SessionStatus,
    /// Scanning module executed by this session.
    #[serde(default)]
    pub plugin: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Session {
    pub fn new(plugin: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            status: SessionStatus::Created,
            plugin: plugin.into(),
            created: now,
            updated: now,
        }
    }
}

/// A scan run owning its sessions.
///
/// The scan is the unit of persistence: session changes are written back as
/// part of the whole aggregate, guarded by `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    #[serde(with = "hex_id")]
    pub id: Uuid,
    pub sessions: Vec<Session>,
    /// Incremented on every persisted change.
    pub version: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Scan {
    /// Index of the session with the given id.
    ///
    /// Sessions are not indexed separately; a scan carries at most a few
    /// dozen of them.
    pub fn session_index(&self, session_id: Uuid) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == session_id)
    }
}
