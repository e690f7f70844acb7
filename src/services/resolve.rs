//! Resolution of a scan and one of its embedded sessions.
//!
//! Operations needing "scan + session" context are written as
//! `with_scan(pool, scan_id, |scan| with_session(scan, session_id, op))`;
//! each layer resolves one identifier and fails with `NotFound` before the
//! inner operation runs.

use std::future::Future;

use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Scan, format_id, parse_id};

/// Scan and session ids taken from a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPath {
    pub scan_id: Uuid,
    pub session_id: Uuid,
}

impl SessionPath {
    /// Parse both ids before touching the store.
    pub fn parse(scan_id: &str, session_id: &str) -> AppResult<Self> {
        Ok(Self {
            scan_id: parse_id(scan_id)?,
            session_id: parse_id(session_id)?,
        })
    }
}

/// Load the scan and hand it to `op`.
pub async fn with_scan<T, F, Fut>(pool: &DbPool, scan_id: Uuid, op: F) -> AppResult<T>
where
    F: FnOnce(Scan) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let scan = pool
        .get_scan_by_id(scan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Scan {}", format_id(scan_id))))?;

    op(scan).await
}

/// Locate the session in `scan` and hand both to `op`, the session as its
/// index in `scan.sessions`.
pub async fn with_session<T, F, Fut>(scan: Scan, session_id: Uuid, op: F) -> AppResult<T>
where
    F: FnOnce(Scan, usize) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let index = resolve_session(&scan, session_id)?;
    op(scan, index).await
}

/// Linear lookup of a session by id.
pub fn resolve_session(scan: &Scan, session_id: Uuid) -> AppResult<usize> {
    scan.session_index(session_id)
        .ok_or_else(|| AppError::NotFound(format!("Session {}", format_id(session_id))))
}
