//! Session lifecycle and session-scoped reports.

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::SessionSettings;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Report, Scan, Session, SessionStatus, format_id};

use super::notifier::ScanNotifier;
use super::resolve::{SessionPath, resolve_session, with_scan, with_session};

/// Entry point for everything a scanning worker does with its session.
#[derive(Clone)]
pub struct SessionService {
    pool: DbPool,
    notifier: ScanNotifier,
    settings: SessionSettings,
}

impl SessionService {
    pub fn new(pool: DbPool, notifier: ScanNotifier, settings: SessionSettings) -> Self {
        Self {
            pool,
            notifier,
            settings,
        }
    }

    /// Fetch one session of a scan.
    pub async fn get_session(&self, scan_id: &str, session_id: &str) -> AppResult<Session> {
        let path = SessionPath::parse(scan_id, session_id)?;

        with_scan(&self.pool, path.scan_id, |scan| {
            with_session(scan, path.session_id, |scan, index| async move {
                Ok(scan.sessions[index].clone())
            })
        })
        .await
    }

    /// Set the status of a session and notify the scheduler and the feed.
    ///
    /// Only `working`, `finished` and `failed` are accepted. The scan is
    /// written back with a version check; a concurrent change to the same
    /// scan makes this re-read and re-apply. Every lost round means some other
    /// writer committed, so with one writer per session the attempt budget is
    /// `update_retries` or one more than the session count, whichever is
    /// larger. Running out of attempts fails with `ConcurrentUpdate`.
    /// Once the write is committed the change is reported, and notification
    /// failures never reach the caller.
    pub async fn update_status(
        &self,
        scan_id: &str,
        session_id: &str,
        status: &str,
    ) -> AppResult<Session> {
        let requested = SessionStatus::parse_requested(status)?;
        let path = SessionPath::parse(scan_id, session_id)?;

        with_scan(&self.pool, path.scan_id, |scan| {
            with_session(scan, path.session_id, |scan, index| {
                self.apply_status(scan, index, requested)
            })
        })
        .await
    }

    async fn apply_status(
        &self,
        mut scan: Scan,
        mut index: usize,
        requested: SessionStatus,
    ) -> AppResult<Session> {
        let budget = (self.settings.update_retries as usize).max(scan.sessions.len() + 1);
        let mut attempt = 1;

        loop {
            let session = &mut scan.sessions[index];
            let previous = session.status;

            if self.settings.strict_transitions && !previous.can_transition_to(requested) {
                return Err(AppError::InvalidTransition {
                    from: previous.to_string(),
                    to: requested.to_string(),
                });
            }

            debug!(
                "Update session {} status from {} to {}",
                format_id(session.id),
                previous,
                requested
            );

            session.status = requested;
            session.updated = Utc::now();
            let session_id = session.id;

            match self.pool.update_scan_sessions(&scan).await? {
                Some(updated) => {
                    let session = updated.sessions[index].clone();
                    self.notifier.notify_scan_updated(updated);
                    return Ok(session);
                }
                None if attempt < budget => {
                    warn!(
                        "Scan {} changed while updating session {} (attempt {}), retrying",
                        format_id(scan.id),
                        format_id(session_id),
                        attempt
                    );
                    attempt += 1;

                    let scan_id = scan.id;
                    scan = self.pool.get_scan_by_id(scan_id).await?.ok_or_else(|| {
                        AppError::NotFound(format!("Scan {}", format_id(scan_id)))
                    })?;
                    index = resolve_session(&scan, session_id)?;
                }
                None => {
                    return Err(AppError::ConcurrentUpdate(format!(
                        "scan {} was modified concurrently, session {} not updated",
                        format_id(scan.id),
                        format_id(session_id)
                    )));
                }
            }
        }
    }

    /// Store the report produced by a session.
    ///
    /// Fails with `Conflict` if the session already has a report, and with
    /// `InvalidInput` if the tree is deeper than `MAX_REPORT_DEPTH`.
    pub async fn create_report(
        &self,
        scan_id: &str,
        session_id: &str,
        report: Report,
    ) -> AppResult<Report> {
        report.check_depth()?;
        let path = SessionPath::parse(scan_id, session_id)?;

        with_scan(&self.pool, path.scan_id, |scan| {
            with_session(scan, path.session_id, |scan, index| async move {
                self.pool
                    .create_report_for_session(&scan, &scan.sessions[index], report)
                    .await
            })
        })
        .await
    }

    /// Fetch the report of a session.
    pub async fn get_report(&self, scan_id: &str, session_id: &str) -> AppResult<Report> {
        let path = SessionPath::parse(scan_id, session_id)?;

        with_scan(&self.pool, path.scan_id, |scan| {
            with_session(scan, path.session_id, |scan, index| async move {
                let session_id = scan.sessions[index].id;
                self.pool
                    .get_report_by_session(session_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "Report for session {}",
                            format_id(session_id)
                        ))
                    })
            })
        })
        .await
    }
}
