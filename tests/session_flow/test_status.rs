//! Session status transitions.

use futures_util::future::join_all;
use scan_coordinator_lib::config::SessionSettings;
use scan_coordinator_lib::error::AppError;
use scan_coordinator_lib::models::{SessionStatus, format_id};
use uuid::Uuid;

use super::test_helpers::*;

#[tokio::test]
async fn test_update_status_persists_and_notifies_once() {
    let h = Harness::new().await;
    let scan = h.create_scan(&["nmap"]).await;
    let (scan_id, session_id) = ids(&scan, 0);

    let session = h
        .service
        .update_status(&scan_id, &session_id, "working")
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Working);

    let stored = h.reload(&scan).await;
    assert_eq!(stored.sessions[0].status, SessionStatus::Working);
    assert_eq!(stored.version, scan.version + 1);

    h.notifier.flush().await;
    assert_eq!(h.recorder.scheduler_calls(), 1);
    assert_eq!(h.recorder.feed_calls(), 1);
    assert_eq!(
        h.recorder.scheduler.lock().unwrap()[0].sessions[0].status,
        SessionStatus::Working
    );
}

#[tokio::test]
async fn test_invalid_status_leaves_session_untouched() {
    let h = Harness::new().await;
    let scan = h.create_scan(&["nmap"]).await;
    let (scan_id, session_id) = ids(&scan, 0);

    for status in ["done", "", "Working", "queued", "paused"] {
        let err = h
            .service
            .update_status(&scan_id, &session_id, status)
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidInput(_)),
            "{:?} gave {:?}",
            status,
            err
        );
    }

    let stored = h.reload(&scan).await;
    assert_eq!(stored.sessions[0].status, SessionStatus::Created);
    assert_eq!(stored.version, scan.version);

    h.notifier.flush().await;
    assert_eq!(h.recorder.scheduler_calls(), 0);
    assert_eq!(h.recorder.feed_calls(), 0);
}

#[tokio::test]
async fn test_unchecked_mode_accepts_any_settable_status() {
    let h = Harness::new().await;
    let scan = h.create_scan(&["nmap"]).await;
    let (scan_id, session_id) = ids(&scan, 0);

    for status in ["finished", "working", "failed", "working"] {
        h.service
            .update_status(&scan_id, &session_id, status)
            .await
            .unwrap();
    }

    let stored = h.reload(&scan).await;
    assert_eq!(stored.sessions[0].status, SessionStatus::Working);

    h.notifier.flush().await;
    assert_eq!(h.recorder.scheduler_calls(), 4);
}

#[tokio::test]
async fn test_strict_mode_keeps_terminal_states() {
    let h = Harness::strict().await;
    let scan = h.create_scan(&["nmap"]).await;
    let (scan_id, session_id) = ids(&scan, 0);

    h.service
        .update_status(&scan_id, &session_id, "working")
        .await
        .unwrap();
    h.service
        .update_status(&scan_id, &session_id, "finished")
        .await
        .unwrap();

    let err = h
        .service
        .update_status(&scan_id, &session_id, "working")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
    assert!(!err.is_validation());

    let stored = h.reload(&scan).await;
    assert_eq!(stored.sessions[0].status, SessionStatus::Finished);

    h.notifier.flush().await;
    assert_eq!(h.recorder.scheduler_calls(), 2);
}

#[tokio::test]
async fn test_feed_failure_does_not_fail_update() {
    let h = Harness::with_failing_feed().await;
    let scan = h.create_scan(&["nmap"]).await;
    let (scan_id, session_id) = ids(&scan, 0);

    let session = h
        .service
        .update_status(&scan_id, &session_id, "failed")
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Failed);

    h.notifier.flush().await;
    assert_eq!(h.recorder.scheduler_calls(), 1);
    assert_eq!(h.recorder.feed_calls(), 1);

    let stored = h.reload(&scan).await;
    assert_eq!(stored.sessions[0].status, SessionStatus::Failed);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let h = Harness::new().await;
    let scan = h.create_scan(&["nmap"]).await;
    let (scan_id, session_id) = ids(&scan, 0);
    let absent = format_id(Uuid::now_v7());

    let err = h
        .service
        .update_status(&absent, &session_id, "working")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = h
        .service
        .update_status(&scan_id, &absent, "working")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = h
        .service
        .update_status(&scan_id, "not-a-hex-id", "working")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = h
        .service
        .get_session(&scan.id.to_string(), &session_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_get_session() {
    let h = Harness::new().await;
    let scan = h.create_scan(&["nmap", "wappalyzer"]).await;
    let (scan_id, session_id) = ids(&scan, 1);

    let session = h.service.get_session(&scan_id, &session_id).await.unwrap();

    assert_eq!(session.id, scan.sessions[1].id);
    assert_eq!(session.plugin, "wappalyzer");
    assert_eq!(session.status, SessionStatus::Created);
}

#[tokio::test]
async fn test_concurrent_sibling_updates_are_not_lost() {
    let h = Harness::new().await;
    let scan = h.create_scan(&["nmap", "wappalyzer"]).await;
    let (scan_id, first) = ids(&scan, 0);
    let (_, second) = ids(&scan, 1);

    let (a, b) = tokio::join!(
        h.service.update_status(&scan_id, &first, "working"),
        h.service.update_status(&scan_id, &second, "finished"),
    );
    a.unwrap();
    b.unwrap();

    let stored = h.reload(&scan).await;
    assert_eq!(stored.sessions[0].status, SessionStatus::Working);
    assert_eq!(stored.sessions[1].status, SessionStatus::Finished);
    assert_eq!(stored.version, scan.version + 2);
}

#[tokio::test]
async fn test_stale_version_is_not_written() {
    let h = Harness::new().await;
    let scan = h.create_scan(&["nmap"]).await;

    let mut first = scan.clone();
    first.sessions[0].status = SessionStatus::Working;
    assert!(h.pool.update_scan_sessions(&first).await.unwrap().is_some());

    let mut stale = scan.clone();
    stale.sessions[0].status = SessionStatus::Failed;
    assert!(h.pool.update_scan_sessions(&stale).await.unwrap().is_none());

    let stored = h.reload(&scan).await;
    assert_eq!(stored.sessions[0].status, SessionStatus::Working);
}

#[tokio::test]
async fn test_every_sibling_update_lands_under_contention() {
    let h = Harness::new().await;
    let plugins = ["nmap", "wappalyzer", "nikto", "sslscan", "whatweb", "dirb"];
    let scan = h.create_scan(&plugins).await;
    let scan_id = format_id(scan.id);
    let session_ids: Vec<String> = scan.sessions.iter().map(|s| format_id(s.id)).collect();

    let updates = session_ids
        .iter()
        .map(|session_id| h.service.update_status(&scan_id, session_id, "working"));
    let results = join_all(updates).await;

    for result in &results {
        assert!(result.is_ok(), "got {:?}", result);
    }

    let stored = h.reload(&scan).await;
    assert!(
        stored
            .sessions
            .iter()
            .all(|s| s.status == SessionStatus::Working)
    );
    assert_eq!(stored.version, scan.version + plugins.len() as i64);

    h.notifier.flush().await;
    assert_eq!(h.recorder.scheduler_calls(), plugins.len());
}

#[tokio::test]
async fn test_exhausted_attempts_fail_with_concurrent_update() {
    let h = Harness::with_settings(SessionSettings {
        update_retries: 1,
        ..SessionSettings::default()
    })
    .await;
    let scan = h.create_scan(&["nmap"]).await;
    let (scan_id, session_id) = ids(&scan, 0);

    // Eight writers on one session against a budget of two attempts
    let updates = (0..8).map(|_| h.service.update_status(&scan_id, &session_id, "working"));
    let results = join_all(updates).await;

    let applied = results.iter().filter(|r| r.is_ok()).count();
    let contended = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::ConcurrentUpdate(_))))
        .count();
    assert!(applied >= 1);
    assert!(contended >= 1);
    assert_eq!(applied + contended, results.len());

    let err = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(err.code(), "CONCURRENT_UPDATE");
    assert!(!err.is_validation());

    let stored = h.reload(&scan).await;
    assert_eq!(stored.sessions[0].status, SessionStatus::Working);
    assert_eq!(stored.version, scan.version + applied as i64);

    h.notifier.flush().await;
    assert_eq!(h.recorder.scheduler_calls(), applied);
}
