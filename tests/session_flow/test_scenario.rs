//! End-to-end: status change, then a composite report.

use scan_coordinator_lib::models::{Report, SessionStatus};

use super::test_helpers::*;

#[tokio::test]
async fn test_working_session_reports_multi_issues() {
    let h = Harness::new().await;
    let scan = h.create_scan(&["nmap"]).await;
    let (scan_id, session_id) = ids(&scan, 0);

    let session = h
        .service
        .update_status(&scan_id, &session_id, "working")
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Working);

    h.notifier.flush().await;
    assert_eq!(h.recorder.scheduler_calls(), 1);
    assert_eq!(h.recorder.feed_calls(), 1);

    let report = Report::multi(vec![
        Report::issues(issues("first", 2)),
        Report::issues(issues("second", 3)),
    ]);
    h.service
        .create_report(&scan_id, &session_id, report)
        .await
        .unwrap();

    let stored = h.service.get_report(&scan_id, &session_id).await.unwrap();
    let summaries: Vec<&str> = stored
        .all_issues()
        .iter()
        .map(|i| i.summary.as_str())
        .collect();
    assert_eq!(
        summaries,
        vec!["first-0", "first-1", "second-0", "second-1", "second-2"]
    );
}
