//! Best-effort notification of scan changes to the scheduler and the feed.
//!
//! Updates are queued on an unbounded channel and delivered by a background
//! task, so a slow or failing collaborator never holds up or fails the
//! status write that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::models::{Scan, format_id};

/// Error reported by a notification collaborator.
pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

/// Drives scan execution forward from session state.
///
/// Calls are idempotent; the same scan may be reported more than once.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn update_scan(&self, scan: &Scan);
}

/// Activity stream of scan changes.
#[async_trait]
pub trait Feed: Send + Sync {
    async fn update_scan(&self, scan: &Scan) -> Result<(), NotifyError>;
}

enum Message {
    ScanUpdated(Box<Scan>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the notification task.
#[derive(Clone)]
pub struct ScanNotifier {
    sender: mpsc::UnboundedSender<Message>,
}

impl ScanNotifier {
    /// Start the delivery task on the current tokio runtime.
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(scheduler: Arc<dyn Scheduler>, feed: Arc<dyn Feed>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                match message {
                    Message::ScanUpdated(scan) => {
                        let scheduler = scheduler.clone();
                        let feed = feed.clone();
                        let scan_id = scan.id;

                        // A panicking collaborator must not take the queue down
                        let delivery =
                            tokio::spawn(async move { deliver(&*scheduler, &*feed, &scan).await });
                        if let Err(e) = delivery.await {
                            error!(
                                "Notification task for scan {} aborted: {}",
                                format_id(scan_id),
                                e
                            );
                        }
                    }
                    Message::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Scan notifier stopped");
        });

        Self { sender }
    }

    /// Queue a scan update. Never fails the caller.
    pub fn notify_scan_updated(&self, scan: Scan) {
        let scan_id = scan.id;
        if self.sender.send(Message::ScanUpdated(Box::new(scan))).is_err() {
            error!(
                "Scan notifier is not running, dropping update for scan {}",
                format_id(scan_id)
            );
        }
    }

    /// Wait until every update queued before this call has been delivered.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Message::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

async fn deliver(scheduler: &dyn Scheduler, feed: &dyn Feed, scan: &Scan) {
    scheduler.update_scan(scan).await;

    if let Err(e) = feed.update_scan(scan).await {
        error!("Feed update failed for scan {}: {}", format_id(scan.id), e);
    }
}
