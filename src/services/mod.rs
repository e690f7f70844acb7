//! Business logic services.

pub mod notifier;
pub mod resolve;
pub mod session;

pub use notifier::{Feed, NotifyError, ScanNotifier, Scheduler};
pub use resolve::{SessionPath, resolve_session, with_scan, with_session};
pub use session::SessionService;
