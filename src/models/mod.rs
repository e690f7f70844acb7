//! Domain models for scans, sessions and reports.

pub mod id;
pub mod issue;
pub mod report;
pub mod scan;
pub mod tech;

// Re-export commonly used types
pub use id::{format_id, parse_id};
pub use issue::{Issue, IssueUrl, Reference, Severity};
pub use report::{FileMeta, MAX_REPORT_DEPTH, Report, ReportPayload, ReportType};
pub use scan::{Scan, Session, SessionStatus};
pub use tech::Tech;
