//! Database queries for reports.

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use crate::entity::report::{self as report, ActiveModel, Entity as ReportEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Report, ReportPayload, ReportType, Scan, Session, format_id};

use super::DbPool;

impl DbPool {
    /// Insert the report of `session`.
    ///
    /// Trees deeper than `MAX_REPORT_DEPTH` are rejected with `InvalidInput`,
    /// since they could not be decoded again. The scan and session ids are
    /// stamped on the whole report tree before the insert. A second report
    /// for the same session violates the unique index and comes back as
    /// `AppError::Conflict`.
    pub async fn create_report_for_session(
        &self,
        scan: &Scan,
        session: &Session,
        mut raw: Report,
    ) -> AppResult<Report> {
        raw.check_depth()?;
        raw.set_scan(scan.id);
        raw.set_scan_session(session.id);

        let now = Utc::now();
        let id = Uuid::now_v7();

        let payload = serde_json::to_value(&raw.payload)
            .map_err(|e| AppError::Database(format!("Failed to encode report payload: {}", e)))?;

        let model = ActiveModel {
            id: Set(id),
            scan_id: Set(scan.id),
            scan_session_id: Set(session.id),
            report_type: Set(raw.report_type().as_str().to_string()),
            payload: Set(payload),
            created_at: Set(now),
            updated_at: Set(now),
        };

        ReportEntity::insert(model)
            .exec(self.connection())
            .await
            .map_err(|e| {
                AppError::from_insert(
                    e,
                    format!(
                        "report with scan session {} already exists",
                        format_id(session.id)
                    ),
                )
            })?;

        info!(
            "Created {} report {} for session {}",
            raw.report_type(),
            format_id(id),
            format_id(session.id)
        );

        raw.id = Some(id);
        raw.created = Some(now);
        raw.updated = Some(now);
        Ok(raw)
    }

    /// Get a report by ID.
    pub async fn get_report_by_id(&self, id: Uuid) -> AppResult<Option<Report>> {
        let result = ReportEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get report: {}", e)))?;

        result.map(model_to_report).transpose()
    }

    /// Get the report of a session.
    pub async fn get_report_by_session(&self, session_id: Uuid) -> AppResult<Option<Report>> {
        let result = ReportEntity::find()
            .filter(report::Column::ScanSessionId.eq(session_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get report for session: {}", e)))?;

        result.map(model_to_report).transpose()
    }
}

fn model_to_report(model: report::Model) -> AppResult<Report> {
    let payload: ReportPayload = serde_json::from_value(model.payload).map_err(|e| {
        AppError::Database(format!("Corrupt payload for report {}: {}", model.id, e))
    })?;

    if ReportType::parse(&model.report_type) != Some(payload.report_type()) {
        return Err(AppError::Database(format!(
            "Report {} is stored as {} but its payload is {}",
            model.id,
            model.report_type,
            payload.report_type()
        )));
    }

    Ok(Report {
        id: Some(model.id),
        created: Some(model.created_at),
        updated: Some(model.updated_at),
        scan: Some(model.scan_id),
        scan_session: Some(model.scan_session_id),
        payload,
    })
}
