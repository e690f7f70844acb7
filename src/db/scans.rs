//! Database queries for scans and their embedded sessions.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::scan::{self as scan, ActiveModel, Entity as ScanEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Scan, Session};

use super::DbPool;

impl DbPool {
    /// Insert a new scan owning `sessions`.
    pub async fn insert_scan(&self, sessions: Vec<Session>) -> AppResult<Scan> {
        let now = Utc::now();
        let id = Uuid::now_v7();

        let model = ActiveModel {
            id: Set(id),
            sessions: Set(encode_sessions(&sessions)?),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert scan: {}", e)))?;

        model_to_scan(result)
    }

    /// Get a scan by ID.
    pub async fn get_scan_by_id(&self, id: Uuid) -> AppResult<Option<Scan>> {
        let result = ScanEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get scan: {}", e)))?;

        result.map(model_to_scan).transpose()
    }

    /// Write back the session collection of `scan`.
    ///
    /// The write only applies if the stored version still equals
    /// `scan.version`. Returns the updated scan, or `None` if another writer
    /// got there first (or the scan no longer exists).
    pub async fn update_scan_sessions(&self, scan: &Scan) -> AppResult<Option<Scan>> {
        let now = Utc::now();
        let next_version = scan.version + 1;

        let result = ScanEntity::update_many()
            .col_expr(scan::Column::Sessions, Expr::value(encode_sessions(&scan.sessions)?))
            .col_expr(scan::Column::Version, Expr::value(next_version))
            .col_expr(scan::Column::UpdatedAt, Expr::value(now))
            .filter(scan::Column::Id.eq(scan.id))
            .filter(scan::Column::Version.eq(scan.version))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update scan sessions: {}", e)))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        Ok(Some(Scan {
            version: next_version,
            updated: now,
            ..scan.clone()
        }))
    }
}

fn encode_sessions(sessions: &[Session]) -> AppResult<serde_json::Value> {
    serde_json::to_value(sessions)
        .map_err(|e| AppError::Database(format!("Failed to encode sessions: {}", e)))
}

fn model_to_scan(model: scan::Model) -> AppResult<Scan> {
    let sessions: Vec<Session> = serde_json::from_value(model.sessions).map_err(|e| {
        AppError::Database(format!("Corrupt session document for scan {}: {}", model.id, e))
    })?;

    Ok(Scan {
        id: model.id,
        sessions,
        version: model.version,
        created: model.created_at,
        updated: model.updated_at,
    })
}
