use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::db::{Entity, Table};

/// One object found in an analysed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f64,
    pub bbox: [f64; 4], // x1, y1, x2, y2
}

/// Detection log record. Rows are written by the detector process; this
/// service only reads them.
#[derive(Debug, Clone, FromRow)]
pub struct DetectionLogRow {
    pub id: i64,
    pub file_name: String,
    pub message: String,
    pub result_image: String, // relative to the log directory
    pub detections: Json<Vec<Detection>>,
    pub created_at: OffsetDateTime,
}

impl Entity for DetectionLogRow {
    const TABLE: Table = Table {
        name: "detection_logs",
        create: r#"
            CREATE TABLE IF NOT EXISTS detection_logs (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                file_name    TEXT NOT NULL,
                message      TEXT NOT NULL,
                result_image TEXT NOT NULL,
                detections   TEXT NOT NULL DEFAULT '[]',
                created_at   TEXT NOT NULL
            )
        "#,
    };
}

impl DetectionLogRow {
    /// Newest first.
    pub async fn list_page(
        db: &SqlitePool,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DetectionLogRow>> {
        let rows = sqlx::query_as::<_, DetectionLogRow>(
            r#"
            SELECT id, file_name, message, result_image, detections, created_at
            FROM detection_logs
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count(db: &SqlitePool) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM detection_logs")
            .fetch_one(db)
            .await?;
        Ok(n)
    }

    #[cfg(test)]
    pub(crate) async fn insert(
        db: &SqlitePool,
        file_name: &str,
        detections: Vec<Detection>,
        created_at: OffsetDateTime,
    ) -> anyhow::Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO detection_logs (file_name, message, result_image, detections, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(file_name)
        .bind(format!("{} detection(s)", detections.len()))
        .bind(format!("result_{}", file_name))
        .bind(Json(detections))
        .bind(created_at)
        .fetch_one(db)
        .await?;
        Ok(id)
    }
}
