use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::detection_log::{Detection, DetectionLogRow};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct DetectionLogItem {
    pub id: i64,
    pub file_name: String,
    pub message: String,
    pub result_image: String,
    pub detections: Vec<Detection>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<DetectionLogRow> for DetectionLogItem {
    fn from(r: DetectionLogRow) -> Self {
        Self {
            id: r.id,
            file_name: r.file_name,
            message: r.message,
            result_image: r.result_image,
            detections: r.detections.0,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetectionLogPage {
    pub items: Vec<DetectionLogItem>,
    pub total_count: i64,
}
