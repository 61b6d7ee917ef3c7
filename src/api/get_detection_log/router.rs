use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::dto::{DetectionLogItem, DetectionLogPage, PageQuery};
use crate::{models::detection_log::DetectionLogRow, state::AppState};

const MAX_PAGE_SIZE: i64 = 100;

pub fn router() -> Router<AppState> {
    Router::new().route("/get_detection_log", get(get_detection_log))
}

#[instrument(skip(state))]
pub async fn get_detection_log(
    State(state): State<AppState>,
    Query(p): Query<PageQuery>,
) -> Result<Json<DetectionLogPage>, (StatusCode, String)> {
    if p.page < 1 || !(1..=MAX_PAGE_SIZE).contains(&p.page_size) {
        warn!(page = p.page, page_size = p.page_size, "invalid pagination");
        return Err((
            StatusCode::BAD_REQUEST,
            format!("page must be >= 1 and page_size in 1..={MAX_PAGE_SIZE}"),
        ));
    }

    let Some(offset) = (p.page - 1).checked_mul(p.page_size) else {
        warn!(page = p.page, page_size = p.page_size, "page offset out of range");
        return Err((StatusCode::BAD_REQUEST, "page is out of range".into()));
    };
    let rows = DetectionLogRow::list_page(&state.db, p.page_size, offset)
        .await
        .map_err(internal)?;
    let total_count = DetectionLogRow::count(&state.db).await.map_err(internal)?;

    Ok(Json(DetectionLogPage {
        items: rows.into_iter().map(DetectionLogItem::from).collect(),
        total_count,
    }))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "detection log query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
