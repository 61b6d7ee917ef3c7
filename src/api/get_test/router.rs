use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::{error, instrument};

use crate::{models::user::UserRow, state::AppState};

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub message: &'static str,
    pub users: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/get_test", get(get_test))
}

#[instrument(skip(state))]
pub async fn get_test(
    State(state): State<AppState>,
) -> Result<Json<TestResponse>, (StatusCode, String)> {
    let users = UserRow::count(&state.db).await.map_err(|e| {
        error!(error = %e, "count users failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(TestResponse {
        message: "ok",
        users,
    }))
}
