use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use super::dto::CreateUserRequest;
use crate::{
    api::share_schema::User,
    models::user::{is_unique_violation, NewUser, UserRow},
    password::hash_password,
    state::AppState,
};

const DEFAULT_ROLE: &str = "user";
const DEFAULT_PLAN: &str = "free";
const MIN_PASSWORD_LEN: usize = 8;
const TRIAL_DAYS: i64 = 30;

pub fn router() -> Router<AppState> {
    Router::new().route("/create_user", post(create_user))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    match UserRow::find_by_email(&state.db, &payload.email).await {
        Ok(Some(_)) => {
            warn!(email = %payload.email, "email already registered");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let created_at = OffsetDateTime::now_utc();
    let new = NewUser {
        email: &payload.email,
        password_hash: &hash,
        role: payload.role.as_deref().unwrap_or(DEFAULT_ROLE),
        plan: payload.plan.as_deref().unwrap_or(DEFAULT_PLAN),
        created_at,
        expired_at: created_at + Duration::days(TRIAL_DAYS),
    };
    // A concurrent request may have taken the email since the lookup above.
    let user = UserRow::create(&state.db, new).await.map_err(|e| {
        if is_unique_violation(&e) {
            warn!(email = %payload.email, "email already registered");
            return (StatusCode::CONFLICT, "Email already registered".to_string());
        }
        error!(error = %e, "create user failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok((StatusCode::CREATED, Json(User::from(user))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{password::verify_password, state::testing};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    async fn post_json(state: AppState, body: &str) -> (StatusCode, serde_json::Value) {
        let res = router()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create_user")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.io"));
        assert!(!is_valid_email("no-at-sign.io"));
        assert!(!is_valid_email("spaces in@b.io"));
    }

    #[tokio::test]
    async fn creates_user_with_defaults() {
        let state = testing::fake().await;
        let (status, json) = post_json(
            state.clone(),
            r#"{"email":"  New@Example.com ","password":"hunter2hunter2"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["email"], "new@example.com");
        assert_eq!(json["count_login"], 0);
        assert_eq!(json["verified"], false);
        assert_eq!(json["role"], DEFAULT_ROLE);
        assert_eq!(json["plan"], DEFAULT_PLAN);
        assert!(json.get("password").is_none());

        let row = UserRow::find_by_email(&state.db, "new@example.com")
            .await
            .unwrap()
            .expect("stored");
        assert!(verify_password("hunter2hunter2", &row.password).unwrap());
        assert_eq!(row.expired_at - row.created_at, Duration::days(TRIAL_DAYS));
    }

    #[tokio::test]
    async fn explicit_role_and_plan_are_kept() {
        let state = testing::fake().await;
        let (status, json) = post_json(
            state,
            r#"{"email":"pro@example.com","password":"hunter2hunter2","role":"admin","plan":"pro"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["role"], "admin");
        assert_eq!(json["plan"], "pro");
    }

    #[tokio::test]
    async fn rejects_bad_input_and_duplicates() {
        let state = testing::fake().await;

        let (status, _) = post_json(state.clone(), r#"{"email":"bad","password":"hunter2hunter2"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(state.clone(), r#"{"email":"a@b.io","password":"short"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = r#"{"email":"a@b.io","password":"hunter2hunter2"}"#;
        assert_eq!(post_json(state.clone(), body).await.0, StatusCode::CREATED);
        assert_eq!(post_json(state, body).await.0, StatusCode::CONFLICT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_get_conflict_not_server_error() {
        let tmp = tempfile::tempdir().unwrap();
        let state = testing::file_state(tmp.path()).await;

        for round in 0..5 {
            let body = format!(r#"{{"email":"race{round}@example.com","password":"hunter2hunter2"}}"#);
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let state = state.clone();
                    let body = body.clone();
                    tokio::spawn(async move { post_json(state, &body).await.0 })
                })
                .collect();

            let mut statuses = Vec::new();
            for h in handles {
                statuses.push(h.await.unwrap());
            }
            let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
            let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
            assert_eq!((created, conflicts), (1, 3), "round {round}: {statuses:?}");
        }
    }
}
