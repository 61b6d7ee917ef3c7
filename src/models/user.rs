use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::db::{Entity, Table};

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String, // argon2 PHC string
    pub count_login: i64,
    pub verified: bool,
    pub role: String,
    pub plan: String,
    pub created_at: OffsetDateTime,
    pub expired_at: OffsetDateTime,
}

impl Entity for UserRow {
    const TABLE: Table = Table {
        name: "users",
        create: r#"
            CREATE TABLE IF NOT EXISTS users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                email       TEXT    NOT NULL UNIQUE,
                password    TEXT    NOT NULL,
                count_login INTEGER NOT NULL DEFAULT 0 CHECK (count_login >= 0),
                verified    BOOLEAN NOT NULL DEFAULT 0,
                role        TEXT    NOT NULL,
                plan        TEXT    NOT NULL,
                created_at  TEXT    NOT NULL,
                expired_at  TEXT    NOT NULL
            )
        "#,
    };
}

/// Values for a user that is about to be inserted.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub plan: &'a str,
    pub created_at: OffsetDateTime,
    pub expired_at: OffsetDateTime,
}

impl UserRow {
    /// Find a user by email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> anyhow::Result<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password, count_login, verified, role, plan, created_at, expired_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(db: &SqlitePool, new: NewUser<'_>) -> anyhow::Result<UserRow> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password, count_login, verified, role, plan, created_at, expired_at)
            VALUES (?, ?, 0, 0, ?, ?, ?, ?)
            RETURNING id, email, password, count_login, verified, role, plan, created_at, expired_at
            "#,
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role)
        .bind(new.plan)
        .bind(new.created_at)
        .bind(new.expired_at)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn count(db: &SqlitePool) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(n)
    }
}

/// True when `e` comes from the `UNIQUE` constraint on `users.email`.
pub fn is_unique_violation(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}
