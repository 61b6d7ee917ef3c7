use serde::Serialize;
use time::OffsetDateTime;

use crate::models::user::UserRow;

/// User as returned by the API. The stored password hash is dropped by the
/// conversion and never leaves the service.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub count_login: i64,
    pub verified: bool,
    pub role: String,
    pub plan: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expired_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            count_login: r.count_login,
            verified: r.verified,
            role: r.role,
            plan: r.plan,
            created_at: r.created_at,
            expired_at: r.expired_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn password_never_serialized() {
        let user = User::from(UserRow {
            id: 7,
            email: "test@example.com".into(),
            password: "$argon2id$secret".into(),
            count_login: 3,
            verified: true,
            role: "admin".into(),
            plan: "pro".into(),
            created_at: datetime!(2024-05-01 12:00 UTC),
            expired_at: datetime!(2024-05-31 12:00 UTC),
        });

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["count_login"], 3);
        assert_eq!(json["created_at"], "2024-05-01T12:00:00Z");
    }
}
