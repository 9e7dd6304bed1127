use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

const TOKEN_LENGTH: usize = 48;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: i64,
    pub email: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAdmin {
    pub id: Option<i64>,
    pub email: Option<String>,
}

impl From<DbAdmin> for Admin {
    fn from(admin: DbAdmin) -> Self {
        Self {
            id: admin.id.unwrap_or_default(),
            email: admin.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminSession {
    pub id: i64,
    pub admin_id: i64,
    pub token: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAdminSession {
    pub id: Option<i64>,
    pub admin_id: Option<i64>,
    pub token: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
}

impl From<DbAdminSession> for AdminSession {
    fn from(session: DbAdminSession) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: session.id.unwrap_or_default(),
            admin_id: session.admin_id.unwrap_or_default(),
            token: session.token.unwrap_or_default(),
            created_at: session.created_at.unwrap_or(now),
            // A row without an expiry is treated as already expired
            expires_at: session.expires_at.unwrap_or(now),
        }
    }
}

impl AdminSession {
    pub fn generate_token() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    pub fn expiry_from_now(hours: i64) -> NaiveDateTime {
        (Utc::now() + Duration::hours(hours)).naive_utc()
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now().naive_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_and_alphanumeric() {
        let a = AdminSession::generate_token();
        let b = AdminSession::generate_token();

        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn missing_expiry_is_invalid() {
        let session = AdminSession::from(DbAdminSession {
            id: Some(1),
            admin_id: Some(1),
            token: Some("t".into()),
            created_at: None,
            expires_at: None,
        });

        assert!(!session.is_valid());
    }
}
