use crate::{
    auth::{Admin, AdminSession, DbAdmin, DbAdminSession},
    error::AppError,
    gateway::Gateway,
};
use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument, warn};

use crate::models::{
    BenchEntry, BookingRow, DbBenchEntry, DbBooking, DbMatchInfo, MatchInfo, PositionKey,
    PositionPatch, Team,
};

#[instrument(skip(pool))]
pub async fn get_all_bookings(pool: &Pool<Sqlite>) -> Result<Vec<BookingRow>, AppError> {
    info!("Fetching all bookings");
    let rows = sqlx::query_as::<_, DbBooking>(
        "SELECT team, position_key, name, rating, tags, note, payment_status, device_id
         FROM bookings
         ORDER BY updated_at, id",
    )
    .fetch_all(pool)
    .await?;

    // Rows that no longer map onto a known team or position are skipped
    let bookings = rows
        .into_iter()
        .filter_map(|row| match BookingRow::try_from(row) {
            Ok(booking) => Some(booking),
            Err(reason) => {
                warn!(reason = %reason, "Skipping unrecognised booking row");
                None
            }
        })
        .collect();

    Ok(bookings)
}

#[instrument(skip(pool, row), fields(team = %row.team, position = %row.key))]
pub async fn upsert_booking(pool: &Pool<Sqlite>, row: &BookingRow) -> Result<(), AppError> {
    info!("Upserting booking");
    let tags = serde_json::to_string(&row.tags)?;
    let device_id = row.device.as_ref().map(|d| d.as_str());

    sqlx::query(
        "INSERT INTO bookings
         (team, position_key, name, rating, tags, note, payment_status, device_id, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (team, position_key) DO UPDATE SET
            name = excluded.name,
            rating = excluded.rating,
            tags = excluded.tags,
            note = excluded.note,
            payment_status = excluded.payment_status,
            device_id = excluded.device_id,
            updated_at = excluded.updated_at",
    )
    .bind(row.team.as_str())
    .bind(row.key.as_str())
    .bind(&row.name)
    .bind(row.rating.map(i64::from))
    .bind(tags)
    .bind(&row.note)
    .bind(row.payment.as_str())
    .bind(device_id)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn update_booking(
    pool: &Pool<Sqlite>,
    team: Team,
    key: PositionKey,
    patch: &PositionPatch,
) -> Result<(), AppError> {
    info!("Updating booking fields");
    if patch.is_empty() {
        return Ok(());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE bookings SET updated_at = ");
    query.push_bind(Utc::now().naive_utc());

    if let Some(name) = &patch.name {
        query.push(", name = ").push_bind(name.clone());
    }
    if let Some(rating) = patch.rating {
        query.push(", rating = ").push_bind(rating.map(i64::from));
    }
    if let Some(tags) = &patch.tags {
        query.push(", tags = ").push_bind(serde_json::to_string(tags)?);
    }
    if let Some(note) = &patch.note {
        query.push(", note = ").push_bind(note.clone());
    }
    if let Some(payment) = patch.payment {
        query.push(", payment_status = ").push_bind(payment.as_str());
    }

    query
        .push(" WHERE team = ")
        .push_bind(team.as_str())
        .push(" AND position_key = ")
        .push_bind(key.as_str());

    let result = query.build().execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "No booking stored for {} {}",
            team, key
        )));
    }

    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_booking(pool: &Pool<Sqlite>, team: Team, key: PositionKey) -> Result<(), AppError> {
    info!("Deleting booking");
    sqlx::query("DELETE FROM bookings WHERE team = ? AND position_key = ?")
        .bind(team.as_str())
        .bind(key.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clear_bookings(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Clearing all bookings");
    let result = sqlx::query("DELETE FROM bookings").execute(pool).await?;

    Ok(result.rows_affected())
}

#[instrument(skip(pool))]
pub async fn get_bench(pool: &Pool<Sqlite>) -> Result<Vec<BenchEntry>, AppError> {
    info!("Fetching bench queue");
    let rows = sqlx::query_as::<_, DbBenchEntry>(
        "SELECT id, name, device_id, created_at FROM bench ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(BenchEntry::from).collect())
}

#[instrument(skip(pool, device_id))]
pub async fn insert_bench_entry(
    pool: &Pool<Sqlite>,
    name: &str,
    device_id: Option<&str>,
) -> Result<i64, AppError> {
    info!("Adding bench entry");
    let res = sqlx::query("INSERT INTO bench (name, device_id, created_at) VALUES (?, ?, ?)")
        .bind(name)
        .bind(device_id)
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn delete_bench_entry(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting bench entry");
    sqlx::query("DELETE FROM bench WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clear_bench(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Clearing bench queue");
    let result = sqlx::query("DELETE FROM bench").execute(pool).await?;

    Ok(result.rows_affected())
}

#[instrument(skip(pool))]
pub async fn get_match_info(pool: &Pool<Sqlite>) -> Result<Option<MatchInfo>, AppError> {
    info!("Fetching match info");
    let row = sqlx::query_as::<_, DbMatchInfo>("SELECT name, venue, kickoff FROM match_info WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    Ok(row.map(MatchInfo::from))
}

#[instrument(skip(pool))]
pub async fn upsert_match_info(pool: &Pool<Sqlite>, info: &MatchInfo) -> Result<(), AppError> {
    info!("Saving match info");
    sqlx::query(
        "INSERT INTO match_info (id, name, venue, kickoff) VALUES (1, ?, ?, ?)
         ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            venue = excluded.venue,
            kickoff = excluded.kickoff",
    )
    .bind(&info.name)
    .bind(&info.venue)
    .bind(&info.kickoff)
    .execute(pool)
    .await?;

    Ok(())
}

#[rocket::async_trait]
impl Gateway for Pool<Sqlite> {
    async fn fetch_bookings(&self) -> Result<Vec<BookingRow>, AppError> {
        get_all_bookings(self).await
    }

    async fn fetch_bench(&self) -> Result<Vec<BenchEntry>, AppError> {
        get_bench(self).await
    }

    async fn fetch_match_info(&self) -> Result<Option<MatchInfo>, AppError> {
        get_match_info(self).await
    }

    async fn upsert_booking(&self, row: &BookingRow) -> Result<(), AppError> {
        upsert_booking(self, row).await
    }

    async fn update_booking(
        &self,
        team: Team,
        key: PositionKey,
        patch: &PositionPatch,
    ) -> Result<(), AppError> {
        update_booking(self, team, key, patch).await
    }

    async fn delete_booking(&self, team: Team, key: PositionKey) -> Result<(), AppError> {
        delete_booking(self, team, key).await
    }

    async fn insert_bench(&self, name: &str, device_id: Option<&str>) -> Result<i64, AppError> {
        insert_bench_entry(self, name, device_id).await
    }

    async fn delete_bench(&self, id: i64) -> Result<(), AppError> {
        delete_bench_entry(self, id).await
    }

    async fn clear_bookings(&self) -> Result<u64, AppError> {
        clear_bookings(self).await
    }

    async fn clear_bench(&self) -> Result<u64, AppError> {
        clear_bench(self).await
    }

    async fn upsert_match_info(&self, info: &MatchInfo) -> Result<(), AppError> {
        upsert_match_info(self, info).await
    }
}

#[instrument(skip(pool))]
pub async fn get_admin(pool: &Pool<Sqlite>, id: i64) -> Result<Admin, AppError> {
    info!("Fetching admin by ID");
    let row = sqlx::query_as::<_, DbAdmin>("SELECT id, email FROM admins WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(admin) => Ok(Admin::from(admin)),
        _ => Err(AppError::NotFound(format!(
            "Admin with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip_all, fields(email))]
pub async fn authenticate_admin(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<Admin>, AppError> {
    info!("Authenticating admin");
    let row = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, email, password FROM admins WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match row {
        Some((id, email, hash)) => match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(Some(Admin { id, email })),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

#[instrument(skip_all, fields(email))]
pub async fn create_admin(pool: &Pool<Sqlite>, email: &str, password: &str) -> Result<i64, AppError> {
    info!("Creating admin");

    let existing = sqlx::query_as::<_, (i64,)>("SELECT id FROM admins WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Validation(format!(
            "Admin '{}' already exists",
            email
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query("INSERT INTO admins (email, password) VALUES (?, ?)")
        .bind(email)
        .bind(hashed_password)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

// An existing account is left untouched
#[instrument(skip_all, fields(email))]
pub async fn ensure_admin(pool: &Pool<Sqlite>, email: &str, password: &str) -> Result<bool, AppError> {
    match create_admin(pool, email, password).await {
        Ok(_) => {
            info!("Seeded admin account");
            Ok(true)
        }
        Err(AppError::Validation(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

#[instrument(skip(pool, token))]
pub async fn create_admin_session(
    pool: &Pool<Sqlite>,
    admin_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating admin session");

    let res = sqlx::query("INSERT INTO admin_sessions (admin_id, token, expires_at) VALUES (?, ?, ?)")
        .bind(admin_id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(pool: &Pool<Sqlite>, token: &str) -> Result<AdminSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbAdminSession>(
        "SELECT id, admin_id, token, created_at, expires_at FROM admin_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(AdminSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM admin_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
