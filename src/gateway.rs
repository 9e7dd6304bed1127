use crate::error::AppError;
use crate::models::{BenchEntry, BookingRow, MatchInfo, PositionKey, PositionPatch, Team};

#[rocket::async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch_bookings(&self) -> Result<Vec<BookingRow>, AppError>;

    async fn fetch_bench(&self) -> Result<Vec<BenchEntry>, AppError>;

    async fn fetch_match_info(&self) -> Result<Option<MatchInfo>, AppError>;

    // Last write wins
    async fn upsert_booking(&self, row: &BookingRow) -> Result<(), AppError>;

    async fn update_booking(
        &self,
        team: Team,
        key: PositionKey,
        patch: &PositionPatch,
    ) -> Result<(), AppError>;

    async fn delete_booking(&self, team: Team, key: PositionKey) -> Result<(), AppError>;

    async fn insert_bench(&self, name: &str, device_id: Option<&str>) -> Result<i64, AppError>;

    async fn delete_bench(&self, id: i64) -> Result<(), AppError>;

    async fn clear_bookings(&self) -> Result<u64, AppError>;

    async fn clear_bench(&self) -> Result<u64, AppError>;

    async fn upsert_match_info(&self, info: &MatchInfo) -> Result<(), AppError>;
}
