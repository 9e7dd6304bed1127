#[cfg(test)]
pub mod test_utils {
    use crate::db::{create_admin, insert_bench_entry, upsert_booking, upsert_match_info};
    use crate::env::Settings;
    use crate::error::AppError;
    use crate::init_rocket;
    use crate::models::{BookingRow, DeviceId, MatchInfo, PaymentStatus, PositionKey, Team};
    use rocket::http::{ContentType, Cookie, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::sync::Once;

    static INIT: Once = Once::new();
    pub static ADMIN_EMAIL: &str = "admin@example.com";
    pub static ADMIN_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        admins: Vec<(String, String)>,
        bookings: Vec<BookingRow>,
        bench: Vec<(String, Option<String>)>,
        match_info: Option<MatchInfo>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn admin(mut self, email: &str, password: &str) -> Self {
            self.admins.push((email.to_string(), password.to_string()));
            self
        }

        pub fn booking(mut self, team: Team, key: PositionKey, name: &str, device: Option<&str>) -> Self {
            self.bookings.push(BookingRow {
                team,
                key,
                name: name.to_string(),
                rating: None,
                tags: Vec::new(),
                note: String::new(),
                payment: PaymentStatus::Unpaid,
                device: device.map(DeviceId::from),
            });
            self
        }

        pub fn bench(mut self, name: &str, device: Option<&str>) -> Self {
            self.bench.push((name.to_string(), device.map(String::from)));
            self
        }

        pub fn match_info(mut self, info: MatchInfo) -> Self {
            self.match_info = Some(info);
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::Builder::from_env(
                    env_logger::Env::default().default_filter_or("debug"),
                )
                .is_test(true)
                .try_init();
            });

            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect("sqlite::memory:")
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            for (email, password) in &self.admins {
                create_admin(&pool, email, password).await?;
            }

            for booking in &self.bookings {
                upsert_booking(&pool, booking).await?;
            }

            let mut bench_ids = Vec::new();
            for (name, device) in &self.bench {
                bench_ids.push(insert_bench_entry(&pool, name, device.as_deref()).await?);
            }

            if let Some(info) = &self.match_info {
                upsert_match_info(&pool, info).await?;
            }

            Ok(TestDb { pool, bench_ids })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub bench_ids: Vec<i64>,
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub fn test_settings() -> Settings {
        Settings {
            database_url: "sqlite::memory:".to_string(),
            admin: None,
            session_hours: 1,
            default_match: MatchInfo::default(),
        }
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone(), test_settings()).await;
        let client = Client::untracked(rocket)
            .await
            .expect("Failed to build rocket client");

        (client, test_db)
    }

    pub fn device(id: &str) -> Cookie<'static> {
        Cookie::new("device_id", id.to_string())
    }

    pub async fn login_admin(client: &Client) -> Vec<Cookie<'static>> {
        let response = client
            .post("/api/admin/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": ADMIN_EMAIL,
                    "password": ADMIN_PASSWORD
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        response.cookies().iter().cloned().collect()
    }
}
