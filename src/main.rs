#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod db;
mod engine;
mod env;
mod error;
mod gateway;
mod lineup;
mod models;
mod store;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use std::sync::Arc;

use api::{
    api_admin_me, api_admin_me_unauthorized, api_cancel, api_claim, api_get_lineup,
    api_get_match, api_join_bench, api_leave_bench, api_login, api_logout, api_reload, api_reset,
    api_share, api_update_match, api_update_position, health,
};
use auth::unauthorized_api;
use db::{clean_expired_sessions, ensure_admin};
use env::Settings;
use error::AppError;
use rocket::{Build, Rocket};
use store::Matchday;
use telemetry::{TelemetryFairing, init_tracing};
use validation::{bad_request_api, unprocessable_api};
use thiserror::Error;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

async fn prepare_database(settings: &Settings) -> Result<SqlitePool, Error> {
    let options: SqliteConnectOptions = settings.database_url.parse()?;
    let pool = SqlitePool::connect_with(options.create_if_missing(true)).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(AppError::from)?;
    info!("Migrations completed successfully");

    if let Some(admin) = &settings.admin {
        ensure_admin(&pool, &admin.email, &admin.password).await?;
    }

    Ok(pool)
}

#[launch]
async fn rocket() -> _ {
    if let Err(e) = env::load_environment() {
        eprintln!("Failed to load environment files: {:#}", e);
    }
    init_tracing();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            panic!("Invalid configuration: {:#}", e);
        }
    };

    let pool = match prepare_database(&settings).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to prepare database: {}", e);
            panic!("Database setup failed: {}", e);
        }
    };

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    init_rocket(pool, settings).await
}

pub async fn init_rocket(pool: SqlitePool, settings: Settings) -> Rocket<Build> {
    info!("Starting matchday booking");

    let matchday = Matchday::load(Arc::new(pool.clone()), settings.default_match.clone()).await;

    rocket::build()
        .manage(pool)
        .manage(matchday)
        .manage(settings)
        .mount(
            "/api",
            routes![
                api_get_lineup,
                api_share,
                api_reload,
                api_claim,
                api_cancel,
                api_update_position,
                api_join_bench,
                api_leave_bench,
                api_get_match,
                api_update_match,
                api_reset,
                api_login,
                api_logout,
                api_admin_me,
                api_admin_me_unauthorized,
            ],
        )
        .register(
            "/api",
            catchers![unauthorized_api, unprocessable_api, bad_request_api],
        )
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
}
