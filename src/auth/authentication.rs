use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::Instrument;

use crate::db::{get_admin, get_session_by_token};
use crate::engine::Actor;

use super::{Admin, device_from_request};

pub const SESSION_COOKIE: &str = "session_token";

async fn admin_from_request(request: &Request<'_>) -> Result<Option<Admin>, Status> {
    let token = request
        .cookies()
        .get_private(SESSION_COOKIE)
        .map(|c| c.value().to_string());

    let Some(token) = token else {
        return Ok(None);
    };

    let db = match request.rocket().state::<SqlitePool>() {
        Some(pool) => pool,
        _ => {
            tracing::error!("Database pool not found in managed state");
            return Err(Status::InternalServerError);
        }
    };

    let session = match get_session_by_token(db, &token).await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(error = ?err, "Invalid session token");
            return Ok(None);
        }
    };

    if !session.is_valid() {
        tracing::warn!(admin_id = %session.admin_id, "Session token expired");
        return Ok(None);
    }

    match get_admin(db, session.admin_id).await {
        Ok(admin) => {
            tracing::info!(email = %admin.email, "Admin authenticated via session token");
            Ok(Some(admin))
        }
        Err(err) => {
            tracing::error!(admin_id = %session.admin_id, error = ?err, "Failed to fetch admin for valid session");
            Err(Status::InternalServerError)
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Admin {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let outcome = admin_from_request(request)
            .instrument(tracing::info_span!("admin_auth_guard"))
            .await;

        match outcome {
            Ok(Some(admin)) => Outcome::Success(admin),
            Ok(None) => Outcome::Forward(Status::Unauthorized),
            Err(status) => Outcome::Error((status, ())),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Actor {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let device = device_from_request(request);

        match admin_from_request(request).await {
            Ok(admin) => Outcome::Success(Actor {
                device,
                privileged: admin.is_some(),
            }),
            Err(status) => Outcome::Error((status, ())),
        }
    }
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "error": "Unauthorized",
        "message": "Administrator sign-in required"
    });

    Custom(Status::Unauthorized, Json(error_json))
}
