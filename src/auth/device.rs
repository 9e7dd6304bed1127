use rocket::Request;
use rocket::http::{Cookie, SameSite};
use rocket::request::{FromRequest, Outcome};

use crate::models::DeviceId;

pub const DEVICE_COOKIE: &str = "device_id";

// Plain, unsigned cookie; issued on first visit
pub fn device_from_request(request: &Request<'_>) -> DeviceId {
    let cookies = request.cookies();

    if let Some(cookie) = cookies.get(DEVICE_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return DeviceId(value.to_string());
        }
    }

    let device = DeviceId::generate();
    tracing::info!(device_id = %device, "Issuing new device identifier");
    cookies.add(
        Cookie::build((DEVICE_COOKIE, device.0.clone()))
            .same_site(SameSite::Lax)
            .path("/")
            .permanent(),
    );

    device
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for DeviceId {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(device_from_request(request))
    }
}
