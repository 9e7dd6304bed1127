use rocket::State;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Admin, AdminSession, SESSION_COOKIE};
use crate::db::{authenticate_admin, create_admin_session, invalidate_session};
use crate::engine::Actor;
use crate::env::Settings;
use crate::lineup::Lineup;
use crate::models::{
    DeviceId, Line, MatchInfo, PaymentStatus, PositionKey, PositionPatch, Team,
};
use crate::store::{Applied, Matchday, Snapshot};
use crate::validation::{
    ApiError, AppErrorExt, JsonValidateExt, ToValidationResponse, ValidationResponse,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PositionView {
    pub key: PositionKey,
    pub label: String,
    pub line: Line,
    pub booked: bool,
    pub name: Option<String>,
    pub rating: Option<u8>,
    pub tags: Vec<String>,
    pub note: String,
    pub payment: PaymentStatus,
    pub mine: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeamView {
    pub team: Team,
    pub booked: usize,
    pub remaining: usize,
    pub positions: Vec<PositionView>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BenchView {
    pub id: i64,
    pub name: String,
    pub mine: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BookingRef {
    pub team: Team,
    pub key: PositionKey,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MeView {
    pub device_id: DeviceId,
    pub booking: Option<BookingRef>,
    pub bench_entry: Option<i64>,
    pub privileged: bool,
    pub can_book: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LineupView {
    pub match_info: MatchInfo,
    pub teams: Vec<TeamView>,
    pub bench: Vec<BenchView>,
    pub total_booked: usize,
    pub sync_warning: Option<String>,
    pub me: Option<MeView>,
}

impl LineupView {
    // `actor: None` renders the share view
    pub fn render(snapshot: &Snapshot, actor: Option<&Actor>) -> Self {
        let lineup = &snapshot.lineup;
        let device = actor.map(|a| &a.device);

        let teams = lineup
            .teams()
            .into_iter()
            .map(|sheet| TeamView {
                team: sheet.team,
                booked: sheet.booked(),
                remaining: sheet.remaining(),
                positions: sheet
                    .positions
                    .iter()
                    .map(|p| PositionView {
                        key: p.key,
                        label: p.label.to_string(),
                        line: p.line,
                        booked: p.booked,
                        name: p.name.clone(),
                        rating: p.rating,
                        tags: p.tags.clone(),
                        note: p.note.clone(),
                        payment: p.payment,
                        mine: device.is_some_and(|d| p.booked && p.is_owned_by(d)),
                    })
                    .collect(),
            })
            .collect();

        let bench = lineup
            .bench()
            .iter()
            .map(|entry| BenchView {
                id: entry.id,
                name: entry.name.clone(),
                mine: device.is_some_and(|d| entry.device.as_ref() == Some(d)),
            })
            .collect();

        Self {
            match_info: snapshot.match_info.clone(),
            teams,
            bench,
            total_booked: lineup.total_booked(),
            sync_warning: snapshot.sync_warning.clone(),
            me: actor.map(|actor| me_view(lineup, actor)),
        }
    }
}

fn me_view(lineup: &Lineup, actor: &Actor) -> MeView {
    let booking = lineup
        .booking_of(&actor.device)
        .map(|(team, key)| BookingRef { team, key });
    let bench_entry = lineup.bench_entry_of(&actor.device).map(|e| e.id);

    MeView {
        device_id: actor.device.clone(),
        can_book: !lineup.has_booking_or_bench(&actor.device),
        booking,
        bench_entry,
        privileged: actor.privileged,
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MutationResponse {
    pub persisted: bool,
    pub warning: Option<String>,
    pub bench_id: Option<i64>,
    pub lineup: LineupView,
}

impl MutationResponse {
    fn from_applied<T>(applied: &Applied<T>, actor: &Actor) -> Self {
        Self {
            persisted: applied.sync.persisted(),
            warning: applied.sync.warning(),
            bench_id: None,
            lineup: LineupView::render(&applied.snapshot, Some(actor)),
        }
    }
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}

#[get("/lineup")]
pub async fn api_get_lineup(actor: Actor, store: &State<Matchday>) -> Json<LineupView> {
    let snapshot = store.snapshot().await;
    Json(LineupView::render(&snapshot, Some(&actor)))
}

#[get("/share")]
pub async fn api_share(store: &State<Matchday>) -> Json<LineupView> {
    let snapshot = store.snapshot().await;
    Json(LineupView::render(&snapshot, None))
}

#[post("/lineup/reload")]
pub async fn api_reload(actor: Actor, store: &State<Matchday>) -> Json<LineupView> {
    let snapshot = store.reload().await;
    Json(LineupView::render(&snapshot, Some(&actor)))
}

#[derive(Deserialize, Validate)]
pub struct NameRequest {
    #[validate(length(min = 1, max = 40, message = "Name must be 1-40 characters"))]
    name: String,
}

#[post("/lineup/<team>/<key>/claim", data = "<request>")]
pub async fn api_claim(
    team: Team,
    key: PositionKey,
    request: Json<NameRequest>,
    actor: Actor,
    store: &State<Matchday>,
) -> Result<Json<MutationResponse>, ApiError> {
    let validated = request.validate_custom()?;

    let applied = store
        .claim(&actor, team, key, &validated.name)
        .await
        .validate_custom()?;

    Ok(Json(MutationResponse::from_applied(&applied, &actor)))
}

#[delete("/lineup/<team>/<key>")]
pub async fn api_cancel(
    team: Team,
    key: PositionKey,
    actor: Actor,
    store: &State<Matchday>,
) -> Result<Json<MutationResponse>, ApiError> {
    let applied = store.cancel(&actor, team, key).await.validate_custom()?;

    Ok(Json(MutationResponse::from_applied(&applied, &actor)))
}

#[patch("/lineup/<team>/<key>", data = "<patch>")]
pub async fn api_update_position(
    team: Team,
    key: PositionKey,
    patch: Json<PositionPatch>,
    actor: Actor,
    store: &State<Matchday>,
) -> Result<Json<MutationResponse>, ApiError> {
    let applied = store
        .update_position(&actor, team, key, patch.into_inner())
        .await
        .validate_custom()?;

    Ok(Json(MutationResponse::from_applied(&applied, &actor)))
}

#[post("/bench", data = "<request>")]
pub async fn api_join_bench(
    request: Json<NameRequest>,
    actor: Actor,
    store: &State<Matchday>,
) -> Result<Json<MutationResponse>, ApiError> {
    let validated = request.validate_custom()?;

    let applied = store
        .join_bench(&actor, &validated.name)
        .await
        .validate_custom()?;

    let mut response = MutationResponse::from_applied(&applied, &actor);
    response.bench_id = Some(applied.value);
    Ok(Json(response))
}

#[delete("/bench/<id>")]
pub async fn api_leave_bench(
    id: i64,
    actor: Actor,
    store: &State<Matchday>,
) -> Result<Json<MutationResponse>, ApiError> {
    let applied = store.leave_bench(&actor, id).await.validate_custom()?;

    Ok(Json(MutationResponse::from_applied(&applied, &actor)))
}

#[get("/match")]
pub async fn api_get_match(store: &State<Matchday>) -> Json<MatchInfo> {
    Json(store.snapshot().await.match_info)
}

#[derive(Deserialize, Validate)]
pub struct MatchInfoRequest {
    #[validate(length(min = 1, max = 80, message = "Match name is required"))]
    name: String,
    #[validate(length(min = 1, max = 80, message = "Venue is required"))]
    venue: String,
    #[validate(length(min = 1, max = 40, message = "Kickoff time is required"))]
    kickoff: String,
}

#[put("/match", data = "<request>")]
pub async fn api_update_match(
    request: Json<MatchInfoRequest>,
    actor: Actor,
    store: &State<Matchday>,
) -> Result<Json<MutationResponse>, ApiError> {
    let validated = request.validate_custom()?;
    let info = MatchInfo {
        name: validated.name.trim().to_string(),
        venue: validated.venue.trim().to_string(),
        kickoff: validated.kickoff.trim().to_string(),
    };

    let applied = store.set_match_info(&actor, info).await.validate_custom()?;

    Ok(Json(MutationResponse::from_applied(&applied, &actor)))
}

#[derive(Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    confirm: bool,
}

#[post("/admin/reset", data = "<request>")]
pub async fn api_reset(
    request: Json<ResetRequest>,
    actor: Actor,
    store: &State<Matchday>,
) -> Result<Json<MutationResponse>, ApiError> {
    let applied = store
        .reset(&actor, request.confirm)
        .await
        .validate_custom()?;

    Ok(Json(MutationResponse::from_applied(&applied, &actor)))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub admin: Option<Admin>,
    pub error: Option<String>,
}

#[post("/admin/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    settings: &State<Settings>,
) -> Result<Json<LoginResponse>, ApiError> {
    let validated = login.validate_custom()?;

    match authenticate_admin(db, &validated.email, &validated.password)
        .await
        .validate_custom()?
    {
        Some(admin) => {
            let token = AdminSession::generate_token();
            let expires_at = AdminSession::expiry_from_now(settings.session_hours);

            create_admin_session(db, admin.id, &token, expires_at)
                .await
                .validate_custom()?;

            cookies.add_private(
                Cookie::build((SESSION_COOKIE, token))
                    .same_site(SameSite::Lax)
                    .http_only(true)
                    .max_age(rocket::time::Duration::hours(settings.session_hours)),
            );

            Ok(Json(LoginResponse {
                success: true,
                admin: Some(admin),
                error: None,
            }))
        }
        None => Ok(Json(LoginResponse {
            success: false,
            admin: None,
            error: Some("Invalid email or password".to_string()),
        })),
    }
}

#[post("/admin/logout")]
pub async fn api_logout(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Status {
    let token = cookies
        .get_private(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        if let Err(err) = invalidate_session(db, &token).await {
            err.log_and_record("Signing out");
        }
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE));

    Status::Ok
}

#[get("/admin/me")]
pub async fn api_admin_me(admin: Admin) -> Json<Admin> {
    Json(admin)
}

#[get("/admin/me", rank = 2)]
pub async fn api_admin_me_unauthorized() -> Custom<Json<ValidationResponse>> {
    Status::Unauthorized.to_validation_response()
}
