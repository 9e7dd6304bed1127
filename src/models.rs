use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rocket::request::FromParam;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Green,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Green => "green",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Team::Red),
            "green" => Ok(Team::Green),
            _ => Err(format!("Unknown team: {}", s)),
        }
    }
}

impl<'a> FromParam<'a> for Team {
    type Error = String;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Line {
    Goalkeeper,
    Defense,
    Midfield,
    Attack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionKey {
    Gk,
    Lb,
    Cb1,
    Cb2,
    Rb,
    Lm,
    Cm,
    Rm,
    St,
}

impl PositionKey {
    // Display order
    pub const ALL: [PositionKey; 9] = [
        PositionKey::Gk,
        PositionKey::Lb,
        PositionKey::Cb1,
        PositionKey::Cb2,
        PositionKey::Rb,
        PositionKey::Lm,
        PositionKey::Cm,
        PositionKey::Rm,
        PositionKey::St,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionKey::Gk => "GK",
            PositionKey::Lb => "LB",
            PositionKey::Cb1 => "CB1",
            PositionKey::Cb2 => "CB2",
            PositionKey::Rb => "RB",
            PositionKey::Lm => "LM",
            PositionKey::Cm => "CM",
            PositionKey::Rm => "RM",
            PositionKey::St => "ST",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PositionKey::Gk => "Goalkeeper",
            PositionKey::Lb => "Left back",
            PositionKey::Cb1 | PositionKey::Cb2 => "Centre back",
            PositionKey::Rb => "Right back",
            PositionKey::Lm => "Left midfield",
            PositionKey::Cm => "Centre midfield",
            PositionKey::Rm => "Right midfield",
            PositionKey::St => "Striker",
        }
    }

    pub fn line(&self) -> Line {
        match self {
            PositionKey::Gk => Line::Goalkeeper,
            PositionKey::Lb | PositionKey::Cb1 | PositionKey::Cb2 | PositionKey::Rb => {
                Line::Defense
            }
            PositionKey::Lm | PositionKey::Cm | PositionKey::Rm => Line::Midfield,
            PositionKey::St => Line::Attack,
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PositionKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown position: {}", s))
    }
}

impl<'a> FromParam<'a> for PositionKey {
    type Error = String;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }

    // Anything other than "paid" is unpaid
    pub fn from_db(value: &str) -> Self {
        if value.eq_ignore_ascii_case("paid") {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub key: PositionKey,
    pub label: &'static str,
    pub line: Line,
    pub booked: bool,
    pub name: Option<String>,
    pub rating: Option<u8>,
    pub tags: Vec<String>,
    pub note: String,
    pub payment: PaymentStatus,
    #[serde(skip)]
    pub device: Option<DeviceId>,
}

impl Position {
    pub fn empty(key: PositionKey) -> Self {
        Self {
            key,
            label: key.label(),
            line: key.line(),
            booked: false,
            name: None,
            rating: None,
            tags: Vec::new(),
            note: String::new(),
            payment: PaymentStatus::Unpaid,
            device: None,
        }
    }

    pub fn occupy(&mut self, name: String, device: Option<DeviceId>) {
        *self = Self {
            booked: true,
            name: Some(name),
            device,
            ..Self::empty(self.key)
        };
    }

    pub fn clear(&mut self) {
        *self = Self::empty(self.key);
    }

    pub fn is_owned_by(&self, device: &DeviceId) -> bool {
        self.device.as_ref() == Some(device)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchEntry {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub device: Option<DeviceId>,
}

impl BenchEntry {
    // Temporary ids are negative
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub name: String,
    pub venue: String,
    pub kickoff: String,
}

impl Default for MatchInfo {
    fn default() -> Self {
        Self {
            name: "Friday Football".to_string(),
            venue: "TBD".to_string(),
            kickoff: "20:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingRow {
    pub team: Team,
    pub key: PositionKey,
    pub name: String,
    pub rating: Option<u8>,
    pub tags: Vec<String>,
    pub note: String,
    pub payment: PaymentStatus,
    pub device: Option<DeviceId>,
}

impl BookingRow {
    pub fn from_position(team: Team, position: &Position) -> Self {
        Self {
            team,
            key: position.key,
            name: position.name.clone().unwrap_or_default(),
            rating: position.rating,
            tags: position.tags.clone(),
            note: position.note.clone(),
            payment: position.payment,
            device: position.device.clone(),
        }
    }
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbBooking {
    pub team: Option<String>,
    pub position_key: Option<String>,
    pub name: Option<String>,
    pub rating: Option<i64>,
    pub tags: Option<String>,
    pub note: Option<String>,
    pub payment_status: Option<String>,
    pub device_id: Option<String>,
}

impl TryFrom<DbBooking> for BookingRow {
    type Error = String;

    fn try_from(db: DbBooking) -> Result<Self, Self::Error> {
        let team: Team = db.team.unwrap_or_default().parse()?;
        let key: PositionKey = db.position_key.unwrap_or_default().parse()?;

        Ok(Self {
            team,
            key,
            name: db.name.unwrap_or_default(),
            rating: db
                .rating
                .and_then(|r| u8::try_from(r).ok())
                .filter(|r| (1..=10).contains(r)),
            tags: db
                .tags
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .unwrap_or_default(),
            note: db.note.unwrap_or_default(),
            payment: PaymentStatus::from_db(&db.payment_status.unwrap_or_default()),
            device: db.device_id.filter(|d| !d.is_empty()).map(DeviceId),
        })
    }
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbBenchEntry {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub device_id: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbBenchEntry> for BenchEntry {
    fn from(db: DbBenchEntry) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            name: db.name.unwrap_or_default(),
            device: db.device_id.filter(|d| !d.is_empty()).map(DeviceId),
        }
    }
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbMatchInfo {
    pub name: String,
    pub venue: String,
    pub kickoff: String,
}

impl From<DbMatchInfo> for MatchInfo {
    fn from(db: DbMatchInfo) -> Self {
        Self {
            name: db.name,
            venue: db.venue,
            kickoff: db.kickoff,
        }
    }
}

// `rating: Some(None)` clears the rating
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PositionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<u8>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub payment: Option<PaymentStatus>,
}

impl PositionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.rating.is_none()
            && self.tags.is_none()
            && self.note.is_none()
            && self.payment.is_none()
    }
}

// Distinguishes an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
