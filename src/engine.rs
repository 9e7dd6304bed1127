use thiserror::Error;

use crate::lineup::Lineup;
use crate::models::{BookingRow, DeviceId, MatchInfo, PositionKey, PositionPatch, Team};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("A name is required")]
    EmptyName,

    #[error("This device already holds {team} {key}")]
    AlreadyBooked { team: Team, key: PositionKey },

    #[error("This device is on the bench; leave the bench before booking a position")]
    OnBench,

    #[error("This device is already on the bench")]
    AlreadyOnBench,

    #[error("{team} {key} is already taken")]
    PositionTaken { team: Team, key: PositionKey },

    #[error("{team} {key} is not booked")]
    NotBooked { team: Team, key: PositionKey },

    #[error("Only the device that made this booking can cancel it")]
    NotOwner,

    #[error("Bench entry {0} not found")]
    BenchEntryNotFound(i64),

    #[error("Administrator sign-in required")]
    NotPrivileged,

    #[error("Reset must be explicitly confirmed")]
    ConfirmationRequired,

    #[error("Rating must be between 1 and 10")]
    InvalidRating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub device: DeviceId,
    pub privileged: bool,
}

impl Actor {
    pub fn device(device: impl Into<DeviceId>) -> Self {
        Self {
            device: device.into(),
            privileged: false,
        }
    }

    pub fn admin(device: impl Into<DeviceId>) -> Self {
        Self {
            device: device.into(),
            privileged: true,
        }
    }

    // Unowned records are releasable by anyone
    fn may_release(&self, owner: Option<&DeviceId>) -> bool {
        self.privileged || owner.is_none_or(|owner| *owner == self.device)
    }

    fn require_privilege(&self) -> Result<(), BookingError> {
        if self.privileged {
            Ok(())
        } else {
            Err(BookingError::NotPrivileged)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp {
    UpsertBooking(BookingRow),
    UpdateBooking {
        team: Team,
        key: PositionKey,
        patch: PositionPatch,
    },
    DeleteBooking {
        team: Team,
        key: PositionKey,
    },
    InsertBench {
        temp_id: i64,
        name: String,
        device: Option<DeviceId>,
    },
    DeleteBench {
        id: i64,
    },
    ClearBookings,
    ClearBench,
    UpsertMatch(MatchInfo),
}

impl SyncOp {
    pub fn describe(&self) -> String {
        match self {
            SyncOp::UpsertBooking(row) => format!("save booking {} {}", row.team, row.key),
            SyncOp::UpdateBooking { team, key, .. } => format!("update booking {} {}", team, key),
            SyncOp::DeleteBooking { team, key } => format!("delete booking {} {}", team, key),
            SyncOp::InsertBench { name, .. } => format!("add {} to the bench", name),
            SyncOp::DeleteBench { id } => format!("remove bench entry {}", id),
            SyncOp::ClearBookings => "clear all bookings".to_string(),
            SyncOp::ClearBench => "clear the bench".to_string(),
            SyncOp::UpsertMatch(_) => "save match details".to_string(),
        }
    }
}

fn display_name(name: &str) -> Result<String, BookingError> {
    let name = name.trim();
    if name.is_empty() {
        Err(BookingError::EmptyName)
    } else {
        Ok(name.to_string())
    }
}

fn ensure_free(lineup: &Lineup, device: &DeviceId) -> Result<(), BookingError> {
    if let Some((team, key)) = lineup.booking_of(device) {
        return Err(BookingError::AlreadyBooked { team, key });
    }
    if lineup.bench_entry_of(device).is_some() {
        return Err(BookingError::OnBench);
    }
    Ok(())
}

pub fn claim(
    lineup: &mut Lineup,
    actor: &Actor,
    team: Team,
    key: PositionKey,
    name: &str,
) -> Result<Vec<SyncOp>, BookingError> {
    let name = display_name(name)?;
    ensure_free(lineup, &actor.device)?;

    let position = lineup.position_mut(team, key);
    if position.booked {
        return Err(BookingError::PositionTaken { team, key });
    }

    position.occupy(name, Some(actor.device.clone()));

    Ok(vec![SyncOp::UpsertBooking(BookingRow::from_position(
        team, position,
    ))])
}

pub fn cancel(
    lineup: &mut Lineup,
    actor: &Actor,
    team: Team,
    key: PositionKey,
) -> Result<Vec<SyncOp>, BookingError> {
    let position = lineup.position(team, key);
    if !position.booked {
        return Err(BookingError::NotBooked { team, key });
    }
    if !actor.may_release(position.device.as_ref()) {
        return Err(BookingError::NotOwner);
    }

    match lineup.pop_bench() {
        Some(substitute) => {
            let position = lineup.position_mut(team, key);
            position.occupy(substitute.name.clone(), substitute.device.clone());

            let mut ops = vec![SyncOp::UpsertBooking(BookingRow::from_position(
                team, position,
            ))];
            if substitute.is_persisted() {
                ops.push(SyncOp::DeleteBench { id: substitute.id });
            }
            Ok(ops)
        }
        None => {
            lineup.position_mut(team, key).clear();
            Ok(vec![SyncOp::DeleteBooking { team, key }])
        }
    }
}

pub fn join_bench(
    lineup: &mut Lineup,
    actor: &Actor,
    name: &str,
) -> Result<(i64, Vec<SyncOp>), BookingError> {
    let name = display_name(name)?;
    if lineup.bench_entry_of(&actor.device).is_some() {
        return Err(BookingError::AlreadyOnBench);
    }
    if let Some((team, key)) = lineup.booking_of(&actor.device) {
        return Err(BookingError::AlreadyBooked { team, key });
    }

    let temp_id = lineup.push_bench(name.clone(), Some(actor.device.clone()));

    Ok((
        temp_id,
        vec![SyncOp::InsertBench {
            temp_id,
            name,
            device: Some(actor.device.clone()),
        }],
    ))
}

pub fn leave_bench(lineup: &mut Lineup, actor: &Actor, id: i64) -> Result<Vec<SyncOp>, BookingError> {
    let entry = lineup
        .bench_entry(id)
        .ok_or(BookingError::BenchEntryNotFound(id))?;
    if !actor.may_release(entry.device.as_ref()) {
        return Err(BookingError::NotOwner);
    }

    let entry = lineup
        .remove_bench(id)
        .ok_or(BookingError::BenchEntryNotFound(id))?;

    Ok(if entry.is_persisted() {
        vec![SyncOp::DeleteBench { id }]
    } else {
        Vec::new()
    })
}

pub fn update_position(
    lineup: &mut Lineup,
    actor: &Actor,
    team: Team,
    key: PositionKey,
    patch: PositionPatch,
) -> Result<Vec<SyncOp>, BookingError> {
    actor.require_privilege()?;

    if let Some(Some(rating)) = patch.rating {
        if !(1..=10).contains(&rating) {
            return Err(BookingError::InvalidRating);
        }
    }
    let name = patch.name.as_deref().map(display_name).transpose()?;

    let position = lineup.position_mut(team, key);
    if !position.booked {
        return Err(BookingError::NotBooked { team, key });
    }

    let mut changed = PositionPatch::default();

    if let Some(name) = name.filter(|n| position.name.as_deref() != Some(n.as_str())) {
        position.name = Some(name.clone());
        changed.name = Some(name);
    }
    if let Some(rating) = patch.rating.filter(|r| *r != position.rating) {
        position.rating = rating;
        changed.rating = Some(rating);
    }
    if let Some(tags) = patch.tags.filter(|t| *t != position.tags) {
        position.tags = tags.clone();
        changed.tags = Some(tags);
    }
    if let Some(note) = patch.note.filter(|n| *n != position.note) {
        position.note = note.clone();
        changed.note = Some(note);
    }
    if let Some(payment) = patch.payment.filter(|p| *p != position.payment) {
        position.payment = payment;
        changed.payment = Some(payment);
    }

    if changed.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![SyncOp::UpdateBooking {
        team,
        key,
        patch: changed,
    }])
}

pub fn set_match_info(
    current: &mut MatchInfo,
    actor: &Actor,
    info: MatchInfo,
) -> Result<Vec<SyncOp>, BookingError> {
    actor.require_privilege()?;

    *current = info.clone();
    Ok(vec![SyncOp::UpsertMatch(info)])
}

pub fn reset(lineup: &mut Lineup, actor: &Actor, confirm: bool) -> Result<Vec<SyncOp>, BookingError> {
    actor.require_privilege()?;
    if !confirm {
        return Err(BookingError::ConfirmationRequired);
    }

    lineup.reset();
    Ok(vec![SyncOp::ClearBookings, SyncOp::ClearBench])
}
