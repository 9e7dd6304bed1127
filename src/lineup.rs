use std::collections::VecDeque;

use serde::Serialize;
use tracing::warn;

use crate::models::{BenchEntry, BookingRow, DeviceId, Position, PositionKey, Team};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSheet {
    pub team: Team,
    pub positions: Vec<Position>,
}

impl TeamSheet {
    pub fn empty(team: Team) -> Self {
        Self {
            team,
            positions: PositionKey::ALL.iter().map(|k| Position::empty(*k)).collect(),
        }
    }

    pub fn position(&self, key: PositionKey) -> &Position {
        self.positions
            .iter()
            .find(|p| p.key == key)
            .unwrap_or_else(|| unreachable!("team sheet holds every position key"))
    }

    pub fn position_mut(&mut self, key: PositionKey) -> &mut Position {
        self.positions
            .iter_mut()
            .find(|p| p.key == key)
            .unwrap_or_else(|| unreachable!("team sheet holds every position key"))
    }

    pub fn booked(&self) -> usize {
        self.positions.iter().filter(|p| p.booked).count()
    }

    pub fn remaining(&self) -> usize {
        self.positions.len() - self.booked()
    }
}

// Bench order is queue priority
#[derive(Debug, Clone, PartialEq)]
pub struct Lineup {
    red: TeamSheet,
    green: TeamSheet,
    bench: VecDeque<BenchEntry>,
    next_temp_id: i64,
}

impl Default for Lineup {
    fn default() -> Self {
        Self::new()
    }
}

impl Lineup {
    pub fn new() -> Self {
        Self {
            red: TeamSheet::empty(Team::Red),
            green: TeamSheet::empty(Team::Green),
            bench: VecDeque::new(),
            next_temp_id: -1,
        }
    }

    // Duplicate rows for one position keep the last
    pub fn hydrate(bookings: Vec<BookingRow>, bench: Vec<BenchEntry>) -> Self {
        let mut lineup = Self::new();

        for row in bookings {
            let position = lineup.position_mut(row.team, row.key);
            if position.booked {
                warn!(team = %row.team, position = %row.key, "Duplicate booking row, keeping the latest");
            }
            position.occupy(row.name, row.device);
            position.rating = row.rating;
            position.tags = row.tags;
            position.note = row.note;
            position.payment = row.payment;
        }

        lineup.bench = bench.into();
        lineup
    }

    pub fn team(&self, team: Team) -> &TeamSheet {
        match team {
            Team::Red => &self.red,
            Team::Green => &self.green,
        }
    }

    fn team_mut(&mut self, team: Team) -> &mut TeamSheet {
        match team {
            Team::Red => &mut self.red,
            Team::Green => &mut self.green,
        }
    }

    pub fn teams(&self) -> [&TeamSheet; 2] {
        [&self.red, &self.green]
    }

    pub fn position(&self, team: Team, key: PositionKey) -> &Position {
        self.team(team).position(key)
    }

    pub fn position_mut(&mut self, team: Team, key: PositionKey) -> &mut Position {
        self.team_mut(team).position_mut(key)
    }

    pub fn bench(&self) -> &VecDeque<BenchEntry> {
        &self.bench
    }

    pub fn total_booked(&self) -> usize {
        self.red.booked() + self.green.booked()
    }

    pub fn booking_of(&self, device: &DeviceId) -> Option<(Team, PositionKey)> {
        self.teams().into_iter().find_map(|sheet| {
            sheet
                .positions
                .iter()
                .find(|p| p.booked && p.is_owned_by(device))
                .map(|p| (sheet.team, p.key))
        })
    }

    pub fn bench_entry_of(&self, device: &DeviceId) -> Option<&BenchEntry> {
        self.bench
            .iter()
            .find(|entry| entry.device.as_ref() == Some(device))
    }

    pub fn has_booking_or_bench(&self, device: &DeviceId) -> bool {
        self.booking_of(device).is_some() || self.bench_entry_of(device).is_some()
    }

    pub fn bench_entry(&self, id: i64) -> Option<&BenchEntry> {
        self.bench.iter().find(|entry| entry.id == id)
    }

    pub(crate) fn push_bench(&mut self, name: String, device: Option<DeviceId>) -> i64 {
        let id = self.next_temp_id;
        self.next_temp_id -= 1;
        self.bench.push_back(BenchEntry { id, name, device });
        id
    }

    pub(crate) fn pop_bench(&mut self) -> Option<BenchEntry> {
        self.bench.pop_front()
    }

    pub(crate) fn remove_bench(&mut self, id: i64) -> Option<BenchEntry> {
        let index = self.bench.iter().position(|entry| entry.id == id)?;
        self.bench.remove(index)
    }

    pub fn reconcile_bench_id(&mut self, temp_id: i64, id: i64) -> bool {
        match self.bench.iter_mut().find(|entry| entry.id == temp_id) {
            Some(entry) => {
                entry.id = id;
                true
            }
            None => false,
        }
    }

    pub(crate) fn reset(&mut self) {
        let next_temp_id = self.next_temp_id;
        *self = Self::new();
        self.next_temp_id = next_temp_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;

    fn row(team: Team, key: PositionKey, name: &str, device: Option<&str>) -> BookingRow {
        BookingRow {
            team,
            key,
            name: name.to_string(),
            rating: Some(7),
            tags: vec!["fast".to_string()],
            note: "brings bibs".to_string(),
            payment: PaymentStatus::Paid,
            device: device.map(DeviceId::from),
        }
    }

    #[test]
    fn new_lineup_has_nine_empty_positions_per_team() {
        let lineup = Lineup::new();

        for sheet in lineup.teams() {
            assert_eq!(sheet.positions.len(), 9);
            assert_eq!(sheet.booked(), 0);
            assert_eq!(sheet.remaining(), 9);
        }
        assert!(lineup.bench().is_empty());
    }

    #[test]
    fn hydrate_applies_rows_and_counts() {
        let lineup = Lineup::hydrate(
            vec![
                row(Team::Red, PositionKey::Gk, "Sami", Some("x")),
                row(Team::Green, PositionKey::St, "Noor", None),
            ],
            vec![BenchEntry {
                id: 4,
                name: "Alice".to_string(),
                device: Some(DeviceId::from("y")),
            }],
        );

        let gk = lineup.position(Team::Red, PositionKey::Gk);
        assert!(gk.booked);
        assert_eq!(gk.name.as_deref(), Some("Sami"));
        assert_eq!(gk.rating, Some(7));
        assert_eq!(gk.payment, PaymentStatus::Paid);

        assert_eq!(lineup.team(Team::Red).booked(), 1);
        assert_eq!(lineup.team(Team::Green).remaining(), 8);
        assert_eq!(lineup.total_booked(), 2);
        assert_eq!(lineup.bench().len(), 1);
    }

    #[test]
    fn device_lookups_span_both_teams_and_bench() {
        let lineup = Lineup::hydrate(
            vec![row(Team::Green, PositionKey::Cm, "Sami", Some("x"))],
            vec![BenchEntry {
                id: 1,
                name: "Alice".to_string(),
                device: Some(DeviceId::from("y")),
            }],
        );

        assert_eq!(
            lineup.booking_of(&DeviceId::from("x")),
            Some((Team::Green, PositionKey::Cm))
        );
        assert!(lineup.bench_entry_of(&DeviceId::from("y")).is_some());
        assert!(lineup.has_booking_or_bench(&DeviceId::from("y")));
        assert!(!lineup.has_booking_or_bench(&DeviceId::from("z")));
    }

    #[test]
    fn temporary_bench_ids_are_reconciled() {
        let mut lineup = Lineup::new();
        let temp = lineup.push_bench("Alice".to_string(), None);
        let second = lineup.push_bench("Bob".to_string(), None);

        assert!(temp < 0 && second < temp);
        assert!(lineup.reconcile_bench_id(temp, 12));
        assert!(!lineup.reconcile_bench_id(temp, 13));
        assert_eq!(lineup.bench_entry(12).map(|e| e.name.as_str()), Some("Alice"));
    }
}
