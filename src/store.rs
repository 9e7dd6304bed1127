use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::engine::{self, Actor, BookingError, SyncOp};
use crate::gateway::Gateway;
use crate::lineup::Lineup;
use crate::models::{MatchInfo, PositionKey, PositionPatch, Team};

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub lineup: Lineup,
    pub match_info: MatchInfo,
    pub sync_warning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub failures: Vec<String>,
    // (temporary id, assigned id)
    pub reconciled: Vec<(i64, i64)>,
}

impl SyncReport {
    pub fn persisted(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn warning(&self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(format!(
                "Saved locally but not persisted: {}",
                self.failures.join("; ")
            ))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub value: T,
    pub sync: SyncReport,
    pub snapshot: Snapshot,
}

struct Board {
    lineup: Lineup,
    match_info: MatchInfo,
    sync_warning: Option<String>,
}

impl Board {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            lineup: self.lineup.clone(),
            match_info: self.match_info.clone(),
            sync_warning: self.sync_warning.clone(),
        }
    }
}

pub struct Matchday {
    board: Mutex<Board>,
    gateway: Arc<dyn Gateway>,
    defaults: MatchInfo,
}

impl Matchday {
    pub fn new(gateway: Arc<dyn Gateway>, defaults: MatchInfo) -> Self {
        Self {
            board: Mutex::new(Board {
                lineup: Lineup::new(),
                match_info: defaults.clone(),
                sync_warning: None,
            }),
            gateway,
            defaults,
        }
    }

    pub async fn load(gateway: Arc<dyn Gateway>, defaults: MatchInfo) -> Self {
        let matchday = Self::new(gateway, defaults);
        matchday.reload().await;
        matchday
    }

    #[instrument(skip(self))]
    pub async fn reload(&self) -> Snapshot {
        let mut board = self.board.lock().await;

        let match_info = match self.gateway.fetch_match_info().await {
            Ok(Some(info)) => info,
            Ok(None) => self.defaults.clone(),
            Err(err) => {
                warn!(error = %err, "Match details unavailable, using defaults");
                self.defaults.clone()
            }
        };
        board.match_info = match_info;

        match self.gateway.fetch_bookings().await {
            Ok(bookings) => {
                let bench = self.gateway.fetch_bench().await.unwrap_or_else(|err| {
                    warn!(error = %err, "Bench unavailable, starting with an empty queue");
                    Vec::new()
                });

                board.lineup = Lineup::hydrate(bookings, bench);
                board.sync_warning = None;
                info!(
                    booked = board.lineup.total_booked(),
                    bench = board.lineup.bench().len(),
                    "Lineup loaded"
                );
            }
            Err(err) => {
                err.log_and_record("Loading bookings");
                board.sync_warning = Some(format!("Could not load bookings: {}", err));
            }
        }

        board.snapshot()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.board.lock().await.snapshot()
    }

    async fn apply<T, F>(&self, mutate: F) -> Result<Applied<T>, BookingError>
    where
        F: FnOnce(&mut Board) -> Result<(T, Vec<SyncOp>), BookingError>,
    {
        let mut board = self.board.lock().await;

        let (value, ops) = mutate(&mut board)?;

        let sync = self.mirror(&mut board.lineup, ops).await;
        if let Some(warning) = sync.warning() {
            board.sync_warning = Some(warning);
        }

        Ok(Applied {
            value,
            sync,
            snapshot: board.snapshot(),
        })
    }

    async fn mirror(&self, lineup: &mut Lineup, ops: Vec<SyncOp>) -> SyncReport {
        let mut report = SyncReport::default();

        for op in ops {
            let description = op.describe();

            let result = match op {
                SyncOp::UpsertBooking(row) => self.gateway.upsert_booking(&row).await,
                SyncOp::UpdateBooking { team, key, patch } => {
                    self.gateway.update_booking(team, key, &patch).await
                }
                SyncOp::DeleteBooking { team, key } => self.gateway.delete_booking(team, key).await,
                SyncOp::InsertBench {
                    temp_id,
                    name,
                    device,
                } => {
                    let device_id = device.as_ref().map(|d| d.as_str());
                    match self.gateway.insert_bench(&name, device_id).await {
                        Ok(id) => {
                            if lineup.reconcile_bench_id(temp_id, id) {
                                report.reconciled.push((temp_id, id));
                            }
                            Ok(())
                        }
                        Err(err) => Err(err),
                    }
                }
                SyncOp::DeleteBench { id } => self.gateway.delete_bench(id).await,
                SyncOp::ClearBookings => self.gateway.clear_bookings().await.map(|_| ()),
                SyncOp::ClearBench => self.gateway.clear_bench().await.map(|_| ()),
                SyncOp::UpsertMatch(info) => self.gateway.upsert_match_info(&info).await,
            };

            if let Err(err) = result {
                err.log_and_record(&format!("Failed to {}", description));
                report.failures.push(format!("could not {}", description));
            }
        }

        report
    }

    #[instrument(skip(self))]
    pub async fn claim(
        &self,
        actor: &Actor,
        team: Team,
        key: PositionKey,
        name: &str,
    ) -> Result<Applied<()>, BookingError> {
        self.apply(|board| {
            engine::claim(&mut board.lineup, actor, team, key, name).map(|ops| ((), ops))
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        actor: &Actor,
        team: Team,
        key: PositionKey,
    ) -> Result<Applied<()>, BookingError> {
        self.apply(|board| engine::cancel(&mut board.lineup, actor, team, key).map(|ops| ((), ops)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn join_bench(&self, actor: &Actor, name: &str) -> Result<Applied<i64>, BookingError> {
        let mut applied = self
            .apply(|board| engine::join_bench(&mut board.lineup, actor, name))
            .await?;

        let temp_id = applied.value;
        if let Some(&(_, id)) = applied
            .sync
            .reconciled
            .iter()
            .find(|(temp, _)| *temp == temp_id)
        {
            applied.value = id;
        }

        Ok(applied)
    }

    #[instrument(skip(self))]
    pub async fn leave_bench(&self, actor: &Actor, id: i64) -> Result<Applied<()>, BookingError> {
        self.apply(|board| engine::leave_bench(&mut board.lineup, actor, id).map(|ops| ((), ops)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn update_position(
        &self,
        actor: &Actor,
        team: Team,
        key: PositionKey,
        patch: PositionPatch,
    ) -> Result<Applied<()>, BookingError> {
        self.apply(|board| {
            engine::update_position(&mut board.lineup, actor, team, key, patch).map(|ops| ((), ops))
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn set_match_info(
        &self,
        actor: &Actor,
        info: MatchInfo,
    ) -> Result<Applied<()>, BookingError> {
        self.apply(|board| {
            engine::set_match_info(&mut board.match_info, actor, info).map(|ops| ((), ops))
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn reset(&self, actor: &Actor, confirm: bool) -> Result<Applied<()>, BookingError> {
        self.apply(|board| engine::reset(&mut board.lineup, actor, confirm).map(|ops| ((), ops)))
            .await
    }
}
