//! Drives one coordinator on a fixed interval and holds what it published.

use crate::{
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{
            field::Field,
            record::ResourceRecord,
            resource_kind::ResourceKind,
        },
    },
    monitor::application::{
        context::MonitorContext,
        coordinator::{Coordinator, CoordinatorTarget},
        service::topology_service::TopologyService,
    },
};
use serde::Serialize;
use std::{
    sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    /// No cycle has succeeded yet.
    Uninitialized,
    /// The last cycle succeeded.
    Ready,
    /// The last cycle failed; the last good record is kept but unavailable.
    Stale,
    /// Unloaded; no further cycles run.
    Terminated,
}

#[derive(Debug)]
struct Published {
    state: CoordinatorState,
    record: Option<ResourceRecord>,
    last_refresh_ok: bool,
    last_error: Option<String>,
}

/// Point-in-time view of a coordinator for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorSnapshot {
    pub target: String,
    pub kind: ResourceKind,
    pub state: CoordinatorState,
    pub last_refresh_ok: bool,
    pub last_error: Option<String>,
    pub record: Option<ResourceRecord>,
}

/// Owns one coordinator, its published record and its timer task.
pub struct CoordinatorHandle {
    target: CoordinatorTarget,
    coordinator: Arc<dyn Coordinator>,
    context: Arc<MonitorContext>,
    topology: TopologyService,
    published: RwLock<Published>,
    cycle: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CoordinatorHandle {
    pub fn new(target: CoordinatorTarget, context: Arc<MonitorContext>) -> Arc<Self> {
        let coordinator = target.build(context.clone());
        Self::with_coordinator(target, coordinator, context)
    }

    /// Wraps an already built coordinator.
    pub fn with_coordinator(
        target: CoordinatorTarget,
        coordinator: Arc<dyn Coordinator>,
        context: Arc<MonitorContext>,
    ) -> Arc<Self> {
        Arc::new(Self {
            target,
            coordinator,
            topology: TopologyService::new(context.clone()),
            cancel: context.child_token(),
            context,
            published: RwLock::new(Published {
                state: CoordinatorState::Uninitialized,
                record: None,
                last_refresh_ok: false,
                last_error: None,
            }),
            cycle: tokio::sync::Mutex::new(()),
            task: Mutex::new(None),
        })
    }

    pub fn target(&self) -> &CoordinatorTarget {
        &self.target
    }

    pub fn kind(&self) -> ResourceKind {
        self.coordinator.kind()
    }

    pub fn state(&self) -> CoordinatorState {
        self.read_published().state
    }

    /// The last successfully fetched record, also while stale.
    pub fn current_record(&self) -> Option<ResourceRecord> {
        self.read_published().record.clone()
    }

    pub fn last_refresh_ok(&self) -> bool {
        self.read_published().last_refresh_ok
    }

    pub fn last_error(&self) -> Option<String> {
        self.read_published().last_error.clone()
    }

    /// Reads one field of the current record; `NotYetFetched` before the
    /// first success.
    pub fn read<T>(&self, f: impl FnOnce(&ResourceRecord) -> Field<T>) -> Field<T> {
        match &self.read_published().record {
            Some(record) => f(record),
            None => Field::NotYetFetched,
        }
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let published = self.read_published();
        CoordinatorSnapshot {
            target: self.target.to_string(),
            kind: self.coordinator.kind(),
            state: published.state,
            last_refresh_ok: published.last_refresh_ok,
            last_error: published.last_error.clone(),
            record: published.record.clone(),
        }
    }

    /// Runs one cycle and publishes its outcome.
    ///
    /// Cycles of the same coordinator never overlap. A cycle interrupted by
    /// cancellation publishes nothing.
    ///
    /// # Errors
    /// Returns the cycle's error after it has been published.
    pub async fn refresh(&self) -> ProxmoxResult<()> {
        let _cycle = self.cycle.lock().await;
        if self.cancel.is_cancelled() {
            return Ok(());
        }

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("{} refresh cancelled", self.target);
                return Ok(());
            }
            result = self.coordinator.fetch() => result,
        };

        match result {
            Ok(record) => {
                self.topology
                    .reconcile_record(self.coordinator.identity(), &record)
                    .await;
                let mut published = self.write_published();
                if published.state == CoordinatorState::Terminated {
                    return Ok(());
                }
                if published.state != CoordinatorState::Ready {
                    info!("{} is available", self.target);
                }
                published.state = CoordinatorState::Ready;
                published.record = Some(record);
                published.last_refresh_ok = true;
                published.last_error = None;
                Ok(())
            }
            Err(error) => {
                self.publish_failure(&error);
                if error.is_fatal() {
                    self.context.signal_reauth(&error.to_string());
                }
                Err(error)
            }
        }
    }

    fn publish_failure(&self, error: &ProxmoxError) {
        let kind = error.failure_kind();
        warn!("{} refresh failed ({:?}): {}", self.target, kind, error);
        let mut published = self.write_published();
        if published.state == CoordinatorState::Terminated {
            return;
        }
        published.state = if published.record.is_some() {
            CoordinatorState::Stale
        } else {
            CoordinatorState::Uninitialized
        };
        published.last_refresh_ok = false;
        published.last_error = Some(error.to_string());
    }

    /// Starts the periodic task. The first tick fires after one `period`.
    pub fn spawn(self: &Arc<Self>, period: Duration) {
        let handle = Arc::clone(self);
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        // Failures are already published and logged.
                        let _ = handle.refresh().await;
                    }
                }
            }
            debug!("{} timer stopped", handle.target);
        });
        *self.lock_task() = Some(task);
    }

    /// Cancels the timer and any in-flight cycle, then marks the coordinator
    /// terminated.
    pub async fn terminate(&self) {
        self.cancel.cancel();
        let task = self.lock_task().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                debug!("{} timer task ended abnormally: {}", self.target, e);
            }
        }
        let mut published = self.write_published();
        published.state = CoordinatorState::Terminated;
        published.last_refresh_ok = false;
    }

    fn read_published(&self) -> RwLockReadGuard<'_, Published> {
        self.published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_published(&self) -> RwLockWriteGuard<'_, Published> {
        self.published
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
