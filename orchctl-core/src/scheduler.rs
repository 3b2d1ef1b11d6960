use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, watch};

use crate::controller::{Controller, Notifier, Presenter};
use crate::dispatch::Dispatcher;
use crate::view::{ModeToggle, group_records};

/// Refresh interval used when nothing else is configured
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(2000);

type Slot = Arc<Mutex<Option<oneshot::Sender<()>>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds at most one live wake for the scheduler's current wait.
///
/// The slot is only armed while the scheduler is waiting. Taking the sender
/// out under the lock is what makes a wake fire at most once per wait.
#[derive(Debug, Default)]
pub struct WakeSlot {
    inner: Slot,
}

impl WakeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trigger that can be handed to other components
    pub fn handle(&self) -> WakeHandle {
        WakeHandle {
            inner: self.inner.clone(),
        }
    }

    /// Install a fresh wake, replacing whatever was there
    pub(crate) fn arm(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        *lock(&self.inner) = Some(tx);
        rx
    }

    /// Reset the slot to inert
    pub(crate) fn disarm(&self) {
        lock(&self.inner).take();
    }
}

/// Cloneable trigger that ends the scheduler's current wait early
#[derive(Clone, Debug)]
pub struct WakeHandle {
    inner: Slot,
}

impl WakeHandle {
    /// Wake the scheduler if it is waiting.
    ///
    /// Returns `false` when there was no live wait to end; such triggers are
    /// dropped, never queued for the next wait.
    pub fn trigger(&self) -> bool {
        match lock(&self.inner).take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.inner).is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Polling,
    Rendering,
    Waiting,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Rendering => write!(f, "rendering"),
            Self::Waiting => write!(f, "waiting"),
        }
    }
}

/// Why a wait ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeReason {
    Timeout,
    Triggered,
}

/// Summary of one poll/render/wait cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// False when the poll failed and rendering was skipped
    pub rendered: bool,
    pub wake: WakeReason,
}

/// Drives the poll → render → wait loop.
///
/// The loop is strictly sequential: a cycle never starts before the previous
/// wait has ended, and a slow poll simply pushes the next wait back.
pub struct RefreshScheduler {
    controller: Arc<dyn Controller>,
    presenter: Arc<dyn Presenter>,
    interval: Duration,
    wake: WakeSlot,
    toggle: watch::Sender<ModeToggle>,
}

impl RefreshScheduler {
    pub fn new(controller: Arc<dyn Controller>, presenter: Arc<dyn Presenter>) -> Self {
        let (toggle, _) = watch::channel(ModeToggle::Pending);
        Self {
            controller,
            presenter,
            interval: DEFAULT_REFRESH_INTERVAL,
            wake: WakeSlot::new(),
            toggle,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn wake_handle(&self) -> WakeHandle {
        self.wake.handle()
    }

    /// Follows the toggle derived from each rendered snapshot
    pub fn mode_toggle(&self) -> watch::Receiver<ModeToggle> {
        self.toggle.subscribe()
    }

    /// Build a dispatcher wired to this scheduler's wake slot and toggle
    pub fn dispatcher(&self, notifier: Arc<dyn Notifier>) -> Dispatcher {
        Dispatcher::new(
            self.controller.clone(),
            notifier,
            self.wake_handle(),
            self.mode_toggle(),
        )
    }

    /// Run one full cycle
    pub async fn run_once(&self) -> CycleReport {
        tracing::trace!(phase = %Phase::Polling, "refresh cycle");
        let rendered = match self.controller.status().await {
            Ok(snapshot) => {
                tracing::trace!(phase = %Phase::Rendering, processes = snapshot.len());
                let groups = group_records(&snapshot);
                self.presenter.render(&groups);
                self.toggle.send_replace(ModeToggle::from_snapshot(&snapshot));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "status poll failed, skipping render");
                false
            }
        };

        let wake = self.wait().await;
        tracing::debug!(rendered, ?wake, "refresh cycle finished");
        CycleReport { rendered, wake }
    }

    /// Loop forever; stop it by dropping or aborting the task running it
    pub async fn run(self) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "refresh loop started");
        loop {
            self.run_once().await;
        }
    }

    async fn wait(&self) -> WakeReason {
        tracing::trace!(phase = %Phase::Waiting);
        let woken = self.wake.arm();

        let reason = tokio::select! {
            _ = tokio::time::sleep(self.interval) => WakeReason::Timeout,
            Ok(()) = woken => WakeReason::Triggered,
        };

        self.wake.disarm();
        reason
    }
}
