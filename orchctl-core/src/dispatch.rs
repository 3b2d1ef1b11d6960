use std::sync::Arc;

use tokio::sync::watch;

use crate::controller::{Action, Controller, Notification, Notifier};
use crate::scheduler::WakeHandle;
use crate::view::ModeToggle;

/// Result of a dispatched action, for callers that need more than the notice
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded { message: String },
    Failed { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Turns user intents into orchestrator commands.
///
/// Every dispatched action produces exactly one notification. Accepted
/// commands wake the refresh scheduler so the next snapshot shows their
/// effect without waiting out the interval.
pub struct Dispatcher {
    controller: Arc<dyn Controller>,
    notifier: Arc<dyn Notifier>,
    wake: WakeHandle,
    toggle: watch::Receiver<ModeToggle>,
}

impl Dispatcher {
    pub fn new(
        controller: Arc<dyn Controller>,
        notifier: Arc<dyn Notifier>,
        wake: WakeHandle,
        toggle: watch::Receiver<ModeToggle>,
    ) -> Self {
        Self {
            controller,
            notifier,
            wake,
            toggle,
        }
    }

    pub async fn dispatch(&self, action: Action) -> Outcome {
        tracing::debug!(action = %action.describe(), "dispatching");

        let reply = match self.controller.send(&action).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(action = %action.describe(), error = %e, "command failed");
                self.notifier.notify(Notification::Failure);
                return Outcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        // Accepted: let the poll race ahead while the body is still in flight
        let woke = self.wake.trigger();
        tracing::trace!(woke, "refresh wake requested");

        match reply.message().await {
            Ok(message) => {
                tracing::info!(action = %action.describe(), %message, "command accepted");
                self.notifier.notify(Notification::Success(message.clone()));
                Outcome::Succeeded { message }
            }
            Err(e) => {
                tracing::error!(action = %action.describe(), error = %e, "unreadable command reply");
                self.notifier.notify(Notification::Failure);
                Outcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The toggle as of the last rendered snapshot
    pub fn mode_toggle(&self) -> ModeToggle {
        *self.toggle.borrow()
    }

    /// Dispatch `Set` or `Unset` depending on the last rendered snapshot.
    ///
    /// Returns `None` without sending anything while no snapshot has been
    /// rendered yet.
    pub async fn toggle_mode(&self) -> Option<Outcome> {
        let action = match self.mode_toggle() {
            ModeToggle::Pending => {
                tracing::debug!("mode toggle ignored before first render");
                return None;
            }
            ModeToggle::Set => Action::Set,
            ModeToggle::Unset => Action::Unset,
        };
        Some(self.dispatch(action).await)
    }
}
