use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::error::ClientError;
use crate::model::{GroupKey, LogStream, ProcessId, ProcessRecord};
use crate::view::GroupView;

/// Control actions a user can issue against the orchestrator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Start one process
    Start { id: ProcessId },
    /// Stop one process
    Stop { id: ProcessId },
    /// Start every process in a group
    StartGroup { group: GroupKey },
    /// Stop every process in a group
    StopGroup { group: GroupKey },
    StartAll,
    StopAll,
    /// Load the executables definition on the orchestrator
    Set,
    /// Drop the executables definition (all processes must be stopped)
    Unset,
}

impl Action {
    /// Endpoint path of the command, relative to the orchestrator base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Start { .. } => "run",
            Self::Stop { .. } => "stop",
            Self::StartGroup { .. } => "rungroup",
            Self::StopGroup { .. } => "stopgroup",
            Self::StartAll => "runall",
            Self::StopAll => "stopall",
            Self::Set => "set",
            Self::Unset => "unset",
        }
    }

    pub fn query(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::Start { id } | Self::Stop { id } => Some(("id", id)),
            Self::StartGroup { group } | Self::StopGroup { group } => Some(("group", group)),
            Self::StartAll | Self::StopAll | Self::Set | Self::Unset => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Start { id } => format!("start {}", id),
            Self::Stop { id } => format!("stop {}", id),
            Self::StartGroup { group } => format!("start group {}", group),
            Self::StopGroup { group } => format!("stop group {}", group),
            Self::StartAll => "start all".into(),
            Self::StopAll => "stop all".into(),
            Self::Set => "set".into(),
            Self::Unset => "unset".into(),
        }
    }
}

/// The body of an accepted command, not yet read.
///
/// Returned as soon as the orchestrator has answered with a success status so
/// the caller can react before the body arrives.
pub struct PendingReply {
    body: BoxFuture<'static, Result<String, ClientError>>,
}

impl PendingReply {
    pub fn new(body: BoxFuture<'static, Result<String, ClientError>>) -> Self {
        Self { body }
    }

    /// A reply whose message is already known
    pub fn ready(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(Box::pin(async move { Ok::<_, ClientError>(message) }))
    }

    /// Read the body and extract its `message` field
    pub async fn message(self) -> Result<String, ClientError> {
        self.body.await
    }
}

impl std::fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReply").finish_non_exhaustive()
    }
}

/// Outcome of reading one page of a process log
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogPage {
    /// Lines of the page, oldest first
    Lines(Vec<String>),
    /// The requested offset is past the start of the log
    Exhausted,
    Failed(ClientError),
}

/// The orchestrator's HTTP control surface.
///
/// Implementations:
/// - `HttpController`: talks to a real orchestrator (feature `http`)
/// - `FakeController`: scripted responses for tests
#[async_trait]
pub trait Controller: Send + Sync {
    /// Fetch the current snapshot (`/status`)
    async fn status(&self) -> Result<Vec<ProcessRecord>, ClientError>;

    /// Issue a control command.
    ///
    /// Resolves once the status line is in; a non-success status is an error.
    async fn send(&self, action: &Action) -> Result<PendingReply, ClientError>;

    /// Read the page of `stream` that ends `offset` lines before the newest entry
    async fn log_page(&self, id: &str, stream: LogStream, offset: usize) -> LogPage;
}

/// Receives grouped snapshots to draw
pub trait Presenter: Send + Sync {
    fn render(&self, groups: &[GroupView]);
}

/// Generic notice shown when a command could not be carried out
pub const FAILURE_NOTICE: &str = "Error executing the request, see logs for more details";

/// User-facing result of one dispatched action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure,
}

impl Notification {
    pub fn text(&self) -> &str {
        match self {
            Self::Success(message) => message,
            Self::Failure => FAILURE_NOTICE,
        }
    }
}

/// Receives one notification per dispatched action
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
