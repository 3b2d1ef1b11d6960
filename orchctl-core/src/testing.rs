//! Scripted controller and recording ports for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::controller::{
    Action, Controller, LogPage, Notification, Notifier, PendingReply, Presenter,
};
use crate::error::ClientError;
use crate::model::{AutoRestart, LogStream, ProcessRecord};
use crate::scheduler::WakeHandle;
use crate::view::GroupView;

pub fn process(id: &str, group: &str) -> ProcessRecord {
    ProcessRecord {
        id: id.to_string(),
        name: format!("Service {}", id),
        pid: 4000,
        running: true,
        auto_restart: AutoRestart::Flag(true),
        group: group.to_string(),
    }
}

/// Scripted answer to one `send`
pub enum SentReply {
    Accepted(String),
    /// Accepted; records whether the wake slot was still armed when the body was read
    Observed { message: String, wake: WakeHandle },
    /// Non-success status or transport failure
    Rejected(ClientError),
    /// Success status with a body that fails to decode
    Garbled(ClientError),
}

impl SentReply {
    pub fn observed(message: &str, wake: WakeHandle) -> Self {
        Self::Observed {
            message: message.to_string(),
            wake,
        }
    }
}

/// Serves queued responses in order; falls back to an empty snapshot,
/// an accepted reply and an exhausted log once a queue runs dry.
#[derive(Default)]
pub struct FakeController {
    statuses: Mutex<VecDeque<Result<Vec<ProcessRecord>, ClientError>>>,
    replies: Mutex<VecDeque<SentReply>>,
    pages: Mutex<VecDeque<LogPage>>,
    sent: Mutex<Vec<Action>>,
    offsets: Mutex<Vec<usize>>,
    armed_when_body_read: Arc<Mutex<Vec<bool>>>,
}

impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, status: Result<Vec<ProcessRecord>, ClientError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn push_reply(&self, reply: SentReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_log_page(&self, page: LogPage) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn sent(&self) -> Vec<Action> {
        self.sent.lock().unwrap().clone()
    }

    pub fn log_offsets(&self) -> Vec<usize> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn armed_when_body_read(&self) -> Vec<bool> {
        self.armed_when_body_read.lock().unwrap().clone()
    }
}

#[async_trait]
impl Controller for FakeController {
    async fn status(&self) -> Result<Vec<ProcessRecord>, ClientError> {
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send(&self, action: &Action) -> Result<PendingReply, ClientError> {
        self.sent.lock().unwrap().push(action.clone());
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            None => Ok(PendingReply::ready("ok")),
            Some(SentReply::Accepted(message)) => Ok(PendingReply::ready(message)),
            Some(SentReply::Observed { message, wake }) => {
                let seen = self.armed_when_body_read.clone();
                Ok(PendingReply::new(Box::pin(async move {
                    seen.lock().unwrap().push(wake.is_armed());
                    Ok::<_, ClientError>(message)
                })))
            }
            Some(SentReply::Rejected(e)) => Err(e),
            Some(SentReply::Garbled(e)) => {
                Ok(PendingReply::new(Box::pin(async move { Err::<String, _>(e) })))
            }
        }
    }

    async fn log_page(&self, _id: &str, _stream: LogStream, offset: usize) -> LogPage {
        self.offsets.lock().unwrap().push(offset);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(LogPage::Exhausted)
    }
}

/// Records the group keys of every render
#[derive(Default)]
pub struct RecordingPresenter {
    renders: Mutex<Vec<Vec<String>>>,
}

impl RecordingPresenter {
    pub fn renders(&self) -> Vec<Vec<String>> {
        self.renders.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&self, groups: &[GroupView]) {
        let keys = groups.iter().map(|g| g.group_key.clone()).collect();
        self.renders.lock().unwrap().push(keys);
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}
