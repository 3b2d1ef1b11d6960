use std::io::Write;

use tokio::sync::{mpsc, watch};

use orchctl_core::controller::{FAILURE_NOTICE, Notification, Notifier, Presenter};
use orchctl_core::view::GroupView;

/// Format grouped processes as a plain-text table, one group section at a time
pub fn format_groups(groups: &[GroupView]) -> Vec<String> {
    if groups.is_empty() {
        return vec!["No processes set on the orchestrator.".to_string()];
    }

    let mut lines = vec![format!(
        "{:<24} {:>8}  {:<8} {:<12} {}",
        "NAME", "PID", "STATUS", "RESTART", "ID"
    )];

    for group in groups {
        lines.push(format!(
            "[{}] {}/{} running",
            group.group_key,
            group.running_count(),
            group.len()
        ));
        for p in &group.members {
            lines.push(format!(
                "{:<24} {:>8}  {:<8} {:<12} {}",
                fit(&p.name, 24),
                p.pid,
                p.status_label(),
                p.auto_restart.to_string(),
                p.id
            ));
        }
    }

    lines
}

/// Truncate `s` to `width` chars, marking the cut with an ellipsis
pub fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Prints every render to stdout (used by `orchctl watch`)
pub struct StdoutPresenter;

impl Presenter for StdoutPresenter {
    fn render(&self, groups: &[GroupView]) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out);
        for line in format_groups(groups) {
            let _ = writeln!(out, "{}", line);
        }
        let _ = out.flush();
    }
}

/// Prints notifications: messages to stdout, failures to stderr
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(message) => println!("{}", message),
            Notification::Failure => eprintln!("{}", FAILURE_NOTICE),
        }
    }
}

/// Forwards renders to the dashboard, keeping only the newest snapshot
pub struct ChannelPresenter {
    tx: watch::Sender<Vec<GroupView>>,
}

impl ChannelPresenter {
    pub fn channel() -> (Self, watch::Receiver<Vec<GroupView>>) {
        let (tx, rx) = watch::channel(Vec::new());
        (Self { tx }, rx)
    }
}

impl Presenter for ChannelPresenter {
    fn render(&self, groups: &[GroupView]) {
        self.tx.send_replace(groups.to_vec());
    }
}

/// Forwards notifications to the dashboard's footer
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}
