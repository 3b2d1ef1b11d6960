use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tokio::sync::{mpsc, watch};

use orchctl_core::controller::{Action, Controller, Notification};
use orchctl_core::dispatch::Dispatcher;
use orchctl_core::error::LogFetchError;
use orchctl_core::logs::LogPager;
use orchctl_core::model::{LogLine, LogStream, ProcessRecord};
use orchctl_core::scheduler::RefreshScheduler;
use orchctl_core::view::{GroupView, ModeToggle};

use crate::presenter::{ChannelNotifier, ChannelPresenter, fit};
use crate::ui::styles;

// --- Terminal setup/teardown ---
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[derive(Debug)]
enum LogState {
    Loading,
    Loaded(Vec<LogLine>),
    /// The walk stopped early; what was read is still shown
    Partial { lines: Vec<LogLine>, error: String },
}

#[derive(Debug)]
struct LogPanel {
    id: String,
    name: String,
    stream: LogStream,
    state: LogState,
    /// Lines scrolled up from the tail
    from_bottom: usize,
}

impl LogPanel {
    fn loading(id: String, name: String, stream: LogStream) -> Self {
        Self {
            id,
            name,
            stream,
            state: LogState::Loading,
            from_bottom: 0,
        }
    }

    fn line_count(&self) -> usize {
        match &self.state {
            LogState::Loading => 0,
            LogState::Loaded(lines) => lines.len(),
            LogState::Partial { lines, .. } => lines.len() + 1,
        }
    }
}

/// A finished log fetch, tagged with what was asked for
#[derive(Debug)]
struct LogResult {
    id: String,
    stream: LogStream,
    result: Result<Vec<LogLine>, LogFetchError>,
}

#[derive(Debug, Default)]
struct Dashboard {
    groups: Vec<GroupView>,
    /// Index into the flattened process list
    selected: usize,
    toggle: ModeToggle,
    notice: Option<Notification>,
    refreshed: bool,
    logs: Option<LogPanel>,
}

impl Dashboard {
    fn processes(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.groups.iter().flat_map(|g| g.members.iter())
    }

    fn selected_process(&self) -> Option<&ProcessRecord> {
        self.processes().nth(self.selected)
    }

    fn set_groups(&mut self, groups: Vec<GroupView>) {
        self.groups = groups;
        self.refreshed = true;
        let count = self.processes().count();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    fn move_selection(&mut self, down: bool) {
        let count = self.processes().count();
        if count == 0 {
            return;
        }
        self.selected = if down {
            (self.selected + 1).min(count - 1)
        } else {
            self.selected.saturating_sub(1)
        };
    }

    fn apply_logs(&mut self, fetched: LogResult) {
        let Some(panel) = &mut self.logs else { return };
        if panel.id != fetched.id || panel.stream != fetched.stream {
            return;
        }
        panel.state = match fetched.result {
            Ok(lines) => LogState::Loaded(lines),
            Err(e) => LogState::Partial {
                error: e.to_string(),
                lines: e.into_partial(),
            },
        };
    }
}

#[derive(Debug, PartialEq, Eq)]
enum UiCommand {
    Quit,
    Up,
    Down,
    Dispatch(Action),
    ToggleMode,
    OpenLogs {
        id: String,
        name: String,
        stream: LogStream,
    },
    SwitchStream,
    CloseLogs,
    ScrollUp,
    ScrollDown,
}

fn command_for_key(key: KeyEvent, dash: &Dashboard) -> Option<UiCommand> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiCommand::Quit);
    }

    if dash.logs.is_some() {
        return match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(UiCommand::CloseLogs),
            KeyCode::Char('o') => Some(UiCommand::SwitchStream),
            KeyCode::Up | KeyCode::Char('k') => Some(UiCommand::ScrollUp),
            KeyCode::Down | KeyCode::Char('j') => Some(UiCommand::ScrollDown),
            _ => None,
        };
    }

    let selected = dash.selected_process();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(UiCommand::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(UiCommand::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(UiCommand::Down),
        KeyCode::Char('s') => selected.map(|p| UiCommand::Dispatch(Action::Start { id: p.id.clone() })),
        KeyCode::Char('x') => selected.map(|p| UiCommand::Dispatch(Action::Stop { id: p.id.clone() })),
        KeyCode::Char('g') => selected.map(|p| {
            UiCommand::Dispatch(Action::StartGroup {
                group: p.group.clone(),
            })
        }),
        KeyCode::Char('G') => selected.map(|p| {
            UiCommand::Dispatch(Action::StopGroup {
                group: p.group.clone(),
            })
        }),
        KeyCode::Char('a') => Some(UiCommand::Dispatch(Action::StartAll)),
        KeyCode::Char('A') => Some(UiCommand::Dispatch(Action::StopAll)),
        KeyCode::Char('t') if dash.toggle.is_enabled() => Some(UiCommand::ToggleMode),
        KeyCode::Char('l') => selected.map(|p| UiCommand::OpenLogs {
            id: p.id.clone(),
            name: p.name.clone(),
            stream: LogStream::Errors,
        }),
        _ => None,
    }
}

fn spawn_log_fetch(
    pager: Arc<LogPager>,
    id: String,
    stream: LogStream,
    tx: mpsc::UnboundedSender<LogResult>,
) {
    tokio::spawn(async move {
        let result = pager.fetch_stream(&id, stream).await;
        let _ = tx.send(LogResult { id, stream, result });
    });
}

/// Run the dashboard until the user quits
pub async fn run(controller: Arc<dyn Controller>, interval: Duration) -> io::Result<()> {
    let (presenter, views) = ChannelPresenter::channel();
    let (notifier, notices) = ChannelNotifier::channel();

    let scheduler =
        RefreshScheduler::new(controller.clone(), Arc::new(presenter)).with_interval(interval);
    let dispatcher = Arc::new(scheduler.dispatcher(Arc::new(notifier)));
    let toggle = scheduler.mode_toggle();
    let pager = Arc::new(LogPager::new(controller));

    let refresh = tokio::spawn(scheduler.run());

    let mut terminal = setup_terminal()?;
    let result = tui_loop(&mut terminal, views, notices, toggle, dispatcher, pager).await;

    refresh.abort();
    restore_terminal(terminal)?;
    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut views: watch::Receiver<Vec<GroupView>>,
    mut notices: mpsc::UnboundedReceiver<Notification>,
    toggle: watch::Receiver<ModeToggle>,
    dispatcher: Arc<Dispatcher>,
    pager: Arc<LogPager>,
) -> io::Result<()> {
    let mut dash = Dashboard::default();
    let mut list_state = ListState::default();
    let (log_tx, mut log_rx) = mpsc::unbounded_channel();

    loop {
        if views.has_changed().unwrap_or(false) {
            let groups = views.borrow_and_update().clone();
            dash.set_groups(groups);
        }
        dash.toggle = *toggle.borrow();
        while let Ok(notice) = notices.try_recv() {
            dash.notice = Some(notice);
        }
        while let Ok(fetched) = log_rx.try_recv() {
            dash.apply_logs(fetched);
        }

        terminal.draw(|f| draw(f, &dash, &mut list_state))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(command) = command_for_key(key, &dash) else {
            continue;
        };

        match command {
            UiCommand::Quit => break,
            UiCommand::Up => dash.move_selection(false),
            UiCommand::Down => dash.move_selection(true),
            UiCommand::Dispatch(action) => {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch(action).await;
                });
            }
            UiCommand::ToggleMode => {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.toggle_mode().await;
                });
            }
            UiCommand::OpenLogs { id, name, stream } => {
                dash.logs = Some(LogPanel::loading(id.clone(), name, stream));
                spawn_log_fetch(pager.clone(), id, stream, log_tx.clone());
            }
            UiCommand::SwitchStream => {
                if let Some(panel) = &mut dash.logs {
                    let stream = match panel.stream {
                        LogStream::Errors => LogStream::Out,
                        LogStream::Out => LogStream::Errors,
                    };
                    let id = panel.id.clone();
                    *panel = LogPanel::loading(id.clone(), panel.name.clone(), stream);
                    spawn_log_fetch(pager.clone(), id, stream, log_tx.clone());
                }
            }
            UiCommand::CloseLogs => dash.logs = None,
            UiCommand::ScrollUp => {
                if let Some(panel) = &mut dash.logs {
                    panel.from_bottom = (panel.from_bottom + 1).min(panel.line_count());
                }
            }
            UiCommand::ScrollDown => {
                if let Some(panel) = &mut dash.logs {
                    panel.from_bottom = panel.from_bottom.saturating_sub(1);
                }
            }
        }
    }

    Ok(())
}

fn draw(f: &mut Frame, dash: &Dashboard, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let summary = if dash.refreshed {
        format!(
            "{} processes in {} groups",
            dash.processes().count(),
            dash.groups.len()
        )
    } else {
        "connecting…".to_string()
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" orchctl ", styles::section_header()),
            Span::styled(summary, styles::text_dim()),
        ])),
        chunks[0],
    );

    match &dash.logs {
        Some(panel) => draw_logs(f, panel, chunks[1]),
        None => draw_processes(f, dash, list_state, chunks[1]),
    }

    let notice = match &dash.notice {
        Some(n @ Notification::Success(_)) => Span::styled(n.text().to_string(), styles::success()),
        Some(n @ Notification::Failure) => Span::styled(n.text().to_string(), styles::error()),
        None => Span::raw(""),
    };
    f.render_widget(Paragraph::new(Line::from(vec![Span::raw(" "), notice])), chunks[2]);

    f.render_widget(Paragraph::new(key_hints(dash)), chunks[3]);
}

fn draw_processes(f: &mut Frame, dash: &Dashboard, list_state: &mut ListState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(" Processes ");

    if !dash.refreshed || dash.groups.is_empty() {
        let text = if dash.refreshed {
            "No processes set. Press t to set the orchestrator."
        } else {
            "Waiting for the first refresh…"
        };
        f.render_widget(
            Paragraph::new(Span::styled(text, styles::text_muted())).block(block),
            area,
        );
        return;
    }

    let mut items: Vec<ListItem> = Vec::new();
    let mut selected_row = None;
    let mut index = 0usize;

    for group in &dash.groups {
        items.push(ListItem::new(Line::from(vec![
            Span::styled(format!("▸ {}", group.group_key), styles::section_header()),
            Span::styled(
                format!("  {}/{} running", group.running_count(), group.len()),
                styles::text_dim(),
            ),
        ])));

        for p in &group.members {
            if index == dash.selected {
                selected_row = Some(items.len());
            }
            index += 1;

            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("  {} ", styles::running_icon(p.running)), styles::running(p.running)),
                Span::styled(format!("{:<24}", fit(&p.name, 24)), styles::text()),
                Span::styled(format!("{:>8}", p.pid), styles::text_dim()),
                Span::styled(format!("  {:<8}", p.status_label()), styles::running(p.running)),
                Span::styled(format!("  restart: {:<10}", p.auto_restart.to_string()), styles::text_muted()),
                Span::styled(format!("  {}", p.id), styles::text_muted()),
            ])));
        }
    }

    list_state.select(selected_row);
    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selection());
    f.render_stateful_widget(list, area, list_state);
}

fn draw_logs(f: &mut Frame, panel: &LogPanel, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(format!(" {} · {} log ", panel.name, panel.stream));

    let mut lines: Vec<Line> = match &panel.state {
        LogState::Loading => vec![Line::from(Span::styled("Loading…", styles::text_muted()))],
        LogState::Loaded(log) if log.is_empty() => {
            vec![Line::from(Span::styled("(log is empty)", styles::text_muted()))]
        }
        LogState::Loaded(log) => log_lines(log),
        LogState::Partial { lines, .. } => log_lines(lines),
    };
    if let LogState::Partial { error, .. } = &panel.state {
        lines.push(Line::from(Span::styled(format!("[incomplete] {}", error), styles::error())));
    }

    let visible = area.height.saturating_sub(2) as usize;
    let top = scroll_top(lines.len(), visible, panel.from_bottom);

    f.render_widget(Paragraph::new(lines).block(block).scroll((top, 0)), area);
}

/// First visible row when `from_bottom` lines are scrolled up from the tail
fn scroll_top(total: usize, visible: usize, from_bottom: usize) -> u16 {
    let top = total.saturating_sub(visible).saturating_sub(from_bottom);
    u16::try_from(top).unwrap_or(u16::MAX)
}

fn log_lines(log: &[LogLine]) -> Vec<Line<'_>> {
    log.iter()
        .map(|l| Line::from(Span::styled(l.message.as_str(), styles::text())))
        .collect()
}

fn key_hints(dash: &Dashboard) -> Line<'static> {
    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(key, styles::key_hint()),
            Span::styled(label, styles::text_dim()),
        ]
    };

    let mut spans = vec![Span::raw(" ")];
    if dash.logs.is_some() {
        spans.extend(hint("↑↓", " scroll  "));
        spans.extend(hint("o", " out/errors  "));
        spans.extend(hint("esc", " close"));
        return Line::from(spans);
    }

    spans.extend(hint("s", " start  "));
    spans.extend(hint("x", " stop  "));
    spans.extend(hint("g/G", " group  "));
    spans.extend(hint("a/A", " all  "));
    if dash.toggle.is_enabled() {
        spans.push(Span::styled("t", styles::key_hint()));
        spans.push(Span::styled(format!(" {}  ", dash.toggle.label()), styles::text_dim()));
    } else {
        spans.push(Span::styled("t set/unset  ", styles::text_muted()));
    }
    spans.extend(hint("l", " logs  "));
    spans.extend(hint("q", " quit"));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchctl_core::model::AutoRestart;
    use orchctl_core::view::group_records;

    fn record(id: &str, group: &str) -> ProcessRecord {
        ProcessRecord {
            id: id.into(),
            name: format!("Service {}", id),
            pid: 1,
            running: true,
            auto_restart: AutoRestart::Flag(false),
            group: group.into(),
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn dashboard() -> Dashboard {
        let mut dash = Dashboard::default();
        dash.set_groups(group_records(&[record("a", "G1"), record("b", "G2"), record("c", "G1")]));
        dash
    }

    #[test]
    fn test_selection_walks_grouped_order() {
        let mut dash = dashboard();
        assert_eq!(dash.selected_process().unwrap().id, "a");
        dash.move_selection(true);
        assert_eq!(dash.selected_process().unwrap().id, "c");
        dash.move_selection(true);
        dash.move_selection(true);
        assert_eq!(dash.selected_process().unwrap().id, "b");

        dash.set_groups(group_records(&[record("a", "G1")]));
        assert_eq!(dash.selected, 0);
    }

    #[test]
    fn test_keys_map_to_actions() {
        let mut dash = dashboard();
        dash.move_selection(true);

        assert_eq!(
            command_for_key(key('x'), &dash),
            Some(UiCommand::Dispatch(Action::Stop { id: "c".into() }))
        );
        assert_eq!(
            command_for_key(key('G'), &dash),
            Some(UiCommand::Dispatch(Action::StopGroup { group: "G1".into() }))
        );
        assert_eq!(
            command_for_key(key('a'), &dash),
            Some(UiCommand::Dispatch(Action::StartAll))
        );
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), &dash),
            Some(UiCommand::Quit)
        );
    }

    #[test]
    fn test_toggle_key_disabled_until_first_render() {
        let mut dash = Dashboard::default();
        assert_eq!(command_for_key(key('t'), &dash), None);
        assert_eq!(command_for_key(key('s'), &dash), None);

        dash.toggle = ModeToggle::Set;
        assert_eq!(command_for_key(key('t'), &dash), Some(UiCommand::ToggleMode));
    }

    #[test]
    fn test_stale_log_results_ignored() {
        let mut dash = dashboard();
        dash.logs = Some(LogPanel::loading("a".into(), "Service a".into(), LogStream::Out));

        dash.apply_logs(LogResult {
            id: "a".into(),
            stream: LogStream::Errors,
            result: Ok(vec![]),
        });
        assert!(matches!(dash.logs.as_ref().unwrap().state, LogState::Loading));

        dash.apply_logs(LogResult {
            id: "a".into(),
            stream: LogStream::Out,
            result: Err(LogFetchError::EmptyPage {
                offset: 1,
                partial: vec![LogLine {
                    stream: LogStream::Out,
                    message: "boot".into(),
                }],
            }),
        });
        let panel = dash.logs.as_ref().unwrap();
        assert!(matches!(&panel.state, LogState::Partial { lines, .. } if lines.len() == 1));
        assert_eq!(panel.line_count(), 2);
    }

    #[test]
    fn test_log_view_keys() {
        let mut dash = dashboard();
        dash.logs = Some(LogPanel::loading("a".into(), "Service a".into(), LogStream::Errors));

        assert_eq!(command_for_key(key('q'), &dash), Some(UiCommand::CloseLogs));
        assert_eq!(command_for_key(key('o'), &dash), Some(UiCommand::SwitchStream));
        assert_eq!(command_for_key(key('x'), &dash), None);
    }

    #[test]
    fn test_scroll_top_follows_tail_and_clamps() {
        assert_eq!(scroll_top(10, 20, 0), 0);
        assert_eq!(scroll_top(100, 20, 0), 80);
        assert_eq!(scroll_top(100, 20, 30), 50);
        assert_eq!(scroll_top(100, 20, 500), 0);
        // Longer than a u16 can address: pinned instead of wrapping
        assert_eq!(scroll_top(70_000, 20, 0), u16::MAX);
        assert_eq!(scroll_top(70_000, 20, 69_000), 980);
    }
}
