use std::sync::Arc;

use crate::controller::{Controller, LogPage};
use crate::error::LogFetchError;
use crate::model::{LogLine, LogStream};

/// Split a text/plain log page into lines.
///
/// A single trailing newline does not produce an empty last line.
pub fn split_page(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Reads a whole process log by walking backward from its newest page.
///
/// Each request asks for the page ending `offset` lines before the newest
/// entry, where `offset` is the number of lines already read. Requests are
/// strictly sequential since every offset depends on the previous page.
pub struct LogPager {
    controller: Arc<dyn Controller>,
}

impl LogPager {
    pub fn new(controller: Arc<dyn Controller>) -> Self {
        Self { controller }
    }

    /// The full errors log of a process, oldest line first
    pub async fn fetch_all_logs(&self, id: &str) -> Result<Vec<LogLine>, LogFetchError> {
        self.fetch_stream(id, LogStream::Errors).await
    }

    pub async fn fetch_stream(
        &self,
        id: &str,
        stream: LogStream,
    ) -> Result<Vec<LogLine>, LogFetchError> {
        // Pages arrive newest first; stitched back together at the end
        let mut pages: Vec<Vec<String>> = Vec::new();
        let mut offset = 0usize;

        loop {
            match self.controller.log_page(id, stream, offset).await {
                LogPage::Lines(lines) if lines.is_empty() => {
                    tracing::warn!(id, %stream, offset, "empty log page, giving up");
                    return Err(LogFetchError::EmptyPage {
                        offset,
                        partial: assemble(pages, stream),
                    });
                }
                LogPage::Lines(lines) => {
                    tracing::trace!(id, %stream, offset, lines = lines.len(), "log page");
                    offset += lines.len();
                    pages.push(lines);
                }
                LogPage::Exhausted => {
                    tracing::debug!(id, %stream, total = offset, "log fully read");
                    return Ok(assemble(pages, stream));
                }
                LogPage::Failed(source) => {
                    tracing::warn!(id, %stream, offset, error = %source, "log page failed");
                    return Err(LogFetchError::Transport {
                        offset,
                        source,
                        partial: assemble(pages, stream),
                    });
                }
            }
        }
    }
}

fn assemble(pages: Vec<Vec<String>>, stream: LogStream) -> Vec<LogLine> {
    pages
        .into_iter()
        .rev()
        .flatten()
        .map(|message| LogLine { stream, message })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::testing::FakeController;

    fn messages(lines: &[LogLine]) -> Vec<String> {
        lines.iter().map(|l| l.message.clone()).collect()
    }

    /// A log of `total` lines "line-0".."line-{total-1}", served in pages
    /// of the given sizes from the newest end.
    fn paged_log(controller: &FakeController, sizes: &[usize]) -> Vec<String> {
        let total: usize = sizes.iter().sum();
        let all: Vec<String> = (0..total).map(|i| format!("line-{}", i)).collect();

        let mut end = total;
        for &size in sizes {
            let page = all[end - size..end].to_vec();
            controller.push_log_page(LogPage::Lines(page));
            end -= size;
        }
        controller.push_log_page(LogPage::Exhausted);
        all
    }

    #[tokio::test]
    async fn test_pages_stitched_in_chronological_order() {
        let controller = Arc::new(FakeController::new());
        let expected = paged_log(&controller, &[3, 3, 3, 1]);
        let pager = LogPager::new(controller.clone());

        let lines = pager.fetch_all_logs("p1").await.unwrap();

        assert_eq!(lines.len(), 10);
        assert_eq!(messages(&lines), expected);
        assert!(lines.iter().all(|l| l.stream == LogStream::Errors));
        assert_eq!(controller.log_offsets(), vec![0, 3, 6, 9, 10]);
    }

    #[tokio::test]
    async fn test_empty_log_is_not_an_error() {
        let controller = Arc::new(FakeController::new());
        controller.push_log_page(LogPage::Exhausted);
        let pager = LogPager::new(controller.clone());

        let lines = pager.fetch_all_logs("p1").await.unwrap();

        assert!(lines.is_empty());
        assert_eq!(controller.log_offsets(), vec![0]);
    }

    #[tokio::test]
    async fn test_empty_page_stops_the_walk() {
        let controller = Arc::new(FakeController::new());
        controller.push_log_page(LogPage::Lines(vec!["b".into(), "c".into()]));
        controller.push_log_page(LogPage::Lines(Vec::new()));
        controller.push_log_page(LogPage::Lines(vec!["never".into()]));
        let pager = LogPager::new(controller.clone());

        let err = pager.fetch_all_logs("p1").await.unwrap_err();

        assert!(matches!(err, LogFetchError::EmptyPage { offset: 2, .. }));
        assert_eq!(messages(err.partial()), vec!["b", "c"]);
        assert_eq!(controller.log_offsets(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_partial_log() {
        let controller = Arc::new(FakeController::new());
        controller.push_log_page(LogPage::Lines(vec!["3".into(), "4".into()]));
        controller.push_log_page(LogPage::Lines(vec!["1".into(), "2".into()]));
        controller.push_log_page(LogPage::Failed(ClientError::transport("reset by peer")));
        let pager = LogPager::new(controller);

        let err = pager.fetch_stream("p1", LogStream::Out).await.unwrap_err();

        match err {
            LogFetchError::Transport { offset, partial, .. } => {
                assert_eq!(offset, 4);
                assert_eq!(messages(&partial), vec!["1", "2", "3", "4"]);
                assert!(partial.iter().all(|l| l.stream == LogStream::Out));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_split_page() {
        assert_eq!(split_page("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_page("a\r\n\nb"), vec!["a", "", "b"]);
        assert!(split_page("").is_empty());
    }
}
