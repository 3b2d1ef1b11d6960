use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;

use crate::controller::{Action, Controller, LogPage, PendingReply};
use crate::error::ClientError;
use crate::logs::split_page;
use crate::model::{LogStream, ProcessRecord};

/// Body of every control endpoint reply
#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

/// `Controller` backed by the orchestrator's HTTP API
#[derive(Clone, Debug)]
pub struct HttpController {
    client: Client,
    base: Url,
}

impl HttpController {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base = normalize_base(base_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::transport(format!("bad endpoint {}: {}", path, e)))
    }
}

/// Parse the base URL and make sure relative endpoints join below it
fn normalize_base(base_url: &str) -> Result<Url, ClientError> {
    let mut base = Url::parse(base_url)
        .map_err(|e| ClientError::transport(format!("invalid base url {}: {}", base_url, e)))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

/// Turn a non-success status into `ClientError::Status`
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        code: status.as_u16(),
        body: body.trim().to_string(),
    })
}

/// Classify an `/execlogs` response.
///
/// The orchestrator reports both "offset out of range" and, for a process
/// that never wrote a log, "no logs found" through an error status; both
/// mean there is nothing more to read.
pub fn classify_log_response(code: u16, body: &str) -> LogPage {
    if (200..300).contains(&code) {
        return LogPage::Lines(split_page(body));
    }

    let lower = body.to_lowercase();
    if lower.contains("offset out of range") || lower.contains("no logs found") {
        LogPage::Exhausted
    } else {
        LogPage::Failed(ClientError::Status {
            code,
            body: body.trim().to_string(),
        })
    }
}

#[async_trait]
impl Controller for HttpController {
    async fn status(&self) -> Result<Vec<ProcessRecord>, ClientError> {
        let resp = self.client.get(self.endpoint("status")?).send().await?;
        let records = check(resp).await?.json::<Vec<ProcessRecord>>().await?;
        Ok(records)
    }

    async fn send(&self, action: &Action) -> Result<PendingReply, ClientError> {
        let mut request = self.client.get(self.endpoint(action.endpoint())?);
        if let Some((key, value)) = action.query() {
            request = request.query(&[(key, value)]);
        }

        let resp = check(request.send().await?).await?;

        Ok(PendingReply::new(Box::pin(async move {
            let body: MessageBody = resp.json().await?;
            Ok::<_, ClientError>(body.message)
        })))
    }

    async fn log_page(&self, id: &str, stream: LogStream, offset: usize) -> LogPage {
        let url = match self.endpoint("execlogs") {
            Ok(url) => url,
            Err(e) => return LogPage::Failed(e),
        };
        let offset = offset.to_string();

        let sent = self
            .client
            .get(url)
            .query(&[("id", id), ("type", stream.as_query()), ("offset", offset.as_str())])
            .send()
            .await;

        let resp = match sent {
            Ok(resp) => resp,
            Err(e) => return LogPage::Failed(e.into()),
        };
        let code = resp.status().as_u16();

        match resp.text().await {
            Ok(body) => classify_log_response(code, &body),
            Err(e) => LogPage::Failed(e.into()),
        }
    }
}
