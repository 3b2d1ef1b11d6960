use serde::{Deserialize, Deserializer, Serialize};

pub type ProcessId = String;
pub type GroupKey = String;

/// Auto-restart setting as reported by the orchestrator.
///
/// Older orchestrator builds report a plain flag; others send a policy name.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AutoRestart {
    Flag(bool),
    Text(String),
}

impl std::fmt::Display for AutoRestart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{}", flag),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

/// One supervised process, as seen in a single `/status` snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub name: String,
    pub pid: i64,
    pub running: bool,
    pub auto_restart: AutoRestart,
    #[serde(deserialize_with = "group_key")]
    pub group: GroupKey,
}

impl ProcessRecord {
    pub fn status_label(&self) -> &'static str {
        if self.running { "Running" } else { "Stopped" }
    }
}

/// Accepts the group either as a string or as an integer.
fn group_key<'de, D>(deserializer: D) -> Result<GroupKey, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawGroup {
        Text(String),
        Number(i64),
    }

    Ok(match RawGroup::deserialize(deserializer)? {
        RawGroup::Text(text) => text,
        RawGroup::Number(n) => n.to_string(),
    })
}

/// Which log file of a process to read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Out,
    #[default]
    Errors,
}

impl LogStream {
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::Errors => "errors",
        }
    }
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query())
    }
}

impl std::str::FromStr for LogStream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "out" => Ok(Self::Out),
            "errors" => Ok(Self::Errors),
            other => Err(format!("unknown log stream '{}', expected out or errors", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub stream: LogStream,
    pub message: String,
}
