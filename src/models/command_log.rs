use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandLogStatus {
    Running,
    Completed,
    Failed,
}

impl CommandLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandLogStatus::Running => "running",
            CommandLogStatus::Completed => "completed",
            CommandLogStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(CommandLogStatus::Running),
            "completed" => Some(CommandLogStatus::Completed),
            "failed" => Some(CommandLogStatus::Failed),
            _ => None,
        }
    }
}

/// A persisted record of one wrapped command run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandLog {
    pub id: i64,
    pub command: String,
    pub cmd_options: Option<String>,
    pub status: CommandLogStatus,
    pub log: Option<String>,
    pub started: DateTime<Utc>,
    pub completed: Option<DateTime<Utc>>,
}
