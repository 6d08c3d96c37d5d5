use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSONL record of one session's logins and operations.
/// Passwords are never written.
pub struct Transcript {
    pub path: Option<PathBuf>,
    session_id: String,
    file: Option<File>,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Transcript {
    pub fn new(path: &Path, session_id: &str) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            session_id: session_id.to_string(),
            file: Some(file),
        })
    }

    /// A transcript that records nothing
    pub fn disabled(session_id: &str) -> Self {
        Self {
            path: None,
            session_id: session_id.to_string(),
            file: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    pub fn session_start(&mut self, data_dir: &Path) -> Result<()> {
        self.log(
            "session_start",
            serde_json::json!({ "data_dir": data_dir }),
        )
    }

    pub fn login_ok(&mut self, username: &str, role: &str) -> Result<()> {
        self.log(
            "login_ok",
            serde_json::json!({ "username": username, "role": role }),
        )
    }

    pub fn login_failed(&mut self, username: &str) -> Result<()> {
        self.log("login_failed", serde_json::json!({ "username": username }))
    }

    /// Log the result of an operation that was allowed to run
    pub fn operation(&mut self, op: &str, ok: bool, error: Option<&str>) -> Result<()> {
        self.log(
            "operation",
            serde_json::json!({
                "operation": op,
                "ok": ok,
                "error": error,
            }),
        )
    }

    /// Log a known operation rejected by policy
    pub fn denied(&mut self, op: &str) -> Result<()> {
        self.log("denied", serde_json::json!({ "operation": op }))
    }

    pub fn logout(&mut self, username: &str) -> Result<()> {
        self.log("logout", serde_json::json!({ "username": username }))
    }
}
