//! Raw activity ingestion: auth (logon) and device event tables.
//! Shared event types; the tolerant CSV reader lives in [`loader`].

mod explore;
mod loader;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use explore::{profile_dir, profile_file, SourceProfile};
pub use loader::{EventLoader, LoadReport, LoadedEvents, RawTable};

/// Which activity domain a table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Auth,
    Device,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Auth => "auth",
            EventSource::Device => "device",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Logon,
    Logoff,
    Connect,
    Disconnect,
    Other(String),
}

impl Activity {
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("logon") {
            Activity::Logon
        } else if s.eq_ignore_ascii_case("logoff") {
            Activity::Logoff
        } else if s.eq_ignore_ascii_case("connect") {
            Activity::Connect
        } else if s.eq_ignore_ascii_case("disconnect") {
            Activity::Disconnect
        } else {
            Activity::Other(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Activity::Logon => "Logon",
            Activity::Logoff => "Logoff",
            Activity::Connect => "Connect",
            Activity::Disconnect => "Disconnect",
            Activity::Other(s) => s,
        }
    }

    /// Case-insensitive match against a configured activity name
    pub fn matches(&self, name: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(name.trim())
    }
}

/// One row of a raw activity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user: String,
    pub timestamp: NaiveDateTime,
    pub activity: Activity,
    pub source: EventSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pc: Option<String>,
}

impl RawEvent {
    pub fn new(
        user: impl Into<String>,
        timestamp: NaiveDateTime,
        activity: Activity,
        source: EventSource,
    ) -> Self {
        Self {
            id: None,
            user: user.into(),
            timestamp,
            activity,
            source,
            pc: None,
        }
    }
}
