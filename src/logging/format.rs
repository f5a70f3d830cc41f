//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::monitor::{Alert, AlertBatch, AlertTime};
use crate::threat::ThreatLevel;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// One alert, flattened with its batch context
#[derive(Serialize)]
pub struct AlertRecord<'a> {
    pub ts: String,
    pub tick: u64,
    pub user: &'a str,
    pub at: AlertTime,
    pub logins_per_day: u32,
    pub device_connections: u32,
    pub threat_level: ThreatLevel,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_check: Option<ThreatLevel>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl<'a> AlertRecord<'a> {
    pub fn new(batch: &AlertBatch, alert: &'a Alert) -> Self {
        Self {
            ts: batch.generated_at.to_rfc3339(),
            tick: batch.tick,
            user: &alert.user,
            at: alert.at,
            logins_per_day: alert.logins_per_day,
            device_connections: alert.device_connections,
            threat_level: alert.threat_level,
            status: alert.threat_level.as_str(),
            cross_check: alert.cross_check,
            degraded: batch.degraded,
        }
    }
}

/// Initialize tracing, JSON or compact text
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber on stderr, level from RUST_LOG or default.
    /// Stdout stays free for alert output.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single structured line (e.g. one alert) without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(w, "{}", line)
    }
}
