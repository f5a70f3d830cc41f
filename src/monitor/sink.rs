//! Console and ndjson presentation of alert batches.

use super::{Alert, AlertBatch, AlertSink, AlertTime, PresentResult};
use crate::logging::{AlertRecord, StructuredLogger};
use crate::threat::ThreatLevel;
use colored::{ColoredString, Colorize};
use std::io::Write;

fn status(level: ThreatLevel) -> ColoredString {
    match level {
        ThreatLevel::Normal => "Normal".green(),
        ThreatLevel::Warning => "Warning".yellow(),
        ThreatLevel::Critical => "CRITICAL".red().bold(),
    }
}

/// `Logins: NN | Devices: N | Status: <level>`, prefixed with user and day for stored rows.
pub fn format_alert(alert: &Alert) -> String {
    let body = format!(
        "Logins: {:2} | Devices: {} | Status: {}",
        alert.logins_per_day,
        alert.device_connections,
        status(alert.threat_level)
    );
    match alert.at {
        AlertTime::Day(date) => format!("{:<10} {} | {}", alert.user, date, body),
        AlertTime::Instant(_) => body,
    }
}

/// Human-readable output. Synthetic batches print one line per sample.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> AlertSink for ConsoleSink<W> {
    fn present(&mut self, batch: &AlertBatch) -> PresentResult {
        let historical = batch
            .alerts
            .iter()
            .any(|a| matches!(a.at, AlertTime::Day(_)));

        if historical || batch.trend.is_some() {
            write!(self.out, "-- tick {} | live threat detection", batch.tick)?;
            if batch.degraded {
                write!(self.out, " (nothing at alert floor; showing all levels)")?;
            }
            writeln!(self.out)?;
        }
        for alert in &batch.alerts {
            writeln!(self.out, "{}", format_alert(alert))?;
        }
        if let Some(trend) = &batch.trend {
            match trend.delta {
                Some(delta) => writeln!(
                    self.out,
                    "Current threat index: {:.1} ({:+.1} from yesterday)",
                    trend.current, delta
                )?,
                None => writeln!(self.out, "Current threat index: {:.1}", trend.current)?,
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

/// One [`AlertRecord`] per line.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AlertSink for JsonSink<W> {
    fn present(&mut self, batch: &AlertBatch) -> PresentResult {
        for alert in &batch.alerts {
            StructuredLogger::emit_json(&AlertRecord::new(batch, alert), &mut self.out)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn batch(at: AlertTime) -> AlertBatch {
        AlertBatch {
            tick: 1,
            generated_at: Utc::now(),
            alerts: vec![Alert {
                user: "ACM2278".into(),
                at,
                logins_per_day: 11,
                device_connections: 6,
                threat_level: ThreatLevel::Critical,
                cross_check: None,
            }],
            trend: None,
            degraded: false,
        }
    }

    #[test]
    fn synthetic_line_shape() {
        let line = format_alert(&batch(AlertTime::Instant(Utc::now())).alerts[0]);
        assert!(line.starts_with("Logins: 11 | Devices: 6 | Status: "));
        assert!(line.contains("CRITICAL"));
    }

    #[test]
    fn console_sink_prints_banner_rows_and_trend() {
        use crate::monitor::{TrendPoint, TrendSummary};

        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut b = batch(AlertTime::Day(day));
        b.degraded = true;
        b.trend = Some(TrendSummary {
            series: vec![
                TrendPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    mean_level: 0.5,
                },
                TrendPoint {
                    date: day,
                    mean_level: 1.5,
                },
            ],
            current: 1.5,
            delta: Some(1.0),
        });

        let mut sink = ConsoleSink::new(Vec::new());
        sink.present(&b).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("-- tick 1 | live threat detection"));
        assert!(lines[0].contains("showing all levels"));
        assert!(lines[1].starts_with("ACM2278"));
        assert!(lines[1].contains("2024-01-02 | Logins: 11 | Devices: 6 | Status: "));
        assert!(lines[1].contains("CRITICAL"));
        assert_eq!(lines[2], "Current threat index: 1.5 (+1.0 from yesterday)");
    }

    #[test]
    fn json_sink_writes_one_line_per_alert() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut sink = JsonSink::new(Vec::new());
        sink.present(&batch(AlertTime::Day(day))).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 1);
        let v: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(v["threat_level"], 2);
        assert_eq!(v["at"], "2024-01-01");
        assert_eq!(v["status"], "Critical");
        assert!(v.get("degraded").is_none());
    }
}
