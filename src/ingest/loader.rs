//! Tolerant CSV reader for raw activity tables.
//!
//! Some exports carry a junk first line whose leading cell is wrapped in
//! braces (`{id},...`); the real header is the next row. Headerless CERT
//! dumps look the same, so when promotion still yields no usable header the
//! fixed CERT column layout is assumed.

use super::{Activity, EventSource, RawEvent};
use crate::error::{Result, ThreatError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const REQUIRED: [&str; 3] = ["user", "date", "activity"];
const CERT_COLUMNS: [&str; 5] = ["id", "date", "user", "pc", "activity"];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Header plus data rows after anomaly correction
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
    /// First line was a braced pseudo-header and got discarded
    pub header_corrected: bool,
}

impl RawTable {
    /// Read a whole table, promoting the second line to header when the first
    /// cell of the first line starts with `{`.
    pub fn read<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);
        let mut records = reader.records();

        let first = match records.next() {
            Some(r) => r?,
            None => return Ok(Self::default()),
        };
        let header_corrected = is_braced(&first);
        let header = if header_corrected {
            match records.next() {
                Some(r) => r?,
                None => {
                    return Ok(Self {
                        header_corrected,
                        ..Self::default()
                    })
                }
            }
        } else {
            first.clone()
        };

        let mut table = Self {
            headers: header.iter().map(normalize_header).collect(),
            rows: records.collect::<std::result::Result<Vec<_>, _>>()?,
            header_corrected,
        };

        // Headerless CERT dump: both lines were data rows.
        if header_corrected
            && first.len() == CERT_COLUMNS.len()
            && !table.headers.iter().any(|h| h == "user")
        {
            debug!("no header after promotion; assuming CERT column layout");
            table.rows.insert(0, header);
            table.rows.insert(0, first);
            table.headers = CERT_COLUMNS.iter().map(|s| s.to_string()).collect();
        }
        Ok(table)
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn is_braced(record: &StringRecord) -> bool {
    record
        .get(0)
        .map(|c| c.trim_start().starts_with('{'))
        .unwrap_or(false)
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

/// Parse the timestamp formats seen in activity exports. Date-only values map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Row accounting for one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub skipped: usize,
    pub header_corrected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedEvents {
    pub events: Vec<RawEvent>,
    pub report: LoadReport,
}

struct Columns {
    user: usize,
    date: usize,
    activity: usize,
    id: Option<usize>,
    pc: Option<usize>,
}

/// Parses one activity domain's raw table into [`RawEvent`]s.
pub struct EventLoader {
    source: EventSource,
}

impl EventLoader {
    pub fn new(source: EventSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> EventSource {
        self.source
    }

    pub fn load(&self, path: &Path) -> Result<LoadedEvents> {
        ThreatError::require(path, "place the raw activity export there before preprocessing")?;
        let file = std::fs::File::open(path)?;
        self.parse(file, &path.display().to_string())
    }

    pub fn parse_str(&self, text: &str, name: &str) -> Result<LoadedEvents> {
        self.parse(text.as_bytes(), name)
    }

    pub fn parse<R: Read>(&self, rdr: R, name: &str) -> Result<LoadedEvents> {
        let table = RawTable::read(rdr)?;
        let cols = resolve_columns(&table, name)?;

        let mut out = LoadedEvents {
            events: Vec::with_capacity(table.rows.len()),
            report: LoadReport {
                rows: table.rows.len(),
                skipped: 0,
                header_corrected: table.header_corrected,
            },
        };

        for record in &table.rows {
            match self.parse_row(record, &cols) {
                Some(ev) => out.events.push(ev),
                None => out.report.skipped += 1,
            }
        }

        if out.report.skipped > 0 {
            warn!(
                source = name,
                skipped = out.report.skipped,
                rows = out.report.rows,
                "skipped rows with empty user or unparsable date"
            );
        }
        debug!(
            source = name,
            events = out.events.len(),
            header_corrected = table.header_corrected,
            "parsed activity table"
        );
        Ok(out)
    }

    fn parse_row(&self, record: &StringRecord, cols: &Columns) -> Option<RawEvent> {
        let user = record.get(cols.user)?.trim();
        if user.is_empty() {
            return None;
        }
        let timestamp = parse_timestamp(record.get(cols.date)?)?;
        let activity = Activity::parse(record.get(cols.activity)?);
        let opt = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Some(RawEvent {
            id: opt(cols.id),
            user: user.to_string(),
            timestamp,
            activity,
            source: self.source,
            pc: opt(cols.pc),
        })
    }
}

fn resolve_columns(table: &RawTable, name: &str) -> Result<Columns> {
    let date = table.column("date").or_else(|| table.column("timestamp"));
    let user = table.column("user");
    let activity = table.column("activity");

    let mut missing = Vec::new();
    for (col, found) in REQUIRED.iter().zip([user, date, activity]) {
        if found.is_none() {
            missing.push(if *col == "date" {
                "date/timestamp".to_string()
            } else {
                col.to_string()
            });
        }
    }

    match (user, date, activity) {
        (Some(user), Some(date), Some(activity)) => Ok(Columns {
            user,
            date,
            activity,
            id: table.column("id"),
            pc: table.column("pc"),
        }),
        _ => Err(ThreatError::MalformedSource {
            source_name: name.to_string(),
            missing,
        }),
    }
}
