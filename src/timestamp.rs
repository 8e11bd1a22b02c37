//! Timestamp parsing
//!
//! Timestamps are parsed from the text preceding a hex dump, or from the `time` group of an
//! import pattern, using either a `strftime`-like format (see [`chrono::format::strftime`]) or
//! ISO 8601.
//!
//! The `%f` specifier is handled here rather than by chrono: it matches any number of decimal
//! digits, interpreted as a fraction of second. This allows parsing microseconds as well as
//! milliseconds or nanoseconds with the same format.
//!
//! Date fields missing from the format (for ex. `"%H:%M:%S.%f"`) are taken from the start time
//! of the run.

use crate::error::ImportError;
use crate::packet::Timestamp;
use chrono::format::{parse_and_remainder, Item, Parsed, StrftimeItems};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use log::{debug, warn};
use thiserror::Error;

/// Format selecting ISO 8601 parsing
pub const ISO_FORMAT: &str = "ISO";

/// Default interval between packets without a usable timestamp, in nanoseconds
pub const DEFAULT_TICK_NSEC: u64 = 1000;

/// Time zone of timestamps without an explicit offset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimestampZone {
    Local,
    Utc,
}

impl Default for TimestampZone {
    fn default() -> Self {
        TimestampZone::Local
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("{0}")]
    Format(#[from] chrono::ParseError),
    #[error("time does not exist in the local time zone")]
    NonexistentLocalTime,
}

#[derive(Clone, Debug)]
enum TimeFormat {
    Iso,
    /// Pattern, split around the first `%f`
    Pattern {
        prefix: String,
        suffix: Option<String>,
    },
}

/// Current time, used as start time of a run
pub fn now() -> Timestamp {
    let now = Utc::now();
    Timestamp::new(now.timestamp(), 0).add_nanos(u64::from(now.timestamp_subsec_nanos()))
}

/// Parser for timestamps in a fixed format
#[derive(Clone, Debug)]
pub struct TimestampParser {
    format: TimeFormat,
    zone: TimestampZone,
    default_date: NaiveDate,
}

impl TimestampParser {
    /// Create a parser for `format` (`"ISO"` or a `strftime`-like pattern)
    ///
    /// `start` is the start time of the run, providing missing date fields.
    pub fn new(format: &str, zone: TimestampZone, start: Timestamp) -> Result<Self, ImportError> {
        let format = if format == ISO_FORMAT {
            TimeFormat::Iso
        } else {
            if StrftimeItems::new(format).any(|item| item == Item::Error) {
                return Err(ImportError::InvalidConfig(format!(
                    "invalid timestamp format '{}'",
                    format
                )));
            }
            match format.find("%f") {
                Some(idx) => TimeFormat::Pattern {
                    prefix: format[..idx].to_string(),
                    suffix: Some(format[idx + 2..].to_string()),
                },
                None => TimeFormat::Pattern {
                    prefix: format.to_string(),
                    suffix: None,
                },
            }
        };
        let default_date = match zone {
            TimestampZone::Utc => Utc
                .timestamp_opt(start.secs, start.nsecs)
                .single()
                .map(|d| d.date_naive()),
            TimestampZone::Local => Local
                .timestamp_opt(start.secs, start.nsecs)
                .single()
                .map(|d| d.date_naive()),
        }
        .unwrap_or_default();
        Ok(TimestampParser {
            format,
            zone,
            default_date,
        })
    }

    /// Parse the beginning of `text`. Trailing text is ignored.
    pub fn parse(&self, text: &str) -> Result<Timestamp, TimestampError> {
        let mut parsed = Parsed::new();
        match &self.format {
            TimeFormat::Iso => parse_iso(&mut parsed, text.trim_start())?,
            TimeFormat::Pattern { prefix, suffix } => {
                let rem = parse_and_remainder(&mut parsed, text, StrftimeItems::new(prefix))?;
                if let Some(suffix) = suffix {
                    let (nanos, rem) = parse_fraction(rem);
                    if parsed.nanosecond.is_none() {
                        parsed.set_nanosecond(i64::from(nanos))?;
                    }
                    parse_and_remainder(&mut parsed, rem, StrftimeItems::new(suffix))?;
                }
            }
        }
        self.resolve(&mut parsed)
    }

    fn resolve(&self, parsed: &mut Parsed) -> Result<Timestamp, TimestampError> {
        if let Some(secs) = parsed.timestamp {
            let nanos = parsed.nanosecond.unwrap_or(0);
            return Ok(Timestamp::new(secs, 0).add_nanos(u64::from(nanos)));
        }
        // missing date fields default to the start date
        if parsed.year.is_none() && parsed.year_mod_100.is_none() && parsed.isoyear.is_none() {
            parsed.set_year(i64::from(self.default_date.year()))?;
        }
        let has_week = parsed.isoweek.is_some()
            || parsed.week_from_sun.is_some()
            || parsed.week_from_mon.is_some();
        if parsed.month.is_none() && parsed.ordinal.is_none() && !has_week {
            parsed.set_month(i64::from(self.default_date.month()))?;
        }
        if parsed.day.is_none() && parsed.ordinal.is_none() && !has_week {
            parsed.set_day(i64::from(self.default_date.day()))?;
        }
        if parsed.hour_div_12.is_none() && parsed.hour_mod_12.is_none() {
            parsed.set_hour(0)?;
        }
        if parsed.minute.is_none() {
            parsed.set_minute(0)?;
        }
        if parsed.offset.is_some() {
            let dt = parsed.to_datetime()?;
            return Ok(from_datetime(&dt));
        }
        let naive = parsed.to_naive_datetime_with_offset(0)?;
        match self.zone {
            TimestampZone::Utc => Ok(from_datetime(&Utc.from_utc_datetime(&naive))),
            TimestampZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| from_datetime(&dt))
                .ok_or(TimestampError::NonexistentLocalTime),
        }
    }
}

fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Timestamp {
    // leap seconds are represented with nanoseconds >= 10^9
    Timestamp::new(dt.timestamp(), 0).add_nanos(u64::from(dt.timestamp_subsec_nanos()))
}

// Date and time, `T` or space separated, optional fraction, then `Z`, an offset, or nothing
fn parse_iso(parsed: &mut Parsed, text: &str) -> Result<(), TimestampError> {
    let rem = match parse_and_remainder(parsed, text, StrftimeItems::new("%Y-%m-%dT%H:%M:%S%.f")) {
        Ok(rem) => rem,
        Err(_) => {
            *parsed = Parsed::new();
            parse_and_remainder(parsed, text, StrftimeItems::new("%Y-%m-%d %H:%M:%S%.f"))?
        }
    };
    if rem.starts_with('Z') || rem.starts_with('z') {
        parsed.set_offset(0)?;
    } else if rem.starts_with('+') || rem.starts_with('-') {
        parse_and_remainder(parsed, rem, StrftimeItems::new("%:z"))?;
    }
    Ok(())
}

// Leading decimal digits of `text`, as nanoseconds. Digits after the 9th are ignored.
fn parse_fraction(text: &str) -> (u32, &str) {
    let ndigits = text.bytes().take_while(u8::is_ascii_digit).count();
    let nanos = text.bytes().take(ndigits.min(9)).fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
    let scale = 10u32.pow(9 - ndigits.min(9) as u32);
    (nanos * scale, &text[ndigits..])
}

/// Source of packet timestamps
///
/// Packets get their parsed timestamp when possible. Otherwise, the first packet gets the start
/// time of the run, and following packets the previous timestamp plus a fixed tick.
#[derive(Debug)]
pub struct TimestampClock {
    parser: Option<TimestampParser>,
    start: Timestamp,
    tick_nsec: u64,
    previous: Option<Timestamp>,
    failures: u64,
}

impl TimestampClock {
    pub fn new(parser: Option<TimestampParser>, start: Timestamp, tick_nsec: u64) -> Self {
        TimestampClock {
            parser,
            start,
            tick_nsec,
            previous: None,
            failures: 0,
        }
    }

    /// Timestamp of a new packet, from its time text if any
    pub fn next(&mut self, text: Option<&str>) -> Timestamp {
        let text = text.map(str::trim).filter(|t| !t.is_empty());
        let parsed = match (&self.parser, text) {
            (Some(parser), Some(text)) => match parser.parse(text) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    self.failures += 1;
                    if self.failures == 1 {
                        warn!("unable to parse timestamp '{}': {}", text, e);
                    } else {
                        debug!("unable to parse timestamp '{}': {}", text, e);
                    }
                    None
                }
            },
            _ => None,
        };
        let ts = parsed.unwrap_or_else(|| self.fallback());
        self.previous = Some(ts);
        ts
    }

    /// Timestamp of a frame continuing the previous packet
    pub fn tick(&mut self) -> Timestamp {
        let ts = self.fallback();
        self.previous = Some(ts);
        ts
    }

    /// Number of timestamps that could not be parsed
    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn fallback(&self) -> Timestamp {
        match self.previous {
            Some(previous) => previous.add_nanos(self.tick_nsec),
            None => self.start,
        }
    }
}
