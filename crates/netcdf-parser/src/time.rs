//! CF time coordinate decoding.
//!
//! CF time variables store offsets from an epoch, described by a `units`
//! attribute such as `"hours since 1950-01-01 00:00:00"`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

use crate::error::{NetCdfError, NetCdfResult};

/// Calendars that map onto chrono's proleptic Gregorian dates.
const SUPPORTED_CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

/// Unit of a CF time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(TimeUnit::Hours),
            "days" | "day" | "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }
}

/// Parsed `"<unit> since <epoch>"` time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse a CF `units` string.
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let mut parts = units.trim().splitn(2, " since ");
        let unit_str = parts.next().unwrap_or_default().trim();
        let epoch_str = parts
            .next()
            .ok_or_else(|| NetCdfError::invalid_time_units(units, "expected '<unit> since <epoch>'"))?;

        let unit = TimeUnit::parse(unit_str)
            .ok_or_else(|| NetCdfError::invalid_time_units(units, format!("unknown unit '{}'", unit_str)))?;
        let epoch = parse_epoch(epoch_str.trim())
            .ok_or_else(|| NetCdfError::invalid_time_units(units, format!("bad epoch '{}'", epoch_str.trim())))?;

        Ok(Self { unit, epoch })
    }

    /// Parse units and check the calendar, if one is given.
    pub fn with_calendar(units: &str, calendar: Option<&str>) -> NetCdfResult<Self> {
        if let Some(cal) = calendar {
            if !SUPPORTED_CALENDARS.contains(&cal.to_ascii_lowercase().as_str()) {
                return Err(NetCdfError::invalid_time_units(
                    units,
                    format!("unsupported calendar '{}'", cal),
                ));
            }
        }
        Self::parse(units)
    }

    /// Instant for an offset, rounded to the millisecond.
    pub fn decode(&self, offset: f64) -> NetCdfResult<DateTime<Utc>> {
        if !offset.is_finite() {
            return Err(NetCdfError::InvalidFormat(format!(
                "non-finite time offset {}",
                offset
            )));
        }
        let millis = (offset * self.unit.seconds() * 1000.0).round() as i64;
        self.epoch
            .checked_add_signed(Duration::milliseconds(millis))
            .ok_or_else(|| NetCdfError::InvalidFormat(format!("time offset {} out of range", offset)))
    }

    /// ISO-8601 UTC string for an offset, e.g. `2024-01-15T12:00:00Z`.
    pub fn decode_iso(&self, offset: f64) -> NetCdfResult<String> {
        let instant = self.decode(offset)?;
        let format = if instant.timestamp_subsec_millis() == 0 {
            SecondsFormat::Secs
        } else {
            SecondsFormat::Millis
        };
        Ok(instant.to_rfc3339_opts(format, true))
    }
}

/// Parse CF epochs: `1970-01-01`, `1950-1-1 0:0:0`, `2000-01-01T00:00:00Z`,
/// `1900-01-01 00:00:00.0 UTC`.
fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    let s = s
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim();
    let (date_str, time_str) = match s.split_once(|c| c == ' ' || c == 'T') {
        Some((d, t)) => (d, Some(t.trim())),
        None => (s, None),
    };

    let mut ymd = date_str.split('-').map(|p| p.parse::<i64>().ok());
    let year = ymd.next()??;
    let month = ymd.next()??;
    let day = ymd.next()??;
    if ymd.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;

    let time = match time_str.filter(|t| !t.is_empty()) {
        None => NaiveTime::MIN,
        Some(t) => {
            // Ignore a trailing numeric zone offset such as "+00:00".
            let t = t.split(|c| c == '+' || c == ' ').next().unwrap_or(t);
            let mut hms = t.split(':');
            let hour: u32 = hms.next()?.parse().ok()?;
            let minute: u32 = hms.next().map(str::parse).transpose().ok()?.unwrap_or(0);
            let seconds: f64 = hms.next().map(str::parse).transpose().ok()?.unwrap_or(0.0);
            let whole = seconds.trunc() as u32;
            let nanos = ((seconds - seconds.trunc()) * 1e9).round() as u32;
            NaiveTime::from_hms_nano_opt(hour, minute, whole, nanos)?
        }
    };

    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
}
