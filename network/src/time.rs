use std::fmt;
use std::ops::Sub;

use chrono::{NaiveDateTime, TimeZone, Utc};

/// Seconds since the UNIX epoch, UTC. Sub-second precision is never needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    pub fn epoch_seconds(self) -> i64 {
        self.0
    }

    /// Panics on overflow; callers bound `seconds` first, or use `checked_offset`.
    pub fn offset(self, seconds: i64) -> Self {
        Self(self.0 + seconds)
    }

    pub fn checked_offset(self, seconds: i64) -> Option<Self> {
        self.0.checked_add(seconds).map(Self)
    }
}

impl Sub for Timestamp {
    type Output = i64;

    fn sub(self, other: Self) -> i64 {
        self.0 - other.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", IsoUtc.format(*self))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed timestamp {raw:?}, expected something like 2014-01-01T08:00:00Z")]
pub struct MalformedTimestamp {
    pub raw: String,
}

/// Converts between the textual timestamps of the input/output files and `Timestamp`.
pub trait TimeFormat {
    fn to_epoch(&self, raw: &str) -> Result<Timestamp, MalformedTimestamp>;
    fn format(&self, time: Timestamp) -> String;
}

/// `YYYY-MM-DDThh:mm:ssZ`
pub struct IsoUtc;

const ISO_UTC: &str = "%Y-%m-%dT%H:%M:%SZ";

impl TimeFormat for IsoUtc {
    fn to_epoch(&self, raw: &str) -> Result<Timestamp, MalformedTimestamp> {
        let datetime =
            NaiveDateTime::parse_from_str(raw, ISO_UTC).map_err(|_| MalformedTimestamp {
                raw: raw.to_string(),
            })?;
        Ok(Timestamp(Utc.from_utc_datetime(&datetime).timestamp()))
    }

    fn format(&self, time: Timestamp) -> String {
        match Utc.timestamp_opt(time.0, 0).single() {
            Some(datetime) => datetime.format(ISO_UTC).to_string(),
            // Way outside chrono's range; nothing sensible to print
            None => time.0.to_string(),
        }
    }
}
