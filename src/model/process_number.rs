//! Job identifier echoed in every outbound message: day-of-year + hour +
//! minute at job start, each zero-padded (`DDDHHMM`).

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessNumber(String);

impl ProcessNumber {
    pub fn from_timestamp(now: DateTime<Utc>) -> Self {
        Self(format!(
            "{:03}{:02}{:02}",
            now.ordinal(),
            now.hour(),
            now.minute()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
