//! Timestamps and validity intervals
//!
//! Every version carries a half-open interval `[valid_from, valid_to)`. A
//! version that is still in effect ends at [`TimeStamp::sentinel`], a real
//! far-future instant, so interval checks are plain comparisons.
use super::error::{StoreError, StoreResult};
use super::record::{Record, Version};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Source of "now" shared by every store of a ledger.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Wire format for every timestamp. Fractional seconds are written only when
/// present, so whole-second values keep the plain `YYYY-MM-DD HH:MM:SS` form.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

// 9999-12-31 23:59:59 UTC
const SENTINEL_SECS: i64 = 253_402_300_799;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct TimeStamp(DateTime<Utc>);

impl TimeStamp {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self(clock.utc())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }
    /// The open end of every current interval.
    pub fn sentinel() -> Self {
        Self(DateTime::from_timestamp(SENTINEL_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }
    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
    /// Smallest timestamp strictly after this one.
    pub fn successor(&self) -> Self {
        self.0
            .checked_add_signed(TimeDelta::nanoseconds(1))
            .map(Self)
            .unwrap_or(*self)
    }
    /// Accepts `YYYY-MM-DD HH:MM:SS[.fraction]` or a bare `YYYY-MM-DD` (midnight).
    pub fn parse(input: &str) -> StoreResult<Self> {
        let trimmed = input.trim();
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT) {
            return Ok(Self(naive.and_utc()));
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| StoreError::InvalidTimestamp(input.to_string()))
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn sentinel() -> TimeStamp {
    TimeStamp::sentinel()
}

pub fn is_current<R: Record>(version: &Version<R>) -> bool {
    version.interval().is_current()
}

pub fn is_within<R: Record>(version: &Version<R>, at: TimeStamp) -> bool {
    version.interval().contains(at)
}

impl From<DateTime<Utc>> for TimeStamp {
    fn from(value: DateTime<Utc>) -> Self {
        TimeStamp(value)
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for TimeStamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeStamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeStamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// seconds + subsecond nanos, the sentinel does not fit in i64 nanoseconds
impl<C> minicbor::Encode<C> for TimeStamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?
            .i64(self.0.timestamp())?
            .u32(self.0.timestamp_subsec_nanos())?
            .ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        d.array()?;
        let secs = d.i64()?;
        let nanos = d.u32()?;

        DateTime::from_timestamp(secs, nanos)
            .map(TimeStamp)
            .ok_or(minicbor::decode::Error::message(
                "failed to convert timestamp to utc",
            ))
    }
}

/// Half-open `[valid_from, valid_to)` window during which a version is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidityInterval {
    #[serde(rename = "date_actual_from")]
    valid_from: TimeStamp,
    #[serde(rename = "date_actual_to")]
    valid_to: TimeStamp,
}

impl ValidityInterval {
    pub fn open(valid_from: TimeStamp) -> Self {
        Self {
            valid_from,
            valid_to: TimeStamp::sentinel(),
        }
    }
    pub fn new(valid_from: TimeStamp, valid_to: TimeStamp) -> StoreResult<Self> {
        if valid_from > valid_to {
            return Err(StoreError::InvalidInterval {
                from: valid_from,
                to: valid_to,
            });
        }
        Ok(Self {
            valid_from,
            valid_to,
        })
    }
    pub fn valid_from(&self) -> TimeStamp {
        self.valid_from
    }
    pub fn valid_to(&self) -> TimeStamp {
        self.valid_to
    }
    pub fn is_current(&self) -> bool {
        self.valid_to.is_sentinel()
    }
    pub fn is_well_formed(&self) -> bool {
        self.valid_from <= self.valid_to
    }
    pub fn contains(&self, at: TimeStamp) -> bool {
        self.valid_from <= at && at < self.valid_to
    }
    pub fn overlaps(&self, other: &ValidityInterval) -> bool {
        self.valid_from < other.valid_to && other.valid_from < self.valid_to
    }
    pub(crate) fn set_valid_from(&mut self, at: TimeStamp) {
        self.valid_from = at;
    }
    pub(crate) fn set_valid_to(&mut self, at: TimeStamp) {
        self.valid_to = at;
    }
    pub(crate) fn close(&mut self, at: TimeStamp) {
        self.valid_to = at;
    }
    pub(crate) fn reopen(&mut self) {
        self.valid_to = TimeStamp::sentinel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u32) -> TimeStamp {
        TimeStamp::new_with(2024, 6, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn sentinel_is_year_9999_and_after_everything() {
        let sentinel = TimeStamp::sentinel();

        assert_eq!(sentinel.to_string(), "9999-12-31 23:59:59");
        assert!(sentinel.is_sentinel());
        assert!(TimeStamp::new() < sentinel);
    }

    #[test]
    fn parse_accepts_both_formats() {
        let full = TimeStamp::parse("2024-06-15 10:30:00").unwrap();
        let date = TimeStamp::parse("2024-06-15").unwrap();

        assert_eq!(full, TimeStamp::new_with(2024, 6, 15, 10, 30, 0).unwrap());
        assert_eq!(date, TimeStamp::new_with(2024, 6, 15, 0, 0, 0).unwrap());
        assert!(TimeStamp::parse("15/06/2024").is_err());
    }

    #[test]
    fn subsecond_precision_survives_display_and_parse() {
        let base = TimeStamp::new_with(2024, 6, 15, 10, 30, 0).unwrap();
        let bumped = base.successor();

        assert_eq!(base.to_string(), "2024-06-15 10:30:00");
        assert_eq!(bumped.to_string(), "2024-06-15 10:30:00.000000001");
        assert_eq!(TimeStamp::parse(&bumped.to_string()).unwrap(), bumped);

        let now = TimeStamp::new();
        assert_eq!(TimeStamp::parse(&now.to_string()).unwrap(), now);
    }

    #[test]
    fn parsed_sentinel_compares_equal() {
        let parsed = TimeStamp::parse("9999-12-31 23:59:59").unwrap();
        assert!(parsed.is_sentinel());
    }

    #[test]
    fn successor_is_strictly_greater() {
        let now = TimeStamp::new();
        assert!(now.successor() > now);
    }

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::sentinel();

        let encoding = minicbor::to_vec(original).unwrap();
        let decode: TimeStamp = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn interval_is_half_open() {
        let interval = ValidityInterval::new(ts(1), ts(10)).unwrap();

        assert!(interval.contains(ts(1)));
        assert!(interval.contains(ts(9)));
        assert!(!interval.contains(ts(10)));
        assert!(!interval.is_current());
    }

    #[test]
    fn reversed_interval_is_rejected() {
        let err = ValidityInterval::new(ts(10), ts(1)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInterval { .. }));
    }

    #[test]
    fn abutting_intervals_do_not_overlap() {
        let closed = ValidityInterval::new(ts(1), ts(5)).unwrap();
        let current = ValidityInterval::open(ts(5));

        assert!(!closed.overlaps(&current));
        assert!(current.overlaps(&ValidityInterval::open(ts(20))));
    }

    #[test]
    fn close_then_reopen_restores_sentinel() {
        let mut interval = ValidityInterval::open(ts(1));
        interval.close(ts(3));
        assert_eq!(interval.valid_to(), ts(3));

        interval.reopen();
        assert!(interval.is_current());
        assert_eq!(interval.valid_from(), ts(1));
    }

    #[test]
    fn version_helpers_read_the_interval() {
        use crate::models::Goal;

        let mut version = Version::open(Goal::new(1, 1, 500, ts(30)), "admin", ts(1));
        assert!(is_current(&version));
        assert!(is_within(&version, ts(2)));

        version.set_valid_to(ts(2));
        assert!(!is_current(&version));
        assert!(!is_within(&version, ts(2)));
        assert_eq!(sentinel(), TimeStamp::sentinel());
    }
}
