//! Partial-precision temporal values.
//!
//! FHIRPath dates, datetimes and times carry a precision tag: components
//! below the declared precision are absent, components at or above it are
//! present. Comparison is precision-aware and returns `None` when the
//! shared-precision prefix ties but the precisions differ — the order is
//! then undecidable and the expression yields the empty collection.

use std::cmp::Ordering;

use chrono::{
    DateTime as ChronoDateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime,
    NaiveTime, TimeZone, Timelike, Utc,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateTimePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimePrecision {
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// A date with year, year-month, or full precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub date: NaiveDate,
    pub precision: DatePrecision,
}

/// A datetime with partial precision and an optional UTC offset in seconds.
/// `offset: None` means the literal carried no timezone; the instant is
/// then interpreted as local/naive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub instant: ChronoDateTime<Utc>,
    pub precision: DateTimePrecision,
    pub offset: Option<i32>,
}

/// A time-of-day with partial precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub time: NaiveTime,
    pub precision: TimePrecision,
}

/// Time-valued quantity units accepted by temporal arithmetic.
///
/// Calendar-duration keywords (`year`, `month`, …) use calendar semantics;
/// the definite UCUM codes `'s' 'min' 'h' 'd' 'wk' 'ms'` map to the same
/// field additions. Definite `'a'`/`'mo'` have no calendar meaning and are
/// rejected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl TemporalUnit {
    /// Recognize a calendar keyword (singular or plural).
    pub fn from_calendar_word(word: &str) -> Option<Self> {
        match word {
            "year" | "years" => Some(Self::Year),
            "month" | "months" => Some(Self::Month),
            "week" | "weeks" => Some(Self::Week),
            "day" | "days" => Some(Self::Day),
            "hour" | "hours" => Some(Self::Hour),
            "minute" | "minutes" => Some(Self::Minute),
            "second" | "seconds" => Some(Self::Second),
            "millisecond" | "milliseconds" => Some(Self::Millisecond),
            _ => None,
        }
    }

    /// Recognize a definite-duration UCUM code usable in date arithmetic.
    pub fn from_ucum_code(code: &str) -> Option<Self> {
        match code {
            "wk" => Some(Self::Week),
            "d" => Some(Self::Day),
            "h" => Some(Self::Hour),
            "min" => Some(Self::Minute),
            "s" => Some(Self::Second),
            "ms" => Some(Self::Millisecond),
            _ => None,
        }
    }
}

impl Date {
    pub fn new(date: NaiveDate, precision: DatePrecision) -> Self {
        Self { date, precision }
    }

    /// Parse `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        match s.len() {
            4 => {
                let date = NaiveDate::parse_from_str(&format!("{s}-01-01"), "%Y-%m-%d").ok()?;
                Some(Self::new(date, DatePrecision::Year))
            }
            7 => {
                let date = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()?;
                Some(Self::new(date, DatePrecision::Month))
            }
            10 => {
                let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
                Some(Self::new(date, DatePrecision::Day))
            }
            _ => None,
        }
    }

    pub fn format(&self) -> String {
        match self.precision {
            DatePrecision::Year => self.date.format("%Y").to_string(),
            DatePrecision::Month => self.date.format("%Y-%m").to_string(),
            DatePrecision::Day => self.date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Implicit Date → DateTime conversion (date precision, unzoned).
    pub fn to_datetime(&self) -> DateTime {
        let precision = match self.precision {
            DatePrecision::Year => DateTimePrecision::Year,
            DatePrecision::Month => DateTimePrecision::Month,
            DatePrecision::Day => DateTimePrecision::Day,
        };
        let naive = NaiveDateTime::new(self.date, NaiveTime::MIN);
        DateTime {
            instant: ChronoDateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
            precision,
            offset: None,
        }
    }

    /// Precision-aware equality comparison: differing fields inside the
    /// shared precision decide inequality, a tie at differing precisions is
    /// undecidable (`None`).
    pub fn partial_cmp_precision(&self, other: &Date) -> Option<Ordering> {
        let fields = |d: &Date| [d.date.year(), d.date.month() as i32, d.date.day() as i32];
        compare_fields(
            &fields(self),
            date_depth(self.precision),
            &fields(other),
            date_depth(other.precision),
        )
    }

    /// Ordering for `<`/`>`-style operators: values of differing precision
    /// never order against each other.
    pub fn cmp_same_precision(&self, other: &Date) -> Option<Ordering> {
        if self.precision != other.precision {
            return None;
        }
        self.partial_cmp_precision(other)
    }

    /// Add a (possibly negative, possibly fractional) quantity of `unit`.
    /// Fractional values truncate; units finer than the precision floor
    /// toward the stored field. Returns `None` on overflow.
    pub fn checked_add(&self, value: &Decimal, unit: TemporalUnit) -> Option<Date> {
        let n = value.trunc().to_i64()?;
        let date = match self.precision {
            DatePrecision::Day => match unit {
                TemporalUnit::Year => add_years(self.date, n)?,
                TemporalUnit::Month => add_months(self.date, n)?,
                TemporalUnit::Week => add_days(self.date, n.checked_mul(7)?)?,
                TemporalUnit::Day => add_days(self.date, n)?,
                TemporalUnit::Hour => add_days(self.date, n / 24)?,
                TemporalUnit::Minute => add_days(self.date, n / (24 * 60))?,
                TemporalUnit::Second => add_days(self.date, n / 86_400)?,
                TemporalUnit::Millisecond => add_days(self.date, n / 86_400_000)?,
            },
            DatePrecision::Month => {
                let months = match unit {
                    TemporalUnit::Year => n.checked_mul(12)?,
                    TemporalUnit::Month => n,
                    TemporalUnit::Week => n.checked_mul(7)? / 30,
                    TemporalUnit::Day => n / 30,
                    TemporalUnit::Hour => n / (24 * 30),
                    TemporalUnit::Minute => n / (24 * 60 * 30),
                    TemporalUnit::Second => n / (86_400 * 30),
                    TemporalUnit::Millisecond => n / (86_400_000 * 30),
                };
                add_months(self.date, months)?
            }
            DatePrecision::Year => {
                let years = match unit {
                    TemporalUnit::Year => n,
                    TemporalUnit::Month => n / 12,
                    TemporalUnit::Week => n.checked_mul(7)? / 30 / 12,
                    TemporalUnit::Day => n / 30 / 12,
                    TemporalUnit::Hour => n / 24 / 30 / 12,
                    TemporalUnit::Minute => n / (24 * 60) / 30 / 12,
                    TemporalUnit::Second => n / 86_400 / 30 / 12,
                    TemporalUnit::Millisecond => n / 86_400_000 / 30 / 12,
                };
                add_years(self.date, years)?
            }
        };
        Some(Date::new(date, self.precision))
    }
}

impl DateTime {
    pub fn new(
        instant: ChronoDateTime<Utc>,
        precision: DateTimePrecision,
        offset: Option<i32>,
    ) -> Self {
        Self {
            instant,
            precision,
            offset,
        }
    }

    /// Parse a datetime literal or FHIR instant string. A date without a
    /// time part yields a datetime at date precision; `Z` and `±HH:MM`
    /// (or `±HHMM`) offsets are honored.
    pub fn parse(input: &str) -> Option<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return None;
        }

        let Some((date_part, rest)) = raw.split_once('T') else {
            return Date::parse(raw).map(|d| d.to_datetime());
        };

        let date = Date::parse(date_part)?;
        let (time_part, offset) = split_offset(rest)?;
        let (time, precision) = if time_part.is_empty() {
            (
                NaiveTime::MIN,
                match date.precision {
                    DatePrecision::Year => DateTimePrecision::Year,
                    DatePrecision::Month => DateTimePrecision::Month,
                    DatePrecision::Day => DateTimePrecision::Day,
                },
            )
        } else {
            parse_time_fields(time_part)?
        };

        let local = NaiveDateTime::new(date.date, time);
        let instant = match offset {
            Some(secs) => FixedOffset::east_opt(secs)?
                .from_local_datetime(&local)
                .single()?
                .with_timezone(&Utc),
            None => ChronoDateTime::<Utc>::from_naive_utc_and_offset(local, Utc),
        };

        Some(Self::new(instant, precision, offset))
    }

    /// The naive fields the value was written with (local to its offset).
    pub(crate) fn local(&self) -> NaiveDateTime {
        match self.offset {
            Some(secs) => {
                let offset =
                    FixedOffset::east_opt(secs)
                        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
                self.instant.with_timezone(&offset).naive_local()
            }
            None => self.instant.naive_utc(),
        }
    }

    pub fn format(&self) -> String {
        let local = self.local();
        let body = match self.precision {
            DateTimePrecision::Year => local.format("%Y").to_string(),
            DateTimePrecision::Month => local.format("%Y-%m").to_string(),
            DateTimePrecision::Day => local.format("%Y-%m-%d").to_string(),
            DateTimePrecision::Hour => local.format("%Y-%m-%dT%H").to_string(),
            DateTimePrecision::Minute => local.format("%Y-%m-%dT%H:%M").to_string(),
            DateTimePrecision::Second => local.format("%Y-%m-%dT%H:%M:%S").to_string(),
            DateTimePrecision::Millisecond => {
                let ms = local.and_utc().timestamp_subsec_millis();
                format!("{}.{:03}", local.format("%Y-%m-%dT%H:%M:%S"), ms)
            }
        };
        if self.precision < DateTimePrecision::Hour {
            return body;
        }
        match self.offset {
            Some(secs) => format!("{body}{}", format_offset(secs)),
            None => body,
        }
    }

    /// Precision-aware equality comparison. Mixed zoned/unzoned values do
    /// not compare; a tie at differing precisions is undecidable.
    pub fn partial_cmp_precision(&self, other: &DateTime) -> Option<Ordering> {
        if self.offset.is_some() != other.offset.is_some() {
            return None;
        }
        // Zoned values compare on the UTC instant; unzoned on their fields.
        let view = |dt: &DateTime| {
            if dt.offset.is_some() {
                dt.instant.naive_utc()
            } else {
                dt.local()
            }
        };
        let fields = |n: NaiveDateTime| {
            [
                n.year(),
                n.month() as i32,
                n.day() as i32,
                n.hour() as i32,
                n.minute() as i32,
                n.second() as i32,
                (n.and_utc().timestamp_subsec_millis()) as i32,
            ]
        };
        compare_fields(
            &fields(view(self)),
            datetime_depth(self.precision),
            &fields(view(other)),
            datetime_depth(other.precision),
        )
    }

    /// Ordering for `<`/`>`-style operators: values of differing precision
    /// never order against each other.
    pub fn cmp_same_precision(&self, other: &DateTime) -> Option<Ordering> {
        if self.precision != other.precision {
            return None;
        }
        self.partial_cmp_precision(other)
    }

    pub fn checked_add(&self, value: &Decimal, unit: TemporalUnit) -> Option<DateTime> {
        // Date-only precisions follow date arithmetic on the date part.
        if self.precision <= DateTimePrecision::Day {
            let local = self.local();
            let date_precision = match self.precision {
                DateTimePrecision::Year => DatePrecision::Year,
                DateTimePrecision::Month => DatePrecision::Month,
                _ => DatePrecision::Day,
            };
            let shifted = Date::new(local.date(), date_precision).checked_add(value, unit)?;
            let naive = NaiveDateTime::new(shifted.date, local.time());
            return Some(self.rebuild(naive));
        }

        let n = value.trunc().to_i64()?;
        let local = self.local();
        let naive = match unit {
            TemporalUnit::Year => {
                NaiveDateTime::new(add_years(local.date(), n)?, local.time())
            }
            TemporalUnit::Month => {
                NaiveDateTime::new(add_months(local.date(), n)?, local.time())
            }
            TemporalUnit::Week => local.checked_add_signed(Duration::try_weeks(n)?)?,
            TemporalUnit::Day => local.checked_add_signed(Duration::try_days(n)?)?,
            TemporalUnit::Hour => local.checked_add_signed(Duration::try_hours(n)?)?,
            TemporalUnit::Minute => {
                let n = if self.precision < DateTimePrecision::Minute {
                    // Sub-precision increments floor toward the stored field.
                    n / 60 * 60
                } else {
                    n
                };
                local.checked_add_signed(Duration::try_minutes(n)?)?
            }
            TemporalUnit::Second => {
                let n = match self.precision {
                    DateTimePrecision::Hour => n / 3600 * 3600,
                    DateTimePrecision::Minute => n / 60 * 60,
                    _ => n,
                };
                local.checked_add_signed(Duration::try_seconds(n)?)?
            }
            TemporalUnit::Millisecond => {
                let n = match self.precision {
                    DateTimePrecision::Hour => n / 3_600_000 * 3_600_000,
                    DateTimePrecision::Minute => n / 60_000 * 60_000,
                    DateTimePrecision::Second => n / 1000 * 1000,
                    _ => n,
                };
                local.checked_add_signed(Duration::try_milliseconds(n)?)?
            }
        };
        Some(self.rebuild(naive))
    }

    /// Reassemble a value at this precision/offset from shifted local fields.
    fn rebuild(&self, naive: NaiveDateTime) -> DateTime {
        let instant = match self.offset {
            Some(secs) => FixedOffset::east_opt(secs)
                .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| ChronoDateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)),
            None => ChronoDateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
        };
        DateTime::new(instant, self.precision, self.offset)
    }
}

impl Time {
    pub fn new(time: NaiveTime, precision: TimePrecision) -> Self {
        Self { time, precision }
    }

    /// Parse `HH`, `HH:MM`, `HH:MM:SS`, or `HH:MM:SS.fff`.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }
        let precision = if s.contains('.') {
            TimePrecision::Millisecond
        } else if s.matches(':').count() >= 2 {
            TimePrecision::Second
        } else if s.contains(':') {
            TimePrecision::Minute
        } else {
            TimePrecision::Hour
        };

        let time = NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .ok()
            .or_else(|| {
                if s.len() == 2 {
                    s.parse::<u32>().ok().and_then(|h| NaiveTime::from_hms_opt(h, 0, 0))
                } else {
                    None
                }
            })?;

        Some(Self::new(time, precision))
    }

    pub fn format(&self) -> String {
        match self.precision {
            TimePrecision::Hour => self.time.format("%H").to_string(),
            TimePrecision::Minute => self.time.format("%H:%M").to_string(),
            TimePrecision::Second => self.time.format("%H:%M:%S").to_string(),
            TimePrecision::Millisecond => {
                let ms = self.time.nanosecond() / 1_000_000;
                format!("{}.{:03}", self.time.format("%H:%M:%S"), ms)
            }
        }
    }

    pub fn partial_cmp_precision(&self, other: &Time) -> Option<Ordering> {
        let fields = |t: &Time| {
            [
                t.time.hour() as i32,
                t.time.minute() as i32,
                t.time.second() as i32,
                (t.time.nanosecond() / 1_000_000) as i32,
            ]
        };
        compare_fields(
            &fields(self),
            time_depth(self.precision),
            &fields(other),
            time_depth(other.precision),
        )
    }

    /// Ordering for `<`/`>`-style operators: values of differing precision
    /// never order against each other.
    pub fn cmp_same_precision(&self, other: &Time) -> Option<Ordering> {
        if self.precision != other.precision {
            return None;
        }
        self.partial_cmp_precision(other)
    }

    /// Add a time-valued quantity, wrapping around midnight.
    pub fn checked_add(&self, value: &Decimal, unit: TemporalUnit) -> Option<Time> {
        let n = value.trunc().to_i64()?;
        let ms = match unit {
            TemporalUnit::Hour => n.checked_mul(3_600_000)?,
            TemporalUnit::Minute => {
                let n = if self.precision < TimePrecision::Minute {
                    n / 60 * 60
                } else {
                    n
                };
                n.checked_mul(60_000)?
            }
            TemporalUnit::Second => {
                let n = match self.precision {
                    TimePrecision::Hour => n / 3600 * 3600,
                    TimePrecision::Minute => n / 60 * 60,
                    _ => n,
                };
                n.checked_mul(1000)?
            }
            TemporalUnit::Millisecond => match self.precision {
                TimePrecision::Hour => n / 3_600_000 * 3_600_000,
                TimePrecision::Minute => n / 60_000 * 60_000,
                TimePrecision::Second => n / 1000 * 1000,
                TimePrecision::Millisecond => n,
            },
            // Date-scale units do not apply to a time of day.
            _ => return None,
        };
        let day_ms = 86_400_000i64;
        let current = (self.time.num_seconds_from_midnight() as i64) * 1000
            + (self.time.nanosecond() / 1_000_000) as i64;
        let shifted = (current + ms).rem_euclid(day_ms);
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            (shifted / 1000) as u32,
            ((shifted % 1000) * 1_000_000) as u32,
        )?;
        Some(Time::new(time, self.precision))
    }
}

fn date_depth(p: DatePrecision) -> usize {
    match p {
        DatePrecision::Year => 1,
        DatePrecision::Month => 2,
        DatePrecision::Day => 3,
    }
}

fn datetime_depth(p: DateTimePrecision) -> usize {
    match p {
        DateTimePrecision::Year => 1,
        DateTimePrecision::Month => 2,
        DateTimePrecision::Day => 3,
        DateTimePrecision::Hour => 4,
        DateTimePrecision::Minute => 5,
        DateTimePrecision::Second => 6,
        DateTimePrecision::Millisecond => 7,
    }
}

fn time_depth(p: TimePrecision) -> usize {
    match p {
        TimePrecision::Hour => 1,
        TimePrecision::Minute => 2,
        TimePrecision::Second => 3,
        TimePrecision::Millisecond => 4,
    }
}

/// Compare field arrays down to the shallower precision. Equal prefixes at
/// differing precision are undecidable.
fn compare_fields(
    left: &[i32],
    left_depth: usize,
    right: &[i32],
    right_depth: usize,
) -> Option<Ordering> {
    let common = left_depth.min(right_depth);
    for i in 0..common {
        match left[i].cmp(&right[i]) {
            Ordering::Equal => continue,
            other => return Some(other),
        }
    }
    if left_depth == right_depth {
        Some(Ordering::Equal)
    } else {
        None
    }
}

fn split_offset(rest: &str) -> Option<(&str, Option<i32>)> {
    if let Some(stripped) = rest.strip_suffix('Z') {
        return Some((stripped, Some(0)));
    }
    if let Some(pos) = rest.rfind(['+', '-']) {
        let (time, tz) = rest.split_at(pos);
        let sign = if tz.starts_with('-') { -1 } else { 1 };
        let digits = &tz[1..];
        let (hh, mm) = if let Some((h, m)) = digits.split_once(':') {
            (h, m)
        } else if digits.len() == 4 {
            (&digits[0..2], &digits[2..4])
        } else {
            return None;
        };
        let hours: i32 = hh.parse().ok()?;
        let minutes: i32 = mm.parse().ok()?;
        return Some((time, Some(sign * (hours * 3600 + minutes * 60))));
    }
    Some((rest, None))
}

fn parse_time_fields(time_part: &str) -> Option<(NaiveTime, DateTimePrecision)> {
    let (main, frac) = time_part
        .split_once('.')
        .map(|(a, b)| (a, Some(b)))
        .unwrap_or((time_part, None));

    let parts: Vec<&str> = main.split(':').collect();
    let (h, m, s, precision) = match parts.as_slice() {
        [hh] => (*hh, "0", "0", DateTimePrecision::Hour),
        [hh, mm] => (*hh, *mm, "0", DateTimePrecision::Minute),
        [hh, mm, ss] => (
            *hh,
            *mm,
            *ss,
            if frac.is_some() {
                DateTimePrecision::Millisecond
            } else {
                DateTimePrecision::Second
            },
        ),
        _ => return None,
    };

    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    let second: u32 = s.parse().ok()?;
    let nanos = match frac {
        Some(frac) => {
            let digits: String = frac.chars().take(3).collect();
            let padded = format!("{digits:0<3}");
            padded.parse::<u32>().ok()? * 1_000_000
        }
        None => 0,
    };

    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    Some((time, precision))
}

fn format_offset(secs: i32) -> String {
    if secs == 0 {
        return "Z".to_string();
    }
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}

fn add_days(date: NaiveDate, n: i64) -> Option<NaiveDate> {
    Duration::try_days(n).and_then(|d| date.checked_add_signed(d))
}

fn add_years(date: NaiveDate, n: i64) -> Option<NaiveDate> {
    let year = (date.year() as i64).checked_add(n)?;
    let year = i32::try_from(year).ok()?;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
}

/// Calendar month addition with day-of-month clamping
/// (Jan 31 + 1 month = Feb 28/29).
fn add_months(date: NaiveDate, n: i64) -> Option<NaiveDate> {
    let zero_based = (date.year() as i64) * 12 + (date.month0() as i64);
    let shifted = zero_based.checked_add(n)?;
    let year = i32::try_from(shifted.div_euclid(12)).ok()?;
    let month = (shifted.rem_euclid(12) + 1) as u32;
    let day = date.day();
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        let last = last_day_of_month(year, month)?;
        NaiveDate::from_ymd_opt(year, month, last)
    })
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    for day in [31, 30, 29, 28] {
        if NaiveDate::from_ymd_opt(year, month, day).is_some() {
            return Some(day);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn datetime(s: &str) -> DateTime {
        DateTime::parse(s).unwrap()
    }

    fn time(s: &str) -> Time {
        Time::parse(s).unwrap()
    }

    #[test]
    fn date_parse_and_format_round_trip() {
        for s in ["2024", "2024-02", "2024-02-29"] {
            assert_eq!(date(s).format(), s);
        }
        assert!(Date::parse("2024-2-9").is_none());
        assert!(Date::parse("2023-02-29").is_none());
    }

    #[test]
    fn datetime_parse_and_format_round_trip() {
        for s in [
            "2024-01-15T10:30",
            "2024-01-15T10:30:00Z",
            "2024-01-15T10:30:00+05:30",
            "2024-01-15T10:30:00.250-04:00",
            "2015",
        ] {
            assert_eq!(datetime(s).format(), s);
        }
    }

    #[test]
    fn time_parse_and_format_round_trip() {
        for s in ["14", "14:30", "14:30:15", "14:30:15.125"] {
            assert_eq!(time(s).format(), s);
        }
    }

    #[test]
    fn same_precision_dates_compare() {
        assert_eq!(
            date("2024-01").partial_cmp_precision(&date("2024-02")),
            Some(Ordering::Less)
        );
        assert_eq!(
            date("2024-03-10").partial_cmp_precision(&date("2024-03-10")),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn mixed_precision_tie_is_undecidable() {
        assert_eq!(date("2024").partial_cmp_precision(&date("2024-02")), None);
        // Equality can still decide "not equal" across precisions.
        assert_eq!(
            date("2025").partial_cmp_precision(&date("2024-01")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn ordering_requires_matching_precision() {
        // Differing precision never orders, even when decidable in principle.
        assert_eq!(date("2025").cmp_same_precision(&date("2024-01")), None);
        assert_eq!(date("2024").cmp_same_precision(&date("2024-02")), None);
        assert_eq!(
            date("2024-01").cmp_same_precision(&date("2024-02")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn zoned_and_unzoned_do_not_compare() {
        let zoned = datetime("2024-01-15T10:30:00Z");
        let unzoned = datetime("2024-01-15T10:30:00");
        assert_eq!(zoned.partial_cmp_precision(&unzoned), None);
    }

    #[test]
    fn zoned_comparison_normalizes_to_utc() {
        let a = datetime("2024-01-15T10:00:00+02:00");
        let b = datetime("2024-01-15T08:00:00Z");
        assert_eq!(a.partial_cmp_precision(&b), Some(Ordering::Equal));
    }

    #[test]
    fn month_addition_clamps_day() {
        let d = date("2024-01-31");
        let shifted = d.checked_add(&Decimal::ONE, TemporalUnit::Month).unwrap();
        assert_eq!(shifted.format(), "2024-02-29");

        let d = date("2023-01-31");
        let shifted = d.checked_add(&Decimal::ONE, TemporalUnit::Month).unwrap();
        assert_eq!(shifted.format(), "2023-02-28");
    }

    #[test]
    fn year_precision_floors_finer_units() {
        let d = date("2024");
        let shifted = d
            .checked_add(&Decimal::from(11), TemporalUnit::Month)
            .unwrap();
        assert_eq!(shifted.format(), "2024");
        let shifted = d
            .checked_add(&Decimal::from(24), TemporalUnit::Month)
            .unwrap();
        assert_eq!(shifted.format(), "2026");
    }

    #[test]
    fn day_precision_floors_hours() {
        let d = date("2024-03-01");
        let shifted = d.checked_add(&Decimal::from(23), TemporalUnit::Hour).unwrap();
        assert_eq!(shifted.format(), "2024-03-01");
        let shifted = d.checked_add(&Decimal::from(48), TemporalUnit::Hour).unwrap();
        assert_eq!(shifted.format(), "2024-03-03");
    }

    #[test]
    fn datetime_addition_keeps_offset_and_precision() {
        let dt = datetime("2024-01-15T10:30:00+02:00");
        let shifted = dt.checked_add(&Decimal::from(90), TemporalUnit::Minute).unwrap();
        assert_eq!(shifted.format(), "2024-01-15T12:00:00+02:00");
    }

    #[test]
    fn datetime_month_addition_is_calendar() {
        let dt = datetime("2024-01-31T12:00:00");
        let shifted = dt.checked_add(&Decimal::ONE, TemporalUnit::Month).unwrap();
        assert_eq!(shifted.format(), "2024-02-29T12:00:00");
    }

    #[test]
    fn negative_quantities_subtract() {
        let d = date("2024-03-31");
        let shifted = d
            .checked_add(&Decimal::from(-1), TemporalUnit::Month)
            .unwrap();
        assert_eq!(shifted.format(), "2024-02-29");
    }

    #[test]
    fn fractional_values_truncate() {
        let d = date("2024-03-01");
        let shifted = d
            .checked_add(&Decimal::from_str("1.9").unwrap(), TemporalUnit::Day)
            .unwrap();
        assert_eq!(shifted.format(), "2024-03-02");
    }

    #[test]
    fn time_addition_wraps_midnight() {
        let t = time("23:30");
        let shifted = t.checked_add(&Decimal::ONE, TemporalUnit::Hour).unwrap();
        assert_eq!(shifted.format(), "00:30");
        let shifted = t.checked_add(&Decimal::from(-24), TemporalUnit::Hour).unwrap();
        assert_eq!(shifted.format(), "23:30");
    }

    #[test]
    fn time_mixed_precision_is_undecidable_on_tie() {
        assert_eq!(time("14").partial_cmp_precision(&time("14:30")), None);
        assert_eq!(
            time("14:00").partial_cmp_precision(&time("15:00")),
            Some(Ordering::Less)
        );
    }
}
