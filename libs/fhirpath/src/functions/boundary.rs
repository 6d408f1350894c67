//! Boundary functions: `lowBoundary`, `highBoundary`, `precision`.
//!
//! Precision counts "digits of precision" per FHIRPath: dates are 4/6/8,
//! datetimes add 10/12/14 and 17 with fractional seconds, times are
//! 2/4/6/9, decimals count mantissa digits. Boundary results are padded
//! out to the requested precision; an unrepresentable precision yields
//! the empty collection.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::quantity::Quantity;
use crate::temporal::{
    Date, DatePrecision, DateTime, DateTimePrecision, Time, TimePrecision,
};
use crate::value::{Collection, Value};

enum Edge {
    Low,
    High,
}

pub fn low_boundary(input: Collection, precision: Option<&Collection>) -> Result<Collection> {
    boundary(input, precision, Edge::Low)
}

pub fn high_boundary(input: Collection, precision: Option<&Collection>) -> Result<Collection> {
    boundary(input, precision, Edge::High)
}

fn boundary(
    input: Collection,
    precision: Option<&Collection>,
    edge: Edge,
) -> Result<Collection> {
    let digits = match precision {
        Some(arg) if !arg.is_empty() => Some(arg.as_integer("boundary precision")? as i32),
        _ => None,
    };

    let Some(value) = input.singleton_value("lowBoundary()/highBoundary()")? else {
        return Ok(Collection::empty());
    };

    let out = match value {
        Value::Decimal(d) => decimal_boundary(d, d.scale(), digits, &edge).map(Value::Decimal),
        Value::Integer(i) => {
            decimal_boundary(Decimal::from(i), 0, digits, &edge).map(Value::Decimal)
        }
        Value::Long(l) => decimal_boundary(Decimal::from(l), 0, digits, &edge).map(Value::Decimal),
        Value::Quantity(q) => decimal_boundary(q.value, q.value.scale(), digits, &edge)
            .map(|v| Value::Quantity(Quantity::new(v, q.unit))),
        Value::Date(d) => date_boundary(&d, digits, &edge).map(Value::Date),
        Value::DateTime(dt) => datetime_boundary(&dt, digits, &edge).map(Value::DateTime),
        Value::Time(t) => time_boundary(&t, digits, &edge).map(Value::Time),
        other => {
            return Err(Error::Type(format!(
                "boundary functions require a Decimal, Quantity, Date, DateTime or Time, found {other:?}"
            )));
        }
    };

    Ok(match out {
        Some(v) => Collection::singleton(v),
        None => Collection::empty(),
    })
}

/// Half a unit in the last stored place, padded to the target scale.
fn decimal_boundary(value: Decimal, scale: u32, digits: Option<i32>, edge: &Edge) -> Option<Decimal> {
    let target = digits.unwrap_or(8);
    if !(0..=28).contains(&target) {
        return None;
    }
    let target = target as u32;

    let mut half = Decimal::from(5);
    half.set_scale(scale + 1).ok()?;

    let mut out = match edge {
        Edge::Low => value.checked_sub(half)?,
        Edge::High => value.checked_add(half)?,
    };
    if out.scale() <= target {
        out.rescale(target);
        Some(out)
    } else {
        Some(out.round_dp(target))
    }
}

fn date_boundary(date: &Date, digits: Option<i32>, edge: &Edge) -> Option<Date> {
    let target = match digits.unwrap_or(8) {
        4 => DatePrecision::Year,
        6 => DatePrecision::Month,
        8 => DatePrecision::Day,
        _ => return None,
    };
    let (year, month, day) = date_fields(date, target, edge)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(Date::new(date, target))
}

fn date_fields(date: &Date, target: DatePrecision, edge: &Edge) -> Option<(i32, u32, u32)> {
    use chrono::Datelike;
    let year = date.date.year();
    let has_month = date.precision >= DatePrecision::Month;
    let has_day = date.precision >= DatePrecision::Day;

    let month = if target >= DatePrecision::Month {
        if has_month {
            date.date.month()
        } else {
            match edge {
                Edge::Low => 1,
                Edge::High => 12,
            }
        }
    } else {
        return Some((year, 1, 1));
    };

    let day = if target >= DatePrecision::Day {
        if has_day {
            date.date.day()
        } else {
            match edge {
                Edge::Low => 1,
                Edge::High => last_day_of_month(year, month)?,
            }
        }
    } else {
        1
    };

    Some((year, month, day))
}

fn datetime_boundary(dt: &DateTime, digits: Option<i32>, edge: &Edge) -> Option<DateTime> {
    use chrono::Timelike;

    let target = match digits.unwrap_or(17) {
        4 => DateTimePrecision::Year,
        6 => DateTimePrecision::Month,
        8 => DateTimePrecision::Day,
        10 => DateTimePrecision::Hour,
        12 => DateTimePrecision::Minute,
        14 => DateTimePrecision::Second,
        17 => DateTimePrecision::Millisecond,
        _ => return None,
    };

    let local = dt.local();
    let date = Date::new(
        local.date(),
        match dt.precision {
            DateTimePrecision::Year => DatePrecision::Year,
            DateTimePrecision::Month => DatePrecision::Month,
            _ => DatePrecision::Day,
        },
    );
    let date_target = match target {
        DateTimePrecision::Year => DatePrecision::Year,
        DateTimePrecision::Month => DatePrecision::Month,
        _ => DatePrecision::Day,
    };
    let (year, month, day) = date_fields(&date, date_target, edge)?;

    let fill = |have: bool, value: u32, low: u32, high: u32| {
        if have {
            value
        } else {
            match edge {
                Edge::Low => low,
                Edge::High => high,
            }
        }
    };

    let hour = if target >= DateTimePrecision::Hour {
        fill(
            dt.precision >= DateTimePrecision::Hour,
            local.time().hour(),
            0,
            23,
        )
    } else {
        0
    };
    let minute = if target >= DateTimePrecision::Minute {
        fill(
            dt.precision >= DateTimePrecision::Minute,
            local.time().minute(),
            0,
            59,
        )
    } else {
        0
    };
    let second = if target >= DateTimePrecision::Second {
        fill(
            dt.precision >= DateTimePrecision::Second,
            local.time().second(),
            0,
            59,
        )
    } else {
        0
    };
    let millis = if target >= DateTimePrecision::Millisecond {
        fill(
            dt.precision >= DateTimePrecision::Millisecond,
            local.time().nanosecond() / 1_000_000,
            0,
            999,
        )
    } else {
        0
    };

    let naive = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(year, month, day)?,
        NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?,
    );
    Some(rebuild_datetime(dt, naive, target))
}

fn rebuild_datetime(
    original: &DateTime,
    naive: NaiveDateTime,
    precision: DateTimePrecision,
) -> DateTime {
    use chrono::{FixedOffset, TimeZone, Utc};
    let instant = match original.offset {
        Some(secs) => FixedOffset::east_opt(secs)
            .and_then(|offset| offset.from_local_datetime(&naive).single())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| chrono::DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)),
        None => chrono::DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
    };
    DateTime::new(instant, precision, original.offset)
}

fn time_boundary(time: &Time, digits: Option<i32>, edge: &Edge) -> Option<Time> {
    use chrono::Timelike;

    let target = match digits.unwrap_or(9) {
        2 => TimePrecision::Hour,
        4 => TimePrecision::Minute,
        6 => TimePrecision::Second,
        9 => TimePrecision::Millisecond,
        _ => return None,
    };

    let fill = |have: bool, value: u32, low: u32, high: u32| {
        if have {
            value
        } else {
            match edge {
                Edge::Low => low,
                Edge::High => high,
            }
        }
    };

    let hour = time.time.hour();
    let minute = if target >= TimePrecision::Minute {
        fill(
            time.precision >= TimePrecision::Minute,
            time.time.minute(),
            0,
            59,
        )
    } else {
        0
    };
    let second = if target >= TimePrecision::Second {
        fill(
            time.precision >= TimePrecision::Second,
            time.time.second(),
            0,
            59,
        )
    } else {
        0
    };
    let millis = if target >= TimePrecision::Millisecond {
        fill(
            time.precision >= TimePrecision::Millisecond,
            time.time.nanosecond() / 1_000_000,
            0,
            999,
        )
    } else {
        0
    };

    let out = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;
    Some(Time::new(out, target))
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    for day in [31, 30, 29, 28] {
        if NaiveDate::from_ymd_opt(year, month, day).is_some() {
            return Some(day);
        }
    }
    None
}

/// Digits of precision of the input value.
pub fn precision(input: Collection) -> Result<Collection> {
    let Some(value) = input.singleton_value("precision()")? else {
        return Ok(Collection::empty());
    };
    let digits: i32 = match value {
        Value::Decimal(d) => d.mantissa().unsigned_abs().to_string().len() as i32,
        Value::Integer(i) => i.unsigned_abs().to_string().len() as i32,
        Value::Long(l) => l.unsigned_abs().to_string().len() as i32,
        Value::Date(d) => match d.precision {
            DatePrecision::Year => 4,
            DatePrecision::Month => 6,
            DatePrecision::Day => 8,
        },
        Value::DateTime(dt) => match dt.precision {
            DateTimePrecision::Year => 4,
            DateTimePrecision::Month => 6,
            DateTimePrecision::Day => 8,
            DateTimePrecision::Hour => 10,
            DateTimePrecision::Minute => 12,
            DateTimePrecision::Second => 14,
            DateTimePrecision::Millisecond => 17,
        },
        Value::Time(t) => match t.precision {
            TimePrecision::Hour => 2,
            TimePrecision::Minute => 4,
            TimePrecision::Second => 6,
            TimePrecision::Millisecond => 9,
        },
        other => {
            return Err(Error::Type(format!(
                "precision() requires a Decimal, Date, DateTime or Time, found {other:?}"
            )));
        }
    };
    Ok(Collection::singleton(Value::Integer(digits)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Collection {
        Collection::singleton(Value::Decimal(Decimal::from_str(s).unwrap()))
    }

    fn first(col: Collection) -> Value {
        col.first().cloned().unwrap()
    }

    #[test]
    fn decimal_boundaries_pad_to_default_precision() {
        let Value::Decimal(low) = first(low_boundary(dec("1.587"), None).unwrap()) else {
            panic!("expected decimal");
        };
        assert_eq!(low.to_string(), "1.58650000");

        let Value::Decimal(high) = first(high_boundary(dec("1.587"), None).unwrap()) else {
            panic!("expected decimal");
        };
        assert_eq!(high.to_string(), "1.58750000");
    }

    #[test]
    fn integer_boundaries() {
        let Value::Decimal(low) = first(low_boundary(
            Collection::singleton(Value::Integer(1)),
            None,
        )
        .unwrap()) else {
            panic!("expected decimal");
        };
        assert_eq!(low.to_string(), "0.50000000");
    }

    #[test]
    fn out_of_range_precision_is_empty() {
        let arg = Collection::singleton(Value::Integer(40));
        assert!(low_boundary(dec("1.5"), Some(&arg)).unwrap().is_empty());
    }

    #[test]
    fn date_boundaries_fill_low_and_high() {
        let date = Collection::singleton(Value::Date(Date::parse("2024").unwrap()));
        let Value::Date(low) = first(low_boundary(date.clone(), None).unwrap()) else {
            panic!("expected date");
        };
        assert_eq!(low.format(), "2024-01-01");

        let Value::Date(high) = first(high_boundary(date, None).unwrap()) else {
            panic!("expected date");
        };
        assert_eq!(high.format(), "2024-12-31");

        let feb = Collection::singleton(Value::Date(Date::parse("2024-02").unwrap()));
        let Value::Date(high) = first(high_boundary(feb, None).unwrap()) else {
            panic!("expected date");
        };
        assert_eq!(high.format(), "2024-02-29");
    }

    #[test]
    fn datetime_boundaries_extend_time() {
        let dt = Collection::singleton(Value::DateTime(
            DateTime::parse("2024-03-05T10:30").unwrap(),
        ));
        let Value::DateTime(low) = first(low_boundary(dt.clone(), None).unwrap()) else {
            panic!("expected datetime");
        };
        assert_eq!(low.format(), "2024-03-05T10:30:00.000");

        let Value::DateTime(high) = first(high_boundary(dt, None).unwrap()) else {
            panic!("expected datetime");
        };
        assert_eq!(high.format(), "2024-03-05T10:30:59.999");
    }

    #[test]
    fn time_boundaries() {
        let t = Collection::singleton(Value::Time(Time::parse("14:30").unwrap()));
        let Value::Time(low) = first(low_boundary(t.clone(), None).unwrap()) else {
            panic!("expected time");
        };
        assert_eq!(low.format(), "14:30:00.000");

        let Value::Time(high) = first(high_boundary(t, None).unwrap()) else {
            panic!("expected time");
        };
        assert_eq!(high.format(), "14:30:59.999");
    }

    #[test]
    fn precision_digit_counts() {
        assert_eq!(first(precision(dec("1.58700")).unwrap()), Value::Integer(6));
        assert_eq!(first(precision(dec("0.0")).unwrap()), Value::Integer(1));
        assert_eq!(
            first(precision(Collection::singleton(Value::Date(Date::parse("2014").unwrap()))).unwrap()),
            Value::Integer(4)
        );
        assert_eq!(
            first(
                precision(Collection::singleton(Value::DateTime(
                    DateTime::parse("2014-01-05T10:30:00.000").unwrap()
                )))
                .unwrap()
            ),
            Value::Integer(17)
        );
        assert_eq!(
            first(precision(Collection::singleton(Value::Time(Time::parse("10:30").unwrap()))).unwrap()),
            Value::Integer(4)
        );
    }
}
