// Date-math resolution for panel time bounds ("now-15m", "now/d", ISO dates)
use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc,
};

/// Timestamp layout the query language expects inside time clauses
pub const PPL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    fn parse(c: char) -> Option<Self> {
        match c {
            's' => Some(Unit::Second),
            'm' => Some(Unit::Minute),
            'h' | 'H' => Some(Unit::Hour),
            'd' => Some(Unit::Day),
            'w' => Some(Unit::Week),
            'M' => Some(Unit::Month),
            'y' => Some(Unit::Year),
            _ => None,
        }
    }
}

/// Resolve a bound to an absolute instant.
///
/// `round_up` selects the end of the rounding unit and should be set for
/// the upper bound of a range. Returns `None` for anything unparseable.
pub fn resolve(expr: &str, round_up: bool, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let expr = expr.trim();
    if let Some(ops) = expr.strip_prefix("now") {
        return apply_ops(now, ops, round_up);
    }
    parse_absolute(expr)
}

/// Resolve and format for a query clause, keeping the raw text when it
/// cannot be resolved.
pub fn to_query_timestamp(expr: &str, round_up: bool, now: DateTime<Utc>) -> String {
    match resolve(expr, round_up, now) {
        Some(instant) => instant.format(PPL_DATE_FORMAT).to_string(),
        None => expr.trim().to_string(),
    }
}

fn parse_absolute(expr: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(expr) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in [PPL_DATE_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(expr, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(expr, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn apply_ops(mut current: DateTime<Utc>, ops: &str, round_up: bool) -> Option<DateTime<Utc>> {
    let chars: Vec<char> = ops.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '/' => {
                let unit = Unit::parse(*chars.get(i + 1)?)?;
                current = if round_up {
                    ceil(current, unit)?
                } else {
                    floor(current, unit)?
                };
                i += 2;
            }
            sign @ ('+' | '-') => {
                i += 1;
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let amount: i64 = if start == i {
                    1
                } else {
                    chars[start..i].iter().collect::<String>().parse().ok()?
                };
                let unit = Unit::parse(*chars.get(i)?)?;
                let amount = if sign == '-' { -amount } else { amount };
                current = shift(current, amount, unit)?;
                i += 1;
            }
            _ => return None,
        }
    }
    Some(current)
}

fn shift(dt: DateTime<Utc>, amount: i64, unit: Unit) -> Option<DateTime<Utc>> {
    let months = match unit {
        Unit::Second => return dt.checked_add_signed(Duration::try_seconds(amount)?),
        Unit::Minute => return dt.checked_add_signed(Duration::try_minutes(amount)?),
        Unit::Hour => return dt.checked_add_signed(Duration::try_hours(amount)?),
        Unit::Day => return dt.checked_add_signed(Duration::try_days(amount)?),
        Unit::Week => return dt.checked_add_signed(Duration::try_weeks(amount)?),
        Unit::Month => amount,
        Unit::Year => amount.checked_mul(12)?,
    };
    let step = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months < 0 {
        dt.checked_sub_months(step)
    } else {
        dt.checked_add_months(step)
    }
}

fn floor(dt: DateTime<Utc>, unit: Unit) -> Option<DateTime<Utc>> {
    let date = dt.date_naive();
    let midnight = |d: NaiveDate| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN));
    match unit {
        Unit::Second => dt.with_nanosecond(0),
        Unit::Minute => dt.with_nanosecond(0)?.with_second(0),
        Unit::Hour => dt.with_nanosecond(0)?.with_second(0)?.with_minute(0),
        Unit::Day => Some(midnight(date)),
        Unit::Week => {
            let back = i64::from(date.weekday().num_days_from_monday());
            Some(midnight(date.checked_sub_signed(Duration::try_days(back)?)?))
        }
        Unit::Month => Some(midnight(date.with_day(1)?)),
        Unit::Year => Some(midnight(date.with_ordinal(1)?)),
    }
}

fn ceil(dt: DateTime<Utc>, unit: Unit) -> Option<DateTime<Utc>> {
    let next = shift(floor(dt, unit)?, 1, unit)?;
    next.checked_sub_signed(Duration::try_milliseconds(1)?)
}
