// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Five-field cron expressions with timezone-aware next-fire computation.
//!
//! Field order: minute hour day-of-month month day-of-week. Supports `*`,
//! lists, ranges, and steps (`*/5`, `1-10/2`). Standard cron semantics for
//! the day fields: when both day-of-month and day-of-week are restricted,
//! a day matching either fires.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Search horizon for the next fire time. An expression that cannot fire
/// within this window (e.g. Feb 30) yields `None`.
const MAX_SEARCH_DAYS: i64 = 366 * 4;

/// Cron parsing and evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    #[error("cron expression must have 5 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid cron field {field:?}: {value:?}")]
    Field { field: &'static str, value: String },
    #[error("unknown timezone: {0}")]
    Timezone(String),
}

/// A parsed cron expression, one bitmask per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronExpr {
    minutes: u64,
    hours: u32,
    /// Bit 1 = day 1.
    days_of_month: u32,
    /// Bit 1 = January.
    months: u16,
    /// Bit 0 = Sunday.
    days_of_week: u8,
    dom_restricted: bool,
    dow_restricted: bool,
}

const FIELD_NAMES: [&str; 5] = ["minute", "hour", "day-of-month", "month", "day-of-week"];

/// Parse a 5-field cron expression.
pub fn parse_cron(expr: &str) -> Result<CronExpr, CronError> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(CronError::FieldCount(fields.len()));
    }
    let minutes = parse_field(fields[0], 0, 59, FIELD_NAMES[0])?;
    let hours = parse_field(fields[1], 0, 23, FIELD_NAMES[1])? as u32;
    let days_of_month = parse_field(fields[2], 1, 31, FIELD_NAMES[2])? as u32;
    let months = parse_field(fields[3], 1, 12, FIELD_NAMES[3])? as u16;
    // 7 is an alias for Sunday.
    let raw_dow = parse_field(fields[4], 0, 7, FIELD_NAMES[4])? as u8;
    let days_of_week = if raw_dow & 0x80 != 0 {
        (raw_dow | 0x01) & 0x7f
    } else {
        raw_dow
    };
    Ok(CronExpr {
        minutes,
        hours,
        days_of_month,
        months,
        days_of_week,
        dom_restricted: fields[2] != "*",
        dow_restricted: fields[4] != "*",
    })
}

/// Resolve an IANA timezone name.
pub fn parse_tz(name: &str) -> Result<Tz, CronError> {
    name.parse::<Tz>()
        .map_err(|_| CronError::Timezone(name.to_string()))
}

fn parse_field(spec: &str, min: u32, max: u32, field: &'static str) -> Result<u64, CronError> {
    let err = || CronError::Field {
        field,
        value: spec.to_string(),
    };
    let mut mask: u64 = 0;
    for part in spec.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| err())?;
                if step == 0 {
                    return Err(err());
                }
                (range, step)
            }
            None => (part, 1),
        };
        let (lo, hi) = if range == "*" {
            (min, max)
        } else {
            match range.split_once('-') {
                Some((lo, hi)) => {
                    let lo: u32 = lo.parse().map_err(|_| err())?;
                    let hi: u32 = hi.parse().map_err(|_| err())?;
                    (lo, hi)
                }
                None => {
                    let value: u32 = range.parse().map_err(|_| err())?;
                    // A bare value with a step means "value..max".
                    if step > 1 {
                        (value, max)
                    } else {
                        (value, value)
                    }
                }
            }
        };
        if lo < min || hi > max || lo > hi {
            return Err(err());
        }
        let mut value = lo;
        while value <= hi {
            mask |= 1 << value;
            value += step;
        }
    }
    if mask == 0 {
        return Err(err());
    }
    Ok(mask)
}

impl CronExpr {
    fn minute_matches(&self, minute: u32) -> bool {
        self.minutes & (1 << minute) != 0
    }

    fn hour_matches(&self, hour: u32) -> bool {
        self.hours & (1 << hour) != 0
    }

    fn month_matches(&self, month: u32) -> bool {
        self.months & (1 << month) != 0
    }

    fn day_matches(&self, day: u32, weekday_from_sunday: u32) -> bool {
        let dom = self.days_of_month & (1 << day) != 0;
        let dow = self.days_of_week & (1 << weekday_from_sunday) != 0;
        match (self.dom_restricted, self.dow_restricted) {
            // Standard cron: both restricted means either may match.
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }

    fn matches_local<T: TimeZone>(&self, local: &DateTime<T>) -> bool {
        self.month_matches(local.month())
            && self.day_matches(local.day(), local.weekday().num_days_from_sunday())
            && self.hour_matches(local.hour())
            && self.minute_matches(local.minute())
    }
}

/// Next fire time strictly after `after`, evaluated in `tz`.
///
/// Candidates advance on the UTC minute timeline and are matched against
/// their local representation, so DST gaps and overlaps resolve the way the
/// wall clock actually behaves.
pub fn cron_next_tz(expr: &CronExpr, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut candidate = truncate_to_minute(after) + Duration::minutes(1);
    let horizon = after + Duration::days(MAX_SEARCH_DAYS);

    while candidate <= horizon {
        let local = candidate.with_timezone(&tz);
        if expr.matches_local(&local) {
            return Some(candidate);
        }
        // Skip to the next local midnight when the whole day can't match.
        if !expr.month_matches(local.month())
            || !expr.day_matches(local.day(), local.weekday().num_days_from_sunday())
        {
            let remaining_today =
                i64::from(23 - local.hour()) * 60 + i64::from(59 - local.minute()) + 1;
            candidate += Duration::minutes(remaining_today);
        } else {
            candidate += Duration::minutes(1);
        }
    }
    None
}

fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(at.timestamp() - i64::from(at.second()), 0)
        .single()
        .unwrap_or(at)
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
