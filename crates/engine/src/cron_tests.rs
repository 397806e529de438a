// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
}

#[parameterized(
    every_minute = { "* * * * *" },
    hourly = { "0 * * * *" },
    daily_nine = { "0 9 * * *" },
    steps = { "*/5 8-18 * * 1-5" },
    lists = { "0,15,30,45 0 1,15 * *" },
    sunday_seven = { "0 0 * * 7" },
)]
fn parse_accepts(expr: &str) {
    assert!(parse_cron(expr).is_ok());
}

#[parameterized(
    too_few = { "* * * *" },
    too_many = { "* * * * * *" },
    bad_minute = { "60 * * * *" },
    bad_hour = { "* 24 * * *" },
    bad_dom = { "* * 0 * *" },
    bad_month = { "* * * 13 *" },
    zero_step = { "*/0 * * * *" },
    reversed_range = { "30-10 * * * *" },
    word = { "every * * * *" },
)]
fn parse_rejects(expr: &str) {
    assert!(parse_cron(expr).is_err());
}

#[test]
fn parse_tz_resolves_known_zones() {
    assert!(parse_tz("UTC").is_ok());
    assert!(parse_tz("Europe/Berlin").is_ok());
    assert!(matches!(parse_tz("Mars/Olympus"), Err(CronError::Timezone(_))));
}

#[test]
fn next_hourly_is_top_of_next_hour() {
    let expr = parse_cron("0 * * * *").unwrap();
    let after = utc(2026, 2, 1, 10, 30, 12);
    let next = cron_next_tz(&expr, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, utc(2026, 2, 1, 11, 0, 0));
}

#[test]
fn next_is_strictly_after_even_on_boundary() {
    let expr = parse_cron("0 * * * *").unwrap();
    let after = utc(2026, 2, 1, 10, 0, 0);
    let next = cron_next_tz(&expr, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, utc(2026, 2, 1, 11, 0, 0));
}

#[test]
fn next_daily_rolls_to_tomorrow() {
    let expr = parse_cron("30 9 * * *").unwrap();
    let after = utc(2026, 2, 1, 12, 0, 0);
    let next = cron_next_tz(&expr, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, utc(2026, 2, 2, 9, 30, 0));
}

#[test]
fn next_respects_timezone_wall_clock() {
    // 09:00 in Berlin (UTC+1 in winter) is 08:00 UTC.
    let expr = parse_cron("0 9 * * *").unwrap();
    let after = utc(2026, 2, 1, 0, 0, 0);
    let next = cron_next_tz(&expr, chrono_tz::Europe::Berlin, after).unwrap();
    assert_eq!(next, utc(2026, 2, 1, 8, 0, 0));
}

#[test]
fn next_weekday_restriction() {
    // 2026-02-01 is a Sunday; next Monday is 02-02.
    let expr = parse_cron("0 6 * * 1").unwrap();
    let after = utc(2026, 2, 1, 12, 0, 0);
    let next = cron_next_tz(&expr, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, utc(2026, 2, 2, 6, 0, 0));
}

#[test]
fn dom_and_dow_fire_on_either_when_both_restricted() {
    // Day 15 OR Monday, whichever comes first after Sun 2026-02-01.
    let expr = parse_cron("0 0 15 * 1").unwrap();
    let after = utc(2026, 2, 1, 12, 0, 0);
    let next = cron_next_tz(&expr, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, utc(2026, 2, 2, 0, 0, 0));
}

#[test]
fn sunday_as_seven_matches_sunday() {
    let expr = parse_cron("0 0 * * 7").unwrap();
    // Saturday 2026-02-07 -> Sunday 2026-02-08.
    let after = utc(2026, 2, 7, 12, 0, 0);
    let next = cron_next_tz(&expr, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, utc(2026, 2, 8, 0, 0, 0));
}

#[test]
fn impossible_date_returns_none() {
    let expr = parse_cron("0 0 30 2 *").unwrap();
    let after = utc(2026, 1, 1, 0, 0, 0);
    assert_eq!(cron_next_tz(&expr, chrono_tz::UTC, after), None);
}

#[test]
fn step_field_fires_on_multiples() {
    let expr = parse_cron("*/15 * * * *").unwrap();
    let after = utc(2026, 2, 1, 10, 16, 0);
    let next = cron_next_tz(&expr, chrono_tz::UTC, after).unwrap();
    assert_eq!(next, utc(2026, 2, 1, 10, 30, 0));
}
