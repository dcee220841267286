// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use digibook::schedule::paycheck_dates;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn rolls_forward_to_the_first_payday_after_today() {
    let dates = paycheck_dates(Some(d(2025, 7, 25)), d(2025, 8, 4));
    assert_eq!(dates.next_pay_date, Some(d(2025, 8, 8)));
    assert_eq!(dates.following_pay_date, Some(d(2025, 8, 22)));
    assert_eq!(dates.days_until_next_pay, Some(4));
    assert_eq!(dates.days_until_following_pay, Some(18));
}

#[test]
fn window_advances_once_the_payday_passes() {
    let dates = paycheck_dates(Some(d(2025, 7, 25)), d(2025, 8, 9));
    assert_eq!(dates.next_pay_date, Some(d(2025, 8, 22)));
    assert_eq!(dates.following_pay_date, Some(d(2025, 9, 5)));
}

#[test]
fn payday_equal_to_today_rolls_forward() {
    // next must be strictly after today
    let dates = paycheck_dates(Some(d(2025, 7, 25)), d(2025, 8, 8));
    assert_eq!(dates.next_pay_date, Some(d(2025, 8, 22)));
}

#[test]
fn stale_paycheck_date_rolls_many_periods() {
    let dates = paycheck_dates(Some(d(2024, 1, 5)), d(2025, 8, 4));
    let next = dates.next_pay_date.unwrap();
    assert!(next > d(2025, 8, 4));
    assert!((next - d(2024, 1, 5)).num_days() % 14 == 0);
    assert_eq!(dates.following_pay_date.unwrap(), next + chrono::Duration::days(14));
}

#[test]
fn dst_boundary_is_fourteen_calendar_days() {
    // 2025-03-09 crosses the US spring-forward change
    let dates = paycheck_dates(Some(d(2025, 3, 9)), d(2025, 3, 10));
    assert_eq!(dates.next_pay_date, Some(d(2025, 3, 23)));
}

#[test]
fn unset_paycheck_date_yields_all_none() {
    let dates = paycheck_dates(None, d(2025, 8, 4));
    assert_eq!(dates.next_pay_date, None);
    assert_eq!(dates.following_pay_date, None);
    assert_eq!(dates.days_until_next_pay, None);
    assert_eq!(dates.days_until_following_pay, None);
}
