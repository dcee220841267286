// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Paychecks land every 14 days from the last recorded paycheck; there is
/// no calendar-month alignment.
pub const PAY_PERIOD_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaycheckDates {
    pub next_pay_date: Option<NaiveDate>,
    pub following_pay_date: Option<NaiveDate>,
    pub days_until_next_pay: Option<i64>,
    pub days_until_following_pay: Option<i64>,
}

impl PaycheckDates {
    pub fn unset() -> Self {
        PaycheckDates {
            next_pay_date: None,
            following_pay_date: None,
            days_until_next_pay: None,
            days_until_following_pay: None,
        }
    }
}

/// Roll the biweekly window forward until the next payday is strictly
/// after `today`. NaiveDate arithmetic carries no time-of-day component,
/// so a window spanning a DST boundary still lands 14 calendar days out.
pub fn paycheck_dates(last_paycheck_date: Option<NaiveDate>, today: NaiveDate) -> PaycheckDates {
    let Some(last) = last_paycheck_date else {
        return PaycheckDates::unset();
    };
    let period = Duration::days(PAY_PERIOD_DAYS);
    let mut next = last + period;
    while next <= today {
        next += period;
    }
    let following = next + period;
    PaycheckDates {
        next_pay_date: Some(next),
        following_pay_date: Some(following),
        days_until_next_pay: Some((next - today).num_days()),
        days_until_following_pay: Some((following - today).num_days()),
    }
}
