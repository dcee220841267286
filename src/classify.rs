// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::FixedExpense;
use crate::schedule::PaycheckDates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExpenseStatus {
    Paid,
    PartiallyPaid,
    Overdue,
    PayThisWeek,
    PayWithNextCheck,
    PayWithFollowingCheck,
    Unknown,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Paid => "Paid",
            ExpenseStatus::PartiallyPaid => "Partially Paid",
            ExpenseStatus::Overdue => "Overdue",
            ExpenseStatus::PayThisWeek => "Pay This Week",
            ExpenseStatus::PayWithNextCheck => "Pay with Next Check",
            ExpenseStatus::PayWithFollowingCheck => "Pay with Following Check",
            ExpenseStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an expense onto the paycheck window. The arms are ordered; ties
/// resolve to the first match.
pub fn classify(
    amount: Decimal,
    paid_amount: Decimal,
    due_date: NaiveDate,
    dates: &PaycheckDates,
    today: NaiveDate,
) -> ExpenseStatus {
    if paid_amount >= amount {
        return ExpenseStatus::Paid;
    }
    if paid_amount > Decimal::ZERO {
        return ExpenseStatus::PartiallyPaid;
    }
    if due_date < today {
        return ExpenseStatus::Overdue;
    }
    let (Some(next), Some(following)) = (dates.next_pay_date, dates.following_pay_date) else {
        return ExpenseStatus::Unknown;
    };
    if due_date <= next {
        return ExpenseStatus::PayThisWeek;
    }
    if due_date <= following {
        return ExpenseStatus::PayWithNextCheck;
    }
    ExpenseStatus::PayWithFollowingCheck
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketTotals {
    pub pay_this_week_total: Decimal,
    pub pay_next_check_total: Decimal,
    pub overdue_total: Decimal,
}

/// Sum the remaining amounts of the three actionable buckets. "Pay with
/// Following Check" deliberately contributes nothing.
pub fn summarise_totals(
    expenses: &[FixedExpense],
    dates: &PaycheckDates,
    today: NaiveDate,
) -> BucketTotals {
    let mut totals = BucketTotals {
        pay_this_week_total: Decimal::ZERO,
        pay_next_check_total: Decimal::ZERO,
        overdue_total: Decimal::ZERO,
    };
    for e in expenses {
        let remaining = e.amount - e.paid_amount;
        match classify(e.amount, e.paid_amount, e.due_date, dates, today) {
            ExpenseStatus::PayThisWeek => totals.pay_this_week_total += remaining,
            ExpenseStatus::PayWithNextCheck => totals.pay_next_check_total += remaining,
            ExpenseStatus::Overdue => totals.overdue_total += remaining,
            _ => {}
        }
    }
    totals
}
