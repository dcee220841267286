// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Months, NaiveDate};
use rusqlite::{params, Connection};

use crate::models::{FixedExpense, Frequency, RecurringTemplate};
use crate::store::{self, NewFixedExpense};

/// The n-th occurrence of a template. Occurrences are always computed
/// from the start date so a month-end start keeps its day instead of
/// drifting after a short month.
pub fn occurrence(template: &RecurringTemplate, n: u32) -> Option<NaiveDate> {
    let step = template.frequency.months(template.interval_value);
    template
        .start_date
        .checked_add_months(Months::new(n * step))
}

pub fn next_occurrence_after(template: &RecurringTemplate, date: NaiveDate) -> Option<NaiveDate> {
    let mut n = 0;
    loop {
        let due = occurrence(template, n)?;
        if due > date {
            return Some(due);
        }
        n += 1;
    }
}

/// Instantiate every missing expense occurrence due on or before
/// `through`. Already-materialised occurrences (matched by template and
/// due date) are left alone, so the run is idempotent.
pub fn run_due(conn: &mut Connection, through: NaiveDate) -> Result<Vec<FixedExpense>> {
    let templates = store::list_recurring_templates(conn)?;
    let mut created = Vec::new();
    for t in &templates {
        let mut n = 0;
        while let Some(due) = occurrence(t, n) {
            if due > through {
                break;
            }
            let exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM fixed_expenses
                 WHERE recurring_template_id=?1 AND due_date=?2",
                params![t.id, due],
                |r| r.get(0),
            )?;
            if exists == 0 {
                let new = NewFixedExpense {
                    name: t.name.clone(),
                    due_date: due,
                    amount: t.base_amount,
                    category: t.category.clone(),
                    account_id: t.account_id,
                    target_credit_card_id: None,
                    recurring_template_id: Some(t.id),
                };
                created.push(store::insert_fixed_expense(conn, &new, through)?);
            }
            n += 1;
        }
    }
    Ok(created)
}

/// Human-readable cadence for listings.
pub fn describe_frequency(frequency: Frequency, interval_value: u32) -> String {
    match frequency {
        Frequency::Custom => format!("every {} month(s)", interval_value.max(1)),
        other => other.as_str().to_string(),
    }
}
