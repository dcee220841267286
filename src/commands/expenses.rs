// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::classify;
use crate::payment::{self, PaymentOutcome};
use crate::schedule;
use crate::store::{self, NewFixedExpense};
use crate::utils::{fmt_money, maybe_print_json, parse_id, pretty_table, today};
use crate::validate;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("pay", sub)) => {
            let id = parse_id(sub, "id")?;
            let amount_raw = sub.get_one::<String>("amount").unwrap();
            let paid = crate::utils::parse_decimal(amount_raw)?;
            let outcome = payment::apply_payment(conn, id, paid, today())?;
            report(&outcome);
        }
        Some(("mark-paid", sub)) => {
            let id = parse_id(sub, "id")?;
            let outcome = payment::mark_paid(conn, id, today())?;
            report(&outcome);
        }
        Some(("reassign-account", sub)) => {
            let id = parse_id(sub, "id")?;
            let account_id = sub
                .get_one::<String>("account-id")
                .map(|s| s.parse::<i64>())
                .transpose()?;
            let outcome = payment::reassign_expense_account(conn, id, account_id)?;
            for n in &outcome.notices {
                eprintln!("note: {}", n);
            }
            match account_id {
                Some(aid) => println!("Expense '{}' now linked to #{}", outcome.expense.name, aid),
                None => println!("Expense '{}' is now unlinked", outcome.expense.name),
            }
        }
        Some(("reassign-category", sub)) => {
            let id = parse_id(sub, "id")?;
            let category = sub.get_one::<String>("category").unwrap();
            let outcome = payment::reassign_category(conn, id, category)?;
            println!(
                "Expense '{}' moved to category '{}'",
                outcome.expense.name, outcome.expense.category
            );
        }
        Some(("update", sub)) => {
            let id = parse_id(sub, "id")?;
            let name = sub.get_one::<String>("name").map(|s| s.as_str());
            let due = sub
                .get_one::<String>("due")
                .map(|s| validate::date(s, today()).into_result())
                .transpose()?;
            let amount = sub
                .get_one::<String>("amount")
                .map(|s| validate::amount(s).into_result())
                .transpose()?;
            let expense = store::update_fixed_expense(conn, id, name, due, amount)?;
            println!(
                "Updated expense '{}' ({} due {})",
                expense.name,
                fmt_money(&expense.amount),
                expense.due_date
            );
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub, "id")?;
            store::delete_fixed_expense(conn, id)?;
            println!("Removed expense #{}", id);
        }
        Some(("summary", sub)) => summary(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let due = validate::date(sub.get_one::<String>("due").unwrap(), today()).into_result()?;
    let amount = validate::amount(sub.get_one::<String>("amount").unwrap()).into_result()?;
    let category = sub.get_one::<String>("category").unwrap();
    let account_id = sub
        .get_one::<String>("account-id")
        .map(|s| s.parse::<i64>())
        .transpose()?;
    let target_credit_card_id = sub
        .get_one::<String>("target-card-id")
        .map(|s| s.parse::<i64>())
        .transpose()?;
    let expense = store::insert_fixed_expense(
        conn,
        &NewFixedExpense {
            name: name.clone(),
            due_date: due,
            amount,
            category: category.clone(),
            account_id,
            target_credit_card_id,
            recurring_template_id: None,
        },
        today(),
    )?;
    println!(
        "Added expense '{}' (#{}, {} due {}, {})",
        expense.name,
        expense.id,
        fmt_money(&expense.amount),
        expense.due_date,
        expense.status
    );
    Ok(())
}

fn list(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    store::refresh_expense_statuses(conn, today())?;
    let category = sub.get_one::<String>("category").map(|s| s.as_str());
    let expenses = store::list_fixed_expenses(conn, category)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &expenses)? {
        let rows = expenses
            .iter()
            .map(|e| {
                let remaining = (e.amount - e.paid_amount).max(rust_decimal::Decimal::ZERO);
                vec![
                    e.id.to_string(),
                    e.name.clone(),
                    e.due_date.to_string(),
                    fmt_money(&e.amount),
                    fmt_money(&e.paid_amount),
                    fmt_money(&remaining),
                    e.category.clone(),
                    e.status.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Due", "Amount", "Paid", "Remaining", "Category", "Status"],
                rows
            )
        );
    }
    Ok(())
}

fn summary(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    store::refresh_expense_statuses(conn, today())?;
    let settings = store::get_paycheck_settings(conn)?;
    let dates = schedule::paycheck_dates(settings.last_paycheck_date, today());
    let expenses = store::list_fixed_expenses(conn, None)?;
    let totals = classify::summarise_totals(&expenses, &dates, today());
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &totals)? {
        let rows = vec![
            vec!["Overdue".to_string(), fmt_money(&totals.overdue_total)],
            vec![
                "Pay This Week".to_string(),
                fmt_money(&totals.pay_this_week_total),
            ],
            vec![
                "Pay with Next Check".to_string(),
                fmt_money(&totals.pay_next_check_total),
            ],
        ];
        println!("{}", pretty_table(&["Bucket", "Remaining"], rows));
    }
    Ok(())
}

fn report(outcome: &PaymentOutcome) {
    for n in &outcome.notices {
        eprintln!("note: {}", n);
    }
    println!(
        "Expense '{}' paid {} of {} ({})",
        outcome.expense.name,
        fmt_money(&outcome.expense.paid_amount),
        fmt_money(&outcome.expense.amount),
        outcome.expense.status
    );
}
