// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Frequency;
use crate::recurring;
use crate::store::{self, NewRecurringTemplate};
use crate::utils::{fmt_money, maybe_print_json, parse_id, pretty_table, today};
use crate::validate;
use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let freq_raw = sub.get_one::<String>("frequency").unwrap();
            let frequency = Frequency::parse(freq_raw).ok_or_else(|| {
                anyhow!(
                    "Invalid frequency '{}' (monthly|quarterly|biannually|annually|custom)",
                    freq_raw
                )
            })?;
            let interval_raw = sub.get_one::<String>("interval").unwrap();
            let interval_value = interval_raw
                .parse::<u32>()
                .with_context(|| format!("Invalid interval '{}'", interval_raw))?;
            let template = store::insert_recurring_template(
                conn,
                &NewRecurringTemplate {
                    name: sub.get_one::<String>("name").unwrap().clone(),
                    base_amount: validate::amount(sub.get_one::<String>("amount").unwrap())
                        .into_result()?,
                    frequency,
                    interval_value,
                    start_date: validate::date(sub.get_one::<String>("start").unwrap(), today())
                        .into_result()?,
                    category: sub.get_one::<String>("category").unwrap().clone(),
                    account_id: sub
                        .get_one::<String>("account-id")
                        .map(|s| s.parse::<i64>())
                        .transpose()?,
                    is_variable_amount: sub.get_flag("variable"),
                    notes: sub.get_one::<String>("notes").unwrap().clone(),
                },
            )?;
            println!(
                "Added template '{}' (#{}, {} {})",
                template.name,
                template.id,
                fmt_money(&template.base_amount),
                recurring::describe_frequency(template.frequency, template.interval_value)
            );
        }
        Some(("list", sub)) => {
            let templates = store::list_recurring_templates(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &templates)? {
                let rows = templates
                    .iter()
                    .map(|t| {
                        vec![
                            t.id.to_string(),
                            t.name.clone(),
                            fmt_money(&t.base_amount),
                            recurring::describe_frequency(t.frequency, t.interval_value),
                            t.start_date.to_string(),
                            t.category.clone(),
                            if t.is_variable_amount { "yes".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Amount", "Frequency", "Start", "Category", "Variable"],
                        rows
                    )
                );
            }
        }
        Some(("run", sub)) => {
            let through = sub
                .get_one::<String>("through")
                .map(|s| validate::date(s, today()).into_result())
                .transpose()?
                .unwrap_or_else(today);
            let created = recurring::run_due(conn, through)?;
            if created.is_empty() {
                println!("No occurrences due through {}", through);
            } else {
                for e in &created {
                    println!(
                        "Created expense '{}' ({} due {})",
                        e.name,
                        fmt_money(&e.amount),
                        e.due_date
                    );
                }
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub, "id")?;
            store::delete_recurring_template(conn, id)?;
            println!("Removed template #{}", id);
        }
        _ => {}
    }
    Ok(())
}
