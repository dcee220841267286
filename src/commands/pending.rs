// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::payment;
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, parse_id, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let account_id = parse_id(sub, "account-id")?;
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let category = sub.get_one::<String>("category").unwrap();
            let description = sub.get_one::<String>("description").unwrap();
            let p =
                store::insert_pending_transaction(conn, account_id, amount, category, description)?;
            println!(
                "Added pending transaction #{} ({} on account #{})",
                p.id,
                fmt_money(&p.amount),
                p.account_id
            );
        }
        Some(("list", sub)) => {
            let pending = store::list_pending_transactions(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &pending)? {
                let rows = pending
                    .iter()
                    .map(|p| {
                        vec![
                            p.id.to_string(),
                            p.account_id.to_string(),
                            fmt_money(&p.amount),
                            p.category.clone(),
                            p.description.clone(),
                            p.created_at.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Account", "Amount", "Category", "Description", "Created"],
                        rows
                    )
                );
            }
        }
        Some(("complete", sub)) => {
            let id = parse_id(sub, "id")?;
            let new_balance = payment::complete_pending(conn, id)?;
            println!(
                "Completed pending transaction #{}; account balance is now {}",
                id,
                fmt_money(&new_balance)
            );
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub, "id")?;
            store::delete_pending_transaction(conn, id)?;
            println!("Removed pending transaction #{}", id);
        }
        _ => {}
    }
    Ok(())
}
