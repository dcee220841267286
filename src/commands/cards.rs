// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, parse_id, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let limit = parse_decimal(sub.get_one::<String>("limit").unwrap())?;
            let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
            let due = parse_date(sub.get_one::<String>("due").unwrap())?;
            let closing = sub
                .get_one::<String>("closing")
                .map(|s| parse_date(s))
                .transpose()?;
            let min = parse_decimal(sub.get_one::<String>("min").unwrap())?;
            let card =
                store::insert_credit_card(conn, name, balance, limit, rate, due, closing, min)?;
            println!(
                "Added credit card '{}' (#{}, balance {}, due {})",
                card.name,
                card.id,
                fmt_money(&card.balance),
                card.due_date
            );
        }
        Some(("list", sub)) => {
            let cards = store::list_credit_cards(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cards)? {
                let rows = cards
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            fmt_money(&c.balance),
                            fmt_money(&c.credit_limit),
                            format!("{}%", c.interest_rate),
                            c.due_date.to_string(),
                            fmt_money(&c.minimum_payment),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Balance", "Limit", "APR", "Due", "Min Payment"],
                        rows
                    )
                );
            }
        }
        Some(("update", sub)) => {
            let id = parse_id(sub, "id")?;
            let name = sub.get_one::<String>("name").map(|s| s.as_str());
            let balance = sub
                .get_one::<String>("balance")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let limit = sub
                .get_one::<String>("limit")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let min = sub
                .get_one::<String>("min")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let due = sub
                .get_one::<String>("due")
                .map(|s| parse_date(s))
                .transpose()?;
            let card = store::update_credit_card(conn, id, name, balance, limit, min, due)?;
            println!(
                "Updated credit card '{}' (balance {})",
                card.name,
                fmt_money(&card.balance)
            );
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub, "id")?;
            store::delete_credit_card(conn, id)?;
            println!("Removed credit card #{}", id);
        }
        _ => {}
    }
    Ok(())
}
