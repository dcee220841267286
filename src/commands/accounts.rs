// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::AccountType;
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, parse_id, pretty_table};
use anyhow::{anyhow, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let typ_raw = sub.get_one::<String>("type").unwrap();
            let typ = AccountType::parse(typ_raw)
                .ok_or_else(|| anyhow!("Invalid account type '{}' (checking|savings)", typ_raw))?;
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let account = store::insert_account(conn, name, typ, balance)?;
            println!(
                "Added account '{}' (#{}, {}, balance {}){}",
                account.name,
                account.id,
                account.r#type.as_str(),
                fmt_money(&account.current_balance),
                if account.is_default { " [default]" } else { "" }
            );
        }
        Some(("list", sub)) => {
            let accounts = store::list_accounts(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                let rows = accounts
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            a.r#type.as_str().to_string(),
                            fmt_money(&a.current_balance),
                            if a.is_default { "yes".into() } else { String::new() },
                            a.created_at.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Type", "Balance", "Default", "Created"], rows)
                );
            }
        }
        Some(("set-default", sub)) => {
            let id = parse_id(sub, "id")?;
            store::set_default_account(conn, id)?;
            println!("Account #{} is now the default", id);
        }
        Some(("update", sub)) => {
            let id = parse_id(sub, "id")?;
            let name = sub.get_one::<String>("name").map(|s| s.as_str());
            let balance = sub
                .get_one::<String>("balance")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let account = store::update_account(conn, id, name, balance)?;
            println!(
                "Updated account '{}' (balance {})",
                account.name,
                fmt_money(&account.current_balance)
            );
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub, "id")?;
            store::delete_account(conn, id)?;
            println!("Removed account #{}", id);
        }
        _ => {}
    }
    Ok(())
}

