// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{maybe_print_json, parse_id, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let icon = sub.get_one::<String>("icon").unwrap();
            let color = sub.get_one::<String>("color").unwrap();
            let cat = store::insert_category(conn, name, icon, color)?;
            println!("Added category '{}' (#{})", cat.name, cat.id);
        }
        Some(("list", sub)) => {
            let cats = store::categories_cached(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let rows = cats
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.icon.clone(),
                            c.color.clone(),
                            if c.is_default { "yes".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Icon", "Color", "Built-in"], rows)
                );
            }
        }
        Some(("rename", sub)) => {
            let id = parse_id(sub, "id")?;
            let name = sub.get_one::<String>("name").unwrap();
            let cat = store::rename_category(conn, id, name)?;
            println!("Renamed category #{} to '{}'", id, cat.name);
        }
        Some(("rm", sub)) => {
            let id = parse_id(sub, "id")?;
            store::delete_category(conn, id)?;
            println!("Removed category #{}", id);
        }
        _ => {}
    }
    Ok(())
}
