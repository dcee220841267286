// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::audit;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let limit = sub
                .get_one::<String>("limit")
                .map(|s| {
                    s.parse::<usize>()
                        .with_context(|| format!("Invalid limit '{}'", s))
                })
                .transpose()?;
            let logs = audit::list(conn, limit)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &logs)? {
                let rows = logs
                    .iter()
                    .map(|l| {
                        vec![
                            l.id.to_string(),
                            l.timestamp.clone(),
                            l.action_type.as_str().to_string(),
                            l.entity_type.clone(),
                            l.entity_id.to_string(),
                            l.details.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Timestamp", "Action", "Entity", "Entity ID", "Details"], rows)
                );
            }
        }
        Some(("clear", _)) => {
            let removed = audit::clear_all(conn)?;
            println!("Cleared {} audit record(s)", removed);
        }
        _ => {}
    }
    Ok(())
}
