// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db;
use crate::error::LedgerError;
use crate::store::{self, Snapshot};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("json", sub)) => {
            let file = sub.get_one::<String>("file").unwrap();
            let raw = fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file))?;
            let snapshot: Snapshot =
                serde_json::from_str(&raw).with_context(|| format!("Invalid snapshot in {}", file))?;
            if snapshot.version > db::SCHEMA_VERSION {
                return Err(LedgerError::SchemaRegression {
                    found: snapshot.version,
                    supported: db::SCHEMA_VERSION,
                }
                .into());
            }
            store::import_snapshot(conn, &snapshot)?;
            println!(
                "Imported {} account(s), {} card(s), {} expense(s) from {}",
                snapshot.accounts.len(),
                snapshot.credit_cards.len(),
                snapshot.fixed_expenses.len(),
                file
            );
            Ok(())
        }
        _ => Ok(()),
    }
}
