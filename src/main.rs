// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use digibook::error::{LedgerError, Severity};
use digibook::{cli, commands, db};

fn main() {
    if let Err(err) = run() {
        // Lift raw SQLite failures into the ledger vocabulary before
        // picking a severity.
        let lifted = err
            .downcast_ref::<rusqlite::Error>()
            .and_then(LedgerError::from_sqlite);
        let kind = lifted.as_ref().or_else(|| err.downcast_ref::<LedgerError>());
        let severity = kind.map(LedgerError::severity).unwrap_or(Severity::Medium);
        match lifted {
            Some(e) => eprintln!("error[{}]: {}", severity.as_str(), e),
            None => eprintln!("error[{}]: {:#}", severity.as_str(), err),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("account", sub)) => commands::accounts::handle(&mut conn, sub)?,
        Some(("card", sub)) => commands::cards::handle(&mut conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&mut conn, sub)?,
        Some(("expense", sub)) => commands::expenses::handle(&mut conn, sub)?,
        Some(("pending", sub)) => commands::pending::handle(&mut conn, sub)?,
        Some(("paycheck", sub)) => commands::paycheck::handle(&mut conn, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("audit", sub)) => commands::auditlog::handle(&conn, sub)?,
        Some(("pin", sub)) => commands::pinlock::handle(sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        Some(("reset", sub)) => {
            if !sub.get_flag("yes") {
                eprintln!("reset erases every table; re-run with --yes to confirm");
            } else {
                digibook::store::clear_all_data(&mut conn)?;
                db::init(&mut conn)?;
                println!("Ledger reset; defaults re-seeded");
            }
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
