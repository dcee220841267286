// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{self, Snapshot};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("json", sub)) => {
            let out = sub.get_one::<String>("out").unwrap();
            let snapshot = store::export_snapshot(conn)?;
            fs::write(out, serde_json::to_string_pretty(&snapshot)?)
                .with_context(|| format!("Failed to write {}", out))?;
            println!("Exported snapshot to {}", out);
            Ok(())
        }
        Some(("csv", sub)) => {
            let out_dir = sub.get_one::<String>("out-dir").unwrap();
            fs::create_dir_all(out_dir)
                .with_context(|| format!("Failed to create {}", out_dir))?;
            let snapshot = store::export_snapshot(conn)?;
            export_csv(&snapshot, Path::new(out_dir))?;
            println!("Exported CSV tables to {}", out_dir);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// One file per table; header row in column insertion order, ISO dates,
/// unquoted numerics (the csv crate quotes only when a field needs it).
fn export_csv(snap: &Snapshot, dir: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(dir.join("accounts.csv"))?;
    w.write_record(["id", "name", "type", "current_balance", "is_default", "created_at"])?;
    for a in &snap.accounts {
        w.write_record([
            a.id.to_string(),
            a.name.clone(),
            a.r#type.as_str().to_string(),
            a.current_balance.to_string(),
            a.is_default.to_string(),
            a.created_at.clone(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(dir.join("credit_cards.csv"))?;
    w.write_record([
        "id",
        "name",
        "balance",
        "credit_limit",
        "interest_rate",
        "due_date",
        "statement_closing_date",
        "minimum_payment",
        "created_at",
    ])?;
    for c in &snap.credit_cards {
        w.write_record([
            c.id.to_string(),
            c.name.clone(),
            c.balance.to_string(),
            c.credit_limit.to_string(),
            c.interest_rate.to_string(),
            c.due_date.to_string(),
            c.statement_closing_date.map(|d| d.to_string()).unwrap_or_default(),
            c.minimum_payment.to_string(),
            c.created_at.clone(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(dir.join("categories.csv"))?;
    w.write_record(["id", "name", "icon", "color", "is_default", "created_at"])?;
    for c in &snap.categories {
        w.write_record([
            c.id.to_string(),
            c.name.clone(),
            c.icon.clone(),
            c.color.clone(),
            c.is_default.to_string(),
            c.created_at.clone(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(dir.join("fixed_expenses.csv"))?;
    w.write_record([
        "id",
        "name",
        "due_date",
        "amount",
        "paid_amount",
        "status",
        "category",
        "account_id",
        "target_credit_card_id",
        "recurring_template_id",
        "created_at",
    ])?;
    for e in &snap.fixed_expenses {
        w.write_record([
            e.id.to_string(),
            e.name.clone(),
            e.due_date.to_string(),
            e.amount.to_string(),
            e.paid_amount.to_string(),
            e.status.clone(),
            e.category.clone(),
            e.account_id.map(|v| v.to_string()).unwrap_or_default(),
            e.target_credit_card_id.map(|v| v.to_string()).unwrap_or_default(),
            e.recurring_template_id.map(|v| v.to_string()).unwrap_or_default(),
            e.created_at.clone(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(dir.join("pending_transactions.csv"))?;
    w.write_record(["id", "account_id", "amount", "category", "description", "created_at"])?;
    for p in &snap.pending_transactions {
        w.write_record([
            p.id.to_string(),
            p.account_id.to_string(),
            p.amount.to_string(),
            p.category.clone(),
            p.description.clone(),
            p.created_at.clone(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(dir.join("recurring_templates.csv"))?;
    w.write_record([
        "id",
        "name",
        "base_amount",
        "frequency",
        "interval_value",
        "start_date",
        "category",
        "account_id",
        "is_variable_amount",
        "notes",
        "created_at",
    ])?;
    for t in &snap.recurring_templates {
        w.write_record([
            t.id.to_string(),
            t.name.clone(),
            t.base_amount.to_string(),
            t.frequency.as_str().to_string(),
            t.interval_value.to_string(),
            t.start_date.to_string(),
            t.category.clone(),
            t.account_id.map(|v| v.to_string()).unwrap_or_default(),
            t.is_variable_amount.to_string(),
            t.notes.clone(),
            t.created_at.clone(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(dir.join("audit_logs.csv"))?;
    w.write_record(["id", "timestamp", "action_type", "entity_type", "entity_id", "details"])?;
    for l in &snap.audit_logs {
        w.write_record([
            l.id.to_string(),
            l.timestamp.clone(),
            l.action_type.as_str().to_string(),
            l.entity_type.clone(),
            l.entity_id.to_string(),
            l.details.clone(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(dir.join("paycheck_settings.csv"))?;
    w.write_record(["last_paycheck_date", "frequency"])?;
    w.write_record([
        snap.paycheck_settings
            .last_paycheck_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        snap.paycheck_settings.frequency.clone(),
    ])?;
    w.flush()?;

    Ok(())
}
