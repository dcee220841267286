// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::PathBuf;

use crate::error::LedgerError;
use crate::store;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Digibook", "digibook"));

/// Highest declared schema version. v1 is the base ledger, v2 adds
/// recurring templates, v3 adds the two-field credit-card-payment model.
pub const SCHEMA_VERSION: i64 = 3;

/// Lock waits beyond this budget surface as `TransactionTimeout`.
pub const TRANSACTION_BUDGET_SECS: u64 = 30;

pub fn data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let dir = proj.data_dir().to_path_buf();
    fs::create_dir_all(&dir).context("Failed to create data dir")?;
    Ok(dir)
}

pub fn db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("digibook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn = Connection::open(&path)
        .map_err(|e| LedgerError::Unavailable(format!("open {}: {}", path.display(), e)))?;
    conn.busy_timeout(std::time::Duration::from_secs(TRANSACTION_BUDGET_SECS))?;
    init(&mut conn)?;
    Ok(conn)
}

/// Migrate to the current schema and run the first-open seeding sequence.
/// Safe to call on every open; every step is idempotent.
pub fn init(conn: &mut Connection) -> Result<()> {
    migrate(conn)?;
    store::seed_default_categories(conn)?;
    store::seed_paycheck_settings(conn)?;
    store::ensure_default_account(conn)?;
    store::ensure_card_payment_expenses(conn)?;
    Ok(())
}

/// Base schema (v1). `account_id` on fixed_expenses and pending rows may
/// reference either accounts or credit_cards, so it carries no FK; the
/// store enforces referential integrity in code.
pub const SCHEMA_V1: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS schema_version(
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK(type IN ('checking','savings')),
    current_balance TEXT NOT NULL DEFAULT '0',
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS credit_cards(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    balance TEXT NOT NULL DEFAULT '0',
    credit_limit TEXT NOT NULL DEFAULT '0',
    interest_rate TEXT NOT NULL DEFAULT '0',
    due_date TEXT NOT NULL,
    statement_closing_date TEXT,
    minimum_payment TEXT NOT NULL DEFAULT '0',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    icon TEXT NOT NULL DEFAULT '',
    color TEXT NOT NULL DEFAULT '',
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS fixed_expenses(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    due_date TEXT NOT NULL,
    amount TEXT NOT NULL,
    paid_amount TEXT NOT NULL DEFAULT '0',
    status TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    account_id INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_fixed_expenses_category ON fixed_expenses(category);

CREATE TABLE IF NOT EXISTS pending_transactions(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL,
    amount TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_pending_transactions_account ON pending_transactions(account_id);

CREATE TABLE IF NOT EXISTS paycheck_settings(
    id INTEGER PRIMARY KEY CHECK(id = 1),
    last_paycheck_date TEXT NOT NULL DEFAULT '',
    frequency TEXT NOT NULL DEFAULT 'biweekly'
);

CREATE TABLE IF NOT EXISTS audit_logs(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL DEFAULT (datetime('now')),
    action_type TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    details TEXT NOT NULL DEFAULT '{}'
);
CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs(timestamp);
"#;

const RECURRING_TEMPLATES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS recurring_templates(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    base_amount TEXT NOT NULL,
    frequency TEXT NOT NULL,
    interval_value INTEGER NOT NULL DEFAULT 1,
    start_date TEXT NOT NULL,
    category TEXT NOT NULL,
    account_id INTEGER,
    is_variable_amount INTEGER NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Apply forward migrations in order and return the resulting version.
/// Opening a database written by a newer build fails with
/// `SchemaRegression`; downgrade is unsupported.
pub fn migrate(conn: &mut Connection) -> Result<i64> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let current = stored_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(LedgerError::SchemaRegression {
            found: current,
            supported: SCHEMA_VERSION,
        }
        .into());
    }

    if current == 0 {
        conn.execute_batch(SCHEMA_V1)
            .map_err(|e| migration_failure(1, e))?;
    }
    if current < 2 {
        migrate_to_v2(conn).map_err(|e| migration_failure(2, e))?;
    }
    if current < 3 {
        migrate_to_v3(conn).map_err(|e| migration_failure(3, e))?;
    }

    set_stored_version(conn, SCHEMA_VERSION)?;
    Ok(SCHEMA_VERSION)
}

fn migration_failure(version: i64, e: rusqlite::Error) -> anyhow::Error {
    LedgerError::MigrationFailure {
        version,
        reason: e.to_string(),
    }
    .into()
}

/// v2: recurring templates, and the template back-reference on expenses.
fn migrate_to_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(RECURRING_TEMPLATES_TABLE)?;
    if !column_exists(conn, "fixed_expenses", "recurring_template_id")? {
        conn.execute_batch("ALTER TABLE fixed_expenses ADD COLUMN recurring_template_id INTEGER;")?;
    }
    Ok(())
}

/// v3: two-field credit-card-payment model.
fn migrate_to_v3(conn: &Connection) -> Result<(), rusqlite::Error> {
    if !column_exists(conn, "fixed_expenses", "target_credit_card_id")? {
        conn.execute_batch(
            "ALTER TABLE fixed_expenses ADD COLUMN target_credit_card_id INTEGER;",
        )?;
    }
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(r) = rows.next()? {
        let name: String = r.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn stored_version(conn: &Connection) -> Result<i64> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |r| r.get(0),
    )?;
    if !has_table {
        return Ok(0);
    }
    let v: Option<i64> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v.unwrap_or(0))
}

fn set_stored_version(conn: &Connection, version: i64) -> Result<()> {
    let updated = conn.execute("UPDATE schema_version SET version=?1", [version])?;
    if updated == 0 {
        conn.execute("INSERT INTO schema_version(version) VALUES (?1)", [version])?;
    }
    Ok(())
}
