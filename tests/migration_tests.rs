// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use digibook::db::{self, SCHEMA_V1, SCHEMA_VERSION};
use digibook::error::LedgerError;
use rusqlite::Connection;

fn v1_database() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA_V1).unwrap();
    conn.execute("INSERT INTO schema_version(version) VALUES (1)", [])
        .unwrap();
    conn
}

fn has_column(conn: &Connection, table: &str, column: &str) -> bool {
    conn.prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
        .is_ok()
}

#[test]
fn fresh_database_lands_on_the_current_version() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert_eq!(db::migrate(&mut conn).unwrap(), SCHEMA_VERSION);
    assert!(has_column(&conn, "fixed_expenses", "recurring_template_id"));
    assert!(has_column(&conn, "fixed_expenses", "target_credit_card_id"));
    assert!(has_column(&conn, "recurring_templates", "interval_value"));
}

#[test]
fn v1_data_survives_the_forward_migrations() {
    let mut conn = v1_database();
    conn.execute(
        "INSERT INTO fixed_expenses(name, due_date, amount, paid_amount, status, category)
         VALUES ('Rent', '2025-08-01', '1200', '0', '', 'Housing')",
        [],
    )
    .unwrap();

    assert_eq!(db::migrate(&mut conn).unwrap(), SCHEMA_VERSION);
    let (amount, template, target): (String, Option<i64>, Option<i64>) = conn
        .query_row(
            "SELECT amount, recurring_template_id, target_credit_card_id
             FROM fixed_expenses WHERE name='Rent'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(amount, "1200");
    assert_eq!(template, None);
    assert_eq!(target, None);
}

#[test]
fn migrations_are_idempotent() {
    let mut conn = v1_database();
    assert_eq!(db::migrate(&mut conn).unwrap(), SCHEMA_VERSION);
    // a second pass over an already-current database is a no-op
    assert_eq!(db::migrate(&mut conn).unwrap(), SCHEMA_VERSION);
    let version: i64 = conn
        .query_row("SELECT version FROM schema_version", [], |r| r.get(0))
        .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}

#[test]
fn newer_schema_refuses_to_open() {
    let mut conn = v1_database();
    db::migrate(&mut conn).unwrap();
    conn.execute("UPDATE schema_version SET version=99", []).unwrap();
    let err = db::migrate(&mut conn).unwrap_err();
    match err.downcast_ref::<LedgerError>() {
        Some(LedgerError::SchemaRegression { found, supported }) => {
            assert_eq!(*found, 99);
            assert_eq!(*supported, SCHEMA_VERSION);
        }
        other => panic!("expected SchemaRegression, got {:?}", other),
    }
}
