// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::models::{AuditAction, AuditLog};

/// Append one audit record. Callers invoke this inside the transaction of
/// the mutation being recorded, so an aborted mutation leaves no trace.
pub fn record(
    conn: &Connection,
    action: AuditAction,
    entity_type: &str,
    entity_id: i64,
    details: &serde_json::Value,
) -> Result<()> {
    conn.execute(
        "INSERT INTO audit_logs(action_type, entity_type, entity_id, details)
         VALUES (?1, ?2, ?3, ?4)",
        params![action.as_str(), entity_type, entity_id, details.to_string()],
    )?;
    Ok(())
}

pub fn list(conn: &Connection, limit: Option<usize>) -> Result<Vec<AuditLog>> {
    let mut sql = String::from(
        "SELECT id, timestamp, action_type, entity_type, entity_id, details
         FROM audit_logs ORDER BY id DESC",
    );
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {}", n));
    }
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let action_raw: String = r.get(2)?;
        out.push(AuditLog {
            id: r.get(0)?,
            timestamp: r.get(1)?,
            action_type: AuditAction::parse(&action_raw)
                .ok_or_else(|| anyhow::anyhow!("Unknown audit action '{}'", action_raw))?,
            entity_type: r.get(3)?,
            entity_id: r.get(4)?,
            details: r.get(5)?,
        });
    }
    Ok(out)
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM audit_logs", [], |r| r.get(0))?)
}

/// The only collective operation the log supports.
pub fn clear_all(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM audit_logs", [])?)
}
