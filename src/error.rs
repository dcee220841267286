// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Typed failure kinds for ledger mutations. Validation outcomes are
/// returned as values from `validate`; everything here propagates out of
/// the failing call.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("referential integrity: {0}")]
    ReferentialIntegrity(String),

    #[error("database schema v{found} is newer than supported v{supported}; refusing to open")]
    SchemaRegression { found: i64, supported: i64 },

    #[error("migration to v{version} failed: {reason}")]
    MigrationFailure { version: i64, reason: String },

    #[error("transaction did not complete within {0} seconds")]
    TransactionTimeout(u64),

    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("post-write verification mismatch on {entity} #{id}")]
    VerificationMismatch { entity: &'static str, id: i64 },

    #[error("persistence layer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl LedgerError {
    /// Lift a raw SQLite failure into the ledger vocabulary where one
    /// applies: a lock held past the busy budget is a timeout, an I/O or
    /// open failure means the persistence surface is gone.
    pub fn from_sqlite(e: &rusqlite::Error) -> Option<LedgerError> {
        if let rusqlite::Error::SqliteFailure(inner, msg) = e {
            return match inner.code {
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => Some(
                    LedgerError::TransactionTimeout(crate::db::TRANSACTION_BUDGET_SECS),
                ),
                rusqlite::ErrorCode::CannotOpen
                | rusqlite::ErrorCode::SystemIoFailure
                | rusqlite::ErrorCode::NotADatabase => Some(LedgerError::Unavailable(
                    msg.clone().unwrap_or_else(|| inner.to_string()),
                )),
                _ => None,
            };
        }
        None
    }

    pub fn severity(&self) -> Severity {
        match self {
            LedgerError::Validation(_) => Severity::Low,
            LedgerError::ReferentialIntegrity(_) => Severity::Medium,
            LedgerError::TransactionTimeout(_) | LedgerError::TransactionAborted(_) => {
                Severity::Medium
            }
            LedgerError::VerificationMismatch { .. } => Severity::High,
            LedgerError::SchemaRegression { .. } | LedgerError::MigrationFailure { .. } => {
                Severity::Critical
            }
            LedgerError::Unavailable(_) => Severity::Critical,
        }
    }
}
