// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Mutex;

use crate::audit;
use crate::classify;
use crate::error::LedgerError;
use crate::models::*;
use crate::schedule;
use crate::validate;

// ── Row mapping ───────────────────────────────────────────────

fn get_decimal(r: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.trim().parse::<Decimal>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_account(r: &Row) -> rusqlite::Result<Account> {
    let type_raw: String = r.get(2)?;
    Ok(Account {
        id: r.get(0)?,
        name: r.get(1)?,
        r#type: AccountType::parse(&type_raw).unwrap_or(AccountType::Checking),
        current_balance: get_decimal(r, 3)?,
        is_default: r.get::<_, i64>(4)? != 0,
        created_at: r.get(5)?,
    })
}

fn row_to_card(r: &Row) -> rusqlite::Result<CreditCard> {
    Ok(CreditCard {
        id: r.get(0)?,
        name: r.get(1)?,
        balance: get_decimal(r, 2)?,
        credit_limit: get_decimal(r, 3)?,
        interest_rate: get_decimal(r, 4)?,
        due_date: r.get(5)?,
        statement_closing_date: r.get(6)?,
        minimum_payment: get_decimal(r, 7)?,
        created_at: r.get(8)?,
    })
}

fn row_to_category(r: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        icon: r.get(2)?,
        color: r.get(3)?,
        is_default: r.get::<_, i64>(4)? != 0,
        created_at: r.get(5)?,
    })
}

fn row_to_expense(r: &Row) -> rusqlite::Result<FixedExpense> {
    Ok(FixedExpense {
        id: r.get(0)?,
        name: r.get(1)?,
        due_date: r.get(2)?,
        amount: get_decimal(r, 3)?,
        paid_amount: get_decimal(r, 4)?,
        status: r.get(5)?,
        category: r.get(6)?,
        account_id: r.get(7)?,
        target_credit_card_id: r.get(8)?,
        recurring_template_id: r.get(9)?,
        created_at: r.get(10)?,
    })
}

fn row_to_pending(r: &Row) -> rusqlite::Result<PendingTransaction> {
    Ok(PendingTransaction {
        id: r.get(0)?,
        account_id: r.get(1)?,
        amount: get_decimal(r, 2)?,
        category: r.get(3)?,
        description: r.get(4)?,
        created_at: r.get(5)?,
    })
}

fn row_to_template(r: &Row) -> rusqlite::Result<RecurringTemplate> {
    let freq_raw: String = r.get(3)?;
    Ok(RecurringTemplate {
        id: r.get(0)?,
        name: r.get(1)?,
        base_amount: get_decimal(r, 2)?,
        frequency: Frequency::parse(&freq_raw).unwrap_or(Frequency::Monthly),
        interval_value: r.get::<_, i64>(4)?.max(1) as u32,
        start_date: r.get(5)?,
        category: r.get(6)?,
        account_id: r.get(7)?,
        is_variable_amount: r.get::<_, i64>(8)? != 0,
        notes: r.get(9)?,
        created_at: r.get(10)?,
    })
}

const ACCOUNT_COLS: &str = "id, name, type, current_balance, is_default, created_at";
const CARD_COLS: &str = "id, name, balance, credit_limit, interest_rate, due_date, statement_closing_date, minimum_payment, created_at";
const CATEGORY_COLS: &str = "id, name, icon, color, is_default, created_at";
const EXPENSE_COLS: &str = "id, name, due_date, amount, paid_amount, status, category, account_id, target_credit_card_id, recurring_template_id, created_at";
const PENDING_COLS: &str = "id, account_id, amount, category, description, created_at";
const TEMPLATE_COLS: &str = "id, name, base_amount, frequency, interval_value, start_date, category, account_id, is_variable_amount, notes, created_at";

// ── Accounts ──────────────────────────────────────────────────

pub fn insert_account(
    conn: &mut Connection,
    name: &str,
    acct_type: AccountType,
    opening_balance: Decimal,
) -> Result<Account> {
    let name = validate::account_name(name).into_result()?;
    let balance = opening_balance.round_dp(2);
    let tx = conn.transaction()?;
    let first: i64 = tx.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?;
    tx.execute(
        "INSERT INTO accounts(name, type, current_balance, is_default) VALUES (?1, ?2, ?3, ?4)",
        params![name, acct_type.as_str(), balance.to_string(), (first == 0) as i64],
    )?;
    let id = tx.last_insert_rowid();
    audit::record(
        &tx,
        AuditAction::Create,
        "account",
        id,
        &json!({"name": name, "type": acct_type.as_str(), "currentBalance": balance}),
    )?;
    tx.commit()?;
    get_account(conn, id)?.context("account vanished after insert")
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM accounts WHERE id=?1", ACCOUNT_COLS))?;
    Ok(stmt.query_row(params![id], row_to_account).optional()?)
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM accounts ORDER BY id", ACCOUNT_COLS))?;
    let rows = stmt.query_map([], row_to_account)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn default_account(conn: &Connection) -> Result<Option<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM accounts WHERE is_default=1 LIMIT 1",
        ACCOUNT_COLS
    ))?;
    Ok(stmt.query_row([], row_to_account).optional()?)
}

pub fn update_account(
    conn: &mut Connection,
    id: i64,
    name: Option<&str>,
    balance: Option<Decimal>,
) -> Result<Account> {
    let tx = conn.transaction()?;
    let mut details = serde_json::Map::new();
    if get_account(&tx, id)?.is_none() {
        return Err(LedgerError::ReferentialIntegrity(format!("account #{} not found", id)).into());
    }
    if let Some(name) = name {
        let name = validate::account_name(name).into_result()?;
        tx.execute("UPDATE accounts SET name=?1 WHERE id=?2", params![name, id])?;
        details.insert("name".into(), json!(name));
    }
    if let Some(balance) = balance {
        let balance = balance.round_dp(2);
        tx.execute(
            "UPDATE accounts SET current_balance=?1 WHERE id=?2",
            params![balance.to_string(), id],
        )?;
        details.insert("currentBalance".into(), json!(balance));
    }
    if !details.is_empty() {
        audit::record(&tx, AuditAction::Update, "account", id, &details.into())?;
    }
    tx.commit()?;
    get_account(conn, id)?.context("account vanished after update")
}

/// Clear the default flag everywhere, then set it on the target, in one
/// transaction. Idempotent for an already-default target.
pub fn set_default_account(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    if get_account(&tx, id)?.is_none() {
        return Err(LedgerError::ReferentialIntegrity(format!("account #{} not found", id)).into());
    }
    tx.execute("UPDATE accounts SET is_default=0 WHERE is_default=1", [])?;
    tx.execute("UPDATE accounts SET is_default=1 WHERE id=?1", params![id])?;
    audit::record(
        &tx,
        AuditAction::Update,
        "account",
        id,
        &json!({"isDefault": true}),
    )?;
    tx.commit()?;
    Ok(())
}

pub fn delete_account(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let account = get_account(&tx, id)?
        .ok_or_else(|| LedgerError::ReferentialIntegrity(format!("account #{} not found", id)))?;
    let pending: i64 = tx.query_row(
        "SELECT COUNT(*) FROM pending_transactions WHERE account_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    let expenses: i64 = tx.query_row(
        "SELECT COUNT(*) FROM fixed_expenses WHERE account_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if pending > 0 || expenses > 0 {
        return Err(LedgerError::ReferentialIntegrity(format!(
            "account '{}' is referenced by {} pending transaction(s) and {} expense(s)",
            account.name, pending, expenses
        ))
        .into());
    }
    tx.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    if account.is_default {
        tx.execute(
            "UPDATE accounts SET is_default=1
             WHERE id=(SELECT id FROM accounts ORDER BY created_at, id LIMIT 1)",
            [],
        )?;
    }
    audit::record(
        &tx,
        AuditAction::Delete,
        "account",
        id,
        &json!({"name": account.name}),
    )?;
    tx.commit()?;
    Ok(())
}

/// Promote the oldest account to default when none carries the flag.
pub fn ensure_default_account(conn: &Connection) -> Result<()> {
    let defaults: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE is_default=1",
        [],
        |r| r.get(0),
    )?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?;
    if total > 0 && defaults == 0 {
        conn.execute(
            "UPDATE accounts SET is_default=1
             WHERE id=(SELECT id FROM accounts ORDER BY created_at, id LIMIT 1)",
            [],
        )?;
    }
    Ok(())
}

// ── Credit cards ──────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn insert_credit_card(
    conn: &mut Connection,
    name: &str,
    balance: Decimal,
    credit_limit: Decimal,
    interest_rate: Decimal,
    due_date: NaiveDate,
    statement_closing_date: Option<NaiveDate>,
    minimum_payment: Decimal,
) -> Result<CreditCard> {
    let name = validate::sanitise(name);
    if name.is_empty() {
        return Err(LedgerError::Validation(vec!["card name must not be empty".into()]).into());
    }
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO credit_cards(name, balance, credit_limit, interest_rate, due_date,
                                  statement_closing_date, minimum_payment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            name,
            balance.round_dp(2).to_string(),
            credit_limit.round_dp(2).to_string(),
            interest_rate.to_string(),
            due_date,
            statement_closing_date,
            minimum_payment.round_dp(2).to_string(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    audit::record(
        &tx,
        AuditAction::Create,
        "credit_card",
        id,
        &json!({"name": name, "balance": balance.round_dp(2), "creditLimit": credit_limit.round_dp(2)}),
    )?;
    ensure_card_payment_expenses(&tx)?;
    tx.commit()?;
    get_credit_card(conn, id)?.context("credit card vanished after insert")
}

pub fn get_credit_card(conn: &Connection, id: i64) -> Result<Option<CreditCard>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM credit_cards WHERE id=?1", CARD_COLS))?;
    Ok(stmt.query_row(params![id], row_to_card).optional()?)
}

pub fn list_credit_cards(conn: &Connection) -> Result<Vec<CreditCard>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM credit_cards ORDER BY id", CARD_COLS))?;
    let rows = stmt.query_map([], row_to_card)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[allow(clippy::too_many_arguments)]
pub fn update_credit_card(
    conn: &mut Connection,
    id: i64,
    name: Option<&str>,
    balance: Option<Decimal>,
    credit_limit: Option<Decimal>,
    minimum_payment: Option<Decimal>,
    due_date: Option<NaiveDate>,
) -> Result<CreditCard> {
    let tx = conn.transaction()?;
    if get_credit_card(&tx, id)?.is_none() {
        return Err(
            LedgerError::ReferentialIntegrity(format!("credit card #{} not found", id)).into(),
        );
    }
    let mut details = serde_json::Map::new();
    if let Some(name) = name {
        let name = validate::sanitise(name);
        tx.execute("UPDATE credit_cards SET name=?1 WHERE id=?2", params![name, id])?;
        details.insert("name".into(), json!(name));
    }
    if let Some(balance) = balance {
        let balance = balance.round_dp(2);
        tx.execute(
            "UPDATE credit_cards SET balance=?1 WHERE id=?2",
            params![balance.to_string(), id],
        )?;
        details.insert("balance".into(), json!(balance));
    }
    if let Some(limit) = credit_limit {
        let limit = limit.round_dp(2);
        tx.execute(
            "UPDATE credit_cards SET credit_limit=?1 WHERE id=?2",
            params![limit.to_string(), id],
        )?;
        details.insert("creditLimit".into(), json!(limit));
    }
    if let Some(min) = minimum_payment {
        let min = min.round_dp(2);
        tx.execute(
            "UPDATE credit_cards SET minimum_payment=?1 WHERE id=?2",
            params![min.to_string(), id],
        )?;
        details.insert("minimumPayment".into(), json!(min));
    }
    if let Some(due) = due_date {
        tx.execute("UPDATE credit_cards SET due_date=?1 WHERE id=?2", params![due, id])?;
        details.insert("dueDate".into(), json!(due));
    }
    if !details.is_empty() {
        audit::record(&tx, AuditAction::Update, "credit_card", id, &details.into())?;
    }
    tx.commit()?;
    get_credit_card(conn, id)?.context("credit card vanished after update")
}

pub fn delete_credit_card(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let card = get_credit_card(&tx, id)?.ok_or_else(|| {
        LedgerError::ReferentialIntegrity(format!("credit card #{} not found", id))
    })?;
    let linked: i64 = tx.query_row(
        "SELECT COUNT(*) FROM fixed_expenses WHERE target_credit_card_id=?1 OR account_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if linked > 0 {
        return Err(LedgerError::ReferentialIntegrity(format!(
            "credit card '{}' is referenced by {} expense(s); reassign or delete them first",
            card.name, linked
        ))
        .into());
    }
    tx.execute("DELETE FROM credit_cards WHERE id=?1", params![id])?;
    audit::record(
        &tx,
        AuditAction::Delete,
        "credit_card",
        id,
        &json!({"name": card.name}),
    )?;
    tx.commit()?;
    Ok(())
}

/// Auto-expense amount for a card: the minimum payment, floored at 2% of
/// the balance and never below 25.
pub fn auto_payment_amount(minimum_payment: Decimal, balance: Decimal) -> Decimal {
    let two_percent = (balance * Decimal::new(2, 2)).round_dp(2);
    let floor = two_percent.max(Decimal::from(25));
    minimum_payment.max(floor)
}

/// Guarantee every credit card has a matching "Credit Card Payment"
/// expense funded by the default account. Skipped when no default account
/// exists (the expense would fail the two-field invariant).
pub fn ensure_card_payment_expenses(conn: &Connection) -> Result<usize> {
    let Some(default) = default_account(conn)? else {
        return Ok(0);
    };
    let cards = list_credit_cards(conn)?;
    let mut created = 0;
    for card in cards {
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM fixed_expenses WHERE category=?1 AND target_credit_card_id=?2",
            params![CREDIT_CARD_PAYMENT, card.id],
            |r| r.get(0),
        )?;
        if existing > 0 {
            continue;
        }
        let amount = auto_payment_amount(card.minimum_payment, card.balance);
        conn.execute(
            "INSERT INTO fixed_expenses(name, due_date, amount, paid_amount, status, category,
                                        account_id, target_credit_card_id)
             VALUES (?1, ?2, ?3, '0', '', ?4, ?5, ?6)",
            params![
                format!("{} Payment", card.name),
                card.due_date,
                amount.to_string(),
                CREDIT_CARD_PAYMENT,
                default.id,
                card.id,
            ],
        )?;
        created += 1;
    }
    Ok(created)
}

// ── Categories ────────────────────────────────────────────────

static CATEGORY_CACHE: Lazy<Mutex<Option<Vec<Category>>>> = Lazy::new(|| Mutex::new(None));

fn invalidate_category_cache() {
    if let Ok(mut guard) = CATEGORY_CACHE.lock() {
        *guard = None;
    }
}

/// Cached read for display paths; repopulates lazily after any category
/// mutation invalidates it.
pub fn categories_cached(conn: &Connection) -> Result<Vec<Category>> {
    if let Ok(guard) = CATEGORY_CACHE.lock() {
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }
    }
    let fresh = list_categories(conn)?;
    if let Ok(mut guard) = CATEGORY_CACHE.lock() {
        *guard = Some(fresh.clone());
    }
    Ok(fresh)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM categories ORDER BY id", CATEGORY_COLS))?;
    let rows = stmt.query_map([], row_to_category)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_category_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM categories WHERE name=?1 COLLATE NOCASE",
        CATEGORY_COLS
    ))?;
    Ok(stmt.query_row(params![name], row_to_category).optional()?)
}

pub fn insert_category(
    conn: &mut Connection,
    name: &str,
    icon: &str,
    color: &str,
) -> Result<Category> {
    let existing = list_categories(conn)?;
    let name = validate::category_name(&validate::sanitise(name), &existing, None).into_result()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO categories(name, icon, color, is_default) VALUES (?1, ?2, ?3, 0)",
        params![name, validate::sanitise(icon), validate::sanitise(color)],
    )?;
    let id = tx.last_insert_rowid();
    audit::record(&tx, AuditAction::Create, "category", id, &json!({"name": name}))?;
    tx.commit()?;
    invalidate_category_cache();
    get_category_by_name(conn, &name)?.context("category vanished after insert")
}

/// Rename cascades to the name-refs held by fixed expenses so the
/// category edge never dangles.
pub fn rename_category(conn: &mut Connection, id: i64, new_name: &str) -> Result<Category> {
    let existing = list_categories(conn)?;
    let old = existing
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or_else(|| LedgerError::ReferentialIntegrity(format!("category #{} not found", id)))?;
    let new_name =
        validate::category_name(&validate::sanitise(new_name), &existing, Some(id)).into_result()?;
    let tx = conn.transaction()?;
    tx.execute("UPDATE categories SET name=?1 WHERE id=?2", params![new_name, id])?;
    tx.execute(
        "UPDATE fixed_expenses SET category=?1 WHERE category=?2",
        params![new_name, old.name],
    )?;
    tx.execute(
        "UPDATE pending_transactions SET category=?1 WHERE category=?2",
        params![new_name, old.name],
    )?;
    audit::record(
        &tx,
        AuditAction::Update,
        "category",
        id,
        &json!({"name": new_name, "previous": old.name}),
    )?;
    tx.commit()?;
    invalidate_category_cache();
    get_category_by_name(conn, &new_name)?.context("category vanished after rename")
}

pub fn delete_category(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let cat = {
        let mut stmt =
            tx.prepare(&format!("SELECT {} FROM categories WHERE id=?1", CATEGORY_COLS))?;
        stmt.query_row(params![id], row_to_category)
            .optional()?
            .ok_or_else(|| LedgerError::ReferentialIntegrity(format!("category #{} not found", id)))?
    };
    let refs: i64 = tx.query_row(
        "SELECT COUNT(*) FROM fixed_expenses WHERE category=?1",
        params![cat.name],
        |r| r.get(0),
    )?;
    if refs > 0 {
        return Err(LedgerError::ReferentialIntegrity(format!(
            "category '{}' is referenced by {} expense(s)",
            cat.name, refs
        ))
        .into());
    }
    tx.execute("DELETE FROM categories WHERE id=?1", params![id])?;
    audit::record(&tx, AuditAction::Delete, "category", id, &json!({"name": cat.name}))?;
    tx.commit()?;
    invalidate_category_cache();
    Ok(())
}

pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Housing", "🏠", "#4F46E5"),
    ("Utilities", "💡", "#F59E0B"),
    ("Insurance", "🛡", "#0EA5E9"),
    ("Transportation", "🚗", "#10B981"),
    ("Subscriptions", "📺", "#8B5CF6"),
    ("Credit Card Payment", "💳", "#EF4444"),
    ("Debt", "💰", "#DC2626"),
    ("Healthcare", "🏥", "#14B8A6"),
    ("Education", "🎓", "#6366F1"),
    ("Other", "📋", "#6B7280"),
];

pub fn seed_default_categories(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }
    for (name, icon, color) in DEFAULT_CATEGORIES {
        conn.execute(
            "INSERT OR IGNORE INTO categories(name, icon, color, is_default) VALUES (?1, ?2, ?3, 1)",
            params![name, icon, color],
        )?;
    }
    invalidate_category_cache();
    Ok(())
}

// ── Fixed expenses ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewFixedExpense {
    pub name: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub category: String,
    pub account_id: Option<i64>,
    pub target_credit_card_id: Option<i64>,
    pub recurring_template_id: Option<i64>,
}

/// Check that the ids an expense carries resolve to live rows, and that a
/// Credit Card Payment is funded by a real checking/savings account.
fn check_expense_references(conn: &Connection, new: &NewFixedExpense) -> Result<()> {
    if get_category_by_name(conn, &new.category)?.is_none() {
        return Err(LedgerError::ReferentialIntegrity(format!(
            "category '{}' does not exist",
            new.category
        ))
        .into());
    }
    if let Some(card_id) = new.target_credit_card_id {
        if get_credit_card(conn, card_id)?.is_none() {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "target credit card #{} does not exist",
                card_id
            ))
            .into());
        }
    }
    if let Some(account_id) = new.account_id {
        if new.category == CREDIT_CARD_PAYMENT {
            if get_account(conn, account_id)?.is_none() {
                return Err(LedgerError::ReferentialIntegrity(format!(
                    "funding account #{} must be a checking/savings account",
                    account_id
                ))
                .into());
            }
        } else if get_account(conn, account_id)?.is_none()
            && get_credit_card(conn, account_id)?.is_none()
        {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "account #{} does not resolve to an account or credit card",
                account_id
            ))
            .into());
        }
    }
    Ok(())
}

pub fn insert_fixed_expense(
    conn: &mut Connection,
    new: &NewFixedExpense,
    today: NaiveDate,
) -> Result<FixedExpense> {
    validate::expense_payment_source(&new.category, new.account_id, new.target_credit_card_id)
        .into_result()?;
    if new.amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(vec!["amount must be greater than zero".into()]).into());
    }
    let name = validate::sanitise(&new.name);
    let tx = conn.transaction()?;
    check_expense_references(&tx, new)?;
    let settings = get_paycheck_settings(&tx)?;
    let dates = schedule::paycheck_dates(settings.last_paycheck_date, today);
    let status = classify::classify(
        new.amount.round_dp(2),
        Decimal::ZERO,
        new.due_date,
        &dates,
        today,
    );
    tx.execute(
        "INSERT INTO fixed_expenses(name, due_date, amount, paid_amount, status, category,
                                    account_id, target_credit_card_id, recurring_template_id)
         VALUES (?1, ?2, ?3, '0', ?4, ?5, ?6, ?7, ?8)",
        params![
            name,
            new.due_date,
            new.amount.round_dp(2).to_string(),
            status.as_str(),
            new.category,
            new.account_id,
            new.target_credit_card_id,
            new.recurring_template_id,
        ],
    )?;
    let id = tx.last_insert_rowid();
    audit::record(
        &tx,
        AuditAction::Create,
        "fixed_expense",
        id,
        &json!({"name": name, "amount": new.amount.round_dp(2), "category": new.category}),
    )?;
    tx.commit()?;
    get_fixed_expense(conn, id)?.context("expense vanished after insert")
}

pub fn get_fixed_expense(conn: &Connection, id: i64) -> Result<Option<FixedExpense>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {} FROM fixed_expenses WHERE id=?1", EXPENSE_COLS))?;
    Ok(stmt.query_row(params![id], row_to_expense).optional()?)
}

pub fn list_fixed_expenses(conn: &Connection, category: Option<&str>) -> Result<Vec<FixedExpense>> {
    let mut out = Vec::new();
    match category {
        Some(cat) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM fixed_expenses WHERE category=?1 ORDER BY due_date, id",
                EXPENSE_COLS
            ))?;
            let rows = stmt.query_map(params![cat], row_to_expense)?;
            for r in rows {
                out.push(r?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM fixed_expenses ORDER BY due_date, id",
                EXPENSE_COLS
            ))?;
            let rows = stmt.query_map([], row_to_expense)?;
            for r in rows {
                out.push(r?);
            }
        }
    }
    Ok(out)
}

pub fn update_fixed_expense(
    conn: &mut Connection,
    id: i64,
    name: Option<&str>,
    due_date: Option<NaiveDate>,
    amount: Option<Decimal>,
) -> Result<FixedExpense> {
    let tx = conn.transaction()?;
    if get_fixed_expense(&tx, id)?.is_none() {
        return Err(LedgerError::ReferentialIntegrity(format!("expense #{} not found", id)).into());
    }
    let mut details = serde_json::Map::new();
    if let Some(name) = name {
        let name = validate::sanitise(name);
        tx.execute("UPDATE fixed_expenses SET name=?1 WHERE id=?2", params![name, id])?;
        details.insert("name".into(), json!(name));
    }
    if let Some(due) = due_date {
        tx.execute("UPDATE fixed_expenses SET due_date=?1 WHERE id=?2", params![due, id])?;
        details.insert("dueDate".into(), json!(due));
    }
    if let Some(amount) = amount {
        if amount <= Decimal::ZERO {
            return Err(
                LedgerError::Validation(vec!["amount must be greater than zero".into()]).into(),
            );
        }
        let amount = amount.round_dp(2);
        tx.execute(
            "UPDATE fixed_expenses SET amount=?1 WHERE id=?2",
            params![amount.to_string(), id],
        )?;
        details.insert("amount".into(), json!(amount));
    }
    if !details.is_empty() {
        audit::record(&tx, AuditAction::Update, "fixed_expense", id, &details.into())?;
    }
    tx.commit()?;
    get_fixed_expense(conn, id)?.context("expense vanished after update")
}

pub fn delete_fixed_expense(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let expense = get_fixed_expense(&tx, id)?
        .ok_or_else(|| LedgerError::ReferentialIntegrity(format!("expense #{} not found", id)))?;
    tx.execute("DELETE FROM fixed_expenses WHERE id=?1", params![id])?;
    audit::record(
        &tx,
        AuditAction::Delete,
        "fixed_expense",
        id,
        &json!({"name": expense.name}),
    )?;
    tx.commit()?;
    Ok(())
}

/// Reclassify every expense against the current paycheck window and write
/// back the rows whose stored status drifted. Derived presentation state;
/// not audited.
pub fn refresh_expense_statuses(conn: &Connection, today: NaiveDate) -> Result<usize> {
    let settings = get_paycheck_settings(conn)?;
    let dates = schedule::paycheck_dates(settings.last_paycheck_date, today);
    let mut changed = 0;
    for e in list_fixed_expenses(conn, None)? {
        let status = classify::classify(e.amount, e.paid_amount, e.due_date, &dates, today);
        if e.status != status.as_str() {
            conn.execute(
                "UPDATE fixed_expenses SET status=?1 WHERE id=?2",
                params![status.as_str(), e.id],
            )?;
            changed += 1;
        }
    }
    Ok(changed)
}

// ── Pending transactions ──────────────────────────────────────

pub fn insert_pending_transaction(
    conn: &mut Connection,
    account_id: i64,
    amount: Decimal,
    category: &str,
    description: &str,
) -> Result<PendingTransaction> {
    let tx = conn.transaction()?;
    if get_account(&tx, account_id)?.is_none() {
        return Err(
            LedgerError::ReferentialIntegrity(format!("account #{} not found", account_id)).into(),
        );
    }
    let description = validate::sanitise(description);
    tx.execute(
        "INSERT INTO pending_transactions(account_id, amount, category, description)
         VALUES (?1, ?2, ?3, ?4)",
        params![account_id, amount.round_dp(2).to_string(), category, description],
    )?;
    let id = tx.last_insert_rowid();
    audit::record(
        &tx,
        AuditAction::Create,
        "pending_transaction",
        id,
        &json!({"accountId": account_id, "amount": amount.round_dp(2)}),
    )?;
    tx.commit()?;
    get_pending_transaction(conn, id)?.context("pending transaction vanished after insert")
}

pub fn get_pending_transaction(conn: &Connection, id: i64) -> Result<Option<PendingTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM pending_transactions WHERE id=?1",
        PENDING_COLS
    ))?;
    Ok(stmt.query_row(params![id], row_to_pending).optional()?)
}

pub fn list_pending_transactions(conn: &Connection) -> Result<Vec<PendingTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM pending_transactions ORDER BY id",
        PENDING_COLS
    ))?;
    let rows = stmt.query_map([], row_to_pending)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn delete_pending_transaction(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    if get_pending_transaction(&tx, id)?.is_none() {
        return Err(LedgerError::ReferentialIntegrity(format!(
            "pending transaction #{} not found",
            id
        ))
        .into());
    }
    tx.execute("DELETE FROM pending_transactions WHERE id=?1", params![id])?;
    audit::record(&tx, AuditAction::Delete, "pending_transaction", id, &json!({}))?;
    tx.commit()?;
    Ok(())
}

// ── Paycheck settings ─────────────────────────────────────────

pub fn get_paycheck_settings(conn: &Connection) -> Result<PaycheckSettings> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT last_paycheck_date, frequency FROM paycheck_settings WHERE id=1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let (raw_date, frequency) = row.unwrap_or_else(|| (String::new(), "biweekly".into()));
    let last_paycheck_date = if raw_date.is_empty() {
        None
    } else {
        Some(
            NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
                .with_context(|| format!("Invalid stored paycheck date '{}'", raw_date))?,
        )
    };
    Ok(PaycheckSettings {
        last_paycheck_date,
        frequency,
    })
}

pub fn set_paycheck_settings(conn: &mut Connection, last: Option<NaiveDate>) -> Result<()> {
    let tx = conn.transaction()?;
    let raw = last.map(|d| d.to_string()).unwrap_or_default();
    tx.execute(
        "INSERT INTO paycheck_settings(id, last_paycheck_date, frequency)
         VALUES (1, ?1, 'biweekly')
         ON CONFLICT(id) DO UPDATE SET last_paycheck_date=excluded.last_paycheck_date",
        params![raw],
    )?;
    audit::record(
        &tx,
        AuditAction::Update,
        "paycheck_settings",
        1,
        &json!({"lastPaycheckDate": raw}),
    )?;
    tx.commit()?;
    Ok(())
}

pub fn seed_paycheck_settings(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO paycheck_settings(id, last_paycheck_date, frequency)
         VALUES (1, '', 'biweekly')",
        [],
    )?;
    Ok(())
}

// ── Recurring templates ───────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewRecurringTemplate {
    pub name: String,
    pub base_amount: Decimal,
    pub frequency: Frequency,
    pub interval_value: u32,
    pub start_date: NaiveDate,
    pub category: String,
    pub account_id: Option<i64>,
    pub is_variable_amount: bool,
    pub notes: String,
}

pub fn insert_recurring_template(
    conn: &mut Connection,
    new: &NewRecurringTemplate,
) -> Result<RecurringTemplate> {
    if new.base_amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(vec!["amount must be greater than zero".into()]).into());
    }
    // Spawned expenses carry no target card, which the two-field rule
    // forbids for this category.
    if new.category == CREDIT_CARD_PAYMENT {
        return Err(LedgerError::Validation(vec![
            "recurring templates cannot use the Credit Card Payment category".into(),
        ])
        .into());
    }
    let tx = conn.transaction()?;
    if get_category_by_name(&tx, &new.category)?.is_none() {
        return Err(LedgerError::ReferentialIntegrity(format!(
            "category '{}' does not exist",
            new.category
        ))
        .into());
    }
    tx.execute(
        "INSERT INTO recurring_templates(name, base_amount, frequency, interval_value, start_date,
                                         category, account_id, is_variable_amount, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            validate::sanitise(&new.name),
            new.base_amount.round_dp(2).to_string(),
            new.frequency.as_str(),
            new.interval_value.max(1) as i64,
            new.start_date,
            new.category,
            new.account_id,
            new.is_variable_amount as i64,
            validate::sanitise(&new.notes),
        ],
    )?;
    let id = tx.last_insert_rowid();
    audit::record(
        &tx,
        AuditAction::Create,
        "recurring_template",
        id,
        &json!({"name": new.name, "frequency": new.frequency.as_str()}),
    )?;
    tx.commit()?;
    get_recurring_template(conn, id)?.context("template vanished after insert")
}

pub fn get_recurring_template(conn: &Connection, id: i64) -> Result<Option<RecurringTemplate>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM recurring_templates WHERE id=?1",
        TEMPLATE_COLS
    ))?;
    Ok(stmt.query_row(params![id], row_to_template).optional()?)
}

pub fn list_recurring_templates(conn: &Connection) -> Result<Vec<RecurringTemplate>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM recurring_templates ORDER BY id",
        TEMPLATE_COLS
    ))?;
    let rows = stmt.query_map([], row_to_template)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Deleting a template detaches the expenses it spawned rather than
/// deleting them.
pub fn delete_recurring_template(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    if get_recurring_template(&tx, id)?.is_none() {
        return Err(LedgerError::ReferentialIntegrity(format!("template #{} not found", id)).into());
    }
    tx.execute(
        "UPDATE fixed_expenses SET recurring_template_id=NULL WHERE recurring_template_id=?1",
        params![id],
    )?;
    tx.execute("DELETE FROM recurring_templates WHERE id=?1", params![id])?;
    audit::record(&tx, AuditAction::Delete, "recurring_template", id, &json!({}))?;
    tx.commit()?;
    Ok(())
}

// ── Snapshot export / import ──────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: i64,
    pub accounts: Vec<Account>,
    pub pending_transactions: Vec<PendingTransaction>,
    pub fixed_expenses: Vec<FixedExpense>,
    pub credit_cards: Vec<CreditCard>,
    pub categories: Vec<Category>,
    pub paycheck_settings: PaycheckSettings,
    pub recurring_templates: Vec<RecurringTemplate>,
    pub audit_logs: Vec<AuditLog>,
    pub exported_at: String,
}

pub fn export_snapshot(conn: &Connection) -> Result<Snapshot> {
    let mut audit_logs = audit::list(conn, None)?;
    audit_logs.reverse(); // insertion order
    Ok(Snapshot {
        version: crate::db::SCHEMA_VERSION,
        accounts: list_accounts(conn)?,
        pending_transactions: list_pending_transactions(conn)?,
        fixed_expenses: list_fixed_expenses(conn, None)?,
        credit_cards: list_credit_cards(conn)?,
        categories: list_categories(conn)?,
        paycheck_settings: get_paycheck_settings(conn)?,
        recurring_templates: list_recurring_templates(conn)?,
        audit_logs,
        exported_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Clear every table, then bulk-insert the snapshot with its original
/// ids, all in one transaction.
pub fn import_snapshot(conn: &mut Connection, snap: &Snapshot) -> Result<()> {
    let tx = conn.transaction()?;
    clear_tables(&tx)?;
    for a in &snap.accounts {
        tx.execute(
            "INSERT INTO accounts(id, name, type, current_balance, is_default, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                a.id,
                a.name,
                a.r#type.as_str(),
                a.current_balance.to_string(),
                a.is_default as i64,
                a.created_at,
            ],
        )?;
    }
    for c in &snap.credit_cards {
        tx.execute(
            "INSERT INTO credit_cards(id, name, balance, credit_limit, interest_rate, due_date,
                                      statement_closing_date, minimum_payment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                c.id,
                c.name,
                c.balance.to_string(),
                c.credit_limit.to_string(),
                c.interest_rate.to_string(),
                c.due_date,
                c.statement_closing_date,
                c.minimum_payment.to_string(),
                c.created_at,
            ],
        )?;
    }
    for c in &snap.categories {
        tx.execute(
            "INSERT INTO categories(id, name, icon, color, is_default, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![c.id, c.name, c.icon, c.color, c.is_default as i64, c.created_at],
        )?;
    }
    for e in &snap.fixed_expenses {
        tx.execute(
            "INSERT INTO fixed_expenses(id, name, due_date, amount, paid_amount, status, category,
                                        account_id, target_credit_card_id, recurring_template_id,
                                        created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                e.id,
                e.name,
                e.due_date,
                e.amount.to_string(),
                e.paid_amount.to_string(),
                e.status,
                e.category,
                e.account_id,
                e.target_credit_card_id,
                e.recurring_template_id,
                e.created_at,
            ],
        )?;
    }
    for p in &snap.pending_transactions {
        tx.execute(
            "INSERT INTO pending_transactions(id, account_id, amount, category, description,
                                              created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                p.id,
                p.account_id,
                p.amount.to_string(),
                p.category,
                p.description,
                p.created_at,
            ],
        )?;
    }
    for t in &snap.recurring_templates {
        tx.execute(
            "INSERT INTO recurring_templates(id, name, base_amount, frequency, interval_value,
                                             start_date, category, account_id, is_variable_amount,
                                             notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                t.id,
                t.name,
                t.base_amount.to_string(),
                t.frequency.as_str(),
                t.interval_value as i64,
                t.start_date,
                t.category,
                t.account_id,
                t.is_variable_amount as i64,
                t.notes,
                t.created_at,
            ],
        )?;
    }
    for l in &snap.audit_logs {
        tx.execute(
            "INSERT INTO audit_logs(id, timestamp, action_type, entity_type, entity_id, details)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                l.id,
                l.timestamp,
                l.action_type.as_str(),
                l.entity_type,
                l.entity_id,
                l.details,
            ],
        )?;
    }
    let raw = snap
        .paycheck_settings
        .last_paycheck_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    tx.execute(
        "INSERT INTO paycheck_settings(id, last_paycheck_date, frequency) VALUES (1, ?1, ?2)",
        params![raw, snap.paycheck_settings.frequency],
    )?;
    tx.commit()?;
    invalidate_category_cache();
    Ok(())
}

pub fn clear_all_data(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    clear_tables(&tx)?;
    tx.execute(
        "INSERT INTO paycheck_settings(id, last_paycheck_date, frequency)
         VALUES (1, '', 'biweekly')",
        [],
    )?;
    tx.commit()?;
    invalidate_category_cache();
    Ok(())
}

fn clear_tables(conn: &Connection) -> Result<()> {
    for table in [
        "fixed_expenses",
        "pending_transactions",
        "recurring_templates",
        "credit_cards",
        "accounts",
        "categories",
        "audit_logs",
        "paycheck_settings",
    ] {
        conn.execute(&format!("DELETE FROM {}", table), [])?;
    }
    Ok(())
}
