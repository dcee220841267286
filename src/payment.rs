// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde_json::json;

use crate::audit;
use crate::classify;
use crate::error::LedgerError;
use crate::models::{AuditAction, FixedExpense, PaymentSource, CREDIT_CARD_PAYMENT};
use crate::schedule;
use crate::store;
use crate::validate;

/// Result of a payment-engine mutation. Notices are non-fatal and are
/// surfaced to the user alongside the success line.
#[derive(Debug)]
pub struct PaymentOutcome {
    pub expense: FixedExpense,
    pub notices: Vec<String>,
}

/// Derive the payment mode of an expense. Looked up inside the mutation's
/// transaction so the edges cannot dangle mid-flight. Account ids are
/// resolved against accounts first, then credit cards.
pub fn resolve_payment_source(conn: &Connection, expense: &FixedExpense) -> Result<PaymentSource> {
    if expense.category == CREDIT_CARD_PAYMENT {
        validate::expense_payment_source(
            &expense.category,
            expense.account_id,
            expense.target_credit_card_id,
        )
        .into_result()?;
        let (Some(funding_account_id), Some(target_card_id)) =
            (expense.account_id, expense.target_credit_card_id)
        else {
            return Err(LedgerError::Validation(vec![
                "a Credit Card Payment expense requires a funding account and target card".into(),
            ])
            .into());
        };
        if store::get_account(conn, funding_account_id)?.is_none() {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "funding account #{} not found",
                funding_account_id
            ))
            .into());
        }
        if store::get_credit_card(conn, target_card_id)?.is_none() {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "target credit card #{} not found",
                target_card_id
            ))
            .into());
        }
        return Ok(PaymentSource::CreditCardPayment {
            funding_account_id,
            target_card_id,
        });
    }
    match expense.account_id {
        None => Ok(PaymentSource::Unlinked),
        Some(id) => {
            if store::get_account(conn, id)?.is_some() {
                Ok(PaymentSource::CashFromAccount(id))
            } else if store::get_credit_card(conn, id)?.is_some() {
                Ok(PaymentSource::ChargedToCard(id))
            } else {
                Err(LedgerError::ReferentialIntegrity(format!(
                    "account #{} does not resolve to an account or credit card",
                    id
                ))
                .into())
            }
        }
    }
}

/// One intended balance write, kept for the post-write verification pass.
#[derive(Debug, Clone, Copy)]
enum BalanceWrite {
    Account { id: i64, balance: Decimal },
    Card { id: i64, balance: Decimal },
}

fn write_balance(conn: &Connection, w: &BalanceWrite) -> Result<()> {
    match w {
        BalanceWrite::Account { id, balance } => {
            conn.execute(
                "UPDATE accounts SET current_balance=?1 WHERE id=?2",
                params![balance.to_string(), id],
            )?;
        }
        BalanceWrite::Card { id, balance } => {
            conn.execute(
                "UPDATE credit_cards SET balance=?1 WHERE id=?2",
                params![balance.to_string(), id],
            )?;
        }
    }
    Ok(())
}

fn balance_matches(conn: &Connection, w: &BalanceWrite) -> Result<bool> {
    Ok(match w {
        BalanceWrite::Account { id, balance } => store::get_account(conn, *id)?
            .map(|a| a.current_balance == *balance)
            .unwrap_or(false),
        BalanceWrite::Card { id, balance } => store::get_credit_card(conn, *id)?
            .map(|c| c.balance == *balance)
            .unwrap_or(false),
    })
}

/// Set an expense's `paid_amount` to `new_paid_amount` and propagate the
/// delta to the affected balance-bearing entities, atomically:
///
/// - Credit Card Payment: debit the funding account, pay the target card
///   down to at most zero (overshoot is dropped, never carried negative).
/// - Cash expense: debit the account.
/// - Charged to card: increase the card's debt.
/// - Unlinked: record on the expense only and notice the caller.
///
/// After writing, every updated field is re-read and compared; a mismatch
/// is rewritten once, then surfaces as `VerificationMismatch` with the
/// transaction aborted.
pub fn apply_payment(
    conn: &mut Connection,
    expense_id: i64,
    new_paid_amount: Decimal,
    today: NaiveDate,
) -> Result<PaymentOutcome> {
    if new_paid_amount < Decimal::ZERO {
        return Err(
            LedgerError::Validation(vec!["paid amount must not be negative".into()]).into(),
        );
    }
    let new_paid = new_paid_amount.round_dp(2);

    let tx = conn.transaction()?;
    let expense = store::get_fixed_expense(&tx, expense_id)?.ok_or_else(|| {
        LedgerError::ReferentialIntegrity(format!("expense #{} not found", expense_id))
    })?;
    let delta = new_paid - expense.paid_amount;
    if delta.is_zero() {
        drop(tx);
        return Ok(PaymentOutcome {
            expense,
            notices: vec!["payment unchanged; nothing to do".into()],
        });
    }

    let source = resolve_payment_source(&tx, &expense)?;
    let mut notices = Vec::new();
    let mut writes: Vec<BalanceWrite> = Vec::new();

    match source {
        PaymentSource::CreditCardPayment {
            funding_account_id,
            target_card_id,
        } => {
            let funding = store::get_account(&tx, funding_account_id)?
                .context("funding account vanished mid-transaction")?;
            let card = store::get_credit_card(&tx, target_card_id)?
                .context("target card vanished mid-transaction")?;
            let paid_down = (card.balance - delta).max(Decimal::ZERO);
            if delta > card.balance && delta > Decimal::ZERO {
                notices.push(format!(
                    "payment exceeds the card balance; {} dropped at the zero floor",
                    (delta - card.balance).round_dp(2)
                ));
            }
            writes.push(BalanceWrite::Account {
                id: funding_account_id,
                balance: (funding.current_balance - delta).round_dp(2),
            });
            writes.push(BalanceWrite::Card {
                id: target_card_id,
                balance: paid_down.round_dp(2),
            });
        }
        PaymentSource::CashFromAccount(id) => {
            let account =
                store::get_account(&tx, id)?.context("account vanished mid-transaction")?;
            writes.push(BalanceWrite::Account {
                id,
                balance: (account.current_balance - delta).round_dp(2),
            });
            if new_paid > expense.amount {
                notices.push(format!(
                    "overpaid by {}",
                    (new_paid - expense.amount).round_dp(2)
                ));
            }
        }
        PaymentSource::ChargedToCard(id) => {
            let card =
                store::get_credit_card(&tx, id)?.context("credit card vanished mid-transaction")?;
            writes.push(BalanceWrite::Card {
                id,
                balance: (card.balance + delta).round_dp(2),
            });
        }
        PaymentSource::Unlinked => {
            notices.push(
                "expense is not linked to an account; payment recorded on the expense only".into(),
            );
        }
    }

    let settings = store::get_paycheck_settings(&tx)?;
    let dates = schedule::paycheck_dates(settings.last_paycheck_date, today);
    let status = classify::classify(expense.amount, new_paid, expense.due_date, &dates, today);

    for attempt in 0..2 {
        for w in &writes {
            write_balance(&tx, w)?;
        }
        tx.execute(
            "UPDATE fixed_expenses SET paid_amount=?1, status=?2 WHERE id=?3",
            params![new_paid.to_string(), status.as_str(), expense_id],
        )?;

        let mut ok = true;
        for w in &writes {
            ok = ok && balance_matches(&tx, w)?;
        }
        let reread = store::get_fixed_expense(&tx, expense_id)?
            .context("expense vanished mid-transaction")?;
        ok = ok && reread.paid_amount == new_paid && reread.status == status.as_str();
        if ok {
            break;
        }
        if attempt == 1 {
            return Err(LedgerError::VerificationMismatch {
                entity: "fixed_expense",
                id: expense_id,
            }
            .into());
        }
    }

    audit::record(
        &tx,
        AuditAction::Pay,
        "fixed_expense",
        expense_id,
        &json!({
            "paidAmount": new_paid,
            "previousPaidAmount": expense.paid_amount,
            "delta": delta,
            "status": status.as_str(),
        }),
    )?;
    tx.commit()?;

    let expense = store::get_fixed_expense(conn, expense_id)?
        .context("expense vanished after payment")?;
    Ok(PaymentOutcome { expense, notices })
}

/// Pay the expense in full against its canonical linkage.
pub fn mark_paid(conn: &mut Connection, expense_id: i64, today: NaiveDate) -> Result<PaymentOutcome> {
    let amount = store::get_fixed_expense(conn, expense_id)?
        .ok_or_else(|| {
            LedgerError::ReferentialIntegrity(format!("expense #{} not found", expense_id))
        })?
        .amount;
    apply_payment(conn, expense_id, amount, today)
}

/// Move an expense to a different funding reference. Leaving a credit
/// card unwinds the charge (floored at zero); arriving at one charges it.
/// Account-to-account moves touch no balances.
pub fn reassign_expense_account(
    conn: &mut Connection,
    expense_id: i64,
    new_account_id: Option<i64>,
) -> Result<PaymentOutcome> {
    let tx = conn.transaction()?;
    let expense = store::get_fixed_expense(&tx, expense_id)?.ok_or_else(|| {
        LedgerError::ReferentialIntegrity(format!("expense #{} not found", expense_id))
    })?;

    let old_card = match expense.account_id {
        Some(id) if store::get_account(&tx, id)?.is_none() => store::get_credit_card(&tx, id)?,
        _ => None,
    };
    let new_is_account = match new_account_id {
        Some(id) => store::get_account(&tx, id)?.is_some(),
        None => false,
    };
    let new_card = match new_account_id {
        Some(id) if !new_is_account => {
            let card = store::get_credit_card(&tx, id)?;
            if card.is_none() {
                return Err(LedgerError::ReferentialIntegrity(format!(
                    "account #{} does not resolve to an account or credit card",
                    id
                ))
                .into());
            }
            card
        }
        _ => None,
    };
    if expense.category == CREDIT_CARD_PAYMENT && new_card.is_some() {
        return Err(LedgerError::Validation(vec![
            "a Credit Card Payment expense must be funded by a checking/savings account".into(),
        ])
        .into());
    }

    let mut notices = Vec::new();
    if let Some(old) = &old_card {
        if new_card.is_none() {
            let unwound = (old.balance - expense.amount).max(Decimal::ZERO);
            tx.execute(
                "UPDATE credit_cards SET balance=?1 WHERE id=?2",
                params![unwound.round_dp(2).to_string(), old.id],
            )?;
            notices.push(format!("removed {} from '{}'", expense.amount, old.name));
        }
    }
    if old_card.is_none() {
        if let Some(new) = &new_card {
            let charged = (new.balance + expense.amount).round_dp(2);
            tx.execute(
                "UPDATE credit_cards SET balance=?1 WHERE id=?2",
                params![charged.to_string(), new.id],
            )?;
            notices.push(format!("charged {} to '{}'", expense.amount, new.name));
        }
    }

    tx.execute(
        "UPDATE fixed_expenses SET account_id=?1 WHERE id=?2",
        params![new_account_id, expense_id],
    )?;
    audit::record(
        &tx,
        AuditAction::Update,
        "fixed_expense",
        expense_id,
        &json!({"accountId": new_account_id, "previousAccountId": expense.account_id}),
    )?;
    tx.commit()?;

    let expense = store::get_fixed_expense(conn, expense_id)?
        .context("expense vanished after reassignment")?;
    Ok(PaymentOutcome { expense, notices })
}

/// Drag-and-drop category move. Text-only; balances never move. Moving
/// onto "Credit Card Payment" requires a target card already linked;
/// moving off it drops the target so the one-source invariant holds.
pub fn reassign_category(
    conn: &mut Connection,
    expense_id: i64,
    new_category: &str,
) -> Result<PaymentOutcome> {
    let tx = conn.transaction()?;
    let expense = store::get_fixed_expense(&tx, expense_id)?.ok_or_else(|| {
        LedgerError::ReferentialIntegrity(format!("expense #{} not found", expense_id))
    })?;
    let category = store::get_category_by_name(&tx, new_category)?.ok_or_else(|| {
        LedgerError::ReferentialIntegrity(format!("category '{}' does not exist", new_category))
    })?;

    let leaving_card_payment =
        expense.category == CREDIT_CARD_PAYMENT && category.name != CREDIT_CARD_PAYMENT;
    let target = if leaving_card_payment {
        None
    } else {
        expense.target_credit_card_id
    };
    validate::expense_payment_source(&category.name, expense.account_id, target).into_result()?;

    tx.execute(
        "UPDATE fixed_expenses SET category=?1, target_credit_card_id=?2 WHERE id=?3",
        params![category.name, target, expense_id],
    )?;
    audit::record(
        &tx,
        AuditAction::Update,
        "fixed_expense",
        expense_id,
        &json!({"category": category.name, "previousCategory": expense.category}),
    )?;
    tx.commit()?;

    let expense = store::get_fixed_expense(conn, expense_id)?
        .context("expense vanished after category move")?;
    Ok(PaymentOutcome {
        expense,
        notices: Vec::new(),
    })
}

/// Clear a pending transaction: apply its delta to the account and delete
/// the row, in one transaction.
pub fn complete_pending(conn: &mut Connection, pending_id: i64) -> Result<Decimal> {
    let tx = conn.transaction()?;
    let pending = store::get_pending_transaction(&tx, pending_id)?.ok_or_else(|| {
        LedgerError::ReferentialIntegrity(format!("pending transaction #{} not found", pending_id))
    })?;
    let account = store::get_account(&tx, pending.account_id)?.ok_or_else(|| {
        LedgerError::ReferentialIntegrity(format!("account #{} not found", pending.account_id))
    })?;
    let new_balance = (account.current_balance + pending.amount).round_dp(2);
    tx.execute(
        "UPDATE accounts SET current_balance=?1 WHERE id=?2",
        params![new_balance.to_string(), account.id],
    )?;
    tx.execute(
        "DELETE FROM pending_transactions WHERE id=?1",
        params![pending_id],
    )?;
    audit::record(
        &tx,
        AuditAction::Complete,
        "pending_transaction",
        pending_id,
        &json!({
            "accountId": account.id,
            "amount": pending.amount,
            "newBalance": new_balance,
        }),
    )?;
    tx.commit()?;
    Ok(new_balance)
}
