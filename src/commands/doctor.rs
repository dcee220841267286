// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CREDIT_CARD_PAYMENT;
use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

/// Read-only sweep of the ledger invariants. Reports, never repairs.
pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    let accounts = store::list_accounts(conn)?;
    let defaults = accounts.iter().filter(|a| a.is_default).count();
    if !accounts.is_empty() && defaults != 1 {
        rows.push(vec![
            "default_account".into(),
            format!("{} account(s) marked default, expected exactly 1", defaults),
        ]);
    }

    let categories = store::list_categories(conn)?;
    let cards = store::list_credit_cards(conn)?;

    for e in store::list_fixed_expenses(conn, None)? {
        if !categories
            .iter()
            .any(|c| c.name.to_lowercase() == e.category.to_lowercase())
        {
            rows.push(vec![
                "missing_category".into(),
                format!("expense '{}' references unknown category '{}'", e.name, e.category),
            ]);
        }
        if e.category == CREDIT_CARD_PAYMENT {
            match e.account_id {
                None => rows.push(vec![
                    "card_payment_unfunded".into(),
                    format!("expense '{}' has no funding account", e.name),
                ]),
                Some(id) if store::get_account(conn, id)?.is_none() => rows.push(vec![
                    "card_payment_bad_funding".into(),
                    format!("expense '{}' funding #{} is not a checking/savings account", e.name, id),
                ]),
                _ => {}
            }
            match e.target_credit_card_id {
                None => rows.push(vec![
                    "card_payment_untargeted".into(),
                    format!("expense '{}' has no target credit card", e.name),
                ]),
                Some(id) if store::get_credit_card(conn, id)?.is_none() => rows.push(vec![
                    "card_payment_bad_target".into(),
                    format!("expense '{}' target card #{} does not exist", e.name, id),
                ]),
                _ => {}
            }
        } else {
            if e.target_credit_card_id.is_some() {
                rows.push(vec![
                    "stray_target_card".into(),
                    format!(
                        "expense '{}' carries a target card but is category '{}'",
                        e.name, e.category
                    ),
                ]);
            }
            match e.account_id {
                None => rows.push(vec![
                    "unlinked_expense".into(),
                    format!("expense '{}' is not linked to an account", e.name),
                ]),
                Some(id)
                    if store::get_account(conn, id)?.is_none()
                        && store::get_credit_card(conn, id)?.is_none() =>
                {
                    rows.push(vec![
                        "dangling_account_ref".into(),
                        format!("expense '{}' references missing #{}", e.name, id),
                    ]);
                }
                _ => {}
            }
        }
    }

    for p in store::list_pending_transactions(conn)? {
        if store::get_account(conn, p.account_id)?.is_none() {
            rows.push(vec![
                "dangling_pending".into(),
                format!("pending transaction #{} references missing account #{}", p.id, p.account_id),
            ]);
        }
    }

    for card in &cards {
        let covered: i64 = conn.query_row(
            "SELECT COUNT(*) FROM fixed_expenses WHERE category=?1 AND target_credit_card_id=?2",
            rusqlite::params![CREDIT_CARD_PAYMENT, card.id],
            |r| r.get(0),
        )?;
        if covered == 0 {
            rows.push(vec![
                "card_without_payment_expense".into(),
                format!("card '{}' has no matching payment expense", card.name),
            ]);
        }
        if card.balance > card.credit_limit && card.credit_limit > rust_decimal::Decimal::ZERO {
            rows.push(vec![
                "over_limit".into(),
                format!("card '{}' is over its credit limit", card.name),
            ]);
        }
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
