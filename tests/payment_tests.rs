// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use digibook::error::LedgerError;
use digibook::models::{AccountType, AuditAction, CREDIT_CARD_PAYMENT};
use digibook::payment;
use digibook::store::{self, NewFixedExpense};
use digibook::{audit, db};
use rusqlite::Connection;
use rust_decimal_macros::dec;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init(&mut conn).unwrap();
    conn
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn today() -> NaiveDate {
    d(2025, 8, 4)
}

#[test]
fn credit_card_payment_moves_both_balances() {
    let mut conn = setup();
    let account = store::insert_account(
        &mut conn,
        "Everyday Checking",
        AccountType::Checking,
        dec!(2000),
    )
    .unwrap();
    let card = store::insert_credit_card(
        &mut conn,
        "Sapphire",
        dec!(500),
        dec!(5000),
        dec!(24.99),
        d(2025, 8, 15),
        None,
        dec!(35),
    )
    .unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Sapphire August".into(),
            due_date: d(2025, 8, 15),
            amount: dec!(150),
            category: CREDIT_CARD_PAYMENT.into(),
            account_id: Some(account.id),
            target_credit_card_id: Some(card.id),
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    let audits_before = audit::count(&conn).unwrap();
    let outcome = payment::apply_payment(&mut conn, expense.id, dec!(150), today()).unwrap();

    assert_eq!(outcome.expense.paid_amount, dec!(150));
    assert_eq!(outcome.expense.status, "Paid");
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(1850)
    );
    assert_eq!(
        store::get_credit_card(&conn, card.id).unwrap().unwrap().balance,
        dec!(350)
    );
    assert_eq!(audit::count(&conn).unwrap(), audits_before + 1);
    let latest = &audit::list(&conn, Some(1)).unwrap()[0];
    assert_eq!(latest.action_type, AuditAction::Pay);
    assert_eq!(latest.entity_id, expense.id);
}

#[test]
fn charge_to_card_then_reassign_to_account() {
    let mut conn = setup();
    let account = store::insert_account(
        &mut conn,
        "Everyday Checking",
        AccountType::Checking,
        dec!(2000),
    )
    .unwrap();
    let card = store::insert_credit_card(
        &mut conn,
        "Sapphire",
        dec!(500),
        dec!(5000),
        dec!(24.99),
        d(2025, 8, 15),
        None,
        dec!(35),
    )
    .unwrap();
    // expense charged to the card itself
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Gym".into(),
            due_date: d(2025, 8, 10),
            amount: dec!(80),
            category: "Other".into(),
            account_id: Some(card.id),
            target_credit_card_id: None,
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    payment::apply_payment(&mut conn, expense.id, dec!(80), today()).unwrap();
    assert_eq!(
        store::get_credit_card(&conn, card.id).unwrap().unwrap().balance,
        dec!(580)
    );
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(2000)
    );

    // moving it onto a bank account unwinds the charge
    let outcome = payment::reassign_expense_account(&mut conn, expense.id, Some(account.id)).unwrap();
    assert_eq!(outcome.expense.account_id, Some(account.id));
    assert_eq!(
        store::get_credit_card(&conn, card.id).unwrap().unwrap().balance,
        dec!(500)
    );
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(2000)
    );
}

#[test]
fn cash_expense_debits_account_and_reports_overpayment() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(500)).unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Internet".into(),
            due_date: d(2025, 8, 20),
            amount: dec!(80),
            category: "Utilities".into(),
            account_id: Some(account.id),
            target_credit_card_id: None,
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    payment::apply_payment(&mut conn, expense.id, dec!(80), today()).unwrap();
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(420)
    );

    let outcome = payment::apply_payment(&mut conn, expense.id, dec!(100), today()).unwrap();
    assert!(outcome.notices.iter().any(|n| n.contains("overpaid")));
    assert_eq!(outcome.expense.paid_amount, dec!(100));
    assert_eq!(outcome.expense.status, "Paid");
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(400)
    );
}

#[test]
fn repeated_payment_is_a_noop() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(500)).unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Internet".into(),
            due_date: d(2025, 8, 20),
            amount: dec!(80),
            category: "Utilities".into(),
            account_id: Some(account.id),
            target_credit_card_id: None,
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    payment::apply_payment(&mut conn, expense.id, dec!(80), today()).unwrap();
    let audits = audit::count(&conn).unwrap();
    let outcome = payment::apply_payment(&mut conn, expense.id, dec!(80), today()).unwrap();
    assert!(outcome.notices.iter().any(|n| n.contains("unchanged")));
    assert_eq!(audit::count(&conn).unwrap(), audits);
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(420)
    );
}

#[test]
fn later_payment_rebases_on_the_earlier_one() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(1000)).unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Rent".into(),
            due_date: d(2025, 8, 20),
            amount: dec!(100),
            category: "Housing".into(),
            account_id: Some(account.id),
            target_credit_card_id: None,
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    payment::apply_payment(&mut conn, expense.id, dec!(40), today()).unwrap();
    let outcome = payment::apply_payment(&mut conn, expense.id, dec!(100), today()).unwrap();
    assert_eq!(outcome.expense.paid_amount, dec!(100));
    // net delta equals final minus original
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(900)
    );

    // lowering the paid amount refunds the difference
    let outcome = payment::apply_payment(&mut conn, expense.id, dec!(30), today()).unwrap();
    assert_eq!(outcome.expense.paid_amount, dec!(30));
    assert_eq!(outcome.expense.status, "Partially Paid");
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(970)
    );
}

#[test]
fn card_payment_floors_target_at_zero() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(1000)).unwrap();
    let card = store::insert_credit_card(
        &mut conn,
        "Rewards",
        dec!(100),
        dec!(2000),
        dec!(19.99),
        d(2025, 8, 18),
        None,
        dec!(25),
    )
    .unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Rewards August".into(),
            due_date: d(2025, 8, 18),
            amount: dec!(150),
            category: CREDIT_CARD_PAYMENT.into(),
            account_id: Some(account.id),
            target_credit_card_id: Some(card.id),
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    let outcome = payment::apply_payment(&mut conn, expense.id, dec!(150), today()).unwrap();
    // full amount leaves the funding account, the card never goes negative
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(850)
    );
    assert_eq!(
        store::get_credit_card(&conn, card.id).unwrap().unwrap().balance,
        dec!(0)
    );
    assert!(outcome.notices.iter().any(|n| n.contains("zero floor")));
}

#[test]
fn unlinked_payment_records_on_the_expense_only() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(500)).unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Tuition".into(),
            due_date: d(2025, 8, 20),
            amount: dec!(200),
            category: "Education".into(),
            account_id: None,
            target_credit_card_id: None,
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    let outcome = payment::apply_payment(&mut conn, expense.id, dec!(50), today()).unwrap();
    assert!(outcome.notices.iter().any(|n| n.contains("not linked")));
    assert_eq!(outcome.expense.paid_amount, dec!(50));
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(500)
    );
}

#[test]
fn paying_a_missing_expense_is_referential_integrity() {
    let mut conn = setup();
    let err = payment::apply_payment(&mut conn, 999, dec!(10), today()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::ReferentialIntegrity(_))
    ));
}

#[test]
fn mark_paid_uses_the_canonical_target_card() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(1000)).unwrap();
    // card whose name would defeat any name-matching heuristic
    let card = store::insert_credit_card(
        &mut conn,
        "Totally Different Name",
        dec!(300),
        dec!(2000),
        dec!(22.5),
        d(2025, 8, 18),
        None,
        dec!(40),
    )
    .unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Visa Payment".into(),
            due_date: d(2025, 8, 18),
            amount: dec!(40),
            category: CREDIT_CARD_PAYMENT.into(),
            account_id: Some(account.id),
            target_credit_card_id: Some(card.id),
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    let outcome = payment::mark_paid(&mut conn, expense.id, today()).unwrap();
    assert_eq!(outcome.expense.status, "Paid");
    assert_eq!(
        store::get_credit_card(&conn, card.id).unwrap().unwrap().balance,
        dec!(260)
    );
}

#[test]
fn reassign_category_enforces_the_two_field_rule() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(500)).unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Internet".into(),
            due_date: d(2025, 8, 20),
            amount: dec!(80),
            category: "Utilities".into(),
            account_id: Some(account.id),
            target_credit_card_id: None,
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    // onto Credit Card Payment without a target card: rejected
    let err =
        payment::reassign_category(&mut conn, expense.id, CREDIT_CARD_PAYMENT).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::Validation(_))
    ));

    // ordinary move succeeds and moves no balances
    let outcome = payment::reassign_category(&mut conn, expense.id, "Subscriptions").unwrap();
    assert_eq!(outcome.expense.category, "Subscriptions");
    assert_eq!(
        store::get_account(&conn, account.id).unwrap().unwrap().current_balance,
        dec!(500)
    );
}

#[test]
fn moving_off_card_payment_drops_the_target() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(500)).unwrap();
    let card = store::insert_credit_card(
        &mut conn,
        "Rewards",
        dec!(100),
        dec!(2000),
        dec!(19.99),
        d(2025, 8, 18),
        None,
        dec!(25),
    )
    .unwrap();
    let expense = store::insert_fixed_expense(
        &mut conn,
        &NewFixedExpense {
            name: "Rewards August".into(),
            due_date: d(2025, 8, 18),
            amount: dec!(25),
            category: CREDIT_CARD_PAYMENT.into(),
            account_id: Some(account.id),
            target_credit_card_id: Some(card.id),
            recurring_template_id: None,
        },
        today(),
    )
    .unwrap();

    let outcome = payment::reassign_category(&mut conn, expense.id, "Debt").unwrap();
    assert_eq!(outcome.expense.category, "Debt");
    assert_eq!(outcome.expense.target_credit_card_id, None);
}

#[test]
fn complete_pending_applies_delta_and_deletes_the_row() {
    let mut conn = setup();
    let account =
        store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(1000)).unwrap();
    let pending = store::insert_pending_transaction(
        &mut conn,
        account.id,
        dec!(-250),
        "Other",
        "check #1042",
    )
    .unwrap();

    let new_balance = payment::complete_pending(&mut conn, pending.id).unwrap();
    assert_eq!(new_balance, dec!(750));
    assert!(store::get_pending_transaction(&conn, pending.id).unwrap().is_none());
    let latest = &audit::list(&conn, Some(1)).unwrap()[0];
    assert_eq!(latest.action_type, AuditAction::Complete);
}
