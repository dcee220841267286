// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use digibook::error::LedgerError;
use digibook::models::{AccountType, Frequency, CREDIT_CARD_PAYMENT};
use digibook::recurring;
use digibook::store::{self, NewRecurringTemplate};
use digibook::db;
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

fn template(conn: &mut Connection, frequency: Frequency, interval: u32, start: NaiveDate) -> digibook::models::RecurringTemplate {
    store::insert_recurring_template(
        conn,
        &NewRecurringTemplate {
            name: "Netflix".into(),
            base_amount: dec!(15.49),
            frequency,
            interval_value: interval,
            start_date: start,
            category: "Subscriptions".into(),
            account_id: None,
            is_variable_amount: false,
            notes: String::new(),
        },
    )
    .unwrap()
}

#[test]
fn occurrences_are_anchored_to_the_start_date() {
    let mut conn = setup();
    let t = template(&mut conn, Frequency::Monthly, 1, d(2025, 1, 31));
    assert_eq!(recurring::occurrence(&t, 0), Some(d(2025, 1, 31)));
    // February clamps, but March recovers the day because occurrences are
    // computed from the start date, not from the previous occurrence
    assert_eq!(recurring::occurrence(&t, 1), Some(d(2025, 2, 28)));
    assert_eq!(recurring::occurrence(&t, 2), Some(d(2025, 3, 31)));
}

#[test]
fn custom_frequency_steps_by_interval_months() {
    let mut conn = setup();
    let t = template(&mut conn, Frequency::Custom, 2, d(2025, 1, 15));
    assert_eq!(recurring::occurrence(&t, 1), Some(d(2025, 3, 15)));
    assert_eq!(recurring::occurrence(&t, 2), Some(d(2025, 5, 15)));
}

#[test]
fn quarterly_and_annual_cadences() {
    let mut conn = setup();
    let q = template(&mut conn, Frequency::Quarterly, 1, d(2025, 2, 10));
    assert_eq!(recurring::occurrence(&q, 1), Some(d(2025, 5, 10)));
    let a = template(&mut conn, Frequency::Annually, 1, d(2025, 3, 1));
    assert_eq!(recurring::occurrence(&a, 1), Some(d(2026, 3, 1)));
}

#[test]
fn run_due_materialises_missing_occurrences_once() {
    let mut conn = setup();
    let t = template(&mut conn, Frequency::Monthly, 1, d(2025, 6, 1));

    let created = recurring::run_due(&mut conn, d(2025, 8, 4)).unwrap();
    assert_eq!(created.len(), 3); // Jun, Jul, Aug 1st
    assert!(created.iter().all(|e| e.recurring_template_id == Some(t.id)));
    assert_eq!(created[0].due_date, d(2025, 6, 1));
    assert_eq!(created[2].due_date, d(2025, 8, 1));

    // second run adds nothing
    assert!(recurring::run_due(&mut conn, d(2025, 8, 4)).unwrap().is_empty());
    // advancing the horizon adds exactly the next occurrence
    let more = recurring::run_due(&mut conn, d(2025, 9, 1)).unwrap();
    assert_eq!(more.len(), 1);
    assert_eq!(more[0].due_date, d(2025, 9, 1));

    assert_eq!(
        recurring::next_occurrence_after(&t, d(2025, 8, 4)),
        Some(d(2025, 9, 1))
    );
}

#[test]
fn card_payment_templates_are_rejected() {
    let mut conn = setup();
    let err = store::insert_recurring_template(
        &mut conn,
        &NewRecurringTemplate {
            name: "Visa".into(),
            base_amount: dec!(50),
            frequency: Frequency::Monthly,
            interval_value: 1,
            start_date: d(2025, 6, 1),
            category: CREDIT_CARD_PAYMENT.into(),
            account_id: None,
            is_variable_amount: false,
            notes: String::new(),
        },
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::Validation(_))
    ));
}

#[test]
fn deleting_a_template_detaches_its_expenses() {
    let mut conn = setup();
    store::insert_account(&mut conn, "Checking", AccountType::Checking, dec!(100)).unwrap();
    let t = template(&mut conn, Frequency::Monthly, 1, d(2025, 7, 1));
    let created = recurring::run_due(&mut conn, d(2025, 8, 4)).unwrap();
    assert_eq!(created.len(), 2);

    store::delete_recurring_template(&mut conn, t.id).unwrap();
    for e in store::list_fixed_expenses(&conn, Some("Subscriptions")).unwrap() {
        assert_eq!(e.recurring_template_id, None);
    }
}
