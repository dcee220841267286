// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use digibook::models::{Category, CREDIT_CARD_PAYMENT};
use digibook::validate;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn account_names_are_trimmed_and_bounded() {
    assert_eq!(validate::account_name("  Checking  ").value.unwrap(), "Checking");
    assert!(!validate::account_name("").is_valid);
    assert!(!validate::account_name("A").is_valid);
    assert!(!validate::account_name(&"x".repeat(51)).is_valid);
    assert!(validate::account_name(&"x".repeat(50)).is_valid);
}

#[test]
fn amounts_tolerate_symbols_and_separators() {
    assert_eq!(validate::amount("$1,234.56").value.unwrap(), dec!(1234.56));
    assert_eq!(validate::amount(" 42 ").value.unwrap(), dec!(42));
    assert_eq!(validate::amount("€99.9").value.unwrap(), dec!(99.90));
    assert!(!validate::amount("0").is_valid);
    assert!(!validate::amount("-5").is_valid);
    assert!(!validate::amount("1000000").is_valid);
    assert!(validate::amount("999999.99").is_valid);
    assert!(!validate::amount("twelve").is_valid);
}

#[test]
fn pins_are_four_to_six_digits() {
    assert!(validate::pin("1234").is_valid);
    assert!(validate::pin("123456").is_valid);
    assert!(!validate::pin("123").is_valid);
    assert!(!validate::pin("1234567").is_valid);
    assert!(!validate::pin("12a4").is_valid);
}

#[test]
fn dates_must_fall_within_ten_years_of_today() {
    let today = d(2025, 8, 4);
    assert!(validate::date("2025-08-07", today).is_valid);
    assert!(validate::date("2016-01-01", today).is_valid);
    assert!(!validate::date("2014-01-01", today).is_valid);
    assert!(!validate::date("2036-01-01", today).is_valid);
    assert!(!validate::date("not-a-date", today).is_valid);
    assert!(!validate::date("2025-02-30", today).is_valid);
}

fn cat(id: i64, name: &str) -> Category {
    Category {
        id,
        name: name.into(),
        icon: String::new(),
        color: String::new(),
        is_default: false,
        created_at: String::new(),
    }
}

#[test]
fn category_names_fold_case_for_uniqueness() {
    let existing = vec![cat(1, "Housing"), cat(2, "Utilities")];
    assert!(!validate::category_name("HOUSING", &existing, None).is_valid);
    assert!(validate::category_name("Pets", &existing, None).is_valid);
    // editing a category may keep its own name
    assert!(validate::category_name("housing", &existing, Some(1)).is_valid);
    assert!(!validate::category_name("x", &existing, None).is_valid);
    assert!(!validate::category_name(&"x".repeat(31), &existing, None).is_valid);
}

#[test]
fn sanitise_strips_markup_and_script_vectors() {
    assert_eq!(validate::sanitise("<b>Rent</b>"), "bRent/b");
    assert_eq!(validate::sanitise("javascript:alert(1)"), "alert(1)");
    assert_eq!(validate::sanitise("x onclick=evil() y"), "x evil() y");
    assert_eq!(validate::sanitise("  plain  "), "plain");
    assert_eq!(validate::sanitise(&"a".repeat(2000)).len(), 1000);
}

#[test]
fn card_payments_need_both_sources_and_others_exactly_one() {
    assert!(validate::expense_payment_source(CREDIT_CARD_PAYMENT, Some(1), Some(2)).is_valid);
    assert!(!validate::expense_payment_source(CREDIT_CARD_PAYMENT, None, Some(2)).is_valid);
    assert!(!validate::expense_payment_source(CREDIT_CARD_PAYMENT, Some(1), None).is_valid);
    assert!(!validate::expense_payment_source("Utilities", Some(1), Some(2)).is_valid);
    assert!(validate::expense_payment_source("Utilities", Some(1), None).is_valid);
    // unlinked is legal
    assert!(validate::expense_payment_source("Utilities", None, None).is_valid);
}
