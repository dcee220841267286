// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::models::{Category, CREDIT_CARD_PAYMENT};

/// Outcome of a pure validation rule. `value` carries the normalised input
/// when the rule passed.
#[derive(Debug, Clone)]
pub struct Validated<T> {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub value: Option<T>,
}

impl<T> Validated<T> {
    pub fn ok(value: T) -> Self {
        Validated {
            is_valid: true,
            errors: Vec::new(),
            value: Some(value),
        }
    }

    pub fn fail(errors: Vec<String>) -> Self {
        Validated {
            is_valid: false,
            errors,
            value: None,
        }
    }

    pub fn into_result(self) -> Result<T, LedgerError> {
        match self.value {
            Some(v) if self.is_valid => Ok(v),
            _ => Err(LedgerError::Validation(self.errors)),
        }
    }
}

pub fn account_name(raw: &str) -> Validated<String> {
    let name = raw.trim().to_string();
    let len = name.chars().count();
    if name.is_empty() {
        return Validated::fail(vec!["account name must not be empty".into()]);
    }
    if !(2..=50).contains(&len) {
        return Validated::fail(vec![format!(
            "account name must be 2-50 characters, got {}",
            len
        )]);
    }
    Validated::ok(name)
}

pub const AMOUNT_CEILING: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Tolerant money parse: currency symbols and thousands separators are
/// accepted on input, the stored value is a plain two-digit decimal.
pub fn amount(raw: &str) -> Validated<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',' | ' '))
        .collect();
    let parsed = match cleaned.parse::<Decimal>() {
        Ok(d) => d,
        Err(_) => {
            return Validated::fail(vec![format!("'{}' is not a valid amount", raw.trim())]);
        }
    };
    if parsed <= Decimal::ZERO {
        return Validated::fail(vec!["amount must be greater than zero".into()]);
    }
    if parsed >= AMOUNT_CEILING {
        return Validated::fail(vec!["amount must be below 1,000,000".into()]);
    }
    Validated::ok(parsed.round_dp(2))
}

pub fn pin(raw: &str) -> Validated<String> {
    let p = raw.trim();
    if !(4..=6).contains(&p.len()) || !p.chars().all(|c| c.is_ascii_digit()) {
        return Validated::fail(vec!["PIN must be 4-6 digits".into()]);
    }
    Validated::ok(p.to_string())
}

pub fn date(raw: &str, today: NaiveDate) -> Validated<NaiveDate> {
    let parsed = match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            return Validated::fail(vec![format!(
                "'{}' is not a valid date (expected YYYY-MM-DD)",
                raw.trim()
            )]);
        }
    };
    let floor = today.checked_sub_months(Months::new(120));
    let ceil = today.checked_add_months(Months::new(120));
    if let (Some(floor), Some(ceil)) = (floor, ceil) {
        if parsed < floor || parsed > ceil {
            return Validated::fail(vec![format!(
                "date {} is outside the supported range ({} to {})",
                parsed, floor, ceil
            )]);
        }
    }
    Validated::ok(parsed)
}

pub fn category_name(
    raw: &str,
    existing: &[Category],
    exclude_id: Option<i64>,
) -> Validated<String> {
    let name = raw.trim().to_string();
    let len = name.chars().count();
    if !(2..=30).contains(&len) {
        return Validated::fail(vec![format!(
            "category name must be 2-30 characters, got {}",
            len
        )]);
    }
    let folded = name.to_lowercase();
    let clash = existing
        .iter()
        .any(|c| Some(c.id) != exclude_id && c.name.to_lowercase() == folded);
    if clash {
        return Validated::fail(vec![format!("category '{}' already exists", name)]);
    }
    Validated::ok(name)
}

static JS_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)javascript\s*:").unwrap());
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bon\w+\s*=").unwrap());

const SANITISE_MAX_LEN: usize = 1_000;

/// Strip markup and script vectors from free-form text fields.
pub fn sanitise(raw: &str) -> String {
    let no_brackets: String = raw.chars().filter(|c| *c != '<' && *c != '>').collect();
    let no_scheme = JS_SCHEME.replace_all(&no_brackets, "");
    let no_handlers = EVENT_HANDLER.replace_all(&no_scheme, "");
    no_handlers.trim().chars().take(SANITISE_MAX_LEN).collect()
}

/// The exactly-one-payment-source rule. "Credit Card Payment" expenses
/// carry both a funding account and a target card; every other category
/// carries at most an `account_id` and never a target card.
pub fn expense_payment_source(
    category: &str,
    account_id: Option<i64>,
    target_credit_card_id: Option<i64>,
) -> Validated<()> {
    let mut errors = Vec::new();
    if category == CREDIT_CARD_PAYMENT {
        if account_id.is_none() {
            errors.push("a Credit Card Payment expense requires a funding account".into());
        }
        if target_credit_card_id.is_none() {
            errors.push("a Credit Card Payment expense requires a target credit card".into());
        }
    } else if target_credit_card_id.is_some() {
        errors.push(format!(
            "category '{}' must not carry a target credit card",
            category
        ));
    }
    if errors.is_empty() {
        Validated::ok(())
    } else {
        Validated::fail(errors)
    }
}
