// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category name that switches an expense into the two-field payment model
/// (funding account + target card).
pub const CREDIT_CARD_PAYMENT: &str = "Credit Card Payment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "checking" => Some(AccountType::Checking),
            "savings" => Some(AccountType::Savings),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub r#type: AccountType,
    pub current_balance: Decimal,
    pub is_default: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: i64,
    pub name: String,
    /// Positive = debt, zero = paid off, negative = credit on file.
    pub balance: Decimal,
    pub credit_limit: Decimal,
    /// Annual percentage rate.
    pub interest_rate: Decimal,
    pub due_date: NaiveDate,
    pub statement_closing_date: Option<NaiveDate>,
    pub minimum_payment: Decimal,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub is_default: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedExpense {
    pub id: i64,
    pub name: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    /// May exceed `amount` (overpayment on a cash expense).
    pub paid_amount: Decimal,
    pub status: String,
    pub category: String,
    /// References an Account, or a CreditCard for charged-to-card expenses.
    /// Null means unlinked.
    pub account_id: Option<i64>,
    /// Set only when `category` is "Credit Card Payment".
    pub target_credit_card_id: Option<i64>,
    pub recurring_template_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub id: i64,
    pub account_id: i64,
    /// Negative = outflow, positive = inflow.
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaycheckSettings {
    pub last_paycheck_date: Option<NaiveDate>,
    pub frequency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Complete,
    Pay,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Complete => "COMPLETE",
            AuditAction::Pay => "PAY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(AuditAction::Create),
            "UPDATE" => Some(AuditAction::Update),
            "DELETE" => Some(AuditAction::Delete),
            "COMPLETE" => Some(AuditAction::Complete),
            "PAY" => Some(AuditAction::Pay),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub timestamp: String,
    pub action_type: AuditAction,
    pub entity_type: String,
    pub entity_id: i64,
    /// JSON payload of the fields changed and their new values.
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Biannually,
    Annually,
    Custom,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Biannually => "biannually",
            Frequency::Annually => "annually",
            Frequency::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Some(Frequency::Monthly),
            "quarterly" => Some(Frequency::Quarterly),
            "biannually" => Some(Frequency::Biannually),
            "annually" => Some(Frequency::Annually),
            "custom" => Some(Frequency::Custom),
            _ => None,
        }
    }

    /// Months between consecutive occurrences; `interval_value` only
    /// applies to the custom cadence.
    pub fn months(&self, interval_value: u32) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Biannually => 6,
            Frequency::Annually => 12,
            Frequency::Custom => interval_value.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub id: i64,
    pub name: String,
    pub base_amount: Decimal,
    pub frequency: Frequency,
    /// Months between occurrences; meaningful only for `custom`.
    pub interval_value: u32,
    pub start_date: NaiveDate,
    pub category: String,
    pub account_id: Option<i64>,
    pub is_variable_amount: bool,
    pub notes: String,
    pub created_at: String,
}

/// How a payment moves money, derived once from the expense and handled
/// exhaustively by the payment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentSource {
    CreditCardPayment {
        funding_account_id: i64,
        target_card_id: i64,
    },
    CashFromAccount(i64),
    ChargedToCard(i64),
    Unlinked,
}
