use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use obraledger_core::{DomainError, DomainResult, ValueObject};

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
        }
    }

    /// Signed contribution of `amount` to a balance.
    pub fn signed(&self, amount: Amount) -> Decimal {
        match self {
            TransactionKind::Income => amount.value(),
            TransactionKind::Expense => -amount.value(),
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            other => Err(DomainError::validation(format!(
                "kind must be INCOME or EXPENSE, got '{other}'"
            ))),
        }
    }
}

/// Largest amount or budget accepted, in whole units.
pub const MAX_MONEY_UNITS: i64 = 1_000_000_000_000_000;

/// Validate a non-negative money field no larger than [`MAX_MONEY_UNITS`].
pub fn check_money(field: &str, value: Decimal) -> DomainResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation(format!("{field} must not be negative")));
    }
    if value > Decimal::from(MAX_MONEY_UNITS) {
        return Err(DomainError::validation(format!(
            "{field} must not exceed {MAX_MONEY_UNITS}"
        )));
    }
    Ok(value.normalize())
}

/// Non-negative monetary amount; the sign comes from [`TransactionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub fn new(value: Decimal) -> DomainResult<Self> {
        check_money("amount", value).map(Self)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for Amount {}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
