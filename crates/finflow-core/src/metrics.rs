//! Dashboard metrics derived from a transaction list
//!
//! Metrics have no lifecycle of their own: they are recomputed from the
//! current list on every render. Only the two totals are stored; the balance
//! is always derived from them.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::models::Transaction;
use super::types::TransactionType;

/// Income and expense totals for one transaction list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metrics {
    income: Decimal,
    expenses: Decimal,
    count: usize,
}

impl Metrics {
    /// Aggregate a transaction list. An empty list gives all-zero metrics.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions.iter().fold(Metrics::default(), |mut acc, tx| {
            match tx.kind {
                TransactionType::Income => acc.income = accumulate(acc.income, tx),
                TransactionType::Expense => acc.expenses = accumulate(acc.expenses, tx),
            }
            acc.count += 1;
            acc
        })
    }

    pub fn income(&self) -> Decimal {
        self.income
    }

    pub fn expenses(&self) -> Decimal {
        self.expenses
    }

    /// income − expenses, clamped to the representable range
    pub fn balance(&self) -> Decimal {
        self.income.saturating_sub(self.expenses)
    }

    /// Number of transactions aggregated
    pub fn count(&self) -> usize {
        self.count
    }

    /// Chart data: exactly `[Income, Expenses]`, in that order
    pub fn breakdown(&self) -> [CategorySlice; 2] {
        let total = self.income.abs().saturating_add(self.expenses.abs());
        let share = |value: Decimal| -> f64 {
            if total.is_zero() {
                0.0
            } else {
                let ratio = value.abs() / total * Decimal::ONE_HUNDRED;
                ratio.round_dp(1).to_f64().unwrap_or(0.0)
            }
        };
        [
            CategorySlice {
                label: "Income".to_string(),
                amount: self.income,
                percentage: share(self.income),
            },
            CategorySlice {
                label: "Expenses".to_string(),
                amount: self.expenses,
                percentage: share(self.expenses),
            },
        ]
    }

    /// Serializable snapshot including the derived balance
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            income: self.income,
            expenses: self.expenses,
            balance: self.balance(),
            transaction_count: self.count,
            breakdown: self.breakdown().to_vec(),
        }
    }
}

/// Totals clamp at `Decimal::MAX` rather than overflow
fn accumulate(total: Decimal, tx: &Transaction) -> Decimal {
    total.checked_add(tx.amount).unwrap_or_else(|| {
        log::warn!("Total overflowed at transaction {}, clamping", tx.id);
        total.saturating_add(tx.amount)
    })
}

/// One slice of the income/expense chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub label: String,
    pub amount: Decimal,
    /// Share of `|income| + |expenses|`, 0–100
    pub percentage: f64,
}

/// Metrics as returned by the JSON endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
    pub transaction_count: usize,
    pub breakdown: Vec<CategorySlice>,
}

// ==================== Tests ====================
