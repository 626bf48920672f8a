//! Ledger aggregation: running balances and per-project finance.
//!
//! Everything here is a single forward pass over an already ordered slice of
//! transactions. Nothing is persisted; figures are recomputed per request.
//! Sums use checked arithmetic: an overflow is an invariant violation, never a panic.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use obraledger_core::{DomainError, DomainResult, ProjectId};

use crate::{Project, Transaction, TransactionKind};

fn add(total: Decimal, amount: Decimal, what: &str) -> DomainResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| DomainError::invariant(format!("{what} overflow")))
}

/// Cumulative income/expense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl Totals {
    /// Both sides are non-negative, so the difference always fits.
    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }

    fn record(&mut self, tx: &Transaction) -> DomainResult<()> {
        match tx.kind {
            TransactionKind::Income => self.income = add(self.income, tx.amount.value(), "income total")?,
            TransactionKind::Expense => self.expense = add(self.expense, tx.amount.value(), "expense total")?,
        }
        Ok(())
    }
}

/// Per-project sub-aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFinance {
    pub project_id: ProjectId,
    pub name: String,
    pub client: Option<String>,
    pub budget: Decimal,
    /// Income booked against the project.
    pub collected: Decimal,
    /// Expense booked against the project.
    pub spent: Decimal,
    /// Collected / budget × 100, rounded to two places. Zero budget reports 0.
    pub collection_percentage: Decimal,
}

impl ProjectFinance {
    pub fn for_project(project: &Project) -> Self {
        Self {
            project_id: project.id,
            name: project.name.clone(),
            client: project.client.clone(),
            budget: project.budget,
            collected: Decimal::ZERO,
            spent: Decimal::ZERO,
            collection_percentage: Decimal::ZERO,
        }
    }

    pub fn profitability(&self) -> Decimal {
        self.collected - self.spent
    }

    pub fn has_activity(&self) -> bool {
        !self.collected.is_zero() || !self.spent.is_zero()
    }

    fn record(&mut self, tx: &Transaction) -> DomainResult<()> {
        match tx.kind {
            TransactionKind::Income => self.collected = add(self.collected, tx.amount.value(), "project income")?,
            TransactionKind::Expense => self.spent = add(self.spent, tx.amount.value(), "project expense")?,
        }
        Ok(())
    }
}

/// Collected / budget × 100, rounded to two places; 0 when the budget is 0.
pub fn collection_percentage(collected: Decimal, budget: Decimal) -> DomainResult<Decimal> {
    if budget.is_zero() {
        return Ok(Decimal::ZERO);
    }
    collected
        .checked_div(budget)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(2))
        .ok_or_else(|| DomainError::invariant("collection percentage overflow"))
}

/// A transaction annotated with the balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerLine {
    pub transaction: Transaction,
    pub running_balance: Decimal,
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub lines: Vec<LedgerLine>,
    pub totals: Totals,
    /// One entry per scoped project, in the order the projects were given.
    pub projects: Vec<ProjectFinance>,
}

impl LedgerSummary {
    pub fn project(&self, id: ProjectId) -> Option<&ProjectFinance> {
        self.projects.iter().find(|p| p.project_id == id)
    }

    pub fn closing_balance(&self) -> Decimal {
        self.totals.net()
    }
}

/// Incremental aggregator.
///
/// Projects passed to [`LedgerAggregator::scoped`] get a sub-aggregate even when
/// no transaction touches them; transactions for other projects only count
/// towards the totals.
#[derive(Debug, Default)]
pub struct LedgerAggregator {
    totals: Totals,
    lines: Vec<LedgerLine>,
    order: Vec<ProjectId>,
    projects: BTreeMap<ProjectId, ProjectFinance>,
}

impl LedgerAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scoped<'a, I>(projects: I) -> Self
    where
        I: IntoIterator<Item = &'a Project>,
    {
        let mut agg = Self::new();
        for project in projects {
            if agg.projects.insert(project.id, ProjectFinance::for_project(project)).is_none() {
                agg.order.push(project.id);
            }
        }
        agg
    }

    /// Add one transaction, returning the running balance after it.
    ///
    /// On overflow the aggregator is left unchanged.
    pub fn push(&mut self, tx: &Transaction) -> DomainResult<Decimal> {
        let mut totals = self.totals;
        totals.record(tx)?;

        if let Some(finance) = tx.project_id.and_then(|id| self.projects.get_mut(&id)) {
            finance.record(tx)?;
        }
        self.totals = totals;

        let running_balance = self.totals.net();
        self.lines.push(LedgerLine {
            transaction: tx.clone(),
            running_balance,
        });
        Ok(running_balance)
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn finish(mut self) -> DomainResult<LedgerSummary> {
        let mut projects = Vec::with_capacity(self.order.len());
        for id in &self.order {
            if let Some(mut finance) = self.projects.remove(id) {
                finance.collection_percentage = collection_percentage(finance.collected, finance.budget)?;
                projects.push(finance);
            }
        }

        Ok(LedgerSummary {
            lines: self.lines,
            totals: self.totals,
            projects,
        })
    }
}

/// Aggregate `transactions` (already in chronological order) scoped to `projects`.
pub fn aggregate(transactions: &[Transaction], projects: &[Project]) -> DomainResult<LedgerSummary> {
    let mut agg = LedgerAggregator::scoped(projects);
    for tx in transactions {
        agg.push(tx)?;
    }
    agg.finish()
}

/// Order by business date; equal dates keep their incoming order.
pub fn chronological(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions.sort_by_key(|t| t.date);
    transactions
}
