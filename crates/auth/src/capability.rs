use serde::{Deserialize, Serialize};

/// Something a principal may be allowed to do against a [`crate::Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// See the company, its projects and (windowed) transactions.
    ViewCompany,
    /// Book a new income/expense transaction.
    RecordTransaction,
    /// See running balances, totals and per-project finance.
    ViewBalances,
    /// Create/delete companies, projects and transactions; edit budgets.
    ManageLedger,
    /// Grant and revoke employee access.
    ManageGrants,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewCompany => "company.view",
            Capability::RecordTransaction => "transaction.record",
            Capability::ViewBalances => "balances.view",
            Capability::ManageLedger => "ledger.manage",
            Capability::ManageGrants => "grants.manage",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
