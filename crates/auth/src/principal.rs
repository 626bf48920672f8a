use std::collections::BTreeSet;

use obraledger_core::CompanyId;

use crate::{Identity, Role};

/// Companies a principal may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyScope {
    /// Every company, present and future.
    All,
    /// Exactly these companies (possibly none).
    Only(BTreeSet<CompanyId>),
}

impl CompanyScope {
    pub fn contains(&self, company_id: CompanyId) -> bool {
        match self {
            CompanyScope::All => true,
            CompanyScope::Only(ids) => ids.contains(&company_id),
        }
    }

    /// Narrow `all` (every known company id) to the visible subset.
    pub fn visible<I>(&self, all: I) -> BTreeSet<CompanyId>
    where
        I: IntoIterator<Item = CompanyId>,
    {
        all.into_iter().filter(|id| self.contains(*id)).collect()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CompanyScope::Only(ids) if ids.is_empty())
    }
}

/// A fully resolved principal for authorization decisions.
///
/// Built per request by [`crate::AccessResolver`]; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub identity: Identity,
    pub role: Role,
    pub scope: CompanyScope,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
