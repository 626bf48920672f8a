use serde::{Deserialize, Serialize};

use obraledger_core::{CompanyId, DomainError, DomainResult, Entity};

/// Tenant entity owning projects and transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: CreateCompany.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
}

impl CreateCompany {
    pub fn into_company(self, id: CompanyId) -> DomainResult<Company> {
        let name = required("name", &self.name)?;
        Ok(Company { id, name })
    }
}

/// Trimmed, non-empty text field.
pub(crate) fn required(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trimmed text field where blank means absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
