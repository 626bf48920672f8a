//! Access grants: explicit (subject, company) permission pairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use obraledger_core::{CompanyId, DomainResult, Entity, GrantId};

use crate::Email;

/// An employee's permission to operate within one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: GrantId,
    pub email: Email,
    pub company_id: CompanyId,
    pub created_at: DateTime<Utc>,
}

impl AccessGrant {
    /// Whether this grant covers `email` within `company_id`.
    pub fn covers(&self, email: &Email, company_id: CompanyId) -> bool {
        &self.email == email && self.company_id == company_id
    }
}

impl Entity for AccessGrant {
    type Id = GrantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: grant `email` access to `company_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantAccess {
    pub email: String,
    pub company_id: CompanyId,
}

impl GrantAccess {
    /// Validate the command and build the grant it describes.
    pub fn into_grant(self, id: GrantId, now: DateTime<Utc>) -> DomainResult<AccessGrant> {
        Ok(AccessGrant {
            id,
            email: Email::parse(&self.email)?,
            company_id: self.company_id,
            created_at: now,
        })
    }
}
