use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use obraledger_core::{CompanyId, DomainError, DomainResult, Entity, ProjectId};

use crate::company::{optional, required};
use crate::money::check_money;

/// A contracted unit of work under a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub company_id: CompanyId,
    pub name: String,
    /// Client the work is contracted for (often a municipality).
    pub client: Option<String>,
    /// Contract budget; never negative.
    pub budget: Decimal,
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn check_budget(budget: Decimal) -> DomainResult<Decimal> {
    check_money("budget", budget)
}

/// Command: CreateProject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProject {
    pub company_id: CompanyId,
    pub name: String,
    pub client: Option<String>,
    pub budget: Decimal,
}

impl CreateProject {
    pub fn into_project(self, id: ProjectId) -> DomainResult<Project> {
        Ok(Project {
            id,
            company_id: self.company_id,
            name: required("name", &self.name)?,
            client: optional(self.client),
            budget: check_budget(self.budget)?,
        })
    }
}

/// Command: UpdateBudget (field-level edit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBudget {
    pub project_id: ProjectId,
    pub budget: Decimal,
}

impl UpdateBudget {
    /// Apply the edit to `project`, returning the updated entity.
    pub fn apply_to(self, mut project: Project) -> DomainResult<Project> {
        if project.id != self.project_id {
            return Err(DomainError::invariant("budget update addressed to another project"));
        }
        project.budget = check_budget(self.budget)?;
        Ok(project)
    }
}
