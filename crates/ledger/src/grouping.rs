//! Dashboard grouping of project finance by client.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ProjectFinance;

/// Title used for projects without a client.
pub const UNASSIGNED_CLIENT: &str = "OTHERS";

/// Projects contracted by the same client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientGroup {
    pub title: String,
    pub projects: Vec<ProjectFinance>,
}

/// Trim and uppercase a client name; blank or missing maps to [`UNASSIGNED_CLIENT`].
pub fn normalize_client(client: Option<&str>) -> String {
    match client.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_uppercase(),
        _ => UNASSIGNED_CLIENT.to_string(),
    }
}

/// Group projects by normalised client, groups sorted by title.
///
/// Within a group projects keep their incoming order.
pub fn group_by_client<I>(projects: I) -> Vec<ClientGroup>
where
    I: IntoIterator<Item = ProjectFinance>,
{
    let mut groups: BTreeMap<String, Vec<ProjectFinance>> = BTreeMap::new();
    for project in projects {
        groups
            .entry(normalize_client(project.client.as_deref()))
            .or_default()
            .push(project);
    }

    groups
        .into_iter()
        .map(|(title, projects)| ClientGroup { title, projects })
        .collect()
}
