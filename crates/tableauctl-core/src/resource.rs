//! Listable server resources

use std::fmt;
use std::str::FromStr;

use crate::error::HookError;

/// A paginated collection exposed by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Jobs,
    Workbooks,
    Datasources,
    Views,
    Projects,
    Users,
    Groups,
    Flows,
    Schedules,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Jobs,
        Resource::Workbooks,
        Resource::Datasources,
        Resource::Views,
        Resource::Projects,
        Resource::Users,
        Resource::Groups,
        Resource::Flows,
        Resource::Schedules,
    ];

    /// Name used to look the resource up, e.g. `"workbooks"`
    pub fn name(self) -> &'static str {
        match self {
            Resource::Jobs => "jobs",
            Resource::Workbooks => "workbooks",
            Resource::Datasources => "datasources",
            Resource::Views => "views",
            Resource::Projects => "projects",
            Resource::Users => "users",
            Resource::Groups => "groups",
            Resource::Flows => "flows",
            Resource::Schedules => "schedules",
        }
    }

    /// Whether the endpoint lives under `/sites/{site-id}`
    pub(crate) fn is_site_scoped(self) -> bool {
        !matches!(self, Resource::Schedules)
    }

    /// Outer and inner keys wrapping the item array in a listing response,
    /// e.g. `{"workbooks": {"workbook": [...]}}`
    pub(crate) fn collection_keys(self) -> (&'static str, &'static str) {
        match self {
            Resource::Jobs => ("backgroundJobs", "backgroundJob"),
            Resource::Workbooks => ("workbooks", "workbook"),
            Resource::Datasources => ("datasources", "datasource"),
            Resource::Views => ("views", "view"),
            Resource::Projects => ("projects", "project"),
            Resource::Users => ("users", "user"),
            Resource::Groups => ("groups", "group"),
            Resource::Flows => ("flows", "flow"),
            Resource::Schedules => ("schedules", "schedule"),
        }
    }
}

impl FromStr for Resource {
    type Err = HookError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| HookError::ResourceNotFound {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        for resource in Resource::ALL {
            assert_eq!(resource.name().parse::<Resource>().unwrap(), resource);
        }
    }

    #[test]
    fn test_lookup_is_exact() {
        let err = "Workbooks".parse::<Resource>().unwrap_err();
        assert_eq!(err.to_string(), "Resource name Workbooks is not found.");
        assert!("nonexistent_resource".parse::<Resource>().is_err());
    }

    #[test]
    fn test_jobs_collection_keys() {
        assert_eq!(
            Resource::Jobs.collection_keys(),
            ("backgroundJobs", "backgroundJob")
        );
        assert!(Resource::Jobs.is_site_scoped());
        assert!(!Resource::Schedules.is_site_scoped());
    }
}
