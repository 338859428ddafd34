use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. `"write_patients"`).
/// Roles and overrides reference permissions by name, never by pointer, so
/// the catalog stays a flat, versionless index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog entry: a permission name plus display metadata for admin UIs
/// and audit output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDef {
    pub name: Permission,
    pub module: &'static str,
    pub action: &'static str,
    pub description: String,
}

/// The fixed universe of capability names.
///
/// Seeded at startup and never user-editable at runtime. Removing or renaming
/// a permission is a single catalog edit here, not a graph rewrite.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    defs: BTreeMap<String, PermissionDef>,
}

/// Resource modules that carry a read/write permission pair.
const MODULES: &[&str] = &[
    "patients",
    "appointments",
    "invoices",
    "inventory",
    "leads",
    "payments",
];

impl PermissionCatalog {
    /// Build the seeded catalog.
    ///
    /// Each resource module contributes `read_<module>` and `write_<module>`;
    /// patients and appointments additionally carry an administrator-scope
    /// `read_all_<module>` used by the scoped filter rules. `manage_roles`
    /// and `manage_clinic` are cross-cutting administrative capabilities.
    pub fn seeded() -> Self {
        let mut defs = BTreeMap::new();

        let mut insert = |name: String, module: &'static str, action: &'static str, desc: String| {
            defs.insert(
                name.clone(),
                PermissionDef {
                    name: Permission::new(name),
                    module,
                    action,
                    description: desc,
                },
            );
        };

        for module in MODULES {
            insert(
                format!("read_{module}"),
                module,
                "read",
                format!("View {module} records"),
            );
            insert(
                format!("write_{module}"),
                module,
                "write",
                format!("Create and update {module} records"),
            );
        }

        for module in ["patients", "appointments"] {
            insert(
                format!("read_all_{module}"),
                if module == "patients" { "patients" } else { "appointments" },
                "read_all",
                format!("View all {module} regardless of assigned clinician"),
            );
        }

        insert(
            "manage_roles".to_string(),
            "administration",
            "manage",
            "Create custom roles and change role/override assignments".to_string(),
        );
        insert(
            "manage_clinic".to_string(),
            "administration",
            "manage",
            "Change clinic settings".to_string(),
        );

        Self { defs }
    }

    pub fn get(&self, name: &str) -> Option<&PermissionDef> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// All entries, ordered by name (stable output for the admin UI).
    pub fn all(&self) -> impl Iterator<Item = &PermissionDef> {
        self.defs.values()
    }

    /// All permission names as owned values (role seeding convenience).
    pub fn names(&self) -> Vec<Permission> {
        self.defs.values().map(|d| d.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_contains_module_pairs() {
        let catalog = PermissionCatalog::seeded();
        for module in MODULES {
            assert!(catalog.contains(&format!("read_{module}")), "read_{module}");
            assert!(catalog.contains(&format!("write_{module}")), "write_{module}");
        }
        assert!(catalog.contains("read_all_appointments"));
        assert!(catalog.contains("manage_roles"));
    }

    #[test]
    fn unknown_name_is_absent() {
        let catalog = PermissionCatalog::seeded();
        assert!(!catalog.contains("launch_rockets"));
    }

    #[test]
    fn entries_carry_display_metadata() {
        let catalog = PermissionCatalog::seeded();
        let def = catalog.get("write_patients").unwrap();
        assert_eq!(def.module, "patients");
        assert_eq!(def.action, "write");
        assert!(!def.description.is_empty());
    }
}
