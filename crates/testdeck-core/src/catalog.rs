//! Suite catalog.
//!
//! The set of runnable suites is static for the lifetime of a dashboard. A
//! builtin catalog ships with the crate; deployments can point the config at
//! their own YAML file instead.

use crate::error::CatalogError;
use crate::models::TestSuiteDescriptor;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const BUILTIN_SUITES: &str = include_str!("../data/suites.yml");

/// Ordered list of runnable suites, keyed by ID.
#[derive(Debug, Clone)]
pub struct SuiteCatalog {
    suites: Vec<TestSuiteDescriptor>,
}

impl SuiteCatalog {
    /// Creates a catalog from descriptors, rejecting duplicate IDs.
    pub fn new(suites: Vec<TestSuiteDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for suite in &suites {
            if !seen.insert(suite.id.as_str()) {
                return Err(CatalogError::DuplicateSuite(suite.id.clone()));
            }
        }
        Ok(Self { suites })
    }

    /// The six bundled suites, from regression to performance.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_SUITES)
    }

    /// Parses a catalog from a YAML list of suites.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let suites: Vec<TestSuiteDescriptor> = serde_yaml::from_str(yaml)?;
        Self::new(suites)
    }

    /// Loads a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_yaml(&content)?;
        tracing::info!("Loaded {} suites from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Gets a suite by ID.
    pub fn get(&self, id: &str) -> Option<&TestSuiteDescriptor> {
        self.suites.iter().find(|s| s.id == id)
    }

    /// True when a suite with this ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterates suites in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &TestSuiteDescriptor> {
        self.suites.iter()
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_catalog() {
        let catalog = SuiteCatalog::builtin().unwrap();
        let ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["regression", "smoke", "hotfix", "integration", "ui", "performance"]
        );

        let smoke = catalog.get("smoke").unwrap();
        assert_eq!(smoke.name, "Smoke Tests");
        assert_eq!(smoke.test_count, 32);
        assert_eq!(smoke.priority, Priority::High);
        assert_eq!(smoke.tags, vec!["smoke", "quick", "essential"]);
        assert_eq!(smoke.estimated_seconds(), 480.0);

        assert_eq!(catalog.get("performance").unwrap().priority, Priority::Low);
        assert!(!catalog.contains("nightly"));
    }

    #[test]
    fn test_duplicate_suite_rejected() {
        let yaml = r"
- id: smoke
  name: Smoke
  testCount: 1
  estimatedDuration: 1 min
  priority: low
- id: smoke
  name: Smoke again
  testCount: 2
  estimatedDuration: 2 min
  priority: high
";
        let err = SuiteCatalog::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSuite(id) if id == "smoke"));
    }

    #[test]
    fn test_load_custom_catalog() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("suites.yml");
        fs::write(
            &path,
            r"
- id: nightly
  name: Nightly
  testCount: 400
  estimatedDuration: 2h
  priority: medium
  tags: [nightly]
",
        )
        .unwrap();

        let catalog = SuiteCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        let nightly = catalog.get("nightly").unwrap();
        assert_eq!(nightly.description, "");
        assert_eq!(nightly.estimated_seconds(), 7200.0);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = SuiteCatalog::load(&temp.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
