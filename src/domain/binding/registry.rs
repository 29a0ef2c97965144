//! BindingRegistry for mapping entity types to their SQL bindings.

use crate::domain::binding::{BindingSet, CrudOperation};
use crate::domain::error::{OrmError, Result};
use crate::domain::model::Entity;
use std::any::TypeId;
use std::collections::HashMap;

struct Registration {
    name: &'static str,
    bindings: BindingSet,
    defaults: fn(CrudOperation) -> Result<String>,
}

impl Registration {
    fn resolve(&self, operation: CrudOperation) -> Result<String> {
        match self.bindings.lookup(operation) {
            Some(sql) => Ok(sql.to_string()),
            None => (self.defaults)(operation),
        }
    }
}

/// A registry that maps entity types to their declared bindings and fallback provider.
///
/// Built once at startup; repositories resolve SQL through it.
pub struct BindingRegistry {
    entries: HashMap<TypeId, Registration>,
}

impl BindingRegistry {
    /// Creates a new empty BindingRegistry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry with every entity type this crate ships.
    pub fn with_builtin_entities() -> Self {
        let mut reg = Self::new();
        reg.register::<crate::domain::model::Address>();
        reg.register::<crate::domain::model::Person>();
        reg
    }

    /// Registers an entity type. Re-registering replaces the previous entry.
    pub fn register<E: Entity>(&mut self) {
        self.entries.insert(
            TypeId::of::<E>(),
            Registration {
                name: E::NAME,
                bindings: E::bindings(),
                defaults: E::default_sql,
            },
        );
    }

    /// True once `register::<E>()` has run.
    pub fn is_registered<E: Entity>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<E>())
    }

    /// Resolves the SQL text for `operation` on `E`.
    ///
    /// Order: declared groups, then declared singles, then `E::default_sql`.
    pub fn resolve<E: Entity>(&self, operation: CrudOperation) -> Result<String> {
        let registration = self.entries.get(&TypeId::of::<E>()).ok_or_else(|| {
            OrmError::configuration(format!("entity type {} is not registered", E::NAME))
        })?;
        registration.resolve(operation)
    }

    /// Returns all registered entity names.
    pub fn list_entities(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.values().map(|r| r.name).collect();
        names.sort_unstable();
        names
    }

    /// For each registered entity, the operations that resolve to no SQL.
    pub fn audit(&self) -> Vec<(&'static str, Vec<CrudOperation>)> {
        let mut report: Vec<(&'static str, Vec<CrudOperation>)> = self
            .entries
            .values()
            .map(|r| {
                let missing = CrudOperation::ALL
                    .into_iter()
                    .filter(|op| r.resolve(*op).is_err())
                    .collect();
                (r.name, missing)
            })
            .collect();
        report.sort_by_key(|(name, _)| *name);
        report
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Address, Person};

    #[test]
    fn unregistered_type_is_a_configuration_error() {
        let reg = BindingRegistry::new();
        let err = reg.resolve::<Address>(CrudOperation::Save).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn registration_is_tracked_per_type() {
        let mut reg = BindingRegistry::new();
        reg.register::<Address>();
        assert!(reg.is_registered::<Address>());
        assert!(!reg.is_registered::<Person>());
    }

    #[test]
    fn declared_sql_wins_over_defaults() {
        let reg = BindingRegistry::with_builtin_entities();
        let sql = reg.resolve::<Person>(CrudOperation::FindById).unwrap();
        assert!(sql.contains("PARENT_ID"));
        assert!(sql.contains("LEFT OUTER JOIN"));
    }

    #[test]
    fn undeclared_operations_fall_back_to_table_defaults() {
        let reg = BindingRegistry::with_builtin_entities();
        let sql = reg.resolve::<Address>(CrudOperation::Count).unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM ADDRESSES");
    }

    #[test]
    fn audit_reports_nothing_missing_for_builtin_entities() {
        let reg = BindingRegistry::with_builtin_entities();
        let report = reg.audit();
        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|(_, missing)| missing.is_empty()));
        assert_eq!(reg.list_entities(), vec!["Address", "Person"]);
    }
}
