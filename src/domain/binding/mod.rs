//! Declarative SQL bindings: which SQL text performs which logical operation.

use crate::domain::error::{OrmError, Result};
use std::fmt;

pub mod registry;

pub use registry::BindingRegistry;

/// Placeholder that `DeleteMany` SQL must contain; replaced by the id list.
pub const IDS_TOKEN: &str = ":ids";

/// Maximum number of root rows returned by the generic find-all.
pub const FIND_ALL_PAGE_SIZE: usize = 100;

/// The logical operations an entity type can bind SQL to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudOperation {
    Save,
    Update,
    Count,
    DeleteOne,
    DeleteMany,
    FindById,
    FindAll,
}

impl CrudOperation {
    pub const ALL: [CrudOperation; 7] = [
        CrudOperation::Save,
        CrudOperation::Update,
        CrudOperation::Count,
        CrudOperation::DeleteOne,
        CrudOperation::DeleteMany,
        CrudOperation::FindById,
        CrudOperation::FindAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrudOperation::Save => "save",
            CrudOperation::Update => "update",
            CrudOperation::Count => "count",
            CrudOperation::DeleteOne => "delete_one",
            CrudOperation::DeleteMany => "delete_many",
            CrudOperation::FindById => "find_by_id",
            CrudOperation::FindAll => "find_all",
        }
    }
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared (operation, SQL) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlBinding {
    pub operation: CrudOperation,
    pub sql: &'static str,
}

impl SqlBinding {
    pub const fn new(operation: CrudOperation, sql: &'static str) -> Self {
        Self { operation, sql }
    }
}

/// The declarations attached to one entity type.
///
/// Groups are multi-declarations that belong together (e.g. every query that
/// shares one decoder); singles are standalone declarations. Lookup scans the
/// groups first, then the singles, and takes the first match.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    groups: Vec<Vec<SqlBinding>>,
    singles: Vec<SqlBinding>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a multi-declaration group.
    pub fn group(mut self, bindings: impl IntoIterator<Item = SqlBinding>) -> Self {
        self.groups.push(bindings.into_iter().collect());
        self
    }

    /// Adds a single declaration.
    pub fn single(mut self, operation: CrudOperation, sql: &'static str) -> Self {
        self.singles.push(SqlBinding::new(operation, sql));
        self
    }

    /// First declared SQL for `operation`, if any.
    pub fn lookup(&self, operation: CrudOperation) -> Option<&'static str> {
        self.groups
            .iter()
            .flatten()
            .find(|b| b.operation == operation)
            .or_else(|| self.singles.iter().find(|b| b.operation == operation))
            .map(|b| b.sql)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.is_empty()) && self.singles.is_empty()
    }
}

/// Generic fallback SQL derived from a table name.
///
/// Placeholder contracts:
/// - `FindById`: `SELECT * FROM t WHERE ID = ?`, one parameter (identity).
/// - `FindAll`: first `FIND_ALL_PAGE_SIZE` rows ordered by `ID`, no parameters.
/// - `Count`: `SELECT COUNT(*) FROM t`, no parameters.
/// - `DeleteOne`: `DELETE FROM t WHERE ID = ?`, one parameter (identity).
/// - `DeleteMany`: `DELETE FROM t WHERE ID IN (:ids)`, the `:ids` token.
/// - `Save` and `Update` have no generic form: their parameter lists are
///   `encode_for_insert` and `encode_for_update` (plus identity last), which
///   only the entity type knows how to name.
pub fn generic_sql(entity: &str, table: Option<&str>, operation: CrudOperation) -> Result<String> {
    let table = table.ok_or_else(|| {
        OrmError::configuration(format!(
            "no SQL declared for {} on {} and no table to derive it from",
            operation, entity
        ))
    })?;

    match operation {
        CrudOperation::FindById => Ok(format!("SELECT * FROM {} WHERE ID = ?", table)),
        CrudOperation::FindAll => Ok(format!(
            "SELECT * FROM {} ORDER BY ID LIMIT {}",
            table, FIND_ALL_PAGE_SIZE
        )),
        CrudOperation::Count => Ok(format!("SELECT COUNT(*) FROM {}", table)),
        CrudOperation::DeleteOne => Ok(format!("DELETE FROM {} WHERE ID = ?", table)),
        CrudOperation::DeleteMany => Ok(format!("DELETE FROM {} WHERE ID IN ({})", table, IDS_TOKEN)),
        CrudOperation::Save | CrudOperation::Update => Err(OrmError::configuration(format!(
            "{} on {} requires declared SQL",
            operation, entity
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_take_precedence_over_singles() {
        let set = BindingSet::new()
            .single(CrudOperation::Count, "SELECT 1")
            .group([
                SqlBinding::new(CrudOperation::FindAll, "SELECT * FROM A"),
                SqlBinding::new(CrudOperation::Count, "SELECT 2"),
            ])
            .group([SqlBinding::new(CrudOperation::Count, "SELECT 3")]);

        assert_eq!(set.lookup(CrudOperation::Count), Some("SELECT 2"));
        assert_eq!(set.lookup(CrudOperation::FindAll), Some("SELECT * FROM A"));
        assert_eq!(set.lookup(CrudOperation::Save), None);
    }

    #[test]
    fn singles_resolve_in_declaration_order() {
        let set = BindingSet::new()
            .single(CrudOperation::Save, "INSERT 1")
            .single(CrudOperation::Save, "INSERT 2");
        assert_eq!(set.lookup(CrudOperation::Save), Some("INSERT 1"));
    }

    #[test]
    fn generic_sql_needs_a_table() {
        let err = generic_sql("Thing", None, CrudOperation::Count).unwrap_err();
        assert!(err.is_configuration());

        let sql = generic_sql("Thing", Some("THINGS"), CrudOperation::DeleteMany).unwrap();
        assert!(sql.contains(IDS_TOKEN));

        let err = generic_sql("Thing", Some("THINGS"), CrudOperation::Save).unwrap_err();
        assert!(err.is_configuration());
    }
}
