//! Entity-mapping contract and the concrete entity types.

use crate::domain::binding::{self, BindingSet, CrudOperation};
use crate::domain::error::Result;
use crate::storage::row::AliasedRow;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

pub mod address;
pub mod person;

pub use address::{Address, Region};
pub use person::{Person, PersonBuilder};

/// A positional SQL parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Trait that defines the contract for any persisted entity type.
///
/// The generic repository works with any type implementing it: the type
/// decodes itself from alias-qualified rows, encodes its positional
/// parameters, and exposes its identity slot. Equality must cover every
/// field including identity; the row decoder relies on it to find group
/// boundaries.
pub trait Entity: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Name used in diagnostics and registry reports.
    const NAME: &'static str;

    /// Backing table, used to derive generic default SQL.
    const TABLE: Option<&'static str> = None;

    /// Storage-assigned identity, `None` until the first successful save.
    fn identity(&self) -> Option<i64>;

    /// Injects the identity generated by the insert.
    fn set_assigned_identity(&mut self, id: i64);

    /// Decodes the root entity (the group key) from one row.
    fn decode(row: &mut AliasedRow<'_>) -> Result<Self>;

    /// Folds one row of the entity's group into it.
    ///
    /// Called for every row of the group, the first one included. Composite
    /// types attach associations and collect children here.
    fn absorb(&mut self, _row: &mut AliasedRow<'_>) -> Result<()> {
        Ok(())
    }

    /// Parameters for the save SQL, in placeholder order.
    fn encode_for_insert(&self) -> Result<Vec<SqlValue>>;

    /// Parameters for the update SQL, in placeholder order, identity excluded.
    fn encode_for_update(&self) -> Result<Vec<SqlValue>>;

    /// Declared bindings for this type.
    fn bindings() -> BindingSet {
        BindingSet::new()
    }

    /// Fallback SQL used when no declaration matches `operation`.
    fn default_sql(operation: CrudOperation) -> Result<String> {
        binding::generic_sql(Self::NAME, Self::TABLE, operation)
    }
}
