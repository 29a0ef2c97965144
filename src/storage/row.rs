//! Alias-qualified column access over fetched rows.
//!
//! Composite queries join the same table several times, so columns are
//! addressed by alias (`HOME_POSTCODE`, `SPOUSE_ID`, ...) instead of by
//! table column name. Alias positions are resolved against the row's column
//! metadata once per result set and memoized.

use crate::domain::binding::CrudOperation;
use crate::domain::error::{OrmError, Result};
use sqlx::error::UnexpectedNullError;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Sqlite, Type};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::str::FromStr;

/// Memo of alias -> column position for one result set.
///
/// Every row of a result set shares the same columns, so a position found
/// on one row is valid for the others. Misses are memoized too.
#[derive(Debug, Default)]
pub struct AliasIndex {
    positions: HashMap<String, Option<usize>>,
    scans: usize,
}

impl AliasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column position of `alias` in `row`, scanning the metadata on first use.
    pub fn position(&mut self, row: &SqliteRow, alias: &str) -> Option<usize> {
        if let Some(found) = self.positions.get(alias) {
            return *found;
        }
        self.scans += 1;
        let found = row
            .columns()
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(alias));
        self.positions.insert(alias.to_string(), found);
        found
    }

    /// Number of metadata scans performed so far.
    pub fn scans(&self) -> usize {
        self.scans
    }
}

/// A fetched row viewed through an alias index.
pub struct AliasedRow<'r> {
    row: &'r SqliteRow,
    index: &'r mut AliasIndex,
    operation: CrudOperation,
}

impl<'r> AliasedRow<'r> {
    pub fn new(row: &'r SqliteRow, index: &'r mut AliasIndex, operation: CrudOperation) -> Self {
        Self {
            row,
            index,
            operation,
        }
    }

    /// Value of `alias`, or `None` when the alias is absent or the value is NULL.
    pub fn get<T>(&mut self, alias: &str) -> Result<Option<T>>
    where
        T: for<'a> Decode<'a, Sqlite> + Type<Sqlite>,
    {
        let Some(idx) = self.index.position(self.row, alias) else {
            return Ok(None);
        };
        self.row
            .try_get::<Option<T>, _>(idx)
            .map_err(|e| OrmError::operation(self.operation, e))
    }

    /// Like `get`, but absence is a decode error.
    pub fn require<T>(&mut self, alias: &str) -> Result<T>
    where
        T: for<'a> Decode<'a, Sqlite> + Type<Sqlite>,
    {
        match self.get(alias)? {
            Some(v) => Ok(v),
            None => Err(self.decode_error(alias, UnexpectedNullError)),
        }
    }

    /// Reads a text column and parses it with `FromStr`.
    pub fn parse<T>(&mut self, alias: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: StdError + Send + Sync + 'static,
    {
        match self.get::<String>(alias)? {
            Some(text) => text
                .parse::<T>()
                .map(Some)
                .map_err(|e| self.decode_error(alias, e)),
            None => Ok(None),
        }
    }

    /// Like `parse`, but absence is a decode error.
    pub fn require_parsed<T>(&mut self, alias: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: StdError + Send + Sync + 'static,
    {
        match self.parse(alias)? {
            Some(v) => Ok(v),
            None => Err(self.decode_error(alias, UnexpectedNullError)),
        }
    }

    fn decode_error<E>(&self, alias: &str, source: E) -> OrmError
    where
        E: StdError + Send + Sync + 'static,
    {
        OrmError::operation(
            self.operation,
            sqlx::Error::ColumnDecode {
                index: alias.to_string(),
                source: Box::new(source),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Connection, SqliteConnection};

    #[tokio::test]
    async fn lookups_are_memoized_per_index() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await?;
        let rows = sqlx::query("SELECT 7 AS HOME_ID, 'Main St' AS HOME_STREET_ADDRESS, NULL AS SPOUSE_ID")
            .fetch_all(&mut conn)
            .await?;

        let mut index = AliasIndex::new();
        let mut row = AliasedRow::new(&rows[0], &mut index, CrudOperation::FindById);

        assert_eq!(row.get::<i64>("HOME_ID")?, Some(7));
        assert_eq!(row.get::<i64>("HOME_ID")?, Some(7));
        assert_eq!(row.get::<String>("HOME_STREET_ADDRESS")?.as_deref(), Some("Main St"));
        assert_eq!(row.get::<i64>("SPOUSE_ID")?, None);
        assert_eq!(row.get::<i64>("BIZ_ID")?, None);
        assert_eq!(row.get::<i64>("BIZ_ID")?, None);
        assert_eq!(index.scans(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn require_and_parse_report_decode_failures() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await?;
        let rows = sqlx::query("SELECT NULL AS PARENT_ID, 'abc' AS PARENT_SALARY")
            .fetch_all(&mut conn)
            .await?;

        let mut index = AliasIndex::new();
        let mut row = AliasedRow::new(&rows[0], &mut index, CrudOperation::FindAll);

        let err = row.require::<i64>("PARENT_ID").unwrap_err();
        assert!(matches!(err, OrmError::Operation { operation: CrudOperation::FindAll, .. }));

        let err = row.parse::<i64>("PARENT_SALARY").unwrap_err();
        assert!(matches!(
            err,
            OrmError::Operation { source: sqlx::Error::ColumnDecode { .. }, .. }
        ));
        Ok(())
    }
}
