//! Reassembles composite entities from flat, denormalized result sets.
//!
//! A query that joins a root table to its associations and children yields
//! one physical row per child, each repeating the root columns. A *group* is
//! the contiguous run of rows whose decoded root (the group key) is equal.
//! Rows must arrive with every group contiguous.

use crate::domain::binding::CrudOperation;
use crate::domain::error::Result;
use crate::domain::model::Entity;
use crate::storage::row::{AliasIndex, AliasedRow};
use sqlx::sqlite::SqliteRow;
use std::marker::PhantomData;

/// Iterator over the groups of a fetched result set, one entity per group.
///
/// The alias index lives as long as the iterator, so alias positions are
/// resolved once for the whole result set. After an error the iterator is
/// exhausted.
pub struct GroupedRows<'r, E> {
    rows: &'r [SqliteRow],
    next: usize,
    index: AliasIndex,
    operation: CrudOperation,
    _entity: PhantomData<fn() -> E>,
}

impl<'r, E: Entity> GroupedRows<'r, E> {
    pub fn new(rows: &'r [SqliteRow], operation: CrudOperation) -> Self {
        Self {
            rows,
            next: 0,
            index: AliasIndex::new(),
            operation,
            _entity: PhantomData,
        }
    }

    /// Decodes the key of the next group without consuming any row.
    pub fn peek_key(&mut self) -> Option<Result<E>> {
        if self.next >= self.rows.len() {
            return None;
        }
        Some(self.key_at(self.next))
    }

    /// Rows not yet consumed.
    pub fn remaining_rows(&self) -> usize {
        self.rows.len() - self.next
    }

    fn key_at(&mut self, pos: usize) -> Result<E> {
        let rows = self.rows;
        let mut row = AliasedRow::new(&rows[pos], &mut self.index, self.operation);
        E::decode(&mut row)
    }

    fn absorb_at(&mut self, pos: usize, entity: &mut E) -> Result<()> {
        let rows = self.rows;
        let mut row = AliasedRow::new(&rows[pos], &mut self.index, self.operation);
        entity.absorb(&mut row)
    }

    fn next_group(&mut self) -> Result<E> {
        let start = self.next;
        let key = self.key_at(start)?;
        let mut entity = key.clone();

        let mut pos = start;
        while pos < self.rows.len() {
            // The key stays pristine; `entity` accumulates associations.
            if pos != start && self.key_at(pos)? != key {
                break;
            }
            self.absorb_at(pos, &mut entity)?;
            pos += 1;
        }

        self.next = pos;
        Ok(entity)
    }
}

impl<E: Entity> Iterator for GroupedRows<'_, E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.rows.len() {
            return None;
        }
        match self.next_group() {
            Ok(entity) => Some(Ok(entity)),
            Err(e) => {
                self.next = self.rows.len();
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SqlValue;
    use sqlx::{Connection, SqliteConnection};

    #[derive(Debug, Clone, PartialEq)]
    struct Tally {
        id: Option<i64>,
        label: String,
        items: Vec<String>,
    }

    impl Entity for Tally {
        const NAME: &'static str = "Tally";

        fn identity(&self) -> Option<i64> {
            self.id
        }

        fn set_assigned_identity(&mut self, id: i64) {
            self.id = Some(id);
        }

        fn decode(row: &mut AliasedRow<'_>) -> Result<Self> {
            Ok(Tally {
                id: Some(row.require("T_ID")?),
                label: row.require("T_LABEL")?,
                items: Vec::new(),
            })
        }

        fn absorb(&mut self, row: &mut AliasedRow<'_>) -> Result<()> {
            if let Some(item) = row.get::<String>("ITEM")? {
                self.items.push(item);
            }
            Ok(())
        }

        fn encode_for_insert(&self) -> Result<Vec<SqlValue>> {
            Ok(vec![self.label.clone().into()])
        }

        fn encode_for_update(&self) -> Result<Vec<SqlValue>> {
            Ok(vec![self.label.clone().into()])
        }
    }

    async fn fetch(sql: &str) -> std::result::Result<Vec<SqliteRow>, sqlx::Error> {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await?;
        sqlx::query(sql).fetch_all(&mut conn).await
    }

    #[tokio::test]
    async fn contiguous_rows_collapse_into_groups() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let rows = fetch(
            "SELECT 1 AS T_ID, 'one' AS T_LABEL, 'a' AS ITEM \
             UNION ALL SELECT 1, 'one', 'b' \
             UNION ALL SELECT 1, 'one', 'c' \
             UNION ALL SELECT 2, 'two', NULL",
        )
        .await?;

        let groups: Vec<Tally> = GroupedRows::new(&rows, CrudOperation::FindAll).collect::<Result<_>>()?;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].items, vec!["a", "b", "c"]);
        assert_eq!(groups[1].label, "two");
        assert!(groups[1].items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn peek_does_not_consume() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let rows = fetch("SELECT 1 AS T_ID, 'x' AS T_LABEL, 'a' AS ITEM UNION ALL SELECT 2, 'y', 'b'").await?;

        let mut groups = GroupedRows::<Tally>::new(&rows, CrudOperation::FindAll);
        let first_key = groups.peek_key().transpose()?;
        assert_eq!(first_key.map(|t| t.id), Some(Some(1)));
        assert_eq!(groups.remaining_rows(), 2);

        let first = groups.next().transpose()?;
        assert_eq!(first.map(|t| t.items), Some(vec!["a".to_string()]));
        assert_eq!(groups.remaining_rows(), 1);

        let second_key = groups.peek_key().transpose()?;
        assert_eq!(second_key.map(|t| t.label), Some("y".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn decoding_a_row_twice_is_stable() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let rows = fetch("SELECT 9 AS T_ID, 'same' AS T_LABEL, 'i' AS ITEM").await?;

        let mut groups = GroupedRows::<Tally>::new(&rows, CrudOperation::FindById);
        let a = groups.peek_key().transpose()?;
        let b = groups.peek_key().transpose()?;
        assert_eq!(a, b);
        assert_eq!(groups.index.scans(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn decode_error_ends_iteration() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let rows = fetch("SELECT NULL AS T_ID, 'bad' AS T_LABEL, NULL AS ITEM UNION ALL SELECT 1, 'ok', NULL").await?;

        let mut groups = GroupedRows::<Tally>::new(&rows, CrudOperation::FindAll);
        assert!(matches!(groups.next(), Some(Err(_))));
        assert!(groups.next().is_none());
        Ok(())
    }
}
