//! Generic CRUD engine.
//!
//! `CrudRepository<E>` holds the resolved bindings and the statements that
//! are prepared once per repository (save, find-by-id). `Repository<E>`
//! implements every operation on top of it; composite repositories override
//! the save hooks to cascade into their associations.
//!
//! Every operation borrows the caller's connection for its whole duration.
//! Pass `&mut *tx` to run inside a caller-owned transaction.

use crate::domain::binding::{BindingRegistry, CrudOperation, IDS_TOKEN};
use crate::domain::error::{OrmError, Result};
use crate::domain::model::Entity;
use crate::storage::{bind_params, GroupedRows};
use async_trait::async_trait;
use sqlx::sqlite::SqliteStatement;
use sqlx::{Executor, SqliteConnection, Statement};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-entity engine state: the binding registry and the cached statements.
pub struct CrudRepository<E: Entity> {
    registry: Arc<BindingRegistry>,
    save_stmt: SqliteStatement<'static>,
    find_by_id_stmt: SqliteStatement<'static>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> CrudRepository<E> {
    /// Resolves and prepares the save and find-by-id statements.
    ///
    /// Fails with `Configuration` if `E` is not registered or either operation has no SQL for it.
    pub async fn prepare(conn: &mut SqliteConnection, registry: Arc<BindingRegistry>) -> Result<Self> {
        if !registry.is_registered::<E>() {
            return Err(OrmError::configuration(format!(
                "{} must be registered before a repository is prepared for it",
                E::NAME
            )));
        }
        let save_stmt = prepare_statement::<E>(conn, &registry, CrudOperation::Save).await?;
        let find_by_id_stmt = prepare_statement::<E>(conn, &registry, CrudOperation::FindById).await?;
        Ok(Self {
            registry,
            save_stmt,
            find_by_id_stmt,
            _entity: PhantomData,
        })
    }

    fn resolve(&self, operation: CrudOperation) -> Result<String> {
        let sql = self.registry.resolve::<E>(operation)?;
        debug!("{} {}: {}", E::NAME, operation, sql);
        Ok(sql)
    }

    /// Inserts `entity` with the cached save statement and injects the generated identity.
    async fn insert(&self, conn: &mut SqliteConnection, entity: &mut E) -> Result<i64> {
        let params = entity.encode_for_insert()?;
        let result = bind_params(self.save_stmt.query(), params)
            .execute(&mut *conn)
            .await
            .map_err(|source| OrmError::Persistence {
                entity: format!("{:?}", entity),
                source,
            })?;

        let id = result.last_insert_rowid();
        entity.set_assigned_identity(id);
        debug!("{} saved with id {} ({} row(s) affected)", E::NAME, id, result.rows_affected());
        Ok(id)
    }
}

async fn prepare_statement<E: Entity>(
    conn: &mut SqliteConnection,
    registry: &BindingRegistry,
    operation: CrudOperation,
) -> Result<SqliteStatement<'static>> {
    let sql = registry.resolve::<E>(operation)?;
    let stmt = (&mut *conn)
        .prepare(sql.as_str())
        .await
        .map_err(|e| OrmError::operation(operation, e))?;
    Ok(Statement::to_owned(&stmt))
}

fn unsaved<E: Entity>(operation: CrudOperation, entity: &E) -> OrmError {
    OrmError::configuration(format!(
        "cannot {} an unsaved {}: {:?}",
        operation,
        E::NAME,
        entity
    ))
}

/// Renders identities as a comma-separated list of decimal integers.
///
/// Only assigned, non-negative identities are accepted; the output goes
/// into SQL text, not into a bound parameter.
pub fn render_ids<E: Entity>(entities: &[E]) -> Result<String> {
    let mut ids = Vec::with_capacity(entities.len());
    for entity in entities {
        let id = entity
            .identity()
            .ok_or_else(|| unsaved(CrudOperation::DeleteMany, entity))?;
        if id < 0 {
            return Err(OrmError::configuration(format!(
                "identity {} of {} is not a non-negative integer",
                id,
                E::NAME
            )));
        }
        ids.push(id.to_string());
    }
    Ok(ids.join(","))
}

/// The CRUD operations, generic over the entity type.
///
/// Implementors only supply `engine`; `before_insert` and `after_insert` are
/// the save hooks (no-ops by default).
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    fn engine(&self) -> &CrudRepository<E>;

    /// Runs before the row insert; the place to save what the row references.
    async fn before_insert(&self, _conn: &mut SqliteConnection, _entity: &mut E) -> Result<()> {
        Ok(())
    }

    /// Runs once the entity has its identity; the place to save what references it.
    async fn after_insert(&self, _conn: &mut SqliteConnection, _entity: &mut E) -> Result<()> {
        Ok(())
    }

    /// Persists a new entity and returns it with its identity assigned.
    async fn save(&self, conn: &mut SqliteConnection, mut entity: E) -> Result<E> {
        if let Some(id) = entity.identity() {
            return Err(OrmError::configuration(format!(
                "{} already persisted with id {}; identities are assigned once",
                E::NAME,
                id
            )));
        }
        self.before_insert(conn, &mut entity).await?;
        self.engine().insert(conn, &mut entity).await?;
        self.after_insert(conn, &mut entity).await?;
        Ok(entity)
    }

    /// Writes the entity's update parameters, identity bound last.
    async fn update(&self, conn: &mut SqliteConnection, entity: &E) -> Result<u64> {
        let id = entity
            .identity()
            .ok_or_else(|| unsaved(CrudOperation::Update, entity))?;
        let sql = self.engine().resolve(CrudOperation::Update)?;
        let params = entity.encode_for_update()?;

        let result = bind_params(sqlx::query(&sql), params)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| OrmError::operation(CrudOperation::Update, e))?;
        debug!("{} {} updated ({} row(s) affected)", E::NAME, id, result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Loads the entity with identity `id`, if any.
    async fn find_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<E>> {
        let rows = self
            .engine()
            .find_by_id_stmt
            .query()
            .bind(id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| OrmError::operation(CrudOperation::FindById, e))?;

        let mut groups = GroupedRows::<E>::new(&rows, CrudOperation::FindById);
        let found = groups.next().transpose()?;
        if groups.remaining_rows() > 0 {
            warn!(
                "{} find_by_id({}) matched more than one entity; {} row(s) ignored",
                E::NAME,
                id,
                groups.remaining_rows()
            );
        }
        Ok(found)
    }

    /// Loads one page of entities, in result order.
    async fn find_all(&self, conn: &mut SqliteConnection) -> Result<Vec<E>> {
        let sql = self.engine().resolve(CrudOperation::FindAll)?;
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| OrmError::operation(CrudOperation::FindAll, e))?;

        GroupedRows::<E>::new(&rows, CrudOperation::FindAll).collect()
    }

    /// Number of stored entities; zero when the count query returns no row.
    async fn count(&self, conn: &mut SqliteConnection) -> Result<i64> {
        let sql = self.engine().resolve(CrudOperation::Count)?;
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| OrmError::operation(CrudOperation::Count, e))?;
        Ok(count.unwrap_or(0))
    }

    async fn delete(&self, conn: &mut SqliteConnection, entity: &E) -> Result<u64> {
        let id = entity
            .identity()
            .ok_or_else(|| unsaved(CrudOperation::DeleteOne, entity))?;
        let sql = self.engine().resolve(CrudOperation::DeleteOne)?;

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| OrmError::operation(CrudOperation::DeleteOne, e))?;
        debug!("{} {} deleted ({} row(s) affected)", E::NAME, id, result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Deletes all `entities` with one statement. An empty slice is a no-op.
    async fn delete_many(&self, conn: &mut SqliteConnection, entities: &[E]) -> Result<u64> {
        if entities.is_empty() {
            return Ok(0);
        }
        let sql = self.engine().resolve(CrudOperation::DeleteMany)?;
        if !sql.contains(IDS_TOKEN) {
            return Err(OrmError::configuration(format!(
                "{} SQL for {} must contain the {} token",
                CrudOperation::DeleteMany,
                E::NAME,
                IDS_TOKEN
            )));
        }
        let sql = sql.replace(IDS_TOKEN, &render_ids(entities)?);

        let result = sqlx::query(&sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| OrmError::operation(CrudOperation::DeleteMany, e))?;
        debug!("{} delete_many ({} row(s) affected)", E::NAME, result.rows_affected());
        Ok(result.rows_affected())
    }
}

impl<E: Entity> Repository<E> for CrudRepository<E> {
    fn engine(&self) -> &CrudRepository<E> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Person;
    use chrono::{TimeZone, Utc};

    fn person_with_id(id: Option<i64>) -> Person {
        let mut person = Person::new("Ada", "Lovelace", Utc.with_ymd_and_hms(1815, 12, 10, 0, 0, 0).unwrap());
        if let Some(id) = id {
            person.set_assigned_identity(id);
        }
        person
    }

    #[test]
    fn render_ids_joins_identities() {
        let people = [person_with_id(Some(3)), person_with_id(Some(14)), person_with_id(Some(159))];
        assert_eq!(render_ids(&people).unwrap(), "3,14,159");
    }

    #[test]
    fn render_ids_rejects_unsaved_and_negative_identities() {
        let err = render_ids(&[person_with_id(Some(1)), person_with_id(None)]).unwrap_err();
        assert!(err.is_configuration());

        let err = render_ids(&[person_with_id(Some(-5))]).unwrap_err();
        assert!(err.is_configuration());
    }
}
