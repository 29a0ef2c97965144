//! Address repository: declared save/update/find-by-id plus the table-derived
//! defaults for every other operation.

mod common;

use common::{address, connect, registry, TestResult};
use peopledb::{
    AddressRepository, BindingRegistry, CrudOperation, CrudRepository, Entity, OrmError, Region,
    Repository, SqlValue,
};
use std::sync::Arc;

#[tokio::test]
async fn save_and_find_by_id() -> TestResult {
    let mut conn = connect().await?;
    let repo = AddressRepository::prepare(&mut conn, registry()).await?;

    let saved = repo.save(&mut conn, address("Horacio Quiroga, 4864")).await?;
    let found = repo.find_by_id(&mut conn, saved.id().unwrap()).await?;

    assert_eq!(found, Some(saved));
    Ok(())
}

#[tokio::test]
async fn update_rewrites_every_column() -> TestResult {
    let mut conn = connect().await?;
    let repo = AddressRepository::prepare(&mut conn, registry()).await?;

    let saved = repo.save(&mut conn, address("Calle 3")).await?;
    let moved = saved.with_city("Moron");
    assert_eq!(repo.update(&mut conn, &moved).await?, 1);

    let found = repo.find_by_id(&mut conn, moved.id().unwrap()).await?.unwrap();
    assert_eq!(found.city(), Some("Moron"));
    assert_eq!(found, moved);
    Ok(())
}

#[tokio::test]
async fn default_bindings_cover_the_remaining_operations() -> TestResult {
    let mut conn = connect().await?;
    let repo = AddressRepository::prepare(&mut conn, registry()).await?;

    let a = repo.save(&mut conn, address("A")).await?;
    let b = repo.save(&mut conn, address("B")).await?;
    let c = repo.save(&mut conn, address("C")).await?;

    assert_eq!(repo.count(&mut conn).await?, 3);
    assert_eq!(repo.find_all(&mut conn).await?, vec![a.clone(), b.clone(), c.clone()]);

    assert_eq!(repo.delete(&mut conn, &a).await?, 1);
    assert_eq!(repo.delete_many(&mut conn, &[b, c]).await?, 2);
    assert_eq!(repo.count(&mut conn).await?, 0);
    Ok(())
}

#[tokio::test]
async fn unknown_region_is_a_decode_error() -> TestResult {
    let mut conn = connect().await?;
    let repo = AddressRepository::prepare(&mut conn, registry()).await?;

    let id = sqlx::query("INSERT INTO ADDRESSES (STREET_ADDRESS, REGION) VALUES ('Nowhere 1', 'ATLANTIS')")
        .execute(&mut conn)
        .await?
        .last_insert_rowid();

    let err = repo.find_by_id(&mut conn, id).await.unwrap_err();
    assert!(matches!(
        err,
        OrmError::Operation {
            operation: CrudOperation::FindById,
            source: sqlx::Error::ColumnDecode { .. },
        }
    ));
    Ok(())
}

#[tokio::test]
async fn lowercase_region_text_still_decodes() -> TestResult {
    let mut conn = connect().await?;
    let repo = AddressRepository::prepare(&mut conn, registry()).await?;

    let id = sqlx::query("INSERT INTO ADDRESSES (STREET_ADDRESS, REGION) VALUES ('Somewhere 2', 'east')")
        .execute(&mut conn)
        .await?
        .last_insert_rowid();

    let found = repo.find_by_id(&mut conn, id).await?.unwrap();
    assert_eq!(found.region(), Region::East);
    assert_eq!(found.city(), None);
    Ok(())
}

/// An entity that declares nothing and names no table.
#[derive(Debug, Clone, PartialEq)]
struct Unbound {
    id: Option<i64>,
}

impl Entity for Unbound {
    const NAME: &'static str = "Unbound";

    fn identity(&self) -> Option<i64> {
        self.id
    }

    fn set_assigned_identity(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn decode(row: &mut peopledb::storage::AliasedRow<'_>) -> peopledb::Result<Self> {
        Ok(Unbound { id: row.get("ID")? })
    }

    fn encode_for_insert(&self) -> peopledb::Result<Vec<SqlValue>> {
        Ok(Vec::new())
    }

    fn encode_for_update(&self) -> peopledb::Result<Vec<SqlValue>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn entity_without_bindings_cannot_be_prepared() -> TestResult {
    let mut conn = connect().await?;

    let mut reg = BindingRegistry::new();
    reg.register::<Unbound>();
    let audit = reg.audit();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].1.len(), CrudOperation::ALL.len());

    let result = CrudRepository::<Unbound>::prepare(&mut conn, Arc::new(reg)).await;
    assert!(matches!(result, Err(OrmError::Configuration(_))));
    Ok(())
}

#[tokio::test]
async fn unregistered_entity_cannot_be_prepared() -> TestResult {
    let mut conn = connect().await?;

    let result = CrudRepository::<Unbound>::prepare(&mut conn, registry()).await;
    let err = result.err().expect("prepare should fail");
    assert!(err.is_configuration());
    assert!(err.to_string().contains("Unbound"));
    Ok(())
}
