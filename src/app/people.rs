//! People persistence with cascading saves.
//!
//! Save order for a person:
//! 1. home and business addresses without an identity are saved first,
//! 2. an unsaved spouse is saved next (recursively, with its own cascade),
//! 3. the person row is inserted, referencing the identities from 1 and 2,
//! 4. children are handled last: unsaved ones are saved carrying the new identity
//!    as `PARENT_ID`, already saved ones get their `PARENT_ID` rewritten to it.
//!
//! Addresses and a spouse that already have an identity are referenced as they are.
//! Nothing here opens a transaction: wrap the call in one for an atomic cascade.

use crate::app::addresses::AddressRepository;
use crate::app::crud::{CrudRepository, Repository};
use crate::domain::binding::BindingRegistry;
use crate::domain::error::{OrmError, Result};
use crate::domain::binding::CrudOperation;
use crate::domain::model::person::LINK_CHILD_SQL;
use crate::domain::model::{Address, Entity, Person};
use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::debug;

pub struct PeopleRepository {
    engine: CrudRepository<Person>,
    addresses: AddressRepository,
}

impl PeopleRepository {
    pub async fn prepare(conn: &mut SqliteConnection, registry: Arc<BindingRegistry>) -> Result<Self> {
        let engine = CrudRepository::prepare(conn, registry.clone()).await?;
        let addresses = AddressRepository::prepare(conn, registry).await?;
        Ok(Self { engine, addresses })
    }

    /// The repository used for owned addresses.
    pub fn addresses(&self) -> &AddressRepository {
        &self.addresses
    }

    async fn save_owned_address(&self, conn: &mut SqliteConnection, slot: &mut Option<Address>) -> Result<()> {
        if let Some(address) = slot.take() {
            let address = match address.identity() {
                Some(_) => address,
                None => self.addresses.save(conn, address).await?,
            };
            *slot = Some(address);
        }
        Ok(())
    }

    /// Points an already persisted child at `parent_id`.
    async fn link_child(&self, conn: &mut SqliteConnection, child: &mut Person, parent_id: i64) -> Result<()> {
        let Some(id) = child.identity() else {
            return Err(OrmError::configuration("only a saved child can be linked to a parent"));
        };
        let result = sqlx::query(LINK_CHILD_SQL)
            .bind(parent_id)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| OrmError::operation(CrudOperation::Update, e))?;
        if result.rows_affected() == 0 {
            return Err(OrmError::configuration(format!(
                "child {} of person {} does not exist",
                id, parent_id
            )));
        }
        child.set_parent_id(parent_id);
        debug!("linked person {} to parent {}", id, parent_id);
        Ok(())
    }
}

#[async_trait]
impl Repository<Person> for PeopleRepository {
    fn engine(&self) -> &CrudRepository<Person> {
        &self.engine
    }

    async fn before_insert(&self, conn: &mut SqliteConnection, person: &mut Person) -> Result<()> {
        self.save_owned_address(conn, &mut person.home_address).await?;
        self.save_owned_address(conn, &mut person.business_address).await?;

        // No cycle detection: a spouse graph is an owned tree, so recursion ends at its leaves.
        if let Some(spouse) = person.spouse.take() {
            let spouse = match spouse.identity() {
                Some(_) => spouse,
                None => Box::new(self.save(conn, *spouse).await?),
            };
            person.spouse = Some(spouse);
        }
        Ok(())
    }

    async fn after_insert(&self, conn: &mut SqliteConnection, person: &mut Person) -> Result<()> {
        let parent_id = person.identity().ok_or_else(|| {
            OrmError::configuration("children cannot be saved before their parent has an identity")
        })?;

        let children = std::mem::take(&mut person.children);
        let mut saved = Vec::with_capacity(children.len());
        for mut child in children {
            if child.identity().is_none() {
                child.set_parent_id(parent_id);
                child = self.save(conn, child).await?;
            } else {
                self.link_child(conn, &mut child, parent_id).await?;
            }
            saved.push(child);
        }
        if !saved.is_empty() {
            debug!("saved {} child(ren) of person {}", saved.len(), parent_id);
        }
        person.children = saved;
        Ok(())
    }
}
