pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;

// Convenience re-exports (keeps call-sites clean)
pub use app::{AddressRepository, CrudRepository, PeopleRepository, Repository};
pub use domain::binding::{BindingRegistry, BindingSet, CrudOperation, SqlBinding};
pub use domain::error::{OrmError, Result};
pub use domain::model::{Address, Entity, Person, PersonBuilder, Region, SqlValue};
pub use storage::schema;
