//! Address persistence needs nothing beyond the generic engine.

use crate::app::crud::CrudRepository;
use crate::domain::model::Address;

pub type AddressRepository = CrudRepository<Address>;
