pub mod addresses;
pub mod crud;
pub mod people;

pub use addresses::AddressRepository;
pub use crud::{CrudRepository, Repository};
pub use people::PeopleRepository;
