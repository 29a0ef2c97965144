pub mod grouping;
pub mod params;
pub mod row;
pub mod schema;

pub use grouping::GroupedRows;
pub use params::bind_params;
pub use row::{AliasIndex, AliasedRow};
