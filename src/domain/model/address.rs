use super::{Entity, SqlValue};
use crate::domain::binding::{BindingSet, CrudOperation};
use crate::domain::error::Result;
use crate::storage::row::AliasedRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SAVE_ADDRESS_SQL: &str = "INSERT INTO ADDRESSES \
    (STREET_ADDRESS, ADDRESS2, CITY, STATE, POSTCODE, COUNTY, REGION, COUNTRY) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

pub const UPDATE_ADDRESS_SQL: &str = "UPDATE ADDRESSES SET \
    STREET_ADDRESS = ?, ADDRESS2 = ?, CITY = ?, STATE = ?, POSTCODE = ?, COUNTY = ?, REGION = ?, COUNTRY = ? \
    WHERE ID = ?";

pub const FIND_ADDRESS_BY_ID_SQL: &str = "SELECT \
    ID, STREET_ADDRESS, ADDRESS2, CITY, STATE, POSTCODE, COUNTY, REGION, COUNTRY \
    FROM ADDRESSES WHERE ID = ?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "NORTH",
            Region::South => "SOUTH",
            Region::East => "EAST",
            Region::West => "WEST",
            Region::Central => "CENTRAL",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region '{0}'")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORTH" => Ok(Region::North),
            "SOUTH" => Ok(Region::South),
            "EAST" => Ok(Region::East),
            "WEST" => Ok(Region::West),
            "CENTRAL" => Ok(Region::Central),
            _ => Err(UnknownRegion(s.to_string())),
        }
    }
}

/// A postal address, owned by whichever person references it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    id: Option<i64>,
    street_address: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    county: Option<String>,
    region: Region,
    country: Option<String>,
}

impl Address {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        street_address: impl Into<String>,
        address2: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postcode: impl Into<String>,
        county: impl Into<String>,
        region: Region,
        country: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            street_address: Some(street_address.into()),
            address2: Some(address2.into()),
            city: Some(city.into()),
            state: Some(state.into()),
            postcode: Some(postcode.into()),
            county: Some(county.into()),
            region,
            country: Some(country.into()),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn street_address(&self) -> Option<&str> {
        self.street_address.as_deref()
    }

    pub fn address2(&self) -> Option<&str> {
        self.address2.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn postcode(&self) -> Option<&str> {
        self.postcode.as_deref()
    }

    pub fn county(&self) -> Option<&str> {
        self.county.as_deref()
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Decodes the address in the alias family `prefix` (e.g. `"HOME_"`).
    ///
    /// A NULL or missing `<prefix>ID` means the association is absent.
    pub fn decode_family(row: &mut AliasedRow<'_>, prefix: &str) -> Result<Option<Self>> {
        match row.get::<i64>(&format!("{prefix}ID"))? {
            Some(id) => Self::decode_fields(row, prefix, id).map(Some),
            None => Ok(None),
        }
    }

    fn decode_fields(row: &mut AliasedRow<'_>, prefix: &str, id: i64) -> Result<Self> {
        Ok(Address {
            id: Some(id),
            street_address: row.get(&format!("{prefix}STREET_ADDRESS"))?,
            address2: row.get(&format!("{prefix}ADDRESS2"))?,
            city: row.get(&format!("{prefix}CITY"))?,
            state: row.get(&format!("{prefix}STATE"))?,
            postcode: row.get(&format!("{prefix}POSTCODE"))?,
            county: row.get(&format!("{prefix}COUNTY"))?,
            region: row.require_parsed(&format!("{prefix}REGION"))?,
            country: row.get(&format!("{prefix}COUNTRY"))?,
        })
    }

    fn columns(&self) -> Vec<SqlValue> {
        vec![
            self.street_address.clone().into(),
            self.address2.clone().into(),
            self.city.clone().into(),
            self.state.clone().into(),
            self.postcode.clone().into(),
            self.county.clone().into(),
            self.region.as_str().into(),
            self.country.clone().into(),
        ]
    }
}

impl Entity for Address {
    const NAME: &'static str = "Address";
    const TABLE: Option<&'static str> = Some("ADDRESSES");

    fn identity(&self) -> Option<i64> {
        self.id
    }

    fn set_assigned_identity(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn decode(row: &mut AliasedRow<'_>) -> Result<Self> {
        let id = row.require("ID")?;
        Self::decode_fields(row, "", id)
    }

    fn encode_for_insert(&self) -> Result<Vec<SqlValue>> {
        Ok(self.columns())
    }

    fn encode_for_update(&self) -> Result<Vec<SqlValue>> {
        Ok(self.columns())
    }

    fn bindings() -> BindingSet {
        BindingSet::new()
            .single(CrudOperation::FindById, FIND_ADDRESS_BY_ID_SQL)
            .single(CrudOperation::Save, SAVE_ADDRESS_SQL)
            .single(CrudOperation::Update, UPDATE_ADDRESS_SQL)
    }
}
