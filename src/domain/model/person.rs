use super::{Address, Entity, SqlValue};
use crate::domain::binding::{BindingSet, CrudOperation, SqlBinding};
use crate::domain::error::{OrmError, Result};
use crate::storage::row::AliasedRow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Column list of the person graph query: the person (`PARENT_`), both
/// addresses (`HOME_`, `BIZ_`), the spouse (`SPOUSE_`) and one child per row
/// (`CHILDREN_`).
macro_rules! person_graph_columns {
    () => {
        "SELECT \
PARENT.ID AS PARENT_ID, PARENT.FIRST_NAME AS PARENT_FIRST_NAME, PARENT.LAST_NAME AS PARENT_LAST_NAME, \
PARENT.DOB AS PARENT_DOB, PARENT.SALARY AS PARENT_SALARY, PARENT.EMAIL AS PARENT_EMAIL, \
PARENT.PARENT_ID AS PARENT_PARENT_ID, \
HOME.ID AS HOME_ID, HOME.STREET_ADDRESS AS HOME_STREET_ADDRESS, HOME.ADDRESS2 AS HOME_ADDRESS2, \
HOME.CITY AS HOME_CITY, HOME.STATE AS HOME_STATE, HOME.POSTCODE AS HOME_POSTCODE, \
HOME.COUNTY AS HOME_COUNTY, HOME.REGION AS HOME_REGION, HOME.COUNTRY AS HOME_COUNTRY, \
BIZ.ID AS BIZ_ID, BIZ.STREET_ADDRESS AS BIZ_STREET_ADDRESS, BIZ.ADDRESS2 AS BIZ_ADDRESS2, \
BIZ.CITY AS BIZ_CITY, BIZ.STATE AS BIZ_STATE, BIZ.POSTCODE AS BIZ_POSTCODE, \
BIZ.COUNTY AS BIZ_COUNTY, BIZ.REGION AS BIZ_REGION, BIZ.COUNTRY AS BIZ_COUNTRY, \
SPOUSE.ID AS SPOUSE_ID, SPOUSE.FIRST_NAME AS SPOUSE_FIRST_NAME, SPOUSE.LAST_NAME AS SPOUSE_LAST_NAME, \
SPOUSE.DOB AS SPOUSE_DOB, SPOUSE.SALARY AS SPOUSE_SALARY, SPOUSE.EMAIL AS SPOUSE_EMAIL, \
SPOUSE.PARENT_ID AS SPOUSE_PARENT_ID, \
CHILDREN.ID AS CHILDREN_ID, CHILDREN.FIRST_NAME AS CHILDREN_FIRST_NAME, CHILDREN.LAST_NAME AS CHILDREN_LAST_NAME, \
CHILDREN.DOB AS CHILDREN_DOB, CHILDREN.SALARY AS CHILDREN_SALARY, CHILDREN.EMAIL AS CHILDREN_EMAIL, \
CHILDREN.PARENT_ID AS CHILDREN_PARENT_ID"
    };
}

macro_rules! person_graph_joins {
    () => {
        " LEFT OUTER JOIN ADDRESSES AS HOME ON PARENT.HOME_ADDRESS = HOME.ID \
LEFT OUTER JOIN ADDRESSES AS BIZ ON PARENT.BIZ_ADDRESS = BIZ.ID \
LEFT OUTER JOIN PEOPLE AS SPOUSE ON PARENT.SPOUSE = SPOUSE.ID \
LEFT OUTER JOIN PEOPLE AS CHILDREN ON PARENT.ID = CHILDREN.PARENT_ID"
    };
}

pub const SAVE_PERSON_SQL: &str = "INSERT INTO PEOPLE \
    (FIRST_NAME, LAST_NAME, DOB, SALARY, EMAIL, HOME_ADDRESS, BIZ_ADDRESS, SPOUSE, PARENT_ID) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

pub const UPDATE_PERSON_SQL: &str =
    "UPDATE PEOPLE SET FIRST_NAME = ?, LAST_NAME = ?, DOB = ?, SALARY = ?, EMAIL = ? WHERE ID = ?";

pub const FIND_PERSON_BY_ID_SQL: &str = concat!(
    person_graph_columns!(),
    " FROM PEOPLE AS PARENT",
    person_graph_joins!(),
    " WHERE PARENT.ID = ? ORDER BY CHILDREN.ID"
);

// The page is cut on the root table so a person's rows are never split.
pub const FIND_ALL_PEOPLE_SQL: &str = concat!(
    person_graph_columns!(),
    " FROM (SELECT * FROM PEOPLE ORDER BY ID LIMIT 100) AS PARENT",
    person_graph_joins!(),
    " ORDER BY PARENT.ID, CHILDREN.ID"
);

pub const LINK_CHILD_SQL: &str = "UPDATE PEOPLE SET PARENT_ID = ? WHERE ID = ?";

pub const COUNT_PEOPLE_SQL: &str = "SELECT COUNT(*) FROM PEOPLE";
pub const DELETE_PERSON_SQL: &str = "DELETE FROM PEOPLE WHERE ID = ?";
pub const DELETE_PEOPLE_SQL: &str = "DELETE FROM PEOPLE WHERE ID IN (:ids)";

/// A person with optional addresses, an optional spouse and children.
///
/// Built with [`Person::builder`]; the repository is the only writer of the
/// identity and of the association identities assigned during a save.
///
/// Loading is one level deep: a loaded spouse or child carries its scalar
/// fields and `parent_id` only, never its own addresses, spouse or children.
/// A graph saved deeper than that does not compare equal to what is loaded back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    id: Option<i64>,
    first_name: String,
    last_name: String,
    dob: DateTime<Utc>,
    salary: Option<Decimal>,
    email: Option<String>,
    pub(crate) home_address: Option<Address>,
    pub(crate) business_address: Option<Address>,
    pub(crate) spouse: Option<Box<Person>>,
    pub(crate) children: Vec<Person>,
    parent_id: Option<i64>,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, dob: DateTime<Utc>) -> Self {
        Self::builder(first_name, last_name, dob).build()
    }

    pub fn builder(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        dob: DateTime<Utc>,
    ) -> PersonBuilder {
        PersonBuilder {
            person: Person {
                id: None,
                first_name: first_name.into(),
                last_name: last_name.into(),
                dob,
                salary: None,
                email: None,
                home_address: None,
                business_address: None,
                spouse: None,
                children: Vec::new(),
                parent_id: None,
            },
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn dob(&self) -> DateTime<Utc> {
        self.dob
    }

    pub fn salary(&self) -> Option<Decimal> {
        self.salary
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn home_address(&self) -> Option<&Address> {
        self.home_address.as_ref()
    }

    pub fn business_address(&self) -> Option<&Address> {
        self.business_address.as_ref()
    }

    pub fn spouse(&self) -> Option<&Person> {
        self.spouse.as_deref()
    }

    pub fn children(&self) -> &[Person] {
        &self.children
    }

    /// Identity of the person this one is a child of.
    pub fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    pub fn with_salary(mut self, salary: Decimal) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: i64) {
        self.parent_id = Some(parent_id);
    }

    /// Decodes the scalar fields of the person in alias family `prefix`.
    ///
    /// Associations are not part of a family; a NULL `<prefix>ID` means no person.
    pub fn decode_family(row: &mut AliasedRow<'_>, prefix: &str) -> Result<Option<Self>> {
        match row.get::<i64>(&format!("{prefix}ID"))? {
            Some(id) => Self::decode_fields(row, prefix, id).map(Some),
            None => Ok(None),
        }
    }

    fn decode_fields(row: &mut AliasedRow<'_>, prefix: &str, id: i64) -> Result<Self> {
        Ok(Person {
            id: Some(id),
            first_name: row.require(&format!("{prefix}FIRST_NAME"))?,
            last_name: row.require(&format!("{prefix}LAST_NAME"))?,
            dob: row.require(&format!("{prefix}DOB"))?,
            salary: row.parse(&format!("{prefix}SALARY"))?,
            email: row.get(&format!("{prefix}EMAIL"))?,
            home_address: None,
            business_address: None,
            spouse: None,
            children: Vec::new(),
            parent_id: row.get(&format!("{prefix}PARENT_ID"))?,
        })
    }

    fn reference<E: Entity>(&self, role: &str, associated: Option<&E>) -> Result<SqlValue> {
        match associated {
            None => Ok(SqlValue::Null),
            Some(entity) => entity.identity().map(SqlValue::Integer).ok_or_else(|| {
                OrmError::configuration(format!(
                    "{} of {} {} has no identity; it must be saved first",
                    role, self.first_name, self.last_name
                ))
            }),
        }
    }
}

impl Entity for Person {
    const NAME: &'static str = "Person";
    const TABLE: Option<&'static str> = Some("PEOPLE");

    fn identity(&self) -> Option<i64> {
        self.id
    }

    fn set_assigned_identity(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn decode(row: &mut AliasedRow<'_>) -> Result<Self> {
        let id = row.require("PARENT_ID")?;
        Self::decode_fields(row, "PARENT_", id)
    }

    fn absorb(&mut self, row: &mut AliasedRow<'_>) -> Result<()> {
        if let Some(home) = Address::decode_family(row, "HOME_")? {
            self.home_address = Some(home);
        }
        if let Some(biz) = Address::decode_family(row, "BIZ_")? {
            self.business_address = Some(biz);
        }
        if let Some(spouse) = Person::decode_family(row, "SPOUSE_")? {
            self.spouse = Some(Box::new(spouse));
        }
        if let Some(child) = Person::decode_family(row, "CHILDREN_")? {
            self.children.push(child);
        }
        Ok(())
    }

    fn encode_for_insert(&self) -> Result<Vec<SqlValue>> {
        Ok(vec![
            self.first_name.as_str().into(),
            self.last_name.as_str().into(),
            self.dob.into(),
            self.salary.map(|s| s.to_string()).into(),
            self.email.clone().into(),
            self.reference("home address", self.home_address.as_ref())?,
            self.reference("business address", self.business_address.as_ref())?,
            self.reference("spouse", self.spouse.as_deref())?,
            self.parent_id.into(),
        ])
    }

    fn encode_for_update(&self) -> Result<Vec<SqlValue>> {
        Ok(vec![
            self.first_name.as_str().into(),
            self.last_name.as_str().into(),
            self.dob.into(),
            self.salary.map(|s| s.to_string()).into(),
            self.email.clone().into(),
        ])
    }

    fn bindings() -> BindingSet {
        BindingSet::new()
            .group([
                SqlBinding::new(CrudOperation::FindById, FIND_PERSON_BY_ID_SQL),
                SqlBinding::new(CrudOperation::FindAll, FIND_ALL_PEOPLE_SQL),
                SqlBinding::new(CrudOperation::Count, COUNT_PEOPLE_SQL),
                SqlBinding::new(CrudOperation::DeleteOne, DELETE_PERSON_SQL),
                SqlBinding::new(CrudOperation::DeleteMany, DELETE_PEOPLE_SQL),
            ])
            .single(CrudOperation::Save, SAVE_PERSON_SQL)
            .single(CrudOperation::Update, UPDATE_PERSON_SQL)
    }
}

/// Assembles a [`Person`] with all of its optional parts.
#[derive(Debug, Clone)]
pub struct PersonBuilder {
    person: Person,
}

impl PersonBuilder {
    pub fn salary(mut self, salary: Decimal) -> Self {
        self.person.salary = Some(salary);
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.person.email = Some(email.into());
        self
    }

    pub fn home_address(mut self, address: Address) -> Self {
        self.person.home_address = Some(address);
        self
    }

    pub fn business_address(mut self, address: Address) -> Self {
        self.person.business_address = Some(address);
        self
    }

    pub fn spouse(mut self, spouse: Person) -> Self {
        self.person.spouse = Some(Box::new(spouse));
        self
    }

    pub fn child(mut self, child: Person) -> Self {
        self.person.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Person>) -> Self {
        self.person.children.extend(children);
        self
    }

    pub fn build(self) -> Person {
        self.person
    }
}
