//! Table definitions for the built-in entities.
//!
//! Migrations are the caller's concern; this is what the demo binary and the
//! tests run against a fresh database.

use sqlx::SqliteConnection;

pub const CREATE_ADDRESSES_SQL: &str = "CREATE TABLE IF NOT EXISTS ADDRESSES (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    STREET_ADDRESS TEXT,
    ADDRESS2 TEXT,
    CITY TEXT,
    STATE TEXT,
    POSTCODE TEXT,
    COUNTY TEXT,
    REGION TEXT NOT NULL,
    COUNTRY TEXT
)";

pub const CREATE_PEOPLE_SQL: &str = "CREATE TABLE IF NOT EXISTS PEOPLE (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    FIRST_NAME TEXT NOT NULL,
    LAST_NAME TEXT NOT NULL,
    DOB DATETIME NOT NULL,
    SALARY TEXT,
    EMAIL TEXT,
    HOME_ADDRESS INTEGER REFERENCES ADDRESSES(ID),
    BIZ_ADDRESS INTEGER REFERENCES ADDRESSES(ID),
    SPOUSE INTEGER REFERENCES PEOPLE(ID),
    PARENT_ID INTEGER REFERENCES PEOPLE(ID)
)";

pub const CREATE_PEOPLE_PARENT_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS PEOPLE_PARENT_ID_IDX ON PEOPLE (PARENT_ID)";

/// Creates the `ADDRESSES` and `PEOPLE` tables if they do not exist.
pub async fn bootstrap(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for sql in [CREATE_ADDRESSES_SQL, CREATE_PEOPLE_SQL, CREATE_PEOPLE_PARENT_INDEX_SQL] {
        sqlx::query(sql).execute(&mut *conn).await?;
    }
    Ok(())
}
