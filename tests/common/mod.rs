#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use peopledb::{schema, Address, BindingRegistry, PeopleRepository, Region};
use sqlx::{Connection, SqliteConnection};
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Fresh in-memory database with the schema installed.
pub async fn connect() -> Result<SqliteConnection, Box<dyn std::error::Error>> {
    let mut conn = SqliteConnection::connect("sqlite::memory:").await?;
    schema::bootstrap(&mut conn).await?;
    Ok(conn)
}

pub fn registry() -> Arc<BindingRegistry> {
    Arc::new(BindingRegistry::with_builtin_entities())
}

pub async fn people_repo() -> Result<(SqliteConnection, PeopleRepository), Box<dyn std::error::Error>> {
    let mut conn = connect().await?;
    let repo = PeopleRepository::prepare(&mut conn, registry()).await?;
    Ok((conn, repo))
}

pub fn dob(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 2, 22, 26).unwrap()
}

pub fn address(street: &str) -> Address {
    Address::new(street, "Mansilla", "Ituzaingo", "BA", "1714", "Provincia", Region::West, "Argentina")
}
