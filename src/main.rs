//! Demo entrypoint: save a small family and read it back.
//!
//! Uses `DATABASE_URL` (default: in-memory SQLite) and `LOG_LEVEL`.
//! Run with `LOG_LEVEL=debug` to see every resolved statement.

use chrono::{DateTime, TimeZone, Utc};
use peopledb::infra::{config, logging};
use peopledb::{schema, Address, BindingRegistry, PeopleRepository, Person, Region, Repository};
use rust_decimal::Decimal;
use sqlx::{Connection, SqliteConnection};
use std::sync::Arc;
use tracing::info;

fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> anyhow::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid date {}-{}-{}", year, month, day))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    logging::init()?;

    let database_url = config::database_url();
    info!("> Connecting to {}", database_url);
    let mut conn = SqliteConnection::connect(&database_url).await?;
    schema::bootstrap(&mut conn).await?;

    let registry = Arc::new(BindingRegistry::with_builtin_entities());
    let people = PeopleRepository::prepare(&mut conn, registry).await?;

    let home = Address::new("221B Baker Street", "", "London", "Greater London", "NW1 6XE", "Westminster", Region::Central, "UK");
    let spouse = Person::new("Mary", "Morstan", utc(1860, 3, 14, 9, 0)?);
    let family = Person::builder("John", "Watson", utc(1852, 7, 7, 12, 0)?)
        .salary(Decimal::new(420000, 2))
        .email("jwatson@example.com")
        .home_address(home)
        .spouse(spouse)
        .child(Person::new("Arthur", "Watson", utc(1890, 1, 2, 8, 30)?))
        .child(Person::new("Violet", "Watson", utc(1892, 5, 17, 16, 45)?))
        .build();

    let mut tx = conn.begin().await?;
    let saved = people.save(&mut tx, family).await?;
    tx.commit().await?;

    let id = saved
        .id()
        .ok_or_else(|| anyhow::anyhow!("save returned a person without an identity"))?;
    info!("> Saved person {} with {} children", id, saved.children().len());

    let found = people
        .find_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("person {} not found after save", id))?;
    info!("> Round trip equal: {}", found == saved);
    info!("> People stored: {}", people.count(&mut conn).await?);

    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}
