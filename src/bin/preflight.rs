use peopledb::infra::{config, logging};
use peopledb::{schema, BindingRegistry, CrudOperation};
use sqlx::{Connection, SqliteConnection};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--bootstrap-schema]\n\
         \n\
         Optional env vars:\n\
           DATABASE_URL (default sqlite::memory:), LOG_LEVEL (default info)\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    logging::init()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let bootstrap_schema = args.iter().any(|a| a == "--bootstrap-schema");

    let database_url = config::database_url();
    println!("> Preflight:");
    println!("  DATABASE_URL={}", database_url);

    // Basic connectivity
    let mut conn = SqliteConnection::connect(&database_url).await?;
    conn.ping().await?;
    println!("  Connection ok.");

    if bootstrap_schema {
        schema::bootstrap(&mut conn).await?;
        println!("  Schema bootstrapped.");
    }

    // Every registered entity must resolve SQL for every operation.
    let registry = BindingRegistry::with_builtin_entities();
    let mut incomplete = Vec::new();
    for (entity, missing) in registry.audit() {
        if missing.is_empty() {
            println!("  {}: all {} operations bound.", entity, CrudOperation::ALL.len());
        } else {
            let names: Vec<&str> = missing.iter().map(|op| op.as_str()).collect();
            eprintln!("  {}: unsupported operations: {}", entity, names.join(", "));
            incomplete.push(entity);
        }
    }

    if !incomplete.is_empty() {
        return Err(anyhow::anyhow!(
            "entities with unbound operations: {}",
            incomplete.join(", ")
        ));
    }

    conn.close().await?;
    println!("> Preflight OK.");
    Ok(())
}
