use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{str::FromStr, time::Duration};

pub mod carrier_store;
pub mod client_store;
pub mod product_store;
pub mod shipment_store;

pub use carrier_store::CarrierStore;
pub use client_store::ClientStore;
pub use product_store::ProductStore;
pub use shipment_store::ShipmentStore;

pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    // Referential integrity is what blocks deleting referenced clients,
    // carriers and products, so it must be on for every connection.
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    setup_database(&pool).await?;
    tracing::info!("Database ready at {}", database_url);

    Ok(pool)
}

/// Set up the database schema
async fn setup_database(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            address TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS carriers (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            contact TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            description TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shipments (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT,
            created_at TEXT NOT NULL,
            departure_date TEXT,
            arrival_date TEXT,
            client_id TEXT NOT NULL,
            carrier_id TEXT NOT NULL,
            FOREIGN KEY (client_id) REFERENCES clients(id),
            FOREIGN KEY (carrier_id) REFERENCES carriers(id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shipment_line_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            shipment_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            position INTEGER NOT NULL,
            FOREIGN KEY (shipment_id) REFERENCES shipments(id),
            FOREIGN KEY (product_id) REFERENCES products(id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a small demo data set if the database holds no clients yet
pub async fn seed_sample_data(pool: &DbPool) -> Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients")
        .fetch_one(pool)
        .await?;

    if count.0 > 0 {
        tracing::debug!("Sample data skipped, database is not empty");
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for (id, name, address) in [
        ("client-acme", "Acme Corp", Some("12 rue des Docks, Le Havre")),
        ("client-dupont", "Dupont & Fils", None),
    ] {
        sqlx::query("INSERT INTO clients (id, name, address) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(address)
            .execute(&mut *tx)
            .await?;
    }

    for (id, name, contact) in [
        ("carrier-martin", "Transports Martin", Some("+33 2 35 00 00 00")),
        ("carrier-rapide", "Rapide Fret", None),
    ] {
        sqlx::query("INSERT INTO carriers (id, name, contact) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(contact)
            .execute(&mut *tx)
            .await?;
    }

    for (id, name, description) in [
        ("product-pallet", "Euro pallet", Some("1200 x 800 mm")),
        ("product-crate", "Wooden crate", None),
    ] {
        sqlx::query("INSERT INTO products (id, name, description) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(description)
            .execute(&mut *tx)
            .await?;
    }

    let now = Utc::now();
    let shipments = [
        ("shipment-1", "Acme spring order", "client-acme", "carrier-martin", None, None),
        (
            "shipment-2",
            "Dupont restock",
            "client-dupont",
            "carrier-rapide",
            Some(now - ChronoDuration::days(2)),
            None,
        ),
        (
            "shipment-3",
            "Acme returns",
            "client-acme",
            "carrier-rapide",
            Some(now - ChronoDuration::days(6)),
            Some(now - ChronoDuration::days(1)),
        ),
    ];

    for (offset, (id, name, client_id, carrier_id, departure, arrival)) in
        shipments.into_iter().enumerate()
    {
        sqlx::query(
            r#"
            INSERT INTO shipments (id, name, created_at, departure_date, arrival_date, client_id, carrier_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(now - ChronoDuration::days(10 - offset as i64))
        .bind(departure)
        .bind(arrival)
        .bind(client_id)
        .bind(carrier_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO shipment_line_items (shipment_id, product_id, quantity, position)
            VALUES (?, 'product-pallet', ?, 0)
            "#,
        )
        .bind(id)
        .bind(10 + offset as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!("Sample data inserted");

    Ok(())
}
