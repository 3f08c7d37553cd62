use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::{
        relation::RelatedName,
        shipment::{LineItem, LineItemInput, Shipment, ShipmentInput, ShipmentUpdate},
    },
};

const SELECT_SHIPMENTS: &str = r#"
    SELECT s.id, s.name, s.created_at, s.departure_date, s.arrival_date,
           s.client_id, s.carrier_id,
           c.name AS client_name, t.name AS carrier_name
    FROM shipments s
    LEFT JOIN clients c ON c.id = s.client_id
    LEFT JOIN carriers t ON t.id = s.carrier_id
"#;

const SELECT_LINE_ITEMS: &str = r#"
    SELECT li.shipment_id, li.product_id, li.quantity, p.name AS product_name
    FROM shipment_line_items li
    LEFT JOIN products p ON p.id = li.product_id
"#;

#[derive(Debug, FromRow)]
struct ShipmentRow {
    id: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
    departure_date: Option<DateTime<Utc>>,
    arrival_date: Option<DateTime<Utc>>,
    client_id: String,
    carrier_id: String,
    client_name: Option<String>,
    carrier_name: Option<String>,
}

impl ShipmentRow {
    fn into_shipment(self, line_items: Vec<LineItem>) -> Shipment {
        Shipment {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            departure_date: self.departure_date,
            arrival_date: self.arrival_date,
            client_id: self.client_id,
            carrier_id: self.carrier_id,
            client: self.client_name.map(RelatedName::new),
            carrier: self.carrier_name.map(RelatedName::new),
            line_items,
        }
    }
}

#[derive(Debug, FromRow)]
struct LineItemRow {
    shipment_id: String,
    product_id: String,
    quantity: i64,
    product_name: Option<String>,
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = AppError;

    fn try_from(row: LineItemRow) -> Result<Self> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            AppError::Internal(format!(
                "Invalid quantity {} stored for shipment {}",
                row.quantity, row.shipment_id
            ))
        })?;

        Ok(LineItem {
            product_id: row.product_id,
            quantity,
            product_name: row.product_name,
        })
    }
}

/// Shipment store for database operations
#[derive(Clone)]
pub struct ShipmentStore {
    pool: DbPool,
}

impl ShipmentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get all shipments, newest first, with client/carrier names and line items.
    ///
    /// Uses one joined query for the shipments and one for every line item
    /// instead of a lookup per shipment.
    pub async fn fetch_all(&self) -> Result<Vec<Shipment>> {
        let rows = sqlx::query_as::<_, ShipmentRow>(&format!(
            "{SELECT_SHIPMENTS} ORDER BY s.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let item_rows = sqlx::query_as::<_, LineItemRow>(&format!(
            "{SELECT_LINE_ITEMS} ORDER BY li.shipment_id, li.position"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_shipment: HashMap<String, Vec<LineItem>> = HashMap::new();
        for row in item_rows {
            let shipment_id = row.shipment_id.clone();
            items_by_shipment
                .entry(shipment_id)
                .or_default()
                .push(LineItem::try_from(row)?);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = items_by_shipment.remove(&row.id).unwrap_or_default();
                row.into_shipment(items)
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Shipment> {
        let row = sqlx::query_as::<_, ShipmentRow>(&format!("{SELECT_SHIPMENTS} WHERE s.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("shipment", id))?;

        let items = sqlx::query_as::<_, LineItemRow>(&format!(
            "{SELECT_LINE_ITEMS} WHERE li.shipment_id = ? ORDER BY li.position"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(LineItem::try_from)
        .collect::<Result<Vec<_>>>()?;

        Ok(row.into_shipment(items))
    }

    /// Insert a shipment and its line items, returning the new id
    pub async fn create(&self, input: &ShipmentInput, created_at: DateTime<Utc>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO shipments (id, name, created_at, departure_date, arrival_date, client_id, carrier_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(created_at)
        .bind(input.departure_date)
        .bind(input.arrival_date)
        .bind(&input.client_id)
        .bind(&input.carrier_id)
        .execute(&mut *tx)
        .await?;

        insert_line_items(&mut tx, &id, &input.line_items).await?;
        tx.commit().await?;

        tracing::debug!("Created shipment {}", id);
        Ok(id)
    }

    /// Write the merged columns; refused once the stored dates say the shipment has left
    pub async fn update(
        &self,
        id: &str,
        update: &ShipmentUpdate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        claim_editable(&mut tx, id, now).await?;

        sqlx::query(
            r#"
            UPDATE shipments
            SET name = ?, client_id = ?, carrier_id = ?, departure_date = ?, arrival_date = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.client_id)
        .bind(&update.carrier_id)
        .bind(update.departure_date)
        .bind(update.arrival_date)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Replace every line item of the shipment with the given set
    pub async fn replace_line_items(
        &self,
        id: &str,
        items: &[LineItemInput],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        claim_editable(&mut tx, id, now).await?;

        sqlx::query("DELETE FROM shipment_line_items WHERE shipment_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_line_items(&mut tx, id, items).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Delete the line items first, then the shipment itself
    pub async fn delete(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        claim_editable(&mut tx, id, now).await?;

        sqlx::query("DELETE FROM shipment_line_items WHERE shipment_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM shipments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Touch the shipment row only while neither of its dates has been reached.
/// This takes the write lock, so the dates cannot change under the rest of
/// the transaction.
async fn claim_editable(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> Result<()> {
    let claimed = sqlx::query(
        r#"
        UPDATE shipments SET name = name
        WHERE id = ?
          AND (departure_date IS NULL OR julianday(departure_date) > julianday(?))
          AND (arrival_date IS NULL OR julianday(arrival_date) > julianday(?))
        "#,
    )
    .bind(id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if claimed.rows_affected() > 0 {
        return Ok(());
    }

    let exists = sqlx::query("SELECT 1 FROM shipments WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match exists {
        Some(_) => Err(AppError::ShipmentLocked),
        None => Err(AppError::not_found("shipment", id)),
    }
}

async fn insert_line_items(
    conn: &mut SqliteConnection,
    shipment_id: &str,
    items: &[LineItemInput],
) -> Result<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO shipment_line_items (shipment_id, product_id, quantity, position)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(shipment_id)
        .bind(&item.product_id)
        .bind(i64::from(item.quantity))
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
