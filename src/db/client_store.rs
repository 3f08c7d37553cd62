use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::client::{Client, ClientInput},
};

/// Client store for database operations
#[derive(Clone)]
pub struct ClientStore {
    pool: DbPool,
}

impl ClientStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get all clients ordered by name
    pub async fn fetch_all(&self) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT id, name, address FROM clients ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(clients)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Client> {
        sqlx::query_as::<_, Client>("SELECT id, name, address FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("client", id))
    }

    pub async fn create(&self, input: ClientInput) -> Result<Client> {
        let input = input.validated()?;
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO clients (id, name, address) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&input.name)
            .bind(&input.address)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        tracing::debug!("Created client {}", id);
        Ok(Client {
            id,
            name: input.name,
            address: input.address,
        })
    }

    pub async fn update(&self, id: &str, input: ClientInput) -> Result<Client> {
        let input = input.validated()?;

        let result = sqlx::query("UPDATE clients SET name = ?, address = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.address)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("client", id));
        }

        Ok(Client {
            id: id.to_string(),
            name: input.name,
            address: input.address,
        })
    }

    /// Delete a client; fails with a foreign-key violation while shipments reference it
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("client", id));
        }

        Ok(())
    }
}
