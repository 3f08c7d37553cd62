use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::carrier::{Carrier, CarrierInput},
};

#[derive(Clone)]
pub struct CarrierStore {
    pool: DbPool,
}

impl CarrierStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_all(&self) -> Result<Vec<Carrier>> {
        let carriers = sqlx::query_as::<_, Carrier>(
            "SELECT id, name, contact FROM carriers ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(carriers)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Carrier> {
        sqlx::query_as::<_, Carrier>("SELECT id, name, contact FROM carriers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("carrier", id))
    }

    pub async fn create(&self, input: CarrierInput) -> Result<Carrier> {
        let input = input.validated()?;
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO carriers (id, name, contact) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&input.name)
            .bind(&input.contact)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Created carrier {}", id);
        Ok(Carrier {
            id,
            name: input.name,
            contact: input.contact,
        })
    }

    pub async fn update(&self, id: &str, input: CarrierInput) -> Result<Carrier> {
        let input = input.validated()?;

        let result = sqlx::query("UPDATE carriers SET name = ?, contact = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.contact)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("carrier", id));
        }

        Ok(Carrier {
            id: id.to_string(),
            name: input.name,
            contact: input.contact,
        })
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM carriers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("carrier", id));
        }

        Ok(())
    }
}
