use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::product::{Product, ProductInput},
};

#[derive(Clone)]
pub struct ProductStore {
    pool: DbPool,
}

impl ProductStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_all(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description FROM products ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Product> {
        sqlx::query_as::<_, Product>("SELECT id, name, description FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("product", id))
    }

    pub async fn create(&self, input: ProductInput) -> Result<Product> {
        let input = input.validated()?;
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO products (id, name, description) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&input.name)
            .bind(&input.description)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Created product {}", id);
        Ok(Product {
            id,
            name: input.name,
            description: input.description,
        })
    }

    pub async fn update(&self, id: &str, input: ProductInput) -> Result<Product> {
        let input = input.validated()?;

        let result = sqlx::query("UPDATE products SET name = ?, description = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("product", id));
        }

        Ok(Product {
            id: id.to_string(),
            name: input.name,
            description: input.description,
        })
    }

    /// Fails with a foreign-key violation while a line item still uses the product
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("product", id));
        }

        Ok(())
    }
}
