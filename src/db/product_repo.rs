// src/db/product_repo.rs

use std::collections::BTreeMap;

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::product::{CreateProductPayload, Product, UpdateProductPayload},
};

// Repositório do catálogo. A vitrine só enxerga produtos ativos; o
// back-office enxerga tudo.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_active(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE active = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn list_all(&self) -> Result<Vec<Product>, AppError> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let maybe_product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_product)
    }

    // Os campos obrigatórios já passaram pelo validator no handler, daí os
    // `unwrap_or_default` serem seguros aqui.
    pub async fn create(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, description, image_url, price_uyu, price_usd, stock) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(payload.name.as_deref().unwrap_or_default())
        .bind(payload.description.as_deref())
        .bind(payload.image_url.as_deref())
        .bind(payload.price_uyu.unwrap_or_default())
        .bind(payload.price_usd.unwrap_or_default())
        .bind(sqlx::types::Json(
            payload.stock.clone().unwrap_or_default(),
        ))
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    // Atualização parcial: campo ausente no payload mantém o valor atual.
    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError> {
        let maybe_product = sqlx::query_as::<_, Product>(
            "UPDATE products SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                image_url = COALESCE($4, image_url), \
                price_uyu = COALESCE($5, price_uyu), \
                price_usd = COALESCE($6, price_usd), \
                active = COALESCE($7, active), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.image_url.as_deref())
        .bind(payload.price_uyu)
        .bind(payload.price_usd)
        .bind(payload.active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_product)
    }

    // Trava a linha do produto para a baixa de estoque do pedido.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_product =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(maybe_product)
    }

    // Regrava o mapa de estoque inteiro (já ajustado pelo chamador).
    pub async fn set_stock<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        stock: &BTreeMap<String, i32>,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_product = sqlx::query_as::<_, Product>(
            "UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(sqlx::types::Json(stock))
        .fetch_optional(executor)
        .await?;
        Ok(maybe_product)
    }
}
