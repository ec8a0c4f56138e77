// src/db/order_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::order::{NewOrder, Order, OrderStatus},
};

// Repositório de pedidos. O INSERT aceita um executor externo porque a
// gravação do pedido e a baixa de estoque vivem na mesma transação.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, new_order: &NewOrder) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders \
                (items, shipping_info, email_cliente, total, currency, \
                 payment_intent_id, payment_status, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(sqlx::types::Json(&new_order.items))
        .bind(sqlx::types::Json(&new_order.shipping_info))
        .bind(&new_order.email_cliente)
        .bind(new_order.total)
        .bind(new_order.currency)
        .bind(&new_order.payment_intent_id)
        .bind(&new_order.payment_status)
        .bind(new_order.status)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    // Lista para o back-office, pedido mais recente primeiro.
    pub async fn list(&self) -> Result<Vec<Order>, AppError> {
        let orders =
            sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(orders)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let maybe_order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_order)
    }

    // Só grava o status; quem decide se a transição vale é o serviço.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, AppError> {
        let maybe_order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
