// src/db/cart_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::cart::{Cart, CartLineItem, CartOwner},
};

// Repositório do carrinho persistido. A chave é (dono, id): dono "user" para
// carrinho de conta, dono "session" para visitante anônimo.
#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Leitura simples, fora de transação. NÃO cria linha: carrinho ausente é
    // simplesmente um carrinho vazio para quem lê.
    pub async fn find(&self, owner: &CartOwner) -> Result<Option<Cart>, AppError> {
        let maybe_cart = sqlx::query_as::<_, Cart>(
            "SELECT items, version, updated_at FROM carts WHERE owner_kind = $1 AND owner_id = $2",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_cart)
    }

    // Leitura com lock de linha, para o ciclo ler-alterar-gravar do serviço.
    // Só faz sentido dentro de uma transação aberta pelo chamador.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        owner: &CartOwner,
    ) -> Result<Option<Cart>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_cart = sqlx::query_as::<_, Cart>(
            "SELECT items, version, updated_at FROM carts \
             WHERE owner_kind = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .fetch_optional(executor)
        .await?;
        Ok(maybe_cart)
    }

    // Grava o conteúdo novo. Linha nova entra com version = 1 (default da
    // tabela); linha existente incrementa a versão junto com o conteúdo, o
    // que permite ao cliente detectar que outra aba mexeu no carrinho.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        owner: &CartOwner,
        items: &[CartLineItem],
    ) -> Result<Cart, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cart = sqlx::query_as::<_, Cart>(
            "INSERT INTO carts (owner_kind, owner_id, items) VALUES ($1, $2, $3) \
             ON CONFLICT (owner_kind, owner_id) DO UPDATE \
             SET items = EXCLUDED.items, version = carts.version + 1, updated_at = NOW() \
             RETURNING items, version, updated_at",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .bind(sqlx::types::Json(items))
        .fetch_one(executor)
        .await?;
        Ok(cart)
    }

    // Remove a linha inteira. Usado ao fundir o carrinho de sessão no de
    // conta; repetir a chamada é inofensivo.
    pub async fn delete<'e, E>(&self, executor: E, owner: &CartOwner) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM carts WHERE owner_kind = $1 AND owner_id = $2")
            .bind(owner.kind())
            .bind(owner.id())
            .execute(executor)
            .await?;
        Ok(())
    }
}
