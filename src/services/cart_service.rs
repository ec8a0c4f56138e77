// src/services/cart_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CartRepository, ProductRepository},
    models::cart::{
        add_item, merge_cart_items, remove_items, update_items, AddItemPayload, Cart,
        CartItemPatch, CartLineItem, CartOwner,
    },
    models::product::Product,
};

// Serviço do carrinho. Toda escrita segue o mesmo ciclo: abre transação,
// lê a linha com lock, aplica a regra pura de models::cart, regrava com a
// versão incrementada e comita. Duas abas mexendo ao mesmo tempo nunca se
// atropelam; a segunda só enxerga o resultado da primeira.
#[derive(Clone)]
pub struct CartService {
    cart_repo: CartRepository,
    product_repo: ProductRepository,
    pool: PgPool,
}

impl CartService {
    pub fn new(cart_repo: CartRepository, product_repo: ProductRepository, pool: PgPool) -> Self {
        Self { cart_repo, product_repo, pool }
    }

    // Leitura nunca cria linha: carrinho ausente responde vazio com version 0.
    pub async fn load(&self, owner: &CartOwner) -> Result<Cart, AppError> {
        Ok(self.cart_repo.find(owner).await?.unwrap_or_else(Cart::empty))
    }

    // Adiciona um item. O preço e o nome vêm do catálogo NO MOMENTO da
    // adição; o cliente só manda produto, talle, personalização e quantidade.
    pub async fn add_item(
        &self,
        owner: &CartOwner,
        payload: AddItemPayload,
    ) -> Result<Cart, AppError> {
        let product_id = payload.product_id.unwrap_or_default();
        let product = self
            .product_repo
            .find_by_id(product_id)
            .await?
            .filter(|p| p.active)
            .ok_or(AppError::ProductNotFound)?;

        let new_item = build_line_item(&product, &payload);

        let mut tx = self.pool.begin().await?;
        let mut items = self
            .cart_repo
            .find_for_update(&mut *tx, owner)
            .await?
            .map(|cart| cart.items)
            .unwrap_or_default();

        add_item(&mut items, new_item);

        let cart = self.cart_repo.upsert(&mut *tx, owner, &items).await?;
        tx.commit().await?;
        Ok(cart)
    }

    // Edita todos os itens com (produto, talle). Quantidade <= 0 remove.
    // Sem nenhum item correspondente a chamada não grava nada.
    pub async fn update_item(
        &self,
        owner: &CartOwner,
        product_id: Uuid,
        size: &str,
        patch: &CartItemPatch,
    ) -> Result<Cart, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(current) = self.cart_repo.find_for_update(&mut *tx, owner).await? else {
            return Ok(Cart::empty());
        };

        let (version, updated_at) = (current.version, current.updated_at);
        let mut items = current.items;
        let touched = update_items(&mut items, product_id, size, patch);
        if touched == 0 {
            return Ok(Cart { items, version, updated_at });
        }

        let cart = self.cart_repo.upsert(&mut *tx, owner, &items).await?;
        tx.commit().await?;
        Ok(cart)
    }

    pub async fn remove_item(
        &self,
        owner: &CartOwner,
        product_id: Uuid,
        size: &str,
    ) -> Result<Cart, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(current) = self.cart_repo.find_for_update(&mut *tx, owner).await? else {
            return Ok(Cart::empty());
        };

        let (version, updated_at) = (current.version, current.updated_at);
        let mut items = current.items;
        let removed = remove_items(&mut items, product_id, size);
        if removed == 0 {
            return Ok(Cart { items, version, updated_at });
        }

        let cart = self.cart_repo.upsert(&mut *tx, owner, &items).await?;
        tx.commit().await?;
        Ok(cart)
    }

    // Esvazia o carrinho apagando a linha inteira, não gravando uma lista
    // vazia. A próxima mutação recomeça do zero, como na primeira visita.
    pub async fn clear(&self, owner: &CartOwner) -> Result<Cart, AppError> {
        self.cart_repo.delete(&self.pool, owner).await?;
        Ok(Cart::empty())
    }

    // Funde o carrinho de visitante no carrinho da conta ao entrar.
    // O carrinho da conta manda: item repetido soma quantidades e mantém os
    // dados salvos no servidor. A linha da sessão some no final, então chamar
    // de novo com o mesmo id é inofensivo.
    pub async fn merge_into_user(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<Cart, AppError> {
        let user_owner = CartOwner::User(user_id);
        let session_owner = CartOwner::Session(session_id);

        let mut tx = self.pool.begin().await?;

        // Sempre trava primeiro a linha da conta, depois a da sessão, para
        // duas fusões concorrentes não esperarem uma pela outra em ordem
        // trocada.
        let remote = self
            .cart_repo
            .find_for_update(&mut *tx, &user_owner)
            .await?
            .map(|cart| cart.items)
            .unwrap_or_default();
        let local = self
            .cart_repo
            .find_for_update(&mut *tx, &session_owner)
            .await?
            .map(|cart| cart.items)
            .unwrap_or_default();

        let merged = merge_cart_items(&local, &remote);

        let cart = self.cart_repo.upsert(&mut *tx, &user_owner, &merged).await?;
        self.cart_repo.delete(&mut *tx, &session_owner).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

// Monta o item do carrinho com o snapshot do catálogo. Função pura, separada
// para o teste não precisar de banco.
pub fn build_line_item(product: &Product, payload: &AddItemPayload) -> CartLineItem {
    CartLineItem {
        product_id: product.id,
        size: payload.size.clone().unwrap_or_default(),
        custom_name: payload.custom_name.clone(),
        custom_number: payload.custom_number,
        options: payload.options.clone(),
        quantity: payload.quantity.unwrap_or(1),
        name: product.name.clone(),
        image: product.image_url.clone(),
        unit_price: product.price_uyu,
        unit_price_usd: product.price_usd,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn product() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Camiseta Peñarol 2025".to_string(),
            description: None,
            image_url: Some("/img/penarol-2025.webp".to_string()),
            price_uyu: Decimal::new(2490, 0),
            price_usd: Decimal::new(59, 0),
            stock: BTreeMap::from([("M".to_string(), 10)]),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn line_item_snapshots_catalog_data() {
        let product = product();
        let payload = AddItemPayload {
            product_id: Some(product.id),
            size: Some("M".to_string()),
            custom_name: Some("CACERES".to_string()),
            custom_number: Some(4),
            options: None,
            quantity: Some(2),
        };

        let item = build_line_item(&product, &payload);
        assert_eq!(item.product_id, product.id);
        assert_eq!(item.name, "Camiseta Peñarol 2025");
        assert_eq!(item.unit_price, Decimal::new(2490, 0));
        assert_eq!(item.unit_price_usd, Decimal::new(59, 0));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.custom_name.as_deref(), Some("CACERES"));
    }

    #[test]
    fn quantity_defaults_to_one() {
        let product = product();
        let payload = AddItemPayload {
            product_id: Some(product.id),
            size: Some("M".to_string()),
            custom_name: None,
            custom_number: None,
            options: None,
            quantity: None,
        };

        assert_eq!(build_line_item(&product, &payload).quantity, 1);
    }
}
