// src/services/order_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CartRepository, OrderRepository, ProductRepository},
    models::cart::{CartLineItem, CartOwner},
    models::order::{
        Currency, NewOrder, Order, OrderStatus, ShippingInfo, SubmitOrderPayload,
        PAYMENT_STATUS_SUCCEEDED,
    },
    models::product::decrement_stock,
    services::payments::{to_minor_units, CreateIntentRequest, PaymentGateway, PaymentIntent},
};

// Serviço de pedidos: cria o intent de pagamento no gateway, fecha o pedido
// numa transação única (pedido + baixa de estoque) e cuida das transições de
// status do back-office.
#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    product_repo: ProductRepository,
    cart_repo: CartRepository,
    gateway: Arc<dyn PaymentGateway>,
    pool: PgPool,
    default_country: String,
}

// Resultado da etapa de checkout: o intent do gateway mais o total que o
// servidor calculou (o cliente exibe, nunca decide).
#[derive(Debug, Clone)]
pub struct PreparedCheckout {
    pub intent: PaymentIntent,
    pub total: Decimal,
    pub currency: Currency,
}

impl OrderService {
    pub fn new(
        order_repo: OrderRepository,
        product_repo: ProductRepository,
        cart_repo: CartRepository,
        gateway: Arc<dyn PaymentGateway>,
        pool: PgPool,
        default_country: String,
    ) -> Self {
        Self { order_repo, product_repo, cart_repo, gateway, pool, default_country }
    }

    // Passo 1 do checkout: calcula o total do carrinho GUARDADO e pede o
    // intent ao gateway. Carrinho vazio não chega ao gateway.
    pub async fn create_payment_intent(
        &self,
        owner: &CartOwner,
        shipping_info: &ShippingInfo,
        currency: Currency,
    ) -> Result<PreparedCheckout, AppError> {
        let items = self
            .cart_repo
            .find(owner)
            .await?
            .map(|cart| cart.items)
            .unwrap_or_default();

        let (request, total) = build_intent_request(&items, shipping_info, currency)?;
        let intent = self.gateway.create_intent(request).await?;

        Ok(PreparedCheckout { intent, total, currency })
    }

    // Passo 2: o cliente volta com o resultado do gateway e o pedido fecha.
    // Gravação do pedido e baixa de estoque acontecem na MESMA transação:
    // ou o pedido entra com o estoque ajustado, ou nada muda.
    pub async fn submit_order(
        &self,
        owner: Option<&CartOwner>,
        payload: SubmitOrderPayload,
    ) -> Result<Order, AppError> {
        let new_order = prepare_order(payload, &self.default_country)?;

        let mut tx = self.pool.begin().await?;
        let order = self.order_repo.insert(&mut *tx, &new_order).await?;
        self.adjust_stock_after_order(&mut tx, &order.items).await?;

        // O carrinho guardado já virou pedido; some junto na transação.
        if let Some(owner) = owner {
            self.cart_repo.delete(&mut *tx, owner).await?;
        }

        tx.commit().await?;

        tracing::info!("🧾 Pedido {} registrado ({} {})", order.id, order.total, order.currency.as_str());
        Ok(order)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        self.order_repo.list().await
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        self.order_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::OrderNotFound)
    }

    // Transição de status do back-office, validada contra a tabela do modelo.
    pub async fn update_status(&self, id: Uuid, next: OrderStatus) -> Result<Order, AppError> {
        let order = self.get_order(id).await?;
        if !order.status.can_transition_to(next) {
            return Err(AppError::InvalidStatusTransition {
                from: order.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.order_repo
            .set_status(id, next)
            .await?
            .ok_or(AppError::OrderNotFound)
    }

    pub async fn delete_order(&self, id: Uuid) -> Result<(), AppError> {
        if !self.order_repo.delete(id).await? {
            return Err(AppError::OrderNotFound);
        }
        Ok(())
    }

    // Baixa de estoque item a item, com a linha do produto travada. Produto
    // que saiu do catálogo ou talle desconhecido não derruba o pedido: fica
    // um aviso no log e a vida segue.
    async fn adjust_stock_after_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[CartLineItem],
    ) -> Result<(), AppError> {
        for item in items_in_lock_order(items) {
            let maybe_product = self
                .product_repo
                .find_for_update(&mut **tx, item.product_id)
                .await?;

            let Some(mut product) = maybe_product else {
                tracing::warn!(
                    "⚠️ Produto {} do pedido não existe mais; baixa de estoque ignorada",
                    item.product_id
                );
                continue;
            };

            match decrement_stock(&mut product.stock, &item.size, item.quantity) {
                Some(_) => {
                    self.product_repo
                        .set_stock(&mut **tx, product.id, &product.stock)
                        .await?;
                }
                None => {
                    tracing::warn!(
                        "⚠️ Talle '{}' não existe no produto {}; baixa de estoque ignorada",
                        item.size,
                        product.id
                    );
                }
            }
        }
        Ok(())
    }
}

// Trava as linhas de produto sempre na mesma ordem (por id). Dois pedidos
// simultâneos com os mesmos produtos em ordem trocada esperariam um pelo
// outro em cruz e o Postgres abortaria um deles.
fn items_in_lock_order(items: &[CartLineItem]) -> Vec<&CartLineItem> {
    let mut ordered: Vec<&CartLineItem> = items.iter().collect();
    ordered.sort_by_key(|item| item.product_id);
    ordered
}

// Monta a requisição do gateway a partir do carrinho. Puro: os testes cobrem
// o total e a recusa de carrinho vazio sem precisar de banco nem de rede.
pub fn build_intent_request(
    items: &[CartLineItem],
    shipping_info: &ShippingInfo,
    currency: Currency,
) -> Result<(CreateIntentRequest, Decimal), AppError> {
    if items.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let total: Decimal = items.iter().map(|item| item.line_total(currency)).sum();
    let quantity: i32 = items.iter().map(|item| item.quantity).sum();

    let request = CreateIntentRequest {
        amount_minor: to_minor_units(total)?,
        currency,
        receipt_email: Some(shipping_info.email.clone()),
        description: Some(format!("Pedido de {} artículo(s)", quantity)),
    };
    Ok((request, total))
}

// Valida o fechamento e monta o snapshot do pedido. Função pura: nenhum
// banco, nenhum gateway. A regra de ouro mora aqui: sem pagamento aprovado
// ("succeeded"), nenhum pedido é criado.
pub fn prepare_order(
    payload: SubmitOrderPayload,
    default_country: &str,
) -> Result<NewOrder, AppError> {
    let payment_status = payload.payment_intent_status.unwrap_or_default();
    if payment_status != PAYMENT_STATUS_SUCCEEDED {
        return Err(AppError::PaymentNotConfirmed(payment_status));
    }

    let items = payload.items.unwrap_or_default();
    if items.is_empty() {
        return Err(AppError::EmptyCart);
    }
    // Quantidade zero ou negativa inverteria o total e a baixa de estoque.
    if items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::InvalidItemQuantity);
    }

    let mut shipping_info = payload.shipping_info.unwrap_or_default();
    shipping_info.normalize(default_country);

    let currency = payload.currency.unwrap_or_default();
    let total: Decimal = items.iter().map(|item| item.line_total(currency)).sum();

    let email_cliente = payload
        .email_cliente
        .map(|e| e.trim().to_string())
        .unwrap_or_default();

    Ok(NewOrder {
        items,
        shipping_info,
        email_cliente,
        total,
        currency,
        payment_intent_id: payload.payment_intent_id.unwrap_or_default(),
        payment_status,
        status: OrderStatus::EnProceso,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;

    fn item(price_uyu: i64, price_usd: i64, quantity: i32) -> CartLineItem {
        CartLineItem {
            product_id: Uuid::new_v4(),
            size: "M".to_string(),
            custom_name: None,
            custom_number: None,
            options: None,
            quantity,
            name: "Camiseta Nacional 2025".to_string(),
            image: None,
            unit_price: Decimal::new(price_uyu, 0),
            unit_price_usd: Decimal::new(price_usd, 0),
        }
    }

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            name: "Juan Pérez".to_string(),
            address: "Av. 18 de Julio 1234".to_string(),
            address_extra: None,
            city: "Montevideo".to_string(),
            state: "Montevideo".to_string(),
            postal_code: "11200".to_string(),
            phone: "59899123456".to_string(),
            email: "juan@example.com".to_string(),
            country: None,
            lat: None,
            lng: None,
        }
    }

    fn payload(status: &str, items: Vec<CartLineItem>) -> SubmitOrderPayload {
        SubmitOrderPayload {
            items: Some(items),
            shipping_info: Some(shipping()),
            email_cliente: Some("juan@example.com".to_string()),
            payment_intent_id: Some("pi_test_123".to_string()),
            payment_intent_status: Some(status.to_string()),
            currency: Some(Currency::Uyu),
        }
    }

    #[test]
    fn order_requires_succeeded_payment() {
        for status in ["processing", "requires_payment_method", "canceled", ""] {
            let result = prepare_order(payload(status, vec![item(1990, 49, 1)]), "Uruguay");
            match result {
                Err(AppError::PaymentNotConfirmed(s)) => assert_eq!(s, status),
                other => panic!("esperava PaymentNotConfirmed, veio {:?}", other),
            }
        }
    }

    #[test]
    fn succeeded_payment_creates_en_proceso_order() {
        let order = prepare_order(payload("succeeded", vec![item(1990, 49, 2)]), "Uruguay").unwrap();
        assert_eq!(order.status, OrderStatus::EnProceso);
        assert_eq!(order.payment_intent_id, "pi_test_123");
        assert_eq!(order.payment_status, "succeeded");
    }

    #[test]
    fn empty_cart_is_rejected_even_with_payment() {
        let result = prepare_order(payload("succeeded", Vec::new()), "Uruguay");
        assert!(matches!(result, Err(AppError::EmptyCart)));
    }

    #[test]
    fn non_positive_quantity_is_rejected_even_with_payment() {
        // Quantidade negativa viraria total negativo e REPOSIÇÃO de estoque.
        for quantity in [-3, 0] {
            let result = prepare_order(
                payload("succeeded", vec![item(1990, 49, 1), item(1990, 49, quantity)]),
                "Uruguay",
            );
            assert!(
                matches!(result, Err(AppError::InvalidItemQuantity)),
                "quantidade {} deveria reprovar",
                quantity
            );
        }
    }

    #[test]
    fn total_sums_price_times_quantity_per_currency() {
        let items = vec![item(1990, 49, 2), item(2490, 59, 1)];

        let order = prepare_order(payload("succeeded", items.clone()), "Uruguay").unwrap();
        assert_eq!(order.total, Decimal::new(1990 * 2 + 2490, 0));

        let mut in_usd = payload("succeeded", items);
        in_usd.currency = Some(Currency::Usd);
        let order_usd = prepare_order(in_usd, "Uruguay").unwrap();
        assert_eq!(order_usd.total, Decimal::new(49 * 2 + 59, 0));
    }

    #[test]
    fn email_cliente_is_trimmed_into_the_snapshot() {
        let mut with_spaces = payload("succeeded", vec![item(1990, 49, 1)]);
        with_spaces.email_cliente = Some("  otro@example.com  ".to_string());
        let order = prepare_order(with_spaces, "Uruguay").unwrap();
        assert_eq!(order.email_cliente, "otro@example.com");
    }

    #[test]
    fn lock_order_is_sorted_by_product_id() {
        let mut items = vec![item(1990, 49, 1), item(2490, 59, 1), item(990, 29, 1)];
        items.sort_by_key(|i| i.product_id);
        items.reverse(); // pior caso: chega em ordem decrescente

        let ordered = items_in_lock_order(&items);
        assert!(ordered.windows(2).all(|w| w[0].product_id <= w[1].product_id));
        assert_eq!(ordered.len(), items.len());
    }

    #[test]
    fn intent_request_uses_server_side_total() {
        let items = vec![item(1990, 49, 2)];
        let (request, total) =
            build_intent_request(&items, &shipping(), Currency::Uyu).unwrap();

        assert_eq!(total, Decimal::new(3980, 0));
        assert_eq!(request.amount_minor, 398_000);
        assert_eq!(request.receipt_email.as_deref(), Some("juan@example.com"));
    }

    #[test]
    fn intent_request_rejects_empty_cart() {
        let result = build_intent_request(&[], &shipping(), Currency::Uyu);
        assert!(matches!(result, Err(AppError::EmptyCart)));
    }
}
