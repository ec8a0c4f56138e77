// src/handlers/checkout.rs

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CartIdentity,
    models::order::{CheckoutPayload, Currency},
};

// O que o front precisa para abrir o formulário de pagamento do gateway.
// `amount` é informativo; quem manda é o valor congelado no intent.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: Currency,
}

// Passo 1 do checkout. O total sai do carrinho GUARDADO no servidor; o valor
// que o cliente exibia na tela não entra na conta.
#[utoipa::path(
    post,
    path = "/api/checkout/payment-intent",
    tag = "Checkout",
    request_body = CheckoutPayload,
    params(("X-Session-Id" = Option<Uuid>, Header, description = "Identidade do visitante sem conta")),
    responses(
        (status = 200, description = "Intent criado no gateway", body = CheckoutResponse),
        (status = 400, description = "Dados de envio inválidos ou carrinho vazio"),
        (status = 502, description = "Falha no gateway de pagamento")
    )
)]
pub async fn create_payment_intent(
    State(app_state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Json(payload): Json<CheckoutPayload>,
) -> Result<Json<CheckoutResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let mut shipping_info = payload.shipping_info.unwrap_or_default();
    shipping_info.normalize(&app_state.default_country);
    let currency = payload.currency.unwrap_or_default();

    let prepared = app_state
        .order_service
        .create_payment_intent(&owner, &shipping_info, currency)
        .await?;

    Ok(Json(CheckoutResponse {
        payment_intent_id: prepared.intent.id,
        client_secret: prepared.intent.client_secret,
        amount: prepared.total,
        currency: prepared.currency,
    }))
}
