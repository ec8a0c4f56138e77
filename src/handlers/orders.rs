// src/handlers/orders.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::MaybeCartIdentity,
    models::order::{Order, OrderStatus, SubmitOrderPayload},
};

// Fecha o pedido. Rota pública: visitante compra sem conta. A regra dura
// mora no serviço: sem paymentIntentStatus "succeeded" nada é gravado.
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Pedidos",
    request_body = SubmitOrderPayload,
    params(("X-Session-Id" = Option<Uuid>, Header, description = "Identidade do visitante sem conta")),
    responses(
        (status = 201, description = "Pedido registrado", body = Order),
        (status = 400, description = "Pagamento não confirmado, carrinho vazio ou dados inválidos")
    )
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    MaybeCartIdentity(owner): MaybeCartIdentity,
    Json(payload): Json<SubmitOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let order = app_state
        .order_service
        .submit_order(owner.as_ref(), payload)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

// --- Back-office (rotas sob /api/admin, guardadas pelo admin_middleware) ---

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "Pedidos",
    responses(
        (status = 200, description = "Todos os pedidos, mais recente primeiro", body = [Order]),
        (status = 403, description = "Requer perfil de administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = app_state.order_service.list_orders().await?;
    Ok(Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    tag = "Pedidos",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Detalhe do pedido", body = Order),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = app_state.order_service.get_order(id).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusPayload {
    #[validate(required(message = "O status é obrigatório."))]
    pub status: Option<OrderStatus>,
}

// Avança (ou cancela) o pedido. Transição fora da tabela responde 409.
#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    tag = "Pedidos",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = UpdateOrderStatusPayload,
    responses(
        (status = 200, description = "Pedido com o status novo", body = Order),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Transição de status inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusPayload>,
) -> Result<Json<Order>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let next = payload.status.unwrap_or(OrderStatus::EnProceso);
    let order = app_state.order_service.update_status(id, next).await?;
    Ok(Json(order))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    tag = "Pedidos",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 204, description = "Pedido removido"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.order_service.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
