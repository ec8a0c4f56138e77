// src/handlers/cart.rs

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, CartIdentity},
    models::cart::{AddItemPayload, Cart, CartItemPatch},
};

// O carrinho do chamador: conta logada (Bearer) ou visitante (X-Session-Id).
// Quem nunca gravou nada recebe um carrinho vazio, sem criar linha no banco.
#[utoipa::path(
    get,
    path = "/api/cart",
    tag = "Carrinho",
    params(("X-Session-Id" = Option<Uuid>, Header, description = "Identidade do visitante sem conta")),
    responses(
        (status = 200, description = "Carrinho atual", body = Cart),
        (status = 401, description = "Sem identidade de carrinho")
    )
)]
pub async fn get_cart(
    State(app_state): State<AppState>,
    CartIdentity(owner): CartIdentity,
) -> Result<Json<Cart>, AppError> {
    let cart = app_state.cart_service.load(&owner).await?;
    Ok(Json(cart))
}

// Adiciona um item. Item com a mesma identidade (produto, talle e
// personalização) soma quantidades em vez de duplicar linha.
#[utoipa::path(
    post,
    path = "/api/cart/items",
    tag = "Carrinho",
    request_body = AddItemPayload,
    params(("X-Session-Id" = Option<Uuid>, Header, description = "Identidade do visitante sem conta")),
    responses(
        (status = 200, description = "Carrinho com o item somado", body = Cart),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn add_to_cart(
    State(app_state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Json(payload): Json<AddItemPayload>,
) -> Result<Json<Cart>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let cart = app_state.cart_service.add_item(&owner, payload).await?;
    Ok(Json(cart))
}

// Edita TODOS os itens com o par (produto, talle). Quantidade <= 0 remove.
#[utoipa::path(
    patch,
    path = "/api/cart/items/{product_id}/{size}",
    tag = "Carrinho",
    params(
        ("product_id" = Uuid, Path, description = "ID do produto"),
        ("size" = String, Path, description = "Talle")
    ),
    request_body = CartItemPatch,
    responses(
        (status = 200, description = "Carrinho atualizado", body = Cart)
    )
)]
pub async fn update_cart_item(
    State(app_state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Path((product_id, size)): Path<(Uuid, String)>,
    Json(patch): Json<CartItemPatch>,
) -> Result<Json<Cart>, AppError> {
    let cart = app_state
        .cart_service
        .update_item(&owner, product_id, &size, &patch)
        .await?;
    Ok(Json(cart))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}/{size}",
    tag = "Carrinho",
    params(
        ("product_id" = Uuid, Path, description = "ID do produto"),
        ("size" = String, Path, description = "Talle")
    ),
    responses(
        (status = 200, description = "Carrinho sem os itens removidos", body = Cart)
    )
)]
pub async fn remove_cart_item(
    State(app_state): State<AppState>,
    CartIdentity(owner): CartIdentity,
    Path((product_id, size)): Path<(Uuid, String)>,
) -> Result<Json<Cart>, AppError> {
    let cart = app_state
        .cart_service
        .remove_item(&owner, product_id, &size)
        .await?;
    Ok(Json(cart))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    tag = "Carrinho",
    responses(
        (status = 200, description = "Carrinho esvaziado", body = Cart)
    )
)]
pub async fn clear_cart(
    State(app_state): State<AppState>,
    CartIdentity(owner): CartIdentity,
) -> Result<Json<Cart>, AppError> {
    let cart = app_state.cart_service.clear(&owner).await?;
    Ok(Json(cart))
}

// Fusão pós-login: o carrinho que o visitante montou entra no da conta.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartPayload {
    #[validate(required(message = "O id de sessão é obrigatório."))]
    pub session_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/cart/merge",
    tag = "Carrinho",
    request_body = MergeCartPayload,
    responses(
        (status = 200, description = "Carrinho da conta já com os itens do visitante", body = Cart),
        (status = 401, description = "Requer login")
    ),
    security(("api_jwt" = []))
)]
pub async fn merge_cart(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<MergeCartPayload>,
) -> Result<Json<Cart>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let session_id = payload.session_id.unwrap_or_default();
    let cart = app_state
        .cart_service
        .merge_into_user(user.id, session_id)
        .await?;
    Ok(Json(cart))
}
