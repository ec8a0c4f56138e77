// src/handlers/products.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::product::{CreateProductPayload, Product, UpdateProductPayload, UpdateStockPayload},
};

// A vitrine: só produtos ativos.
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catálogo",
    responses(
        (status = 200, description = "Produtos ativos do catálogo", body = [Product])
    )
)]
pub async fn list_products(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = app_state.product_repo.list_active().await?;
    Ok(Json(products))
}

// Página do produto. Produto desativado não existe para a vitrine.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Catálogo",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Detalhe do produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = app_state
        .product_repo
        .find_by_id(id)
        .await?
        .filter(|p| p.active)
        .ok_or(AppError::ProductNotFound)?;
    Ok(Json(product))
}

// --- Back-office (rotas sob /api/admin, guardadas pelo admin_middleware) ---

#[utoipa::path(
    get,
    path = "/api/admin/products",
    tag = "Catálogo",
    responses(
        (status = 200, description = "Catálogo completo, inclusive desativados", body = [Product]),
        (status = 403, description = "Requer perfil de administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn admin_list_products(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = app_state.product_repo.list_all().await?;
    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    tag = "Catálogo",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state.product_repo.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/products/{id}",
    tag = "Catálogo",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state
        .product_repo
        .update(id, &payload)
        .await?
        .ok_or(AppError::ProductNotFound)?;
    Ok(Json(product))
}

// Reposição de estoque: substitui o saldo dos talles informados e preserva
// os demais.
#[utoipa::path(
    put,
    path = "/api/admin/products/{id}/stock",
    tag = "Catálogo",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateStockPayload,
    responses(
        (status = 200, description = "Estoque atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_product_stock(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStockPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let mut tx = app_state.db_pool.begin().await?;
    let mut product = app_state
        .product_repo
        .find_for_update(&mut *tx, id)
        .await?
        .ok_or(AppError::ProductNotFound)?;

    for (size, quantity) in payload.stock.unwrap_or_default() {
        product.stock.insert(size, quantity);
    }

    let product = app_state
        .product_repo
        .set_stock(&mut *tx, id, &product.stock)
        .await?
        .ok_or(AppError::ProductNotFound)?;
    tx.commit().await?;

    Ok(Json(product))
}
