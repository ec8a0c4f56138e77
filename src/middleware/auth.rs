// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::User,
    models::cart::CartOwner,
};

// Visitante sem conta se identifica por um UUID estável que o front guarda
// e repete neste header.
pub const SESSION_HEADER: &str = "X-Session-Id";

// O middleware em si: exige um Bearer token válido
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();
    let auth_header = headers.get("Authorization").and_then(|value| value.to_str().ok());

    if let Some(auth_header) = auth_header {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            let user = app_state.auth_service.validate_token(token).await?;

            // Insere o usuário nos "extensions" da requisição
            request.extensions_mut().insert(user);
            return Ok(next.run(request).await);
        }
    }

    Err(AppError::InvalidToken)
}

// Variante do back-office: além do token válido, exige a flag is_admin.
pub async fn admin_middleware(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();
    let auth_header = headers.get("Authorization").and_then(|value| value.to_str().ok());

    if let Some(auth_header) = auth_header {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            let user = app_state.auth_service.validate_token(token).await?;
            if !user.is_admin {
                return Err(AppError::AdminOnly);
            }

            request.extensions_mut().insert(user);
            return Ok(next.run(request).await);
        }
    }

    Err(AppError::InvalidToken)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

// Resolve o dono do carrinho direto nos handlers públicos, sem middleware:
// Bearer válido manda no carrinho da conta; senão vale o X-Session-Id.
// Token inválido é erro na hora, nunca rebaixamos para sessão anônima.
async fn identify(parts: &Parts, state: &AppState) -> Result<Option<CartOwner>, AppError> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok());

    if let Some(auth_header) = auth_header {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            let user = state.auth_service.validate_token(token).await?;
            return Ok(Some(CartOwner::User(user.id)));
        }
    }

    if let Some(raw) = parts.headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        let session_id = Uuid::parse_str(raw).map_err(|_| AppError::MissingIdentity)?;
        return Ok(Some(CartOwner::Session(session_id)));
    }

    Ok(None)
}

// Identidade obrigatória: as rotas do carrinho não funcionam sem saber de
// quem é o carrinho.
pub struct CartIdentity(pub CartOwner);

impl FromRequestParts<AppState> for CartIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        identify(parts, state)
            .await?
            .map(CartIdentity)
            .ok_or(AppError::MissingIdentity)
    }
}

// Identidade opcional: o fechamento de pedido aceita visitante sem header
// nenhum (o carrinho dele só não será apagado no servidor).
pub struct MaybeCartIdentity(pub Option<CartOwner>);

impl FromRequestParts<AppState> for MaybeCartIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeCartIdentity(identify(parts, state).await?))
    }
}
