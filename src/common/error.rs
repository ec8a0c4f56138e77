use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante corresponde a uma categoria da taxonomia de erros da API:
// validação (400), pagamento não confirmado (400), conflito (409),
// não encontrado (404), autenticação (401/403) e infraestrutura (5xx).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Payload bem formado, mas o sinal de pagamento não habilita a persistência.
    // Nunca criamos um pedido sem `paymentIntentStatus == "succeeded"`.
    #[error("Pagamento não confirmado")]
    PaymentNotConfirmed(String),

    #[error("Carrinho vazio")]
    EmptyCart,

    // Item de pedido com quantidade zero ou negativa. Aceitar isso
    // inverteria a baixa de estoque e o total do pedido.
    #[error("Quantidade de item inválida")]
    InvalidItemQuantity,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Pedido não encontrado")]
    OrderNotFound,

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // Rota de back-office acessada por um usuário sem `is_admin`.
    #[error("Acesso restrito a administradores")]
    AdminOnly,

    // Nenhuma identidade na requisição (nem Bearer, nem X-Session-Id).
    #[error("Identidade ausente")]
    MissingIdentity,

    #[error("Erro no gateway de pagamento: {0}")]
    PaymentGatewayError(String),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::PaymentNotConfirmed(status_recebido) => {
                let body = Json(json!({
                    "error": "O pagamento não foi confirmado; o pedido não foi criado.",
                    "paymentIntentStatus": status_recebido,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::EmptyCart => (StatusCode::BAD_REQUEST, "O carrinho está vazio.".to_string()),
            AppError::InvalidItemQuantity => (
                StatusCode::BAD_REQUEST,
                "Todos os itens precisam de quantidade maior que zero.".to_string(),
            ),
            AppError::ProductNotFound => (StatusCode::NOT_FOUND, "Produto não encontrado.".to_string()),
            AppError::OrderNotFound => (StatusCode::NOT_FOUND, "Pedido não encontrado.".to_string()),
            AppError::InvalidStatusTransition { from, to } => (
                StatusCode::CONFLICT,
                format!("Transição de status inválida: '{}' -> '{}'.", from, to),
            ),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.".to_string()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string()),
            AppError::AdminOnly => (StatusCode::FORBIDDEN, "Acesso restrito a administradores.".to_string()),
            AppError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                "Envie um token Bearer ou o cabeçalho X-Session-Id.".to_string(),
            ),
            AppError::PaymentGatewayError(ref detalhe) => {
                tracing::error!("Falha no gateway de pagamento: {}", detalhe);
                (
                    StatusCode::BAD_GATEWAY,
                    "O gateway de pagamento não respondeu como esperado.".to_string(),
                )
            }

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
