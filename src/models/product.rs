// src/models/product.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- 1. Produto do catálogo ---
// `stock` é um mapa talle -> unidades ("S", "M", "L", "XL"...), persistido
// como JSONB. BTreeMap para a resposta sair sempre na mesma ordem.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_uyu: Decimal,
    pub price_usd: Decimal,
    #[sqlx(json)]
    pub stock: BTreeMap<String, i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Baixa de estoque de um talle. Nunca deixa o valor negativo: vender mais do
// que havia registrado zera o talle em vez de quebrar o fluxo do pedido.
// Quantidade não positiva não mexe no saldo; esta função só baixa estoque,
// nunca repõe. Retorna o saldo novo, ou None quando o talle não existe.
pub fn decrement_stock(stock: &mut BTreeMap<String, i32>, size: &str, quantity: i32) -> Option<i32> {
    let current = stock.get_mut(size)?;
    *current = (*current - quantity.max(0)).max(0);
    Some(*current)
}

// --- 2. Payloads do back-office ---
// O padrão Option + #[validate(required)] devolve 400 com detalhe por campo
// em vez de 422 do extrator quando o JSON vem incompleto.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(required(message = "O nome do produto é obrigatório."))]
    #[validate(length(min = 1, message = "O nome do produto é obrigatório."))]
    #[schema(example = "Camiseta Nacional 2025")]
    pub name: Option<String>,

    pub description: Option<String>,
    pub image_url: Option<String>,

    #[validate(required(message = "O preço em pesos é obrigatório."))]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 1990.0)]
    pub price_uyu: Option<Decimal>,

    #[validate(required(message = "O preço em dólares é obrigatório."))]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 49.9)]
    pub price_usd: Option<Decimal>,

    // Estoque inicial por talle; ausente começa zerado.
    #[validate(custom(function = "validate_stock_map"))]
    pub stock: Option<BTreeMap<String, i32>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "O nome do produto é obrigatório."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub price_uyu: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub price_usd: Option<Decimal>,
    pub active: Option<bool>,
}

// Reposição manual: substitui o saldo dos talles informados, sem tocar nos
// demais. Valores absolutos, não deltas.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStockPayload {
    #[validate(required(message = "O mapa de estoque é obrigatório."))]
    #[validate(custom(function = "validate_stock_map"))]
    pub stock: Option<BTreeMap<String, i32>>,
}

fn validate_not_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        let mut err = ValidationError::new("not_negative");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_stock_map(stock: &BTreeMap<String, i32>) -> Result<(), ValidationError> {
    if stock.values().any(|qty| *qty < 0) {
        let mut err = ValidationError::new("stock_negative");
        err.message = Some("O estoque não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_sml() -> BTreeMap<String, i32> {
        BTreeMap::from([
            ("S".to_string(), 5),
            ("M".to_string(), 2),
            ("L".to_string(), 0),
        ])
    }

    #[test]
    fn decrement_reduces_the_right_size() {
        let mut stock = stock_sml();
        assert_eq!(decrement_stock(&mut stock, "S", 3), Some(2));
        assert_eq!(stock["S"], 2);
        assert_eq!(stock["M"], 2); // os outros talles não mudam
    }

    #[test]
    fn decrement_floors_at_zero() {
        let mut stock = stock_sml();
        assert_eq!(decrement_stock(&mut stock, "M", 10), Some(0));
        assert_eq!(stock["M"], 0);
    }

    #[test]
    fn decrement_with_non_positive_quantity_never_restocks() {
        let mut stock = stock_sml();
        assert_eq!(decrement_stock(&mut stock, "S", -3), Some(5));
        assert_eq!(stock["S"], 5); // saldo intacto, nunca cresce
        assert_eq!(decrement_stock(&mut stock, "S", 0), Some(5));
    }

    #[test]
    fn decrement_unknown_size_returns_none() {
        let mut stock = stock_sml();
        assert_eq!(decrement_stock(&mut stock, "XXL", 1), None);
        assert_eq!(stock, stock_sml()); // mapa intacto
    }

    #[test]
    fn negative_prices_are_rejected() {
        let payload = CreateProductPayload {
            name: Some("Camiseta".to_string()),
            description: None,
            image_url: None,
            price_uyu: Some(Decimal::new(-1, 0)),
            price_usd: Some(Decimal::new(40, 0)),
            stock: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn negative_stock_is_rejected() {
        let payload = UpdateStockPayload {
            stock: Some(BTreeMap::from([("S".to_string(), -3)])),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn negative_initial_stock_is_rejected_on_create() {
        let payload = CreateProductPayload {
            name: Some("Camiseta".to_string()),
            description: None,
            image_url: None,
            price_uyu: Some(Decimal::new(1990, 0)),
            price_usd: Some(Decimal::new(49, 0)),
            stock: Some(BTreeMap::from([("S".to_string(), -5)])),
        };
        assert!(payload.validate().is_err());

        let mut valid = CreateProductPayload {
            name: Some("Camiseta".to_string()),
            description: None,
            image_url: None,
            price_uyu: Some(Decimal::new(1990, 0)),
            price_usd: Some(Decimal::new(49, 0)),
            stock: Some(BTreeMap::from([("S".to_string(), 5)])),
        };
        assert!(valid.validate().is_ok());
        valid.stock = None; // estoque inicial é opcional
        assert!(valid.validate().is_ok());
    }
}
