// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::cart::CartLineItem;

// Sentinela do gateway: só persistimos pedido com este status de pagamento.
pub const PAYMENT_STATUS_SUCCEEDED: &str = "succeeded";

// --- 1. Moeda ---
// A loja publica preço em pesos e em dólares; o total do pedido é calculado
// na moeda escolhida no checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Uyu,
    Usd,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Currency::Uyu => "UYU",
            Currency::Usd => "USD",
        }
    }
}

// --- 2. Status do pedido ---
// Os valores persistidos/expostos são os rótulos em espanhol que a vitrine
// sempre mostrou ("En Proceso", "Pagado", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status")]
pub enum OrderStatus {
    #[sqlx(rename = "En Proceso")]
    #[serde(rename = "En Proceso")]
    EnProceso,
    #[sqlx(rename = "Pagado")]
    #[serde(rename = "Pagado")]
    Pagado,
    #[sqlx(rename = "Enviado")]
    #[serde(rename = "Enviado")]
    Enviado,
    #[sqlx(rename = "Entregado")]
    #[serde(rename = "Entregado")]
    Entregado,
    #[sqlx(rename = "Cancelado")]
    #[serde(rename = "Cancelado")]
    Cancelado,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::EnProceso => "En Proceso",
            OrderStatus::Pagado => "Pagado",
            OrderStatus::Enviado => "Enviado",
            OrderStatus::Entregado => "Entregado",
            OrderStatus::Cancelado => "Cancelado",
        }
    }

    // Tabela explícita de transições do back-office.
    // "Entregado" e "Cancelado" são terminais.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (EnProceso, Pagado)
                | (EnProceso, Enviado)
                | (EnProceso, Cancelado)
                | (Pagado, Enviado)
                | (Pagado, Cancelado)
                | (Enviado, Entregado)
                | (Enviado, Cancelado)
        )
    }
}

// --- 3. Dados de envio ---
// Campos obrigatórios precisam ser não-vazios DEPOIS do trim; e-mail e
// telefone passam por checagem de formato. Predicado puro, sem efeitos.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Juan Pérez")]
    pub name: String,

    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Av. 18 de Julio 1234")]
    pub address: String,

    pub address_extra: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Montevideo")]
    pub city: String,

    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Montevideo")]
    pub state: String,

    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "11200")]
    pub postal_code: String,

    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "59899123456")]
    pub phone: String,

    #[validate(email(message = "O e-mail de envio é inválido."))]
    #[schema(example = "juan@example.com")]
    pub email: String,

    // Preenchido na normalização quando o cliente não informa.
    pub country: Option<String>,

    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl ShippingInfo {
    // Única etapa de defaulting: trim em tudo e país padrão da configuração.
    // Roda antes de validar/persistir, nunca espalhado pelos handlers.
    pub fn normalize(&mut self, default_country: &str) {
        for field in [
            &mut self.name,
            &mut self.address,
            &mut self.city,
            &mut self.state,
            &mut self.postal_code,
            &mut self.phone,
            &mut self.email,
        ] {
            *field = field.trim().to_string();
        }
        if let Some(extra) = &self.address_extra {
            let extra = extra.trim();
            self.address_extra = if extra.is_empty() { None } else { Some(extra.to_string()) };
        }
        let country_ok = self
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self.country = Some(country_ok.unwrap_or_else(|| default_country.to_string()));
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("O campo é obrigatório.".into());
        return Err(err);
    }
    Ok(())
}

// Telefone: somente dígitos, entre 8 e 15 (cobre "099123456" e "59899123456").
fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits_only = value.chars().all(|c| c.is_ascii_digit());
    if !digits_only || !(8..=15).contains(&value.len()) {
        let mut err = ValidationError::new("phone");
        err.message = Some("O telefone deve ter entre 8 e 15 dígitos.".into());
        return Err(err);
    }
    Ok(())
}

// --- 4. O pedido persistido ---
// Snapshot imutável: itens e preços são copiados do carrinho no momento da
// compra e nunca acompanham mudanças posteriores do catálogo. Só `status`
// se move, pelas transições acima.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[sqlx(json)]
    pub items: Vec<CartLineItem>,
    #[sqlx(json)]
    pub shipping_info: ShippingInfo,
    pub email_cliente: String,
    pub total: Decimal,
    pub currency: Currency,
    pub payment_intent_id: String,
    pub payment_status: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Saída pura de `prepare_order`: tudo que o INSERT precisa, com o total já
// recalculado no servidor.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<CartLineItem>,
    pub shipping_info: ShippingInfo,
    pub email_cliente: String,
    pub total: Decimal,
    pub currency: Currency,
    pub payment_intent_id: String,
    pub payment_status: String,
    pub status: OrderStatus,
}

// --- 5. Payloads do checkout ---

// Criação do intent de pagamento: endereço completo + moeda escolhida.
// O valor NUNCA vem do cliente; é calculado do carrinho guardado no servidor.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    #[validate(required(message = "Os dados de envio são obrigatórios."), nested)]
    pub shipping_info: Option<ShippingInfo>,

    // Ausente vale UYU.
    pub currency: Option<Currency>,
}

// Fechamento do pedido, enviado depois que o gateway confirma o pagamento.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderPayload {
    #[validate(required(message = "A lista de itens é obrigatória."))]
    pub items: Option<Vec<CartLineItem>>,

    #[validate(required(message = "Os dados de envio são obrigatórios."), nested)]
    pub shipping_info: Option<ShippingInfo>,

    #[validate(required(message = "O e-mail do cliente é obrigatório."))]
    #[validate(email(message = "O e-mail do cliente é inválido."))]
    pub email_cliente: Option<String>,

    #[validate(required(message = "O id do pagamento é obrigatório."))]
    #[validate(length(min = 1, message = "O id do pagamento é obrigatório."))]
    pub payment_intent_id: Option<String>,

    #[validate(required(message = "O status do pagamento é obrigatório."))]
    pub payment_intent_status: Option<String>,

    pub currency: Option<Currency>,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn full_record_passes_validation() {
        assert!(shipping().validate().is_ok());
    }

    #[test]
    fn any_blank_required_field_fails() {
        for field in 0..6 {
            let mut data = shipping();
            match field {
                0 => data.name = "  ".to_string(),
                1 => data.address = String::new(),
                2 => data.city = String::new(),
                3 => data.state = "   ".to_string(),
                4 => data.postal_code = String::new(),
                _ => data.phone = String::new(),
            }
            assert!(data.validate().is_err(), "campo {} deveria reprovar", field);
        }
    }

    #[test]
    fn email_format_is_checked() {
        let mut data = shipping();
        data.email = "not-an-email".to_string();
        assert!(data.validate().is_err());

        data.email = "a@b.com".to_string();
        assert!(data.validate().is_ok());
    }

    #[test]
    fn phone_must_be_8_to_15_digits() {
        let mut data = shipping();
        data.phone = "123".to_string();
        assert!(data.validate().is_err());

        data.phone = "59899123456".to_string();
        assert!(data.validate().is_ok());

        data.phone = "099 123 456".to_string(); // espaço não é dígito
        assert!(data.validate().is_err());

        data.phone = "1234567890123456".to_string(); // 16 dígitos
        assert!(data.validate().is_err());
    }

    #[test]
    fn normalize_trims_and_defaults_country() {
        let mut data = shipping();
        data.name = "  Juan Pérez  ".to_string();
        data.address_extra = Some("   ".to_string());
        data.normalize("Uruguay");

        assert_eq!(data.name, "Juan Pérez");
        assert_eq!(data.address_extra, None);
        assert_eq!(data.country.as_deref(), Some("Uruguay"));

        // país informado não é sobrescrito
        let mut with_country = shipping();
        with_country.country = Some("Argentina".to_string());
        with_country.normalize("Uruguay");
        assert_eq!(with_country.country.as_deref(), Some("Argentina"));
    }

    #[test]
    fn submit_payload_requires_email_cliente() {
        let mut payload = SubmitOrderPayload {
            items: Some(Vec::new()),
            shipping_info: Some(shipping()),
            email_cliente: None,
            payment_intent_id: Some("pi_test_123".to_string()),
            payment_intent_status: Some("succeeded".to_string()),
            currency: None,
        };
        assert!(payload.validate().is_err());

        payload.email_cliente = Some("juan@example.com".to_string());
        assert!(payload.validate().is_ok());

        payload.email_cliente = Some("not-an-email".to_string());
        assert!(payload.validate().is_err());
    }

    #[test]
    fn delivered_and_cancelled_are_terminal() {
        use OrderStatus::*;
        for next in [EnProceso, Pagado, Enviado, Entregado, Cancelado] {
            assert!(!Entregado.can_transition_to(next));
            assert!(!Cancelado.can_transition_to(next));
        }
    }

    #[test]
    fn valid_flow_en_proceso_to_entregado() {
        use OrderStatus::*;
        assert!(EnProceso.can_transition_to(Pagado));
        assert!(Pagado.can_transition_to(Enviado));
        assert!(Enviado.can_transition_to(Entregado));
        // pular direto para Entregado não é permitido
        assert!(!EnProceso.can_transition_to(Entregado));
        assert!(!Pagado.can_transition_to(Entregado));
    }
}
