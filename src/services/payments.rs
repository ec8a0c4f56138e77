// src/services/payments.rs

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{common::error::AppError, models::order::Currency};

// O serviço de pedidos fala com "um gateway de pagamento", não com o Stripe.
// O trait deixa os testes usarem um gateway de mentira sem rede.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: CreateIntentRequest)
        -> Result<PaymentIntent, AppError>;
}

#[derive(Debug, Clone)]
pub struct CreateIntentRequest {
    // Valor em unidades menores (centavos), como o gateway exige.
    pub amount_minor: i64,
    pub currency: Currency,
    pub receipt_email: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
}

// Converte o total (pesos/dólares com 2 casas) para centavos inteiros.
// Os preços do catálogo têm no máximo 2 casas, então não há arredondamento
// surpresa; mesmo assim o `round` fecha qualquer resto de cálculo.
pub fn to_minor_units(amount: Decimal) -> Result<i64, AppError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| anyhow::anyhow!("Total {} fora do intervalo do gateway", amount).into())
}

// --- Stripe ---
// Chama a API de PaymentIntents por formulário, autenticando com a chave
// secreta. A base é configurável para apontar para um simulador em homologação.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            secret_key,
        }
    }
}

// Corpo de erro do Stripe: {"error": {"message": "..."}}
#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, AppError> {
        let mut params: Vec<(&str, String)> = vec![
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.as_str().to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        if let Some(email) = &request.receipt_email {
            params.push(("receipt_email", email.clone()));
        }
        if let Some(description) = &request.description {
            params.push(("description", description.clone()));
        }

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::PaymentGatewayError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            // Tenta extrair a mensagem estruturada; se não der, usa o texto cru.
            let message = match response.json::<StripeErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("resposta {} do gateway", status),
            };
            return Err(AppError::PaymentGatewayError(message));
        }

        let intent = response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| AppError::PaymentGatewayError(e.to_string()))?;

        Ok(intent)
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Mutex;

    use super::*;

    // Gateway de mentira para os testes de serviço: devolve sempre o mesmo
    // intent e guarda as requisições recebidas.
    pub struct MockGateway {
        pub intent: PaymentIntent,
        pub requests: Mutex<Vec<CreateIntentRequest>>,
    }

    impl MockGateway {
        pub fn succeeding() -> Self {
            Self {
                intent: PaymentIntent {
                    id: "pi_test_123".to_string(),
                    client_secret: Some("pi_test_123_secret".to_string()),
                    status: "requires_payment_method".to_string(),
                },
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_intent(
            &self,
            request: CreateIntentRequest,
        ) -> Result<PaymentIntent, AppError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.intent.clone())
        }
    }

    #[test]
    fn minor_units_from_whole_prices() {
        assert_eq!(to_minor_units(Decimal::new(1990, 0)).unwrap(), 199_000);
        assert_eq!(to_minor_units(Decimal::new(4990, 2)).unwrap(), 4_990);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn minor_units_round_leftover_fractions() {
        // 10.005 -> 1000.5 centavos -> arredonda para o par mais próximo
        let amount = Decimal::new(10_005, 3);
        assert_eq!(to_minor_units(amount).unwrap(), 1_000);
    }

    #[tokio::test]
    async fn mock_gateway_records_the_request() {
        let gateway = MockGateway::succeeding();
        let intent = gateway
            .create_intent(CreateIntentRequest {
                amount_minor: 199_000,
                currency: Currency::Uyu,
                receipt_email: Some("juan@example.com".to_string()),
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(intent.id, "pi_test_123");
        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount_minor, 199_000);
    }
}
