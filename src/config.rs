// src/config.rs

use std::sync::Arc;
use std::{env, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{CartRepository, OrderRepository, ProductRepository, UserRepository},
    services::{
        auth::AuthService, cart_service::CartService, order_service::OrderService,
        payments::PaymentGateway, payments::StripeGateway,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub cart_service: CartService,
    pub order_service: OrderService,
    // CRUD simples do catálogo fala direto com o repositório
    pub product_repo: ProductRepository,
    pub default_country: String,
    // Origem do navegador da vitrine; ausente libera tudo (só em dev).
    pub cors_allowed_origin: Option<String>,
}

impl AppState {
    // A assinatura retorna um Result: falha de configuração derruba o boot
    // com a causa, nunca com panic no meio do caminho.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let stripe_secret =
            env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY deve ser definida");
        let payment_api_url = env::var("PAYMENT_API_URL")
            .unwrap_or_else(|_| "https://api.stripe.com".to_string());
        let default_country =
            env::var("DEFAULT_COUNTRY").unwrap_or_else(|_| "Uruguay".to_string());
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let cart_repo = CartRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret);
        let cart_service =
            CartService::new(cart_repo.clone(), product_repo.clone(), db_pool.clone());

        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(StripeGateway::new(payment_api_url, stripe_secret));
        let order_service = OrderService::new(
            order_repo,
            product_repo.clone(),
            cart_repo,
            gateway,
            db_pool.clone(),
            default_country.clone(),
        );

        Ok(Self {
            db_pool,
            auth_service,
            cart_service,
            order_service,
            product_repo,
            default_country,
            cors_allowed_origin,
        })
    }
}
