//src/main.rs

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{admin_middleware, auth_middleware};

#[tokio::main]
async fn main() {
    // Logger primeiro; RUST_LOG controla o nível, "info" é o padrão.
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Lida com o Result retornado por AppState::new()
    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação; /me exige token válido
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route(
            "/me",
            get(handlers::auth::get_me).layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth_middleware,
            )),
        );

    // Vitrine pública
    let catalog_routes = Router::new()
        .route("/", get(handlers::products::list_products))
        .route("/{id}", get(handlers::products::get_product));

    // Carrinho: identidade resolvida por extrator (Bearer ou X-Session-Id);
    // só a fusão pós-login exige token.
    let cart_routes = Router::new()
        .route(
            "/",
            get(handlers::cart::get_cart).delete(handlers::cart::clear_cart),
        )
        .route("/items", post(handlers::cart::add_to_cart))
        .route(
            "/items/{product_id}/{size}",
            patch(handlers::cart::update_cart_item).delete(handlers::cart::remove_cart_item),
        )
        .route(
            "/merge",
            post(handlers::cart::merge_cart).layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth_middleware,
            )),
        );

    // Back-office inteiro atrás do admin_middleware
    let admin_routes = Router::new()
        .route(
            "/products",
            get(handlers::products::admin_list_products).post(handlers::products::create_product),
        )
        .route("/products/{id}", patch(handlers::products::update_product))
        .route(
            "/products/{id}/stock",
            put(handlers::products::set_product_stock),
        )
        .route("/orders", get(handlers::orders::list_orders))
        .route(
            "/orders/{id}",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route(
            "/orders/{id}/status",
            patch(handlers::orders::update_order_status),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            admin_middleware,
        ));

    // CORS restrito à origem da vitrine quando configurada; sem a variável
    // (ambiente de dev) aceita qualquer origem.
    let cors = match app_state.cors_allowed_origin.as_deref() {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .expect("CORS_ALLOWED_ORIGIN inválida"),
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/products", catalog_routes)
        .nest("/api/cart", cart_routes)
        .route(
            "/api/checkout/payment-intent",
            post(handlers::checkout::create_payment_intent),
        )
        .route("/api/orders", post(handlers::orders::create_order))
        .nest("/api/admin", admin_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
