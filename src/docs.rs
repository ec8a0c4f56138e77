// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Catálogo ---
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::admin_list_products,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::set_product_stock,

        // --- Carrinho ---
        handlers::cart::get_cart,
        handlers::cart::add_to_cart,
        handlers::cart::update_cart_item,
        handlers::cart::remove_cart_item,
        handlers::cart::clear_cart,
        handlers::cart::merge_cart,

        // --- Checkout ---
        handlers::checkout::create_payment_intent,

        // --- Pedidos ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order_status,
        handlers::orders::delete_order,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Catálogo ---
            models::product::Product,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,
            models::product::UpdateStockPayload,

            // --- Carrinho ---
            models::cart::Cart,
            models::cart::CartLineItem,
            models::cart::AddItemPayload,
            models::cart::CartItemPatch,
            handlers::cart::MergeCartPayload,

            // --- Pedidos ---
            models::order::Currency,
            models::order::OrderStatus,
            models::order::ShippingInfo,
            models::order::Order,
            models::order::CheckoutPayload,
            models::order::SubmitOrderPayload,
            handlers::checkout::CheckoutResponse,
            handlers::orders::UpdateOrderStatusPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Catálogo", description = "Produtos e Estoque por Talle"),
        (name = "Carrinho", description = "Carrinho de Compras (conta e visitante)"),
        (name = "Checkout", description = "Pagamento via Gateway"),
        (name = "Pedidos", description = "Fechamento e Gestão de Pedidos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
