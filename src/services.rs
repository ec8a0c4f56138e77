pub mod auth;
pub use auth::AuthService;
pub mod payments;
pub use payments::{PaymentGateway, StripeGateway};
pub mod cart_service;
pub use cart_service::CartService;
pub mod order_service;
pub use order_service::OrderService;
