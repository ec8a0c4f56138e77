pub mod auth;
pub mod products;
pub mod cart;
pub mod checkout;
pub mod orders;
