pub mod auth;
pub use auth::{AuthenticatedUser, CartIdentity, MaybeCartIdentity};
