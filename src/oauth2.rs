//! OAuth2 authorization server: trusted client registry, database-backed
//! token store and the `/login` and `/oauth/check_token` endpoints.

pub mod authentication;
pub mod client_authentication;
pub mod client_details;
pub mod endpoints;
pub mod error;
pub mod scope;
pub mod token_granter;
pub mod token_services;
pub mod token_store;
pub mod user_details;

pub use authentication::OAuth2Authentication;
pub use client_details::{ClientDetails, ClientRegistry, GrantType};
pub use endpoints::router;
pub use error::OAuth2Error;
pub use token_services::{IssuedToken, TokenLookup, TokenServices};
pub use token_store::TokenStore;

/// Token endpoint, remapped from the conventional `/oauth/token`
pub const TOKEN_ENDPOINT_PATH: &str = "/login";
pub const CHECK_TOKEN_ENDPOINT_PATH: &str = "/oauth/check_token";
