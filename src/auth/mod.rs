//! Authentication module
//!
//! The platform authenticates with short-lived bearer tokens that are minted
//! from a long-lived refresh token. [`TokenStore`] holds the live bearer
//! token for every task sharing a dispatcher and serializes refreshes so that
//! concurrent 401/406 responses trigger a single exchange.

mod token;
mod types;

pub use token::{RefreshTokenExchange, TokenSource, TokenStore, TOKEN_ACCESS_PATH};
pub use types::{CachedToken, TokenResponse};

#[cfg(test)]
mod tests;
