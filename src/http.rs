//! Blocking HTTP client shared by the handshake and the realms session.

use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};

/// The user agent to be used on each HTTP request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Get a new client builder with a cookie store, the login flow relies on
/// cookies set by the authorization page.
pub fn builder() -> ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .timeout(Duration::from_secs(5))
}
