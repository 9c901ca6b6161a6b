use std::fmt;

use crate::scrape::ScrapeError;

/// The handshake stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    IdentityLogin,
    BrokerExchange,
    TokenUpgrade,
    ServiceLogin,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Prepare => "login preparation",
            Stage::IdentityLogin => "microsoft login",
            Stage::BrokerExchange => "xbox live authentication",
            Stage::TokenUpgrade => "xsts authorization",
            Stage::ServiceLogin => "minecraft login",
        })
    }
}

/// What went wrong with a single HTTP exchange.
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    UnknownStatus(u16),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{} failed: {}", Stage::Prepare, .0)]
    PreparationFailed(#[source] RequestError),
    #[error("{} failed: {}", Stage::IdentityLogin, .0)]
    IdentityLoginFailed(#[source] RequestError),
    #[error("{} failed: {}", Stage::BrokerExchange, .0)]
    BrokerExchangeFailed(#[source] RequestError),
    #[error("{} failed: {}", Stage::TokenUpgrade, .0)]
    TokenUpgradeFailed(#[source] RequestError),
    #[error("{} failed: {}", Stage::ServiceLogin, .0)]
    ServiceLoginFailed(#[source] RequestError),
    #[error("failed to look up account: {0}")]
    AccountLookupFailed(#[source] RequestError),
    #[error("failed to query live players: {0}")]
    PresenceQueryFailed(#[source] RequestError),
    #[error("failed to send notification: {0}")]
    NotificationFailed(#[source] RequestError),
}

impl Error {
    /// The handshake stage this error comes from, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::PreparationFailed(_) => Some(Stage::Prepare),
            Error::IdentityLoginFailed(_) => Some(Stage::IdentityLogin),
            Error::BrokerExchangeFailed(_) => Some(Stage::BrokerExchange),
            Error::TokenUpgradeFailed(_) => Some(Stage::TokenUpgrade),
            Error::ServiceLoginFailed(_) => Some(Stage::ServiceLogin),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
