//! Mojang profile directory, mapping profile names to account ids and back.

use reqwest::{blocking::Client, header::ACCEPT};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::RequestError;

pub const MOJANG_API: &str = "https://api.mojang.com";

/// Name and id lookups, one request per call.
pub trait Directory {
    fn account_id(&self, profile_name: &str) -> Result<Uuid, RequestError>;
    fn profile_name(&self, account_id: &Uuid) -> Result<String, RequestError>;
}

#[derive(Debug, Clone)]
pub struct MojangDirectory {
    client: Client,
    base_url: String,
}

impl MojangDirectory {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, MOJANG_API.to_string())
    }

    pub fn with_base_url(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileId {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ProfileName {
    name: String,
}

impl Directory for MojangDirectory {
    fn account_id(&self, profile_name: &str) -> Result<Uuid, RequestError> {
        let url = format!("{}/users/profiles/minecraft/{}", self.base_url, profile_name);
        let res = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()?;
        let status = res.status();
        if !status.is_success() {
            return Err(RequestError::UnknownStatus(status.as_u16()));
        }
        let profile: ProfileId = serde_json::from_str(&res.text()?)?;
        Ok(profile.id)
    }

    fn profile_name(&self, account_id: &Uuid) -> Result<String, RequestError> {
        let url = format!("{}/user/profiles/{}/names", self.base_url, account_id.simple());
        let res = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()?;
        let status = res.status();
        if !status.is_success() {
            return Err(RequestError::UnknownStatus(status.as_u16()));
        }
        // Name history, oldest first.
        let history: Vec<ProfileName> = serde_json::from_str(&res.text()?)?;
        history
            .into_iter()
            .last()
            .map(|profile| profile.name)
            .ok_or(RequestError::MissingField("name"))
    }
}
