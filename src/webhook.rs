//! Discord webhook notifications.

use reqwest::blocking::Client;
use serde_json::json;

use crate::error::{Error, RequestError, Result};
use crate::presence::Notifier;

pub struct DiscordWebhook {
    client: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    fn post(&self, content: String) -> std::result::Result<(), RequestError> {
        let res = self
            .client
            .post(&self.url)
            .json(&json!({ "content": content }))
            .send()?;
        let status = res.status();
        if !status.is_success() {
            return Err(RequestError::UnknownStatus(status.as_u16()));
        }
        Ok(())
    }
}

impl Notifier for DiscordWebhook {
    fn notify(&mut self, profile_name: &str) -> Result<()> {
        self.post(format!("@everyone {} is now playing on the server!", profile_name))
            .map_err(Error::NotificationFailed)
    }
}
