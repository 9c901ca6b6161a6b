use std::time::Duration;

use realms_presence::{realms::SessionOptions, xbox::Credentials};
use structopt::StructOpt;

/// Announce players joining a Minecraft realm to a Discord channel
#[derive(StructOpt, Debug)]
#[structopt()]
pub struct Args {
    /// Minecraft profile name of the account
    #[structopt(short, long, env = "USERNAME")]
    pub username: String,

    /// Email address of the Microsoft account
    #[structopt(short, long, env = "EMAIL")]
    pub email: String,

    /// Password of the Microsoft account
    #[structopt(short, long, env = "PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Id of the realm to watch
    #[structopt(short, long, env = "SERVER_ID")]
    pub server_id: i64,

    /// Discord webhook receiving the announcements
    #[structopt(short, long, env = "DISCORD_WEBHOOKS_URL", hide_env_values = true)]
    pub webhook_url: String,

    /// Seconds between two polls
    #[structopt(short, long, env = "POLL_INTERVAL", default_value = "60")]
    pub interval: u64,

    /// Game version announced to the realms service
    #[structopt(long, env = "GAME_VERSION", default_value = "1.18.2")]
    pub game_version: String,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::from_args()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            game_version: self.game_version.clone(),
            ..SessionOptions::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}
