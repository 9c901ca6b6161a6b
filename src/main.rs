#![warn(clippy::pedantic)]

mod cli;

use anyhow::{Context, Result};
use realms_presence::{
    directory::MojangDirectory,
    http,
    presence::{CancelToken, Poller},
    realms::RealmsClient,
    webhook::DiscordWebhook,
    xbox,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cli::Args::parse_args();

    let client = http::builder()
        .build()
        .with_context(|| "Error creating an HTTP client")?;
    let auth = xbox::Auth::new(client);
    let access_token = xbox::authenticate(&auth, &args.credentials())
        .with_context(|| "Error authenticating with Minecraft")?;
    let client = auth.into_client();

    let directory = MojangDirectory::new(client.clone());
    let realms = RealmsClient::new(
        client.clone(),
        access_token,
        args.username.clone(),
        directory,
        args.session_options(),
    )
    .with_context(|| "Error opening a realms session")?;

    let server_id = args.server_id;
    let webhook = DiscordWebhook::new(client, args.webhook_url.clone());
    let mut poller = Poller::new(
        || realms.list_active_profiles(server_id),
        webhook,
        args.poll_interval(),
    );
    poller
        .seed()
        .with_context(|| "Error getting the initial player list")?;

    let cancel = CancelToken::new();
    let handle = cancel.clone();
    ctrlc::set_handler(move || handle.cancel())
        .with_context(|| "Error setting the Ctrl-C handler")?;

    poller.run(&cancel);
    Ok(())
}
