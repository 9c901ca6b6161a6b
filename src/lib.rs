//! Sign in to Minecraft services with a Microsoft account and watch the
//! players online on a realm.
//!
//! The sign-in chain runs through [`xbox::authenticate`], whose output opens a
//! [`realms::RealmsClient`]. A [`presence::Poller`] then queries the realm at a
//! fixed interval and hands every newly online player to a
//! [`presence::Notifier`], such as [`webhook::DiscordWebhook`].

pub mod directory;
pub mod error;
pub mod http;
pub mod presence;
pub mod realms;
pub mod scrape;
pub mod webhook;
pub mod xbox;

pub use error::{Error, Result};
