//! Authenticated Realms session, used to list players online on a realm.

use std::collections::HashSet;

use log::info;
use reqwest::{
    blocking::Client,
    header::{ACCEPT, COOKIE},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::directory::{Directory, MojangDirectory};
use crate::error::{Error, RequestError, Result};
use crate::xbox::AccessToken;

pub const REALMS_API: &str = "https://pc.realms.minecraft.net";
pub const DEFAULT_GAME_VERSION: &str = "1.18.2";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub base_url: String,
    /// Client version announced in the session cookie.
    pub game_version: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            base_url: REALMS_API.to_string(),
            game_version: DEFAULT_GAME_VERSION.to_string(),
        }
    }
}

/// Everything needed to build the session cookie sent on each request.
#[derive(Debug, Clone)]
pub struct Session {
    access_token: AccessToken,
    account_id: Uuid,
    profile_name: String,
    game_version: String,
}

impl Session {
    pub fn account_id(&self) -> &Uuid {
        &self.account_id
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn cookie(&self) -> String {
        format!(
            "sid=token:{}:{};user={};version={}",
            self.access_token.as_str(),
            self.account_id.simple(),
            self.profile_name,
            self.game_version
        )
    }
}

pub struct RealmsClient<D = MojangDirectory> {
    client: Client,
    base_url: String,
    session: Session,
    directory: D,
}

#[derive(Debug, Deserialize)]
struct LivePlayerLists {
    lists: Vec<LivePlayerList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LivePlayerList {
    server_id: i64,
    /// JSON array of players, encoded as a string.
    player_list: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LivePlayer {
    player_id: Uuid,
}

impl<D: Directory> RealmsClient<D> {
    /// Resolve the account id of `profile_name` and open the session.
    pub fn new(
        client: Client,
        access_token: AccessToken,
        profile_name: String,
        directory: D,
        options: SessionOptions,
    ) -> Result<Self> {
        let account_id = directory
            .account_id(&profile_name)
            .map_err(Error::AccountLookupFailed)?;
        info!("Resolved {} to account {}", profile_name, account_id.simple());
        Ok(Self {
            client,
            base_url: options.base_url,
            session: Session {
                access_token,
                account_id,
                profile_name,
                game_version: options.game_version,
            },
            directory,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Names of the players currently online on the given realm. A realm
    /// absent from the live list has no players.
    pub fn list_active_profiles(&self, server_id: i64) -> Result<HashSet<String>> {
        self.request_live_players(server_id)
            .map_err(Error::PresenceQueryFailed)
    }

    fn request_live_players(
        &self,
        server_id: i64,
    ) -> std::result::Result<HashSet<String>, RequestError> {
        let url = format!("{}/activities/liveplayerlist", self.base_url);
        let res = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(COOKIE, self.session.cookie())
            .send()?;
        let status = res.status();
        if !status.is_success() {
            return Err(RequestError::UnknownStatus(status.as_u16()));
        }
        let live: LivePlayerLists = serde_json::from_str(&res.text()?)?;
        let list = match live.lists.into_iter().find(|list| list.server_id == server_id) {
            Some(list) => list,
            None => return Ok(HashSet::new()),
        };
        let players: Vec<LivePlayer> = serde_json::from_str(&list.player_list)?;
        players
            .iter()
            .map(|player| self.directory.profile_name(&player.player_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_format() {
        let session = Session {
            access_token: AccessToken::new("tok".to_string()),
            account_id: Uuid::parse_str("069a79f4-44e9-4726-a5be-fca90e38aaf5").unwrap(),
            profile_name: "Notch".to_string(),
            game_version: DEFAULT_GAME_VERSION.to_string(),
        };
        assert_eq!(
            session.cookie(),
            "sid=token:tok:069a79f444e94726a5befca90e38aaf5;user=Notch;version=1.18.2"
        );
    }

    #[test]
    fn player_list_is_double_encoded() {
        let body = r#"{"lists":[{"serverId":7,"playerList":"[{\"playerId\":\"069a79f444e94726a5befca90e38aaf5\",\"accepted\":true}]"}]}"#;
        let live: LivePlayerLists = serde_json::from_str(body).unwrap();
        assert_eq!(live.lists[0].server_id, 7);
        let players: Vec<LivePlayer> = serde_json::from_str(&live.lists[0].player_list).unwrap();
        assert_eq!(players[0].player_id.simple().to_string(), "069a79f444e94726a5befca90e38aaf5");
    }
}
