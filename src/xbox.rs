//! Microsoft account to Minecraft services handshake, through Xbox Live.
//!
//! Each stage consumes the output of the previous one, so the chain is run as
//! a whole by [`authenticate`] and never resumed from the middle.

use std::fmt;

use log::{info, warn};
use reqwest::{
    blocking::{Client, Response},
    header::ACCEPT,
    StatusCode,
};
use serde_json::{json, Value};

use crate::error::{Error, RequestError, Result};
use crate::scrape::{self, Pattern, RegexScraper, Scraper};

type RequestResult<T> = std::result::Result<T, RequestError>;

/// Microsoft account credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: String, password: String) -> Self {
        Self { email, password }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// The Minecraft services bearer token produced by the handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Values scraped from the Microsoft authorization page.
#[derive(Debug, Clone)]
pub struct LoginData {
    pub ppft: String,
    pub url_post: String,
}

/// Xbox Live user token and the user hash that goes with it.
#[derive(Debug, Clone)]
pub struct XblData {
    pub token: String,
    pub userhash: String,
}

/// The five handshake exchanges, in the order [`authenticate`] runs them.
pub trait Stages {
    fn prepare(&self) -> Result<LoginData>;
    fn sign_in(&self, credentials: &Credentials, login_data: &LoginData) -> Result<String>;
    fn authenticate_with_xbl(&self, access_token: &str) -> Result<XblData>;
    fn authenticate_with_xsts(&self, xbl_token: &str) -> Result<String>;
    fn authenticate_with_minecraft(
        &self,
        userhash: &str,
        xsts_token: &str,
    ) -> Result<AccessToken>;
}

/// Run the whole handshake. The first failing stage aborts the attempt.
pub fn authenticate<S: Stages + ?Sized>(
    stages: &S,
    credentials: &Credentials,
) -> Result<AccessToken> {
    let login_data = stages.prepare()?;
    info!("Prepared Microsoft login");
    let ms_token = stages.sign_in(credentials, &login_data)?;
    info!("Signed in with Microsoft");
    let xbl_data = stages.authenticate_with_xbl(&ms_token)?;
    info!("Authenticated with Xbox Live");
    let xsts_token = stages.authenticate_with_xsts(&xbl_data.token)?;
    info!("Retrieved XSTS token");
    let access_token = stages.authenticate_with_minecraft(&xbl_data.userhash, &xsts_token)?;
    info!("Authenticated with Minecraft");
    Ok(access_token)
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authorize: String,
    pub xbl_authenticate: String,
    pub xsts_authorize: String,
    pub minecraft_login: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize: "https://login.live.com/oauth20_authorize.srf?client_id=000000004C12AE6F&redirect_uri=https://login.live.com/oauth20_desktop.srf&scope=service::user.auth.xboxlive.com::MBI_SSL&display=touch&response_type=token&locale=en".to_string(),
            xbl_authenticate: "https://user.auth.xboxlive.com/user/authenticate".to_string(),
            xsts_authorize: "https://xsts.auth.xboxlive.com/xsts/authorize".to_string(),
            minecraft_login: "https://api.minecraftservices.com/authentication/login_with_xbox"
                .to_string(),
        }
    }
}

/// HTTP implementation of the handshake stages. The client is expected to
/// keep cookies between the first two stages.
pub struct Auth<S = RegexScraper> {
    client: Client,
    endpoints: Endpoints,
    scraper: S,
}

impl Auth {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoints: Endpoints::default(),
            scraper: RegexScraper,
        }
    }
}

impl<S> Auth<S> {
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_scraper<T: Scraper>(self, scraper: T) -> Auth<T> {
        Auth {
            client: self.client,
            endpoints: self.endpoints,
            scraper,
        }
    }

    /// Give back the HTTP client once the handshake is over.
    pub fn into_client(self) -> Client {
        self.client
    }
}

impl<S: Scraper> Auth<S> {
    fn get_login_data(&self) -> RequestResult<LoginData> {
        let html = self.client.get(&self.endpoints.authorize).send()?.text()?;
        let ppft = self.scraper.scrape(&html, Pattern::HiddenField)?;
        let url_post = self.scraper.scrape(&html, Pattern::JsAssignedString)?;
        Ok(LoginData { ppft, url_post })
    }

    fn post_credentials(
        &self,
        credentials: &Credentials,
        login_data: &LoginData,
    ) -> RequestResult<String> {
        let params = [
            ("login", &credentials.email),
            ("loginfmt", &credentials.email),
            ("passwd", &credentials.password),
            ("PPFT", &login_data.ppft),
        ];
        let res = self.client.post(&login_data.url_post).form(&params).send()?;
        let status = res.status();
        if status != StatusCode::OK {
            return Err(RequestError::UnknownStatus(status.as_u16()));
        }
        let url = res.url().as_str();
        if url == login_data.url_post {
            warn!(
                "Login page was served again, credentials rejected or a second factor is required"
            );
        }
        let mut params = scrape::fragment_params(url)?;
        params
            .remove("access_token")
            .ok_or(RequestError::MissingField("access_token"))
    }

    fn request_xbl_user(&self, access_token: &str) -> RequestResult<XblData> {
        let json = json!({
            "Properties": {
                "AuthMethod": "RPS",
                "SiteName": "user.auth.xboxlive.com",
                "RpsTicket": access_token
            },
            "RelyingParty": "http://auth.xboxlive.com",
            "TokenType": "JWT"
        });
        let res = self
            .client
            .post(&self.endpoints.xbl_authenticate)
            .json(&json)
            .header(ACCEPT, "application/json")
            .send()?;
        let v = json_body(res)?;
        Ok(XblData {
            token: str_field(&v, "/Token")?,
            userhash: str_field(&v, "/DisplayClaims/xui/0/uhs")?,
        })
    }

    fn request_xbl_xsts(&self, xbl_token: &str) -> RequestResult<String> {
        let json = json!({
            "Properties": {
                "SandboxId": "RETAIL",
                "UserTokens": [xbl_token]
            },
            "RelyingParty": "rp://api.minecraftservices.com/",
            "TokenType": "JWT"
        });
        let res = self
            .client
            .post(&self.endpoints.xsts_authorize)
            .header(ACCEPT, "application/json")
            .json(&json)
            .send()?;
        let v = json_body(res)?;
        str_field(&v, "/Token")
    }

    fn request_minecraft_with_xbl(
        &self,
        userhash: &str,
        xsts_token: &str,
    ) -> RequestResult<String> {
        let json = json!({
            "identityToken": format!("XBL3.0 x={};{}", userhash, xsts_token),
            "ensureLegacyEnabled": true
        });
        let res = self
            .client
            .post(&self.endpoints.minecraft_login)
            .header(ACCEPT, "application/json")
            .json(&json)
            .send()?;
        let v = json_body(res)?;
        str_field(&v, "/access_token")
    }
}

impl<S: Scraper> Stages for Auth<S> {
    fn prepare(&self) -> Result<LoginData> {
        self.get_login_data().map_err(Error::PreparationFailed)
    }

    fn sign_in(&self, credentials: &Credentials, login_data: &LoginData) -> Result<String> {
        self.post_credentials(credentials, login_data)
            .map_err(Error::IdentityLoginFailed)
    }

    fn authenticate_with_xbl(&self, access_token: &str) -> Result<XblData> {
        self.request_xbl_user(access_token)
            .map_err(Error::BrokerExchangeFailed)
    }

    fn authenticate_with_xsts(&self, xbl_token: &str) -> Result<String> {
        self.request_xbl_xsts(xbl_token)
            .map_err(Error::TokenUpgradeFailed)
    }

    fn authenticate_with_minecraft(&self, userhash: &str, xsts_token: &str) -> Result<AccessToken> {
        self.request_minecraft_with_xbl(userhash, xsts_token)
            .map(AccessToken::new)
            .map_err(Error::ServiceLoginFailed)
    }
}

/// Read a JSON body, rejecting any non-success status first.
fn json_body(res: Response) -> RequestResult<Value> {
    let status = res.status();
    if !status.is_success() {
        return Err(RequestError::UnknownStatus(status.as_u16()));
    }
    let text = res.text()?;
    Ok(serde_json::from_str(&text)?)
}

fn str_field(v: &Value, pointer: &'static str) -> RequestResult<String> {
    v.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(RequestError::MissingField(pointer))
}
