use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, Utc};
use grocery_storage_json::replace_file;
use reqwest::{blocking::Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{redirect::ConsentRedirect, MailError};

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
];

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const EXPIRY_SKEW_SECS: i64 = 60;

/// Token file in Google's authorized-user layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Fields we do not interpret but write back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl AuthorizedUser {
    /// Has an access token that does not expire within the skew window.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let has_token = self.token.as_deref().is_some_and(|t| !t.is_empty());
        let fresh = self
            .expiry
            .map_or(true, |expiry| expiry > now + Duration::seconds(EXPIRY_SKEW_SECS));
        has_token && fresh
    }

    pub fn has_scopes(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }

    fn apply(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(response.access_token);
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.expiry = response
            .expires_in
            .map(|secs| now + Duration::seconds(secs));
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
    }
}

/// Client secrets downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    auth_uri: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Obtains a Gmail access token, refreshing or re-authorizing as needed.
pub struct GoogleAuth {
    http: Client,
    credentials_path: PathBuf,
    token_path: PathBuf,
}

impl GoogleAuth {
    pub fn new(credentials_path: PathBuf, token_path: PathBuf) -> Result<Self, MailError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            credentials_path,
            token_path,
        })
    }

    /// Returns a bearer token carrying both Gmail scopes.
    ///
    /// A stored, valid token is reused. An expired one is refreshed. Anything
    /// else runs the browser consent flow. The token file is rewritten
    /// whenever a new token is obtained.
    pub fn access_token(&self) -> Result<String, MailError> {
        let now = Utc::now();
        let user = match self.load_token()? {
            Some(user) if user.has_scopes(&SCOPES) && user.is_valid_at(now) => return bearer(user),
            Some(user) if user.has_scopes(&SCOPES) && user.refresh_token.is_some() => {
                info!("refreshing Gmail access token");
                self.refresh(user)?
            }
            Some(_) => {
                warn!("stored token lacks required scopes; asking for consent again");
                self.authorize_interactively()?
            }
            None => self.authorize_interactively()?,
        };
        self.save_token(&user)?;
        bearer(user)
    }

    fn load_token(&self) -> Result<Option<AuthorizedUser>, MailError> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.token_path)?;
        match serde_json::from_str(&data) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(path = %self.token_path.display(), %err, "token file unreadable; asking for consent again");
                Ok(None)
            }
        }
    }

    fn save_token(&self, user: &AuthorizedUser) -> Result<(), MailError> {
        let json = serde_json::to_string(user)?;
        replace_file(&self.token_path, &json)?;
        Ok(())
    }

    fn refresh(&self, mut user: AuthorizedUser) -> Result<AuthorizedUser, MailError> {
        let refresh_token = user.refresh_token.clone().unwrap_or_default();
        let response = self.token_request(
            &user.token_uri,
            &[
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ],
        )?;
        user.apply(response, Utc::now());
        Ok(user)
    }

    fn authorize_interactively(&self) -> Result<AuthorizedUser, MailError> {
        let secrets = load_client_secrets(&self.credentials_path)?;
        let redirect = ConsentRedirect::bind()?;
        let redirect_uri = redirect.redirect_uri();
        let state = uuid::Uuid::new_v4().simple().to_string();
        let auth_uri = secrets.auth_uri.as_deref().unwrap_or(DEFAULT_AUTH_URI);
        let scope = SCOPES.join(" ");
        let consent = Url::parse_with_params(
            auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|err| MailError::Auth(format!("invalid auth_uri `{auth_uri}`: {err}")))?;

        println!("Please visit this URL to authorize this application: {consent}");
        let code = redirect.wait_for_code(&state)?;

        let token_uri = secrets
            .token_uri
            .clone()
            .unwrap_or_else(default_token_uri);
        let response = self.token_request(
            &token_uri,
            &[
                ("code", code.as_str()),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )?;

        let mut user = AuthorizedUser {
            token: None,
            refresh_token: None,
            token_uri,
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            expiry: None,
            extra: Map::new(),
        };
        user.apply(response, Utc::now());
        info!("Gmail authorization complete");
        Ok(user)
    }

    fn token_request(&self, uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse, MailError> {
        let response = self.http.post(uri).form(form).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MailError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }
        Ok(response.json()?)
    }
}

fn bearer(user: AuthorizedUser) -> Result<String, MailError> {
    user.token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| MailError::Auth("no access token issued".into()))
}

fn load_client_secrets(path: &Path) -> Result<ClientSecrets, MailError> {
    if !path.exists() {
        return Err(MailError::Auth(format!(
            "client secrets file `{}` not found",
            path.display()
        )));
    }
    let data = fs::read_to_string(path)?;
    let file: ClientSecretsFile = serde_json::from_str(&data)?;
    file.installed.or(file.web).ok_or_else(|| {
        MailError::Auth(format!(
            "`{}` has neither an `installed` nor a `web` section",
            path.display()
        ))
    })
}
