use crate::error::{IndexError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Scope granting access to webmaster data.
pub const WEBMASTERS_SCOPE: &str = "https://www.googleapis.com/auth/webmasters";

/// Redirect target for the paste-the-code installed-app flow.
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens within this margin of their deadline count as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

pub type ConsentCallback = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// An OAuth credential as persisted in the token file.
///
/// The field layout matches the token files written by the common OAuth
/// client libraries, so an existing `token.json` keeps working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// OAuth client secrets in the installed-app layout of `credentials.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub installed: InstalledApp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl ClientSecrets {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            IndexError::AuthError(format!(
                "cannot read client secrets {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Where credentials are cached between runs.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>>;
    fn save(&self, credential: &Credential) -> Result<()>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn load(&self) -> Result<Option<Credential>> {
        (**self).load()
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        (**self).save(credential)
    }
}

/// Credential cache backed by a JSON file (the classic `token.json`).
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let credential = serde_json::from_str(&raw).map_err(|e| {
            IndexError::StoreError(format!(
                "malformed token file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(credential))
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        let raw = serde_json::to_string_pretty(credential)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory credential cache for callers that manage persistence themselves,
/// and for tests that must not touch the filesystem.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new(credential: Option<Credential>) -> Self {
        Self {
            credential: Mutex::new(credential),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.lock().unwrap().clone())
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        *self.credential.lock().unwrap() = Some(credential.clone());
        Ok(())
    }
}

/// Shape of a token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Build the user-facing authorization URL for the installed-app flow.
pub fn authorization_url(app: &InstalledApp, scope: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", &app.client_id)
        .append_pair("redirect_uri", OOB_REDIRECT_URI)
        .append_pair("response_type", "code")
        .append_pair("scope", scope)
        .append_pair("access_type", "offline")
        .finish();
    format!("{}?{}", app.auth_uri, query)
}

/// Produces a usable credential: cached, refreshed, or freshly authorized.
///
/// Interactive authorization needs a consent callback; it receives the
/// authorization URL and returns the code the user pasted back. The store is
/// written at most once per run, after a refresh or a code exchange.
pub struct Authenticator<S: CredentialStore> {
    store: S,
    http: Client,
    secrets_path: PathBuf,
    consent_callback: Option<ConsentCallback>,
}

impl<S: CredentialStore> Authenticator<S> {
    pub fn new(store: S, http: Client, secrets_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            http,
            secrets_path: secrets_path.into(),
            consent_callback: None,
        }
    }

    pub fn with_consent_callback(mut self, callback: ConsentCallback) -> Self {
        self.consent_callback = Some(callback);
        self
    }

    pub async fn ensure_credential(&self) -> Result<Credential> {
        if let Some(credential) = self.store.load()? {
            if !credential.is_expired() {
                debug!("Using cached credential");
                return Ok(credential);
            }
            if credential.can_refresh() {
                info!("Cached credential expired, refreshing");
                let refreshed = self.refresh(credential).await?;
                self.store.save(&refreshed)?;
                return Ok(refreshed);
            }
        }

        info!("No usable cached credential, starting authorization flow");
        let credential = self.authorize().await?;
        self.store.save(&credential)?;
        Ok(credential)
    }

    async fn refresh(&self, credential: Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| IndexError::AuthError("no refresh token available".to_string()))?;

        let params = [
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let token = self.request_token(&credential.token_uri, &params).await?;

        Ok(Credential {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(credential.refresh_token.clone()),
            expiry: token
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
            ..credential
        })
    }

    async fn authorize(&self) -> Result<Credential> {
        let secrets = ClientSecrets::from_file(&self.secrets_path)?;
        let callback = self.consent_callback.as_ref().ok_or_else(|| {
            IndexError::AuthError(
                "interactive authorization required but no consent callback is set".to_string(),
            )
        })?;

        let auth_url = authorization_url(&secrets.installed, WEBMASTERS_SCOPE);
        let code = callback(&auth_url);
        let code = code.trim();
        if code.is_empty() {
            return Err(IndexError::AuthError(
                "authorization cancelled: empty code".to_string(),
            ));
        }

        let params = [
            ("client_id", secrets.installed.client_id.as_str()),
            ("client_secret", secrets.installed.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", OOB_REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ];

        let token = self
            .request_token(&secrets.installed.token_uri, &params)
            .await?;

        Ok(Credential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            token_uri: secrets.installed.token_uri.clone(),
            client_id: secrets.installed.client_id.clone(),
            client_secret: secrets.installed.client_secret.clone(),
            scopes: vec![WEBMASTERS_SCOPE.to_string()],
            expiry: token
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }

    async fn request_token(&self, token_uri: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self.http.post(token_uri).form(params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::AuthError(format!(
                "token endpoint rejected the request ({}): {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}
