//! Durable credential persistence.

use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::{Error, Result};

use super::{Credential, OAuthCredential, OAuthParameters};

const HUDDLE_DIR: &str = ".huddle";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Persisted record for the single global credential slot.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    pub strategy_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl StoredCredential {
    fn from_credential(credential: &Credential) -> Self {
        match credential {
            Credential::DirectToken { token } => Self {
                strategy_kind: credential.kind().to_string(),
                token: Some(token.clone()),
                ..Self::default()
            },
            Credential::OAuth {
                parameters,
                credential: resolved,
            } => Self {
                strategy_kind: credential.kind().to_string(),
                client_id: Some(parameters.client_id.clone()),
                client_secret: Some(parameters.client_secret().to_string()),
                scope: Some(parameters.scope.clone()),
                redirect_uri: Some(parameters.redirect_uri.to_string()),
                token: resolved.as_ref().map(|c| c.access_token.clone()),
                refresh_token: resolved.as_ref().and_then(|c| c.refresh_token.clone()),
                expires_at: resolved.as_ref().and_then(|c| c.expires_at),
            },
        }
    }

    fn into_credential(self) -> Result<Credential> {
        match self.strategy_kind.as_str() {
            "direct_token" => {
                let token = self
                    .token
                    .ok_or_else(|| Error::auth("persisted direct token record has no token"))?;
                Ok(Credential::DirectToken { token })
            }
            "oauth" => {
                let client_id = self
                    .client_id
                    .ok_or_else(|| Error::auth("persisted OAuth record has no client id"))?;
                let client_secret = self
                    .client_secret
                    .ok_or_else(|| Error::auth("persisted OAuth record has no client secret"))?;
                let scope = self
                    .scope
                    .ok_or_else(|| Error::auth("persisted OAuth record has no scope"))?;
                let redirect_uri = self
                    .redirect_uri
                    .ok_or_else(|| Error::auth("persisted OAuth record has no redirect URI"))?;
                let redirect_uri = Url::parse(&redirect_uri)
                    .map_err(|e| Error::auth(format!("persisted redirect URI invalid: {e}")))?;

                let credential = self.token.map(|access_token| OAuthCredential {
                    access_token,
                    refresh_token: self.refresh_token,
                    expires_at: self.expires_at,
                });

                Ok(Credential::OAuth {
                    parameters: OAuthParameters::new(client_id, client_secret, scope, redirect_uri),
                    credential,
                })
            }
            other => Err(Error::auth(format!(
                "unknown persisted strategy kind: {other}"
            ))),
        }
    }
}

/// File-backed store for the last-configured strategy's credential material.
///
/// One fixed well-known slot; saving overwrites any prior value. Save writes
/// a temp file and renames it into place, so a concurrent load never
/// observes a half-written record; all operations are serialized through an
/// internal mutex.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl CredentialStore {
    /// Store at the default per-user location.
    pub fn new() -> Result<Self> {
        let path = Self::default_path()
            .ok_or_else(|| Error::Config("no home directory for credential storage".into()))?;
        Ok(Self::with_path(path))
    }

    /// Store at an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().join(HUDDLE_DIR).join(CREDENTIALS_FILE))
    }

    /// Persist the credential, overwriting any prior value.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        let _guard = self.guard.lock().await;

        let record = StoredCredential::from_credential(credential);
        let content = serde_json::to_string_pretty(&record)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Load the last-persisted credential, if any.
    pub async fn load(&self) -> Result<Option<Credential>> {
        let _guard = self.guard.lock().await;

        if !self.path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::auth(format!("failed to read credential store: {e}")))?;
        let record: StoredCredential = serde_json::from_str(&content)
            .map_err(|e| Error::auth(format!("failed to parse credential store: {e}")))?;

        record.into_credential().map(Some)
    }

    /// Remove all persisted credential material.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.guard.lock().await;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
