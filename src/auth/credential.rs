//! Credential types.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

/// OAuth credential produced by the interactive exchange or a silent refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthCredential {
    /// Access token.
    pub access_token: String,
    /// Refresh token, when the exchange granted one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiration timestamp (Unix seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl OAuthCredential {
    /// Credential holding only an access token, with no expiry metadata.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Get expiration as DateTime.
    pub fn expires_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .map(|ts| DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now))
    }

    /// Check if token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at_datetime()
            .map(|exp| Utc::now() >= exp)
            .unwrap_or(false)
    }

    /// Check if token needs refresh (within 5 minutes of expiry).
    pub fn needs_refresh(&self) -> bool {
        self.expires_at_datetime()
            .map(|exp| Utc::now() >= exp - Duration::minutes(5))
            .unwrap_or(false)
    }
}

/// OAuth client identity configured by the host application.
#[derive(Clone)]
pub struct OAuthParameters {
    /// Client id issued when registering the app.
    pub client_id: String,
    client_secret: SecretString,
    /// Level of access the app requires.
    pub scope: String,
    /// Redirect URI, must match one registered for the app.
    pub redirect_uri: Url,
}

impl OAuthParameters {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            scope: scope.into(),
            redirect_uri,
        }
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl PartialEq for OAuthParameters {
    fn eq(&self, other: &Self) -> bool {
        self.client_id == other.client_id
            && self.client_secret.expose_secret() == other.client_secret.expose_secret()
            && self.scope == other.scope
            && self.redirect_uri == other.redirect_uri
    }
}

impl Eq for OAuthParameters {}

impl fmt::Debug for OAuthParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthParameters")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("scope", &self.scope)
            .field("redirect_uri", &self.redirect_uri.as_str())
            .finish()
    }
}

/// The persisted configuration backing an authentication strategy.
///
/// The variant carries exactly the material its strategy needs: a direct
/// token is always present for [`Credential::DirectToken`], while the OAuth
/// variant may lack a resolved credential until the exchange completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    /// A single opaque access token supplied directly by the host.
    DirectToken { token: String },
    /// OAuth client identity plus the resolved credential, once obtained.
    OAuth {
        parameters: OAuthParameters,
        credential: Option<OAuthCredential>,
    },
}

impl Credential {
    /// Create a direct-token credential.
    pub fn direct_token(token: impl Into<String>) -> Self {
        Self::DirectToken {
            token: token.into(),
        }
    }

    /// Create an OAuth credential awaiting its exchange.
    pub fn oauth(parameters: OAuthParameters) -> Self {
        Self::OAuth {
            parameters,
            credential: None,
        }
    }

    /// The access token currently held, if any.
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Credential::DirectToken { token } => Some(token),
            Credential::OAuth { credential, .. } => {
                credential.as_ref().map(|c| c.access_token.as_str())
            }
        }
    }

    /// Check if the held token is expired.
    pub fn is_expired(&self) -> bool {
        match self {
            Credential::DirectToken { .. } => false,
            Credential::OAuth { credential, .. } => {
                credential.as_ref().is_some_and(|c| c.is_expired())
            }
        }
    }

    /// Get credential kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::DirectToken { .. } => "direct_token",
            Credential::OAuth { .. } => "oauth",
        }
    }
}
