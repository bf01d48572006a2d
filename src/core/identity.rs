mod firebase;
mod shared_secret;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::core::config::{IdentityProvider, Settings};

pub(crate) use firebase::FirebaseResolver;
pub(crate) use shared_secret::SharedSecretResolver;

#[cfg(test)]
pub(crate) use shared_secret::mint_token;

/// Identity asserted by the token issuer after signature and claim checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VerifiedIdentity {
    pub(crate) subject: String,
    pub(crate) email: Option<String>,
    pub(crate) name: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum IdentityError {
    #[error("invalid identity token: {0}")]
    InvalidToken(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub(crate) trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Claim subset shared by both token flavours.
#[derive(Debug, Deserialize)]
struct IdentityClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<IdentityClaims> for VerifiedIdentity {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            subject: claims.sub,
            email: claims
                .email
                .map(|value| value.trim().to_ascii_lowercase())
                .filter(|value| !value.is_empty()),
            name: claims.name.map(|value| value.trim().to_string()).filter(|value| !value.is_empty()),
        }
    }
}

pub(crate) fn resolver_from_settings(
    settings: &Settings,
) -> anyhow::Result<Arc<dyn IdentityResolver>> {
    let identity = settings.identity();
    let resolver: Arc<dyn IdentityResolver> = match identity.provider {
        IdentityProvider::Firebase => Arc::new(FirebaseResolver::new(identity)?),
        IdentityProvider::SharedSecret => {
            tracing::warn!("Using shared-secret identity tokens; not suitable for production");
            Arc::new(SharedSecretResolver::new(&settings.security().secret_key))
        }
    };

    tracing::info!(provider = identity.provider.as_str(), "Identity resolver configured");
    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_normalize_email_and_name() {
        let identity = VerifiedIdentity::from(IdentityClaims {
            sub: "uid-1".to_string(),
            email: Some("  Jane@Example.COM ".to_string()),
            name: Some("   ".to_string()),
        });

        assert_eq!(identity.subject, "uid-1");
        assert_eq!(identity.email.as_deref(), Some("jane@example.com"));
        assert_eq!(identity.name, None);
    }
}
