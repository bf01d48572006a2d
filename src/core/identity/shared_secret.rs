use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::{IdentityClaims, IdentityError, IdentityResolver, VerifiedIdentity};

/// HS256 verifier keyed by the service secret.
pub(crate) struct SharedSecretResolver {
    key: DecodingKey,
}

impl SharedSecretResolver {
    pub(crate) fn new(secret: &str) -> Self {
        Self { key: DecodingKey::from_secret(secret.as_bytes()) }
    }
}

#[async_trait]
impl IdentityResolver for SharedSecretResolver {
    async fn resolve(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<IdentityClaims>(token, &self.key, &validation)
            .map(|data| data.claims.into())
            .map_err(|err| IdentityError::InvalidToken(err.to_string()))
    }
}

#[cfg(test)]
pub(crate) fn mint_token(
    secret: &str,
    subject: &str,
    email: Option<&str>,
    name: Option<&str>,
    ttl: time::Duration,
) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let exp = (time::OffsetDateTime::now_utc() + ttl).unix_timestamp();
    let claims = serde_json::json!({
        "sub": subject,
        "email": email,
        "name": name,
        "exp": exp,
    });

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("encode token")
}
