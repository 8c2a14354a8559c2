use crate::error::{NetworkError, NetworkResult};
use azure_core::credentials::TokenCredential;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Environment variable holding a pre-acquired Azure Resource Manager access token.
pub const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// Credential types supported by the Azure Network Management SDK.
#[derive(Clone)]
pub enum NetworkCredential {
    /// A bearer token acquired out of band (e.g. `az account get-access-token`).
    AccessToken(SecretString),

    /// Any `azure_core` token credential, e.g. one of the `azure_identity` credentials.
    TokenCredential(Arc<dyn TokenCredential>),
}

impl NetworkCredential {
    /// Create a credential from the `AZURE_ACCESS_TOKEN` environment variable.
    /// Falls back to the Azure CLI credential if the variable is not set.
    pub fn from_env() -> NetworkResult<Self> {
        match std::env::var(ACCESS_TOKEN_ENV) {
            Ok(token) if !token.is_empty() => Ok(Self::AccessToken(SecretString::from(token))),
            _ => Self::azure_cli(),
        }
    }

    /// Create a credential from a pre-acquired bearer token.
    pub fn access_token(token: impl Into<String>) -> Self {
        Self::AccessToken(SecretString::from(token.into()))
    }

    /// Create a credential backed by the Azure CLI (`az login`).
    pub fn azure_cli() -> NetworkResult<Self> {
        let credential = azure_identity::AzureCliCredential::new(None)
            .map_err(|e| NetworkError::Auth(format!("failed to create Azure CLI credential: {e}")))?;
        Ok(Self::TokenCredential(credential))
    }

    /// Wrap any `azure_core` token credential.
    pub fn token_credential(credential: Arc<dyn TokenCredential>) -> Self {
        Self::TokenCredential(credential)
    }

    /// Resolve the credential to an `Authorization` header value.
    ///
    /// `scope` is the OAuth scope requested from token credentials, normally
    /// `https://management.azure.com/.default`.
    pub async fn resolve(&self, scope: &str) -> NetworkResult<String> {
        match self {
            Self::AccessToken(token) => Ok(format!("Bearer {}", token.expose_secret())),
            Self::TokenCredential(credential) => {
                let token = credential
                    .get_token(&[scope], None)
                    .await
                    .map_err(|e| NetworkError::Auth(format!("failed to acquire token: {e}")))?;
                Ok(format!("Bearer {}", token.token.secret()))
            }
        }
    }
}

impl std::fmt::Debug for NetworkCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => write!(f, "NetworkCredential::AccessToken(****)"),
            Self::TokenCredential(_) => write!(f, "NetworkCredential::TokenCredential"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[tokio::test]
    async fn access_token_resolves_to_bearer_header() {
        let credential = NetworkCredential::access_token("abc.def.ghi");
        let header = credential
            .resolve("https://management.azure.com/.default")
            .await
            .expect("should resolve");

        assert_eq!(header, "Bearer abc.def.ghi");
    }

    #[test]
    fn debug_hides_token() {
        let credential = NetworkCredential::access_token("super-secret-token");
        let printed = format!("{credential:?}");

        assert!(!printed.contains("super-secret-token"));
        assert!(printed.contains("****"));
    }

    #[tokio::test]
    #[serial]
    async fn from_env_prefers_access_token() {
        let original = std::env::var(ACCESS_TOKEN_ENV).ok();
        std::env::set_var(ACCESS_TOKEN_ENV, "env-token");

        let credential = NetworkCredential::from_env().expect("should build");
        assert!(matches!(credential, NetworkCredential::AccessToken(_)));
        let header = credential.resolve("scope").await.unwrap();
        assert_eq!(header, "Bearer env-token");

        match original {
            Some(val) => std::env::set_var(ACCESS_TOKEN_ENV, val),
            None => std::env::remove_var(ACCESS_TOKEN_ENV),
        }
    }
}
