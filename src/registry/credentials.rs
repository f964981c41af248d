// ABOUTME: Decoding of registry authorization tokens into login credentials.
// ABOUTME: Tokens are base64 of "username:secret".

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::traits::AuthorizationToken;

/// Username/secret pair for a registry endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
    pub endpoint: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("authorization token is not valid base64")]
    Encoding,

    #[error("authorization token is not valid UTF-8")]
    Utf8,

    #[error("authorization token is not of the form username:secret")]
    Format,
}

impl Credentials {
    pub fn decode(token: &AuthorizationToken) -> Result<Self, CredentialsError> {
        let bytes = STANDARD
            .decode(token.token.trim())
            .map_err(|_| CredentialsError::Encoding)?;
        let decoded = String::from_utf8(bytes).map_err(|_| CredentialsError::Utf8)?;
        let (username, secret) = decoded.split_once(':').ok_or(CredentialsError::Format)?;

        if username.is_empty() {
            return Err(CredentialsError::Format);
        }

        Ok(Self {
            username: username.to_string(),
            secret: secret.to_string(),
            endpoint: token.endpoint.clone(),
        })
    }
}
