use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::api::{GoogleError, TokenResponse, CLOUD_PLATFORM_SCOPE, DEFAULT_TOKEN_URI};
use crate::Credential;

/// Lifetime of a signed assertion; Google rejects anything above one hour.
const ASSERTION_TTL_SECS: u64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields of a service-account key file this engine needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    #[serde(rename = "type")]
    pub account_type: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

impl ServiceAccount {
    /// Parse a service-account key file.
    pub fn from_credential(credential: &Credential) -> Result<Self, GoogleError> {
        if credential.is_empty() {
            return Err(GoogleError::ServiceAccount("credential is empty".to_string()));
        }
        let account: Self = serde_json::from_slice(credential.as_bytes())
            .map_err(|e| GoogleError::ServiceAccount(format!("Failed to parse JSON: {e}")))?;

        if account.account_type != "service_account" {
            return Err(GoogleError::ServiceAccount(format!(
                "expected type 'service_account', got '{}'",
                account.account_type
            )));
        }
        if account.client_email.is_empty() || account.private_key.is_empty() {
            return Err(GoogleError::ServiceAccount(
                "client_email and private_key must be set".to_string(),
            ));
        }
        Ok(account)
    }

    /// Claims for an assertion issued at `issued_at` (seconds since epoch).
    pub fn claims(&self, issued_at: u64) -> AssertionClaims {
        AssertionClaims {
            iss: self.client_email.clone(),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_TTL_SECS,
        }
    }

    /// Sign an RS256 assertion with the account's private key.
    pub fn assertion(&self, issued_at: u64) -> Result<String, GoogleError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&header, &self.claims(issued_at), &key)?)
    }

    /// Exchange a freshly signed assertion for an OAuth2 access token.
    pub fn fetch_access_token(
        &self,
        client: &reqwest::blocking::Client,
    ) -> Result<String, GoogleError> {
        let assertion = self.assertion(unix_now())?;
        log::debug!("Requesting access token for {} from {}", self.client_email, self.token_uri);

        let response = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GoogleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json()?;
        log::debug!("Access token granted (expires in {:?}s)", token.expires_in);
        Ok(token.access_token)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation};

    const ACCOUNT: &str = include_str!("../../../tests/fixtures/service_account.json");
    const PUBLIC_KEY: &str = include_str!("../../../tests/fixtures/service_account_public.pem");

    fn account() -> ServiceAccount {
        ServiceAccount::from_credential(&Credential::from(ACCOUNT.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn parses_key_file() {
        let account = account();
        assert_eq!(account.client_email, "speaker@cast-tts-test.iam.gserviceaccount.com");
        assert_eq!(account.token_uri, DEFAULT_TOKEN_URI);
        assert!(account.private_key_id.is_some());
    }

    #[test]
    fn token_uri_defaults_when_absent() {
        let json = r#"{"type":"service_account","client_email":"a@b","private_key":"k"}"#;
        let account =
            ServiceAccount::from_credential(&Credential::from(json.as_bytes().to_vec())).unwrap();
        assert_eq!(account.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn rejects_non_service_account_credentials() {
        let json = r#"{"type":"authorized_user","client_email":"a@b","private_key":"k"}"#;
        let err = ServiceAccount::from_credential(&Credential::from(json.as_bytes().to_vec()))
            .unwrap_err();
        assert!(err.to_string().contains("authorized_user"));
    }

    #[test]
    fn rejects_malformed_and_empty_credentials() {
        for bytes in [b"".to_vec(), b"not json".to_vec()] {
            let err = ServiceAccount::from_credential(&Credential::from(bytes)).unwrap_err();
            assert!(matches!(err, GoogleError::ServiceAccount(_)));
        }
    }

    #[test]
    fn claims_expire_after_one_hour() {
        let claims = account().claims(1_700_000_000);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.scope, CLOUD_PLATFORM_SCOPE);
        assert_eq!(claims.aud, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn assertion_verifies_with_public_key() {
        let account = account();
        let token = account.assertion(unix_now()).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid, account.private_key_id);

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[DEFAULT_TOKEN_URI]);
        let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
        let decoded = jsonwebtoken::decode::<AssertionClaims>(&token, &key, &validation).unwrap();
        assert_eq!(decoded.claims.iss, account.client_email);
    }

    #[test]
    fn unparsable_private_key_fails_signing() {
        let json = r#"{"type":"service_account","client_email":"a@b","private_key":"garbage"}"#;
        let account =
            ServiceAccount::from_credential(&Credential::from(json.as_bytes().to_vec())).unwrap();
        assert!(matches!(account.assertion(0), Err(GoogleError::Jwt(_))));
    }
}
