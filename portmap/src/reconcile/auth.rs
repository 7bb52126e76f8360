//! Bearer tokens for the Sheets API.
//!
//! Either a fixed access token, or a Google service account that signs an
//! RS256 assertion and trades it for a short-lived token at the OAuth token
//! endpoint. Minted tokens are cached until shortly before they expire.

use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::debug;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::sheets::check_status;
use crate::error::{GridError, Result};

/// OAuth scope for reading and writing spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Google's OAuth 2.0 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for a signed assertion; Google caps it at one hour.
const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);

/// Refresh a minted token this long before its reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Service account identity used to mint access tokens.
#[derive(Clone)]
pub struct ServiceAccount {
    pub email: String,
    /// PEM-encoded RSA private key. Literal `\n` sequences are accepted.
    pub private_key: SecretString,
    pub token_uri: String,
}

impl ServiceAccount {
    pub fn new(email: impl Into<String>, private_key: SecretString) -> Self {
        Self {
            email: email.into(),
            private_key,
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }

    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Signed JWT asking for the spreadsheets scope, issued at `now`.
    fn assertion(&self, now: u64) -> Result<String> {
        let claims = Claims {
            iss: &self.email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME.as_secs(),
        };
        let pem = self.private_key.expose_secret().replace("\\n", "\n");
        let key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(GridError::Signing)?;
        let token = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(GridError::Signing)?;
        Ok(token)
    }

    async fn fetch_token(&self, client: &reqwest::Client) -> Result<MintedToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let assertion = self.assertion(now)?;
        debug!("POST {} (service account {})", self.token_uri, self.email);

        let response = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(GridError::Http)?;
        let body: TokenResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(GridError::Http)?;

        let lifetime = body
            .expires_in
            .map_or(ASSERTION_LIFETIME, Duration::from_secs);
        Ok(MintedToken {
            token: SecretString::from(body.access_token),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("email", &self.email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// How the grid authenticates to the Sheets API.
#[derive(Debug, Clone)]
pub enum SheetAuth {
    /// Pre-minted bearer token, used as is.
    Token(SecretString),
    ServiceAccount(ServiceAccount),
}

impl From<SecretString> for SheetAuth {
    fn from(token: SecretString) -> Self {
        Self::Token(token)
    }
}

impl From<ServiceAccount> for SheetAuth {
    fn from(account: ServiceAccount) -> Self {
        Self::ServiceAccount(account)
    }
}

struct MintedToken {
    token: SecretString,
    refresh_at: Instant,
}

/// Hands out a valid bearer token, minting a new one when needed.
pub struct TokenSource {
    auth: SheetAuth,
    minted: Option<MintedToken>,
}

impl TokenSource {
    pub fn new(auth: SheetAuth) -> Self {
        Self { auth, minted: None }
    }

    pub async fn bearer(&mut self, client: &reqwest::Client) -> Result<&str> {
        let account = match &self.auth {
            SheetAuth::Token(token) => return Ok(token.expose_secret()),
            SheetAuth::ServiceAccount(account) => account,
        };
        let minted = match self.minted.take() {
            Some(minted) if Instant::now() < minted.refresh_at => minted,
            _ => account.fetch_token(client).await?,
        };
        Ok(self.minted.insert(minted).token.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation};

    const TEST_KEY: &str = include_str!("../../tests/fixtures/service_account.pem");

    #[derive(Debug, Deserialize)]
    struct DecodedClaims {
        iss: String,
        scope: String,
        aud: String,
        iat: u64,
        exp: u64,
    }

    fn account() -> ServiceAccount {
        ServiceAccount::new("bot@project.iam.gserviceaccount.com", SecretString::from(TEST_KEY.to_string()))
    }

    fn decode(token: &str) -> DecodedClaims {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_audience(&[DEFAULT_TOKEN_URI]);
        jsonwebtoken::decode::<DecodedClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .unwrap()
            .claims
    }

    #[test]
    fn test_assertion_claims() {
        let token = account().assertion(1_700_000_000).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);

        let claims = decode(&token);
        assert_eq!(claims.iss, "bot@project.iam.gserviceaccount.com");
        assert_eq!(claims.scope, SPREADSHEETS_SCOPE);
        assert_eq!(claims.aud, DEFAULT_TOKEN_URI);
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_003_600);
    }

    #[test]
    fn test_escaped_newlines_in_key() {
        let escaped = TEST_KEY.replace('\n', "\\n");
        let account = ServiceAccount::new("bot@x", SecretString::from(escaped));
        assert!(account.assertion(0).is_ok());
    }

    #[test]
    fn test_bad_key_is_signing_error() {
        let account = ServiceAccount::new("bot@x", SecretString::from("not a key".to_string()));
        let err = account.assertion(0).unwrap_err();
        assert!(matches!(err, crate::Error::Grid(GridError::Signing(_))));
    }

    #[tokio::test]
    async fn test_static_token_needs_no_request() {
        let mut source = TokenSource::new(SheetAuth::from(SecretString::from("fixed".to_string())));
        let client = reqwest::Client::new();
        assert_eq!(source.bearer(&client).await.unwrap(), "fixed");
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", account());
        assert!(!debug.contains("PRIVATE KEY"));
        assert!(debug.contains("bot@project"));
    }
}
