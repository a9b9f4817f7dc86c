//! Bearer token verification
//!
//! Tokens are compact JWS strings signed with HMAC-SHA256. The claims carry
//! the caller's `store_id` and `org_id`, which become the provenance fields of
//! every contract created during that request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SUPPORTED_ALGORITHM: &str = "HS256";

/// Authenticated caller, resolved from the bearer credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub store_id: String,
    pub org_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header missing")]
    MissingHeader,
    #[error("Authorization header must use the Bearer scheme")]
    WrongScheme,
    #[error("Token decode error: {0}")]
    Malformed(String),
    #[error("Token decode error: unsupported algorithm {0}")]
    UnsupportedAlgorithm(String),
    #[error("Token decode error: signature verification failed")]
    BadSignature,
    #[error("Token decode error: token expired")]
    Expired,
    #[error("Token is missing the {0} claim")]
    MissingClaim(&'static str),
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Token claims understood by this service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    /// Expiry, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Verifies HS256 bearer tokens against a shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Resolve the caller from a raw `Authorization` header value
    pub fn identify(&self, header: Option<&str>) -> Result<CallerIdentity, AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AuthError::WrongScheme)?
            .trim();
        let claims = self.verify(token, chrono::Utc::now().timestamp())?;

        let store_id = claims
            .store_id
            .filter(|s| !s.trim().is_empty())
            .ok_or(AuthError::MissingClaim("store_id"))?;
        let org_id = claims
            .org_id
            .filter(|s| !s.trim().is_empty())
            .ok_or(AuthError::MissingClaim("org_id"))?;

        Ok(CallerIdentity { store_id, org_id })
    }

    /// Check signature and expiry, returning the decoded claims
    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::Malformed("expected three segments".to_string()));
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != SUPPORTED_ALGORITHM {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        let mut mac = self.mac();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims: Claims = decode_segment(payload_b64)?;
        if claims.exp.is_some_and(|exp| exp <= now) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    /// Sign a token for the given claims
    #[cfg(test)]
    pub fn issue(&self, claims: &Claims) -> String {
        let header = Header {
            alg: SUPPORTED_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };
        let header_b64 = encode_segment(&header);
        let payload_b64 = encode_segment(claims);

        let mut mac = self.mac();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{header_b64}.{payload_b64}.{signature}")
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).unwrap_or_else(|_| unreachable!())
    }
}

#[cfg(test)]
fn encode_segment<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_vec(value).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::Malformed(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::Malformed(e.to_string()))
}
