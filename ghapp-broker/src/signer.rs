//! GitHub App JWT generation
//!
//! The App proves its identity to GitHub with a short-lived RS256 JWT signed by
//! its private key. GitHub rejects assertions valid for longer than ten minutes.

use crate::config::AppConfig;
use crate::error::BrokerError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Assertion lifetime in seconds
pub const ASSERTION_TTL_SECS: i64 = 600;

/// Source of wall-clock time, replaceable in tests
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> i64;
}

/// [`Clock`] backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

/// Claims of the App assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// A compact-serialized, signed App JWT. Never persisted.
#[derive(Clone)]
pub struct SignedAssertion {
    token: String,
    claims: AssertionClaims,
}

impl SignedAssertion {
    /// The compact JWT, suitable for a bearer `Authorization` header
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &AssertionClaims {
        &self.claims
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedAssertion")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

/// Signs App assertions from the stored configuration
#[derive(Clone)]
pub struct AssertionSigner {
    clock: Arc<dyn Clock>,
}

impl Default for AssertionSigner {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl AssertionSigner {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Produce a fresh assertion for `config`.
    ///
    /// Fails with [`BrokerError::ConfigMissing`] when no configuration is
    /// stored and with [`BrokerError::KeyFormat`] when the key is not a PKCS#1
    /// `RSA PRIVATE KEY` PEM block.
    pub fn sign(&self, config: Option<&AppConfig>) -> Result<SignedAssertion, BrokerError> {
        let config = config.ok_or(BrokerError::ConfigMissing)?;

        RsaPrivateKey::from_pkcs1_pem(&config.private_key)
            .map_err(|e| BrokerError::KeyFormat(e.to_string()))?;

        let key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|e| BrokerError::Signing(e.to_string()))?;

        let iat = self.clock.now_secs();
        let claims = AssertionClaims {
            iss: config.app_id.to_string(),
            iat,
            exp: iat + ASSERTION_TTL_SECS,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| BrokerError::Signing(e.to_string()))?;

        Ok(SignedAssertion { token, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_keypair, FixedClock};
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    const TEST_TIMESTAMP: i64 = 1706900000;

    fn signer() -> AssertionSigner {
        AssertionSigner::new(Arc::new(FixedClock(TEST_TIMESTAMP)))
    }

    fn config(app_id: u64) -> AppConfig {
        AppConfig {
            private_key: test_keypair().private_pem.clone(),
            app_id,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims::<&str>(&[]);
        validation
    }

    #[test]
    fn test_claims_window_is_600_seconds() {
        let assertion = signer().sign(Some(&config(12345))).unwrap();

        let claims = assertion.claims();
        assert_eq!(claims.iss, "12345");
        assert_eq!(claims.iat, TEST_TIMESTAMP);
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_header_is_rs256_jwt() {
        let assertion = signer().sign(Some(&config(1))).unwrap();

        let header = decode_header(assertion.as_str()).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_signature_verifies_with_public_key() {
        let assertion = signer().sign(Some(&config(42))).unwrap();

        let key = DecodingKey::from_rsa_pem(test_keypair().public_pem.as_bytes()).unwrap();
        let decoded = decode::<AssertionClaims>(assertion.as_str(), &key, &validation())
            .expect("assertion should verify with the matching public key");

        assert_eq!(decoded.claims, *assertion.claims());
        assert_eq!(decoded.claims.iss, "42");
    }

    #[test]
    fn test_missing_config() {
        let result = signer().sign(None);
        assert!(matches!(result, Err(BrokerError::ConfigMissing)));
    }

    #[test]
    fn test_empty_key_is_key_format_error() {
        let config = AppConfig {
            private_key: String::new(),
            app_id: 12345,
        };
        let result = signer().sign(Some(&config));
        assert!(matches!(result, Err(BrokerError::KeyFormat(_))));
    }

    #[test]
    fn test_garbage_key_is_key_format_error() {
        let config = AppConfig {
            private_key: "invalid-key".to_string(),
            app_id: 12345,
        };
        let result = signer().sign(Some(&config));
        assert!(matches!(result, Err(BrokerError::KeyFormat(_))));
    }

    #[test]
    fn test_pkcs8_key_is_rejected() {
        let config = AppConfig {
            private_key: test_keypair().pkcs8_pem.clone(),
            app_id: 12345,
        };
        let result = signer().sign(Some(&config));
        assert!(matches!(result, Err(BrokerError::KeyFormat(_))));
    }

    #[test]
    fn test_each_call_uses_current_time() {
        let clock = Arc::new(crate::test_support::SteppingClock::new(TEST_TIMESTAMP));
        let signer = AssertionSigner::new(clock.clone());

        let first = signer.sign(Some(&config(1))).unwrap();
        clock.advance(30);
        let second = signer.sign(Some(&config(1))).unwrap();

        assert_eq!(second.claims().iat - first.claims().iat, 30);
        assert_ne!(first.as_str(), second.as_str());
    }
}
