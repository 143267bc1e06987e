use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use porteiro_core::error::{Error, Result};
use porteiro_core::session::Session;

/// Bump when the persisted session layout changes; older blobs are
/// rejected on restore and the user logs in again.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    expires_at: DateTime<Utc>,
    session: Session,
}

#[derive(Debug, Deserialize)]
struct EnvelopeHead {
    version: u32,
}

/// Seals sessions into a signed, time-bounded blob and verifies them on the
/// way back. The signature is a sha256 keyed hash compared in constant time;
/// any defect (signature, version, expiry, encoding) rejects the blob.
pub struct SessionSealer {
    secret: SecretString,
    ttl: Duration,
}

impl SessionSealer {
    pub fn new(secret: SecretString, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn seal(&self, session: &Session) -> Result<String> {
        let envelope = Envelope {
            version: SESSION_SCHEMA_VERSION,
            expires_at: Utc::now() + self.ttl,
            session: session.clone(),
        };
        let payload = serde_json::to_vec(&envelope)
            .map_err(|e| Error::Store(format!("unable to encode session: {e}")))?;
        let signature = self.sign(&payload);
        Ok(format!(
            "{}.{}",
            BASE64_URL_SAFE_NO_PAD.encode(&payload),
            BASE64_URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    pub fn open(&self, blob: &str) -> Result<Session> {
        let (payload_b64, signature_b64) = blob
            .split_once('.')
            .ok_or_else(|| Error::validation("malformed session blob"))?;
        let payload = BASE64_URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| Error::validation("malformed session payload"))?;
        let signature = BASE64_URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| Error::validation("malformed session signature"))?;

        let expected = self.sign(&payload);
        if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
            return Err(Error::validation("session signature mismatch"));
        }

        // Check the version tag before decoding the full envelope; a future
        // schema may not decode at all.
        let head: EnvelopeHead = serde_json::from_slice(&payload)
            .map_err(|_| Error::validation("undecodable session payload"))?;
        if head.version != SESSION_SCHEMA_VERSION {
            return Err(Error::validation(format!(
                "unsupported session schema version {}",
                head.version
            )));
        }

        let envelope: Envelope = serde_json::from_slice(&payload)
            .map_err(|_| Error::validation("undecodable session payload"))?;
        if Utc::now() > envelope.expires_at {
            return Err(Error::validation("session expired"));
        }

        Ok(envelope.session)
    }

    fn sign(&self, payload: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.expose_secret().as_bytes());
        hasher.update(payload);
        hasher.finalize().into()
    }
}

impl std::fmt::Debug for SessionSealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSealer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
