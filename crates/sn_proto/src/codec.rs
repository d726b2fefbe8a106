//! Envelope codec — the portable text form of an envelope.
//!
//! Token layout, before encoding:
//!
//!   [ version (1) | salt (16) | nonce (12) | ciphertext + tag ]
//!
//! encoded with URL-safe base64, no padding. The same token is stored at
//! rest as an encrypted note's `data` field and embedded in share links,
//! so it must survive a URL fragment unescaped.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use sn_crypto::{Envelope, KdfScheme, NONCE_LEN, SALT_LEN};

use crate::error::ProtoError;

/// Anything shorter cannot hold a version byte, salt and nonce.
const MIN_DECODED_LEN: usize = 1 + SALT_LEN + NONCE_LEN;

pub fn pack(envelope: &Envelope) -> String {
    let mut raw = Vec::with_capacity(MIN_DECODED_LEN + envelope.ciphertext.len());
    raw.push(envelope.scheme.version_byte());
    raw.extend_from_slice(&envelope.salt);
    raw.extend_from_slice(&envelope.nonce);
    raw.extend_from_slice(&envelope.ciphertext);
    URL_SAFE_NO_PAD.encode(raw)
}

pub fn unpack(token: &str) -> Result<Envelope, ProtoError> {
    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| ProtoError::MalformedEnvelope("not URL-safe base64".into()))?;
    if raw.len() < MIN_DECODED_LEN {
        return Err(ProtoError::MalformedEnvelope(format!(
            "decoded length {} below minimum {MIN_DECODED_LEN}",
            raw.len()
        )));
    }
    let scheme = KdfScheme::from_version_byte(raw[0]).ok_or_else(|| {
        ProtoError::MalformedEnvelope(format!("unknown scheme version {}", raw[0]))
    })?;

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&raw[1..1 + SALT_LEN]);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&raw[1 + SALT_LEN..MIN_DECODED_LEN]);

    Ok(Envelope {
        scheme,
        salt,
        nonce,
        ciphertext: raw[MIN_DECODED_LEN..].to_vec(),
    })
}
