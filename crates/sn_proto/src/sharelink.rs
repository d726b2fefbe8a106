//! Share links.
//!
//! The packed envelope travels in the URL *fragment*, which user agents do
//! not transmit to servers — the recipient needs only the link and the
//! password, with no network round trip to decrypt. All note metadata is
//! stripped: a share link is the envelope and nothing else.

use sn_crypto::Envelope;

use crate::codec;
use crate::error::ProtoError;

/// Build a share link with the packed envelope as the fragment.
pub fn to_link(base_url: &str, envelope: &Envelope) -> String {
    format!(
        "{}#{}",
        base_url.trim_end_matches('#'),
        codec::pack(envelope)
    )
}

/// Recover an envelope from a full share link or a bare token.
pub fn from_link(link: &str) -> Result<Envelope, ProtoError> {
    let token = match link.rsplit_once('#') {
        Some((_, fragment)) => fragment,
        None => link,
    };
    codec::unpack(token)
}
