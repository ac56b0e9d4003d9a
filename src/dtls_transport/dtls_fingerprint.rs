use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// DTLSFingerprint specifies the hash function algorithm and certificate
/// fingerprint as described in [RFC 4572].
///
/// ## Specifications
///
/// * [W3C]
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#rtcdtlsfingerprint
/// [RFC 4572]: https://tools.ietf.org/html/rfc4572
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCDtlsFingerprint {
    /// Algorithm specifies one of the the hash function algorithms defined in
    /// the 'Hash function Textual Names' registry.
    pub algorithm: String,

    /// Value specifies the value of the certificate fingerprint in lowercase
    /// hex string as expressed utilizing the syntax of 'fingerprint' in
    /// <https://tools.ietf.org/html/rfc4572#section-5>.
    pub value: String,
}

impl TryFrom<&str> for RTCDtlsFingerprint {
    type Error = Error;

    /// Parses the value of an `a=fingerprint` attribute, `<algorithm> <value>`.
    fn try_from(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(' ').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(Error::ErrSessionDescriptionInvalidFingerprint);
        }

        Ok(RTCDtlsFingerprint {
            algorithm: parts[0].to_lowercase(),
            value: parts[1].to_lowercase(),
        })
    }
}
