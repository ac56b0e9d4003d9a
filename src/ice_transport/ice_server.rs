use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// ICEServer describes a single STUN and TURN server handed to the
/// negotiation engine.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCIceServer {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub credential: String,
}

impl RTCIceServer {
    /// validate checks that every TURN url comes with credentials.
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(Error::ErrNoIceServerUrls);
        }

        for url in &self.urls {
            let is_turn = url.starts_with("turn:") || url.starts_with("turns:");
            // https://www.w3.org/TR/webrtc/#set-the-configuration (step #11.3.2)
            if is_turn && (self.username.is_empty() || self.credential.is_empty()) {
                return Err(Error::ErrNoTurnCredentials);
            }
        }

        Ok(())
    }
}
