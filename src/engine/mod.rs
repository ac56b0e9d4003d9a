pub mod capabilities;
pub mod configuration;
pub mod offer_answer_options;
pub mod policy;
pub mod signaling_state;

use std::sync::Arc;

use offer_answer_options::RTCOfferOptions;
use signaling_state::RTCSignalingState;

use crate::error::Result;
use crate::rtp_transceiver::{RtpReceiver, RtpSender, RtpTransceiver};
use crate::sdp::session_description::RTCSessionDescription;
use crate::track::MediaStream;

/// NegotiationEngine is the native offer/answer engine a session drives.
///
/// Every call may suspend for as long as the engine needs; the session never
/// issues two calls on the same engine concurrently. Engines report the
/// failure of creating a local description without any sending track as
/// [`crate::Error::ErrNoSendingTracks`].
#[async_trait::async_trait]
pub trait NegotiationEngine: Send + Sync {
    async fn create_offer(&self, options: Option<RTCOfferOptions>)
        -> Result<RTCSessionDescription>;

    async fn create_answer(&self) -> Result<RTCSessionDescription>;

    async fn set_local_description(&self, desc: RTCSessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: RTCSessionDescription) -> Result<()>;

    /// The description applied by the last successful `set_local_description`.
    async fn local_description(&self) -> Option<RTCSessionDescription>;

    async fn signaling_state(&self) -> RTCSignalingState;

    /// attach_local_stream makes the engine send exactly the tracks of
    /// `stream`: tracks it does not know yet get a sender, tracks no longer
    /// in the stream lose theirs.
    async fn attach_local_stream(&self, stream: &MediaStream) -> Result<()>;

    async fn current_senders(&self) -> Vec<Arc<dyn RtpSender>>;

    async fn current_receivers(&self) -> Vec<Arc<dyn RtpReceiver>>;

    async fn current_transceivers(&self) -> Vec<Arc<dyn RtpTransceiver>>;

    async fn close(&self) -> Result<()>;
}
