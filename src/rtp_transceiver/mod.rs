pub mod rtp_codec;
pub mod rtp_parameters;
pub mod rtp_transceiver_direction;

use std::sync::Arc;

use smol_str::SmolStr;

use crate::error::Result;
use crate::track::MediaStreamTrack;

/// SSRC represents a synchronization source
/// A synchronization source is a randomly chosen
/// value meant to be globally unique within a particular
/// RTP session. Used to identify a single stream of media.
/// <https://tools.ietf.org/html/rfc3550#section-3>
#[allow(clippy::upper_case_acronyms)]
pub type SSRC = u32;

/// PayloadType identifies the format of the RTP payload and determines
/// its interpretation by the application. Each codec in a RTP Session
/// will have a different PayloadType
/// <https://tools.ietf.org/html/rfc3550#section-3>
pub type PayloadType = u8;

/// RtpSender is the engine's handle on one outbound RTP stream.
#[async_trait::async_trait]
pub trait RtpSender: Send + Sync {
    /// The track currently attached to this sender, if any.
    async fn track(&self) -> Option<Arc<MediaStreamTrack>>;

    /// Swaps the outgoing track without renegotiation. Engines that can not
    /// do this return [`crate::Error::ErrReplaceTrackUnsupported`].
    async fn replace_track(&self, track: Option<Arc<MediaStreamTrack>>) -> Result<()>;
}

/// RtpReceiver is the engine's handle on one inbound RTP stream.
#[async_trait::async_trait]
pub trait RtpReceiver: Send + Sync {
    async fn track(&self) -> Arc<MediaStreamTrack>;

    /// Ids of the remote media streams the track belongs to, as announced
    /// by `a=msid` or `a=ssrc:<ssrc> msid` in the remote description.
    async fn stream_ids(&self) -> Vec<String>;
}

/// RtpTransceiver pairs a sender and a receiver sharing one media section.
#[async_trait::async_trait]
pub trait RtpTransceiver: Send + Sync {
    async fn mid(&self) -> Option<SmolStr>;
    async fn sender(&self) -> Option<Arc<dyn RtpSender>>;
    async fn receiver(&self) -> Option<Arc<dyn RtpReceiver>>;
}
