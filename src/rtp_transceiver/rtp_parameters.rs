use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::rtp_codec::MediaKind;
use super::{PayloadType, SSRC};

/// RtcpFeedback signals the connection to use additional RTCP packet types.
/// <https://draft.ortc.org/#dom-rtcrtcpfeedback>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtcpFeedback {
    /// Type is the type of feedback.
    /// see: <https://draft.ortc.org/#dom-rtcrtcpfeedback>
    /// valid: ack, ccm, nack, goog-remb, transport-cc
    #[serde(rename = "type")]
    pub typ: String,

    /// The parameter value depends on the type.
    /// For example, type="nack" parameter="pli" will send Picture Loss Indicator packets.
    pub parameter: String,
}

/// RtpCodecParameters describes a codec negotiated for one kind, including
/// the payload type agreed on during capability negotiation.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpCodecParameters {
    pub mime_type: String,
    pub payload_type: PayloadType,
    pub clock_rate: u32,
    pub channels: u16,
    pub sdp_fmtp_line: String,
    pub rtcp_feedback: Vec<RtcpFeedback>,
}

impl RtpCodecParameters {
    /// Codec name as it appears in an `a=rtpmap` line.
    pub fn name(&self) -> &str {
        match self.mime_type.split_once('/') {
            Some((_, name)) => name,
            None => &self.mime_type,
        }
    }
}

/// RtpHeaderExtensionParameters represents a negotiated RFC5285 RTP header extension.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpHeaderExtensionParameters {
    pub uri: String,
    pub id: u16,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtxParameters {
    pub ssrc: SSRC,
}

/// RtpEncodingParameters describes one RTP stream of a track. Simulcast
/// tracks carry one encoding per layer.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpEncodingParameters {
    pub ssrc: SSRC,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtx: Option<RtxParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<SmolStr>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtcpParameters {
    pub cname: String,
    #[serde(default)]
    pub reduced_size: bool,
}

/// RtpParameters is the full set of negotiated codecs, header extensions,
/// encodings and RTCP settings for one producer or consumer.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<SmolStr>,
    pub codecs: Vec<RtpCodecParameters>,
    #[serde(default)]
    pub header_extensions: Vec<RtpHeaderExtensionParameters>,
    #[serde(default)]
    pub encodings: Vec<RtpEncodingParameters>,
    #[serde(default)]
    pub rtcp: RtcpParameters,
}

/// Negotiated RTP parameters per kind, as produced by capability negotiation
/// before a session is constructed.
pub type RtpParametersByKind = HashMap<MediaKind, RtpParameters>;

/// RtpCodecCapability provides information about a codec the engine can handle.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpCodecCapability {
    pub kind: MediaKind,
    pub mime_type: String,
    pub preferred_payload_type: PayloadType,
    pub clock_rate: u32,
    pub channels: u16,
    pub sdp_fmtp_line: String,
    pub rtcp_feedback: Vec<RtcpFeedback>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpHeaderExtensionCapability {
    pub kind: MediaKind,
    pub uri: String,
    pub preferred_id: u16,
}

/// RtpCapabilities is the list of codecs and header extensions an engine
/// advertises in its own offers.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpCapabilities {
    pub codecs: Vec<RtpCodecCapability>,
    pub header_extensions: Vec<RtpHeaderExtensionCapability>,
}
