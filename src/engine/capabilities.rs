use std::fmt;

use serde::{Deserialize, Serialize};

use super::policy::sdp_semantics::RTCSdpSemantics;

/// TrackCorrelation is how a consumer finds its remote track once a receive
/// round has settled.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackCorrelation {
    /// Match the receiver whose stream id is `recv-stream-<consumerId>` and
    /// whose track id is `consumer-<kind>-<consumerId>`.
    #[default]
    #[serde(rename = "stream-and-track-id")]
    StreamAndTrackId,

    /// Match the receiver whose track id is `consumer-<kind>-<consumerId>`,
    /// for engines whose receivers do not report stream ids.
    #[serde(rename = "track-id")]
    TrackId,

    /// Match the transceiver whose `mid` equals the consumer's `mid`.
    #[serde(rename = "mid")]
    Mid,
}

/// EngineCapabilities is the strategy a session is parameterized with. It is
/// fixed for the lifetime of the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCapabilities {
    pub sdp_semantics: RTCSdpSemantics,
    pub track_correlation: TrackCorrelation,
    /// Whether senders can swap their track without a new round.
    pub replace_track: bool,
    /// Whether receive offers lead with an always open data channel section,
    /// so the engine keeps the transport up while no consumer is open.
    pub data_channel_section: bool,
}

impl Default for EngineCapabilities {
    fn default() -> Self {
        HandlerVariant::default().capabilities()
    }
}

/// HandlerVariant names an engine family and the version range sharing the
/// same negotiation behavior.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerVariant {
    Chrome55,
    #[default]
    Chrome67,
    Firefox50,
    Firefox59,
}

const HANDLER_VARIANT_CHROME55_STR: &str = "Chrome55";
const HANDLER_VARIANT_CHROME67_STR: &str = "Chrome67";
const HANDLER_VARIANT_FIREFOX50_STR: &str = "Firefox50";
const HANDLER_VARIANT_FIREFOX59_STR: &str = "Firefox59";

impl HandlerVariant {
    /// detect picks the variant for an engine family and major version,
    /// or `None` when the engine is too old or unknown.
    pub fn detect(family: &str, major_version: u32) -> Option<Self> {
        match family.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => match major_version {
                67.. => Some(HandlerVariant::Chrome67),
                55..=66 => Some(HandlerVariant::Chrome55),
                _ => None,
            },
            "firefox" => match major_version {
                59.. => Some(HandlerVariant::Firefox59),
                50..=58 => Some(HandlerVariant::Firefox50),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn capabilities(&self) -> EngineCapabilities {
        match *self {
            HandlerVariant::Chrome55 => EngineCapabilities {
                sdp_semantics: RTCSdpSemantics::PlanB,
                track_correlation: TrackCorrelation::StreamAndTrackId,
                replace_track: false,
                data_channel_section: false,
            },
            HandlerVariant::Chrome67 => EngineCapabilities {
                sdp_semantics: RTCSdpSemantics::PlanB,
                track_correlation: TrackCorrelation::StreamAndTrackId,
                replace_track: true,
                data_channel_section: false,
            },
            HandlerVariant::Firefox50 => EngineCapabilities {
                sdp_semantics: RTCSdpSemantics::UnifiedPlan,
                track_correlation: TrackCorrelation::TrackId,
                replace_track: true,
                data_channel_section: true,
            },
            HandlerVariant::Firefox59 => EngineCapabilities {
                sdp_semantics: RTCSdpSemantics::UnifiedPlan,
                track_correlation: TrackCorrelation::Mid,
                replace_track: true,
                data_channel_section: false,
            },
        }
    }
}

impl fmt::Display for HandlerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            HandlerVariant::Chrome55 => HANDLER_VARIANT_CHROME55_STR,
            HandlerVariant::Chrome67 => HANDLER_VARIANT_CHROME67_STR,
            HandlerVariant::Firefox50 => HANDLER_VARIANT_FIREFOX50_STR,
            HandlerVariant::Firefox59 => HANDLER_VARIANT_FIREFOX59_STR,
        };
        write!(f, "{s}")
    }
}
