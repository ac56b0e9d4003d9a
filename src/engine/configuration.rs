use crate::engine::policy::bundle_policy::RTCBundlePolicy;
use crate::engine::policy::ice_transport_policy::RTCIceTransportPolicy;
use crate::engine::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;
use crate::engine::policy::sdp_semantics::RTCSdpSemantics;
use crate::ice_transport::ice_server::RTCIceServer;

/// Defines the parameters a negotiation engine has to be created with so
/// that its descriptions line up with what the sessions build: one bundled
/// transport with multiplexed RTCP.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfiguration {
    /// Defines a slice describing servers available to be used by
    /// ICE, such as STUN and TURN servers.
    pub ice_servers: Vec<RTCIceServer>,

    /// Indicates which candidates the ICE Agent is allowed
    /// to use.
    pub ice_transport_policy: RTCIceTransportPolicy,

    /// Indicates which media-bundling policy to use when gathering
    /// ICE candidates.
    pub bundle_policy: RTCBundlePolicy,

    /// Indicates which rtcp-mux policy to use when gathering ICE
    /// candidates.
    pub rtcp_mux_policy: RTCRtcpMuxPolicy,

    pub sdp_semantics: RTCSdpSemantics,
}
