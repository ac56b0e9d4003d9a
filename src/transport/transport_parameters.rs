use serde::{Deserialize, Serialize};

use crate::dtls_transport::dtls_parameters::DTLSParameters;
use crate::ice_transport::ice_candidate::RTCIceCandidate;
use crate::ice_transport::ice_parameters::RTCIceParameters;

/// TransportLocalParameters are the parameters of the local endpoint sent
/// to the remote transport once they are known.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportLocalParameters {
    pub dtls_parameters: DTLSParameters,
}

/// TransportRemoteParameters describe the remote transport the session
/// connects to, as returned by the transport collaborator.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRemoteParameters {
    pub ice_parameters: RTCIceParameters,
    pub ice_candidates: Vec<RTCIceCandidate>,
    pub dtls_parameters: DTLSParameters,
}
