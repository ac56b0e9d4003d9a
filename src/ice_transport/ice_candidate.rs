use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ice_transport::ice_candidate_type::RTCIceCandidateType;
use crate::ice_transport::ice_protocol::RTCIceProtocol;

/// ICECandidate represents a remote ice candidate as handed over by the
/// signaling server together with the other transport parameters.
///
/// ## Specifications
///
/// * [W3C]
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#rtcicecandidate-interface
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidate {
    pub foundation: String,
    pub priority: u32,
    #[serde(alias = "ip")]
    pub address: String,
    pub protocol: RTCIceProtocol,
    pub port: u16,
    #[serde(rename = "type")]
    pub typ: RTCIceCandidateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_port: Option<u16>,
}

impl RTCIceCandidate {
    /// marshal renders the value of an `a=candidate` attribute for the given
    /// component.
    pub fn marshal(&self, component: u16) -> String {
        let mut val = format!(
            "{} {} {} {} {} {} typ {}",
            self.foundation,
            component,
            self.protocol,
            self.priority,
            self.address,
            self.port,
            self.typ
        );

        if let Some(tcp_type) = &self.tcp_type {
            val += format!(" tcptype {tcp_type}").as_str();
        }

        if let (Some(related_address), Some(related_port)) =
            (&self.related_address, self.related_port)
        {
            val += format!(" raddr {related_address} rport {related_port}").as_str();
        }

        val
    }
}

impl TryFrom<&str> for RTCIceCandidate {
    type Error = Error;

    /// Parses the value of an `a=candidate` attribute.
    fn try_from(raw: &str) -> Result<Self> {
        let raw = raw.strip_prefix("candidate:").unwrap_or(raw);
        let split: Vec<&str> = raw.split_whitespace().collect();
        if split.len() < 8 || split[6] != "typ" {
            return Err(Error::ErrICECandidateInvalid(raw.to_owned()));
        }

        let priority = split[3]
            .parse::<u32>()
            .map_err(|_| Error::ErrICECandidateInvalid(raw.to_owned()))?;
        let port = split[5]
            .parse::<u16>()
            .map_err(|_| Error::ErrICECandidateInvalid(raw.to_owned()))?;

        let mut candidate = RTCIceCandidate {
            foundation: split[0].to_owned(),
            priority,
            address: split[4].to_owned(),
            protocol: RTCIceProtocol::from(split[2]),
            port,
            typ: RTCIceCandidateType::from(split[7]),
            ..Default::default()
        };

        let mut extensions = split[8..].chunks(2);
        while let Some([key, value]) = extensions.next() {
            match *key {
                "tcptype" => candidate.tcp_type = Some((*value).to_owned()),
                "raddr" => candidate.related_address = Some((*value).to_owned()),
                "rport" => candidate.related_port = value.parse::<u16>().ok(),
                _ => {}
            }
        }

        Ok(candidate)
    }
}

impl fmt::Display for RTCIceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{}",
            self.protocol, self.typ, self.address, self.port,
        )
    }
}
