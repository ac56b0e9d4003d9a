use std::fmt;

/// RtpTransceiverDirection indicates the direction of a media section.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RtpTransceiverDirection {
    #[default]
    Unspecified,

    /// Sendrecv indicates the sender will offer
    /// to send RTP and the receiver will offer to receive RTP.
    Sendrecv,

    /// Sendonly indicates the sender will offer to send RTP.
    Sendonly,

    /// Recvonly indicates the receiver will offer to receive RTP.
    Recvonly,

    /// Inactive indicates neither side sends nor receives RTP.
    Inactive,
}

const RTP_TRANSCEIVER_DIRECTION_SENDRECV_STR: &str = "sendrecv";
const RTP_TRANSCEIVER_DIRECTION_SENDONLY_STR: &str = "sendonly";
const RTP_TRANSCEIVER_DIRECTION_RECVONLY_STR: &str = "recvonly";
const RTP_TRANSCEIVER_DIRECTION_INACTIVE_STR: &str = "inactive";

impl From<&str> for RtpTransceiverDirection {
    fn from(raw: &str) -> Self {
        match raw {
            RTP_TRANSCEIVER_DIRECTION_SENDRECV_STR => RtpTransceiverDirection::Sendrecv,
            RTP_TRANSCEIVER_DIRECTION_SENDONLY_STR => RtpTransceiverDirection::Sendonly,
            RTP_TRANSCEIVER_DIRECTION_RECVONLY_STR => RtpTransceiverDirection::Recvonly,
            RTP_TRANSCEIVER_DIRECTION_INACTIVE_STR => RtpTransceiverDirection::Inactive,
            _ => RtpTransceiverDirection::Unspecified,
        }
    }
}

impl fmt::Display for RtpTransceiverDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RtpTransceiverDirection::Sendrecv => {
                write!(f, "{RTP_TRANSCEIVER_DIRECTION_SENDRECV_STR}")
            }
            RtpTransceiverDirection::Sendonly => {
                write!(f, "{RTP_TRANSCEIVER_DIRECTION_SENDONLY_STR}")
            }
            RtpTransceiverDirection::Recvonly => {
                write!(f, "{RTP_TRANSCEIVER_DIRECTION_RECVONLY_STR}")
            }
            RtpTransceiverDirection::Inactive => {
                write!(f, "{RTP_TRANSCEIVER_DIRECTION_INACTIVE_STR}")
            }
            _ => write!(f, "{}", crate::UNSPECIFIED_STR),
        }
    }
}

impl RtpTransceiverDirection {
    /// reverse indicate the opposite direction
    pub fn reverse(&self) -> RtpTransceiverDirection {
        match *self {
            RtpTransceiverDirection::Sendonly => RtpTransceiverDirection::Recvonly,
            RtpTransceiverDirection::Recvonly => RtpTransceiverDirection::Sendonly,
            _ => *self,
        }
    }

    /// The direction the remote side answers with when the local side offers
    /// `self`. A local sendrecv section is answered recvonly because the
    /// remote endpoint never sends on a send-direction transport.
    pub fn answer_for_send_offer(&self) -> RtpTransceiverDirection {
        match *self {
            RtpTransceiverDirection::Sendonly | RtpTransceiverDirection::Sendrecv => {
                RtpTransceiverDirection::Recvonly
            }
            _ => RtpTransceiverDirection::Inactive,
        }
    }

    pub fn has_send(&self) -> bool {
        matches!(self, Self::Sendrecv | Self::Sendonly)
    }

    pub fn has_recv(&self) -> bool {
        matches!(self, Self::Sendrecv | Self::Recvonly)
    }
}
