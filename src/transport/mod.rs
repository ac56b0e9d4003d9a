pub mod channel;
pub mod connection_state;
pub mod transport_parameters;

use std::fmt;

use connection_state::ConnectionState;
use transport_parameters::{TransportLocalParameters, TransportRemoteParameters};

use crate::error::Result;
use crate::rtp_transceiver::rtp_parameters::RtpParameters;

/// TransportDirection tells whether a session sends or receives media.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportDirection {
    Send,
    Recv,
}

impl fmt::Display for TransportDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TransportDirection::Send => write!(f, "send"),
            TransportDirection::Recv => write!(f, "recv"),
        }
    }
}

/// TransportHandler is the collaborator owning the remote end of the
/// transport. A session calls it at most once through
/// `on_need_create_transport`; every other callback is a notification.
#[async_trait::async_trait]
pub trait TransportHandler: Send + Sync {
    /// Requests the parameters of the remote transport. Send sessions pass
    /// the local parameters they already computed, receive sessions pass
    /// `None` and report theirs later through `on_need_update_transport`.
    async fn on_need_create_transport(
        &self,
        direction: TransportDirection,
        local: Option<TransportLocalParameters>,
    ) -> Result<TransportRemoteParameters>;

    /// The local parameters of a receive session are final.
    async fn on_need_update_transport(
        &self,
        _direction: TransportDirection,
        _local: TransportLocalParameters,
    ) -> Result<()> {
        Ok(())
    }

    /// A producer is now sent with different RTP parameters.
    async fn on_need_update_producer(
        &self,
        _producer_id: &str,
        _rtp_parameters: RtpParameters,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_connection_state_change(&self, _state: ConnectionState) {}
}
