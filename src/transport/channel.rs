use tokio::sync::{mpsc, oneshot};

use super::connection_state::ConnectionState;
use super::transport_parameters::{TransportLocalParameters, TransportRemoteParameters};
use super::{TransportDirection, TransportHandler};
use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_parameters::RtpParameters;

/// TransportRequest is one callback of a session, delivered as a message.
/// Requests expecting an answer carry a single use responder.
#[derive(Debug)]
pub enum TransportRequest {
    CreateTransport {
        direction: TransportDirection,
        local: Option<TransportLocalParameters>,
        chan: oneshot::Sender<Result<TransportRemoteParameters>>,
    },
    UpdateTransport {
        direction: TransportDirection,
        local: TransportLocalParameters,
    },
    UpdateProducer {
        producer_id: String,
        rtp_parameters: RtpParameters,
    },
    ConnectionStateChange(ConnectionState),
}

/// TransportChannel forwards every session callback over an mpsc channel,
/// for applications that serve the signaling side from their own task.
#[derive(Debug, Clone)]
pub struct TransportChannel {
    tx: mpsc::Sender<TransportRequest>,
}

impl TransportChannel {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TransportRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (TransportChannel { tx }, rx)
    }
}

#[async_trait::async_trait]
impl TransportHandler for TransportChannel {
    async fn on_need_create_transport(
        &self,
        direction: TransportDirection,
        local: Option<TransportLocalParameters>,
    ) -> Result<TransportRemoteParameters> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(TransportRequest::CreateTransport {
                direction,
                local,
                chan: tx,
            })
            .await?;

        rx.await.map_err(|_| Error::ErrTransportRequestDropped)?
    }

    async fn on_need_update_transport(
        &self,
        direction: TransportDirection,
        local: TransportLocalParameters,
    ) -> Result<()> {
        self.tx
            .send(TransportRequest::UpdateTransport { direction, local })
            .await?;
        Ok(())
    }

    async fn on_need_update_producer(
        &self,
        producer_id: &str,
        rtp_parameters: RtpParameters,
    ) -> Result<()> {
        self.tx
            .send(TransportRequest::UpdateProducer {
                producer_id: producer_id.to_owned(),
                rtp_parameters,
            })
            .await?;
        Ok(())
    }

    async fn on_connection_state_change(&self, state: ConnectionState) {
        if let Err(err) = self
            .tx
            .send(TransportRequest::ConnectionStateChange(state))
            .await
        {
            log::debug!("Failed to forward connection state {}: {}", state, err);
        }
    }
}
