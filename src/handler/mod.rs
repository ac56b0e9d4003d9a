
pub mod consumer;
pub(crate) mod operation;
pub mod producer;
pub mod recv;
pub mod send;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::engine::capabilities::EngineCapabilities;
use crate::engine::offer_answer_options::RTCOfferOptions;
use crate::engine::signaling_state::{next_signaling_state, RTCSignalingState, StateChangeOp};
use crate::engine::NegotiationEngine;
use crate::error::{flatten_errs, Error, Result};
use crate::ice_transport::ice_connection_state::RTCIceConnectionState;
use crate::remote_sdp::RemoteSdp;
use crate::rtp_transceiver::rtp_parameters::{RtpCapabilities, RtpParametersByKind};
use crate::sdp::extract_rtp_capabilities;
use crate::sdp::sdp_type::RTCSdpType;
use crate::sdp::session_description::RTCSessionDescription;
use crate::settings::HandlerSettings;
use crate::transport::connection_state::ConnectionState;
use crate::transport::transport_parameters::{
    TransportLocalParameters, TransportRemoteParameters,
};
use crate::transport::{TransportDirection, TransportHandler};
use operation::Operations;

/// SessionState is the lifecycle of a negotiation session.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unspecified,

    /// No round has run yet.
    New,

    /// A round is exchanging transport parameters with the collaborator.
    TransportPending,

    /// Transport parameters have been exchanged; they never are again.
    Ready,

    Closed,
}

const SESSION_STATE_NEW_STR: &str = "new";
const SESSION_STATE_TRANSPORT_PENDING_STR: &str = "transport-pending";
const SESSION_STATE_READY_STR: &str = "ready";
const SESSION_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for SessionState {
    fn from(raw: &str) -> Self {
        match raw {
            SESSION_STATE_NEW_STR => SessionState::New,
            SESSION_STATE_TRANSPORT_PENDING_STR => SessionState::TransportPending,
            SESSION_STATE_READY_STR => SessionState::Ready,
            SESSION_STATE_CLOSED_STR => SessionState::Closed,
            _ => SessionState::Unspecified,
        }
    }
}

impl From<u8> for SessionState {
    fn from(v: u8) -> Self {
        match v {
            1 => SessionState::New,
            2 => SessionState::TransportPending,
            3 => SessionState::Ready,
            4 => SessionState::Closed,
            _ => SessionState::Unspecified,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            SessionState::New => SESSION_STATE_NEW_STR,
            SessionState::TransportPending => SESSION_STATE_TRANSPORT_PENDING_STR,
            SessionState::Ready => SESSION_STATE_READY_STR,
            SessionState::Closed => SESSION_STATE_CLOSED_STR,
            SessionState::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// Handshake is where a session stands in the one-shot exchange of
/// transport parameters. Only `New` asks the collaborator for the remote
/// transport, and only `Created` reports the local one.
#[derive(Debug)]
pub(crate) enum Handshake {
    New,
    /// Remote parameters are known, the local ones are not reported yet.
    Created(RemoteSdp),
    Ready(RemoteSdp),
}

impl Handshake {
    pub(crate) fn remote_sdp_mut(&mut self) -> Option<&mut RemoteSdp> {
        match self {
            Handshake::New => None,
            Handshake::Created(remote_sdp) | Handshake::Ready(remote_sdp) => Some(remote_sdp),
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, Handshake::Ready(_))
    }

    /// complete moves `Created` to `Ready`.
    pub(crate) fn complete(&mut self) {
        if let Handshake::Created(_) = self {
            if let Handshake::Created(remote_sdp) = std::mem::replace(self, Handshake::New) {
                *self = Handshake::Ready(remote_sdp);
            }
        }
    }
}

/// SessionCore is what both session directions share: the engine and the
/// collaborator, the round queue and the lifecycle.
pub(crate) struct SessionCore {
    pub(crate) direction: TransportDirection,
    pub(crate) engine: Arc<dyn NegotiationEngine>,
    pub(crate) transport: Arc<dyn TransportHandler>,
    pub(crate) settings: HandlerSettings,
    pub(crate) capabilities: EngineCapabilities,
    pub(crate) rtp_parameters_by_kind: RtpParametersByKind,
    pub(crate) handshake: Mutex<Handshake>,
    pub(crate) ops: Operations,

    state: AtomicU8,
    is_closed: AtomicBool,
}

impl SessionCore {
    pub(crate) fn new(
        direction: TransportDirection,
        engine: Arc<dyn NegotiationEngine>,
        transport: Arc<dyn TransportHandler>,
        settings: HandlerSettings,
        rtp_parameters_by_kind: RtpParametersByKind,
    ) -> Self {
        let capabilities = settings.capabilities();
        log::debug!(
            "new {} session [semantics:{}, correlation:{:?}, replace_track:{}]",
            direction,
            capabilities.sdp_semantics,
            capabilities.track_correlation,
            capabilities.replace_track
        );

        SessionCore {
            direction,
            engine,
            transport,
            settings,
            capabilities,
            rtp_parameters_by_kind,
            handshake: Mutex::new(Handshake::New),
            ops: Operations::new(),
            state: AtomicU8::new(SessionState::New as u8),
            is_closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state.load(Ordering::SeqCst).into()
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        if self.is_closed.load(Ordering::SeqCst) {
            return;
        }
        log::trace!("{} session state changed to {}", self.direction, state);
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::SeqCst)
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrSessionClosed);
        }
        Ok(())
    }

    pub(crate) fn new_remote_sdp(&self, remote: TransportRemoteParameters) -> RemoteSdp {
        let remote_sdp = RemoteSdp::new(
            self.capabilities.sdp_semantics,
            self.rtp_parameters_by_kind.clone(),
            remote,
        );
        if self.direction == TransportDirection::Recv && self.capabilities.data_channel_section {
            remote_sdp.with_data_channel_section()
        } else {
            remote_sdp
        }
    }

    /// request_transport asks the collaborator for the remote transport.
    pub(crate) async fn request_transport(
        &self,
        local: Option<TransportLocalParameters>,
    ) -> Result<TransportRemoteParameters> {
        log::debug!("requesting {} transport", self.direction);
        with_timeout(
            self.settings.transport_request_timeout,
            self.transport
                .on_need_create_transport(self.direction, local),
        )
        .await
    }

    /// update_transport reports the final local parameters.
    pub(crate) async fn update_transport(&self, local: TransportLocalParameters) -> Result<()> {
        log::debug!("updating {} transport", self.direction);
        with_timeout(
            self.settings.transport_request_timeout,
            self.transport
                .on_need_update_transport(self.direction, local),
        )
        .await
    }

    /// check_round_start fails a round up front when the engine could not
    /// take the offer that opens it, applied through `op`.
    pub(crate) async fn check_round_start(&self, op: StateChangeOp) -> Result<()> {
        next_signaling_state(self.engine.signaling_state().await, op, RTCSdpType::Offer)?;
        Ok(())
    }

    /// rollback_engine cancels a half-applied round so that the engine is
    /// stable again.
    pub(crate) async fn rollback_engine(&self) {
        let rollback = match self.engine.signaling_state().await {
            RTCSignalingState::HaveLocalOffer => {
                self.engine
                    .set_local_description(RTCSessionDescription::rollback())
                    .await
            }
            RTCSignalingState::HaveRemoteOffer => {
                self.engine
                    .set_remote_description(RTCSessionDescription::rollback())
                    .await
            }
            _ => return,
        };
        if let Err(err) = rollback {
            log::warn!("{} session failed to roll back the engine: {}", self.direction, err);
        }
    }

    pub(crate) async fn handle_ice_connection_state(&self, state: RTCIceConnectionState) {
        if let Some(state) = ConnectionState::from_ice_connection_state(state) {
            log::debug!("{} session connection state changed to {}", self.direction, state);
            self.transport.on_connection_state_change(state).await;
        }
    }

    /// close releases the queue and the engine. Failures while closing are
    /// logged, never returned, and only the first call does anything.
    pub(crate) async fn close(&self) -> Result<()> {
        if self.is_closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        log::debug!(
            "closing {} session [pending rounds:{}]",
            self.direction,
            self.ops.len()
        );
        self.state.store(SessionState::Closed as u8, Ordering::SeqCst);

        let mut close_errs: Vec<Error> = vec![];
        if let Err(err) = self.ops.close().await {
            close_errs.push(err);
        }
        if let Err(err) = self.engine.close().await {
            close_errs.push(err);
        }
        if let Err(err) = flatten_errs(close_errs) {
            log::warn!("{} session close: {}", self.direction, err);
        }

        Ok(())
    }
}

pub(crate) async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::ErrTransportRequestTimeout)?,
        None => fut.await,
    }
}

/// get_native_rtp_capabilities reads what `engine` can send and receive from
/// an offer receiving audio and video. The engine is closed
/// afterwards whether or not the offer succeeded.
pub async fn get_native_rtp_capabilities(
    engine: Arc<dyn NegotiationEngine>,
) -> Result<RtpCapabilities> {
    log::debug!("get_native_rtp_capabilities()");

    let result = offer_rtp_capabilities(&*engine).await;
    if let Err(err) = engine.close().await {
        log::debug!("get_native_rtp_capabilities() | closing engine: {}", err);
    }

    result
}

async fn offer_rtp_capabilities(engine: &dyn NegotiationEngine) -> Result<RtpCapabilities> {
    let offer = engine
        .create_offer(Some(RTCOfferOptions {
            offer_to_receive_audio: true,
            offer_to_receive_video: true,
            ..Default::default()
        }))
        .await?;

    extract_rtp_capabilities(&offer.parsed()?)
}
