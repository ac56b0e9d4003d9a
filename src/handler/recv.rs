use std::sync::Arc;

use tokio::sync::Mutex;

use super::consumer::{ConsumerInfo, ConsumerParameters, ConsumerTrackManager};
use super::{Handshake, SessionCore, SessionState};
use crate::engine::policy::sdp_semantics::RTCSdpSemantics;
use crate::engine::signaling_state::StateChangeOp;
use crate::engine::NegotiationEngine;
use crate::error::{Error, Result};
use crate::ice_transport::ice_connection_state::RTCIceConnectionState;
use crate::ice_transport::ice_parameters::RTCIceParameters;
use crate::rtp_transceiver::rtp_codec::MediaKind;
use crate::rtp_transceiver::rtp_parameters::RtpParametersByKind;
use crate::sdp::extract_dtls_parameters;
use crate::sdp::session_description::RTCSessionDescription;
use crate::settings::HandlerSettings;
use crate::track::MediaStreamTrack;
use crate::transport::transport_parameters::TransportLocalParameters;
use crate::transport::{TransportDirection, TransportHandler};

/// RecvSession receives the consumers of one connection. The remote side
/// is the offerer: every round applies a generated remote offer first and
/// the engine's answer second.
pub struct RecvSession {
    internal: Arc<RecvSessionInternal>,
}

struct RecvSessionInternal {
    core: SessionCore,
    consumers: Mutex<ConsumerTrackManager>,
}

impl RecvSession {
    /// new creates a receive session on `engine`. `rtp_parameters_by_kind`
    /// are the receiving parameters capability negotiation settled on.
    /// Must be called from within a tokio runtime.
    pub fn new(
        engine: Arc<dyn NegotiationEngine>,
        transport: Arc<dyn TransportHandler>,
        settings: HandlerSettings,
        rtp_parameters_by_kind: RtpParametersByKind,
    ) -> Self {
        let core = SessionCore::new(
            TransportDirection::Recv,
            engine,
            transport,
            settings,
            rtp_parameters_by_kind,
        );
        let keep_closed = core.capabilities.sdp_semantics != RTCSdpSemantics::PlanB;

        RecvSession {
            internal: Arc::new(RecvSessionInternal {
                core,
                consumers: Mutex::new(ConsumerTrackManager::new(keep_closed)),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.internal.core.state()
    }

    /// consumer_ids returns the ids of the active consumers, including those
    /// whose round is still queued.
    pub async fn consumer_ids(&self) -> Vec<String> {
        self.internal.consumers.lock().await.ids()
    }

    /// kinds returns the kinds negotiated so far, in first-seen order.
    pub async fn kinds(&self) -> Vec<MediaKind> {
        self.internal.consumers.lock().await.kinds().to_vec()
    }

    pub async fn consumer(&self, id: &str) -> Option<ConsumerInfo> {
        self.internal.consumers.lock().await.get(id).cloned()
    }

    /// add_consumer announces a remote source and returns the track the
    /// engine receives it on.
    pub async fn add_consumer(&self, params: ConsumerParameters) -> Result<Arc<MediaStreamTrack>> {
        self.internal.core.check_open()?;
        log::debug!("add_consumer() [id:{}, kind:{}]", params.id, params.kind);

        if !self
            .internal
            .core
            .rtp_parameters_by_kind
            .contains_key(&params.kind)
        {
            return Err(Error::ErrMissingRtpParameters(params.kind));
        }
        let info = ConsumerInfo::from_parameters(&params)?;
        let (info, change) = self.internal.consumers.lock().await.add(info)?;

        let internal = Arc::clone(&self.internal);
        self.internal
            .core
            .ops
            .execute("add_consumer", move || async move {
                match internal.negotiate("add_consumer").await {
                    Ok(()) => {}
                    Err(RoundError::Rejected(err)) => {
                        internal.consumers.lock().await.rollback(change);
                        return Err(err);
                    }
                    // The engine holds the new section now, so the consumer
                    // and its kind and mid stay.
                    Err(RoundError::Committed(err)) => return Err(err),
                }

                ConsumerTrackManager::resolve_track(
                    &info,
                    internal.core.capabilities.track_correlation,
                    &*internal.core.engine,
                )
                .await
            })
            .await
    }

    /// remove_consumer stops receiving a consumer. The media section of its
    /// kind stays in place.
    pub async fn remove_consumer(&self, id: &str) -> Result<()> {
        self.internal.core.check_open()?;
        log::debug!("remove_consumer() [id:{}]", id);

        let removed = self.internal.consumers.lock().await.remove(id)?;
        log::trace!("remove_consumer() | removed {:?}", removed);

        let internal = Arc::clone(&self.internal);
        self.internal
            .core
            .ops
            .execute("remove_consumer", move || async move {
                Ok(internal.negotiate("remove_consumer").await?)
            })
            .await
    }

    /// restart_ice renegotiates the current consumers against new remote
    /// ICE credentials.
    pub async fn restart_ice(&self, ice_parameters: RTCIceParameters) -> Result<()> {
        self.internal.core.check_open()?;
        log::debug!("restart_ice()");

        let internal = Arc::clone(&self.internal);
        self.internal
            .core
            .ops
            .execute("restart_ice", move || async move {
                {
                    let mut handshake = internal.core.handshake.lock().await;
                    handshake
                        .remote_sdp_mut()
                        .ok_or(Error::ErrTransportNotReady)?
                        .update_remote_ice_parameters(ice_parameters);
                }
                Ok(internal.negotiate("restart_ice").await?)
            })
            .await
    }

    pub async fn handle_ice_connection_state(&self, state: RTCIceConnectionState) {
        self.internal.core.handle_ice_connection_state(state).await;
    }

    /// flush waits until every queued round has finished.
    pub async fn flush(&self) {
        self.internal.core.ops.done().await;
    }

    pub async fn close(&self) -> Result<()> {
        self.internal.core.close().await
    }
}

/// RoundError tells a round the engine turned down, and was rolled back
/// from, apart from one that failed after the engine applied its answer.
#[derive(Debug)]
enum RoundError {
    Rejected(Error),
    Committed(Error),
}

impl From<Error> for RoundError {
    fn from(err: Error) -> Self {
        RoundError::Rejected(err)
    }
}

impl From<RoundError> for Error {
    fn from(err: RoundError) -> Self {
        match err {
            RoundError::Rejected(err) | RoundError::Committed(err) => err,
        }
    }
}

impl RecvSessionInternal {
    /// negotiate runs one round announcing the current consumers.
    async fn negotiate(&self, op: &str) -> std::result::Result<(), RoundError> {
        let mut handshake = self.core.handshake.lock().await;
        self.core.check_round_start(StateChangeOp::SetRemote).await?;

        if let Handshake::New = *handshake {
            self.core.set_state(SessionState::TransportPending);
            let remote = match self.core.request_transport(None).await {
                Ok(remote) => remote,
                Err(err) => {
                    self.core.set_state(SessionState::New);
                    return Err(err.into());
                }
            };
            *handshake = Handshake::Created(self.core.new_remote_sdp(remote));
        }

        let offer_sdp = {
            let consumers = self.consumers.lock().await;
            handshake
                .remote_sdp_mut()
                .ok_or(Error::ErrTransportNotReady)?
                .create_offer_sdp(consumers.kinds(), consumers.consumer_infos())?
        };
        let offer = RTCSessionDescription::offer(offer_sdp)?;

        log::debug!("{}() | calling set_remote_description() [offer]", op);
        log::trace!("{}() | offer: {}", op, offer.sdp);
        self.core.engine.set_remote_description(offer).await?;

        let answer = match self.core.engine.create_answer().await {
            Ok(answer) => answer,
            Err(err) => {
                self.core.rollback_engine().await;
                return Err(err.into());
            }
        };

        log::debug!("{}() | calling set_local_description() [answer]", op);
        log::trace!("{}() | answer: {}", op, answer.sdp);
        if let Err(err) = self
            .core
            .engine
            .set_local_description(answer.clone())
            .await
        {
            self.core.rollback_engine().await;
            return Err(err.into());
        }

        if !handshake.is_ready() {
            let dtls_parameters = answer
                .parsed()
                .and_then(|parsed| extract_dtls_parameters(&parsed))
                .map_err(RoundError::Committed)?;
            let local = TransportLocalParameters { dtls_parameters };
            if let Some(remote_sdp) = handshake.remote_sdp_mut() {
                remote_sdp.set_transport_local_parameters(local.clone());
            }
            self.core
                .update_transport(local)
                .await
                .map_err(RoundError::Committed)?;

            handshake.complete();
            self.core.set_state(SessionState::Ready);
        }

        Ok(())
    }
}
