use std::sync::Arc;

use sdp::description::session::SessionDescription;
use tokio::sync::Mutex;

use super::producer::{ProducerChange, ProducerInfo, ProducerTrackManager};
use super::{Handshake, SessionCore, SessionState};
use crate::dtls_transport::dtls_role::DTLSRole;
use crate::engine::offer_answer_options::RTCOfferOptions;
use crate::engine::policy::sdp_semantics::RTCSdpSemantics;
use crate::engine::signaling_state::{RTCSignalingState, StateChangeOp};
use crate::engine::NegotiationEngine;
use crate::error::{Error, Result};
use crate::ice_transport::ice_connection_state::RTCIceConnectionState;
use crate::ice_transport::ice_parameters::RTCIceParameters;
use crate::rtp_transceiver::rtp_parameters::{RtpParameters, RtpParametersByKind};
use crate::sdp::sdp_type::RTCSdpType;
use crate::sdp::session_description::RTCSessionDescription;
use crate::sdp::{extract_dtls_parameters, plan_b, unified_plan};
use crate::settings::HandlerSettings;
use crate::track::MediaStreamTrack;
use crate::transport::transport_parameters::TransportLocalParameters;
use crate::transport::{TransportDirection, TransportHandler};

/// SendSession sends the producers of one connection. The engine is the
/// offerer: every round applies the local offer first and a generated remote
/// answer second.
pub struct SendSession {
    internal: Arc<SendSessionInternal>,
}

struct SendSessionInternal {
    core: SessionCore,
    producers: Mutex<ProducerTrackManager>,
}

impl SendSession {
    /// new creates a send session on `engine`. `rtp_parameters_by_kind` are
    /// the sending parameters capability negotiation settled on. Must be
    /// called from within a tokio runtime.
    pub fn new(
        engine: Arc<dyn NegotiationEngine>,
        transport: Arc<dyn TransportHandler>,
        settings: HandlerSettings,
        rtp_parameters_by_kind: RtpParametersByKind,
    ) -> Self {
        SendSession {
            internal: Arc::new(SendSessionInternal {
                core: SessionCore::new(
                    TransportDirection::Send,
                    engine,
                    transport,
                    settings,
                    rtp_parameters_by_kind,
                ),
                producers: Mutex::new(ProducerTrackManager::default()),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.internal.core.state()
    }

    /// producers returns the producers of the session, including those
    /// whose round is still queued.
    pub async fn producers(&self) -> Vec<ProducerInfo> {
        self.internal.producers.lock().await.producers().to_vec()
    }

    pub async fn producer(&self, id: &str) -> Option<ProducerInfo> {
        self.internal.producers.lock().await.get(id).cloned()
    }

    /// add_producer starts sending `track` and returns the RTP parameters it
    /// is sent with. With `simulcast` the track is sent in as many layers as
    /// the settings ask for.
    pub async fn add_producer(
        &self,
        id: &str,
        track: Arc<MediaStreamTrack>,
        simulcast: bool,
    ) -> Result<RtpParameters> {
        self.internal.core.check_open()?;
        log::debug!(
            "add_producer() [id:{}, kind:{}, trackId:{}]",
            id,
            track.kind(),
            track.id()
        );

        if !self
            .internal
            .core
            .rtp_parameters_by_kind
            .contains_key(&track.kind())
        {
            return Err(Error::ErrMissingRtpParameters(track.kind()));
        }
        let change = self
            .internal
            .producers
            .lock()
            .await
            .add(id, Arc::clone(&track), simulcast)?;

        let internal = Arc::clone(&self.internal);
        let id = id.to_owned();
        self.internal
            .core
            .ops
            .execute("add_producer", move || async move {
                match internal.send_round("add_producer", &track, simulcast).await {
                    Ok(rtp_parameters) => {
                        if let Some(producer) = internal.producers.lock().await.get_mut(&id) {
                            producer.rtp_parameters = Some(rtp_parameters.clone());
                        }
                        Ok(rtp_parameters)
                    }
                    Err(err) => {
                        internal.undo("add_producer", change).await;
                        Err(err)
                    }
                }
            })
            .await
    }

    /// remove_producer stops sending a producer. A failure because nothing
    /// is left to send is not reported.
    pub async fn remove_producer(&self, id: &str) -> Result<()> {
        self.internal.core.check_open()?;
        log::debug!("remove_producer() [id:{}]", id);

        let removed = self.internal.producers.lock().await.remove(id)?;
        log::trace!("remove_producer() | removed track {}", removed.track);

        let internal = Arc::clone(&self.internal);
        self.internal
            .core
            .ops
            .execute("remove_producer", move || async move {
                internal.remove_round().await
            })
            .await
    }

    /// replace_producer_track sends `track` in place of the current track of
    /// a producer. Engines able to swap the track of a sender do so without
    /// a round; the others renegotiate, and the collaborator is told about
    /// the new RTP parameters.
    pub async fn replace_producer_track(
        &self,
        id: &str,
        track: Arc<MediaStreamTrack>,
    ) -> Result<()> {
        self.internal.core.check_open()?;
        log::debug!(
            "replace_producer_track() [id:{}, kind:{}, trackId:{}]",
            id,
            track.kind(),
            track.id()
        );

        let (old_track, change) = {
            let mut producers = self.internal.producers.lock().await;
            let old_track = producers
                .get(id)
                .map(|p| Arc::clone(&p.track))
                .ok_or_else(|| Error::ErrProducerNotFound(id.to_owned()))?;
            (old_track, producers.replace(id, Arc::clone(&track))?)
        };

        let internal = Arc::clone(&self.internal);
        let id = id.to_owned();
        self.internal
            .core
            .ops
            .execute("replace_producer_track", move || async move {
                let result = if internal.core.capabilities.replace_track {
                    internal.replace_on_sender(&old_track, &track).await
                } else {
                    internal.replace_by_round(&id, &track).await
                };
                if let Err(err) = result {
                    internal.undo("replace_producer_track", change).await;
                    return Err(err);
                }
                Ok(())
            })
            .await
    }

    /// restart_ice renegotiates against new remote ICE credentials, with
    /// fresh local ones.
    pub async fn restart_ice(&self, ice_parameters: RTCIceParameters) -> Result<()> {
        self.internal.core.check_open()?;
        log::debug!("restart_ice()");

        let internal = Arc::clone(&self.internal);
        self.internal
            .core
            .ops
            .execute("restart_ice", move || async move {
                internal.restart_ice_round(ice_parameters).await
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

impl SendSessionInternal {
    /// send_round offers the local stream with `track` in it and returns the
    /// RTP parameters `track` is sent with.
    async fn send_round(
        &self,
        op: &str,
        track: &Arc<MediaStreamTrack>,
        simulcast: bool,
    ) -> Result<RtpParameters> {
        let mut handshake = self.core.handshake.lock().await;
        self.core.check_round_start(StateChangeOp::SetLocal).await?;
        let semantics = self.core.capabilities.sdp_semantics;

        let stream = self.producers.lock().await.stream().clone();
        self.core.engine.attach_local_stream(&stream).await?;

        let mut offer = self.core.engine.create_offer(None).await?;
        let mut local = offer.parsed()?;
        let mid = match semantics {
            RTCSdpSemantics::PlanB => None,
            _ => Some(
                unified_plan::mid_for_track(&local, track.id())
                    .ok_or_else(|| Error::ErrLocalTrackNotFound(track.id().to_owned()))?,
            ),
        };

        if simulcast {
            log::debug!("{}() | enabling simulcast", op);
            let layers = self.core.settings.simulcast_layers;
            match &mid {
                None => plan_b::add_simulcast_for_track(&mut local, track.kind(), track.id(), layers)?,
                Some(mid) => unified_plan::add_simulcast_for_mid(&mut local, mid, layers)?,
            };
            offer = RTCSessionDescription::from_parsed(RTCSdpType::Offer, local);
        }

        log::debug!("{}() | calling set_local_description() [offer]", op);
        log::trace!("{}() | offer: {}", op, offer.sdp);
        self.core.engine.set_local_description(offer).await?;

        let local = self.applied_local_description().await?;
        self.ensure_transport(&mut handshake, &local).await?;
        self.apply_answer(op, &mut handshake, &local).await?;

        let mut rtp_parameters = self
            .core
            .rtp_parameters_by_kind
            .get(&track.kind())
            .cloned()
            .ok_or(Error::ErrMissingRtpParameters(track.kind()))?;
        match &mid {
            None => plan_b::fill_rtp_parameters_for_track(
                &mut rtp_parameters,
                &local,
                track.kind(),
                track.id(),
            )?,
            Some(mid) => unified_plan::fill_rtp_parameters_for_mid(&mut rtp_parameters, &local, mid)?,
        }

        Ok(rtp_parameters)
    }

    async fn remove_round(&self) -> Result<()> {
        let mut handshake = self.core.handshake.lock().await;

        let stream = self.producers.lock().await.stream().clone();
        let local_round = async {
            self.core.engine.attach_local_stream(&stream).await?;
            let offer = self.core.engine.create_offer(None).await?;

            log::debug!("remove_producer() | calling set_local_description() [offer]");
            log::trace!("remove_producer() | offer: {}", offer.sdp);
            self.core.engine.set_local_description(offer).await
        };
        if let Err(err) = local_round.await {
            let nothing_to_send = self.producers.lock().await.stream().is_empty();
            if matches!(err, Error::ErrNoSendingTracks(_)) || nothing_to_send {
                log::warn!(
                    "remove_producer() | ignoring expected error due no sending tracks: {}",
                    err
                );
                return Ok(());
            }
            return Err(err);
        }

        if self.core.engine.signaling_state().await == RTCSignalingState::Stable {
            return Ok(());
        }
        if !handshake.is_ready() {
            // Nothing was ever answered, so there is nothing to withdraw.
            self.core.rollback_engine().await;
            return Ok(());
        }

        let local = self.applied_local_description().await?;
        self.apply_answer("remove_producer", &mut handshake, &local)
            .await
    }

    async fn replace_on_sender(
        &self,
        old_track: &Arc<MediaStreamTrack>,
        new_track: &Arc<MediaStreamTrack>,
    ) -> Result<()> {
        let mut sender = None;
        for s in self.core.engine.current_senders().await {
            if let Some(track) = s.track().await {
                if Arc::ptr_eq(&track, old_track) || track.id() == old_track.id() {
                    sender = Some(s);
                    break;
                }
            }
        }
        let sender =
            sender.ok_or_else(|| Error::ErrLocalTrackNotFound(old_track.id().to_owned()))?;

        sender.replace_track(Some(Arc::clone(new_track))).await
    }

    async fn replace_by_round(&self, id: &str, track: &Arc<MediaStreamTrack>) -> Result<()> {
        let simulcast = self
            .producers
            .lock()
            .await
            .get(id)
            .map(|p| p.simulcast)
            .ok_or_else(|| Error::ErrProducerNotFound(id.to_owned()))?;

        let rtp_parameters = self
            .send_round("replace_producer_track", track, simulcast)
            .await?;
        if let Some(producer) = self.producers.lock().await.get_mut(id) {
            producer.rtp_parameters = Some(rtp_parameters.clone());
        }

        super::with_timeout(
            self.core.settings.transport_request_timeout,
            self.core.transport.on_need_update_producer(id, rtp_parameters),
        )
        .await
    }

    async fn restart_ice_round(&self, ice_parameters: RTCIceParameters) -> Result<()> {
        let mut handshake = self.core.handshake.lock().await;
        handshake
            .remote_sdp_mut()
            .ok_or(Error::ErrTransportNotReady)?
            .update_remote_ice_parameters(ice_parameters);
        self.core.check_round_start(StateChangeOp::SetLocal).await?;

        let offer = self
            .core
            .engine
            .create_offer(Some(RTCOfferOptions {
                ice_restart: true,
                ..Default::default()
            }))
            .await?;

        log::debug!("restart_ice() | calling set_local_description() [offer]");
        log::trace!("restart_ice() | offer: {}", offer.sdp);
        self.core.engine.set_local_description(offer).await?;

        let local = self.applied_local_description().await?;
        self.apply_answer("restart_ice", &mut handshake, &local)
            .await
    }

    /// ensure_transport runs the transport handshake once: the local DTLS
    /// parameters are taken from the applied offer, acting as DTLS server,
    /// and the collaborator answers with the remote transport.
    async fn ensure_transport(
        &self,
        handshake: &mut Handshake,
        local: &SessionDescription,
    ) -> Result<()> {
        if !matches!(handshake, Handshake::New) {
            return Ok(());
        }
        self.core.set_state(SessionState::TransportPending);

        let mut dtls_parameters = extract_dtls_parameters(local)?;
        dtls_parameters.role = DTLSRole::Server;
        let local = TransportLocalParameters { dtls_parameters };

        let remote = match self.core.request_transport(Some(local.clone())).await {
            Ok(remote) => remote,
            Err(err) => {
                self.core.set_state(SessionState::New);
                return Err(err);
            }
        };
        let mut remote_sdp = self.core.new_remote_sdp(remote);
        remote_sdp.set_transport_local_parameters(local);
        *handshake = Handshake::Ready(remote_sdp);
        self.core.set_state(SessionState::Ready);

        Ok(())
    }

    async fn apply_answer(
        &self,
        op: &str,
        handshake: &mut Handshake,
        local: &SessionDescription,
    ) -> Result<()> {
        let remote_sdp = handshake
            .remote_sdp_mut()
            .ok_or(Error::ErrTransportNotReady)?;
        let answer = RTCSessionDescription::answer(remote_sdp.create_answer_sdp(local)?)?;

        log::debug!("{}() | calling set_remote_description() [answer]", op);
        log::trace!("{}() | answer: {}", op, answer.sdp);
        self.core.engine.set_remote_description(answer).await
    }

    async fn applied_local_description(&self) -> Result<SessionDescription> {
        self.core
            .engine
            .local_description()
            .await
            .ok_or(Error::ErrNoLocalDescription)?
            .parsed()
    }

    /// undo reverts a failed round: the engine first, then the producer set,
    /// whose stream is attached again.
    async fn undo(&self, op: &str, change: ProducerChange) {
        self.core.rollback_engine().await;

        let stream = {
            let mut producers = self.producers.lock().await;
            producers.rollback(change);
            producers.stream().clone()
        };
        if let Err(err) = self.core.engine.attach_local_stream(&stream).await {
            log::warn!("{}() | failed to attach the local stream again: {}", op, err);
        }
    }
}
