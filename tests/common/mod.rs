#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sdp::description::media::MediaDescription;
use sdp::description::session::*;
use smol_str::SmolStr;
use tokio::sync::Mutex;

use webrtc_handler::dtls_transport::dtls_fingerprint::RTCDtlsFingerprint;
use webrtc_handler::dtls_transport::dtls_parameters::DTLSParameters;
use webrtc_handler::dtls_transport::dtls_role::DTLSRole;
use webrtc_handler::engine::capabilities::HandlerVariant;
use webrtc_handler::engine::offer_answer_options::RTCOfferOptions;
use webrtc_handler::engine::policy::sdp_semantics::RTCSdpSemantics;
use webrtc_handler::engine::signaling_state::{
    next_signaling_state, RTCSignalingState, StateChangeOp,
};
use webrtc_handler::engine::NegotiationEngine;
use webrtc_handler::handler::consumer::ConsumerParameters;
use webrtc_handler::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc_handler::ice_transport::ice_parameters::RTCIceParameters;
use webrtc_handler::rtp_transceiver::rtp_codec::MediaKind;
use webrtc_handler::rtp_transceiver::rtp_parameters::{
    RtcpFeedback, RtcpParameters, RtpCodecParameters, RtpEncodingParameters,
    RtpHeaderExtensionParameters, RtpParameters, RtpParametersByKind, RtxParameters,
};
use webrtc_handler::rtp_transceiver::{RtpReceiver, RtpSender, RtpTransceiver, SSRC};
use webrtc_handler::sdp::sdp_type::RTCSdpType;
use webrtc_handler::sdp::session_description::RTCSessionDescription;
use webrtc_handler::settings::{HandlerSettings, HandlerSettingsBuilder};
use webrtc_handler::track::{MediaStream, MediaStreamTrack};
use webrtc_handler::transport::connection_state::ConnectionState;
use webrtc_handler::transport::transport_parameters::{
    TransportLocalParameters, TransportRemoteParameters,
};
use webrtc_handler::transport::{TransportDirection, TransportHandler};
use webrtc_handler::{Error, Result};

pub const LOCAL_FINGERPRINT: &str =
    "sha-256 4B:1A:22:09:CF:38:36:C3:62:97:1C:8A:8A:DC:D1:F0:8D:7B:3F:6C:54:02:9E:0B:A3:47:83:8E:17:B6:1E:B1";
pub const REMOTE_FINGERPRINT: &str =
    "5A:02:2E:E9:BE:F3:5D:66:A4:D1:C5:27:E1:74:9B:56:05:8E:C3:1B:93:03:05:C8:42:44:2F:C6:0A:51:76:F4";

const AUDIO_LEVEL_URI: &str = "urn:ietf:params:rtp-hdrext:ssrc-audio-level";
const TOFFSET_URI: &str = "urn:ietf:params:rtp-hdrext:toffset";

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// FailPoint is an engine call that fails once when armed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailPoint {
    CreateOffer,
    CreateAnswer,
    SetLocal,
    SetRemote,
    Close,
}

pub struct MockSender {
    track: Mutex<Option<Arc<MediaStreamTrack>>>,
    pub replace_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl RtpSender for MockSender {
    async fn track(&self) -> Option<Arc<MediaStreamTrack>> {
        self.track.lock().await.clone()
    }

    async fn replace_track(&self, track: Option<Arc<MediaStreamTrack>>) -> Result<()> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        *self.track.lock().await = track;
        Ok(())
    }
}

pub struct MockReceiver {
    track: Arc<MediaStreamTrack>,
    stream_ids: Vec<String>,
}

#[async_trait::async_trait]
impl RtpReceiver for MockReceiver {
    async fn track(&self) -> Arc<MediaStreamTrack> {
        Arc::clone(&self.track)
    }

    async fn stream_ids(&self) -> Vec<String> {
        self.stream_ids.clone()
    }
}

pub struct MockTransceiver {
    mid: SmolStr,
    receiver: Arc<MockReceiver>,
}

#[async_trait::async_trait]
impl RtpTransceiver for MockTransceiver {
    async fn mid(&self) -> Option<SmolStr> {
        Some(self.mid.clone())
    }

    async fn sender(&self) -> Option<Arc<dyn RtpSender>> {
        None
    }

    async fn receiver(&self) -> Option<Arc<dyn RtpReceiver>> {
        Some(Arc::clone(&self.receiver) as Arc<dyn RtpReceiver>)
    }
}

/// A local media section of the offers the engine creates. Sections are
/// never removed; a section whose track went away turns inactive.
#[derive(Debug, Clone)]
struct LocalSection {
    mid: String,
    kind: MediaKind,
    track_id: Option<String>,
    receive: bool,
}

struct EngineState {
    signaling_state: RTCSignalingState,
    current_local: Option<RTCSessionDescription>,
    pending_local: Option<RTCSessionDescription>,
    current_remote: Option<RTCSessionDescription>,
    pending_remote: Option<RTCSessionDescription>,
    stream: MediaStream,
    senders: Vec<Arc<MockSender>>,
    sections: Vec<LocalSection>,
    ssrcs: HashMap<String, (SSRC, SSRC)>,
    next_ssrc: SSRC,
    ufrag: String,
    pwd: String,
    ice_generation: usize,
}

/// MockEngine is a scripted negotiation engine producing real SDP. It
/// follows the signaling state machine and lays its offers out the way the
/// configured semantics do.
pub struct MockEngine {
    semantics: RTCSdpSemantics,
    state: Mutex<EngineState>,
    fail_once: Mutex<Vec<FailPoint>>,
    fail_without_tracks: AtomicBool,
    hide_remote_tracks: AtomicBool,
    hide_stream_ids: AtomicBool,
    closed: AtomicBool,
    pub close_calls: AtomicUsize,
    pub local_history: Mutex<Vec<RTCSessionDescription>>,
    pub remote_history: Mutex<Vec<RTCSessionDescription>>,
}

impl MockEngine {
    pub fn new(semantics: RTCSdpSemantics) -> Arc<Self> {
        Arc::new(MockEngine {
            semantics,
            state: Mutex::new(EngineState {
                signaling_state: RTCSignalingState::Stable,
                current_local: None,
                pending_local: None,
                current_remote: None,
                pending_remote: None,
                stream: MediaStream::new("local-stream"),
                senders: vec![],
                sections: vec![],
                ssrcs: HashMap::new(),
                next_ssrc: 1000,
                ufrag: "localufrag0".to_owned(),
                pwd: "localpassword0000000000".to_owned(),
                ice_generation: 0,
            }),
            fail_once: Mutex::new(vec![]),
            fail_without_tracks: AtomicBool::new(false),
            hide_remote_tracks: AtomicBool::new(false),
            hide_stream_ids: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            local_history: Mutex::new(vec![]),
            remote_history: Mutex::new(vec![]),
        })
    }

    pub async fn fail_once(&self, point: FailPoint) {
        self.fail_once.lock().await.push(point);
    }

    /// Offers without any track fail to apply, the way older engines
    /// report "Failed to create channels".
    pub fn set_fail_without_tracks(&self, fail: bool) {
        self.fail_without_tracks.store(fail, Ordering::SeqCst);
    }

    pub fn set_hide_remote_tracks(&self, hide: bool) {
        self.hide_remote_tracks.store(hide, Ordering::SeqCst);
    }

    /// Receivers report no stream ids, the way older engines do.
    pub fn set_hide_stream_ids(&self, hide: bool) {
        self.hide_stream_ids.store(hide, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn senders(&self) -> Vec<Arc<MockSender>> {
        self.state.lock().await.senders.clone()
    }

    pub async fn last_local(&self) -> Option<SessionDescription> {
        let history = self.local_history.lock().await;
        history.last().and_then(|d| d.parsed().ok())
    }

    pub async fn last_remote(&self) -> Option<SessionDescription> {
        let history = self.remote_history.lock().await;
        history.last().and_then(|d| d.parsed().ok())
    }

    async fn check(&self, point: FailPoint) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrEngine("engine closed".to_owned()));
        }
        let mut fail_once = self.fail_once.lock().await;
        if let Some(pos) = fail_once.iter().position(|p| *p == point) {
            fail_once.remove(pos);
            return Err(Error::ErrEngine(format!("{point:?} failed")));
        }
        Ok(())
    }

    fn remote_description(state: &EngineState) -> Option<SessionDescription> {
        state
            .pending_remote
            .as_ref()
            .or(state.current_remote.as_ref())
            .and_then(|d| d.parsed().ok())
    }
}

fn with_codecs(m: MediaDescription, kind: MediaKind) -> MediaDescription {
    match kind {
        MediaKind::Audio => m
            .with_codec(111, "opus".to_owned(), 48000, 2, "minptime=10;useinbandfec=1".to_owned())
            .with_value_attribute(ATTR_KEY_EXT_MAP.to_owned(), format!("1 {AUDIO_LEVEL_URI}")),
        _ => m
            .with_codec(96, "VP8".to_owned(), 90000, 0, String::new())
            .with_value_attribute("rtcp-fb".to_owned(), "96 nack".to_owned())
            .with_value_attribute("rtcp-fb".to_owned(), "96 nack pli".to_owned())
            .with_codec(97, "rtx".to_owned(), 90000, 0, "apt=96".to_owned())
            .with_value_attribute(ATTR_KEY_EXT_MAP.to_owned(), format!("2 {TOFFSET_URI}")),
    }
}

fn with_source(
    mut m: MediaDescription,
    (ssrc, rtx_ssrc): (SSRC, SSRC),
    kind: MediaKind,
    stream_id: &str,
    track_id: &str,
) -> MediaDescription {
    if kind == MediaKind::Video {
        m = m.with_value_attribute(
            ATTR_KEY_SSRCGROUP.to_owned(),
            format!("FID {ssrc} {rtx_ssrc}"),
        );
    }
    m = m.with_media_source(
        ssrc,
        "localcname".to_owned(),
        stream_id.to_owned(),
        track_id.to_owned(),
    );
    if kind == MediaKind::Video {
        m = m.with_media_source(
            rtx_ssrc,
            "localcname".to_owned(),
            stream_id.to_owned(),
            track_id.to_owned(),
        );
    }
    m
}

fn mid_of(media: &MediaDescription) -> Option<String> {
    media
        .attributes
        .iter()
        .find(|a| a.key == ATTR_KEY_MID)
        .and_then(|a| a.value.clone())
}

#[async_trait::async_trait]
impl NegotiationEngine for MockEngine {
    async fn create_offer(
        &self,
        options: Option<RTCOfferOptions>,
    ) -> Result<RTCSessionDescription> {
        self.check(FailPoint::CreateOffer).await?;
        let options = options.unwrap_or_default();
        let mut st = self.state.lock().await;
        let st = &mut *st;

        if options.ice_restart {
            st.ice_generation += 1;
            st.ufrag = format!("localufrag{}", st.ice_generation);
            st.pwd = format!("localpassword{:0>10}", st.ice_generation);
        }

        let tracks: Vec<Arc<MediaStreamTrack>> = st.stream.tracks().to_vec();
        for track in &tracks {
            if !st.ssrcs.contains_key(track.id()) {
                let ssrcs = (st.next_ssrc, st.next_ssrc + 1);
                st.next_ssrc += 2;
                st.ssrcs.insert(track.id().to_owned(), ssrcs);
            }
        }

        if self.semantics == RTCSdpSemantics::PlanB {
            for track in &tracks {
                if !st.sections.iter().any(|s| s.kind == track.kind()) {
                    st.sections.push(LocalSection {
                        mid: track.kind().to_string(),
                        kind: track.kind(),
                        track_id: None,
                        receive: false,
                    });
                }
            }
        } else {
            for section in st.sections.iter_mut() {
                if section
                    .track_id
                    .as_ref()
                    .is_some_and(|id| !tracks.iter().any(|t| t.id() == id))
                {
                    section.track_id = None;
                }
            }
            for track in &tracks {
                if !st
                    .sections
                    .iter()
                    .any(|s| s.track_id.as_deref() == Some(track.id()))
                {
                    let mid = st.sections.len().to_string();
                    st.sections.push(LocalSection {
                        mid,
                        kind: track.kind(),
                        track_id: Some(track.id().to_owned()),
                        receive: false,
                    });
                }
            }
        }
        for (wanted, kind) in [
            (options.offer_to_receive_audio, MediaKind::Audio),
            (options.offer_to_receive_video, MediaKind::Video),
        ] {
            if !wanted {
                continue;
            }
            match st.sections.iter_mut().find(|s| s.kind == kind) {
                Some(section) => section.receive = true,
                None => {
                    let mid = if self.semantics == RTCSdpSemantics::PlanB {
                        kind.to_string()
                    } else {
                        st.sections.len().to_string()
                    };
                    st.sections.push(LocalSection {
                        mid,
                        kind,
                        track_id: None,
                        receive: true,
                    });
                }
            }
        }

        let mids: Vec<String> = st.sections.iter().map(|s| s.mid.clone()).collect();
        let (algorithm, value) = LOCAL_FINGERPRINT.split_once(' ').unwrap_or_default();
        let mut d = SessionDescription::new_jsep_session_description(false)
            .with_fingerprint(algorithm.to_owned(), value.to_owned())
            .with_value_attribute(ATTR_KEY_MSID_SEMANTIC.to_owned(), " WMS *".to_owned());
        if !mids.is_empty() {
            d = d.with_value_attribute(
                ATTR_KEY_GROUP.to_owned(),
                format!("BUNDLE {}", mids.join(" ")),
            );
        }

        for section in &st.sections {
            let mut m = MediaDescription::new_jsep_media_description(section.kind.to_string(), vec![])
                .with_value_attribute(ATTR_KEY_CONNECTION_SETUP.to_owned(), "actpass".to_owned())
                .with_value_attribute(ATTR_KEY_MID.to_owned(), section.mid.clone())
                .with_ice_credentials(st.ufrag.clone(), st.pwd.clone())
                .with_property_attribute(ATTR_KEY_RTCPMUX.to_owned());
            m = with_codecs(m, section.kind);

            let sending: Vec<&Arc<MediaStreamTrack>> = match (&self.semantics, &section.track_id) {
                (RTCSdpSemantics::PlanB, _) => {
                    tracks.iter().filter(|t| t.kind() == section.kind).collect()
                }
                (_, Some(track_id)) => tracks.iter().filter(|t| t.id() == track_id).collect(),
                (_, None) => vec![],
            };
            let direction = if !sending.is_empty() {
                ATTR_KEY_SEND_ONLY
            } else if section.receive {
                ATTR_KEY_RECV_ONLY
            } else {
                ATTR_KEY_INACTIVE
            };
            m = m.with_property_attribute(direction.to_owned());

            if self.semantics != RTCSdpSemantics::PlanB {
                if let Some(track) = sending.first() {
                    m = m.with_value_attribute(
                        ATTR_KEY_MSID.to_owned(),
                        format!("{} {}", st.stream.id(), track.id()),
                    );
                }
            }
            for track in sending {
                let ssrcs = st.ssrcs.get(track.id()).copied().unwrap_or_default();
                m = with_source(m, ssrcs, track.kind(), st.stream.id(), track.id());
            }

            d = d.with_media(m);
        }

        Ok(RTCSessionDescription::from_parsed(RTCSdpType::Offer, d))
    }

    async fn create_answer(&self) -> Result<RTCSessionDescription> {
        self.check(FailPoint::CreateAnswer).await?;
        let st = self.state.lock().await;
        let remote = st
            .pending_remote
            .as_ref()
            .ok_or_else(|| Error::ErrEngine("no remote offer".to_owned()))?
            .parsed()?;

        let (algorithm, value) = LOCAL_FINGERPRINT.split_once(' ').unwrap_or_default();
        let mut d = SessionDescription::new_jsep_session_description(false)
            .with_fingerprint(algorithm.to_owned(), value.to_owned());
        if let Some(group) = remote.attribute(ATTR_KEY_GROUP) {
            d = d.with_value_attribute(ATTR_KEY_GROUP.to_owned(), group.clone());
        }

        for offered in &remote.media_descriptions {
            let mid = mid_of(offered).unwrap_or_default();
            let mut m = MediaDescription::new_jsep_media_description(
                offered.media_name.media.clone(),
                vec![],
            );
            m.media_name.formats = offered.media_name.formats.clone();
            if offered.media_name.port.value == 0 {
                m.media_name.port.value = 0;
                m = m
                    .with_value_attribute(ATTR_KEY_MID.to_owned(), mid)
                    .with_property_attribute(ATTR_KEY_INACTIVE.to_owned());
                d = d.with_media(m);
                continue;
            }

            m = m
                .with_value_attribute(ATTR_KEY_CONNECTION_SETUP.to_owned(), "active".to_owned())
                .with_value_attribute(ATTR_KEY_MID.to_owned(), mid)
                .with_ice_credentials(st.ufrag.clone(), st.pwd.clone())
                .with_property_attribute(ATTR_KEY_RTCPMUX.to_owned());
            for attr in &offered.attributes {
                if attr.key == "rtpmap" || attr.key == "fmtp" {
                    if let Some(value) = &attr.value {
                        m = m.with_value_attribute(attr.key.clone(), value.clone());
                    }
                }
            }
            let direction = if offered.has_attribute(ATTR_KEY_SEND_ONLY) {
                ATTR_KEY_RECV_ONLY
            } else {
                ATTR_KEY_INACTIVE
            };
            m = m.with_property_attribute(direction.to_owned());
            d = d.with_media(m);
        }

        Ok(RTCSessionDescription::from_parsed(RTCSdpType::Answer, d))
    }

    async fn set_local_description(&self, desc: RTCSessionDescription) -> Result<()> {
        self.check(FailPoint::SetLocal).await?;
        let mut st = self.state.lock().await;

        if desc.sdp_type == RTCSdpType::Rollback {
            st.signaling_state =
                next_signaling_state(st.signaling_state, StateChangeOp::SetLocal, desc.sdp_type)?;
            st.pending_local = None;
            st.pending_remote = None;
            return Ok(());
        }
        if desc.sdp_type == RTCSdpType::Offer
            && self.fail_without_tracks.load(Ordering::SeqCst)
            && st.stream.is_empty()
        {
            return Err(Error::ErrNoSendingTracks(
                "Failed to create channels".to_owned(),
            ));
        }

        let next = next_signaling_state(st.signaling_state, StateChangeOp::SetLocal, desc.sdp_type)?;
        desc.parsed()?;
        self.local_history.lock().await.push(desc.clone());

        match desc.sdp_type {
            RTCSdpType::Answer => {
                st.current_local = Some(desc);
                st.pending_local = None;
                st.current_remote = st.pending_remote.take();
            }
            _ => st.pending_local = Some(desc),
        }
        st.signaling_state = next;

        Ok(())
    }

    async fn set_remote_description(&self, desc: RTCSessionDescription) -> Result<()> {
        self.check(FailPoint::SetRemote).await?;
        let mut st = self.state.lock().await;

        if desc.sdp_type == RTCSdpType::Rollback {
            st.signaling_state =
                next_signaling_state(st.signaling_state, StateChangeOp::SetRemote, desc.sdp_type)?;
            st.pending_local = None;
            st.pending_remote = None;
            return Ok(());
        }

        let next =
            next_signaling_state(st.signaling_state, StateChangeOp::SetRemote, desc.sdp_type)?;
        desc.parsed()?;
        self.remote_history.lock().await.push(desc.clone());

        match desc.sdp_type {
            RTCSdpType::Answer => {
                st.current_remote = Some(desc);
                st.pending_remote = None;
                st.current_local = st.pending_local.take();
            }
            _ => st.pending_remote = Some(desc),
        }
        st.signaling_state = next;

        Ok(())
    }

    async fn local_description(&self) -> Option<RTCSessionDescription> {
        let st = self.state.lock().await;
        st.pending_local.clone().or_else(|| st.current_local.clone())
    }

    async fn signaling_state(&self) -> RTCSignalingState {
        self.state.lock().await.signaling_state
    }

    async fn attach_local_stream(&self, stream: &MediaStream) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrEngine("engine closed".to_owned()));
        }
        let mut st = self.state.lock().await;
        st.stream = stream.clone();

        for sender in &st.senders {
            let mut track = sender.track.lock().await;
            if track.as_ref().is_some_and(|t| !stream.contains(t)) {
                *track = None;
            }
        }
        for track in stream.tracks() {
            let mut attached = false;
            for sender in &st.senders {
                if sender
                    .track
                    .lock()
                    .await
                    .as_ref()
                    .is_some_and(|t| t.id() == track.id())
                {
                    attached = true;
                }
            }
            if !attached {
                st.senders.push(Arc::new(MockSender {
                    track: Mutex::new(Some(Arc::clone(track))),
                    replace_calls: AtomicUsize::new(0),
                }));
            }
        }

        Ok(())
    }

    async fn current_senders(&self) -> Vec<Arc<dyn RtpSender>> {
        let st = self.state.lock().await;
        st.senders
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn RtpSender>)
            .collect()
    }

    async fn current_receivers(&self) -> Vec<Arc<dyn RtpReceiver>> {
        if self.hide_remote_tracks.load(Ordering::SeqCst) {
            return vec![];
        }
        let st = self.state.lock().await;
        let Some(remote) = MockEngine::remote_description(&st) else {
            return vec![];
        };

        let hide_stream_ids = self.hide_stream_ids.load(Ordering::SeqCst);
        let mut receivers: Vec<Arc<dyn RtpReceiver>> = vec![];
        for media in &remote.media_descriptions {
            if media.media_name.port.value == 0 || !media.has_attribute(ATTR_KEY_SEND_ONLY) {
                continue;
            }
            let kind = MediaKind::from(media.media_name.media.as_str());
            let mut seen: Vec<String> = vec![];
            for attr in &media.attributes {
                if attr.key != ATTR_KEY_SSRC {
                    continue;
                }
                let Some(msid) = attr.value.as_deref().and_then(|v| v.split_once(" msid:")) else {
                    continue;
                };
                let Some((stream_id, track_id)) = msid.1.split_once(' ') else {
                    continue;
                };
                if seen.iter().any(|t| t == track_id) {
                    continue;
                }
                seen.push(track_id.to_owned());
                let stream_ids = if hide_stream_ids {
                    vec![]
                } else {
                    vec![stream_id.to_owned()]
                };
                receivers.push(Arc::new(MockReceiver {
                    track: Arc::new(MediaStreamTrack::new(track_id, kind)),
                    stream_ids,
                }));
            }
        }

        receivers
    }

    async fn current_transceivers(&self) -> Vec<Arc<dyn RtpTransceiver>> {
        if self.hide_remote_tracks.load(Ordering::SeqCst) {
            return vec![];
        }
        let st = self.state.lock().await;
        let Some(remote) = MockEngine::remote_description(&st) else {
            return vec![];
        };

        let mut transceivers: Vec<Arc<dyn RtpTransceiver>> = vec![];
        for media in &remote.media_descriptions {
            if media.media_name.port.value == 0 {
                continue;
            }
            let (Some(mid), Some(Some(msid))) = (mid_of(media), media.attribute(ATTR_KEY_MSID))
            else {
                continue;
            };
            let Some((stream_id, track_id)) = msid.split_once(' ') else {
                continue;
            };
            let kind = MediaKind::from(media.media_name.media.as_str());
            transceivers.push(Arc::new(MockTransceiver {
                mid: SmolStr::new(mid),
                receiver: Arc::new(MockReceiver {
                    // Engines answering by mid name remote tracks on their own.
                    track: Arc::new(MediaStreamTrack::new(format!("{{{track_id}}}"), kind)),
                    stream_ids: vec![stream_id.to_owned()],
                }),
            }));
        }

        transceivers
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        let mut fail_once = self.fail_once.lock().await;
        if let Some(pos) = fail_once.iter().position(|p| *p == FailPoint::Close) {
            fail_once.remove(pos);
            return Err(Error::ErrEngine("close failed".to_owned()));
        }
        self.closed.store(true, Ordering::SeqCst);
        self.state.lock().await.signaling_state = RTCSignalingState::Closed;
        Ok(())
    }
}

/// RecordingTransport plays the server side of the transport: it answers
/// with fixed remote parameters and records every callback.
pub struct RecordingTransport {
    remote: TransportRemoteParameters,
    delay: Option<Duration>,
    pub fail_create: AtomicBool,
    pub fail_update_once: AtomicBool,
    pub create_calls: AtomicUsize,
    pub created_with: Mutex<Vec<(TransportDirection, Option<TransportLocalParameters>)>>,
    pub updated_with: Mutex<Vec<(TransportDirection, TransportLocalParameters)>>,
    pub producer_updates: Mutex<Vec<(String, RtpParameters)>>,
    pub states: Mutex<Vec<ConnectionState>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        RecordingTransport::with_delay(None)
    }

    pub fn with_delay(delay: Option<Duration>) -> Arc<Self> {
        Arc::new(RecordingTransport {
            remote: remote_parameters("remoteufrag0"),
            delay,
            fail_create: AtomicBool::new(false),
            fail_update_once: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
            created_with: Mutex::new(vec![]),
            updated_with: Mutex::new(vec![]),
            producer_updates: Mutex::new(vec![]),
            states: Mutex::new(vec![]),
        })
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TransportHandler for RecordingTransport {
    async fn on_need_create_transport(
        &self,
        direction: TransportDirection,
        local: Option<TransportLocalParameters>,
    ) -> Result<TransportRemoteParameters> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.created_with.lock().await.push((direction, local));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::ErrTransport("server refused".to_owned()));
        }
        Ok(self.remote.clone())
    }

    async fn on_need_update_transport(
        &self,
        direction: TransportDirection,
        local: TransportLocalParameters,
    ) -> Result<()> {
        self.updated_with.lock().await.push((direction, local));
        if self.fail_update_once.swap(false, Ordering::SeqCst) {
            return Err(Error::ErrTransport("server lost the transport".to_owned()));
        }
        Ok(())
    }

    async fn on_need_update_producer(
        &self,
        producer_id: &str,
        rtp_parameters: RtpParameters,
    ) -> Result<()> {
        self.producer_updates
            .lock()
            .await
            .push((producer_id.to_owned(), rtp_parameters));
        Ok(())
    }

    async fn on_connection_state_change(&self, state: ConnectionState) {
        self.states.lock().await.push(state);
    }
}

pub fn remote_parameters(ufrag: &str) -> TransportRemoteParameters {
    TransportRemoteParameters {
        ice_parameters: ice_parameters(ufrag),
        ice_candidates: vec![RTCIceCandidate::try_from(
            "candidate:udpcandidate 1 udp 1076302079 203.0.113.10 40533 typ host",
        )
        .unwrap()],
        dtls_parameters: DTLSParameters {
            role: DTLSRole::Auto,
            fingerprints: vec![RTCDtlsFingerprint {
                algorithm: "sha-256".to_owned(),
                value: REMOTE_FINGERPRINT.to_owned(),
            }],
        },
    }
}

pub fn ice_parameters(ufrag: &str) -> RTCIceParameters {
    RTCIceParameters {
        username_fragment: ufrag.to_owned(),
        password: format!("{ufrag}-password"),
        ice_lite: true,
    }
}

pub fn rtp_parameters_by_kind() -> RtpParametersByKind {
    let mut by_kind = RtpParametersByKind::new();
    by_kind.insert(
        MediaKind::Audio,
        RtpParameters {
            codecs: vec![RtpCodecParameters {
                mime_type: "audio/opus".to_owned(),
                payload_type: 111,
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                rtcp_feedback: vec![],
            }],
            header_extensions: vec![RtpHeaderExtensionParameters {
                uri: AUDIO_LEVEL_URI.to_owned(),
                id: 1,
            }],
            ..Default::default()
        },
    );
    by_kind.insert(
        MediaKind::Video,
        RtpParameters {
            codecs: vec![
                RtpCodecParameters {
                    mime_type: "video/VP8".to_owned(),
                    payload_type: 96,
                    clock_rate: 90000,
                    rtcp_feedback: vec![RtcpFeedback {
                        typ: "nack".to_owned(),
                        parameter: "pli".to_owned(),
                    }],
                    ..Default::default()
                },
                RtpCodecParameters {
                    mime_type: "video/rtx".to_owned(),
                    payload_type: 97,
                    clock_rate: 90000,
                    sdp_fmtp_line: "apt=96".to_owned(),
                    ..Default::default()
                },
            ],
            header_extensions: vec![RtpHeaderExtensionParameters {
                uri: TOFFSET_URI.to_owned(),
                id: 2,
            }],
            ..Default::default()
        },
    );
    by_kind
}

pub fn consumer_parameters(id: &str, kind: MediaKind, ssrc: SSRC) -> ConsumerParameters {
    let mut rtp_parameters = rtp_parameters_by_kind()
        .remove(&kind)
        .unwrap_or_default();
    rtp_parameters.encodings = vec![RtpEncodingParameters {
        ssrc,
        rtx: if kind == MediaKind::Video {
            Some(RtxParameters { ssrc: ssrc + 1 })
        } else {
            None
        },
        rid: None,
    }];
    rtp_parameters.rtcp = RtcpParameters {
        cname: format!("cname-{id}"),
        reduced_size: true,
    };

    ConsumerParameters {
        id: id.to_owned(),
        kind,
        rtp_parameters,
    }
}

pub fn settings(variant: HandlerVariant) -> HandlerSettings {
    HandlerSettingsBuilder::new()
        .with_variant(variant)
        .build()
        .unwrap()
}

pub fn track(id: &str, kind: MediaKind) -> Arc<MediaStreamTrack> {
    Arc::new(MediaStreamTrack::new(id, kind))
}

pub fn semantics_of(variant: HandlerVariant) -> RTCSdpSemantics {
    variant.capabilities().sdp_semantics
}

pub fn attribute_count(media: &MediaDescription, key: &str) -> usize {
    media.attributes.iter().filter(|a| a.key == key).count()
}

pub fn media_mid(media: &MediaDescription) -> Option<String> {
    mid_of(media)
}
