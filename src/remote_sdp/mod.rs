
pub mod media_section;

use sdp::description::media::MediaDescription;
use sdp::description::session::*;
use sdp::util::ConnectionRole;

use crate::engine::policy::sdp_semantics::RTCSdpSemantics;
use crate::error::{Error, Result};
use crate::handler::consumer::ConsumerInfo;
use crate::ice_transport::ice_parameters::RTCIceParameters;
use crate::rtp_transceiver::rtp_codec::MediaKind;
use crate::rtp_transceiver::rtp_parameters::RtpParametersByKind;
use crate::rtp_transceiver::rtp_transceiver_direction::RtpTransceiverDirection;
use crate::sdp::{get_mid_value, get_peer_direction};
use crate::transport::transport_parameters::{TransportLocalParameters, TransportRemoteParameters};
use crate::utilities::rand_session_id;
use media_section::MediaSectionBuilder;

/// The mid of the data channel section receive offers may lead with.
pub const DATA_CHANNEL_MID: &str = "datachannel";

/// RemoteSdp writes the descriptions the remote endpoint would have sent:
/// the answer to a local send offer and the offer announcing every consumer
/// of a receive session.
#[derive(Debug, Clone)]
pub struct RemoteSdp {
    sdp_semantics: RTCSdpSemantics,
    rtp_parameters_by_kind: RtpParametersByKind,
    transport_remote_parameters: TransportRemoteParameters,
    transport_local_parameters: Option<TransportLocalParameters>,
    session_id: u64,
    session_version: u64,
    data_channel_section: bool,
}

impl RemoteSdp {
    pub fn new(
        sdp_semantics: RTCSdpSemantics,
        rtp_parameters_by_kind: RtpParametersByKind,
        transport_remote_parameters: TransportRemoteParameters,
    ) -> Self {
        RemoteSdp {
            sdp_semantics,
            rtp_parameters_by_kind,
            transport_remote_parameters,
            transport_local_parameters: None,
            session_id: rand_session_id(),
            session_version: 0,
            data_channel_section: false,
        }
    }

    /// with_data_channel_section makes every offer lead with an open data
    /// channel section, bundled with the rest, so the transport outlives
    /// the last open consumer.
    pub fn with_data_channel_section(mut self) -> Self {
        self.data_channel_section = true;
        self
    }

    pub fn transport_remote_parameters(&self) -> &TransportRemoteParameters {
        &self.transport_remote_parameters
    }

    pub fn transport_local_parameters(&self) -> Option<&TransportLocalParameters> {
        self.transport_local_parameters.as_ref()
    }

    pub fn set_transport_local_parameters(&mut self, local: TransportLocalParameters) {
        self.transport_local_parameters = Some(local);
    }

    /// update_remote_ice_parameters replaces the remote ICE credentials, for
    /// an ICE restart. Candidates are kept.
    pub fn update_remote_ice_parameters(&mut self, ice_parameters: RTCIceParameters) {
        self.transport_remote_parameters.ice_parameters = ice_parameters;
    }

    fn new_session(&mut self, bundle_mids: &[String]) -> SessionDescription {
        self.session_version += 1;

        let mut d = SessionDescription::new_jsep_session_description(false);
        d.origin.session_id = self.session_id;
        d.origin.session_version = self.session_version;

        if self.transport_remote_parameters.ice_parameters.ice_lite {
            d = d.with_property_attribute(ATTR_KEY_ICELITE.to_owned());
        }
        d = d.with_value_attribute(
            ATTR_KEY_MSID_SEMANTIC.to_owned(),
            format!(" {SEMANTIC_TOKEN_WEBRTC_MEDIA_STREAMS} *"),
        );
        if let Some(fingerprint) = self.transport_remote_parameters.dtls_parameters.fingerprints.last() {
            d = d.with_fingerprint(fingerprint.algorithm.clone(), fingerprint.value.clone());
        }
        if !bundle_mids.is_empty() {
            d = d.with_value_attribute(
                ATTR_KEY_GROUP.to_owned(),
                format!("BUNDLE {}", bundle_mids.join(" ")),
            );
        }

        d
    }

    fn section(&self, kind: MediaKind) -> MediaSectionBuilder<'_> {
        MediaSectionBuilder::new(
            kind,
            self.rtp_parameters_by_kind.get(&kind),
            &self.transport_remote_parameters,
        )
    }

    /// create_answer_sdp answers `local`, the offer of a send session. Media
    /// sections are mirrored in order with the mids of the offer.
    pub fn create_answer_sdp(&mut self, local: &SessionDescription) -> Result<String> {
        let local_role = self
            .transport_local_parameters
            .as_ref()
            .map(|l| l.dtls_parameters.role)
            .ok_or(Error::ErrTransportNotReady)?;
        let setup = local_role.to_remote_answer_role();

        let mut sections: Vec<MediaDescription> = vec![];
        let mut bundle_mids = vec![];

        for local_media in &local.media_descriptions {
            let mid = get_mid_value(local_media).cloned().unwrap_or_default();
            let kind = MediaKind::from(local_media.media_name.media.as_str());
            let rejected = local_media.media_name.port.value == 0
                || kind == MediaKind::Unspecified
                || !self.rtp_parameters_by_kind.contains_key(&kind);

            if rejected {
                sections.push(MediaSectionBuilder::rejected(local_media, &mid));
                continue;
            }

            let direction = get_peer_direction(local_media).answer_for_send_offer();
            let media = self
                .section(kind)
                .mid(&mid)
                .setup(setup)
                .direction(direction)
                .offered_by(local_media)
                .build();
            bundle_mids.push(mid);
            sections.push(media);
        }

        let mut d = self.new_session(&bundle_mids);
        for media in sections {
            d = d.with_media(media);
        }

        Ok(d.marshal())
    }

    /// create_offer_sdp announces `consumers` to a receive session. Under
    /// plan-b every kind of `kinds` gets one section, in that order, carrying
    /// all open consumers of the kind. Under unified plan every consumer gets
    /// its own section, closed consumers included, disabled. A consumer
    /// lacking what its section needs fails the whole offer.
    pub fn create_offer_sdp(
        &mut self,
        kinds: &[MediaKind],
        consumers: &[ConsumerInfo],
    ) -> Result<String> {
        let needs_mid = self.sdp_semantics != RTCSdpSemantics::PlanB;
        for consumer in consumers {
            consumer.validate(needs_mid)?;
        }

        let mut sections: Vec<MediaDescription> = vec![];
        let mut bundle_mids = vec![];

        if self.data_channel_section {
            sections.push(MediaSectionBuilder::data_channel(
                &self.transport_remote_parameters,
                DATA_CHANNEL_MID,
            ));
            bundle_mids.push(DATA_CHANNEL_MID.to_owned());
        }

        if self.sdp_semantics == RTCSdpSemantics::PlanB {
            for kind in kinds {
                let mid = kind.to_string();
                let open: Vec<&ConsumerInfo> = consumers
                    .iter()
                    .filter(|c| c.kind == *kind && !c.closed)
                    .collect();
                let direction = if open.is_empty() {
                    RtpTransceiverDirection::Inactive
                } else {
                    RtpTransceiverDirection::Sendonly
                };

                let mut section = self
                    .section(*kind)
                    .mid(&mid)
                    .setup(ConnectionRole::Actpass)
                    .direction(direction);
                for consumer in open {
                    section = section.consumer(consumer);
                }
                bundle_mids.push(mid);
                sections.push(section.build());
            }
        } else {
            for consumer in consumers {
                let mid = consumer.mid.as_deref().unwrap_or_default().to_owned();

                let mut section = self
                    .section(consumer.kind)
                    .mid(&mid)
                    .setup(ConnectionRole::Actpass);
                if consumer.closed {
                    section = section.direction(RtpTransceiverDirection::Inactive).closed();
                } else {
                    section = section
                        .direction(RtpTransceiverDirection::Sendonly)
                        .msid(&consumer.stream_id, &consumer.track_id)
                        .consumer(consumer);
                    bundle_mids.push(mid);
                }
                sections.push(section.build());
            }
        }

        let mut d = self.new_session(&bundle_mids);
        for media in sections {
            d = d.with_media(media);
        }

        Ok(d.marshal())
    }
}
