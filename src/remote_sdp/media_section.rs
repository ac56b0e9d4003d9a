use sdp::description::media::MediaDescription;
use sdp::description::session::*;
use sdp::util::ConnectionRole;

use crate::handler::consumer::ConsumerInfo;
use crate::rtp_transceiver::rtp_codec::MediaKind;
use crate::rtp_transceiver::rtp_parameters::RtpParameters;
use crate::rtp_transceiver::rtp_transceiver_direction::RtpTransceiverDirection;
use crate::sdp::rtp_extensions_from_media_description;
use crate::transport::transport_parameters::TransportRemoteParameters;

const MEDIA_SECTION_APPLICATION: &str = "application";

/// MediaSectionBuilder writes one remote media section: transport
/// attributes from the remote parameters, codecs and header extensions from
/// the RTP parameters of its kind, and the sources of its consumers.
pub(crate) struct MediaSectionBuilder<'a> {
    kind: MediaKind,
    rtp_parameters: Option<&'a RtpParameters>,
    remote: &'a TransportRemoteParameters,
    mid: String,
    setup: ConnectionRole,
    direction: RtpTransceiverDirection,
    offered: Option<&'a MediaDescription>,
    msid: Option<String>,
    consumers: Vec<ConsumerInfo>,
    closed: bool,
}

impl<'a> MediaSectionBuilder<'a> {
    pub(crate) fn new(
        kind: MediaKind,
        rtp_parameters: Option<&'a RtpParameters>,
        remote: &'a TransportRemoteParameters,
    ) -> Self {
        MediaSectionBuilder {
            kind,
            rtp_parameters,
            remote,
            mid: String::new(),
            setup: ConnectionRole::Actpass,
            direction: RtpTransceiverDirection::Inactive,
            offered: None,
            msid: None,
            consumers: vec![],
            closed: false,
        }
    }

    /// rejected answers a section nothing can be negotiated for: port 0,
    /// inactive, formats copied from the offer.
    pub(crate) fn rejected(offered: &MediaDescription, mid: &str) -> MediaDescription {
        let mut m = MediaDescription::new_jsep_media_description(
            offered.media_name.media.clone(),
            vec![],
        );
        m.media_name.port.value = 0;
        m.media_name.protos.clone_from(&offered.media_name.protos);
        m.media_name.formats.clone_from(&offered.media_name.formats);

        m.with_value_attribute(ATTR_KEY_MID.to_owned(), mid.to_owned())
            .with_property_attribute(ATTR_KEY_INACTIVE.to_owned())
    }

    /// data_channel writes an open SCTP section carrying no media, offered
    /// by the remote side.
    pub(crate) fn data_channel(remote: &TransportRemoteParameters, mid: &str) -> MediaDescription {
        let mut m = MediaDescription::new_jsep_media_description(
            MEDIA_SECTION_APPLICATION.to_owned(),
            vec![],
        );
        m.media_name.protos = vec!["UDP".to_owned(), "DTLS".to_owned(), "SCTP".to_owned()];
        m.media_name.formats = vec!["webrtc-datachannel".to_owned()];

        m = m
            .with_value_attribute(
                ATTR_KEY_CONNECTION_SETUP.to_owned(),
                ConnectionRole::Actpass.to_string(),
            )
            .with_value_attribute(ATTR_KEY_MID.to_owned(), mid.to_owned())
            .with_ice_credentials(
                remote.ice_parameters.username_fragment.clone(),
                remote.ice_parameters.password.clone(),
            );
        for candidate in &remote.ice_candidates {
            m = m.with_candidate(candidate.marshal(1));
        }

        m.with_property_attribute(ATTR_KEY_END_OF_CANDIDATES.to_owned())
            .with_value_attribute("sctp-port".to_owned(), "5000".to_owned())
            .with_value_attribute("max-message-size".to_owned(), "262144".to_owned())
    }

    pub(crate) fn mid(mut self, mid: &str) -> Self {
        self.mid = mid.to_owned();
        self
    }

    pub(crate) fn setup(mut self, setup: ConnectionRole) -> Self {
        self.setup = setup;
        self
    }

    pub(crate) fn direction(mut self, direction: RtpTransceiverDirection) -> Self {
        self.direction = direction;
        self
    }

    /// offered_by restricts codecs and header extensions to those of the
    /// section being answered.
    pub(crate) fn offered_by(mut self, offered: &'a MediaDescription) -> Self {
        self.offered = Some(offered);
        self
    }

    pub(crate) fn msid(mut self, stream_id: &str, track_id: &str) -> Self {
        self.msid = Some(format!("{stream_id} {track_id}"));
        self
    }

    pub(crate) fn consumer(mut self, consumer: &ConsumerInfo) -> Self {
        self.consumers.push(consumer.clone());
        self
    }

    /// closed disables the section, port 0, keeping its place.
    pub(crate) fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub(crate) fn build(self) -> MediaDescription {
        let mut m = MediaDescription::new_jsep_media_description(self.kind.to_string(), vec![]);
        if self.closed {
            m.media_name.port.value = 0;
        }

        m = m
            .with_value_attribute(
                ATTR_KEY_CONNECTION_SETUP.to_owned(),
                self.setup.to_string(),
            )
            .with_value_attribute(ATTR_KEY_MID.to_owned(), self.mid.clone())
            .with_ice_credentials(
                self.remote.ice_parameters.username_fragment.clone(),
                self.remote.ice_parameters.password.clone(),
            );

        if !self.closed {
            for candidate in &self.remote.ice_candidates {
                m = m.with_candidate(candidate.marshal(1));
            }
            m = m
                .with_property_attribute(ATTR_KEY_END_OF_CANDIDATES.to_owned())
                .with_value_attribute("ice-options".to_owned(), "renomination".to_owned());
        }

        m = m
            .with_property_attribute(self.direction.to_string())
            .with_property_attribute(ATTR_KEY_RTCPMUX.to_owned());

        m = self.with_rtp_parameters(m);

        if let Some(msid) = &self.msid {
            m = m.with_value_attribute(ATTR_KEY_MSID.to_owned(), msid.clone());
        }

        for consumer in &self.consumers {
            if let Some(rtx_ssrc) = consumer.rtx_ssrc {
                m = m.with_value_attribute(
                    ATTR_KEY_SSRCGROUP.to_owned(),
                    format!(
                        "{SEMANTIC_TOKEN_FLOW_IDENTIFICATION} {} {rtx_ssrc}",
                        consumer.ssrc
                    ),
                );
            }
            m = m.with_media_source(
                consumer.ssrc,
                consumer.cname.clone(),
                consumer.stream_id.clone(),
                consumer.track_id.clone(),
            );
            if let Some(rtx_ssrc) = consumer.rtx_ssrc {
                m = m.with_media_source(
                    rtx_ssrc,
                    consumer.cname.clone(),
                    consumer.stream_id.clone(),
                    consumer.track_id.clone(),
                );
            }
        }

        m
    }

    fn with_rtp_parameters(&self, mut m: MediaDescription) -> MediaDescription {
        let Some(params) = self.rtp_parameters else {
            // A section needs at least one format to stay valid.
            m.media_name.formats.push("0".to_owned());
            return m;
        };

        if params.rtcp.reduced_size {
            m = m.with_property_attribute(ATTR_KEY_RTCPRSIZE.to_owned());
        }

        let offered_formats = self.offered.map(|o| &o.media_name.formats);
        for codec in &params.codecs {
            let pt = codec.payload_type;
            if offered_formats.is_some_and(|f| !f.contains(&pt.to_string())) {
                continue;
            }
            m = m.with_codec(
                pt,
                codec.name().to_owned(),
                codec.clock_rate,
                codec.channels,
                codec.sdp_fmtp_line.clone(),
            );
            for fb in &codec.rtcp_feedback {
                let value = if fb.parameter.is_empty() {
                    format!("{pt} {}", fb.typ)
                } else {
                    format!("{pt} {} {}", fb.typ, fb.parameter)
                };
                m = m.with_value_attribute("rtcp-fb".to_owned(), value);
            }
        }
        if m.media_name.formats.is_empty() {
            m.media_name.formats.push("0".to_owned());
        }

        let offered_extensions = match self.offered {
            Some(offered) => match rtp_extensions_from_media_description(offered) {
                Ok(extensions) => Some(extensions),
                Err(err) => {
                    log::warn!("Failed to parse offered header extensions: {}", err);
                    Some(vec![])
                }
            },
            None => None,
        };
        for ext in &params.header_extensions {
            let offered = offered_extensions
                .as_ref()
                .map_or(true, |o| o.iter().any(|e| e.uri == ext.uri));
            if offered {
                m = m.with_value_attribute(
                    ATTR_KEY_EXT_MAP.to_owned(),
                    format!("{} {}", ext.id, ext.uri),
                );
            }
        }

        m
    }
}
